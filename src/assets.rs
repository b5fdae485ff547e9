//! # Assets Module
//!
//! Loads everything a session needs from disk before the first frame: the audio clips,
//! the player model and the window icon. Each step reports an [`AssetProgress`] event to
//! every subscriber.
//!
//! Nothing here is fatal. A missing clip plays as silence, a missing or malformed model
//! becomes a placeholder body and a missing icon is drawn procedurally.

use crate::config::{AssetConfig, PlayerConfig};
use crate::game::audio::Sound;
use crate::game::props;
use crate::math::vec::Vec3;
use crate::renderer::primitives::{Material, Vertex, push_box};
use kira::sound::static_sound::StaticSoundData;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};

/// Size of the generated fallback icon, in pixels.
pub const ICON_SIZE: u32 = 32;

#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("bad model {path}: {reason}")]
    Model { path: PathBuf, reason: String },
    #[error("no clip for {name} under {root}")]
    Audio { name: String, root: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Audio,
    Model,
    Texture,
    Complete,
}

/// One loading step.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetProgress {
    pub kind: AssetKind,
    pub loaded: usize,
    pub total: usize,
    /// `loaded / total` as a rounded percentage.
    pub percentage: u32,
    pub current_asset: String,
    pub status: String,
}

/// One box of a model, in model space with feet at y = 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPart {
    pub center: Vec3,
    pub size: Vec3,
    pub color: [u8; 4],
    #[serde(default)]
    pub emissive: bool,
}

/// A model built from boxes, stored as RON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelMesh {
    pub parts: Vec<ModelPart>,
}

impl ModelMesh {
    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    pub fn to_vertices(&self) -> Vec<Vertex> {
        let mut out = Vec::with_capacity(self.parts.len() * 36);
        for part in &self.parts {
            let material = if part.emissive {
                Material::Emissive
            } else {
                Material::Matte
            };
            push_box(&mut out, part.center, part.size, part.color, material);
        }
        out
    }
}

/// Decoded RGBA pixels for the window icon.
#[derive(Debug, Clone, PartialEq)]
pub struct IconImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Everything the loader produced.
pub struct LoadedAssets {
    pub clips: HashMap<Sound, StaticSoundData>,
    pub player_mesh: Vec<Vertex>,
    pub icon: IconImage,
}

pub struct AssetLoader {
    config: AssetConfig,
    subscribers: Vec<Sender<AssetProgress>>,
    loaded: usize,
    total: usize,
}

impl AssetLoader {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            config: config.clone(),
            subscribers: Vec::new(),
            loaded: 0,
            // every clip, the player model and the icon
            total: Sound::ALL.len() + 2,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<AssetProgress> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn step(&mut self, kind: AssetKind, current_asset: &str, status: impl Into<String>) {
        if kind != AssetKind::Complete {
            self.loaded += 1;
        }
        let percentage = if self.total == 0 {
            100
        } else {
            ((self.loaded as f32 / self.total as f32) * 100.0).round() as u32
        };
        let progress = AssetProgress {
            kind,
            loaded: self.loaded,
            total: self.total,
            percentage,
            current_asset: current_asset.to_string(),
            status: status.into(),
        };
        debug!("Asset progress: {:?}", progress);
        self.subscribers.retain(|tx| tx.send(progress.clone()).is_ok());
    }

    /// Loads every asset, falling back wherever a file is missing or broken.
    pub fn load_all(&mut self, player: &PlayerConfig) -> LoadedAssets {
        let mut clips = HashMap::new();
        for sound in Sound::ALL {
            match load_clip(Path::new(&self.config.audio_root), sound) {
                Ok(data) => {
                    clips.insert(sound, data);
                    self.step(AssetKind::Audio, sound.name(), "loaded");
                }
                Err(e) => {
                    warn!("{}; it will play as silence", e);
                    self.step(AssetKind::Audio, sound.name(), "missing");
                }
            }
        }

        let model_path = self.config.player_model.clone();
        let player_mesh = match load_model(Path::new(&model_path)) {
            Ok(model) if !model.parts.is_empty() => {
                self.step(AssetKind::Model, &model_path, "loaded");
                model.to_vertices()
            }
            Ok(_) => {
                warn!("Model {} has no parts, using placeholder", model_path);
                self.step(AssetKind::Model, &model_path, "placeholder");
                props::player_placeholder(player.radius, player.height)
            }
            Err(e) => {
                warn!("{}, using placeholder", e);
                self.step(AssetKind::Model, &model_path, "placeholder");
                props::player_placeholder(player.radius, player.height)
            }
        };

        let icon_path = self.config.icon.clone();
        let icon = match load_icon(Path::new(&icon_path)) {
            Ok(icon) => {
                self.step(AssetKind::Texture, &icon_path, "loaded");
                icon
            }
            Err(e) => {
                warn!("Icon {}: {}, drawing one instead", icon_path, e);
                self.step(AssetKind::Texture, &icon_path, "generated");
                placeholder_icon(ICON_SIZE)
            }
        };

        self.step(AssetKind::Complete, "", "ready");
        info!("Assets loaded: {}/{} clips", clips.len(), Sound::ALL.len());

        LoadedAssets {
            clips,
            player_mesh,
            icon,
        }
    }
}

/// Reads `<root>/<name>.ogg`, or `<root>/<name>.mp3` when there is no ogg.
pub fn load_clip(root: &Path, sound: Sound) -> Result<StaticSoundData, AssetError> {
    for ext in ["ogg", "mp3"] {
        let path = root.join(format!("{}.{}", sound.name(), ext));
        if !path.exists() {
            continue;
        }
        match StaticSoundData::from_file(&path) {
            Ok(data) => return Ok(data),
            Err(e) => warn!("Could not decode {}: {}", path.display(), e),
        }
    }
    Err(AssetError::Audio {
        name: sound.name().to_string(),
        root: root.to_path_buf(),
    })
}

pub fn load_model(path: &Path) -> Result<ModelMesh, AssetError> {
    let source = fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ModelMesh::from_ron(&source).map_err(|e| AssetError::Model {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn load_icon(path: &Path) -> Result<IconImage, AssetError> {
    let image = image::open(path)?.to_rgba8();
    let (width, height) = image.dimensions();
    Ok(IconImage {
        rgba: image.into_raw(),
        width,
        height,
    })
}

/// A gold key glyph on a dark stone square.
pub fn placeholder_icon(size: u32) -> IconImage {
    let s = size as f32;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let (u, v) = ((x as f32 + 0.5) / s, (y as f32 + 0.5) / s);
            // ring bow in the upper third, shaft below it, two bits on the right
            let ring = ((u - 0.5).powi(2) + (v - 0.28).powi(2)).sqrt();
            let bow = (0.11..0.2).contains(&ring);
            let shaft = (0.45..0.55).contains(&u) && (0.45..0.9).contains(&v);
            let bits = (0.55..0.7).contains(&u) && ((0.7..0.76).contains(&v) || (0.82..0.88).contains(&v));
            let pixel = if bow || shaft || bits {
                [255, 213, 74, 255]
            } else {
                [42, 45, 52, 255]
            };
            rgba.extend_from_slice(&pixel);
        }
    }
    IconImage {
        rgba,
        width: size,
        height: size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_assets() -> AssetConfig {
        AssetConfig {
            audio_root: "does/not/exist".to_string(),
            player_model: "does/not/exist.ron".to_string(),
            icon: "does/not/exist.png".to_string(),
        }
    }

    /// With nothing on disk every step still reports, and the session gets fallbacks.
    #[test]
    fn test_missing_assets_fall_back() {
        let mut loader = AssetLoader::new(&missing_assets());
        let progress = loader.subscribe();
        let assets = loader.load_all(&PlayerConfig::default());

        assert!(assets.clips.is_empty());
        assert!(!assets.player_mesh.is_empty());
        assert_eq!(assets.icon.width, ICON_SIZE);
        assert_eq!(assets.icon.rgba.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);

        let events: Vec<AssetProgress> = progress.try_iter().collect();
        assert_eq!(events.len(), Sound::ALL.len() + 3);
        let last = events.last().expect("complete event");
        assert_eq!(last.kind, AssetKind::Complete);
        assert_eq!(last.percentage, 100);
        assert!(events.windows(2).all(|w| w[0].percentage <= w[1].percentage));
        assert_eq!(events[Sound::ALL.len()].status, "placeholder");
    }

    #[test]
    fn test_model_from_ron() {
        let model = ModelMesh::from_ron(
            "(parts: [(center: (0.0, 0.5, 0.0), size: (1.0, 1.0, 1.0), color: (10, 20, 30, 255), emissive: true)])",
        )
        .expect("parses");
        assert_eq!(model.parts.len(), 1);
        let vertices = model.to_vertices();
        assert_eq!(vertices.len(), 36);
        assert_eq!(vertices[0].material, Material::Emissive as u32);
    }

    #[test]
    fn test_shipped_player_model_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/models/player.ron");
        let model = load_model(Path::new(path)).expect("shipped model");
        assert!(!model.parts.is_empty());
        let min_y = model
            .to_vertices()
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MAX, f32::min);
        approx::assert_abs_diff_eq!(min_y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_broken_model_is_an_error() {
        let dir = std::env::temp_dir().join("keystone-assets-test");
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("broken.ron");
        fs::write(&path, "(parts: [oops").expect("write");
        assert!(matches!(load_model(&path), Err(AssetError::Model { .. })));
    }

    #[test]
    fn test_placeholder_icon_has_gold_glyph() {
        let icon = placeholder_icon(ICON_SIZE);
        let gold = icon.rgba.chunks(4).filter(|p| p[0] == 255 && p[1] == 213).count();
        assert!(gold > 20);
        assert!(gold < (ICON_SIZE * ICON_SIZE) as usize / 2);
    }
}
