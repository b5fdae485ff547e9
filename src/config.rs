//! Configuration system.
//!
//! [`GameConfig`] carries every tunable of a session: window, player kinematics,
//! level layout, trigger thresholds, door animation and audio levels. It is read
//! through the [`Config`] trait, which understands `.toml` and `.ron` files.
//! Every section has defaults, so a partial file only overrides what it names.

use crate::game::riddle::{KeyId, Riddle, RiddleId, default_riddles};
use crate::math::vec::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the session config, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/keystone.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "KEYSTONE_CONFIG";

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Loads from `path`, falling back to defaults when the file is missing or malformed.
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Every tunable of a play session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub player: PlayerConfig,
    pub level: LevelConfig,
    pub triggers: TriggerConfig,
    pub door: DoorConfig,
    pub audio: AudioConfig,
    pub assets: AssetConfig,
}

impl Config for GameConfig {}

impl GameConfig {
    /// Resolves the config path from [`CONFIG_PATH_ENV`] or [`DEFAULT_CONFIG_PATH`] and loads it.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_or_default(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Keystone".to_string(),
            width: 1360,
            height: 768,
        }
    }
}

/// Player body, movement and third-person camera tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub radius: f32,
    pub height: f32,
    /// Gap between the bottom of the collision sphere and the floor.
    pub floor_offset: f32,
    /// Spawn point; `y` is replaced by the pinned floor height.
    pub start: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub max_pitch_degrees: f32,
    pub move_speed: f32,
    pub turn_sensitivity: f32,
    pub fov_degrees: f32,
    pub camera_offset: Vec3,
    pub camera_lift: f32,
    pub look_height: f32,
    pub pitch_look_scale: f32,
}

impl PlayerConfig {
    /// Height the player's center is pinned to.
    pub fn floor_y(&self) -> f32 {
        self.radius + self.floor_offset
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 0.45,
            height: 1.7,
            floor_offset: 0.1,
            start: Vec3::new(0.0, 0.0, -4.0),
            yaw: 0.0,
            pitch: 0.12,
            max_pitch_degrees: 75.0,
            move_speed: 4.2,
            turn_sensitivity: 0.0025,
            fov_degrees: 75.0,
            camera_offset: Vec3::new(0.0, 1.2, 3.5),
            camera_lift: 0.6,
            look_height: 0.9,
            pitch_look_scale: 0.2,
        }
    }
}

/// A free-standing box collider such as a pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropConfig {
    pub id: String,
    pub center: Vec3,
    pub size: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorchConfig {
    pub id: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyConfig {
    pub id: KeyId,
    pub position: Vec3,
    pub riddle: RiddleId,
}

/// Room geometry, props, keys and the riddle content behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub floor_size: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    pub door_width: f32,
    pub chamber_depth: f32,
    pub pillars: Vec<PropConfig>,
    pub torches: Vec<TorchConfig>,
    pub chest: Vec3,
    pub keys: Vec<KeyConfig>,
    pub riddles: Vec<Riddle>,
    /// Words in the order that opens the door.
    pub door_solution: Vec<String>,
    /// Sentence the door words slot into, one `_` per word.
    pub door_sentence: String,
}

impl LevelConfig {
    pub fn room_half(&self) -> f32 {
        self.floor_size / 2.0
    }

    /// Z of the wall holding the door.
    pub fn far_z(&self) -> f32 {
        self.room_half() - self.wall_thickness / 2.0
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        let key = |id: &str, x: f32, z: f32, riddle: &str| KeyConfig {
            id: KeyId::new(id),
            position: Vec3::new(x, 0.6, z),
            riddle: RiddleId(riddle.to_string()),
        };
        let pillar = |id: &str, x: f32, z: f32| PropConfig {
            id: id.to_string(),
            center: Vec3::new(x, 1.5, z),
            size: Vec3::new(0.8, 3.0, 0.8),
        };
        let torch = |id: &str, x: f32, y: f32, z: f32| TorchConfig {
            id: id.to_string(),
            position: Vec3::new(x, y, z),
        };
        Self {
            floor_size: 24.0,
            wall_height: 3.0,
            wall_thickness: 0.5,
            door_width: 3.0,
            chamber_depth: 8.0,
            pillars: vec![
                pillar("pillar-1", -5.0, 5.0),
                pillar("pillar-2", 5.0, 5.0),
            ],
            torches: vec![
                torch("torch-left", -11.4, 1.8, -2.0),
                torch("torch-right", 11.4, 1.8, -2.0),
                torch("torch-door-left", -2.4, 1.8, 11.4),
                torch("torch-door-right", 2.4, 1.8, 11.4),
            ],
            chest: Vec3::new(0.0, 0.4, 15.75),
            keys: vec![
                key("key-reflection", 4.0, 0.0, "scroll-reflection"),
                key("key-oak", -6.0, 3.0, "scroll-oak"),
                key("key-flask", 8.0, -8.0, "scroll-flask"),
                key("key-jest", -8.0, -8.0, "scroll-jest"),
            ],
            riddles: default_riddles(),
            door_solution: ["BOTTLENECK", "QUEEF", "ROBUST", "REPENNY"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
            door_sentence: "The _ quickens with a sudden _, revealing a _ passage to _".to_string(),
        }
    }
}

/// Distances at which proximity triggers fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub key_activation: f32,
    pub approach: f32,
    pub door_activation: f32,
    pub chest_activation: f32,
    pub cue_cooldown_secs: f32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            key_activation: 1.5,
            approach: 2.5,
            door_activation: 2.5,
            chest_activation: 1.5,
            cue_cooldown_secs: 3.0,
        }
    }
}

/// Door lift animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    pub damp_rate: f32,
    /// How far above the wall top the door's center settles.
    pub open_lift: f32,
    /// The collider is released once the center is within this of the wall height.
    pub release_margin: f32,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            damp_rate: 6.0,
            open_lift: 0.1,
            release_margin: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub master_volume: f32,
    pub music_volume: f32,
    pub sfx_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            master_volume: 0.7,
            music_volume: 0.3,
            sfx_volume: 0.6,
        }
    }
}

/// Where assets are looked up on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub audio_root: String,
    pub player_model: String,
    pub icon: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            audio_root: "assets/audio".to_string(),
            player_model: "assets/models/player.ron".to_string(),
            icon: "assets/icon.png".to_string(),
        }
    }
}
