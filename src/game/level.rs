//! Level construction.
//!
//! Turns a [`LevelConfig`] into the runtime pieces of a session: the collider set,
//! the key entities with their validated riddles, the door, the chest and the torches.
//! [`Level::spawn_visuals`] then registers a mesh for every entity in the visual arena
//! and wires the collider handles.

use crate::config::{LevelConfig, TorchConfig};
use crate::game::collision::{Collider, ColliderSet};
use crate::game::props;
use crate::game::riddle::{KeyId, RiddleBook, RiddleError};
use crate::math::mat::Mat4;
use crate::math::vec::Vec3;
use crate::renderer::primitives::Vertex;
use crate::renderer::scene::VisualArena;
use log::info;
use std::collections::HashSet;

pub const DOOR_ID: &str = "door";
pub const CHEST_ID: &str = "chest";
pub const PLAYER_ID: &str = "player";

/// Reasons a level config is rejected.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum LevelError {
    #[error(transparent)]
    Riddle(#[from] RiddleError),
    #[error("door solution {0:?} does not use exactly the riddle words")]
    DoorSolution(Vec<String>),
}

/// A collectible key placed in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEntity {
    pub id: KeyId,
    /// Resting position; the bobbing animation never moves the trigger point.
    pub position: Vec3,
}

/// Where the door sits when closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorLayout {
    pub closed_center: Vec3,
    pub size: Vec3,
}

#[derive(Debug, Clone)]
pub struct Level {
    pub config: LevelConfig,
    pub colliders: ColliderSet,
    pub keys: Vec<KeyEntity>,
    pub riddles: RiddleBook,
    pub door: DoorLayout,
    pub chest: Vec3,
    pub torches: Vec<TorchConfig>,
}

impl Level {
    /// Builds the room, the doorway, the chamber behind it and every prop.
    ///
    /// # Errors
    /// Fails when the riddles do not bind one-to-one to the keys, or when the door
    /// solution is not a permutation of the riddle words.
    pub fn build(config: &LevelConfig) -> Result<Self, LevelError> {
        let riddles = RiddleBook::new(
            &config.riddles,
            config.keys.iter().map(|k| (k.id.clone(), k.riddle.clone())),
        )?;

        let words: HashSet<String> = config
            .keys
            .iter()
            .filter_map(|k| riddles.riddle_for(&k.id))
            .map(|r| r.word())
            .collect();
        let solution: HashSet<String> = config.door_solution.iter().map(|w| w.to_uppercase()).collect();
        if words != solution || config.door_solution.len() != words.len() {
            return Err(LevelError::DoorSolution(config.door_solution.clone()));
        }

        let h = config.wall_height;
        let t = config.wall_thickness;
        let size = config.floor_size;
        let half = config.room_half();
        let far_z = config.far_z();
        let side_width = (size - config.door_width) / 2.0;
        let depth = config.chamber_depth;

        let mut colliders = ColliderSet::new();
        let mut wall = |id: &str, center: Vec3, extent: Vec3| {
            colliders.push(Collider::new(id, center, extent));
        };

        wall("wall-back", Vec3::new(0.0, h / 2.0, -half + t / 2.0), Vec3::new(size, h, t));
        wall("wall-left", Vec3::new(-half + t / 2.0, h / 2.0, 0.0), Vec3::new(t, h, size));
        wall("wall-right", Vec3::new(half - t / 2.0, h / 2.0, 0.0), Vec3::new(t, h, size));
        wall(
            "wall-far-left",
            Vec3::new(-config.door_width / 2.0 - side_width / 2.0, h / 2.0, far_z),
            Vec3::new(side_width, h, t),
        );
        wall(
            "wall-far-right",
            Vec3::new(config.door_width / 2.0 + side_width / 2.0, h / 2.0, far_z),
            Vec3::new(side_width, h, t),
        );

        let door = DoorLayout {
            closed_center: Vec3::new(0.0, h / 2.0, far_z),
            size: Vec3::new(config.door_width, h, t),
        };
        wall(DOOR_ID, door.closed_center, door.size);

        wall("chamber-back", Vec3::new(0.0, h / 2.0, far_z + depth), Vec3::new(size, h, t));
        wall(
            "chamber-left",
            Vec3::new(-half + t / 2.0, h / 2.0, far_z + depth / 2.0),
            Vec3::new(t, h, depth),
        );
        wall(
            "chamber-right",
            Vec3::new(half - t / 2.0, h / 2.0, far_z + depth / 2.0),
            Vec3::new(t, h, depth),
        );

        for pillar in &config.pillars {
            wall(&pillar.id, pillar.center, pillar.size);
        }

        let keys = config
            .keys
            .iter()
            .map(|k| KeyEntity {
                id: k.id.clone(),
                position: k.position,
            })
            .collect::<Vec<_>>();

        info!(
            "Level built: {} colliders, {} keys, {} torches",
            colliders.len(),
            keys.len(),
            config.torches.len()
        );

        Ok(Self {
            config: config.clone(),
            colliders,
            keys,
            riddles,
            door,
            chest: config.chest,
            torches: config.torches.clone(),
        })
    }

    pub fn key(&self, id: &KeyId) -> Option<&KeyEntity> {
        self.keys.iter().find(|k| &k.id == id)
    }

    /// Registers a mesh for every entity and attaches collider visuals.
    pub fn spawn_visuals(&mut self, arena: &mut VisualArena, player_mesh: Vec<Vertex>) {
        let floor_depth = self.config.floor_size + self.config.chamber_depth;
        arena.insert(
            "floor",
            props::floor(self.config.floor_size, floor_depth),
            Mat4::translation(0.0, 0.0, self.config.chamber_depth / 2.0),
        );

        let ids: Vec<String> = self.colliders.iter().map(|c| c.id().to_string()).collect();
        for id in ids {
            if let Some(collider) = self.colliders.get_mut(&id) {
                let mesh = if id == DOOR_ID {
                    props::door(collider.size())
                } else {
                    props::wall(collider.size())
                };
                let c = collider.center();
                let handle = arena.insert(id.as_str(), mesh, Mat4::translation(c.x(), c.y(), c.z()));
                collider.attach_visual(handle);
            }
        }

        for key in &self.keys {
            let p = key.position;
            arena.insert(key.id.as_str(), props::key(), Mat4::translation(p.x(), p.y(), p.z()));
        }

        for torch in &self.torches {
            let p = torch.position;
            arena.insert(torch.id.as_str(), props::torch(), Mat4::translation(p.x(), p.y(), p.z()));
            arena.insert(
                flame_id(&torch.id),
                props::flame(),
                Mat4::translation(p.x(), p.y() + 0.38, p.z()),
            );
        }

        let c = self.chest;
        arena.insert(CHEST_ID, props::chest(), Mat4::translation(c.x(), c.y(), c.z()));
        arena.insert(PLAYER_ID, player_mesh, Mat4::identity());
    }

    /// Idle animation: keys spin and bob, torch flames flicker.
    ///
    /// Purely visual. Entities whose visuals were released are skipped.
    pub fn animate(&self, elapsed: f32, arena: &mut VisualArena) {
        for key in &self.keys {
            if let Some(handle) = arena.handle_of(key.id.as_str()) {
                let p = key.position;
                let bob = (elapsed * 3.0).sin() * 0.1;
                let transform = Mat4::translation(p.x(), p.y() + bob, p.z())
                    .multiply(&Mat4::rotation_y(elapsed));
                arena.set_transform(handle, transform);
            }
        }

        for torch in &self.torches {
            if let Some(handle) = arena.handle_of(&flame_id(&torch.id)) {
                let p = torch.position;
                let transform = Mat4::translation(p.x(), p.y() + 0.38, p.z())
                    .multiply(&Mat4::scaling(1.0, flame_scale(elapsed), 1.0));
                arena.set_transform(handle, transform);
            }
        }
    }
}

fn flame_id(torch: &str) -> String {
    format!("{}-flame", torch)
}

/// Vertical flame scale at time `t`: two layered sines around 1.
pub fn flame_scale(t: f32) -> f32 {
    1.0 + (t * 8.0).sin() * 0.1 + (t * 12.0).sin() * 0.05
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyConfig;
    use crate::game::riddle::RiddleId;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_level_layout() {
        let level = Level::build(&LevelConfig::default()).expect("default level builds");
        assert_eq!(level.keys.len(), 4);
        assert_eq!(level.riddles.len(), 4);

        let door = level.colliders.get(DOOR_ID).expect("door collider");
        assert_eq!(door.center(), Vec3::new(0.0, 1.5, 11.75));
        assert_eq!(door.size(), Vec3::new(3.0, 3.0, 0.5));

        let far_left = level.colliders.get("wall-far-left").expect("far wall");
        assert_abs_diff_eq!(far_left.size().x(), 10.5);
        assert_abs_diff_eq!(far_left.aabb().max.x(), -1.5);

        let chamber = level.colliders.get("chamber-back").expect("chamber");
        assert_abs_diff_eq!(chamber.center().z(), 19.75);
        assert!(level.colliders.get("pillar-2").is_some());
    }

    /// A door solution naming a word no riddle unlocks can never be solved.
    #[test]
    fn test_unsolvable_door_is_rejected() {
        let mut config = LevelConfig::default();
        config.door_solution[0] = "DRAGON".to_string();
        assert!(matches!(Level::build(&config), Err(LevelError::DoorSolution(_))));
    }

    #[test]
    fn test_bad_riddle_binding_is_rejected() {
        let mut config = LevelConfig::default();
        config.keys.push(KeyConfig {
            id: KeyId::new("key-extra"),
            position: Vec3::ZERO,
            riddle: RiddleId("scroll-missing".to_string()),
        });
        assert!(matches!(
            Level::build(&config),
            Err(LevelError::Riddle(RiddleError::UnknownRiddle { .. }))
        ));
    }

    #[test]
    fn test_spawn_visuals_attaches_handles() {
        let mut level = Level::build(&LevelConfig::default()).expect("level");
        let mut arena = VisualArena::new();
        level.spawn_visuals(&mut arena, Vec::new());

        let door = level.colliders.get(DOOR_ID).expect("door");
        assert_eq!(door.visual(), arena.handle_of(DOOR_ID));
        assert!(door.visual().is_some());
        assert!(arena.handle_of("key-oak").is_some());
        assert!(arena.handle_of("torch-left-flame").is_some());
        assert!(arena.handle_of(PLAYER_ID).is_some());
    }

    /// Keys bob around their resting height but the entity position never changes.
    #[test]
    fn test_animate_only_moves_visuals() {
        let mut level = Level::build(&LevelConfig::default()).expect("level");
        let mut arena = VisualArena::new();
        level.spawn_visuals(&mut arena, Vec::new());
        let before = level.keys[0].position;

        level.animate(0.5, &mut arena);
        let handle = arena.handle_of(level.keys[0].id.as_str()).expect("key visual");
        let moved = arena.transform(handle).expect("transform").transform_point(Vec3::ZERO);
        assert_abs_diff_eq!(moved.y(), before.y() + (1.5f32).sin() * 0.1, epsilon = 1e-5);
        assert_eq!(level.keys[0].position, before);
    }

    #[test]
    fn test_flame_scale_bounds() {
        for i in 0..1000 {
            let s = flame_scale(i as f32 * 0.01);
            assert!((0.85..=1.15).contains(&s));
        }
    }
}
