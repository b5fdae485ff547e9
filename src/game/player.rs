//! Player state and movement logic.
//!
//! This module defines the [`Player`] struct, which tracks the player's position, orientation,
//! and movement parameters, and provides the per-frame kinematics step and the third-person
//! camera rig.
//!
//! # Overview
//!
//! The player system handles:
//! - **Position and Orientation**: World position pinned to the floor, yaw/pitch for the camera
//! - **Movement**: Held keys become a local intent, rotated by yaw and scaled by speed and delta
//! - **Collision**: The attempted position is pushed out of every active collider in turn
//! - **Facing**: The visible body turns towards the direction it last moved in
//! - **Camera Rig**: A trailing camera behind and above the player, looking slightly over it
//!
//! # Coordinate System
//!
//! The player uses a right-handed coordinate system:
//! - X-axis: Right
//! - Y-axis: Up (height)
//! - Z-axis: Towards the viewer; a yaw of zero faces -Z
//!
//! Angles are in radians:
//! - **Pitch**: Up/down look angle, clamped to `±max_pitch_degrees`
//! - **Yaw**: Left/right look angle, increasing clockwise when seen from above
//!
//! # Usage Example
//!
//! ```ignore
//! let mut player = Player::new(&PlayerConfig::default());
//! player.mouse_movement(10.0, 5.0);
//! player.update_kinematics(keys.movement_intent(), &colliders, 0.016);
//! let view_proj = player.view_proj_matrix(16.0 / 9.0);
//! ```

use crate::config::PlayerConfig;
use crate::game::collision::ColliderSet;
use crate::game::keys::MovementIntent;
use crate::math::deg_to_rad;
use crate::math::mat::Mat4;
use crate::math::vec::Vec3;

/// Near clip plane of the game camera.
pub const Z_NEAR: f32 = 0.1;
/// Far clip plane of the game camera.
pub const Z_FAR: f32 = 100.0;

/// Where the camera sits and what it looks at, derived from the player each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
}

/// Represents the player character's state in the world.
///
/// # Fields
///
/// ## Position and Orientation
/// - `position`: World coordinates; `y` is always the pinned floor height
/// - `yaw`, `pitch`: Camera orientation in radians
/// - `facing`: Yaw of the visible body, set from the last non-zero movement
///
/// ## Body
/// - `radius`: Sphere radius used against colliders
#[derive(Debug, Clone)]
pub struct Player {
    /// Player's world position.
    pub position: Vec3,

    /// Horizontal look angle in radians.
    pub yaw: f32,

    /// Vertical look angle in radians.
    ///
    /// - Positive values: Looking up
    /// - Negative values: Looking down
    pub pitch: f32,

    /// Body yaw in radians, independent of the camera yaw.
    pub facing: f32,

    /// Collision sphere radius.
    pub radius: f32,

    /// Camera rig computed by the last kinematics step.
    pub camera: CameraRig,

    config: PlayerConfig,
}

impl Player {
    /// Creates a new [`Player`] at the configured spawn point, pinned to the floor.
    pub fn new(config: &PlayerConfig) -> Self {
        let mut player = Self {
            position: config.start.with_y(config.floor_y()),
            yaw: config.yaw,
            pitch: config.pitch,
            facing: config.yaw,
            radius: config.radius,
            camera: CameraRig {
                position: Vec3::ZERO,
                target: Vec3::ZERO,
            },
            config: config.clone(),
        };
        player.clamp_pitch();
        player.camera = player.camera_rig();
        player
    }

    /// Maximum absolute pitch in radians.
    pub fn max_pitch(&self) -> f32 {
        deg_to_rad(self.config.max_pitch_degrees)
    }

    fn clamp_pitch(&mut self) {
        let max = self.max_pitch();
        self.pitch = self.pitch.clamp(-max, max);
    }

    /// Applies a relative pointer motion to yaw and pitch.
    ///
    /// Moving the pointer right turns right, moving it up looks up.
    ///
    /// # Arguments
    ///
    /// * `delta_x` - Horizontal motion in device units
    /// * `delta_y` - Vertical motion in device units, positive downwards
    pub fn mouse_movement(&mut self, delta_x: f64, delta_y: f64) {
        let sensitivity = self.config.turn_sensitivity;
        self.yaw += delta_x as f32 * sensitivity;
        self.pitch -= delta_y as f32 * sensitivity;

        // Clamp pitch to prevent flipping
        self.clamp_pitch();
    }

    /// Rotates a local-space direction by the current yaw into world space.
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        let (sin, cos) = self.yaw.sin_cos();
        Vec3::new(
            local.x() * cos - local.z() * sin,
            local.y(),
            local.x() * sin + local.z() * cos,
        )
    }

    /// Advances the player by one frame.
    ///
    /// 1. Turns the held keys into a unit local direction (zero when idle)
    /// 2. Rotates it by yaw and scales it by `move_speed * delta`
    /// 3. Resolves the attempted position against every active collider
    /// 4. Pins the height to the floor and updates facing when moving
    /// 5. Recomputes the camera rig
    ///
    /// # Arguments
    ///
    /// * `intent` - Local movement request for this frame
    /// * `colliders` - Level colliders; inactive ones are ignored
    /// * `delta` - Seconds since the previous frame
    ///
    /// # Returns
    ///
    /// `true` when the player attempted to move this frame.
    pub fn update_kinematics(
        &mut self,
        intent: MovementIntent,
        colliders: &ColliderSet,
        delta: f32,
    ) -> bool {
        let moving = intent.is_moving();
        let displacement = if moving {
            self.local_to_world(intent.direction()) * (self.config.move_speed * delta)
        } else {
            Vec3::ZERO
        };

        let attempted = self.position + displacement;
        let resolved = colliders.resolve_sphere(attempted, self.radius);
        self.position = resolved.with_y(self.config.floor_y());

        if moving && (displacement.x() != 0.0 || displacement.z() != 0.0) {
            self.facing = displacement.x().atan2(displacement.z());
        }

        self.clamp_pitch();
        self.camera = self.camera_rig();
        moving
    }

    /// Third-person camera placement for the current position and orientation.
    ///
    /// The offset is rotated by yaw and lifted; the target sits just above the player,
    /// nudged up or down by pitch.
    pub fn camera_rig(&self) -> CameraRig {
        let offset = self.local_to_world(self.config.camera_offset);
        let position = Vec3::new(
            self.position.x() + offset.x(),
            self.position.y() + offset.y() + self.config.camera_lift,
            self.position.z() + offset.z(),
        );
        let target = Vec3::new(
            self.position.x(),
            self.position.y() + self.config.look_height + self.pitch.sin() * self.config.pitch_look_scale,
            self.position.z(),
        );
        CameraRig { position, target }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.camera.position, self.camera.target, Vec3::UP)
    }

    /// Projection * View for the given aspect ratio.
    pub fn view_proj_matrix(&self, aspect_ratio: f32) -> Mat4 {
        let projection = Mat4::perspective(
            deg_to_rad(self.config.fov_degrees),
            aspect_ratio,
            Z_NEAR,
            Z_FAR,
        );

        // Projection * View (note the order)
        projection.multiply(&self.view_matrix())
    }

    /// Model matrix for the visible body: feet on the floor, turned to `facing`.
    pub fn body_transform(&self) -> Mat4 {
        Mat4::translation(self.position.x(), 0.0, self.position.z())
            .multiply(&Mat4::rotation_y(self.facing))
    }
}
