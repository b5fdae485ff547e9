//! Mesh data for the castle props.
//!
//! Pure geometry generation: nothing here holds state. Every mesh is built around its
//! own origin so it can be placed with a translation.

use crate::math::vec::Vec3;
use crate::renderer::primitives::{Material, Vertex, box_mesh, push_box};

pub const STONE: [u8; 4] = [58, 63, 71, 255];
pub const FLOOR: [u8; 4] = [42, 45, 52, 255];
pub const DOOR_WOOD: [u8; 4] = [107, 139, 164, 255];
pub const IRON: [u8; 4] = [47, 47, 47, 255];
pub const WOOD: [u8; 4] = [74, 55, 40, 255];
pub const GOLD: [u8; 4] = [255, 213, 74, 255];
pub const FLAME: [u8; 4] = [255, 68, 0, 255];
pub const PLAYER_BLUE: [u8; 4] = [130, 170, 255, 255];

/// A solid stone block, used for walls and pillars.
pub fn wall(size: Vec3) -> Vec<Vertex> {
    box_mesh(size, STONE, Material::Matte)
}

/// A thin floor slab whose top face sits at y = 0.
pub fn floor(width: f32, depth: f32) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(36);
    push_box(
        &mut out,
        Vec3::new(0.0, -0.05, 0.0),
        Vec3::new(width, 0.1, depth),
        FLOOR,
        Material::Matte,
    );
    out
}

/// Door slab with iron bands across it.
pub fn door(size: Vec3) -> Vec<Vertex> {
    let mut out = box_mesh(size, DOOR_WOOD, Material::Matte);
    let band = Vec3::new(size.x() * 1.02, 0.12, size.z() * 1.1);
    for y in [-0.3, 0.0, 0.3] {
        push_box(&mut out, Vec3::new(0.0, y * size.y(), 0.0), band, IRON, Material::Matte);
    }
    out
}

/// Ornate key: a ring bow, a shaft and two bits, all glowing gold.
pub fn key() -> Vec<Vertex> {
    let mut out = Vec::with_capacity(36 * 6);
    // bow
    push_box(&mut out, Vec3::new(0.0, 0.18, 0.0), Vec3::new(0.22, 0.05, 0.05), GOLD, Material::Emissive);
    push_box(&mut out, Vec3::new(0.0, 0.02, 0.0), Vec3::new(0.22, 0.05, 0.05), GOLD, Material::Emissive);
    push_box(&mut out, Vec3::new(-0.09, 0.1, 0.0), Vec3::new(0.05, 0.2, 0.05), GOLD, Material::Emissive);
    push_box(&mut out, Vec3::new(0.09, 0.1, 0.0), Vec3::new(0.05, 0.2, 0.05), GOLD, Material::Emissive);
    // shaft
    push_box(&mut out, Vec3::new(0.0, -0.2, 0.0), Vec3::new(0.05, 0.4, 0.05), GOLD, Material::Emissive);
    // bits
    push_box(&mut out, Vec3::new(0.06, -0.33, 0.0), Vec3::new(0.08, 0.05, 0.05), GOLD, Material::Emissive);
    push_box(&mut out, Vec3::new(0.06, -0.23, 0.0), Vec3::new(0.08, 0.05, 0.05), GOLD, Material::Emissive);
    out
}

/// Bracket and handle of a wall torch; the flame is a separate mesh so it can flicker.
pub fn torch() -> Vec<Vertex> {
    let mut out = Vec::with_capacity(36 * 3);
    push_box(&mut out, Vec3::new(0.0, -0.2, 0.0), Vec3::new(0.16, 0.08, 0.16), IRON, Material::Matte);
    push_box(&mut out, Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.07, 0.6, 0.07), WOOD, Material::Matte);
    push_box(&mut out, Vec3::new(0.0, 0.32, 0.0), Vec3::new(0.15, 0.12, 0.15), IRON, Material::Matte);
    out
}

/// Flame with its base at the origin, so vertical scaling grows it upwards.
pub fn flame() -> Vec<Vertex> {
    let mut out = Vec::with_capacity(72);
    push_box(&mut out, Vec3::new(0.0, 0.15, 0.0), Vec3::new(0.14, 0.3, 0.14), FLAME, Material::Emissive);
    push_box(&mut out, Vec3::new(0.0, 0.12, 0.0), Vec3::new(0.17, 0.16, 0.17), GOLD, Material::Emissive);
    out
}

/// Treasure chest with a gold clasp.
pub fn chest() -> Vec<Vertex> {
    let mut out = Vec::with_capacity(36 * 4);
    push_box(&mut out, Vec3::new(0.0, -0.1, 0.0), Vec3::new(1.2, 0.6, 0.8), WOOD, Material::Matte);
    push_box(&mut out, Vec3::new(0.0, 0.28, 0.0), Vec3::new(1.24, 0.2, 0.84), WOOD, Material::Matte);
    push_box(&mut out, Vec3::new(0.0, 0.15, -0.43), Vec3::new(0.16, 0.2, 0.04), GOLD, Material::Emissive);
    push_box(&mut out, Vec3::new(0.0, -0.1, 0.0), Vec3::new(1.22, 0.08, 0.82), IRON, Material::Matte);
    out
}

/// Capsule-like stand-in for the player model, feet at y = 0.
///
/// Used whenever the model asset cannot be loaded.
pub fn player_placeholder(radius: f32, height: f32) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(36 * 3);
    let body = (height - radius * 2.0).max(0.1);
    let width = radius * 1.6;
    push_box(&mut out, Vec3::new(0.0, radius + body / 2.0, 0.0), Vec3::new(width, body, width), PLAYER_BLUE, Material::Matte);
    push_box(&mut out, Vec3::new(0.0, radius * 0.5, 0.0), Vec3::new(width * 0.8, radius, width * 0.8), PLAYER_BLUE, Material::Matte);
    push_box(&mut out, Vec3::new(0.0, height - radius * 0.5, 0.0), Vec3::new(width * 0.8, radius, width * 0.8), PLAYER_BLUE, Material::Matte);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The placeholder stands on the floor and reaches the configured height.
    #[test]
    fn test_player_placeholder_extent() {
        let mesh = player_placeholder(0.45, 1.7);
        let min_y = mesh.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let max_y = mesh.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        approx::assert_abs_diff_eq!(min_y, 0.0, epsilon = 1e-5);
        approx::assert_abs_diff_eq!(max_y, 1.7, epsilon = 1e-5);
    }

    #[test]
    fn test_flame_grows_from_base() {
        let min_y = flame().iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert!(min_y >= 0.0);
    }
}
