//! Static collision volumes and sphere-vs-box resolution.
//!
//! # Overview
//!
//! The castle is built entirely from axis-aligned boxes: walls, pillars and the door.
//! The player is a sphere. Every frame the player's attempted position is pushed out
//! of each active box in turn, which keeps the player outside all solid geometry
//! without any rigid-body simulation.
//!
//! # Core Components
//!
//! * [`Aabb`] - Axis-aligned bounding box defined by min/max corners
//! * [`Collider`] - Named box with an activity flag and an optional visual handle
//! * [`ColliderSet`] - Ordered collection of colliders built once per level
//! * [`resolve_sphere_aabb`] - Pure function returning the push-out for one box
//!
//! # How Resolution Works
//!
//! 1. The sphere center is clamped into the box to find the nearest point on it
//! 2. If the center is outside and closer than the radius, it is pushed straight away
//!    from that nearest point until it touches the surface
//! 3. If the center is inside, it is pushed out through the nearest of the six faces
//! 4. [`ColliderSet::resolve_sphere`] applies this to every active box in order
//!
//! Applying boxes one after another is order dependent. For convex, well separated
//! level geometry that approximation is stable and cheap; it is not an exact
//! simultaneous contact solver.

use crate::math::vec::Vec3;
use crate::renderer::scene::VisualHandle;

/// Axis-Aligned Bounding Box (AABB).
///
/// An AABB is a rectangular box whose faces are aligned with the world coordinate axes.
/// It is defined by two points: the minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum corner points.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates the box `[center - size/2, center + size/2]`.
    ///
    /// # Arguments
    ///
    /// * `center` - Center of the box in world space
    /// * `size` - Full extent along each axis
    ///
    /// # Example
    /// ```ignore
    /// let wall = Aabb::from_center_size(Vec3::new(0.0, 1.5, 0.0), Vec3::new(4.0, 3.0, 0.5));
    /// assert_eq!(wall.min, Vec3::new(-2.0, 0.0, -0.25));
    /// ```
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Returns the center point of this AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Nearest point inside or on the box to `point`.
    pub fn clamp_point(&self, point: Vec3) -> Vec3 {
        point.clamp(&self.min, &self.max)
    }

    /// Checks whether a point lies inside or on the box.
    pub fn contains(&self, point: Vec3) -> bool {
        self.clamp_point(point) == point
    }
}

/// Euclidean distance from `point` to the box surface; zero when inside.
pub fn distance_to_aabb(point: Vec3, aabb: &Aabb) -> f32 {
    point.distance(&aabb.clamp_point(point))
}

/// Computes the correction that pushes a sphere out of a box.
///
/// This is a pure function: callers add the returned vector to the sphere center.
///
/// # Arguments
///
/// * `center` - Sphere center
/// * `radius` - Sphere radius
/// * `aabb` - The box to resolve against
///
/// # Returns
///
/// * The zero vector when the sphere does not penetrate the box
/// * When the center is outside but closer than `radius`, a vector along
///   `center - nearest point` that leaves the center exactly `radius` away
/// * When the center is inside, a vector along one axis that places the center
///   `radius` beyond the nearest face
///
/// # Degenerate Input
///
/// A center lying exactly on the surface has zero distance to its nearest point.
/// That case is routed through the inside branch, so no division by zero occurs.
pub fn resolve_sphere_aabb(center: Vec3, radius: f32, aabb: &Aabb) -> Vec3 {
    let clamped = aabb.clamp_point(center);
    let delta = center - clamped;
    let dist_sq = delta.length_squared();

    if dist_sq > 0.0 {
        let dist = dist_sq.sqrt();
        if dist < radius {
            return delta * ((radius - dist) / dist);
        }
        return Vec3::ZERO;
    }

    // Inside (or on the surface): leave through the nearest face.
    let faces = [
        (center.x() - aabb.min.x(), Vec3::new(aabb.min.x() - radius - center.x(), 0.0, 0.0)),
        (aabb.max.x() - center.x(), Vec3::new(aabb.max.x() + radius - center.x(), 0.0, 0.0)),
        (center.y() - aabb.min.y(), Vec3::new(0.0, aabb.min.y() - radius - center.y(), 0.0)),
        (aabb.max.y() - center.y(), Vec3::new(0.0, aabb.max.y() + radius - center.y(), 0.0)),
        (center.z() - aabb.min.z(), Vec3::new(0.0, 0.0, aabb.min.z() - radius - center.z())),
        (aabb.max.z() - center.z(), Vec3::new(0.0, 0.0, aabb.max.z() + radius - center.z())),
    ];

    let mut nearest = faces[0];
    for face in &faces[1..] {
        if face.0 < nearest.0 {
            nearest = *face;
        }
    }
    nearest.1
}

/// A named static collision volume.
///
/// The box is always derived from `center` and `size`; [`Collider::set_center`] is the
/// only way to move it, so the box can never go stale.
#[derive(Debug, Clone)]
pub struct Collider {
    id: String,
    center: Vec3,
    size: Vec3,
    aabb: Aabb,
    active: bool,
    visual: Option<VisualHandle>,
}

impl Collider {
    pub fn new(id: impl Into<String>, center: Vec3, size: Vec3) -> Self {
        Self {
            id: id.into(),
            center,
            size,
            aabb: Aabb::from_center_size(center, size),
            active: true,
            visual: None,
        }
    }

    /// Attaches the handle of the mesh that draws this collider.
    pub fn attach_visual(&mut self, visual: VisualHandle) {
        self.visual = Some(visual);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn visual(&self) -> Option<VisualHandle> {
        self.visual
    }

    /// Moves the collider and recomputes its box.
    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
        self.aabb = Aabb::from_center_size(center, self.size);
    }

    /// Stops the collider from blocking. Returns `true` only on the call that changed it.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}

/// Ordered set of level colliders.
///
/// Order matters: [`ColliderSet::resolve_sphere`] visits colliders in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    colliders: Vec<Collider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, collider: Collider) {
        debug_assert!(
            self.get(collider.id()).is_none(),
            "duplicate collider id {}",
            collider.id()
        );
        self.colliders.push(collider);
    }

    pub fn get(&self, id: &str) -> Option<&Collider> {
        self.colliders.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Collider> {
        self.colliders.iter_mut().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.iter().filter(|c| c.active)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Pushes a sphere out of every active collider, one after another.
    ///
    /// Each correction is applied before the next collider is visited.
    /// Inactive colliders are skipped entirely.
    ///
    /// # Returns
    /// The corrected sphere center.
    pub fn resolve_sphere(&self, center: Vec3, radius: f32) -> Vec3 {
        self.active().fold(center, |corrected, collider| {
            let correction = resolve_sphere_aabb(corrected, radius, &collider.aabb);
            if correction != Vec3::ZERO {
                log::trace!("pushed out of {} by {:?}", collider.id, correction);
            }
            corrected + correction
        })
    }

    /// Drops every collider. Used on session teardown.
    pub fn clear(&mut self) {
        self.colliders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_box(rng: &mut StdRng) -> Aabb {
        let center = Vec3::new(
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
        );
        let size = Vec3::new(
            rng.gen_range(0.1..6.0),
            rng.gen_range(0.1..6.0),
            rng.gen_range(0.1..6.0),
        );
        Aabb::from_center_size(center, size)
    }

    /// After one correction the sphere sits at least `radius` away from the box,
    /// whether it started inside or outside.
    #[test]
    fn test_resolver_clears_radius_property() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..5000 {
            let aabb = random_box(&mut rng);
            let radius = rng.gen_range(0.05..2.0);
            let inside = rng.gen_bool(0.5);
            let center = if inside {
                Vec3::new(
                    rng.gen_range(aabb.min.x()..=aabb.max.x()),
                    rng.gen_range(aabb.min.y()..=aabb.max.y()),
                    rng.gen_range(aabb.min.z()..=aabb.max.z()),
                )
            } else {
                aabb.center()
                    + Vec3::new(
                        rng.gen_range(-8.0..8.0),
                        rng.gen_range(-8.0..8.0),
                        rng.gen_range(-8.0..8.0),
                    )
            };

            let correction = resolve_sphere_aabb(center, radius, &aabb);
            assert!(correction.is_finite());
            let corrected = center + correction;
            assert!(
                distance_to_aabb(corrected, &aabb) >= radius - 1e-3,
                "center {:?} radius {} box {:?} -> {:?}",
                center,
                radius,
                aabb,
                corrected
            );
        }
    }

    /// Approaching the surface from outside, the push-out shrinks smoothly to zero.
    #[test]
    fn test_resolver_continuous_at_boundary() {
        let aabb = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0));
        let radius = 0.5;
        let mut previous = 0.0;
        for step in 0..50 {
            let gap = radius - step as f32 * 0.01;
            let center = Vec3::new(1.0 + gap, 0.0, 0.0);
            let magnitude = resolve_sphere_aabb(center, radius, &aabb).length();
            assert!(magnitude >= previous - 1e-6);
            assert_abs_diff_eq!(magnitude, radius - gap, epsilon = 1e-5);
            previous = magnitude;
        }
        let touching = resolve_sphere_aabb(Vec3::new(1.5, 0.0, 0.0), radius, &aabb);
        assert_abs_diff_eq!(touching.length(), 0.0, epsilon = 1e-6);
    }

    /// A center exactly on the box center picks a face and never yields NaN.
    #[test]
    fn test_resolver_degenerate_center() {
        let aabb = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0));
        let correction = resolve_sphere_aabb(Vec3::ZERO, 0.5, &aabb);
        assert!(correction.is_finite());
        assert_eq!(correction, Vec3::new(-1.5, 0.0, 0.0));

        let on_face = resolve_sphere_aabb(Vec3::new(1.0, 0.0, 0.0), 0.5, &aabb);
        assert_eq!(on_face, Vec3::new(0.5, 0.0, 0.0));
    }

    /// Inside a thin wall the sphere leaves through the closest face.
    #[test]
    fn test_resolver_uses_nearest_face() {
        let wall = Aabb::from_center_size(Vec3::new(0.0, 1.5, 10.0), Vec3::new(24.0, 3.0, 0.5));
        let correction = resolve_sphere_aabb(Vec3::new(3.0, 0.55, 10.2), 0.45, &wall);
        assert_abs_diff_eq!(correction.x(), 0.0);
        assert_abs_diff_eq!(correction.y(), 0.0);
        assert_abs_diff_eq!(correction.z(), 10.25 + 0.45 - 10.2, epsilon = 1e-5);
    }

    #[test]
    fn test_set_center_recomputes_box() {
        let mut door = Collider::new("door", Vec3::new(0.0, 1.5, 11.75), Vec3::new(3.0, 3.0, 0.5));
        door.set_center(Vec3::new(0.0, 2.5, 11.75));
        assert_abs_diff_eq!(door.aabb().min.y(), 1.0);
        assert_abs_diff_eq!(door.aabb().max.y(), 4.0);
        assert_eq!(door.aabb().center(), door.center());
        assert_eq!(door.aabb().size(), door.size());
    }

    #[test]
    fn test_deactivate_reports_first_change_only() {
        let mut door = Collider::new("door", Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0));
        assert!(door.deactivate());
        assert!(!door.deactivate());
        assert!(!door.is_active());
    }

    /// Inactive colliders are never resolved against.
    #[test]
    fn test_inactive_collider_is_skipped() {
        let mut set = ColliderSet::new();
        set.push(Collider::new("door", Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0)));
        let inside = Vec3::new(0.1, 0.0, 0.0);
        assert_ne!(set.resolve_sphere(inside, 0.5), inside);

        if let Some(door) = set.get_mut("door") {
            door.deactivate();
        }
        assert_eq!(set.resolve_sphere(inside, 0.5), inside);
        assert_eq!(set.active().count(), 0);
    }
}
