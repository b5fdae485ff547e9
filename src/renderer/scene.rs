//! Arena of renderable objects keyed by entity id.
//!
//! Game code never sees meshes. It holds a [`VisualHandle`] (or just the entity id)
//! and asks the arena to move, hide or release the object. The scene renderer flattens
//! every visible entry into world-space vertices once per frame.

use crate::math::mat::Mat4;
use crate::renderer::primitives::Vertex;
use std::collections::HashMap;

/// Opaque reference to one object in a [`VisualArena`].
///
/// Handles are never reused within an arena, so a stale handle simply misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(u32);

#[derive(Debug, Clone)]
struct Visual {
    entity: String,
    mesh: Vec<Vertex>,
    transform: Mat4,
    visible: bool,
}

#[derive(Debug, Default)]
pub struct VisualArena {
    visuals: HashMap<VisualHandle, Visual>,
    by_entity: HashMap<String, VisualHandle>,
    next: u32,
}

impl VisualArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mesh for `entity`, replacing any previous visual of the same entity.
    pub fn insert(&mut self, entity: impl Into<String>, mesh: Vec<Vertex>, transform: Mat4) -> VisualHandle {
        let entity = entity.into();
        self.release(&entity);

        let handle = VisualHandle(self.next);
        self.next += 1;
        self.by_entity.insert(entity.clone(), handle);
        self.visuals.insert(
            handle,
            Visual {
                entity,
                mesh,
                transform,
                visible: true,
            },
        );
        handle
    }

    pub fn handle_of(&self, entity: &str) -> Option<VisualHandle> {
        self.by_entity.get(entity).copied()
    }

    pub fn contains(&self, handle: VisualHandle) -> bool {
        self.visuals.contains_key(&handle)
    }

    pub fn transform(&self, handle: VisualHandle) -> Option<Mat4> {
        self.visuals.get(&handle).map(|v| v.transform)
    }

    pub fn set_transform(&mut self, handle: VisualHandle, transform: Mat4) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.transform = transform;
        }
    }

    pub fn is_visible(&self, handle: VisualHandle) -> bool {
        self.visuals.get(&handle).is_some_and(|v| v.visible)
    }

    pub fn set_visible(&mut self, handle: VisualHandle, visible: bool) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.visible = visible;
        }
    }

    /// Drops the visual owned by `entity`. Returns `false` if there was none.
    pub fn release(&mut self, entity: &str) -> bool {
        match self.by_entity.remove(entity) {
            Some(handle) => {
                self.visuals.remove(&handle);
                log::debug!("Released visual for {}", entity);
                true
            }
            None => false,
        }
    }

    /// Drops every visual. Used on teardown.
    pub fn clear(&mut self) {
        self.visuals.clear();
        self.by_entity.clear();
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    /// Entity ids of every visible object.
    pub fn visible_entities(&self) -> impl Iterator<Item = &str> {
        self.visuals
            .values()
            .filter(|v| v.visible)
            .map(|v| v.entity.as_str())
    }

    /// Writes the world-space vertices of every visible object into `out`.
    ///
    /// Handles are visited in creation order so the output is stable between frames.
    pub fn world_vertices(&self, out: &mut Vec<Vertex>) {
        out.clear();
        let mut handles: Vec<_> = self.visuals.keys().copied().collect();
        handles.sort_by_key(|h| h.0);
        for handle in handles {
            let visual = &self.visuals[&handle];
            if visual.visible {
                out.extend(visual.mesh.iter().map(|v| v.transformed(&visual.transform)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec::Vec3;
    use crate::renderer::primitives::{Material, box_mesh};

    fn cube() -> Vec<Vertex> {
        box_mesh(Vec3::new(1.0, 1.0, 1.0), [255, 255, 255, 255], Material::Matte)
    }

    #[test]
    fn test_release_by_entity() {
        let mut arena = VisualArena::new();
        let key = arena.insert("key-oak", cube(), Mat4::identity());
        arena.insert("door", cube(), Mat4::identity());

        assert!(arena.release("key-oak"));
        assert!(!arena.release("key-oak"));
        assert!(!arena.contains(key));
        assert_eq!(arena.handle_of("key-oak"), None);
        assert_eq!(arena.len(), 1);
    }

    /// Operations through a released handle are ignored.
    #[test]
    fn test_stale_handle_misses() {
        let mut arena = VisualArena::new();
        let old = arena.insert("door", cube(), Mat4::identity());
        let new = arena.insert("door", cube(), Mat4::identity());
        assert_ne!(old, new);

        arena.set_visible(old, false);
        assert!(arena.is_visible(new));
        assert_eq!(arena.transform(old), None);
    }

    #[test]
    fn test_world_vertices_skip_hidden() {
        let mut arena = VisualArena::new();
        let a = arena.insert("a", cube(), Mat4::translation(10.0, 0.0, 0.0));
        arena.insert("b", cube(), Mat4::identity());
        let mut out = Vec::new();

        arena.world_vertices(&mut out);
        assert_eq!(out.len(), 72);
        assert!(out[..36].iter().all(|v| v.position[0] >= 9.5));

        arena.set_visible(a, false);
        arena.world_vertices(&mut out);
        assert_eq!(out.len(), 36);
        assert_eq!(arena.visible_entities().collect::<Vec<_>>(), vec!["b"]);
    }
}
