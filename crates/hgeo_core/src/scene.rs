//! Scene types for populating a scene from geometry points.
//!
//! A scene holds a library of prototypes (prefabs and models, identified by
//! asset path) and a container of placed instances under a root transform.
//! The population driver talks to them through the [`PrototypeLibrary`]
//! and [`InstanceContainer`] traits so other hosts can plug in their own.

use std::path::Path;

use hgeo_math::{Mat4, Quat, Vec3};

use crate::placement::Placement;

/// Identifier of a placed instance, unique within its container.
pub type InstanceId = usize;

/// The kind of asset a prototype is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrototypeKind {
    /// An authored, possibly overridden, object
    Prefab,
    /// A plain imported model file
    Model,
}

/// Something that can be instantiated, identified by its asset path.
#[derive(Clone, Debug, PartialEq)]
pub struct Prototype {
    /// Unique identifier within the scene
    pub id: usize,

    /// Asset path with forward slashes, e.g. `Assets/Props/Rock.prefab`
    pub path: String,

    pub kind: PrototypeKind,
}

impl Prototype {
    pub fn new(id: usize, path: impl Into<String>, kind: PrototypeKind) -> Self {
        Self {
            id,
            path: path.into().replace('\\', "/"),
            kind,
        }
    }

    /// File name without extension.
    pub fn name(&self) -> &str {
        Path::new(&self.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Rotation (as quaternion)
    pub rotation: Quat,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Map a point from this transform's local space to its parent space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.to_matrix().transform_point3(point)
    }
}

/// A placed instance of a prototype.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub id: InstanceId,

    /// Asset path of the prototype, or `None` for objects placed by hand
    pub prototype: Option<String>,

    /// Transform relative to the container
    pub transform: Transform,
}

/// Looks up prototypes by name.
pub trait PrototypeLibrary {
    /// Asset paths of `kind` prototypes that may match `name`.
    ///
    /// The search may be fuzzy; callers filter for exact matches.
    fn search(&self, kind: PrototypeKind, name: &str) -> Vec<String>;
}

/// A parent object holding placed instances.
pub trait InstanceContainer {
    /// Current instances, in container order.
    fn instances(&self) -> Vec<Instance>;

    /// Map a container-local position to world space.
    fn to_world(&self, local: Vec3) -> Vec3;

    /// Place a new instance of `prototype` with a container-local transform.
    fn instantiate(&mut self, prototype: &str, transform: Transform) -> InstanceId;

    /// Remove an instance.
    fn destroy(&mut self, id: InstanceId);

    /// Called for each instance spawned from a point, after placement.
    fn on_populated(&mut self, _id: InstanceId, _point: &dyn Placement) {}
}

/// In-memory prototype library.
#[derive(Clone, Debug, Default)]
pub struct PrototypeSet {
    prototypes: Vec<Prototype>,
}

impl PrototypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prototype and return its ID.
    pub fn add(&mut self, path: impl Into<String>, kind: PrototypeKind) -> usize {
        let id = self.prototypes.len();
        self.prototypes.push(Prototype::new(id, path, kind));
        id
    }

    pub fn get(&self, id: usize) -> Option<&Prototype> {
        self.prototypes.get(id)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

impl PrototypeLibrary for PrototypeSet {
    /// Case-insensitive substring match on the file name.
    fn search(&self, kind: PrototypeKind, name: &str) -> Vec<String> {
        let needle = name.to_lowercase();
        self.prototypes
            .iter()
            .filter(|p| p.kind == kind && p.name().to_lowercase().contains(&needle))
            .map(|p| p.path.clone())
            .collect()
    }
}

/// In-memory instance container.
#[derive(Clone, Debug, Default)]
pub struct InstanceSet {
    /// Container transform relative to the world
    pub root: Transform,

    instances: Vec<Instance>,

    next_id: InstanceId,

    /// Instances spawned from points, with the name on the point
    populated: Vec<(InstanceId, String)>,
}

impl InstanceSet {
    pub fn new(root: Transform) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    /// Add an instance and return its ID.
    pub fn add(&mut self, prototype: Option<&str>, transform: Transform) -> InstanceId {
        let id = self.next_id;
        self.next_id += 1;
        self.instances.push(Instance {
            id,
            prototype: prototype.map(str::to_string),
            transform,
        });
        id
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances reported through [`InstanceContainer::on_populated`].
    pub fn populated(&self) -> &[(InstanceId, String)] {
        &self.populated
    }
}

impl InstanceContainer for InstanceSet {
    fn instances(&self) -> Vec<Instance> {
        self.instances.clone()
    }

    fn to_world(&self, local: Vec3) -> Vec3 {
        self.root.transform_point(local)
    }

    fn instantiate(&mut self, prototype: &str, transform: Transform) -> InstanceId {
        self.add(Some(prototype), transform)
    }

    fn destroy(&mut self, id: InstanceId) {
        self.instances.retain(|i| i.id != id);
    }

    fn on_populated(&mut self, id: InstanceId, point: &dyn Placement) {
        self.populated.push((id, point.prototype_name().to_string()));
    }
}

/// A scene: a prototype library plus one container of placed instances.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene name (usually from filename)
    pub name: String,

    pub prototypes: PrototypeSet,

    pub instances: InstanceSet,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a prototype to the scene and return its ID.
    pub fn add_prototype(&mut self, path: impl Into<String>, kind: PrototypeKind) -> usize {
        self.prototypes.add(path, kind)
    }

    /// Get total instance count.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Get prototype count.
    pub fn prototype_count(&self) -> usize {
        self.prototypes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_creation() {
        let mut scene = Scene::new("test");
        let rock = scene.add_prototype("Assets\\Props\\Rock.prefab", PrototypeKind::Prefab);
        assert_eq!(rock, 0);

        let prototype = scene.prototypes.get(rock).unwrap();
        assert_eq!(prototype.path, "Assets/Props/Rock.prefab");
        assert_eq!(prototype.name(), "Rock");

        scene.instances.add(Some("Assets/Props/Rock.prefab"), Transform::default());
        scene.instances.add(None, Transform::from_translation(Vec3::X));
        assert_eq!(scene.prototype_count(), 1);
        assert_eq!(scene.instance_count(), 2);
    }

    #[test]
    fn test_search_filters_kind() {
        let mut library = PrototypeSet::new();
        library.add("Assets/Props/Rock.prefab", PrototypeKind::Prefab);
        library.add("Assets/Props/RockLarge.prefab", PrototypeKind::Prefab);
        library.add("Assets/Models/Rock.fbx", PrototypeKind::Model);

        let prefabs = library.search(PrototypeKind::Prefab, "rock");
        assert_eq!(prefabs.len(), 2);
        let models = library.search(PrototypeKind::Model, "Rock");
        assert_eq!(models, vec!["Assets/Models/Rock.fbx".to_string()]);
    }

    #[test]
    fn test_instance_ids_are_not_reused() {
        let mut set = InstanceSet::default();
        let a = set.add(None, Transform::default());
        set.destroy(a);
        let b = set.add(None, Transform::default());
        assert_ne!(a, b);
        assert!(set.get(a).is_none());
        assert!(set.get(b).is_some());
    }

    #[test]
    fn test_to_world_uses_root() {
        let set = InstanceSet::new(Transform {
            translation: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        });
        let world = set.to_world(Vec3::new(1.0, 1.0, 0.0));
        assert!((world - Vec3::new(12.0, 2.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_point_scales_then_rotates() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };

        // X scaled to 2, rotated onto -Z, then offset
        let moved = transform.transform_point(Vec3::X);
        assert!((moved - Vec3::new(1.0, 2.0, 1.0)).length() < 0.001);
    }
}
