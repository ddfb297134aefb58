//! Scene population: placing prototype instances on points.
//!
//! Existing instances are reconciled against the points rather than
//! rebuilt. A point reuses an instance of the same prototype within the
//! reuse tolerance, so hand-made overrides on placed objects survive a
//! re-import. Matching is greedy in point order: each point claims the
//! first unclaimed instance close enough to it, which is not necessarily
//! the closest one.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use hgeo_math::Vec3;

use crate::placement::Placement;
use crate::scene::{InstanceContainer, InstanceId, PrototypeKind, PrototypeLibrary};

/// Default distance within which an existing instance is reused.
pub const DEFAULT_REUSE_TOLERANCE: f32 = 0.01;

const PREFAB_SUFFIX: &str = ".prefab";

/// Outcome of one population pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopulateReport {
    /// Existing instances kept in place
    pub reused: usize,

    /// New instances placed
    pub spawned: usize,

    /// Unclaimed existing instances removed
    pub destroyed: usize,

    /// Points with no name or an unresolved name
    pub skipped: usize,

    /// Names that resolved to no prototype, in first-seen order
    pub missing: Vec<String>,
}

/// Places and reuses instances for a set of points.
///
/// Name resolution results and missing-name warnings are cached for one
/// [`populate`](ScenePopulator::populate) call and reset at the start of
/// the next.
#[derive(Clone, Debug)]
pub struct ScenePopulator {
    tolerance: f32,
    resolved: HashMap<String, String>,
    warned: HashSet<String>,
    missing: Vec<String>,
}

impl Default for ScenePopulator {
    fn default() -> Self {
        Self::new(DEFAULT_REUSE_TOLERANCE)
    }
}

impl ScenePopulator {
    pub fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            resolved: HashMap::new(),
            warned: HashSet::new(),
            missing: Vec::new(),
        }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Reconcile `container` with `points`.
    ///
    /// Every point whose name resolves either claims an existing instance
    /// of that prototype or spawns a new one with the point's transform.
    /// Existing prototype instances left unclaimed are destroyed. Instances
    /// without a prototype are never touched.
    pub fn populate<P, L, C>(&mut self, points: &[P], library: &L, container: &mut C) -> PopulateReport
    where
        P: Placement,
        L: PrototypeLibrary + ?Sized,
        C: InstanceContainer + ?Sized,
    {
        self.resolved.clear();
        self.warned.clear();
        self.missing.clear();

        // Reuse pool: prototype path -> unclaimed instances with world positions
        let mut pool: BTreeMap<String, Vec<(InstanceId, Vec3)>> = BTreeMap::new();
        for instance in container.instances() {
            if let Some(prototype) = instance.prototype {
                let world = container.to_world(instance.transform.translation);
                pool.entry(prototype).or_default().push((instance.id, world));
            }
        }

        let mut report = PopulateReport::default();
        for point in points {
            let Some(prototype) = self.resolve(point.prototype_name(), library) else {
                report.skipped += 1;
                continue;
            };

            let world = container.to_world(point.position());
            let claimed = pool.get_mut(&prototype).and_then(|candidates| {
                let index = candidates
                    .iter()
                    .position(|(_, p)| p.distance(world) < self.tolerance)?;
                Some(candidates.remove(index))
            });
            if claimed.is_some() {
                report.reused += 1;
                continue;
            }

            let id = container.instantiate(&prototype, point.transform());
            container.on_populated(id, point);
            report.spawned += 1;
        }

        for (id, _) in pool.into_values().flatten() {
            container.destroy(id);
            report.destroyed += 1;
        }

        report.missing = std::mem::take(&mut self.missing);
        log::info!(
            "Populated {} points: {} reused, {} spawned, {} destroyed, {} skipped",
            points.len(),
            report.reused,
            report.spawned,
            report.destroyed,
            report.skipped
        );
        report
    }

    /// Resolve a point's prototype name to an asset path.
    ///
    /// A trailing `.prefab` is ignored and backslashes count as directory
    /// separators. Leading directories, if any, must match the end of the
    /// candidate's directory. Prefabs are preferred over models; among
    /// several matches the first wins.
    pub fn resolve<L: PrototypeLibrary + ?Sized>(&mut self, name: &str, library: &L) -> Option<String> {
        let name = name.strip_suffix(PREFAB_SUFFIX).unwrap_or(name).replace('\\', "/");
        if name.is_empty() {
            return None;
        }
        if let Some(path) = self.resolved.get(&name) {
            return Some(path.clone());
        }

        let (directory, stem) = match name.rfind('/') {
            Some(i) => (Some(&name[..i]), &name[i + 1..]),
            None => (None, name.as_str()),
        };
        // A leading slash keeps "Water" from matching "UnderWater"
        let directory = directory.filter(|d| !d.is_empty()).map(|d| {
            if d.starts_with('/') {
                d.to_string()
            } else {
                format!("/{}", d)
            }
        });

        let mut candidates = find_candidates(library, PrototypeKind::Prefab, stem, directory.as_deref());
        if candidates.is_empty() {
            candidates = find_candidates(library, PrototypeKind::Model, stem, directory.as_deref());
        }

        match candidates.into_iter().next() {
            Some(path) => {
                self.resolved.insert(name, path.clone());
                Some(path)
            }
            None => {
                if self.warned.insert(name.clone()) {
                    log::warn!("Couldn't find a prototype named '{}'", name);
                    self.missing.push(name);
                }
                None
            }
        }
    }
}

/// Library results whose file stem is exactly `stem` and whose directory
/// ends with `directory`.
fn find_candidates<L: PrototypeLibrary + ?Sized>(
    library: &L,
    kind: PrototypeKind,
    stem: &str,
    directory: Option<&str>,
) -> Vec<String> {
    let candidates: Vec<String> = library
        .search(kind, stem)
        .into_iter()
        .map(|path| path.replace('\\', "/"))
        .filter(|path| {
            let file_stem = Path::new(path).file_stem().and_then(|s| s.to_str());
            if file_stem != Some(stem) {
                return false;
            }
            match directory {
                Some(directory) => {
                    let parent = path.rfind('/').map_or("", |i| &path[..i]);
                    parent.ends_with(directory)
                }
                None => true,
            }
        })
        .collect();

    if candidates.len() > 1 {
        log::warn!(
            "Found {} {:?} prototypes named '{}', using {}. Give the asset a unique name \
             or prefix the name with some of its folders.",
            candidates.len(),
            kind,
            stem,
            candidates[0]
        );
    }
    candidates
}
