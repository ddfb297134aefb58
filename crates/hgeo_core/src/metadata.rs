//! Scene metadata export and import.
//!
//! A [`SceneMetaData`] gathers point and spline records from its providers
//! into one geometry file for export. On import it reads the file back as
//! [`PopulatablePoint`]s and populates an instance container with them.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::{read_geo, write_geo, DecodeError, EncodeError, EncodeOptions};
use crate::error::{GeoError, GeoResult};
use crate::geometry::GeoContainer;
use crate::placement::PopulatablePoint;
use crate::point::PointRecord;
use crate::populate::{PopulateReport, ScenePopulator};
use crate::scene::{InstanceContainer, PrototypeLibrary};
use crate::settings::GeoSettings;
use crate::spline::SplineRecord;

/// Errors that can occur in the metadata flow.
#[derive(Error, Debug)]
pub enum MetaDataError {
    #[error("Geometry error: {0}")]
    Geo(#[from] GeoError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Export is disabled for scene metadata '{0}'")]
    ExportDisabled(String),

    #[error("Import is disabled or has no source for scene metadata '{0}'")]
    ImportDisabled(String),
}

/// Result type for metadata operations.
pub type MetaDataResult<T> = Result<T, MetaDataError>;

/// Contributes point records to a metadata export.
pub trait PointProvider {
    fn collect_points(&self, points: &mut Vec<Box<dyn PointRecord>>);
}

/// Contributes splines to a metadata export.
pub trait SplineProvider {
    fn collect_splines(&self, splines: &mut Vec<Box<dyn SplineRecord>>);
}

/// Export/import configuration for one scene's metadata.
pub struct SceneMetaData {
    pub name: String,
    pub export_enabled: bool,
    pub export_path: PathBuf,
    pub import_enabled: bool,

    /// Geometry file read on import
    pub import_source: Option<PathBuf>,

    pub translate_coordinate_systems: bool,

    point_providers: Vec<Box<dyn PointProvider>>,
    spline_providers: Vec<Box<dyn SplineProvider>>,
}

impl fmt::Debug for SceneMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneMetaData")
            .field("name", &self.name)
            .field("export_enabled", &self.export_enabled)
            .field("export_path", &self.export_path)
            .field("import_enabled", &self.import_enabled)
            .field("import_source", &self.import_source)
            .field("point_providers", &self.point_providers.len())
            .field("spline_providers", &self.spline_providers.len())
            .finish()
    }
}

impl SceneMetaData {
    pub fn new(name: impl Into<String>, export_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            export_enabled: true,
            export_path: export_path.into(),
            import_enabled: true,
            import_source: None,
            translate_coordinate_systems: true,
            point_providers: Vec::new(),
            spline_providers: Vec::new(),
        }
    }

    /// Metadata exported to `World-<name>/MetaData.geo` under the
    /// configured geometry directory.
    pub fn from_settings(name: impl Into<String>, settings: &GeoSettings) -> Self {
        let name = name.into();
        let export_path = settings.export_path(&format!("World-{}/MetaData", name));
        let mut metadata = Self::new(name, export_path);
        metadata.translate_coordinate_systems = settings.translate_coordinate_systems;
        metadata
    }

    pub fn with_import_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.import_source = Some(path.into());
        self
    }

    pub fn add_point_provider(&mut self, provider: impl PointProvider + 'static) {
        self.point_providers.push(Box::new(provider));
    }

    pub fn add_spline_provider(&mut self, provider: impl SplineProvider + 'static) {
        self.spline_providers.push(Box::new(provider));
    }

    pub fn can_export(&self) -> bool {
        self.export_enabled
    }

    pub fn can_import(&self) -> bool {
        self.import_enabled && self.import_source.is_some()
    }

    /// Whether `path` is this metadata's import source.
    pub fn imports_from(&self, path: &Path) -> bool {
        self.can_import() && self.import_source.as_deref() == Some(path)
    }

    /// Collect every provider's records into a new container.
    ///
    /// All points go through one `add_points` call and all splines through
    /// one `add_splines` call, so the point records must share one type.
    pub fn build_geometry(&self) -> GeoResult<GeoContainer> {
        let mut geo = GeoContainer::new();

        let mut points: Vec<Box<dyn PointRecord>> = Vec::new();
        for provider in &self.point_providers {
            provider.collect_points(&mut points);
        }
        if !points.is_empty() {
            geo.add_points(&points, self.translate_coordinate_systems)?;
        }

        let mut splines: Vec<Box<dyn SplineRecord>> = Vec::new();
        for provider in &self.spline_providers {
            provider.collect_splines(&mut splines);
        }
        if !splines.is_empty() {
            geo.add_splines(&splines, self.translate_coordinate_systems)?;
        }

        Ok(geo)
    }

    /// Build the metadata geometry and write it to the export path.
    pub fn export(&self, options: &EncodeOptions) -> MetaDataResult<GeoContainer> {
        if !self.can_export() {
            return Err(MetaDataError::ExportDisabled(self.name.clone()));
        }

        let geo = self.build_geometry()?;
        write_geo(&self.export_path, &geo, options)?;
        log::info!(
            "Exported scene metadata '{}': {} points, {} primitives",
            self.name,
            geo.point_count(),
            geo.prim_count()
        );
        Ok(geo)
    }

    /// Read the import source and populate `container` from it.
    pub fn import<L, C>(
        &self,
        library: &L,
        container: &mut C,
        populator: &mut ScenePopulator,
    ) -> MetaDataResult<PopulateReport>
    where
        L: PrototypeLibrary + ?Sized,
        C: InstanceContainer + ?Sized,
    {
        let source = match &self.import_source {
            Some(source) if self.import_enabled => source,
            _ => return Err(MetaDataError::ImportDisabled(self.name.clone())),
        };

        let geo = read_geo(source)?;
        Ok(self.populate_from(&geo, library, container, populator))
    }

    /// Populate `container` from already decoded metadata geometry.
    pub fn populate_from<L, C>(
        &self,
        geo: &GeoContainer,
        library: &L,
        container: &mut C,
        populator: &mut ScenePopulator,
    ) -> PopulateReport
    where
        L: PrototypeLibrary + ?Sized,
        C: InstanceContainer + ?Sized,
    {
        log::info!("Importing scene metadata '{}'...", self.name);
        let points: Vec<PopulatablePoint> = geo.points(self.translate_coordinate_systems);
        populator.populate(&points, library, container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::GeoImporter;
    use crate::geometry::POSITION_ATTRIBUTE;
    use crate::point::PointData;
    use crate::primitive::Primitive;
    use crate::scene::{PrototypeKind, Scene};
    use crate::spline::SplineData;
    use crate::AttributeOwner;
    use hgeo_math::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Props(Vec<PopulatablePoint>);

    impl PointProvider for Props {
        fn collect_points(&self, points: &mut Vec<Box<dyn PointRecord>>) {
            for point in &self.0 {
                points.push(Box::new(point.clone()));
            }
        }
    }

    struct Roads(Vec<SplineData<PointData>>);

    impl SplineProvider for Roads {
        fn collect_splines(&self, splines: &mut Vec<Box<dyn SplineRecord>>) {
            for spline in &self.0 {
                splines.push(Box::new(spline.clone()));
            }
        }
    }

    fn library() -> Scene {
        let mut scene = Scene::new("Level");
        scene.add_prototype("Assets/Props/Crate.prefab", PrototypeKind::Prefab);
        scene.add_prototype("Assets/Props/Barrel.prefab", PrototypeKind::Prefab);
        scene
    }

    fn metadata(dir: &Path) -> SceneMetaData {
        let mut metadata = SceneMetaData::new("Level", dir.join("World-Level/MetaData.geo"));
        metadata.add_point_provider(Props(vec![
            PopulatablePoint::new(Vec3::new(1.0, 0.0, 0.0), "Crate"),
            PopulatablePoint::new(Vec3::new(0.0, 0.0, 5.0), "Barrel"),
        ]));
        metadata.add_point_provider(Props(vec![PopulatablePoint::new(Vec3::Z, "Crate")]));
        metadata.add_spline_provider(Roads(vec![SplineData::open(vec![
            PointData::new(Vec3::ZERO),
            PointData::new(Vec3::X),
            PointData::new(Vec3::new(2.0, 0.0, 1.0)),
        ])]));
        metadata
    }

    #[test]
    fn test_build_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let geo = metadata(dir.path()).build_geometry().unwrap();

        assert_eq!(geo.point_count(), 6);
        assert_eq!(geo.vertex_count(), 3);
        assert_eq!(geo.prim_count(), 1);
        assert!(matches!(geo.primitives()[0], Primitive::NurbCurve(_)));
        assert!(geo.attribute("name", AttributeOwner::Point).is_some());

        // Mirrored into file space.
        let positions = geo.vec3_values(POSITION_ATTRIBUTE, AttributeOwner::Point).unwrap();
        assert_eq!(positions[0], Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_mixed_providers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut metadata = metadata(dir.path());

        struct Markers;
        impl PointProvider for Markers {
            fn collect_points(&self, points: &mut Vec<Box<dyn PointRecord>>) {
                points.push(Box::new(PointData::new(Vec3::ONE)));
            }
        }
        metadata.add_point_provider(Markers);

        assert!(matches!(
            metadata.build_geometry(),
            Err(GeoError::MixedRecordTypes { .. })
        ));
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = metadata(dir.path());
        metadata.export(&EncodeOptions::default()).unwrap();
        assert!(metadata.export_path.exists());

        let metadata = metadata.with_import_source(dir.path().join("World-Level/MetaData.geo"));
        let mut scene = library();
        let mut populator = ScenePopulator::default();
        let report = metadata
            .import(&scene.prototypes, &mut scene.instances, &mut populator)
            .unwrap();

        // Spline points carry no name and are skipped.
        assert_eq!(report.spawned, 3);
        assert_eq!(report.skipped, 3);
        assert_eq!(scene.instance_count(), 3);

        let crate_at_x = scene
            .instances
            .iter()
            .find(|i| i.prototype.as_deref() == Some("Assets/Props/Crate.prefab"))
            .unwrap();
        assert!((crate_at_x.transform.translation - Vec3::new(1.0, 0.0, 0.0)).length() < 0.001);

        // A second pass reuses everything.
        let report = metadata
            .import(&scene.prototypes, &mut scene.instances, &mut populator)
            .unwrap();
        assert_eq!(report.reused, 3);
        assert_eq!(report.spawned, 0);
        assert_eq!(scene.instance_count(), 3);
    }

    #[test]
    fn test_disabled_flows() {
        let dir = tempfile::tempdir().unwrap();
        let mut metadata = metadata(dir.path());
        assert!(!metadata.can_import());

        let mut scene = library();
        let err = metadata
            .import(&scene.prototypes, &mut scene.instances, &mut ScenePopulator::default())
            .unwrap_err();
        assert!(matches!(err, MetaDataError::ImportDisabled(_)));

        metadata.export_enabled = false;
        let err = metadata.export(&EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, MetaDataError::ExportDisabled(name) if name == "Level"));
        assert!(!metadata.export_path.exists());
    }

    #[test]
    fn test_from_settings() {
        let settings = GeoSettings {
            translate_coordinate_systems: false,
            ..Default::default()
        };
        let metadata = SceneMetaData::from_settings("Docks", &settings);
        assert_eq!(metadata.export_path, PathBuf::from("geo/World-Docks/MetaData.geo"));
        assert!(!metadata.translate_coordinate_systems);
    }

    #[test]
    fn test_populate_on_import_notification() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = metadata(dir.path());
        metadata.export(&EncodeOptions::default()).unwrap();
        let source = metadata.export_path.clone();
        let metadata = metadata.with_import_source(&source);

        let scene = Rc::new(RefCell::new(library()));
        let mut importer = GeoImporter::new();
        {
            let scene = Rc::clone(&scene);
            let mut populator = ScenePopulator::default();
            importer.subscribe(move |path, geo| {
                if metadata.imports_from(path) {
                    let mut scene = scene.borrow_mut();
                    let Scene { prototypes, instances, .. } = &mut *scene;
                    metadata.populate_from(geo, prototypes, instances, &mut populator);
                }
            });
        }

        importer.import(&source).unwrap();
        assert_eq!(scene.borrow().instance_count(), 3);
    }
}
