//! HGeo Core - Houdini geometry for engine scenes.
//!
//! This crate provides:
//!
//! - **Geometry container**: points, vertices, primitives, typed attributes
//!   for every owner, and point/primitive groups
//! - **Point ingestion**: typed point records and splines written as
//!   attributes, groups and NURBS curves
//! - **Codec**: ASCII JSON `.geo` reading and writing
//! - **Scene population**: placing prototype instances from metadata points
//!
//! # Example
//!
//! ```ignore
//! use hgeo_core::codec::{write_geo, EncodeOptions};
//! use hgeo_core::{GeoContainer, PopulatablePoint};
//! use hgeo_math::Vec3;
//!
//! let points = vec![PopulatablePoint::new(Vec3::new(1.0, 0.0, 2.0), "Crate")];
//!
//! let mut geo = GeoContainer::new();
//! geo.add_points(&points, true)?;
//! write_geo("geo/props.geo", &geo, &EncodeOptions::default())?;
//! ```

pub mod attribute;
pub mod codec;
pub mod error;
pub mod geometry;
pub mod group;
pub mod mesh;
pub mod metadata;
pub mod placement;
pub mod point;
pub mod populate;
pub mod primitive;
pub mod scene;
pub mod settings;
pub mod spline;

mod ingest;
mod projection;

// Re-export commonly used types
pub use attribute::{Attribute, AttributeData, AttributeOwner, AttributeType};
pub use error::{GeoError, GeoResult};
pub use geometry::GeoContainer;
pub use group::{Group, GroupType};
pub use mesh::Mesh;
pub use metadata::{PointProvider, SceneMetaData, SplineProvider};
pub use placement::{Placement, PopulatablePoint};
pub use point::{PointData, PointRecord};
pub use populate::{PopulateReport, ScenePopulator};
pub use primitive::{NurbCurvePrimitive, PolyPrimitive, Primitive};
pub use scene::{Instance, InstanceContainer, Prototype, PrototypeKind, PrototypeLibrary, Scene, Transform};
pub use settings::GeoSettings;
pub use spline::{SplineData, SplineRecord};
