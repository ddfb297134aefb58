//! Houdini geometry (`.geo`) file support.
//!
//! This module reads and writes the ASCII JSON flavour of Houdini's
//! geometry format and converts it to and from [`GeoContainer`].
//!
//! ## Supported Features
//!
//! - Point, vertex, primitive and detail (global) attributes with `int32` /
//!   `fpreal32` storage, plus string attributes
//! - `Poly` and `NURBCurve` primitives, and `run` blocks of polygons
//! - Point and primitive groups (`i8` and `boolRLE` selections)
//!
//! ## Not Supported
//!
//! - Binary `.bgeo` files (detected and rejected)
//! - Other primitive types (spheres, volumes, packed primitives, ...)
//! - Paged attribute data (`rawpagedata`)
//!
//! # Example
//!
//! ```ignore
//! use hgeo_core::codec::{read_geo, write_geo, EncodeOptions};
//!
//! let geo = read_geo("terrain.geo")?;
//! println!("{} points, {} primitives", geo.point_count(), geo.prim_count());
//! write_geo("terrain_copy.geo", &geo, &EncodeOptions::default())?;
//! ```
//!
//! [`GeoContainer`]: crate::geometry::GeoContainer

mod format;
mod reader;
mod writer;
mod events;

pub use format::*;
pub use reader::*;
pub use writer::*;
pub use events::*;
