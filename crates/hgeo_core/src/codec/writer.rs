//! Geometry file encoding.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use hgeo_math::Bounds;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::attribute::{Attribute, AttributeData, AttributeOwner};
use crate::codec::format::{owner_section, storage_name, type_hint};
use crate::geometry::GeoContainer;
use crate::group::Group;
use crate::primitive::Primitive;

/// Errors that can occur while writing a geometry file.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON has no representation for NaN or infinity.
    #[error("{what} holds a non-finite value at index {index}")]
    NonFinite { what: String, index: usize },
}

/// Result type for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// File version written when none is configured.
pub const DEFAULT_FILE_VERSION: &str = "18.5.408";

/// Options controlling the written file.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeOptions {
    /// Value of the `fileversion` key
    pub file_version: String,

    /// Value of `info.software`
    pub software: String,

    /// Indent the JSON output
    pub pretty: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            file_version: DEFAULT_FILE_VERSION.to_string(),
            software: format!("hgeo {}", env!("CARGO_PKG_VERSION")),
            pretty: false,
        }
    }
}

impl EncodeOptions {
    pub fn with_file_version(mut self, version: impl Into<String>) -> Self {
        self.file_version = version.into();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Encode a geometry as ASCII JSON text.
pub fn encode(geo: &GeoContainer, options: &EncodeOptions) -> EncodeResult<String> {
    let value = encode_value(geo, options)?;
    Ok(if options.pretty {
        format!("{:#}", value)
    } else {
        value.to_string()
    })
}

/// Encode a geometry into a byte stream.
pub fn encode_writer<W: Write>(
    geo: &GeoContainer,
    options: &EncodeOptions,
    writer: W,
) -> EncodeResult<()> {
    let value = encode_value(geo, options)?;
    if options.pretty {
        serde_json::to_writer_pretty(writer, &value)?;
    } else {
        serde_json::to_writer(writer, &value)?;
    }
    Ok(())
}

/// Write a `.geo` file, creating parent directories as needed.
pub fn write_geo<P: AsRef<Path>>(
    path: P,
    geo: &GeoContainer,
    options: &EncodeOptions,
) -> EncodeResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    encode_writer(geo, options, &mut writer)?;
    writer.flush()?;

    log::info!(
        "Wrote {}: {} points, {} vertices, {} primitives",
        path.display(),
        geo.point_count(),
        geo.vertex_count(),
        geo.prim_count()
    );
    Ok(())
}

/// Build the JSON document for a geometry.
///
/// Fails if a float attribute or knot vector holds NaN or infinity.
pub fn encode_value(geo: &GeoContainer, options: &EncodeOptions) -> EncodeResult<Value> {
    check_finite(geo)?;

    let mut root = vec![
        json!("fileversion"),
        json!(options.file_version),
        json!("hasindex"),
        json!(false),
        json!("pointcount"),
        json!(geo.point_count()),
        json!("vertexcount"),
        json!(geo.vertex_count()),
        json!("primitivecount"),
        json!(geo.prim_count()),
        json!("info"),
        encode_info(geo, options),
        json!("topology"),
        json!(["pointref", ["indices", geo.point_refs()]]),
    ];

    if !geo.attributes().is_empty() {
        let mut sections = Vec::new();
        for owner in AttributeOwner::ALL {
            let attributes: Vec<Value> = geo.attributes_of(owner).map(encode_attribute).collect();
            if !attributes.is_empty() {
                sections.push(json!(owner_section(owner)));
                sections.push(Value::Array(attributes));
            }
        }
        root.push(json!("attributes"));
        root.push(Value::Array(sections));
    }

    root.push(json!("primitives"));
    root.push(Value::Array(geo.primitives().iter().map(encode_primitive).collect()));

    for (key, groups, count) in [
        ("pointgroups", geo.point_groups(), geo.point_count()),
        ("primitivegroups", geo.primitive_groups(), geo.prim_count()),
    ] {
        if !groups.is_empty() {
            root.push(json!(key));
            root.push(Value::Array(
                groups.iter().map(|g| encode_group(g, count)).collect(),
            ));
        }
    }

    Ok(Value::Array(root))
}

fn check_finite(geo: &GeoContainer) -> EncodeResult<()> {
    for attribute in geo.attributes() {
        if let AttributeData::Float(values) = attribute.data() {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(EncodeError::NonFinite {
                    what: format!("{} attribute '{}'", attribute.owner(), attribute.name()),
                    index,
                });
            }
        }
    }
    for (prim, primitive) in geo.primitives().iter().enumerate() {
        if let Primitive::NurbCurve(curve) = primitive {
            if let Some(index) = curve.knots.iter().position(|k| !k.is_finite()) {
                return Err(EncodeError::NonFinite {
                    what: format!("knot vector of primitive {}", prim),
                    index,
                });
            }
        }
    }
    Ok(())
}

fn encode_info(geo: &GeoContainer, options: &EncodeOptions) -> Value {
    let mut info = Map::new();
    info.insert("software".to_string(), json!(options.software));

    let bounds = Bounds::from_points(&geo.positions());
    if !bounds.is_empty() {
        info.insert(
            "bounds".to_string(),
            json!([
                bounds.min.x,
                bounds.max.x,
                bounds.min.y,
                bounds.max.y,
                bounds.min.z,
                bounds.max.z
            ]),
        );
    }

    let polys = geo.poly_primitives().count();
    let curves = geo.nurb_curve_primitives().count();
    let mut summary = Vec::new();
    if polys > 0 {
        summary.push(format!("{} Polygons", polys));
    }
    if curves > 0 {
        summary.push(format!("{} NURBS Curves", curves));
    }
    info.insert("primcount_summary".to_string(), json!(summary.join("\n")));

    Value::Object(info)
}

/// Packed values: one flat array for scalars, one array per tuple otherwise.
fn packed<T: Serialize>(tuple_size: usize, storage: &str, values: &[T]) -> Value {
    if tuple_size == 1 {
        json!(["size", 1, "storage", storage, "arrays", [values]])
    } else {
        let tuples: Vec<&[T]> = values.chunks(tuple_size).collect();
        json!(["size", tuple_size, "storage", storage, "tuples", tuples])
    }
}

fn encode_attribute(attribute: &Attribute) -> Value {
    let name = attribute.name();
    let size = attribute.tuple_size();

    let mut options = Map::new();
    if let Some(hint) = type_hint(name, attribute.attribute_type(), size) {
        options.insert("type".to_string(), json!({ "type": "string", "value": hint }));
    }

    match attribute.data() {
        AttributeData::String(values) => {
            let mut strings: Vec<&str> = Vec::new();
            let mut lookup: HashMap<&str, usize> = HashMap::new();
            let indices: Vec<usize> = values
                .iter()
                .map(|v| {
                    *lookup.entry(v.as_str()).or_insert_with(|| {
                        strings.push(v.as_str());
                        strings.len() - 1
                    })
                })
                .collect();

            json!([
                ["scope", "public", "type", "string", "name", name, "options", options],
                [
                    "size", size,
                    "storage", "int32",
                    "strings", strings,
                    "indices", packed(size, "int32", &indices)
                ]
            ])
        }
        data => {
            let storage = storage_name(data.attribute_type());
            let values = match data {
                AttributeData::Integer(v) => packed(size, storage, v),
                AttributeData::Float(v) => packed(size, storage, v),
                AttributeData::String(_) => Value::Null,
            };
            json!([
                ["scope", "public", "type", "numeric", "name", name, "options", options],
                [
                    "size", size,
                    "storage", storage,
                    "defaults", ["size", 1, "storage", "fpreal64", "values", [0]],
                    "values", values
                ]
            ])
        }
    }
}

fn encode_primitive(primitive: &Primitive) -> Value {
    match primitive {
        Primitive::Poly(poly) => json!([
            ["type", "Poly"],
            ["vertex", poly.vertices, "closed", poly.closed]
        ]),
        Primitive::NurbCurve(curve) => json!([
            ["type", "NURBCurve"],
            [
                "vertex", curve.vertices,
                "closed", curve.closed,
                "basis", [
                    "type", "NURBS",
                    "order", curve.order,
                    "endinterpolation", curve.end_interpolation,
                    "knots", curve.knots
                ]
            ]
        ]),
    }
}

fn encode_group(group: &Group, count: usize) -> Value {
    let flags: Vec<i8> = (0..count).map(|i| i8::from(group.contains(i))).collect();
    json!([
        ["name", group.name],
        ["selection", ["unordered", ["i8", flags]]]
    ])
}
