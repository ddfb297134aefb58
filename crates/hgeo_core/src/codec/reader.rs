//! Geometry file decoding.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::attribute::{Attribute, AttributeData, AttributeOwner, AttributeType};
use crate::codec::format::{owner_section, storage_type, BINARY_MAGIC};
use crate::error::GeoError;
use crate::geometry::GeoContainer;
use crate::group::GroupType;
use crate::primitive::{NurbCurvePrimitive, PolyPrimitive, Primitive, CUBIC_ORDER};

/// Errors that can occur while decoding a geometry file.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary geometry files are not supported, save as ASCII .geo")]
    BinaryFormat,

    #[error("Missing key: {0}")]
    MissingKey(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Unsupported primitive type: {0}")]
    UnsupportedPrimitive(String),

    #[error("Unsupported attribute storage: {0}")]
    UnsupportedStorage(String),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeoError),
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

fn invalid(message: impl Into<String>) -> DecodeError {
    DecodeError::InvalidStructure(message.into())
}

/// Read view over a flat `[key, value, key, value, ...]` array.
#[derive(Clone, Copy, Debug)]
pub struct KeyValues<'a> {
    entries: &'a [Value],
    context: &'static str,
}

impl<'a> KeyValues<'a> {
    /// Wrap `value`, which must be an array of even length.
    ///
    /// `context` names the record in error messages.
    pub fn new(value: &'a Value, context: &'static str) -> DecodeResult<Self> {
        let entries = as_array(value, context)?;
        if entries.len() % 2 != 0 {
            return Err(invalid(format!("{} has an odd number of entries", context)));
        }
        Ok(Self { entries, context })
    }

    /// Value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.entries
            .chunks_exact(2)
            .find(|pair| pair[0].as_str() == Some(key))
            .map(|pair| &pair[1])
    }

    /// Value stored under `key`, or a [`DecodeError::MissingKey`].
    pub fn require(&self, key: &str) -> DecodeResult<&'a Value> {
        self.get(key)
            .ok_or_else(|| DecodeError::MissingKey(format!("{}.{}", self.context, key)))
    }
}

fn as_array<'a>(value: &'a Value, what: &str) -> DecodeResult<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| invalid(format!("{} must be an array", what)))
}

fn as_str<'a>(value: &'a Value, what: &str) -> DecodeResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| invalid(format!("{} must be a string", what)))
}

fn as_usize(value: &Value, what: &str) -> DecodeResult<usize> {
    value
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| invalid(format!("{} must be a non-negative integer", what)))
}

/// Booleans are sometimes written as 0/1.
fn as_bool(value: &Value, what: &str) -> DecodeResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().map_or(false, |v| v != 0.0)),
        _ => Err(invalid(format!("{} must be a boolean", what))),
    }
}

fn usize_array(value: &Value, what: &str) -> DecodeResult<Vec<usize>> {
    as_array(value, what)?
        .iter()
        .map(|v| as_usize(v, what))
        .collect()
}

fn pair<'a>(value: &'a Value, what: &str) -> DecodeResult<(&'a Value, &'a Value)> {
    match as_array(value, what)? {
        [header, body] => Ok((header, body)),
        _ => Err(invalid(format!("{} must be a [header, body] pair", what))),
    }
}

/// Decode a geometry from ASCII JSON text.
pub fn decode(text: &str) -> DecodeResult<GeoContainer> {
    if text.as_bytes().first() == Some(&BINARY_MAGIC[0]) {
        return Err(DecodeError::BinaryFormat);
    }
    let value: Value = serde_json::from_str(text)?;
    decode_value(&value)
}

/// Decode a geometry from a byte stream.
pub fn decode_reader<R: Read>(mut reader: R) -> DecodeResult<GeoContainer> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.starts_with(&BINARY_MAGIC) || bytes.first() == Some(&BINARY_MAGIC[0]) {
        return Err(DecodeError::BinaryFormat);
    }
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| invalid(format!("file is not valid UTF-8: {}", e)))?;
    decode(text)
}

/// Read a `.geo` file.
///
/// # Example
///
/// ```ignore
/// use hgeo_core::codec::read_geo;
///
/// let geo = read_geo("geo/Splines/roads.geo")?;
/// println!("{} curves", geo.nurb_curve_primitives().count());
/// ```
pub fn read_geo<P: AsRef<Path>>(path: P) -> DecodeResult<GeoContainer> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let geo = decode_reader(BufReader::new(file))?;
    log::info!(
        "Loaded {}: {} points, {} vertices, {} primitives, {} attributes",
        path.display(),
        geo.point_count(),
        geo.vertex_count(),
        geo.prim_count(),
        geo.attributes().len()
    );
    Ok(geo)
}

/// Decode a geometry from an already parsed JSON document.
pub fn decode_value(value: &Value) -> DecodeResult<GeoContainer> {
    let root = KeyValues::new(value, "file")?;
    let point_count = as_usize(root.require("pointcount")?, "pointcount")?;
    let vertex_count = as_usize(root.require("vertexcount")?, "vertexcount")?;
    let prim_count = as_usize(root.require("primitivecount")?, "primitivecount")?;

    let mut geo = GeoContainer::new();
    geo.add_point_block(point_count);

    // Topology first, so attributes can be checked against final counts
    let point_refs = match root.get("topology") {
        Some(topology) => {
            let topology = KeyValues::new(topology, "topology")?;
            let pointref = KeyValues::new(topology.require("pointref")?, "pointref")?;
            usize_array(pointref.require("indices")?, "pointref indices")?
        }
        None => Vec::new(),
    };
    if point_refs.len() != vertex_count {
        return Err(invalid(format!(
            "vertexcount is {} but the topology lists {} vertices",
            vertex_count,
            point_refs.len()
        )));
    }
    for point in point_refs {
        geo.add_vertex(point)?;
    }

    if let Some(primitives) = root.get("primitives") {
        decode_primitives(&mut geo, primitives)?;
    }
    if geo.prim_count() != prim_count {
        return Err(invalid(format!(
            "primitivecount is {} but {} primitives were read",
            prim_count,
            geo.prim_count()
        )));
    }

    if let Some(attributes) = root.get("attributes") {
        let sections = KeyValues::new(attributes, "attributes")?;
        for owner in AttributeOwner::ALL {
            let section = owner_section(owner);
            if let Some(list) = sections.get(section) {
                for entry in as_array(list, section)? {
                    let attribute = decode_attribute(entry, owner)?;
                    geo.add_attribute(attribute)?;
                }
            }
        }
    }

    for (key, group_type) in [
        ("pointgroups", GroupType::Points),
        ("primitivegroups", GroupType::Primitives),
    ] {
        if let Some(groups) = root.get(key) {
            let element_count = match group_type {
                GroupType::Points => geo.point_count(),
                GroupType::Primitives => geo.prim_count(),
            };
            for entry in as_array(groups, key)? {
                let (name, members) = decode_group(entry, element_count)?;
                geo.add_group(&name, group_type, members)?;
            }
        }
    }

    geo.validate()?;
    Ok(geo)
}

// ----------------------------------------------------------------------------
// Attributes
// ----------------------------------------------------------------------------

fn decode_attribute(entry: &Value, owner: AttributeOwner) -> DecodeResult<Attribute> {
    let (header, body) = pair(entry, "attribute")?;
    let header = KeyValues::new(header, "attribute header")?;
    let body = KeyValues::new(body, "attribute body")?;

    let name = as_str(header.require("name")?, "attribute name")?;
    let kind = as_str(header.require("type")?, "attribute type")?;
    let tuple_size = match body.get("size") {
        Some(size) => as_usize(size, "attribute size")?,
        None => 1,
    };
    if tuple_size == 0 {
        return Err(invalid(format!("attribute '{}' has tuple size 0", name)));
    }

    let data = match kind {
        "numeric" => {
            let storage = as_str(body.require("storage")?, "attribute storage")?;
            let attribute_type = storage_type(storage)
                .ok_or_else(|| DecodeError::UnsupportedStorage(storage.to_string()))?;
            let values = KeyValues::new(body.require("values")?, "attribute values")?;
            let components = read_components(&values, tuple_size)?;
            numeric_data(attribute_type, &components, name)?
        }
        "string" => {
            let strings = as_array(body.require("strings")?, "strings")?
                .iter()
                .map(|s| as_str(s, "strings").map(str::to_string))
                .collect::<DecodeResult<Vec<_>>>()?;
            let indices = KeyValues::new(body.require("indices")?, "string indices")?;
            let values = read_components(&indices, tuple_size)?
                .into_iter()
                .map(|v| lookup_string(&strings, v, name))
                .collect::<DecodeResult<Vec<_>>>()?;
            AttributeData::String(values)
        }
        other => return Err(DecodeError::UnsupportedStorage(other.to_string())),
    };

    Ok(Attribute::with_data(name, owner, tuple_size, data)?)
}

/// Flatten packed attribute values into tuple-major component order.
///
/// `tuples` holds one array per element. `arrays` holds one array per
/// component, or a single flat array.
fn read_components<'a>(values: &KeyValues<'a>, tuple_size: usize) -> DecodeResult<Vec<&'a Value>> {
    if let Some(tuples) = values.get("tuples") {
        let mut components = Vec::new();
        for tuple in as_array(tuples, "tuples")? {
            let tuple = as_array(tuple, "tuple")?;
            if tuple.len() != tuple_size {
                return Err(invalid(format!(
                    "tuple has {} components, expected {}",
                    tuple.len(),
                    tuple_size
                )));
            }
            components.extend(tuple);
        }
        return Ok(components);
    }

    if let Some(arrays) = values.get("arrays") {
        let arrays = as_array(arrays, "arrays")?
            .iter()
            .map(|a| as_array(a, "array"))
            .collect::<DecodeResult<Vec<_>>>()?;

        return match arrays.as_slice() {
            [flat] => Ok(flat.iter().collect()),
            columns if columns.len() == tuple_size => {
                let count = columns[0].len();
                if columns.iter().any(|c| c.len() != count) {
                    return Err(invalid("component arrays have different lengths"));
                }
                Ok((0..count)
                    .flat_map(|i| columns.iter().map(move |c| &c[i]))
                    .collect())
            }
            _ => Err(invalid(format!(
                "{} component arrays for tuple size {}",
                arrays.len(),
                tuple_size
            ))),
        };
    }

    if values.get("rawpagedata").is_some() {
        return Err(invalid("paged attribute data is not supported"));
    }
    Err(DecodeError::MissingKey("attribute values.tuples".to_string()))
}

fn numeric_data(
    attribute_type: AttributeType,
    components: &[&Value],
    name: &str,
) -> DecodeResult<AttributeData> {
    let not_numeric = || invalid(format!("attribute '{}' has a non-numeric value", name));
    match attribute_type {
        AttributeType::Float => components
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32).ok_or_else(not_numeric))
            .collect::<DecodeResult<Vec<_>>>()
            .map(AttributeData::Float),
        AttributeType::Integer => components
            .iter()
            .map(|v| {
                v.as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .ok_or_else(not_numeric)
            })
            .collect::<DecodeResult<Vec<_>>>()
            .map(AttributeData::Integer),
        AttributeType::String => Err(DecodeError::UnsupportedStorage("string".to_string())),
    }
}

/// Negative indices mean "no string".
fn lookup_string(strings: &[String], index: &Value, name: &str) -> DecodeResult<String> {
    let index = index
        .as_i64()
        .ok_or_else(|| invalid(format!("attribute '{}' has a non-integer string index", name)))?;
    if index < 0 {
        return Ok(String::new());
    }
    usize::try_from(index)
        .ok()
        .and_then(|i| strings.get(i))
        .cloned()
        .ok_or_else(|| {
            invalid(format!(
                "attribute '{}' string index {} out of range ({} strings)",
                name,
                index,
                strings.len()
            ))
        })
}

// ----------------------------------------------------------------------------
// Primitives
// ----------------------------------------------------------------------------

fn decode_primitives(geo: &mut GeoContainer, value: &Value) -> DecodeResult<()> {
    for entry in as_array(value, "primitives")? {
        let (header, body) = pair(entry, "primitive")?;
        let header = KeyValues::new(header, "primitive header")?;
        let prim_type = as_str(header.require("type")?, "primitive type")?;

        match prim_type {
            "Poly" => {
                let body = KeyValues::new(body, "polygon")?;
                geo.add_primitive(decode_poly(&body)?)?;
            }
            "NURBCurve" => {
                let body = KeyValues::new(body, "curve")?;
                geo.add_primitive(decode_nurb_curve(&body)?)?;
            }
            "run" => decode_run(geo, &header, body)?,
            other => return Err(DecodeError::UnsupportedPrimitive(other.to_string())),
        }
    }
    Ok(())
}

fn decode_poly(body: &KeyValues) -> DecodeResult<Primitive> {
    let vertices = usize_array(body.require("vertex")?, "polygon vertex")?;
    let closed = match body.get("closed") {
        Some(closed) => as_bool(closed, "closed")?,
        None => true,
    };
    Ok(Primitive::Poly(PolyPrimitive { vertices, closed }))
}

fn decode_nurb_curve(body: &KeyValues) -> DecodeResult<Primitive> {
    let vertices = usize_array(body.require("vertex")?, "curve vertex")?;
    let closed = match body.get("closed") {
        Some(closed) => as_bool(closed, "closed")?,
        None => false,
    };

    let basis = KeyValues::new(body.require("basis")?, "basis")?;
    if let Some(basis_type) = basis.get("type") {
        let basis_type = as_str(basis_type, "basis type")?;
        if basis_type != "NURBS" {
            return Err(DecodeError::UnsupportedPrimitive(format!(
                "NURBCurve with {} basis",
                basis_type
            )));
        }
    }
    let order = match basis.get("order") {
        Some(order) => u32::try_from(as_usize(order, "order")?)
            .ok()
            .filter(|&o| o >= 2)
            .ok_or_else(|| invalid("curve order must be at least 2"))?,
        None => CUBIC_ORDER,
    };
    let end_interpolation = match basis.get("endinterpolation") {
        Some(v) => as_bool(v, "endinterpolation")?,
        None => true,
    };
    let knots = as_array(basis.require("knots")?, "knots")?
        .iter()
        .map(|k| {
            k.as_f64()
                .map(|k| k as f32)
                .ok_or_else(|| invalid("knots must be numbers"))
        })
        .collect::<DecodeResult<Vec<_>>>()?;

    Ok(Primitive::NurbCurve(NurbCurvePrimitive {
        vertices,
        order,
        end_interpolation,
        knots,
        closed,
    }))
}

/// A run block: many primitives of one type sharing uniform fields.
fn decode_run(geo: &mut GeoContainer, header: &KeyValues, body: &Value) -> DecodeResult<()> {
    let run_type = as_str(header.require("runtype")?, "runtype")?;
    if run_type != "Poly" {
        return Err(DecodeError::UnsupportedPrimitive(format!("run of {}", run_type)));
    }

    let varying = match header.get("varyingfields") {
        Some(fields) => as_array(fields, "varyingfields")?
            .iter()
            .map(|f| as_str(f, "varyingfields"))
            .collect::<DecodeResult<Vec<_>>>()?,
        None => Vec::new(),
    };
    let uniform_closed = match header.get("uniformfields").and_then(|u| u.get("closed")) {
        Some(closed) => as_bool(closed, "closed")?,
        None => true,
    };

    for item in as_array(body, "run")? {
        let fields = as_array(item, "run entry")?;
        if fields.len() != varying.len() {
            return Err(invalid(format!(
                "run entry has {} fields, expected {}",
                fields.len(),
                varying.len()
            )));
        }

        let mut vertices = Vec::new();
        let mut closed = uniform_closed;
        for (field, value) in varying.iter().zip(fields) {
            match *field {
                "vertex" => vertices = usize_array(value, "run vertex")?,
                "closed" => closed = as_bool(value, "closed")?,
                other => log::debug!("Ignoring varying run field '{}'", other),
            }
        }
        geo.add_primitive(Primitive::Poly(PolyPrimitive { vertices, closed }))?;
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Groups
// ----------------------------------------------------------------------------

/// Decode one group. Run-length selections may not cover more than
/// `element_count` elements.
fn decode_group(entry: &Value, element_count: usize) -> DecodeResult<(String, Vec<usize>)> {
    let (header, body) = pair(entry, "group")?;
    let header = KeyValues::new(header, "group header")?;
    let body = KeyValues::new(body, "group body")?;
    let name = as_str(header.require("name")?, "group name")?.to_string();

    let selection = KeyValues::new(body.require("selection")?, "group selection")?;
    let unordered = KeyValues::new(selection.require("unordered")?, "unordered selection")?;

    let members = if let Some(flags) = unordered.get("i8") {
        as_array(flags, "i8 selection")?
            .iter()
            .enumerate()
            .filter_map(|(i, v)| match as_bool(v, "i8 selection") {
                Ok(true) => Some(Ok(i)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<DecodeResult<Vec<_>>>()?
    } else if let Some(runs) = unordered.get("boolRLE") {
        let runs = as_array(runs, "boolRLE selection")?;
        if runs.len() % 2 != 0 {
            return Err(invalid("boolRLE selection has an odd number of entries"));
        }
        let mut members = Vec::new();
        let mut next: usize = 0;
        for run in runs.chunks_exact(2) {
            let length = as_usize(&run[0], "boolRLE run length")?;
            let end = next
                .checked_add(length)
                .filter(|&end| end <= element_count)
                .ok_or_else(|| {
                    invalid(format!(
                        "group '{}' boolRLE runs exceed the {} elements of the geometry",
                        name, element_count
                    ))
                })?;
            if as_bool(&run[1], "boolRLE value")? {
                members.extend(next..end);
            }
            next = end;
        }
        members
    } else {
        return Err(DecodeError::MissingKey(format!(
            "group '{}' selection.unordered.i8",
            name
        )));
    };

    Ok((name, members))
}
