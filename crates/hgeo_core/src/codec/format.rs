//! Keys and storage names of the JSON geometry layout.
//!
//! A geometry file is a flat JSON array of alternating keys and values.
//! Most nested records use the same convention, which is what
//! [`KeyValues`](crate::codec::KeyValues) reads.

use crate::attribute::{AttributeOwner, AttributeType};

/// Leading bytes of a binary (`.bgeo`) geometry file.
pub const BINARY_MAGIC: [u8; 5] = [0x7f, b'N', b'S', b'J', b'b'];

/// File extension of ASCII geometry files.
pub const GEO_EXTENSION: &str = "geo";

/// Section key of each attribute owner inside `attributes`.
pub fn owner_section(owner: AttributeOwner) -> &'static str {
    match owner {
        AttributeOwner::Vertex => "vertexattributes",
        AttributeOwner::Point => "pointattributes",
        AttributeOwner::Primitive => "primitiveattributes",
        AttributeOwner::Detail => "globalattributes",
    }
}

/// Storage name written for an attribute type.
pub fn storage_name(attribute_type: AttributeType) -> &'static str {
    match attribute_type {
        AttributeType::Integer | AttributeType::String => "int32",
        AttributeType::Float => "fpreal32",
    }
}

/// Attribute type for a numeric storage name, if it is one we read.
pub fn storage_type(storage: &str) -> Option<AttributeType> {
    match storage {
        "fpreal16" | "fpreal32" | "fpreal64" => Some(AttributeType::Float),
        "uint8" | "int8" | "int16" | "int32" | "int64" => Some(AttributeType::Integer),
        _ => None,
    }
}

/// Value of the `type` hint in a numeric attribute's options.
///
/// Houdini uses the hint to decide how transforms affect the attribute.
pub fn type_hint(name: &str, attribute_type: AttributeType, tuple_size: usize) -> Option<&'static str> {
    if attribute_type != AttributeType::Float {
        return None;
    }
    match (name, tuple_size) {
        ("P", 3) => Some("point"),
        ("N", 3) => Some("normal"),
        ("v", 3) | ("up", 3) => Some("vector"),
        ("Cd", 3) => Some("color"),
        ("orient", 4) => Some("quaternion"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_names() {
        assert_eq!(storage_type(storage_name(AttributeType::Float)), Some(AttributeType::Float));
        assert_eq!(storage_type(storage_name(AttributeType::Integer)), Some(AttributeType::Integer));
        assert_eq!(storage_type("fpreal64"), Some(AttributeType::Float));
        assert_eq!(storage_type("int8"), Some(AttributeType::Integer));
        assert_eq!(storage_type("string"), None);
    }

    #[test]
    fn test_type_hints() {
        assert_eq!(type_hint("P", AttributeType::Float, 3), Some("point"));
        assert_eq!(type_hint("P", AttributeType::Float, 4), None);
        assert_eq!(type_hint("orient", AttributeType::Float, 4), Some("quaternion"));
        assert_eq!(type_hint("id", AttributeType::Integer, 1), None);
    }
}
