//! Decoding of the flattened per-variant attribute string.
//!
//! The variant read query collapses every attribute value linked to a variant
//! into one column of the form `id:type:value,id:type:value,...`. This module
//! turns that column back into attribute groups keyed by type. Nothing ever
//! encodes the string on the Rust side: writes insert link rows directly.

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Separator between triples.
pub const TRIPLE_SEPARATOR: char = ',';
/// Separator between the fields of a single triple.
pub const FIELD_SEPARATOR: char = ':';

/// One concrete attribute value linked to a variant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AttributeValueRef {
    pub id: i64,
    pub value: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeDecodeError {
    #[error("attribute triple '{0}' does not have the form id:type:value")]
    MalformedTriple(String),
    #[error("attribute value id '{0}' is not an integer")]
    InvalidId(String),
}

/// Attribute values grouped by attribute type.
///
/// Groups keep the order in which their type first appeared in the source
/// string, and values inside a group keep source order. Serializes as a JSON
/// object `{ "<type>": [{ "id": .., "value": .. }] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeGroups {
    groups: Vec<(String, Vec<AttributeValueRef>)>,
}

impl AttributeGroups {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct attribute types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Values recorded under `attribute_type`, if any.
    #[must_use]
    pub fn get(&self, attribute_type: &str) -> Option<&[AttributeValueRef]> {
        self.groups
            .iter()
            .find(|(t, _)| t == attribute_type)
            .map(|(_, values)| values.as_slice())
    }

    /// Attribute types in first-appearance order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(t, _)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AttributeValueRef])> {
        self.groups.iter().map(|(t, v)| (t.as_str(), v.as_slice()))
    }

    fn push(&mut self, attribute_type: &str, value: AttributeValueRef) {
        if let Some((_, values)) = self.groups.iter_mut().find(|(t, _)| t == attribute_type) {
            values.push(value);
        } else {
            self.groups.push((attribute_type.to_owned(), vec![value]));
        }
    }
}

impl Serialize for AttributeGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (attribute_type, values) in &self.groups {
            map.serialize_entry(attribute_type, values)?;
        }
        map.end()
    }
}

/// Decode a flattened attribute string into grouped attribute values.
///
/// `None` and the empty string both decode to an empty mapping. Each triple is
/// split into exactly three fields; the value field keeps any further `:`.
///
/// # Errors
///
/// Returns [`AttributeDecodeError`] if a triple has fewer than three fields or
/// its id is not an integer.
pub fn decode(flattened: Option<&str>) -> Result<AttributeGroups, AttributeDecodeError> {
    let mut groups = AttributeGroups::default();

    let Some(raw) = flattened.filter(|s| !s.is_empty()) else {
        return Ok(groups);
    };

    for triple in raw.split(TRIPLE_SEPARATOR) {
        let mut fields = triple.splitn(3, FIELD_SEPARATOR);
        let (Some(id), Some(attribute_type), Some(value)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(AttributeDecodeError::MalformedTriple(triple.to_owned()));
        };

        let id = id
            .trim()
            .parse::<i64>()
            .map_err(|_| AttributeDecodeError::InvalidId(id.to_owned()))?;

        groups.push(
            attribute_type,
            AttributeValueRef {
                id,
                value: value.to_owned(),
            },
        );
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_none_is_empty() {
        let groups = decode(None).expect("decode");
        assert!(groups.is_empty());
    }

    #[test]
    fn decode_empty_string_is_empty() {
        let groups = decode(Some("")).expect("decode");
        assert!(groups.is_empty());
    }

    #[test]
    fn decode_single_triple() {
        let groups = decode(Some("1:color:red")).expect("decode");
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups.get("color"),
            Some(
                &[AttributeValueRef {
                    id: 1,
                    value: "red".to_string()
                }][..]
            )
        );
    }

    #[test]
    fn decode_two_types_keeps_input_order() {
        let groups = decode(Some("1:size:M,2:color:red")).expect("decode");
        let types: Vec<&str> = groups.types().collect();
        assert_eq!(types, vec!["size", "color"]);
        assert_eq!(groups.get("size").map(<[_]>::len), Some(1));
        assert_eq!(groups.get("color").map(<[_]>::len), Some(1));
    }

    #[test]
    fn decode_groups_repeated_type_in_source_order() {
        let groups = decode(Some("3:color:blue,4:size:L,1:color:red")).expect("decode");
        let colors: Vec<i64> = groups
            .get("color")
            .expect("color group")
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(colors, vec![3, 1]);
    }

    #[test]
    fn decode_keeps_colons_inside_value() {
        let groups = decode(Some("9:ratio:16:9")).expect("decode");
        assert_eq!(groups.get("ratio").expect("ratio")[0].value, "16:9");
    }

    #[test]
    fn decode_rejects_short_triple() {
        let err = decode(Some("1:color")).expect_err("should fail");
        assert_eq!(err, AttributeDecodeError::MalformedTriple("1:color".into()));
    }

    #[test]
    fn decode_rejects_non_numeric_id() {
        let err = decode(Some("x:color:red")).expect_err("should fail");
        assert_eq!(err, AttributeDecodeError::InvalidId("x".into()));
    }

    #[test]
    fn groups_serialize_as_object() {
        let groups = decode(Some("1:color:red,2:size:M")).expect("decode");
        let json = serde_json::to_value(&groups).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "color": [{ "id": 1, "value": "red" }],
                "size": [{ "id": 2, "value": "M" }],
            })
        );
    }
}
