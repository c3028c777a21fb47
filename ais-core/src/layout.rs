//! Per-message-type field layout table.
//!
//! The table is external configuration: a JSON object keyed by message type
//! (as a decimal string), mapping field names to `{"index": .., "len": ..}`
//! bit ranges. It is loaded once at startup and only read afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{AisError, Result};

/// Table bundled with the crate, covering the position-carrying types.
const BUILTIN_LAYOUT: &str = include_str!("../data/ais.json");

pub const LON_FIELD: &str = "lon";
pub const LAT_FIELD: &str = "lat";

/// Bit range of one field within an unpacked payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "index")]
    pub start_bit: usize,
    #[serde(rename = "len")]
    pub length_bits: usize,
}

impl FieldSpec {
    pub const fn new(start_bit: usize, length_bits: usize) -> Self {
        FieldSpec {
            start_bit,
            length_bits,
        }
    }
}

/// Message type -> field name -> bit range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldLayoutTable {
    types: HashMap<u32, HashMap<String, FieldSpec>>,
}

impl FieldLayoutTable {
    /// Parse the external JSON form. Every key must be a message type number.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, FieldSpec>> =
            serde_json::from_str(text).map_err(|e| AisError::Layout(e.to_string()))?;

        let mut types = HashMap::with_capacity(raw.len());
        for (key, fields) in raw {
            let msg_type = key
                .trim()
                .parse::<u32>()
                .map_err(|_| AisError::Layout(format!("message type key {key:?} is not a number")))?;
            types.insert(msg_type, fields);
        }
        Ok(FieldLayoutTable { types })
    }

    /// Load a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AisError::Layout(format!("{}: {e}", path.display())))?;
        let table = Self::from_json(&text)?;
        tracing::debug!(
            path = %path.display(),
            message_types = table.types.len(),
            "loaded field layout table"
        );
        Ok(table)
    }

    /// The bundled ITU-R M.1371 layout.
    pub fn builtin() -> Self {
        // The bundled file is covered by tests; an empty table only means no positions.
        Self::from_json(BUILTIN_LAYOUT).unwrap_or_default()
    }

    /// Builder-style insertion, for assembling tables in code.
    pub fn with_field(mut self, msg_type: u32, name: &str, spec: FieldSpec) -> Self {
        self.types
            .entry(msg_type)
            .or_default()
            .insert(name.to_string(), spec);
        self
    }

    pub fn lookup(&self, msg_type: u32, field: &str) -> Option<FieldSpec> {
        self.types.get(&msg_type)?.get(field).copied()
    }

    /// `(lon, lat)` specs, or `None` if the type carries no position.
    pub fn position_specs(&self, msg_type: u32) -> Option<(FieldSpec, FieldSpec)> {
        let fields = self.types.get(&msg_type)?;
        Some((*fields.get(LON_FIELD)?, *fields.get(LAT_FIELD)?))
    }

    /// Message types that have both position fields, ascending.
    pub fn position_types(&self) -> Vec<u32> {
        let mut types: Vec<u32> = self
            .types
            .keys()
            .copied()
            .filter(|t| self.position_specs(*t).is_some())
            .collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_parses() {
        // builtin() hides parse errors, so check the raw text directly.
        let table = FieldLayoutTable::from_json(BUILTIN_LAYOUT).expect("bundled layout");
        assert_eq!(table, FieldLayoutTable::builtin());
        assert_eq!(table.position_types(), vec![1, 2, 3, 4, 9, 11, 18, 19, 21]);
    }

    #[test]
    fn test_builtin_class_a_offsets() {
        let table = FieldLayoutTable::builtin();
        for t in 1..=3 {
            assert_eq!(table.lookup(t, "lon"), Some(FieldSpec::new(61, 28)));
            assert_eq!(table.lookup(t, "lat"), Some(FieldSpec::new(89, 27)));
        }
        assert_eq!(
            table.position_specs(18),
            Some((FieldSpec::new(57, 28), FieldSpec::new(85, 27)))
        );
    }

    #[test]
    fn test_type_without_position() {
        let table = FieldLayoutTable::builtin();
        assert!(table.position_specs(5).is_none());
        assert!(table.lookup(5, "lon").is_none());
        assert!(table.position_specs(27).is_none());
    }

    #[test]
    fn test_partial_position_is_absent() {
        let table = FieldLayoutTable::default().with_field(1, "lon", FieldSpec::new(61, 28));
        assert!(table.lookup(1, "lon").is_some());
        assert!(table.position_specs(1).is_none());
        assert!(table.position_types().is_empty());
    }

    #[test]
    fn test_from_json_external_form() {
        let table = FieldLayoutTable::from_json(
            r#"{"1": {"lon": {"index": 61, "len": 28}, "lat": {"index": 89, "len": 27},
                      "mmsi": {"index": 8, "len": 30}}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(1, "mmsi"), Some(FieldSpec::new(8, 30)));
    }

    #[test]
    fn test_from_json_rejects_bad_key() {
        let err = FieldLayoutTable::from_json(r#"{"one": {}}"#).unwrap_err();
        assert!(matches!(err, AisError::Layout(_)));
    }

    #[test]
    fn test_from_json_rejects_bad_shape() {
        assert!(FieldLayoutTable::from_json(r#"{"1": {"lon": {"index": 61}}}"#).is_err());
        assert!(FieldLayoutTable::from_json("[1, 2]").is_err());
        assert!(FieldLayoutTable::from_json("").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"18": {{"lon": {{"index": 57, "len": 28}}, "lat": {{"index": 85, "len": 27}}}}}}"#
        )
        .unwrap();
        let table = FieldLayoutTable::load(file.path()).unwrap();
        assert_eq!(table.position_types(), vec![18]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = FieldLayoutTable::load("/nonexistent/ais.json").unwrap_err();
        assert!(matches!(err, AisError::Layout(_)));
    }
}
