//! Sentence -> `Vessel` pipeline.
//!
//! One complete `!AIVDM`/`!AIVDO` sentence in, at most one vessel out:
//! - ASCII check and comma split
//! - Armor-unpack the payload field
//! - Message type (bits 0-5) and MMSI (bits 8-37)
//! - Position via the layout table
//!
//! Checksums are not verified and multi-fragment messages are not joined.

use std::sync::Arc;

use crate::armor;
use crate::coords;
use crate::layout::FieldLayoutTable;
use crate::types::*;

/// Decodes sentences against a shared, read-only layout table.
#[derive(Debug, Clone)]
pub struct VesselFactory {
    layout: Arc<FieldLayoutTable>,
}

impl VesselFactory {
    pub fn new(layout: Arc<FieldLayoutTable>) -> Self {
        VesselFactory { layout }
    }

    pub fn layout(&self) -> &FieldLayoutTable {
        &self.layout
    }

    /// Decode one sentence, discarding the reason on failure.
    pub fn process(&self, raw: &[u8]) -> Option<Vessel> {
        match self.try_process(raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(error = %e, "sentence dropped");
                None
            }
        }
    }

    /// Decode one sentence, reporting why it produced no vessel.
    pub fn try_process(&self, raw: &[u8]) -> Result<Vessel> {
        if !raw.is_ascii() {
            return Err(AisError::MalformedSentence("non-ASCII bytes".into()));
        }
        // ASCII is valid UTF-8
        let text = std::str::from_utf8(raw)
            .map_err(|e| AisError::MalformedSentence(e.to_string()))?
            .trim();

        let payload = payload_field(text)?;
        let buf = armor::decode(payload)?;

        let message_type = buf.extract_unsigned(MESSAGE_TYPE_FIELD.0, MESSAGE_TYPE_FIELD.1) as u32;
        let mmsi = buf.extract_unsigned(MMSI_FIELD.0, MMSI_FIELD.1) as Mmsi;

        let (latitude, longitude) = coords::decode_lat_lon(&buf, &self.layout, message_type)
            .ok_or(AisError::MissingFieldSpec { message_type })?;

        Ok(Vessel {
            message_type,
            mmsi,
            latitude,
            longitude,
        })
    }
}

impl Default for VesselFactory {
    fn default() -> Self {
        VesselFactory::new(Arc::new(FieldLayoutTable::builtin()))
    }
}

/// Return the payload field of a sentence.
fn payload_field(text: &str) -> Result<&str> {
    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() < MIN_SENTENCE_FIELDS {
        return Err(AisError::MalformedSentence(format!(
            "expected at least {MIN_SENTENCE_FIELDS} fields, got {}",
            fields.len()
        )));
    }
    Ok(fields[PAYLOAD_FIELD_INDEX])
}

/// Decode with the bundled layout table.
pub fn decode(raw: &[u8]) -> Option<Vessel> {
    VesselFactory::default().process(raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FieldSpec;

    const TYPE1: &str = "!AIVDM,1,1,,A,15RTgt0PAso;90TKcjM8h6g208CQ,0*4A";
    const TYPE18: &str = "!AIVDM,1,1,,B,B52K>;h00Fc>jpUlNV@ikwpUoP06,0*4C";

    fn factory() -> VesselFactory {
        VesselFactory::default()
    }

    #[test]
    fn test_decode_type1() {
        let v = factory().process(TYPE1.as_bytes()).expect("vessel");
        assert_eq!(v.message_type, 1);
        assert_eq!(v.mmsi, 371798000);
        assert!((v.latitude - 48.381633).abs() < 1e-6);
        assert!((v.longitude - -123.395383).abs() < 1e-6);
    }

    #[test]
    fn test_decode_type18() {
        let v = factory().process(TYPE18.as_bytes()).expect("vessel");
        assert_eq!(v.message_type, 18);
        assert_eq!(v.mmsi, 338087471);
    }

    #[test]
    fn test_trailing_crlf() {
        let line = format!("{TYPE1}\r\n");
        assert!(factory().process(line.as_bytes()).is_some());
    }

    #[test]
    fn test_non_ascii_rejected() {
        let mut raw = TYPE1.as_bytes().to_vec();
        raw[20] = 0xC3;
        let err = factory().try_process(&raw).unwrap_err();
        assert!(matches!(err, AisError::MalformedSentence(_)));
    }

    #[test]
    fn test_too_few_fields() {
        // Five fields: index 5 does not exist
        let err = factory().try_process(b"!AIVDM,1,1,,A").unwrap_err();
        assert!(matches!(err, AisError::MalformedSentence(_)));
        assert!(factory().process(b"").is_none());
        assert!(factory().process(b"garbage").is_none());
    }

    #[test]
    fn test_exactly_six_fields() {
        let v = factory().process(b"!AIVDM,1,1,,A,15RTgt0PAso;90TKcjM8h6g208CQ");
        assert_eq!(v.map(|v| v.mmsi), Some(371798000));
    }

    #[test]
    fn test_invalid_armor() {
        let err = factory()
            .try_process(b"!AIVDM,1,1,,A,15RTgt0PAsoX90TKcjM8h6g208CQ,0*4A")
            .unwrap_err();
        assert!(matches!(err, AisError::InvalidArmorChar { ch: b'X', .. }));
    }

    #[test]
    fn test_type_without_position() {
        // Type 5 (static and voyage data) first fragment
        let err = factory()
            .try_process(b"!AIVDM,2,1,3,B,55P5TL01VIaAL@7WKO@mBplU@<PDhh000000001S;AJ::4A80?4i@E53,0*3E")
            .unwrap_err();
        assert!(matches!(err, AisError::MissingFieldSpec { message_type: 5 }));
    }

    #[test]
    fn test_custom_layout() {
        let table = FieldLayoutTable::default()
            .with_field(1, "lon", FieldSpec::new(61, 28))
            .with_field(1, "lat", FieldSpec::new(89, 27));
        let f = VesselFactory::new(Arc::new(table));
        assert!(f.process(TYPE1.as_bytes()).is_some());
        assert!(f.process(TYPE18.as_bytes()).is_none());
    }

    #[test]
    fn test_empty_payload_decodes_zeroes() {
        // Zero-length buffer: every field falls back to 0, type 0 has no layout
        let err = factory().try_process(b"!AIVDM,1,1,,A,,0*00").unwrap_err();
        assert!(matches!(err, AisError::MissingFieldSpec { message_type: 0 }));
    }

    #[test]
    fn test_free_decode_fn() {
        assert_eq!(decode(TYPE1.as_bytes()).map(|v| v.mmsi), Some(371798000));
    }

    #[test]
    fn test_factory_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VesselFactory>();
    }
}
