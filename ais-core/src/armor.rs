//! 6-bit ASCII armor unpacking and bit-range extraction.
//!
//! AIS payloads carry binary data as printable characters, six bits each.
//! Valid characters are `0x30..=0x57` and `0x60..=0x77`; anything else
//! invalidates the whole payload.
//!
//! The unpacked buffer keeps one byte per character. Only the low 6 bits are
//! significant, and bit `p` of the message lives in byte `p / 6`, MSB-first.

use crate::types::{AisError, Result};

/// Unpacked payload: one byte per armor character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
}

impl BitBuffer {
    /// Number of unpacked bytes (one per payload character).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Total addressable bits.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 6
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Read `length_bits` bits starting at `start_bit` as an unsigned integer.
    ///
    /// The first bit read becomes the most significant bit of the result.
    /// Returns 0 when the range runs past the end of the buffer.
    pub fn extract_unsigned(&self, start_bit: usize, length_bits: usize) -> u64 {
        let end = match start_bit.checked_add(length_bits) {
            Some(end) => end,
            None => return 0,
        };
        if self.bytes.len() < end.div_ceil(6) {
            return 0;
        }

        let mut acc = 0u64;
        for p in start_bit..end {
            let shift = 5 - (p % 6);
            let bit = (self.bytes[p / 6] >> shift) & 1;
            acc = (acc << 1) | bit as u64;
        }
        acc
    }
}

impl From<Vec<u8>> for BitBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        BitBuffer { bytes }
    }
}

/// True if `b` can appear in an armored payload.
pub fn is_armor_char(b: u8) -> bool {
    (0x30..=0x57).contains(&b) || (0x60..=0x77).contains(&b)
}

/// Map one armor character to its raw unpacked byte.
///
/// The arithmetic wraps at 256; the resulting byte has the 6-bit value in
/// its low bits and junk in the top two.
fn unarmor(b: u8) -> u8 {
    let b1 = b.wrapping_add(0x28);
    if b1 > 0x80 {
        b1.wrapping_add(0x20)
    } else {
        b1.wrapping_add(0x28)
    }
}

/// 6-bit value of a single armor character, or `None` if it is not one.
pub fn sixbit(b: u8) -> Option<u8> {
    is_armor_char(b).then(|| unarmor(b) & 0x3F)
}

/// Unpack an armored payload string.
///
/// Fails on the first invalid character; no partial buffer is returned.
pub fn decode(payload: &str) -> Result<BitBuffer> {
    let mut bytes = Vec::with_capacity(payload.len());
    for (position, b) in payload.bytes().enumerate() {
        if !is_armor_char(b) {
            return Err(AisError::InvalidArmorChar { ch: b, position });
        }
        bytes.push(unarmor(b));
    }
    Ok(BitBuffer { bytes })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_valid_char_yields_one_byte() {
        for b in (0x30u8..=0x57).chain(0x60..=0x77) {
            let s = (b as char).to_string();
            let buf = decode(&s).unwrap_or_else(|_| panic!("0x{b:02X} should decode"));
            assert_eq!(buf.len(), 1);
        }
    }

    #[test]
    fn test_every_invalid_char_rejects_payload() {
        for b in (0u8..0x80).filter(|b| !is_armor_char(*b)) {
            let s = format!("15RT{}gt0", b as char);
            assert!(decode(&s).is_err(), "0x{b:02X} should be rejected");
        }
    }

    #[test]
    fn test_invalid_char_reports_position() {
        match decode("15X0") {
            Err(AisError::InvalidArmorChar { ch, position }) => {
                assert_eq!(ch, b'X');
                assert_eq!(position, 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert!(decode("15é").is_err());
    }

    #[test]
    fn test_raw_byte_arithmetic() {
        let buf = decode("0W`w").unwrap();
        assert_eq!(buf.as_bytes(), &[0x80, 0xA7, 0xA8, 0xBF]);
    }

    #[test]
    fn test_sixbit_values() {
        assert_eq!(sixbit(b'0'), Some(0));
        assert_eq!(sixbit(b'1'), Some(1));
        assert_eq!(sixbit(b'W'), Some(39));
        assert_eq!(sixbit(b'`'), Some(40));
        assert_eq!(sixbit(b'w'), Some(63));
        assert_eq!(sixbit(b'X'), None);
        assert_eq!(sixbit(b'/'), None);
        assert_eq!(sixbit(b'x'), None);
    }

    #[test]
    fn test_sixbit_covers_full_range() {
        let mut seen: Vec<u8> = (0x30u8..=0x57)
            .chain(0x60..=0x77)
            .filter_map(sixbit)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0u8..64).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_payload() {
        let buf = decode("").unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.bit_len(), 0);
    }

    #[test]
    fn test_extract_empty_buffer_is_zero() {
        let buf = BitBuffer::default();
        assert_eq!(buf.extract_unsigned(0, 6), 0);
        assert_eq!(buf.extract_unsigned(8, 30), 0);
        assert_eq!(buf.extract_unsigned(0, 0), 0);
        assert_eq!(buf.extract_unsigned(usize::MAX, 4), 0);
    }

    #[test]
    fn test_extract_message_type() {
        // '1' -> 000001, type 1 position report
        let buf = decode("15RTgt0PAso;90TKcjM8h6g208CQ").unwrap();
        assert_eq!(buf.extract_unsigned(0, 6), 1);
        // 'B' -> 010010, type 18
        let buf = decode("B52K>;h00Fc>jpUlNV@ikwpUoP06").unwrap();
        assert_eq!(buf.extract_unsigned(0, 6), 18);
    }

    #[test]
    fn test_extract_across_byte_boundary() {
        // '5' -> 000101, 'R' -> 100010
        let buf = decode("5R").unwrap();
        assert_eq!(buf.extract_unsigned(3, 6), 0b101100);
        assert_eq!(buf.extract_unsigned(0, 12), 0b000101_100010);
        assert_eq!(buf.extract_unsigned(5, 1), 1);
        assert_eq!(buf.extract_unsigned(6, 1), 1);
    }

    #[test]
    fn test_extract_mmsi() {
        let buf = decode("15RTgt0PAso;90TKcjM8h6g208CQ").unwrap();
        assert_eq!(buf.extract_unsigned(8, 30), 371798000);
    }

    #[test]
    fn test_extract_past_end_is_zero() {
        let buf = decode("15").unwrap(); // 12 bits
        assert_eq!(buf.extract_unsigned(0, 12), 0b000001_000101);
        assert_eq!(buf.extract_unsigned(0, 13), 0);
        assert_eq!(buf.extract_unsigned(8, 30), 0);
    }

    #[test]
    fn test_extract_ignores_high_junk_bits() {
        // Raw bytes carry 0x80 / 0xC0 in the top bits; only 6 bits are read.
        let buf = BitBuffer::from(vec![0xFF, 0xC0]);
        assert_eq!(buf.extract_unsigned(0, 12), 0b111111_000000);
    }
}
