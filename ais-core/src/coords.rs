//! Longitude/latitude decoding from raw payload bits.
//!
//! Coordinates are two's-complement fixed point in 1/10000 minute units
//! (1/600000 degree). Longitude is 28 bits wide, latitude 27; both are
//! sign-extended to 32 bits before conversion.

use crate::armor::BitBuffer;
use crate::layout::FieldLayoutTable;

/// 1/10000 minute per unit.
pub const COORD_SCALE: f64 = 600_000.0;

pub const LON_BITS: usize = 28;
pub const LAT_BITS: usize = 27;

const LON_SIGN_BIT: u32 = 0x0800_0000;
const LON_EXTEND_MASK: u32 = 0xF000_0000;
const LAT_SIGN_BIT: u32 = 0x0400_0000;
const LAT_EXTEND_MASK: u32 = 0xF800_0000;

/// "Not available" sentinels defined by ITU-R M.1371.
pub const LON_NOT_AVAILABLE: f64 = 181.0;
pub const LAT_NOT_AVAILABLE: f64 = 91.0;

/// Sign-extend a sub-word field into a 32-bit two's-complement value.
fn sign_extend(raw: u32, sign_bit: u32, mask: u32) -> i32 {
    let extended = if raw & sign_bit != 0 { raw | mask } else { raw };
    extended as i32
}

/// Convert a raw 28-bit longitude field to degrees.
pub fn lon_from_raw(raw: u32) -> f64 {
    sign_extend(raw, LON_SIGN_BIT, LON_EXTEND_MASK) as f64 / COORD_SCALE
}

/// Convert a raw 27-bit latitude field to degrees.
pub fn lat_from_raw(raw: u32) -> f64 {
    sign_extend(raw, LAT_SIGN_BIT, LAT_EXTEND_MASK) as f64 / COORD_SCALE
}

/// Decode `(lat, lon)` for a message type using the layout table.
///
/// Returns `None` when the type has no lon/lat entry. Field widths are fixed
/// at 28/27 bits regardless of the `len` stored in the table.
pub fn decode_lat_lon(
    buf: &BitBuffer,
    table: &FieldLayoutTable,
    msg_type: u32,
) -> Option<(f64, f64)> {
    let (lon_spec, lat_spec) = table.position_specs(msg_type)?;

    let lon_raw = buf.extract_unsigned(lon_spec.start_bit, LON_BITS) as u32;
    let lat_raw = buf.extract_unsigned(lat_spec.start_bit, LAT_BITS) as u32;

    Some((lat_from_raw(lat_raw), lon_from_raw(lon_raw)))
}

/// True if the pair is a real fix: inside the valid range and not a sentinel.
pub fn is_available(lat: f64, lon: f64) -> bool {
    lat.abs() <= 90.0 && lon.abs() <= 180.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
