//! Hand-rolled, protobuf-wire-compatible encoding for the external payload.
//!
//! The payload is the wire form of a message with this shape (proto2):
//!
//! ```proto
//! message UserApps {
//!     optional double lat = 1;
//!     optional double lon = 2;
//!     repeated uint32 apps = 3;
//! }
//! ```
//!
//! `lat`/`lon` are always emitted (fixed64, little-endian, wire type 1), even
//! when zero. `apps` is emitted unpacked: one varint-typed
//! field (wire type 0) per entry, in encounter order. No `prost`/`build.rs`
//! codegen is used here — see DESIGN.md for why.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use thiserror::Error;

const FIELD_LAT: u32 = 1;
const FIELD_LON: u32 = 2;
const FIELD_APPS: u32 = 3;

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error("truncated varint")]
    TruncatedVarint,
    #[error("truncated fixed64 field")]
    TruncatedFixed64,
    #[error("varint app value {0} overflows u32")]
    AppOverflow(u64),
    #[error("unsupported wire type {0}")]
    UnsupportedWireType(u8),
    #[error("truncated length-delimited field")]
    TruncatedLengthDelimited,
}

fn write_tag(buf: &mut Vec<u8>, field: u32, wire_type: u8) {
    write_varint(buf, ((field << 3) | wire_type as u32) as u64);
}

fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn read_varint(cursor: &mut Cursor<&[u8]>) -> Result<u64, WireError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = cursor
            .read_u8()
            .map_err(|_| WireError::TruncatedVarint)?;
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 64 {
            return Err(WireError::TruncatedVarint);
        }
    }
}

/// Encode `(lat, lon, apps)` into the wire payload described above.
pub fn encode_payload(lat: f64, lon: f64, apps: &[u32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(18 + apps.len() * 2);

    write_tag(&mut buf, FIELD_LAT, WIRE_FIXED64);
    buf.write_f64::<LittleEndian>(lat).expect("write to Vec never fails");

    write_tag(&mut buf, FIELD_LON, WIRE_FIXED64);
    buf.write_f64::<LittleEndian>(lon).expect("write to Vec never fails");

    for app in apps {
        write_tag(&mut buf, FIELD_APPS, WIRE_VARINT);
        write_varint(&mut buf, *app as u64);
    }

    buf
}

/// Decode a wire payload back into `(lat, lon, apps)`. Used by the `--test`
/// self-check and by the test suite's round-trip assertions. Unrecognized
/// field numbers are skipped per their wire type rather than rejected, which
/// is standard protobuf-compatible decoding behavior.
pub fn decode_payload(data: &[u8]) -> Result<(f64, f64, Vec<u32>), WireError> {
    let mut cursor = Cursor::new(data);
    let mut lat = 0.0f64;
    let mut lon = 0.0f64;
    let mut apps = Vec::new();

    while (cursor.position() as usize) < data.len() {
        let tag = read_varint(&mut cursor)?;
        let field = (tag >> 3) as u32;
        let wire_type = (tag & 0x7) as u8;

        match (field, wire_type) {
            (FIELD_LAT, WIRE_FIXED64) => {
                lat = cursor
                    .read_f64::<LittleEndian>()
                    .map_err(|_| WireError::TruncatedFixed64)?;
            }
            (FIELD_LON, WIRE_FIXED64) => {
                lon = cursor
                    .read_f64::<LittleEndian>()
                    .map_err(|_| WireError::TruncatedFixed64)?;
            }
            (FIELD_APPS, WIRE_VARINT) => {
                let value = read_varint(&mut cursor)?;
                let value = u32::try_from(value).map_err(|_| WireError::AppOverflow(value))?;
                apps.push(value);
            }
            (_, wt) => skip_field(&mut cursor, wt)?,
        }
    }

    Ok((lat, lon, apps))
}

fn skip_field(cursor: &mut Cursor<&[u8]>, wire_type: u8) -> Result<(), WireError> {
    match wire_type {
        WIRE_VARINT => {
            read_varint(cursor)?;
        }
        WIRE_FIXED64 => {
            cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| WireError::TruncatedFixed64)?;
        }
        WIRE_LEN => {
            let len = read_varint(cursor)? as usize;
            let pos = cursor.position() as usize;
            if pos + len > cursor.get_ref().len() {
                return Err(WireError::TruncatedLengthDelimited);
            }
            cursor.set_position((pos + len) as u64);
        }
        WIRE_FIXED32 => {
            cursor
                .read_u32::<LittleEndian>()
                .map_err(|_| WireError::TruncatedFixed64)?;
        }
        other => return Err(WireError::UnsupportedWireType(other)),
    }
    Ok(())
}
