//! Base64 VLQ decoding for the `mappings` field of source map v3.

use crate::utils::error::SourceMapError;

const CONTINUATION_BIT: u32 = 1 << 5;
const VALUE_MASK: u32 = CONTINUATION_BIT - 1;

fn base64_value(byte: u8) -> Option<u32> {
    let value = match byte {
        b'A'..=b'Z' => byte - b'A',
        b'a'..=b'z' => byte - b'a' + 26,
        b'0'..=b'9' => byte - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(u32::from(value))
}

/// Decode every VLQ value in one segment (the text between commas)
pub fn decode_segment(segment: &str) -> Result<Vec<i64>, SourceMapError> {
    let mut values = Vec::with_capacity(5);
    let mut accum: u64 = 0;
    let mut shift = 0u32;
    let mut pending = false;

    for byte in segment.bytes() {
        let digit = base64_value(byte).ok_or_else(|| {
            SourceMapError::InvalidMappings(format!(
                "invalid base64 character '{}' in segment '{}'",
                byte as char, segment
            ))
        })?;

        if shift > 60 {
            return Err(SourceMapError::InvalidMappings(format!(
                "VLQ value overflows in segment '{}'",
                segment
            )));
        }

        accum |= u64::from(digit & VALUE_MASK) << shift;
        pending = true;

        if digit & CONTINUATION_BIT != 0 {
            shift += 5;
            continue;
        }

        // Lowest bit carries the sign
        let magnitude = (accum >> 1) as i64;
        values.push(if accum & 1 == 1 { -magnitude } else { magnitude });

        accum = 0;
        shift = 0;
        pending = false;
    }

    if pending {
        return Err(SourceMapError::InvalidMappings(format!(
            "truncated VLQ value in segment '{}'",
            segment
        )));
    }

    Ok(values)
}
