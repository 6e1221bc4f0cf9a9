//! Eye tracker wire protocol.
//!
//! Each datagram carries both eyes as tagged text fields, in any order:
//!
//! ```text
//! <PositionLeft>X,Y,Z</PositionLeft><PositionRight>X,Y,Z</PositionRight>
//! ```
//!
//! Coordinates arrive in tracker units (millimetres) and are divided by
//! [`TRACKER_UNITS_PER_CM`] on ingestion. Parsing is all-or-nothing: any
//! anomaly rejects the packet.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::EyePosition;

/// Tracker units per working unit.
pub const TRACKER_UNITS_PER_CM: f32 = 10.0;

/// A tagged field within a datagram.
#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    open: &'static str,
    close: &'static str,
}

const LEFT: Field = Field {
    name: "PositionLeft",
    open: "<PositionLeft>",
    close: "</PositionLeft>",
};

const RIGHT: Field = Field {
    name: "PositionRight",
    open: "<PositionRight>",
    close: "</PositionRight>",
};

/// Eye positions decoded from a single datagram, already in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyePacket {
    /// Left eye position.
    pub left: EyePosition,
    /// Right eye position.
    pub right: EyePosition,
}

/// Decode a raw datagram.
///
/// # Errors
///
/// Returns a [`ProtocolError`] if the bytes are not UTF-8, a tag is missing
/// or misordered, or a field does not hold exactly three finite numbers.
///
/// # Example
///
/// ```
/// use parallax_core::parse_packet;
///
/// let packet = parse_packet(
///     b"<PositionLeft>30,0,1600</PositionLeft><PositionRight>-30,0,1600</PositionRight>",
/// ).unwrap();
/// assert_eq!(packet.left.z, 160.0);
/// ```
pub fn parse_packet(bytes: &[u8]) -> ProtocolResult<EyePacket> {
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::NotUtf8)?;
    parse_str(text)
}

/// Decode a datagram that is already text.
///
/// # Errors
///
/// See [`parse_packet`].
pub fn parse_str(text: &str) -> ProtocolResult<EyePacket> {
    let left = parse_coordinates(LEFT, extract(text, LEFT)?)?;
    let right = parse_coordinates(RIGHT, extract(text, RIGHT)?)?;
    Ok(EyePacket { left, right })
}

/// Encode positions in centimetres as a datagram, the inverse of [`parse_str`].
#[must_use]
pub fn format_packet(left: EyePosition, right: EyePosition) -> String {
    let scale = |p: EyePosition| {
        format!(
            "{},{},{}",
            p.x * TRACKER_UNITS_PER_CM,
            p.y * TRACKER_UNITS_PER_CM,
            p.z * TRACKER_UNITS_PER_CM
        )
    };
    format!(
        "{}{}{}{}{}{}",
        LEFT.open,
        scale(left),
        LEFT.close,
        RIGHT.open,
        scale(right),
        RIGHT.close
    )
}

/// Slice out the payload between a field's tags.
fn extract(text: &str, field: Field) -> ProtocolResult<&str> {
    let start = text
        .find(field.open)
        .ok_or(ProtocolError::MissingTag(field.open))?
        + field.open.len();

    match text[start..].find(field.close) {
        Some(len) => Ok(&text[start..start + len]),
        None if text[..start].contains(field.close) => Err(ProtocolError::TagOrder(field.close)),
        None => Err(ProtocolError::MissingTag(field.close)),
    }
}

fn parse_coordinates(field: Field, payload: &str) -> ProtocolResult<EyePosition> {
    let parts: Vec<&str> = payload.split(',').collect();
    if parts.len() != 3 {
        return Err(ProtocolError::ComponentCount {
            tag: field.name,
            found: parts.len(),
        });
    }

    let mut coords = [0.0_f32; 3];
    for (slot, part) in coords.iter_mut().zip(parts) {
        let value: f32 = part.parse().map_err(|_| ProtocolError::InvalidNumber {
            tag: field.name,
            value: part.to_string(),
        })?;
        if !value.is_finite() {
            return Err(ProtocolError::NonFinite { tag: field.name });
        }
        *slot = value / TRACKER_UNITS_PER_CM;
    }

    Ok(EyePosition::from(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn assert_position(p: EyePosition, x: f32, y: f32, z: f32) {
        assert!(
            approx_eq(p.x, x) && approx_eq(p.y, y) && approx_eq(p.z, z),
            "expected ({x}, {y}, {z}), got {p}"
        );
    }

    #[test]
    fn test_parse_reference_packet() {
        let packet = parse_str(
            "<PositionLeft>30,0,1600</PositionLeft><PositionRight>-30,0,1600</PositionRight>",
        )
        .expect("valid packet");

        assert_position(packet.left, 3.0, 0.0, 160.0);
        assert_position(packet.right, -3.0, 0.0, 160.0);
    }

    #[test]
    fn test_field_order_is_irrelevant() {
        let forward = parse_str(
            "<PositionLeft>30,0,1600</PositionLeft><PositionRight>-30,0,1600</PositionRight>",
        )
        .expect("forward");
        let reversed = parse_str(
            "<PositionRight>-30,0,1600</PositionRight><PositionLeft>30,0,1600</PositionLeft>",
        )
        .expect("reversed");

        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_sign_and_fraction() {
        let packet = parse_str(
            "<PositionLeft>-12.5,+4.25,987.6</PositionLeft><PositionRight>0.1,-0.1,1000</PositionRight>",
        )
        .expect("valid packet");

        assert_position(packet.left, -1.25, 0.425, 98.76);
        assert_position(packet.right, 0.01, -0.01, 100.0);
    }

    #[test]
    fn test_surrounding_bytes_are_ignored() {
        let packet = parse_str(
            "hdr<PositionLeft>10,20,30</PositionLeft>|<PositionRight>40,50,60</PositionRight>\0\0",
        )
        .expect("valid packet");

        assert_position(packet.left, 1.0, 2.0, 3.0);
        assert_position(packet.right, 4.0, 5.0, 6.0);
    }

    #[test]
    fn test_missing_closing_tag() {
        let err = parse_str("<PositionLeft>30,0,1600</PositionLeft><PositionRight>-30,0,1600")
            .expect_err("truncated");

        assert_eq!(err, ProtocolError::MissingTag("</PositionRight>"));
        assert_eq!(err.reason(), "missing_tag");
    }

    #[test]
    fn test_missing_field() {
        let err = parse_str("<PositionRight>-30,0,1600</PositionRight>").expect_err("no left");
        assert_eq!(err, ProtocolError::MissingTag("<PositionLeft>"));
    }

    #[test]
    fn test_closing_tag_before_opening_tag() {
        let err = parse_str(
            "</PositionLeft>1,2,3<PositionLeft><PositionRight>1,2,3</PositionRight>",
        )
        .expect_err("misordered");
        assert_eq!(err, ProtocolError::TagOrder("</PositionLeft>"));
    }

    #[test]
    fn test_wrong_component_count() {
        let err = parse_str(
            "<PositionLeft>1,2</PositionLeft><PositionRight>1,2,3</PositionRight>",
        )
        .expect_err("two components");
        assert_eq!(
            err,
            ProtocolError::ComponentCount {
                tag: "PositionLeft",
                found: 2
            }
        );

        let err = parse_str(
            "<PositionLeft>1,2,3</PositionLeft><PositionRight>1,2,3,4</PositionRight>",
        )
        .expect_err("four components");
        assert_eq!(err.reason(), "component_count");
    }

    #[test]
    fn test_whitespace_is_not_tolerated() {
        let err = parse_str(
            "<PositionLeft>1, 2,3</PositionLeft><PositionRight>1,2,3</PositionRight>",
        )
        .expect_err("whitespace");
        assert_eq!(
            err,
            ProtocolError::InvalidNumber {
                tag: "PositionLeft",
                value: " 2".to_string()
            }
        );
    }

    #[test]
    fn test_empty_and_garbage_components() {
        let err = parse_str("<PositionLeft>1,,3</PositionLeft><PositionRight>1,2,3</PositionRight>")
            .expect_err("empty");
        assert_eq!(err.reason(), "invalid_number");

        let err = parse_str("<PositionLeft>1,2,3</PositionLeft><PositionRight>a,2,3</PositionRight>")
            .expect_err("garbage");
        assert_eq!(err.reason(), "invalid_number");
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = parse_str(
            "<PositionLeft>NaN,2,3</PositionLeft><PositionRight>1,2,3</PositionRight>",
        )
        .expect_err("nan");
        assert_eq!(err, ProtocolError::NonFinite { tag: "PositionLeft" });

        let err = parse_str(
            "<PositionLeft>1,2,3</PositionLeft><PositionRight>1,inf,3</PositionRight>",
        )
        .expect_err("inf");
        assert_eq!(err.reason(), "non_finite");
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(parse_packet(&[0xff, 0xfe, 0x00]), Err(ProtocolError::NotUtf8));
    }

    #[test]
    fn test_format_packet_parses_back() {
        let left = EyePosition::new(3.0, -1.5, 160.0);
        let right = EyePosition::new(-3.0, -1.5, 160.0);

        let text = format_packet(left, right);
        assert!(text.starts_with("<PositionLeft>30,-15,1600</PositionLeft>"));

        let packet = parse_str(&text).expect("formatted packet");
        assert_position(packet.left, 3.0, -1.5, 160.0);
        assert_position(packet.right, -3.0, -1.5, 160.0);
    }
}
