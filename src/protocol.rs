//! RSI wire codec.
//!
//! The robot controller sends one XML datagram per control cycle and
//! expects the reply within the same 4 ms window, so the inbound path is a
//! substring scan, not a conforming XML parse: the datagram is fixed-shape,
//! bounded, and produced by the controller itself. Extraction anchors on
//! the literal tags and ignores the rest of the document.
//!
//! The outbound layout is byte-exact. The IPOC in the response is the
//! verbatim substring taken from the inbound datagram: the controller
//! matches it to prove the reply answers the current cycle, so even
//! leading zeros must survive the round trip.

use crate::clock;
use crate::error::{Error, Result};
use crate::types::{CartesianCorrection, CartesianPosition, JointPosition};
use std::fmt::Write;

/// Largest datagram accepted from the robot.
pub(crate) const MAX_DATAGRAM_SIZE: usize = 4096;

/// Response budget; a reply that would exceed this is dropped unsent.
pub(crate) const RESPONSE_BUFFER_SIZE: usize = 512;

const TAG_IPOC_START: &str = "<IPOC>";
const TAG_IPOC_END: &str = "</IPOC>";
const TAG_RIST_START: &str = "<RIst";
const TAG_AIPOS_START: &str = "<AIPos";

const CARTESIAN_ATTRS: [&str; 6] = ["X=\"", "Y=\"", "Z=\"", "A=\"", "B=\"", "C=\""];
const JOINT_ATTRS: [&str; 6] = ["A1=\"", "A2=\"", "A3=\"", "A4=\"", "A5=\"", "A6=\""];

/// IPOC counter extracted from an inbound datagram.
///
/// `text` is the verbatim substring between the tags and is what the
/// response echoes; `value` is the decoded counter used to stamp the pose
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipoc<'a> {
    pub text: &'a str,
    pub value: u32,
}

/// Locate the `<IPOC>…</IPOC>` counter.
///
/// `None` when either delimiter is missing; the caller drops the datagram.
pub fn extract_ipoc(xml: &str) -> Option<Ipoc<'_>> {
    let start = xml.find(TAG_IPOC_START)? + TAG_IPOC_START.len();
    let rest = &xml[start..];
    let end = rest.find(TAG_IPOC_END)?;
    let text = &rest[..end];
    Some(Ipoc {
        text,
        value: decode_decimal(text),
    })
}

/// Decimal decode with `strtoul` semantics: leading digits only, 0 when
/// there are none, saturating past `u32::MAX`.
#[inline]
fn decode_decimal(text: &str) -> u32 {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let digits = &text[..end];
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

/// Decode the floating-point value immediately after `pattern`
/// (an `NAME="` anchor). Missing attribute or undecodable number → 0.0;
/// the robot omits fields it is not configured to send.
#[inline]
fn parse_attr(fragment: &str, pattern: &str) -> f64 {
    let Some(pos) = fragment.find(pattern) else {
        return 0.0;
    };
    decode_float(&fragment[pos + pattern.len()..])
}

/// `atof` semantics: decode the longest leading `[+-]?digits[.digits]` run,
/// 0.0 when nothing decodes. RSI attribute values carry no exponents.
#[inline]
fn decode_float(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    text[..end].parse().unwrap_or(0.0)
}

/// Parse the `<RIst …/>` fragment into a Cartesian pose.
///
/// `None` when the tag is absent. The pose is stamped with the host
/// timestamp at parse time; the IPOC field is left for the caller to
/// imprint.
pub fn parse_cartesian(xml: &str) -> Option<CartesianPosition> {
    let pos = xml.find(TAG_RIST_START)?;
    let fragment = &xml[pos..];
    Some(CartesianPosition {
        x: parse_attr(fragment, CARTESIAN_ATTRS[0]),
        y: parse_attr(fragment, CARTESIAN_ATTRS[1]),
        z: parse_attr(fragment, CARTESIAN_ATTRS[2]),
        a: parse_attr(fragment, CARTESIAN_ATTRS[3]),
        b: parse_attr(fragment, CARTESIAN_ATTRS[4]),
        c: parse_attr(fragment, CARTESIAN_ATTRS[5]),
        timestamp_us: clock::monotonic_us(),
        ipoc: 0,
    })
}

/// Parse the `<AIPos …/>` fragment into a joint pose.
///
/// Same rules as [`parse_cartesian`], anchored at `<AIPos` with attributes
/// A1..A6.
pub fn parse_joints(xml: &str) -> Option<JointPosition> {
    let pos = xml.find(TAG_AIPOS_START)?;
    let fragment = &xml[pos..];
    let mut joints = JointPosition {
        timestamp_us: clock::monotonic_us(),
        ..Default::default()
    };
    for (axis, pattern) in joints.axis.iter_mut().zip(JOINT_ATTRS) {
        *axis = parse_attr(fragment, pattern);
    }
    Some(joints)
}

/// Format the response datagram in place.
///
/// `buf` is reused across cycles so the hot loop never allocates once the
/// capacity is established. Fails when the reply would exceed
/// [`RESPONSE_BUFFER_SIZE`]; the caller drops the packet without
/// transmitting.
pub fn format_response(
    buf: &mut String,
    correction: &CartesianCorrection,
    ipoc_text: &str,
) -> Result<()> {
    buf.clear();
    write!(
        buf,
        "<Sen Type=\"ImFree\">\n\
         <EStr>RSI Monitor</EStr>\n\
         <RKorr X=\"{:.4}\" Y=\"{:.4}\" Z=\"{:.4}\" A=\"{:.4}\" B=\"{:.4}\" C=\"{:.4}\" />\n\
         <IPOC>{}</IPOC>\n\
         </Sen>",
        correction.x, correction.y, correction.z, correction.a, correction.b, correction.c, ipoc_text
    )
    .map_err(|_| Error::Unknown)?;

    if buf.len() > RESPONSE_BUFFER_SIZE {
        return Err(Error::Unknown);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<Rob Type=\"KUKA\">\
        <RIst X=\"100.0\" Y=\"200.0\" Z=\"300.0\" A=\"10.0\" B=\"20.0\" C=\"30.0\"/>\
        <AIPos A1=\"1\" A2=\"2\" A3=\"3\" A4=\"4\" A5=\"5\" A6=\"6\"/>\
        <IPOC>12345</IPOC></Rob>";

    #[test]
    fn test_extract_ipoc() {
        let ipoc = extract_ipoc(SAMPLE).unwrap();
        assert_eq!(ipoc.text, "12345");
        assert_eq!(ipoc.value, 12345);
    }

    #[test]
    fn test_extract_ipoc_preserves_leading_zeros() {
        let ipoc = extract_ipoc("<IPOC>0007</IPOC>").unwrap();
        assert_eq!(ipoc.text, "0007");
        assert_eq!(ipoc.value, 7);
    }

    #[test]
    fn test_extract_ipoc_missing_delimiters() {
        assert!(extract_ipoc("<Rob><RIst X=\"1\"/></Rob>").is_none());
        assert!(extract_ipoc("<Rob><IPOC>123").is_none());
        assert!(extract_ipoc("123</IPOC>").is_none());
    }

    #[test]
    fn test_decode_decimal_strtoul_semantics() {
        assert_eq!(decode_decimal("42abc"), 42);
        assert_eq!(decode_decimal(""), 0);
        assert_eq!(decode_decimal("xyz"), 0);
        assert_eq!(decode_decimal("4294967295"), u32::MAX);
        assert_eq!(decode_decimal("99999999999"), u32::MAX);
    }

    #[test]
    fn test_parse_cartesian() {
        let pose = parse_cartesian(SAMPLE).unwrap();
        assert_eq!(pose.x, 100.0);
        assert_eq!(pose.y, 200.0);
        assert_eq!(pose.z, 300.0);
        assert_eq!(pose.a, 10.0);
        assert_eq!(pose.b, 20.0);
        assert_eq!(pose.c, 30.0);
    }

    #[test]
    fn test_parse_cartesian_missing_attrs_default_zero() {
        let pose = parse_cartesian("<RIst X=\"1.5\"/><IPOC>1</IPOC>").unwrap();
        assert_eq!(pose.x, 1.5);
        assert_eq!(pose.y, 0.0);
        assert_eq!(pose.c, 0.0);
    }

    #[test]
    fn test_parse_cartesian_absent_tag() {
        assert!(parse_cartesian("<Rob><IPOC>1</IPOC></Rob>").is_none());
    }

    #[test]
    fn test_parse_joints() {
        let joints = parse_joints(SAMPLE).unwrap();
        assert_eq!(joints.axis, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_parse_negative_values() {
        let pose = parse_cartesian("<RIst X=\"-12.25\" Y=\"+3.5\"/>").unwrap();
        assert_eq!(pose.x, -12.25);
        assert_eq!(pose.y, 3.5);
    }

    #[test]
    fn test_format_response_zero_correction() {
        let mut buf = String::new();
        format_response(&mut buf, &CartesianCorrection::default(), "12345").unwrap();
        assert_eq!(
            buf,
            "<Sen Type=\"ImFree\">\n\
             <EStr>RSI Monitor</EStr>\n\
             <RKorr X=\"0.0000\" Y=\"0.0000\" Z=\"0.0000\" A=\"0.0000\" B=\"0.0000\" C=\"0.0000\" />\n\
             <IPOC>12345</IPOC>\n\
             </Sen>"
        );
    }

    #[test]
    fn test_format_response_with_correction() {
        let correction = CartesianCorrection {
            x: 1.5,
            y: -0.25,
            ..Default::default()
        };
        let mut buf = String::new();
        format_response(&mut buf, &correction, "12345").unwrap();
        assert!(buf.contains(
            "X=\"1.5000\" Y=\"-0.2500\" Z=\"0.0000\" A=\"0.0000\" B=\"0.0000\" C=\"0.0000\""
        ));
    }

    #[test]
    fn test_format_then_extract_round_trip() {
        let mut buf = String::new();
        for value in [0u32, 7, 12345, 4_294_967_295] {
            let text = value.to_string();
            format_response(&mut buf, &CartesianCorrection::default(), &text).unwrap();
            let ipoc = extract_ipoc(&buf).unwrap();
            assert_eq!(ipoc.text, text);
            assert_eq!(ipoc.value, value);
        }
    }

    #[test]
    fn test_format_response_echo_is_verbatim() {
        let mut buf = String::new();
        format_response(&mut buf, &CartesianCorrection::default(), "0007").unwrap();
        assert!(buf.contains("<IPOC>0007</IPOC>"));
    }

    #[test]
    fn test_format_response_oversized_rejected() {
        let mut buf = String::new();
        let huge = "9".repeat(RESPONSE_BUFFER_SIZE);
        assert!(format_response(&mut buf, &CartesianCorrection::default(), &huge).is_err());
    }
}
