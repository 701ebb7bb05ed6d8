//! Messages and their wire format.
//!
//! A message travels as ASCII text, `name:value` or `name:value:sequence`.
//! `:` is the only delimiter and there is no escaping, so neither `name` nor
//! `value` may contain one.

use core::fmt::Write;

use heapless::String;

use crate::settings::MAX_DATA_LEN;

/// Wire delimiter between fields.
pub const DELIMITER: char = ':';

/// Buffer an outgoing wire string is formatted into.
pub type WireString = String<MAX_DATA_LEN>;

/// A received message.
///
/// `name` and `value` borrow the receive buffer of the current
/// [`poll`](crate::Rfm69Manager::poll) call. Use
/// [`to_owned_message`](Message::to_owned_message) to keep a copy.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message<'a> {
    /// Local receive counter, starting at 1.
    pub message_id: u32,
    /// Sequence number added by the sender, `0` if it sent none.
    pub packet_id: u8,
    /// Id of the sending node.
    pub node_id: u8,
    /// Metric name.
    pub name: &'a str,
    /// Metric value, as sent.
    pub value: &'a str,
    /// Signal strength of the packet.
    pub rssi: i16,
}

impl Message<'_> {
    /// Copies the message out of the receive buffer.
    #[must_use]
    pub fn to_owned_message(&self) -> OwnedMessage {
        OwnedMessage {
            message_id: self.message_id,
            packet_id: self.packet_id,
            node_id: self.node_id,
            name: owned_token(self.name),
            value: owned_token(self.value),
            rssi: self.rssi,
        }
    }
}

/// A [`Message`] that owns its text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OwnedMessage {
    /// Local receive counter, starting at 1.
    pub message_id: u32,
    /// Sequence number added by the sender, `0` if it sent none.
    pub packet_id: u8,
    /// Id of the sending node.
    pub node_id: u8,
    /// Metric name.
    pub name: String<MAX_DATA_LEN>,
    /// Metric value, as sent.
    pub value: String<MAX_DATA_LEN>,
    /// Signal strength of the packet.
    pub rssi: i16,
}

// Tokens come out of a payload of at most MAX_DATA_LEN bytes, so they always fit.
fn owned_token(token: &str) -> String<MAX_DATA_LEN> {
    String::try_from(token).unwrap_or_default()
}

/// Fields of a decoded payload.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fields<'a> {
    /// First field.
    pub name: &'a str,
    /// Second field.
    pub value: &'a str,
    /// Third field as a number, `0` if absent or unparsable.
    pub packet_id: u8,
}

/// Splits a payload into its fields.
///
/// Returns `None` when the payload holds no delimiter. A missing or
/// unparsable third field yields `packet_id == 0`, anything after the third
/// field is ignored.
#[must_use]
pub fn decode(payload: &str) -> Option<Fields<'_>> {
    let mut tokens = payload.split(DELIMITER);
    let name = tokens.next()?;
    let value = tokens.next()?;
    let packet_id = tokens.next().map_or(0, parse_packet_id);

    Some(Fields {
        name,
        value,
        packet_id,
    })
}

/// Parses the leading decimal digits of `token` after any ASCII whitespace,
/// `0` if there are none or the number does not fit a `u8`. Signs are not
/// accepted.
fn parse_packet_id(token: &str) -> u8 {
    let token = token.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    token[..end].parse().unwrap_or(0)
}

/// Formats `name:value`, or `name:value:sequence` when a sequence is given.
///
/// Returns `None` if the result would exceed [`MAX_DATA_LEN`].
#[must_use]
pub fn encode(name: &str, value: &str, sequence: Option<u8>) -> Option<WireString> {
    let mut wire = WireString::new();
    let written = match sequence {
        Some(sequence) => write!(wire, "{name}{DELIMITER}{value}{DELIMITER}{sequence}"),
        None => write!(wire, "{name}{DELIMITER}{value}"),
    };
    written.ok().map(|()| wire)
}

/// Sequence number that follows `current`: 1..=255, skipping 0.
#[must_use]
pub fn next_sequence(current: u8) -> u8 {
    match current.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_name_value() {
        assert_eq!(
            decode("temp:21"),
            Some(Fields {
                name: "temp",
                value: "21",
                packet_id: 0,
            })
        );
    }

    #[test]
    fn test_decode_with_packet_id() {
        assert_eq!(
            decode("temp:21:5"),
            Some(Fields {
                name: "temp",
                value: "21",
                packet_id: 5,
            })
        );
    }

    #[test]
    fn test_decode_without_delimiter() {
        assert_eq!(decode("temp21"), None);
        assert_eq!(decode(""), None);
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let fields = decode("cpm:19:200:extra:more").unwrap();
        assert_eq!(fields.name, "cpm");
        assert_eq!(fields.value, "19");
        assert_eq!(fields.packet_id, 200);
    }

    #[test]
    fn test_decode_unparsable_packet_id() {
        assert_eq!(decode("a:b:x").unwrap().packet_id, 0);
        assert_eq!(decode("a:b:").unwrap().packet_id, 0);
        assert_eq!(decode("a:b:256").unwrap().packet_id, 0);
        assert_eq!(decode("a:b:12abc").unwrap().packet_id, 12);
        assert_eq!(decode("a:b:-1").unwrap().packet_id, 0);
        assert_eq!(decode("a:b:+7").unwrap().packet_id, 0);
    }

    #[test]
    fn test_decode_packet_id_skips_leading_whitespace() {
        assert_eq!(decode("a:b: 7").unwrap().packet_id, 7);
        assert_eq!(decode("a:b:\t 42").unwrap().packet_id, 42);
    }

    #[test]
    fn test_decode_empty_fields() {
        let fields = decode(":").unwrap();
        assert_eq!(fields.name, "");
        assert_eq!(fields.value, "");
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("a", "b", None).unwrap().as_str(), "a:b");
        assert_eq!(encode("a", "b", Some(7)).unwrap().as_str(), "a:b:7");
        assert_eq!(encode("usvh", "0.1083", Some(255)).unwrap().as_str(), "usvh:0.1083:255");
    }

    #[test]
    fn test_encode_too_large() {
        let value = "9".repeat(MAX_DATA_LEN);
        assert_eq!(encode("cpm", &value, None), None);

        let value = "9".repeat(MAX_DATA_LEN - 4);
        assert!(encode("cpm", &value, None).is_some());
        assert_eq!(encode("cpm", &value, Some(1)), None);
    }

    #[test]
    fn test_next_sequence_skips_zero() {
        assert_eq!(next_sequence(0), 1);
        assert_eq!(next_sequence(1), 2);
        assert_eq!(next_sequence(254), 255);
        assert_eq!(next_sequence(255), 1);
    }

    #[test]
    fn test_to_owned_message() {
        let message = Message {
            message_id: 3,
            packet_id: 9,
            node_id: 13,
            name: "cpm",
            value: "18",
            rssi: -61,
        };

        let owned = message.to_owned_message();
        assert_eq!(owned.message_id, 3);
        assert_eq!(owned.packet_id, 9);
        assert_eq!(owned.node_id, 13);
        assert_eq!(owned.name.as_str(), "cpm");
        assert_eq!(owned.value.as_str(), "18");
        assert_eq!(owned.rssi, -61);
    }
}
