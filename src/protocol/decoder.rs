//! # Command Decoder
//!
//! Parses wire command strings back into [`Command`] values.
//!
//! The transmitter never needs this path; it exists for the receiving end
//! and for round-trip verification of the encoder.

use super::{Command, TrimAdjust, FIELD_SEPARATOR, PARAMS_PREFIX, TRIM_PREFIX};
use crate::error::{AirboatLinkError, Result};
use crate::input::state::{Direction, SteeringState};

/// Decode a command string into a [`Command`].
///
/// # Arguments
///
/// * `text` - One complete command, without any transport terminator
///
/// # Errors
///
/// Returns [`AirboatLinkError::Protocol`] if the prefix is unknown, a field
/// is not an integer, or a field is outside its declared range.
///
/// # Examples
///
/// ```
/// use airboat_link::protocol::decoder::decode_command;
/// use airboat_link::protocol::{Command, TrimAdjust};
///
/// let command = decode_command("AT$TRIM:+")?;
/// assert_eq!(command, Command::Trim(TrimAdjust::Increase));
/// # Ok::<(), airboat_link::error::AirboatLinkError>(())
/// ```
pub fn decode_command(text: &str) -> Result<Command> {
    if let Some(fields) = text.strip_prefix(PARAMS_PREFIX) {
        decode_params(fields)
    } else if let Some(symbol) = text.strip_prefix(TRIM_PREFIX) {
        decode_trim(symbol)
    } else {
        Err(AirboatLinkError::Protocol(format!(
            "unknown command: {:?}",
            text
        )))
    }
}

/// Decode the three steering fields after the `AT$PARAMS:` prefix.
fn decode_params(fields: &str) -> Result<Command> {
    let mut parts = fields.split(FIELD_SEPARATOR);

    let direction = parse_field(parts.next(), "direction")?;
    let throttle = parse_field(parts.next(), "throttle")?;
    let lateral = parse_field(parts.next(), "lateral")?;

    if parts.next().is_some() {
        return Err(AirboatLinkError::Protocol(format!(
            "too many fields in: {:?}",
            fields
        )));
    }

    let direction = match direction {
        -1 => Direction::Reverse,
        0 => Direction::Neutral,
        1 => Direction::Forward,
        other => {
            return Err(AirboatLinkError::Protocol(format!(
                "direction out of range: {}",
                other
            )))
        }
    };

    if !(0..=100).contains(&throttle) {
        return Err(AirboatLinkError::Protocol(format!(
            "throttle out of range: {}",
            throttle
        )));
    }

    if !(-50..=50).contains(&lateral) {
        return Err(AirboatLinkError::Protocol(format!(
            "lateral out of range: {}",
            lateral
        )));
    }

    let mut state = SteeringState::neutral();
    state.set_direction(direction);
    state.set_throttle_percent(throttle);
    state.set_lateral_percent(lateral);

    Ok(Command::Params(state))
}

/// Decode the single symbol after the `AT$TRIM:` prefix.
fn decode_trim(symbol: &str) -> Result<Command> {
    let adjust = match symbol {
        "+" => TrimAdjust::Increase,
        "-" => TrimAdjust::Decrease,
        "0" => TrimAdjust::Reset,
        other => {
            return Err(AirboatLinkError::Protocol(format!(
                "unknown trim symbol: {:?}",
                other
            )))
        }
    };
    Ok(Command::Trim(adjust))
}

fn parse_field(part: Option<&str>, name: &str) -> Result<i32> {
    let part = part.ok_or_else(|| {
        AirboatLinkError::Protocol(format!("missing {} field", name))
    })?;
    part.parse().map_err(|_| {
        AirboatLinkError::Protocol(format!("bad {} field: {:?}", name, part))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encoder::{encode_params, encode_trim};

    #[test]
    fn test_decode_params() {
        let command = decode_command("AT$PARAMS:1;80;-25").unwrap();
        match command {
            Command::Params(state) => {
                assert_eq!(state.direction(), Direction::Forward);
                assert_eq!(state.throttle_percent(), 80);
                assert_eq!(state.lateral_percent(), -25);
            }
            other => panic!("expected Params, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_trim_symbols() {
        assert_eq!(
            decode_command("AT$TRIM:+").unwrap(),
            Command::Trim(TrimAdjust::Increase)
        );
        assert_eq!(
            decode_command("AT$TRIM:-").unwrap(),
            Command::Trim(TrimAdjust::Decrease)
        );
        assert_eq!(
            decode_command("AT$TRIM:0").unwrap(),
            Command::Trim(TrimAdjust::Reset)
        );
    }

    #[test]
    fn test_decode_rejects_unknown_prefix() {
        assert!(decode_command("AT$SPEED:1").is_err());
        assert!(decode_command("").is_err());
    }

    #[test]
    fn test_decode_rejects_bad_field_count() {
        assert!(decode_command("AT$PARAMS:1;80").is_err());
        assert!(decode_command("AT$PARAMS:1;80;0;9").is_err());
    }

    #[test]
    fn test_decode_rejects_non_integer_fields() {
        assert!(decode_command("AT$PARAMS:x;80;0").is_err());
        assert!(decode_command("AT$PARAMS:1;;0").is_err());
    }

    #[test]
    fn test_decode_rejects_out_of_range_fields() {
        assert!(decode_command("AT$PARAMS:2;80;0").is_err());
        assert!(decode_command("AT$PARAMS:1;101;0").is_err());
        assert!(decode_command("AT$PARAMS:1;80;51").is_err());
        assert!(decode_command("AT$PARAMS:1;80;-51").is_err());
        assert!(decode_command("AT$PARAMS:1;-1;0").is_err());
    }

    #[test]
    fn test_decode_rejects_bad_trim_symbol() {
        assert!(decode_command("AT$TRIM:*").is_err());
        assert!(decode_command("AT$TRIM:").is_err());
        assert!(decode_command("AT$TRIM:++").is_err());
    }

    // Round trip: every in-range state encodes to a string that decodes back
    // to the same three integers.
    #[test]
    fn test_params_round_trip() {
        for direction in [Direction::Reverse, Direction::Neutral, Direction::Forward] {
            for throttle in [0, 1, 10, 55, 99, 100] {
                for lateral in [-50, -17, 0, 3, 50] {
                    let mut state = SteeringState::neutral();
                    state.set_direction(direction);
                    state.set_throttle_percent(throttle);
                    state.set_lateral_percent(lateral);

                    let wire = encode_params(&state);
                    let decoded = decode_command(&wire).unwrap();
                    assert_eq!(decoded, Command::Params(state), "wire {:?}", wire);
                }
            }
        }
    }

    #[test]
    fn test_trim_round_trip() {
        for adjust in [TrimAdjust::Increase, TrimAdjust::Decrease, TrimAdjust::Reset] {
            let wire = encode_trim(adjust);
            assert_eq!(decode_command(&wire).unwrap(), Command::Trim(adjust));
        }
    }
}
