// The command frame sent from the transmitter to the receiver.
//
// A frame is 16 bytes of ASCII, three fields of five characters each,
// followed by a single terminating zero byte:
//
//   0..5   operation code, left justified: "MODE " or "POTS "
//   5..10  channel, decimal, right justified, space padded
//   10..15 value, decimal, right justified, space padded ("    0" for MODE)
//   15     0

use core::{
    fmt::{ self, Write },
    str,
};

use heapless::String;

use crate::{ Channel, Value };

pub const FRAME_LEN : usize = 16;
pub const FIELD_WIDTH : usize = 5;

// Bytes carrying fields; the rest of the buffer is the terminator.
const PAYLOAD_LEN : usize = 3 * FIELD_WIDTH;

/// Smallest number a field can hold: the sign takes one of the five characters.
pub const FIELD_MIN : i32 = -9999;
pub const FIELD_MAX : i32 = 99999;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Operation {
    /// A button was pressed.
    Mode,
    /// A potentiometer moved.
    Pots,
}

impl Operation {
    pub fn code(self) -> &'static [u8; FIELD_WIDTH] {
        match self {
            Operation::Mode => b"MODE ",
            Operation::Pots => b"POTS ",
        }
    }

    pub fn from_code(code: &[u8]) -> Option<Self> {
        [ Operation::Mode, Operation::Pots ]
            .iter()
            .copied()
            .find(|operation| &operation.code()[..] == code)
    }
}

/// The decoded content of a frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Command {
    pub operation: Operation,
    pub channel: Channel,
    pub value: Value,
}

impl Command {
    pub fn mode(channel: Channel) -> Self {
        Command { operation: Operation::Mode, channel, value: 0 }
    }

    pub fn pots(channel: Channel, value: Value) -> Self {
        Command { operation: Operation::Pots, channel, value }
    }

    pub fn encode(&self) -> Result<Frame, EncodeError> {
        encode(self.operation, self.channel, self.value)
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Frame(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// The operation code, without decoding the numeric fields.
    pub fn operation(&self) -> Option<Operation> {
        Operation::from_code(&self.0[..FIELD_WIDTH])
    }

    pub fn decode(&self) -> Result<Command, DecodeError> {
        decode(&self.0)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame([0; FRAME_LEN])
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0[..PAYLOAD_LEN] {
            f.write_char(if byte.is_ascii_graphic() || byte == b' ' { byte as char } else { '.' })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame(\"{}\")", self)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Field {
    Channel,
    Value,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Channel => f.write_str("channel"),
            Field::Value => f.write_str("value"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EncodeError {
    /// The number needs more than five characters.
    EncodingOverflow { field: Field, number: i32 },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::EncodingOverflow { field, number } =>
                write!(f, "{} {} does not fit in {} characters", field, number, FIELD_WIDTH),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DecodeError {
    Truncated { len: usize },
    MalformedField(Field),
    UnknownOperation,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { len } =>
                write!(f, "frame of {} bytes is shorter than {}", len, PAYLOAD_LEN),
            DecodeError::MalformedField(field) => write!(f, "{} is not a number", field),
            DecodeError::UnknownOperation => f.write_str("unknown operation code"),
        }
    }
}

/// Builds the frame for a command. The value of a `Mode` command is always sent as 0.
///
/// Numbers outside `FIELD_MIN..=FIELD_MAX` are refused rather than truncated.
pub fn encode(operation: Operation, channel: Channel, value: Value) -> Result<Frame, EncodeError> {
    let value = match operation {
        Operation::Mode => 0,
        Operation::Pots => value,
    };

    let mut bytes = [0u8; FRAME_LEN];
    bytes[..FIELD_WIDTH].copy_from_slice(operation.code());
    write_field(&mut bytes[FIELD_WIDTH..2 * FIELD_WIDTH], Field::Channel, channel)?;
    write_field(&mut bytes[2 * FIELD_WIDTH..PAYLOAD_LEN], Field::Value, value)?;
    Ok(Frame(bytes))
}

fn write_field(out: &mut [u8], field: Field, number: i32) -> Result<(), EncodeError> {
    let overflow = EncodeError::EncodingOverflow { field, number };
    if !(FIELD_MIN..=FIELD_MAX).contains(&number) {
        return Err(overflow);
    }

    let mut text: String<FIELD_WIDTH> = String::new();
    write!(text, "{:>width$}", number, width = FIELD_WIDTH).map_err(|_| overflow)?;
    out.copy_from_slice(text.as_bytes());
    Ok(())
}

/// Parses the fields of a frame. The terminator byte is optional.
pub fn decode(bytes: &[u8]) -> Result<Command, DecodeError> {
    if bytes.len() < PAYLOAD_LEN {
        return Err(DecodeError::Truncated { len: bytes.len() });
    }

    let operation = Operation::from_code(&bytes[..FIELD_WIDTH])
        .ok_or(DecodeError::UnknownOperation)?;
    let channel = read_field(&bytes[FIELD_WIDTH..2 * FIELD_WIDTH], Field::Channel)?;
    let value = read_field(&bytes[2 * FIELD_WIDTH..PAYLOAD_LEN], Field::Value)?;
    Ok(Command { operation, channel, value })
}

// Leading spaces, an optional '-', then digits to the end of the field.
fn read_field(raw: &[u8], field: Field) -> Result<i32, DecodeError> {
    let malformed = DecodeError::MalformedField(field);

    let start = raw.iter().position(|&byte| byte != b' ').ok_or(malformed)?;
    let number = &raw[start..];
    let digits = match number.split_first() {
        Some((&b'-', rest)) => rest,
        _ => number,
    };
    if digits.is_empty() || !digits.iter().all(|byte| byte.is_ascii_digit()) {
        return Err(malformed);
    }

    str::from_utf8(number)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_frame_layout() {
        let frame = encode(Operation::Mode, 1, 0).unwrap();
        assert_eq!(frame.as_bytes(), b"MODE     1    0\0");
    }

    #[test]
    fn pots_frame_layout() {
        let frame = encode(Operation::Pots, 1, 506).unwrap();
        assert_eq!(frame.as_bytes(), b"POTS     1  506\0");
        assert_eq!(frame.to_string(), "POTS     1  506");
    }

    #[test]
    fn mode_ignores_value() {
        assert_eq!(encode(Operation::Mode, 2, 1023), encode(Operation::Mode, 2, 0));
    }

    #[test]
    fn field_edges() {
        let frame = encode(Operation::Pots, 99999, -9999).unwrap();
        assert_eq!(frame.as_bytes(), b"POTS 99999-9999\0");
    }

    #[test]
    fn overflow_is_refused() {
        assert_eq!(
            encode(Operation::Pots, 100_000, 0),
            Err(EncodeError::EncodingOverflow { field: Field::Channel, number: 100_000 })
        );
        assert_eq!(
            encode(Operation::Pots, 1, -10_000),
            Err(EncodeError::EncodingOverflow { field: Field::Value, number: -10_000 })
        );
    }

    #[test]
    fn decodes_what_it_encodes() {
        let commands = [
            Command::mode(1),
            Command::mode(99999),
            Command::pots(2, 0),
            Command::pots(1, 1023),
            Command::pots(12345, 99999),
        ];
        for command in commands.iter() {
            assert_eq!(command.encode().unwrap().decode(), Ok(*command));
        }
    }

    #[test]
    fn decodes_what_it_encodes_across_field_range() {
        for channel in (1..=FIELD_MAX).step_by(997).chain(Some(FIELD_MAX)) {
            for value in (0..=FIELD_MAX).step_by(1009).chain(Some(FIELD_MAX)) {
                let command = Command::pots(channel, value);
                assert_eq!(command.encode().unwrap().decode(), Ok(command));
            }
            assert_eq!(Command::mode(channel).encode().unwrap().decode(), Ok(Command::mode(channel)));
        }
        assert_eq!(Command::pots(1, FIELD_MIN).encode().unwrap().decode(), Ok(Command::pots(1, FIELD_MIN)));
    }

    #[test]
    fn terminator_is_optional() {
        assert_eq!(decode(b"POTS     2   17"), Ok(Command::pots(2, 17)));
    }

    #[test]
    fn short_input() {
        assert_eq!(decode(b"MODE     1"), Err(DecodeError::Truncated { len: 10 }));
    }

    #[test]
    fn unknown_operation() {
        assert_eq!(decode(b"STOP     1    0\0"), Err(DecodeError::UnknownOperation));
        assert_eq!(decode(b"mode     1    0\0"), Err(DecodeError::UnknownOperation));
    }

    #[test]
    fn malformed_fields() {
        assert_eq!(decode(b"MODE   one    0\0"), Err(DecodeError::MalformedField(Field::Channel)));
        assert_eq!(decode(b"POTS     1     \0"), Err(DecodeError::MalformedField(Field::Value)));
        assert_eq!(decode(b"POTS     1 \xff506\0"), Err(DecodeError::MalformedField(Field::Value)));
    }

    #[test]
    fn fields_must_be_right_justified() {
        assert_eq!(decode(b"POTS 1    506  \0"), Err(DecodeError::MalformedField(Field::Channel)));
        assert_eq!(decode(b"POTS     1506  \0"), Err(DecodeError::MalformedField(Field::Value)));
        assert_eq!(decode(b"POTS    1   506\0"), Err(DecodeError::MalformedField(Field::Channel)));
    }

    #[test]
    fn fields_hold_only_spaces_digits_and_a_minus() {
        assert_eq!(decode(b"POTS  +001 +506\0"), Err(DecodeError::MalformedField(Field::Channel)));
        assert_eq!(decode(b"POTS     1 +506\0"), Err(DecodeError::MalformedField(Field::Value)));
        assert_eq!(decode(b"POTS \t\t\t\t1\t\t506\0"), Err(DecodeError::MalformedField(Field::Channel)));
        assert_eq!(decode(b"POTS     1  --5\0"), Err(DecodeError::MalformedField(Field::Value)));
        assert_eq!(decode(b"POTS     1  5-5\0"), Err(DecodeError::MalformedField(Field::Value)));
        assert_eq!(decode(b"POTS     1    -\0"), Err(DecodeError::MalformedField(Field::Value)));
        assert_eq!(decode(b"POTS     1  -42\0"), Ok(Command::pots(1, -42)));
    }

    #[test]
    fn peeks_operation() {
        assert_eq!(Command::mode(1).encode().unwrap().operation(), Some(Operation::Mode));
        assert_eq!(Frame::default().operation(), None);
    }
}
