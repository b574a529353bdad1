// Field-level view of a serialized protobuf message.
// Records are kept in input order and borrow the input buffer, so any record that isn't
// rewritten is emitted exactly as it was read, including fields unknown to any schema.

use prost::encoding::{decode_key, decode_varint, encode_varint, encoded_len_varint, WireType};
use prost::DecodeError;
use std::error::Error;
use std::fmt::{Display, Formatter};

// protobuf messages may not exceed 2GiB
pub const MAX_MESSAGE_LEN: usize = i32::MAX as usize;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError
{
    InvalidKey
    {
        offset: usize,
        error: DecodeError,
    },
    InvalidVarint
    {
        number: u32,
        offset: usize,
        error: DecodeError,
    },
    Truncated
    {
        number: u32,
        offset: usize,
        needed: u64,
        available: usize,
    },
    UnsupportedGroup
    {
        number: u32,
        offset: usize,
    },
    WrongWireType
    {
        field: &'static str,
        number: u32,
        found: WireType,
    },
    InvalidUtf8
    {
        field: &'static str,
        error: std::str::Utf8Error,
    },
    UnexpectedExtension
    {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    TextFormatInput
    {
        error: Box<ParseError>,
    },
}
impl Display for ParseError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            ParseError::TextFormatInput { error } =>
                write!(f, "Input looks like text-format protobuf, only binary descriptors are supported ({error})"),
            _ => std::fmt::Debug::fmt(&self, f),
        }
    }
}
impl Error for ParseError { }

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializationError
{
    MessageTooLarge
    {
        len: usize,
        max: usize,
    },
}
impl Display for SerializationError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { std::fmt::Debug::fmt(&self, f) }
}
impl Error for SerializationError { }

#[derive(Debug, Clone, PartialEq)]
pub struct WireField<'d>
{
    number: u32,
    wire_type: WireType,
    key: &'d [u8],
    record: &'d [u8], // key + payload, as read
    payload: &'d [u8], // for length-delimited fields, excludes the length prefix
    replacement: Option<Vec<u8>>,
}
impl<'d> WireField<'d>
{
    #[inline] #[must_use]
    pub fn number(&self) -> u32 { self.number }
    #[inline] #[must_use]
    pub fn wire_type(&self) -> WireType { self.wire_type }

    // The current payload. Varints are returned in their encoded form
    #[must_use]
    pub fn payload(&self) -> &[u8]
    {
        match &self.replacement
        {
            Some(bytes) => bytes.as_slice(),
            None => self.payload,
        }
    }

    pub fn as_str(&self) -> Option<Result<&str, std::str::Utf8Error>>
    {
        match self.wire_type
        {
            WireType::LengthDelimited => Some(std::str::from_utf8(self.payload())),
            _ => None,
        }
    }

    // Replace the payload of a length-delimited field
    pub fn set_payload(&mut self, payload: Vec<u8>)
    {
        assert_eq!(self.wire_type, WireType::LengthDelimited, "Only length-delimited fields can be replaced (field {})", self.number);
        self.replacement = Some(payload);
    }

    fn encoded_len(&self) -> usize
    {
        match &self.replacement
        {
            Some(bytes) => self.key.len() + encoded_len_varint(bytes.len() as u64) + bytes.len(),
            None => self.record.len(),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>)
    {
        match &self.replacement
        {
            Some(bytes) =>
            {
                out.extend_from_slice(self.key);
                encode_varint(bytes.len() as u64, out);
                out.extend_from_slice(bytes);
            }
            None => out.extend_from_slice(self.record),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Descriptor<'d>
{
    fields: Vec<WireField<'d>>,
}
impl<'d> Descriptor<'d>
{
    pub fn parse(input: &'d [u8]) -> Result<Self, ParseError>
    {
        Self::parse_records(input).map_err(|error| match looks_like_text_format(input)
        {
            true => ParseError::TextFormatInput { error: Box::new(error) },
            false => error,
        })
    }

    fn parse_records(input: &'d [u8]) -> Result<Self, ParseError>
    {
        let mut fields = Vec::new();
        let mut buf = input;
        while !buf.is_empty()
        {
            let record_start = buf;
            let offset = input.len() - buf.len();

            let (number, wire_type) = decode_key(&mut buf)
                .map_err(|error| ParseError::InvalidKey { offset, error })?;
            let key = &record_start[..record_start.len() - buf.len()];

            let payload = match wire_type
            {
                WireType::Varint =>
                {
                    let varint_start = buf;
                    decode_varint(&mut buf)
                        .map_err(|error| ParseError::InvalidVarint { number, offset, error })?;
                    &varint_start[..varint_start.len() - buf.len()]
                }
                WireType::SixtyFourBit => take(&mut buf, 8, number, offset)?,
                WireType::ThirtyTwoBit => take(&mut buf, 4, number, offset)?,
                WireType::LengthDelimited =>
                {
                    let len = decode_varint(&mut buf)
                        .map_err(|error| ParseError::InvalidVarint { number, offset, error })?;
                    take(&mut buf, len, number, offset)?
                }
                WireType::StartGroup | WireType::EndGroup =>
                {
                    return Err(ParseError::UnsupportedGroup { number, offset });
                }
            };

            fields.push(WireField
            {
                number,
                wire_type,
                key,
                record: &record_start[..record_start.len() - buf.len()],
                payload,
                replacement: None,
            });
        }

        Ok(Self { fields })
    }

    #[inline] #[must_use]
    pub fn fields(&self) -> &[WireField<'d>] { &self.fields }

    // Every record for a field number, in wire order. Repeated records of a singular field are legal; the last one wins
    pub fn fields_numbered_mut(&mut self, number: u32) -> impl Iterator<Item=&mut WireField<'d>>
    {
        self.fields.iter_mut().filter(move |f| f.number == number)
    }

    #[must_use]
    pub fn last_field(&self, number: u32) -> Option<&WireField<'d>>
    {
        self.fields.iter().rev().find(|f| f.number == number)
    }

    #[must_use]
    pub fn encoded_len(&self) -> usize
    {
        self.fields.iter().map(WireField::encoded_len).sum()
    }

    pub fn encode(&self) -> Result<Vec<u8>, SerializationError>
    {
        let len = self.encoded_len();
        if len > MAX_MESSAGE_LEN
        {
            return Err(SerializationError::MessageTooLarge { len, max: MAX_MESSAGE_LEN });
        }

        let mut out = Vec::with_capacity(len);
        self.fields.iter().for_each(|f| f.encode_into(&mut out));
        debug_assert_eq!(len, out.len());
        Ok(out)
    }
}

// Text-format sources are printable text that starts with a field name or a comment
fn looks_like_text_format(input: &[u8]) -> bool
{
    let Some(first) = input.iter().find(|b| !b.is_ascii_whitespace()) else { return false };
    (first.is_ascii_alphabetic() || *first == b'#')
        && input.iter().all(|b| b.is_ascii_graphic() || b.is_ascii_whitespace() || *b >= 0x80)
}

fn take<'d>(buf: &mut &'d [u8], len: u64, number: u32, offset: usize) -> Result<&'d [u8], ParseError>
{
    if len > buf.len() as u64
    {
        return Err(ParseError::Truncated { number, offset, needed: len, available: buf.len() });
    }
    let (head, tail) = buf.split_at(len as usize);
    *buf = tail;
    Ok(head)
}

#[cfg(test)]
mod tests
{
    use super::*;

    // field 1 "a.riv", field 3 varint 150, field 5 fixed32
    const SAMPLE: &[u8] = &[
        0x0a, 0x05, b'a', b'.', b'r', b'i', b'v',
        0x18, 0x96, 0x01,
        0x2d, 0x01, 0x02, 0x03, 0x04,
    ];

    #[test]
    fn parse_records()
    {
        let desc = Descriptor::parse(SAMPLE).unwrap();
        let numbers: Vec<_> = desc.fields().iter().map(|f| (f.number(), f.wire_type())).collect();
        assert_eq!(vec![
            (1, WireType::LengthDelimited),
            (3, WireType::Varint),
            (5, WireType::ThirtyTwoBit),
        ], numbers);

        assert_eq!(Some(Ok("a.riv")), desc.last_field(1).unwrap().as_str());
        assert_eq!(&[0x96, 0x01], desc.last_field(3).unwrap().payload());
        assert_eq!(None, desc.last_field(3).unwrap().as_str());
        assert!(desc.last_field(2).is_none());
    }

    #[test]
    fn untouched_encode_is_identical()
    {
        let desc = Descriptor::parse(SAMPLE).unwrap();
        assert_eq!(SAMPLE, desc.encode().unwrap().as_slice());
    }

    #[test]
    fn non_canonical_varints_survive()
    {
        // field 3, varint 1 encoded with a redundant continuation byte
        let input = [0x18, 0x81, 0x00];
        let desc = Descriptor::parse(&input).unwrap();
        assert_eq!(&input, desc.encode().unwrap().as_slice());
    }

    #[test]
    fn replace_payload()
    {
        let mut desc = Descriptor::parse(SAMPLE).unwrap();
        for field in desc.fields_numbered_mut(1)
        {
            field.set_payload(b"a.rivc".to_vec());
        }
        assert_eq!(Some(Ok("a.rivc")), desc.last_field(1).unwrap().as_str());

        let out = desc.encode().unwrap();
        assert_eq!(&[0x0a, 0x06, b'a', b'.', b'r', b'i', b'v', b'c'], &out[..8]);
        assert_eq!(&SAMPLE[7..], &out[8..]);
        assert_eq!(desc.encoded_len(), out.len());
    }

    #[test]
    fn empty_input_is_empty_descriptor()
    {
        let desc = Descriptor::parse(&[]).unwrap();
        assert!(desc.fields().is_empty());
        assert!(desc.encode().unwrap().is_empty());
    }

    #[test]
    fn truncated_payload()
    {
        let err = Descriptor::parse(&SAMPLE[..5]).unwrap_err();
        assert_eq!(ParseError::Truncated { number: 1, offset: 0, needed: 5, available: 3 }, err);
    }

    #[test]
    fn truncated_varint()
    {
        assert!(matches!(Descriptor::parse(&[0x18, 0x96]), Err(ParseError::InvalidVarint { number: 3, .. })));
    }

    #[test]
    fn bad_keys()
    {
        // field number zero
        assert!(matches!(Descriptor::parse(&[0x02, 0x00]), Err(ParseError::InvalidKey { offset: 0, .. })));
        // wire type 7
        assert!(matches!(Descriptor::parse(&[0x0f]), Err(ParseError::InvalidKey { offset: 0, .. })));
        // error offset points at the failing record
        assert!(matches!(Descriptor::parse(&[0x18, 0x01, 0x0f]), Err(ParseError::InvalidKey { offset: 2, .. })));
    }

    #[test]
    fn groups_are_rejected()
    {
        assert_eq!(Err(ParseError::UnsupportedGroup { number: 1, offset: 0 }), Descriptor::parse(&[0x0b, 0x0c]));
    }

    #[test]
    fn text_format_is_called_out()
    {
        let text = b"# hero scene\nscene: \"fx/hero.riv\"\natlas: \"fx/hero.atlas\"\n";
        let err = Descriptor::parse(text).unwrap_err();
        let ParseError::TextFormatInput { error } = &err else { panic!("expected text format error, got {err:?}") };
        assert!(matches!(**error, ParseError::InvalidKey { .. } | ParseError::UnsupportedGroup { .. } | ParseError::Truncated { .. }), "{error:?}");
        assert!(err.to_string().contains("only binary descriptors are supported"), "{err}");

        // 's' decodes as a group key
        assert_eq!(
            Err(ParseError::TextFormatInput { error: Box::new(ParseError::UnsupportedGroup { number: 14, offset: 0 }) }),
            Descriptor::parse(b"scene: \"a.riv\""));
    }

    #[test]
    fn binary_errors_are_not_text_format()
    {
        assert!(!looks_like_text_format(SAMPLE));
        assert!(!looks_like_text_format(b"  \n"));
        assert!(matches!(Descriptor::parse(&SAMPLE[..5]), Err(ParseError::Truncated { .. })));
    }
}
