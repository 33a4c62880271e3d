//! Typed metadata values with byte-order-aware binary encoding.
//!
//! Every Exif tag and IPTC dataset carries one [`Value`]: a scalar or array
//! of one of the closed set of [`TypeTag`] kinds. Values know how to parse
//! themselves from payload bytes and how to serialize back, and expose
//! string/integer/float/rational accessors that return `Option` instead of
//! panicking on absent components.

use thiserror::Error;

/// Byte order used for multi-byte numeric encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

/// Declared type of a metadata value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    /// Unsigned 8-bit integers.
    Byte,
    /// NUL-terminated ASCII text (Exif).
    Ascii,
    /// Unsigned 16-bit integers.
    Short,
    /// Unsigned 32-bit integers.
    Long,
    /// Unsigned rationals (numerator, denominator).
    Rational,
    /// Signed rationals.
    SRational,
    /// Raw bytes with no declared interpretation.
    Undefined,
    /// Raw text bytes in an unspecified character set (IPTC string).
    Str,
    /// Calendar date, stored on the wire as `CCYYMMDD`.
    Date,
    /// Time of day with zone offset, stored on the wire as `HHMMSS±HHMM`.
    Time,
}

/// Errors raised while parsing a binary payload into a typed value.
///
/// All of these are recoverable from the decoder's point of view: a payload
/// that does not parse under its declared type is retried as generic text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("payload length {0} is not a multiple of the component size")]
    InvalidCount(usize),
    #[error("payload does not match the expected format")]
    Malformed,
}

/// One metadata value: a scalar or array of a single type kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Byte(Vec<u8>),
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SRational(Vec<(i32, i32)>),
    Undefined(Vec<u8>),
    Str(Vec<u8>),
    Date {
        year: i32,
        month: u32,
        day: u32,
    },
    Time {
        hour: u32,
        minute: u32,
        second: u32,
        tz_hour: i32,
        tz_minute: i32,
    },
}

impl Value {
    /// Parse `data` as a value of kind `tag`.
    pub fn read(tag: TypeTag, data: &[u8], order: ByteOrder) -> Result<Value, ValueError> {
        match tag {
            TypeTag::Byte => Ok(Value::Byte(data.to_vec())),
            TypeTag::Ascii => {
                // Trailing NUL is part of the encoding, not the text.
                let text = data.strip_suffix(&[0]).unwrap_or(data);
                Ok(Value::Ascii(String::from_utf8_lossy(text).into_owned()))
            }
            TypeTag::Short => {
                if data.len() % 2 != 0 {
                    return Err(ValueError::InvalidCount(data.len()));
                }
                let v = data
                    .chunks_exact(2)
                    .map(|c| read_u16(c, order))
                    .collect();
                Ok(Value::Short(v))
            }
            TypeTag::Long => {
                if data.len() % 4 != 0 {
                    return Err(ValueError::InvalidCount(data.len()));
                }
                let v = data.chunks_exact(4).map(|c| read_u32(c, order)).collect();
                Ok(Value::Long(v))
            }
            TypeTag::Rational => {
                if data.len() % 8 != 0 {
                    return Err(ValueError::InvalidCount(data.len()));
                }
                let v = data
                    .chunks_exact(8)
                    .map(|c| (read_u32(&c[..4], order), read_u32(&c[4..], order)))
                    .collect();
                Ok(Value::Rational(v))
            }
            TypeTag::SRational => {
                if data.len() % 8 != 0 {
                    return Err(ValueError::InvalidCount(data.len()));
                }
                let v = data
                    .chunks_exact(8)
                    .map(|c| {
                        (
                            read_u32(&c[..4], order) as i32,
                            read_u32(&c[4..], order) as i32,
                        )
                    })
                    .collect();
                Ok(Value::SRational(v))
            }
            TypeTag::Undefined => Ok(Value::Undefined(data.to_vec())),
            TypeTag::Str => Ok(Value::Str(data.to_vec())),
            TypeTag::Date => {
                // CCYYMMDD, eight ASCII digits.
                if data.len() != 8 || !data.iter().all(u8::is_ascii_digit) {
                    return Err(ValueError::Malformed);
                }
                let digits = |r: std::ops::Range<usize>| -> i64 {
                    data[r].iter().fold(0, |a, b| a * 10 + i64::from(b - b'0'))
                };
                Ok(Value::Date {
                    year: digits(0..4) as i32,
                    month: digits(4..6) as u32,
                    day: digits(6..8) as u32,
                })
            }
            TypeTag::Time => {
                // HHMMSS±HHMM, or bare HHMMSS with a zero offset.
                if data.len() != 11 && data.len() != 6 {
                    return Err(ValueError::Malformed);
                }
                if !data[..6].iter().all(u8::is_ascii_digit) {
                    return Err(ValueError::Malformed);
                }
                let digits = |r: std::ops::Range<usize>| -> u32 {
                    data[r].iter().fold(0, |a, b| a * 10 + u32::from(b - b'0'))
                };
                let (mut tz_hour, mut tz_minute) = (0i32, 0i32);
                if data.len() == 11 {
                    let sign = match data[6] {
                        b'+' => 1,
                        b'-' => -1,
                        _ => return Err(ValueError::Malformed),
                    };
                    if !data[7..].iter().all(u8::is_ascii_digit) {
                        return Err(ValueError::Malformed);
                    }
                    tz_hour = sign * digits(7..9) as i32;
                    tz_minute = sign * digits(9..11) as i32;
                }
                Ok(Value::Time {
                    hour: digits(0..2),
                    minute: digits(2..4),
                    second: digits(4..6),
                    tz_hour,
                    tz_minute,
                })
            }
        }
    }

    /// Parse a textual representation into a value of kind `tag`.
    ///
    /// This is the assignment path: containers accept text and materialize
    /// the declared type behind it.
    pub fn from_text(tag: TypeTag, text: &str) -> Result<Value, ValueError> {
        match tag {
            TypeTag::Byte => text
                .split_whitespace()
                .map(|t| t.parse().map_err(|_| ValueError::Malformed))
                .collect::<Result<_, _>>()
                .map(Value::Byte),
            TypeTag::Ascii => Ok(Value::Ascii(text.to_string())),
            TypeTag::Short => text
                .split_whitespace()
                .map(|t| t.parse().map_err(|_| ValueError::Malformed))
                .collect::<Result<_, _>>()
                .map(Value::Short),
            TypeTag::Long => text
                .split_whitespace()
                .map(|t| t.parse().map_err(|_| ValueError::Malformed))
                .collect::<Result<_, _>>()
                .map(Value::Long),
            TypeTag::Rational => text
                .split_whitespace()
                .map(parse_rational)
                .collect::<Result<Vec<(u32, u32)>, _>>()
                .map(Value::Rational),
            TypeTag::SRational => text
                .split_whitespace()
                .map(parse_srational)
                .collect::<Result<Vec<(i32, i32)>, _>>()
                .map(Value::SRational),
            TypeTag::Undefined => text
                .split_whitespace()
                .map(|t| t.parse().map_err(|_| ValueError::Malformed))
                .collect::<Result<_, _>>()
                .map(Value::Undefined),
            TypeTag::Str => Ok(Value::Str(text.as_bytes().to_vec())),
            TypeTag::Date => {
                // YYYY-MM-DD or CCYYMMDD.
                let compact: String = text.chars().filter(|c| *c != '-').collect();
                Value::read(TypeTag::Date, compact.as_bytes(), ByteOrder::Big)
            }
            TypeTag::Time => {
                // HH:MM:SS[±HH:MM] or the wire form.
                let compact: String = text.chars().filter(|c| *c != ':').collect();
                Value::read(TypeTag::Time, compact.as_bytes(), ByteOrder::Big)
            }
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Byte(_) => TypeTag::Byte,
            Value::Ascii(_) => TypeTag::Ascii,
            Value::Short(_) => TypeTag::Short,
            Value::Long(_) => TypeTag::Long,
            Value::Rational(_) => TypeTag::Rational,
            Value::SRational(_) => TypeTag::SRational,
            Value::Undefined(_) => TypeTag::Undefined,
            Value::Str(_) => TypeTag::Str,
            Value::Date { .. } => TypeTag::Date,
            Value::Time { .. } => TypeTag::Time,
        }
    }

    /// Number of components.
    pub fn count(&self) -> usize {
        match self {
            Value::Byte(v) => v.len(),
            Value::Ascii(s) => s.len() + 1,
            Value::Short(v) => v.len(),
            Value::Long(v) => v.len(),
            Value::Rational(v) => v.len(),
            Value::SRational(v) => v.len(),
            Value::Undefined(v) => v.len(),
            Value::Str(v) => v.len(),
            Value::Date { .. } | Value::Time { .. } => 1,
        }
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Value::Byte(v) => v.len(),
            Value::Ascii(s) => s.len() + 1,
            Value::Short(v) => v.len() * 2,
            Value::Long(v) => v.len() * 4,
            Value::Rational(v) => v.len() * 8,
            Value::SRational(v) => v.len() * 8,
            Value::Undefined(v) => v.len(),
            Value::Str(v) => v.len(),
            Value::Date { .. } => 8,
            Value::Time { .. } => 11,
        }
    }

    /// Serialize to bytes in the given byte order.
    pub fn write_binary(&self, order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        match self {
            Value::Byte(v) => out.extend_from_slice(v),
            Value::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            Value::Short(v) => {
                for n in v {
                    out.extend_from_slice(&encode_u16(*n, order));
                }
            }
            Value::Long(v) => {
                for n in v {
                    out.extend_from_slice(&encode_u32(*n, order));
                }
            }
            Value::Rational(v) => {
                for (n, d) in v {
                    out.extend_from_slice(&encode_u32(*n, order));
                    out.extend_from_slice(&encode_u32(*d, order));
                }
            }
            Value::SRational(v) => {
                for (n, d) in v {
                    out.extend_from_slice(&encode_u32(*n as u32, order));
                    out.extend_from_slice(&encode_u32(*d as u32, order));
                }
            }
            Value::Undefined(v) => out.extend_from_slice(v),
            Value::Str(v) => out.extend_from_slice(v),
            Value::Date { year, month, day } => {
                out.extend_from_slice(format!("{year:04}{month:02}{day:02}").as_bytes());
            }
            Value::Time {
                hour,
                minute,
                second,
                tz_hour,
                tz_minute,
            } => {
                let sign = if *tz_hour < 0 || *tz_minute < 0 { '-' } else { '+' };
                out.extend_from_slice(
                    format!(
                        "{hour:02}{minute:02}{second:02}{sign}{:02}{:02}",
                        tz_hour.abs(),
                        tz_minute.abs()
                    )
                    .as_bytes(),
                );
            }
        }
        out
    }

    /// Textual form of the whole value; array components are space-joined.
    pub fn to_text(&self) -> String {
        match self {
            Value::Byte(v) => join(v.iter()),
            Value::Ascii(s) => s.clone(),
            Value::Short(v) => join(v.iter()),
            Value::Long(v) => join(v.iter()),
            Value::Rational(v) => v
                .iter()
                .map(|(n, d)| format!("{n}/{d}"))
                .collect::<Vec<_>>()
                .join(" "),
            Value::SRational(v) => v
                .iter()
                .map(|(n, d)| format!("{n}/{d}"))
                .collect::<Vec<_>>()
                .join(" "),
            Value::Undefined(v) => join(v.iter()),
            Value::Str(v) => String::from_utf8_lossy(v).into_owned(),
            Value::Date { year, month, day } => format!("{year:04}-{month:02}-{day:02}"),
            Value::Time {
                hour,
                minute,
                second,
                tz_hour,
                tz_minute,
            } => {
                let sign = if *tz_hour < 0 || *tz_minute < 0 { '-' } else { '+' };
                format!(
                    "{hour:02}:{minute:02}:{second:02}{sign}{:02}:{:02}",
                    tz_hour.abs(),
                    tz_minute.abs()
                )
            }
        }
    }

    /// Textual form of component `i`.
    pub fn to_text_at(&self, i: usize) -> Option<String> {
        match self {
            Value::Byte(v) => v.get(i).map(u8::to_string),
            Value::Short(v) => v.get(i).map(u16::to_string),
            Value::Long(v) => v.get(i).map(u32::to_string),
            Value::Rational(v) => v.get(i).map(|(n, d)| format!("{n}/{d}")),
            Value::SRational(v) => v.get(i).map(|(n, d)| format!("{n}/{d}")),
            Value::Undefined(v) => v.get(i).map(u8::to_string),
            _ => (i == 0).then(|| self.to_text()),
        }
    }

    /// Component `i` as a signed integer.
    pub fn to_i64_at(&self, i: usize) -> Option<i64> {
        match self {
            Value::Byte(v) => v.get(i).map(|n| i64::from(*n)),
            Value::Ascii(s) => s.as_bytes().get(i).map(|b| i64::from(*b)),
            Value::Short(v) => v.get(i).map(|n| i64::from(*n)),
            Value::Long(v) => v.get(i).map(|n| i64::from(*n)),
            Value::Rational(v) => v
                .get(i)
                .and_then(|(n, d)| (*d != 0).then(|| i64::from(*n) / i64::from(*d))),
            Value::SRational(v) => v
                .get(i)
                .and_then(|(n, d)| (*d != 0).then(|| i64::from(*n) / i64::from(*d))),
            Value::Undefined(v) => v.get(i).map(|n| i64::from(*n)),
            Value::Str(v) if i == 0 => String::from_utf8_lossy(v).trim().parse().ok(),
            _ => None,
        }
    }

    /// Component `i` as a float.
    pub fn to_f64_at(&self, i: usize) -> Option<f64> {
        match self {
            Value::Rational(v) => v
                .get(i)
                .and_then(|(n, d)| (*d != 0).then(|| f64::from(*n) / f64::from(*d))),
            Value::SRational(v) => v
                .get(i)
                .and_then(|(n, d)| (*d != 0).then(|| f64::from(*n) / f64::from(*d))),
            _ => self.to_i64_at(i).map(|n| n as f64),
        }
    }

    /// Component `i` as a (numerator, denominator) pair.
    pub fn to_rational_at(&self, i: usize) -> Option<(i64, i64)> {
        match self {
            Value::Rational(v) => v.get(i).map(|(n, d)| (i64::from(*n), i64::from(*d))),
            Value::SRational(v) => v.get(i).map(|(n, d)| (i64::from(*n), i64::from(*d))),
            _ => self.to_i64_at(i).map(|n| (n, 1)),
        }
    }

    /// Raw text bytes for string-kind values, before any charset handling.
    pub fn text_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Str(v) => Some(v),
            Value::Ascii(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

fn join<T: ToString>(it: impl Iterator<Item = T>) -> String {
    it.map(|n| n.to_string()).collect::<Vec<_>>().join(" ")
}

fn parse_rational(t: &str) -> Result<(u32, u32), ValueError> {
    match t.split_once('/') {
        Some((n, d)) => Ok((
            n.parse().map_err(|_| ValueError::Malformed)?,
            d.parse().map_err(|_| ValueError::Malformed)?,
        )),
        None => Ok((t.parse().map_err(|_| ValueError::Malformed)?, 1)),
    }
}

fn parse_srational(t: &str) -> Result<(i32, i32), ValueError> {
    match t.split_once('/') {
        Some((n, d)) => Ok((
            n.parse().map_err(|_| ValueError::Malformed)?,
            d.parse().map_err(|_| ValueError::Malformed)?,
        )),
        None => Ok((t.parse().map_err(|_| ValueError::Malformed)?, 1)),
    }
}

fn read_u16(b: &[u8], order: ByteOrder) -> u16 {
    match order {
        ByteOrder::Big => u16::from_be_bytes([b[0], b[1]]),
        ByteOrder::Little => u16::from_le_bytes([b[0], b[1]]),
    }
}

fn read_u32(b: &[u8], order: ByteOrder) -> u32 {
    match order {
        ByteOrder::Big => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        ByteOrder::Little => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
    }
}

fn encode_u16(n: u16, order: ByteOrder) -> [u8; 2] {
    match order {
        ByteOrder::Big => n.to_be_bytes(),
        ByteOrder::Little => n.to_le_bytes(),
    }
}

fn encode_u32(n: u32, order: ByteOrder) -> [u8; 4] {
    match order {
        ByteOrder::Big => n.to_be_bytes(),
        ByteOrder::Little => n.to_le_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── binary round trips ────────────────────────────────────────────

    #[test]
    fn short_round_trip_big_endian() {
        let v = Value::read(TypeTag::Short, &[0x01, 0x02, 0x00, 0x19], ByteOrder::Big).unwrap();
        assert_eq!(v, Value::Short(vec![0x0102, 0x0019]));
        assert_eq!(v.write_binary(ByteOrder::Big), vec![0x01, 0x02, 0x00, 0x19]);
    }

    #[test]
    fn short_little_endian() {
        let v = Value::read(TypeTag::Short, &[0x19, 0x00], ByteOrder::Little).unwrap();
        assert_eq!(v, Value::Short(vec![0x19]));
        assert_eq!(v.write_binary(ByteOrder::Little), vec![0x19, 0x00]);
    }

    #[test]
    fn rational_round_trip() {
        let v = Value::Rational(vec![(48, 1), (16, 1), (30, 1)]);
        let bytes = v.write_binary(ByteOrder::Big);
        assert_eq!(bytes.len(), 24);
        let back = Value::read(TypeTag::Rational, &bytes, ByteOrder::Big).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn odd_length_short_rejected() {
        let err = Value::read(TypeTag::Short, &[1, 2, 3], ByteOrder::Big).unwrap_err();
        assert_eq!(err, ValueError::InvalidCount(3));
    }

    #[test]
    fn ascii_strips_trailing_nul() {
        let v = Value::read(TypeTag::Ascii, b"hello\0", ByteOrder::Big).unwrap();
        assert_eq!(v, Value::Ascii("hello".into()));
        assert_eq!(v.write_binary(ByteOrder::Big), b"hello\0");
    }

    #[test]
    fn date_wire_format() {
        let v = Value::read(TypeTag::Date, b"20050301", ByteOrder::Big).unwrap();
        assert_eq!(
            v,
            Value::Date {
                year: 2005,
                month: 3,
                day: 1
            }
        );
        assert_eq!(v.to_text(), "2005-03-01");
        assert_eq!(v.write_binary(ByteOrder::Big), b"20050301");
    }

    #[test]
    fn date_rejects_garbage() {
        assert!(Value::read(TypeTag::Date, b"20xx0301", ByteOrder::Big).is_err());
        assert!(Value::read(TypeTag::Date, b"2005", ByteOrder::Big).is_err());
    }

    #[test]
    fn time_with_zone() {
        let v = Value::read(TypeTag::Time, b"142530-0430", ByteOrder::Big).unwrap();
        assert_eq!(
            v,
            Value::Time {
                hour: 14,
                minute: 25,
                second: 30,
                tz_hour: -4,
                tz_minute: -30
            }
        );
        assert_eq!(v.write_binary(ByteOrder::Big), b"142530-0430");
    }

    // ── text parsing and accessors ────────────────────────────────────

    #[test]
    fn from_text_date() {
        let v = Value::from_text(TypeTag::Date, "2005-03-01").unwrap();
        assert_eq!(v.write_binary(ByteOrder::Big), b"20050301");
    }

    #[test]
    fn from_text_short() {
        assert_eq!(
            Value::from_text(TypeTag::Short, "4 2").unwrap(),
            Value::Short(vec![4, 2])
        );
        assert!(Value::from_text(TypeTag::Short, "4 x").is_err());
    }

    #[test]
    fn rational_accessors() {
        let v = Value::Rational(vec![(7, 2), (1, 0)]);
        assert_eq!(v.to_f64_at(0), Some(3.5));
        assert_eq!(v.to_f64_at(1), None); // zero denominator
        assert_eq!(v.to_rational_at(0), Some((7, 2)));
        assert_eq!(v.to_i64_at(2), None);
    }

    #[test]
    fn str_keeps_raw_bytes() {
        let v = Value::Str(vec![0xE9, 0x74, 0xE9]); // "été" in ISO-8859-1
        assert_eq!(v.text_bytes(), Some(&[0xE9, 0x74, 0xE9][..]));
        assert_eq!(v.size(), 3);
    }
}
