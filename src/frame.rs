// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::io::Cursor;
use std::string::FromUtf8Error;

use bytes::{Buf, Bytes};
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    /// Invalid message encoding.
    #[error("{0}")]
    Other(crate::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    /// Null bulk string, `$-1\r\n`.
    Null,
    Array(Vec<Frame>),
    /// Null array, `*-1\r\n`.
    NullArray,
}

impl Frame {
    /// Parses a single frame out of `src`, advancing the cursor past it.
    ///
    /// Returns [`Error::Incomplete`] when the buffer does not yet hold a whole
    /// frame; the caller is expected to read more bytes and retry. The cursor
    /// position is only meaningful on success.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in a RESP-serialized payload always identifies its
        // type. Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Simple(string))
            }
            DataType::SimpleError => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Error(string))
            }
            DataType::Integer => {
                let integer = get_integer(src)?;
                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => {
                let length = get_integer(src)?;

                if length == -1 {
                    return Ok(Frame::Null);
                }

                let length = usize::try_from(length)
                    .map_err(|_| Error::from("protocol error; negative bulk length"))?;
                let data = get_data(src, length)?;

                Ok(Frame::Bulk(data))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let length = get_integer(src)?;

                if length == -1 {
                    return Ok(Frame::NullArray);
                }

                let length = usize::try_from(length)
                    .map_err(|_| Error::from("protocol error; negative array length"))?;

                let mut frames = Vec::with_capacity(length);
                for _ in 0..length {
                    let frame = Self::parse(src)?;
                    frames.push(frame);
                }

                Ok(Frame::Array(frames))
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleString));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let digits = i.to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(data) => {
                let length = data.len().to_string();
                let mut bytes =
                    Vec::with_capacity(1 + length.len() + CRLF.len() + data.len() + CRLF.len());
                bytes.push(u8::from(DataType::BulkString));
                bytes.extend_from_slice(length.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes.extend_from_slice(data);
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Null => b"$-1\r\n".to_vec(),
            Frame::NullArray => b"*-1\r\n".to_vec(),
            Frame::Array(frames) => {
                let length = frames.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length.len() + CRLF.len());
                bytes.push(u8::from(DataType::Array));
                bytes.extend_from_slice(length.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in frames {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::NullArray => write!(f, "*-1"),
            Frame::Array(frames) => {
                write!(f, "*{}", frames.len())?;
                for frame in frames {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

/// Reads a CRLF-terminated line, excluding the terminator.
///
/// A bare `\n` is rejected: line terminators are exactly `\r\n`.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf = *src.get_ref();

    let mut position = start;
    while position < buf.len() {
        match buf[position] {
            b'\r' => {
                if position + 1 >= buf.len() {
                    return Err(Error::Incomplete);
                }
                if buf[position + 1] != b'\n' {
                    return Err("protocol error; expected LF after CR".into());
                }
                src.set_position((position + CRLF.len()) as u64);
                return Ok(&buf[start..position]);
            }
            b'\n' => return Err("protocol error; bare LF in frame".into()),
            _ => position += 1,
        }
    }

    Err(Error::Incomplete)
}

fn get_integer(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line(src)?;
    let string =
        std::str::from_utf8(line).map_err(|_| Error::from("protocol error; invalid integer"))?;
    string
        .parse::<i64>()
        .map_err(|_| "protocol error; invalid integer".into())
}

/// Reads exactly `length` payload bytes followed by CRLF. Binary-safe: the
/// payload may itself contain CR and LF bytes.
fn get_data(src: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, Error> {
    let start = src.position() as usize;
    let buf = src.get_ref();

    if buf.len() < start + length + CRLF.len() {
        return Err(Error::Incomplete);
    }
    if &buf[start + length..start + length + CRLF.len()] != CRLF {
        return Err("protocol error; bulk payload not terminated by CRLF".into());
    }

    let data = Bytes::copy_from_slice(&buf[start..start + length]);
    src.set_position((start + length + CRLF.len()) as u64);

    Ok(data)
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        "protocol error; invalid frame format".into()
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        src.to_string().into()
    }
}

impl From<String> for Error {
    fn from(src: String) -> Error {
        Error::Other(src.into())
    }
}
