use std::convert::TryInto;
use std::io::Cursor;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{self, Frame};
use crate::Error;

/// Frame-level codec: decodes incoming request frames out of a read buffer
/// and encodes outgoing response frames into a write buffer.
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            // Not enough data to parse a frame; the buffer is left untouched
            // so the partially received frame survives until more bytes land.
            Err(frame::Error::Incomplete) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let position: usize = cursor
            .position()
            .try_into()
            .expect("cursor position is too large");

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }
}

impl Encoder<&Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}
