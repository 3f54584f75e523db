use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder};
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Result;

pub struct Connection {
    pub id: Uuid,
    pub peer_address: SocketAddr,
    stream: TcpStream,
    codec: FrameCodec,
    // Data is read from the socket into the read buffer. When a frame is
    // parsed, the corresponding data is removed from the buffer.
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream, peer_address: SocketAddr) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            peer_address,
            stream,
            codec: FrameCodec,
            // Allocate the buffer with 4kb of capacity.
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Reads the next frame from the socket.
    ///
    /// Returns `None` when the peer closed the connection cleanly, i.e. at a
    /// frame boundary. EOF in the middle of a frame is an error.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err("connection reset by peer".into());
            }
        }
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let mut bytes = BytesMut::new();
        self.codec.encode(frame, &mut bytes)?;
        self.stream.write_all(&bytes).await?;
        Ok(())
    }
}
