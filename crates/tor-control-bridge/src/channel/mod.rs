//! Framed message channel over a duplex byte stream.
//!
//! Carries JSON records in length-prefixed frames, one record per frame.
//! In production the reader is stdin and the writer is stdout; anything else
//! the process prints must go to stderr.

pub mod codec;
pub mod protocol;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::bytes::Bytes;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::error::ChannelError;
use codec::FrameCodec;

/// Largest frame accepted from the browser (64 MiB).
pub const MAX_INBOUND_FRAME: usize = 64 * 1024 * 1024;

/// Largest frame the browser accepts from a native host (1 MiB).
pub const MAX_OUTBOUND_FRAME: usize = 1024 * 1024;

pub struct FramedChannel<R, W> {
    reader: FramedRead<R, FrameCodec>,
    writer: FramedWrite<W, FrameCodec>,
    max_outbound: usize,
}

impl<R, W> FramedChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_limits(reader, writer, MAX_INBOUND_FRAME, MAX_OUTBOUND_FRAME)
    }

    pub fn with_limits(reader: R, writer: W, max_inbound: usize, max_outbound: usize) -> Self {
        Self {
            reader: FramedRead::new(reader, FrameCodec::new(max_inbound)),
            writer: FramedWrite::new(writer, FrameCodec::new(max_outbound)),
            max_outbound,
        }
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
    /// A truncated or oversized frame is [`ChannelError::Io`]; a complete
    /// frame whose body is not UTF-8 JSON is [`ChannelError::Payload`] and
    /// leaves the stream positioned at the next frame.
    pub async fn read_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>, ChannelError> {
        let Some(frame) = self.reader.next().await.transpose()? else {
            return Ok(None);
        };

        let text =
            std::str::from_utf8(&frame).map_err(|e| ChannelError::Payload(e.to_string()))?;
        serde_json::from_str(text)
            .map(Some)
            .map_err(|e| ChannelError::Payload(e.to_string()))
    }

    /// Serialize `record`, write it as one frame and flush.
    ///
    /// Nothing is written if the record fails to encode or is too large.
    pub async fn write_message<T: Serialize>(&mut self, record: &T) -> Result<(), ChannelError> {
        let payload = serde_json::to_vec(record)?;
        if payload.len() > self.max_outbound {
            return Err(ChannelError::Oversized {
                len: payload.len(),
                max: self.max_outbound,
            });
        }

        // send() flushes after the frame is buffered
        self.writer.send(Bytes::from(payload)).await?;
        Ok(())
    }
}
