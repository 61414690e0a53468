//! Length-prefixed frame codec.
//!
//! Each frame is a 4-byte little-endian unsigned length followed by exactly
//! that many payload bytes. Works over any AsyncRead/AsyncWrite (stdio,
//! pipes, sockets).

use std::io;

use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Width of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Codec that splits a byte stream into length-prefixed frames.
///
/// Wraps LengthDelimitedCodec pinned to a 4-byte little-endian prefix. The
/// payload is left opaque; JSON handling lives in [`super::FramedChannel`] so
/// a bad payload never poisons the underlying stream.
pub struct FrameCodec {
    inner: LengthDelimitedCodec,
}

impl FrameCodec {
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .length_field_length(LENGTH_PREFIX_LEN)
                .little_endian()
                .max_frame_length(max_frame_length)
                .new_codec(),
        }
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = self.inner.decode(src)?;
        if let Some(frame) = &frame {
            tracing::trace!(frame_size_bytes = frame.len(), "Decoded frame");
        }
        Ok(frame)
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        tracing::trace!(frame_size_bytes = item.len(), "Encoding frame");
        self.inner.encode(item, dst)
    }
}
