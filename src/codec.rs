use bytes::{Buf, BytesMut};
use encoding_rs::{Decoder as CharsetDecoder, Encoding};
use std::io;
use tokio_util::codec::Decoder;

/// Frames a byte stream in some legacy charset into UTF-8 chunks.
///
/// Partial multi-byte sequences at a chunk boundary stay buffered inside the
/// charset decoder until the next read.
pub(crate) struct Utf8Transcoder {
    charset: CharsetDecoder,
}

impl Utf8Transcoder {
    pub(crate) fn new(encoding: &'static Encoding) -> Self {
        Self {
            charset: encoding.new_decoder_with_bom_removal(),
        }
    }

    fn transcode(&mut self, src: &[u8], last: bool) -> (usize, BytesMut) {
        let capacity = self
            .charset
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len() * 3);
        let mut out = vec![0u8; capacity];
        let (_, read, written, _) = self.charset.decode_to_utf8(src, &mut out, last);
        out.truncate(written);
        (read, BytesMut::from(&out[..]))
    }
}

impl Decoder for Utf8Transcoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, io::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let (read, chunk) = self.transcode(src, false);
        src.advance(read);
        if chunk.is_empty() {
            return Ok(None);
        }
        Ok(Some(chunk))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, io::Error> {
        let (_, chunk) = self.transcode(src, true);
        src.clear();
        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }
}
