use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use encoding_rs::Encoding;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use crate::codec::Utf8Transcoder;

/// Boxed byte source handed from a store to the decoder.
pub type ByteReader = Box<dyn AsyncRead + Unpin + Send>;

const READ_BUFFER: usize = 1 << 16;

/// What the store told us about an object's bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMeta {
    /// e.g. "text/csv; charset=windows-1252" or "application/gzip"
    pub content_type: Option<String>,
    /// e.g. "gzip", "zstd"
    pub content_encoding: Option<String>,
}

impl ContentMeta {
    /// Best-effort metadata from a key's extension, for stores that keep none.
    pub fn from_key(key: &str) -> Self {
        let content_type = if key.ends_with(".gz") {
            "application/gzip"
        } else if key.ends_with(".zst") {
            "application/zstd"
        } else {
            "text/csv"
        };
        Self {
            content_type: Some(content_type.to_string()),
            content_encoding: None,
        }
    }

    fn compression(&self, key: &str) -> Compression {
        let ce = self
            .content_encoding
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let ct = self
            .content_type
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mime = ct.split(';').next().unwrap_or_default().trim();

        if ce.split(',').any(|s| s.trim() == "gzip")
            || matches!(mime, "application/gzip" | "application/x-gzip")
            || key.ends_with(".gz")
        {
            Compression::Gzip
        } else if ce.split(',').any(|s| s.trim() == "zstd")
            || mime == "application/zstd"
            || key.ends_with(".zst")
        {
            Compression::Zstd
        } else {
            Compression::None
        }
    }

    /// Charset named by the content type's `charset=` parameter, UTF-8 otherwise.
    pub fn charset(&self) -> &'static Encoding {
        let Some(content_type) = self.content_type.as_deref() else {
            return encoding_rs::UTF_8;
        };
        content_type
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, label)| label.trim().trim_matches('"'))
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(encoding_rs::UTF_8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Zstd,
}

/// Wraps raw object bytes with decompression and UTF-8 transcoding as the
/// metadata (or, failing that, the key's extension) asks for.
pub fn content_reader(raw: ByteReader, meta: &ContentMeta, key: &str) -> ByteReader {
    let buffered = BufReader::with_capacity(READ_BUFFER, raw);
    let decompressed: ByteReader = match meta.compression(key) {
        Compression::Gzip => Box::new(GzipDecoder::new(buffered)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buffered)),
        Compression::None => Box::new(buffered),
    };

    let charset = meta.charset();
    if charset == encoding_rs::UTF_8 {
        return decompressed;
    }
    let framed = FramedRead::new(decompressed, Utf8Transcoder::new(charset));
    Box::new(StreamReader::new(framed))
}
