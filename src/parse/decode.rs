use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder, Encoding};
use tracing::{debug, warn};

use crate::error::ParseError;

const READ_BUF_SIZE: usize = 8 * 1024;

/// Skips the schema-declared preamble and decodes the remaining bytes into
/// character chunks. Multi-byte sequences split across reads are carried
/// over by the decoder; malformed sequences decode to U+FFFD.
pub struct DecodingReader<R: Read> {
    inner: R,
    decoder: Decoder,
    buf: [u8; READ_BUF_SIZE],
    eof: bool,
}

impl<R: Read> DecodingReader<R> {
    /// Consumes `skip_bytes` from the front of `inner` before any decoding.
    /// Fewer available bytes than requested is an error: the stream does not
    /// contain the file the schema describes.
    pub fn new(
        mut inner: R,
        encoding: &'static Encoding,
        skip_bytes: u64,
    ) -> Result<Self, ParseError> {
        if skip_bytes > 0 {
            let skipped = io::copy(&mut inner.by_ref().take(skip_bytes), &mut io::sink())
                .map_err(|e| ParseError::io("skipping preamble bytes", e))?;
            if skipped != skip_bytes {
                warn!(skipped, requested = skip_bytes, "stream too short to skip");
                return Err(ParseError::io(
                    "skipping preamble bytes",
                    io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("skipped only [{skipped}] bytes instead of [{skip_bytes}]"),
                    ),
                ));
            }
            debug!(skipped, "skipped preamble");
        }

        Ok(Self {
            inner,
            decoder: encoding.new_decoder(),
            buf: [0; READ_BUF_SIZE],
            eof: false,
        })
    }

    /// Appends the next decoded chunk to `out`. Returns `false` once the
    /// stream is exhausted and the decoder flushed.
    pub fn read_chunk(&mut self, out: &mut String) -> Result<bool, ParseError> {
        if self.eof {
            return Ok(false);
        }

        let n = self
            .inner
            .read(&mut self.buf)
            .map_err(|e| ParseError::io("reading data stream", e))?;
        let last = n == 0;

        let mut consumed = 0;
        loop {
            out.reserve(
                self.decoder
                    .max_utf8_buffer_length(n - consumed)
                    .unwrap_or(READ_BUF_SIZE),
            );
            let (result, read, had_errors) =
                self.decoder
                    .decode_to_string(&self.buf[consumed..n], out, last);
            consumed += read;
            if had_errors {
                debug!("replaced malformed byte sequence");
            }
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }

        if last {
            self.eof = true;
        }
        Ok(!last)
    }
}
