use std::io::{self, BufRead};

/// Longest line delivered in one piece. Anything longer arrives in
/// cap-sized fragments; the newline is the only record delimiter.
pub const MAX_LINE: usize = 1024;

/// Bounded line framing over a buffered byte source.
///
/// Yields owned lines including their trailing newline. A line longer than
/// the cap is returned in cap-sized fragments, and an unterminated tail is
/// delivered as a final line at end of stream. Partial data accumulated
/// before a read timeout is kept across calls, so callers can treat
/// `TimedOut` as a scheduling point and simply call again.
pub struct LineReader<R> {
    inner: R,
    pending: Vec<u8>,
    max_len: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_len(inner, MAX_LINE)
    }

    pub fn with_max_len(inner: R, max_len: usize) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            max_len,
        }
    }

    /// Read the next line (or fragment) from the source.
    ///
    /// # Returns
    /// * `Ok(Some(line))` - a newline-terminated line, a cap-sized fragment
    ///   or the unterminated tail of the stream
    /// * `Ok(None)` - end of stream
    /// * `Err(e)` - underlying read failure; `TimedOut` leaves accumulated
    ///   partial data intact so the caller may retry
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if self.pending.len() >= self.max_len {
                return Ok(Some(std::mem::take(&mut self.pending)));
            }

            let room = self.max_len - self.pending.len();
            let (used, complete) = {
                let available = match self.inner.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };

                if available.is_empty() {
                    return Ok(if self.pending.is_empty() {
                        None
                    } else {
                        Some(std::mem::take(&mut self.pending))
                    });
                }

                let window = &available[..available.len().min(room)];
                match window.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        self.pending.extend_from_slice(&window[..=pos]);
                        (pos + 1, true)
                    }
                    None => {
                        self.pending.extend_from_slice(window);
                        (window.len(), false)
                    }
                }
            };

            self.inner.consume(used);
            if complete {
                return Ok(Some(std::mem::take(&mut self.pending)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    #[test]
    fn test_reads_terminated_lines() {
        let mut reader = LineReader::new(Cursor::new(b"1GPS-A\n3WIND\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"1GPS-A\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"3WIND\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_unterminated_tail_is_delivered() {
        let mut reader = LineReader::new(Cursor::new(b"abc\ntail".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"abc\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"tail".to_vec()));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_long_line_is_fragmented_at_cap() {
        let mut reader = LineReader::with_max_len(Cursor::new(b"abcdefghij\nk\n".to_vec()), 4);
        assert_eq!(reader.next_line().unwrap(), Some(b"abcd".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"efgh".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"ij\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"k\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_empty_stream() {
        let mut reader = LineReader::new(Cursor::new(Vec::new()));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    /// Read source that emits a scripted sequence of chunks and timeouts.
    struct ScriptedRead {
        script: Vec<Result<Vec<u8>, io::ErrorKind>>,
    }

    impl Read for ScriptedRead {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.script.is_empty() {
                return Ok(0);
            }
            match self.script.remove(0) {
                Ok(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Err(kind) => Err(io::Error::new(kind, "scripted")),
            }
        }
    }

    #[test]
    fn test_partial_line_survives_timeout() {
        let source = ScriptedRead {
            script: vec![
                Ok(b"1GP".to_vec()),
                Err(io::ErrorKind::TimedOut),
                Ok(b"S\n".to_vec()),
            ],
        };
        let mut reader = LineReader::new(BufReader::new(source));

        let err = reader.next_line().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);

        // the bytes read before the timeout are still there
        assert_eq!(reader.next_line().unwrap(), Some(b"1GPS\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let source = ScriptedRead {
            script: vec![Err(io::ErrorKind::Interrupted), Ok(b"ok\n".to_vec())],
        };
        let mut reader = LineReader::new(BufReader::new(source));
        assert_eq!(reader.next_line().unwrap(), Some(b"ok\n".to_vec()));
    }
}
