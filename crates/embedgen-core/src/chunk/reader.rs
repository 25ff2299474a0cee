//! Low-level helpers for pulling bytes out of a forward-only reader.

use bytes::BytesMut;
use std::io::{self, ErrorKind, Read};

/// Largest amount of buffer space reserved ahead of a single read call
pub(crate) const READ_STEP: usize = 64 * 1024;

/// Appends up to `limit` bytes from `reader` to `buf`.
///
/// Returns the number of bytes appended. A count smaller than `limit` means
/// the stream is exhausted. Space is reserved at most [`READ_STEP`] bytes at
/// a time, so the buffer only grows as far as the data that actually arrives.
/// Interrupted reads are retried.
pub(crate) fn fill_up_to<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut BytesMut,
    limit: usize,
) -> io::Result<usize> {
    let start = buf.len();
    let mut filled = 0;

    while filled < limit {
        let end = start + filled;
        let step = (limit - filled).min(READ_STEP);
        buf.resize(end + step, 0);

        match reader.read(&mut buf[end..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                buf.truncate(start + filled);
                return Err(e);
            }
        }
        buf.truncate(start + filled);
    }

    buf.truncate(start + filled);
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `step` bytes per call and fails once with `Interrupted`
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
        interrupted: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_fill_across_short_reads() {
        let mut reader = Trickle {
            data: b"abcdefgh",
            step: 3,
            interrupted: false,
        };
        let mut buf = BytesMut::new();
        assert_eq!(fill_up_to(&mut reader, &mut buf, 5).unwrap(), 5);
        assert_eq!(&buf[..], b"abcde");

        let mut buf = BytesMut::new();
        assert_eq!(fill_up_to(&mut reader, &mut buf, 5).unwrap(), 3);
        assert_eq!(&buf[..], b"fgh");
    }

    #[test]
    fn test_fill_empty_reader() {
        let mut reader: &[u8] = &[];
        let mut buf = BytesMut::new();
        assert_eq!(fill_up_to(&mut reader, &mut buf, 4).unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_unbounded_limit_tracks_data() {
        let data = vec![9u8; READ_STEP * 2 + 17];
        let mut reader = data.as_slice();
        let mut buf = BytesMut::new();

        assert_eq!(
            fill_up_to(&mut reader, &mut buf, usize::MAX).unwrap(),
            data.len()
        );
        assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn test_appends_after_existing_bytes() {
        let mut reader: &[u8] = b"tail";
        let mut buf = BytesMut::from(&b"head-"[..]);
        assert_eq!(fill_up_to(&mut reader, &mut buf, 10).unwrap(), 4);
        assert_eq!(&buf[..], b"head-tail");
    }

    #[test]
    fn test_error_keeps_bytes_read_so_far() {
        struct Broken(bool);
        impl Read for Broken {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0 {
                    return Err(io::Error::new(ErrorKind::Other, "gone"));
                }
                self.0 = true;
                buf[..2].copy_from_slice(b"ok");
                Ok(2)
            }
        }

        let mut buf = BytesMut::new();
        assert!(fill_up_to(&mut Broken(false), &mut buf, 8).is_err());
        assert_eq!(&buf[..], b"ok");
    }
}
