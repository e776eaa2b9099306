//! Message boundary conventions.

use bytes::{Buf, BufMut, BytesMut};

use crate::config::Limits;
use crate::error::{Error, Result};

/// Size of the big-endian length header used by [`Framing::LengthPrefixed`].
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// How discrete messages are recovered from the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Framing {
    /// 4-byte big-endian payload length, then the payload. Binary safe.
    #[default]
    LengthPrefixed,
    /// Payload followed by a delimiter byte. The payload must not contain it.
    Delimited(u8),
}

impl Framing {
    /// Newline-terminated text lines.
    #[must_use]
    pub const fn lines() -> Self {
        Framing::Delimited(b'\n')
    }

    /// NUL-terminated C strings.
    #[must_use]
    pub const fn c_strings() -> Self {
        Framing::Delimited(0)
    }

    /// Append the framed form of `payload` to `dst`.
    ///
    /// # Errors
    ///
    /// - [`Error::MessageTooLarge`] if the payload exceeds `limits`
    /// - [`Error::InvalidArgument`] if a delimited payload contains the delimiter
    pub fn encode(&self, payload: &[u8], limits: &Limits, dst: &mut BytesMut) -> Result<()> {
        limits.check_message_size(payload.len())?;
        match *self {
            Framing::LengthPrefixed => {
                let len = u32::try_from(payload.len()).map_err(|_| Error::MessageTooLarge {
                    size: payload.len(),
                    max: u32::MAX as usize,
                })?;
                dst.reserve(LENGTH_PREFIX_SIZE + payload.len());
                dst.put_u32(len);
                dst.put_slice(payload);
            }
            Framing::Delimited(delim) => {
                if let Some(pos) = payload.iter().position(|&b| b == delim) {
                    return Err(Error::InvalidArgument(format!(
                        "payload contains delimiter {delim:#04x} at offset {pos}"
                    )));
                }
                dst.reserve(payload.len() + 1);
                dst.put_slice(payload);
                dst.put_u8(delim);
            }
        }
        Ok(())
    }

    /// Remove one complete message from the front of `src`.
    ///
    /// Returns `Ok(None)` when `src` does not yet hold a whole message; the
    /// partial bytes stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`] as soon as the pending message is
    /// known to exceed `limits`.
    pub fn decode(&self, src: &mut BytesMut, limits: &Limits) -> Result<Option<Vec<u8>>> {
        match *self {
            Framing::LengthPrefixed => {
                if src.len() < LENGTH_PREFIX_SIZE {
                    return Ok(None);
                }
                let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
                limits.check_message_size(len)?;
                if src.len() < LENGTH_PREFIX_SIZE + len {
                    src.reserve(LENGTH_PREFIX_SIZE + len - src.len());
                    return Ok(None);
                }
                src.advance(LENGTH_PREFIX_SIZE);
                Ok(Some(src.split_to(len).to_vec()))
            }
            Framing::Delimited(delim) => match src.iter().position(|&b| b == delim) {
                Some(pos) => {
                    limits.check_message_size(pos)?;
                    let message = src.split_to(pos).to_vec();
                    src.advance(1);
                    Ok(Some(message))
                }
                None => {
                    limits.check_message_size(src.len())?;
                    Ok(None)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(framing: Framing, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        framing
            .encode(payload, &Limits::default(), &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_length_prefix_layout() {
        let buf = encoded(Framing::LengthPrefixed, b"PING");
        assert_eq!(&buf[..], &[0, 0, 0, 4, b'P', b'I', b'N', b'G']);
    }

    #[test]
    fn test_delimited_layout() {
        let buf = encoded(Framing::lines(), b"$CONTINUE");
        assert_eq!(&buf[..], b"$CONTINUE\n");
    }

    #[test]
    fn test_delimited_rejects_embedded_delimiter() {
        let mut buf = BytesMut::new();
        let err = Framing::c_strings()
            .encode(b"a\0b", &Limits::default(), &mut buf)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_respects_limits() {
        let mut buf = BytesMut::new();
        let err = Framing::LengthPrefixed
            .encode(&[0u8; 11], &Limits::new(10), &mut buf)
            .unwrap_err();
        assert_eq!(err, Error::MessageTooLarge { size: 11, max: 10 });
    }

    #[test]
    fn test_decode_waits_for_whole_message() {
        let full = encoded(Framing::LengthPrefixed, b"hello");
        let limits = Limits::default();

        let mut partial = BytesMut::from(&full[..3]);
        assert_eq!(Framing::LengthPrefixed.decode(&mut partial, &limits), Ok(None));
        assert_eq!(partial.len(), 3);

        let mut partial = BytesMut::from(&full[..7]);
        assert_eq!(Framing::LengthPrefixed.decode(&mut partial, &limits), Ok(None));

        partial.extend_from_slice(&full[7..]);
        assert_eq!(
            Framing::LengthPrefixed.decode(&mut partial, &limits),
            Ok(Some(b"hello".to_vec()))
        );
        assert!(partial.is_empty());
    }

    #[test]
    fn test_decode_splits_concatenated_messages() {
        let mut buf = BytesMut::from(&b"$GET,state\n$CONTINUE\n$EXP"[..]);
        let limits = Limits::default();
        let lines = Framing::lines();

        assert_eq!(lines.decode(&mut buf, &limits), Ok(Some(b"$GET,state".to_vec())));
        assert_eq!(lines.decode(&mut buf, &limits), Ok(Some(b"$CONTINUE".to_vec())));
        assert_eq!(lines.decode(&mut buf, &limits), Ok(None));
        assert_eq!(&buf[..], b"$EXP");
    }

    #[test]
    fn test_decode_empty_messages() {
        let limits = Limits::default();
        let mut buf = encoded(Framing::LengthPrefixed, b"");
        assert_eq!(
            Framing::LengthPrefixed.decode(&mut buf, &limits),
            Ok(Some(Vec::new()))
        );
        let mut buf = BytesMut::from(&b"\n"[..]);
        assert_eq!(Framing::lines().decode(&mut buf, &limits), Ok(Some(Vec::new())));
    }

    #[test]
    fn test_decode_oversized_header_fails_early() {
        let mut buf = BytesMut::from(&[0x00, 0x10, 0x00, 0x00][..]);
        let err = Framing::LengthPrefixed
            .decode(&mut buf, &Limits::new(1024))
            .unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { size: 0x0010_0000, .. }));
    }

    #[test]
    fn test_decode_unterminated_line_over_limit() {
        let mut buf = BytesMut::from(&[b'x'; 20][..]);
        let err = Framing::lines().decode(&mut buf, &Limits::new(16)).unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { size: 20, max: 16 }));
    }
}
