use bytes::{BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use super::command::{Command, SYNC};
use super::response::Response;

/// Frames fixed-length MM12 responses.
///
/// The length of a response depends on the request, so the codec
/// remembers the last command it has encoded.
#[derive(Default)]
pub struct ProtocolCodec {
    last_cmd: Option<Command>,
}

impl ProtocolCodec {
    /// Forget the pending request.
    pub fn reset(&mut self) {
        self.last_cmd = None;
    }

    /// Drop everything in front of the first sync byte.
    fn skip_garbage(src: &mut BytesMut) {
        let offset = src
            .as_ref()
            .iter()
            .position(|b| *b == SYNC[0])
            .unwrap_or(src.len());
        if offset > 0 {
            debug!("Skipping {} stray bytes: {:02x?}", offset, &src[..offset]);
            let _ = src.split_to(offset);
        }
    }
}

impl Decoder for ProtocolCodec {
    type Item = Response;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let cmd = match self.last_cmd {
            Some(cmd) => cmd,
            None => {
                if !src.is_empty() {
                    debug!("Discarding {} unsolicited bytes", src.len());
                    src.clear();
                }
                return Ok(None);
            }
        };

        Self::skip_garbage(src);

        let len = cmd.response_len();
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        let frame = src.split_to(len).freeze();
        debug!("Received frame: {:02x?}", frame.as_ref());
        self.last_cmd = None;

        Ok(Some(match cmd {
            Command::ReadInfo => Response::Info(frame),
            Command::ReadDisplay => Response::Display(frame),
        }))
    }
}

impl Encoder<Command> for ProtocolCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = item.to_bytes();
        debug!("Sending {:?}: {:02x?}", item, bytes);
        dst.put_slice(&bytes);
        self.last_cmd = Some(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_display_request() {
        let mut codec = ProtocolCodec::default();
        let mut dst = BytesMut::new();
        codec.encode(Command::ReadDisplay, &mut dst).unwrap();
        assert_eq!(dst.as_ref(), &[0x55, 0x55, 0x01, 0x00, 0xAB]);
    }

    #[test]
    fn test_waits_for_complete_frame() {
        let mut codec = ProtocolCodec::default();
        codec
            .encode(Command::ReadDisplay, &mut BytesMut::new())
            .unwrap();

        let mut src = BytesMut::from(&[0x55, 0x55, 0x01, 0x0C, 0x02][..]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        assert_eq!(src.len(), 5);

        src.extend_from_slice(&[0; 12]);
        match codec.decode(&mut src).unwrap() {
            Some(Response::Display(frame)) => {
                assert_eq!(frame.len(), 17);
                assert_eq!(frame[4], 0x02);
            }
            other => panic!("Unexpected: {:?}", other),
        }
        assert!(src.is_empty());
    }

    #[test]
    fn test_skips_stray_bytes() {
        let mut codec = ProtocolCodec::default();
        codec.encode(Command::ReadInfo, &mut BytesMut::new()).unwrap();

        let mut src = BytesMut::from(&[0x00, 0xff][..]);
        src.extend_from_slice(&[0x55; 57]);
        src.extend_from_slice(&[0x01]);
        match codec.decode(&mut src).unwrap() {
            Some(Response::Info(frame)) => assert_eq!(frame.len(), 57),
            other => panic!("Unexpected: {:?}", other),
        }
        assert_eq!(src.as_ref(), &[0x01]);
    }

    #[test]
    fn test_reset_forgets_pending_request() {
        let mut codec = ProtocolCodec::default();
        codec
            .encode(Command::ReadDisplay, &mut BytesMut::new())
            .unwrap();
        codec.reset();

        let mut src = BytesMut::from(&[0x55; 17][..]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        assert!(src.is_empty());
    }

    #[test]
    fn test_unsolicited_bytes_are_dropped() {
        let mut codec = ProtocolCodec::default();
        let mut src = BytesMut::from(&[0x55, 0x55, 0x01][..]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        assert!(src.is_empty());
    }
}
