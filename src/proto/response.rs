use bytes::Bytes;

/// A complete response telegram as framed by the codec.
///
/// The payload is not interpreted here, decoding is left to
/// the functions in [`crate::decode`].
#[derive(Debug, Clone)]
pub enum Response {
    Info(Bytes),    // 57 bytes
    Display(Bytes), // 17 bytes
}

impl Response {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Response::Info(b) | Response::Display(b) => b.as_ref(),
        }
    }
}
