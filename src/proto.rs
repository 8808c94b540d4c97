use self::response::Response;

pub mod codec;
pub mod command;
pub mod conv;
pub mod response;

#[cfg(test)]
pub mod fake;

use thiserror::Error;

/// Errors raised while turning a response telegram into typed data.
///
/// All of these are data errors: the exchange itself worked, but the
/// content does not match what the MM12 protocol allows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Telegram has {actual} bytes, expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Invalid response header: {:#010x}", _0)]
    InvalidResponseHeader(u32),
    #[error("Unknown function code: {:#04x}", _0)]
    UnknownFunctionCode(u8),
    #[error("Unknown range code {range:#04x} for function {function:#04x}")]
    UnknownRangeCode { function: u8, range: u8 },
    #[error("Unknown scope unit code: {:#04x}", _0)]
    UnknownScopeUnit(u8),
    #[error("Unknown scope multiplier code: {}", _0)]
    UnknownScopeMultiplier(u8),
    #[error("Scope byte does not define a multiplier")]
    UndefinedMultiplier,
    #[error("Text field is not valid ASCII")]
    InvalidText,
}

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("I/O error: {:?}", _0)]
    Io(#[from] std::io::Error),

    #[error("Serial I/O error: {:?}", _0)]
    Serial(#[from] tokio_serial::Error),

    #[error("CSV error: {:?}", _0)]
    Csv(#[from] csv::Error),

    #[error("Device did not respond in time")]
    Timeout,
    #[error("Device is not connected")]
    NotConnected,
    #[error("Connection was closed")]
    Abort,
    #[error("Unexpected response: {:?}", _0)]
    Unexpected(Response),
    #[error("Decoding failed: {}", _0)]
    Decode(#[from] DecodeError),
}

impl From<Response> for ProtoError {
    fn from(value: Response) -> Self {
        Self::Unexpected(value)
    }
}

pub type Result<T> = std::result::Result<T, ProtoError>;
