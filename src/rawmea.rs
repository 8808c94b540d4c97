use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::proto::{conv::ascii_field, DecodeError};

pub(crate) const HEADER_LEN: usize = 4;

pub const INFO_LEN: usize = 57;
pub const DISPLAY_LEN: usize = 17;

/// Sync bytes, command and payload length of the info response.
pub const INFO_HEADER: u32 = 0x5555_0034;
/// Sync bytes, command and payload length of the display response.
pub const DISPLAY_HEADER: u32 = 0x5555_010C;

pub(crate) const MODEL_LEN: usize = 32;
pub(crate) const SERIAL_LEN: usize = 16;

/// Set on function and range codes if the meter selected them automatically.
pub(crate) const AUTO_FLAG: u8 = 0b1000_0000;

fn check_frame(value: &[u8], len: usize, header: u32) -> Result<(), DecodeError> {
    if value.len() != len {
        return Err(DecodeError::InvalidLength {
            expected: len,
            actual: value.len(),
        });
    }
    let found = BigEndian::read_u32(&value[..HEADER_LEN]);
    if found != header {
        return Err(DecodeError::InvalidResponseHeader(found));
    }
    Ok(())
}

/// Info telegram fields, as sent by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInfo {
    pub model: String,
    pub serial: String,
    pub model_id: u16,
    /// Firmware version in hundredths.
    pub firmware: u16,
}

impl TryFrom<&[u8]> for RawInfo {
    type Error = DecodeError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        check_frame(value, INFO_LEN, INFO_HEADER)?;

        let payload = &value[HEADER_LEN..];
        let (model, rest) = payload.split_at(MODEL_LEN);
        let (serial, rest) = rest.split_at(SERIAL_LEN);

        Ok(RawInfo {
            model: ascii_field(model)?,
            serial: ascii_field(serial)?,
            model_id: LittleEndian::read_u16(&rest[0..2]),
            firmware: LittleEndian::read_u16(&rest[2..4]),
        })
    }
}

/// Display telegram fields before any table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDisplay {
    /// Function code including the auto flag.
    pub function: u8,
    /// Range code including the auto flag.
    pub range: u8,
    /// Sign extended 24 bit sample.
    pub sample: i32,
    pub scope: u8,
}

impl RawDisplay {
    pub fn function_code(&self) -> u8 {
        self.function & !AUTO_FLAG
    }

    pub fn range_code(&self) -> u8 {
        self.range & !AUTO_FLAG
    }

    pub fn auto_mode(&self) -> bool {
        self.function & AUTO_FLAG != 0
    }

    pub fn auto_range(&self) -> bool {
        self.range & AUTO_FLAG != 0
    }
}

impl TryFrom<&[u8]> for RawDisplay {
    type Error = DecodeError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        check_frame(value, DISPLAY_LEN, DISPLAY_HEADER)?;

        let payload = &value[HEADER_LEN..];
        Ok(RawDisplay {
            function: payload[0],
            range: payload[1],
            sample: LittleEndian::read_i24(&payload[2..5]),
            scope: payload[5],
        })
    }
}
