/// Sync bytes every MM12 telegram starts with.
pub const SYNC: [u8; 2] = [0x55, 0x55];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Model, serial number and firmware version.
    ReadInfo,
    /// Current display content.
    ReadDisplay,
}

impl Command {
    /// Command byte following the sync bytes.
    pub fn code(&self) -> u8 {
        match self {
            Command::ReadInfo => 0x00,
            Command::ReadDisplay => 0x01,
        }
    }

    /// Total length of the response telegram, including header and checksum.
    pub fn response_len(&self) -> usize {
        match self {
            Command::ReadInfo => 57,
            Command::ReadDisplay => 17,
        }
    }

    /// Request telegram: sync, command, payload length (always 0) and checksum.
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut buf = [SYNC[0], SYNC[1], self.code(), 0x00, 0x00];
        buf[4] = checksum(&buf[..4]);
        buf
    }
}

/// 8 bit sum of all bytes.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0_u8, |acc, b| acc.wrapping_add(*b))
}
