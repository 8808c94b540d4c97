use chrono::{DateTime, Local};

use super::DecodeError;

/// Convert a fixed-size ASCII field.
///
/// The MM12 pads text fields with NUL characters and spaces,
/// both are removed.
pub fn ascii_field(data: &[u8]) -> Result<String, DecodeError> {
    if !data.is_ascii() {
        return Err(DecodeError::InvalidText);
    }
    let s: String = data
        .iter()
        .filter(|b| **b != 0)
        .map(|b| *b as char)
        .collect();
    Ok(s.trim().to_string())
}

pub fn pretty_ts(ts: &DateTime<Local>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_field_padding() {
        assert_eq!(ascii_field(b"MM12\0\0\0\0").unwrap(), "MM12");
        assert_eq!(ascii_field(b" SN123  \0").unwrap(), "SN123");
        assert_eq!(ascii_field(b"\0\0\0").unwrap(), "");
    }

    #[test]
    fn test_ascii_field_rejects_binary() {
        assert_eq!(ascii_field(&[b'M', 0xB5]), Err(DecodeError::InvalidText));
    }
}
