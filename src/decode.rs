//! Telegram decoding.
//!
//! These functions work on complete response telegrams as read from any
//! transport. They hold no state and never touch the device.

use crate::{
    measurement::{DeviceInfo, Measurement},
    proto::DecodeError,
    rawmea::{RawDisplay, RawInfo},
};

/// Decode the 57 byte response to the info request.
pub fn decode_info_telegram(bytes: &[u8]) -> Result<DeviceInfo, DecodeError> {
    RawInfo::try_from(bytes).map(DeviceInfo::from)
}

/// Decode the 17 byte display response into the field values, without scaling.
pub fn decode_display_telegram(bytes: &[u8]) -> Result<RawDisplay, DecodeError> {
    RawDisplay::try_from(bytes)
}

/// Decode the 17 byte display response, scaled by function and range.
pub fn decode_measurement_base_units(bytes: &[u8]) -> Result<Measurement, DecodeError> {
    Measurement::base_units(&RawDisplay::try_from(bytes)?)
}

/// Decode the 17 byte display response, scaled by the scope byte.
pub fn decode_measurement_human_units(bytes: &[u8]) -> Result<Measurement, DecodeError> {
    Measurement::human_units(&RawDisplay::try_from(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{scale, Function, FUNCTIONS};
    use crate::rawmea::tests::{display_telegram, info_telegram};

    #[test]
    fn test_info_telegram() {
        let buf = info_telegram("MM12    ", "SN123   ", 0x0001, 0x0064);
        let info = decode_info_telegram(&buf).unwrap();
        assert_eq!(info.model, "MM12");
        assert_eq!(info.serial, "SN123");
        assert_eq!(info.model_id, 1);
        assert_eq!(info.firmware, 1.0);
    }

    #[test]
    fn test_dc_volt() {
        let buf = display_telegram(0x02, 0x02, 1234, 0);
        let m = decode_measurement_base_units(&buf).unwrap();
        assert_eq!(m.function, Some(Function::V_DC));
        assert_eq!(m.function_name(), "DC V");
        assert_eq!(m.unit, "V");
        assert!((m.value - 12.34).abs() < 1e-12);
    }

    #[test]
    fn test_all_ranges_scale_the_sample() {
        let sample = -54321;
        for info in FUNCTIONS.iter() {
            let family = match info.family {
                Some(family) => family,
                None => continue,
            };
            for (range, exp) in family.table() {
                let buf = display_telegram(info.function as u8, *range, sample, 0);
                let m = decode_measurement_base_units(&buf).unwrap();
                let expected = f64::from(sample) * family.multiplier(*range).unwrap();
                assert!(
                    (m.value - expected).abs() <= expected.abs() * 1e-12,
                    "{} range {}: {} != {}",
                    info.name,
                    range,
                    m.value,
                    expected
                );
                assert_eq!(m.value, scale(sample, *exp));
                assert_eq!(m.unit, info.unit);
                assert_eq!(m.function_name(), info.name);
            }
        }
    }

    #[test]
    fn test_sample_limits() {
        let min = decode_measurement_base_units(&display_telegram(0x00, 0x00, -0x80_0000, 0))
            .unwrap();
        assert_eq!(min.value, -8_388_608.0);

        let max = decode_measurement_base_units(&display_telegram(0x00, 0x00, 0x7F_FFFF, 0))
            .unwrap();
        assert_eq!(max.value, 8_388_607.0);
    }

    #[test]
    fn test_invalid_headers() {
        let mut buf = display_telegram(0x02, 0x02, 1234, 0);
        buf[3] = 0x0D;
        assert_eq!(
            decode_measurement_base_units(&buf),
            Err(DecodeError::InvalidResponseHeader(0x5555_010D))
        );
        assert_eq!(
            decode_measurement_human_units(&buf),
            Err(DecodeError::InvalidResponseHeader(0x5555_010D))
        );

        let mut buf = info_telegram("MM12", "SN123", 1, 100);
        buf[0] = 0xAA;
        assert_eq!(
            decode_info_telegram(&buf),
            Err(DecodeError::InvalidResponseHeader(0xAA55_0034))
        );
    }

    #[test]
    fn test_short_telegram() {
        let buf = display_telegram(0x02, 0x02, 1234, 0);
        assert_eq!(
            decode_measurement_base_units(&buf[..10]),
            Err(DecodeError::InvalidLength {
                expected: 17,
                actual: 10
            })
        );
        assert!(decode_info_telegram(&[]).is_err());
    }

    #[test]
    fn test_unknown_codes() {
        let buf = display_telegram(0x3A, 0x00, 1, 0);
        assert_eq!(
            decode_measurement_base_units(&buf),
            Err(DecodeError::UnknownFunctionCode(0x3A))
        );

        let buf = display_telegram(0x82, 0x84, 1, 0);
        assert_eq!(
            decode_measurement_base_units(&buf),
            Err(DecodeError::UnknownRangeCode {
                function: 0x02,
                range: 0x04
            })
        );

        let buf = display_telegram(0x02, 0x02, 1, 0b1110_0001);
        assert_eq!(
            decode_measurement_human_units(&buf),
            Err(DecodeError::UnknownScopeUnit(28))
        );
    }

    #[test]
    fn test_human_units() {
        let buf = display_telegram(0x02, 0x02, 500, 0b0000_1010);
        let m = decode_measurement_human_units(&buf).unwrap();
        assert_eq!(m.value, 5.0);
        assert_eq!(m.unit, "V");
    }

    #[test]
    fn test_both_paths_read_the_same_telegram() {
        // 2.345 kOhm, ohm range 3 in base units
        let buf = display_telegram(0x85, 0x83, 2345, (0x0C << 3) | 3);
        let base = decode_measurement_base_units(&buf).unwrap();
        let human = decode_measurement_human_units(&buf).unwrap();
        assert_eq!(base.value, 23450.0);
        assert_eq!(base.unit, "Ohm");
        assert_eq!(human.value, 2.345);
        assert_eq!(human.unit, "kOhm");
        assert!(base.auto_range && human.auto_range);
    }

    #[test]
    fn test_raw_display() {
        let raw = decode_display_telegram(&display_telegram(0x0D, 0x00, -125, 0x91)).unwrap();
        assert_eq!(raw.function_code(), 0x0D);
        assert_eq!(raw.sample, -125);
        assert_eq!(raw.scope, 0x91);
    }
}
