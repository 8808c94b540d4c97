//!
//! This library provides communication with a Benning MM12 digital multimeter.
//!
//! <br>
//!
//! # Details
//!
//! - The MM12 is attached by its USB cable, which shows up as a virtual serial port.
//!
//! - Basic setup and connection
//!
//!   ```no_run
//!   use mm12ctrl::{Device, DEFAULT_BAUDRATE};
//!   #[tokio::main]
//!   async fn main() -> mm12ctrl::Result<()> {
//!       let path = "/dev/ttyUSB0".to_string();
//!       let mut device = Device::new(&path, DEFAULT_BAUDRATE)?;
//!       eprintln!("Connected to: {}\n", device.ident().await?.model);
//!       let mea = device.measurement_base_units().await?;
//!       println!("{}", mea);
//!       Ok(())
//!   }
//!   ```
//!
//! - Decoding telegrams without a device
//!
//!   The decoder functions in [`decode`] are pure and work on the raw
//!   response bytes, so they can be used with any transport.
//!
//! # Supported devices
//!
//!  * Benning MM12
//!

pub mod decode;
pub mod device;
pub mod logger;
pub mod measurement;
pub mod proto;
pub mod rawmea;

pub use decode::{
    decode_info_telegram, decode_measurement_base_units, decode_measurement_human_units,
};
pub use device::{Device, DeviceConfig};
pub use measurement::Measurement;
pub use proto::{DecodeError, ProtoError, Result};

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Default Baudrate for Benning MM12.
pub const DEFAULT_BAUDRATE: u32 = 9600;
