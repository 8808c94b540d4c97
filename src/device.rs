use futures::{SinkExt, StreamExt};
use std::{pin::Pin, time::Duration};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{
    ClearBuffer, DataBits, Parity, SerialPort, SerialPortBuilderExt, SerialStream, StopBits,
};
use tokio_util::codec::{Decoder, Framed};
use tracing::{debug, warn};

use super::proto::{codec::ProtocolCodec, command::Command, response::Response, ProtoError};
use crate::decode::{
    decode_display_telegram, decode_info_telegram, decode_measurement_base_units,
    decode_measurement_human_units,
};
use crate::measurement::{DeviceInfo, Measurement};
use crate::proto::{DecodeError, Result};
use crate::rawmea::RawDisplay;
use crate::{DEFAULT_BAUDRATE, DEFAULT_TTY};

/// Read timeout of the original serial setup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
/// Pause between sending a request and reading the response.
pub const DEFAULT_TURNAROUND: Duration = Duration::from_millis(50);

/// Byte transport below the codec.
pub(crate) trait Port: AsyncRead + AsyncWrite + Send {
    /// Drop everything received but not yet read.
    fn discard_input(&self) -> tokio_serial::Result<()>;
}

impl Port for SerialStream {
    fn discard_input(&self) -> tokio_serial::Result<()> {
        self.clear(ClearBuffer::Input)
    }
}

type Stream = Framed<Pin<Box<dyn Port>>, ProtocolCodec>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub port: String,
    pub baudrate: u32,
    pub timeout: Duration,
    pub turnaround: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_TTY.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            timeout: DEFAULT_TIMEOUT,
            turnaround: DEFAULT_TURNAROUND,
        }
    }
}

/// Connection to a Benning MM12.
///
/// Every request is a strict write / read cycle, `&mut self` keeps
/// a single request in flight.
pub struct Device {
    config: DeviceConfig,
    stream: Option<Stream>,
}

impl Device {
    pub fn new(com: impl AsRef<str>, baudrate: u32) -> Result<Self> {
        Self::with_config(DeviceConfig {
            port: com.as_ref().to_string(),
            baudrate,
            ..Default::default()
        })
    }

    pub fn with_config(config: DeviceConfig) -> Result<Self> {
        let stream = Self::open(&config)?;
        Ok(Self {
            config,
            stream: Some(stream),
        })
    }

    fn open(config: &DeviceConfig) -> Result<Stream> {
        #[allow(unused_mut)]
        let mut port = tokio_serial::new(config.port.as_str(), config.baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(config.timeout)
            .open_native_async()?;

        #[cfg(unix)]
        port.set_exclusive(false)?;

        debug!("Opened {} at {} baud", config.port, config.baudrate);

        let port: Pin<Box<dyn Port>> = Box::pin(port);
        Ok(ProtocolCodec::default().framed(port))
    }

    #[cfg(test)]
    pub(crate) fn new_faked(port: super::proto::fake::FakeSerial, config: DeviceConfig) -> Self {
        let port: Pin<Box<dyn Port>> = Box::pin(port);
        Self {
            config,
            stream: Some(ProtocolCodec::default().framed(port)),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Release the serial port. Further requests fail with [`ProtoError::NotConnected`].
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("Closed {}", self.config.port);
        }
    }

    /// Open the serial port again with the stored configuration.
    pub fn reopen(&mut self) -> Result<()> {
        self.close();
        self.stream = Some(Self::open(&self.config)?);
        Ok(())
    }

    async fn request(&mut self, cmd: Command) -> Result<Response> {
        let timeout = self.config.timeout;
        let turnaround = self.config.turnaround;
        let stream = self.stream.as_mut().ok_or(ProtoError::NotConnected)?;

        // Leftovers of a timed out or rejected exchange must not prefix the next frame.
        let stale = stream.read_buffer().len();
        if stale > 0 {
            debug!("Discarding {} stale bytes", stale);
        }
        stream.read_buffer_mut().clear();
        stream.codec_mut().reset();
        stream.get_ref().discard_input()?;

        stream.send(cmd).await?;
        tokio::time::sleep(turnaround).await;

        match tokio::time::timeout(timeout, stream.next()).await {
            Ok(Some(Ok(response))) => Ok(response),
            Ok(Some(Err(ioerr))) => Err(ioerr.into()),
            Ok(None) => Err(ProtoError::Abort),
            Err(_elapsed) => {
                warn!("No response to {:?} within {:?}", cmd, timeout);
                Err(ProtoError::Timeout)
            }
        }
    }

    async fn display(&mut self) -> Result<Response> {
        match self.request(Command::ReadDisplay).await? {
            response @ Response::Display(_) => Ok(response),
            response => Err(response.into()),
        }
    }

    pub async fn ident(&mut self) -> Result<DeviceInfo> {
        match self.request(Command::ReadInfo).await? {
            Response::Info(frame) => Ok(logged(decode_info_telegram(&frame))?),
            response => Err(response.into()),
        }
    }

    /// Display telegram fields without any scaling applied.
    pub async fn raw_display(&mut self) -> Result<RawDisplay> {
        let response = self.display().await?;
        Ok(logged(decode_display_telegram(response.as_bytes()))?)
    }

    /// Current reading scaled by function and range, in the base unit of the function.
    pub async fn measurement_base_units(&mut self) -> Result<Measurement> {
        let response = self.display().await?;
        Ok(logged(decode_measurement_base_units(response.as_bytes()))?)
    }

    /// Current reading in the unit shown on the display.
    pub async fn measurement_human_units(&mut self) -> Result<Measurement> {
        let response = self.display().await?;
        Ok(logged(decode_measurement_human_units(response.as_bytes()))?)
    }
}

fn logged<T>(
    result: std::result::Result<T, DecodeError>,
) -> std::result::Result<T, DecodeError> {
    if let Err(err) = &result {
        warn!("Discarding telegram: {}", err);
    }
    result
}
