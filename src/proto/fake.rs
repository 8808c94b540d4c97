use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::device::Port;

/// In-memory stand-in for the serial port.
///
/// Serves response bytes from a shared buffer and records everything written to it.
pub(crate) struct FakeSerial {
    response_buf: Arc<Mutex<Vec<u8>>>,
    written: Arc<Mutex<Vec<u8>>>,
    // Act like a meter that never answers once the buffered bytes are consumed.
    silent: bool,
}

impl FakeSerial {
    pub(crate) fn new(response_buf: Vec<u8>) -> Self {
        Self {
            response_buf: Arc::new(Mutex::new(response_buf)),
            written: Arc::default(),
            silent: false,
        }
    }

    pub(crate) fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Handle to append bytes the device will "send" later.
    pub(crate) fn feed(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.response_buf)
    }

    pub(crate) fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }
}

impl Port for FakeSerial {
    // Bytes in the shared buffer model replies that are still on the wire.
    fn discard_input(&self) -> tokio_serial::Result<()> {
        Ok(())
    }
}

impl tokio::io::AsyncRead for FakeSerial {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let mut response_buf = match self.response_buf.lock() {
            Ok(guard) => guard,
            Err(_) => {
                return std::task::Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "poisoned",
                )))
            }
        };
        if !response_buf.is_empty() {
            let c = buf.remaining().min(response_buf.len());
            buf.put_slice(&response_buf[0..c]);
            response_buf.drain(0..c);
        } else if self.silent {
            return std::task::Poll::Pending;
        }
        std::task::Poll::Ready(Ok(()))
    }
}

impl tokio::io::AsyncWrite for FakeSerial {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::result::Result<usize, std::io::Error>> {
        if let Ok(mut written) = self.written.lock() {
            written.extend_from_slice(buf);
        }
        std::task::Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
}
