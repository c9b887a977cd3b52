use thiserror::Error;

/// Errors that can occur on the byte transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
    #[error("transport closed")]
    Closed,
}

/// Async duplex byte stream to the controller stick.
///
/// Implementors include [`SerialTransport`](crate::SerialTransport) for a
/// local serial device. Reads return whatever bytes arrived; framing is the
/// caller's job.
pub trait Transport: Send + Sync {
    /// Writes all of `bytes`.
    async fn write(&self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Reads available bytes into `buf`, returning how many were read.
    /// `Ok(0)` means the stream has ended.
    async fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError>;
}
