//! Tor control-port client for circuit rotation.
//!
//! Speaks just enough of the control protocol to request a new circuit:
//! `AUTHENTICATE`, `SIGNAL NEWNYM`, `QUIT`. Assumes a cookie-less control
//! port (`CookieAuthentication 0`), the default for a stock torrc with
//! `ControlPort 9051`.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::{IdentityRotator, TransportError};
use crate::config::TOR_CONTROL_ADDR;

/// Identity rotator backed by the Tor control port.
#[derive(Debug, Clone)]
pub struct TorControl {
    addr: String,
}

impl TorControl {
    /// Creates a controller for a specific control-port address.
    pub fn new(addr: impl Into<String>) -> Self {
        TorControl { addr: addr.into() }
    }
}

impl Default for TorControl {
    fn default() -> Self {
        TorControl::new(TOR_CONTROL_ADDR)
    }
}

#[async_trait]
impl IdentityRotator for TorControl {
    async fn rotate(&self) -> Result<(), TransportError> {
        let stream = TcpStream::connect(&self.addr).await?;
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        write_half.write_all(b"AUTHENTICATE \"\"\r\n").await?;
        expect_ok(&mut lines, "AUTHENTICATE").await?;

        write_half.write_all(b"SIGNAL NEWNYM\r\n").await?;
        expect_ok(&mut lines, "SIGNAL NEWNYM").await?;

        // Best effort; the circuit change is already requested.
        let _ = write_half.write_all(b"QUIT\r\n").await;
        log::debug!("Tor circuit rotated via {}", self.addr);
        Ok(())
    }
}

/// Reads one reply line and checks for the `250` success code.
async fn expect_ok<R>(
    lines: &mut tokio::io::Lines<BufReader<R>>,
    command: &str,
) -> Result<(), TransportError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match lines.next_line().await? {
        Some(line) if line.starts_with("250") => Ok(()),
        Some(line) => Err(TransportError::TorControl(format!(
            "{command} rejected: {line}"
        ))),
        None => Err(TransportError::TorControl(format!(
            "{command}: control connection closed"
        ))),
    }
}
