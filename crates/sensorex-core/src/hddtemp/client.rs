//! hddtemp scrape client.
//!
//! The daemon speaks a short-lived-per-connection protocol: connect, receive
//! one full snapshot, and the daemon closes the socket. Every [`fetch`]
//! call runs that full cycle on a fresh connection. The client itself holds
//! no connection or buffer state, so any number of scrapes may run
//! concurrently against one client.
//!
//! [`fetch`]: HddtempClient::fetch

use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

/// Errors from a single scrape cycle. All of these are recoverable at the
/// scrape level: the collector logs them and emits an empty family.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("error connecting to hddtemp at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("error reading from hddtemp at {addr}: {source}")]
    Read {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Client for the hddtemp daemon's reply channel.
///
/// Deliberately blocking: the metrics framework calls collectors
/// synchronously, and the serving layer wraps the whole gather in a
/// blocking task.
#[derive(Debug, Clone)]
pub struct HddtempClient {
    addr: SocketAddr,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl HddtempClient {
    /// Create a client targeting the daemon at `addr`.
    pub fn new(addr: SocketAddr, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            addr,
            connect_timeout,
            read_timeout,
        }
    }

    /// Run one connect → read-to-EOF → close cycle and return the raw reply.
    pub fn fetch(&self) -> Result<String, ClientError> {
        let mut stream =
            TcpStream::connect_timeout(&self.addr, self.connect_timeout).map_err(|source| {
                ClientError::Connect {
                    addr: self.addr,
                    source,
                }
            })?;
        stream
            .set_read_timeout(Some(self.read_timeout))
            .map_err(|source| ClientError::Read {
                addr: self.addr,
                source,
            })?;

        let mut reply = String::new();
        stream
            .read_to_string(&mut reply)
            .map_err(|source| ClientError::Read {
                addr: self.addr,
                source,
            })?;
        debug!(addr = %self.addr, bytes = reply.len(), "fetched hddtemp snapshot");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sensorex_test_utils::hddtemp::FakeHddtemp;

    fn client_for(addr: SocketAddr) -> HddtempClient {
        HddtempClient::new(addr, Duration::from_secs(1), Duration::from_secs(1))
    }

    #[test]
    fn test_fetch_reads_full_reply() {
        let daemon = FakeHddtemp::spawn("|/dev/sda|WDC WD10|34|C|").unwrap();
        let client = client_for(daemon.addr());

        let reply = client.fetch().unwrap();
        assert_eq!(reply, "|/dev/sda|WDC WD10|34|C|");
    }

    #[test]
    fn test_each_fetch_gets_its_own_connection() {
        let daemon = FakeHddtemp::spawn("|/dev/sda|WDC WD10|34|C|").unwrap();
        let client = client_for(daemon.addr());

        // The fake serves one reply per connection and closes; a reused
        // connection would see EOF immediately on the second call.
        assert_eq!(client.fetch().unwrap(), client.fetch().unwrap());
    }

    #[test]
    fn test_connection_refused_is_a_connect_error() {
        let daemon = FakeHddtemp::spawn("").unwrap();
        let addr = daemon.addr();
        drop(daemon);

        let result = client_for(addr).fetch();
        assert!(matches!(result, Err(ClientError::Connect { .. })));
    }
}
