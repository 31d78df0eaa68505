//! A minimal memcached text-protocol client (component C11).
//!
//! One `StoreClient` is owned outright by a single writer worker; nothing
//! here is `Sync`, and nothing needs to be — the per-worker-client design
//! trades connection count for a lock-free write path.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to store at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to set read/write timeout: {0}")]
    Timeout(#[source] std::io::Error),
    #[error("write to store failed: {0}")]
    Write(#[source] std::io::Error),
    #[error("read from store failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("store replied with unexpected response: {0:?}")]
    UnexpectedReply(String),
}

/// A connected memcached text-protocol client.
pub struct StoreClient {
    addr: String,
    reader: BufReader<TcpStream>,
}

impl StoreClient {
    /// Connect to `addr` (`host:port`), applying `timeout` to the connect
    /// attempt and to every subsequent read/write.
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self, StoreError> {
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|source| StoreError::Connect {
                addr: addr.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| StoreError::Connect {
                addr: addr.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "no addresses resolved",
                ),
            })?;

        let stream =
            TcpStream::connect_timeout(&socket_addr, timeout).map_err(|source| StoreError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        stream
            .set_read_timeout(Some(timeout))
            .map_err(StoreError::Timeout)?;
        stream
            .set_write_timeout(Some(timeout))
            .map_err(StoreError::Timeout)?;

        Ok(Self {
            addr: addr.to_string(),
            reader: BufReader::new(stream),
        })
    }

    /// The `host:port` this client is connected to (for logging).
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// `set key 0 0 <len>\r\n<payload>\r\n`, expecting `STORED\r\n`.
    pub fn set(&mut self, key: &str, payload: &[u8]) -> Result<(), StoreError> {
        let stream = self.reader.get_mut();
        write!(stream, "set {key} 0 0 {}\r\n", payload.len()).map_err(StoreError::Write)?;
        stream.write_all(payload).map_err(StoreError::Write)?;
        stream.write_all(b"\r\n").map_err(StoreError::Write)?;
        stream.flush().map_err(StoreError::Write)?;

        let mut reply = String::new();
        self.reader.read_line(&mut reply).map_err(StoreError::Read)?;

        if reply.trim_end() == "STORED" {
            Ok(())
        } else {
            Err(StoreError::UnexpectedReply(reply.trim_end().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    /// A throwaway in-process server speaking just enough of the text
    /// protocol to exercise `StoreClient::set`. Stands in for a real store
    /// the way a mock peer stands in for a real remote endpoint.
    fn spawn_fake_store(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(reply.as_bytes());
            }
        });
        addr
    }

    #[test]
    fn set_succeeds_on_stored_reply() {
        let addr = spawn_fake_store("STORED\r\n");
        let mut client = StoreClient::connect(&addr, Duration::from_millis(500)).unwrap();
        client.set("idfa:abc", b"payload").unwrap();
    }

    #[test]
    fn set_fails_on_non_stored_reply() {
        let addr = spawn_fake_store("ERROR\r\n");
        let mut client = StoreClient::connect(&addr, Duration::from_millis(500)).unwrap();
        let err = client.set("idfa:abc", b"payload").unwrap_err();
        assert!(matches!(err, StoreError::UnexpectedReply(_)));
    }

    #[test]
    fn connect_fails_on_closed_port() {
        // Bind then immediately drop to free the port without anyone listening.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = StoreClient::connect(&addr, Duration::from_millis(200));
        assert!(result.is_err());
    }
}
