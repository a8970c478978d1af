//! Fake hddtemp daemon for tests.
//!
//! Mimics the real daemon's short-lived-connection protocol: every
//! accepted connection gets the canned reply written once, then the socket
//! is closed. Listens on an ephemeral loopback port so tests never
//! collide.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// A test-scoped stand-in for the hddtemp daemon.
///
/// The accept loop runs on a plain thread so the fixture works from both
/// sync and async tests; dropping the value stops the loop and joins the
/// thread.
pub struct FakeHddtemp {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeHddtemp {
    /// Bind an ephemeral port and serve `reply` to every connection.
    pub fn spawn(reply: impl Into<String>) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        let addr = listener.local_addr()?;
        let reply = reply.into();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            for conn in listener.incoming() {
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }
                if let Ok(mut sock) = conn {
                    let _ = sock.write_all(reply.as_bytes());
                }
                // Dropping the socket closes the connection, like the real
                // daemon does after one snapshot.
            }
        });

        Ok(Self {
            addr,
            stop,
            handle: Some(handle),
        })
    }

    /// The address tests should point their client at.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for FakeHddtemp {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Wake the accept loop so it observes the stop flag.
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
