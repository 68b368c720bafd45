//! Connectivity oracle.
//!
//! A best-effort "is the network there" signal. `true` is only a hint that
//! a remote call may succeed; `false` short-circuits straight to the
//! local-only path.

use reqwest::Url;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

pub trait Connectivity: Send + Sync {
    /// Synchronous, side-effect free read of the current signal.
    fn is_online(&self) -> bool;
}

/// Connectivity signal that is set explicitly.
///
/// Used directly by tests and `--offline`, and as the holder for the
/// result of a startup [`probe`].
#[derive(Debug)]
pub struct ManualConnectivity {
    online: AtomicBool,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Check whether a TCP connection to the server in `server_url` can be
/// opened within `timeout`, and capture the answer.
pub fn probe(server_url: &str, timeout: Duration) -> ManualConnectivity {
    let online = match resolve(server_url) {
        Some(addr) => match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => true,
            Err(e) => {
                debug!("Connectivity probe to {} failed: {}", addr, e);
                false
            }
        },
        None => false,
    };

    info!(
        "Connectivity probe for {}: {}",
        server_url,
        if online { "online" } else { "offline" }
    );
    ManualConnectivity::new(online)
}

fn resolve(server_url: &str) -> Option<SocketAddr> {
    let url = match Url::parse(server_url) {
        Ok(url) => url,
        Err(e) => {
            debug!("Cannot parse server URL {}: {}", server_url, e);
            return None;
        }
    };
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;

    match (host, port).to_socket_addrs() {
        Ok(mut addrs) => addrs.next(),
        Err(e) => {
            debug!("Cannot resolve {}:{}: {}", host, port, e);
            None
        }
    }
}
