//! Readiness probe for the SSH service of a freshly created server.

use gandi_core::{GandiError, Result};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Probe timings and target port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Port of the remote shell service
    pub port: u16,
    /// How long one connection attempt may take
    pub connect_timeout: Duration,
    /// How long to wait for the greeting line once connected
    pub banner_timeout: Duration,
    /// Pause after an actively refused connection
    pub refused_backoff: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            port: 22,
            connect_timeout: Duration::from_secs(5),
            banner_timeout: Duration::from_secs(5),
            refused_backoff: Duration::from_secs(2),
        }
    }
}

/// Make one attempt to connect to `host` on the configured port.
///
/// On connection, the greeting line is read on a best-effort basis and
/// handed to `on_ready` (`None` if nothing arrived in time), then `true` is
/// returned. A connect timeout returns `false` immediately; a refused
/// connection returns `false` after `refused_backoff`. The socket is dropped
/// before this function returns on every path.
///
/// # Errors
///
/// Connect failures other than refusal or timeout (unresolvable host,
/// unreachable network, ...) are returned as [`GandiError::Transport`].
pub async fn wait_for_port<F>(host: &str, settings: &ProbeSettings, on_ready: F) -> Result<bool>
where
    F: FnOnce(Option<&str>),
{
    let stream = match timeout(
        settings.connect_timeout,
        TcpStream::connect((host, settings.port)),
    )
    .await
    {
        Err(_) => {
            debug!("Connection to {}:{} timed out", host, settings.port);
            return Ok(false);
        }
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
            debug!("Connection to {}:{} refused", host, settings.port);
            tokio::time::sleep(settings.refused_backoff).await;
            return Ok(false);
        }
        Ok(Err(e)) if e.kind() == ErrorKind::TimedOut => {
            debug!("Connection to {}:{} timed out: {}", host, settings.port, e);
            return Ok(false);
        }
        Ok(Err(e)) => {
            return Err(GandiError::Transport(format!(
                "Failed to connect to {}:{}: {}",
                host, settings.port, e
            )));
        }
        Ok(Ok(stream)) => stream,
    };

    let banner = read_banner(stream, settings.banner_timeout).await;
    debug!(
        "sshd accepting connections on {}, banner is {}",
        host,
        banner.as_deref().unwrap_or("<none>")
    );
    on_ready(banner.as_deref());
    Ok(true)
}

/// Probe `host` until it accepts a connection, calling `on_tick` after every
/// failed attempt.
///
/// Unbounded, like [`crate::operation::await_completion`].
pub async fn wait_until_ready<F>(
    host: &str,
    settings: &ProbeSettings,
    mut on_tick: F,
) -> Result<Option<String>>
where
    F: FnMut(),
{
    let mut greeting = None;
    while !wait_for_port(host, settings, |banner| {
        greeting = banner.map(str::to_string);
    })
    .await?
    {
        on_tick();
    }
    Ok(greeting)
}

/// Read the first line the server sends, consuming the stream.
async fn read_banner(stream: TcpStream, limit: Duration) -> Option<String> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    match timeout(limit, reader.read_line(&mut line)).await {
        Ok(Ok(n)) if n > 0 => Some(line.trim_end().to_string()),
        _ => None,
    }
}
