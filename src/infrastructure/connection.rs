//! Connection provider: address parsing and transport setup

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::infrastructure::beanstalk::BeanstalkClient;
use crate::infrastructure::{InfraError, InfraResult};

/// Port beanstalkd listens on by default.
pub const DEFAULT_PORT: u16 = 11300;

/// Where the queue server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// `tcp://host:port`; port defaults to 11300.
    Tcp { host: String, port: u16 },
    /// `unix://path`
    Unix(PathBuf),
}

impl Address {
    pub fn parse(raw: &str) -> InfraResult<Self> {
        let invalid = |reason: &str| InfraError::InvalidAddress {
            address: raw.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| invalid("expected tcp://host:port or unix://path"))?;

        match scheme {
            "tcp" => {
                let authority = rest.strip_suffix('/').unwrap_or(rest);
                if authority.is_empty() || authority.contains('/') {
                    return Err(invalid("expected host:port"));
                }
                let (host, port) = split_host_port(authority).ok_or_else(|| invalid("bad port"))?;
                if host.is_empty() {
                    return Err(invalid("missing host"));
                }
                Ok(Address::Tcp {
                    host: host.to_string(),
                    port,
                })
            }
            "unix" => {
                if rest.is_empty() {
                    return Err(invalid("missing socket path"));
                }
                let expanded = shellexpand::tilde(rest);
                Ok(Address::Unix(PathBuf::from(expanded.as_ref())))
            }
            other => Err(invalid(&format!("unknown scheme: {other}"))),
        }
    }
}

/// Split `host[:port]`, accepting bracketed IPv6 literals.
fn split_host_port(authority: &str) -> Option<(&str, u16)> {
    if let Some(v6) = authority.strip_prefix('[') {
        let (host, tail) = v6.split_once(']')?;
        return match tail.strip_prefix(':') {
            Some(port) => Some((host, port.parse().ok()?)),
            None if tail.is_empty() => Some((host, DEFAULT_PORT)),
            None => None,
        };
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => Some((host, port.parse().ok()?)),
        None => Some((authority, DEFAULT_PORT)),
    }
}

impl FromStr for Address {
    type Err = InfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Tcp { host, port } if host.contains(':') => {
                write!(f, "tcp://[{host}]:{port}")
            }
            Address::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
            Address::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Transport stream to the server.
pub enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Stream::Unix(s) => s.flush(),
        }
    }
}

/// Open one session to the server at `address`.
///
/// `connect_timeout` bounds TCP connection setup only; it never limits
/// how long a later `reserve` may block.
#[instrument(skip(connect_timeout))]
pub fn connect(
    address: &Address,
    connect_timeout: Option<Duration>,
) -> InfraResult<BeanstalkClient<Stream>> {
    let failed = |source: io::Error| InfraError::ConnectionFailed {
        address: address.to_string(),
        source,
    };

    let stream = match address {
        Address::Tcp { host, port } => {
            Stream::Tcp(connect_tcp(host, *port, connect_timeout).map_err(failed)?)
        }
        #[cfg(unix)]
        Address::Unix(path) => Stream::Unix(UnixStream::connect(path).map_err(failed)?),
        #[cfg(not(unix))]
        Address::Unix(_) => {
            return Err(InfraError::InvalidAddress {
                address: address.to_string(),
                reason: "unix sockets are not supported on this platform".to_string(),
            })
        }
    };
    debug!("connected to {}", address);
    Ok(BeanstalkClient::new(stream))
}

fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let Some(timeout) = timeout else {
        return TcpStream::connect((host, port));
    };
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses resolved for {host}"),
        )
    }))
}
