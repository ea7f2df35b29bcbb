use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::ports::Endpoint;
use crate::retry::RetryPolicy;
use crate::traits::Dialer;

/// Plain blocking TCP dialer.
///
/// Resolves the endpoint and tries each address in turn. Connected streams
/// have Nagle disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    type Stream = TcpStream;

    fn dial(&mut self, endpoint: &Endpoint, timeout: Option<Duration>) -> std::io::Result<TcpStream> {
        let addrs = (endpoint.host.as_str(), endpoint.port).to_socket_addrs()?;

        let mut last_err = None;
        for addr in addrs {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(%addr, "tcp connected");
                    return Ok(stream);
                }
                Err(err) => {
                    debug!(%addr, error = %err, "tcp connect failed");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            std::io::Error::new(
                ErrorKind::NotFound,
                format!("{endpoint} did not resolve to any address"),
            )
        }))
    }
}

/// Connect to `endpoint`, retrying per `policy`.
///
/// Sleeps between attempts according to the policy's backoff. When the
/// attempt budget is spent the last I/O error is returned inside
/// [`TransportError::Connect`]; this never returns an unconnected stream.
pub fn connect_with_retry<D: Dialer>(
    dialer: &mut D,
    endpoint: &Endpoint,
    policy: &RetryPolicy,
    timeout: Option<Duration>,
) -> Result<D::Stream> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match dialer.dial(endpoint, timeout) {
            Ok(stream) => {
                info!(%endpoint, attempt, "connected");
                return Ok(stream);
            }
            Err(err) => match policy.next_delay(attempt) {
                Some(delay) => {
                    warn!(
                        %endpoint,
                        attempt,
                        max_attempts = policy.attempts(),
                        error = %err,
                        retry_in = ?delay,
                        "connect failed; retrying"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                None => {
                    warn!(%endpoint, attempt, error = %err, "connect failed; giving up");
                    return Err(TransportError::Connect {
                        endpoint: endpoint.clone(),
                        attempts: attempt,
                        source: err,
                    });
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    struct RefusingDialer {
        failures_left: u32,
        calls: u32,
    }

    impl Dialer for RefusingDialer {
        type Stream = TcpStream;

        fn dial(&mut self, _endpoint: &Endpoint, _timeout: Option<Duration>) -> std::io::Result<TcpStream> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(std::io::Error::from(ErrorKind::ConnectionRefused));
            }
            let listener = TcpListener::bind("127.0.0.1:0")?;
            TcpStream::connect(listener.local_addr()?)
        }
    }

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(attempts, Duration::from_millis(1))
    }

    #[test]
    fn dial_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
        });

        let mut client = TcpDialer
            .dial(&Endpoint::new("127.0.0.1", port), Some(Duration::from_secs(1)))
            .unwrap();
        client.write_all(b"hello").unwrap();
        server.join().unwrap();
    }

    #[test]
    fn succeeds_when_failures_stay_below_limit() {
        let mut dialer = RefusingDialer {
            failures_left: 3,
            calls: 0,
        };
        let endpoint = Endpoint::new("127.0.0.1", 1);
        let stream = connect_with_retry(&mut dialer, &endpoint, &fast_policy(4), None);
        assert!(stream.is_ok());
        assert_eq!(dialer.calls, 4);
    }

    #[test]
    fn gives_up_with_typed_error_after_limit() {
        let mut dialer = RefusingDialer {
            failures_left: 10,
            calls: 0,
        };
        let endpoint = Endpoint::new("127.0.0.1", 1);
        let err = connect_with_retry(&mut dialer, &endpoint, &fast_policy(3), None).unwrap_err();
        match err {
            TransportError::Connect {
                attempts, source, ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.kind(), ErrorKind::ConnectionRefused);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(dialer.calls, 3);
    }

    #[test]
    fn refused_port_reports_connect_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = connect_with_retry(
            &mut TcpDialer,
            &Endpoint::new("127.0.0.1", port),
            &fast_policy(2),
            Some(Duration::from_millis(200)),
        )
        .unwrap_err();
        assert!(matches!(err, TransportError::Connect { attempts: 2, .. }));
    }
}
