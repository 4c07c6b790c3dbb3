//! DNS-over-HTTPS front end: POST /dns-query with an
//! `application/dns-message` body, answered in kind. The HTTP handling is
//! deliberately minimal; this adapter exists to carry bytes, not to be a
//! web server.

use super::process_message;
use crate::authority::ZoneAuthority;
use crate::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Headers plus body must fit here.
const MAX_REQUEST_SIZE: usize = 65536;

pub struct DohTransport {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    authority: Arc<ZoneAuthority>,
}

impl DohTransport {
    pub async fn bind(
        listen: SocketAddr,
        acceptor: TlsAcceptor,
        authority: Arc<ZoneAuthority>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(listen).await?;
        info!(listen = %listener.local_addr()?, "DoH transport ready");
        Ok(Self {
            listener,
            acceptor,
            authority,
        })
    }

    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            let acceptor = self.acceptor.clone();
            let authority = self.authority.clone();
            tokio::spawn(async move {
                let tls = match acceptor.accept(stream).await {
                    Ok(tls) => tls,
                    Err(e) => {
                        warn!(%peer, error = %e, "TLS handshake failed");
                        return;
                    }
                };
                if let Err(e) = serve_request(tls, peer, authority).await {
                    debug!(%peer, error = %e, "connection closed");
                }
            });
        }
    }
}

async fn serve_request<S>(
    mut stream: S,
    peer: SocketAddr,
    authority: Arc<ZoneAuthority>,
) -> Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut request = Vec::with_capacity(2048);
    let mut buf = [0u8; 2048];

    // Read until the headers are complete, then until the declared body
    // length has arrived.
    let body = loop {
        let n = match timeout(REQUEST_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(0)) | Err(_) => return Ok(()),
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e.into()),
        };
        request.extend_from_slice(&buf[..n]);
        if request.len() > MAX_REQUEST_SIZE {
            return respond(&mut stream, "413 Content Too Large", &[]).await;
        }

        if let Some(header_end) = find_header_end(&request) {
            let headers = String::from_utf8_lossy(&request[..header_end]).to_string();
            if !headers.starts_with("POST /dns-query") {
                return respond(&mut stream, "404 Not Found", &[]).await;
            }
            let content_length = content_length(&headers).unwrap_or(0);
            let body_start = header_end + 4;
            if request.len() >= body_start + content_length {
                break request[body_start..body_start + content_length].to_vec();
            }
        }
    };

    match process_message(&authority, &body).await {
        Ok(reply) => respond(&mut stream, "200 OK", &reply).await,
        Err(e) => {
            warn!(%peer, error = %e, "query dropped");
            respond(&mut stream, "500 Internal Server Error", &[]).await
        }
    }
}

fn find_header_end(request: &[u8]) -> Option<usize> {
    request.windows(4).position(|window| window == b"\r\n\r\n")
}

fn content_length(headers: &str) -> Option<usize> {
    headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

async fn respond<S>(stream: &mut S, status: &str, body: &[u8]) -> Result<()>
where
    S: tokio::io::AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/dns-message\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}
