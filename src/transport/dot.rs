//! DNS-over-TLS front end (RFC 7858): two-byte length framing over a TLS
//! stream, multiple queries per connection.

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

/// Drop connections idle longer than this.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
/// Ceiling on one framed message.
const MAX_MESSAGE_SIZE: usize = 65535;

pub struct DotTransport {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    authority: Arc<ZoneAuthority>,
}

impl DotTransport {
    pub async fn bind(
        listen: SocketAddr,
        acceptor: TlsAcceptor,
        authority: Arc<ZoneAuthority>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(listen).await?;
        info!(listen = %listener.local_addr()?, "DoT transport ready");
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
                if let Err(e) = serve_connection(tls, peer, authority).await {
                    debug!(%peer, error = %e, "connection closed");
                }
            });
        }
    }
}

async fn serve_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    authority: Arc<ZoneAuthority>,
) -> Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    loop {
        let mut length_prefix = [0u8; 2];
        match timeout(IDLE_TIMEOUT, stream.read_exact(&mut length_prefix)).await {
            Ok(Ok(_)) => {}
            // EOF or idle timeout both just end the connection.
            _ => return Ok(()),
        }

        let length = u16::from_be_bytes(length_prefix) as usize;
        if length == 0 || length > MAX_MESSAGE_SIZE {
            return Ok(());
        }

        let mut message = vec![0u8; length];
        timeout(IDLE_TIMEOUT, stream.read_exact(&mut message))
            .await
            .map_err(|_| crate::error::DnsError::Io("read timed out".to_string()))??;

        match process_message(&authority, &message).await {
            Ok(reply) => {
                stream
                    .write_all(&(reply.len() as u16).to_be_bytes())
                    .await?;
                stream.write_all(&reply).await?;
                stream.flush().await?;
            }
            Err(e) => {
                warn!(%peer, error = %e, "query dropped");
                return Ok(());
            }
        }
    }
}
