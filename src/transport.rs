//! Transport connection over TCP or client-side TLS.
//!
//! The transport owns the socket and the line codec. After connecting it is
//! split into a read half (consumed by the client's dispatch loop) and a
//! cloneable [`Connection`] handle whose writes funnel through a single
//! spawned writer task, so the dispatch section and independent timers can
//! both write without racing.
//!
//! # Security caveat
//!
//! TLS certificate validation is intentionally **accept-all**: the peer's
//! certificate chain and host name are never verified. The upgrade still
//! provides transport encryption, but not peer authentication. This mirrors
//! the behavior of many bouncer-style IRC clients and is a documented
//! default, not an oversight.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context as TaskContext, Poll};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream as ClientTlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{self, DigitallySignedStruct, SignatureScheme};
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::codec::LineCodec;
use crate::error::ProtocolError;

/// The raw stream under the framed transport.
#[non_exhaustive]
pub enum TransportStream {
    /// Plain TCP stream.
    Tcp(TcpStream),
    /// Client-side TLS stream (boxed for size).
    Tls(Box<ClientTlsStream<TcpStream>>),
}

impl AsyncRead for TransportStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_read(cx, buf),
            Self::Tls(inner) => Pin::new(inner).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TransportStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_write(cx, buf),
            Self::Tls(inner) => Pin::new(inner).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_flush(cx),
            Self::Tls(inner) => Pin::new(inner).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_shutdown(cx),
            Self::Tls(inner) => Pin::new(inner).poll_shutdown(cx),
        }
    }
}

/// The inbound line stream handed to the dispatch loop.
pub type Reader = SplitStream<Framed<TransportStream, LineCodec>>;

type Writer = SplitSink<Framed<TransportStream, LineCodec>, String>;

/// A framed IRC transport, established but not yet split.
pub struct Transport {
    framed: Framed<TransportStream, LineCodec>,
}

impl Transport {
    /// Establish the underlying stream, optionally upgrading to TLS before
    /// any protocol traffic.
    pub async fn connect(host: &str, port: u16, tls: bool) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect((host, port)).await?;
        let stream = if tls {
            let connector = TlsConnector::from(Arc::new(insecure_client_config()?));
            let name = ServerName::try_from(host.to_owned())
                .map_err(|_| ProtocolError::InvalidServerName(host.to_owned()))?;
            TransportStream::Tls(Box::new(connector.connect(name, stream).await?))
        } else {
            TransportStream::Tcp(stream)
        };
        Ok(Self {
            framed: Framed::new(stream, LineCodec::new()),
        })
    }

    /// Split the transport into an outbound [`Connection`] handle and the
    /// inbound line stream, spawning the writer task.
    pub fn start(self) -> (Connection, Reader) {
        let (sink, stream) = self.framed.split();
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        tokio::spawn(write_loop(sink, rx, Arc::clone(&connected)));
        (
            Connection {
                outbound: tx,
                connected,
            },
            stream,
        )
    }
}

enum Outbound {
    Line(String),
    Shutdown,
}

async fn write_loop(
    mut sink: Writer,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    connected: Arc<AtomicBool>,
) {
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Line(line) => {
                if let Err(e) = sink.send(line).await {
                    warn!(error = %e, "write failed; marking connection closed");
                    connected.store(false, Ordering::SeqCst);
                    break;
                }
            }
            Outbound::Shutdown => break,
        }
    }
    connected.store(false, Ordering::SeqCst);
    let _ = sink.close().await;
    debug!("writer task stopped");
}

/// Cloneable outbound handle to the transport's write path.
///
/// All writes share the codec's clamping rules. Blank input and writes
/// after disconnect are silent no-ops, never errors.
#[derive(Clone, Debug)]
pub struct Connection {
    outbound: mpsc::UnboundedSender<Outbound>,
    connected: Arc<AtomicBool>,
}

impl Connection {
    /// Queue one formatted command for the writer task.
    pub fn send(&self, line: impl Into<String>) {
        let line = line.into();
        if line.trim().is_empty() || !self.is_connected() {
            return;
        }
        if self.outbound.send(Outbound::Line(line)).is_err() {
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    /// Whether the connection is still open for writing.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send a farewell and close the connection. A closed connection stays
    /// closed; there is no reconnection.
    pub fn quit(&self, reason: &str) {
        if !self.is_connected() {
            return;
        }
        if reason.is_empty() {
            self.send("QUIT");
        } else {
            self.send(format!("QUIT :{reason}"));
        }
        self.shutdown();
    }

    /// Close the write path without a farewell.
    pub fn shutdown(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.outbound.send(Outbound::Shutdown);
    }
}

fn insecure_client_config() -> Result<rustls::ClientConfig, ProtocolError> {
    let provider = rustls::crypto::ring::default_provider();
    let config = rustls::ClientConfig::builder_with_provider(Arc::new(provider.clone()))
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
        .with_no_client_auth();
    Ok(config)
}

/// Accept-all certificate verifier backing the documented permissive
/// default. Signatures are still checked against the presented (unverified)
/// certificate so a broken handshake fails loudly.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: CryptoProvider,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
pub(crate) fn test_connection() -> (Connection, mpsc::UnboundedReceiver<String>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            match item {
                Outbound::Line(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Outbound::Shutdown => break,
            }
        }
    });
    (
        Connection {
            outbound: tx,
            connected: Arc::new(AtomicBool::new(true)),
        },
        line_rx,
    )
}
