//! IMAP transport and login
//!
//! Provides the low-level `connect()` and `authenticate()` functions
//! used by `SummaryClient`. All three security modes end up as the same
//! boxed stream type so the rest of the crate deals with a single
//! [`ImapSession`].

use crate::config::{Security, SummaryConfig};
use crate::error::{Error, Result};
use async_imap::{Client, Session};
use futures::io::{AsyncRead, AsyncWrite};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, info, warn};

/// Any byte stream an IMAP session can run over.
pub trait ImapStream: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

impl<T> ImapStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

/// An unauthenticated IMAP connection.
pub type ImapClient = Client<Box<dyn ImapStream>>;

/// An authenticated IMAP session over plain TCP or TLS.
pub type ImapSession = Session<Box<dyn ImapStream>>;

/// Open the transport described by `config`.
///
/// Plain and implicit-TLS connections are ready as soon as the TCP (and
/// TLS) handshake is done; STARTTLS first upgrades the plaintext
/// connection.
///
/// # Errors
///
/// Returns [`Error::Connection`] if the host cannot be reached and
/// [`Error::Tls`] if the TLS setup or `STARTTLS` upgrade fails.
pub async fn connect(config: &SummaryConfig) -> Result<ImapClient> {
    let addr = format!("{}:{}", config.host, config.port);
    info!("Connecting to {} (security={})", addr, config.security);

    let tcp_stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| Error::Connection(format!("{addr}: {e}")))?;

    let stream: Box<dyn ImapStream> = match config.security {
        Security::Plain => Box::new(tcp_stream.compat()),
        Security::Tls => {
            let tls_stream = tls_handshake(config, tcp_stream).await?;
            Box::new(tls_stream.compat())
        }
        Security::StartTls => {
            let mut client = Client::new(tcp_stream.compat());
            client
                .run_command_and_check_ok("STARTTLS", None)
                .await
                .map_err(|e| Error::Tls(format!("STARTTLS failed: {e}")))?;

            let inner = client.into_inner().into_inner();
            let tls_stream = tls_handshake(config, inner).await?;
            Box::new(tls_stream.compat())
        }
    };

    debug!("Transport to {} established", addr);
    Ok(Client::new(stream))
}

/// Log in on a freshly connected client.
///
/// # Errors
///
/// Returns [`Error::Auth`] if the server rejects the credentials.
pub async fn authenticate(
    client: ImapClient,
    username: &str,
    password: &str,
) -> Result<ImapSession> {
    info!("Authenticating user '{}'", username);

    let session = client
        .login(username, password)
        .await
        .map_err(|(e, _)| match e {
            async_imap::error::Error::No(msg) | async_imap::error::Error::Bad(msg) => {
                Error::Auth(format!("server rejected login credentials: {msg}"))
            }
            other => Error::imap("LOGIN", other),
        })?;

    info!("Connected to IMAP server");
    Ok(session)
}

async fn tls_handshake(
    config: &SummaryConfig,
    tcp_stream: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let connector = tls_connector(config.accept_invalid_certs)?;
    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| Error::Tls(e.to_string()))
}

/// Build a TLS connector on the `ring` provider.
///
/// Certificates are checked against the platform trust store unless
/// `accept_invalid_certs` is set.
fn tls_connector(accept_invalid_certs: bool) -> Result<TlsConnector> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?;

    let config = if accept_invalid_certs {
        warn!("Certificate verification is disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate::new(&provider)))
            .with_no_client_auth()
    } else {
        builder
            .with_root_certificates(native_roots())
            .with_no_client_auth()
    };

    Ok(TlsConnector::from(Arc::new(config)))
}

fn native_roots() -> RootCertStore {
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        warn!("Could not load a native root certificate: {}", err);
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    debug!("Loaded {} native root certificates ({} ignored)", added, ignored);
    roots
}

/// Certificate verifier that trusts any server certificate.
///
/// Handshake signatures are still checked, so the peer must hold the
/// key for the certificate it presents.
#[derive(Debug)]
struct AcceptAnyCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl AcceptAnyCertificate {
    const fn new(provider: &CryptoProvider) -> Self {
        Self {
            algorithms: provider.signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
