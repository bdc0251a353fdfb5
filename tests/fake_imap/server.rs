//! In-process fake IMAP server for integration testing
//!
//! # What a folder summary sends
//!
//! ```text
//!   Server:  * OK IMAP4rev1 Fake server ready
//!   Client:  A0001 LOGIN user pass
//!   Server:  A0001 OK LOGIN completed
//!   Client:  A0002 LIST "" "*"
//!   Server:  * LIST (\HasNoChildren) "/" "INBOX"
//!   Server:  A0002 OK LIST completed
//!   Client:  A0003 EXAMINE "INBOX"
//!   Server:  * 2 EXISTS
//!   Server:  A0003 OK [READ-ONLY] EXAMINE completed
//!   Client:  A0004 SEARCH ALL
//!   Server:  * SEARCH 1 2
//!   Server:  A0004 OK SEARCH completed
//!   Client:  A0005 FETCH 1:2 (UID RFC822.SIZE)
//!   Server:  * 1 FETCH (UID 101 RFC822.SIZE 500)
//!   Server:  * 2 FETCH (UID 102 RFC822.SIZE 1500)
//!   Server:  A0005 OK FETCH completed
//!   Client:  A0006 LOGOUT
//! ```
//!
//! Every command line the server receives (minus its tag) is recorded
//! so tests can check what was, or was not, sent.
//!
//! ## Transport modes
//!
//! - [`ServerMode::Tls`]: TLS handshake first, greeting over TLS.
//! - [`ServerMode::StartTls`]: plaintext greeting, then `STARTTLS`.
//! - [`ServerMode::Plain`]: no TLS at all.

use super::handlers::{
    handle_fetch, handle_list, handle_login, handle_logout, handle_search, handle_select,
};
use super::io::write_line;
use super::mailbox::Mailbox;
use imap_codec::CommandCodec;
use imap_codec::decode::Decoder;
use imap_codec::imap_types::command::CommandBody;
use imap_codec::imap_types::mailbox::Mailbox as ImapMailbox;
use rcgen::generate_simple_self_signed;
use rustls::pki_types::PrivatePkcs8KeyDer;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

const GREETING: &str = "* OK IMAP4rev1 Fake server ready\r\n";

/// How clients reach the fake server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Tls,
    StartTls,
    Plain,
}

/// A fake IMAP server that runs on localhost with an OS-assigned port.
///
/// A self-signed certificate is generated at startup with `rcgen`, so
/// clients must be configured to accept invalid certificates.
pub struct FakeImapServer {
    port: u16,
    commands: Arc<Mutex<Vec<String>>>,
    /// Handle to the background task so it lives as long as the server.
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeImapServer {
    /// Start an implicit-TLS server with the given account state.
    pub async fn start(mailbox: Mailbox) -> Self {
        Self::start_with_mode(mailbox, ServerMode::Tls).await
    }

    /// Start a server speaking `mode`.
    ///
    /// The server runs until the `FakeImapServer` is dropped.
    pub async fn start_with_mode(mailbox: Mailbox, mode: ServerMode) -> Self {
        // Several tests may race to install the provider; losing the
        // race is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let cert = generate_simple_self_signed(vec!["127.0.0.1".to_string()])
            .expect("generate self-signed cert");
        let cert_der = cert.cert.der().clone();
        let key_der = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());

        let tls_config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(vec![cert_der], key_der.into())
            .expect("build server TLS config");

        let acceptor = TlsAcceptor::from(Arc::new(tls_config));
        let mailbox = Arc::new(mailbox);
        let commands = Arc::new(Mutex::new(Vec::new()));

        let log = commands.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _addr)) = listener.accept().await else {
                    break;
                };
                let acceptor = acceptor.clone();
                let mailbox = mailbox.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    handle_connection(stream, mode, acceptor, &mailbox, &log).await;
                });
            }
        });

        Self {
            port,
            commands,
            _handle: handle,
        }
    }

    /// The port the server is listening on.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Every command received so far, without tags, in arrival order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Received commands whose name is `name` (e.g. `"FETCH"`).
    pub fn commands_named(&self, name: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| {
                c.split_whitespace()
                    .next()
                    .is_some_and(|first| first.eq_ignore_ascii_case(name))
            })
            .collect()
    }
}

async fn handle_connection(
    stream: TcpStream,
    mode: ServerMode,
    acceptor: TlsAcceptor,
    mailbox: &Mailbox,
    log: &Mutex<Vec<String>>,
) {
    match mode {
        ServerMode::Plain => {
            let mut reader = BufReader::new(stream);
            if write_line(&mut reader, GREETING).await.is_err() {
                return;
            }
            handle_imap_session(reader, mailbox, log).await;
        }
        ServerMode::Tls => {
            let Ok(tls_stream) = acceptor.accept(stream).await else {
                return;
            };
            let mut reader = BufReader::new(tls_stream);
            if write_line(&mut reader, GREETING).await.is_err() {
                return;
            }
            handle_imap_session(reader, mailbox, log).await;
        }
        ServerMode::StartTls => {
            let mut reader = BufReader::new(stream);
            if write_line(&mut reader, GREETING).await.is_err() {
                return;
            }
            if !negotiate_starttls(&mut reader, log).await {
                return;
            }
            let Ok(tls_stream) = acceptor.accept(reader.into_inner()).await else {
                return;
            };
            handle_imap_session(BufReader::new(tls_stream), mailbox, log).await;
        }
    }
}

/// Wait for `STARTTLS` on the plaintext stream and acknowledge it.
async fn negotiate_starttls(reader: &mut BufReader<TcpStream>, log: &Mutex<Vec<String>>) -> bool {
    let mut line = String::new();
    if reader.read_line(&mut line).await.is_err() {
        return false;
    }

    let Some((tag, command)) = line.trim().split_once(' ') else {
        return false;
    };
    log.lock().unwrap().push(command.to_string());

    if !command.eq_ignore_ascii_case("STARTTLS") {
        let resp = format!("{tag} BAD Expected STARTTLS\r\n");
        let _ = write_line(reader, &resp).await;
        return false;
    }

    let resp = format!("{tag} OK Begin TLS negotiation now\r\n");
    write_line(reader, &resp).await.is_ok()
}

/// Extract the folder name from a parsed `imap_types::Mailbox`.
fn mailbox_name(mb: &ImapMailbox<'_>) -> String {
    match mb {
        ImapMailbox::Inbox => "INBOX".to_string(),
        ImapMailbox::Other(other) => {
            let bytes: &[u8] = other.as_ref();
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Run the IMAP command loop over an established stream.
///
/// Commands are decoded with `imap-codec`'s `CommandCodec` and
/// dispatched on their `CommandBody`.
async fn handle_imap_session<S: AsyncRead + AsyncWrite + Unpin>(
    mut reader: BufReader<S>,
    mailbox: &Mailbox,
    log: &Mutex<Vec<String>>,
) {
    let mut selected_folder: Option<String> = None;
    let codec = CommandCodec::default();

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let untagged = trimmed.split_once(' ').map_or(trimmed, |(_, rest)| rest);
        log.lock().unwrap().push(untagged.to_string());

        let Ok((_, command)) = codec.decode(line.as_bytes()) else {
            let tag = trimmed.split_whitespace().next().unwrap_or("*");
            let resp = format!("{tag} BAD Parse error\r\n");
            if write_line(&mut reader, &resp).await.is_err() {
                break;
            }
            continue;
        };

        let tag = command.tag.inner();

        match command.body {
            CommandBody::Login { .. } => {
                if !handle_login(tag, mailbox, &mut reader).await {
                    break;
                }
            }
            CommandBody::List { .. } => {
                handle_list(tag, mailbox, &mut reader).await;
            }
            CommandBody::Select { mailbox: mb, .. } => {
                let name = mailbox_name(&mb);
                selected_folder = handle_select(tag, &name, false, mailbox, &mut reader).await;
            }
            CommandBody::Examine { mailbox: mb, .. } => {
                let name = mailbox_name(&mb);
                selected_folder = handle_select(tag, &name, true, mailbox, &mut reader).await;
            }
            CommandBody::Search { uid: false, .. } => {
                handle_search(tag, mailbox, selected_folder.as_deref(), &mut reader).await;
            }
            CommandBody::Fetch {
                sequence_set,
                uid: false,
                ..
            } => {
                handle_fetch(
                    tag,
                    &sequence_set,
                    mailbox,
                    selected_folder.as_deref(),
                    &mut reader,
                )
                .await;
            }
            CommandBody::Logout => {
                handle_logout(tag, &mut reader).await;
                break;
            }
            _ => {
                let resp = format!("{tag} BAD Unknown command\r\n");
                if write_line(&mut reader, &resp).await.is_err() {
                    break;
                }
            }
        }
    }
}
