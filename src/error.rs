//! Error types for imap-folder-summary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("IMAP error: {0}")]
    Protocol(String),

    #[error("Response parsing error: {0}")]
    Parse(String),

    /// The response decoder rejected a line; the session cannot read
    /// any further responses.
    #[error("Malformed server response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an async-imap error raised by `command`.
    ///
    /// Tagged `NO`/`BAD` completions become [`Error::Protocol`], decoder
    /// failures become [`Error::Decode`], and transport failures keep
    /// their fatal variants.
    pub(crate) fn imap(command: &str, err: async_imap::error::Error) -> Self {
        use async_imap::error::Error as ImapError;

        match err {
            ImapError::No(msg) => Self::Protocol(format!("{command} said NO: {msg}")),
            ImapError::Bad(msg) => Self::Protocol(format!("{command} said BAD: {msg}")),
            ImapError::Io(e) => Self::response(command, e),
            ImapError::ConnectionLost => {
                Self::Connection(format!("connection lost during {command}"))
            }
            other => Self::Parse(format!("{command}: {other}")),
        }
    }

    /// Wrap an I/O error raised while reading the answer to `command`.
    ///
    /// async-imap reports lines its decoder rejects as
    /// `io::ErrorKind::Other` carrying the unparsed input; those become
    /// [`Error::Decode`] naming the offending line.
    pub(crate) fn response(command: &str, err: std::io::Error) -> Self {
        if err.kind() != std::io::ErrorKind::Other {
            return Self::Io(err);
        }
        let message = err.to_string();
        match offending_line(&message) {
            Some(line) => Self::Decode(format!("{command} got `{line}`")),
            None => Self::Io(err),
        }
    }

    /// Whether this error only affects the folder being inspected.
    ///
    /// Folder-scoped errors are logged and the run continues; every other
    /// variant means the connection is gone and the run aborts.
    #[must_use]
    pub const fn is_folder_scoped(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::Parse(_) | Self::Decode(_))
    }

    /// Whether the session must be replaced before the next command.
    #[must_use]
    pub const fn poisons_session(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

const DECODE_MARKER: &str = " during parsing of \"";

/// First line of the input quoted in an async-imap decoder error.
fn offending_line(message: &str) -> Option<&str> {
    let (_, input) = message.split_once(DECODE_MARKER)?;
    let line = input.split("\\r\\n").next()?;
    Some(line.trim_end_matches('"'))
}

pub type Result<T> = std::result::Result<T, Error>;
