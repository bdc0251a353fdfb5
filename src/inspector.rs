//! Per-folder inspection
//!
//! One folder costs at most three round trips: `EXAMINE` for the
//! message count, `SEARCH ALL` for the sequence numbers, and a single
//! `FETCH first:last (UID RFC822.SIZE)` over the whole range of hits
//! instead of one `FETCH` per message.

use crate::command;
use crate::connection::ImapSession;
use crate::error::{Error, Result};
use crate::mailbox::MailboxName;
use async_imap::imap_proto::{AttributeValue, MailboxDatum, Response};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Message count and stored size of one successfully inspected folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderRecord {
    name: MailboxName,
    message_count: u32,
    byte_size: u64,
}

impl FolderRecord {
    #[must_use]
    pub const fn new(name: MailboxName, message_count: u32, byte_size: u64) -> Self {
        Self {
            name,
            message_count,
            byte_size,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &MailboxName {
        &self.name
    }

    /// The `EXISTS` count reported when the folder was opened.
    #[must_use]
    pub const fn message_count(&self) -> u32 {
        self.message_count
    }

    /// Sum of `RFC822.SIZE` over every fetched message.
    #[must_use]
    pub const fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

/// A contiguous message sequence range, `first:last` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqRange {
    pub first: u32,
    pub last: u32,
}

impl fmt::Display for SeqRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

/// The smallest range covering every sequence number, `None` if empty.
#[must_use]
pub fn message_range<'a>(seqs: impl IntoIterator<Item = &'a u32>) -> Option<SeqRange> {
    seqs.into_iter().fold(None, |range, &seq| {
        Some(match range {
            None => SeqRange {
                first: seq,
                last: seq,
            },
            Some(SeqRange { first, last }) => SeqRange {
                first: first.min(seq),
                last: last.max(seq),
            },
        })
    })
}

/// Add up per-message sizes given as `(sequence number, size)` pairs.
///
/// # Errors
///
/// Returns [`Error::Parse`] for the first message that came back
/// without a size.
pub fn total_size(sizes: impl IntoIterator<Item = (u32, Option<u32>)>) -> Result<u64> {
    sizes.into_iter().try_fold(0u64, |total, (seq, size)| {
        size.map(|size| total + u64::from(size)).ok_or_else(|| {
            Error::Parse(format!("FETCH response for message {seq} has no RFC822.SIZE"))
        })
    })
}

/// Inspect one folder read-only.
///
/// Every error returned here is about `name` alone; callers decide
/// whether to skip the folder with [`Error::is_folder_scoped`].
///
/// # Errors
///
/// Returns [`Error::Protocol`] if `EXAMINE`, `SEARCH` or `FETCH` is
/// refused, [`Error::Parse`] if a size is missing, [`Error::Decode`] if
/// a response does not decode, and a transport error if the connection
/// fails.
pub async fn inspect(session: &mut ImapSession, name: &MailboxName) -> Result<FolderRecord> {
    let mailbox = session
        .examine(name.as_str())
        .await
        .map_err(|e| Error::imap("EXAMINE", e))?;
    let message_count = mailbox.exists;
    debug!("{} holds {} messages", name, message_count);

    let mut hits = Vec::new();
    command::run(session, "SEARCH ALL", |response| {
        if let Response::MailboxData(MailboxDatum::Search(seqs)) = response {
            hits.extend_from_slice(seqs);
        }
    })
    .await?;

    let byte_size = match message_range(&hits) {
        None => 0,
        Some(range) => fetch_total_size(session, range).await?,
    };

    Ok(FolderRecord::new(name.clone(), message_count, byte_size))
}

async fn fetch_total_size(session: &mut ImapSession, range: SeqRange) -> Result<u64> {
    debug!("Fetching sizes for messages {}", range);

    // Sizes are summed only after the tagged OK, so a refused FETCH
    // never yields a partial total.
    let mut sizes = Vec::new();
    let fetch = format!("FETCH {range} (UID RFC822.SIZE)");
    command::run(session, &fetch, |response| {
        if let Response::Fetch(seq, attributes) = response {
            let size = attributes.iter().find_map(|attribute| match attribute {
                AttributeValue::Rfc822Size(size) => Some(*size),
                _ => None,
            });
            sizes.push((*seq, size));
        }
    })
    .await?;

    total_size(sizes)
}
