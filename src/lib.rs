//! IMAP folder summary library
//!
//! Connects to an IMAP server, lists every folder the user can see,
//! and reports how many messages each folder holds and how many bytes
//! they take up. The server is only ever read: folders are opened with
//! `EXAMINE` and sizes come from `RFC822.SIZE`.
//!
//! A folder that cannot be inspected is skipped and reported in
//! [`Summary::skipped`]; only connection, login and listing failures
//! end a run.

mod aggregate;
mod client;
mod command;
mod config;
mod connection;
mod error;
mod format;
mod inspector;
mod lister;
mod mailbox;

pub use aggregate::{SortKey, aggregate};
pub use client::{SkippedFolder, Summary, SummaryClient};
pub use config::{Security, SummaryConfig};
pub use connection::{ImapClient, ImapSession, ImapStream, authenticate, connect};
pub use error::{Error, Result};
pub use format::{human_size, render};
pub use inspector::{FolderRecord, SeqRange, inspect, message_range, total_size};
pub use lister::list_folders;
pub use mailbox::MailboxName;
