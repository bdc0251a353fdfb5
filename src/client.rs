//! Folder summary client

use crate::aggregate::{SortKey, aggregate};
use crate::config::SummaryConfig;
use crate::connection::{ImapSession, authenticate, connect};
use crate::error::{Error, Result};
use crate::inspector::{FolderRecord, inspect};
use crate::lister;
use crate::mailbox::MailboxName;
use serde::Serialize;
use tracing::{debug, info, warn};

/// A folder that could not be inspected, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFolder {
    pub name: MailboxName,
    pub reason: String,
}

/// Outcome of one run: a record per inspected folder, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub records: Vec<FolderRecord>,
    pub skipped: Vec<SkippedFolder>,
}

impl Summary {
    /// The records ordered by `key`; see [`aggregate`].
    #[must_use]
    pub fn sorted(self, key: SortKey, reverse: bool) -> Vec<FolderRecord> {
        aggregate(self.records, key, reverse)
    }
}

/// Read-only client that summarizes every folder of one account
pub struct SummaryClient {
    config: SummaryConfig,
}

impl SummaryClient {
    #[must_use]
    pub const fn new(config: SummaryConfig) -> Self {
        Self { config }
    }

    /// Connect, log in, and inspect every listed folder.
    ///
    /// Folders that fail inspection are reported in
    /// [`Summary::skipped`] instead of failing the run. A response the
    /// decoder rejects leaves the session unable to read, so the client
    /// logs in again before the next folder. Every session is logged out
    /// before it is dropped, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, login or `LIST` fails, or if
    /// the connection drops while folders are being inspected.
    pub async fn summarize(&self) -> Result<Summary> {
        let mut session = self.open().await?;
        let mut poisoned = false;
        let result = self.inspect_all(&mut session, &mut poisoned).await;
        finish(session, poisoned).await;
        result
    }

    /// List all folder names without inspecting them.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, login or `LIST` fails.
    pub async fn list_folders(&self) -> Result<Vec<MailboxName>> {
        let mut session = self.open().await?;
        let result = lister::list_folders(&mut session).await;
        let poisoned = result.as_ref().is_err_and(Error::poisons_session);
        finish(session, poisoned).await;
        result
    }

    async fn open(&self) -> Result<ImapSession> {
        let client = connect(&self.config).await?;
        authenticate(client, &self.config.username, &self.config.password).await
    }

    async fn inspect_all(
        &self,
        session: &mut ImapSession,
        poisoned: &mut bool,
    ) -> Result<Summary> {
        let names = lister::list_folders(session)
            .await
            .inspect_err(|e| *poisoned = e.poisons_session())?;
        info!("Listed {} mailboxes", names.len());

        let mut summary = Summary::default();
        for name in names {
            if *poisoned {
                info!("Reconnecting before mailbox {}", name);
                let stale = std::mem::replace(session, self.open().await?);
                finish(stale, true).await;
                *poisoned = false;
            }

            info!("Querying mailbox {}", name);
            match inspect(session, &name).await {
                Ok(record) => summary.records.push(record),
                Err(e) if e.is_folder_scoped() => {
                    warn!("Skipping mailbox {}: {}", name, e);
                    *poisoned = e.poisons_session();
                    summary.skipped.push(SkippedFolder {
                        name,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
            drain_unsolicited(session);
        }

        Ok(summary)
    }
}

fn drain_unsolicited(session: &ImapSession) {
    while let Ok(response) = session.unsolicited_responses.try_recv() {
        debug!("Ignoring unsolicited response {:?}", response);
    }
}

/// Log `session` out. A poisoned session cannot read the reply, so
/// `LOGOUT` is only sent.
async fn finish(mut session: ImapSession, poisoned: bool) {
    if poisoned {
        if let Err(e) = session.run_command("LOGOUT").await {
            debug!("LOGOUT on a poisoned session failed: {}", e);
        }
    } else if let Err(e) = session.logout().await {
        warn!("LOGOUT failed: {}", e);
    }
}
