//! Folder listing

use crate::command;
use crate::connection::ImapSession;
use crate::error::Result;
use crate::mailbox::MailboxName;
use async_imap::imap_proto::{MailboxDatum, Response};
use tracing::debug;

/// List every folder visible to the logged-in user, in server order.
///
/// # Errors
///
/// Returns [`Error::Protocol`](crate::Error::Protocol) if `LIST` does
/// not complete with `OK`, [`Error::Decode`](crate::Error::Decode) if an
/// entry cannot be decoded, or a transport error if the connection
/// fails. Each of these ends the run.
pub async fn list_folders(session: &mut ImapSession) -> Result<Vec<MailboxName>> {
    let mut names = Vec::new();
    command::run(session, r#"LIST "" "*""#, |response| {
        if let Response::MailboxData(MailboxDatum::List {
            name, delimiter, ..
        }) = response
        {
            debug!("LIST entry {:?} (delimiter {:?})", name, delimiter);
            names.push(MailboxName::new(name.to_string(), delimiter.as_deref()));
        }
    })
    .await?;

    debug!("Server listed {} folders", names.len());
    Ok(names)
}
