//! Tagged command exchange
//!
//! async-imap's `list`, `search` and `fetch` stop at the tagged
//! completion without looking at its status, so a refused command
//! reads like an empty answer. [`run`] sends a command, hands every
//! untagged response to the caller, and turns a non-`OK` completion
//! into [`Error::Protocol`].

use crate::connection::ImapSession;
use crate::error::{Error, Result};
use async_imap::imap_proto::{Response, Status};
use tracing::trace;

/// Send `command` and feed each response before its tagged completion
/// to `on_data`.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the server answers `NO` or `BAD`,
/// [`Error::Decode`] if a response line cannot be decoded (the session
/// is unusable afterwards), and a transport error if the connection
/// fails.
pub(crate) async fn run<F>(session: &mut ImapSession, command: &str, mut on_data: F) -> Result<()>
where
    F: FnMut(&Response<'_>) + Send,
{
    let verb = command.split_whitespace().next().unwrap_or(command);
    let tag = session
        .run_command(command)
        .await
        .map_err(|e| Error::imap(verb, e))?;

    loop {
        let response = session
            .read_response()
            .await
            .map_err(|e| Error::response(verb, e))?
            .ok_or_else(|| Error::Connection(format!("connection lost during {verb}")))?;

        match response.parsed() {
            Response::Done {
                tag: done,
                status,
                information,
                ..
            } if *done == tag => {
                return completion(verb, status, information.as_deref());
            }
            other => {
                trace!("{} response {:?}", verb, other);
                on_data(other);
            }
        }
    }
}

fn completion(verb: &str, status: &Status, information: Option<&str>) -> Result<()> {
    let said = match status {
        Status::Ok => return Ok(()),
        Status::No => "NO",
        Status::Bad => "BAD",
        Status::PreAuth => "PREAUTH",
        Status::Bye => "BYE",
    };
    Err(Error::Protocol(format!(
        "{verb} said {said}: {}",
        information.unwrap_or_default()
    )))
}
