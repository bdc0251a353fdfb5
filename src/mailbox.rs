//! Mailbox names as reported by `LIST`
//!
//! A [`MailboxName`] keeps the raw server name together with the
//! hierarchy delimiter the server reported for it, so hierarchical
//! names like `Work.ProjectA` can be split without guessing.

use serde::Serialize;
use std::fmt;

/// A folder name from the server's listing.
///
/// # Examples
///
/// ```
/// use imap_folder_summary::MailboxName;
///
/// let name = MailboxName::new("Work.ProjectA", Some("."));
/// assert_eq!(name.as_str(), "Work.ProjectA");
/// assert_eq!(name.segments(), vec!["Work", "ProjectA"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MailboxName {
    name: String,
    delimiter: Option<String>,
}

impl MailboxName {
    #[must_use]
    pub fn new(name: impl Into<String>, delimiter: Option<&str>) -> Self {
        Self {
            name: name.into(),
            delimiter: delimiter.map(ToString::to_string),
        }
    }

    /// The raw mailbox name, as sent back in `EXAMINE`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The hierarchy delimiter, `None` for a flat namespace.
    #[must_use]
    pub fn delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref()
    }

    /// The hierarchy levels of this name, outermost first.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        match self.delimiter.as_deref() {
            Some(delim) if !delim.is_empty() => self.name.split(delim).collect(),
            _ => vec![self.name.as_str()],
        }
    }

    /// `INBOX` is case-insensitive per RFC 3501.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.name.eq_ignore_ascii_case("inbox")
    }
}

impl fmt::Display for MailboxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for MailboxName {
    fn from(s: &str) -> Self {
        Self::new(s, None)
    }
}
