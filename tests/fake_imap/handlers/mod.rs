//! IMAP command handlers for the fake server.
//!
//! Each handler lives in its own module and processes a single IMAP
//! command (LIST, LOGIN, LOGOUT, SELECT/EXAMINE, SEARCH, FETCH).


pub use fetch::handle_fetch;
pub use list::handle_list;
pub use login::handle_login;
pub use logout::handle_logout;
pub use search::handle_search;
pub use select::handle_select;
