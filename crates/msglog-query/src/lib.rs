//! Feed pagination and search for msglog.
//!
//! [`find_page`] slices the oldest-first message log into newest-first pages
//! after applying an optional case-insensitive substring filter over text
//! messages. It is a pure function over a slice of messages; callers take a
//! snapshot from the message store first.

pub mod error;
pub mod finder;

pub use error::{QueryError, QueryResult};
pub use finder::{find_page, PageWindow};
