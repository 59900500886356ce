use serde::{Deserialize, Serialize};

use crate::message::Message;

/// A feed retrieval request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// Zero-based page index counted back from the newest message.
    pub page_index: usize,
    pub page_size: usize,
    /// Case-insensitive substring filter over text messages.
    #[serde(default)]
    pub search: Option<String>,
}

impl PageQuery {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// The search text, if present and non-empty.
    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// One page of the feed, newest message first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesPage {
    /// The page index actually served after clamping.
    pub page_index: usize,
    pub page_size: usize,
    /// `ceil(total / page_size)`.
    pub pages_count: usize,
    /// Offset where the next older page starts; equals the number of
    /// filtered messages strictly older than this page.
    pub older_start: usize,
    /// Number of filtered messages strictly newer than this page.
    pub newer_count: usize,
    /// Number of messages that passed the filter.
    pub total: usize,
    pub messages: Vec<Message>,
}

impl MessagesPage {
    /// The page served when no message passes the filter.
    pub fn empty(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size,
            pages_count: 0,
            older_start: 0,
            newer_count: 0,
            total: 0,
            messages: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns `true` if an older page exists.
    pub fn has_older(&self) -> bool {
        self.older_start > 0
    }
}
