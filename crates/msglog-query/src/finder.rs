//! Page selection over the message log.

use std::borrow::Borrow;

use msglog_types::{Message, MessagesPage, PageQuery};
use tracing::trace;

use crate::error::{QueryError, QueryResult};

/// The slice of a filtered, oldest-first sequence that makes up one page.
///
/// Page 0 is the newest `page_size` messages, page 1 the `page_size` before
/// those, and so on. The last page may be short.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    /// Page index after clamping to the last available page.
    pub page_index: usize,
    /// `ceil(total / page_size)`.
    pub pages_count: usize,
    /// Inclusive start offset in the oldest-first sequence.
    pub start: usize,
    /// Exclusive end offset in the oldest-first sequence.
    pub end: usize,
}

impl PageWindow {
    /// Compute the window for `total` messages.
    ///
    /// Returns `None` when `total` is zero. A requested index past the last
    /// page clamps to the last page.
    pub fn compute(total: usize, page_size: usize, requested: usize) -> QueryResult<Option<Self>> {
        if page_size == 0 {
            return Err(QueryError::InvalidPageSize(page_size));
        }
        if total == 0 {
            return Ok(None);
        }
        let pages_count = total.div_ceil(page_size);
        let page_index = requested.min(pages_count - 1);
        // page_index < pages_count, so page_size * page_index < total.
        let end = total - page_size * page_index;
        let start = end.saturating_sub(page_size);
        Ok(Some(Self {
            page_index,
            pages_count,
            start,
            end,
        }))
    }

    /// Number of messages strictly older than this page.
    pub fn older_count(&self) -> usize {
        self.start
    }

    /// Number of messages strictly newer than this page.
    pub fn newer_count(&self, total: usize) -> usize {
        total - self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Compute one newest-first page of `messages`.
///
/// `messages` must be oldest-first, as the message store keeps them. When
/// the query carries a non-empty search text only text messages whose data
/// contains it (ignoring case) are considered; audio and video messages never
/// match a search.
///
/// Calling this twice over the same messages with the same query yields the
/// same page.
pub fn find_page<M: Borrow<Message>>(messages: &[M], query: &PageQuery) -> QueryResult<MessagesPage> {
    let filtered: Vec<&Message> = match query.search_text() {
        Some(search) => {
            let needle = search.to_lowercase();
            messages
                .iter()
                .map(as_message)
                .filter(|m| m.text_contains(&needle))
                .collect()
        }
        None => messages.iter().map(as_message).collect(),
    };

    let total = filtered.len();
    let Some(window) = PageWindow::compute(total, query.page_size, query.page_index)? else {
        return Ok(MessagesPage::empty(query.page_size));
    };

    trace!(
        requested = query.page_index,
        served = window.page_index,
        start = window.start,
        end = window.end,
        total,
        "page window"
    );

    let page_messages = filtered[window.start..window.end]
        .iter()
        .rev()
        .map(|m| Message::clone(m))
        .collect();

    Ok(MessagesPage {
        page_index: window.page_index,
        page_size: query.page_size,
        pages_count: window.pages_count,
        older_start: window.older_count(),
        newer_count: window.newer_count(total),
        total,
        messages: page_messages,
    })
}

fn as_message<M: Borrow<Message>>(m: &M) -> &Message {
    m.borrow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use msglog_types::{MessageId, MessageTimestamp, MessageType};

    fn message(id: u64, kind: MessageType, data: &str) -> Message {
        Message {
            client_id: None,
            id: MessageId::new(id),
            kind,
            data: data.into(),
            date_time: MessageTimestamp::from_epoch_millis(id as i64 * 1000).unwrap(),
            attachment_names: Vec::new(),
            location: None,
        }
    }

    fn five_texts() -> Vec<Message> {
        (1..=5)
            .map(|i| message(i, MessageType::Text, &format!("msg{i}")))
            .collect()
    }

    fn data(page: &MessagesPage) -> Vec<&str> {
        page.messages.iter().map(|m| m.data.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // Window arithmetic
    // -----------------------------------------------------------------------

    #[test]
    fn window_for_exact_multiple() {
        let w = PageWindow::compute(6, 3, 1).unwrap().unwrap();
        assert_eq!((w.page_index, w.pages_count, w.start, w.end), (1, 2, 0, 3));
    }

    #[test]
    fn window_short_last_page() {
        let w = PageWindow::compute(5, 2, 2).unwrap().unwrap();
        assert_eq!((w.start, w.end), (0, 1));
        assert_eq!(w.len(), 1);
        assert_eq!(w.newer_count(5), 4);
        assert_eq!(w.older_count(), 0);
    }

    #[test]
    fn window_clamps_past_last_page() {
        let w = PageWindow::compute(5, 2, 99).unwrap().unwrap();
        assert_eq!(w.page_index, 2);
        assert_eq!(w, PageWindow::compute(5, 2, 2).unwrap().unwrap());
    }

    #[test]
    fn window_empty_total() {
        assert_eq!(PageWindow::compute(0, 4, 0).unwrap(), None);
        assert_eq!(PageWindow::compute(0, 4, 7).unwrap(), None);
    }

    #[test]
    fn zero_page_size_rejected() {
        assert_eq!(
            PageWindow::compute(10, 0, 0).unwrap_err(),
            QueryError::InvalidPageSize(0)
        );
        assert!(find_page(&five_texts(), &PageQuery::new(0, 0)).is_err());
        // Rejected even when there is nothing to page.
        assert!(find_page::<Message>(&[], &PageQuery::new(0, 0)).is_err());
    }

    // -----------------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------------

    #[test]
    fn five_messages_in_pages_of_two() {
        let messages = five_texts();

        let p0 = find_page(&messages, &PageQuery::new(0, 2)).unwrap();
        assert_eq!(data(&p0), vec!["msg5", "msg4"]);
        assert_eq!(p0.older_start, 3);
        assert_eq!(p0.newer_count, 0);

        let p1 = find_page(&messages, &PageQuery::new(1, 2)).unwrap();
        assert_eq!(data(&p1), vec!["msg3", "msg2"]);
        assert_eq!(p1.older_start, 1);
        assert_eq!(p1.newer_count, 2);

        let p2 = find_page(&messages, &PageQuery::new(2, 2)).unwrap();
        assert_eq!(data(&p2), vec!["msg1"]);
        assert_eq!(p2.older_start, 0);
        assert_eq!(p2.newer_count, 4);
        assert!(!p2.has_older());
        assert_eq!(p2.pages_count, 3);
        assert_eq!(p2.total, 5);
    }

    #[test]
    fn out_of_range_index_serves_last_page() {
        let messages = five_texts();
        for requested in [3, 4, 100] {
            let page = find_page(&messages, &PageQuery::new(requested, 2)).unwrap();
            assert_eq!(page.page_index, 2);
            assert_eq!(data(&page), vec!["msg1"]);
        }
    }

    #[test]
    fn empty_log_gives_empty_page() {
        let page = find_page::<Message>(&[], &PageQuery::new(3, 10)).unwrap();
        assert_eq!(page, MessagesPage::empty(10));
    }

    #[test]
    fn page_size_larger_than_log() {
        let page = find_page(&five_texts(), &PageQuery::new(0, 50)).unwrap();
        assert_eq!(data(&page), vec!["msg5", "msg4", "msg3", "msg2", "msg1"]);
        assert_eq!(page.pages_count, 1);
    }

    #[test]
    fn works_over_shared_messages() {
        let shared: Vec<std::sync::Arc<Message>> =
            five_texts().into_iter().map(std::sync::Arc::new).collect();
        let page = find_page(&shared, &PageQuery::new(0, 1)).unwrap();
        assert_eq!(data(&page), vec!["msg5"]);
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    #[test]
    fn search_is_case_insensitive() {
        let messages = vec![
            message(1, MessageType::Text, "say hello now"),
            message(2, MessageType::Text, "nothing here"),
            message(3, MessageType::Text, "Hello again"),
        ];
        let page = find_page(&messages, &PageQuery::new(0, 10).with_search("HELLO")).unwrap();
        assert_eq!(data(&page), vec!["Hello again", "say hello now"]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn search_excludes_media() {
        let messages = vec![
            message(1, MessageType::Audio, "hello"),
            message(2, MessageType::Video, "hello"),
            message(3, MessageType::Text, "hello"),
        ];
        let page = find_page(&messages, &PageQuery::new(0, 10).with_search("hello")).unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].id, MessageId::new(3));
    }

    #[test]
    fn empty_search_keeps_media() {
        let messages = vec![
            message(1, MessageType::Audio, "AAAA"),
            message(2, MessageType::Text, "hi"),
        ];
        let page = find_page(&messages, &PageQuery::new(0, 10).with_search("")).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn search_without_matches() {
        let page = find_page(&five_texts(), &PageQuery::new(0, 2).with_search("zzz")).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.pages_count, 0);
    }

    #[test]
    fn search_paginates_filtered_sequence() {
        let messages: Vec<Message> = (1..=10)
            .map(|i| {
                let text = if i % 2 == 0 { format!("even {i}") } else { format!("odd {i}") };
                message(i, MessageType::Text, &text)
            })
            .collect();
        let query = PageQuery::new(1, 2).with_search("EVEN");
        let page = find_page(&messages, &query).unwrap();
        assert_eq!(data(&page), vec!["even 6", "even 4"]);
        assert_eq!(page.total, 5);
        assert_eq!(page.older_start, 1);
    }

    proptest::proptest! {
        #[test]
        fn pages_partition_the_log(total in 0usize..40, page_size in 1usize..8) {
            let messages: Vec<Message> = (1..=total as u64)
                .map(|i| message(i, MessageType::Text, &format!("m{i}")))
                .collect();
            let pages_count = total.div_ceil(page_size);

            let mut seen = Vec::new();
            for index in 0..pages_count {
                let page = find_page(&messages, &PageQuery::new(index, page_size)).unwrap();
                proptest::prop_assert_eq!(page.page_index, index);
                proptest::prop_assert!(page.messages.len() <= page_size);
                proptest::prop_assert_eq!(page.older_start + page.messages.len() + page.newer_count, total);
                seen.extend(page.messages.iter().map(|m| m.id.get()));
            }
            let expected: Vec<u64> = (1..=total as u64).rev().collect();
            proptest::prop_assert_eq!(seen, expected);
        }

        #[test]
        fn find_page_is_idempotent(total in 0usize..30, page_size in 1usize..6, index in 0usize..10) {
            let messages: Vec<Message> = (1..=total as u64)
                .map(|i| message(i, MessageType::Text, &format!("m{i}")))
                .collect();
            let query = PageQuery::new(index, page_size);
            proptest::prop_assert_eq!(
                find_page(&messages, &query).unwrap(),
                find_page(&messages, &query).unwrap()
            );
        }
    }
}
