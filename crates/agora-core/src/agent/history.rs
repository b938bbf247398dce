//! Bounded rolling history of exchanged turns.

use std::collections::VecDeque;

use agora_types::config::AppConfig;
use agora_types::llm::{Message, MessageRole};

/// Ordered list of `{role, content}` turns capped at a fixed length.
///
/// Appending past the cap drops the oldest entries first. Nothing is
/// summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingHistory {
    entries: VecDeque<Message>,
    limit: usize,
}

impl RollingHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.saturating_add(1)),
            limit,
        }
    }

    /// Append a turn, then truncate to the last `limit` entries.
    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) {
        self.entries.push_back(Message {
            role,
            content: content.into(),
        });
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new(AppConfig::DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_under_limit_keeps_everything() {
        let mut history = RollingHistory::default();
        history.push(MessageRole::User, "hi");
        history.push(MessageRole::Assistant, "hello");
        assert_eq!(history.len(), 2);
        assert_eq!(history.limit(), 10);
    }

    #[test]
    fn test_push_over_limit_keeps_last_entries_in_order() {
        let mut history = RollingHistory::new(10);
        for i in 0..25 {
            history.push(MessageRole::User, format!("m{i}"));
            assert!(history.len() <= 10);
        }
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        let expected: Vec<String> = (15..25).map(|i| format!("m{i}")).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_clear() {
        let mut history = RollingHistory::new(3);
        history.push(MessageRole::User, "a");
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_zero_limit_stores_nothing() {
        let mut history = RollingHistory::new(0);
        history.push(MessageRole::User, "a");
        assert!(history.is_empty());
    }
}
