use crate::types::{RawComment, UniqueCommentSet};
use std::collections::HashSet;

/// Key under which two comments count as the same comment.
///
/// Lower-cased and trimmed, with whitespace runs collapsed to one space and
/// runs of a repeated punctuation character collapsed to one, so `"Great!"`
/// and `"great!! "` share a key while `"great?"` does not.
pub fn normalize_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    let mut prev: Option<char> = None;

    for ch in text.trim().chars().flat_map(char::to_lowercase) {
        let ch = if ch.is_whitespace() { ' ' } else { ch };
        if Some(ch) == prev && (ch == ' ' || ch.is_ascii_punctuation()) {
            continue;
        }
        key.push(ch);
        prev = Some(ch);
    }

    key
}

/// Order-preserving de-duplication, first occurrence wins.
pub fn deduplicate<I, S>(comments: I, limit: Option<usize>) -> UniqueCommentSet
where
    I: IntoIterator<Item = S>,
    S: Into<RawComment>,
{
    let mut seen = SeenKeys::new();
    let mut unique = Vec::new();

    for comment in comments {
        if limit.is_some_and(|max| unique.len() >= max) {
            break;
        }
        let comment = comment.into();
        if seen.insert(&comment) {
            unique.push(comment);
        }
    }

    UniqueCommentSet::from_unique(unique)
}

/// Normalized keys of every comment a session has already accepted.
#[derive(Debug, Clone, Default)]
pub struct SeenKeys {
    keys: HashSet<String>,
}

impl SeenKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, comment: &str) -> bool {
        self.keys.contains(&normalize_key(comment))
    }

    /// Records `comment`, returning `false` if its key was already present.
    pub fn insert(&mut self, comment: &str) -> bool {
        self.keys.insert(normalize_key(comment))
    }

    pub fn mark_seen<'a, I>(&mut self, comments: I)
    where
        I: IntoIterator<Item = &'a RawComment>,
    {
        for comment in comments {
            self.insert(comment);
        }
    }

    /// Comments from `batch` not seen before, deduplicated among themselves.
    ///
    /// Does not record anything; call [`SeenKeys::mark_seen`] once the batch
    /// has been processed.
    pub fn retain_unseen<I, S>(&self, batch: I) -> UniqueCommentSet
    where
        I: IntoIterator<Item = S>,
        S: Into<RawComment>,
    {
        let fresh = batch
            .into_iter()
            .map(Into::into)
            .filter(|comment: &RawComment| !self.contains(comment));
        deduplicate(fresh, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Hello World "), "hello world");
        assert_eq!(normalize_key("Great!"), normalize_key("great!! "));
        assert_eq!(normalize_key("so   much\tspace"), "so much space");
        assert_ne!(normalize_key("great?"), normalize_key("great!"));
        assert_ne!(normalize_key("good"), normalize_key("goood"));
    }

    #[test]
    fn test_spec_example_collapses() {
        let raw = ["Great!", "great!! ", "bad video", "meh", "BAD VIDEO"];
        let unique = deduplicate(raw, None);
        assert_eq!(unique.as_slice(), ["Great!", "bad video", "meh"]);
    }

    #[test]
    fn test_first_occurrence_wins_and_order_is_kept() {
        let raw = ["b", "A", "a", "c", "B"];
        let unique = deduplicate(raw, None);
        assert_eq!(unique.as_slice(), ["b", "A", "c"]);
    }

    #[test]
    fn test_limit_caps_output() {
        let raw = ["one", "ONE", "two", "three", "four"];
        assert_eq!(deduplicate(raw, Some(2)).as_slice(), ["one", "two"]);
        assert!(deduplicate(raw, Some(0)).is_empty());
        assert_eq!(deduplicate(raw, Some(10)).len(), 4);
    }

    #[test]
    fn test_output_keys_are_unique_and_bounded() {
        let raw: Vec<String> = (0..50).map(|i| format!("Comment {}", i % 7)).collect();
        let unique = deduplicate(raw.clone(), None);
        assert!(unique.len() <= raw.len());

        let keys: HashSet<String> = unique.iter().map(|c| normalize_key(c)).collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(unique.len(), 7);
    }

    #[test]
    fn test_idempotent() {
        let once = deduplicate(["x", "X ", "y", "z", "Y"], None);
        let twice = deduplicate(once.clone().into_inner(), None);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_seen_keys_retain_unseen() {
        let mut seen = SeenKeys::new();
        let first = seen.retain_unseen(["A", "B"]);
        assert_eq!(first.as_slice(), ["A", "B"]);
        seen.mark_seen(first.iter());

        let second = seen.retain_unseen(["a", "B ", "C", "c"]);
        assert_eq!(second.as_slice(), ["C"]);
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("b"));
        assert!(!seen.contains("C"));
    }
}
