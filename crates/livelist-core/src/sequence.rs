//! Ordered key sequence maintenance.

/// The ordered record-key sequence.
///
/// Order carries no intrinsic meaning; it is whatever the sibling-relative
/// insert and move operations imposed. Keys are unique.
#[derive(Debug, Default, Clone)]
pub struct KeySequence {
    keys: Vec<String>,
}

impl KeySequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in the sequence.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Position of `key`, if present.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    /// Insert `key` immediately after `after`.
    ///
    /// `None` inserts at the front. An `after` key that is not present fails
    /// open to the end of the sequence (it was removed already). Returns the
    /// insertion index.
    pub fn insert_after(&mut self, key: impl Into<String>, after: Option<&str>) -> usize {
        let key = key.into();
        debug_assert!(!self.contains(&key), "duplicate key {key:?}");
        let index = match after {
            None => 0,
            Some(sibling) => match self.position(sibling) {
                Some(pos) => pos + 1,
                None => self.keys.len(),
            },
        };
        self.keys.insert(index, key);
        index
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(pos) => {
                self.keys.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Reposition `key` immediately after `after`. Returns `false` without
    /// touching the sequence if `key` is not present.
    pub fn move_after(&mut self, key: &str, after: Option<&str>) -> bool {
        let Some(pos) = self.position(key) else {
            return false;
        };
        let key = self.keys.remove(pos);
        self.insert_after(key, after);
        true
    }

    /// The key immediately preceding `key`, or `None` if `key` is first or
    /// not present.
    pub fn predecessor(&self, key: &str) -> Option<&str> {
        match self.position(key)? {
            0 => None,
            pos => Some(self.keys[pos - 1].as_str()),
        }
    }

    /// Keys in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Drop all keys.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(seq: &KeySequence) -> Vec<&str> {
        seq.iter().collect()
    }

    #[test]
    fn test_insert_front_and_after() {
        let mut seq = KeySequence::new();
        assert_eq!(seq.insert_after("b", None), 0);
        assert_eq!(seq.insert_after("a", None), 0);
        assert_eq!(seq.insert_after("c", Some("b")), 2);
        assert_eq!(keys(&seq), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_missing_sibling_fails_open_to_end() {
        let mut seq = KeySequence::new();
        seq.insert_after("a", None);
        let index = seq.insert_after("b", Some("gone"));
        assert_eq!(index, 1);
        assert_eq!(keys(&seq), vec!["a", "b"]);
    }

    #[test]
    fn test_remove() {
        let mut seq = KeySequence::new();
        seq.insert_after("a", None);
        seq.insert_after("b", Some("a"));
        assert!(seq.remove("a"));
        assert!(!seq.remove("a"));
        assert_eq!(keys(&seq), vec!["b"]);
    }

    #[test]
    fn test_move_after() {
        let mut seq = KeySequence::new();
        seq.insert_after("a", None);
        seq.insert_after("b", Some("a"));
        seq.insert_after("c", Some("b"));
        assert!(seq.move_after("c", Some("a")));
        assert_eq!(keys(&seq), vec!["a", "c", "b"]);
        assert!(seq.move_after("a", Some("b")));
        assert_eq!(keys(&seq), vec!["c", "b", "a"]);
        assert!(!seq.move_after("missing", None));
    }

    #[test]
    fn test_move_to_front() {
        let mut seq = KeySequence::new();
        seq.insert_after("a", None);
        seq.insert_after("b", Some("a"));
        assert!(seq.move_after("b", None));
        assert_eq!(keys(&seq), vec!["b", "a"]);
    }

    #[test]
    fn test_predecessor() {
        let mut seq = KeySequence::new();
        seq.insert_after("a", None);
        seq.insert_after("b", Some("a"));
        assert_eq!(seq.predecessor("a"), None);
        assert_eq!(seq.predecessor("b"), Some("a"));
        assert_eq!(seq.predecessor("missing"), None);
    }

    #[test]
    fn test_clear() {
        let mut seq = KeySequence::new();
        seq.insert_after("a", None);
        seq.clear();
        assert!(seq.is_empty());
        assert!(!seq.contains("a"));
    }
}
