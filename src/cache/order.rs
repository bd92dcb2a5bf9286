//! Write Order Module
//!
//! Tracks keys in the order they were last written, for FIFO eviction.

use std::collections::VecDeque;

// == Write Order ==
/// Tracks write order for oldest-first eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest write
/// - Back = Newest write
///
/// Reads never reorder keys; only a write moves a key to the back.
///
/// `record_write` and `remove` scan linearly for the key, so each costs
/// O(n) in the cache size. Popping the oldest key is O(1). Profile capacities
/// stay in the hundreds to low thousands, where the scan is cheap.
#[derive(Debug, Default)]
pub struct WriteOrder {
    order: VecDeque<String>,
}

impl WriteOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Write ==
    /// Marks a key as the newest write.
    ///
    /// An existing occurrence is dropped first so each key appears once.
    pub fn record_write(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest written key.
    ///
    /// Returns None if tracker is empty.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Retain ==
    /// Keeps only the keys for which `keep` returns true, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.order.retain(|k| keep(k));
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Iterate ==
    /// Iterates keys from oldest to newest write.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_new() {
        let order = WriteOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
    }

    #[test]
    fn test_pop_oldest_follows_write_order() {
        let mut order = WriteOrder::new();

        order.record_write("key1");
        order.record_write("key2");
        order.record_write("key3");

        assert_eq!(order.pop_oldest(), Some("key1".to_string()));
        assert_eq!(order.pop_oldest(), Some("key2".to_string()));
        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_rewrite_moves_key_to_newest() {
        let mut order = WriteOrder::new();

        order.record_write("a");
        order.record_write("b");
        order.record_write("c");

        // Rewriting 'a' refreshes its write time
        order.record_write("a");

        assert_eq!(order.len(), 3);
        assert_eq!(order.iter().collect::<Vec<_>>(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_pop_empty() {
        let mut order = WriteOrder::new();
        assert_eq!(order.pop_oldest(), None);
    }

    #[test]
    fn test_remove() {
        let mut order = WriteOrder::new();

        order.record_write("key1");
        order.record_write("key2");
        order.record_write("key3");

        order.remove("key2");
        order.remove("nonexistent");

        assert_eq!(order.iter().collect::<Vec<_>>(), vec!["key1", "key3"]);
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut order = WriteOrder::new();

        for key in ["a", "b", "c", "d"] {
            order.record_write(key);
        }

        order.retain(|k| k != "b" && k != "d");

        assert_eq!(order.iter().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut order = WriteOrder::new();
        order.record_write("a");
        order.clear();
        assert!(order.is_empty());
    }
}
