//! Least-recently-used map backed by an entry arena.
//!
//! Entries live in a `Vec` of slots and are linked into a recency list by
//! slot index, so no node reference ever escapes the structure. Freed slots
//! are recycled through a vacancy stack.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

struct Entry<K, V> {
    key: K,
    value: V,
    /// Towards the most recently used end.
    newer: Option<usize>,
    /// Towards the least recently used end.
    older: Option<usize>,
}

pub struct LruCache<K, V> {
    index: HashMap<K, usize>,
    slots: Vec<Option<Entry<K, V>>>,
    vacant: Vec<usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used; next to be evicted.
    tail: Option<usize>,
    capacity: NonZeroUsize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity.get()),
            slots: Vec::with_capacity(capacity.get()),
            vacant: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Look up `key` and mark it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.promote(slot);
        self.slots[slot].as_ref().map(|entry| &entry.value)
    }

    /// Insert or overwrite `key`, making it most recently used.
    ///
    /// Returns the entry evicted to stay within capacity, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            if let Some(entry) = self.slots[slot].as_mut() {
                entry.value = value;
            }
            self.promote(slot);
            return None;
        }

        let slot = self.allocate(Entry {
            key: key.clone(),
            value,
            newer: None,
            older: None,
        });
        self.index.insert(key, slot);
        self.push_front(slot);

        if self.index.len() > self.capacity.get() {
            self.pop_back()
        } else {
            None
        }
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        self.detach(slot);
        self.release(slot).map(|entry| entry.value)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let entry = self.slots[slot].as_ref().expect("linked slot is occupied");
            keys.push(entry.key.clone());
            cursor = entry.older;
        }
        keys
    }

    fn pop_back(&mut self) -> Option<(K, V)> {
        let slot = self.tail?;
        self.detach(slot);
        let entry = self.release(slot)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    fn promote(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.detach(slot);
        self.push_front(slot);
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(entry) = self.slots[slot].as_mut() {
            entry.newer = None;
            entry.older = old_head;
        }
        match old_head {
            Some(head) => {
                if let Some(entry) = self.slots[head].as_mut() {
                    entry.newer = Some(slot);
                }
            }
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn detach(&mut self, slot: usize) {
        let (newer, older) = match self.slots[slot].as_ref() {
            Some(entry) => (entry.newer, entry.older),
            None => return,
        };

        match newer {
            Some(n) => {
                if let Some(entry) = self.slots[n].as_mut() {
                    entry.older = older;
                }
            }
            None => self.head = older,
        }
        match older {
            Some(o) => {
                if let Some(entry) = self.slots[o].as_mut() {
                    entry.newer = newer;
                }
            }
            None => self.tail = newer,
        }

        if let Some(entry) = self.slots[slot].as_mut() {
            entry.newer = None;
            entry.older = None;
        }
    }

    fn allocate(&mut self, entry: Entry<K, V>) -> usize {
        match self.vacant.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) -> Option<Entry<K, V>> {
        let entry = self.slots[slot].take();
        if entry.is_some() {
            self.vacant.push(slot);
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruCache<String, u32> {
        LruCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_lru_evicts_oldest_insert() {
        let mut lru = cache(2);
        assert!(lru.put("a".into(), 1).is_none());
        assert!(lru.put("b".into(), 2).is_none());

        let evicted = lru.put("c".into(), 3);
        assert_eq!(evicted, Some(("a".to_string(), 1)));
        assert_eq!(lru.get("a"), None);
        assert_eq!(lru.get("b"), Some(&2));
        assert_eq!(lru.get("c"), Some(&3));
    }

    #[test]
    fn test_lru_get_refreshes_recency() {
        let mut lru = cache(2);
        lru.put("a".into(), 1);
        lru.put("b".into(), 2);
        lru.get("a");

        let evicted = lru.put("c".into(), 3);
        assert_eq!(evicted.map(|(k, _)| k), Some("b".to_string()));
        assert_eq!(lru.keys(), vec!["c".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_lru_overwrite_keeps_occupancy() {
        let mut lru = cache(2);
        lru.put("a".into(), 1);
        lru.put("b".into(), 2);

        assert!(lru.put("a".into(), 10).is_none());
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(lru.get("a"), Some(&10));
    }

    #[test]
    fn test_lru_remove_and_slot_reuse() {
        let mut lru = cache(3);
        lru.put("a".into(), 1);
        lru.put("b".into(), 2);
        lru.put("c".into(), 3);

        assert_eq!(lru.remove("b"), Some(2));
        assert_eq!(lru.remove("b"), None);
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.keys(), vec!["c".to_string(), "a".to_string()]);

        lru.put("d".into(), 4);
        assert_eq!(lru.slots.len(), 3);
        assert_eq!(lru.keys(), vec!["d".to_string(), "c".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut lru = cache(1);
        lru.put("a".into(), 1);
        lru.put("b".into(), 2);
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.get("a"), None);
        assert_eq!(lru.get("b"), Some(&2));

        assert_eq!(lru.remove("b"), Some(2));
        assert!(lru.is_empty());
        assert_eq!(lru.keys(), Vec::<String>::new());
    }

    /// Replays a deterministic mixed workload against a naive model that
    /// keeps keys ordered by last touch.
    #[test]
    fn test_lru_matches_reference_model() {
        let capacity = 4;
        let mut lru = cache(capacity);
        let mut model: Vec<String> = Vec::new();

        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        for step in 0..2_000u32 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let key = format!("k{}", seed % 7);

            match seed % 3 {
                0 => {
                    let hit = lru.get(key.as_str()).is_some();
                    assert_eq!(hit, model.contains(&key), "step {}", step);
                    if hit {
                        model.retain(|k| k != &key);
                        model.insert(0, key);
                    }
                }
                1 => {
                    let evicted = lru.put(key.clone(), step);
                    let existed = model.contains(&key);
                    model.retain(|k| k != &key);
                    model.insert(0, key);
                    let expected = if !existed && model.len() > capacity { model.pop() } else { None };
                    assert_eq!(evicted.map(|(k, _)| k), expected, "step {}", step);
                }
                _ => {
                    let removed = lru.remove(key.as_str()).is_some();
                    assert_eq!(removed, model.contains(&key), "step {}", step);
                    model.retain(|k| k != &key);
                }
            }

            assert!(lru.len() <= capacity);
            assert_eq!(lru.keys(), model, "step {}", step);
        }
    }
}
