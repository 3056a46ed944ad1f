//! Fixed-capacity LRU cache
//!
//! Access-ordered map used by the caching table decorator. Recency is kept in
//! an intrusive doubly linked list laid out over an arena of nodes, with a
//! hash index from key to arena slot. Both `get` and `insert` mark the entry
//! most-recently-used; inserting past capacity evicts the least-recently-used
//! entry.

use std::collections::HashMap;

use bytes::Bytes;

/// Sentinel slot meaning "no node"
const NIL: usize = usize::MAX;

struct Node {
    key: Vec<u8>,
    value: Bytes,
    prev: usize,
    next: usize,
}

/// Bounded access-ordered key/value cache
pub struct LruCache {
    capacity: usize,
    nodes: Vec<Node>,
    /// key → arena slot
    index: HashMap<Vec<u8>, usize>,
    /// Most-recently-used end of the list
    head: usize,
    /// Least-recently-used end of the list
    tail: usize,
    /// Recycled arena slots
    free: Vec<usize>,
}

impl LruCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A zero capacity is clamped to one so the write-through path stays
    /// well-defined.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            nodes: Vec::with_capacity(capacity.min(1024)),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
            free: Vec::new(),
        }
    }

    /// Look up a key, marking it most-recently-used on a hit
    pub fn get(&mut self, key: &[u8]) -> Option<Bytes> {
        let slot = *self.index.get(key)?;
        self.touch(slot);
        Some(self.nodes[slot].value.clone())
    }

    /// Insert or overwrite an entry, marking it most-recently-used.
    ///
    /// Evicts the least-recently-used entry when the cache is full.
    pub fn insert(&mut self, key: Vec<u8>, value: Bytes) {
        if let Some(&slot) = self.index.get(&key) {
            self.nodes[slot].value = value;
            self.touch(slot);
            return;
        }

        if self.index.len() >= self.capacity {
            self.evict_lru();
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Node {
                    key: key.clone(),
                    value,
                    prev: NIL,
                    next: NIL,
                };
                slot
            }
            None => {
                self.nodes.push(Node {
                    key: key.clone(),
                    value,
                    prev: NIL,
                    next: NIL,
                });
                self.nodes.len() - 1
            }
        };

        self.index.insert(key, slot);
        self.push_front(slot);
    }

    /// Remove an entry, returning its value if present
    pub fn remove(&mut self, key: &[u8]) -> Option<Bytes> {
        let slot = self.index.remove(key)?;
        self.unlink(slot);
        self.free.push(slot);
        Some(std::mem::take(&mut self.nodes[slot].value))
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check membership without touching recency (used by coherence tests)
    pub fn contains(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    // =========================================================================
    // Intrusive list maintenance
    // =========================================================================

    /// Move an existing node to the most-recently-used position
    fn touch(&mut self, slot: usize) {
        if self.head == slot {
            return;
        }
        self.unlink(slot);
        self.push_front(slot);
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = NIL;
    }

    fn evict_lru(&mut self) {
        let slot = self.tail;
        if slot == NIL {
            return;
        }
        self.unlink(slot);
        let key = std::mem::take(&mut self.nodes[slot].key);
        self.nodes[slot].value = Bytes::new();
        self.index.remove(&key);
        self.free.push(slot);
    }
}
