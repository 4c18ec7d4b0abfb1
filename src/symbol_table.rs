//! Symbol table for SMIL variables
//!
//! A fixed set of buckets selected by the SDBM string hash. Each bucket is a
//! list whose capacity grows in steps of [`BUCKET_GROWTH`].

use std::mem;

pub const BUCKET_COUNT: usize = 11;
pub const BUCKET_GROWTH: usize = 10;

/// SDBM string hash
pub fn sdbm_hash(key: &str) -> u32 {
    key.bytes().fold(0u32, |h, c| {
        u32::from(c)
            .wrapping_add(h << 6)
            .wrapping_add(h << 16)
            .wrapping_sub(h)
    })
}

pub fn bucket_index(key: &str) -> usize {
    sdbm_hash(key) as usize % BUCKET_COUNT
}

#[derive(Debug, Clone)]
struct Bucket<V> {
    entries: Vec<(String, V)>,
    capacity: usize,
}

impl<V> Bucket<V> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            capacity: 0,
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

/// Maps variable names to values. Keys are unique: the only way in is
/// [`SymbolTable::get_or_insert_with`], which looks before it inserts.
#[derive(Debug, Clone)]
pub struct SymbolTable<V> {
    buckets: Vec<Bucket<V>>,
}

impl<V> SymbolTable<V> {
    pub fn new() -> Self {
        Self {
            buckets: (0..BUCKET_COUNT).map(|_| Bucket::new()).collect(),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&V> {
        let bucket = &self.buckets[bucket_index(key)];
        bucket.position(key).map(|pos| &bucket.entries[pos].1)
    }

    pub fn lookup_mut(&mut self, key: &str) -> Option<&mut V> {
        let bucket = &mut self.buckets[bucket_index(key)];
        match bucket.position(key) {
            Some(pos) => Some(&mut bucket.entries[pos].1),
            None => None,
        }
    }

    /// Return the stored value for `key`, creating it with `make` if absent
    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> V) -> &mut V {
        let index = bucket_index(key);
        if let Some(pos) = self.buckets[index].position(key) {
            return &mut self.buckets[index].entries[pos].1;
        }
        self.insert(index, key.to_string(), make())
    }

    /// Overwrite the value of an existing key and return the old one.
    ///
    /// An absent key is left absent and yields `None`.
    pub fn update(&mut self, key: &str, value: V) -> Option<V> {
        self.lookup_mut(key).map(|slot| mem::replace(slot, value))
    }

    // Only called after a failed lookup, so the key is new.
    fn insert(&mut self, index: usize, key: String, value: V) -> &mut V {
        let bucket = &mut self.buckets[index];
        if bucket.entries.len() == bucket.capacity {
            bucket.capacity += BUCKET_GROWTH;
            let additional = bucket.capacity - bucket.entries.len();
            bucket.entries.reserve_exact(additional);
        }
        bucket.entries.push((key, value));
        let last = bucket.entries.len() - 1;
        &mut bucket.entries[last].1
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket_capacity(&self, index: usize) -> usize {
        self.buckets[index].capacity
    }
}

impl<V> Default for SymbolTable<V> {
    fn default() -> Self {
        Self::new()
    }
}
