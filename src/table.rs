use std::cmp::min;

use crate::utils::MyHash;

struct Entry<T> {
    value: T,
    next: usize,
}

/// Hash-consing table with a fixed capacity of `2^bits` cells.
///
/// Cells are allocated lazily and never freed. Index 0 is a sentinel.
pub struct Table<T> {
    data: Vec<Entry<T>>,
    capacity: usize,

    buckets: Vec<usize>,
    bitmask: u64,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data = Vec::with_capacity(min(capacity, 1 << 12));
        data.push(Entry {
            value: T::default(),
            next: 0,
        });

        let buckets_bits = min(bits, 18);
        let buckets_size = 1 << buckets_bits;
        let buckets = vec![0; buckets_size];
        let bitmask = (buckets_size - 1) as u64;

        Self {
            data,
            capacity,
            buckets,
            bitmask,
        }
    }
}

impl<T> Table<T> {
    /// Maximal number of cells, including the sentinel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Number of allocated cells, excluding the sentinel.
    pub fn size(&self) -> usize {
        self.data.len() - 1
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    /// Allocate a fresh cell holding `value`, or `None` when the table is full.
    pub fn alloc(&mut self, value: T) -> Option<usize> {
        if self.data.len() >= self.capacity {
            return None;
        }
        self.data.push(Entry { value, next: 0 });
        Some(self.data.len() - 1)
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    fn bucket(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Find the index of an existing cell equal to `value`.
    pub fn find(&self, value: &T) -> Option<usize> {
        let mut index = self.buckets[self.bucket(value)];
        while index != 0 {
            let entry = &self.data[index];
            if entry.value == *value {
                return Some(index);
            }
            index = entry.next;
        }
        None
    }

    /// Return the index of the cell equal to `value`, allocating it when absent.
    ///
    /// Returns `None` if the value is new and the table is full.
    pub fn put(&mut self, value: T) -> Option<usize> {
        if let Some(index) = self.find(&value) {
            return Some(index);
        }
        let bucket = self.bucket(&value);
        let index = self.alloc(value)?;
        self.data[index].next = self.buckets[bucket];
        self.buckets[bucket] = index;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[derive(Debug, Default, Eq, PartialEq)]
    struct Pair(u64, u64);

    impl MyHash for Pair {
        fn hash(&self) -> u64 {
            (self.0, self.1).hash()
        }
    }

    #[test]
    fn test_put_is_hash_consing() {
        let mut table = Table::<Pair>::new(4);
        let a = table.put(Pair(1, 2)).unwrap();
        let b = table.put(Pair(2, 1)).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.put(Pair(1, 2)), Some(a));
        assert_eq!(table.size(), 2);
        assert_eq!(table.value(a), &Pair(1, 2));
    }

    #[test]
    fn test_full_table() {
        let mut table = Table::<Pair>::new(2);
        assert_eq!(table.capacity(), 4);
        for i in 0..3 {
            assert!(table.put(Pair(i, i)).is_some());
        }
        assert_eq!(table.put(Pair(7, 7)), None);
        // Existing values are still found.
        assert!(table.put(Pair(1, 1)).is_some());
    }
}
