use super::AvlTreeMap;
use crate::raw::RawAvlTreeMap;

impl<K, V> AvlTreeMap<K, V> {
    /// Creates an empty map with room for at least `capacity` entries before
    /// the node arena reallocates.
    ///
    /// This is an extension and is not part of the standard `BTreeMap` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<i32, i32> = AvlTreeMap::with_capacity(32);
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        AvlTreeMap {
            raw: RawAvlTreeMap::with_capacity(capacity),
        }
    }

    /// Returns how many entries the map can hold before the node arena reallocates.
    ///
    /// Slots freed by removals are reused, so removing and re-inserting never grows it.
    ///
    /// This is an extension and is not part of the standard `BTreeMap` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map: AvlTreeMap<i32, i32> = AvlTreeMap::with_capacity(32);
    /// assert!(map.capacity() >= 32);
    ///
    /// map.extend((0..32).map(|k| (k, k)));
    /// let capacity = map.capacity();
    /// map.remove(&7);
    /// map.insert(100, 100);
    /// assert_eq!(map.capacity(), capacity);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
