use core::borrow::Borrow;
use core::ops::{Index, IndexMut};

use super::AvlTreeMap;
use crate::Rank;

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Returns the entry with the smallest key greater than or equal to `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, "a"), (3, "c"), (5, "e")]);
    /// assert_eq!(map.ceiling(&3), Some((&3, &"c")));
    /// assert_eq!(map.ceiling(&4), Some((&5, &"e")));
    /// assert_eq!(map.ceiling(&6), None);
    /// ```
    #[must_use]
    pub fn ceiling<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.ceiling(key)
    }

    /// Returns the entry with the largest key less than or equal to `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, "a"), (3, "c"), (5, "e")]);
    /// assert_eq!(map.floor(&3), Some((&3, &"c")));
    /// assert_eq!(map.floor(&4), Some((&3, &"c")));
    /// assert_eq!(map.floor(&0), None);
    /// ```
    #[must_use]
    pub fn floor<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.floor(key)
    }

    /// Returns the entry with the smallest key strictly greater than `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, "a"), (3, "c"), (5, "e")]);
    /// assert_eq!(map.higher(&3), Some((&5, &"e")));
    /// assert_eq!(map.higher(&5), None);
    /// ```
    #[must_use]
    pub fn higher<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.higher(key)
    }

    /// Returns the entry with the largest key strictly less than `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, "a"), (3, "c"), (5, "e")]);
    /// assert_eq!(map.lower(&3), Some((&1, &"a")));
    /// assert_eq!(map.lower(&1), None);
    /// ```
    #[must_use]
    pub fn lower<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.lower(key)
    }

    /// Returns the number of keys strictly less than `key`.
    ///
    /// `key` need not be present in the map.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<i32, ()> = [1, 3, 5, 7, 9].into_iter().map(|k| (k, ())).collect();
    /// assert_eq!(map.count_lesser(&5), 2);
    /// assert_eq!(map.count_lesser(&6), 3);
    /// assert_eq!(map.count_lesser(&0), 0);
    /// ```
    #[must_use]
    pub fn count_lesser<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.count_lesser(key)
    }

    /// Returns the number of keys strictly greater than `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<i32, ()> = [1, 3, 5, 7, 9].into_iter().map(|k| (k, ())).collect();
    /// assert_eq!(map.count_greater(&5), 2);
    /// assert_eq!(map.count_greater(&10), 0);
    /// ```
    #[must_use]
    pub fn count_greater<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.count_greater(key)
    }

    /// Returns the number of keys less than or equal to `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<i32, ()> = [1, 3, 5, 7, 9].into_iter().map(|k| (k, ())).collect();
    /// assert_eq!(map.count_lesser_or_equal(&5), 3);
    /// assert_eq!(map.count_lesser_or_equal(&4), 2);
    /// ```
    #[must_use]
    pub fn count_lesser_or_equal<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.len() - self.raw.count_greater(key)
    }

    /// Returns the number of keys greater than or equal to `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<i32, ()> = [1, 3, 5, 7, 9].into_iter().map(|k| (k, ())).collect();
    /// assert_eq!(map.count_greater_or_equal(&5), 3);
    /// assert_eq!(map.count_greater_or_equal(&6), 2);
    /// ```
    #[must_use]
    pub fn count_greater_or_equal<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.len() - self.raw.count_lesser(key)
    }

    /// Returns the zero-based rank of `key` in sorted order, or `None` if the
    /// key is not present.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeMap` API.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// map.insert(10, "a");
    /// map.insert(20, "b");
    ///
    /// assert_eq!(map.rank_of(&20), Some(1));
    /// assert_eq!(map.rank_of(&15), None);
    /// ```
    #[must_use]
    pub fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.rank_of(key)
    }
}

impl<K, V> AvlTreeMap<K, V> {
    /// Returns the key-value pair at position `rank` in sorted order.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeMap` API.
    ///
    /// The rank is zero-based. Returns `None` if `rank` is out of bounds.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// map.insert("a", 10);
    /// map.insert("c", 30);
    /// map.insert("b", 20);
    ///
    /// assert_eq!(map.get_by_rank(1), Some((&"b", &20)));
    /// assert!(map.get_by_rank(3).is_none());
    /// ```
    #[must_use]
    pub fn get_by_rank(&self, rank: usize) -> Option<(&K, &V)> {
        self.raw.get_by_rank(rank)
    }

    /// Returns the key and a mutable reference to the value at position `rank`
    /// in sorted order.
    ///
    /// The key is returned as a shared reference because mutating it would
    /// violate the map's ordering invariants.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// map.insert(10, "a");
    /// map.insert(5, "b");
    ///
    /// if let Some((key, value)) = map.get_by_rank_mut(0) {
    ///     assert_eq!(*key, 5);
    ///     *value = "updated";
    /// }
    ///
    /// assert_eq!(map.get(&5), Some(&"updated"));
    /// ```
    #[must_use]
    pub fn get_by_rank_mut(&mut self, rank: usize) -> Option<(&K, &mut V)> {
        self.raw.get_by_rank_mut(rank)
    }
}

/// Indexes into the map by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use avl_tree::{AvlTreeMap, Rank};
///
/// let map = AvlTreeMap::from([("a", 1), ("b", 2)]);
/// assert_eq!(map[Rank(1)], 2);
/// ```
impl<K, V> Index<Rank> for AvlTreeMap<K, V> {
    type Output = V;

    fn index(&self, rank: Rank) -> &Self::Output {
        self.get_by_rank(rank.0).map(|(_, v)| v).expect("index out of bounds")
    }
}

/// Mutably indexes into the map by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use avl_tree::{AvlTreeMap, Rank};
///
/// let mut map = AvlTreeMap::from([("a", 1), ("b", 2)]);
/// map[Rank(0)] = 5;
///
/// assert_eq!(map.get(&"a"), Some(&5));
/// ```
impl<K, V> IndexMut<Rank> for AvlTreeMap<K, V> {
    fn index_mut(&mut self, rank: Rank) -> &mut Self::Output {
        self.get_by_rank_mut(rank.0).map(|(_, v)| v).expect("index out of bounds")
    }
}
