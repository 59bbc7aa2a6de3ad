/// A zero-based position in the key order of an [`AvlTreeMap`](crate::AvlTreeMap).
///
/// Indexing a map with a `Rank` selects by position rather than by key, in
/// O(log n) using the subtree counts every node caches.
///
/// # Examples
///
/// ```
/// use avl_tree::{AvlTreeMap, Rank};
///
/// let mut map = AvlTreeMap::new();
/// map.insert("b", 20);
/// map.insert("a", 10);
///
/// assert_eq!(map[Rank(0)], 10);
/// assert_eq!(map[Rank(1)], 20);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
