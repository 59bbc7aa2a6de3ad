use core::borrow::Borrow;
use core::cmp::Ordering;

use alloc::vec::Vec;
use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;

/// Explicit stack for iterative in-order walks.
///
/// An AVL tree over `u32` handles is at most 46 levels tall, so walks never spill to the heap.
pub(crate) type Stack = SmallVec<[Handle; 64]>;

/// The AVL tree backing `AvlTreeMap`.
///
/// Nodes live in an arena and refer to their children by handle. Every structural
/// mutation recurses down to the affected node and rebalances each ancestor on the
/// way back up, returning the (possibly new) subtree root to the caller.
#[derive(Clone)]
pub(crate) struct RawAvlTreeMap<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
}

impl<K, V> RawAvlTreeMap<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// Returns the number of key-value pairs in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree contains no elements.
    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of nodes the tree can hold without reallocating.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Returns the height of the tree; 0 when empty.
    pub(crate) fn height(&self) -> usize {
        usize::from(self.height_of(self.root))
    }

    /// Clears all elements from the tree.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Returns the root handle, if any.
    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    /// Returns a reference to a node by handle.
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    fn entry(&self, handle: Handle) -> (&K, &V) {
        let node = self.nodes.get(handle);
        (node.key(), node.value())
    }

    /// Pushes `from` and its chain of left children, so the smallest key ends on top.
    pub(crate) fn push_left_spine(&self, stack: &mut Stack, mut from: Option<Handle>) {
        while let Some(handle) = from {
            stack.push(handle);
            from = self.nodes.get(handle).left();
        }
    }

    /// Pushes `from` and its chain of right children, so the largest key ends on top.
    pub(crate) fn push_right_spine(&self, stack: &mut Stack, mut from: Option<Handle>) {
        while let Some(handle) = from {
            stack.push(handle);
            from = self.nodes.get(handle).right();
        }
    }

    /// Removes every entry in key order. O(n), no rebalancing.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, V)> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = Stack::new();
        self.push_left_spine(&mut stack, self.root);
        while let Some(handle) = stack.pop() {
            order.push(handle);
            self.push_left_spine(&mut stack, self.nodes.get(handle).right());
        }

        let entries = order.into_iter().map(|handle| self.nodes.take(handle).into_entry()).collect();
        self.clear();
        entries
    }

    fn height_of(&self, node: Option<Handle>) -> u8 {
        node.map_or(0, |handle| self.nodes.get(handle).height())
    }

    fn count_of(&self, node: Option<Handle>) -> usize {
        node.map_or(0, |handle| self.nodes.get(handle).count())
    }

    /// Left height minus right height.
    fn balance_of(&self, handle: Handle) -> i16 {
        let node = self.nodes.get(handle);
        i16::from(self.height_of(node.left())) - i16::from(self.height_of(node.right()))
    }

    /// Recomputes a node's cached height and count from its children.
    fn refresh(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let (left, right) = (node.left(), node.right());
        let height = 1 + self.height_of(left).max(self.height_of(right));
        let count = 1 + self.count_of(left) + self.count_of(right);
        self.nodes.get_mut(handle).set_shape(height, count);
    }

    /// Promotes the right child of `handle` and returns it as the new subtree root.
    fn rotate_left(&mut self, handle: Handle) -> Handle {
        let pivot = self.nodes.get(handle).right().expect("`RawAvlTreeMap::rotate_left()` - no right child!");
        let inner = self.nodes.get(pivot).left();
        self.nodes.get_mut(handle).set_right(inner);
        self.nodes.get_mut(pivot).set_left(Some(handle));
        self.refresh(handle);
        self.refresh(pivot);
        pivot
    }

    /// Promotes the left child of `handle` and returns it as the new subtree root.
    fn rotate_right(&mut self, handle: Handle) -> Handle {
        let pivot = self.nodes.get(handle).left().expect("`RawAvlTreeMap::rotate_right()` - no left child!");
        let inner = self.nodes.get(pivot).right();
        self.nodes.get_mut(handle).set_left(inner);
        self.nodes.get_mut(pivot).set_right(Some(handle));
        self.refresh(handle);
        self.refresh(pivot);
        pivot
    }

    /// Refreshes `handle` after a change below it and restores the AVL balance
    /// with at most one single or double rotation. Returns the subtree root.
    fn rebalance(&mut self, handle: Handle) -> Handle {
        self.refresh(handle);
        let balance = self.balance_of(handle);
        let node = self.nodes.get(handle);
        let (left, right) = (node.left(), node.right());

        if balance > 1 {
            // Left-right case: straighten the left child first.
            if let Some(left) = left
                && self.balance_of(left) < 0
            {
                let left = self.rotate_left(left);
                self.nodes.get_mut(handle).set_left(Some(left));
            }
            self.rotate_right(handle)
        } else if balance < -1 {
            // Right-left case.
            if let Some(right) = right
                && self.balance_of(right) > 0
            {
                let right = self.rotate_right(right);
                self.nodes.get_mut(handle).set_right(Some(right));
            }
            self.rotate_left(handle)
        } else {
            handle
        }
    }

    /// Unlinks the minimum of the subtree at `handle`.
    ///
    /// Returns the rebalanced remainder and the detached node, which is still
    /// allocated and must be taken by the caller.
    fn detach_min(&mut self, handle: Handle) -> (Option<Handle>, Handle) {
        let node = self.nodes.get(handle);
        match node.left() {
            None => (node.right(), handle),
            Some(left) => {
                let (rest, min) = self.detach_min(left);
                self.nodes.get_mut(handle).set_left(rest);
                (Some(self.rebalance(handle)), min)
            }
        }
    }

    /// Mirror of [`detach_min`](Self::detach_min).
    fn detach_max(&mut self, handle: Handle) -> (Option<Handle>, Handle) {
        let node = self.nodes.get(handle);
        match node.right() {
            None => (node.left(), handle),
            Some(right) => {
                let (rest, max) = self.detach_max(right);
                self.nodes.get_mut(handle).set_right(rest);
                (Some(self.rebalance(handle)), max)
            }
        }
    }

    fn leftmost(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.nodes.get(handle).left() {
            handle = left;
        }
        handle
    }

    fn rightmost(&self, mut handle: Handle) -> Handle {
        while let Some(right) = self.nodes.get(handle).right() {
            handle = right;
        }
        handle
    }

    /// Returns the entry with the smallest key.
    pub(crate) fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root| self.entry(self.leftmost(root)))
    }

    /// Returns the entry with the largest key.
    pub(crate) fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root| self.entry(self.rightmost(root)))
    }

    /// Removes and returns the entry with the smallest key.
    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        let (rest, min) = self.detach_min(self.root?);
        self.root = rest;
        Some(self.nodes.take(min).into_entry())
    }

    /// Removes and returns the entry with the largest key.
    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        let (rest, max) = self.detach_max(self.root?);
        self.root = rest;
        Some(self.nodes.take(max).into_entry())
    }

    /// Returns the node at zero-based position `rank` in key order.
    fn select(&self, rank: usize) -> Option<Handle> {
        if rank >= self.len() {
            return None;
        }

        let mut current = self.root;
        let mut remaining = rank;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            let before = self.count_of(node.left());
            current = match remaining.cmp(&before) {
                Ordering::Less => node.left(),
                Ordering::Equal => return Some(handle),
                Ordering::Greater => {
                    remaining -= before + 1;
                    node.right()
                }
            };
        }

        debug_assert!(false, "select: subtree counts disagree with len {} for rank {}", self.len(), rank);
        None
    }

    /// Gets an element by its rank (0-indexed position in sorted order).
    pub(crate) fn get_by_rank(&self, rank: usize) -> Option<(&K, &V)> {
        self.select(rank).map(|handle| self.entry(handle))
    }

    /// Gets a mutable element by its rank.
    pub(crate) fn get_by_rank_mut(&mut self, rank: usize) -> Option<(&K, &mut V)> {
        let handle = self.select(rank)?;
        Some(self.nodes.get_mut(handle).entry_mut())
    }
}

impl<K: Ord, V> RawAvlTreeMap<K, V> {
    /// Finds the node holding `key`.
    fn search<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(node.key().borrow()) {
                Ordering::Less => node.left(),
                Ordering::Greater => node.right(),
                Ordering::Equal => return Some(handle),
            };
        }
        None
    }

    /// Returns a reference to the value corresponding to the key.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).map(|handle| self.nodes.get(handle).value())
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.search(key)?;
        Some(self.nodes.get_mut(handle).value_mut())
    }

    /// Returns the key-value pair corresponding to the key.
    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).map(|handle| self.entry(handle))
    }

    /// Returns true if the tree contains the specified key.
    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).is_some()
    }

    /// Inserts a key-value pair into the tree.
    /// Returns the old value if the key was already present; the shape is then unchanged.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (root, old) = self.insert_at(self.root, key, value);
        self.root = Some(root);
        old
    }

    fn insert_at(&mut self, node: Option<Handle>, key: K, value: V) -> (Handle, Option<V>) {
        let Some(handle) = node else {
            return (self.nodes.alloc(Node::new(key, value)), None);
        };

        let current = self.nodes.get(handle);
        let (ordering, left, right) = (key.cmp(current.key()), current.left(), current.right());
        match ordering {
            Ordering::Equal => {
                let old = core::mem::replace(self.nodes.get_mut(handle).value_mut(), value);
                (handle, Some(old))
            }
            Ordering::Less => {
                let (left, old) = self.insert_at(left, key, value);
                if old.is_some() {
                    return (handle, old);
                }
                self.nodes.get_mut(handle).set_left(Some(left));
                (self.rebalance(handle), None)
            }
            Ordering::Greater => {
                let (right, old) = self.insert_at(right, key, value);
                if old.is_some() {
                    return (handle, old);
                }
                self.nodes.get_mut(handle).set_right(Some(right));
                (self.rebalance(handle), None)
            }
        }
    }

    /// Removes a key from the tree, returning the stored key and value.
    pub(crate) fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (root, removed) = self.remove_at(self.root, key);
        if removed.is_some() {
            self.root = root;
        }
        removed
    }

    /// Removes a key from the tree, returning the value.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    fn remove_at<Q>(&mut self, node: Option<Handle>, key: &Q) -> (Option<Handle>, Option<(K, V)>)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(handle) = node else {
            return (None, None);
        };

        let current = self.nodes.get(handle);
        let (ordering, left, right) = (key.cmp(current.key().borrow()), current.left(), current.right());
        match ordering {
            Ordering::Less => {
                let (left, removed) = self.remove_at(left, key);
                if removed.is_none() {
                    return (Some(handle), None);
                }
                self.nodes.get_mut(handle).set_left(left);
                (Some(self.rebalance(handle)), removed)
            }
            Ordering::Greater => {
                let (right, removed) = self.remove_at(right, key);
                if removed.is_none() {
                    return (Some(handle), None);
                }
                self.nodes.get_mut(handle).set_right(right);
                (Some(self.rebalance(handle)), removed)
            }
            Ordering::Equal => match (left, right) {
                (Some(_), Some(right)) => {
                    // Two children: the in-order successor's entry moves into this
                    // node and the successor's own node is the one freed.
                    let (rest, successor) = self.detach_min(right);
                    let (key, value) = self.nodes.take(successor).into_entry();
                    let target = self.nodes.get_mut(handle);
                    target.set_right(rest);
                    let removed = target.replace_entry(key, value);
                    (Some(self.rebalance(handle)), Some(removed))
                }
                (child, None) | (None, child) => {
                    let removed = self.nodes.take(handle).into_entry();
                    (child, Some(removed))
                }
            },
        }
    }

    /// Smallest key greater than (or, if `inclusive`, equal to) `key`.
    fn successor<Q>(&self, key: &Q, inclusive: bool) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut best = None;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(node.key().borrow()) {
                Ordering::Less => {
                    best = Some(handle);
                    node.left()
                }
                Ordering::Equal if inclusive => return Some(handle),
                Ordering::Equal | Ordering::Greater => node.right(),
            };
        }
        best
    }

    /// Largest key less than (or, if `inclusive`, equal to) `key`.
    fn predecessor<Q>(&self, key: &Q, inclusive: bool) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut best = None;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(node.key().borrow()) {
                Ordering::Greater => {
                    best = Some(handle);
                    node.right()
                }
                Ordering::Equal if inclusive => return Some(handle),
                Ordering::Equal | Ordering::Less => node.left(),
            };
        }
        best
    }

    pub(crate) fn ceiling<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.successor(key, true).map(|handle| self.entry(handle))
    }

    pub(crate) fn higher<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.successor(key, false).map(|handle| self.entry(handle))
    }

    pub(crate) fn floor<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.predecessor(key, true).map(|handle| self.entry(handle))
    }

    pub(crate) fn lower<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.predecessor(key, false).map(|handle| self.entry(handle))
    }

    /// Number of keys strictly less than `key`.
    ///
    /// Each time the descent turns right, the left subtree and the node itself are
    /// all smaller, so their cached count is added without visiting them.
    pub(crate) fn count_lesser<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut count = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(node.key().borrow()) {
                Ordering::Less => node.left(),
                Ordering::Equal => return count + self.count_of(node.left()),
                Ordering::Greater => {
                    count += self.count_of(node.left()) + 1;
                    node.right()
                }
            };
        }
        count
    }

    /// Number of keys strictly greater than `key`.
    pub(crate) fn count_greater<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut count = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(node.key().borrow()) {
                Ordering::Greater => node.right(),
                Ordering::Equal => return count + self.count_of(node.right()),
                Ordering::Less => {
                    count += self.count_of(node.right()) + 1;
                    node.left()
                }
            };
        }
        count
    }

    /// Returns the rank (0-indexed position) of a key.
    pub(crate) fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut rank = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(node.key().borrow()) {
                Ordering::Less => node.left(),
                Ordering::Equal => return Some(rank + self.count_of(node.left())),
                Ordering::Greater => {
                    rank += self.count_of(node.left()) + 1;
                    node.right()
                }
            };
        }
        None
    }
}
