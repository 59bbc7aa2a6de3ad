//! An AVL-balanced order-statistic map for Rust.
//!
//! This crate provides [`AvlTreeMap`], an ordered map with the familiar
//! `BTreeMap` surface plus O(log n) neighbor and rank queries:
//!
//! - [`ceiling`](AvlTreeMap::ceiling) / [`floor`](AvlTreeMap::floor) - nearest key at or above / below a probe
//! - [`higher`](AvlTreeMap::higher) / [`lower`](AvlTreeMap::lower) - nearest key strictly above / below a probe
//! - [`count_lesser`](AvlTreeMap::count_lesser) / [`count_greater`](AvlTreeMap::count_greater) - how many keys sit below / above a probe
//! - [`get_by_rank`](AvlTreeMap::get_by_rank) / [`rank_of`](AvlTreeMap::rank_of) - position-based access
//!
//! # Example
//!
//! ```
//! use avl_tree::{AvlTreeMap, Rank};
//!
//! let mut scores = AvlTreeMap::new();
//! scores.insert(100, "Alice");
//! scores.insert(85, "Bob");
//! scores.insert(92, "Carol");
//!
//! // Standard map operations
//! assert_eq!(scores.get(&85), Some(&"Bob"));
//! assert_eq!(scores.len(), 3);
//!
//! // Neighbor queries
//! assert_eq!(scores.ceiling(&90), Some((&92, &"Carol")));
//! assert_eq!(scores.lower(&92), Some((&85, &"Bob")));
//!
//! // Rank queries
//! assert_eq!(scores.count_greater(&90), 2);
//! assert_eq!(scores[Rank(0)], "Bob");
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`
//! - **No unsafe code** - Nodes live in an index-addressed arena, so rotations only move indices
//! - **O(log n) everything** - Lookups, updates, neighbor and rank queries all descend one path
//!
//! # Implementation
//!
//! Every node caches its subtree height and entry count. Insertions and removals
//! recurse to the affected node and, on the way back up, refresh each ancestor's
//! cache and apply at most one single or double rotation where sibling heights
//! differ by two.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod order_statistic;
mod raw;

pub mod avl_tree_map;

pub use avl_tree_map::AvlTreeMap;
pub use order_statistic::Rank;
