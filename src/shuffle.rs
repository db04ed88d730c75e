//! # Shuffle Chain
//!
//! The random selection engine. A [`ShuffleChain`] owns every group of track
//! URIs that may be enqueued and hands them out at random, never returning a
//! group that was picked within the last `window_size` picks.
//!
//! ## Layout
//!
//! Groups live in a `Vec` and are addressed by their index for the lifetime of
//! the chain. Two index collections partition that `Vec`:
//!
//! - `pool`: indices currently eligible for picking (unordered)
//! - `window`: indices picked recently, oldest at the front
//!
//! A pick removes a random entry from `pool` with `swap_remove`, pushes it to
//! the back of `window`, and moves the oldest window entries back into `pool`
//! once the window is over capacity. Every pick is O(1).
//!
//! The effective window capacity is `min(window_size, len - 1)`, so at least
//! one group is always eligible. With a single group the window is always
//! empty and that group is returned every time.

use anyhow::{bail, Result};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Default number of recent picks that are excluded from selection.
pub const DEFAULT_WINDOW_SIZE: usize = 7;

/// Grouped, repeat-avoiding random sampler.
#[derive(Debug)]
pub struct ShuffleChain {
    window_size: usize,
    groups: Vec<Vec<String>>,
    pool: Vec<usize>,
    window: VecDeque<usize>,
    uri_count: usize,
    rng: StdRng,
}

impl ShuffleChain {
    /// Create an empty chain seeded from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if `window_size` is 0.
    pub fn new(window_size: usize) -> Result<Self> {
        Self::with_rng(window_size, StdRng::from_entropy())
    }

    /// Create an empty chain with a deterministic RNG, for reproducible runs.
    ///
    /// # Errors
    ///
    /// Returns an error if `window_size` is 0.
    pub fn with_seed(window_size: usize, seed: u64) -> Result<Self> {
        Self::with_rng(window_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(window_size: usize, rng: StdRng) -> Result<Self> {
        if window_size == 0 {
            bail!("window-size must be >= 1 (0 given)");
        }
        Ok(Self {
            window_size,
            groups: Vec::new(),
            pool: Vec::new(),
            window: VecDeque::with_capacity(window_size),
            uri_count: 0,
            rng,
        })
    }

    /// Add a group of URIs that will always be picked together.
    ///
    /// An empty group is ignored: it could never be enqueued.
    pub fn add(&mut self, group: Vec<String>) {
        if group.is_empty() {
            debug!("Ignoring empty group");
            return;
        }
        let index = self.groups.len();
        self.uri_count += group.len();
        self.groups.push(group);
        self.pool.push(index);
    }

    /// Add a single URI as a group of its own.
    pub fn add_uri(&mut self, uri: impl Into<String>) {
        self.add(vec![uri.into()]);
    }

    /// Pick a random group that is not in the recent-picks window.
    ///
    /// # Panics
    ///
    /// Panics if the chain is empty. Callers must check [`ShuffleChain::len`]
    /// first.
    pub fn pick(&mut self) -> Vec<String> {
        assert!(!self.groups.is_empty(), "pick called on an empty ShuffleChain");
        debug_assert!(!self.pool.is_empty());

        let slot = self.rng.gen_range(0..self.pool.len());
        let index = self.pool.swap_remove(slot);
        self.window.push_back(index);

        let capacity = self.window_capacity();
        while self.window.len() > capacity {
            if let Some(expired) = self.window.pop_front() {
                self.pool.push(expired);
            }
        }

        trace!("Picked group {index} ({} in window)", self.window.len());
        self.groups[index].clone()
    }

    /// Remove every group and forget the pick history.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.pool.clear();
        self.window.clear();
        self.uri_count = 0;
    }

    /// Number of groups in the chain.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of URIs across all groups.
    pub fn len_uris(&self) -> usize {
        self.uri_count
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Every group in insertion order.
    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    fn window_capacity(&self) -> usize {
        self.window_size.min(self.groups.len().saturating_sub(1))
    }
}
