//! Runs one workload against every tree: a correctness pass that checks invariants
//! after each mutation, and a timed pass per table size.
//!
//! ```
//! use balanced_maps::harness::{HarnessConfig, TreeHarness};
//! use balanced_maps::TwoThreeExternalTree;
//!
//! let harness = TreeHarness::new(HarnessConfig { key_count: 100, delete_range: 10..=40, ..HarnessConfig::default() });
//! let report = harness.verify::<TwoThreeExternalTree<u32>>().unwrap();
//! assert_eq!(report.stats.keys, 69);
//! ```

mod clock;
mod plot;
mod shuffle;

use alloc::vec::Vec;
use core::fmt;
use core::hint::black_box;
use core::ops::RangeInclusive;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use thiserror::Error;
use tracing::{debug, info};

use crate::{InvariantViolation, KeyValueRef, OrderedMap, TreeStats};

pub use clock::Clock;
pub use plot::{ImageSink, PlotError, Rgb, ScatterPlot, TgaEncoder};
pub use shuffle::{riffle_shuffle, sequential_keys};

/// Payload stored with `key`, so lookups can be checked without a side table.
#[must_use]
pub const fn payload_for(key: u32) -> u32 {
    key ^ 0x5A5A_5A5A
}

/// The order keys are inserted in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum KeyOrder {
    /// Riffle-shuffled [`HarnessConfig::repeat_count`] times.
    #[default]
    Shuffled,
    Ascending,
    Descending,
}

/// Workload parameters for [`TreeHarness`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HarnessConfig {
    /// Keys `1..=key_count` are inserted by [`TreeHarness::verify`].
    pub key_count: u32,
    /// Riffle passes over the key sequence.
    pub repeat_count: usize,
    /// Keys deleted by [`TreeHarness::verify`]. Must lie within `1..=key_count`.
    pub delete_range: RangeInclusive<u32>,
    /// Seed for the shuffle.
    pub seed: u64,
    /// Table sizes timed by [`TreeHarness::benchmark`].
    pub bench_sizes: Vec<u32>,
    pub order: KeyOrder,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            key_count: 1000,
            repeat_count: 4,
            delete_range: 374..=872,
            seed: 0x00C0_FFEE,
            bench_sizes: alloc::vec![1_000, 2_000, 4_000, 8_000, 16_000],
            order: KeyOrder::Shuffled,
        }
    }
}

/// The step a [`HarnessError`] was raised in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Phase {
    Insert,
    Lookup,
    Delete,
    Check,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insert => "insert",
            Self::Lookup => "lookup",
            Self::Delete => "delete",
            Self::Check => "final check",
        })
    }
}

/// A tree failed the harness workload.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum HarnessError {
    #[error("{tree}: invariant broken by {phase} of key {key}: {violation}")]
    Invariant {
        tree: &'static str,
        phase: Phase,
        key: u32,
        #[source]
        violation: InvariantViolation,
    },
    #[error("{tree}: key {key} missing during {phase}")]
    MissingKey { tree: &'static str, phase: Phase, key: u32 },
    #[error("{tree}: key {key} returned payload {found:#x}, expected {expected:#x}")]
    WrongPayload { tree: &'static str, key: u32, expected: u32, found: u32 },
    #[error("{tree}: deleted key {key} is still present")]
    UnexpectedKey { tree: &'static str, key: u32 },
    #[error("{tree}: expected {expected} keys, found {found}")]
    CountMismatch { tree: &'static str, expected: usize, found: usize },
    #[error("{tree}: in-order traversal diverges at position {position}")]
    TraversalOrder { tree: &'static str, position: usize },
    #[error("delete range {start}..={end} does not lie within 1..={key_count}")]
    DeleteRangeOutOfBounds { start: u32, end: u32, key_count: u32 },
}

/// Outcome of a successful [`TreeHarness::verify`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VerifyReport {
    pub tree: &'static str,
    /// Shape after the delete phase.
    pub stats: TreeStats,
}

/// Timings for one table size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BenchSample {
    pub tree: &'static str,
    pub size: u32,
    pub insert_ms: f64,
    pub lookup_ms: f64,
    pub delete_ms: f64,
}

#[derive(Clone, Debug, Default)]
pub struct TreeHarness {
    config: HarnessConfig,
}

impl TreeHarness {
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Keys `1..=count` in the configured order. Shuffles are reproducible for a seed.
    #[must_use]
    pub fn keys(&self, count: u32) -> Vec<u32> {
        let mut keys = sequential_keys(count);
        match self.config.order {
            KeyOrder::Shuffled => {
                let mut rng = SmallRng::seed_from_u64(self.config.seed);
                riffle_shuffle(&mut keys, self.config.repeat_count, &mut rng);
            }
            KeyOrder::Ascending => {}
            KeyOrder::Descending => keys.reverse(),
        }
        keys
    }

    /// Inserts every key, deletes the configured range and checks that exactly the
    /// retained keys remain, in order. Invariants are checked after every mutation.
    ///
    /// # Errors
    ///
    /// Returns the first failure found, or [`HarnessError::DeleteRangeOutOfBounds`]
    /// before touching the tree.
    pub fn verify<T: OrderedMap<u32> + Default>(&self) -> Result<VerifyReport, HarnessError> {
        let key_count = self.config.key_count;
        let range = self.config.delete_range.clone();
        if range.is_empty() || *range.start() == 0 || *range.end() > key_count {
            return Err(HarnessError::DeleteRangeOutOfBounds {
                start: *range.start(),
                end: *range.end(),
                key_count,
            });
        }

        let tree_name = T::NAME;
        let mut tree = T::default();
        let keys = self.keys(key_count);

        debug!(tree = tree_name, keys = keys.len(), order = ?self.config.order, "inserting");
        for &key in &keys {
            tree.insert(KeyValueRef::new(key, payload_for(key)));
            check(&tree, Phase::Insert, key)?;
        }

        debug!(tree = tree_name, "looking up");
        for &key in &keys {
            lookup_exact(&tree, Phase::Lookup, key)?;
        }

        debug!(tree = tree_name, from = *range.start(), to = *range.end(), "deleting");
        for key in range.clone() {
            if tree.delete(key).is_none() {
                return Err(HarnessError::MissingKey { tree: tree_name, phase: Phase::Delete, key });
            }
            check(&tree, Phase::Delete, key)?;
        }

        for key in 1..=key_count {
            if range.contains(&key) {
                if tree.contains_key(key) {
                    return Err(HarnessError::UnexpectedKey { tree: tree_name, key });
                }
            } else {
                lookup_exact(&tree, Phase::Check, key)?;
            }
        }

        let expected = (1..=key_count).filter(|key| !range.contains(key)).count();
        for found in [tree.len(), tree.key_count()] {
            if found != expected {
                return Err(HarnessError::CountMismatch { tree: tree_name, expected, found });
            }
        }

        let mut retained = (1..=key_count).filter(|key| !range.contains(key));
        let mut visited = tree.traverse_in_order();
        for position in 0.. {
            match (retained.next(), visited.next()) {
                (None, None) => break,
                (expected, found) if expected == found => {}
                _ => return Err(HarnessError::TraversalOrder { tree: tree_name, position }),
            }
        }

        let stats = tree.check_invariants().map_err(|violation| HarnessError::Invariant {
            tree: tree_name,
            phase: Phase::Check,
            key: 0,
            violation,
        })?;
        info!(tree = tree_name, keys = stats.keys, height = stats.height, "verified");
        Ok(VerifyReport { tree: tree_name, stats })
    }

    /// Times a batch of inserts, lookups and deletes for each configured table size.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::MissingKey`] if a lookup or delete misses and
    /// [`HarnessError::CountMismatch`] if the tree is not empty afterwards.
    pub fn benchmark<T, C>(&self, clock: &C) -> Result<Vec<BenchSample>, HarnessError>
    where
        T: OrderedMap<u32> + Default,
        C: Clock + ?Sized,
    {
        let mut samples = Vec::with_capacity(self.config.bench_sizes.len());
        for &size in &self.config.bench_sizes {
            let keys = self.keys(size);
            let mut tree = T::default();

            let start = clock.now();
            for &key in &keys {
                black_box(tree.insert(KeyValueRef::new(key, payload_for(key))));
            }
            let inserted = clock.now();
            let mut missing = None;
            for &key in &keys {
                if black_box(tree.lookup(key)).is_none() {
                    missing.get_or_insert((Phase::Lookup, key));
                }
            }
            let looked_up = clock.now();
            for &key in &keys {
                if black_box(tree.delete(key)).is_none() {
                    missing.get_or_insert((Phase::Delete, key));
                }
            }
            let deleted = clock.now();

            if let Some((phase, key)) = missing {
                return Err(HarnessError::MissingKey { tree: T::NAME, phase, key });
            }
            if !tree.is_empty() {
                return Err(HarnessError::CountMismatch { tree: T::NAME, expected: 0, found: tree.len() });
            }

            let sample = BenchSample {
                tree: T::NAME,
                size,
                insert_ms: clock.elapsed_ms(start, inserted),
                lookup_ms: clock.elapsed_ms(inserted, looked_up),
                delete_ms: clock.elapsed_ms(looked_up, deleted),
            };
            info!(
                tree = sample.tree,
                size,
                insert_ms = sample.insert_ms,
                lookup_ms = sample.lookup_ms,
                delete_ms = sample.delete_ms,
                "timed"
            );
            samples.push(sample);
        }
        Ok(samples)
    }
}

fn check<T: OrderedMap<u32>>(tree: &T, phase: Phase, key: u32) -> Result<(), HarnessError> {
    tree.check_invariants()
        .map(drop)
        .map_err(|violation| HarnessError::Invariant { tree: T::NAME, phase, key, violation })
}

fn lookup_exact<T: OrderedMap<u32>>(tree: &T, phase: Phase, key: u32) -> Result<(), HarnessError> {
    match tree.lookup(key) {
        None => Err(HarnessError::MissingKey { tree: T::NAME, phase, key }),
        Some(found) if found != payload_for(key) => Err(HarnessError::WrongPayload {
            tree: T::NAME,
            key,
            expected: payload_for(key),
            found,
        }),
        Some(_) => Ok(()),
    }
}
