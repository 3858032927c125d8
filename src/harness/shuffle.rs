//! Key sequences for the harness: sorted runs and a riffle shuffle.

use alloc::vec::Vec;

use rand::Rng;

/// Largest number of cards dropped from one half before switching to the other.
const MAX_BURST: usize = 4;

/// The keys `1..=count`.
#[must_use]
pub fn sequential_keys(count: u32) -> Vec<u32> {
    (1..=count).collect()
}

/// Riffle-shuffles `keys` in place, `repeats` times.
///
/// Each pass cuts the deck into two unequal runs near the middle and interleaves them
/// in bursts of 1 to 4 keys, alternating sides, like a hand shuffle. A few passes are
/// enough to break up sorted input without producing a uniform permutation.
pub fn riffle_shuffle<R: Rng + ?Sized>(keys: &mut [u32], repeats: usize, rng: &mut R) {
    let len = keys.len();
    if len < 2 {
        return;
    }

    let mut deck = Vec::with_capacity(len);
    for _ in 0..repeats {
        let half = len / 2;
        let spread = (len / 8).max(1);
        let mut cut = rng.gen_range(half.saturating_sub(spread).max(1)..=(half + spread).min(len - 1));
        if len > 2 && cut * 2 == len {
            cut += 1;
        }

        let (left, right) = keys.split_at(cut);
        let (mut l, mut r) = (0, 0);
        let mut from_left = rng.gen_bool(0.5);
        deck.clear();
        while l < left.len() || r < right.len() {
            let burst = rng.gen_range(1..=MAX_BURST);
            if from_left {
                let take = burst.min(left.len() - l);
                deck.extend_from_slice(&left[l..l + take]);
                l += take;
            } else {
                let take = burst.min(right.len() - r);
                deck.extend_from_slice(&right[r..r + take]);
                r += take;
            }
            from_left = !from_left;
        }
        keys.copy_from_slice(&deck);
    }
}
