use std::collections::VecDeque;

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Upcoming pieces, generated with the 7-bag randomization algorithm.
///
/// # 7-Bag System
///
/// 1. Create a "bag" containing all 7 piece kinds
/// 2. Shuffle the bag
/// 3. Draw pieces in order from the bag
/// 4. Append a new shuffled bag when 7 or fewer pieces remain
///
/// Every kind therefore appears once per bag, which bounds the gap between
/// two pieces of the same kind to 12 draws.
///
/// All randomness comes from a [`PieceSeed`], so two queues built from the
/// same seed produce the same sequence.
///
/// # Example
///
/// ```
/// use stackfall_engine::{NextQueue, PieceSeed};
///
/// let mut queue = NextQueue::with_seed(PieceSeed::from_bytes([7; 16]));
///
/// let first = queue.pop_next();
/// let upcoming: Vec<_> = queue.peek().take(5).collect();
/// assert_eq!(upcoming.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct NextQueue {
    seed: PieceSeed,
    rng: Pcg32,
    bags_drawn: u64,
    queue: VecDeque<PieceKind>,
}

impl Default for NextQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// 128-bit seed of a [`NextQueue`].
///
/// Stored in saves as 32 hex digits, first byte first.
///
/// ```
/// use stackfall_engine::{NextQueue, PieceSeed};
///
/// let seed: PieceSeed = serde_json::from_str(r#""00112233445566778899aabbccddeeff""#).unwrap();
/// assert_eq!(seed.as_bytes()[1], 0x11);
///
/// let a: Vec<_> = NextQueue::with_seed(seed).peek().collect();
/// let b: Vec<_> = NextQueue::with_seed(seed).peek().collect();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hex: String = self.0.iter().map(|byte| format!("{byte:02x}")).collect();
        serializer.serialize_str(&hex)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != 32 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(serde::de::Error::custom(format!(
                "piece seed must be 32 hex digits, got {hex:?}"
            )));
        }
        let mut bytes = [0; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(Self(bytes))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        PieceSeed(rng.random())
    }
}

impl NextQueue {
    /// Largest bag count accepted when restoring a queue.
    pub const MAX_BAGS_DRAWN: u64 = 1 << 20;

    /// Creates a new queue with a random seed.
    ///
    /// For deterministic piece generation, use [`Self::with_seed`] instead.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self::restore(seed, 0, [])
    }

    /// Rebuilds a queue from saved state.
    ///
    /// The generator is fast-forwarded past `bags_drawn` bags, then `pending`
    /// is placed at the front of the queue. New bags are appended behind it as
    /// usual, so a queue restored from [`Self::bags_drawn`] and
    /// [`Self::peek`] of another queue continues exactly like it.
    ///
    /// Fast-forwarding costs one shuffle per bag; callers restoring untrusted
    /// data check `bags_drawn` against [`Self::MAX_BAGS_DRAWN`] first.
    #[must_use]
    pub fn restore(
        seed: PieceSeed,
        bags_drawn: u64,
        pending: impl IntoIterator<Item = PieceKind>,
    ) -> Self {
        let mut rng = Pcg32::from_seed(seed.0);
        for _ in 0..bags_drawn {
            let mut skipped = PieceKind::ALL;
            skipped.shuffle(&mut rng);
        }
        let mut queue = VecDeque::with_capacity(PieceKind::LEN * 2);
        queue.extend(pending);
        let mut this = Self {
            seed,
            rng,
            bags_drawn,
            queue,
        };
        this.fill_bag();
        this
    }

    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.seed
    }

    /// Number of shuffled bags generated since the queue was seeded.
    #[must_use]
    pub fn bags_drawn(&self) -> u64 {
        self.bags_drawn
    }

    /// Appends shuffled bags while 7 or fewer pieces remain.
    ///
    /// After filling, the queue holds at least 8 pieces, so 7 remain after
    /// the next pop.
    fn fill_bag(&mut self) {
        while self.queue.len() <= PieceKind::LEN {
            let mut new_bag = PieceKind::ALL;
            new_bag.shuffle(&mut self.rng);
            self.queue.extend(new_bag);
            self.bags_drawn = self.bags_drawn.saturating_add(1);
        }
    }

    /// Draws the next piece.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty (should never happen with proper refill logic).
    pub fn pop_next(&mut self) -> PieceKind {
        self.fill_bag();
        self.queue
            .pop_front()
            .expect("Piece queue should never be empty")
    }

    /// Returns an iterator over the upcoming pieces, nearest first.
    ///
    /// The iterator always yields at least 7 pieces.
    pub fn peek(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn seed_from_bytes(bytes: [u8; 16]) -> PieceSeed {
        PieceSeed(bytes)
    }

    #[test]
    fn test_each_bag_holds_every_kind() {
        let mut queue = NextQueue::with_seed(seed_from_bytes([3; 16]));
        for _ in 0..10 {
            let bag: BTreeSet<u8> = (0..PieceKind::LEN)
                .map(|_| queue.pop_next() as u8)
                .collect();
            assert_eq!(bag.len(), PieceKind::LEN);
        }
    }

    #[test]
    fn test_preview_never_runs_short() {
        let mut queue = NextQueue::with_seed(seed_from_bytes([9; 16]));
        for _ in 0..50 {
            assert!(queue.peek().count() >= PieceKind::LEN);
            let expected = queue.peek().next();
            assert_eq!(Some(queue.pop_next()), expected);
        }
    }

    #[test]
    fn test_deterministic_piece_generation() {
        let seed = seed_from_bytes([
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
            0x77, 0x88,
        ]);

        let mut queue1 = NextQueue::with_seed(seed);
        let mut queue2 = NextQueue::with_seed(seed);

        for _ in 0..20 {
            assert_eq!(queue1.pop_next(), queue2.pop_next());
        }
    }

    #[test]
    fn test_restore_continues_sequence() {
        let seed = seed_from_bytes([0x5A; 16]);
        let mut original = NextQueue::with_seed(seed);
        for _ in 0..11 {
            original.pop_next();
        }

        let pending: Vec<_> = original.peek().collect();
        let mut restored = NextQueue::restore(seed, original.bags_drawn(), pending);

        for _ in 0..30 {
            assert_eq!(original.pop_next(), restored.pop_next());
        }
    }

    #[test]
    fn test_restore_serves_pending_first() {
        let pending = [PieceKind::O, PieceKind::O, PieceKind::I];
        let mut queue = NextQueue::restore(seed_from_bytes([1; 16]), 0, pending);
        assert_eq!(queue.pop_next(), PieceKind::O);
        assert_eq!(queue.pop_next(), PieceKind::O);
        assert_eq!(queue.pop_next(), PieceKind::I);
        assert!(queue.peek().count() >= PieceKind::LEN);
    }

    #[test]
    fn test_seed_hex_lists_bytes_in_order() {
        let mut bytes = [0; 16];
        bytes[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        bytes[15] = 0x07;
        let json = serde_json::to_string(&PieceSeed(bytes)).unwrap();
        assert_eq!(json, "\"deadbeef000000000000000000000007\"");
        assert_eq!(serde_json::from_str::<PieceSeed>(&json).unwrap(), PieceSeed(bytes));
    }

    #[test]
    fn test_seed_accepts_mixed_case() {
        let seed: PieceSeed =
            serde_json::from_str("\"DeadBeef000000000000000000000007\"").unwrap();
        assert_eq!(seed.as_bytes()[..4], [0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_seed_rejects_malformed_text() {
        for json in [
            "\"\"",
            "\"deadbeef\"",
            "\"deadbeef0000000000000000000000070\"",
            "\"+eadbeef000000000000000000000007\"",
            "\"zzadbeef000000000000000000000007\"",
            "42",
        ] {
            assert!(serde_json::from_str::<PieceSeed>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_saved_seed_reproduces_sequence() {
        let seed: PieceSeed = rand::rng().random();
        let json = serde_json::to_string(&seed).unwrap();
        let mut original = NextQueue::with_seed(seed);
        let mut reloaded = NextQueue::with_seed(serde_json::from_str(&json).unwrap());
        for _ in 0..3 * PieceKind::LEN {
            assert_eq!(original.pop_next(), reloaded.pop_next());
        }
    }
}
