//! The [`KindMask`] query key.
//!
//! A query constrains entities by two masks over component identities: one
//! for components, one for tags. The query cache buckets masks by
//! [`KindMask::rank`], keeps each bucket sorted by the masks' raw bits, and
//! reuses a cached result when its mask is a submask of the request.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::id::ComponentId;

const WORD_BITS: u32 = u64::BITS;

/// Bitmask over component identities, read as one wide unsigned integer.
///
/// Bit `n` is set when `ComponentId(n)` is in the mask. The word list never
/// ends in a zero word, so equal masks have equal representations. Up to
/// 128 kinds fit inline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KindMask {
    words: SmallVec<[u64; 2]>,
}

impl KindMask {
    /// An empty mask.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bit for `kind`. Returns `false` if it was already set.
    pub fn insert(&mut self, kind: ComponentId) -> bool {
        let (word, bit) = locate(kind);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_clear = self.words[word] & bit == 0;
        self.words[word] |= bit;
        was_clear
    }

    /// Whether the bit for `kind` is set.
    pub fn contains(&self, kind: ComponentId) -> bool {
        let (word, bit) = locate(kind);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    /// Number of kinds in the mask.
    pub fn rank(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether every bit of `self` is also set in `other`.
    pub fn is_submask_of(&self, other: &Self) -> bool {
        self.words.len() <= other.words.len()
            && self.words.iter().zip(&other.words).all(|(a, b)| a & !b == 0)
    }

    /// The mask words, least significant first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Kinds in the mask, ascending.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let base = i as u32 * WORD_BITS;
            set_bits(word).map(move |bit| ComponentId(base + bit))
        })
    }
}

fn locate(kind: ComponentId) -> (usize, u64) {
    ((kind.0 / WORD_BITS) as usize, 1u64 << (kind.0 % WORD_BITS))
}

fn set_bits(mut word: u64) -> impl Iterator<Item = u32> {
    std::iter::from_fn(move || {
        (word != 0).then(|| {
            let bit = word.trailing_zeros();
            word &= word - 1;
            bit
        })
    })
}

impl Ord for KindMask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words
            .len()
            .cmp(&other.words.len())
            .then_with(|| self.words.iter().rev().cmp(other.words.iter().rev()))
    }
}

impl PartialOrd for KindMask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromIterator<ComponentId> for KindMask {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut mask = Self::new();
        for kind in iter {
            mask.insert(kind);
        }
        mask
    }
}
