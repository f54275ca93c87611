//! Hierarchical bitset.

use std::fmt;

const WORD_BITS: u32 = 64;

/// A layered bitset.
///
/// Layer 0 holds the data. Bit `i` of layer `L + 1` is set iff word `i` of
/// layer `L` is non-zero. The top layer is always a single word, so finding
/// the next set bit costs one word operation per layer in the common case.
///
/// A second hierarchy summarizes full words: bit `i` of `full[0]` is set
/// iff word `i` of layer 0 is all ones, and bit `i` of `full[L + 1]` iff
/// word `i` of `full[L]` is. It gives [`HiBitSet::next_unset_bit`] the same
/// skipping over dense runs.
///
/// Layers grow on demand and never shrink; equality ignores trailing
/// capacity.
#[derive(Clone)]
pub struct HiBitSet {
    layers: Vec<Vec<u64>>,
    full: Vec<Vec<u64>>,
}

impl HiBitSet {
    /// Create an empty bitset.
    pub fn new() -> Self {
        Self {
            layers: vec![vec![0]],
            full: Vec::new(),
        }
    }

    /// Create an empty bitset with room for bits `0..bits`.
    pub fn with_capacity(bits: u32) -> Self {
        let mut set = Self::new();
        if bits > 0 {
            set.grow(bits - 1);
        }
        set
    }

    /// Number of bits addressable without growing.
    pub fn capacity(&self) -> usize {
        self.layers[0].len() * WORD_BITS as usize
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Whether `bit` is set.
    pub fn is_set(&self, bit: u32) -> bool {
        let (w, b) = split(bit);
        self.layers[0].get(w).is_some_and(|word| word & (1 << b) != 0)
    }

    /// Set `bit`. Returns whether it was previously unset.
    pub fn set(&mut self, bit: u32) -> bool {
        self.grow(bit);
        let mut index = bit;
        for (depth, layer) in self.layers.iter_mut().enumerate() {
            let (w, b) = split(index);
            let before = layer[w];
            layer[w] |= 1 << b;
            if depth == 0 && before == layer[w] {
                return false;
            }
            if before != 0 {
                break;
            }
            index = w as u32;
        }
        let word = split(bit).0;
        if self.layers[0][word] == !0 {
            self.mark_full(word);
        }
        true
    }

    /// Clear `bit`. Returns whether it was previously set.
    pub fn unset(&mut self, bit: u32) -> bool {
        if !self.is_set(bit) {
            return false;
        }
        let word = split(bit).0;
        let was_full = self.layers[0][word] == !0;
        let mut index = bit;
        for layer in &mut self.layers {
            let (w, b) = split(index);
            layer[w] &= !(1 << b);
            if layer[w] != 0 {
                break;
            }
            index = w as u32;
        }
        if was_full {
            self.mark_open(word);
        }
        true
    }

    /// Smallest set bit `>= from`.
    pub fn next_set_bit(&self, from: u32) -> Option<u32> {
        self.next_in(0, from as usize).map(|i| i as u32)
    }

    /// Largest set bit `<= from`.
    pub fn previous_set_bit(&self, from: u32) -> Option<u32> {
        self.previous_in(0, from as usize).map(|i| i as u32)
    }

    /// Smallest unset bit `>= from`.
    ///
    /// Bits past the capacity count as unset. Runs of full words are
    /// skipped through the full-word summaries.
    pub fn next_unset_bit(&self, from: u32) -> u32 {
        let data = &self.layers[0];
        let (w, b) = split(from);
        if w >= data.len() {
            return from;
        }
        let free = !data[w] & (!0u64 << b);
        if free != 0 {
            return w as u32 * WORD_BITS + free.trailing_zeros();
        }
        let word = self.next_open(0, w + 1);
        match data.get(word) {
            Some(bits) => word as u32 * WORD_BITS + (!bits).trailing_zeros(),
            None => word as u32 * WORD_BITS,
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.layers[0].iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.top() == 0
    }

    /// Clear every bit and release the layers.
    pub fn clear(&mut self) {
        self.layers.truncate(1);
        self.layers[0].clear();
        self.layers[0].push(0);
        self.full.clear();
    }

    /// Iterate over set bits in ascending order.
    pub fn iter(&self) -> HiBitSetIter<'_> {
        HiBitSetIter {
            set: self,
            next: Some(0),
        }
    }

    /// Bits set in every one of `sets`.
    ///
    /// Runs one [`HiBitSet::next_set_bit`] cursor per input and advances
    /// them in lock-step, so the cost follows the sparsest input.
    pub fn intersection_of(sets: &[&HiBitSet]) -> HiBitSet {
        let mut out = HiBitSet::new();
        let Some((first, rest)) = sets.split_first() else {
            return out;
        };
        let mut candidate = first.next_set_bit(0);
        'scan: while let Some(bit) = candidate {
            for set in rest {
                match set.next_set_bit(bit) {
                    Some(found) if found == bit => {}
                    Some(found) => {
                        candidate = first.next_set_bit(found);
                        continue 'scan;
                    }
                    None => break 'scan,
                }
            }
            out.set(bit);
            candidate = bit.checked_add(1).and_then(|n| first.next_set_bit(n));
        }
        out
    }

    /// Bits set in any of `sets`.
    pub fn union_of(sets: &[&HiBitSet]) -> HiBitSet {
        let mut out = HiBitSet::new();
        let mut cursors: Vec<Option<u32>> = sets.iter().map(|s| s.next_set_bit(0)).collect();
        while let Some(bit) = cursors.iter().flatten().min().copied() {
            out.set(bit);
            for (cursor, set) in cursors.iter_mut().zip(sets) {
                if *cursor == Some(bit) {
                    *cursor = bit.checked_add(1).and_then(|n| set.next_set_bit(n));
                }
            }
        }
        out
    }

    /// Bits set in `self` or `other`.
    pub fn union(&self, other: &HiBitSet) -> HiBitSet {
        Self::union_of(&[self, other])
    }

    /// Bits set in both `self` and `other`.
    pub fn intersection(&self, other: &HiBitSet) -> HiBitSet {
        Self::intersection_of(&[self, other])
    }

    /// Bits set in `self` but not in `other`.
    pub fn difference(&self, other: &HiBitSet) -> HiBitSet {
        let mut out = HiBitSet::new();
        let mut theirs = other.next_set_bit(0);
        for bit in self.iter() {
            while theirs.is_some_and(|t| t < bit) {
                theirs = other.next_set_bit(bit);
            }
            if theirs != Some(bit) {
                out.set(bit);
            }
        }
        out
    }

    /// In-place union.
    pub fn join(&mut self, other: &HiBitSet) {
        for bit in other.iter() {
            self.set(bit);
        }
    }

    /// In-place intersection.
    pub fn intersect(&mut self, other: &HiBitSet) {
        let gone: Vec<u32> = self.iter().filter(|&b| !other.is_set(b)).collect();
        for bit in gone {
            self.unset(bit);
        }
    }

    /// In-place difference.
    pub fn subtract(&mut self, other: &HiBitSet) {
        for bit in other.iter() {
            self.unset(bit);
        }
    }

    /// Words of level `level` in the full-word hierarchy.
    fn level(&self, level: usize) -> &[u64] {
        match level {
            0 => &self.layers[0],
            _ => &self.full[level - 1],
        }
    }

    /// Smallest word index `>= from` in `level` that is not all ones.
    /// Indices past the level's end count as open.
    fn next_open(&self, level: usize, from: usize) -> usize {
        let words = self.level(level);
        if from >= words.len() || words[from] != !0 {
            return from;
        }
        let Some(summary) = self.full.get(level) else {
            return from + 1;
        };
        let (w, b) = (from / WORD_BITS as usize, from % WORD_BITS as usize);
        let open = !summary[w] & (!0u64 << b);
        if open != 0 {
            return w * WORD_BITS as usize + open.trailing_zeros() as usize;
        }
        let word = self.next_open(level + 1, w + 1);
        match summary.get(word) {
            Some(bits) => word * WORD_BITS as usize + (!bits).trailing_zeros() as usize,
            None => word * WORD_BITS as usize,
        }
    }

    /// Record that layer-0 word `index` became all ones.
    fn mark_full(&mut self, mut index: usize) {
        for summary in &mut self.full {
            let (w, b) = (index / WORD_BITS as usize, index % WORD_BITS as usize);
            summary[w] |= 1 << b;
            if summary[w] != !0 {
                break;
            }
            index = w;
        }
    }

    /// Record that layer-0 word `index` is no longer all ones.
    fn mark_open(&mut self, mut index: usize) {
        for summary in &mut self.full {
            let (w, b) = (index / WORD_BITS as usize, index % WORD_BITS as usize);
            let was_full = summary[w] == !0;
            summary[w] &= !(1 << b);
            if !was_full {
                break;
            }
            index = w;
        }
    }

    fn top(&self) -> u64 {
        self.layers[self.layers.len() - 1][0]
    }

    /// Make `bit` addressable, adding words and layers as needed.
    fn grow(&mut self, bit: u32) {
        let words = split(bit).0 + 1;
        if words <= self.layers[0].len() {
            return;
        }
        self.layers[0].resize(words, 0);
        let mut depth = 0;
        while self.layers[depth].len() > 1 {
            let needed = self.layers[depth].len().div_ceil(WORD_BITS as usize);
            if depth + 1 == self.layers.len() {
                let summary = summarize(&self.layers[depth], |w| w != 0);
                self.layers.push(summary);
                let full = summarize(self.level(depth), |w| w == !0);
                self.full.push(full);
            } else {
                self.layers[depth + 1].resize(needed, 0);
                self.full[depth].resize(needed, 0);
            }
            depth += 1;
        }
    }

    fn next_in(&self, depth: usize, from: usize) -> Option<usize> {
        let layer = &self.layers[depth];
        let (w, b) = (from / WORD_BITS as usize, from % WORD_BITS as usize);
        if w >= layer.len() {
            return None;
        }
        let masked = layer[w] & (!0u64 << b);
        if masked != 0 {
            return Some(w * WORD_BITS as usize + masked.trailing_zeros() as usize);
        }
        if depth + 1 == self.layers.len() {
            return None;
        }
        let word = self.next_in(depth + 1, w + 1)?;
        Some(word * WORD_BITS as usize + layer[word].trailing_zeros() as usize)
    }

    fn previous_in(&self, depth: usize, from: usize) -> Option<usize> {
        let layer = &self.layers[depth];
        let last = layer.len() * WORD_BITS as usize - 1;
        let from = from.min(last);
        let (w, b) = (from / WORD_BITS as usize, from % WORD_BITS as usize);
        let masked = layer[w] & (!0u64 >> (WORD_BITS as usize - 1 - b));
        if masked != 0 {
            return Some(w * WORD_BITS as usize + 63 - masked.leading_zeros() as usize);
        }
        if w == 0 || depth + 1 == self.layers.len() {
            return None;
        }
        let word = self.previous_in(depth + 1, w - 1)?;
        Some(word * WORD_BITS as usize + 63 - layer[word].leading_zeros() as usize)
    }
}

impl Default for HiBitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for HiBitSet {
    fn eq(&self, other: &Self) -> bool {
        trimmed(&self.layers[0]) == trimmed(&other.layers[0])
    }
}

impl Eq for HiBitSet {}

impl FromIterator<u32> for HiBitSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = HiBitSet::new();
        for bit in iter {
            set.set(bit);
        }
        set
    }
}

impl fmt::Debug for HiBitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a HiBitSet {
    type Item = u32;
    type IntoIter = HiBitSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the set bits of a [`HiBitSet`].
pub struct HiBitSetIter<'a> {
    set: &'a HiBitSet,
    next: Option<u32>,
}

impl Iterator for HiBitSetIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let bit = self.set.next_set_bit(self.next?)?;
        self.next = bit.checked_add(1);
        Some(bit)
    }
}

fn split(bit: u32) -> (usize, u32) {
    ((bit / WORD_BITS) as usize, bit % WORD_BITS)
}

/// One bit per word of `layer`, set where `keep` holds.
fn summarize(layer: &[u64], keep: impl Fn(u64) -> bool) -> Vec<u64> {
    let mut out = vec![0u64; layer.len().div_ceil(WORD_BITS as usize)];
    for (i, &word) in layer.iter().enumerate() {
        if keep(word) {
            out[i / WORD_BITS as usize] |= 1 << (i % WORD_BITS as usize);
        }
    }
    out
}

fn trimmed(words: &[u64]) -> &[u64] {
    let end = words.iter().rposition(|&w| w != 0).map_or(0, |i| i + 1);
    &words[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_unset() {
        let mut set = HiBitSet::new();
        assert!(set.set(5));
        assert!(!set.set(5));
        assert!(set.is_set(5));
        assert!(set.unset(5));
        assert!(!set.unset(5));
        assert!(set.is_empty());
    }

    #[test]
    fn grows_layers_for_large_bits() {
        let mut set = HiBitSet::new();
        set.set(3);
        set.set(100_000);
        assert!(set.depth() >= 3);
        assert!(set.is_set(3));
        assert!(set.is_set(100_000));
        assert_eq!(set.next_set_bit(4), Some(100_000));
        assert_eq!(set.previous_set_bit(99_999), Some(3));
    }

    #[test]
    fn upper_layers_track_lower_pages() {
        let mut set = HiBitSet::new();
        set.set(64 * 70 + 1);
        set.set(64 * 70 + 2);
        set.unset(64 * 70 + 1);
        assert!(!set.is_empty(), "page still non-zero");
        set.unset(64 * 70 + 2);
        assert!(set.is_empty());
        assert_eq!(set.next_set_bit(0), None);
    }

    #[test]
    fn next_unset_bit_skips_full_words() {
        let set: HiBitSet = (0..130).collect();
        assert_eq!(set.next_unset_bit(0), 130);
        assert_eq!(set.next_unset_bit(200), 200);
        let gap: HiBitSet = [0u32, 1, 3].into_iter().collect();
        assert_eq!(gap.next_unset_bit(0), 2);
    }

    #[test]
    fn next_unset_bit_crosses_summary_layers() {
        let end = 64 * 64 * 3 + 5;
        let mut set: HiBitSet = (0..end).collect();
        assert!(set.depth() >= 3);
        assert_eq!(set.next_unset_bit(0), end);
        assert_eq!(set.next_unset_bit(end), end);

        set.unset(64 * 64 * 2 + 7);
        assert_eq!(set.next_unset_bit(0), 64 * 64 * 2 + 7);
        assert_eq!(set.next_unset_bit(64 * 64 * 2 + 8), end);
        set.set(64 * 64 * 2 + 7);
        assert_eq!(set.next_unset_bit(0), end);

        set.clear();
        assert_eq!(set.next_unset_bit(0), 0);
    }

    #[test]
    fn full_summary_survives_growth() {
        let mut set: HiBitSet = (0..128).collect();
        set.set(64 * 64 * 70);
        assert_eq!(set.next_unset_bit(0), 128);
        assert_eq!(set.next_unset_bit(64 * 64 * 70), 64 * 64 * 70 + 1);
    }

    #[test]
    fn previous_set_bit_is_inclusive() {
        let set: HiBitSet = [10u32, 70].into_iter().collect();
        assert_eq!(set.previous_set_bit(70), Some(70));
        assert_eq!(set.previous_set_bit(69), Some(10));
        assert_eq!(set.previous_set_bit(9), None);
        assert_eq!(set.previous_set_bit(u32::MAX), Some(70));
    }

    #[test]
    fn equality_ignores_capacity() {
        let mut big = HiBitSet::with_capacity(10_000);
        big.set(7);
        let small: HiBitSet = [7u32].into_iter().collect();
        assert_eq!(big, small);
    }

    #[test]
    fn set_algebra() {
        let a: HiBitSet = [1u32, 2, 3, 500].into_iter().collect();
        let b: HiBitSet = [2u32, 3, 4, 9000].into_iter().collect();
        assert_eq!(a.union(&b).iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 500, 9000]);
        assert_eq!(a.intersection(&b).iter().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(a.difference(&b).iter().collect::<Vec<_>>(), vec![1, 500]);

        let mut c = a.clone();
        c.join(&b);
        assert_eq!(c, a.union(&b));
        let mut d = a.clone();
        d.intersect(&b);
        assert_eq!(d, a.intersection(&b));
        let mut e = a.clone();
        e.subtract(&b);
        assert_eq!(e, a.difference(&b));
    }

    #[test]
    fn intersection_of_many() {
        let a: HiBitSet = (0..100).collect();
        let b: HiBitSet = (0..100).filter(|i| i % 2 == 0).collect();
        let c: HiBitSet = (0..100).filter(|i| i % 3 == 0).collect();
        let got = HiBitSet::intersection_of(&[&a, &b, &c]);
        let want: HiBitSet = (0..100).filter(|i| i % 6 == 0).collect();
        assert_eq!(got, want);
        assert!(HiBitSet::intersection_of(&[]).is_empty());
    }

    #[test]
    fn clear_resets() {
        let mut set: HiBitSet = [1u32, 9999].into_iter().collect();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.depth(), 1);
        assert_eq!(set.count_ones(), 0);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        const UNIVERSE: u32 = 5000;

        fn arb_bits() -> impl Strategy<Value = Vec<u32>> {
            proptest::collection::vec(0..UNIVERSE, 0..120)
        }

        fn arb_set() -> impl Strategy<Value = HiBitSet> {
            arb_bits().prop_map(|bits| bits.into_iter().collect())
        }

        proptest! {
            #[test]
            fn agrees_with_flat_reference(
                ops in proptest::collection::vec((any::<bool>(), 0..UNIVERSE), 1..300)
            ) {
                let mut set = HiBitSet::new();
                let mut flat = vec![false; UNIVERSE as usize];
                for (on, bit) in ops {
                    if on { set.set(bit); } else { set.unset(bit); }
                    flat[bit as usize] = on;
                }
                for bit in 0..UNIVERSE {
                    prop_assert_eq!(set.is_set(bit), flat[bit as usize]);
                }
                prop_assert_eq!(set.count_ones(), flat.iter().filter(|&&b| b).count());
                prop_assert_eq!(set.is_empty(), !flat.contains(&true));
            }

            #[test]
            fn next_set_bit_matches_linear_scan(bits in arb_bits(), from in 0..UNIVERSE) {
                let set: HiBitSet = bits.iter().copied().collect();
                let expected = (from..UNIVERSE).find(|&b| bits.contains(&b));
                prop_assert_eq!(set.next_set_bit(from), expected);
                let expected_prev = (0..=from).rev().find(|&b| bits.contains(&b));
                prop_assert_eq!(set.previous_set_bit(from), expected_prev);
            }

            #[test]
            fn next_unset_bit_matches_linear_scan(
                runs in proptest::collection::vec((0..UNIVERSE, 0u32..400), 1..12),
                holes in proptest::collection::vec(0..UNIVERSE, 0..12),
                from in 0..UNIVERSE,
            ) {
                let mut set = HiBitSet::new();
                for (start, len) in runs {
                    for bit in start..start + len {
                        set.set(bit);
                    }
                }
                for bit in holes {
                    set.unset(bit);
                }
                let expected = (from..).find(|&b| !set.is_set(b)).unwrap();
                prop_assert_eq!(set.next_unset_bit(from), expected);
            }

            #[test]
            fn union_commutes_and_associates(a in arb_set(), b in arb_set(), c in arb_set()) {
                prop_assert_eq!(a.union(&b), b.union(&a));
                prop_assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
            }

            #[test]
            fn intersection_commutes_and_associates(a in arb_set(), b in arb_set(), c in arb_set()) {
                prop_assert_eq!(a.intersection(&b), b.intersection(&a));
                prop_assert_eq!(
                    a.intersection(&b).intersection(&c),
                    a.intersection(&b.intersection(&c))
                );
            }

            #[test]
            fn self_intersection_and_difference(a in arb_set()) {
                prop_assert_eq!(a.intersection(&a), a.clone());
                prop_assert!(a.difference(&a).is_empty());
            }

            #[test]
            fn difference_excludes_other(a in arb_set(), b in arb_set()) {
                let d = a.difference(&b);
                for bit in d.iter() {
                    prop_assert!(a.is_set(bit) && !b.is_set(bit));
                }
                prop_assert_eq!(d.union(&a.intersection(&b)), a);
            }
        }
    }
}
