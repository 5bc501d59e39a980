//! A set of pitches as an 88-bit bitmap split across two 64-bit halves — one
//! for negative (below middle C) pitches, one for non-negative. An empty set
//! is a rest.
//!
//! The cross-half shift `transpose` needs (spec §4.4, §9) is implemented by
//! rebuilding the set pitch-by-pitch after a two-sided boundary check passes
//! "all or nothing": the set is tiny (at most 88 members) so there is no
//! efficiency reason to hand-roll the bit-shift-with-cross-fill the teacher's
//! `core/bits.rs` 14-bit packing uses for its MIDI pitch-bend values, and
//! doing it this way makes the "fails without mutating" guarantee trivial.

use crate::error::{self, LibResult};
use crate::pitch::{Pitch, PITCH_MAX, PITCH_MIN};

/// Bit `j` (0..=38) of `neg` represents pitch `j - 39` (i.e. -39..=-1).
/// Bit `k` (0..=48) of `nonneg` represents pitch `k` (i.e. 0..=48).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct PitchSet {
    neg: u64,
    nonneg: u64,
}

impl PitchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.neg = 0;
        self.nonneg = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.neg == 0 && self.nonneg == 0
    }

    pub fn len(&self) -> u32 {
        self.neg.count_ones() + self.nonneg.count_ones()
    }

    pub fn add(&mut self, p: Pitch) {
        let v = p.get();
        if v < 0 {
            self.neg |= 1u64 << (v + 39);
        } else {
            self.nonneg |= 1u64 << v;
        }
    }

    pub fn drop(&mut self, p: Pitch) {
        let v = p.get();
        if v < 0 {
            self.neg &= !(1u64 << (v + 39));
        } else {
            self.nonneg &= !(1u64 << v);
        }
    }

    pub fn contains(&self, p: Pitch) -> bool {
        let v = p.get();
        if v < 0 {
            self.neg & (1u64 << (v + 39)) != 0
        } else {
            self.nonneg & (1u64 << v) != 0
        }
    }

    /// Lowest present pitch, or `None` if the set is empty.
    pub fn least(&self) -> Option<Pitch> {
        if self.neg != 0 {
            let j = self.neg.trailing_zeros() as i16;
            Some(Pitch::new_unchecked(j - 39))
        } else if self.nonneg != 0 {
            let k = self.nonneg.trailing_zeros() as i16;
            Some(Pitch::new_unchecked(k))
        } else {
            None
        }
    }

    /// Highest present pitch, or `None` if the set is empty.
    pub fn most(&self) -> Option<Pitch> {
        if self.nonneg != 0 {
            let k = 63 - self.nonneg.leading_zeros() as i16;
            Some(Pitch::new_unchecked(k))
        } else if self.neg != 0 {
            let j = 63 - self.neg.leading_zeros() as i16;
            Some(Pitch::new_unchecked(j - 39))
        } else {
            None
        }
    }

    /// Present pitches, ascending.
    pub fn iter_ascending(&self) -> impl Iterator<Item = Pitch> + '_ {
        let mut neg = self.neg;
        let mut nonneg = self.nonneg;
        std::iter::from_fn(move || {
            if neg != 0 {
                let j = neg.trailing_zeros();
                neg &= neg - 1;
                Some(Pitch::new_unchecked(j as i16 - 39))
            } else if nonneg != 0 {
                let k = nonneg.trailing_zeros();
                nonneg &= nonneg - 1;
                Some(Pitch::new_unchecked(k as i16))
            } else {
                None
            }
        })
    }

    /// Shifts every member by `delta` semitones. Fails without mutating
    /// `self` if any member would leave `[-39, +48]`.
    pub fn transpose(&mut self, delta: i32, line: Option<u32>) -> LibResult<()> {
        if delta == 0 || self.is_empty() {
            return Ok(());
        }
        if delta > 0 {
            if let Some(m) = self.most() {
                if m.get() as i32 + delta > PITCH_MAX as i32 {
                    return error::TransRng { line }.fail();
                }
            }
        } else if let Some(l) = self.least() {
            if l.get() as i32 + delta < PITCH_MIN as i32 {
                return error::TransRng { line }.fail();
            }
        }
        let shifted: Vec<i16> = self
            .iter_ascending()
            .map(|p| (p.get() as i32 + delta) as i16)
            .collect();
        self.clear();
        for v in shifted {
            self.add(Pitch::new_unchecked(v));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: i16) -> Pitch {
        Pitch::new_unchecked(v)
    }

    #[test]
    fn empty_set_is_a_rest() {
        let s = PitchSet::new();
        assert!(s.is_empty());
        assert_eq!(s.least(), None);
        assert_eq!(s.most(), None);
    }

    #[test]
    fn add_dedupes_and_orders_ascending() {
        let mut s = PitchSet::new();
        s.add(p(4));
        s.add(p(0));
        s.add(p(7));
        s.add(p(0)); // duplicate
        assert_eq!(s.len(), 3);
        let notes: Vec<i16> = s.iter_ascending().map(|x| x.get()).collect();
        assert_eq!(notes, vec![0, 4, 7]);
    }

    #[test]
    fn drop_then_add_and_add_then_drop_cancel() {
        let mut s = PitchSet::new();
        s.add(p(-5));
        s.drop(p(-5));
        s.add(p(-5));
        assert_eq!(s.len(), 1);
        assert!(s.contains(p(-5)));

        let mut t = PitchSet::new();
        t.add(p(10));
        t.drop(p(10));
        assert!(t.is_empty());
    }

    #[test]
    fn spans_negative_and_nonnegative_halves() {
        let mut s = PitchSet::new();
        s.add(p(-39));
        s.add(p(48));
        assert_eq!(s.least(), Some(p(-39)));
        assert_eq!(s.most(), Some(p(48)));
    }

    #[test]
    fn transpose_up_and_back_is_identity() {
        let mut s = PitchSet::new();
        s.add(p(-3));
        s.add(p(0));
        s.add(p(4));
        let before = s;
        s.transpose(5, None).unwrap();
        s.transpose(-5, None).unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn transpose_out_of_range_does_not_mutate() {
        let mut s = PitchSet::new();
        s.add(p(48));
        let before = s;
        let err = s.transpose(1, Some(3)).unwrap_err();
        assert_eq!(err.kind_name(), "TransRng");
        assert_eq!(s, before);

        let mut t = PitchSet::new();
        t.add(p(-39));
        let before_t = t;
        let err = t.transpose(-1, Some(3)).unwrap_err();
        assert_eq!(err.kind_name(), "TransRng");
        assert_eq!(t, before_t);
    }

    #[test]
    fn transpose_of_empty_set_succeeds() {
        let mut s = PitchSet::new();
        s.transpose(1000, None).unwrap();
        assert!(s.is_empty());
    }
}
