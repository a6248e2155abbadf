//! The interval lattice and its extended-integer bounds.
//!
//! [`Bound`] extends `i64` with a negative and a positive infinity;
//! [`Interval`] is either `Bottom` (no possible value) or a closed range
//! between two bounds. Top is the range `[-inf, +inf]`, not a separate
//! variant. Widening and narrowing make fixpoint iteration terminate on
//! this infinite-height lattice.

use std::fmt;

/// An interval endpoint: an integer extended with two infinities.
///
/// The derived `Ord` is the lattice order: `NegInf` is the unique minimum,
/// `PosInf` the unique maximum, finite values compare by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    NegInf,
    Int(i64),
    PosInf,
}

impl Bound {
    /// Extended multiplication.
    ///
    /// Infinities multiply by the rule of signs, and multiplying any
    /// infinity by zero collapses to zero. Finite overflow wraps: the
    /// bounded representation is an accepted limitation of the domain.
    pub fn mul(self, other: Bound) -> Bound {
        use Bound::*;
        match (self, other) {
            (Int(a), Int(b)) => Int(a.wrapping_mul(b)),
            (Int(0), _) | (_, Int(0)) => Int(0),
            (NegInf, NegInf) | (PosInf, PosInf) => PosInf,
            (NegInf, PosInf) | (PosInf, NegInf) => NegInf,
            (PosInf, Int(v)) | (Int(v), PosInf) => {
                if v > 0 {
                    PosInf
                } else {
                    NegInf
                }
            }
            (NegInf, Int(v)) | (Int(v), NegInf) => {
                if v > 0 {
                    NegInf
                } else {
                    PosInf
                }
            }
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => f.write_str("-inf"),
            Bound::PosInf => f.write_str("+inf"),
            Bound::Int(v) => write!(f, "{v:+}"),
        }
    }
}

/// An abstract integer value: the empty set, or a closed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Bottom,
    Range { lo: Bound, hi: Bound },
}

impl Interval {
    /// The range covering every integer.
    pub const TOP: Interval = Interval::Range {
        lo: Bound::NegInf,
        hi: Bound::PosInf,
    };

    /// The only way to build a non-bottom interval.
    ///
    /// # Panics
    ///
    /// Panics when `lo > hi`. Producing such a range is a caller
    /// programming error and aborting beats computing with an unsound
    /// value.
    pub fn range(lo: Bound, hi: Bound) -> Interval {
        assert!(lo <= hi, "malformed interval: [{lo}, {hi}]");
        Interval::Range { lo, hi }
    }

    /// The singleton interval `[v, v]`.
    pub fn singleton(v: i64) -> Interval {
        Interval::Range {
            lo: Bound::Int(v),
            hi: Bound::Int(v),
        }
    }

    pub fn is_bottom(self) -> bool {
        self == Interval::Bottom
    }

    /// Whether the finite value `v` is abstracted by this interval.
    pub fn contains(self, v: i64) -> bool {
        match self {
            Interval::Bottom => false,
            Interval::Range { lo, hi } => lo <= Bound::Int(v) && Bound::Int(v) <= hi,
        }
    }

    /// The lattice order: `self` is subsumed by `other`.
    pub fn le(self, other: Interval) -> bool {
        match (self, other) {
            (Interval::Bottom, _) => true,
            (Interval::Range { .. }, Interval::Bottom) => false,
            (Interval::Range { lo: l1, hi: h1 }, Interval::Range { lo: l2, hi: h2 }) => {
                l2 <= l1 && h1 <= h2
            }
        }
    }

    /// Least upper bound. Returns the subsuming operand unchanged when one
    /// side already covers the other.
    pub fn join(self, other: Interval) -> Interval {
        if self.le(other) {
            other
        } else if other.le(self) {
            self
        } else {
            // Both are ranges here: Bottom is subsumed by everything.
            let (Interval::Range { lo: l1, hi: h1 }, Interval::Range { lo: l2, hi: h2 }) =
                (self, other)
            else {
                unreachable!("incomparable intervals are both ranges")
            };
            Interval::range(l1.min(l2), h1.max(h2))
        }
    }

    /// Widening: a bound that grew jumps straight to its infinity.
    ///
    /// Each bound is touched at most once before becoming infinite, which
    /// bounds the ascending phase of the solver.
    pub fn widen(self, other: Interval) -> Interval {
        match (self, other) {
            (Interval::Bottom, o) => o,
            (s, Interval::Bottom) => s,
            (Interval::Range { lo: l1, hi: h1 }, Interval::Range { lo: l2, hi: h2 }) => {
                let lo = if l2 < l1 { Bound::NegInf } else { l1 };
                let hi = if h1 < h2 { Bound::PosInf } else { h1 };
                Interval::range(lo, hi)
            }
        }
    }

    /// Narrowing: replaces only infinite bounds of `self` with `other`'s.
    ///
    /// Intended for `other` at least as precise as `self`; never widens a
    /// bound that was already finite.
    pub fn narrow(self, other: Interval) -> Interval {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: l1, hi: h1 }, Interval::Range { lo: l2, hi: h2 }) => {
                let lo = if l1 == Bound::NegInf { l2 } else { l1 };
                let hi = if h1 == Bound::PosInf { h2 } else { h1 };
                Interval::range(lo, hi)
            }
        }
    }

    /// Abstract addition, bound-wise.
    pub fn add(self, other: Interval) -> Interval {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: l1, hi: h1 }, Interval::Range { lo: l2, hi: h2 }) => {
                use Bound::*;
                let lo = match (l1, l2) {
                    (NegInf, _) | (_, NegInf) => NegInf,
                    (Int(a), Int(b)) => Int(a.wrapping_add(b)),
                    (PosInf, _) | (_, PosInf) => PosInf,
                };
                let hi = match (h1, h2) {
                    (PosInf, _) | (_, PosInf) => PosInf,
                    (Int(a), Int(b)) => Int(a.wrapping_add(b)),
                    (NegInf, _) | (_, NegInf) => NegInf,
                };
                Interval::range(lo, hi)
            }
        }
    }

    /// Abstract subtraction: `[l1 - h2, h1 - l2]` with infinities absorbing.
    pub fn sub(self, other: Interval) -> Interval {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: l1, hi: h1 }, Interval::Range { lo: l2, hi: h2 }) => {
                use Bound::*;
                let lo = match (l1, h2) {
                    (NegInf, _) | (_, PosInf) => NegInf,
                    (Int(a), Int(b)) => Int(a.wrapping_sub(b)),
                    (PosInf, _) | (_, NegInf) => PosInf,
                };
                let hi = match (h1, l2) {
                    (PosInf, _) | (_, NegInf) => PosInf,
                    (Int(a), Int(b)) => Int(a.wrapping_sub(b)),
                    (NegInf, _) | (_, PosInf) => NegInf,
                };
                Interval::range(lo, hi)
            }
        }
    }

    /// Abstract multiplication: min/max of the four endpoint products.
    pub fn mul(self, other: Interval) -> Interval {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: l1, hi: h1 }, Interval::Range { lo: l2, hi: h2 }) => {
                let products = [l1.mul(l2), l1.mul(h2), h1.mul(l2), h1.mul(h2)];
                let lo = products.iter().copied().min().unwrap_or(Bound::NegInf);
                let hi = products.iter().copied().max().unwrap_or(Bound::PosInf);
                Interval::range(lo, hi)
            }
        }
    }

    /// Abstract signed less-than, producing a boolean-valued interval:
    /// `[1, 1]` when definitely true, `[0, 0]` when definitely false, and
    /// top when the abstraction cannot decide.
    pub fn lt_signed(self, other: Interval) -> Interval {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: l1, hi: h1 }, Interval::Range { lo: l2, hi: h2 }) => {
                if h1 < l2 {
                    Interval::singleton(1)
                } else if h2 < l1 {
                    Interval::singleton(0)
                } else {
                    Interval::TOP
                }
            }
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Bottom => f.write_str("Bot"),
            Interval::Range { lo, hi } => write!(f, "[{lo}, {hi}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Bound::{Int, NegInf, PosInf};

    #[test]
    fn bound_order_is_total() {
        assert!(NegInf < Int(i64::MIN));
        assert!(Int(i64::MAX) < PosInf);
        assert!(Int(-3) < Int(4));
        assert!(NegInf < PosInf);
    }

    #[test]
    fn bound_mul_signs() {
        assert_eq!(PosInf.mul(PosInf), PosInf);
        assert_eq!(PosInf.mul(NegInf), NegInf);
        assert_eq!(NegInf.mul(NegInf), PosInf);
        assert_eq!(PosInf.mul(Int(3)), PosInf);
        assert_eq!(PosInf.mul(Int(-3)), NegInf);
        assert_eq!(NegInf.mul(Int(2)), NegInf);
        assert_eq!(NegInf.mul(Int(-2)), PosInf);
        assert_eq!(Int(6).mul(Int(-7)), Int(-42));
    }

    #[test]
    fn bound_mul_zero_collapses_infinity() {
        assert_eq!(PosInf.mul(Int(0)), Int(0));
        assert_eq!(Int(0).mul(NegInf), Int(0));
    }

    #[test]
    #[should_panic(expected = "malformed interval")]
    fn inverted_range_panics() {
        let _ = Interval::range(Int(3), Int(1));
    }

    #[test]
    fn order_bottom_below_everything() {
        assert!(Interval::Bottom.le(Interval::Bottom));
        assert!(Interval::Bottom.le(Interval::singleton(0)));
        assert!(!Interval::singleton(0).le(Interval::Bottom));
    }

    #[test]
    fn order_is_containment() {
        let narrow = Interval::range(Int(1), Int(3));
        let wide = Interval::range(Int(0), Int(5));
        assert!(narrow.le(wide));
        assert!(!wide.le(narrow));
        assert!(wide.le(Interval::TOP));
    }

    #[test]
    fn join_returns_subsuming_operand() {
        let narrow = Interval::range(Int(1), Int(3));
        let wide = Interval::range(Int(0), Int(5));
        assert_eq!(narrow.join(wide), wide);
        assert_eq!(wide.join(narrow), wide);
        assert_eq!(Interval::Bottom.join(narrow), narrow);
    }

    #[test]
    fn join_of_disjoint_spans_both() {
        let a = Interval::range(Int(1), Int(2));
        let b = Interval::range(Int(5), Int(9));
        assert_eq!(a.join(b), Interval::range(Int(1), Int(9)));
    }

    #[test]
    fn widen_jumps_to_infinity() {
        let a = Interval::range(Int(0), Int(1));
        let grown = Interval::range(Int(0), Int(2));
        assert_eq!(a.widen(grown), Interval::range(Int(0), PosInf));
        let shrunk_lo = Interval::range(Int(-1), Int(1));
        assert_eq!(a.widen(shrunk_lo), Interval::range(NegInf, Int(1)));
        // Stable bounds stay put.
        assert_eq!(a.widen(a), a);
    }

    #[test]
    fn widen_bottom_is_identity() {
        let a = Interval::range(Int(0), Int(1));
        assert_eq!(Interval::Bottom.widen(a), a);
        assert_eq!(a.widen(Interval::Bottom), a);
    }

    #[test]
    fn narrow_replaces_only_infinite_bounds() {
        let widened = Interval::range(Int(0), PosInf);
        let candidate = Interval::range(Int(0), Int(10));
        assert_eq!(widened.narrow(candidate), candidate);
        // A finite bound is never replaced.
        let finite = Interval::range(Int(0), Int(20));
        assert_eq!(finite.narrow(candidate), finite);
        assert_eq!(Interval::Bottom.narrow(candidate), Interval::Bottom);
    }

    #[test]
    fn add_saturates_at_infinity() {
        let a = Interval::range(NegInf, Int(3));
        let b = Interval::range(Int(1), Int(2));
        assert_eq!(a.add(b), Interval::range(NegInf, Int(5)));
        assert_eq!(
            Interval::singleton(3).add(Interval::singleton(4)),
            Interval::singleton(7)
        );
        assert_eq!(Interval::Bottom.add(b), Interval::Bottom);
    }

    #[test]
    fn sub_crosses_bounds() {
        let a = Interval::range(Int(0), Int(10));
        let b = Interval::range(Int(3), Int(4));
        assert_eq!(a.sub(b), Interval::range(Int(-4), Int(7)));
        let unbounded = Interval::range(Int(0), PosInf);
        assert_eq!(a.sub(unbounded), Interval::range(NegInf, Int(10)));
    }

    #[test]
    fn mul_takes_extreme_products() {
        let a = Interval::range(Int(-2), Int(3));
        let b = Interval::range(Int(4), Int(5));
        assert_eq!(a.mul(b), Interval::range(Int(-10), Int(15)));
        let half = Interval::range(Int(2), PosInf);
        assert_eq!(a.mul(half), Interval::range(NegInf, PosInf));
    }

    #[test]
    fn lt_signed_decides_separated_ranges() {
        let lo = Interval::range(Int(0), Int(3));
        let hi = Interval::range(Int(5), Int(9));
        assert_eq!(lo.lt_signed(hi), Interval::singleton(1));
        assert_eq!(hi.lt_signed(lo), Interval::singleton(0));
        let overlap = Interval::range(Int(2), Int(6));
        assert_eq!(lo.lt_signed(overlap), Interval::TOP);
    }

    #[test]
    fn render_matches_report_format() {
        assert_eq!(Interval::Bottom.to_string(), "Bot");
        assert_eq!(Interval::TOP.to_string(), "[-inf, +inf]");
        assert_eq!(Interval::range(Int(-4), Int(7)).to_string(), "[-4, +7]");
    }
}
