//! Abstract memory state: variable bindings lifted over the interval lattice.

use crate::lattice::Interval;
use indexmap::IndexMap;

/// A mapping from variable name to interval.
///
/// The absence of a key *is* the binding `Bottom`; [`get`] is total and
/// [`set`] keeps that canonical by removing bindings set to `Bottom`. All
/// lattice operations are lifted point-wise over the union of bound names.
///
/// [`get`]: AbstractState::get
/// [`set`]: AbstractState::set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AbstractState {
    bindings: IndexMap<String, Interval>,
}

impl AbstractState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The interval bound to `name`; `Bottom` when unbound.
    pub fn get(&self, name: &str) -> Interval {
        self.bindings
            .get(name)
            .copied()
            .unwrap_or(Interval::Bottom)
    }

    /// Bind `name`, overwriting any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: Interval) {
        let name = name.into();
        if value.is_bottom() {
            self.bindings.shift_remove(&name);
        } else {
            self.bindings.insert(name, value);
        }
    }

    /// Bindings in first-bound order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Interval)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Point-wise lattice order: every binding of `self` is subsumed by
    /// `other`'s binding for the same name.
    pub fn le(&self, other: &AbstractState) -> bool {
        self.bindings
            .iter()
            .all(|(name, iv)| iv.le(other.get(name)))
    }

    pub fn join(&self, other: &AbstractState) -> AbstractState {
        self.pointwise(other, Interval::join)
    }

    pub fn widen(&self, other: &AbstractState) -> AbstractState {
        self.pointwise(other, Interval::widen)
    }

    pub fn narrow(&self, other: &AbstractState) -> AbstractState {
        self.pointwise(other, Interval::narrow)
    }

    fn pointwise(&self, other: &AbstractState, op: fn(Interval, Interval) -> Interval) -> Self {
        let mut out = AbstractState::new();
        for (name, iv) in self.iter() {
            out.set(name, op(iv, other.get(name)));
        }
        for (name, iv) in other.iter() {
            if !self.bindings.contains_key(name) {
                out.set(name, op(Interval::Bottom, iv));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Bound::{Int, PosInf};

    #[test]
    fn get_defaults_to_bottom() {
        let s = AbstractState::new();
        assert_eq!(s.get("x"), Interval::Bottom);
    }

    #[test]
    fn set_bottom_unbinds() {
        let mut s = AbstractState::new();
        s.set("x", Interval::singleton(1));
        s.set("x", Interval::Bottom);
        assert!(s.is_empty());
        // Equality sees the unbound and never-bound forms as the same state.
        assert_eq!(s, AbstractState::new());
    }

    #[test]
    fn join_takes_key_union() {
        let mut a = AbstractState::new();
        a.set("x", Interval::singleton(1));
        a.set("y", Interval::singleton(2));
        let mut b = AbstractState::new();
        b.set("x", Interval::singleton(5));
        b.set("z", Interval::singleton(3));

        let j = a.join(&b);
        assert_eq!(j.get("x"), Interval::range(Int(1), Int(5)));
        assert_eq!(j.get("y"), Interval::singleton(2));
        assert_eq!(j.get("z"), Interval::singleton(3));
    }

    #[test]
    fn le_treats_missing_as_bottom() {
        let mut small = AbstractState::new();
        small.set("x", Interval::singleton(1));
        let mut big = AbstractState::new();
        big.set("x", Interval::range(Int(0), Int(5)));
        big.set("y", Interval::TOP);

        assert!(small.le(&big));
        assert!(!big.le(&small));
        assert!(AbstractState::new().le(&small));
    }

    #[test]
    fn widen_is_pointwise() {
        let mut old = AbstractState::new();
        old.set("i", Interval::range(Int(0), Int(0)));
        let mut new = AbstractState::new();
        new.set("i", Interval::range(Int(0), Int(1)));
        new.set("j", Interval::singleton(7));

        let w = old.widen(&new);
        assert_eq!(w.get("i"), Interval::range(Int(0), PosInf));
        // Fresh bindings come through unchanged.
        assert_eq!(w.get("j"), Interval::singleton(7));
    }

    #[test]
    fn narrow_drops_bindings_missing_on_the_left() {
        let mut old = AbstractState::new();
        old.set("i", Interval::range(Int(0), PosInf));
        let mut cand = AbstractState::new();
        cand.set("i", Interval::range(Int(0), Int(9)));
        cand.set("ghost", Interval::singleton(1));

        let n = old.narrow(&cand);
        assert_eq!(n.get("i"), Interval::range(Int(0), Int(9)));
        // narrow(Bottom, _) is Bottom: the spurious key stays unbound.
        assert_eq!(n.get("ghost"), Interval::Bottom);
    }
}
