//! A generic discrete probability monad.
//!
//! [`ProbDist`] represents a finite distribution as a canonical, duplicate-free mapping from item
//! to probability. Canonical ordering and duplicate merging fall out of using a [`BTreeMap`] as
//! the backing store: items need only implement [`Ord`], and any total order suffices (it need
//! not be semantically meaningful).
//!
//! The probability type itself is generic over [`Prob`], so the same monad serves both exact
//! rational arithmetic (bit-reproducible, used by the test suite) and `f64` (faster, needs
//! non-zero tolerances).

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::{Error, Result};

/// The numeric backend a [`ProbDist`] is parameterized over.
///
/// Implemented for `f64` (fast, approximate) and [`BigRational`] (exact, slow). A given
/// `ProbDist`/`GameStateDist`/`OddsCalculator` instantiation is fixed to one backend; the two are
/// never mixed within a single calculation.
pub trait Prob:
    Clone
    + PartialEq
    + PartialOrd
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Build the exact value `num / den`.
    fn from_ratio(num: i64, den: i64) -> Self;

    /// Convert to `f64` for display and tolerance comparisons.
    fn to_f64(&self) -> f64;

    /// Whether this value is negative (used by the probability-invariant check).
    fn is_negative(&self) -> bool {
        *self < Self::zero()
    }
}

impl Prob for f64 {
    fn from_ratio(num: i64, den: i64) -> Self {
        num as f64 / den as f64
    }

    fn to_f64(&self) -> f64 {
        *self
    }
}

impl Prob for BigRational {
    fn from_ratio(num: i64, den: i64) -> Self {
        BigRational::new(BigInt::from(num), BigInt::from(den))
    }

    fn to_f64(&self) -> f64 {
        ToPrimitive::to_f64(self).unwrap_or(f64::NAN)
    }
}

/// Engine-scoped tolerance knobs.
///
/// These are plain fields carried by every [`ProbDist`], not process-wide statics — concurrent
/// callers and tests never share hidden global state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Upper bound on `|Σp − 1|` before a distribution is rejected as ill-formed. Default `0.0`
    /// (exact). Must be non-zero when using the `f64` backend.
    pub space: f64,
    /// Lower cutoff below which a `bind` branch is pruned rather than expanded. Default `0.0`
    /// (no pruning).
    pub event: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances { space: 0.0, event: 0.0 }
    }
}

impl Tolerances {
    /// Exact tolerances (both zero) — the default used by the test suite.
    pub const fn exact() -> Self {
        Tolerances { space: 0.0, event: 0.0 }
    }
}

/// A finite discrete probability distribution over items of type `T`, weighted by `P`.
#[derive(Debug, Clone)]
pub struct ProbDist<T: Ord + Clone, P: Prob> {
    items: BTreeMap<T, P>,
    tol: Tolerances,
}

impl<T: Ord + Clone, P: Prob> PartialEq for ProbDist<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

fn mass_of<T: Ord + Clone, P: Prob>(items: &BTreeMap<T, P>) -> P {
    items.values().cloned().fold(P::zero(), |acc, p| acc + p)
}

fn check_mass<T: Ord + Clone, P: Prob>(items: &BTreeMap<T, P>, tol: &Tolerances) -> Result<()> {
    for p in items.values() {
        if p.is_negative() {
            log::error!("prob: negative probability {}", p.to_f64());
            return Err(Error::ProbabilityInvariant { mass: p.to_f64() });
        }
    }
    let total = mass_of(items).to_f64();
    if (total - 1.0).abs() > tol.space {
        log::error!("prob: mass {} deviates from 1 beyond tolerance {}", total, tol.space);
        return Err(Error::ProbabilityInvariant { mass: total });
    }
    Ok(())
}

impl<T: Ord + Clone, P: Prob> ProbDist<T, P> {
    /// Build a distribution from raw `(item, probability)` pairs, merging duplicate items and
    /// checking the mass-closure invariant against `tol`.
    pub fn new(raw: Vec<(T, P)>, tol: Tolerances) -> Result<Self> {
        let mut items: BTreeMap<T, P> = BTreeMap::new();
        for (item, p) in raw {
            let entry = items.entry(item).or_insert_with(P::zero);
            *entry = entry.clone() + p;
        }
        check_mass(&items, &tol)?;
        Ok(ProbDist { items, tol })
    }

    /// `inject(x)`: the singleton distribution certain on `x`.
    pub fn inject(item: T, tol: Tolerances) -> Self {
        let mut items = BTreeMap::new();
        items.insert(item, P::one());
        ProbDist { items, tol }
    }

    /// The tolerances this distribution (and anything derived from it) was built with.
    pub fn tolerances(&self) -> Tolerances {
        self.tol
    }

    /// Iterate over `(item, probability)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &P)> {
        self.items.iter()
    }

    /// The number of distinct items in this distribution.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this distribution has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `bind(f)`: replace each item with a sub-distribution and flatten, multiplying
    /// probabilities through. Branches below `tol.event` are pruned before `f` is even called.
    pub fn bind<U, F>(&self, f: F) -> Result<ProbDist<U, P>>
    where
        U: Ord + Clone,
        F: Fn(&T) -> Result<ProbDist<U, P>>,
    {
        let mut raw: Vec<(U, P)> = Vec::new();
        for (item, p) in &self.items {
            if p.to_f64() < self.tol.event {
                log::trace!("prob: pruned branch with mass {}", p.to_f64());
                continue;
            }
            let sub = f(item)?;
            for (u, q) in sub.items {
                raw.push((u, p.clone() * q));
            }
        }
        ProbDist::new(raw, self.tol)
    }

    /// `map(g)`: apply a total function to every item and re-merge. Unlike `bind`, `map` can
    /// never drop or create probability mass, so no branch is pruned and no mass-closure check
    /// can fail.
    pub fn map<U, F>(&self, f: F) -> ProbDist<U, P>
    where
        U: Ord + Clone,
        F: Fn(&T) -> U,
    {
        let mut items: BTreeMap<U, P> = BTreeMap::new();
        for (item, p) in &self.items {
            let entry = items.entry(f(item)).or_insert_with(P::zero);
            *entry = entry.clone() + p.clone();
        }
        ProbDist { items, tol: self.tol }
    }

    /// Condition this distribution on `pred`, returning the matched mass and, if any event
    /// matched, the renormalized conditional distribution.
    pub fn given<F>(&self, pred: F) -> (P, Option<ProbDist<T, P>>)
    where
        F: Fn(&T) -> bool,
    {
        let matched: BTreeMap<T, P> = self
            .items
            .iter()
            .filter(|(item, _)| pred(item))
            .map(|(item, p)| (item.clone(), p.clone()))
            .collect();
        if matched.is_empty() {
            return (P::zero(), None);
        }
        let mass = mass_of(&matched);
        let items: BTreeMap<T, P> = matched
            .into_iter()
            .map(|(item, p)| (item, p / mass.clone()))
            .collect();
        (mass, Some(ProbDist { items, tol: self.tol }))
    }

    /// `filter(pred)` ≡ `given(pred).1`: the conditional distribution alone, discarding its mass.
    pub fn filter<F>(&self, pred: F) -> Option<ProbDist<T, P>>
    where
        F: Fn(&T) -> bool,
    {
        self.given(pred).1
    }

    /// The expectation of `g` under this distribution: `Σ g(x)·p`.
    pub fn expect<F>(&self, g: F) -> P
    where
        F: Fn(&T) -> P,
    {
        self.items.iter().fold(P::zero(), |acc, (item, p)| acc + g(item) * p.clone())
    }
}

impl<T: Ord + Clone, P: Prob> fmt::Display for ProbDist<T, P>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (item, p) in &self.items {
            writeln!(f, "{:.8} {:?}", p.to_f64(), item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64, d: i64) -> BigRational {
        BigRational::from_ratio(n, d)
    }

    fn f(i: i64) -> Result<ProbDist<i64, BigRational>> {
        ProbDist::new(vec![(i, r(1, 2)), (i * 2, r(1, 2))], Tolerances::exact())
    }

    #[test]
    fn bind_chain_matches_original_assertion() {
        let d = ProbDist::inject(1i64, Tolerances::exact())
            .bind(f)
            .unwrap()
            .bind(f)
            .unwrap()
            .bind(f)
            .unwrap();
        let got: Vec<(i64, BigRational)> = d.iter().map(|(i, p)| (*i, p.clone())).collect();
        assert_eq!(
            got,
            vec![(1, r(1, 8)), (2, r(3, 8)), (4, r(3, 8)), (8, r(1, 8))]
        );
    }

    #[test]
    fn inject_bind_left_identity() {
        let d = ProbDist::inject(3i64, Tolerances::exact()).bind(f).unwrap();
        let expected = f(3).unwrap();
        assert_eq!(d, expected);
    }

    #[test]
    fn bind_inject_right_identity() {
        let d = f(5).unwrap();
        let bound = d.bind(|x| Ok(ProbDist::inject(*x, Tolerances::exact()))).unwrap();
        assert_eq!(d, bound);
    }

    #[test]
    fn bind_is_associative() {
        let d = f(2).unwrap();
        let lhs = d.bind(f).unwrap().bind(f).unwrap();
        let rhs = d.bind(|x| f(*x).unwrap().bind(f)).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn expect_of_constant_one_is_one() {
        let d = f(4).unwrap();
        assert_eq!(d.expect(|_| r(1, 1)), r(1, 1));
    }

    #[test]
    fn negative_probability_is_rejected() {
        let err = ProbDist::new(vec![(1i64, r(-1, 2)), (2, r(3, 2))], Tolerances::exact());
        assert!(matches!(err, Err(Error::ProbabilityInvariant { .. })));
    }

    #[test]
    fn mass_off_by_more_than_tolerance_is_rejected() {
        let err = ProbDist::new(vec![(1i64, r(1, 2))], Tolerances::exact());
        assert!(matches!(err, Err(Error::ProbabilityInvariant { .. })));
    }

    #[test]
    fn mass_within_tolerance_is_accepted() {
        let tol = Tolerances { space: 0.1, event: 0.0 };
        assert!(ProbDist::new(vec![(1i64, 0.95_f64)], tol).is_ok());
    }

    #[test]
    fn given_renormalizes_and_reports_mass() {
        let d = f(1).unwrap();
        let (mass, cond) = d.given(|x| *x == 2);
        assert_eq!(mass, r(1, 2));
        let cond = cond.unwrap();
        assert_eq!(cond.iter().next(), Some((&2, &r(1, 1))));
    }

    #[test]
    fn given_with_no_matches_is_none() {
        let d = f(1).unwrap();
        let (mass, cond) = d.given(|x| *x == 999);
        assert_eq!(mass, r(0, 1));
        assert!(cond.is_none());
    }

    #[test]
    fn bind_prunes_branches_below_event_tolerance() {
        let tol = Tolerances { space: 0.25, event: 0.3 };
        let d = ProbDist::new(vec![(1i64, 0.2_f64), (2, 0.8_f64)], tol).unwrap();
        let out = d.bind(|x| ProbDist::new(vec![(*x, 1.0_f64)], tol)).unwrap();
        // The 0.2-mass branch for item 1 is pruned; only item 2 survives.
        assert_eq!(out.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![2]);
    }
}
