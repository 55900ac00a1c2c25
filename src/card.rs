//! Deck models: closed counting-model variants feeding card draws into the hand and game layers.
//!
//! [`CardState`] is a closed, tagged union of the three counting models this engine supports. Each
//! variant is immutable; `draw`/`draw_specific` return fresh successor states alongside their
//! transition probabilities, never mutating `self`.

use crate::error::{Error, Result};
use crate::prob::{Prob, ProbDist, Tolerances};
use crate::types::{Rank, ACE, RANKS, TEN};

/// State of the cards, either a perfect counter's view or a coarser approximation. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CardState {
    /// Doesn't count any cards; every draw sees the fixed single-deck prior.
    Null,
    /// Tracks the exact count drawn of every one of the ten faces.
    Total(TotalState),
    /// Tracks only four aggregate bucket counts: Tens, Aces, Low (2-5), High (6-9).
    PartialAjhl(PartialState),
}

/// Backing state for [`CardState::Total`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TotalState {
    decks: u32,
    /// Count already drawn of each face, indexed by [`Rank`].
    state: [u32; 10],
}

/// Backing state for [`CardState::PartialAjhl`]. Bucket order: Tens, Aces, Low, High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartialState {
    decks: u32,
    state: [u32; 4],
}

const BUCKET_TENS: usize = 0;
const BUCKET_ACES: usize = 1;
const BUCKET_LOW: usize = 2;
const BUCKET_HIGH: usize = 3;

fn bucket_of(rank: Rank) -> usize {
    match rank {
        TEN => BUCKET_TENS,
        ACE => BUCKET_ACES,
        2..=5 => BUCKET_LOW,
        6..=9 => BUCKET_HIGH,
        _ => unreachable!("rank out of range: {rank}"),
    }
}

/// Per-face totals in a fresh `decks`-deck shoe: 16 tens, 4 of everything else.
fn total_counts(decks: u32) -> [u32; 10] {
    let mut totals = [4 * decks; 10];
    totals[TEN as usize] = 16 * decks;
    totals
}

/// Per-bucket totals in a fresh `decks`-deck shoe: Tens and Low/High get 16 each, Aces get 4.
fn partial_totals(decks: u32) -> [u32; 4] {
    [16 * decks, 4 * decks, 16 * decks, 16 * decks]
}

impl CardState {
    /// A counting model that ignores history and always sees the single-deck prior.
    pub fn null() -> Self {
        CardState::Null
    }

    /// A perfect counter tracking every face drawn from a `decks`-deck shoe.
    pub fn total(decks: u32) -> Self {
        CardState::Total(TotalState { decks, state: [0; 10] })
    }

    /// A perfect counter starting from a partially-depleted `decks`-deck shoe.
    pub fn total_from_state(decks: u32, state: [u32; 10]) -> Self {
        CardState::Total(TotalState { decks, state })
    }

    /// A coarse Tens/Aces/Low/High counter over a `decks`-deck shoe.
    pub fn partial_ajhl(decks: u32) -> Self {
        CardState::PartialAjhl(PartialState { decks, state: [0; 4] })
    }

    /// A coarse counter starting from the given bucket counts already drawn.
    pub fn partial_ajhl_from_state(decks: u32, state: [u32; 4]) -> Self {
        CardState::PartialAjhl(PartialState { decks, state })
    }

    /// Draw a card: `Some(v)` requests exactly face `v` (certainty, or
    /// [`Error::ExhaustedFace`] if none remain); `None` draws freely, weighted by composition.
    pub fn draw<P: Prob>(&self, v: Option<Rank>, tol: Tolerances) -> Result<ProbDist<(Rank, CardState), P>> {
        match v {
            Some(rank) => self.draw_specific(rank, tol),
            None => self.draw_any(tol),
        }
    }

    fn draw_any<P: Prob>(&self, tol: Tolerances) -> Result<ProbDist<(Rank, CardState), P>> {
        match self {
            CardState::Null => {
                let raw = RANKS
                    .into_iter()
                    .map(|r| {
                        let p = if r == TEN { P::from_ratio(4, 13) } else { P::from_ratio(1, 13) };
                        ((r, self.clone()), p)
                    })
                    .collect();
                ProbDist::new(raw, tol)
            }
            CardState::Total(t) => {
                let totals = total_counts(t.decks);
                let remaining = t.decks * 52 - t.state.iter().sum::<u32>();
                let mut raw = Vec::new();
                for r in RANKS {
                    let i = r as usize;
                    let left = totals[i] - t.state[i];
                    if left == 0 {
                        continue;
                    }
                    let mut new_state = t.state;
                    new_state[i] += 1;
                    let next = CardState::Total(TotalState { decks: t.decks, state: new_state });
                    raw.push(((r, next), P::from_ratio(left as i64, remaining as i64)));
                }
                ProbDist::new(raw, tol)
            }
            CardState::PartialAjhl(b) => {
                let totals = partial_totals(b.decks);
                let remaining = b.decks * 52 - b.state.iter().sum::<u32>();
                let mut raw = Vec::new();
                for (bucket, faces) in [(BUCKET_TENS, &[TEN][..]), (BUCKET_ACES, &[ACE][..])] {
                    let left = totals[bucket] - b.state[bucket];
                    if left == 0 {
                        continue;
                    }
                    let mut new_state = b.state;
                    new_state[bucket] += 1;
                    let next = CardState::PartialAjhl(PartialState { decks: b.decks, state: new_state });
                    for &face in faces {
                        raw.push(((face, next.clone()), P::from_ratio(left as i64, remaining as i64)));
                    }
                }
                for (bucket, faces) in [(BUCKET_LOW, &[2, 3, 4, 5][..]), (BUCKET_HIGH, &[6, 7, 8, 9][..])] {
                    let left = totals[bucket] - b.state[bucket];
                    if left == 0 {
                        continue;
                    }
                    let mut new_state = b.state;
                    new_state[bucket] += 1;
                    let next = CardState::PartialAjhl(PartialState { decks: b.decks, state: new_state });
                    // The bucket's probability mass splits uniformly across its four faces; the
                    // successor state advances only the bucket counter, so two distinct faces in
                    // the same bucket share one successor state.
                    for &face in faces {
                        raw.push(((face, next.clone()), P::from_ratio(left as i64, (remaining as i64) * 4)));
                    }
                }
                ProbDist::new(raw, tol)
            }
        }
    }

    fn draw_specific<P: Prob>(&self, rank: Rank, tol: Tolerances) -> Result<ProbDist<(Rank, CardState), P>> {
        match self {
            CardState::Null => ProbDist::new(vec![((rank, self.clone()), P::one())], tol),
            CardState::Total(t) => {
                let totals = total_counts(t.decks);
                let i = rank as usize;
                let left = totals[i] - t.state[i];
                if left == 0 {
                    return Err(Error::ExhaustedFace(rank));
                }
                let mut new_state = t.state;
                new_state[i] += 1;
                let next = CardState::Total(TotalState { decks: t.decks, state: new_state });
                ProbDist::new(vec![((rank, next), P::one())], tol)
            }
            CardState::PartialAjhl(b) => {
                let bucket = bucket_of(rank);
                let totals = partial_totals(b.decks);
                let left = totals[bucket] - b.state[bucket];
                if left == 0 {
                    return Err(Error::ExhaustedFace(rank));
                }
                let mut new_state = b.state;
                new_state[bucket] += 1;
                let next = CardState::PartialAjhl(PartialState { decks: b.decks, state: new_state });
                ProbDist::new(vec![((rank, next), P::one())], tol)
            }
        }
    }
}

/// Build a fresh [`CardState::Total`] shoe of the given deck count.
#[macro_export]
macro_rules! shoe {
    ($decks:expr) => {
        $crate::card::CardState::total($decks)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::BigRational;

    fn exact() -> Tolerances {
        Tolerances::exact()
    }

    #[test]
    fn null_draw_sums_to_one_and_has_ten_branches() {
        let d: ProbDist<(Rank, CardState), BigRational> = CardState::null().draw(None, exact()).unwrap();
        assert_eq!(d.len(), 10);
    }

    #[test]
    fn null_draw_weights_tens_four_times_others() {
        let d: ProbDist<(Rank, CardState), BigRational> = CardState::null().draw(None, exact()).unwrap();
        for ((rank, _), p) in d.iter() {
            let expected = if *rank == TEN {
                BigRational::from_ratio(4, 13)
            } else {
                BigRational::from_ratio(1, 13)
            };
            assert_eq!(*p, expected);
        }
    }

    #[test]
    fn null_draw_specific_is_certain() {
        let d: ProbDist<(Rank, CardState), BigRational> = CardState::null().draw(Some(ACE), exact()).unwrap();
        assert_eq!(d.len(), 1);
        let ((rank, _), p) = d.iter().next().unwrap();
        assert_eq!(*rank, ACE);
        assert_eq!(*p, BigRational::from_ratio(1, 1));
    }

    #[test]
    fn total_draw_first_two_draws_advance_distinct_faces() {
        // A fresh 1-deck TotalCardState's first two draws advance state[0] and state[1]
        // respectively.
        let c = shoe!(1);
        let d: ProbDist<(Rank, CardState), BigRational> = c.draw(None, exact()).unwrap();
        let mut it = d.iter();
        let ((_, CardState::Total(t0)), _) = it.next().unwrap() else { panic!() };
        assert_eq!(t0.state, [1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let ((_, CardState::Total(t1)), _) = it.next().unwrap() else { panic!() };
        assert_eq!(t1.state, [0, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn total_draw_specific_exhausts() {
        let mut c = shoe!(1);
        for _ in 0..4 {
            let d: ProbDist<(Rank, CardState), BigRational> = c.draw(Some(ACE), exact()).unwrap();
            c = d.iter().next().unwrap().0 .1.clone();
        }
        let result: Result<ProbDist<(Rank, CardState), BigRational>> = c.draw(Some(ACE), exact());
        assert_eq!(result, Err(Error::ExhaustedFace(ACE)));
    }

    #[test]
    fn partial_ajhl_splits_bucket_uniformly_with_shared_successor() {
        let c = CardState::partial_ajhl(1);
        let d: ProbDist<(Rank, CardState), BigRational> = c.draw(None, exact()).unwrap();
        let low_entries: Vec<_> = d.iter().filter(|((r, _), _)| (2..=5).contains(r)).collect();
        assert_eq!(low_entries.len(), 4);
        for (_, p) in &low_entries {
            assert_eq!(**p, BigRational::from_ratio(4, 52));
        }
        // Two distinct Low faces share the same successor CardState (the compression trick).
        let (_, s0) = low_entries[0].0;
        let (_, s1) = low_entries[1].0;
        assert_eq!(s0, s1);
    }

    #[test]
    fn partial_ajhl_draw_specific_advances_bucket_not_face() {
        let c = CardState::partial_ajhl(1);
        let d: ProbDist<(Rank, CardState), BigRational> = c.draw(Some(3), exact()).unwrap();
        let ((rank, CardState::PartialAjhl(b)), _) = d.iter().next().unwrap() else { panic!() };
        assert_eq!(*rank, 3);
        assert_eq!(b.state, [0, 0, 1, 0]);
    }
}
