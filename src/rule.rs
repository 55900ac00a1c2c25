//! Variant-specific payoff and house-policy tables.
//!
//! A [`Rule`] is a small, immutable value: which payoff cascade applies, whether the house stands
//! or hits on soft 17, which actions are legal, and the default shoe size. The three named
//! variants ([`BJ`], [`BJS`], [`BJV`]) are the engine's only public rule library.

use std::cmp::Ordering;

use crate::game::{GameState, GameStateDist, GameStateDistExt};
use crate::error::Result;
use crate::hand::Hand;
use crate::prob::{Prob, ProbDist, Tolerances};
use crate::types::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayoffKind {
    Bj,
    Bjs,
    Bjv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HousePolicy {
    /// Hit while `value <= 16`, and also on a soft 17.
    Hit17,
    /// Hit only while `value <= 16`; stand on any 17, soft or hard.
    Stand17,
}

/// A Blackjack variant's payoff cascade, house policy, legal actions, and default shoe size.
/// Immutable, and cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Display name.
    pub name: &'static str,
    payoff: PayoffKind,
    policy: HousePolicy,
    /// The player actions this variant permits.
    pub actions: &'static [Action],
    /// Shoe size (in decks) used when a caller doesn't specify one.
    pub default_decks: u32,
}

/// Standard Blackjack: 3:2 natural, dealer hits soft 17, surrender allowed.
pub const BJ: Rule = Rule {
    name: "Blackjack",
    payoff: PayoffKind::Bj,
    policy: HousePolicy::Hit17,
    actions: &[Action::Hit, Action::Stand, Action::Double, Action::Surrender, Action::Split],
    default_decks: 8,
};

/// Blackjack Switch: 1:1 natural, dealer hits soft 17 and a hard-22 house hand pushes instead of
/// losing. No surrender. (Evaluated as if the switch itself were never performed.)
pub const BJS: Rule = Rule {
    name: "Blackjack Switch",
    payoff: PayoffKind::Bjs,
    policy: HousePolicy::Hit17,
    actions: &[Action::Hit, Action::Stand, Action::Double, Action::Split],
    default_decks: 8,
};

/// The reduced "video" variant: 1:1 natural, dealer stands on any 17, no double/split/surrender.
pub const BJV: Rule = Rule {
    name: "Blackjack on the video machines",
    payoff: PayoffKind::Bjv,
    policy: HousePolicy::Stand17,
    actions: &[Action::Hit, Action::Stand],
    default_decks: 2,
};

fn natural_bonus<P: Prob>(kind: PayoffKind) -> P {
    match kind {
        PayoffKind::Bj => P::from_ratio(3, 2),
        PayoffKind::Bjs | PayoffKind::Bjv => P::one(),
    }
}

impl Rule {
    /// The payoff cascade: bust, then natural, then house-bust (with BJS's hard-22 push), then
    /// house-natural, then a plain value comparison.
    pub fn pay<P: Prob>(&self, house: &Hand, player: &Hand) -> P {
        let neg_one = P::zero() - P::one();
        if player.is_bust() {
            return neg_one;
        }
        if player.is_nat() {
            return if house.is_nat() { P::zero() } else { natural_bonus::<P>(self.payoff) };
        }
        if house.is_bust() {
            return if self.payoff == PayoffKind::Bjs && house.is_22() { P::zero() } else { P::one() };
        }
        if house.is_nat() {
            return neg_one;
        }
        match player.value().cmp(&house.value()) {
            Ordering::Equal => P::zero(),
            Ordering::Greater => P::one(),
            Ordering::Less => neg_one,
        }
    }

    /// The house's own playing strategy, as a step function fit for [`GameStateDistExt::play_until_done`]:
    /// hit while below the variant's threshold, otherwise finish the turn. Idempotent once `done`.
    pub fn house_policy<P: Prob>(&self, tol: Tolerances) -> impl Fn(&GameState) -> Result<GameStateDist<P>> {
        let policy = self.policy;
        move |gs: &GameState| {
            if gs.done() {
                return Ok(ProbDist::inject(gs.clone(), tol));
            }
            let hand = gs.current_hand();
            let should_hit = match policy {
                HousePolicy::Hit17 => hand.can_hit() && (hand.value() <= 16 || hand.is_a17()),
                HousePolicy::Stand17 => hand.can_hit() && hand.value() <= 16,
            };
            if should_hit {
                gs.hit(None, tol)
            } else {
                Ok(ProbDist::inject(gs.turn_done(), tol))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ACE, TEN};
    use num_rational::BigRational;
    use num_traits::One;

    fn h(cards: &[i32]) -> Hand {
        cards.iter().fold(Hand::new(), |h, &c| h.add(c))
    }

    fn r(n: i64, d: i64) -> BigRational {
        BigRational::from_ratio(n, d)
    }

    #[test]
    fn bjs_both_natural_pushes() {
        assert_eq!(BJS.pay::<BigRational>(&h(&[ACE, TEN]), &h(&[ACE, TEN])), r(0, 1));
    }

    #[test]
    fn bjs_house_natural_beats_plain_player_hand() {
        assert_eq!(BJS.pay::<BigRational>(&h(&[ACE, TEN]), &h(&[TEN, TEN])), r(-1, 1));
    }

    #[test]
    fn bjs_house_22_pushes_against_non_natural() {
        assert_eq!(BJS.pay::<BigRational>(&h(&[TEN, TEN, 2]), &h(&[TEN, TEN, 1])), r(0, 1));
    }

    #[test]
    fn bjs_house_22_still_loses_to_player_natural() {
        assert_eq!(BJS.pay::<BigRational>(&h(&[TEN, TEN, 2]), &h(&[ACE, TEN])), r(1, 1));
    }

    #[test]
    fn bjs_player_bust_always_loses() {
        assert_eq!(BJS.pay::<BigRational>(&h(&[TEN, 7]), &h(&[TEN, TEN, 5])), r(-1, 1));
    }

    #[test]
    fn bjs_plain_value_comparison() {
        assert_eq!(BJS.pay::<BigRational>(&h(&[TEN, 7]), &h(&[TEN, TEN])), r(1, 1));
        assert_eq!(BJS.pay::<BigRational>(&h(&[TEN, TEN]), &h(&[TEN, 7])), r(-1, 1));
    }

    #[test]
    fn bj_natural_bonus_is_three_to_two() {
        assert_eq!(BJ.pay::<BigRational>(&h(&[TEN, 9]), &h(&[ACE, TEN])), r(3, 2));
    }

    #[test]
    fn house_policy_is_idempotent_once_done() {
        let tol = Tolerances::exact();
        let policy = BJV.house_policy::<BigRational>(tol);
        let gs = GameState::init(2, crate::shoe!(1)).turn_done();
        let out = policy(&gs).unwrap();
        assert_eq!(out.len(), 1);
        let (only, p) = out.iter().next().unwrap();
        assert_eq!(*only, gs);
        assert_eq!(*p, BigRational::one());
    }
}
