//! Immutable hand-value model.
//!
//! A [`Hand`] tracks at most one ace as potentially worth 11; everything else folds into `osum`.
//! The two original cards are remembered in `fst`/`snd` only until a third card arrives, which is
//! what lets [`Hand::is_nat`] distinguish a two-card natural from 21-with-more-cards.

use crate::types::{additive_value, Rank, ACE};

/// A hand's value, closed over ace-softness and the two original cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hand {
    /// Whether one ace in this hand is still being counted as worth 11.
    ace: bool,
    /// Sum of every card folded in so far that isn't the soft ace, saturated at 23.
    osum: u32,
    /// The first card dealt, if fewer than two cards have replaced it.
    fst: Option<Rank>,
    /// The second card dealt, if exactly two cards have been dealt.
    snd: Option<Rank>,
}

impl Hand {
    /// A freshly-dealt, empty hand.
    pub fn new() -> Self {
        Hand::default()
    }

    /// Add a card. An ace is tracked as `+11` only once; a second ace (or any card that would
    /// push the soft total over 21) demotes the tracked ace to `+1` immediately. This conflates
    /// "two aces both worth 1" with "one ace worth 11, one worth 1" since only a single `ace` flag
    /// is stored, but the conflation is harmless for every payoff this engine computes.
    pub fn add(&self, card: Rank) -> Hand {
        let dealt = self.cards_dealt();
        let mut ace = self.ace;
        let mut osum = self.osum;
        if card == ACE && !ace {
            ace = true;
        } else {
            osum += additive_value(card);
        }
        if ace && osum >= 11 {
            ace = false;
            osum += 1;
        }
        osum = osum.min(23);

        let (fst, snd) = match dealt {
            0 => (Some(card), self.snd),
            1 => (self.fst, Some(card)),
            _ => (None, None),
        };
        Hand { ace, osum, fst, snd }
    }

    /// The hand's best total not exceeding 22, i.e. counting the tracked ace as 11 when that
    /// doesn't bust.
    pub fn value(&self) -> u32 {
        if !self.ace {
            self.osum
        } else if self.osum <= 10 {
            self.osum + 11
        } else {
            self.osum + 1
        }
    }

    /// Whether this hand's only possible totals all exceed 21. Saturation at `osum == 23` makes
    /// any bust beyond 23 indistinguishable from a bust at exactly 23.
    pub fn is_bust(&self) -> bool {
        if self.ace {
            self.osum >= 21
        } else {
            self.osum >= 22
        }
    }

    /// A two-card ace-plus-ten, i.e. a natural blackjack.
    pub fn is_nat(&self) -> bool {
        self.ace && self.osum == 10 && self.cards_dealt() == 2
    }

    /// A soft 17 (ace + 6): the threshold an `h17` house policy must still hit on.
    pub fn is_a17(&self) -> bool {
        self.ace && self.osum == 6
    }

    /// Hard value 22, used only by Blackjack Switch's house-22-pushes rule. Soft 22 can't occur
    /// (the ace would already have demoted), so the value-based and `osum`-based definitions
    /// coincide here.
    pub fn is_22(&self) -> bool {
        self.value() == 22
    }

    /// Whether another card may legally be added: not already a natural, not already bust.
    pub fn can_hit(&self) -> bool {
        !self.is_nat() && !self.is_bust()
    }

    /// How many cards have been dealt, clamped at 3 ("three or more").
    pub fn cards_dealt(&self) -> u32 {
        if self.snd.is_some() {
            2
        } else if self.fst.is_some() {
            1
        } else if self.ace || self.osum > 0 {
            3
        } else {
            0
        }
    }

    /// Whether this hand has received its initial two cards.
    pub fn is_deal_complete(&self) -> bool {
        self.cards_dealt() >= 2
    }

    /// Whether both original cards are equal-valued, i.e. eligible to split.
    pub fn is_pair(&self) -> Option<Rank> {
        match (self.fst, self.snd) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        }
    }
}
