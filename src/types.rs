//! Shared primitive types used across the engine.

use enum_map::Enum;
use strum_macros::{EnumIter, IntoStaticStr};

/// A card's face, in the engine's internal encoding.
///
/// `0` is any ten-valued card (10, J, Q, K), `1` is an Ace, and `2..=9` are themselves. Encoding
/// ten-valued cards as a single face keeps deck compositions and hand totals simple to reason
/// about: four distinct cards collapse into one weighted draw.
pub type Rank = i32;

/// Any ten-valued card (10, Jack, Queen, King).
pub const TEN: Rank = 0;
/// An Ace.
pub const ACE: Rank = 1;

/// All ten distinct faces, in the engine's canonical order (`TEN`, `ACE`, `2..=9`).
pub const RANKS: [Rank; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

/// The additive value of a face when building up a hand total: tens count as 10, aces count as 1
/// (an Ace counted as 11 is handled separately via [`crate::hand::Hand`]'s `ace` flag), everything
/// else counts as its face.
pub fn additive_value(rank: Rank) -> u32 {
    match rank {
        TEN => 10,
        ACE => 1,
        n => n as u32,
    }
}

/// Render a rank using the two-character card codes used by [`crate::odds::OddsCalculator`]'s
/// table rows (`A` for Ace, `J` for any ten-valued card, the digit otherwise).
pub fn rank_code(rank: Rank) -> String {
    match rank {
        ACE => "A".to_string(),
        TEN => "J".to_string(),
        n => n.to_string(),
    }
}

/// A legal player action.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, EnumIter, IntoStaticStr, Enum)]
pub enum Action {
    /// Take no further cards.
    Stand,
    /// Take one more card.
    Hit,
    /// Double the bet, take exactly one more card, then stand.
    Double,
    /// Split a pair into two independent hands.
    Split,
    /// Forfeit half the bet and end the hand immediately.
    Surrender,
}

impl Action {
    /// The single-character code used in table cells (`H`, `S`, `D`, `P`, `U`).
    pub fn code(self) -> char {
        match self {
            Action::Hit => 'H',
            Action::Stand => 'S',
            Action::Double => 'D',
            Action::Split => 'P',
            Action::Surrender => 'U',
        }
    }
}
