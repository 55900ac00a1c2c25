//! Immutable turn-based table state and its bounded-recursion drivers.
//!
//! [`GameState`] is a plain immutable tuple; every transition (`hit`, `turn_done`, `next_turn`,
//! `new_game`) returns a fresh value rather than mutating `self`, which is what makes sharing
//! ancestry across a [`GameStateDist`]'s fan-out safe.

use crate::card::CardState;
use crate::error::{Error, Result};
use crate::hand::Hand;
use crate::prob::{Prob, ProbDist, Tolerances};
use crate::types::Rank;

/// Table state: the deck, every hand in play, whose turn it is, and whether that turn is done.
///
/// Index 0 is always the house; play proceeds from the highest index down to 0. `turn` is absent
/// once index 0 has finished its turn, which marks the round terminal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameState {
    cards: CardState,
    hands: Vec<Hand>,
    turn: Option<usize>,
    done: bool,
}

/// A probability distribution over [`GameState`]s. Every item shares the same `turn`, `done`, and
/// hand count — those are invariants the driver methods maintain, not per-state data.
pub type GameStateDist<P> = ProbDist<GameState, P>;

impl GameState {
    /// Build a table with `num_hands` empty hands (index 0 is the house) over `cards`.
    pub fn init(num_hands: usize, cards: CardState) -> Self {
        assert!(num_hands >= 2, "a table needs at least a house and one player");
        GameState { cards, hands: vec![Hand::new(); num_hands], turn: Some(num_hands - 1), done: false }
    }

    /// Access to the deck state, for callers building a fresh round.
    pub fn cards(&self) -> &CardState {
        &self.cards
    }

    /// Every hand at the table, house first.
    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    /// Index into `hands` whose turn it currently is, or `None` once the round is terminal.
    pub fn turn(&self) -> Option<usize> {
        self.turn
    }

    /// Whether the current player's turn has finished.
    pub fn done(&self) -> bool {
        self.done
    }

    /// Whether every hand has received its initial two cards.
    pub fn is_deal_complete(&self) -> bool {
        self.hands.iter().all(Hand::is_deal_complete)
    }

    /// The hand whose turn it currently is.
    pub fn current_hand(&self) -> &Hand {
        &self.hands[self.turn.expect("current_hand called on a terminal GameState")]
    }

    fn with_hand(&self, i: usize, hand: Hand) -> GameState {
        let mut hands = self.hands.clone();
        hands[i] = hand;
        GameState { cards: self.cards.clone(), hands, turn: self.turn, done: self.done }
    }

    /// Mark the current player's turn finished. Idempotent.
    pub fn turn_done(&self) -> GameState {
        GameState { done: true, ..self.clone() }
    }

    /// Move to the next player's turn (house last, then absent). Precondition: `done`.
    pub fn next_turn(&self) -> Result<GameState> {
        if !self.done {
            log::error!("game: next_turn called before the current turn was marked done");
            return Err(Error::Precondition("next_turn requires done == true"));
        }
        let turn = self.turn.expect("next_turn called on a terminal GameState");
        let next = if turn == 0 { None } else { Some(turn - 1) };
        Ok(GameState { cards: self.cards.clone(), hands: self.hands.clone(), turn: next, done: false })
    }

    /// Advance to the next hand during dealing, wrapping from index 0 back to the last index
    /// instead of becoming terminal. `next_turn` is reused for real play, where reaching index 0
    /// ends the round; a fresh deal instead needs to keep cycling through every hand exactly
    /// `2 * hands.len()` times and land back where it started.
    fn deal_step(&self) -> GameState {
        let turn = self.turn.expect("deal_step called on a terminal GameState");
        let next = if turn == 0 { self.hands.len() - 1 } else { turn - 1 };
        GameState { cards: self.cards.clone(), hands: self.hands.clone(), turn: Some(next), done: false }
    }

    /// Reset every hand to empty, preserving the deck. Precondition: at the initial turn, not done.
    pub fn new_game(&self) -> Result<GameState> {
        if self.turn != Some(self.hands.len() - 1) || self.done {
            log::error!("game: new_game called outside the initial turn");
            return Err(Error::Precondition("new_game requires turn == last index and done == false"));
        }
        Ok(GameState {
            cards: self.cards.clone(),
            hands: vec![Hand::new(); self.hands.len()],
            turn: self.turn,
            done: false,
        })
    }

    /// Draw one card (a specific `v`, or freely weighted by the deck when `None`) into the
    /// current hand, fanning out over every possible draw. A hand that can no longer hit
    /// short-circuits straight to `turn_done` with certainty.
    pub fn hit<P: Prob>(&self, v: Option<Rank>, tol: Tolerances) -> Result<GameStateDist<P>> {
        let hand = self.current_hand();
        if !hand.can_hit() {
            return Ok(GameStateDist::inject(self.turn_done(), tol));
        }
        let turn = self.turn.expect("hit called on a terminal GameState");
        let draws = self.cards.draw(v, tol)?;
        let mut raw = Vec::new();
        for ((card, next_cards), p) in draws.iter() {
            let next_hand = hand.add(*card);
            let next_state = GameState {
                cards: next_cards.clone(),
                hands: {
                    let mut hands = self.hands.clone();
                    hands[turn] = next_hand;
                    hands
                },
                turn: self.turn,
                done: false,
            };
            raw.push((next_state, p.clone()));
        }
        GameStateDist::new(raw, tol)
    }

    /// A two-character code describing how hand `i` fared against the house (hand 0), used only
    /// for human-readable display.
    pub fn describe_hand(&self, i: usize) -> &'static str {
        let house = &self.hands[0];
        let h = &self.hands[i];
        if house.is_bust() {
            return if h.is_bust() { "==" } else { "++" };
        }
        if house.is_nat() {
            return if h.is_bust() {
                "xx"
            } else if h.is_nat() {
                "=="
            } else {
                "<<"
            };
        }
        if h.is_bust() {
            return "xx";
        }
        if h.is_nat() {
            return "AJ";
        }
        match h.value().cmp(&house.value()) {
            std::cmp::Ordering::Less => "<<",
            std::cmp::Ordering::Greater => ">>",
            std::cmp::Ordering::Equal => "==",
        }
    }
}

/// Extension methods on a distribution of [`GameState`]s — the fan-out drivers that turn play into
/// distributions.
pub trait GameStateDistExt<P: Prob> {
    /// Replace the current hand's state with `hand`, without touching the deck or turn — used
    /// only to build a display copy.
    fn replace_hand(&self, i: usize, hand: Hand) -> GameStateDist<P>;

    /// Whether every state in this distribution is terminal for the current turn.
    fn all_done(&self) -> bool;

    /// Whether every state has a complete initial deal.
    fn all_deal_complete(&self) -> bool;

    /// Whether every state currently sits at turn `i`.
    fn all_on_turn(&self, i: usize) -> bool;

    /// The shared hand count across every state in this distribution.
    fn num_players(&self) -> usize;

    /// Repeatedly `bind(step)` until every state reports `done`. Precondition: every state has a
    /// complete deal. Termination follows because each step either hits (bounded `osum` growth)
    /// or moves straight to `done`.
    fn play_until_done<F>(&self, step: F) -> Result<GameStateDist<P>>
    where
        F: Fn(&GameState) -> Result<GameStateDist<P>>;

    /// For `i` from `r` down to `0`: `play_until_done(strategies[i])` then advance to the next
    /// turn. Precondition: every state sits at turn `r`. Postcondition: every state is terminal.
    fn exec_round<F>(&self, strategies: &[F], r: usize) -> Result<GameStateDist<P>>
    where
        F: Fn(&GameState) -> Result<GameStateDist<P>>;

    /// Reset every hand, then deal two cards to each player in round-robin (house first),
    /// consuming `forced_cards` one card per deal before falling back to an undirected draw.
    fn deal_new_round(&self, forced_cards: &[Rank]) -> Result<GameStateDist<P>>;

    /// The expected payoff of `pay(house, player_i)` for every non-house hand index.
    fn expect_pay<F>(&self, pay: F) -> Vec<P>
    where
        F: Fn(&Hand, &Hand) -> P;
}

impl<P: Prob> GameStateDistExt<P> for GameStateDist<P> {
    fn replace_hand(&self, i: usize, hand: Hand) -> GameStateDist<P> {
        self.map(|gs| gs.with_hand(i, hand))
    }

    fn all_done(&self) -> bool {
        self.iter().all(|(gs, _)| gs.done)
    }

    fn all_deal_complete(&self) -> bool {
        self.iter().all(|(gs, _)| gs.is_deal_complete())
    }

    fn all_on_turn(&self, i: usize) -> bool {
        self.iter().all(|(gs, _)| gs.turn == Some(i))
    }

    fn num_players(&self) -> usize {
        self.iter().next().map(|(gs, _)| gs.hands.len()).unwrap_or(0)
    }

    fn play_until_done<F>(&self, step: F) -> Result<GameStateDist<P>>
    where
        F: Fn(&GameState) -> Result<GameStateDist<P>>,
    {
        if !self.all_deal_complete() {
            log::error!("game: play_until_done called on an incomplete deal");
            return Err(Error::Precondition("play_until_done requires a complete deal"));
        }
        let mut gsd = self.clone();
        while !gsd.all_done() {
            gsd = gsd.bind(&step)?;
        }
        Ok(gsd)
    }

    fn exec_round<F>(&self, strategies: &[F], r: usize) -> Result<GameStateDist<P>>
    where
        F: Fn(&GameState) -> Result<GameStateDist<P>>,
    {
        if !self.all_on_turn(r) {
            log::error!("game: exec_round called with a distribution not uniformly at turn {r}");
            return Err(Error::Precondition("exec_round requires every state to sit at turn r"));
        }
        let mut gsd = self.clone();
        for i in (0..=r).rev() {
            gsd = gsd.play_until_done(&strategies[i])?;
            gsd = gsd.bind(|gs| gs.next_turn().map(|g| ProbDist::inject(g, self.tolerances())))?;
        }
        Ok(gsd)
    }

    fn deal_new_round(&self, forced_cards: &[Rank]) -> Result<GameStateDist<P>> {
        let tol = self.tolerances();
        let mut gsd = self.bind(|gs| gs.new_game().map(|g| ProbDist::inject(g, tol)))?;
        let num_players = gsd.num_players();
        for round in 0..(2 * num_players) {
            let forced = forced_cards.get(round).copied();
            gsd = gsd.bind(|gs| gs.hit(forced, tol))?;
            gsd = gsd.map(|gs| gs.deal_step());
        }
        Ok(gsd)
    }

    fn expect_pay<F>(&self, pay: F) -> Vec<P>
    where
        F: Fn(&Hand, &Hand) -> P,
    {
        let n = self.num_players();
        let mut out = Vec::with_capacity(n);
        out.push(P::zero());
        for i in 1..n {
            out.push(self.expect(|gs| pay(&gs.hands[0], &gs.hands[i])));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::BJS;
    use crate::shoe;
    use crate::types::{ACE, TEN};
    use num_rational::BigRational;
    use num_traits::Zero;

    fn exact() -> Tolerances {
        Tolerances::exact()
    }

    #[test]
    fn deal_new_round_deals_two_cards_to_every_hand() {
        let gsd: GameStateDist<BigRational> = GameStateDist::inject(GameState::init(2, shoe!(6)), exact());
        let dealt = gsd.deal_new_round(&[TEN, ACE, TEN, 7]).unwrap();
        assert!(dealt.all_deal_complete());
    }

    #[test]
    fn exec_round_ends_with_absent_turn() {
        let gsd: GameStateDist<BigRational> = GameStateDist::inject(GameState::init(2, shoe!(6)), exact());
        let dealt = gsd.deal_new_round(&[TEN, TEN, TEN, TEN]).unwrap();
        let strategies: Vec<_> =
            vec![BJS.house_policy::<BigRational>(exact()), BJS.house_policy::<BigRational>(exact())];
        let done = dealt.exec_round(&strategies, 1).unwrap();
        for (gs, _) in done.iter() {
            assert_eq!(gs.turn(), None);
        }
    }

    #[test]
    fn push_on_two_naturals_pays_zero() {
        let gs = GameState {
            cards: shoe!(1),
            hands: vec![
                Hand::new().add(ACE).add(TEN),
                Hand::new().add(ACE).add(TEN),
            ],
            turn: Some(0),
            done: false,
        };
        let gsd: GameStateDist<BigRational> = GameStateDist::inject(gs, exact());
        let played = gsd.play_until_done(BJS.house_policy::<BigRational>(exact())).unwrap();
        let pay = played.expect_pay(|h, p| BJS.pay::<BigRational>(h, p));
        assert_eq!(pay[1], BigRational::zero());
    }

    #[test]
    fn house_natural_beats_completed_player_hand() {
        let gs = GameState {
            cards: shoe!(1),
            hands: vec![
                Hand::new().add(ACE).add(TEN),
                Hand::new().add(TEN).add(9),
            ],
            turn: Some(0),
            done: false,
        };
        let gsd: GameStateDist<BigRational> = GameStateDist::inject(gs, exact());
        let played = gsd.play_until_done(BJS.house_policy::<BigRational>(exact())).unwrap();
        let pay = played.expect_pay(|h, p| BJS.pay::<BigRational>(h, p));
        assert_eq!(pay[1], BigRational::from_ratio(-1, 1));
    }

    #[test]
    fn next_turn_on_a_non_done_state_is_a_precondition_error() {
        let gs = GameState::init(2, shoe!(1));
        assert!(!gs.done());
        assert_eq!(
            gs.next_turn(),
            Err(Error::Precondition("next_turn requires done == true"))
        );
    }

    #[test]
    fn new_game_mid_round_is_a_precondition_error() {
        // `turn` has already advanced away from the initial index, so `new_game` must refuse.
        let gs = GameState::init(3, shoe!(1)).turn_done().next_turn().unwrap();
        assert_eq!(
            gs.new_game(),
            Err(Error::Precondition("new_game requires turn == last index and done == false"))
        );
    }

    #[test]
    fn new_game_while_done_is_a_precondition_error() {
        let gs = GameState::init(2, shoe!(1)).turn_done();
        assert_eq!(
            gs.new_game(),
            Err(Error::Precondition("new_game requires turn == last index and done == false"))
        );
    }

    #[test]
    fn play_until_done_on_an_incomplete_deal_is_a_precondition_error() {
        let gsd: GameStateDist<BigRational> = GameStateDist::inject(GameState::init(2, shoe!(1)), exact());
        let result = gsd.play_until_done(BJS.house_policy::<BigRational>(exact()));
        assert_eq!(
            result,
            Err(Error::Precondition("play_until_done requires a complete deal"))
        );
    }

    #[test]
    fn exec_round_not_uniformly_at_turn_r_is_a_precondition_error() {
        let gsd: GameStateDist<BigRational> = GameStateDist::inject(GameState::init(2, shoe!(6)), exact());
        let dealt = gsd.deal_new_round(&[TEN, TEN, TEN, TEN]).unwrap();
        // `dealt` sits at turn 1 (the player); asking `exec_round` to start at turn 0 violates
        // its precondition that every state already sits at turn `r`.
        let strategies: Vec<_> = vec![BJS.house_policy::<BigRational>(exact())];
        let result = dealt.exec_round(&strategies, 0);
        assert_eq!(
            result,
            Err(Error::Precondition("exec_round requires every state to sit at turn r"))
        );
    }
}
