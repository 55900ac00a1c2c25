//! Per-action expected-value evaluator and table driver.
//!
//! [`OddsCalculator`] is the engine's top-level entry point: given a counting model and a
//! [`Rule`], it scores every legal player action on an opening hand and exposes the catalog-wide
//! `print_table` sweep a CLI front-end drives.

use std::io::{self, Write};
use std::marker::PhantomData;

use enum_map::EnumMap;
use strum::IntoEnumIterator;

use crate::card::CardState;
use crate::error::Result;
use crate::game::{GameState, GameStateDist, GameStateDistExt};
use crate::hand::Hand;
use crate::prob::{Prob, Tolerances};
use crate::rule::Rule;
use crate::types::{rank_code, Action, Rank, ACE, TEN};

/// Evaluates expected payoffs for a single [`Rule`] under a fixed counting model and probability
/// backend. `approx2h` selects the bounded two-step hit lookahead over the cheaper single-step
/// baseline.
pub struct OddsCalculator<P: Prob> {
    init_cards: CardState,
    rule: Rule,
    approx2h: bool,
    tol: Tolerances,
    _backend: PhantomData<P>,
}

impl<P: Prob> OddsCalculator<P> {
    /// Build a calculator over the given starting deck, rule, and lookahead mode.
    pub fn new(init_cards: CardState, rule: Rule, approx2h: bool, tol: Tolerances) -> Self {
        OddsCalculator { init_cards, rule, approx2h, tol, _backend: PhantomData }
    }

    /// Run the house to completion from `gsd` (whose current turn is the player) and return the
    /// expected payoff for player index 1: advance to the house's turn, play it to completion
    /// under this rule's house policy, then average the payoff over the resulting distribution.
    fn payout(&self, gsd: &GameStateDist<P>) -> Result<P> {
        let advanced = gsd.map(|gs| {
            gs.turn_done()
                .next_turn()
                .expect("turn_done always satisfies next_turn's own precondition")
        });
        let strategies = [self.rule.house_policy::<P>(self.tol)];
        let played = advanced.exec_round(&strategies, 0)?;
        Ok(played.expect_pay(|house, player| self.rule.pay::<P>(house, player))[1].clone())
    }

    /// The bounded two-step hit lookahead: partition the post-hit distribution into hands that
    /// must stand and hands that may hit again, and weight standing-after-one-hit against
    /// hitting-a-second-time by whichever the continuing branch prefers.
    fn approx2_hit(&self, gsd_h: &GameStateDist<P>) -> Result<P> {
        let (p_stop, must_stop) = gsd_h.given(|gs| !gs.current_hand().can_hit());
        let (p_cont, can_continue) = gsd_h.given(|gs| gs.current_hand().can_hit());

        let pay_hn = match &must_stop {
            Some(dist) => self.payout(dist)?,
            None => P::zero(),
        };
        let (pay_ho, pay_hoh) = match &can_continue {
            Some(dist) => {
                let pay_ho = self.payout(dist)?;
                let hit_again = dist.bind(|gs| gs.hit(None, self.tol))?;
                let pay_hoh = self.payout(&hit_again)?;
                (pay_ho, pay_hoh)
            }
            None => (P::zero(), P::zero()),
        };
        let best_continue = if pay_ho.partial_cmp(&pay_hoh).expect("payoffs are totally ordered") == std::cmp::Ordering::Less {
            pay_hoh
        } else {
            pay_ho
        };
        Ok(pay_hn * p_stop + best_continue * p_cont)
    }

    /// Score every legal action on the opening hand `(pc0, pc1?)` vs `hc`, descending by expected
    /// value. `pc1` absent means "drawn freely" — used by the recursive split evaluation.
    pub fn calculate_odds(&self, pc0: Rank, hc: Rank, pc1: Option<Rank>) -> Result<Vec<(Action, P)>> {
        let forced: Vec<Rank> = match pc1 {
            Some(c1) => vec![pc0, hc, c1],
            None => vec![pc0, hc],
        };
        let gsd0 = GameStateDist::inject(GameState::init(2, self.init_cards.clone()), self.tol)
            .deal_new_round(&forced)?;

        let p0 = match pc1 {
            Some(c1) => Hand::new().add(pc0).add(c1),
            None => Hand::new().add(pc0),
        };

        // Action -> value choice table, generalized to `Option<P>` since an unavailable action
        // has no sentinel value under an arbitrary probability backend.
        let mut choices: EnumMap<Action, Option<P>> = EnumMap::default();

        choices[Action::Stand] = Some(self.payout(&gsd0)?);

        if self.rule.actions.contains(&Action::Hit) && p0.can_hit() {
            let gsd_h = gsd0.bind(|gs| gs.hit(None, self.tol))?;
            let pay_h = if self.approx2h { self.approx2_hit(&gsd_h)? } else { self.payout(&gsd_h)? };
            choices[Action::Hit] = Some(pay_h);
        }

        if self.rule.actions.contains(&Action::Double) {
            if let Some(pay_h) = &choices[Action::Hit] {
                choices[Action::Double] = Some(pay_h.clone() + pay_h.clone());
            }
        }

        if self.rule.actions.contains(&Action::Surrender) {
            choices[Action::Surrender] = Some(P::from_ratio(-1, 2));
        }

        if self.rule.actions.contains(&Action::Split) && p0.is_pair().is_some() {
            let split = self.calculate_odds(pc0, hc, None)?;
            let best = split[0].1.clone();
            choices[Action::Split] = Some(best.clone() + best);
        }

        let mut odds: Vec<(Action, P)> =
            choices.into_iter().filter_map(|(action, value)| value.map(|v| (action, v))).collect();
        odds.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("expected values are totally ordered"));
        Ok(odds)
    }
}

const GREEN_BG: &str = "\x1b[42m";
const RED_BG: &str = "\x1b[41m";
const MAGENTA_BG: &str = "\x1b[45m";
const CYAN_BG_BLACK_FG: &str = "\x1b[46m\x1b[30m";
const YELLOW_BG_BLACK_FG: &str = "\x1b[43m\x1b[30m";
const RESET: &str = "\x1b[0m";

fn color_for(action: Action) -> &'static str {
    match action {
        Action::Hit => GREEN_BG,
        Action::Stand => RED_BG,
        Action::Surrender => MAGENTA_BG,
        Action::Double => CYAN_BG_BLACK_FG,
        Action::Split => YELLOW_BG_BLACK_FG,
    }
}

/// A one-line key mapping every action's table code to its full name, in [`Action::iter`]'s
/// declaration order (`Stand, Hit, Double, Split, Surrender`). Printed once above a table by the
/// caller, not by [`OddsCalculator::print_table`] itself, so the table's own row count stays
/// exactly the catalog's row count.
pub fn legend() -> String {
    Action::iter()
        .map(|a| format!("{}={}", a.code(), <&'static str>::from(&a)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The opening-hand catalog a table sweep iterates: the ten-valued row, the "2" row, the Ace row,
/// then every pair.
fn opening_hand_catalog() -> Vec<(Rank, Rank)> {
    let mut rows = Vec::new();
    for x in [9, 8, 7, 6, 5, 4, 3, 2] {
        rows.push((TEN, x));
    }
    for x in [9, 8, 7, 6, 5, 4, 3] {
        rows.push((2, x));
    }
    for x in [9, 8, 7, 6, 5, 4, 3, 2] {
        rows.push((ACE, x));
    }
    for x in [ACE, TEN, 9, 8, 7, 6, 5, 4, 3, 2] {
        rows.push((x, x));
    }
    rows
}

/// House up-cards a table sweep iterates, in column order: `2,3,4,5,6,7,8,9,J,A`.
const TABLE_COLUMNS: [Rank; 10] = [2, 3, 4, 5, 6, 7, 8, 9, TEN, ACE];

impl<P: Prob> OddsCalculator<P> {
    /// Render the top one or two actions for every (opening hand, house up-card) pair as a
    /// UTF-8, ANSI-colorized grid to `sink`. Ties within `1e-4` of the top action are left
    /// uncolored. Calculation failures here are treated as engine bugs — a well-formed catalog
    /// sweep should never raise an invariant error — rather than propagated.
    pub fn print_table<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        for row in opening_hand_catalog() {
            self.print_row(sink, row)?;
        }
        Ok(())
    }

    fn print_row<W: Write>(&self, sink: &mut W, (c0, c1): (Rank, Rank)) -> io::Result<()> {
        write!(sink, "{}{}", rank_code(c0), rank_code(c1))?;
        for &hc in &TABLE_COLUMNS {
            let odds = self
                .calculate_odds(c0, hc, Some(c1))
                .expect("calculate_odds is invariant-guaranteed to succeed on catalog inputs");
            write!(sink, " | {}", self.odds_cell(&odds))?;
        }
        writeln!(sink)?;
        Ok(())
    }

    fn odds_cell(&self, odds: &[(Action, P)]) -> String {
        let mut top: Vec<(Action, f64)> = odds.iter().take(2).map(|(a, p)| (*a, p.to_f64())).collect();
        if top.len() == 2 && top[1].0 == Action::Surrender {
            if let Some((a, p)) = odds.get(2) {
                top[1] = (*a, p.to_f64());
            }
        }
        let text = top.iter().map(|(a, v)| format!("{}{:+.2}", a.code(), v)).collect::<Vec<_>>().join(" ");
        if top.len() < 2 || (top[0].1 - top[1].1).abs() < 1e-4 {
            text
        } else {
            format!("{}{}{}", color_for(top[0].0), text, RESET)
        }
    }
}
