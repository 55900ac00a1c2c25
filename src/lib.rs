//! Exhaustive expected-value calculator for Blackjack, Blackjack Switch, and a reduced "video"
//! variant, under caller-specified card-counting models.
//!
//! This crate is the probability-distribution engine only: a composable, deterministic,
//! enumerative calculator that threads every possible deal through a variant's rules, collapses
//! equivalent outcomes, and reduces the resulting distribution to expected payoffs. A
//! command-line front-end, table formatting, and an interactive prompt are deliberately left to
//! callers — [`odds::OddsCalculator::print_table`] writes to any [`std::io::Write`] sink supplied.
//!
//! Data flows bottom-up through five components: [`prob`] (the discrete probability monad),
//! [`card`] (deck models), [`hand`] (immutable hand values), [`game`] (turn-based table state and
//! its drivers), and [`rule`] / [`odds`] (variant payoff tables and the per-action expected-value
//! evaluator).

pub mod card;
pub mod error;
pub mod game;
pub mod hand;
pub mod odds;
pub mod prob;
pub mod rule;
pub mod types;

pub use error::{Error, Result};
pub use odds::OddsCalculator;
pub use prob::{Prob, ProbDist, Tolerances};
pub use rule::{Rule, BJ, BJS, BJV};
