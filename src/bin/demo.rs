//! Fixed three-table demonstration binary: Blackjack Switch under no counting, Blackjack Switch
//! under a half-tens-depleted AJHL counter, and the video variant under perfect (`Total`)
//! counting.
//!
//! CLI argument parsing, richer table layout, and an interactive prompt belong in a front-end
//! built on top of this crate, not here — this binary exists only to exercise
//! [`blackjack_ev::OddsCalculator::print_table`] against a real sink (stdout).

use std::io::Write;

use blackjack_ev::card::CardState;
use blackjack_ev::odds::legend;
use blackjack_ev::shoe;
use blackjack_ev::{OddsCalculator, Tolerances, BJS, BJV};
use num_rational::BigRational;

/// Runs the fixed three-table demonstration against `sink`, so the binary's own `main` and the
/// slow smoke test below share one code path.
fn run(sink: &mut impl Write) -> std::io::Result<()> {
    let tol = Tolerances::exact();
    writeln!(sink, "{}", legend())?;

    log::info!("Blackjack Switch, no counting ({} decks)", BJS.default_decks);
    let bjs_null: OddsCalculator<BigRational> = OddsCalculator::new(CardState::null(), BJS, false, tol);
    bjs_null.print_table(sink)?;

    log::info!("Blackjack Switch, AJHL counting, half the tens already drawn ({} decks)", BJS.default_decks);
    let bjs_ajhl: OddsCalculator<BigRational> = OddsCalculator::new(
        CardState::partial_ajhl_from_state(BJS.default_decks, [48, 0, 0, 0]),
        BJS,
        false,
        tol,
    );
    bjs_ajhl.print_table(sink)?;

    log::info!("Video Blackjack, perfect counting ({} decks)", BJV.default_decks);
    let bjv_total: OddsCalculator<BigRational> = OddsCalculator::new(shoe!(BJV.default_decks), BJV, true, tol);
    bjv_total.print_table(sink)?;

    Ok(())
}

fn main() {
    env_logger::init();
    let stdout = std::io::stdout();
    run(&mut stdout.lock()).expect("stdout write failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs all three tables end to end. Ignored by default since it enumerates the full catalog
    /// under `approx2h`'s two-step lookahead, which is slow under exact rationals.
    #[test]
    #[ignore]
    fn all_three_tables_run_without_panicking() {
        let mut buf: Vec<u8> = Vec::new();
        run(&mut buf).unwrap();
        assert!(!buf.is_empty());
    }
}
