use super::{dashboard, ui};
use crate::core::feed::RateFeed;
use crate::core::ledger::Ledger;
use crate::core::rates::{RateSource, RateTable};
use anyhow::Result;
use console::Term;
use std::time::Duration;
use tracing::debug;

fn render(
    term: &Term,
    ledger: &Ledger,
    rates: &RateTable,
    year: i32,
    currency: &str,
) -> Result<()> {
    term.clear_screen()?;
    dashboard::run(ledger, rates, year, currency);
    let hint = "Refreshing periodically, press Ctrl-C to stop.";
    println!("\n{}", ui::style_text(hint, ui::StyleType::Subtle));
    Ok(())
}

/// Keeps the dashboard on screen, redrawing it whenever fresh rates arrive.
pub async fn run(
    ledger: &Ledger,
    source: Box<dyn RateSource>,
    refresh: Duration,
    year: i32,
    currency: &str,
) -> Result<()> {
    let term = Term::stdout();
    let initial = source.fallback_rates();
    render(&term, ledger, &initial, year, currency)?;
    let (mut receiver, handle) = RateFeed::new(source, refresh).spawn(initial);

    loop {
        tokio::select! {
            changed = receiver.changed() => {
                if changed.is_err() {
                    debug!("Rate feed ended");
                    break;
                }
                let rates = receiver.borrow_and_update().clone();
                render(&term, ledger, &rates, year, currency)?;
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, stopping rate feed");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}
