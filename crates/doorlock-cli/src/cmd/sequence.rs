use crate::gestures::parse_symbol;
use crate::locate;
use crate::output::{print_json, print_table};
use doorlock_core::clock::ManualClock;
use doorlock_core::matcher::{MatchEvent, Progress, SequenceMatcher, TargetSequence};
use doorlock_core::types::GestureSymbol;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ReplayStep {
    tick: usize,
    symbol: GestureSymbol,
    #[serde(flatten)]
    event: MatchEvent,
    progress: Progress,
}

/// Offline replay: no link, no clock, so the idle timeout never fires.
pub fn run(
    explicit: Option<&Path>,
    target: Option<Vec<u8>>,
    tokens: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let config = locate::load_config(explicit)?;
    let target = match target {
        Some(symbols) => TargetSequence::new(symbols)?,
        None => config.sequence.target.clone(),
    };
    let mut matcher = SequenceMatcher::with_clock(target, ManualClock::new()).with_idle_timeout(None);

    let mut steps = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let symbol = parse_symbol(token, config.sequence.max_fingers)?;
        let event = matcher.observe(symbol);
        steps.push(ReplayStep {
            tick: i + 1,
            symbol,
            event,
            progress: matcher.progress(),
        });
    }
    let matched = steps.iter().any(|s| s.event == MatchEvent::Matched);

    if json {
        let value = serde_json::json!({
            "target": matcher.target(),
            "steps": steps,
            "matched": matched,
        });
        return print_json(&value);
    }

    let rows: Vec<Vec<String>> = steps
        .iter()
        .map(|s| {
            vec![
                s.tick.to_string(),
                s.symbol.to_string(),
                s.event.to_string(),
                format!("{}/{}", s.progress.cursor, s.progress.len),
            ]
        })
        .collect();
    print_table(&["TICK", "SYMBOL", "EVENT", "PROGRESS"], &rows);
    println!();
    if matched {
        println!("Sequence {} matched.", matcher.target());
    } else {
        println!("No match for {}.", matcher.target());
    }
    Ok(())
}
