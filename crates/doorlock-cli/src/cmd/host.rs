use crate::gestures::{parse_reading, parse_symbol, Tokens};
use crate::locate;
use crate::output::print_json;
use anyhow::Context;
use doorlock_core::clock::MonotonicClock;
use doorlock_core::config::Config;
use doorlock_core::feedback::TracingFeedback;
use doorlock_core::host::{CommandSink, DoorHost, HostStep};
use doorlock_core::matcher::MatchEvent;
use doorlock_core::protocol::ActuatorCommand;
use doorlock_core::session::SessionSummary;
use doorlock_link::{ReconnectingLink, SerialConnector};
use std::convert::Infallible;
use std::fmt::Display;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// A command sink the host loop can also poll for device chatter.
trait HostLink: CommandSink {
    fn poll_status(&mut self);
}

/// Logs commands without touching hardware.
#[derive(Default)]
struct DryRunLink;

impl CommandSink for DryRunLink {
    type Error = Infallible;

    fn send(&mut self, command: &ActuatorCommand) -> Result<(), Infallible> {
        info!(%command, "dry run, not sent");
        Ok(())
    }
}

impl HostLink for DryRunLink {
    fn poll_status(&mut self) {}
}

impl HostLink for ReconnectingLink<SerialConnector> {
    fn poll_status(&mut self) {
        match self.read_status() {
            Ok(lines) => {
                for line in lines {
                    info!(%line, "device");
                }
            }
            Err(e) => warn!(error = %e, "lost actuator link, will reconnect on next send"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    explicit: Option<&Path>,
    dry_run: bool,
    raw: bool,
    interval_ms: u64,
    json: bool,
) -> anyhow::Result<()> {
    let config = locate::load_config(explicit)?;
    if config.has_errors() {
        anyhow::bail!("invalid config; run `doorlock config validate` for details");
    }

    if dry_run {
        drive(&config, DryRunLink, raw, interval_ms, json)
    } else {
        let link = ReconnectingLink::new(
            SerialConnector::new(config.link.clone()),
            config.link.reconnect_attempts,
        );
        drive(&config, link, raw, interval_ms, json)
    }
}

fn drive<L>(config: &Config, link: L, raw: bool, interval_ms: u64, json: bool) -> anyhow::Result<()>
where
    L: HostLink,
    L::Error: Display,
{
    let mut host = DoorHost::new(config, link, TracingFeedback::new(), MonotonicClock::new());
    info!(sequence = %config.sequence.target, raw, "host ready, reading gestures from stdin");

    let interval = Duration::from_millis(interval_ms);
    let mut reported = Vec::new();
    let stdin = io::stdin();
    for token in Tokens::new(stdin.lock()) {
        let token = token.context("failed to read gestures from stdin")?;
        let step = if raw {
            match parse_reading(&token) {
                Ok(reading) => host.observe_raw(reading),
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "skipping input token");
                    continue;
                }
            }
        } else {
            match parse_symbol(&token, config.sequence.max_fingers) {
                Ok(symbol) => host.observe(symbol),
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "skipping input token");
                    continue;
                }
            }
        };

        match step {
            Ok(step) if step.event != MatchEvent::NoChange || step.sent.is_some() => {
                if !json {
                    println!("{}", describe(&step));
                }
                reported.push(step);
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "unlock failed, actuator unreachable"),
        }

        host.link_mut().poll_status();
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    let summary = host.stats().summary();
    if json {
        let value = serde_json::json!({
            "steps": reported,
            "summary": summary,
        });
        print_json(&value)?;
    } else {
        print_summary(&summary);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

fn describe(step: &HostStep) -> String {
    let progress = step.progress;
    let mut line = match step.event {
        MatchEvent::Advanced(n) => format!("entered {}  ({n}/{})", step.symbol, progress.len),
        MatchEvent::Matched => "sequence matched".to_string(),
        MatchEvent::Mismatched => format!("sequence reset at {}", step.symbol),
        MatchEvent::NoChange => "relock due".to_string(),
    };
    if let Some(cmd) = &step.sent {
        line.push_str(&format!("  -> sent '{cmd}'"));
    }
    line
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!(
        "Session: {:.1}s, {} entries, {} match(es), {} mismatch(es)",
        summary.duration_secs, summary.entries, summary.matches, summary.mismatches
    );
    println!(
        "Door opened: {}",
        if summary.door_opened { "yes" } else { "no" }
    );
    if let Some(p) = summary.unfinished_attempt {
        println!("Unfinished attempt: {}/{}", p.cursor, p.len);
    }
}
