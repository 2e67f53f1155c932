use crate::locate;
use crate::output::print_json;
use anyhow::Context;
use doorlock_core::protocol::ActuatorCommand;
use std::path::Path;
use std::time::Duration;

pub fn run(explicit: Option<&Path>, command: &str, listen_ms: u64, json: bool) -> anyhow::Result<()> {
    let command = match ActuatorCommand::parse(command) {
        ActuatorCommand::Unknown(raw) => {
            anyhow::bail!("unknown command '{raw}': expected 'on' or 'off'")
        }
        known => known,
    };
    let config = locate::load_config(explicit)?;
    let port = &config.link.port;

    let replies = doorlock_link::send_command(
        &config.link,
        &command,
        Duration::from_millis(listen_ms),
    )
    .with_context(|| format!("failed to send '{command}' to {port}"))?;

    if json {
        let value = serde_json::json!({
            "port": port,
            "sent": command,
            "replies": replies,
        });
        print_json(&value)?;
    } else {
        println!("sent '{command}' to {port}");
        for line in &replies {
            println!("  {line}");
        }
    }
    Ok(())
}
