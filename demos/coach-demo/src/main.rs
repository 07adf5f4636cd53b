//! POISE Coach Demo
//!
//! Runs a twelve-second scripted mock interview through the real session
//! loop: centred, leaning, looking away, fidgeting. Prints every change of
//! the on-screen feedback and the final report.
//!
//! Usage: `coach-demo [config.json]`

use std::time::Duration;

use poise_core::FeedbackMessage;
use poise_runtime::{init_tracing, SessionConfig};
use poise_test::{scripted_session, Script};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_path(path)?,
        None => SessionConfig::default(),
    };
    init_tracing(&config.telemetry)?;

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║           POISE Coach Demo - Mock Interview                ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    let script = Script::interview();
    let run_for = script.last_change() + Duration::from_secs(2);
    for (at, behaviour) in script.steps() {
        println!("  {:>5.1}s  candidate is {}", at.as_secs_f64(), behaviour.name());
    }
    println!();

    let (session, _probe) = scripted_session(config, script, 2024);
    let handle = session.start()?;
    let mut display = handle.display();
    let mut shown: Vec<FeedbackMessage> = Vec::new();

    let deadline = tokio::time::sleep(run_for);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = display.changed() => {
                if changed.is_err() {
                    tracing::warn!("display channel closed early");
                    break;
                }
                let frame = display.borrow_and_update().clone();
                if frame.messages != shown {
                    println!("[{}] {}", frame.now, render(&frame.messages));
                    shown = frame.messages;
                }
            }
        }
    }

    let report = handle.stop().await?;

    println!();
    println!("Session report");
    println!("  duration        {:.1}s", report.duration.as_secs_f64());
    println!("  ticks           {}", report.stats.ticks);
    println!("  skipped ticks   {}", report.stats.skipped_ticks);
    println!("  blinks          {}", report.total_blinks());
    println!("  yawns           {}", report.yawns());
    for message in FeedbackMessage::all() {
        let count = report.activations(*message);
        if count > 0 {
            println!("  shown {:>3}x      {}", count, message);
        }
    }

    Ok(())
}

fn render(messages: &[FeedbackMessage]) -> String {
    if messages.is_empty() {
        return "(no feedback)".to_string();
    }
    messages
        .iter()
        .map(|m| m.text())
        .collect::<Vec<_>>()
        .join(" | ")
}
