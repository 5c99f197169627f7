//! Tracker commands: retrieve, save, anonymize.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use tracksync_core::anonymizer::Anonymizer;
use tracksync_infra::RegexAnonymizer;
use tracksync_types::tracker::{ConversationRecord, DialogueTracker};

use crate::state::AppState;

/// Retrieve a conversation and print it.
///
/// With `raw`, prints the merged serialized record; otherwise the tracker
/// rebuilt against the configured domain.
pub async fn retrieve(state: &AppState, sender_id: &str, raw: bool, json: bool) -> Result<()> {
    if raw {
        let Some(record) = state.engine.retrieve_record(sender_id).await else {
            return not_found(sender_id, json);
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            print_record(&record);
        }
        return Ok(());
    }

    let Some(tracker) = state.engine.retrieve(sender_id).await else {
        return not_found(sender_id, json);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&tracker)?);
    } else {
        print_tracker(&tracker);
    }
    Ok(())
}

/// Load a serialized conversation from `file` and persist it.
pub async fn save(state: &AppState, file: &Path, json: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let record: ConversationRecord = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a serialized conversation", file.display()))?;
    anyhow::ensure!(
        !record.sender_id.is_empty(),
        "{} has no sender_id",
        file.display()
    );

    let sender_id = record.sender_id.clone();
    let test_sender = state.engine.is_test_sender(&sender_id);
    let events = state.engine.save(record).await;
    let cursor = state.engine.cache().cursor(&sender_id);

    if json {
        let out = serde_json::json!({
            "sender_id": sender_id,
            "events": events,
            "test_sender": test_sender,
            "cursor": cursor,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Saved {} events for '{}'",
        style("✓").green().bold(),
        style(events.len()).bold(),
        style(&sender_id).cyan()
    );
    if test_sender {
        println!("  {}", style("Test conversation, kept local only").dim());
    } else if cursor.is_synced() {
        println!(
            "  Remote index: {}  last timestamp: {}",
            style(cursor.last_index).bold(),
            cursor.last_timestamp
        );
    } else {
        println!(
            "  {} Remote store did not acknowledge the write",
            style("!").yellow().bold()
        );
    }
    println!();
    Ok(())
}

/// Print `text` with sensitive substrings replaced.
pub fn anonymize(text: &str, json: bool) -> Result<()> {
    let anonymized = RegexAnonymizer::new().anonymize_text(text);
    if json {
        let out = serde_json::json!({ "text": anonymized });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{anonymized}");
    }
    Ok(())
}

fn not_found(sender_id: &str, json: bool) -> Result<()> {
    if json {
        println!("null");
    } else {
        println!(
            "  {} No tracker found for '{}'",
            style("✗").red(),
            style(sender_id).cyan()
        );
    }
    Ok(())
}

fn print_tracker(tracker: &DialogueTracker) {
    println!();
    println!(
        "  {} Tracker '{}'",
        style("●").cyan().bold(),
        style(&tracker.sender_id).bold()
    );
    println!();
    println!("  Events:   {}", style(tracker.events.len()).bold());
    if let Some(ts) = tracker.latest_event_time {
        println!("  Latest:   {}", format_timestamp(ts));
    }
    if tracker.paused {
        println!("  Status:   {}", style("paused").yellow());
    }
    if let Some(text) = tracker.latest_message.as_ref().and_then(|m| m.text()) {
        println!("  Message:  {}", style(text).italic());
    }
    if !tracker.slots.is_empty() {
        println!();
        println!("  {}", style("── Slots ──").dim());
        for (name, value) in &tracker.slots {
            println!("  {name}: {value}");
        }
    }
    println!();
}

fn print_record(record: &ConversationRecord) {
    println!();
    println!(
        "  {} Conversation '{}'",
        style("●").cyan().bold(),
        style(&record.sender_id).bold()
    );
    println!();
    println!("  Events:   {}", style(record.events.len()).bold());
    if let Some(ts) = record.latest_event_time {
        println!("  Latest:   {}", format_timestamp(ts));
    }
    println!();
    for event in &record.events {
        match event.text() {
            Some(text) => println!("  {:<10} {}", style(&event.kind).dim(), text),
            None => println!("  {}", style(&event.kind).dim()),
        }
    }
    println!();
}

/// Render epoch seconds as RFC 3339, or the raw number if out of range.
fn format_timestamp(ts: f64) -> String {
    chrono::DateTime::from_timestamp_millis((ts * 1000.0) as i64)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
