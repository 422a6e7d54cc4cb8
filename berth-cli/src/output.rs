//! Human and JSON rendering of an [`Outcome`].

use anyhow::{Context, Result};
use colored::Colorize;

use berth_core::Outcome;
use berth_sync::diff::{PLACEHOLDER, SEPARATOR};

pub fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("failed to serialize outcome JSON")?
        );
        return Ok(());
    }

    if let Some(rows) = &outcome.diff {
        print_diff(rows);
    }

    let marker = if outcome.failed {
        "✗".red().bold()
    } else if outcome.changed {
        "✎".yellow().bold()
    } else {
        "✓".green().bold()
    };
    for line in outcome.msg.lines() {
        println!("{marker} {line}");
    }
    Ok(())
}

fn print_diff(rows: &[String]) {
    for (i, row) in rows.iter().enumerate() {
        if i < 2 {
            println!("{}", row.bold());
            continue;
        }
        println!("{}", colorize_row(row));
    }
    println!();
}

/// Red for lines only in the current file, green for lines only in the candidate.
fn colorize_row(row: &str) -> String {
    match row.split_once(SEPARATOR) {
        Some((_, right)) if right.trim() == PLACEHOLDER => row.red().to_string(),
        Some((left, _)) if left.trim() == PLACEHOLDER => row.green().to_string(),
        _ => row.to_string(),
    }
}
