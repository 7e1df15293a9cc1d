//! Human-readable change summaries and deploy reports.

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use hashsync_sync::{ChangeSet, DeployReport};

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Change")]
    kind: &'static str,
    #[tabled(rename = "Files")]
    count: usize,
    #[tabled(rename = "Action")]
    action: &'static str,
}

/// Print new / modified / obsolete paths followed by a count table.
pub fn print_changes(changes: &ChangeSet) {
    let new: Vec<_> = changes.new_files().collect();
    let modified: Vec<_> = changes.modified_files().collect();

    println!("\n{}", "Files to process:".bold());
    if !new.is_empty() {
        println!("  New:");
        for path in &new {
            println!("    {} {path}", "+".green().bold());
        }
    }
    if !modified.is_empty() {
        println!("  Modified:");
        for path in &modified {
            println!("    {} {path}", "~".yellow().bold());
        }
    }
    if !changes.deletes.is_empty() {
        println!("  Delete:");
        for path in &changes.deletes {
            println!("    {} {path}", "-".red().bold());
        }
    }

    let rows = vec![
        SummaryRow {
            kind: "New",
            count: new.len(),
            action: "upload",
        },
        SummaryRow {
            kind: "Modified",
            count: modified.len(),
            action: "upload",
        },
        SummaryRow {
            kind: "Obsolete",
            count: changes.deletes.len(),
            action: "delete",
        },
        SummaryRow {
            kind: "Unchanged",
            count: changes.unchanged,
            action: "skip",
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Print the outcome of a completed deploy.
pub fn print_report(report: &DeployReport) {
    let elapsed = report.finished_at - report.started_at;
    println!(
        "{} Deploy complete: {} uploaded ({} bytes), {} deleted, {} pruned dir(s) in {:.1}s",
        "✓".green().bold(),
        report.uploaded.len(),
        report.bytes_uploaded,
        report.deletes.files.len() + report.deletes.dirs.len(),
        report.deletes.pruned.len(),
        elapsed.num_milliseconds() as f64 / 1000.0,
    );
    println!("  Manifest: {} entries", report.manifest_entries);

    if !report.deletes.already_gone.is_empty() {
        println!(
            "  {} target(s) were already gone remotely",
            report.deletes.already_gone.len()
        );
    }
    if !report.deletes.issues.is_empty() {
        println!(
            "{} {} delete step(s) skipped:",
            "⚠".yellow().bold(),
            report.deletes.issues.len()
        );
        for issue in &report.deletes.issues {
            println!("    {issue}");
        }
    }
}
