//! Human readable reports. Every renderer returns the text so callers
//! can print it, save it, or both.

use std::fmt::Write;

use crate::download::{DownloadSummary, FolderStats};
use crate::questions::QuestionTally;
use crate::LinkIndex;

const MB: f64 = 1024.0 * 1024.0;

fn rule(ch: char, width: usize) -> String {
    ch.to_string().repeat(width)
}

/// Listing in order, full URLs, and how many papers each year has.
pub fn link_report(index: &LinkIndex) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "All links extracted from the listing");
    let _ = writeln!(out, "{}\n", rule('=', 50));

    let _ = writeln!(out, "NAMES:\n{}", rule('-', 20));
    for (i, name) in index.names().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, name);
    }

    let _ = writeln!(out, "\n\nFULL URLS:\n{}", rule('-', 20));
    for (i, url) in index.urls().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, url);
    }

    let _ = writeln!(out, "\n\nSTATISTICS:\n{}", rule('-', 20));
    let _ = writeln!(out, "Total links found: {}", index.total());
    let _ = writeln!(out, "Years represented: {}\n", index.by_year().len());
    let _ = writeln!(out, "Links per year:");
    for (year, names) in index.by_year() {
        let _ = writeln!(out, "  {year}: {} papers", names.len());
    }
    out
}

pub fn download_summary(summary: &DownloadSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule('=', 60));
    let _ = writeln!(out, "DOWNLOAD SUMMARY");
    let _ = writeln!(out, "{}", rule('=', 60));
    let _ = writeln!(out, "✓ Downloaded: {}", summary.success_count());
    let _ = writeln!(out, "✗ Failed: {}", summary.failed().count());
    let _ = writeln!(out, "Success rate: {:.1}%", summary.success_rate());

    let mut failed = summary.failed().peekable();
    if failed.peek().is_some() {
        let _ = writeln!(out, "\n✗ Failed files:");
        for outcome in failed {
            let _ = writeln!(
                out,
                "   - {} ({}) {}",
                outcome.display_name, outcome.derived_filename, outcome.absolute_url
            );
        }
    }
    out
}

pub fn folder_report(folder: &str, stats: &FolderStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nFiles in '{folder}': {}", stats.file_count);
    let _ = writeln!(out, "\nBy file type:");
    for (ext, ext_stats) in &stats.by_extension {
        let ext = if ext.is_empty() { "(none)" } else { ext };
        let _ = writeln!(
            out,
            "   {ext}: {} files ({:.1} MB)",
            ext_stats.count,
            ext_stats.bytes as f64 / MB
        );
    }
    let _ = writeln!(out, "\nTotal size: {:.1} MB", stats.total_bytes as f64 / MB);
    out
}

/// Corpus numbers, frequency histogram, every question by frequency,
/// then only the repeated ones.
pub fn question_report(tally: &QuestionTally) -> String {
    let stats = tally.stats();
    let mut out = String::new();

    let _ = writeln!(out, "THEORY QUESTION ANALYSIS");
    let _ = writeln!(out, "{}\n", rule('=', 70));
    let _ = writeln!(out, "PDFs analyzed: {}", stats.files_analyzed);
    let _ = writeln!(
        out,
        "Questions extracted: {} (repetitions included)",
        stats.total_instances
    );
    let _ = writeln!(out, "Unique questions: {}", stats.unique);
    let _ = writeln!(out, "Repeated questions: {}", stats.repeats);
    let _ = writeln!(out, "Unique share: {:.1}%", stats.unique_percent);
    let _ = writeln!(out, "Mean questions per PDF: {:.1}\n", stats.mean_per_file);

    let _ = writeln!(out, "FREQUENCY DISTRIBUTION:");
    for (freq, count) in tally.frequency_distribution().iter().rev() {
        let _ = writeln!(out, "  Frequency {freq}x: {count} questions");
    }

    let _ = writeln!(out, "\nQUESTIONS BY FREQUENCY:\n{}", rule('-', 40));
    for record in tally.ranked() {
        let _ = writeln!(out, "\n[{}x] {}", record.count, record.text);
        if record.files.len() > 1 {
            let _ = writeln!(out, "    Files: {}", record.files.join(", "));
        }
    }

    let _ = writeln!(out, "\n{}", rule('-', 60));
    let _ = writeln!(out, "REPEATED QUESTIONS ONLY (frequency > 1):");
    let _ = writeln!(out, "{}", rule('-', 60));
    let repeated = tally.repeated();
    if repeated.is_empty() {
        let _ = writeln!(out, "No repeated questions found.");
    }
    for record in repeated {
        let _ = writeln!(out, "\n[{}x] {}", record.count, record.text);
    }
    out
}
