use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::task::spawn_blocking;

use crate::download::{folder_stats, DownloadSummary, Downloader};
use crate::parse::parse_listing;
use crate::pdf::LopdfSource;
use crate::questions::{analyze_folder, pdf_files, QuestionExtractor, QuestionTally};
use crate::report;
use crate::request::HttpTransport;
use crate::{info_time, warn_time, Config, Error, LinkIndex, Result};

/// How many of the latest years the "recent years" download covers.
pub const RECENT_YEARS: usize = 3;
/// Lines of the analysis report shown by [`show_statistics`].
const SUMMARY_LINES: usize = 10;
const TEMP_SKIP_DIRS: [&str; 2] = ["target", ".git"];

/// Problems that make the interactive session pointless.
pub fn startup_issues(config: &Config) -> Vec<String> {
    let mut issues = Vec::new();
    if !config.listing_file.is_file() {
        issues.push(format!(
            "✗ Listing {} not found!",
            config.display_path(&config.listing_file)
        ));
    }
    issues
}

/// Stage 1: listing page -> link index, link report and reusable JSON artifact.
pub async fn extract_links(config: &Config) -> Result<LinkIndex> {
    let start_time = Local::now();
    if !tokio::fs::try_exists(&config.listing_file).await? {
        return Err(Error::MissingInput(config.listing_file.clone()));
    }

    info_time!(
        "Extracting links from {}",
        config.display_path(&config.listing_file)
    );
    let html = tokio::fs::read_to_string(&config.listing_file).await?;
    let records = spawn_blocking({
        let origin = config.origin.clone();
        let parent_href = config.parent_href.clone();
        move || parse_listing(&html, &origin, &parent_href)
    })
    .await??;

    let index = LinkIndex::new(records)?;
    if index.is_empty() {
        warn_time!("No links found");
        return Ok(index);
    }
    info_time!("Found {} links", index.total());

    write_text(&config.link_report_file, &report::link_report(&index)).await?;
    info_time!(
        "Link report saved to {}",
        config.display_path(&config.link_report_file)
    );
    index.save(&config.link_index_file).await?;
    info_time!(
        "Link index saved to {}",
        config.display_path(&config.link_index_file)
    );

    println!("\nStatistics:");
    println!("- Total papers: {}", index.total());
    println!(
        "- Years available: {}",
        index.years().collect::<Vec<_>>().join(", ")
    );
    let mut busiest = index
        .by_year()
        .iter()
        .map(|(year, names)| (year.as_str(), names.len()))
        .collect::<Vec<_>>();
    busiest.sort_by(|a, b| b.1.cmp(&a.1));
    println!("\nTop years by number of papers:");
    for (year, count) in busiest.into_iter().take(5) {
        println!("  {year}: {count} papers");
    }

    info_time!(start_time, "Link extraction done.");
    Ok(index)
}

/// Reads back the index written by [`extract_links`].
pub async fn load_index(config: &Config) -> Result<LinkIndex> {
    LinkIndex::load(&config.link_index_file).await
}

pub fn http_downloader(config: &Config) -> Result<Downloader<HttpTransport>> {
    Ok(Downloader::new(
        HttpTransport::new(&config.download)?,
        config.download.clone(),
    ))
}

/// Stage 2: every link of the index, then a scan of what the folder holds.
pub async fn download_all(config: &Config, index: &LinkIndex) -> Result<DownloadSummary> {
    let downloader = http_downloader(config)?;
    info_time!(
        "Destination folder: {}",
        config.display_path(&config.pdf_dir)
    );
    let summary = downloader
        .download_all(index.records(), &config.pdf_dir)
        .await?;

    print!("{}", report::download_summary(&summary));
    let stats = folder_stats(&config.pdf_dir).await?;
    let folder = config.display_path(&config.pdf_dir).to_string();
    print!("{}", report::folder_report(&folder, &stats));
    Ok(summary)
}

/// Stage 2, restricted to some years. No folder scan afterwards.
pub async fn download_years(config: &Config, index: &LinkIndex, years: &[&str]) -> Result<()> {
    let downloader = http_downloader(config)?;
    for year in years {
        if years.len() > 1 {
            println!("\n--- Downloading {year} ---");
        }
        let summary = downloader
            .download_year(index, year, &config.pdf_dir)
            .await?;
        if summary.requested() > 0 {
            println!(
                "\n✓ Completed: {}/{} files of {year}",
                summary.success_count(),
                summary.requested()
            );
        }
    }
    Ok(())
}

/// Stage 3: scan the downloaded PDFs, print and save the question report.
pub async fn analyze(config: &Config) -> Result<QuestionTally> {
    let start_time = Local::now();
    if !tokio::fs::try_exists(&config.pdf_dir).await? {
        return Err(Error::MissingInput(config.pdf_dir.clone()));
    }
    let pdf_count = count_pdfs(&config.pdf_dir).await?;
    if pdf_count == 0 {
        return Err(Error::NothingToAnalyze(config.pdf_dir.clone()));
    }
    info_time!("Found {pdf_count} PDFs to analyze");

    let extractor = QuestionExtractor::new(&config.analysis)?;
    let tally = spawn_blocking({
        let folder = config.pdf_dir.clone();
        let pages = config.analysis.pages.clone();
        move || analyze_folder(&folder, &LopdfSource::new(), &extractor, &pages)
    })
    .await??;

    let text = report::question_report(&tally);
    println!("\n{text}");
    write_text(&config.analysis_report_file, &text).await?;
    info_time!(
        start_time,
        "Results saved to {}",
        config.display_path(&config.analysis_report_file)
    );
    Ok(tally)
}

/// Links, download of everything, analysis. Stops at the first failing step.
pub async fn run_pipeline(config: &Config) -> Result<()> {
    let start_time = Local::now();
    let index = step("Link extraction", extract_links(config)).await?;
    step("Download", download_all(config, &index)).await?;
    step("Question analysis", analyze(config)).await?;
    info_time!(start_time, "Pipeline completed.");
    Ok(())
}

async fn step<T>(name: &str, stage: impl Future<Output = Result<T>>) -> Result<T> {
    println!("\n{name}...");
    stage.await.map_err(|e| {
        warn_time!("Pipeline stopped at step: {name}");
        e
    })
}

/// What has been produced so far.
pub async fn show_statistics(config: &Config) -> Result<()> {
    println!("\nEXISTING RESULTS:");
    let outputs = [
        ("Link list", &config.link_report_file),
        ("Link index", &config.link_index_file),
        ("Question analysis", &config.analysis_report_file),
    ];
    for (label, path) in outputs {
        match tokio::fs::metadata(path).await {
            Ok(meta) => println!(
                "✓ {label}: {} ({} bytes)",
                config.display_path(path),
                meta.len()
            ),
            Err(_) => println!("✗ {label}: not generated yet"),
        }
    }

    let pdf_count = match tokio::fs::metadata(&config.pdf_dir).await {
        Ok(meta) if meta.is_dir() => count_pdfs(&config.pdf_dir).await?,
        _ => 0,
    };
    println!("Downloaded PDFs: {pdf_count}");

    if let Ok(text) = tokio::fs::read_to_string(&config.analysis_report_file).await {
        println!("\nAnalysis summary (first lines):\n{}", "-".repeat(40));
        let lines = text.lines().take(SUMMARY_LINES).collect::<Vec<_>>();
        for line in &lines {
            println!("{line}");
        }
        if lines.len() >= SUMMARY_LINES {
            println!(
                "... (full report in {})",
                config.display_path(&config.analysis_report_file)
            );
        }
    }
    Ok(())
}

/// Removes leftovers: `.DS_Store`, unfinished `*.part` downloads and `*.tmp` files.
pub async fn clean_temp_files(config: &Config) -> Result<Vec<PathBuf>> {
    println!("\nCleaning temporary files...");
    let root = config.root.clone();
    let removed = spawn_blocking(move || {
        let mut removed = Vec::new();
        clean_dir(&root, &mut removed)?;
        Ok::<_, Error>(removed)
    })
    .await??;

    for path in &removed {
        println!("Removed: {}", config.display_path(path));
    }
    if removed.is_empty() {
        println!("Nothing to remove");
    } else {
        println!("✓ Removed {} files", removed.len());
    }
    Ok(removed)
}

fn clean_dir(dir: &Path, removed: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if !TEMP_SKIP_DIRS.iter().any(|skip| *skip == name) {
                clean_dir(&path, removed)?;
            }
        } else if is_temp_file(&name) {
            std::fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(())
}

fn is_temp_file(name: &str) -> bool {
    name == ".DS_Store" || name.ends_with(".part") || name.ends_with(".tmp")
}

async fn count_pdfs(folder: &Path) -> Result<usize> {
    let folder = folder.to_path_buf();
    let files = spawn_blocking(move || pdf_files(&folder)).await??;
    Ok(files.len())
}

async fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_names() {
        assert!(is_temp_file(".DS_Store"));
        assert!(is_temp_file("2023_06_20.pdf.part"));
        assert!(is_temp_file("scratch.tmp"));
        assert!(!is_temp_file("2023_06_20.pdf"));
        assert!(!is_temp_file("partial.pdf"));
    }

    #[tokio::test]
    async fn counts_only_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.pdf", "b.PDF", "c.doc", "d.pdf.part"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        assert_eq!(count_pdfs(dir.path()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn statistics_without_any_output() {
        let dir = tempfile::tempdir().unwrap();
        show_statistics(&Config::new(dir.path())).await.unwrap();
    }

    #[test]
    fn missing_listing_is_a_startup_issue() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        let issues = startup_issues(&config);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("data/data.html"));
    }
}
