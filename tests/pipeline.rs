use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use exam_scrap::config::{AnalysisSettings, DownloadSettings};
use exam_scrap::download::{folder_stats, Downloader};
use exam_scrap::pdf::PageTextSource;
use exam_scrap::questions::{analyze_folder, QuestionExtractor};
use exam_scrap::request::Transport;
use exam_scrap::{process, report, Config, Result};

const LISTING: &str = r#"<html><head><title>biolab.csr.unibo.it - /arc/</title></head><body>
<H1>biolab.csr.unibo.it - /arc/</H1><hr>
<pre><A HREF="/arc/">[To Parent Directory]</A><br><br>
 6/20/2023  9:12 AM       181234 <A HREF="/arc/2023_es1.pdf">2023_es1</A><br>
 7/11/2023  9:40 AM       174410 <A HREF="/arc/2023_es2.pdf">2023_es2</A><br>
 6/18/2024 10:02 AM       190021 <A HREF="/arc/2024_es1.pdf">2024_es1</A><br>
 1/09/2020  3:15 PM        40960 <A HREF="/arc/esercizi.doc">esercizi</A><br>
</pre><hr></body></html>"#;

/// Serves a file named after the URL, counting calls.
struct StaticSite {
    calls: AtomicUsize,
}

impl Transport for StaticSite {
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = format!("content of {url}");
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}

/// Page text per file name; every file has only pages 2 and 3.
struct ExamPages(HashMap<&'static str, [&'static str; 2]>);

impl PageTextSource for ExamPages {
    fn page_text(&self, path: &Path, page_index: usize) -> Result<Option<String>> {
        let name = path.file_name().unwrap().to_str().unwrap();
        let pages = self.0.get(name).copied().unwrap_or(["", ""]);
        Ok(match page_index {
            2 => Some(pages[0].to_string()),
            3 => Some(pages[1].to_string()),
            _ => None,
        })
    }
}

fn quick_download() -> DownloadSettings {
    DownloadSettings {
        retry_pause: Duration::ZERO,
        link_delay: Duration::ZERO,
        ..DownloadSettings::default()
    }
}

fn project() -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(dir.path());
    std::fs::create_dir_all(config.listing_file.parent().unwrap()).unwrap();
    std::fs::write(&config.listing_file, LISTING).unwrap();
    (dir, config)
}

#[tokio::test]
async fn listing_becomes_index_report_and_artifact() {
    let (_dir, config) = project();

    let index = process::extract_links(&config).await.unwrap();

    assert_eq!(index.total(), 4);
    assert_eq!(index.compiti_by_year("2023"), ["2023_es1", "2023_es2"]);
    assert_eq!(index.compiti_by_year("2024"), ["2024_es1"]);
    assert!(index.compiti_by_year("2020").is_empty());
    assert_eq!(
        index.url_by_name("esercizi"),
        Some("https://biolab.csr.unibo.it/arc/esercizi.doc")
    );

    let report = std::fs::read_to_string(&config.link_report_file).unwrap();
    assert!(report.contains("Total links found: 4"));
    assert!(report.contains("  2023: 2 papers\n  2024: 1 papers"));

    let reloaded = process::load_index(&config).await.unwrap();
    assert_eq!(reloaded.records(), index.records());
}

#[tokio::test]
async fn missing_listing_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(dir.path());

    let err = process::extract_links(&config).await.unwrap_err();

    assert!(matches!(err, exam_scrap::Error::MissingInput(_)));
    assert!(!config.link_report_file.exists());
    assert!(!config.link_index_file.exists());
}

#[tokio::test]
async fn download_twice_then_scan_folder() {
    let (_dir, config) = project();
    let index = process::extract_links(&config).await.unwrap();
    let downloader = Downloader::new(
        StaticSite {
            calls: AtomicUsize::new(0),
        },
        quick_download(),
    );

    let first = downloader
        .download_all(index.records(), &config.pdf_dir)
        .await
        .unwrap();
    let second = downloader
        .download_all(index.records(), &config.pdf_dir)
        .await
        .unwrap();

    assert_eq!(first.success_count(), 4);
    assert_eq!(second.success_count(), 4);
    assert_eq!(downloader.transport().calls.load(Ordering::SeqCst), 4);

    // A leftover from an earlier run shows up in the folder scan.
    std::fs::write(config.pdf_dir.join("old.pdf"), b"old").unwrap();
    let stats = folder_stats(&config.pdf_dir).await.unwrap();
    assert_eq!(stats.by_extension[".pdf"].count, 4);
    assert_eq!(stats.by_extension[".doc"].count, 1);
    let text = report::folder_report("pdfs", &stats);
    assert!(text.contains("Files in 'pdfs': 5"));
}

#[tokio::test]
async fn questions_are_tallied_across_papers() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["2023_es1.pdf", "2023_es2.pdf", "2024_es1.pdf"] {
        std::fs::write(dir.path().join(name), b"%PDF").unwrap();
    }
    let header = "Architetture degli elaboratori - Prova scritta";
    let mut pages = HashMap::new();
    pages.insert(
        "2023_es1.pdf",
        [
            "Cognome e nome\n1) Explain pipelining\nand its hazards",
            "2) What is a cache line?",
        ],
    );
    pages.insert(
        "2023_es2.pdf",
        [
            "1) Explain pipelining\nand its hazards\n2) ok",
            header,
        ],
    );
    pages.insert(
        "2024_es1.pdf",
        [
            "5) Explain pipelining and its hazards",
            "6) What is a cache line ?",
        ],
    );

    let extractor = QuestionExtractor::new(&AnalysisSettings::default()).unwrap();
    let tally = analyze_folder(dir.path(), &ExamPages(pages), &extractor, &[2, 3]).unwrap();

    let pipelining = tally.get("Explain pipelining and its hazards").unwrap();
    assert_eq!(pipelining.count, 3);
    assert_eq!(
        pipelining.files,
        vec!["2023_es1.pdf", "2023_es2.pdf", "2024_es1.pdf"]
    );
    // Not normalised: the stray space makes it another question.
    assert_eq!(tally.get("What is a cache line?").unwrap().count, 1);
    assert_eq!(tally.get("What is a cache line ?").unwrap().count, 1);
    assert!(tally.get("ok").is_none());

    let stats = tally.stats();
    assert_eq!(stats.files_analyzed, 3);
    assert_eq!(stats.total_instances, 5);
    assert_eq!(stats.unique, 3);

    let text = report::question_report(&tally);
    assert!(text.contains(
        "[3x] Explain pipelining and its hazards\n    \
         Files: 2023_es1.pdf, 2023_es2.pdf, 2024_es1.pdf"
    ));
}

#[tokio::test]
async fn analysis_needs_pdfs() {
    let (_dir, config) = project();
    std::fs::create_dir_all(&config.pdf_dir).unwrap();

    let err = process::analyze(&config).await.unwrap_err();

    assert!(matches!(err, exam_scrap::Error::NothingToAnalyze(_)));
}

#[tokio::test]
async fn clean_removes_partial_downloads_only() {
    let (_dir, config) = project();
    std::fs::create_dir_all(&config.pdf_dir).unwrap();
    std::fs::write(config.pdf_dir.join("2023_es1.pdf"), b"done").unwrap();
    std::fs::write(config.pdf_dir.join("2023_es2.pdf.part"), b"half").unwrap();
    std::fs::write(config.root.join(".DS_Store"), b"").unwrap();

    let removed = process::clean_temp_files(&config).await.unwrap();

    assert_eq!(removed.len(), 2);
    assert!(config.pdf_dir.join("2023_es1.pdf").exists());
    assert!(!config.pdf_dir.join("2023_es2.pdf.part").exists());
    assert!(config.listing_file.exists());
}

