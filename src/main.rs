use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use exam_scrap::menu::{Prompt, Session};
use exam_scrap::{info_time, process, Config, Result};

#[derive(Parser, Debug)]
#[command(name = "exam-scrap")]
#[command(version, about = "Scrape an exam paper listing, download the papers, tally recurring questions", long_about = None)]
struct Cli {
    /// Project folder holding data/, output/ and pdfs/
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Origin prefixed to the listing's relative links
    #[arg(long)]
    origin: Option<String>,

    /// Attempts per file
    #[arg(long)]
    retries: Option<u32>,

    /// Seconds to wait between two downloads
    #[arg(long)]
    delay: Option<u64>,

    /// Zero based PDF pages to scan, comma separated
    #[arg(long, value_delimiter = ',')]
    pages: Option<Vec<usize>>,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive menu (default)
    Menu,
    /// Extract links from the listing page
    Links,
    /// Download every paper, or only the papers of YEAR
    Download { year: Option<String> },
    /// Analyze the questions of the downloaded PDFs
    Analyze,
    /// Links, download and analysis in one go
    Pipeline,
    /// Show what has been produced so far
    Stats,
    /// Remove temporary files
    Clean,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(&self.root);
        if let Some(origin) = &self.origin {
            config.origin = origin.trim_end_matches('/').to_string();
        }
        if let Some(retries) = self.retries {
            config.download.max_retries = retries;
        }
        if let Some(delay) = self.delay {
            config.download.link_delay = Duration::from_secs(delay);
        }
        if let Some(pages) = &self.pages {
            config.analysis.pages = pages.clone();
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    tokio::select! {
        res = run(cli.command, &config, cli.yes) => res?,
        _ = tokio::signal::ctrl_c() => println!("\n\nInterrupted by user. Goodbye!"),
    }
    Ok(())
}

async fn run(command: Option<Command>, config: &Config, assume_yes: bool) -> Result<()> {
    let start_time = Local::now();
    match command.unwrap_or(Command::Menu) {
        Command::Menu => {
            return Session::new(config, Prompt::stdin(), assume_yes).run().await;
        }
        Command::Links => {
            process::extract_links(config).await?;
        }
        Command::Download { year: Some(year) } => {
            let index = process::load_index(config).await?;
            process::download_years(config, &index, &[year.as_str()]).await?;
        }
        Command::Download { year: None } => {
            let index = process::load_index(config).await?;
            if !assume_yes {
                println!(
                    "About to download {} files, this may take several minutes.",
                    index.total()
                );
                println!("To download a single year: exam-scrap download 2024");
                if !Prompt::stdin().confirm("\nContinue? (s/n): ").await? {
                    println!("✗ Download cancelled.");
                    return Ok(());
                }
            }
            process::download_all(config, &index).await?;
        }
        Command::Analyze => {
            process::analyze(config).await?;
        }
        Command::Pipeline => {
            if !assume_yes && !Prompt::stdin().confirm("Run the full pipeline? (s/n): ").await? {
                println!("✗ Pipeline cancelled");
                return Ok(());
            }
            process::run_pipeline(config).await?;
        }
        Command::Stats => process::show_statistics(config).await?,
        Command::Clean => {
            process::clean_temp_files(config).await?;
        }
    }
    info_time!(start_time, "Full program time:");
    Ok(())
}
