use std::io::Write;

use tokio::sync::mpsc;

use crate::process::{self, RECENT_YEARS};
use crate::{Config, Error, Result};

/// Top level menu entries, keyed by the number the user types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ExtractLinks,
    Download,
    Analyze,
    FullPipeline,
    ShowStatistics,
    CleanTemp,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 7] = [
        MenuAction::ExtractLinks,
        MenuAction::Download,
        MenuAction::Analyze,
        MenuAction::FullPipeline,
        MenuAction::ShowStatistics,
        MenuAction::CleanTemp,
        MenuAction::Exit,
    ];

    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::ExtractLinks),
            "2" => Some(Self::Download),
            "3" => Some(Self::Analyze),
            "4" => Some(Self::FullPipeline),
            "5" => Some(Self::ShowStatistics),
            "6" => Some(Self::CleanTemp),
            "0" => Some(Self::Exit),
            _ => None,
        }
    }

    pub fn key(self) -> u8 {
        match self {
            Self::ExtractLinks => 1,
            Self::Download => 2,
            Self::Analyze => 3,
            Self::FullPipeline => 4,
            Self::ShowStatistics => 5,
            Self::CleanTemp => 6,
            Self::Exit => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ExtractLinks => "Extract links from the listing",
            Self::Download => "Download papers",
            Self::Analyze => "Analyze questions in the PDFs",
            Self::FullPipeline => "Run everything (full pipeline)",
            Self::ShowStatistics => "Show existing results",
            Self::CleanTemp => "Clean temporary files",
            Self::Exit => "Exit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadChoice {
    All,
    Year,
    RecentYears,
    Back,
}

impl DownloadChoice {
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::All),
            "2" => Some(Self::Year),
            "3" => Some(Self::RecentYears),
            "0" => Some(Self::Back),
            _ => None,
        }
    }
}

/// `s`, `si`, `sì`, `y`, `yes`, any case.
pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sì" | "y" | "yes"
    )
}

/// Line source for questions asked to the user.
/// Stdin is read on its own thread so a pending read never holds up the runtime.
pub struct Prompt {
    lines: mpsc::Receiver<String>,
}

impl Prompt {
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(16);
        std::thread::spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }

    /// Answers given up front, then end of input.
    pub fn scripted<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let answers = answers.into_iter().map(Into::into).collect::<Vec<String>>();
        let (tx, rx) = mpsc::channel(answers.len().max(1));
        for answer in answers {
            let _ = tx.try_send(answer);
        }
        Self { lines: rx }
    }

    pub async fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question}");
        std::io::stdout().flush()?;
        let answer = self.lines.recv().await.ok_or(Error::PromptClosed)?;
        Ok(answer.trim().to_string())
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(is_yes(&self.ask(question).await?))
    }
}

/// The interactive session: menu, dispatch, pause, repeat.
pub struct Session<'a> {
    config: &'a Config,
    prompt: Prompt,
    assume_yes: bool,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a Config, prompt: Prompt, assume_yes: bool) -> Self {
        Self {
            config,
            prompt,
            assume_yes,
        }
    }

    /// Runs until the user picks exit or input ends.
    pub async fn run(mut self) -> Result<()> {
        print_header();

        let issues = process::startup_issues(self.config);
        if !issues.is_empty() {
            println!("\nPROBLEMS FOUND:");
            for issue in &issues {
                println!("   {issue}");
            }
            println!("\nHint: check the project layout under {}", self.config.root.display());
            return Ok(());
        }

        loop {
            print_menu();
            let choice = match self.prompt.ask("Choose an option (0-6): ").await {
                Ok(choice) => choice,
                Err(Error::PromptClosed) => break,
                Err(e) => return Err(e),
            };

            match MenuAction::from_choice(&choice) {
                Some(MenuAction::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Some(action) => {
                    if let Err(e) = self.dispatch(action).await {
                        println!("✗ {} failed: {e}", action.label());
                    }
                }
                None => println!("✗ Invalid option. Pick a number from 0 to 6."),
            }

            match self.prompt.ask("\nPress ENTER to continue...").await {
                Ok(_) => {}
                Err(Error::PromptClosed) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, action: MenuAction) -> Result<()> {
        let config = self.config;
        match action {
            MenuAction::ExtractLinks => {
                process::extract_links(config).await?;
                println!("✓ Link extraction completed!");
            }
            MenuAction::Download => self.download_menu().await?,
            MenuAction::Analyze => {
                process::analyze(config).await?;
                println!("✓ Analysis completed!");
            }
            MenuAction::FullPipeline => {
                println!("\nFULL PIPELINE");
                println!("This may take a long time...");
                if !self.confirm("Continue? (s/n): ").await? {
                    println!("✗ Pipeline cancelled");
                    return Ok(());
                }
                process::run_pipeline(config).await?;
                println!("\n✓ Pipeline completed successfully!");
            }
            MenuAction::ShowStatistics => process::show_statistics(config).await?,
            MenuAction::CleanTemp => {
                process::clean_temp_files(config).await?;
            }
            MenuAction::Exit => {}
        }
        Ok(())
    }

    async fn download_menu(&mut self) -> Result<()> {
        let config = self.config;
        let index = process::load_index(config).await?;

        println!("\nDOWNLOAD OPTIONS:");
        println!("1. Download everything ({} papers)", index.total());
        println!("2. Download a single year");
        println!("3. Download the last {RECENT_YEARS} years");
        println!("0. Back to menu");
        let choice = self.prompt.ask("\nChoose an option: ").await?;

        match DownloadChoice::from_choice(&choice) {
            Some(DownloadChoice::All) => {
                println!("About to download {} files.", index.total());
                if !self.confirm("Continue? (s/n): ").await? {
                    println!("✗ Download cancelled.");
                    return Ok(());
                }
                process::download_all(config, &index).await?;
            }
            Some(DownloadChoice::Year) => {
                let year = self.prompt.ask("Year (e.g. 2024): ").await?;
                process::download_years(config, &index, &[year.as_str()]).await?;
            }
            Some(DownloadChoice::RecentYears) => {
                let years = index.recent_years(RECENT_YEARS);
                process::download_years(config, &index, &years).await?;
            }
            Some(DownloadChoice::Back) => return Ok(()),
            None => {
                println!("✗ Invalid option");
                return Ok(());
            }
        }
        println!("✓ Download completed!");
        Ok(())
    }

    async fn confirm(&mut self, question: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        self.prompt.confirm(question).await
    }
}

fn print_header() {
    println!("{}", "=".repeat(72));
    println!("   EXAM PAPER ANALYZER");
    println!("   listing -> downloads -> recurring questions");
    println!("{}", "=".repeat(72));
}

fn print_menu() {
    println!("\nMAIN MENU:");
    println!("{}", "=".repeat(40));
    // Exit is listed last.
    for action in MenuAction::ALL {
        println!("{}. {}", action.key(), action.label());
    }
    println!("{}", "-".repeat(40));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_choices_map_to_actions() {
        for action in MenuAction::ALL {
            assert_eq!(
                MenuAction::from_choice(&action.key().to_string()),
                Some(action)
            );
        }
        assert_eq!(MenuAction::from_choice(" 4 "), Some(MenuAction::FullPipeline));
        assert_eq!(MenuAction::from_choice("7"), None);
        assert_eq!(MenuAction::from_choice("exit"), None);
        assert_eq!(DownloadChoice::from_choice("3"), Some(DownloadChoice::RecentYears));
        assert_eq!(DownloadChoice::from_choice("4"), None);
    }

    #[test]
    fn yes_answers() {
        for yes in ["s", "SI", "sì", "y", " Yes "] {
            assert!(is_yes(yes), "{yes}");
        }
        for no in ["n", "no", "", "sure"] {
            assert!(!is_yes(no), "{no}");
        }
    }

    #[tokio::test]
    async fn scripted_prompt_ends_with_closed() {
        let mut prompt = Prompt::scripted([" 2024 "]);
        assert_eq!(prompt.ask("").await.unwrap(), "2024");
        assert!(matches!(prompt.ask("").await, Err(Error::PromptClosed)));
    }

    #[tokio::test]
    async fn session_stops_when_listing_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        // Nothing would be answered, the session must not ask.
        Session::new(&config, Prompt::scripted(Vec::<String>::new()), false)
            .run()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn session_survives_bad_input_and_failing_actions() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(&config.listing_file, "<html></html>").unwrap();

        // Invalid choice, analysis without PDFs, download without index, then exit.
        let answers = ["9", "", "3", "", "2", "", "0"];
        Session::new(&config, Prompt::scripted(answers), false)
            .run()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn declined_pipeline_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(&config.listing_file, "<a href=\"/arc/2023_a.pdf\">2023_a.pdf</a>").unwrap();

        Session::new(&config, Prompt::scripted(["4", "n", "", "0"]), false)
            .run()
            .await
            .unwrap();
        assert!(!config.link_index_file.exists());
    }

    #[tokio::test]
    async fn extract_links_from_the_menu() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(&config.listing_file, "<a href=\"/arc/2023_a.pdf\">2023_a.pdf</a>").unwrap();

        Session::new(&config, Prompt::scripted(["1", ""]), false)
            .run()
            .await
            .unwrap();
        assert!(config.link_index_file.exists());
        assert!(config.link_report_file.exists());
    }
}
