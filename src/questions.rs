use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::AnalysisSettings;
use crate::pdf::PageTextSource;
use crate::{info_time, warn_time, Result};

/// Turns page text into cleaned question strings.
///
/// A line starting with `<digits>)` opens a new question, any other non-blank
/// line continues the open one. Lines before the first numbered line are ignored.
#[derive(Debug, Clone)]
pub struct QuestionExtractor {
    number_start: Regex,
    number_prefix: Regex,
    any_number: Regex,
    marker: Regex,
    min_len: usize,
}

impl QuestionExtractor {
    pub fn new(settings: &AnalysisSettings) -> Result<Self> {
        Ok(Self {
            number_start: Regex::new(r"^\d+\)")?,
            number_prefix: Regex::new(r"^\d+\)\s*")?,
            any_number: Regex::new(r"\d+\)")?,
            marker: Regex::new(&format!("(?i){}", regex::escape(&settings.header_marker)))?,
            min_len: settings.min_question_len,
        })
    }

    /// Raw question blocks, numbering still attached.
    pub fn blocks<'a, I>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut blocks = Vec::new();
        let mut current = String::new();

        for line in lines {
            let line = line.trim();
            if self.number_start.is_match(line) {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                current.push_str(line);
            } else if !current.is_empty() && !line.is_empty() {
                current.push(' ');
                current.push_str(line);
            }
        }
        if !current.is_empty() {
            blocks.push(current);
        }
        blocks
    }

    /// Strips the document header and the numbering from a block.
    /// Returns `None` when what is left is too short to be a question.
    ///
    /// Header handling, first occurrence of the marker:
    /// - text before it wins if there is any,
    /// - otherwise the text from the next `<digits>)` after it up to the next marker,
    /// - otherwise the block is cut at the marker.
    pub fn clean(&self, block: &str) -> Option<String> {
        let block = block.trim();
        let cleaned = match self.marker.find(block) {
            None => block,
            Some(header) => {
                let before = block[..header.start()].trim();
                if !before.is_empty() {
                    before
                } else {
                    let after = &block[header.end()..];
                    let resumed = self
                        .any_number
                        .find(after)
                        .map(|number| {
                            let rest = &after[number.start()..];
                            let end = self.marker.find(rest).map_or(rest.len(), |m| m.start());
                            rest[..end].trim()
                        })
                        .unwrap_or("");
                    if resumed.is_empty() {
                        before
                    } else {
                        resumed
                    }
                }
            }
        };

        let cleaned = self.number_prefix.replace(cleaned, "");
        let cleaned = cleaned.trim();
        if cleaned.chars().count() < self.min_len {
            return None;
        }
        Some(cleaned.to_string())
    }

    /// Reconstructs, cleans and filters every question in `text`.
    pub fn questions(&self, text: &str) -> Vec<String> {
        self.blocks(text.lines())
            .iter()
            .filter_map(|block| self.clean(block))
            .collect()
    }
}

/// One distinct question text and where it was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub text: String,
    pub count: usize,
    /// Files that contributed it, in scan order, each once.
    pub files: Vec<String>,
}

/// Exact-text frequency count over a whole corpus.
/// Two texts differing by a single character are two questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionTally {
    records: Vec<QuestionRecord>,
    positions: HashMap<String, usize>,
    files_analyzed: usize,
    total_instances: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusStats {
    pub files_analyzed: usize,
    pub total_instances: usize,
    pub unique: usize,
    pub repeats: usize,
    pub unique_percent: f64,
    pub mean_per_file: f64,
}

impl QuestionTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the questions of one file. A file with no questions still counts as analyzed.
    pub fn add_file(&mut self, filename: &str, questions: impl IntoIterator<Item = String>) {
        self.files_analyzed += 1;
        for text in questions {
            self.total_instances += 1;
            match self.positions.get(&text) {
                Some(&pos) => {
                    let record = &mut self.records[pos];
                    record.count += 1;
                    if !record.files.iter().any(|f| f == filename) {
                        record.files.push(filename.to_string());
                    }
                }
                None => {
                    self.positions.insert(text.clone(), self.records.len());
                    self.records.push(QuestionRecord {
                        text,
                        count: 1,
                        files: vec![filename.to_string()],
                    });
                }
            }
        }
    }

    pub fn get(&self, text: &str) -> Option<&QuestionRecord> {
        self.positions.get(text).map(|&pos| &self.records[pos])
    }

    /// Most frequent first; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<&QuestionRecord> {
        let mut ranked = self.records.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    pub fn repeated(&self) -> Vec<&QuestionRecord> {
        self.ranked().into_iter().filter(|r| r.count > 1).collect()
    }

    /// occurrences -> number of distinct questions seen that many times.
    pub fn frequency_distribution(&self) -> BTreeMap<usize, usize> {
        let mut dist = BTreeMap::new();
        for record in &self.records {
            *dist.entry(record.count).or_insert(0) += 1;
        }
        dist
    }

    pub fn stats(&self) -> CorpusStats {
        let unique = self.records.len();
        let ratio = |num: usize, den: usize| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };
        CorpusStats {
            files_analyzed: self.files_analyzed,
            total_instances: self.total_instances,
            unique,
            repeats: self.total_instances - unique,
            unique_percent: ratio(unique, self.total_instances) * 100.0,
            mean_per_file: ratio(self.total_instances, self.files_analyzed),
        }
    }
}

/// PDFs directly inside `folder`, sorted by file name.
pub fn pdf_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Scans every PDF of `folder`, reading only `pages`. Pages a file does not have
/// are skipped; a file that cannot be read is reported and contributes nothing.
pub fn analyze_folder<S: PageTextSource>(
    folder: &Path,
    source: &S,
    extractor: &QuestionExtractor,
    pages: &[usize],
) -> Result<QuestionTally> {
    let mut tally = QuestionTally::new();
    for path in pdf_files(folder)? {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info_time!("Scanning {filename}");

        let questions = match pages_text(source, &path, pages) {
            Ok(text) => extractor.questions(&text),
            Err(e) => {
                warn_time!("Could not read {filename}: {e}");
                Vec::new()
            }
        };
        tally.add_file(&filename, questions);
    }
    Ok(tally)
}

fn pages_text<S: PageTextSource>(source: &S, path: &Path, pages: &[usize]) -> Result<String> {
    let mut text = String::new();
    for &page in pages {
        if let Some(page_text) = source.page_text(path, page)? {
            if !page_text.is_empty() {
                text.push_str(&page_text);
                text.push('\n');
            }
        }
    }
    Ok(text)
}
