use std::cell::RefCell;
use std::path::{Path, PathBuf};

use lopdf::Document;

use crate::Result;

/// "PDF file -> plain text of one page".
pub trait PageTextSource {
    /// Text of the zero based `page_index`, `None` when the document has no such page.
    fn page_text(&self, path: &Path, page_index: usize) -> Result<Option<String>>;
}

/// `lopdf` backed source. Keeps the last opened document around,
/// since pages of the same file are asked for one after the other.
#[derive(Default)]
pub struct LopdfSource {
    open: RefCell<Option<(PathBuf, Document)>>,
}

impl LopdfSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageTextSource for LopdfSource {
    fn page_text(&self, path: &Path, page_index: usize) -> Result<Option<String>> {
        let mut open = self.open.borrow_mut();
        let cached = matches!(open.as_ref(), Some((p, _)) if p == path);
        if !cached {
            let doc = Document::load(path)?;
            *open = Some((path.to_path_buf(), doc));
        }
        let Some((_, doc)) = open.as_ref() else {
            return Ok(None);
        };

        // lopdf numbers pages from 1.
        let Ok(page_number) = u32::try_from(page_index + 1) else {
            return Ok(None);
        };
        if !doc.get_pages().contains_key(&page_number) {
            return Ok(None);
        }
        Ok(Some(doc.extract_text(&[page_number])?))
    }
}
