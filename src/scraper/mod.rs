mod chapter;
mod formula;
pub mod strategy;

pub use chapter::ChapterScraper;
pub use formula::FormulaScraper;

use crate::error::Result;
use crate::model::{ChapterRef, ScrapedChapter, ScrapedFormula};
use scraper::Html;

/// Everything extracted from one chapter page.
#[derive(Debug, Clone)]
pub struct ChapterExtraction {
    pub chapter: ScrapedChapter,
    pub formulas: Vec<ScrapedFormula>,
}

pub struct Scraper {
    document: Html,
}

impl Scraper {
    pub fn new(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    pub fn chapter(&self) -> ChapterScraper {
        ChapterScraper::new(&self.document)
    }

    pub fn formulas(&self) -> FormulaScraper {
        FormulaScraper::new(&self.document)
    }

    pub fn extract(&self, chapter: ChapterRef, source_url: &str) -> Result<ChapterExtraction> {
        Ok(ChapterExtraction {
            chapter: self.chapter().extract(chapter, source_url)?,
            formulas: self.formulas().extract(chapter, source_url)?,
        })
    }
}
