use super::strategy::{Rule, Strategy, StrategyChain};
use crate::error::Result;
use crate::log_debug;
use crate::model::{ChapterRef, ScrapedChapter};
use crate::utils::truncate_chars;
use scraper::Html;

pub const CHAPTER_DESCRIPTION_LIMIT: usize = 500;

pub struct ChapterScraper<'a> {
    document: &'a Html,
}

impl<'a> ChapterScraper<'a> {
    pub(crate) fn new(document: &'a Html) -> Self {
        Self { document }
    }

    pub fn title_chain() -> StrategyChain {
        StrategyChain::new([
            Strategy::new("heading", Rule::DescendantText("h1")),
            Strategy::new(
                "title-class",
                Rule::DescendantText(".os-title, .chapter-title, .title"),
            ),
            Strategy::new(
                "document-title",
                Rule::DescendantText(r#"[data-type="document-title"]"#),
            ),
        ])
    }

    pub fn description_chain() -> StrategyChain {
        StrategyChain::new([Strategy::new("first-paragraph", Rule::FirstText("p"))])
    }

    pub fn extract(&self, chapter: ChapterRef, source_url: &str) -> Result<ScrapedChapter> {
        let root = self.document.root_element();

        let title = match Self::title_chain().first_match(root)? {
            Some(matched) => {
                log_debug!("[scraper] {} title via {}", chapter, matched.strategy);
                matched.value
            }
            None => format!("Chapter {}", chapter.number),
        };

        let description = Self::description_chain()
            .first_match(root)?
            .map(|matched| truncate_chars(&matched.value, CHAPTER_DESCRIPTION_LIMIT))
            .unwrap_or_default();

        Ok(ScrapedChapter {
            volume: chapter.volume,
            number: chapter.number,
            title,
            description,
            source_url: source_url.to_string(),
        })
    }
}
