use super::{SkippedChapter, SweepResult};
use crate::model::{ScrapedChapter, ScrapedFormula, Volume};
use crate::utils::truncate_chars;
use std::collections::BTreeMap;
use std::fmt;

const SAMPLE_LATEX_CHARS: usize = 60;

/// Aggregate view of a sweep, printed in both run modes.
#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub chapters_per_volume: BTreeMap<Volume, usize>,
    pub raw_formulas: usize,
    pub unique_formulas: usize,
    pub skipped: Vec<SkippedChapter>,
    pub sample_chapters: Vec<ScrapedChapter>,
    pub sample_formulas: Vec<ScrapedFormula>,
}

impl SweepSummary {
    pub fn new(result: &SweepResult, unique: &[ScrapedFormula], sample_size: usize) -> Self {
        let mut chapters_per_volume: BTreeMap<Volume, usize> =
            Volume::ALL.iter().map(|volume| (*volume, 0)).collect();
        for chapter in &result.chapters {
            *chapters_per_volume.entry(chapter.volume).or_default() += 1;
        }

        Self {
            chapters_per_volume,
            raw_formulas: result.formulas.len(),
            unique_formulas: unique.len(),
            skipped: result.skipped.clone(),
            sample_chapters: result.chapters.iter().take(sample_size).cloned().collect(),
            sample_formulas: unique.iter().take(sample_size).cloned().collect(),
        }
    }

    pub fn total_chapters(&self) -> usize {
        self.chapters_per_volume.values().sum()
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== OpenStax Scrape Summary ===")?;

        let per_volume = self
            .chapters_per_volume
            .iter()
            .map(|(volume, count)| format!("{}: {}", volume, count))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "Chapters: {} ({})", self.total_chapters(), per_volume)?;

        writeln!(f, "Skipped chapters: {}", self.skipped.len())?;
        for skipped in &self.skipped {
            writeln!(f, "  - {} ({}): {}", skipped.chapter, skipped.url, skipped.reason)?;
        }

        writeln!(
            f,
            "Formulas: {} raw, {} unique",
            self.raw_formulas, self.unique_formulas
        )?;

        if !self.sample_chapters.is_empty() {
            writeln!(f, "Sample chapters:")?;
            for chapter in &self.sample_chapters {
                writeln!(f, "  {}  {}", chapter.chapter_ref(), chapter.title)?;
            }
        }

        if !self.sample_formulas.is_empty() {
            writeln!(f, "Sample formulas:")?;
            for formula in &self.sample_formulas {
                writeln!(
                    f,
                    "  [{}] {}: {}",
                    formula.chapter,
                    formula.title,
                    truncate_chars(&formula.latex, SAMPLE_LATEX_CHARS)
                )?;
            }
        }

        Ok(())
    }
}
