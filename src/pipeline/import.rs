use crate::error::Result;
use crate::model::{ScrapedChapter, ScrapedFormula};
use crate::utils::{ensure_directory, save_json};
use crate::{log_info, log_warn};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub chapters_imported: usize,
    pub formulas_imported: usize,
}

/// Destination for a live run's records.
///
/// Implementations resolve each formula's `ChapterRef` to whatever chapter
/// identifier the backing store assigns.
pub trait Importer {
    async fn import(
        &mut self,
        chapters: &[ScrapedChapter],
        formulas: &[ScrapedFormula],
    ) -> Result<ImportReport>;
}

/// Stand-in for the not-yet-built backend import. Persists nothing.
#[derive(Debug, Default)]
pub struct PendingImporter;

impl Importer for PendingImporter {
    async fn import(
        &mut self,
        chapters: &[ScrapedChapter],
        formulas: &[ScrapedFormula],
    ) -> Result<ImportReport> {
        log_warn!(
            "[import] Import is not implemented yet; {} chapters and {} formulas were not persisted",
            chapters.len(),
            formulas.len()
        );
        println!("Import step not implemented yet. Re-run with --dry-run to review results.");
        Ok(ImportReport::default())
    }
}

/// Writes `chapters.json` and `formulas.json` into `dir` for review.
pub fn write_snapshot(
    dir: &Path,
    chapters: &[ScrapedChapter],
    formulas: &[ScrapedFormula],
) -> Result<()> {
    ensure_directory(dir)?;
    save_json(&chapters, dir.join("chapters.json"))?;
    save_json(&formulas, dir.join("formulas.json"))?;
    log_info!(
        "[import] Wrote snapshot of {} chapters and {} formulas to {}",
        chapters.len(),
        formulas.len(),
        dir.display()
    );
    Ok(())
}
