mod dedup;
mod import;
mod report;

pub use dedup::dedupe;
pub use import::{write_snapshot, ImportReport, Importer, PendingImporter};
pub use report::SweepSummary;

use crate::client::Client;
use crate::config::Config;
use crate::error::Result;
use crate::model::{ChapterRef, ScrapedChapter, ScrapedFormula, Volume};
use crate::scraper::{ChapterExtraction, Scraper};
use crate::{log_debug, log_info, log_warn};
use futures::stream::{self, StreamExt};

/// One chapter page to visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTarget {
    pub chapter: ChapterRef,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChapter {
    pub chapter: ChapterRef,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    pub chapters: Vec<ScrapedChapter>,
    pub formulas: Vec<ScrapedFormula>,
    pub skipped: Vec<SkippedChapter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    DryRun,
    Live,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub chapters: Vec<ScrapedChapter>,
    pub formulas: Vec<ScrapedFormula>,
    pub summary: SweepSummary,
    pub import: Option<ImportReport>,
}

/// Chapter pages to visit, in volume then configured chapter order.
pub fn plan(config: &Config) -> Vec<ChapterTarget> {
    Volume::ALL
        .iter()
        .flat_map(|&volume| {
            let volume_config = config.volumes.get(volume);
            volume_config
                .chapters
                .chapters(config.sweep.all_chapters)
                .into_iter()
                .map(move |number| ChapterTarget {
                    chapter: ChapterRef::new(volume, number),
                    url: format!("{}{}-introduction", volume_config.base_url, number),
                })
        })
        .collect()
}

pub struct Pipeline<'a> {
    config: &'a Config,
    client: Client,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            client: Client::from_config(&config.fetch)?,
        })
    }

    /// Visits every planned chapter. A chapter that fails to fetch or parse is
    /// logged and recorded in `skipped`; it never aborts the sweep.
    pub async fn sweep(&self) -> SweepResult {
        let targets = plan(self.config);
        log_info!(
            "[pipeline] Sweeping {} chapters (concurrency {})",
            targets.len(),
            self.config.fetch.concurrency
        );

        let mut outcomes = stream::iter(targets)
            .map(|target| async move {
                let outcome = self.scrape_chapter(&target).await;
                (target, outcome)
            })
            .buffered(self.config.fetch.concurrency.max(1));

        let mut result = SweepResult::default();
        while let Some((target, outcome)) = outcomes.next().await {
            match outcome {
                Ok(extraction) => {
                    log_info!(
                        "[pipeline] {}: \"{}\" with {} formulas",
                        target.chapter,
                        extraction.chapter.title,
                        extraction.formulas.len()
                    );
                    result.chapters.push(extraction.chapter);
                    result.formulas.extend(extraction.formulas);
                }
                Err(e) => {
                    log_warn!(
                        "[pipeline] Skipping {} ({}): {}",
                        target.chapter,
                        target.url,
                        e
                    );
                    result.skipped.push(SkippedChapter {
                        chapter: target.chapter,
                        url: target.url,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log_info!(
            "[pipeline] Sweep finished: {} chapters, {} formulas, {} skipped",
            result.chapters.len(),
            result.formulas.len(),
            result.skipped.len()
        );
        result
    }

    async fn scrape_chapter(&self, target: &ChapterTarget) -> Result<ChapterExtraction> {
        let response = self.client.get(&target.url).await?;
        log_debug!(
            "[pipeline] {} responded {} ({} bytes)",
            target.url,
            response.status,
            response.content.len()
        );
        Scraper::new(&response.content).extract(target.chapter, &target.url)
    }
}

/// Sweep, deduplicate, summarize and, in live mode, hand off to `importer`.
pub async fn run<I: Importer>(config: &Config, mode: RunMode, importer: &mut I) -> Result<RunOutcome> {
    let pipeline = Pipeline::new(config)?;
    let result = pipeline.sweep().await;

    let formulas = dedupe(result.formulas.clone());
    log_info!(
        "[pipeline] Deduplicated {} formulas down to {}",
        result.formulas.len(),
        formulas.len()
    );
    let summary = SweepSummary::new(&result, &formulas, config.sweep.sample_size);

    let import = match mode {
        RunMode::DryRun => {
            log_info!("[pipeline] Dry run: nothing will be imported");
            None
        }
        RunMode::Live => Some(importer.import(&result.chapters, &formulas).await?),
    };

    Ok(RunOutcome {
        chapters: result.chapters,
        formulas,
        summary,
        import,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChapterSelection;

    fn chapter_page(title: &str, latex: &str) -> String {
        format!(
            r#"<html><body><h1>{title}</h1><p>About {title}.</p>
            <div><span data-type="equation" data-math="{latex}"></span></div>
            </body></html>"#
        )
    }

    /// Config pointing VOL1 at `base_url` with the given chapters and the
    /// other volumes at nothing.
    fn local_config(base_url: &str, chapters: Vec<u32>) -> Config {
        let mut config = Config::default();
        config.fetch.delay_ms = 1;
        config.volumes.vol1.base_url = base_url.to_string();
        config.volumes.vol1.chapters = ChapterSelection::Only(chapters);
        config.volumes.vol2.chapters = ChapterSelection::Only(Vec::new());
        config.volumes.vol3.chapters = ChapterSelection::Only(Vec::new());
        config
    }

    #[derive(Default)]
    struct CountingImporter {
        calls: usize,
        formulas: usize,
    }

    impl Importer for CountingImporter {
        async fn import(
            &mut self,
            chapters: &[ScrapedChapter],
            formulas: &[ScrapedFormula],
        ) -> Result<ImportReport> {
            self.calls += 1;
            self.formulas += formulas.len();
            Ok(ImportReport {
                chapters_imported: chapters.len(),
                formulas_imported: formulas.len(),
            })
        }
    }

    #[test]
    fn default_plan_covers_fixed_chapter_ranges() {
        let targets = plan(&Config::default());

        let numbers = |volume: Volume| -> Vec<u32> {
            targets
                .iter()
                .filter(|t| t.chapter.volume == volume)
                .map(|t| t.chapter.number)
                .collect()
        };
        assert_eq!(numbers(Volume::Vol1), (1..=17).collect::<Vec<_>>());
        assert_eq!(numbers(Volume::Vol2), vec![1, 2, 3, 4]);
        assert_eq!(numbers(Volume::Vol3), vec![1, 2, 3, 4]);
        assert_eq!(targets.len(), 25);

        assert_eq!(
            targets[0].url,
            "https://openstax.org/books/university-physics-volume-1/pages/1-introduction"
        );
        assert_eq!(
            targets[24].url,
            "https://openstax.org/books/university-physics-volume-3/pages/4-introduction"
        );
    }

    #[tokio::test]
    async fn failing_chapter_is_skipped_and_sweep_continues() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/1-introduction")
            .with_status(200)
            .with_body(chapter_page("Units", "L = 1 m"))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/2-introduction")
            .with_status(500)
            .with_body("Error")
            .create_async()
            .await;
        let third = server
            .mock("GET", "/3-introduction")
            .with_status(200)
            .with_body(chapter_page("Motion", "v = d/t"))
            .create_async()
            .await;

        let config = local_config(&format!("{}/", server.url()), vec![1, 2, 3]);
        let result = Pipeline::new(&config).unwrap().sweep().await;

        let numbers: Vec<_> = result.chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(result.chapters[1].title, "Motion");
        assert_eq!(result.formulas.len(), 2);
        assert_eq!(result.formulas[1].chapter, ChapterRef::new(Volume::Vol1, 3));

        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].chapter, ChapterRef::new(Volume::Vol1, 2));
        assert!(result.skipped[0].reason.contains("500"));

        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
    }

    #[tokio::test]
    async fn blank_page_still_yields_a_chapter() {
        let mut server = mockito::Server::new_async().await;
        let _blank = server
            .mock("GET", "/7-introduction")
            .with_status(200)
            .with_body("   ")
            .create_async()
            .await;

        let config = local_config(&format!("{}/", server.url()), vec![7]);
        let result = Pipeline::new(&config).unwrap().sweep().await;

        assert!(result.skipped.is_empty());
        assert!(result.formulas.is_empty());
        assert_eq!(result.chapters.len(), 1);
        assert_eq!(result.chapters[0].title, "Chapter 7");
        assert_eq!(result.chapters[0].description, "");
    }

    #[tokio::test]
    async fn concurrent_sweep_keeps_plan_order() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for (number, title) in [(1, "One"), (2, "Two"), (3, "Three"), (4, "Four")] {
            let mock = server
                .mock("GET", format!("/{number}-introduction").as_str())
                .with_status(200)
                .with_body(chapter_page(title, &format!("x_{number} = {number}")))
                .create_async()
                .await;
            mocks.push(mock);
        }

        let mut config = local_config(&format!("{}/", server.url()), vec![1, 2, 3, 4]);
        config.fetch.concurrency = 3;
        config.fetch.burst = 4;
        let result = Pipeline::new(&config).unwrap().sweep().await;

        let titles: Vec<_> = result.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three", "Four"]);
        assert!(result.skipped.is_empty());
    }

    #[tokio::test]
    async fn dry_run_never_calls_importer() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/1-introduction")
            .with_status(200)
            .with_body(chapter_page("Units", "F = ma"))
            .create_async()
            .await;

        let config = local_config(&format!("{}/", server.url()), vec![1]);
        let mut importer = CountingImporter::default();
        let outcome = run(&config, RunMode::DryRun, &mut importer).await.unwrap();

        assert_eq!(importer.calls, 0);
        assert!(outcome.import.is_none());
        assert_eq!(outcome.summary.total_chapters(), 1);
        assert!(outcome.summary.to_string().contains("Formulas: 1 raw, 1 unique"));
    }

    #[tokio::test]
    async fn live_run_imports_deduplicated_formulas_once() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/1-introduction")
            .with_status(200)
            .with_body(chapter_page("Forces", "F = ma"))
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/2-introduction")
            .with_status(200)
            .with_body(chapter_page("More Forces", "f = m a"))
            .create_async()
            .await;

        let config = local_config(&format!("{}/", server.url()), vec![1, 2]);
        let mut importer = CountingImporter::default();
        let outcome = run(&config, RunMode::Live, &mut importer).await.unwrap();

        assert_eq!(importer.calls, 1);
        assert_eq!(importer.formulas, 1);
        assert_eq!(outcome.summary.raw_formulas, 2);
        assert_eq!(outcome.formulas.len(), 1);
        assert_eq!(outcome.formulas[0].chapter.number, 1);
        assert_eq!(
            outcome.import,
            Some(ImportReport {
                chapters_imported: 2,
                formulas_imported: 1,
            })
        );
    }
}
