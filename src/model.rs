use md5::{Digest, Md5};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Volume {
    #[serde(rename = "VOL1")]
    Vol1,
    #[serde(rename = "VOL2")]
    Vol2,
    #[serde(rename = "VOL3")]
    Vol3,
}

impl Volume {
    pub const ALL: [Volume; 3] = [Volume::Vol1, Volume::Vol2, Volume::Vol3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Volume::Vol1 => "VOL1",
            Volume::Vol2 => "VOL2",
            Volume::Vol3 => "VOL3",
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed reference to a chapter by its natural key.
///
/// Displays as `VOL1-CH3`, the string form downstream consumers key formulas by.
/// Resolving it to a persisted chapter id is the importer's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChapterRef {
    pub volume: Volume,
    pub number: u32,
}

impl ChapterRef {
    pub fn new(volume: Volume, number: u32) -> Self {
        Self { volume, number }
    }
}

impl fmt::Display for ChapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-CH{}", self.volume, self.number)
    }
}

impl Serialize for ChapterRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedChapter {
    pub volume: Volume,
    pub number: u32,
    pub title: String,
    pub description: String,
    pub source_url: String,
}

impl ScrapedChapter {
    pub fn chapter_ref(&self) -> ChapterRef {
        ChapterRef::new(self.volume, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedFormula {
    pub title: String,
    pub latex: String,
    pub description: String,
    #[serde(rename = "chapterId")]
    pub chapter: ChapterRef,
    pub volume: Volume,
    pub chapter_number: u32,
    pub source_url: String,
    pub hash: String,
}

impl ScrapedFormula {
    pub fn new(
        chapter: ChapterRef,
        title: String,
        latex: String,
        description: String,
        source_url: &str,
    ) -> Self {
        let hash = formula_hash(&latex);
        Self {
            title,
            latex,
            description,
            chapter,
            volume: chapter.volume,
            chapter_number: chapter.number,
            source_url: source_url.to_string(),
            hash,
        }
    }
}

/// Hex MD5 of the LaTeX with whitespace removed and letters lower-cased.
pub fn formula_hash(latex: &str) -> String {
    let normalized: String = latex
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    hex::encode(Md5::digest(normalized.as_bytes()))
}
