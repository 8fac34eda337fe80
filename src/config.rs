use crate::error::{ConfigError, Result};
use crate::model::Volume;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Minimum spacing between requests, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_burst")]
    pub burst: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Upper bound used when a volume selects "all" chapters.
    #[serde(default = "default_all_chapters")]
    pub all_chapters: u32,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

/// Which chapters of a volume are swept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSelection")]
pub enum ChapterSelection {
    All,
    Only(Vec<u32>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelection {
    Keyword(String),
    List(Vec<u32>),
}

impl TryFrom<RawSelection> for ChapterSelection {
    type Error = String;

    fn try_from(raw: RawSelection) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawSelection::Keyword(word) if word.eq_ignore_ascii_case("all") => {
                Ok(ChapterSelection::All)
            }
            RawSelection::Keyword(word) => Err(format!("unknown chapter selection: {word}")),
            RawSelection::List(list) => Ok(ChapterSelection::Only(list)),
        }
    }
}

impl ChapterSelection {
    pub fn chapters(&self, all_chapters: u32) -> Vec<u32> {
        match self {
            ChapterSelection::All => (1..=all_chapters).collect(),
            ChapterSelection::Only(list) => list.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VolumeConfig {
    pub base_url: String,
    pub chapters: ChapterSelection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawVolumes")]
pub struct VolumesConfig {
    pub vol1: VolumeConfig,
    pub vol2: VolumeConfig,
    pub vol3: VolumeConfig,
}

// A volume table may set either field; the other keeps the volume's default.
#[derive(Default, Deserialize)]
struct RawVolume {
    base_url: Option<String>,
    chapters: Option<ChapterSelection>,
}

#[derive(Default, Deserialize)]
struct RawVolumes {
    #[serde(default)]
    vol1: RawVolume,
    #[serde(default)]
    vol2: RawVolume,
    #[serde(default)]
    vol3: RawVolume,
}

impl RawVolume {
    fn or_default(self, default: VolumeConfig) -> VolumeConfig {
        VolumeConfig {
            base_url: self.base_url.unwrap_or(default.base_url),
            chapters: self.chapters.unwrap_or(default.chapters),
        }
    }
}

impl From<RawVolumes> for VolumesConfig {
    fn from(raw: RawVolumes) -> Self {
        Self {
            vol1: raw.vol1.or_default(default_vol1()),
            vol2: raw.vol2.or_default(default_vol2()),
            vol3: raw.vol3.or_default(default_vol3()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub sweep: SweepConfig,

    #[serde(default)]
    pub volumes: VolumesConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            filename: default_log_filename(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            delay_ms: default_delay_ms(),
            burst: default_burst(),
            concurrency: default_concurrency(),
            request_timeout_secs: None,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            all_chapters: default_all_chapters(),
            sample_size: default_sample_size(),
        }
    }
}

impl Default for VolumesConfig {
    fn default() -> Self {
        Self {
            vol1: default_vol1(),
            vol2: default_vol2(),
            vol3: default_vol3(),
        }
    }
}

impl VolumesConfig {
    pub fn get(&self, volume: Volume) -> &VolumeConfig {
        match volume {
            Volume::Vol1 => &self.vol1,
            Volume::Vol2 => &self.vol2,
            Volume::Vol3 => &self.vol3,
        }
    }

    fn get_mut(&mut self, volume: Volume) -> &mut VolumeConfig {
        match volume {
            Volume::Vol1 => &mut self.vol1,
            Volume::Vol2 => &mut self.vol2,
            Volume::Vol3 => &mut self.vol3,
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::FileRead)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    pub fn env_var(volume: Volume) -> &'static str {
        match volume {
            Volume::Vol1 => "OPENSTAX_VOL1_URL",
            Volume::Vol2 => "OPENSTAX_VOL2_URL",
            Volume::Vol3 => "OPENSTAX_VOL3_URL",
        }
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for volume in Volume::ALL {
            if let Some(url) = lookup(Self::env_var(volume)).filter(|v| !v.trim().is_empty()) {
                self.volumes.get_mut(volume).base_url = url.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        for volume in Volume::ALL {
            let volume_config = self.volumes.get(volume);
            if !volume_config.base_url.starts_with("http") {
                return Err(ConfigError::InvalidValue(format!(
                    "base_url for {} must start with http(s): {}",
                    volume, volume_config.base_url
                ))
                .into());
            }
            if let ChapterSelection::Only(list) = &volume_config.chapters {
                if list.contains(&0) {
                    return Err(ConfigError::InvalidValue(format!(
                        "chapter numbers for {} must be positive",
                        volume
                    ))
                    .into());
                }
            }
        }

        if self.fetch.delay_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "fetch.delay_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.fetch.burst == 0 {
            return Err(ConfigError::InvalidValue(
                "fetch.burst must be greater than 0".to_string(),
            )
            .into());
        }

        if self.fetch.concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "fetch.concurrency must be greater than 0".to_string(),
            )
            .into());
        }

        if self.fetch.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "fetch.request_timeout_secs must be greater than 0".to_string(),
            )
            .into());
        }

        if self.sweep.all_chapters == 0 {
            return Err(ConfigError::InvalidValue(
                "sweep.all_chapters must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn default_user_agent() -> String {
    "PhysicsStudyHub-Scraper/1.0 (educational use)".to_string()
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_burst() -> u32 {
    1
}

fn default_concurrency() -> usize {
    1
}

fn default_all_chapters() -> u32 {
    17
}

fn default_sample_size() -> usize {
    3
}

fn default_base_url(volume: u8) -> String {
    format!("https://openstax.org/books/university-physics-volume-{volume}/pages/")
}

fn default_vol1() -> VolumeConfig {
    VolumeConfig {
        base_url: default_base_url(1),
        chapters: ChapterSelection::All,
    }
}

fn default_vol2() -> VolumeConfig {
    VolumeConfig {
        base_url: default_base_url(2),
        chapters: ChapterSelection::Only(vec![1, 2, 3, 4]),
    }
}

fn default_vol3() -> VolumeConfig {
    VolumeConfig {
        base_url: default_base_url(3),
        chapters: ChapterSelection::Only(vec![1, 2, 3, 4]),
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_filename() -> String {
    "openstax-scraper.log".to_string()
}
