//! Server configuration.
//!
//! Values are layered with `figment`: built-in defaults, then a TOML file, then
//! environment variables prefixed with `GRAYBLOCK_` (e.g. `GRAYBLOCK_BIND_ADDR`).
//! The TOML file is `grayblock.toml` in the working directory and may be absent.
//! A path given in `GRAYBLOCK_CONFIG` must exist.
//!
//! The block size lives here and not in the request: clients cannot change how
//! coarse the pixelation is, only whoever runs the server can.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use grayblock::{DEFAULT_BLOCK_SIZE, DownscaleFilter, PixelationConfig, ToneMode};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "grayblock.toml";
pub const CONFIG_PATH_VAR: &str = "GRAYBLOCK_CONFIG";
pub const ENV_PREFIX: &str = "GRAYBLOCK_";

/// Which filter shrinks the image before it is blown back up into blocks.
///
/// Written in snake case in TOML and the environment, e.g. `catmull_rom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownscaleSetting {
    #[default]
    AreaAverage,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<DownscaleSetting> for DownscaleFilter {
    fn from(setting: DownscaleSetting) -> Self {
        match setting {
            DownscaleSetting::AreaAverage => DownscaleFilter::AreaAverage,
            DownscaleSetting::Triangle => DownscaleFilter::Triangle,
            DownscaleSetting::CatmullRom => DownscaleFilter::CatmullRom,
            DownscaleSetting::Gaussian => DownscaleFilter::Gaussian,
            DownscaleSetting::Lanczos3 => DownscaleFilter::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind_addr: String,
    /// Origins allowed to call the API from a browser. A comma-separated string
    /// is accepted so the list can be set from a single environment variable.
    #[serde(deserialize_with = "one_or_many")]
    pub allowed_origins: Vec<String>,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    pub block_size: u32,
    pub downscale: DownscaleSetting,
    /// When set, output is strict black/white cut at this gray level instead of
    /// continuous grayscale.
    pub threshold: Option<u8>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            max_upload_bytes: 10 * 1024 * 1024,
            block_size: DEFAULT_BLOCK_SIZE,
            downscale: DownscaleSetting::default(),
            threshold: None,
        }
    }
}

impl ServerConfig {
    /// The layered provider stack. Fails when `GRAYBLOCK_CONFIG` names a file
    /// that does not exist.
    pub fn figment() -> Result<Figment, figment::Error> {
        let path = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !Path::new(&path).is_file() => {
                return Err(figment::Error::from(format!(
                    "config file {path:?} named by {CONFIG_PATH_VAR} does not exist"
                )));
            }
            Ok(path) => path,
            Err(_) => DEFAULT_CONFIG_FILE.to_string(),
        };

        Ok(Figment::from(Serialized::defaults(ServerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment()?.extract()
    }

    /// The engine configuration this server runs with.
    pub fn pixelation_config(&self) -> PixelationConfig {
        let tone = match self.threshold {
            Some(level) => ToneMode::Threshold { level },
            None => ToneMode::Grayscale,
        };
        PixelationConfig {
            block_size: self.block_size,
            downscale: self.downscale.into(),
            tone,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(list) => list
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect(),
        OneOrMany::Many(origins) => origins,
    })
}
