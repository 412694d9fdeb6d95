//! gen-episode configuration management.

use crate::audio::MergeMethod;
use crate::coordinator::default_concurrency;
use crate::text::chunker::{DEFAULT_CHUNK_SIZE, DEFAULT_COST_PER_CHAR};
use crate::tts::openai::DEFAULT_TTS_MODEL;
use crate::tts::{DEFAULT_INSTRUCTIONS, Voice};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_SCRIPT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_SCRIPT_TEMPERATURE: f32 = 0.7;
const DEFAULT_SCRIPT_MAX_TOKENS: u32 = 30000;

/// Environment variable naming the upload bucket when the config does not.
pub const BUCKET_ENV_VAR: &str = "BUCKET_NAME";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenEpisodeConfig {
    /// Maximum characters per synthesis request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Synthesis price per character, for the cost estimate
    #[serde(default = "default_cost_per_char")]
    pub cost_per_char: f64,

    /// Concurrent synthesis calls. None means min(32, cpus + 4).
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Default voice. None means a random voice per run.
    #[serde(default)]
    pub voice: Option<Voice>,

    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Delivery instruction sent with every chunk
    #[serde(default = "default_tts_instructions")]
    pub tts_instructions: String,

    #[serde(default = "default_script_model")]
    pub script_model: String,

    #[serde(default = "default_script_temperature")]
    pub script_temperature: f32,

    #[serde(default = "default_script_max_tokens")]
    pub script_max_tokens: u32,

    /// Upload bucket. None falls back to $BUCKET_NAME.
    #[serde(default)]
    pub bucket: Option<String>,

    /// Directory PDF file names are resolved against
    #[serde(default = "default_papers_dir")]
    pub papers_dir: PathBuf,

    /// Root of the per-document chunk directories
    #[serde(default = "default_chunks_root")]
    pub chunks_root: PathBuf,

    /// Directory merged episodes are written to
    #[serde(default = "default_library_root")]
    pub library_root: PathBuf,

    #[serde(default)]
    pub merge: MergeMethod,

    /// Assemble episodes even when some chunks failed
    #[serde(default)]
    pub allow_partial: bool,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_cost_per_char() -> f64 {
    DEFAULT_COST_PER_CHAR
}

fn default_tts_model() -> String {
    DEFAULT_TTS_MODEL.to_string()
}

fn default_tts_instructions() -> String {
    DEFAULT_INSTRUCTIONS.to_string()
}

fn default_script_model() -> String {
    DEFAULT_SCRIPT_MODEL.to_string()
}

fn default_script_temperature() -> f32 {
    DEFAULT_SCRIPT_TEMPERATURE
}

fn default_script_max_tokens() -> u32 {
    DEFAULT_SCRIPT_MAX_TOKENS
}

fn default_papers_dir() -> PathBuf {
    PathBuf::from("papers")
}

fn default_chunks_root() -> PathBuf {
    PathBuf::from("chunks")
}

fn default_library_root() -> PathBuf {
    PathBuf::from("lib")
}

impl Default for GenEpisodeConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            cost_per_char: default_cost_per_char(),
            concurrency: None,
            voice: None,
            tts_model: default_tts_model(),
            tts_instructions: default_tts_instructions(),
            script_model: default_script_model(),
            script_temperature: default_script_temperature(),
            script_max_tokens: default_script_max_tokens(),
            bucket: None,
            papers_dir: default_papers_dir(),
            chunks_root: default_chunks_root(),
            library_root: default_library_root(),
            merge: MergeMethod::default(),
            allow_partial: false,
        }
    }
}

impl GenEpisodeConfig {
    /// Get the config file path: ~/.config/cli-programs/gen-episode.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".config").join("cli-programs").join("gen-episode.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: GenEpisodeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        if self.concurrency == Some(0) {
            bail!("concurrency must be greater than zero");
        }
        if self.cost_per_char < 0.0 {
            bail!("cost_per_char must not be negative");
        }
        Ok(())
    }

    /// Concurrency to use, resolving the unset default.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(default_concurrency)
    }

    /// Bucket from the config, then from $BUCKET_NAME.
    pub fn resolve_bucket(&self) -> Option<String> {
        self.bucket
            .clone()
            .or_else(|| std::env::var(BUCKET_ENV_VAR).ok())
            .filter(|b| !b.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GenEpisodeConfig::default();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.cost_per_char, 15e-6);
        assert!(config.concurrency.is_none());
        assert!(config.voice.is_none());
        assert_eq!(config.tts_model, "gpt-4o-mini-tts");
        assert_eq!(config.script_model, "gpt-4.1-mini");
        assert_eq!(config.chunks_root, PathBuf::from("chunks"));
        assert_eq!(config.library_root, PathBuf::from("lib"));
        assert_eq!(config.merge, MergeMethod::Ffmpeg);
        assert!(!config.allow_partial);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_path() {
        let path = GenEpisodeConfig::config_path().unwrap();
        assert!(path.ends_with("cli-programs/gen-episode.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
chunk_size = 2000
concurrency = 8
voice = "nova"
bucket = "my-podcasts"
merge = "concat"
allow_partial = true
"#;
        let config: GenEpisodeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chunk_size, 2000);
        assert_eq!(config.concurrency, Some(8));
        assert_eq!(config.effective_concurrency(), 8);
        assert_eq!(config.voice, Some(Voice::Nova));
        assert_eq!(config.resolve_bucket().as_deref(), Some("my-podcasts"));
        assert_eq!(config.merge, MergeMethod::Concat);
        assert!(config.allow_partial);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: GenEpisodeConfig = toml::from_str("").unwrap();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.tts_instructions, DEFAULT_INSTRUCTIONS);
        assert_eq!(config.script_max_tokens, 30000);
    }

    #[test]
    fn test_parse_unknown_voice_fails() {
        assert!(toml::from_str::<GenEpisodeConfig>("voice = \"robot\"").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = GenEpisodeConfig {
            chunk_size: 0,
            ..GenEpisodeConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GenEpisodeConfig {
            concurrency: Some(0),
            ..GenEpisodeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_concurrency_used_when_unset() {
        let config = GenEpisodeConfig::default();
        assert_eq!(config.effective_concurrency(), default_concurrency());
    }

    #[test]
    fn test_round_trip() {
        let config = GenEpisodeConfig {
            voice: Some(Voice::Echo),
            concurrency: Some(4),
            ..GenEpisodeConfig::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: GenEpisodeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.voice, Some(Voice::Echo));
        assert_eq!(parsed.concurrency, Some(4));
    }
}
