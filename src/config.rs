use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub audio: AudioConfig,
    pub speech: SpeechConfig,
    pub autosave: AutosaveConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the notes blob and the theme preference file
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the hosted speech/polish API
    pub api_base: String,
    /// Model name used in the request path
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutosaveConfig {
    /// Trailing debounce window for edits, in milliseconds
    pub debounce_ms: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "voicenotes".to_string(),
                http: HttpConfig {
                    bind: "127.0.0.1".to_string(),
                    port: 8787,
                },
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
            },
            audio: AudioConfig {
                sample_rate: 16000,
                channels: 1,
            },
            speech: SpeechConfig {
                api_base: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-2.5-flash".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
            },
            autosave: AutosaveConfig { debounce_ms: 1500 },
        }
    }
}
