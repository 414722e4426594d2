use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP service settings
    pub server: ServerConfig,

    /// Storage roots, injected into every component that touches disk
    pub storage: StorageConfig,

    /// Transcription backend settings
    pub transcription: TranscriptionConfig,

    /// Summarizer settings (the API key comes from the environment)
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for saved notes
    pub notes_dir: PathBuf,

    /// Directory for staged temporary audio artifacts
    pub temp_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Preferred caption language (also used for on-device recognition)
    pub caption_language: String,

    /// Locale sent to the cloud recognizer
    pub cloud_language: String,

    /// Whisper CLI binary name or path
    pub whisper_binary: String,

    /// Whisper model identifier
    pub whisper_model: String,

    /// Initial audio window, in seconds, read per cloud recognition call.
    /// Longer inputs are truncated to this window.
    pub cloud_window_secs: u32,

    /// Upper bound, in seconds, on a single backend invocation
    pub backend_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Chat-completions model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                max_upload_bytes: 100 * 1024 * 1024,
            },
            storage: StorageConfig {
                notes_dir: PathBuf::from("notes"),
                temp_dir: std::env::temp_dir().join("notescribe"),
            },
            transcription: TranscriptionConfig {
                caption_language: "en".to_string(),
                cloud_language: "en-US".to_string(),
                whisper_binary: "whisper".to_string(),
                whisper_model: "base".to_string(),
                cloud_window_secs: 30,
                backend_timeout_secs: 600,
            },
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.5,
        }
    }
}

impl Config {
    /// Load configuration from file or create the default one.
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path.
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("notescribe").join("config.yaml"))
    }

    /// Validate configuration.
    fn validate(&self) -> Result<()> {
        if self.storage.notes_dir.as_os_str().is_empty() {
            anyhow::bail!("Notes directory must be configured");
        }

        if self.storage.temp_dir.as_os_str().is_empty() {
            anyhow::bail!("Temp directory must be configured");
        }

        if self.transcription.cloud_window_secs == 0 {
            anyhow::bail!("Cloud recognition window must be at least one second");
        }

        if self.transcription.backend_timeout_secs == 0 {
            anyhow::bail!("Backend timeout must be at least one second");
        }

        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("Maximum upload size must be non-zero");
        }

        Ok(())
    }

    /// Display current configuration.
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Server: {}:{}", self.server.host, self.server.port);
        println!("  Max Upload: {} bytes", self.server.max_upload_bytes);
        println!("  Notes Dir: {}", self.storage.notes_dir.display());
        println!("  Temp Dir: {}", self.storage.temp_dir.display());
        println!("  Caption Language: {}", self.transcription.caption_language);
        println!("  Whisper: {} ({})", self.transcription.whisper_binary, self.transcription.whisper_model);
        println!("  Cloud Window: {}s", self.transcription.cloud_window_secs);
        println!("  Backend Timeout: {}s", self.transcription.backend_timeout_secs);
        println!("  Summarizer Model: {}", self.summarizer.model);
    }
}
