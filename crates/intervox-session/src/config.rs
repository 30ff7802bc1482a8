use config::{Config, Environment, File};
use intervox_capture::CaptureConfig;
use intervox_playback::VoiceSettings;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing;

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureSettings {
    pub enabled: bool,
    pub language: String,
    pub silence_timeout_secs: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            enabled: true,
            language: "en-US".to_string(),
            silence_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackSettings {
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        PlaybackSettings {
            language: "en-US".to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the interview backend
    pub base_url: String,
    /// Local deadline on start and turn requests, in seconds
    pub submit_deadline_secs: u64,
    /// Pause between the spoken greeting and the first question
    pub greeting_delay_ms: u64,
    /// Pause before a newly arrived question is spoken
    pub question_delay_ms: u64,
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub playback: PlaybackSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: "http://127.0.0.1:8000".to_string(),
            submit_deadline_secs: 60,
            greeting_delay_ms: 3000,
            question_delay_ms: 50,
            capture: CaptureSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a specific config file path (for tests)
    pub fn from_path(config_path: impl AsRef<Path>) -> Result<Self, String> {
        let mut builder = Config::builder();

        // Set defaults for required fields to prevent deserialization errors.
        builder = builder
            .set_default("base_url", "http://127.0.0.1:8000").unwrap()
            .set_default("submit_deadline_secs", 60).unwrap()
            .set_default("greeting_delay_ms", 3000).unwrap()
            .set_default("question_delay_ms", 50).unwrap();

        // Add the specific file source.
        builder = builder.add_source(File::from(config_path.as_ref()).required(true));

        // Add environment variables, which will override the file's settings.
        builder = builder.add_source(Environment::with_prefix("INTERVOX").separator("__"));

        // Build and deserialize
        let config = builder.build().map_err(|e| format!("Failed to build config: {}", e))?;

        let mut settings: Settings = config.try_deserialize().map_err(|e| format!("Failed to deserialize settings: {}", e))?;

        // Validate the final settings
        settings.validate()?;

        Ok(settings)
    }

    pub fn new() -> Result<Self, String> {
        let mut builder = Config::builder();

        // Set defaults for required fields to prevent deserialization errors if no config file is found.
        builder = builder
            .set_default("base_url", "http://127.0.0.1:8000").unwrap()
            .set_default("submit_deadline_secs", 60).unwrap()
            .set_default("greeting_delay_ms", 3000).unwrap()
            .set_default("question_delay_ms", 50).unwrap();

        // Find and add config file source.
        let config_path = Path::new("config/default.toml");
        if config_path.exists() {
            tracing::info!("Loading configuration from: {}", config_path.display());
            builder = builder.add_source(File::from(config_path).required(true));
        } else {
            tracing::warn!("No configuration file at 'config/default.toml'. Using defaults and environment variables.");
        }

        // Add environment variables, which will override the file's settings.
        builder = builder.add_source(Environment::with_prefix("INTERVOX").separator("__"));

        // Build and deserialize
        let config = builder.build().map_err(|e| format!("Failed to build config: {}", e))?;

        let mut settings: Settings = config.try_deserialize().map_err(|e| format!("Failed to deserialize settings: {}", e))?;

        // Validate the final settings
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&mut self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.base_url.trim().is_empty() {
            errors.push("base_url must not be empty".to_string());
        }
        if self.submit_deadline_secs == 0 {
            tracing::warn!("Invalid submit_deadline_secs 0. Clamping to 60.");
            self.submit_deadline_secs = 60;
        }

        // Validate capture settings
        if self.capture.silence_timeout_secs == 0 {
            tracing::warn!("Invalid capture silence_timeout_secs 0. Clamping to 10.");
            self.capture.silence_timeout_secs = 10;
        }
        if self.capture.language.trim().is_empty() {
            tracing::warn!("Empty capture language. Defaulting to 'en-US'.");
            self.capture.language = "en-US".to_string();
        }

        // Validate playback settings
        if self.playback.rate <= 0.0 || self.playback.rate > 4.0 {
            tracing::warn!("Invalid playback rate {}. Clamping to 1.0.", self.playback.rate);
            self.playback.rate = 1.0;
        }
        if self.playback.pitch < 0.0 || self.playback.pitch > 2.0 {
            tracing::warn!("Invalid playback pitch {}. Clamping to 1.0.", self.playback.pitch);
            self.playback.pitch = 1.0;
        }

        if !errors.is_empty() {
            let error_msg = format!("Critical config validation errors: {:?}", errors);
            return Err(error_msg);
        }

        tracing::info!("Configuration validation completed successfully.");

        Ok(())
    }

    pub fn submit_deadline(&self) -> Duration {
        Duration::from_secs(self.submit_deadline_secs)
    }

    pub fn greeting_delay(&self) -> Duration {
        Duration::from_millis(self.greeting_delay_ms)
    }

    pub fn question_delay(&self) -> Duration {
        Duration::from_millis(self.question_delay_ms)
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            enabled: self.capture.enabled,
            language: self.capture.language.clone(),
            silence_timeout: Duration::from_secs(self.capture.silence_timeout_secs),
        }
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            language: self.playback.language.clone(),
            rate: self.playback.rate,
            pitch: self.playback.pitch,
        }
    }
}
