//! eSpeak-backed synthesizer
//!
//! Speaks through a spawned espeak process so `speak` returns immediately and
//! `cancel` can kill playback mid-utterance.

use crate::error::{PlaybackError, PlaybackResult};
use crate::synthesizer::SpeechSynthesizer;
use crate::types::Utterance;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

// espeak's unscaled speaking rate, used to map the 1.0-normal multiplier.
const ESPEAK_BASE_WPM: f32 = 175.0;

pub struct EspeakSynthesizer {
    command: Option<String>,
    child: Option<Child>,
}

impl EspeakSynthesizer {
    pub fn new() -> Self {
        Self {
            command: None,
            child: None,
        }
    }

    /// Get the espeak command name (espeak or espeak-ng)
    async fn resolve_command() -> Option<String> {
        if Command::new("espeak").arg("--version").output().await.is_ok() {
            Some("espeak".to_string())
        } else if Command::new("espeak-ng")
            .arg("--version")
            .output()
            .await
            .is_ok()
        {
            Some("espeak-ng".to_string())
        } else {
            None
        }
    }

    /// Build espeak command arguments
    fn build_args(utterance: &Utterance) -> Vec<String> {
        let wpm = (utterance.settings.rate * ESPEAK_BASE_WPM).round() as u32;
        let pitch_value = ((utterance.settings.pitch * 50.0) as u32).min(99);
        let voice = utterance.settings.language.to_lowercase();

        vec![
            "-v".to_string(),
            voice,
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch_value.to_string(),
            utterance.text.clone(),
        ]
    }

    async fn kill_current(&mut self) {
        if let Some(mut child) = self.child.take() {
            match child.try_wait() {
                Ok(Some(_)) => {}
                _ => {
                    if let Err(e) = child.start_kill() {
                        debug!(target: "playback", "Failed to kill espeak process: {}", e);
                    }
                    let _ = child.wait().await;
                }
            }
        }
    }
}

impl Default for EspeakSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    async fn speak(&mut self, utterance: &Utterance) -> PlaybackResult<()> {
        let cmd = match &self.command {
            Some(cmd) => cmd.clone(),
            None => {
                let cmd = Self::resolve_command().await.ok_or_else(|| {
                    PlaybackError::EngineNotAvailable(
                        "eSpeak not found. Please install espeak or espeak-ng.".to_string(),
                    )
                })?;
                self.command = Some(cmd.clone());
                cmd
            }
        };

        self.kill_current().await;

        let args = Self::build_args(utterance);
        debug!(target: "playback", "Running espeak: {} {:?}", cmd, args);
        match Command::new(&cmd)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                self.child = Some(child);
                Ok(())
            }
            Err(e) => {
                warn!(target: "playback", "Failed to spawn espeak: {}", e);
                Err(PlaybackError::Io(e))
            }
        }
    }

    async fn cancel(&mut self) -> PlaybackResult<()> {
        self.kill_current().await;
        Ok(())
    }

    async fn is_available(&self) -> bool {
        Self::resolve_command().await.is_some()
    }
}
