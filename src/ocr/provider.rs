//! OCR Engines
//!
//! Defines the engine trait and the Tesseract implementation.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::{OcrError, RecognitionConfig};

/// OCR engine trait
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Check if the engine can be used
    async fn is_available(&self) -> bool;

    /// Recognize the text of a single encoded image under one configuration
    async fn recognize(
        &self,
        image_data: &[u8],
        config: &RecognitionConfig,
        languages: &str,
    ) -> Result<String, OcrError>;
}

/// Tesseract OCR engine driven through its command-line interface
pub struct TesseractEngine {
    /// Path to the tesseract executable
    binary_path: String,
    /// Resolution of the images fed to tesseract (`--dpi`)
    dpi: Option<u32>,
}

impl TesseractEngine {
    pub fn new(binary_path: &str) -> Self {
        Self {
            binary_path: binary_path.to_string(),
            dpi: None,
        }
    }

    /// Declare the image resolution instead of letting tesseract guess
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    /// Validate language code to prevent argument injection
    fn validate_languages(languages: &str) -> Result<(), OcrError> {
        // e.g. "eng", "por+eng", "chi_sim"
        if languages.is_empty() || languages.len() > 32 {
            return Err(OcrError::InvalidLanguage(languages.to_string()));
        }
        if languages
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && c != '+' && c != '_')
        {
            return Err(OcrError::InvalidLanguage(languages.to_string()));
        }
        Ok(())
    }

    fn command(&self, config: &RecognitionConfig, languages: &str) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        // Read the image from stdin, write text to stdout
        cmd.arg("stdin").arg("stdout");
        cmd.arg("-l").arg(languages);
        cmd.arg("--oem").arg(config.engine_mode.to_string());
        cmd.arg("--psm").arg(config.page_segmentation.to_string());
        if let Some(dpi) = self.dpi {
            cmd.arg("--dpi").arg(dpi.to_string());
        }
        cmd.arg("-c").arg("preserve_interword_spaces=1");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn is_available(&self) -> bool {
        let result = Command::new(&self.binary_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        matches!(result, Ok(status) if status.success())
    }

    async fn recognize(
        &self,
        image_data: &[u8],
        config: &RecognitionConfig,
        languages: &str,
    ) -> Result<String, OcrError> {
        Self::validate_languages(languages)?;

        let mut child = self.command(config, languages).spawn().map_err(|e| {
            OcrError::ProviderNotAvailable(format!("Failed to spawn tesseract: {}", e))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(image_data).await {
                let _ = child.kill().await;
                return Err(OcrError::ProcessingError(format!(
                    "Failed to write to tesseract stdin: {}",
                    e
                )));
            }
            if let Err(e) = stdin.flush().await {
                let _ = child.kill().await;
                return Err(OcrError::ProcessingError(format!(
                    "Failed to flush tesseract stdin: {}",
                    e
                )));
            }
            drop(stdin);
        }

        let output = child.wait_with_output().await.map_err(|e| {
            OcrError::ProcessingError(format!("Failed to wait for tesseract: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed ({}): {}",
                config.name,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Engine returning canned outputs, keyed by configuration, for tests
#[cfg(test)]
pub struct ScriptedEngine {
    /// Output per configuration name; missing names yield empty text
    pub outputs: std::collections::HashMap<&'static str, String>,
    /// Fail on the n-th call (0-based), if set
    pub fail_on_call: Option<usize>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedEngine {
    pub fn new(outputs: &[(&'static str, &str)]) -> Self {
        Self {
            outputs: outputs.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            fail_on_call: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(
        &self,
        _image_data: &[u8],
        config: &RecognitionConfig,
        _languages: &str,
    ) -> Result<String, OcrError> {
        let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(OcrError::ProcessingError("scripted failure".to_string()));
        }
        Ok(self.outputs.get(config.name).cloned().unwrap_or_default())
    }
}
