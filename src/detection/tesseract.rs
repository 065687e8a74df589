use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

use super::ocr::DigitRecognizer;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tesseract CLI run in single-line mode with a character whitelist.
pub struct TesseractRecognizer {
    executable: PathBuf,
    whitelist: String,
    timeout: Option<Duration>,
}

impl TesseractRecognizer {
    pub fn new(executable: impl Into<PathBuf>, whitelist: &str, timeout: Option<Duration>) -> Self {
        Self {
            executable: executable.into(),
            whitelist: whitelist.to_string(),
            timeout,
        }
    }

    /// Use the `tesseract` found on PATH.
    pub fn locate(whitelist: &str, timeout: Option<Duration>) -> Result<Self> {
        let output = Command::new("tesseract")
            .arg("--version")
            .output()
            .context("tesseract not found on PATH")?;
        if !output.status.success() {
            return Err(anyhow!("tesseract --version failed"));
        }
        Ok(Self::new("tesseract", whitelist, timeout))
    }

    /// Arguments after the executable for one recognition of `input`.
    fn command_args(&self, input: &Path) -> Vec<OsString> {
        vec![
            input.as_os_str().to_owned(),
            "stdout".into(),
            "--oem".into(),
            "3".into(),
            "--psm".into(),
            "7".into(), // single text line
            "-c".into(),
            format!("tessedit_char_whitelist={}", self.whitelist).into(),
        ]
    }
}

impl DigitRecognizer for TesseractRecognizer {
    fn recognize(&self, patch: &GrayImage) -> Result<String> {
        let temp_input = NamedTempFile::with_suffix(".png")?;
        patch.save(temp_input.path())?;

        let mut child = Command::new(&self.executable)
            .args(self.command_args(temp_input.path()))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start {}", self.executable.display()))?;

        if let Some(timeout) = self.timeout {
            let deadline = Instant::now() + timeout;
            while child.try_wait()?.is_none() {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(anyhow!("tesseract timed out after {:?}", timeout));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args_single_line_whitelist() {
        let recognizer = TesseractRecognizer::new("tesseract", "0123456789", None);
        let args = recognizer.command_args(Path::new("/tmp/roi.png"));

        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args[0], "/tmp/roi.png");
        assert_eq!(args[1], "stdout");
        assert!(args.windows(2).any(|w| w[0] == "--psm" && w[1] == "7"));
        assert_eq!(args.last().unwrap(), "tessedit_char_whitelist=0123456789");
    }

    #[test]
    fn test_missing_executable_is_an_error() {
        let recognizer = TesseractRecognizer::new(
            "/nonexistent/tesseract-binary",
            "0123456789",
            Some(Duration::from_millis(500)),
        );
        let patch = GrayImage::new(10, 10);
        assert!(recognizer.recognize(&patch).is_err());
    }
}
