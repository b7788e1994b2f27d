//! Decoding
//!
//! Boundary to the external `sox` transcoder, which turns any supported audio
//! file into raw 8-bit unsigned mono PCM at a fixed sample rate.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

use crate::config::DecodeConfig;

/// Errors returned while running the transcoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The transcoder could not be started or its output could not be read.
    #[error("failed to run transcoder: {0}")]
    Io(#[from] std::io::Error),

    /// The transcoder ran but reported failure.
    #[error("transcoder exited with {status}: {stderr}")]
    ToolFailed {
        /// Exit status of the process.
        status: ExitStatus,
        /// Captured standard error.
        stderr: String,
    },
}

/// Invokes `sox` to decode and trim audio files.
#[derive(Debug, Clone)]
pub struct SoxDecoder {
    program: String,
    sample_rate: u32,
    start_secs: u32,
    length_secs: u32,
}

impl SoxDecoder {
    /// Decoder producing `sample_rate` Hz output, trimmed per `config`.
    pub fn new(sample_rate: u32, config: &DecodeConfig) -> Self {
        SoxDecoder {
            program: "sox".to_string(),
            sample_rate,
            start_secs: config.start_secs,
            length_secs: config.length_secs,
        }
    }

    /// Use a different executable name or path.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the transcoder for `path`.
    pub fn arguments(&self, path: &Path) -> Vec<String> {
        vec![
            path.display().to_string(),
            "-r".into(),
            self.sample_rate.to_string(),
            "-e".into(),
            "unsigned".into(),
            "-b".into(),
            "8".into(),
            "-c".into(),
            "1".into(),
            "-t".into(),
            ".raw".into(),
            "-".into(),
            "trim".into(),
            self.start_secs.to_string(),
            self.length_secs.to_string(),
        ]
    }

    /// Command that writes the decoded samples of `path` to stdout.
    pub fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.arguments(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Decode `path` into raw unsigned 8-bit samples.
    ///
    /// Returns:
    /// - `Err(Io)` if the transcoder cannot be spawned or its output read.
    /// - `Err(ToolFailed)` if it exits unsuccessfully.
    pub fn decode(&self, path: &Path) -> Result<Vec<u8>, DecodeError> {
        log::debug!("decoding {:?} with {}", path, self.program);
        let output = self.command(path).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::warn!("failed to decode {:?}: {}", path, stderr);
            return Err(DecodeError::ToolFailed {
                status: output.status,
                stderr,
            });
        }
        Ok(output.stdout)
    }
}
