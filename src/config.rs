//! Configuration of a single generate-and-download run.
//!
//! Everything the run needs is an explicit input here: the image, the
//! prompt, the model, the generation parameters, where the video lands and
//! how long polling may take. Nothing is read from process-wide state except
//! through [`default_download_dir`].

use crate::task::{GenerationParams, PollConfig, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the download directory.
pub const DOWNLOAD_DIR_ENV: &str = "DOWNLOAD_DIR";

/// Inputs of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Local image used as the first frame.
    pub image_path: PathBuf,
    /// Text prompt, without generation flags.
    pub prompt: String,
    /// Model identifier.
    pub model: String,
    /// Appended to the prompt as `--flag value` pairs.
    pub params: GenerationParams,
    /// Ask for the last frame URL as well.
    pub return_last_frame: bool,
    /// Directory receiving `video_<ts>.mp4`.
    pub download_dir: PathBuf,
    /// Poll loop limits.
    pub poll: PollConfig,
}

impl RunConfig {
    /// Creates a config with default model, parameters and limits.
    pub fn new(image_path: impl Into<PathBuf>, prompt: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            prompt: prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            params: GenerationParams::default(),
            return_last_frame: false,
            download_dir: default_download_dir(),
            poll: PollConfig::default(),
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replaces the generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Requests the last frame URL.
    pub fn with_return_last_frame(mut self, enabled: bool) -> Self {
        self.return_last_frame = enabled;
        self
    }

    /// Sets the output directory.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Replaces the poll limits.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Path of the output file for the given timestamp.
    pub fn output_path(&self, timestamp: u64) -> PathBuf {
        self.download_dir
            .join(crate::download::timestamped_video_name(timestamp))
    }
}

/// `$DOWNLOAD_DIR`, else `~/Downloads`, else the working directory.
pub fn default_download_dir() -> PathBuf {
    resolve_download_dir(std::env::var_os(DOWNLOAD_DIR_ENV).map(PathBuf::from), dirs::home_dir())
}

fn resolve_download_dir(from_env: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    from_env
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| home.map(|h| h.join("Downloads")))
        .unwrap_or_else(|| Path::new(".").to_path_buf())
}
