use facepause_hw::CaptureRequest;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration: defaults, overlaid by an optional TOML file,
/// overlaid by `FACEPAUSE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// V4L2 device path; the user-facing camera is picked when unset.
    pub camera_device: Option<String>,
    /// Requested capture width; the driver may negotiate another.
    pub capture_width: u32,
    /// Requested capture height.
    pub capture_height: u32,
    /// Directory containing the BlazeFace ONNX model.
    pub model_dir: PathBuf,
    /// Detection tick period in milliseconds.
    pub check_interval_ms: u64,
    /// MPRIS player name (e.g. "vlc", "mpv"); first player on the bus when unset.
    pub player: Option<String>,
    /// Frames to discard after binding the camera (AGC/AE stabilization).
    pub warmup_frames: usize,
}

impl Default for Config {
    fn default() -> Self {
        let request = CaptureRequest::default();
        Self {
            camera_device: None,
            capture_width: request.width,
            capture_height: request.height,
            model_dir: facepause_core::default_model_dir(),
            check_interval_ms: 2000,
            player: None,
            warmup_frames: 2,
        }
    }
}

impl Config {
    /// Load the config file and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// A path named by `FACEPAUSE_CONFIG` must exist; the XDG default is
    /// optional.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("FACEPAUSE_CONFIG") {
            Some(path) => {
                let path = PathBuf::from(path);
                tracing::info!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            None => {
                let path = default_config_path(&lookup);
                if path.exists() {
                    tracing::info!(path = %path.display(), "loading config file");
                    Self::from_file(&path)?
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env(lookup);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Override fields from `FACEPAUSE_*` variables. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FACEPAUSE_CAMERA_DEVICE") {
            self.camera_device = Some(v);
        }
        if let Some(v) = lookup("FACEPAUSE_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FACEPAUSE_PLAYER") {
            self.player = Some(v);
        }
        parse_env(&lookup, "FACEPAUSE_CAPTURE_WIDTH", &mut self.capture_width);
        parse_env(&lookup, "FACEPAUSE_CAPTURE_HEIGHT", &mut self.capture_height);
        parse_env(&lookup, "FACEPAUSE_CHECK_INTERVAL_MS", &mut self.check_interval_ms);
        parse_env(&lookup, "FACEPAUSE_WARMUP_FRAMES", &mut self.warmup_frames);
    }

    pub fn capture_request(&self) -> CaptureRequest {
        CaptureRequest {
            width: self.capture_width,
            height: self.capture_height,
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(1))
    }

    /// Path to the BlazeFace detection model.
    pub fn model_path(&self) -> String {
        self.model_dir
            .join(facepause_core::BLAZEFACE_MODEL_FILE)
            .to_string_lossy()
            .into_owned()
    }
}

/// `$XDG_CONFIG_HOME/facepause/config.toml`, else
/// `~/.config/facepause/config.toml`.
fn default_config_path<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("facepause")
        .join("config.toml")
}

fn parse_env<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.parse() {
        Ok(v) => *target = v,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparseable environment override"),
    }
}
