use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Which enumerated camera to open (0 = first attached device).
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Requested wire format: "yuyv" or "mjpeg". Negotiation picks the
    /// closest profile the device actually supports.
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_dir")]
    pub dir: String,
    #[serde(default)]
    pub save_raw: bool,
    #[serde(default = "default_save_jpeg")]
    pub save_jpeg: bool,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Persist every Nth frame of the stream.
    #[serde(default = "default_sample_every")]
    pub sample_every: u32,
    /// How long to stream before stopping.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { index: 0 }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            format: default_format(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            save_raw: false,
            save_jpeg: default_save_jpeg(),
            jpeg_quality: default_jpeg_quality(),
            sample_every: default_sample_every(),
            duration_secs: default_duration_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Load a config file, falling back to built-in defaults when the file
    /// does not exist. A present-but-invalid file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// Default value functions: 1280x720 YUYV at 8 fps, 90% JPEG quality, one
// snapshot per second of stream, ten-second session.
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_fps() -> u32 {
    8
}
fn default_format() -> String {
    "yuyv".into()
}
fn default_dir() -> String {
    ".".into()
}
fn default_save_jpeg() -> bool {
    true
}
fn default_jpeg_quality() -> u8 {
    90
}
fn default_sample_every() -> u32 {
    8
}
fn default_duration_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.camera.index, 0);
        assert_eq!(config.stream.width, 1280);
        assert_eq!(config.stream.height, 720);
        assert_eq!(config.stream.fps, 8);
        assert_eq!(config.stream.format, "yuyv");
        assert!(!config.output.save_raw);
        assert!(config.output.save_jpeg);
        assert_eq!(config.output.jpeg_quality, 90);
        assert_eq!(config.output.sample_every, 8);
        assert_eq!(config.output.duration_secs, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [stream]
            width = 640
            height = 480
            format = "mjpeg"

            [output]
            save_raw = true
            "#,
        )
        .unwrap();
        assert_eq!(config.stream.width, 640);
        assert_eq!(config.stream.height, 480);
        // fps was not set
        assert_eq!(config.stream.fps, 8);
        assert_eq!(config.stream.format, "mjpeg");
        assert!(config.output.save_raw);
        assert!(config.output.save_jpeg);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/framesnap.toml")).unwrap();
        assert_eq!(config.stream.width, 1280);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = toml::from_str::<Config>("[stream]\nwidth = \"wide\"");
        assert!(err.is_err());
    }
}
