//! Startup configuration read from `celeste.toml`.

use std::{ffi::CString, fs, io, path::Path};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{Size, WindowDesc, WindowStyle};

pub const CONFIG_PATH: &str = "celeste.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub context: ContextConfig,
    pub clear_color: [f32; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            context: ContextConfig::default(),
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Requested client area, not counting the frame.
    pub width: i32,
    pub height: i32,
    pub title: String,
    pub style: WindowStyle,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            title: "Celeste Window".into(),
            style: WindowStyle::Overlapped,
        }
    }
}

impl WindowConfig {
    pub fn client_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Describes a window of `size` with this title and style.
    pub fn desc(&self, size: Size) -> Result<WindowDesc, ConfigError> {
        let title = CString::new(self.title.as_str()).map_err(|_| ConfigError::Invalid {
            field: "window.title",
            reason: "contains a NUL byte".into(),
        })?;

        Ok(WindowDesc {
            size,
            title,
            style: self.style,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub major: i32,
    pub minor: i32,
    /// 0 disables multisampling.
    pub samples: i32,
    pub color_bits: i32,
    pub alpha_bits: i32,
    pub depth_bits: i32,
    pub stencil_bits: i32,
    pub debug: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            major: 4,
            minor: 6,
            samples: 4,
            color_bits: 32,
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            debug: false,
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }

            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                info!("No {} found, using defaults", path.display());
                Ok(Self::default())
            }

            Err(err) => Err(err),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.into(),
            })
        };

        if self.window.width <= 0 || self.window.height <= 0 {
            return invalid("window", "width and height must be positive");
        }

        if self.window.title.contains('\0') {
            return invalid("window.title", "contains a NUL byte");
        }

        if self.context.major < 1 || self.context.minor < 0 {
            return invalid("context", "version must be at least 1.0");
        }

        if self.context.samples < 0 {
            return invalid("context.samples", "must not be negative");
        }

        Ok(())
    }
}
