use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const WINDOW_TITLE: &str = "Hello World";
pub const WINDOW_SIZE: [u32; 2] = [640, 480];
pub const SHADER_PATH: &str = "res/shaders/basic.shader";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_size")]
    pub size: Size,

    #[serde(default = "default_shader_path")]
    pub shader_path: PathBuf,

    /// RGBA, 0.0..=1.0
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],

    #[serde(default = "default_fps_cap")]
    pub fps_cap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: default_title(),
            size: default_size(),
            shader_path: default_shader_path(),
            clear_color: default_clear_color(),
            fps_cap: default_fps_cap(),
        }
    }
}

fn default_title() -> String {
    WINDOW_TITLE.to_string()
}

fn default_size() -> Size {
    Size {
        width: WINDOW_SIZE[0],
        height: WINDOW_SIZE[1],
    }
}

fn default_shader_path() -> PathBuf {
    PathBuf::from(SHADER_PATH)
}

fn default_clear_color() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_fps_cap() -> u32 {
    60
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Self::load_from(&config_dir.join("trigon").join("config.toml"))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)?;
            let config = Self::from_toml(&contents)
                .with_context(|| format!("Invalid config {}", config_path.display()))?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Falls back to the defaults, logging why.
    pub fn or_default(loaded: Result<Self>) -> Self {
        loaded.unwrap_or_else(|e| {
            log::warn!("Using default config: {:#}", e);
            Config::default()
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn frame_time(&self) -> std::time::Duration {
        std::time::Duration::from_millis(1000 / u64::from(self.fps_cap.max(1)))
    }
}
