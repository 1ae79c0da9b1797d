use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

const CONFIG_PATH_ENV: &str = "JIGSAW_CONFIG_PATH";
const MARGIN_ENV: &str = "JIGSAW_MARGIN";
const ZOOM_STEP_ENV: &str = "JIGSAW_ZOOM_STEP";
const RENDER_OPTIMIZATION_ENV: &str = "JIGSAW_RENDER_OPTIMIZATION";

const MAX_MARGIN: u32 = 8;

/// How a dragged group is kept inside the board's pixel extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Drop the offending axis of the delta for the whole group, so members never drift apart.
    #[default]
    CancelAxis,
    /// Clamp each member's base cell into the board independently.
    Clamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    #[default]
    Scattered,
    PreSolved,
}

/// Resolved initial layout for a new board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    PreSolved,
    Scattered { seed: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PuzzleConfig {
    /// Board extent is the image size times `2 * margin + 1` on each axis.
    pub margin: u32,
    /// Snap tolerance is `min(cell_w, cell_h) / tolerance_divisor`.
    pub tolerance_divisor: f32,
    pub zoom_step: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub render_optimization: bool,
    pub clamp_policy: ClampPolicy,
    pub placement: PlacementMode,
    pub seed: Option<u64>,
    pub downscale: Option<u32>,
    pub background: [u8; 4],
    pub backdrop: [u8; 4],
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            margin: 2,
            tolerance_divisor: 5.0,
            zoom_step: 10.0 / 9.0,
            min_scale: 0.02,
            max_scale: 16.0,
            render_optimization: true,
            clamp_policy: ClampPolicy::CancelAxis,
            placement: PlacementMode::Scattered,
            seed: None,
            downscale: None,
            background: [44, 47, 51, 255],
            backdrop: [0, 0, 0, 255],
        }
    }
}

impl PuzzleConfig {
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.margin = self.margin.min(MAX_MARGIN);
        if !self.tolerance_divisor.is_finite() || self.tolerance_divisor < 1.0 {
            self.tolerance_divisor = defaults.tolerance_divisor;
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 1.0 {
            self.zoom_step = defaults.zoom_step;
        }
        if !self.min_scale.is_finite() || self.min_scale <= 0.0 {
            self.min_scale = defaults.min_scale;
        }
        if !self.max_scale.is_finite() || self.max_scale < self.min_scale {
            self.max_scale = defaults.max_scale.max(self.min_scale);
        }
        if self.downscale == Some(0) {
            self.downscale = None;
        }
        self
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<u32>(MARGIN_ENV) {
            self.margin = v;
        }
        if let Some(v) = env_parse::<f32>(ZOOM_STEP_ENV) {
            self.zoom_step = v;
        }
        if let Some(v) = env_bool(RENDER_OPTIMIZATION_ENV) {
            self.render_optimization = v;
        }
        self.sanitized()
    }

    /// Resolves the configured mode into a concrete placement, drawing a seed from the OS when
    /// none was configured.
    pub fn resolve_placement(&self) -> Placement {
        match self.placement {
            PlacementMode::PreSolved => Placement::PreSolved,
            PlacementMode::Scattered => Placement::Scattered {
                seed: self.seed.unwrap_or_else(rand::random),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV) {
            return Self::new(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| {
                    let mut p = PathBuf::from(home);
                    p.push(".config");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut path = base;
        path.push("jigsaw");
        path.push("config.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(&self) -> Result<PuzzleConfig> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file, using defaults");
                return Ok(PuzzleConfig::default());
            }
            Err(err) => return Err(err.into()),
        };
        let config = serde_json::from_slice::<PuzzleConfig>(&bytes)?;
        Ok(config.sanitized())
    }

    pub fn save(&self, config: &PuzzleConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
