use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Tunables for the hold geometry engine.
///
/// All distances are in unzoomed container units (logical points).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeometrySettings {
    /// Extra radius added around a hold when hit-testing pointer events.
    pub hit_padding: f32,
    /// Maximum pointer travel for a gesture to still count as a tap.
    pub tap_threshold: f32,
    /// Upper bound for the viewport zoom scale.
    pub zoom_max: f32,
    /// Diameter of a newly placed hold, as a fraction of container width.
    #[serde(default = "default_hold_diameter_fraction")]
    pub hold_diameter_fraction: f32,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            hit_padding: 10.0,
            tap_threshold: 10.0,
            zoom_max: 5.0,
            hold_diameter_fraction: default_hold_diameter_fraction(),
        }
    }
}

fn default_hold_diameter_fraction() -> f32 {
    0.08
}

/// Tunables for logbook session segmentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Two consecutive ticks further apart than this belong to different sessions.
    #[serde(default = "default_max_gap_minutes")]
    pub max_gap_minutes: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_gap_minutes: default_max_gap_minutes(),
        }
    }
}

fn default_max_gap_minutes() -> i64 {
    240
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Settings {
    pub geometry: GeometrySettings,
    pub sessions: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppPaths {
    pub root: PathBuf,
    pub library_path: PathBuf,
    pub images_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub thumbs_dir: PathBuf,
}

impl AppPaths {
    /// Resolves the platform data directory and creates the media subtree.
    pub fn discover() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| Error::Path("Failed to get app data dir".to_string()))?;
        Self::at(data_dir.join("homewall"))
    }

    /// Roots the application tree at an explicit directory.
    pub fn at(root: PathBuf) -> Result<Self> {
        let library_path = root.join("library.json");
        let images_dir = root.join("images");
        let videos_dir = root.join("videos");
        let thumbs_dir = root.join("thumbs");

        std::fs::create_dir_all(&images_dir)?;
        std::fs::create_dir_all(&videos_dir)?;
        std::fs::create_dir_all(&thumbs_dir)?;

        Ok(Self {
            root,
            library_path,
            images_dir,
            videos_dir,
            thumbs_dir,
        })
    }
}
