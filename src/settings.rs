//! Tank settings
//!
//! The flat configuration record consumed by the simulation. Persisted as JSON,
//! one object per logical group.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read or write settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Swarm size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SwarmPreset {
    Sparse,
    #[default]
    Normal,
    Dense,
}

impl SwarmPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwarmPreset::Sparse => "Sparse",
            SwarmPreset::Normal => "Normal",
            SwarmPreset::Dense => "Dense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sparse" | "low" => Some(SwarmPreset::Sparse),
            "normal" | "medium" => Some(SwarmPreset::Normal),
            "dense" | "high" => Some(SwarmPreset::Dense),
            _ => None,
        }
    }

    /// Number of plankton for this preset
    pub fn plankton_count(&self) -> usize {
        match self {
            SwarmPreset::Sparse => 150,
            SwarmPreset::Normal => 500,
            SwarmPreset::Dense => 1500,
        }
    }

    /// Child bubble population cap for this preset
    pub fn max_child_bubbles(&self) -> usize {
        match self {
            SwarmPreset::Sparse => 20,
            SwarmPreset::Normal => 50,
            SwarmPreset::Dense => 100,
        }
    }
}

/// Which focus tiers the preview locater is shown for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocaterMode {
    #[default]
    Always,
    Never,
    OnlyMainBubble,
    OnlyChildBubbles,
    OnlyPlankton,
    AnythingButMainBubble,
    AnythingButPlankton,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanktonSettings {
    pub count: usize,
    /// Nominal diameter
    pub size: f32,
    /// Percentage a plankton's size may be reduced by (0-100)
    pub size_variation: f32,
    /// Regime speed: faster particles decay toward it, the life walk uses it
    pub travel: f32,
    /// Per-tick chance (0-100) of a random walk step
    pub life: f32,
    pub density: f32,
}

impl Default for PlanktonSettings {
    fn default() -> Self {
        Self {
            count: SwarmPreset::Normal.plankton_count(),
            size: 10.0,
            size_variation: 50.0,
            travel: 1.5,
            life: 5.0,
            density: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    /// Multiplicative per-tick velocity decay, in (0, 1]
    pub viscosity: f32,
    pub use_gravity: bool,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            viscosity: 0.95,
            use_gravity: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentSettings {
    pub use_current: bool,
    /// Activation threshold against a draw in [0, 1000)
    pub rate: f32,
    pub strength: f32,
    /// Percentage the strength may be reduced by (0-100)
    pub variation: f32,
    /// Static direction in degrees (0 = north)
    pub direction: f32,
    pub use_random_direction: bool,
    /// Use `acceleration`/`deceleration` instead of deriving them from viscosity
    pub use_independent_acceleration: bool,
    pub acceleration: f32,
    pub deceleration: f32,
    /// Whether the current swells and shrinks entities (the Z component)
    pub use_z_adjustment: bool,
    pub minimum_z_adjustment: f32,
    pub maximum_z_adjustment: f32,
    /// Percentage the Z step may be reduced by (0-100)
    pub z_variation: f32,
}

impl Default for CurrentSettings {
    fn default() -> Self {
        Self {
            use_current: true,
            rate: 2.0,
            strength: 4.0,
            variation: 50.0,
            direction: 90.0,
            use_random_direction: true,
            use_independent_acceleration: false,
            acceleration: 1.05,
            deceleration: 0.98,
            use_z_adjustment: true,
            minimum_z_adjustment: 0.01,
            maximum_z_adjustment: 0.05,
            z_variation: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleSettings {
    /// Nominal diameter of the main bubble; child bubbles spawn at half of it
    pub size: f32,
    /// Percentage a child bubble's size may be reduced by (0-100)
    pub size_variation: f32,
    pub max_child_bubbles: usize,
    /// Spawn threshold against a draw in [0, 100)
    pub child_bubble_rate: f32,
    /// Upward rise per tick before viscosity scaling
    pub child_bubble_buoyancy: f32,
}

impl Default for BubbleSettings {
    fn default() -> Self {
        Self {
            size: 60.0,
            size_variation: 60.0,
            max_child_bubbles: SwarmPreset::Normal.max_child_bubbles(),
            child_bubble_rate: 10.0,
            child_bubble_buoyancy: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionSettings {
    pub use_attraction: bool,
    pub attract_to_child_bubbles: bool,
    /// Reach as a multiple of the bubble radius
    pub reach: f32,
    pub strength: f32,
    /// Repel instead of attract
    pub invert: bool,
}

impl Default for AttractionSettings {
    fn default() -> Self {
        Self {
            use_attraction: false,
            attract_to_child_bubbles: false,
            reach: 3.0,
            strength: 2.0,
            invert: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeaBedSettings {
    pub use_sea_bed: bool,
    pub use_line_segments: bool,
    pub use_arc_segments: bool,
    /// Number of surface segments across the tank width
    pub segments: u32,
    /// Lowest surface point as a fraction of the tank height
    pub minimum_height: f32,
    /// Highest surface point as a fraction of the tank height
    pub maximum_height: f32,
    /// Width of the collision skin along the surface
    pub stroke_thickness: f32,
}

impl Default for SeaBedSettings {
    fn default() -> Self {
        Self {
            use_sea_bed: true,
            use_line_segments: true,
            use_arc_segments: true,
            segments: 12,
            minimum_height: 0.05,
            maximum_height: 0.2,
            stroke_thickness: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub locater_mode: LocaterMode,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            locater_mode: LocaterMode::Always,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopanSettings {
    pub use_autopan: bool,
    /// Higher sensitivity lowers the collision thresholds
    pub sensitivity: f32,
    /// Zoom change per tick
    pub speed: f32,
    pub minimum_zoom: f32,
    pub maximum_zoom: f32,
}

impl Default for AutopanSettings {
    fn default() -> Self {
        Self {
            use_autopan: true,
            sensitivity: 1.0,
            speed: 0.01,
            minimum_zoom: 1.0,
            maximum_zoom: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    /// Wall-clock budget for one tick in milliseconds
    pub tick_budget_ms: f32,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            tick_budget_ms: 15.0,
        }
    }
}

/// Complete simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub plankton: PlanktonSettings,
    pub water: WaterSettings,
    pub current: CurrentSettings,
    pub bubbles: BubbleSettings,
    pub attraction: AttractionSettings,
    pub sea_bed: SeaBedSettings,
    pub preview: PreviewSettings,
    pub autopan: AutopanSettings,
    pub performance: PerformanceSettings,
}

impl Settings {
    /// Create settings from a swarm preset (applies preset defaults)
    pub fn from_preset(preset: SwarmPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a swarm preset (updates population-dependent settings)
    pub fn apply_preset(&mut self, preset: SwarmPreset) {
        self.plankton.count = preset.plankton_count();
        self.bubbles.max_child_bubbles = preset.max_child_bubbles();
    }

    /// Check for values the simulation cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let viscosity = self.water.viscosity;
        if !(viscosity > 0.0 && viscosity <= 1.0) {
            return Err(SettingsError::Invalid {
                field: "water.viscosity",
                reason: format!("{viscosity} is outside (0, 1]"),
            });
        }
        let current = &self.current;
        for (field, value) in [
            ("current.rate", current.rate),
            ("current.strength", current.strength),
            ("current.variation", current.variation),
            ("current.direction", current.direction),
            ("current.acceleration", current.acceleration),
            ("current.deceleration", current.deceleration),
            ("current.minimum_z_adjustment", current.minimum_z_adjustment),
            ("current.maximum_z_adjustment", current.maximum_z_adjustment),
            ("current.z_variation", current.z_variation),
            ("plankton.travel", self.plankton.travel),
        ] {
            if !value.is_finite() {
                return Err(SettingsError::Invalid {
                    field,
                    reason: format!("{value} is not finite"),
                });
            }
        }
        if !(self.plankton.travel > 0.0) {
            return Err(SettingsError::Invalid {
                field: "plankton.travel",
                reason: format!("{} must be positive", self.plankton.travel),
            });
        }
        if !(self.plankton.size > 0.0) || !(self.bubbles.size > 0.0) {
            return Err(SettingsError::Invalid {
                field: "size",
                reason: "plankton and bubble sizes must be positive".to_string(),
            });
        }
        if self.autopan.minimum_zoom > self.autopan.maximum_zoom {
            return Err(SettingsError::Invalid {
                field: "autopan.minimum_zoom",
                reason: "minimum zoom exceeds maximum zoom".to_string(),
            });
        }
        if !(self.autopan.sensitivity > 0.0) {
            return Err(SettingsError::Invalid {
                field: "autopan.sensitivity",
                reason: "sensitivity must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
