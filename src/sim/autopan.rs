//! Autopan: zoom the preview out while the main bubble is busy
//!
//! A banded controller over the mean of the collision history. Thresholds are
//! multiples of `1 / sensitivity`; each band moves the zoom by a whole number
//! of `speed` steps.

use super::state::SimState;
use crate::settings::AutopanSettings;

/// Next zoom factor for a mean collision rate
pub fn next_zoom(zoom: f32, mean_collisions: f32, settings: &AutopanSettings) -> f32 {
    let (min, max) = (
        settings.minimum_zoom.min(settings.maximum_zoom),
        settings.maximum_zoom.max(settings.minimum_zoom),
    );
    if settings.sensitivity.is_nan() || settings.sensitivity <= 0.0 {
        return zoom.clamp(min, max);
    }

    let inv = 1.0 / settings.sensitivity;
    let step = settings.speed;

    let zoom = if mean_collisions > 3.0 * inv && zoom < max {
        zoom + 3.0 * step
    } else if mean_collisions > 2.0 * inv && zoom < max {
        zoom + 2.0 * step
    } else if mean_collisions > inv && zoom < max {
        zoom + step
    } else if mean_collisions < 0.5 * inv && zoom > min {
        zoom - step
    } else {
        zoom
    };
    zoom.clamp(min, max)
}

/// Apply one autopan step to the state. Returns the new zoom.
pub fn autopan(state: &mut SimState, settings: &AutopanSettings) -> f32 {
    if settings.use_autopan {
        state.zoom = next_zoom(state.zoom, state.collision_history.mean(), settings);
    }
    state.zoom
}
