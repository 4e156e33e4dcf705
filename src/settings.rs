//! Game settings and preferences
//!
//! Persisted separately from game saves in LocalStorage.

use serde::{Deserialize, Serialize};

/// Player settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // === Visual ===
    /// Animate the dice tumble before revealing the roll
    pub dice_animation: bool,
    /// Animate token movement tile by tile
    pub token_animation: bool,
    /// Camera follows the moving token
    pub camera_follow: bool,
    /// Wormhole swirl effect on teleport
    pub wormhole_effects: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (skip tumbles, swirls, camera swoops)
    pub reduced_motion: bool,
    /// High contrast board colors
    pub high_contrast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dice_animation: true,
            token_animation: true,
            camera_follow: true,
            wormhole_effects: true,

            master_volume: 0.8,
            mute_on_blur: true,

            reduced_motion: false,
            high_contrast: false,
        }
    }
}

impl Settings {
    /// Effective dice animation (respects reduced_motion)
    pub fn effective_dice_animation(&self) -> bool {
        self.dice_animation && !self.reduced_motion
    }

    /// Effective wormhole effects (respects reduced_motion)
    pub fn effective_wormhole_effects(&self) -> bool {
        self.wormhole_effects && !self.reduced_motion
    }

    /// Effective camera follow (respects reduced_motion)
    pub fn effective_camera_follow(&self) -> bool {
        self.camera_follow && !self.reduced_motion
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "wormhole_warp_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_overrides_effects() {
        let mut settings = Settings::default();
        assert!(settings.effective_dice_animation());
        settings.reduced_motion = true;
        assert!(!settings.effective_dice_animation());
        assert!(!settings.effective_wormhole_effects());
        assert!(!settings.effective_camera_follow());
    }
}
