//! Surface configuration: grid dimensions, MIDI channel assignments, the
//! note/CC base offsets of the two hardware modules, LED values, and timing.
//!
//! Defaults describe the 8-track profile; the 4-track hardware variant only
//! changes `grid_cols`/`num_tracks` and leaves module 2 unbound.

use std::error::Error;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Visible scene rows on the grid
    pub grid_rows: usize,
    /// Visible track columns on the grid
    pub grid_cols: usize,
    /// Bound mixer channel strips (4 or 8)
    pub num_tracks: usize,

    pub main_channel: u8,
    pub red_channel: u8,
    pub green_channel: u8,
    pub blue_channel: u8,
    pub clip_launch_channel: u8,

    /// First launch note of module 1; module 2 starts 16 above
    pub clip_note_start: u8,
    /// First color CC of module 1; module 2 starts 16 above
    pub color_cc_start: u8,

    // Mixer module 1 (tracks 0-3)
    pub volume_cc_start: u8,
    pub pan_cc_start: u8,
    pub send_a_cc_start: u8,
    pub send_b_cc_start: u8,
    pub mute_note_start: u8,
    pub solo_note_start: u8,
    pub arm_note_start: u8,

    // Mixer module 2 (tracks 4-7), only bound when num_tracks > 4
    pub volume_cc_start_2: u8,
    pub pan_cc_start_2: u8,
    pub send_a_cc_start_2: u8,
    pub send_b_cc_start_2: u8,
    pub mute_note_start_2: u8,
    pub solo_note_start_2: u8,
    pub arm_note_start_2: u8,

    pub track_left_note: u8,
    pub track_right_note: u8,
    pub scene_up_note: u8,
    pub scene_down_note: u8,
    pub bank_left_note: Option<u8>,
    pub bank_right_note: Option<u8>,

    /// CC that requests a full-state resend when received with value 127
    pub trigger_cc: u8,

    pub led_off: u8,
    pub led_stopped: u8,
    pub led_playing: u8,
    pub led_recording: u8,

    /// Minimum interval between slider-touch track selections
    pub select_debounce_ms: u64,
    /// Wait before initial setup so the controller has time to boot
    pub init_delay_ms: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            grid_rows: 4,
            grid_cols: 8,
            num_tracks: 8,

            main_channel: 0,
            red_channel: 1,
            green_channel: 2,
            blue_channel: 3,
            clip_launch_channel: 4,

            clip_note_start: 60,
            color_cc_start: 60,

            volume_cc_start: 44,
            pan_cc_start: 40,
            send_a_cc_start: 32,
            send_b_cc_start: 36,
            mute_note_start: 32,
            solo_note_start: 36,
            arm_note_start: 40,

            volume_cc_start_2: 60,
            pan_cc_start_2: 56,
            send_a_cc_start_2: 48,
            send_b_cc_start_2: 52,
            mute_note_start_2: 48,
            solo_note_start_2: 52,
            arm_note_start_2: 56,

            track_left_note: 44,
            track_right_note: 45,
            scene_up_note: 46,
            scene_down_note: 47,
            bank_left_note: Some(60),
            bank_right_note: Some(61),

            trigger_cc: 127,

            led_off: 0,
            led_stopped: 1,
            led_playing: 127,
            led_recording: 120,

            select_debounce_ms: 400,
            init_delay_ms: 2_000,
        }
    }
}

impl SurfaceConfig {
    pub fn from_yaml_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_hardware_profile() {
        let config = SurfaceConfig::default();
        assert_eq!(config.grid_rows, 4);
        assert_eq!(config.grid_cols, 8);
        assert_eq!(config.clip_note_start, 60);
        assert_eq!(config.volume_cc_start_2, 60);
        assert_eq!(config.led_recording, 120);
        assert_eq!(config.select_debounce_ms, 400);
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let yaml = "grid_cols: 4\nnum_tracks: 4\nbank_left_note: null\n";
        let config: SurfaceConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.grid_cols, 4);
        assert_eq!(config.num_tracks, 4);
        assert_eq!(config.bank_left_note, None);
        // Untouched fields keep defaults
        assert_eq!(config.grid_rows, 4);
        assert_eq!(config.trigger_cc, 127);
    }
}
