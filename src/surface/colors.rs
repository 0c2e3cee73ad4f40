//! RGB clip-color feedback. Each grid cell has one color CC per channel
//! (red/green/blue on three dedicated MIDI channels); every call pushes all
//! three channels for all cells, no diffing.

use crate::config::SurfaceConfig;
use crate::io::midi::{self, MidiSink};
use crate::song::Song;
use crate::surface::layout::Layout;
use crate::surface::viewport::Viewport;

/// Unpack 0x00RRGGBB into 8-bit components
pub fn decode_color(packed: u32) -> (u8, u8, u8) {
    let r = ((packed >> 16) & 0xFF) as u8;
    let g = ((packed >> 8) & 0xFF) as u8;
    let b = (packed & 0xFF) as u8;
    (r, g, b)
}

/// 8-bit component to 7-bit CC value
fn cc_value(component: u8) -> u8 {
    component >> 1
}

pub struct ColorGrid {
    rows: usize,
    cols: usize,
}

impl ColorGrid {
    pub fn new(config: &SurfaceConfig) -> Self {
        Self {
            rows: config.grid_rows,
            cols: config.grid_cols,
        }
    }

    /// Push the colors of every visible clip for the window starting at
    /// `track_offset`; rows come from the viewport's current scene offset.
    /// Empty and out-of-bounds cells emit black.
    pub fn send_clip_colors<S: MidiSink>(
        &self,
        song: &Song,
        out: &mut S,
        layout: &Layout,
        track_offset: usize,
        viewport: &Viewport,
    ) {
        let config = layout.config();
        let scene_offset = viewport.scene_offset;

        for col in 0..self.cols {
            let track = track_offset + col;
            for row in 0..self.rows {
                let scene = scene_offset + row;

                let (r, g, b) = song
                    .clip(track, scene)
                    .map(|clip| decode_color(clip.color()))
                    .unwrap_or((0, 0, 0));

                let cc = layout.color_cc(row, col);
                out.send(midi::control_change(
                    config.red_channel,
                    cc,
                    cc_value(r),
                ));
                out.send(midi::control_change(
                    config.green_channel,
                    cc,
                    cc_value(g),
                ));
                out.send(midi::control_change(
                    config.blue_channel,
                    cc,
                    cc_value(b),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Capture(Vec<[u8; 3]>);

    impl MidiSink for Capture {
        fn send(&mut self, message: [u8; 3]) {
            self.0.push(message);
        }
    }

    #[test]
    fn decode_round_trip() {
        assert_eq!(decode_color(0xFF8000), (255, 128, 0));
        assert_eq!(decode_color(0x000000), (0, 0, 0));
        assert_eq!(decode_color(0x00FF00), (0, 255, 0));
    }

    #[test]
    fn sends_three_channels_for_every_cell() {
        let config = SurfaceConfig::default();
        let mut song = Song::new();
        for _ in 0..4 {
            song.add_scene();
        }
        for i in 0..8 {
            song.add_track(&format!("{}", i + 1), true);
        }
        song.create_clip(0, 0, 0xFF8000);

        let layout = Layout::new(&config);
        let colors = ColorGrid::new(&config);
        let mut out = Capture(Vec::new());

        colors.send_clip_colors(
            &song,
            &mut out,
            &layout,
            0,
            &Viewport::default(),
        );

        // 32 cells x 3 channels
        assert_eq!(out.0.len(), 96);
        // Cell (0, 0): CC 60, scaled to 7 bits per channel
        assert_eq!(out.0[0], [0xB1, 60, 127]);
        assert_eq!(out.0[1], [0xB2, 60, 64]);
        assert_eq!(out.0[2], [0xB3, 60, 0]);
        // An empty cell is pushed as black, not skipped
        assert!(out.0.contains(&[0xB1, 75, 0]));
    }
}
