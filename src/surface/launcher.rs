//! The 4x8 launch grid: fires clip slots, mirrors per-cell playback state to
//! LEDs, and owns the per-slot/per-clip listener lifecycle. Listeners are
//! rebuilt wholesale on every viewport move and structural change; partial
//! updates are never attempted.

use crate::config::SurfaceConfig;
use crate::io::midi::{self, MidiSink};
use crate::song::{Song, SongEvent, SubscriptionToken};
use crate::surface::layout::Layout;
use crate::surface::viewport::Viewport;

/// What a launcher-owned subscription token was registered for, so the root
/// can route a notification to the right refresh.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GridListener {
    Occupancy,
    Playing,
    Color,
}

pub struct ClipGrid {
    rows: usize,
    cols: usize,
    led_off: u8,
    led_stopped: u8,
    led_playing: u8,
    led_recording: u8,
    occupancy_tokens: Vec<SubscriptionToken>,
    playing_tokens: Vec<SubscriptionToken>,
    color_tokens: Vec<SubscriptionToken>,
}

impl ClipGrid {
    pub fn new(config: &SurfaceConfig) -> Self {
        Self {
            rows: config.grid_rows,
            cols: config.grid_cols,
            led_off: config.led_off,
            led_stopped: config.led_stopped,
            led_playing: config.led_playing,
            led_recording: config.led_recording,
            occupancy_tokens: Vec::new(),
            playing_tokens: Vec::new(),
            color_tokens: Vec::new(),
        }
    }

    pub fn listener_role(
        &self,
        token: SubscriptionToken,
    ) -> Option<GridListener> {
        if self.occupancy_tokens.contains(&token) {
            return Some(GridListener::Occupancy);
        }
        if self.playing_tokens.contains(&token) {
            return Some(GridListener::Playing);
        }
        if self.color_tokens.contains(&token) {
            return Some(GridListener::Color);
        }
        None
    }

    /// Fire the clip slot behind a grid cell. Out-of-bounds cells (viewport
    /// hanging past the end of a small document) are ignored.
    pub fn launch(
        &self,
        song: &mut Song,
        viewport: Viewport,
        row: usize,
        col: usize,
    ) {
        let track = viewport.track_offset + col;
        let scene = viewport.scene_offset + row;
        if song.slot(track, scene).is_some() {
            song.fire_slot(track, scene);
        }
    }

    /// Full batch LED refresh. Per-cell priority: empty (or out of bounds)
    /// is off, recording beats playing, playing beats stopped.
    pub fn refresh_leds<S: MidiSink>(
        &self,
        song: &Song,
        out: &mut S,
        layout: &Layout,
        viewport: Viewport,
    ) {
        let channel = layout.config().clip_launch_channel;

        for col in 0..self.cols {
            let track = viewport.track_offset + col;
            for row in 0..self.rows {
                let scene = viewport.scene_offset + row;

                let led = match song.clip(track, scene) {
                    None => self.led_off,
                    Some(clip) => {
                        if clip.is_recording() {
                            self.led_recording
                        } else if clip.is_playing() {
                            self.led_playing
                        } else {
                            self.led_stopped
                        }
                    }
                };

                let note = layout.launch_note(row, col);
                out.send(midi::note_on(channel, note, led));
            }
        }
    }

    /// Tear down and re-register all grid listeners for the current window:
    /// occupancy on every visible slot, playing + color on every clip
    /// present. Occupancy changes require a full rebuild because the
    /// appearing/disappearing clip carries its own listeners.
    pub fn sync_clip_listeners(&mut self, song: &mut Song, viewport: Viewport) {
        self.clear_clip_listeners(song);

        for col in 0..self.cols {
            let track = viewport.track_offset + col;
            for row in 0..self.rows {
                let scene = viewport.scene_offset + row;

                let Some(slot) = song.slot(track, scene) else {
                    continue;
                };
                let slot_id = slot.id();
                let clip_id = slot.clip().map(|clip| clip.id());

                if !song.has_subscription(slot_id, SongEvent::SlotOccupancy) {
                    self.occupancy_tokens.push(
                        song.subscribe(slot_id, SongEvent::SlotOccupancy),
                    );
                }

                let Some(clip_id) = clip_id else {
                    continue;
                };
                if !song.has_subscription(clip_id, SongEvent::ClipPlaying) {
                    self.playing_tokens.push(
                        song.subscribe(clip_id, SongEvent::ClipPlaying),
                    );
                }
                if !song.has_subscription(clip_id, SongEvent::ClipColor) {
                    self.color_tokens
                        .push(song.subscribe(clip_id, SongEvent::ClipColor));
                }
            }
        }
    }

    /// Remove exactly the registrations this grid made; slots and clips that
    /// no longer exist are tolerated.
    pub fn clear_clip_listeners(&mut self, song: &mut Song) {
        for token in self.occupancy_tokens.drain(..) {
            song.unsubscribe(token);
        }
        for token in self.playing_tokens.drain(..) {
            song.unsubscribe(token);
        }
        for token in self.color_tokens.drain(..) {
            song.unsubscribe(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceConfig;

    struct Capture(Vec<[u8; 3]>);

    impl MidiSink for Capture {
        fn send(&mut self, message: [u8; 3]) {
            self.0.push(message);
        }
    }

    fn fixture() -> (Song, Layout, ClipGrid) {
        let config = SurfaceConfig::default();
        let mut song = Song::new();
        for _ in 0..4 {
            song.add_scene();
        }
        for i in 0..8 {
            song.add_track(&format!("{}", i + 1), true);
        }
        song.take_notifications();
        (song, Layout::new(&config), ClipGrid::new(&config))
    }

    #[test]
    fn launch_resolves_through_the_viewport() {
        let (mut song, _layout, grid) = fixture();
        song.create_clip(3, 2, 0x0000FF);
        let viewport = Viewport {
            track_offset: 1,
            scene_offset: 1,
        };

        grid.launch(&mut song, viewport, 1, 2);
        assert!(song.clip(3, 2).unwrap().is_playing());
    }

    #[test]
    fn launch_out_of_bounds_is_ignored() {
        let (mut song, _layout, grid) = fixture();
        let viewport = Viewport {
            track_offset: 4,
            scene_offset: 0,
        };
        // col 7 resolves to track 11, which does not exist
        grid.launch(&mut song, viewport, 0, 7);
        assert!(song.take_notifications().is_empty());
    }

    #[test]
    fn refresh_leds_is_idempotent_and_prioritized() {
        let (mut song, layout, grid) = fixture();
        song.create_clip(0, 0, 0xFF0000);
        song.create_clip(1, 0, 0xFF0000);
        song.create_clip(2, 0, 0xFF0000);
        song.set_clip_playing(1, 0, true);
        song.set_clip_playing(2, 0, true);
        song.set_clip_recording(2, 0, true);

        let viewport = Viewport::default();
        let mut first = Capture(Vec::new());
        grid.refresh_leds(&song, &mut first, &layout, viewport);

        assert_eq!(first.0.len(), 32);
        let config = SurfaceConfig::default();
        // (row 0, col 0) stopped, (0, 1) playing, (0, 2) recording
        assert_eq!(first.0[0], [0x94, 60, config.led_stopped]);
        assert!(first.0.contains(&[0x94, 61, config.led_playing]));
        assert!(first.0.contains(&[0x94, 62, config.led_recording]));
        // Empty cell is off
        assert!(first.0.contains(&[0x94, 75, config.led_off]));

        let mut second = Capture(Vec::new());
        grid.refresh_leds(&song, &mut second, &layout, viewport);
        assert_eq!(first.0, second.0);
    }

    #[test]
    fn listener_rebuild_is_idempotent_and_exact() {
        let (mut song, _layout, mut grid) = fixture();
        song.create_clip(0, 0, 0xFF0000);
        song.create_clip(5, 3, 0x00FF00);
        song.take_notifications();

        let viewport = Viewport::default();
        grid.sync_clip_listeners(&mut song, viewport);
        // 32 occupancy + 2 clips x (playing + color)
        assert_eq!(song.subscription_count(), 36);

        grid.sync_clip_listeners(&mut song, viewport);
        assert_eq!(song.subscription_count(), 36);

        grid.clear_clip_listeners(&mut song);
        assert_eq!(song.subscription_count(), 0);
    }

    #[test]
    fn viewport_move_rebinds_the_listener_window() {
        let (mut song, _layout, mut grid) = fixture();
        song.create_clip(0, 0, 0xFF0000);
        song.take_notifications();

        grid.sync_clip_listeners(&mut song, Viewport::default());
        assert_eq!(song.subscription_count(), 34);

        // Track 0 scrolls out of view: only 7 in-bounds columns remain and
        // the clip's listeners are gone
        let viewport = Viewport {
            track_offset: 1,
            scene_offset: 0,
        };
        grid.sync_clip_listeners(&mut song, viewport);
        assert_eq!(song.subscription_count(), 28);
    }
}
