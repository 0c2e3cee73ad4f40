//! The control-surface composition root. Owns the viewport, the address
//! table, and every component; routes incoming MIDI to component handlers
//! and document notifications to the refreshes they imply.

pub mod colors;
pub mod launcher;
pub mod layout;
pub mod mixer;
pub mod navigation;
pub mod viewport;

use std::time::Instant;

use crate::config::SurfaceConfig;
use crate::core::prelude::*;
use crate::io::midi::{self, MidiSink};
use crate::song::{EntityId, Notification, Song, SongEvent, SubscriptionToken};
use colors::ColorGrid;
use launcher::{ClipGrid, GridListener};
use layout::{ControlAddress, ControlId, Layout, MessageKind};
use mixer::MixerStrip;
use navigation::{NavContext, Navigation};
use viewport::Viewport;

pub struct ControlSurface {
    layout: Layout,
    viewport: Viewport,
    mixer: MixerStrip,
    launcher: ClipGrid,
    colors: ColorGrid,
    navigation: Navigation,
    structural_tokens: Vec<SubscriptionToken>,
}

impl ControlSurface {
    pub fn new(config: &SurfaceConfig) -> Self {
        Self {
            layout: Layout::new(config),
            viewport: Viewport::default(),
            mixer: MixerStrip::new(config),
            launcher: ClipGrid::new(config),
            colors: ColorGrid::new(config),
            navigation: Navigation::new(config),
            structural_tokens: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Wire everything up against the document and push the complete initial
    /// state. Mutations performed here run inside the document's setup scope
    /// so no notifications echo back into the surface mid-construction.
    pub fn init<S: MidiSink>(&mut self, song: &mut Song, out: &mut S) {
        song.with_setup(|song| {
            for event in [SongEvent::TracksChanged, SongEvent::ScenesChanged] {
                if !song.has_subscription(EntityId::SONG, event) {
                    self.structural_tokens
                        .push(song.subscribe(EntityId::SONG, event));
                }
            }

            self.mixer.sync_track_listeners(song);
            self.launcher.sync_clip_listeners(song, self.viewport);
            song.set_highlight(
                self.viewport.track_offset,
                self.viewport.scene_offset,
            );
        });

        self.colors.send_clip_colors(
            song,
            out,
            &self.layout,
            self.viewport.track_offset,
            &self.viewport,
        );
        self.send_full_state(song, out);

        info!("Grid mixer & launch control ready");
    }

    /// Tear down every registration this surface made. Safe to call with
    /// entities already gone.
    pub fn disconnect(&mut self, song: &mut Song) {
        for token in self.structural_tokens.drain(..) {
            song.unsubscribe(token);
        }
        self.mixer.clear_track_listeners(song);
        self.launcher.clear_clip_listeners(song);
        info!("Grid mixer & launch control disconnected");
    }

    /// Mixer values plus all LEDs, as requested by the trigger CC
    pub fn send_full_state<S: MidiSink>(&self, song: &Song, out: &mut S) {
        self.mixer.send_full_state(song, out, &self.layout);
        self.launcher
            .refresh_leds(song, out, &self.layout, self.viewport);
    }

    //--------------------------------------------------------------------------
    // Input dispatch
    //--------------------------------------------------------------------------

    /// Decode one raw MIDI message and run the bound handler. Note-offs and
    /// unbound addresses are ignored.
    pub fn handle_midi<S: MidiSink>(
        &mut self,
        song: &mut Song,
        out: &mut S,
        now: Instant,
        message: &[u8],
    ) {
        if message.len() < 3 {
            return;
        }
        let (status, number, value) = (message[0], message[1], message[2]);

        let kind = if midi::is_note_on(status) && value > 0 {
            MessageKind::Note
        } else if midi::is_control_change(status) {
            MessageKind::ControlChange
        } else {
            return;
        };

        let address = ControlAddress {
            kind,
            channel: midi::channel(status),
            number,
        };
        let Some(control) = self.layout.lookup(address) else {
            trace!("Unbound address: {:?}", address);
            return;
        };

        match control {
            ControlId::Launch { row, col } => {
                self.launcher.launch(song, self.viewport, row, col);
            }
            ControlId::Slider { index, param } => {
                self.mixer.apply_slider(song, index, param, value, now);
            }
            ControlId::Toggle { index, attr } => {
                self.mixer.toggle(song, out, &self.layout, index, attr);
            }
            ControlId::TrackLeft => {
                self.navigate(song, out, |nav, ctx| nav.move_track(ctx, -1));
            }
            ControlId::TrackRight => {
                self.navigate(song, out, |nav, ctx| nav.move_track(ctx, 1));
            }
            ControlId::SceneUp => {
                self.navigate(song, out, |nav, ctx| nav.move_scene(ctx, -1));
            }
            ControlId::SceneDown => {
                self.navigate(song, out, |nav, ctx| nav.move_scene(ctx, 1));
            }
            ControlId::BankLeft => {
                self.navigate(song, out, |nav, ctx| nav.bank(ctx, -1));
            }
            ControlId::BankRight => {
                self.navigate(song, out, |nav, ctx| nav.bank(ctx, 1));
            }
            ControlId::Trigger => {
                if value == 127 {
                    self.send_full_state(song, out);
                    info!("Full state sent");
                }
            }
        }
    }

    /// Split the root's fields into a [`NavContext`] so navigation can
    /// borrow the components it refreshes alongside the viewport it moves
    fn navigate<S: MidiSink>(
        &mut self,
        song: &mut Song,
        out: &mut S,
        action: impl FnOnce(&Navigation, &mut NavContext<'_, S>) -> bool,
    ) -> bool {
        let Self {
            layout,
            viewport,
            mixer,
            launcher,
            colors,
            navigation,
            ..
        } = self;
        let mut ctx = NavContext {
            song,
            out,
            layout,
            viewport,
            mixer,
            launcher,
            colors,
        };
        action(navigation, &mut ctx)
    }

    //--------------------------------------------------------------------------
    // Notification dispatch
    //--------------------------------------------------------------------------

    /// Deliver document notifications until the queue is quiet. Handlers may
    /// re-register listeners but never mutate the document, so this
    /// terminates.
    pub fn drain_notifications<S: MidiSink>(
        &mut self,
        song: &mut Song,
        out: &mut S,
    ) {
        loop {
            let notifications = song.take_notifications();
            if notifications.is_empty() {
                return;
            }
            for notification in notifications {
                self.handle_notification(song, out, notification);
            }
        }
    }

    pub fn handle_notification<S: MidiSink>(
        &mut self,
        song: &mut Song,
        out: &mut S,
        notification: Notification,
    ) {
        match notification.event {
            SongEvent::TracksChanged => {
                if self.structural_tokens.contains(&notification.token) {
                    self.on_tracks_changed(song, out);
                }
            }
            SongEvent::ScenesChanged => {
                if self.structural_tokens.contains(&notification.token) {
                    self.on_scenes_changed(song, out);
                }
            }
            SongEvent::Mute | SongEvent::Solo | SongEvent::Arm => {
                if self.mixer.owns(notification.token) {
                    self.mixer.update_mix_leds(song, out, &self.layout);
                }
            }
            SongEvent::SlotOccupancy
            | SongEvent::ClipPlaying
            | SongEvent::ClipColor => {
                self.on_grid_notification(song, out, notification);
            }
        }
    }

    fn on_grid_notification<S: MidiSink>(
        &mut self,
        song: &mut Song,
        out: &mut S,
        notification: Notification,
    ) {
        match self.launcher.listener_role(notification.token) {
            Some(GridListener::Occupancy) => {
                // The slot gained or lost a clip whose own listeners must be
                // (un)registered, so rebuild before repainting
                self.launcher.sync_clip_listeners(song, self.viewport);
                self.colors.send_clip_colors(
                    song,
                    out,
                    &self.layout,
                    self.viewport.track_offset,
                    &self.viewport,
                );
                self.launcher
                    .refresh_leds(song, out, &self.layout, self.viewport);
            }
            Some(GridListener::Playing) => {
                self.launcher
                    .refresh_leds(song, out, &self.layout, self.viewport);
            }
            Some(GridListener::Color) => {
                self.colors.send_clip_colors(
                    song,
                    out,
                    &self.layout,
                    self.viewport.track_offset,
                    &self.viewport,
                );
            }
            None => {}
        }
    }

    //--------------------------------------------------------------------------
    // Structural changes
    //--------------------------------------------------------------------------

    /// Tracks were added, deleted, or reordered. Offsets are re-clamped
    /// before any rebuild so nothing resolves past the new end of the list.
    fn on_tracks_changed<S: MidiSink>(&mut self, song: &mut Song, out: &mut S) {
        debug!("Track list changed, rebuilding listeners");

        let cols = self.layout.config().grid_cols;
        self.viewport.move_track(0, song.num_tracks(), cols);
        song.set_highlight(
            self.viewport.track_offset,
            self.viewport.scene_offset,
        );

        self.mixer.clear_track_listeners(song);
        self.mixer.sync_track_listeners(song);
        self.launcher.sync_clip_listeners(song, self.viewport);

        self.mixer.set_track_offset(self.viewport.track_offset);
        self.mixer.update_mix_leds(song, out, &self.layout);
        self.colors.send_clip_colors(
            song,
            out,
            &self.layout,
            self.viewport.track_offset,
            &self.viewport,
        );
        self.launcher
            .refresh_leds(song, out, &self.layout, self.viewport);
    }

    /// Scenes were added or deleted; the clamp is against the configured
    /// grid height, never a literal
    fn on_scenes_changed<S: MidiSink>(&mut self, song: &mut Song, out: &mut S) {
        debug!("Scene list changed, rebuilding clip listeners");

        let rows = self.layout.config().grid_rows;
        self.viewport.move_scene(0, song.num_scenes(), rows);
        song.set_highlight(
            self.viewport.track_offset,
            self.viewport.scene_offset,
        );

        self.launcher.sync_clip_listeners(song, self.viewport);
        self.colors.send_clip_colors(
            song,
            out,
            &self.layout,
            self.viewport.track_offset,
            &self.viewport,
        );
        self.launcher
            .refresh_leds(song, out, &self.layout, self.viewport);
    }
}
