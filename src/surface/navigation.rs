//! Track/scene scrolling and optional bank jumps. Navigation owns no state
//! of its own beyond the configured window dimensions; it mutates the
//! root-owned viewport and drives the refresh cascade across the other
//! components, all passed in explicitly.

use crate::core::prelude::*;
use crate::io::midi::MidiSink;
use crate::song::Song;
use crate::surface::colors::ColorGrid;
use crate::surface::launcher::ClipGrid;
use crate::surface::layout::Layout;
use crate::surface::mixer::MixerStrip;
use crate::surface::viewport::Viewport;

/// Borrows of everything a viewport move touches, split out of the surface
/// root's fields.
pub struct NavContext<'a, S: MidiSink> {
    pub song: &'a mut Song,
    pub out: &'a mut S,
    pub layout: &'a Layout,
    pub viewport: &'a mut Viewport,
    pub mixer: &'a mut MixerStrip,
    pub launcher: &'a mut ClipGrid,
    pub colors: &'a ColorGrid,
}

pub struct Navigation {
    visible_rows: usize,
    visible_cols: usize,
    bank_stride: i32,
}

impl Navigation {
    pub fn new(config: &crate::config::SurfaceConfig) -> Self {
        Self {
            visible_rows: config.grid_rows,
            visible_cols: config.grid_cols,
            bank_stride: config.grid_cols as i32,
        }
    }

    /// Scroll the track axis. A move already clamped at the boundary is a
    /// no-op: no highlighting, listener, or LED work happens.
    pub fn move_track<S: MidiSink>(
        &self,
        ctx: &mut NavContext<'_, S>,
        delta: i32,
    ) -> bool {
        let total = ctx.song.num_tracks();
        if !ctx.viewport.move_track(delta, total, self.visible_cols) {
            return false;
        }

        let offset = ctx.viewport.track_offset;
        debug!("Track window moved to offset {}", offset);

        ctx.song.set_highlight(offset, ctx.viewport.scene_offset);

        ctx.mixer.set_track_offset(offset);
        ctx.mixer.update_mix_leds(ctx.song, ctx.out, ctx.layout);

        ctx.launcher.sync_clip_listeners(ctx.song, *ctx.viewport);
        ctx.colors.send_clip_colors(
            ctx.song,
            ctx.out,
            ctx.layout,
            offset,
            ctx.viewport,
        );
        ctx.launcher
            .refresh_leds(ctx.song, ctx.out, ctx.layout, *ctx.viewport);

        true
    }

    /// Scroll the scene axis. The mixer has no vertical axis, so only the
    /// grid is refreshed.
    pub fn move_scene<S: MidiSink>(
        &self,
        ctx: &mut NavContext<'_, S>,
        delta: i32,
    ) -> bool {
        let total = ctx.song.num_scenes();
        if !ctx.viewport.move_scene(delta, total, self.visible_rows) {
            return false;
        }

        let offset = ctx.viewport.scene_offset;
        debug!("Scene window moved to offset {}", offset);

        ctx.song.set_highlight(ctx.viewport.track_offset, offset);

        ctx.launcher.sync_clip_listeners(ctx.song, *ctx.viewport);
        ctx.colors.send_clip_colors(
            ctx.song,
            ctx.out,
            ctx.layout,
            ctx.viewport.track_offset,
            ctx.viewport,
        );
        ctx.launcher
            .refresh_leds(ctx.song, ctx.out, ctx.layout, *ctx.viewport);

        true
    }

    /// Full-window track jump
    pub fn bank<S: MidiSink>(
        &self,
        ctx: &mut NavContext<'_, S>,
        direction: i32,
    ) -> bool {
        self.move_track(ctx, direction * self.bank_stride)
    }
}
