//! The visible window into the track/scene matrix. Two independent axes,
//! each clamped to `[0, max(0, total - visible)]`. Owned exclusively by the
//! surface root; navigation mutates it, structural-change handling re-clamps
//! it before any rebuild.

use crate::core::prelude::*;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Viewport {
    pub track_offset: usize,
    pub scene_offset: usize,
}

impl Viewport {
    /// Returns true if the offset actually moved; a delta pushing past a
    /// clamped boundary is a no-op and must not trigger downstream refresh.
    pub fn move_track(
        &mut self,
        delta: i32,
        total_tracks: usize,
        visible_cols: usize,
    ) -> bool {
        let offset =
            clamp_offset(self.track_offset, delta, total_tracks, visible_cols);
        let changed = offset != self.track_offset;
        self.track_offset = offset;
        changed
    }

    pub fn move_scene(
        &mut self,
        delta: i32,
        total_scenes: usize,
        visible_rows: usize,
    ) -> bool {
        let offset =
            clamp_offset(self.scene_offset, delta, total_scenes, visible_rows);
        let changed = offset != self.scene_offset;
        self.scene_offset = offset;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_track_is_always_in_range() {
        for total in 0..20 {
            for delta in [-100, -9, -1, 0, 1, 9, 100] {
                let mut viewport = Viewport::default();
                viewport.move_track(delta, total, 8);
                assert!(viewport.track_offset <= total.saturating_sub(8));
            }
        }
    }

    #[test]
    fn boundary_move_is_a_noop() {
        let mut viewport = Viewport::default();
        assert!(!viewport.move_track(-1, 12, 8));
        assert_eq!(viewport.track_offset, 0);

        viewport.track_offset = 4;
        assert!(!viewport.move_track(1, 12, 8));
        assert!(!viewport.move_track(100, 12, 8));
        assert_eq!(viewport.track_offset, 4);
    }

    #[test]
    fn scene_clamp_uses_visible_rows() {
        let mut viewport = Viewport::default();
        assert!(viewport.move_scene(10, 6, 4));
        assert_eq!(viewport.scene_offset, 2);

        // Different grid height, different clamp
        viewport.scene_offset = 0;
        assert!(viewport.move_scene(10, 6, 2));
        assert_eq!(viewport.scene_offset, 4);
    }

    #[test]
    fn zero_delta_move_reclamps_after_shrink() {
        let mut viewport = Viewport {
            track_offset: 4,
            scene_offset: 3,
        };
        assert!(viewport.move_track(0, 7, 8));
        assert!(viewport.move_scene(0, 5, 4));
        assert_eq!(viewport.track_offset, 0);
        assert_eq!(viewport.scene_offset, 1);
    }
}
