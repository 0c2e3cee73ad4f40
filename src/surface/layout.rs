//! Physical addressing. The surface is wired as two 4-wide hardware modules:
//! grid columns 0-3 and mixer tracks 0-3 live in module 1, columns/tracks
//! 4-7 in module 2 with independent base offsets. Within a module the grid
//! is numbered row-major, 4 wide, so module 2's notes/CCs start 16 above
//! module 1's.
//!
//! All bindings are resolved once at startup into an address table keyed by
//! `(message kind, channel, number)`; input dispatch is a single lookup with
//! every index pre-resolved, never a closure capturing loop variables.

use crate::config::SurfaceConfig;
use crate::core::prelude::*;

const MODULE_WIDTH: usize = 4;
const MODULE_SPAN: u8 = 16;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MessageKind {
    Note,
    ControlChange,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ControlAddress {
    pub kind: MessageKind,
    pub channel: u8,
    pub number: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MixerParam {
    Volume,
    Pan,
    SendA,
    SendB,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrackAttr {
    Mute,
    Solo,
    Arm,
}

/// A fully resolved logical control. Everything input dispatch needs is in
/// the variant; nothing is re-derived from the raw message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlId {
    Launch { row: usize, col: usize },
    Slider { index: usize, param: MixerParam },
    Toggle { index: usize, attr: TrackAttr },
    TrackLeft,
    TrackRight,
    SceneUp,
    SceneDown,
    BankLeft,
    BankRight,
    Trigger,
}

pub struct Layout {
    config: SurfaceConfig,
    bindings: HashMap<ControlAddress, ControlId>,
}

impl Layout {
    pub fn new(config: &SurfaceConfig) -> Self {
        let mut layout = Self {
            config: config.clone(),
            bindings: HashMap::default(),
        };
        layout.bind_grid();
        layout.bind_mixer();
        layout.bind_navigation();
        layout.bind_trigger();
        layout
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn lookup(&self, address: ControlAddress) -> Option<ControlId> {
        self.bindings.get(&address).copied()
    }

    //--------------------------------------------------------------------------
    // Feedback addresses
    //--------------------------------------------------------------------------

    /// Launch note for a grid cell, module split on column
    pub fn launch_note(&self, row: usize, col: usize) -> u8 {
        Self::grid_number(self.config.clip_note_start, row, col)
    }

    /// Color CC for a grid cell; identical layout to launch notes
    pub fn color_cc(&self, row: usize, col: usize) -> u8 {
        Self::grid_number(self.config.color_cc_start, row, col)
    }

    pub fn mixer_cc(&self, param: MixerParam, index: usize) -> u8 {
        let config = &self.config;
        let (base, base_2) = match param {
            MixerParam::Volume => {
                (config.volume_cc_start, config.volume_cc_start_2)
            }
            MixerParam::Pan => (config.pan_cc_start, config.pan_cc_start_2),
            MixerParam::SendA => {
                (config.send_a_cc_start, config.send_a_cc_start_2)
            }
            MixerParam::SendB => {
                (config.send_b_cc_start, config.send_b_cc_start_2)
            }
        };
        Self::strip_number(base, base_2, index)
    }

    pub fn mixer_note(&self, attr: TrackAttr, index: usize) -> u8 {
        let config = &self.config;
        let (base, base_2) = match attr {
            TrackAttr::Mute => {
                (config.mute_note_start, config.mute_note_start_2)
            }
            TrackAttr::Solo => {
                (config.solo_note_start, config.solo_note_start_2)
            }
            TrackAttr::Arm => (config.arm_note_start, config.arm_note_start_2),
        };
        Self::strip_number(base, base_2, index)
    }

    fn grid_number(base: u8, row: usize, col: usize) -> u8 {
        let module_base = ternary!(
            col < MODULE_WIDTH,
            base,
            base + MODULE_SPAN
        );
        module_base + (row * MODULE_WIDTH + col % MODULE_WIDTH) as u8
    }

    fn strip_number(base: u8, base_2: u8, index: usize) -> u8 {
        let module_base = ternary!(index < MODULE_WIDTH, base, base_2);
        module_base + (index % MODULE_WIDTH) as u8
    }

    //--------------------------------------------------------------------------
    // Table construction
    //--------------------------------------------------------------------------

    fn bind(&mut self, address: ControlAddress, id: ControlId) {
        self.bindings.insert(address, id);
    }

    fn note(channel: u8, number: u8) -> ControlAddress {
        ControlAddress {
            kind: MessageKind::Note,
            channel,
            number,
        }
    }

    fn cc(channel: u8, number: u8) -> ControlAddress {
        ControlAddress {
            kind: MessageKind::ControlChange,
            channel,
            number,
        }
    }

    fn bind_grid(&mut self) {
        let channel = self.config.clip_launch_channel;
        for row in 0..self.config.grid_rows {
            for col in 0..self.config.grid_cols {
                let number = self.launch_note(row, col);
                self.bind(
                    Self::note(channel, number),
                    ControlId::Launch { row, col },
                );
            }
        }
    }

    fn bind_mixer(&mut self) {
        let channel = self.config.main_channel;
        let params = [
            MixerParam::Volume,
            MixerParam::Pan,
            MixerParam::SendA,
            MixerParam::SendB,
        ];
        let attrs = [TrackAttr::Mute, TrackAttr::Solo, TrackAttr::Arm];

        for index in 0..self.config.num_tracks {
            for param in params {
                let number = self.mixer_cc(param, index);
                self.bind(
                    Self::cc(channel, number),
                    ControlId::Slider { index, param },
                );
            }
            for attr in attrs {
                let number = self.mixer_note(attr, index);
                self.bind(
                    Self::note(channel, number),
                    ControlId::Toggle { index, attr },
                );
            }
        }
    }

    fn bind_navigation(&mut self) {
        let channel = self.config.main_channel;
        self.bind(
            Self::note(channel, self.config.track_left_note),
            ControlId::TrackLeft,
        );
        self.bind(
            Self::note(channel, self.config.track_right_note),
            ControlId::TrackRight,
        );
        self.bind(
            Self::note(channel, self.config.scene_up_note),
            ControlId::SceneUp,
        );
        self.bind(
            Self::note(channel, self.config.scene_down_note),
            ControlId::SceneDown,
        );
        if let Some(number) = self.config.bank_left_note {
            self.bind(Self::note(channel, number), ControlId::BankLeft);
        }
        if let Some(number) = self.config.bank_right_note {
            self.bind(Self::note(channel, number), ControlId::BankRight);
        }
    }

    fn bind_trigger(&mut self) {
        self.bind(
            Self::cc(self.config.main_channel, self.config.trigger_cc),
            ControlId::Trigger,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new(&SurfaceConfig::default())
    }

    #[test]
    fn launch_notes_split_into_two_modules() {
        let layout = layout();
        // Module 1: 60..=75, row-major 4 wide
        assert_eq!(layout.launch_note(0, 0), 60);
        assert_eq!(layout.launch_note(0, 3), 63);
        assert_eq!(layout.launch_note(1, 0), 64);
        assert_eq!(layout.launch_note(3, 3), 75);
        // Module 2: 76..=91
        assert_eq!(layout.launch_note(0, 4), 76);
        assert_eq!(layout.launch_note(1, 5), 81);
        assert_eq!(layout.launch_note(3, 7), 91);
    }

    #[test]
    fn color_ccs_share_grid_layout() {
        let layout = layout();
        assert_eq!(layout.color_cc(2, 1), 69);
        assert_eq!(layout.color_cc(2, 5), 85);
    }

    #[test]
    fn mixer_module_2_uses_independent_bases() {
        let layout = layout();
        assert_eq!(layout.mixer_cc(MixerParam::Volume, 0), 44);
        assert_eq!(layout.mixer_cc(MixerParam::Volume, 4), 60);
        assert_eq!(layout.mixer_cc(MixerParam::SendB, 7), 55);
        assert_eq!(layout.mixer_note(TrackAttr::Mute, 3), 35);
        assert_eq!(layout.mixer_note(TrackAttr::Arm, 5), 57);
    }

    #[test]
    fn lookup_resolves_bound_addresses() {
        let layout = layout();
        assert_eq!(
            layout.lookup(Layout::note(4, 81)),
            Some(ControlId::Launch { row: 1, col: 5 })
        );
        assert_eq!(
            layout.lookup(Layout::cc(0, 60)),
            Some(ControlId::Slider {
                index: 4,
                param: MixerParam::Volume
            })
        );
        assert_eq!(
            layout.lookup(Layout::note(0, 46)),
            Some(ControlId::SceneUp)
        );
        assert_eq!(layout.lookup(Layout::cc(0, 127)), Some(ControlId::Trigger));
        assert_eq!(layout.lookup(Layout::note(9, 60)), None);
    }

    #[test]
    fn four_track_variant_binds_one_module() {
        let mut config = SurfaceConfig::default();
        config.grid_cols = 4;
        config.num_tracks = 4;
        let layout = Layout::new(&config);
        // Module 2 volume CC is unbound
        assert_eq!(layout.lookup(Layout::cc(0, 60)), None);
        assert_eq!(
            layout.lookup(Layout::cc(0, 47)),
            Some(ControlId::Slider {
                index: 3,
                param: MixerParam::Volume
            })
        );
    }
}
