//! The 8-strip mixer window: volume/pan/send sliders, mute/solo/arm toggles,
//! LED mirroring, and the debounced slider-touch track selection.

use std::time::{Duration, Instant};

use crate::config::SurfaceConfig;
use crate::core::prelude::*;
use crate::io::midi::{self, MidiSink};
use crate::song::{Song, SongEvent, SubscriptionToken};
use crate::surface::layout::{Layout, MixerParam, TrackAttr};

/// `round(v * 127)` for normalized 0.0..=1.0 values
pub fn cc_from_unipolar(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 127.0).round() as u8
}

/// -1.0..=1.0 pan to 0..=127, center lands on 64
pub fn cc_from_pan(pan: f32) -> u8 {
    ((pan.clamp(-1.0, 1.0) + 1.0) * 63.5).round() as u8
}

pub fn unipolar_from_cc(value: u8) -> f32 {
    value.min(127) as f32 / 127.0
}

pub fn pan_from_cc(value: u8) -> f32 {
    (value.min(127) as f32 / 63.5) - 1.0
}

pub struct MixerStrip {
    num_tracks: usize,
    track_offset: usize,
    debounce: Duration,
    last_selection: Option<Instant>,
    tokens: Vec<SubscriptionToken>,
}

impl MixerStrip {
    pub fn new(config: &SurfaceConfig) -> Self {
        Self {
            num_tracks: config.num_tracks,
            track_offset: 0,
            debounce: Duration::from_millis(config.select_debounce_ms),
            last_selection: None,
            tokens: Vec::new(),
        }
    }

    /// Re-bind the strip window to a new absolute track offset. Does not
    /// push LEDs; callers follow with [`MixerStrip::update_mix_leds`].
    pub fn set_track_offset(&mut self, offset: usize) {
        self.track_offset = offset;
    }

    pub fn track_offset(&self) -> usize {
        self.track_offset
    }

    pub fn owns(&self, token: SubscriptionToken) -> bool {
        self.tokens.contains(&token)
    }

    /// Flip mute/solo/arm on the track behind strip `index` and echo the new
    /// state to the strip's LED. Arm is refused on unarmable tracks: no flag
    /// change, no non-zero LED.
    pub fn toggle<S: MidiSink>(
        &self,
        song: &mut Song,
        out: &mut S,
        layout: &Layout,
        index: usize,
        attr: TrackAttr,
    ) {
        let absolute = self.track_offset + index;
        let Some(track) = song.track(absolute) else {
            return;
        };

        let state = match attr {
            TrackAttr::Mute => {
                let mute = !track.mute();
                song.set_mute(absolute, mute);
                mute
            }
            TrackAttr::Solo => {
                let solo = !track.solo();
                song.set_solo(absolute, solo);
                solo
            }
            TrackAttr::Arm => {
                if !track.can_be_armed() {
                    return;
                }
                let arm = !track.arm();
                song.set_arm(absolute, arm);
                arm
            }
        };

        let channel = layout.config().main_channel;
        let note = layout.mixer_note(attr, index);
        out.send(midi::note_on(channel, note, ternary!(state, 127, 0)));
    }

    /// Full batch refresh of every visible strip's mute/solo/arm LEDs.
    /// Unarmable tracks always show arm off.
    pub fn update_mix_leds<S: MidiSink>(
        &self,
        song: &Song,
        out: &mut S,
        layout: &Layout,
    ) {
        let channel = layout.config().main_channel;
        for index in 0..self.num_tracks {
            let Some(track) = song.track(self.track_offset + index) else {
                continue;
            };

            out.send(midi::note_on(
                channel,
                layout.mixer_note(TrackAttr::Mute, index),
                ternary!(track.mute(), 127, 0),
            ));
            out.send(midi::note_on(
                channel,
                layout.mixer_note(TrackAttr::Solo, index),
                ternary!(track.solo(), 127, 0),
            ));

            let arm = track.can_be_armed() && track.arm();
            out.send(midi::note_on(
                channel,
                layout.mixer_note(TrackAttr::Arm, index),
                ternary!(arm, 127, 0),
            ));
        }
    }

    /// Push every visible strip's current values (for motorized faders /
    /// value displays), then the LEDs.
    pub fn send_full_state<S: MidiSink>(
        &self,
        song: &Song,
        out: &mut S,
        layout: &Layout,
    ) {
        let channel = layout.config().main_channel;
        for index in 0..self.num_tracks {
            let Some(track) = song.track(self.track_offset + index) else {
                continue;
            };

            out.send(midi::control_change(
                channel,
                layout.mixer_cc(MixerParam::Volume, index),
                cc_from_unipolar(track.volume()),
            ));
            out.send(midi::control_change(
                channel,
                layout.mixer_cc(MixerParam::Pan, index),
                cc_from_pan(track.pan()),
            ));

            let sends = track.sends();
            if let Some(send_a) = sends.first() {
                out.send(midi::control_change(
                    channel,
                    layout.mixer_cc(MixerParam::SendA, index),
                    cc_from_unipolar(*send_a),
                ));
            }
            if let Some(send_b) = sends.get(1) {
                out.send(midi::control_change(
                    channel,
                    layout.mixer_cc(MixerParam::SendB, index),
                    cc_from_unipolar(*send_b),
                ));
            }
        }

        self.update_mix_leds(song, out, layout);
    }

    /// Apply an incoming slider value to the document and select the touched
    /// track, debounced so controller jitter and motorized-fader echoes do
    /// not thrash the selection.
    pub fn apply_slider(
        &mut self,
        song: &mut Song,
        index: usize,
        param: MixerParam,
        value: u8,
        now: Instant,
    ) {
        let absolute = self.track_offset + index;
        if absolute >= song.num_tracks() {
            return;
        }

        match param {
            MixerParam::Volume => {
                song.set_volume(absolute, unipolar_from_cc(value))
            }
            MixerParam::Pan => song.set_pan(absolute, pan_from_cc(value)),
            MixerParam::SendA => {
                song.set_send(absolute, 0, unipolar_from_cc(value))
            }
            MixerParam::SendB => {
                song.set_send(absolute, 1, unipolar_from_cc(value))
            }
        }

        let elapsed_enough = self
            .last_selection
            .is_none_or(|last| now.duration_since(last) >= self.debounce);

        if elapsed_enough {
            song.select_track(absolute);
            self.last_selection = Some(now);
        }
    }

    /// Register mute/solo (and arm, where armable) listeners for every track
    /// in the document, exactly once per (track, event) pair.
    pub fn sync_track_listeners(&mut self, song: &mut Song) {
        for index in 0..song.num_tracks() {
            let Some(track) = song.track(index) else {
                continue;
            };
            let entity = track.id();
            let can_be_armed = track.can_be_armed();

            for event in [SongEvent::Mute, SongEvent::Solo] {
                if !song.has_subscription(entity, event) {
                    self.tokens.push(song.subscribe(entity, event));
                }
            }
            if can_be_armed && !song.has_subscription(entity, SongEvent::Arm) {
                self.tokens.push(song.subscribe(entity, SongEvent::Arm));
            }
        }
    }

    /// Remove exactly the listeners this component registered. Revoking a
    /// token whose track is already gone is tolerated.
    pub fn clear_track_listeners(&mut self, song: &mut Song) {
        for token in self.tokens.drain(..) {
            song.unsubscribe(token);
        }
    }
}
