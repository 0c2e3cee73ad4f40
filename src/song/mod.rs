//! In-memory session document the surface synchronizes against: an indexable
//! track list, a scene count, per-track clip slots, mixer floats, and a view
//! (selected track + session highlight).
//!
//! Change notification uses explicit subscription tokens instead of callback
//! identity: `subscribe` returns a [`SubscriptionToken`], mutations enqueue a
//! [`Notification`] per matching token, and the runtime drains the queue
//! after every input event. The surface never holds track/clip references
//! across structural changes; it re-resolves indices through the accessors
//! here on every read.

use std::collections::VecDeque;

use crate::core::prelude::*;

/// Stable identity used only as a subscription key. Survives index shifts
/// from track/scene insertion and deletion.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EntityId(u64);

impl EntityId {
    /// The document itself, target of structural subscriptions.
    pub const SONG: EntityId = EntityId(0);
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionToken(u64);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SongEvent {
    TracksChanged,
    ScenesChanged,
    Mute,
    Solo,
    Arm,
    SlotOccupancy,
    ClipPlaying,
    ClipColor,
}

#[derive(Clone, Copy, Debug)]
pub struct Notification {
    pub token: SubscriptionToken,
    pub entity: EntityId,
    pub event: SongEvent,
}

#[derive(Clone, Debug)]
pub struct Clip {
    id: EntityId,
    color: u32,
    playing: bool,
    recording: bool,
}

impl Clip {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Packed 0x00RRGGBB
    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }
}

#[derive(Clone, Debug)]
pub struct ClipSlot {
    id: EntityId,
    clip: Option<Clip>,
}

impl ClipSlot {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct Track {
    id: EntityId,
    name: String,
    mute: bool,
    solo: bool,
    arm: bool,
    can_be_armed: bool,
    volume: f32,
    pan: f32,
    sends: Vec<f32>,
    slots: Vec<ClipSlot>,
}

impl Track {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mute(&self) -> bool {
        self.mute
    }

    pub fn solo(&self) -> bool {
        self.solo
    }

    pub fn arm(&self) -> bool {
        self.arm
    }

    /// Return tracks (group/master in the host) report false here
    pub fn can_be_armed(&self) -> bool {
        self.can_be_armed
    }

    /// Normalized 0.0..=1.0
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// -1.0..=1.0, 0.0 = center
    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn sends(&self) -> &[f32] {
        &self.sends
    }

    pub fn clip_slots(&self) -> &[ClipSlot] {
        &self.slots
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Highlight {
    pub track_offset: usize,
    pub scene_offset: usize,
}

pub struct Song {
    tracks: Vec<Track>,
    num_scenes: usize,
    selected_track: Option<usize>,
    highlight: Highlight,
    next_id: u64,
    next_token: u64,
    subscribers: HashMap<(EntityId, SongEvent), Vec<SubscriptionToken>>,
    tokens: HashMap<SubscriptionToken, (EntityId, SongEvent)>,
    queue: VecDeque<Notification>,
}

impl Default for Song {
    fn default() -> Self {
        Self::new()
    }
}

impl Song {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            num_scenes: 0,
            selected_track: None,
            highlight: Highlight::default(),
            next_id: 1,
            next_token: 1,
            subscribers: HashMap::default(),
            tokens: HashMap::default(),
            queue: VecDeque::new(),
        }
    }

    fn fresh_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    //--------------------------------------------------------------------------
    // Accessors
    //--------------------------------------------------------------------------

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn num_scenes(&self) -> usize {
        self.num_scenes
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn slot(&self, track: usize, scene: usize) -> Option<&ClipSlot> {
        self.tracks.get(track).and_then(|t| t.slots.get(scene))
    }

    pub fn clip(&self, track: usize, scene: usize) -> Option<&Clip> {
        self.slot(track, scene).and_then(|s| s.clip())
    }

    pub fn selected_track(&self) -> Option<usize> {
        self.selected_track
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    //--------------------------------------------------------------------------
    // View
    //--------------------------------------------------------------------------

    pub fn select_track(&mut self, index: usize) {
        if index < self.tracks.len() {
            self.selected_track = Some(index);
        }
    }

    pub fn set_highlight(&mut self, track_offset: usize, scene_offset: usize) {
        self.highlight = Highlight {
            track_offset,
            scene_offset,
        };
    }

    //--------------------------------------------------------------------------
    // Structural mutation
    //--------------------------------------------------------------------------

    pub fn add_track(&mut self, name: &str, can_be_armed: bool) -> usize {
        let slots = (0..self.num_scenes)
            .map(|_| ClipSlot {
                id: EntityId(0),
                clip: None,
            })
            .collect::<Vec<_>>();

        let track = Track {
            id: self.fresh_id(),
            name: name.to_string(),
            mute: false,
            solo: false,
            arm: false,
            can_be_armed,
            volume: 0.85,
            pan: 0.0,
            sends: vec![0.0, 0.0],
            slots,
        };
        self.tracks.push(track);

        let index = self.tracks.len() - 1;
        for scene in 0..self.num_scenes {
            let id = self.fresh_id();
            self.tracks[index].slots[scene].id = id;
        }

        self.notify(EntityId::SONG, SongEvent::TracksChanged);
        index
    }

    pub fn remove_track(&mut self, index: usize) {
        if index >= self.tracks.len() {
            return;
        }
        self.tracks.remove(index);
        if let Some(selected) = self.selected_track
            && selected >= self.tracks.len()
        {
            self.selected_track = self.tracks.len().checked_sub(1);
        }
        self.notify(EntityId::SONG, SongEvent::TracksChanged);
    }

    pub fn add_scene(&mut self) -> usize {
        self.num_scenes += 1;
        for index in 0..self.tracks.len() {
            let id = self.fresh_id();
            self.tracks[index].slots.push(ClipSlot { id, clip: None });
        }
        self.notify(EntityId::SONG, SongEvent::ScenesChanged);
        self.num_scenes - 1
    }

    pub fn remove_scene(&mut self, index: usize) {
        if index >= self.num_scenes {
            return;
        }
        self.num_scenes -= 1;
        for track in &mut self.tracks {
            track.slots.remove(index);
        }
        self.notify(EntityId::SONG, SongEvent::ScenesChanged);
    }

    //--------------------------------------------------------------------------
    // Track state
    //--------------------------------------------------------------------------

    pub fn set_mute(&mut self, index: usize, mute: bool) {
        let Some(track) = self.tracks.get_mut(index) else {
            return;
        };
        if track.mute == mute {
            return;
        }
        track.mute = mute;
        let id = track.id;
        self.notify(id, SongEvent::Mute);
    }

    pub fn set_solo(&mut self, index: usize, solo: bool) {
        let Some(track) = self.tracks.get_mut(index) else {
            return;
        };
        if track.solo == solo {
            return;
        }
        track.solo = solo;
        let id = track.id;
        self.notify(id, SongEvent::Solo);
    }

    pub fn set_arm(&mut self, index: usize, arm: bool) {
        let Some(track) = self.tracks.get_mut(index) else {
            return;
        };
        if !track.can_be_armed || track.arm == arm {
            return;
        }
        track.arm = arm;
        let id = track.id;
        self.notify(id, SongEvent::Arm);
    }

    pub fn set_volume(&mut self, index: usize, volume: f32) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.volume = volume.clamp(0.0, 1.0);
        }
    }

    pub fn set_pan(&mut self, index: usize, pan: f32) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.pan = pan.clamp(-1.0, 1.0);
        }
    }

    pub fn set_send(&mut self, index: usize, send: usize, value: f32) {
        if let Some(track) = self.tracks.get_mut(index)
            && let Some(slot) = track.sends.get_mut(send)
        {
            *slot = value.clamp(0.0, 1.0);
        }
    }

    //--------------------------------------------------------------------------
    // Clips
    //--------------------------------------------------------------------------

    pub fn create_clip(&mut self, track: usize, scene: usize, color: u32) {
        let id = self.fresh_id();
        let Some(slot) = self
            .tracks
            .get_mut(track)
            .and_then(|t| t.slots.get_mut(scene))
        else {
            return;
        };
        slot.clip = Some(Clip {
            id,
            color,
            playing: false,
            recording: false,
        });
        let slot_id = slot.id;
        self.notify(slot_id, SongEvent::SlotOccupancy);
    }

    pub fn delete_clip(&mut self, track: usize, scene: usize) {
        let Some(slot) = self
            .tracks
            .get_mut(track)
            .and_then(|t| t.slots.get_mut(scene))
        else {
            return;
        };
        if slot.clip.take().is_none() {
            return;
        }
        let slot_id = slot.id;
        self.notify(slot_id, SongEvent::SlotOccupancy);
    }

    /// Start the clip in this slot. Playback itself is not modeled; firing
    /// only flips the playing flag and notifies.
    pub fn fire_slot(&mut self, track: usize, scene: usize) {
        let Some(clip) = self
            .tracks
            .get_mut(track)
            .and_then(|t| t.slots.get_mut(scene))
            .and_then(|s| s.clip.as_mut())
        else {
            return;
        };
        clip.playing = true;
        let id = clip.id;
        self.notify(id, SongEvent::ClipPlaying);
    }

    pub fn set_clip_playing(
        &mut self,
        track: usize,
        scene: usize,
        playing: bool,
    ) {
        let Some(clip) = self.clip_mut(track, scene) else {
            return;
        };
        if clip.playing == playing {
            return;
        }
        clip.playing = playing;
        let id = clip.id;
        self.notify(id, SongEvent::ClipPlaying);
    }

    pub fn set_clip_recording(
        &mut self,
        track: usize,
        scene: usize,
        recording: bool,
    ) {
        let Some(clip) = self.clip_mut(track, scene) else {
            return;
        };
        if clip.recording == recording {
            return;
        }
        clip.recording = recording;
        let id = clip.id;
        self.notify(id, SongEvent::ClipPlaying);
    }

    pub fn set_clip_color(&mut self, track: usize, scene: usize, color: u32) {
        let Some(clip) = self.clip_mut(track, scene) else {
            return;
        };
        if clip.color == color {
            return;
        }
        clip.color = color;
        let id = clip.id;
        self.notify(id, SongEvent::ClipColor);
    }

    fn clip_mut(&mut self, track: usize, scene: usize) -> Option<&mut Clip> {
        self.tracks
            .get_mut(track)
            .and_then(|t| t.slots.get_mut(scene))
            .and_then(|s| s.clip.as_mut())
    }

    //--------------------------------------------------------------------------
    // Subscriptions
    //--------------------------------------------------------------------------

    pub fn subscribe(
        &mut self,
        entity: EntityId,
        event: SongEvent,
    ) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.subscribers.entry((entity, event)).or_default().push(token);
        self.tokens.insert(token, (entity, event));
        token
    }

    pub fn has_subscription(&self, entity: EntityId, event: SongEvent) -> bool {
        self.subscribers
            .get(&(entity, event))
            .is_some_and(|tokens| !tokens.is_empty())
    }

    /// Revoking an unknown or already-revoked token is a silent no-op;
    /// teardown aims for at-most-once cleanup, not guaranteed cleanup.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) {
        let Some(key) = self.tokens.remove(&token) else {
            return;
        };
        if let Some(tokens) = self.subscribers.get_mut(&key) {
            tokens.retain(|t| *t != token);
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.tokens.len()
    }

    fn notify(&mut self, entity: EntityId, event: SongEvent) {
        if let Some(tokens) = self.subscribers.get(&(entity, event)) {
            for token in tokens {
                self.queue.push_back(Notification {
                    token: *token,
                    entity,
                    event,
                });
            }
        }
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    /// Group initialization mutations. Notifications produced inside the
    /// scope are discarded; callers follow with a full-state push.
    pub fn with_setup(&mut self, f: impl FnOnce(&mut Self)) {
        f(self);
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song_with(tracks: usize, scenes: usize) -> Song {
        let mut song = Song::new();
        for _ in 0..scenes {
            song.add_scene();
        }
        for i in 0..tracks {
            song.add_track(&format!("{}", i + 1), true);
        }
        song.take_notifications();
        song
    }

    #[test]
    fn mute_change_notifies_subscribed_token() {
        let mut song = song_with(2, 2);
        let entity = song.track(1).unwrap().id();
        let token = song.subscribe(entity, SongEvent::Mute);

        song.set_mute(1, true);
        let notifications = song.take_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].token, token);
        assert_eq!(notifications[0].event, SongEvent::Mute);

        // Same value again does not notify
        song.set_mute(1, true);
        assert!(song.take_notifications().is_empty());
    }

    #[test]
    fn arm_is_refused_on_unarmable_tracks() {
        let mut song = Song::new();
        song.add_scene();
        song.add_track("group", false);
        song.set_arm(0, true);
        assert!(!song.track(0).unwrap().arm());
    }

    #[test]
    fn unsubscribe_is_tolerant_and_exact() {
        let mut song = song_with(1, 1);
        let entity = song.track(0).unwrap().id();
        let token = song.subscribe(entity, SongEvent::Solo);
        assert!(song.has_subscription(entity, SongEvent::Solo));

        song.unsubscribe(token);
        assert!(!song.has_subscription(entity, SongEvent::Solo));
        assert_eq!(song.subscription_count(), 0);

        // Second revoke of the same token is fine
        song.unsubscribe(token);
    }

    #[test]
    fn removing_a_track_keeps_indices_dense() {
        let mut song = song_with(3, 1);
        let last = song.track(2).unwrap().id();
        song.remove_track(1);
        assert_eq!(song.num_tracks(), 2);
        assert_eq!(song.track(1).unwrap().id(), last);
    }

    #[test]
    fn occupancy_notifies_on_create_and_delete_only() {
        let mut song = song_with(1, 1);
        let slot = song.slot(0, 0).unwrap().id();
        song.subscribe(slot, SongEvent::SlotOccupancy);

        song.create_clip(0, 0, 0xFF8000);
        assert_eq!(song.take_notifications().len(), 1);

        song.delete_clip(0, 0);
        assert_eq!(song.take_notifications().len(), 1);

        // Deleting an empty slot does not notify
        song.delete_clip(0, 0);
        assert!(song.take_notifications().is_empty());
    }

    #[test]
    fn with_setup_discards_notifications() {
        let mut song = song_with(1, 1);
        let entity = song.track(0).unwrap().id();
        song.subscribe(entity, SongEvent::Mute);
        song.with_setup(|song| song.set_mute(0, true));
        assert!(song.take_notifications().is_empty());
    }
}
