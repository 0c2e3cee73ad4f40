//! Bridges the midir callback thread to the single-threaded surface. The
//! input callback only forwards raw bytes over a channel; the loop here owns
//! the song, the surface, and the output connection, processes one event at
//! a time, and drains document notifications after each one.

use std::error::Error;
use std::sync::mpsc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SurfaceConfig;
use crate::core::prelude::*;
use crate::io::midi::{self, MidiOut};
use crate::song::Song;
use crate::surface::ControlSurface;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SurfaceEvent {
    pub stamp: u64,
    pub message: Vec<u8>,
}

pub type SurfaceEventSender = Sender<SurfaceEvent>;
pub type SurfaceEventReceiver = Receiver<SurfaceEvent>;

pub fn event_channel() -> (SurfaceEventSender, SurfaceEventReceiver) {
    mpsc::channel()
}

/// Connect both ports and run the surface until the input side goes away.
pub fn run(
    config: SurfaceConfig,
    input_port: &str,
    output_port: &str,
    mut song: Song,
) -> Result<(), Box<dyn Error>> {
    let (tx, rx) = event_channel();

    midi::on_message(input_port, move |stamp, message| {
        let _ = tx.send(SurfaceEvent {
            stamp,
            message: message.to_vec(),
        });
    })?;

    let mut out = MidiOut::new(output_port);
    out.connect()?;

    // Give the controller time to boot before the initial state push
    if config.init_delay_ms > 0 {
        thread::sleep(Duration::from_millis(config.init_delay_ms));
    }

    let mut surface = ControlSurface::new(&config);
    surface.init(&mut song, &mut out);

    loop {
        let Ok(event) = rx.recv() else {
            info!("Input channel closed, shutting down");
            break;
        };
        surface.handle_midi(
            &mut song,
            &mut out,
            Instant::now(),
            &event.message,
        );
        surface.drain_notifications(&mut song, &mut out);
    }

    surface.disconnect(&mut song);
    midi::disconnect();

    Ok(())
}
