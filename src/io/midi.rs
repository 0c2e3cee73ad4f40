//! MIDI transport plumbing: one input connection feeding the surface and one
//! output connection carrying LED/value feedback back to the controller.

use std::error::Error;
use std::sync::{Arc, LazyLock, Mutex};
use std::thread;

use midir::{
    Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection,
};

use crate::core::prelude::*;

static INPUT_THREAD: LazyLock<Mutex<Option<thread::JoinHandle<()>>>> =
    LazyLock::new(|| Mutex::new(None));

/// Attach `callback` to the named input port. The connection is held on a
/// parked thread so it outlives this call; a second call replaces the
/// previous connection.
pub fn on_message<F>(port: &str, callback: F) -> Result<(), Box<dyn Error>>
where
    F: Fn(u64, &[u8]) + Send + Sync + 'static,
{
    let midi_in = MidiInput::new("launchgrid-in")?;
    let port = port.to_string();

    let in_ports = midi_in.ports();
    let in_port = in_ports
        .iter()
        .find(|p| midi_in.port_name(p).unwrap_or_default() == port)
        .ok_or_else(|| format!("Unable to find input port: {}", port))?
        .clone();

    {
        let mut thread_slot = INPUT_THREAD.lock().unwrap();
        if let Some(handle) = thread_slot.take() {
            info!("Unparking previous input thread ({})", port);
            handle.thread().unpark();
        }
    }

    let connection: Arc<Mutex<Option<MidiInputConnection<()>>>> =
        Arc::new(Mutex::new(None));
    let connection_clone = connection.clone();
    let port_name = port.clone();

    let handle = thread::spawn(move || {
        let conn_in = midi_in
            .connect(
                &in_port,
                "launchgrid-in",
                move |stamp, message, _| {
                    trace!("MIDI message: {}, {:?}", stamp, message);
                    callback(stamp, message);
                },
                (),
            )
            .expect("Unable to connect");

        *connection_clone.lock().unwrap() = Some(conn_in);

        info!("Connected input: {}", port_name);

        thread::park();

        if let Some(conn) = connection_clone.lock().unwrap().take() {
            drop(conn);
        }
    });

    *INPUT_THREAD.lock().unwrap() = Some(handle);

    Ok(())
}

pub fn disconnect() {
    let mut thread_slot = INPUT_THREAD.lock().unwrap();
    if let Some(handle) = thread_slot.take() {
        info!("[disconnect] Unparking input thread");
        handle.thread().unpark();
    }
}

/// Seam between the surface and the physical output so feedback batching can
/// be exercised against a capturing sink in tests.
pub trait MidiSink {
    fn send(&mut self, message: [u8; 3]);
}

pub struct MidiOut {
    port: String,
    connection: Option<MidiOutputConnection>,
}

impl MidiOut {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            connection: None,
        }
    }

    pub fn connect(&mut self) -> Result<(), Box<dyn Error>> {
        let midi_out = MidiOutput::new("launchgrid-out")?;
        let out_ports = midi_out.ports();
        let out_port = out_ports
            .iter()
            .find(|p| midi_out.port_name(p).unwrap_or_default() == self.port)
            .ok_or_else(|| {
                format!("Unable to find output port: {}", self.port)
            })?;
        let connection = midi_out.connect(out_port, "launchgrid-out")?;
        self.connection = Some(connection);
        Ok(())
    }
}

impl MidiSink for MidiOut {
    fn send(&mut self, message: [u8; 3]) {
        match &mut self.connection {
            Some(connection) => {
                if let Err(e) = connection.send(&message) {
                    warn!("Failed to send {:?}: {}", message, e);
                }
            }
            None => {
                warn!("Midi output connection has not been established");
            }
        }
    }
}

pub type PortIndexAndName = (usize, String);

pub fn list_input_ports() -> Result<Vec<PortIndexAndName>, Box<dyn Error>> {
    let mut midi_in = MidiInput::new("launchgrid-port-scan")?;
    midi_in.ignore(Ignore::None);
    let mut ports = vec![];
    for (i, p) in midi_in.ports().iter().enumerate() {
        ports.push((i, midi_in.port_name(p)?));
    }
    Ok(ports)
}

pub fn list_output_ports() -> Result<Vec<PortIndexAndName>, Box<dyn Error>> {
    let midi_out = MidiOutput::new("launchgrid-port-scan")?;
    let mut ports = vec![];
    for (i, p) in midi_out.ports().iter().enumerate() {
        ports.push((i, midi_out.port_name(p)?));
    }
    Ok(ports)
}

pub fn print_ports() -> Result<(), Box<dyn Error>> {
    println!("\nAvailable input ports:");
    for (index, port_name) in list_input_ports()? {
        println!("    {}: {}", index, port_name);
    }

    println!("\nAvailable output ports:");
    for (index, port_name) in list_output_ports()? {
        println!("    {}: {}", index, port_name);
    }

    println!();

    Ok(())
}

pub fn is_control_change(status: u8) -> bool {
    status & 0xF0 == 0xB0
}

pub fn is_note_on(status: u8) -> bool {
    status & 0xF0 == 0x90
}

pub fn channel(status: u8) -> u8 {
    status & 0x0F
}

pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | (channel & 0x0F), note, velocity]
}

pub fn control_change(channel: u8, cc: u8, value: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), cc, value]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_byte_helpers() {
        assert!(is_control_change(0xB4));
        assert!(!is_control_change(0x94));
        assert!(is_note_on(0x90));
        assert!(!is_note_on(0x80));
        assert_eq!(channel(0x94), 4);
    }

    #[test]
    fn message_builders() {
        assert_eq!(note_on(4, 60, 127), [0x94, 60, 127]);
        assert_eq!(control_change(1, 61, 64), [0xB1, 61, 64]);
    }
}
