//! `midir` implementation of the transport seam
//!
//! Every open creates its own backend client, matching how `midir` hands
//! the client over to the connection it creates.

use midi_detect::find_port;
use midi_mux::{InputCallback, InputConnection, MidiTransport, OutputConnection, TransportError};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::debug;

pub struct MidirTransport {
    client_name: String,
}

impl MidirTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }
}

fn backend(e: impl std::fmt::Display) -> TransportError {
    TransportError::Backend(e.to_string())
}

impl MidiTransport for MidirTransport {
    fn open_input(
        &self,
        name: &str,
        mut callback: InputCallback,
    ) -> Result<Box<dyn InputConnection>, TransportError> {
        let mut input = MidiInput::new(&self.client_name).map_err(backend)?;
        input.ignore(Ignore::None);

        let ports = input.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| input.port_name(p).unwrap_or_default())
            .collect();
        let index = find_port(names.iter().map(String::as_str), name)
            .ok_or_else(|| TransportError::PortNotFound(name.to_string()))?;
        let port_name = names[index].clone();

        debug!("Connecting input '{}'", port_name);
        let conn = input
            .connect(
                &ports[index],
                "midimux-in",
                move |timestamp, message, _| callback(timestamp, message),
                (),
            )
            .map_err(|e| TransportError::ConnectFailed {
                port: port_name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(MidirInput { port_name, conn }))
    }

    fn open_output(&self, name: &str) -> Result<Box<dyn OutputConnection>, TransportError> {
        let output = MidiOutput::new(&self.client_name).map_err(backend)?;

        let ports = output.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| output.port_name(p).unwrap_or_default())
            .collect();
        let index = find_port(names.iter().map(String::as_str), name)
            .ok_or_else(|| TransportError::PortNotFound(name.to_string()))?;
        let port_name = names[index].clone();

        debug!("Connecting output '{}'", port_name);
        let conn = output
            .connect(&ports[index], "midimux-out")
            .map_err(|e| TransportError::ConnectFailed {
                port: port_name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(MidirOutput { port_name, conn }))
    }
}

struct MidirInput {
    port_name: String,
    conn: MidiInputConnection<()>,
}

impl InputConnection for MidirInput {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn close(self: Box<Self>) {
        self.conn.close();
    }
}

struct MidirOutput {
    port_name: String,
    conn: MidiOutputConnection,
}

impl OutputConnection for MidirOutput {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.conn
            .send(frame)
            .map_err(|e| TransportError::SendFailed {
                port: self.port_name.clone(),
                reason: e.to_string(),
            })
    }

    fn close(self: Box<Self>) {
        self.conn.close();
    }
}
