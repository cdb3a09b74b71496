//! Open port bindings
//!
//! An [`InputBinding`] registers its callback once, at open time. The
//! callback reads the handler from a dispatch slot the binding owns, so the
//! port manager can attach, swap or detach handlers without reopening the
//! port. Detaching takes the slot lock, which waits for any callback that is
//! mid-dispatch; callbacks arriving after that see an empty slot and discard
//! the frame.

use std::sync::Arc;

use midi_protocol::{classify, OutboundAction};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::handler::{HandlerKind, PortHandler};
use crate::transport::{InputConnection, MidiTransport, OutputConnection};

/// An output port shared by every route that sends to it
///
/// `None` once the port has been closed.
pub type SharedOutput = Arc<Mutex<Option<Box<dyn OutputConnection>>>>;

/// A handler plus the output its actions go to
pub struct InputRoute {
    pub handler: PortHandler,
    pub output: Option<SharedOutput>,
}

impl std::fmt::Debug for InputRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRoute")
            .field("handler", &self.handler.kind())
            .field("has_output", &self.output.is_some())
            .finish()
    }
}

type RouteSlot = Arc<Mutex<Option<InputRoute>>>;

/// Classify a frame and run it through whatever route is attached
fn dispatch(slot: &Mutex<Option<InputRoute>>, port: &str, frame: &[u8]) {
    let event = classify(frame);
    let mut guard = slot.lock();
    let Some(route) = guard.as_mut() else {
        debug!("No handler on '{}', dropping {:02X?}", port, frame);
        return;
    };

    let actions = route.handler.handle(&event);
    if actions.is_empty() {
        return;
    }
    if let Some(output) = &route.output {
        send_all(output, &actions);
    }
}

fn send_all(output: &SharedOutput, actions: &[OutboundAction]) {
    let mut guard = output.lock();
    let Some(conn) = guard.as_mut() else {
        debug!("Output closed, dropping {} action(s)", actions.len());
        return;
    };
    for action in actions {
        let bytes = action.encode();
        debug!("-> {} {:02X?}", conn.port_name(), bytes);
        if let Err(e) = conn.send(&bytes) {
            warn!("{}", e);
        }
    }
}

/// An open input port and its dispatch slot
pub struct InputBinding {
    name: String,
    slot: RouteSlot,
    connection: Box<dyn InputConnection>,
}

impl InputBinding {
    /// Open `name` with an empty dispatch slot
    pub fn open(transport: &dyn MidiTransport, name: &str) -> Result<Self, TransportError> {
        let slot: RouteSlot = Arc::new(Mutex::new(None));
        let cb_slot = Arc::clone(&slot);
        let port = name.to_string();
        let connection = transport.open_input(
            name,
            Box::new(move |_timestamp, frame| dispatch(&cb_slot, &port, frame)),
        )?;

        Ok(Self {
            name: name.to_string(),
            slot,
            connection,
        })
    }

    /// Configured name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the device actually opened
    pub fn port_name(&self) -> &str {
        self.connection.port_name()
    }

    /// Install a route, returning the one it replaced
    pub fn attach(&self, route: InputRoute) -> Option<InputRoute> {
        self.slot.lock().replace(route)
    }

    /// Remove the route; later frames are discarded
    pub fn detach(&self) -> Option<InputRoute> {
        self.slot.lock().take()
    }

    pub fn attached_kind(&self) -> Option<HandlerKind> {
        self.slot.lock().as_ref().map(|route| route.handler.kind())
    }

    /// Detach, then close the port; returns the detached route
    pub fn close(self) -> Option<InputRoute> {
        let route = self.detach();
        self.connection.close();
        route
    }
}

impl std::fmt::Debug for InputBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputBinding")
            .field("name", &self.name)
            .field("handler", &self.attached_kind())
            .finish()
    }
}

/// An open output port
pub struct OutputBinding {
    name: String,
    port_name: String,
    shared: SharedOutput,
}

impl OutputBinding {
    pub fn open(transport: &dyn MidiTransport, name: &str) -> Result<Self, TransportError> {
        let connection = transport.open_output(name)?;
        Ok(Self {
            name: name.to_string(),
            port_name: connection.port_name().to_string(),
            shared: Arc::new(Mutex::new(Some(connection))),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Handle for routes that send to this port
    pub fn shared(&self) -> SharedOutput {
        Arc::clone(&self.shared)
    }

    /// Close the port; routes still holding it drop their sends
    pub fn close(self) {
        let connection = self.shared.lock().take();
        if let Some(conn) = connection {
            conn.close();
        }
    }
}

impl std::fmt::Debug for OutputBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBinding")
            .field("name", &self.name)
            .field("port_name", &self.port_name)
            .finish()
    }
}
