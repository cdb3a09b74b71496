//! Virtual MIDI transport
//!
//! Devices are identified by name and are either present or not. Opening
//! an absent device fails exactly like a real backend does when the
//! hardware is unplugged. Ports are matched by the same exact-then-substring
//! rule the daemon uses.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use midi_detect::find_port;
use midi_mux::{
    InputCallback, InputConnection, MidiTransport, OutboundAction, OutputConnection, TransportError,
};
use parking_lot::Mutex;
use tracing::debug;

type SharedCallback = Arc<Mutex<InputCallback>>;
type OpenHook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Inner {
    inputs: BTreeSet<String>,
    outputs: BTreeSet<String>,
    open_inputs: HashMap<u64, (String, SharedCallback)>,
    open_outputs: HashMap<u64, String>,
    sent: HashMap<String, Vec<Vec<u8>>>,
    opens: HashMap<String, usize>,
    next_id: u64,
    clock_us: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn resolve(devices: &BTreeSet<String>, wanted: &str) -> Option<String> {
    let names: Vec<&str> = devices.iter().map(String::as_str).collect();
    find_port(names.iter().copied(), wanted).map(|i| names[i].to_string())
}

/// In-memory transport with hot-pluggable devices
///
/// Cloning shares the same device set.
#[derive(Clone, Default)]
pub struct VirtualTransport {
    inner: Arc<Mutex<Inner>>,
    on_open: Arc<Mutex<Option<OpenHook>>>,
}

impl VirtualTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an input device present
    pub fn plug_input(&self, name: &str) {
        self.inner.lock().inputs.insert(name.to_string());
    }

    /// Make an output device present
    pub fn plug_output(&self, name: &str) {
        self.inner.lock().outputs.insert(name.to_string());
    }

    /// Remove a device; open connections to it stop delivering and sending
    pub fn unplug(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner.inputs.remove(name);
        inner.outputs.remove(name);
    }

    /// Run `hook` with the requested name before every open attempt
    pub fn set_on_open<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.on_open.lock() = Some(Arc::new(hook));
    }

    /// Deliver a frame to every open connection on input device `name`
    ///
    /// Returns how many connections received it. Callbacks run on the
    /// calling thread with no transport lock held.
    pub fn inject(&self, name: &str, frame: &[u8]) -> usize {
        let (timestamp, callbacks) = {
            let mut inner = self.inner.lock();
            if !inner.inputs.contains(name) {
                debug!("Inject on absent device '{}'", name);
                return 0;
            }
            inner.clock_us += 1000;
            let callbacks: Vec<SharedCallback> = inner
                .open_inputs
                .values()
                .filter(|(port, _)| port == name)
                .map(|(_, cb)| Arc::clone(cb))
                .collect();
            (inner.clock_us, callbacks)
        };

        for cb in &callbacks {
            let mut callback = cb.lock();
            (*callback)(timestamp, frame);
        }
        callbacks.len()
    }

    /// Every frame sent to output device `name`, oldest first
    pub fn sent(&self, name: &str) -> Vec<Vec<u8>> {
        self.inner.lock().sent.get(name).cloned().unwrap_or_default()
    }

    /// Frames sent to `name`, decoded; frames that do not decode are skipped
    pub fn sent_actions(&self, name: &str) -> Vec<OutboundAction> {
        self.sent(name)
            .iter()
            .filter_map(|frame| OutboundAction::decode(frame).ok())
            .collect()
    }

    /// Return and forget the frames sent to `name`
    pub fn take_sent(&self, name: &str) -> Vec<Vec<u8>> {
        self.inner.lock().sent.remove(name).unwrap_or_default()
    }

    /// Successful opens of device `name` so far
    pub fn open_count(&self, name: &str) -> usize {
        self.inner.lock().opens.get(name).copied().unwrap_or(0)
    }

    /// Connections to device `name` currently open
    pub fn open_connections(&self, name: &str) -> usize {
        let inner = self.inner.lock();
        let inputs = inner.open_inputs.values().filter(|(port, _)| port == name).count();
        let outputs = inner.open_outputs.values().filter(|port| *port == name).count();
        inputs + outputs
    }

    fn run_hook(&self, name: &str) {
        let hook = self.on_open.lock().clone();
        if let Some(hook) = hook {
            hook(name);
        }
    }
}

impl std::fmt::Debug for VirtualTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("VirtualTransport")
            .field("inputs", &inner.inputs)
            .field("outputs", &inner.outputs)
            .finish()
    }
}

impl MidiTransport for VirtualTransport {
    fn open_input(
        &self,
        name: &str,
        callback: InputCallback,
    ) -> Result<Box<dyn InputConnection>, TransportError> {
        self.run_hook(name);

        let mut inner = self.inner.lock();
        let port = resolve(&inner.inputs, name)
            .ok_or_else(|| TransportError::PortNotFound(name.to_string()))?;
        let id = inner.next_id();
        inner
            .open_inputs
            .insert(id, (port.clone(), Arc::new(Mutex::new(callback))));
        *inner.opens.entry(port.clone()).or_default() += 1;

        Ok(Box::new(VirtualInput {
            id,
            port,
            inner: Arc::clone(&self.inner),
        }))
    }

    fn open_output(&self, name: &str) -> Result<Box<dyn OutputConnection>, TransportError> {
        self.run_hook(name);

        let mut inner = self.inner.lock();
        let port = resolve(&inner.outputs, name)
            .ok_or_else(|| TransportError::PortNotFound(name.to_string()))?;
        let id = inner.next_id();
        inner.open_outputs.insert(id, port.clone());
        *inner.opens.entry(port.clone()).or_default() += 1;

        Ok(Box::new(VirtualOutput {
            id,
            port,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct VirtualInput {
    id: u64,
    port: String,
    inner: Arc<Mutex<Inner>>,
}

impl InputConnection for VirtualInput {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn close(self: Box<Self>) {
        self.inner.lock().open_inputs.remove(&self.id);
    }
}

struct VirtualOutput {
    id: u64,
    port: String,
    inner: Arc<Mutex<Inner>>,
}

impl OutputConnection for VirtualOutput {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        if !inner.outputs.contains(&self.port) {
            return Err(TransportError::SendFailed {
                port: self.port.clone(),
                reason: "device unplugged".to_string(),
            });
        }
        inner
            .sent
            .entry(self.port.clone())
            .or_default()
            .push(frame.to_vec());
        Ok(())
    }

    fn close(self: Box<Self>) {
        self.inner.lock().open_outputs.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_callback() -> (InputCallback, Arc<Mutex<Vec<Vec<u8>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cb: InputCallback = Box::new(move |_, frame| sink.lock().push(frame.to_vec()));
        (cb, seen)
    }

    #[test]
    fn test_open_absent_device_fails() {
        let transport = VirtualTransport::new();
        let err = transport.open_output("Bus 3").err();
        assert_eq!(err, Some(TransportError::PortNotFound("Bus 3".to_string())));
    }

    #[test]
    fn test_substring_match() {
        let transport = VirtualTransport::new();
        transport.plug_output("IAC Driver Bus 3");
        let out = transport.open_output("Bus 3").unwrap();
        assert_eq!(out.port_name(), "IAC Driver Bus 3");
        assert_eq!(transport.open_count("IAC Driver Bus 3"), 1);
    }

    #[test]
    fn test_inject_reaches_open_inputs_only() {
        let transport = VirtualTransport::new();
        transport.plug_input("Bus 1");
        let (cb, seen) = recording_callback();
        let conn = transport.open_input("Bus 1", cb).unwrap();

        assert_eq!(transport.inject("Bus 1", &[0x96, 46, 127]), 1);
        assert_eq!(*seen.lock(), vec![vec![0x96, 46, 127]]);

        conn.close();
        assert_eq!(transport.inject("Bus 1", &[0x96, 46, 127]), 0);
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(transport.open_connections("Bus 1"), 0);
    }

    #[test]
    fn test_unplugged_device_stops_delivering() {
        let transport = VirtualTransport::new();
        transport.plug_input("Wing");
        transport.plug_output("Out");
        let (cb, seen) = recording_callback();
        let _input = transport.open_input("Wing", cb).unwrap();
        let mut out = transport.open_output("Out").unwrap();

        transport.unplug("Wing");
        transport.unplug("Out");
        assert_eq!(transport.inject("Wing", &[0x90, 36, 127]), 0);
        assert!(seen.lock().is_empty());
        assert!(out.send(&[0xB0, 1, 2]).is_err());
    }

    #[test]
    fn test_on_open_hook_runs_before_open() {
        let transport = VirtualTransport::new();
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        transport.set_on_open(move |name| sink.lock().push(name.to_string()));

        let _ = transport.open_output("Missing");
        assert_eq!(*names.lock(), vec!["Missing".to_string()]);
    }
}
