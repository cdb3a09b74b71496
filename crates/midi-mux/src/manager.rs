//! Port manager and the reinit protocol
//!
//! The manager owns every open port and decides which handler goes on which
//! input. A port that cannot be opened is simply left unbound; the handlers
//! that need it stay detached until a later reinit pass finds the device.
//!
//! Reinit rebuilds only the dynamic ports. The emergency-control input is
//! the trigger source for reinit itself, so once bound it keeps its port and
//! its handler for the life of the manager.

use std::collections::BTreeMap;
use std::sync::Arc;

use midi_protocol::PortDirection;
use tracing::{debug, info};

use crate::binding::{InputBinding, InputRoute, OutputBinding};
use crate::config::RouterConfig;
use crate::error::MuxError;
use crate::handler::{
    EmergencyControl, GuitarAmpBridge, GuitarWing, HandlerKind, PortHandler, VoiceFxBridge,
};
use crate::ports::{PortBinding, PortRole};
use crate::signal::ReinitSignal;
use crate::supervisor::RestartHandle;
use crate::transport::MidiTransport;

/// Owns all port bindings and their handlers
pub struct PortManager {
    config: RouterConfig,
    transport: Arc<dyn MidiTransport>,
    reinit: Arc<ReinitSignal>,
    restart: RestartHandle,
    inputs: BTreeMap<PortRole, InputBinding>,
    outputs: BTreeMap<PortRole, OutputBinding>,
    generation: u64,
}

impl PortManager {
    /// Create a manager with nothing open yet
    pub fn new(
        config: RouterConfig,
        transport: Arc<dyn MidiTransport>,
        reinit: Arc<ReinitSignal>,
        restart: RestartHandle,
    ) -> Result<Self, MuxError> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            reinit,
            restart,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            generation: 0,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Signal this manager's reinit pass is driven by
    pub fn reinit_signal(&self) -> Arc<ReinitSignal> {
        Arc::clone(&self.reinit)
    }

    /// Completed reinit passes since startup
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Open every configured port and attach what can be attached
    pub fn start(&mut self) {
        info!("Binding MIDI ports");
        self.ensure_emergency();
        for role in PortRole::DYNAMIC {
            self.open_port(role);
        }
        self.attach_dynamic();
        self.log_status();
    }

    /// Run one reinit pass
    ///
    /// Tears down every dynamic port and handler, reopens the ports by name
    /// and reattaches the handlers whose ports all came back. An emergency
    /// input that was missing is opened as well; one that is bound is left
    /// alone.
    pub fn reinitialize(&mut self) {
        info!("Reinitializing MIDI ports (pass {})", self.generation + 1);

        self.teardown_dynamic();
        for role in PortRole::DYNAMIC {
            self.open_port(role);
        }
        self.ensure_emergency();
        self.attach_dynamic();

        self.generation += 1;
        self.log_status();
    }

    /// One entry per configured port
    pub fn status(&self) -> Vec<PortBinding> {
        PortRole::ALL
            .iter()
            .map(|&role| PortBinding {
                role,
                name: self.config.ports.name_for(role).to_string(),
                direction: role.direction(),
                available: self.is_available(role),
            })
            .collect()
    }

    pub fn is_available(&self, role: PortRole) -> bool {
        match role.direction() {
            PortDirection::In => self.inputs.contains_key(&role),
            PortDirection::Out => self.outputs.contains_key(&role),
        }
    }

    /// Handlers currently receiving events
    pub fn attached_handlers(&self) -> Vec<HandlerKind> {
        let mut kinds: Vec<_> = self
            .inputs
            .values()
            .filter_map(InputBinding::attached_kind)
            .collect();
        kinds.sort();
        kinds
    }

    /// Close every port, emergency input included
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.inputs.is_empty() && self.outputs.is_empty() {
            return;
        }
        info!("Releasing MIDI ports");
        let roles: Vec<_> = self.inputs.keys().copied().collect();
        for role in roles {
            self.close_input(role);
        }
        let roles: Vec<_> = self.outputs.keys().copied().collect();
        for role in roles {
            self.close_output(role);
        }
    }

    fn ensure_emergency(&mut self) {
        if self.inputs.contains_key(&PortRole::EmergencyIn) {
            return;
        }
        if self.open_port(PortRole::EmergencyIn) {
            self.attach(HandlerKind::EmergencyControl);
        }
    }

    fn attach_dynamic(&mut self) {
        for kind in HandlerKind::ALL {
            if kind != HandlerKind::EmergencyControl {
                self.attach(kind);
            }
        }
    }

    /// Inputs first, so no route still sends to an output being closed
    fn teardown_dynamic(&mut self) {
        for role in PortRole::DYNAMIC {
            if role.direction() == PortDirection::In {
                self.close_input(role);
            }
        }
        for role in PortRole::DYNAMIC {
            if role.direction() == PortDirection::Out {
                self.close_output(role);
            }
        }
    }

    fn close_input(&mut self, role: PortRole) {
        let Some(binding) = self.inputs.remove(&role) else {
            return;
        };
        let name = binding.name().to_string();
        if let Some(mut route) = binding.close() {
            route.handler.teardown();
            info!("Detached {} handler", route.handler.kind());
        }
        debug!("Closed {} '{}'", role, name);
    }

    fn close_output(&mut self, role: PortRole) {
        if let Some(binding) = self.outputs.remove(&role) {
            let name = binding.name().to_string();
            binding.close();
            debug!("Closed {} '{}'", role, name);
        }
    }

    /// Try to open a port; absence is logged and reported as `false`
    fn open_port(&mut self, role: PortRole) -> bool {
        let name = self.config.ports.name_for(role).to_string();
        let transport = self.transport.as_ref();

        let opened = match role.direction() {
            PortDirection::In => InputBinding::open(transport, &name).map(|binding| {
                info!("Opened {} '{}' as '{}'", role, name, binding.port_name());
                self.inputs.insert(role, binding);
            }),
            PortDirection::Out => OutputBinding::open(transport, &name).map(|binding| {
                info!("Opened {} '{}' as '{}'", role, name, binding.port_name());
                self.outputs.insert(role, binding);
            }),
        };

        match opened {
            Ok(()) => true,
            Err(e) => {
                info!("{} '{}' unavailable: {}", role, name, e);
                false
            }
        }
    }

    fn build_handler(&self, kind: HandlerKind) -> PortHandler {
        match kind {
            HandlerKind::EmergencyControl => PortHandler::EmergencyControl(EmergencyControl::new(
                self.config.emergency,
                Arc::clone(&self.reinit),
                self.restart.clone(),
            )),
            HandlerKind::GuitarWing => PortHandler::GuitarWing(GuitarWing::new()),
            HandlerKind::VoiceFx => PortHandler::VoiceFx(VoiceFxBridge::new(self.config.voice_fx)),
            HandlerKind::GuitarAmp => {
                PortHandler::GuitarAmp(GuitarAmpBridge::new(self.config.guitar_amp))
            }
        }
    }

    /// Attach `kind` if all of its ports are open
    fn attach(&self, kind: HandlerKind) -> bool {
        if let Some(missing) = kind.required_roles().find(|&role| !self.is_available(role)) {
            info!(
                "Unable to attach {} handler: {} unavailable, send a reinit once it is connected",
                kind, missing
            );
            return false;
        }
        let Some(input) = self.inputs.get(&kind.input_role()) else {
            return false;
        };
        let output = kind
            .output_role()
            .and_then(|role| self.outputs.get(&role))
            .map(OutputBinding::shared);

        input.attach(InputRoute {
            handler: self.build_handler(kind),
            output,
        });
        info!("Attached {} handler", kind);
        true
    }

    fn log_status(&self) {
        for binding in self.status() {
            info!(
                "  {:<22} {:<24} {}",
                binding.role.label(),
                binding.name,
                if binding.available { "available" } else { "unavailable" }
            );
        }
        info!(
            "Attached handlers: {:?} (generation {})",
            self.attached_handlers(),
            self.generation
        );
    }
}

impl Drop for PortManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PortManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortManager")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("generation", &self.generation)
            .finish()
    }
}
