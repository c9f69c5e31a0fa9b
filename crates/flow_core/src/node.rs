use crate::addon::{AcceptResult, AddOn, AddOnId};
use crate::capability::DataPinValueSupplier;
use crate::exec::ExecCtx;
use crate::graph::NodeId;
use crate::host::HostServices;
use crate::pin::{DEFAULT_INPUT_PIN, DEFAULT_OUTPUT_PIN, Pin};
use crate::validate::ValidationLog;
use serde::{Deserialize, Serialize};
use std::any::Any;

pub use execute_component::{ComponentSource, ExecuteComponent};

pub mod execute_component;

/// The behavior of a single node within a graph.
///
/// All lifecycle methods are called by the owning
/// [`GraphInstance`][crate::GraphInstance] with an [`ExecCtx`] through which the
/// node may trigger outputs, finish, resolve its data pins and log.
pub trait Node: Any + DataPinValueSupplier {
    /// The name of the implementing type, used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// A short human readable title.
    ///
    /// By default, the last path segment of the type name.
    fn title(&self) -> String {
        let name = self.type_name();
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name).to_string()
    }

    /// The statically declared input pins.
    ///
    /// By default, a single exec pin named `In`.
    fn input_pins(&self) -> Vec<Pin> {
        vec![Pin::exec(DEFAULT_INPUT_PIN)]
    }

    /// The statically declared output pins.
    ///
    /// By default, a single exec pin named `Out`.
    fn output_pins(&self) -> Vec<Pin> {
        vec![Pin::exec(DEFAULT_OUTPUT_PIN)]
    }

    /// Input pins contributed by the node's current configuration.
    fn context_inputs(&self, _host: &HostServices) -> Vec<Pin> {
        vec![]
    }

    /// Output pins contributed by the node's current configuration.
    fn context_outputs(&self, _host: &HostServices) -> Vec<Pin> {
        vec![]
    }

    /// Whether the node agrees to host `candidate` as an add-on.
    fn accept_add_on_child(&self, _candidate: &dyn AddOn, _others: &[&dyn AddOn]) -> AcceptResult {
        AcceptResult::Undetermined
    }

    /// Report configuration problems found at design time.
    fn validate(&self, _id: NodeId, _host: &HostServices, _log: &mut ValidationLog) {}

    fn initialize_instance(&mut self, _ctx: &mut ExecCtx) {}

    /// Called on deinitialization before the node's add-ons are deinitialized.
    fn pre_deinitialize_instance(&mut self, _ctx: &mut ExecCtx) {}

    fn deinitialize_instance(&mut self, _ctx: &mut ExecCtx) {}
    fn preload_content(&mut self, _ctx: &mut ExecCtx) {}
    fn flush_content(&mut self, _ctx: &mut ExecCtx) {}
    fn on_activate(&mut self, _ctx: &mut ExecCtx) {}
    fn cleanup(&mut self, _ctx: &mut ExecCtx) {}
    fn force_finish_node(&mut self, _ctx: &mut ExecCtx) {}

    /// Handle execution arriving on one of the node's own input pins.
    ///
    /// By default, passes execution through the `Out` pin.
    fn execute_input(&mut self, ctx: &mut ExecCtx, _pin: &str) {
        ctx.trigger_default_output();
    }
}

/// Addresses a node or one of its add-ons.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Entity {
    Node(NodeId),
    AddOn(NodeId, AddOnId),
}

/// Distinguishes node types from add-on types during acceptance checks.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum EntityKind {
    Node,
    AddOn,
}

/// Where a node is within its current activation.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum ActivationState {
    #[default]
    NeverActivated,
    Active,
    Completed,
    Aborted,
}

/// Whether the node instance exists.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum InstanceState {
    #[default]
    Uninitialized,
    Initialized,
    /// Terminal. Every later lifecycle call is an error.
    Deinitialized,
}

impl Entity {
    /// The node this entity belongs to.
    pub fn node(&self) -> NodeId {
        match *self {
            Entity::Node(node) | Entity::AddOn(node, _) => node,
        }
    }
}

impl ActivationState {
    pub fn is_finished(&self) -> bool {
        matches!(self, ActivationState::Completed | ActivationState::Aborted)
    }
}

impl dyn Node {
    /// Downcast to the concrete node type.
    pub fn downcast_ref<T: Node>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Node>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}
