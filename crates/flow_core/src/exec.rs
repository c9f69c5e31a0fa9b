//! The contexts handed to entities during lifecycle calls.
//!
//! Signals raised by an entity (triggering an output, finishing) are queued in
//! an [`Outbox`] and applied by the [`GraphInstance`][crate::GraphInstance] as
//! soon as the entity's handler returns.

use crate::capability::DataPinValueSupplier;
use crate::config::Settings;
use crate::graph::{Graph, NodeId};
use crate::host::{HostServices, Severity};
use crate::node::{ActivationState, Entity};
use crate::pin::{DEFAULT_OUTPUT_PIN, PinSet};
use crate::resolve::{Busy, DataPinResult, SupplyCtx};
use crate::value::DataPinValue;
use crate::world::{ActorId, World};
use std::fmt;

/// Context for a node or add-on lifecycle call.
pub struct ExecCtx<'a> {
    node: NodeId,
    entity: Entity,
    graph: &'a Graph,
    host: &'a mut HostServices,
    settings: &'a Settings,
    outbox: &'a mut Outbox,
}

/// Context for a component driven by a proxy node.
pub struct ComponentCtx<'a> {
    node: NodeId,
    finished: bool,
    outbox: &'a mut Outbox,
}

/// Signals queued by an entity during a single lifecycle call.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    pub(crate) signals: Vec<Signal>,
    finish_requested: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Signal {
    Trigger { pin: String, finish: bool },
    Finish,
}

impl<'a> ExecCtx<'a> {
    pub(crate) fn new(
        entity: Entity,
        graph: &'a Graph,
        host: &'a mut HostServices,
        settings: &'a Settings,
        outbox: &'a mut Outbox,
    ) -> Self {
        ExecCtx {
            node: entity.node(),
            entity,
            graph,
            host,
            settings,
            outbox,
        }
    }

    /// The node whose lifecycle is running.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The node or add-on currently being called.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn host(&self) -> &HostServices {
        &*self.host
    }

    pub fn host_mut(&mut self) -> &mut HostServices {
        &mut *self.host
    }

    pub fn world(&self) -> &dyn World {
        self.host.world()
    }

    pub fn world_mut(&mut self) -> &mut dyn World {
        self.host.world_mut()
    }

    /// The actor owning the graph instance.
    pub fn owner(&self) -> Option<ActorId> {
        self.host.owner()
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// The activation state as of the start of this call.
    pub fn activation_state(&self) -> ActivationState {
        self.graph
            .node_weight(self.node)
            .map(|entry| entry.activation)
            .unwrap_or_default()
    }

    /// Whether the node has finished, including a finish requested during this
    /// call.
    pub fn has_finished(&self) -> bool {
        self.outbox.finish_requested || self.activation_state().is_finished()
    }

    /// The input pins of the node.
    pub fn input_pins(&self) -> Option<&PinSet> {
        self.graph.node_weight(self.node).map(|entry| &entry.pins.inputs)
    }

    /// The output pins of the node.
    pub fn output_pins(&self) -> Option<&PinSet> {
        self.graph.node_weight(self.node).map(|entry| &entry.pins.outputs)
    }

    /// Trigger an output pin of the node, optionally finishing the node first.
    pub fn trigger_output(&mut self, pin: impl Into<String>, finish: bool) {
        self.outbox.trigger(pin.into(), finish);
    }

    /// Trigger the default output if the node exposes one and has not
    /// finished. Returns whether the output was triggered.
    pub fn trigger_default_output(&mut self) -> bool {
        let exposed = self
            .output_pins()
            .is_some_and(|pins| pins.contains(DEFAULT_OUTPUT_PIN));
        if !exposed || self.has_finished() {
            return false;
        }
        self.trigger_output(DEFAULT_OUTPUT_PIN, false);
        true
    }

    /// Finish the node without triggering any output.
    pub fn finish(&mut self) {
        self.outbox.finish();
    }

    /// Resolve one of the node's input pins.
    ///
    /// `this` stands in for the calling entity, which is detached from the
    /// graph for the duration of the call, so that defaults it supplies for its
    /// own pins are still found.
    pub fn resolve<T: DataPinValue>(
        &self,
        this: &dyn DataPinValueSupplier,
        pin: &str,
    ) -> DataPinResult<T> {
        let busy = Busy {
            entity: self.entity,
            this,
        };
        SupplyCtx::new(self.graph, &*self.host, self.settings, self.node, Some(busy))
            .resolve::<T>(pin)
    }

    pub fn log_error(&mut self, text: impl fmt::Display) {
        self.host.log(Severity::Error, Some(self.node), text);
    }

    pub fn log_warning(&mut self, text: impl fmt::Display) {
        self.host.log(Severity::Warning, Some(self.node), text);
    }

    pub fn log_note(&mut self, text: impl fmt::Display) {
        self.host.log(Severity::Note, Some(self.node), text);
    }

    /// Split into the world and a context for a component of the world.
    pub fn component_scope(&mut self) -> (&mut dyn World, ComponentCtx<'_>) {
        let finished = self.has_finished();
        let world = self.host.world_mut();
        let ctx = ComponentCtx {
            node: self.node,
            finished,
            outbox: &mut *self.outbox,
        };
        (world, ctx)
    }
}

impl<'a> ComponentCtx<'a> {
    /// The proxy node driving the component.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn has_finished(&self) -> bool {
        self.finished || self.outbox.finish_requested
    }

    /// Trigger an output pin of the proxy node.
    pub fn trigger_output(&mut self, pin: impl Into<String>, finish: bool) {
        self.outbox.trigger(pin.into(), finish);
    }

    /// Finish the proxy node without triggering any output.
    pub fn finish(&mut self) {
        self.outbox.finish();
    }
}

impl Outbox {
    fn trigger(&mut self, pin: String, finish: bool) {
        self.finish_requested |= finish;
        self.signals.push(Signal::Trigger { pin, finish });
    }

    fn finish(&mut self) {
        self.finish_requested = true;
        self.signals.push(Signal::Finish);
    }
}
