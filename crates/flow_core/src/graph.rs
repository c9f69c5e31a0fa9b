//! The graph instance: node storage, wiring and the node lifecycle.

use crate::addon::{
    self, AcceptResult, AddOn, AddOnId, AddOnTemplate, AddOns, ChildRule, ForEachAddOn, Parent,
};
use crate::config::Settings;
use crate::edge::Edge;
use crate::error::{
    AddOnRejected, Direction, GraphError, InstanceStateError, NodeNotFound, PinNotFound,
};
use crate::exec::{ExecCtx, Outbox, Signal};
use crate::host::{HostServices, Severity};
use crate::node::{ActivationState, Entity, InstanceState, Node};
use crate::pin::{self, DEFAULT_INPUT_PIN, DEFAULT_OUTPUT_PIN, Pin, PinSet, PinType, Pins};
use crate::resolve::{DataPinResult, SupplyCtx};
use crate::validate::ValidationLog;
use crate::value::{self, DataPinValue, Value};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::any::Any;
use std::fmt;

/// The index type used for nodes and edges.
pub type Index = usize;
/// Identifies a node within a graph instance.
pub type NodeId = petgraph::graph::NodeIndex<Index>;
/// Identifies a connection within a graph instance.
pub type EdgeId = petgraph::graph::EdgeIndex<Index>;
/// The underlying graph type.
pub type Graph = StableGraph<NodeEntry, Edge, petgraph::Directed, Index>;

/// A node along with its add-ons, pins and lifecycle state.
pub struct NodeEntry {
    /// `None` only while the node's own handler is running.
    pub(crate) node: Option<Box<dyn Node>>,
    pub(crate) templates: Vec<AddOnTemplate>,
    pub(crate) add_ons: AddOns,
    pub(crate) pins: Pins,
    pub(crate) instance: InstanceState,
    pub(crate) activation: ActivationState,
    /// Whether cleanup has run for the current activation.
    pub(crate) cleaned_up: bool,
}

/// A lifecycle event, delivered to observers as it happens.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    NodeInitialized(NodeId),
    NodeActivated(NodeId),
    InputExecuted { node: NodeId, pin: String },
    OutputTriggered { node: NodeId, pin: String, finish: bool },
    NodeFinished { node: NodeId, state: ActivationState },
    NodeDeinitialized(NodeId),
}

/// Identifies an observer registered with [`GraphInstance::subscribe`].
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct ObserverId(usize);

type Observer = Box<dyn FnMut(&Event)>;

/// A graph of nodes driven through their lifecycle.
///
/// Every lifecycle operation runs synchronously. Outputs triggered by a node
/// propagate depth-first to connected inputs before the operation returns.
pub struct GraphInstance {
    graph: Graph,
    host: HostServices,
    settings: Settings,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: usize,
    depth: usize,
}

impl NodeEntry {
    fn new(node: Box<dyn Node>) -> Self {
        NodeEntry {
            node: Some(node),
            templates: vec![],
            add_ons: AddOns::default(),
            pins: Pins::default(),
            instance: InstanceState::Uninitialized,
            activation: ActivationState::NeverActivated,
            cleaned_up: false,
        }
    }

    /// The node, unless its own handler is currently running.
    pub fn node(&self) -> Option<&dyn Node> {
        self.node.as_deref()
    }

    pub fn pins(&self) -> &Pins {
        &self.pins
    }

    pub fn add_ons(&self) -> &AddOns {
        &self.add_ons
    }

    /// The add-on templates the instances are created from.
    pub fn templates(&self) -> &[AddOnTemplate] {
        &self.templates
    }

    pub fn instance_state(&self) -> InstanceState {
        self.instance
    }

    pub fn activation_state(&self) -> ActivationState {
        self.activation
    }
}

/// Generates a typed resolve method per data pin type.
macro_rules! resolve_as {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Resolve an input pin to a `", stringify!($ty), "`.")]
            pub fn $name(&self, node: NodeId, pin: &str) -> DataPinResult<$ty> {
                self.resolve::<$ty>(node, pin)
            }
        )*
    };
}

impl GraphInstance {
    pub fn new(host: HostServices) -> Self {
        Self::with_settings(host, Settings::default())
    }

    pub fn with_settings(mut host: HostServices, settings: Settings) -> Self {
        host.messages_mut().set_enabled(settings.record_messages);
        GraphInstance {
            graph: Graph::default(),
            host,
            settings,
            observers: vec![],
            next_observer: 0,
            depth: 0,
        }
    }

    pub fn host(&self) -> &HostServices {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut HostServices {
        &mut self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read access to the underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Add a node, returning its id.
    pub fn add_node(&mut self, node: impl Node) -> NodeId {
        self.add_boxed_node(Box::new(node))
    }

    pub fn add_boxed_node(&mut self, node: Box<dyn Node>) -> NodeId {
        let id = self.graph.add_node(NodeEntry::new(node));
        self.refresh_pins(id);
        id
    }

    /// Attach an add-on template (and its nested templates) to a node that has
    /// not yet been initialized.
    ///
    /// The node and every add-on in the template tree are asked whether they
    /// accept their child. Any rejection fails the whole attachment.
    pub fn attach_add_on(&mut self, id: NodeId, template: AddOnTemplate) -> Result<(), GraphError> {
        let entry = self.entry(id)?;
        match entry.instance {
            InstanceState::Uninitialized => (),
            InstanceState::Initialized => return Err(InstanceStateError::AlreadyInitialized(id).into()),
            InstanceState::Deinitialized => return Err(InstanceStateError::Deinitialized(id).into()),
        }
        let Some(node) = entry.node.as_deref() else {
            return Err(NodeNotFound(id).into());
        };
        let others: Vec<&dyn AddOn> = entry.templates.iter().map(|t| &*t.add_on).collect();
        check_template(Parent::Node(node), &template, &others)?;

        if let Some(entry) = self.graph.node_weight_mut(id) {
            entry.templates.push(template);
        }
        self.refresh_pins(id);
        Ok(())
    }

    /// Connect an output pin of `src` to an input pin of `dst`.
    pub fn connect(
        &mut self,
        src: NodeId,
        output: &str,
        dst: NodeId,
        input: &str,
    ) -> Result<EdgeId, GraphError> {
        if !self.entry(src)?.pins.outputs.contains(output) {
            return Err(PinNotFound {
                node: src,
                direction: Direction::Output,
                pin: output.to_string(),
            }
            .into());
        }
        if !self.entry(dst)?.pins.inputs.contains(input) {
            return Err(PinNotFound {
                node: dst,
                direction: Direction::Input,
                pin: input.to_string(),
            }
            .into());
        }
        Ok(self.graph.add_edge(src, dst, Edge::new(output, input)))
    }

    /// The input pins connected to an output pin, in connection order.
    pub fn connected_inputs(&self, id: NodeId, output: &str) -> Vec<(NodeId, String)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(id, petgraph::Direction::Outgoing)
            .filter(|edge| edge.weight().output == output)
            .map(|edge| (edge.id(), edge.target(), edge.weight().input.clone()))
            .collect();
        edges.sort_by_key(|(edge, _, _)| *edge);
        edges.into_iter().map(|(_, dst, input)| (dst, input)).collect()
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.graph.node_weight(id)?.node.as_deref()
    }

    /// Downcast a node to its concrete type.
    pub fn node_as<T: Node>(&self, id: NodeId) -> Option<&T> {
        (self.node(id)? as &dyn Any).downcast_ref::<T>()
    }

    pub fn node_as_mut<T: Node>(&mut self, id: NodeId) -> Option<&mut T> {
        let node = self.graph.node_weight_mut(id)?.node.as_deref_mut()?;
        (node as &mut dyn Any).downcast_mut::<T>()
    }

    pub fn node_entry(&self, id: NodeId) -> Option<&NodeEntry> {
        self.graph.node_weight(id)
    }

    /// The add-on instances of an initialized node.
    pub fn add_ons(&self, id: NodeId) -> Option<&AddOns> {
        self.graph.node_weight(id).map(|entry| &entry.add_ons)
    }

    /// Downcast an add-on instance to its concrete type.
    pub fn add_on_as<T: AddOn>(&self, id: NodeId, add_on: AddOnId) -> Option<&T> {
        self.add_ons(id)?.get_as::<T>(add_on)
    }

    pub fn activation_state(&self, id: NodeId) -> Option<ActivationState> {
        self.graph.node_weight(id).map(|entry| entry.activation)
    }

    pub fn instance_state(&self, id: NodeId) -> Option<InstanceState> {
        self.graph.node_weight(id).map(|entry| entry.instance)
    }

    /// Both pin sets of a node.
    pub fn pins(&self, id: NodeId) -> Option<&Pins> {
        self.graph.node_weight(id).map(|entry| &entry.pins)
    }

    /// Every input pin the node exposes, declared and contextual.
    pub fn input_pins(&self, id: NodeId) -> Option<&[Pin]> {
        self.pins(id).map(|pins| &pins.inputs.effective[..])
    }

    /// Every output pin the node exposes, declared and contextual.
    pub fn output_pins(&self, id: NodeId) -> Option<&[Pin]> {
        self.pins(id).map(|pins| &pins.outputs.effective[..])
    }

    /// The input pins handled by the node itself rather than its add-ons.
    pub fn supported_input_pins(&self, id: NodeId) -> Option<&[Pin]> {
        self.pins(id).map(|pins| &pins.inputs.own[..])
    }

    /// Context input pins of the node and its add-ons.
    pub fn context_inputs(&self, id: NodeId) -> Option<&[Pin]> {
        self.pins(id).map(|pins| &pins.inputs.context[..])
    }

    /// Context output pins of the node and its add-ons.
    pub fn context_outputs(&self, id: NodeId) -> Option<&[Pin]> {
        self.pins(id).map(|pins| &pins.outputs.context[..])
    }

    /// Recompute the pins of a node from its current configuration.
    ///
    /// Has no effect once the node has been initialized.
    pub fn refresh_pins(&mut self, id: NodeId) {
        let Some(entry) = self.graph.node_weight(id) else {
            return;
        };
        if entry.pins.frozen {
            return;
        }
        let pins = compute_pins(entry, &self.host);
        if let Some(entry) = self.graph.node_weight_mut(id) {
            entry.pins = pins;
        }
    }

    /// Visit the add-on instances of a node.
    pub fn for_each_add_on<F>(&self, id: NodeId, rule: ChildRule, f: F) -> ForEachAddOn
    where
        F: FnMut(AddOnId, &dyn AddOn) -> ForEachAddOn,
    {
        match self.graph.node_weight(id) {
            Some(entry) => entry.add_ons.for_each(rule, f),
            None => ForEachAddOn::Continue,
        }
    }

    /// Visit the add-on instances of type `T` of a node.
    pub fn for_each_add_on_of<T, F>(&self, id: NodeId, rule: ChildRule, f: F) -> ForEachAddOn
    where
        T: AddOn,
        F: FnMut(AddOnId, &T) -> ForEachAddOn,
    {
        match self.graph.node_weight(id) {
            Some(entry) => entry.add_ons.for_each_of::<T, F>(rule, f),
            None => ForEachAddOn::Continue,
        }
    }

    /// Register a callback invoked for every lifecycle [`Event`].
    pub fn subscribe(&mut self, observer: impl FnMut(&Event) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let len = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != len
    }

    /// Resolve an input pin of a node to a value of type `T`.
    pub fn resolve<T: DataPinValue>(&self, node: NodeId, pin: &str) -> DataPinResult<T> {
        self.resolve_value(node, pin, T::PIN_TYPE).into_data()
    }

    /// Resolve an input pin of a node to an untyped value of type `pin_type`.
    pub fn resolve_value(&self, node: NodeId, pin: &str, pin_type: PinType) -> DataPinResult<Value> {
        SupplyCtx::new(&self.graph, &self.host, &self.settings, node, None)
            .resolve_pin(node, pin, pin_type)
    }

    resolve_as! {
        resolve_data_pin_as_bool => bool,
        resolve_data_pin_as_int => i64,
        resolve_data_pin_as_float => f64,
        resolve_data_pin_as_name => value::Name,
        resolve_data_pin_as_string => String,
        resolve_data_pin_as_text => value::Text,
        resolve_data_pin_as_enum => value::EnumValue,
        resolve_data_pin_as_vector => value::Vector,
        resolve_data_pin_as_rotator => value::Rotator,
        resolve_data_pin_as_transform => value::Transform,
        resolve_data_pin_as_gameplay_tag => value::GameplayTag,
        resolve_data_pin_as_gameplay_tag_container => value::GameplayTagContainer,
        resolve_data_pin_as_instanced_struct => value::InstancedStruct,
        resolve_data_pin_as_object => value::ObjectRef,
        resolve_data_pin_as_class => value::ClassRef,
    }

    /// Check every node and connection for configuration problems.
    pub fn validate(&self) -> ValidationLog {
        let mut log = ValidationLog::new();
        for id in self.graph.node_indices() {
            if let Some(node) = self.node(id) {
                node.validate(id, &self.host, &mut log);
            }
        }
        for edge in self.graph.edge_references() {
            let (src, dst) = (edge.source(), edge.target());
            let Edge { output, input } = edge.weight();
            let output_pin = self.pins(src).and_then(|pins| pins.outputs.get(output));
            let input_pin = self.pins(dst).and_then(|pins| pins.inputs.get(input));
            match (output_pin, input_pin) {
                (None, _) => log.error(src, format!("connected output `{output}` does not exist")),
                (_, None) => log.error(dst, format!("connected input `{input}` does not exist")),
                (Some(a), Some(b)) if a.pin_type != b.pin_type => log.error(
                    dst,
                    format!(
                        "input `{input}` of type {} is connected to `{output}` of type {}",
                        b.pin_type, a.pin_type,
                    ),
                ),
                _ => (),
            }
        }
        log
    }

    /// Create the add-on instances of a node and initialize the node, then its
    /// add-ons. The node's pins are frozen from here on.
    pub fn initialize_instance(&mut self, id: NodeId) -> Result<(), GraphError> {
        let entry = self.entry_mut(id)?;
        match entry.instance {
            InstanceState::Uninitialized => (),
            InstanceState::Initialized => return Err(InstanceStateError::AlreadyInitialized(id).into()),
            InstanceState::Deinitialized => return Err(InstanceStateError::Deinitialized(id).into()),
        }
        entry.add_ons = AddOns::instantiate(id, &entry.templates);
        entry.instance = InstanceState::Initialized;
        let add_ons = entry.add_ons.pre_order();

        self.call_node(id, |node, ctx| node.initialize_instance(ctx));
        for add_on in add_ons {
            self.call_add_on(id, add_on, |a, ctx| a.initialize_instance(ctx));
        }

        self.refresh_pins(id);
        if let Some(entry) = self.graph.node_weight_mut(id) {
            entry.pins.frozen = true;
        }
        log::trace!("initialized node {}", id.index());
        self.emit(Event::NodeInitialized(id));
        Ok(())
    }

    /// Force-finish the node if active, tear down its add-ons then the node,
    /// and destroy the add-on instances.
    ///
    /// The node's `pre_deinitialize_instance` runs before any add-on is torn
    /// down.
    pub fn deinitialize_instance(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.ensure_initialized(id)?;
        self.force_finish_node(id)?;

        self.call_node(id, |node, ctx| node.pre_deinitialize_instance(ctx));
        let add_ons = self.entry(id)?.add_ons.post_order();
        for add_on in add_ons {
            self.call_add_on(id, add_on, |a, ctx| a.deinitialize_instance(ctx));
        }
        self.call_node(id, |node, ctx| node.deinitialize_instance(ctx));

        let entry = self.entry_mut(id)?;
        entry.add_ons = AddOns::default();
        entry.instance = InstanceState::Deinitialized;
        log::trace!("deinitialized node {}", id.index());
        self.emit(Event::NodeDeinitialized(id));
        Ok(())
    }

    pub fn preload_content(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.ensure_initialized(id)?;
        self.call_node(id, |node, ctx| node.preload_content(ctx));
        let add_ons = self.entry(id)?.add_ons.pre_order();
        for add_on in add_ons {
            self.call_add_on(id, add_on, |a, ctx| a.preload_content(ctx));
        }
        Ok(())
    }

    pub fn flush_content(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.ensure_initialized(id)?;
        let add_ons = self.entry(id)?.add_ons.post_order();
        for add_on in add_ons {
            self.call_add_on(id, add_on, |a, ctx| a.flush_content(ctx));
        }
        self.call_node(id, |node, ctx| node.flush_content(ctx));
        Ok(())
    }

    /// Initialize every node not yet initialized, in index order.
    pub fn initialize(&mut self) -> Result<(), GraphError> {
        for id in self.node_ids() {
            if self.instance_state(id) == Some(InstanceState::Uninitialized) {
                self.initialize_instance(id)?;
            }
        }
        Ok(())
    }

    /// Preload the content of every initialized node.
    pub fn preload_all(&mut self) -> Result<(), GraphError> {
        for id in self.initialized_ids() {
            self.preload_content(id)?;
        }
        Ok(())
    }

    /// Flush the content of every initialized node.
    pub fn flush_all(&mut self) -> Result<(), GraphError> {
        for id in self.initialized_ids() {
            self.flush_content(id)?;
        }
        Ok(())
    }

    /// Deinitialize every initialized node.
    pub fn deinitialize(&mut self) -> Result<(), GraphError> {
        for id in self.initialized_ids() {
            self.deinitialize_instance(id)?;
        }
        Ok(())
    }

    /// Deliver execution to an input pin of a node.
    ///
    /// A node that is not active is activated first: the node and then its
    /// add-ons receive `on_activate`. The input then reaches the node if it is
    /// one of its own pins, and every add-on listening for it.
    pub fn trigger_input(&mut self, id: NodeId, pin: &str) -> Result<(), GraphError> {
        self.ensure_initialized(id)?;
        let entry = self.entry_mut(id)?;
        if !entry.pins.inputs.contains(pin) {
            return Err(PinNotFound {
                node: id,
                direction: Direction::Input,
                pin: pin.to_string(),
            }
            .into());
        }

        if entry.activation != ActivationState::Active {
            entry.activation = ActivationState::Active;
            entry.cleaned_up = false;
            let add_ons = entry.add_ons.pre_order();
            self.emit(Event::NodeActivated(id));
            self.call_node(id, |node, ctx| node.on_activate(ctx));
            for add_on in add_ons {
                self.call_add_on(id, add_on, |a, ctx| a.on_activate(ctx));
            }
        }

        self.execute_input_for_self_and_add_ons(id, pin);
        Ok(())
    }

    /// Trigger an output pin of an active node from outside of its handlers,
    /// e.g. to complete a latent node.
    pub fn trigger_output(&mut self, id: NodeId, pin: &str, finish: bool) -> Result<(), GraphError> {
        self.ensure_initialized(id)?;
        self.apply_trigger(id, pin, finish);
        Ok(())
    }

    /// Complete an active node without triggering any output.
    pub fn finish(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.ensure_initialized(id)?;
        self.apply_finish(id);
        Ok(())
    }

    /// Abort an active node: add-ons and then the node receive
    /// `force_finish_node`, after which the node is aborted and cleaned up.
    ///
    /// Does nothing unless the node is active.
    pub fn force_finish_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.ensure_initialized(id)?;
        let entry = self.entry(id)?;
        if entry.activation != ActivationState::Active {
            return Ok(());
        }
        let add_ons = entry.add_ons.post_order();
        for add_on in add_ons {
            self.call_add_on(id, add_on, |a, ctx| a.force_finish_node(ctx));
        }
        self.call_node(id, |node, ctx| node.force_finish_node(ctx));
        if self.activation_state(id) == Some(ActivationState::Active) {
            self.finish_node(id, ActivationState::Aborted);
        }
        Ok(())
    }

    fn execute_input_for_self_and_add_ons(&mut self, id: NodeId, pin: &str) {
        let Some(entry) = self.graph.node_weight(id) else {
            return;
        };
        let own = entry.pins.inputs.is_own(pin);
        let roots = entry.add_ons.roots().to_vec();
        self.emit(Event::InputExecuted {
            node: id,
            pin: pin.to_string(),
        });
        if own {
            self.call_node(id, |node, ctx| node.execute_input(ctx, pin));
        }
        for add_on in roots {
            self.execute_input_for_add_on(id, add_on, pin);
        }
    }

    fn execute_input_for_add_on(&mut self, id: NodeId, add_on: AddOnId, pin: &str) {
        let Some(add_ons) = self.add_ons(id) else {
            return;
        };
        let listens = add_ons.get(add_on).is_some_and(|a| {
            let inputs = a.context_inputs();
            inputs.is_empty() || pin::contains(&inputs, pin)
        });
        let children = add_ons.children(add_on).to_vec();
        if listens {
            self.call_add_on(id, add_on, |a, ctx| a.execute_input(ctx, pin));
        }
        for child in children {
            self.execute_input_for_add_on(id, child, pin);
        }
    }

    /// Detach the node's behavior, call it, reattach it and apply its signals.
    fn call_node<F>(&mut self, id: NodeId, f: F)
    where
        F: FnOnce(&mut dyn Node, &mut ExecCtx),
    {
        let Some(mut node) = self.graph.node_weight_mut(id).and_then(|e| e.node.take()) else {
            return;
        };
        let mut outbox = Outbox::default();
        let mut ctx = ExecCtx::new(
            Entity::Node(id),
            &self.graph,
            &mut self.host,
            &self.settings,
            &mut outbox,
        );
        f(&mut *node, &mut ctx);
        if let Some(entry) = self.graph.node_weight_mut(id) {
            entry.node = Some(node);
        }
        self.apply(id, outbox);
    }

    fn call_add_on<F>(&mut self, id: NodeId, add_on: AddOnId, f: F)
    where
        F: FnOnce(&mut dyn AddOn, &mut ExecCtx),
    {
        let taken = self
            .graph
            .node_weight_mut(id)
            .and_then(|e| e.add_ons.take(add_on));
        let Some(mut instance) = taken else {
            return;
        };
        let mut outbox = Outbox::default();
        let mut ctx = ExecCtx::new(
            Entity::AddOn(id, add_on),
            &self.graph,
            &mut self.host,
            &self.settings,
            &mut outbox,
        );
        f(&mut *instance, &mut ctx);
        if let Some(entry) = self.graph.node_weight_mut(id) {
            entry.add_ons.restore(add_on, instance);
        }
        self.apply(id, outbox);
    }

    fn apply(&mut self, id: NodeId, outbox: Outbox) {
        for signal in outbox.signals {
            match signal {
                Signal::Trigger { pin, finish } => self.apply_trigger(id, &pin, finish),
                Signal::Finish => self.apply_finish(id),
            }
        }
    }

    fn apply_trigger(&mut self, id: NodeId, pin: &str, finish: bool) {
        let Some(entry) = self.graph.node_weight(id) else {
            return;
        };
        if entry.instance != InstanceState::Initialized
            || entry.activation != ActivationState::Active
        {
            let text = format!("cannot trigger output `{pin}` of a node that is not active");
            self.host.log(Severity::Warning, Some(id), text);
            return;
        }
        if !entry.pins.outputs.contains(pin) {
            let text = format!("cannot trigger output `{pin}`, the node has no such pin");
            self.host.log(Severity::Error, Some(id), text);
            return;
        }

        if finish {
            self.finish_node(id, ActivationState::Completed);
        }
        self.emit(Event::OutputTriggered {
            node: id,
            pin: pin.to_string(),
            finish,
        });

        let targets = self.connected_inputs(id, pin);
        if targets.is_empty() {
            return;
        }
        if self.depth >= self.settings.max_trigger_depth {
            let text = format!(
                "stopped propagating `{pin}`, the maximum trigger depth of {} was reached",
                self.settings.max_trigger_depth,
            );
            self.host.log(Severity::Error, Some(id), text);
            return;
        }
        self.depth += 1;
        for (dst, input) in targets {
            if let Err(err) = self.trigger_input(dst, &input) {
                self.host.log(Severity::Error, Some(id), err);
            }
        }
        self.depth -= 1;
    }

    fn apply_finish(&mut self, id: NodeId) {
        match self.activation_state(id) {
            Some(ActivationState::Active) => self.finish_node(id, ActivationState::Completed),
            Some(_) => {
                let text = "cannot finish a node that is not active";
                self.host.log(Severity::Warning, Some(id), text);
            }
            None => (),
        }
    }

    fn finish_node(&mut self, id: NodeId, state: ActivationState) {
        let Some(entry) = self.graph.node_weight_mut(id) else {
            return;
        };
        entry.activation = state;
        self.emit(Event::NodeFinished { node: id, state });
        self.cleanup(id);
    }

    /// Run cleanup for the add-ons and then the node, once per activation.
    fn cleanup(&mut self, id: NodeId) {
        let Some(entry) = self.graph.node_weight_mut(id) else {
            return;
        };
        if entry.cleaned_up {
            return;
        }
        entry.cleaned_up = true;
        let add_ons = entry.add_ons.post_order();
        for add_on in add_ons {
            self.call_add_on(id, add_on, |a, ctx| a.cleanup(ctx));
        }
        self.call_node(id, |node, ctx| node.cleanup(ctx));
    }

    fn emit(&mut self, event: Event) {
        for (_, observer) in self.observers.iter_mut() {
            observer(&event);
        }
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.graph.node_indices().collect()
    }

    fn initialized_ids(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&id| self.graph[id].instance == InstanceState::Initialized)
            .collect()
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry, NodeNotFound> {
        self.graph.node_weight(id).ok_or(NodeNotFound(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, NodeNotFound> {
        self.graph.node_weight_mut(id).ok_or(NodeNotFound(id))
    }

    fn ensure_initialized(&self, id: NodeId) -> Result<(), GraphError> {
        match self.entry(id)?.instance {
            InstanceState::Initialized => Ok(()),
            InstanceState::Uninitialized => Err(InstanceStateError::NotInitialized(id).into()),
            InstanceState::Deinitialized => Err(InstanceStateError::Deinitialized(id).into()),
        }
    }
}

impl Default for GraphInstance {
    fn default() -> Self {
        Self::new(HostServices::default())
    }
}

impl fmt::Debug for GraphInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GraphInstance")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .field("settings", &self.settings)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl fmt::Debug for NodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NodeEntry")
            .field("node", &self.node.as_ref().map(|n| n.type_name()))
            .field("add_ons", &self.add_ons)
            .field("pins", &self.pins)
            .field("instance", &self.instance)
            .field("activation", &self.activation)
            .finish()
    }
}

/// Check a template tree against its prospective parent, depth-first.
fn check_template(
    parent: Parent,
    template: &AddOnTemplate,
    others: &[&dyn AddOn],
) -> Result<(), AddOnRejected> {
    let add_on = &*template.add_on;
    if addon::check_accept_add_on_child(parent, add_on, others) == AcceptResult::Reject {
        return Err(AddOnRejected {
            add_on: add_on.type_name(),
            parent: parent.type_name(),
        });
    }
    let mut siblings: Vec<&dyn AddOn> = vec![];
    for child in &template.children {
        check_template(Parent::AddOn(add_on), child, &siblings)?;
        siblings.push(&*child.add_on);
    }
    Ok(())
}

/// The pins of a node given its current configuration.
///
/// Add-on context pins come from the instances once the node is initialized
/// and from the templates before.
fn compute_pins(entry: &NodeEntry, host: &HostServices) -> Pins {
    let Some(node) = entry.node.as_deref() else {
        return entry.pins.clone();
    };
    let mut add_on_inputs = vec![];
    let mut add_on_outputs = vec![];
    match entry.instance {
        InstanceState::Initialized => {
            for id in entry.add_ons.pre_order() {
                if let Some(add_on) = entry.add_ons.get(id) {
                    add_on_inputs.extend(add_on.context_inputs());
                    add_on_outputs.extend(add_on.context_outputs());
                }
            }
        }
        _ => addon::template_context_pins(&entry.templates, &mut add_on_inputs, &mut add_on_outputs),
    }
    Pins {
        inputs: PinSet::compute(
            node.input_pins(),
            node.context_inputs(host),
            add_on_inputs,
            DEFAULT_INPUT_PIN,
        ),
        outputs: PinSet::compute(
            node.output_pins(),
            node.context_outputs(host),
            add_on_outputs,
            DEFAULT_OUTPUT_PIN,
        ),
        frozen: entry.pins.frozen,
    }
}
