//! Pull-based resolution of data pin values.
//!
//! Resolving an input pin walks its supplier chain: every upstream output
//! connected to the pin in connection order, followed by the node itself when
//! the pin has a default. Each candidate node is asked in turn, and falls back
//! to its add-ons when it does not claim the pin. The first success wins.

use crate::capability::DataPinValueSupplier;
use crate::config::Settings;
use crate::graph::{Graph, NodeId};
use crate::host::HostServices;
use crate::node::Entity;
use crate::pin::{Pin, PinType};
use crate::value::{DataPinValue, Value};
use crate::world::World;
use petgraph::Direction;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// The outcome of resolving or supplying a data pin.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum DataPinResolveResult {
    Success,
    /// The node has no input pin with the requested name.
    FailedMissingPin,
    /// The pin or supplied value is not of the requested type.
    FailedMismatchedType,
    /// Nothing is connected and the pin has no default.
    FailedUnconnected,
    /// A supplier claimed the pin but failed to produce a value.
    FailedWithError,
    /// The supplier does not claim the pin. Resolution moves on.
    Invalid,
}

/// A result code along with the value on success.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPinResult<T> {
    result: DataPinResolveResult,
    value: Option<T>,
}

/// Read access to the graph for suppliers answering a data pin query.
#[derive(Copy, Clone)]
pub struct SupplyCtx<'a> {
    graph: &'a Graph,
    host: &'a HostServices,
    settings: &'a Settings,
    node: NodeId,
    busy: Option<Busy<'a>>,
    depth: usize,
}

/// An entity detached from the graph while its handler runs, along with the
/// supplier standing in for it.
#[derive(Copy, Clone)]
pub(crate) struct Busy<'a> {
    pub(crate) entity: Entity,
    pub(crate) this: &'a dyn DataPinValueSupplier,
}

/// A candidate in a supplier chain: the node to ask and the pin to ask for.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Supplier {
    pub node: NodeId,
    pub pin: String,
}

impl<T> DataPinResult<T> {
    pub fn success(value: T) -> Self {
        DataPinResult {
            result: DataPinResolveResult::Success,
            value: Some(value),
        }
    }

    /// A result carrying no value.
    ///
    /// Passing `Success` produces a failure with error, as success must carry
    /// a value.
    pub fn failed(result: DataPinResolveResult) -> Self {
        let result = match result {
            DataPinResolveResult::Success => DataPinResolveResult::FailedWithError,
            result => result,
        };
        DataPinResult {
            result,
            value: None,
        }
    }

    /// The supplier does not claim the pin.
    pub fn invalid() -> Self {
        Self::failed(DataPinResolveResult::Invalid)
    }

    pub fn result(&self) -> DataPinResolveResult {
        self.result
    }

    pub fn is_success(&self) -> bool {
        self.result == DataPinResolveResult::Success
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Map the value of a successful result.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DataPinResult<U> {
        DataPinResult {
            result: self.result,
            value: self.value.map(f),
        }
    }
}

impl DataPinResult<Value> {
    /// Convert a successful value into `T`, failing with
    /// `FailedMismatchedType` if the value is of another type.
    pub fn into_data<T: DataPinValue>(self) -> DataPinResult<T> {
        match self.value {
            Some(value) => match T::from_value(value) {
                Some(v) => DataPinResult::success(v),
                None => DataPinResult::failed(DataPinResolveResult::FailedMismatchedType),
            },
            None => DataPinResult::failed(self.result),
        }
    }
}

impl<'a> SupplyCtx<'a> {
    pub(crate) fn new(
        graph: &'a Graph,
        host: &'a HostServices,
        settings: &'a Settings,
        node: NodeId,
        busy: Option<Busy<'a>>,
    ) -> Self {
        SupplyCtx {
            graph,
            host,
            settings,
            node,
            busy,
            depth: 0,
        }
    }

    /// The node being asked to supply a value.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn host(&self) -> &'a HostServices {
        self.host
    }

    pub fn world(&self) -> &'a dyn World {
        self.host.world()
    }

    /// Resolve one of the supplying node's own input pins.
    pub fn resolve<T: DataPinValue>(&self, pin: &str) -> DataPinResult<T> {
        self.resolve_value(pin, T::PIN_TYPE).into_data()
    }

    /// Resolve one of the supplying node's own input pins to an untyped value.
    pub fn resolve_value(&self, pin: &str, pin_type: PinType) -> DataPinResult<Value> {
        self.resolve_pin(self.node, pin, pin_type)
    }

    pub(crate) fn resolve_pin(
        &self,
        node: NodeId,
        pin: &str,
        pin_type: PinType,
    ) -> DataPinResult<Value> {
        if self.depth > self.settings.max_resolve_depth {
            log::error!(
                "resolving `{pin}` on node {} exceeded the maximum depth of {}",
                node.index(),
                self.settings.max_resolve_depth,
            );
            return DataPinResult::failed(DataPinResolveResult::FailedWithError);
        }
        let Some(entry) = self.graph.node_weight(node) else {
            log::error!("cannot resolve `{pin}`: node {} does not exist", node.index());
            return DataPinResult::failed(DataPinResolveResult::FailedWithError);
        };
        let Some(declared) = entry.pins.inputs.get(pin) else {
            return DataPinResult::failed(DataPinResolveResult::FailedMissingPin);
        };
        if !pin_type.is_data() || declared.pin_type != pin_type {
            return DataPinResult::failed(DataPinResolveResult::FailedMismatchedType);
        }

        let chain = supplier_chain(self.graph, node, declared);
        if chain.is_empty() {
            return DataPinResult::failed(DataPinResolveResult::FailedUnconnected);
        }

        let mut last = DataPinResolveResult::Invalid;
        for supplier in &chain {
            let result = self.poll(supplier, pin_type);
            match result.result() {
                DataPinResolveResult::Success => return result,
                DataPinResolveResult::Invalid => (),
                failure => last = failure,
            }
        }
        DataPinResult::failed(last)
    }

    /// Ask a single candidate node, then its add-ons, for the value.
    fn poll(&self, supplier: &Supplier, pin_type: PinType) -> DataPinResult<Value> {
        let Some(entry) = self.graph.node_weight(supplier.node) else {
            return DataPinResult::invalid();
        };
        let ctx = SupplyCtx {
            node: supplier.node,
            depth: self.depth + 1,
            ..*self
        };

        let node: Option<&'a dyn DataPinValueSupplier> = match entry.node.as_deref() {
            Some(node) => Some(node as &dyn DataPinValueSupplier),
            None => self.stand_in(Entity::Node(supplier.node)),
        };
        let add_ons = entry.add_ons.pre_order().into_iter().filter_map(
            |id| -> Option<&'a dyn DataPinValueSupplier> {
                match entry.add_ons.get(id) {
                    Some(add_on) => Some(add_on as &dyn DataPinValueSupplier),
                    None => self.stand_in(Entity::AddOn(supplier.node, id)),
                }
            },
        );

        for fragment in node.into_iter().chain(add_ons) {
            if !fragment.can_supply_data_pin_values() {
                continue;
            }
            let result = fragment.try_supply_data_pin(&ctx, &supplier.pin, pin_type);
            match result.result() {
                DataPinResolveResult::Invalid => continue,
                DataPinResolveResult::Success => {
                    let matches = result.value().is_some_and(|v| v.pin_type() == pin_type);
                    if !matches {
                        log::warn!(
                            "node {} supplied a value of the wrong type for `{}`",
                            supplier.node.index(),
                            supplier.pin,
                        );
                        return DataPinResult::failed(DataPinResolveResult::FailedMismatchedType);
                    }
                    return result;
                }
                _ => return result,
            }
        }
        DataPinResult::invalid()
    }

    fn stand_in(&self, entity: Entity) -> Option<&'a dyn DataPinValueSupplier> {
        self.busy
            .filter(|busy| busy.entity == entity)
            .map(|busy| busy.this)
    }
}

/// The ordered candidates able to supply the input `pin` of `node`.
pub fn supplier_chain(graph: &Graph, node: NodeId, pin: &Pin) -> Vec<Supplier> {
    let mut edges: Vec<_> = graph
        .edges_directed(node, Direction::Incoming)
        .filter(|edge| edge.weight().input == pin.name)
        .map(|edge| (edge.id(), edge.source(), edge.weight().output.clone()))
        .collect();
    edges.sort_by_key(|(id, _, _)| *id);
    let mut chain: Vec<_> = edges
        .into_iter()
        .map(|(_, node, pin)| Supplier { node, pin })
        .collect();
    if pin.has_default {
        chain.push(Supplier {
            node,
            pin: pin.name.clone(),
        });
    }
    chain
}
