//! The core of flow: a node-graph execution engine.
//!
//! Nodes expose typed pins and are driven through a lifecycle by a
//! [`GraphInstance`]. Triggering an output pin executes every connected input
//! pin, while data pins are resolved on demand by polling the suppliers
//! connected to them.

pub use addon::{AcceptResult, AddOn, AddOnId, AddOnTemplate, AddOns, ChildRule, ForEachAddOn};
pub use capability::{
    Capabilities, ContextPinSupplier, CoreExecutable, DataPinValueSupplier, ExternalExecutable,
};
pub use config::Settings;
pub use edge::Edge;
pub use error::{ConfigError, GraphError};
pub use exec::{ComponentCtx, ExecCtx};
pub use graph::{EdgeId, Event, GraphInstance, NodeId, ObserverId};
pub use host::{HostServices, Message, MessageLog, Severity};
pub use node::{ActivationState, Entity, EntityKind, InstanceState, Node};
pub use pin::{DEFAULT_INPUT_PIN, DEFAULT_OUTPUT_PIN, Pin, PinType};
pub use resolve::{DataPinResolveResult, DataPinResult, SupplyCtx};
pub use validate::ValidationLog;
pub use value::{DataPinValue, Value};
pub use world::{ActorId, Component, ComponentClass, ComponentId, SimpleWorld, World};

pub mod addon;
pub mod capability;
pub mod config;
pub mod edge;
pub mod error;
pub mod exec;
pub mod graph;
pub mod host;
pub mod inject;
pub mod node;
pub mod pin;
pub mod resolve;
pub mod validate;
pub mod value;
pub mod world;
