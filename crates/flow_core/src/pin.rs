//! Pin declarations and the effective pin set of a node.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The name of the exec input exposed by nodes that declare no inputs.
pub const DEFAULT_INPUT_PIN: &str = "In";
/// The name of the exec output exposed by nodes that declare no outputs.
pub const DEFAULT_OUTPUT_PIN: &str = "Out";

/// The data type carried by a pin.
///
/// `Exec` pins carry no value and only propagate execution. Every other
/// variant is a data pin resolvable through the data-pin resolver.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub enum PinType {
    Exec,
    Bool,
    Int,
    Float,
    Name,
    String,
    Text,
    Enum,
    Vector,
    Rotator,
    Transform,
    GameplayTag,
    GameplayTagContainer,
    InstancedStruct,
    Object,
    Class,
}

/// A named, typed connection point on a node.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Pin {
    pub name: String,
    pub pin_type: PinType,
    /// Contributed by the current configuration rather than declared statically.
    #[serde(default)]
    pub context: bool,
    /// The owner of the pin supplies a value when nothing is connected.
    #[serde(default)]
    pub has_default: bool,
}

/// The pins exposed in one direction (inputs or outputs) of a node.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PinSet {
    /// Declared pins plus the node's own context pins.
    ///
    /// Only pins in this set reach the node's own `execute_input`.
    pub own: Vec<Pin>,
    /// Context pins of the node and all of its add-ons.
    pub context: Vec<Pin>,
    /// Everything the node exposes, declared and contextual.
    pub effective: Vec<Pin>,
}

/// Both pin sets of a node.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Pins {
    pub inputs: PinSet,
    pub outputs: PinSet,
    /// Set once the node instance has been initialized.
    pub frozen: bool,
}

impl PinType {
    /// All pin types that carry a value.
    pub const DATA: [PinType; 15] = [
        PinType::Bool,
        PinType::Int,
        PinType::Float,
        PinType::Name,
        PinType::String,
        PinType::Text,
        PinType::Enum,
        PinType::Vector,
        PinType::Rotator,
        PinType::Transform,
        PinType::GameplayTag,
        PinType::GameplayTagContainer,
        PinType::InstancedStruct,
        PinType::Object,
        PinType::Class,
    ];

    /// Whether or not the pin carries a value.
    pub fn is_data(self) -> bool {
        self != PinType::Exec
    }
}

impl Pin {
    /// A declared pin of the given type.
    pub fn new(name: impl Into<String>, pin_type: PinType) -> Self {
        Pin {
            name: name.into(),
            pin_type,
            context: false,
            has_default: false,
        }
    }

    /// A declared exec pin.
    pub fn exec(name: impl Into<String>) -> Self {
        Self::new(name, PinType::Exec)
    }

    /// Mark the pin as having a default value supplied by its owner.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Mark the pin as context-supplied.
    pub fn into_context(mut self) -> Self {
        self.context = true;
        self
    }
}

impl PinSet {
    /// Combine the declared pins of a node with the context pins contributed by
    /// the node and its add-ons.
    ///
    /// Duplicate names are dropped, the first occurrence wins. When neither the
    /// node nor its add-ons expose anything, a single exec pin named
    /// `default_name` is contributed as context.
    pub fn compute(
        declared: Vec<Pin>,
        node_context: Vec<Pin>,
        add_on_context: Vec<Pin>,
        default_name: &str,
    ) -> Self {
        let node_context: Vec<Pin> = node_context.into_iter().map(Pin::into_context).collect();
        let mut context = vec![];
        extend_unique(&mut context, node_context.iter().cloned());
        extend_unique(&mut context, add_on_context.into_iter().map(Pin::into_context));

        let mut own = declared.clone();
        extend_unique(&mut own, node_context);

        if declared.is_empty() && context.is_empty() {
            let pin = Pin::exec(default_name).into_context();
            context.push(pin.clone());
            own.push(pin);
        }

        let mut effective = declared;
        extend_unique(&mut effective, context.iter().cloned());
        PinSet {
            own,
            context,
            effective,
        }
    }

    /// Find a pin in the effective set.
    pub fn get(&self, name: &str) -> Option<&Pin> {
        find(&self.effective, name)
    }

    /// Whether the node itself handles the pin.
    pub fn is_own(&self, name: &str) -> bool {
        find(&self.own, name).is_some()
    }

    /// Whether the pin is exposed at all.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Append the pins of `extra` whose names are not already present in `pins`.
pub fn extend_unique(pins: &mut Vec<Pin>, extra: impl IntoIterator<Item = Pin>) {
    for pin in extra {
        if find(pins, &pin.name).is_none() {
            pins.push(pin);
        }
    }
}

/// Find a pin by name.
pub fn find<'a>(pins: &'a [Pin], name: &str) -> Option<&'a Pin> {
    pins.iter().find(|pin| pin.name == name)
}

/// Whether `pins` contains `name`.
pub fn contains(pins: &[Pin], name: &str) -> bool {
    find(pins, name).is_some()
}
