//! Error types returned by the graph instance API.

use crate::graph::NodeId;
use thiserror::Error;

/// A node id does not refer to a node in the graph instance.
#[derive(Debug, Error)]
#[error("no node exists at index {}", .0.index())]
pub struct NodeNotFound(pub NodeId);

/// A connection references a pin the node does not expose.
#[derive(Debug, Error)]
#[error("node {} has no {direction} pin named `{pin}`", node.index())]
pub struct PinNotFound {
    pub node: NodeId,
    pub direction: Direction,
    pub pin: String,
}

/// An add-on template was rejected by its prospective parent or by itself.
#[derive(Debug, Error)]
#[error("add-on `{add_on}` was rejected under `{parent}`")]
pub struct AddOnRejected {
    /// The type name of the rejected add-on.
    pub add_on: &'static str,
    /// The type name of the node or add-on it was to be attached to.
    pub parent: &'static str,
}

/// The node is not in the instance state the operation requires.
#[derive(Debug, Error)]
pub enum InstanceStateError {
    #[error("node {} has not been initialized", .0.index())]
    NotInitialized(NodeId),
    #[error("node {} has already been initialized", .0.index())]
    AlreadyInitialized(NodeId),
    #[error("node {} has been deinitialized", .0.index())]
    Deinitialized(NodeId),
}

/// Errors returned by [`GraphInstance`][crate::GraphInstance] operations.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    NodeNotFound(#[from] NodeNotFound),
    #[error(transparent)]
    PinNotFound(#[from] PinNotFound),
    #[error(transparent)]
    AddOnRejected(#[from] AddOnRejected),
    #[error(transparent)]
    InstanceState(#[from] InstanceStateError),
}

/// Failure to load [`Settings`][crate::Settings].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Ron(#[from] ron::error::SpannedError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The direction of a pin, used in error messages.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}
