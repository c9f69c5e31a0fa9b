use flow_core::{DataPinValueSupplier, Node};
use serde::{Deserialize, Serialize};

/// Passes execution from `In` straight through to `Out`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Reroute;

impl DataPinValueSupplier for Reroute {}

impl Node for Reroute {}
