use serde::{Deserialize, Serialize};

/// Describes a connection between an output pin and an input pin.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Edge {
    /// The name of the output pin on the source node.
    pub output: String,
    /// The name of the input pin on the destination node.
    pub input: String,
}

impl Edge {
    pub fn new(output: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            input: input.into(),
        }
    }
}

impl<A, B> From<(A, B)> for Edge
where
    A: Into<String>,
    B: Into<String>,
{
    fn from((output, input): (A, B)) -> Self {
        Self::new(output, input)
    }
}
