//! Design-time validation of a graph.

use crate::graph::NodeId;
use crate::host::Severity;
use serde::{Deserialize, Serialize};

/// A single problem reported by validation.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct ValidationIssue {
    pub node: Option<NodeId>,
    pub severity: Severity,
    pub message: String,
}

/// The issues collected while validating a graph.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ValidationLog {
    issues: Vec<ValidationIssue>,
}

impl ValidationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Option<NodeId>, severity: Severity, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            node,
            severity,
            message: message.into(),
        });
    }

    pub fn error(&mut self, node: NodeId, message: impl Into<String>) {
        self.push(Some(node), Severity::Error, message);
    }

    pub fn warning(&mut self, node: NodeId, message: impl Into<String>) {
        self.push(Some(node), Severity::Warning, message);
    }

    pub fn note(&mut self, node: NodeId, message: impl Into<String>) {
        self.push(Some(node), Severity::Note, message);
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Issues reported against `node`.
    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.node == Some(node))
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|issue| issue.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}
