use super::expr::Expr;
use super::variable::Variable;
use crate::graph_catalog::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub variable: Option<Variable>,
    pub labels: Vec<String>,
    pub properties: Vec<(String, Expr)>,
}

impl NodePattern {
    pub fn new(variable: &Variable, labels: &[String]) -> Self {
        Self {
            variable: Some(variable.clone()),
            labels: labels.to_vec(),
            properties: Vec::new(),
        }
    }

    /// `(n)` without labels, for a node that is already bound.
    pub fn bound(variable: &Variable) -> Self {
        Self::new(variable, &[])
    }

    /// `(:Label)`
    pub fn anonymous(labels: &[String]) -> Self {
        Self {
            variable: None,
            labels: labels.to_vec(),
            properties: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Vec<(String, Expr)>) -> Self {
        self.properties = properties;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub variable: Option<Variable>,
    pub edge_type: String,
    /// Direction relative to the node on the left of the pattern
    pub direction: Direction,
}

impl RelationshipPattern {
    pub fn new(variable: Option<&Variable>, edge_type: &str, direction: Direction) -> Self {
        Self {
            variable: variable.cloned(),
            edge_type: edge_type.to_string(),
            direction,
        }
    }
}

/// A linear path `(a)-[r]->(b)-[s]->(c)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub start: NodePattern,
    pub hops: Vec<(RelationshipPattern, NodePattern)>,
}

impl Pattern {
    pub fn node(start: NodePattern) -> Self {
        Self {
            start,
            hops: Vec::new(),
        }
    }

    pub fn hop(start: NodePattern, relationship: RelationshipPattern, end: NodePattern) -> Self {
        Self {
            start,
            hops: vec![(relationship, end)],
        }
    }
}
