use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::GraphBuilder;

/// Jump targets that are final dispositions rather than chains to traverse.
///
/// Single shared definition: the builder registers these like any other jump
/// target, the DOT emitter filters nodes and edges against this exact set.
pub const TERMINAL_ACTIONS: [&str; 8] = [
    "ACCEPT",
    "DROP",
    "REJECT",
    "LOG",
    "RETURN",
    "MASQUERADE",
    "AUDIT",
    "CT",
];

pub fn is_terminal_action(target: &str) -> bool {
    TERMINAL_ACTIONS.contains(&target)
}

/// One jump edge: acting chain to `target`, with its match metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub target: String,
    pub protocol: String,
    pub source: String,
    pub destination: String,
    pub comment: String,
    pub condition: String,
}

/// A named ordered list of rules within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub name: String,
    pub table: String,
    pub rules: Vec<Rule>,
}

impl Chain {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            rules: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub chains: Vec<Chain>,
}

/// The parsed chain graph: tables in first-reference order, each with its
/// chains in first-reference order. Handed downstream read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub tables: Vec<Table>,
}

impl Ruleset {
    /// Parse an iptables-save dump. Never fails: unrecognized lines are
    /// skipped and missing clause fields fall back to defaults.
    pub fn parse(input: &str) -> Self {
        let mut builder = GraphBuilder::new();
        builder.feed(input);
        builder.finish()
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn chain(&self, table: &str, name: &str) -> Option<&Chain> {
        self.table(table)
            .and_then(|t| t.chains.iter().find(|c| c.name == name))
    }
}
