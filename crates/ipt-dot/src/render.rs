use ipt_core::{Ruleset, is_terminal_action};

use crate::options::RenderOptions;

/// Emits Graphviz DOT text for a parsed ruleset.
///
/// One cluster per table, one box node per chain, one edge per rule. Terminal
/// actions (ACCEPT, DROP, ...) are dispositions, not chains: nodes named
/// after them and edges jumping to them are left out of the graph.
pub struct DotRenderer {
    options: RenderOptions,
}

impl DotRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn render(&self, ruleset: &Ruleset) -> String {
        let mut dot = String::new();
        dot.push_str("digraph iptables {\n");
        dot.push_str(&format!("    rankdir={};\n", self.options.rankdir));

        // Node declarations go inside their table's cluster; edges are
        // collected and emitted at graph level afterwards.
        let mut edges: Vec<String> = Vec::new();

        for table in &ruleset.tables {
            dot.push_str(&format!(
                "    subgraph \"cluster_{}\" {{\n",
                escape(&table.name)
            ));
            dot.push_str(&format!("        label=\"{}\";\n", escape(&table.name)));
            dot.push_str("        style=filled;\n");
            dot.push_str(&format!("        color={};\n", self.options.cluster_color));

            for chain in &table.chains {
                if is_terminal_action(&chain.name) {
                    continue;
                }
                let chain_id = node_id(&table.name, &chain.name);
                dot.push_str(&format!(
                    "        \"{}\" [shape={}, label=\"{}\"];\n",
                    escape(&chain_id),
                    self.options.node_shape,
                    escape(&chain.name)
                ));

                for rule in &chain.rules {
                    if is_terminal_action(&rule.target) {
                        continue;
                    }
                    let target_id = node_id(&table.name, &rule.target);
                    if self.options.edge_labels {
                        edges.push(format!(
                            "    \"{}\" -> \"{}\" [label=\"{}\\n{}\"];\n",
                            escape(&chain_id),
                            escape(&target_id),
                            escape(&rule.condition),
                            escape(&rule.comment)
                        ));
                    } else {
                        edges.push(format!(
                            "    \"{}\" -> \"{}\";\n",
                            escape(&chain_id),
                            escape(&target_id)
                        ));
                    }
                }
            }

            dot.push_str("    }\n");
        }

        for edge in &edges {
            dot.push_str(edge);
        }

        dot.push_str("}\n");
        dot
    }
}

fn node_id(table: &str, chain: &str) -> String {
    format!("{}_{}", table, chain)
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
