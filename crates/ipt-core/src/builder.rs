use std::collections::HashMap;

use tracing::debug;

use crate::classify::{LineClassifier, LineEvent};
use crate::clause::ClauseParser;
use crate::model::{Chain, Rule, Ruleset, Table};

/// Builds the table/chain registry from a single top-to-bottom pass.
///
/// Chains come into existence through an explicit `:name` declaration or the
/// first time a rule jumps to them; both paths go through `ensure_chain` and
/// yield exactly one entity per (table, name) key. Rules attach only to
/// chains that already exist; anything else is dropped, never an error.
pub struct GraphBuilder {
    classifier: LineClassifier,
    clauses: ClauseParser,
    current_table: Option<String>,
    tables: Vec<Table>,
    // (table, chain) -> position in `tables`, for O(1) existence checks
    index: HashMap<(String, String), (usize, usize)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            classifier: LineClassifier::new(),
            clauses: ClauseParser::new(),
            current_table: None,
            tables: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Scan a full dump, line by line.
    pub fn feed(&mut self, input: &str) {
        for line in input.lines() {
            self.feed_line(line);
        }
    }

    pub fn feed_line(&mut self, line: &str) {
        let event = self.classifier.classify(line);
        self.apply(event);
    }

    pub fn apply(&mut self, event: LineEvent) {
        match event {
            LineEvent::Table(name) => {
                self.current_table = Some(name);
            }
            LineEvent::Chain(name) => {
                let Some(table) = self.current_table.clone() else {
                    debug!("dropping chain {} declared before any table", name);
                    return;
                };
                self.ensure_chain(&table, &name);
            }
            LineEvent::Rule {
                chain,
                clause,
                target,
            } => {
                let Some(table) = self.current_table.clone() else {
                    debug!("dropping rule in {} before any table", chain);
                    return;
                };
                // The acting chain must already be known; well-formed dumps
                // declare built-in chains before any rules reference them.
                // A dropped rule registers nothing, its target included.
                let Some(&(ti, ci)) = self.index.get(&(table.clone(), chain.clone())) else {
                    debug!("dropping rule for undeclared chain {} in table {}", chain, table);
                    return;
                };

                let fields = self.clauses.extract(&clause);
                self.tables[ti].chains[ci].rules.push(Rule {
                    target: target.clone(),
                    protocol: fields.protocol,
                    source: fields.source,
                    destination: fields.destination,
                    comment: fields.comment,
                    condition: fields.condition,
                });

                // Jump targets enter the registry even without a `:` line.
                // Terminal actions land here too; the emitter filters them.
                self.ensure_chain(&table, &target);
            }
            LineEvent::Ignored => {}
        }
    }

    fn ensure_chain(&mut self, table: &str, name: &str) {
        let key = (table.to_string(), name.to_string());
        if self.index.contains_key(&key) {
            return;
        }
        let ti = self.ensure_table(table);
        let ci = self.tables[ti].chains.len();
        self.tables[ti].chains.push(Chain::new(name, table));
        self.index.insert(key, (ti, ci));
    }

    fn ensure_table(&mut self, name: &str) -> usize {
        if let Some(pos) = self.tables.iter().position(|t| t.name == name) {
            return pos;
        }
        self.tables.push(Table {
            name: name.to_string(),
            chains: Vec::new(),
        });
        self.tables.len() - 1
    }

    pub fn finish(self) -> Ruleset {
        Ruleset {
            tables: self.tables,
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# iptables-save output
*raw
:PREROUTING ACCEPT [0:0]
:zone_lan_helper - [0:0]
-A PREROUTING -i br-lan -m comment --comment "lan CT helper assignment" -j zone_lan_helper
-A zone_VPN_helper -p tcp --dport 21 -m comment --comment "FTP passive connection tracking" -j CT
"#;

    #[test]
    fn declared_chains_keep_declaration_order() {
        let ruleset = Ruleset::parse("*filter\n:INPUT ACCEPT [0:0]\n:FORWARD ACCEPT [0:0]\n:OUTPUT ACCEPT [0:0]\n");
        let table = ruleset.table("filter").expect("filter table");
        let names: Vec<&str> = table.chains.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["INPUT", "FORWARD", "OUTPUT"]);
    }

    #[test]
    fn duplicate_declaration_creates_one_chain() {
        let ruleset = Ruleset::parse("*filter\n:INPUT ACCEPT [0:0]\n:INPUT ACCEPT [0:0]\n");
        let table = ruleset.table("filter").expect("filter table");
        assert_eq!(table.chains.len(), 1);
    }

    #[test]
    fn rule_for_undeclared_chain_registers_nothing() {
        let ruleset = Ruleset::parse("*filter\n-A GHOST -i eth0 -j ACCEPT\n");
        // The acting chain was never declared: no rule, no table entry for
        // the target either.
        assert!(ruleset.table("filter").is_none());
    }

    #[test]
    fn jump_target_is_created_implicitly() {
        let ruleset =
            Ruleset::parse("*filter\n:FORWARD ACCEPT [0:0]\n-A FORWARD -i eth0 -j zone_wan\n");
        let zone = ruleset.chain("filter", "zone_wan").expect("implicit chain");
        assert!(zone.rules.is_empty());
        assert_eq!(zone.table, "filter");
    }

    #[test]
    fn chains_are_scoped_per_table() {
        let input = "*filter\n:INPUT ACCEPT [0:0]\n*nat\n:INPUT ACCEPT [0:0]\n";
        let ruleset = Ruleset::parse(input);
        assert_eq!(ruleset.tables.len(), 2);
        assert_eq!(ruleset.chain("filter", "INPUT").unwrap().table, "filter");
        assert_eq!(ruleset.chain("nat", "INPUT").unwrap().table, "nat");
    }

    #[test]
    fn lines_before_any_table_are_dropped() {
        let ruleset = Ruleset::parse(":INPUT ACCEPT [0:0]\n-A INPUT -i lo -j ACCEPT\n");
        assert!(ruleset.tables.is_empty());
    }

    #[test]
    fn sample_dump_builds_expected_graph() {
        let ruleset = Ruleset::parse(SAMPLE);
        let raw = ruleset.table("raw").expect("raw table");

        // zone_VPN_helper was never declared, so its rule is dropped whole
        // and CT never enters the registry.
        let names: Vec<&str> = raw.chains.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["PREROUTING", "zone_lan_helper"]);

        let prerouting = ruleset.chain("raw", "PREROUTING").unwrap();
        assert_eq!(prerouting.rules.len(), 1);

        let rule = &prerouting.rules[0];
        assert_eq!(rule.target, "zone_lan_helper");
        assert_eq!(rule.protocol, "any");
        assert_eq!(rule.source, "anywhere");
        assert_eq!(rule.destination, "anywhere");
        assert_eq!(rule.comment, "lan CT helper assignment");
        assert_eq!(rule.condition, "-i br-lan -m comment");

        assert!(ruleset.chain("raw", "zone_lan_helper").unwrap().rules.is_empty());
    }

    #[test]
    fn terminal_target_still_enters_registry() {
        let ruleset =
            Ruleset::parse("*filter\n:INPUT ACCEPT [0:0]\n-A INPUT -p tcp --dport 22 -j ACCEPT\n");
        // The builder does not filter terminal actions; that is the
        // emitter's job.
        assert!(ruleset.chain("filter", "ACCEPT").is_some());
    }
}
