use crate::clause::{DEFAULT_ADDRESS, DEFAULT_PROTOCOL};
use crate::model::{Chain, Rule, Ruleset};

impl Ruleset {
    /// Serialize back to a simplified iptables-save shaped text.
    ///
    /// For registries parsed from dumps with explicit chain declarations and
    /// resolved targets, parsing this output yields an equal registry. The
    /// diff command feeds on this form.
    pub fn to_save_text(&self) -> String {
        let mut out = String::new();

        for table in &self.tables {
            out.push_str(&format!("*{}\n", table.name));
            for chain in &table.chains {
                out.push_str(&format!(":{} - [0:0]\n", chain.name));
            }
            for chain in &table.chains {
                for rule in &chain.rules {
                    out.push_str(&rule_line(chain, rule));
                    out.push('\n');
                }
            }
            out.push_str("COMMIT\n");
        }

        out
    }
}

fn rule_line(chain: &Chain, rule: &Rule) -> String {
    let mut parts: Vec<String> = Vec::new();

    // The condition may already carry these flags verbatim (it falls back to
    // the whole clause text when no match extension was recognized); emitting
    // them twice would change the reparse.
    if rule.protocol != DEFAULT_PROTOCOL && !rule.condition.contains("-p ") {
        parts.push(format!("-p {}", rule.protocol));
    }
    if rule.source != DEFAULT_ADDRESS && !rule.condition.contains("-s ") {
        parts.push(format!("-s {}", rule.source));
    }
    if rule.destination != DEFAULT_ADDRESS && !rule.condition.contains("-d ") {
        parts.push(format!("-d {}", rule.destination));
    }

    // Re-emitting a comment re-appends its `-m comment` block, so a trailing
    // one inside the condition text has to come off first.
    let condition = if rule.comment.is_empty() {
        rule.condition.as_str()
    } else {
        rule.condition
            .strip_suffix("-m comment")
            .map(str::trim_end)
            .unwrap_or(rule.condition.as_str())
    };
    if !condition.is_empty() {
        parts.push(condition.to_string());
    }
    if !rule.comment.is_empty() {
        parts.push(format!("-m comment --comment \"{}\"", rule.comment));
    }

    if parts.is_empty() {
        format!("-A {} -j {}", chain.name, rule.target)
    } else {
        format!("-A {} {} -j {}", chain.name, parts.join(" "), rule.target)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::Ruleset;

    const DUMP: &str = r#"*filter
:INPUT DROP [0:0]
:FORWARD DROP [0:0]
:zone_lan_forward - [0:0]
-A INPUT -i lo -j ACCEPT
-A FORWARD -i br-lan -m comment --comment "lan forwarding" -j zone_lan_forward
-A zone_lan_forward -p tcp -s 192.168.1.0/24 -j ACCEPT
*nat
:POSTROUTING ACCEPT [0:0]
-A POSTROUTING -o eth0 -j MASQUERADE
COMMIT
"#;

    #[test]
    fn save_text_reparses_to_equal_ruleset() {
        let first = Ruleset::parse(DUMP);
        let reparsed = Ruleset::parse(&first.to_save_text());
        assert_eq!(first, reparsed);
    }

    #[test]
    fn save_text_is_a_fixed_point() {
        let first = Ruleset::parse(DUMP);
        let text = first.to_save_text();
        assert_eq!(Ruleset::parse(&text).to_save_text(), text);
    }

    #[test]
    fn save_text_lists_chains_before_rules() {
        let ruleset =
            Ruleset::parse("*filter\n:FORWARD ACCEPT [0:0]\n-A FORWARD -i eth0 -j zone_wan\n");
        let text = ruleset.to_save_text();
        assert_eq!(
            text,
            "*filter\n:FORWARD - [0:0]\n:zone_wan - [0:0]\n-A FORWARD -i eth0 -j zone_wan\nCOMMIT\n"
        );
    }
}
