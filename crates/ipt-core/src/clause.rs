use regex::Regex;

pub const DEFAULT_PROTOCOL: &str = "any";
pub const DEFAULT_ADDRESS: &str = "anywhere";

/// The five descriptive fields carried by every rule edge.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFields {
    pub protocol: String,
    pub source: String,
    pub destination: String,
    pub comment: String,
    pub condition: String,
}

/// Pulls rule fields out of clause text, one independent pattern at a time.
///
/// The comment is extracted and stripped from the working text first so the
/// remaining patterns never match inside quoted comment text. Every pattern
/// takes its first match only; absent fields resolve to defaults, never to
/// an error.
pub struct ClauseParser {
    comment_re: Regex,
    protocol_re: Regex,
    source_re: Regex,
    destination_re: Regex,
    module_re: Regex,
}

impl ClauseParser {
    pub fn new() -> Self {
        Self {
            comment_re: Regex::new(r#"--comment\s+"([^"]*)""#).unwrap(),
            protocol_re: Regex::new(r"-p (\S+)").unwrap(),
            source_re: Regex::new(r"-s (\S+)").unwrap(),
            destination_re: Regex::new(r"-d (\S+)").unwrap(),
            module_re: Regex::new(r"-m (\S+)(.*?)\s*(?:-j|$)").unwrap(),
        }
    }

    pub fn extract(&self, clause: &str) -> RuleFields {
        let (comment, working) = self.take_comment(clause);

        let protocol = self
            .first_token(&self.protocol_re, &working)
            .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());
        let source = self
            .first_token(&self.source_re, &working)
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        let destination = self
            .first_token(&self.destination_re, &working)
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        // A match-extension clause becomes the condition; an empty capture
        // counts as absent, and the whole remaining working text stands in.
        let condition = self
            .module_trailer(&working)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| working.trim().to_string());

        RuleFields {
            protocol,
            source,
            destination,
            comment,
            condition,
        }
    }

    fn take_comment(&self, clause: &str) -> (String, String) {
        let comment = self
            .comment_re
            .captures(clause)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        let working = self.comment_re.replace_all(clause, "").trim().to_string();
        (comment, working)
    }

    fn first_token(&self, re: &Regex, text: &str) -> Option<String> {
        re.captures(text).map(|caps| caps[1].to_string())
    }

    fn module_trailer(&self, text: &str) -> Option<String> {
        self.module_re
            .captures(text)
            .map(|caps| caps[2].trim().to_string())
    }
}

impl Default for ClauseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(clause: &str) -> RuleFields {
        ClauseParser::new().extract(clause)
    }

    #[test]
    fn test_defaults_when_fields_absent() {
        let fields = extract("-i br-lan");
        assert_eq!(fields.protocol, "any");
        assert_eq!(fields.source, "anywhere");
        assert_eq!(fields.destination, "anywhere");
        assert_eq!(fields.comment, "");
        assert_eq!(fields.condition, "-i br-lan");
    }

    #[test]
    fn test_full_clause_extraction() {
        let fields = extract("-p tcp -s 10.0.0.1 -d 10.0.0.2 -m comment --comment \"x\"");
        assert_eq!(fields.protocol, "tcp");
        assert_eq!(fields.source, "10.0.0.1");
        assert_eq!(fields.destination, "10.0.0.2");
        assert_eq!(fields.comment, "x");
        // The bare `-m comment` left after stripping captures an empty
        // trailer, so the whole remaining text becomes the condition.
        assert_eq!(fields.condition, "-p tcp -s 10.0.0.1 -d 10.0.0.2 -m comment");
    }

    #[test]
    fn test_module_trailer_becomes_condition() {
        let fields = extract("-p tcp -m state --state NEW,ESTABLISHED");
        assert_eq!(fields.protocol, "tcp");
        assert_eq!(fields.condition, "--state NEW,ESTABLISHED");
    }

    #[test]
    fn test_comment_stripped_before_other_fields() {
        let fields = extract("-s 10.0.0.1 -m comment --comment \"allow -s 9.9.9.9 here\"");
        assert_eq!(fields.comment, "allow -s 9.9.9.9 here");
        assert_eq!(fields.source, "10.0.0.1");
        assert_eq!(fields.condition, "-s 10.0.0.1 -m comment");
    }

    #[test]
    fn test_first_match_wins_on_repeated_flags() {
        let fields = extract("-s 10.0.0.1 -s 172.16.0.1 -p udp -p tcp");
        assert_eq!(fields.source, "10.0.0.1");
        assert_eq!(fields.protocol, "udp");
    }

    #[test]
    fn test_empty_clause() {
        let fields = extract("");
        assert_eq!(fields.protocol, "any");
        assert_eq!(fields.source, "anywhere");
        assert_eq!(fields.destination, "anywhere");
        assert_eq!(fields.comment, "");
        assert_eq!(fields.condition, "");
    }
}
