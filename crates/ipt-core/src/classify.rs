use regex::Regex;

/// What one trimmed dump line declares.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    /// `*filter` table marker; becomes the active table for later lines.
    Table(String),
    /// `:INPUT ACCEPT [0:0]` chain declaration.
    Chain(String),
    /// `-A <chain> <clause> -j <target>` append directive.
    Rule {
        chain: String,
        clause: String,
        target: String,
    },
    /// Blank lines, `#` comments, `COMMIT`, anything unrecognized.
    Ignored,
}

/// Classifies raw dump lines into [`LineEvent`]s.
pub struct LineClassifier {
    chain_re: Regex,
    rule_re: Regex,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self {
            chain_re: Regex::new(r"^:([A-Za-z0-9_]+)").unwrap(),
            rule_re: Regex::new(r"^-A (\S+) (.+?) -j (\S+)(.*)").unwrap(),
        }
    }

    pub fn classify(&self, line: &str) -> LineEvent {
        let line = line.trim();

        if let Some(name) = line.strip_prefix('*') {
            return LineEvent::Table(name.to_string());
        }

        if line.starts_with(':') {
            return match self.chain_re.captures(line) {
                Some(caps) => LineEvent::Chain(caps[1].to_string()),
                None => LineEvent::Ignored,
            };
        }

        if line.starts_with("-A") {
            return match self.rule_re.captures(line) {
                Some(caps) => LineEvent::Rule {
                    chain: caps[1].to_string(),
                    // Match options can trail the jump target (a late
                    // `-m comment` block); fold them back into the clause.
                    clause: format!("{}{}", &caps[2], &caps[4]),
                    target: caps[3].to_string(),
                },
                None => LineEvent::Ignored,
            };
        }

        LineEvent::Ignored
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}
