use serde::{Deserialize, Serialize};

/// Graph appearance settings, loadable from an optional YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_rankdir")]
    pub rankdir: String,
    #[serde(default = "default_node_shape")]
    pub node_shape: String,
    #[serde(default = "default_cluster_color")]
    pub cluster_color: String,
    #[serde(default = "default_edge_labels")]
    pub edge_labels: bool,
}

fn default_rankdir() -> String {
    "LR".to_string()
}

fn default_node_shape() -> String {
    "box".to_string()
}

fn default_cluster_color() -> String {
    "lightgrey".to_string()
}

fn default_edge_labels() -> bool {
    true
}

impl RenderOptions {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            rankdir: default_rankdir(),
            node_shape: default_node_shape(),
            cluster_color: default_cluster_color(),
            edge_labels: default_edge_labels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let options = RenderOptions::from_yaml("rankdir: TB\n").unwrap();
        assert_eq!(options.rankdir, "TB");
        assert_eq!(options.node_shape, "box");
        assert_eq!(options.cluster_color, "lightgrey");
        assert!(options.edge_labels);
    }
}
