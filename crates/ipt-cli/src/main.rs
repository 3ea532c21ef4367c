use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ipt_core::Ruleset;
use ipt_dot::{DotRenderer, RenderOptions};
use similar::{ChangeTag, TextDiff};

#[derive(Parser)]
#[command(name = "iptgraph")]
#[command(version, about = "iptables-save chain graph inspector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the chain graph as Graphviz DOT
    Dot {
        /// iptables-save dump to parse
        file: String,
        /// Write the DOT text here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
        /// Render options YAML
        #[arg(long)]
        config: Option<String>,
    },
    /// Print the parsed table/chain/rule structure
    Show {
        /// iptables-save dump to parse
        file: String,
    },
    /// Dump the parsed structure as JSON
    Json {
        /// iptables-save dump to parse
        file: String,
    },
    /// Compare two dumps in canonical form
    Diff {
        /// Baseline dump
        old: String,
        /// Dump to compare against the baseline
        new: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dot {
            file,
            output,
            config,
        } => handle_dot(&file, output.as_deref(), config.as_deref())?,
        Commands::Show { file } => handle_show(&file)?,
        Commands::Json { file } => handle_json(&file)?,
        Commands::Diff { old, new } => handle_diff(&old, &new)?,
    }

    Ok(())
}

fn load_ruleset(file: &str) -> anyhow::Result<Ruleset> {
    Ruleset::from_file(Path::new(file))
}

fn handle_dot(file: &str, output: Option<&str>, config: Option<&str>) -> anyhow::Result<()> {
    let ruleset = load_ruleset(file)?;

    let options = match config {
        Some(path) => RenderOptions::from_file(Path::new(path))
            .with_context(|| format!("Failed to load render options from {}", path))?,
        None => RenderOptions::default(),
    };

    let dot = DotRenderer::new(options).render(&ruleset);

    match output {
        Some(path) => {
            std::fs::write(path, &dot).with_context(|| format!("Failed to write {}", path))?;
            println!("Wrote DOT graph to {}", path);
        }
        None => print!("{}", dot),
    }

    Ok(())
}

fn handle_show(file: &str) -> anyhow::Result<()> {
    let ruleset = load_ruleset(file)?;

    if ruleset.tables.is_empty() {
        println!("No tables found in {}", file);
        return Ok(());
    }

    for table in &ruleset.tables {
        println!("Table: {} ({} chains)", table.name, table.chains.len());
        for chain in &table.chains {
            println!("  Chain: {}", chain.name);
            for rule in &chain.rules {
                println!(
                    "    -> {} [proto={} src={} dst={}]",
                    rule.target, rule.protocol, rule.source, rule.destination
                );
                if !rule.condition.is_empty() {
                    println!("       condition: {}", rule.condition);
                }
                if !rule.comment.is_empty() {
                    println!("       comment: {}", rule.comment);
                }
            }
        }
        println!();
    }

    Ok(())
}

fn handle_json(file: &str) -> anyhow::Result<()> {
    let ruleset = load_ruleset(file)?;
    println!("{}", serde_json::to_string_pretty(&ruleset)?);
    Ok(())
}

fn handle_diff(old: &str, new: &str) -> anyhow::Result<()> {
    let old_text = load_ruleset(old)?.to_save_text();
    let new_text = load_ruleset(new)?.to_save_text();

    if old_text == new_text {
        println!("Rulesets match");
        return Ok(());
    }

    print!("{}", render_diff(&old_text, &new_text));
    Ok(())
}

fn render_diff(current: &str, desired: &str) -> String {
    let diff = TextDiff::from_lines(current, desired);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        output.push(sign);
        output.push_str(change.value());
    }

    output
}
