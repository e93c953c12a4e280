//! Prefill mapping CLI.
//!
//! Provides the `prefill` binary for inspecting a blueprint document that
//! has already been fetched to disk: its nodes, adjacency, ancestors, and
//! which upstream fields can prefill a given node's fields.
//!
//! The blueprint path comes from `--blueprint`, else the `PREFILL_BLUEPRINT`
//! environment variable, else `blueprint.json`. Log verbosity follows
//! `RUST_LOG`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use prefill_core::{Blueprint, NodeId, PrefillError, Session};

/// Blueprint prefill mapping tools.
#[derive(Parser)]
#[command(name = "prefill", about = "Blueprint prefill mapping tools")]
struct Cli {
    /// Path to the blueprint JSON document.
    #[arg(short, long, env = "PREFILL_BLUEPRINT", default_value = "blueprint.json")]
    blueprint: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List nodes in blueprint order.
    Nodes,

    /// Print forward and reverse adjacency.
    Graph,

    /// List the transitive ancestors of a node, nearest first.
    Ancestors {
        /// Node ID.
        node: String,
    },

    /// Show a node's form fields and their current mappings.
    Fields {
        /// Node ID.
        node: String,
    },

    /// List ancestors able to prefill a field of a node.
    Candidates {
        /// Node ID.
        node: String,
        /// Field key on the node's form.
        field: String,
    },

    /// Map a field to the same field on an ancestor and show the result.
    Map {
        /// Node ID.
        node: String,
        /// Field key on the node's form.
        field: String,
        /// Ancestor node ID supplying the value.
        ancestor: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    process::exit(run(&cli));
}

/// Execute one subcommand.
///
/// Returns exit code: 0 = success, 1 = query error, 2 = malformed graph,
/// 3 = I/O or parse error.
fn run(cli: &Cli) -> i32 {
    let mut session = match load_session(&cli.blueprint) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let output = match &cli.command {
        Commands::Nodes => {
            let nodes: Vec<_> = session
                .nodes()
                .map(|n| {
                    json!({
                        "id": n.id,
                        "name": n.name,
                        "form": n.component_id,
                        "has_form": session.forms().form_for(n).is_some(),
                    })
                })
                .collect();
            json!(nodes)
        }
        Commands::Graph => json!({
            "forward": session.graph().forward(),
            "reverse": session.graph().reverse(),
        }),
        Commands::Ancestors { node } => {
            let id = match known_node(&session, node) {
                Ok(id) => id,
                Err(code) => return code,
            };
            json!(session.ancestors_of(&id))
        }
        Commands::Fields { node } => {
            let id = match known_node(&session, node) {
                Ok(id) => id,
                Err(code) => return code,
            };
            json!(session.field_rows(&id))
        }
        Commands::Candidates { node, field } => {
            let id = match known_node(&session, node) {
                Ok(id) => id,
                Err(code) => return code,
            };
            json!(session.candidates(&id, field))
        }
        Commands::Map {
            node,
            field,
            ancestor,
        } => {
            let id = match known_node(&session, node) {
                Ok(id) => id,
                Err(code) => return code,
            };
            if !session.map_from_candidate(&id, field, &NodeId::from(ancestor.as_str())) {
                eprintln!(
                    "Error: '{}' is not an ancestor of '{}' whose form has field '{}'",
                    ancestor, node, field
                );
                return 1;
            }
            json!(session.field_rows(&id))
        }
    };

    match serde_json::to_string_pretty(&output) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize output: {}", e);
            3
        }
    }
}

/// Read and load the blueprint, mapping failures to exit codes.
fn load_session(path: &Path) -> Result<Session, i32> {
    tracing::debug!(path = %path.display(), "reading blueprint");
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: failed to open blueprint '{}': {}", path.display(), e);
            return Err(3);
        }
    };

    let blueprint = match Blueprint::from_reader(BufReader::new(file)) {
        Ok(bp) => bp,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(3);
        }
    };

    match Session::load(blueprint) {
        Ok(session) => Ok(session),
        Err(e @ PrefillError::MalformedGraph { .. }) => {
            eprintln!("Error: {}", e);
            Err(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(3)
        }
    }
}

fn known_node(session: &Session, node: &str) -> Result<NodeId, i32> {
    let id = NodeId::from(node);
    if session.node(&id).is_none() {
        eprintln!("Error: unknown node '{}'", node);
        return Err(1);
    }
    Ok(id)
}
