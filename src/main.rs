//! Command-line front-end for the diagram/RDF bridge (`6. EXTERNAL
//! INTERFACES`, subcommand surface). This binary is a thin collaborator
//! around the core library: it reads files off disk, wires them into
//! `drawio_rdf_bridge::pipeline`, and writes the result back out, exiting
//! non-zero on any error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use drawio_rdf_bridge::config::{profiles, BridgeConfig};
use drawio_rdf_bridge::pipeline::{self, ReferenceFile};
use drawio_rdf_bridge::{diagram, BridgeResult};

#[derive(Parser)]
#[command(name = "drawio-rdf-bridge", about = "Bridge a diagram and an RDF ontology, in either direction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a diagram into Turtle.
    #[command(name = "drawio_ttl")]
    DrawioTtl {
        input: PathBuf,
        output: PathBuf,
        /// Reference ontologies folder.
        #[arg(short = 'r', long = "refs")]
        refs: Option<PathBuf>,
        /// Defaults folder (the rank property family).
        #[arg(short = 'd', long = "defaults")]
        defaults: Option<PathBuf>,
        /// Prefixes JSON file.
        #[arg(short = 'p', long = "prefixes")]
        prefixes: Option<PathBuf>,
    },
    /// Translate Turtle into a laid-out diagram.
    #[command(name = "ttl_drawio")]
    TtlDrawio {
        input: PathBuf,
        output: PathBuf,
        /// Reference ontologies folder.
        #[arg(short = 'r', long = "refs")]
        refs: Option<PathBuf>,
        /// Defaults folder (the rank property family).
        #[arg(short = 'd', long = "defaults")]
        defaults: Option<PathBuf>,
        /// Prefixes JSON file.
        #[arg(short = 'p', long = "prefixes")]
        prefixes: Option<PathBuf>,
        /// Lay trees out left-to-right instead of top-to-bottom.
        #[arg(short = 'z', long = "horizontal")]
        horizontal: bool,
        /// Disable unique-literal rewriting.
        #[arg(long = "nul")]
        no_unique_literals: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> BridgeResult<()> {
    match command {
        Command::DrawioTtl { input, output, refs, defaults, prefixes } => {
            let config = BridgeConfig::default();
            let user_prefixes = load_prefixes(prefixes.as_deref())?;
            let reference_files = load_reference_folder(refs.as_deref())?;
            let defaults_files = load_reference_folder(defaults.as_deref())?;

            let xml = fs::read_to_string(&input)?;
            let cells = diagram::read_xml(&xml)?;
            info!("read {} diagram cells from {}", cells.len(), input.display());

            let turtle = pipeline::diagram_to_turtle(&cells, &user_prefixes, &reference_files, &defaults_files, &config)?;
            fs::write(&output, turtle)?;
            info!("wrote Turtle to {}", output.display());
            Ok(())
        }
        Command::TtlDrawio { input, output, refs, defaults, prefixes, horizontal, no_unique_literals } => {
            let mut config = if horizontal { profiles::horizontal() } else { BridgeConfig::default() };
            if no_unique_literals {
                config.graph.unique_literals = false;
            }
            let user_prefixes = load_prefixes(prefixes.as_deref())?;
            let reference_files = load_reference_folder(refs.as_deref())?;
            let defaults_files = load_reference_folder(defaults.as_deref())?;

            let turtle = fs::read_to_string(&input)?;
            let result = pipeline::turtle_to_diagram(&turtle, &user_prefixes, &reference_files, &defaults_files, &config)?;
            info!("laid out {} tree(s), {} severed edge(s)", result.trees.len(), result.severed.len());

            let cells = pipeline::assemble_diagram_cells(&result, &config)?;
            let xml = diagram::write_xml(&cells);
            fs::write(&output, xml)?;
            info!("wrote diagram to {}", output.display());
            Ok(())
        }
    }
}

/// Load the prefixes JSON file (`6. EXTERNAL INTERFACES`, prefixes file): a
/// JSON object mapping prefix strings to namespace IRI strings.
fn load_prefixes(path: Option<&Path>) -> BridgeResult<Vec<(String, String)>> {
    let Some(path) = path else { return Ok(Vec::new()) };
    let text = fs::read_to_string(path)?;
    let map: std::collections::BTreeMap<String, String> = serde_json::from_str(&text)?;
    Ok(map.into_iter().collect())
}

/// Load every `.ttl` file directly under a reference or defaults folder
/// (`6. EXTERNAL INTERFACES`).
fn load_reference_folder(path: Option<&Path>) -> BridgeResult<Vec<ReferenceFile>> {
    let Some(path) = path else { return Ok(Vec::new()) };
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("ttl") {
            continue;
        }
        let content = fs::read_to_string(&path)?;
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        files.push(ReferenceFile { name, content });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
