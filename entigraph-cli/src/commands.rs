//! CLI command implementations.

use colored::Colorize;
use entigraph_core::{type_color, Category, GraphConfig};
use entigraph_graph::{generate as generate_graph, regenerate, EntityGraph, GraphStore};
use entigraph_server::{EntigraphServer, ServerConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Resolves the generation config for a project directory.
///
/// An explicit `--config` file wins over `<project>/.entigraph/config.json`;
/// `--root` and `--output` win over both. Relative paths from either source
/// are taken relative to `project`.
pub fn load_config(
    project: &Path,
    config_file: Option<&Path>,
    root: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<GraphConfig> {
    let mut config = match config_file {
        Some(file) => GraphConfig::load(file, project)?,
        None => GraphConfig::load_from_project(project)?,
    };

    if let Some(root) = root {
        config.root = project.join(root);
    }
    if let Some(output) = output {
        config.output = project.join(output);
    }

    debug!(
        "Entity root {}, snapshot {}",
        config.root.display(),
        config.output.display()
    );
    Ok(config)
}

/// Initialize Entigraph in a directory.
pub fn init(path: &Path) -> Result<()> {
    let config_path = GraphConfig::path_in(path);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    GraphConfig::default().save(&config_path)?;

    println!("{} Initialized Entigraph in {}", "✓".green(), path.display());
    println!("  Put entity files under {}/<category>/", entigraph_core::config::DEFAULT_ROOT);
    println!("  Run {} to build the graph", "entigraph generate".cyan());

    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message);
    Ok(spinner)
}

/// Run the pipeline and write the snapshot.
pub fn generate(config: &GraphConfig) -> Result<()> {
    println!("{} {}", "Parsing entities from".cyan(), config.root.display());

    let spinner = spinner("Scanning entities...")?;
    let result = regenerate(config);
    spinner.finish_and_clear();

    let (_, summary) = match result {
        Ok(done) => done,
        Err(e) => {
            if let Some(file) = e.file() {
                println!("{} {} failed on {}", "✗".red(), e.stage(), file.display());
            }
            return Err(e.into());
        }
    };

    println!(
        "{} Graph data written to {} in {}ms",
        "✓".green(),
        summary.output.display(),
        summary.duration_ms
    );
    println!("  {} {}", "Nodes:".dimmed(), summary.nodes.to_string().cyan());
    println!("  {} {}", "Edges:".dimmed(), summary.edges.to_string().cyan());

    Ok(())
}

/// Show entity counts.
pub fn status(config: &GraphConfig) -> Result<()> {
    let result = generate_graph(config)?;
    let graph = result.graph;
    let counts = graph.type_counts();

    println!("{}", "Entigraph Status".cyan().bold());
    println!();
    println!("  {} {}", "Root:".dimmed(), config.root.display());
    println!("  {} {}", "Files:".dimmed(), result.files_scanned);
    println!("  {} {}", "Nodes:".dimmed(), graph.node_count());
    println!("  {} {}", "Edges:".dimmed(), graph.edge_count());
    println!();

    for category in Category::ALL {
        let count = counts.get(category.as_str()).copied().unwrap_or(0);
        println!(
            "  {:<14} {:>5}  {}",
            category.as_str(),
            count,
            category.color().dimmed()
        );
    }

    let snapshot = if config.output.exists() {
        "present".green()
    } else {
        "not generated".yellow()
    };
    println!();
    println!("  {} {} ({})", "Snapshot:".dimmed(), config.output.display(), snapshot);

    Ok(())
}

/// Search the graph, preferring the written snapshot over a fresh parse.
pub fn query(config: &GraphConfig, query: &str, limit: usize) -> Result<()> {
    let graph = match GraphStore::new(&config.output).load_graph()? {
        Some(graph) => graph,
        None => generate_graph(config)?.graph,
    };

    let matches: Vec<_> = graph.search(query).into_iter().take(limit).collect();

    if matches.is_empty() {
        println!("No matches found for \"{}\"", query);
        return Ok(());
    }

    println!("Found {} matches:\n", matches.len());

    for node in matches {
        println!(
            "  {} {} {}",
            node.entity_type.yellow(),
            node.label.cyan(),
            format!("({})", node.id).dimmed()
        );
        print_links(&graph, &node.id);
    }

    Ok(())
}

fn print_links(graph: &EntityGraph, id: &str) {
    let references = graph.references(id);
    if !references.is_empty() {
        let ids: Vec<_> = references.iter().map(|n| n.id.as_str()).collect();
        println!("    {} {}", "→".dimmed(), ids.join(", ").dimmed());
    }
    let backlinks = graph.backlinks(id);
    if !backlinks.is_empty() {
        let ids: Vec<_> = backlinks.iter().map(|n| n.id.as_str()).collect();
        println!("    {} {}", "←".dimmed(), ids.join(", ").dimmed());
    }
}

/// Generate the snapshot and start the server.
pub async fn serve(config: GraphConfig, port: u16, headless: bool) -> Result<()> {
    let bind_addr = if headless { "0.0.0.0" } else { "127.0.0.1" };

    if headless {
        println!("{}", "Starting Entigraph server in headless mode...".cyan());
    } else {
        println!("{}", "Starting Entigraph server...".cyan());
    }

    let worker_config = config.clone();
    let (graph, summary) =
        tokio::task::spawn_blocking(move || regenerate(&worker_config)).await??;

    println!(
        "{} Generated {} nodes, {} edges",
        "✓".green(),
        summary.nodes,
        summary.edges
    );
    for (entity_type, count) in graph.type_counts() {
        println!("  {} {}", entity_type.color_hex(type_color(&entity_type)), count);
    }

    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;
    let server = EntigraphServer::new(graph, config, ServerConfig { addr });
    server.state().mark_generated().await;

    println!("{} Listening on ws://{}:{}", "✓".green(), bind_addr, port);
    if headless {
        println!("  Headless mode: accepting connections from any host");
    }
    println!("  Press {} to stop", "Ctrl+C".cyan());

    server.run().await.map_err(|e| e.to_string())?;

    Ok(())
}

/// Colours a label with a `#RRGGBB` hex colour.
trait ColorHex {
    fn color_hex(&self, hex: &str) -> colored::ColoredString;
}

impl ColorHex for String {
    fn color_hex(&self, hex: &str) -> colored::ColoredString {
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .unwrap_or(0xCC)
        };
        self.as_str().truecolor(channel(1), channel(3), channel(5))
    }
}
