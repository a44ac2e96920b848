use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use traceables::{BuildSession, Config, GraphRequest, MatrixRequest, Project, RendererRegistry, View};

#[derive(Parser, Debug)]
#[command(name = "traceables")]
#[command(about = "Query traceable items and their relationships in a documentation tree")]
struct Cli {
    /// Configuration file (defaults to $TRACEABLES_CONFIG, then ./traceables.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format: text, json or dot
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report duplicate tags, unresolved references and invalid attribute names
    Check,
    /// List traceables, optionally filtered
    List {
        /// Filter expression, e.g. "color == 'red' and priority >= 2"
        #[arg(long)]
        filter: Option<String>,
        /// Extra attribute columns, comma separated
        #[arg(long, value_delimiter = ',')]
        attributes: Vec<String>,
    },
    /// Show one traceable with its attributes and relationships
    Show { tag: String },
    /// Relationship matrix for one relationship name
    Matrix {
        relationship: String,
        #[arg(long)]
        filter_primaries: Option<String>,
        #[arg(long)]
        filter_secondaries: Option<String>,
        /// Rows per page (0: no limit; defaults to [matrix] max_primaries)
        #[arg(long)]
        max_primaries: Option<usize>,
        /// Columns per page (0: no limit; defaults to [matrix] max_secondaries)
        #[arg(long)]
        max_secondaries: Option<usize>,
    },
    /// Relationship graph reachable from start tags
    Graph {
        /// Tags to start from
        #[arg(long = "start", required = true, num_args = 1..)]
        start: Vec<String>,
        /// Relationship to follow as NAME or NAME:DEPTH
        #[arg(long = "relationship", required = true, num_args = 1.., value_parser = parse_follow)]
        relationships: Vec<(String, Option<usize>)>,
    },
}

/// Parse `NAME[:DEPTH]`.
fn parse_follow(value: &str) -> std::result::Result<(String, Option<usize>), String> {
    match value.rsplit_once(':') {
        Some((name, depth)) => {
            let depth = depth
                .parse::<usize>()
                .map_err(|_| format!("invalid depth '{}' in '{}'", depth, value))?;
            Ok((name.to_string(), Some(depth)))
        }
        None => Ok((value.to_string(), None)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_override(cli.config.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.traceables.log_level.as_str()),
    )
    .init();

    let mut session = config.build_session()?;
    let (_project, summary) = Project::load(config.source_folder(), &mut session)
        .with_context(|| format!("Failed to load {}", config.source_folder().display()))?;
    log::info!(
        "Loaded {} documents, {} declarations, {} traceables",
        summary.added,
        summary.declarations,
        session.registry().len()
    );

    let renderers = RendererRegistry::new(config.graph.node_styles());
    let failed_check = run(&cli.command, &config, &session, &renderers, &cli.format)?;
    if failed_check {
        std::process::exit(1);
    }
    Ok(())
}

/// Execute one command; returns true when `check` found problems.
fn run(
    command: &Command,
    config: &Config,
    session: &BuildSession,
    renderers: &RendererRegistry,
    format: &str,
) -> Result<bool> {
    let view = match command {
        Command::Check => {
            let diagnostics: Vec<_> = session.diagnostics().iter().collect();
            let failed = !diagnostics.is_empty();
            emit(renderers, format, &View::Diagnostics(diagnostics))?;
            return Ok(failed);
        }
        Command::List { filter, attributes } => {
            let items = match filter {
                Some(filter) => session.filter(filter)?,
                None => session.registry().all().collect(),
            };
            View::List {
                items,
                attributes: attributes.clone(),
            }
        }
        Command::Show { tag } => View::Item(session.item(tag)?),
        Command::Matrix {
            relationship,
            filter_primaries,
            filter_secondaries,
            max_primaries,
            max_secondaries,
        } => {
            let request = MatrixRequest {
                filter_primaries: filter_primaries.clone(),
                filter_secondaries: filter_secondaries.clone(),
                max_primaries: max_primaries
                    .map(|n| (n > 0).then_some(n))
                    .unwrap_or_else(|| config.matrix.max_primaries()),
                max_secondaries: max_secondaries
                    .map(|n| (n > 0).then_some(n))
                    .unwrap_or_else(|| config.matrix.max_secondaries()),
                ..MatrixRequest::new(relationship.as_str())
            };
            View::Matrix(session.matrix_pages(&request)?)
        }
        Command::Graph {
            start,
            relationships,
        } => {
            let mut request = GraphRequest::new(start.iter().cloned());
            for (name, depth) in relationships {
                request = request.follow(name.as_str(), depth.or(config.graph.default_max_depth));
            }
            View::Graph(session.graph(&request)?)
        }
    };
    emit(renderers, format, &view)?;
    Ok(false)
}

fn emit(renderers: &RendererRegistry, format: &str, view: &View<'_>) -> Result<()> {
    let output = renderers.render(format, view)?;
    println!("{}", output.trim_end());
    Ok(())
}
