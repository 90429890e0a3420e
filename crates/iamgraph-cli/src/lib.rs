//! iamgraph command line
//!
//! `iamgraph load` reads a workbook export, runs the loader into an
//! in-memory graph, prints the run report and optionally writes JSON or
//! Cypher exports. `iamgraph inspect` normalizes one policy document and
//! lists the grants it produces.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use iamgraph_document::PolicyDocument;
use iamgraph_loader::{GraphLoader, LoadReport, LoaderConfig, LogFormat, NodeLabel, RelType, Workbook};
use iamgraph_sink::MemoryGraph;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit status of a successful run
pub const EXIT_OK: u8 = 0;

/// Exit status when `--strict` is set and records were skipped
pub const EXIT_SKIPPED: u8 = 2;

/// Command line definition
#[must_use]
pub fn command() -> Command {
    Command::new("iamgraph")
        .version(iamgraph_loader::VERSION)
        .about("Load IAM policy exports into a permission graph")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("load")
                .about("Load a workbook export and report what was materialized")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Workbook JSON: sheet name to array of rows"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("Loader configuration TOML"),
                )
                .arg(
                    Arg::new("export-json")
                        .long("export-json")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the resulting graph as JSON"),
                )
                .arg(
                    Arg::new("export-cypher")
                        .long("export-cypher")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the resulting graph as a Cypher script"),
                )
                .arg(
                    Arg::new("report-json")
                        .long("report-json")
                        .action(ArgAction::SetTrue)
                        .help("Print the run report as JSON"),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Exit with status 2 when anything was skipped"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Normalize one policy document and list its grants")
                .arg(
                    Arg::new("document")
                        .required(true)
                        .help("Policy document text as found in the export"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

/// Loader configuration named by `--config`, or defaults
///
/// # Errors
/// Fails if the configuration file cannot be read or parsed.
pub fn load_config(matches: &ArgMatches) -> Result<LoaderConfig> {
    let path = match matches.subcommand() {
        Some(("load", args)) => args.get_one::<PathBuf>("config"),
        _ => None,
    };
    match path {
        Some(path) => LoaderConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(LoaderConfig::default()),
    }
}

/// Install the global tracing subscriber
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Logs go to stderr.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded in tests
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Execute parsed command line, writing user output to `out`
///
/// Returns the process exit status.
///
/// # Errors
/// Input, configuration, load and export failures.
pub fn run(matches: &ArgMatches, config: LoaderConfig, out: &mut dyn Write) -> Result<u8> {
    match matches.subcommand() {
        Some(("load", args)) => run_load(args, config, out),
        Some(("inspect", args)) => run_inspect(args, out),
        _ => {
            writeln!(out, "{}", command().render_help())?;
            Ok(1)
        }
    }
}

fn run_load(args: &ArgMatches, config: LoaderConfig, out: &mut dyn Write) -> Result<u8> {
    let input = args.get_one::<PathBuf>("input").context("--input is required")?;
    let workbook = Workbook::from_path(input).with_context(|| format!("loading workbook {}", input.display()))?;
    let records = workbook.to_records(&config.sheets);
    info!("Loaded {} records from {}", records.len(), input.display());

    let graph = MemoryGraph::new();
    let report = GraphLoader::new(config)
        .run(&graph, &records)
        .context("loading graph")?;

    if args.get_flag("report-json") {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(out, "{report}")?;
        writeln!(
            out,
            "graph: {} nodes, {} relationships",
            graph.node_count(),
            graph.relationship_count()
        )?;
    }

    if let Some(path) = args.get_one::<PathBuf>("export-json") {
        let json = graph.snapshot().to_json_pretty()?;
        write_export(path, &json)?;
    }
    if let Some(path) = args.get_one::<PathBuf>("export-cypher") {
        write_export(path, &graph.snapshot().to_cypher())?;
    }

    Ok(exit_code(&report, args.get_flag("strict")))
}

fn write_export(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing export {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn exit_code(report: &LoadReport, strict: bool) -> u8 {
    if strict && !report.is_complete() {
        EXIT_SKIPPED
    } else {
        EXIT_OK
    }
}

fn run_inspect(args: &ArgMatches, out: &mut dyn Write) -> Result<u8> {
    let raw = args.get_one::<String>("document").context("document is required")?;
    let document = PolicyDocument::parse(raw).context("parsing policy document")?;
    let grants = document.grants();

    if args.get_flag("json") {
        writeln!(out, "{}", serde_json::to_string_pretty(&grants)?)?;
        return Ok(EXIT_OK);
    }

    writeln!(out, "{} statements, {} grants", document.len(), grants.len())?;
    for grant in &grants {
        let resource = NodeLabel::for_resource(grant.shape.resource_polarity());
        let action = NodeLabel::for_action(grant.shape.action_polarity());
        writeln!(
            out,
            "{action}({}) -[{}]-> {resource}({})",
            grant.action,
            RelType::for_shape(grant.shape),
            grant.resource
        )?;
    }
    Ok(EXIT_OK)
}
