//! Tributary CLI - optimize, inspect and visualize data pipeline graphs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tributary_cli::{dot, inspect, io};
use tributary_optimizer::{OptimizerConfig, OptimizerPipeline, default_registry};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "Graph optimizer for data input pipelines", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the optimizer over a pipeline and write the rewritten pipeline
    Optimize {
        /// Path to the pipeline JSON file
        #[arg(value_name = "PIPELINE")]
        pipeline: PathBuf,

        /// Output file path (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Disable autotuning for every optimizer
        #[arg(long)]
        no_autotune: bool,

        /// Optimizers to run, in order (defaults to the built-in set)
        #[arg(long = "pass", value_name = "NAME")]
        passes: Vec<String>,

        /// Optimizer parameter (format: optimizer:key:value, can be repeated)
        #[arg(long = "config", value_name = "ENTRY")]
        config: Vec<String>,
    },
    /// Inspect a pipeline's structure
    Inspect {
        /// Path to the pipeline JSON file
        #[arg(value_name = "PIPELINE")]
        pipeline: PathBuf,
    },
    /// Generate a Graphviz DOT file from a pipeline
    Dot {
        /// Path to the pipeline JSON file
        #[arg(value_name = "PIPELINE")]
        pipeline: PathBuf,

        /// Output file path (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Filter nodes by name prefix (e.g., "inject/")
        #[arg(long, value_name = "PREFIX")]
        filter: Option<String>,

        /// Maximum depth from filtered nodes to include (0 = only matched nodes)
        #[arg(long, default_value = "0")]
        depth: usize,
    },
    /// List registered optimizers
    Passes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Optimize {
            pipeline,
            output,
            no_autotune,
            passes,
            config,
        } => {
            cmd_optimize(pipeline, output, no_autotune, passes, config)?;
        }
        Commands::Inspect { pipeline } => {
            let item = io::load_item(&pipeline)?;
            print!("{}", inspect::summarize(&item)?);
        }
        Commands::Dot {
            pipeline,
            output,
            filter,
            depth,
        } => {
            let item = io::load_item(&pipeline)?;
            let dot = match filter {
                Some(prefix) => dot::to_filtered_dot(&item, &prefix, depth)?,
                None => dot::to_dot(&item)?,
            };
            io::write_output(output.as_deref(), &dot)?;
        }
        Commands::Passes => {
            for name in default_registry().optimizer_names() {
                println!("{name}");
            }
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the level picked by `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Optimize a pipeline file.
fn cmd_optimize(
    pipeline_path: PathBuf,
    output_path: Option<PathBuf>,
    no_autotune: bool,
    passes: Vec<String>,
    config_entries: Vec<String>,
) -> Result<()> {
    let item = io::load_item(&pipeline_path)?;

    let mut config = if passes.is_empty() {
        OptimizerConfig::default()
    } else {
        OptimizerConfig::with_optimizers(passes)
    };
    if no_autotune {
        config = config.with_autotune(false);
    }
    for entry in &config_entries {
        config.parse_entry(entry)?;
    }

    let pipeline = OptimizerPipeline::new(&default_registry(), &config)
        .context("Failed to configure optimizer pipeline")?;
    let (graph, report) = pipeline
        .optimize(&item)
        .with_context(|| format!("Failed to optimize pipeline '{}'", item.id))?;

    for (name, stats) in &report.passes {
        tracing::info!(optimizer = %name, num_changes = stats.num_changes, "optimizer applied");
    }
    eprintln!(
        "Optimized '{}': {} change(s), {} -> {} nodes",
        item.id,
        report.total_changes(),
        item.graph.node_count(),
        graph.node_count()
    );

    io::write_output(output_path.as_deref(), &io::render_item(&item, &graph)?)
}
