//! wsc CLI: Winograd-schema pronoun resolution through answer-set programming.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use wsc_asp::config::ResolverConfig;
use wsc_asp::extract::{Lexicon, PredicateCatalog};
use wsc_asp::graph::rules::path_to_rules;
use wsc_asp::graph::traverse::{search, SearchStrategy};
use wsc_asp::graph::{GraphIndex, KnowledgeGraph};
use wsc_asp::paths::WscPaths;
use wsc_asp::problem::load_corpus;
use wsc_asp::program::Strategy;
use wsc_asp::resolver::{Decision, Evaluation, Resolver, SolveMode};

#[derive(Parser)]
#[command(name = "wsc", version, about = "Winograd-schema pronoun resolution via ASP")]
struct Cli {
    /// Config file (defaults to the XDG config location).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every problem of a test corpus and print an evaluation.
    Solve {
        /// Training corpus (JSONL problems).
        #[arg(long)]
        train: PathBuf,
        /// Test corpus (JSONL problems).
        #[arg(long)]
        test: PathBuf,
        /// Predicate catalog covering train and test sentences (JSONL).
        #[arg(long)]
        catalog: PathBuf,
        /// Part-of-speech lexicon (JSON word → class).
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// Program builder: direct, inductive or path-mined.
        #[arg(long)]
        strategy: Option<Strategy>,
        /// iterative or batch.
        #[arg(long)]
        mode: Option<SolveMode>,
        /// Training examples retrieved per query.
        #[arg(long)]
        examples: Option<usize>,
        /// Knowledge-graph record store (path-mined strategy).
        #[arg(long)]
        records: Option<PathBuf>,
        /// Knowledge-graph node index (path-mined strategy).
        #[arg(long)]
        index: Option<PathBuf>,
        /// Keep intermediate programs in the debug directory.
        #[arg(long)]
        debug: bool,
        /// Debug directory (defaults to the XDG state location).
        #[arg(long)]
        debug_dir: Option<PathBuf>,
    },

    /// Find a path between two words and print the rules it induces.
    Path {
        /// Knowledge-graph record store (defaults to the XDG data location).
        #[arg(long)]
        records: Option<PathBuf>,
        /// Knowledge-graph node index (defaults to the XDG data location).
        #[arg(long)]
        index: Option<PathBuf>,
        /// Part-of-speech lexicon used to shape rules.
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// Use depth-first search bounded by this many edges.
        #[arg(long)]
        max_depth: Option<usize>,
        start: String,
        goal: String,
    },

    /// Knowledge-graph maintenance.
    Graph {
        #[command(subcommand)]
        action: GraphAction,
    },

    /// Manage the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum GraphAction {
    /// Build the node → line index of a record store.
    Index {
        /// Record store to scan.
        #[arg(long)]
        records: PathBuf,
        /// Where to write the index.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config.
    Init {
        /// Destination (defaults to the XDG config location).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config.
    Show,
}

fn load_lexicon(path: Option<&PathBuf>) -> Result<Lexicon> {
    match path {
        Some(path) => Ok(Lexicon::load(path)?),
        None => Ok(Lexicon::default()),
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let paths = WscPaths::resolve().ok();
    let config_path = cli
        .config
        .clone()
        .or_else(|| paths.as_ref().map(WscPaths::config_file));

    match cli.command {
        Commands::Solve {
            train,
            test,
            catalog,
            lexicon,
            strategy,
            mode,
            examples,
            records,
            index,
            debug,
            debug_dir,
        } => {
            let mut config = match &config_path {
                Some(path) => ResolverConfig::load_or_default(path)?,
                None => ResolverConfig::default(),
            };
            if let Some(strategy) = strategy {
                config.strategy = strategy;
            }
            if let Some(mode) = mode {
                config.mode = mode;
            }
            if let Some(k) = examples {
                config.examples_per_query = k;
            }
            if records.is_some() {
                config.graph.records = records;
            }
            if index.is_some() {
                config.graph.index = index;
            }
            if let Some(paths) = &paths {
                config.graph.records.get_or_insert_with(|| paths.graph_records());
                config.graph.index.get_or_insert_with(|| paths.graph_index());
            }
            config.debug |= debug;
            if debug_dir.is_some() {
                config.debug_dir = debug_dir;
            }

            let debug_dir = config
                .debug_dir
                .clone()
                .or_else(|| paths.as_ref().map(WscPaths::debug_dir))
                .unwrap_or_else(|| PathBuf::from("debug"));

            let corpus = load_corpus(&train)?;
            let queries = load_corpus(&test)?;
            let catalog = PredicateCatalog::load(&catalog)?;
            let lexicon = load_lexicon(lexicon.as_ref())?;

            let resolver = Resolver::from_config(
                &config,
                corpus,
                Arc::new(catalog),
                Arc::new(lexicon),
                debug_dir,
            )?;

            let mut evaluation = Evaluation::default();
            for (i, problem) in queries.iter().enumerate() {
                let resolution = resolver.resolve(problem);
                match &resolution.decision {
                    Decision::Candidate(answer) => println!(
                        "{}. {} -> {} ({})",
                        i + 1,
                        problem.sentence(),
                        answer.index(),
                        problem.candidate(*answer)
                    ),
                    Decision::Unknown(reason) => {
                        println!("{}. {} -> unknown ({reason})", i + 1, problem.sentence())
                    }
                }
                evaluation.record(&resolution.decision, problem.answer());
            }
            println!("\n{evaluation}");
        }

        Commands::Path {
            records,
            index,
            lexicon,
            max_depth,
            start,
            goal,
        } => {
            let (Some(records), Some(index)) = (
                records.or_else(|| paths.as_ref().map(WscPaths::graph_records)),
                index.or_else(|| paths.as_ref().map(WscPaths::graph_index)),
            ) else {
                miette::bail!("cannot determine the graph location; pass --records and --index");
            };
            let graph = KnowledgeGraph::open(&records, &index)?;
            let lexicon = load_lexicon(lexicon.as_ref())?;
            let strategy = match max_depth {
                Some(max_depth) => SearchStrategy::Dfs { max_depth },
                None => SearchStrategy::Bfs,
            };

            match search(&graph, &start, &goal, strategy)? {
                Some(path) => {
                    println!("Path ({} edges):", path.len());
                    for edge in &path {
                        println!("  {edge}");
                    }
                    println!("\nRules:");
                    for rule in path_to_rules(&path, &lexicon) {
                        println!("  {rule}");
                    }
                }
                None => println!("No path from \"{start}\" to \"{goal}\"."),
            }
        }

        Commands::Graph { action } => match action {
            GraphAction::Index { records, out } => {
                let index = GraphIndex::build(&records)?;
                index.save(&out)?;
                println!("Indexed {} nodes into {}", index.len(), out.display());
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => {
                let Some(path) = path.or(config_path) else {
                    miette::bail!("cannot determine a config location; pass --path");
                };
                if path.exists() && !force {
                    miette::bail!(
                        "{} already exists; pass --force to overwrite",
                        path.display()
                    );
                }
                ResolverConfig::default().save(&path)?;
                println!("Wrote default config to {}", path.display());
            }
            ConfigAction::Show => {
                let config = match &config_path {
                    Some(path) => ResolverConfig::load_or_default(path)?,
                    None => ResolverConfig::default(),
                };
                let toml = toml::to_string_pretty(&config).into_diagnostic()?;
                print!("{toml}");
            }
        },
    }

    Ok(())
}
