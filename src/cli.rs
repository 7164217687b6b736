//! Command-line interface for codenav.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::analysis::{self, DeadCodeOptions, ImpactOptions};
use crate::config::Config;
use crate::extract::{Registry, SymbolKind};
use crate::graph::DependencyGraph;
use crate::index::{EntryKind, Index};
use crate::refs;
use crate::report::{self, ScanSummary, StatusReport};
use crate::search::{self, MatchOptions};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Project-local code index.
///
/// `codenav scan` indexes every file and symbol under the project root into
/// `.codenav/`. The other commands query that index: fuzzy lookup, reference
/// search, the import graph, change impact and unreferenced exports.
#[derive(Parser)]
#[command(name = "codenav")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Print JSON instead of colored text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log more (-v info, -vv debug); overrides CODENAV_LOG
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index the project, replacing any previous index
    Scan,
    /// Show files added, deleted or modified since the last scan
    Status,
    /// Look up files and symbols by name
    #[command(visible_alias = "search")]
    Find(FindArgs),
    /// Show where a symbol is defined and referenced
    Refs(RefsArgs),
    /// Show the import graph, whole or around one file
    Graph(GraphArgs),
    /// Show what depends, transitively, on a symbol or file
    Impact(ImpactArgs),
    /// List exported symbols nothing references
    Dead(DeadArgs),
    /// List the symbols of one file
    Outline(OutlineArgs),
}

/// Arguments for the find command.
#[derive(Args)]
pub struct FindArgs {
    pub query: String,

    /// Only entries of this kind (file, func, method, type, class, ...)
    #[arg(short, long)]
    pub kind: Option<EntryKind>,

    /// Maximum results, 0 for all (default: search.limit from config)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Plain case-sensitive substring match on names, unscored
    #[arg(long)]
    pub exact: bool,
}

/// Arguments for the refs command.
#[derive(Args)]
pub struct RefsArgs {
    pub symbol: String,

    /// Maximum references listed, 0 for all (default: refs.max_results)
    #[arg(short, long)]
    pub max: Option<usize>,
}

/// Arguments for the graph command.
#[derive(Args)]
pub struct GraphArgs {
    /// Show only files reachable from this one
    #[arg(short, long)]
    pub focus: Option<String>,

    /// Hops from the focus file (default: unlimited)
    #[arg(short, long, requires = "focus")]
    pub depth: Option<usize>,
}

/// Arguments for the impact command.
#[derive(Args)]
pub struct ImpactArgs {
    /// Symbol name or indexed file
    pub target: String,

    /// Layers to expand (default: impact.max_depth)
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Items listed per layer, 0 for all (default: impact.max_results)
    #[arg(short, long)]
    pub max: Option<usize>,
}

/// Arguments for the dead command.
#[derive(Args)]
pub struct DeadArgs {
    /// Only symbols of this kind
    #[arg(short, long)]
    pub kind: Option<SymbolKind>,

    /// Only symbols under this path prefix
    #[arg(short, long)]
    pub path: Option<String>,

    /// Maximum candidates listed, 0 for all (default: dead_code.max_results)
    #[arg(short, long)]
    pub max: Option<usize>,
}

/// Arguments for the outline command.
#[derive(Args)]
pub struct OutlineArgs {
    pub file: PathBuf,
}

/// Everything a command needs besides its own arguments.
struct Project {
    root: PathBuf,
    json: bool,
    config: Config,
    registry: Registry,
}

impl Project {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = Config::load(&cli.root)?;
        Ok(Self {
            root: cli.root.clone(),
            json: cli.json,
            config,
            registry: Registry::new(),
        })
    }

    fn index(&self) -> anyhow::Result<Index> {
        Ok(Index::load(&self.root)?)
    }
}

/// Run the selected command and return the process exit code.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let project = Project::open(cli)?;
    match &cli.command {
        Commands::Scan => run_scan(&project),
        Commands::Status => run_status(&project),
        Commands::Find(args) => run_find(&project, args),
        Commands::Refs(args) => run_refs(&project, args),
        Commands::Graph(args) => run_graph(&project, args),
        Commands::Impact(args) => run_impact(&project, args),
        Commands::Dead(args) => run_dead(&project, args),
        Commands::Outline(args) => run_outline(&project, args),
    }
}

fn run_scan(project: &Project) -> anyhow::Result<i32> {
    let index = Index::scan(&project.root, &project.registry, &project.config.ignore)?;
    index.persist()?;

    let summary = ScanSummary::new(index.meta(), index.symbols().count());
    if project.json {
        report::write_json(&summary)?;
    } else {
        report::write_scan(&summary);
    }
    Ok(EXIT_SUCCESS)
}

fn run_status(project: &Project) -> anyhow::Result<i32> {
    let index = project.index()?;
    let staleness = index.status(&project.config.ignore)?;
    let stale = staleness.is_stale();

    if project.json {
        report::write_json(&StatusReport {
            stale,
            staleness: &staleness,
        })?;
    } else {
        report::write_status(&staleness);
    }
    Ok(if stale { EXIT_FAILED } else { EXIT_SUCCESS })
}

fn run_find(project: &Project, args: &FindArgs) -> anyhow::Result<i32> {
    let index = project.index()?;
    let options = MatchOptions {
        kind: args.kind,
        limit: result_cap(args.limit.unwrap_or(project.config.search.limit)),
    };

    if args.exact {
        let entries = search::substring(index.entries(), &args.query, &options)?;
        if project.json {
            report::write_json(&entries)?;
        } else {
            report::write_entries(&args.query, &entries);
        }
    } else {
        let matches = search::rank(index.entries(), &args.query, &options)?;
        if project.json {
            report::write_json(&matches)?;
        } else {
            report::write_matches(&args.query, &matches);
        }
    }
    Ok(EXIT_SUCCESS)
}

/// 0 lifts the cap, as with `--max` on the other commands.
fn result_cap(limit: usize) -> Option<usize> {
    (limit > 0).then_some(limit)
}

fn run_refs(project: &Project, args: &RefsArgs) -> anyhow::Result<i32> {
    let index = project.index()?;
    let max = args.max.unwrap_or(project.config.refs.max_results);
    let result = refs::find_refs(&index, &project.registry, &args.symbol, max)?;

    if project.json {
        report::write_json(&result)?;
    } else {
        report::write_refs(&result);
    }
    Ok(EXIT_SUCCESS)
}

fn run_graph(project: &Project, args: &GraphArgs) -> anyhow::Result<i32> {
    let index = project.index()?;
    let graph = DependencyGraph::build(&index, &project.registry);

    let view = match &args.focus {
        Some(focus) => {
            let file = index.resolve_file(focus)?;
            graph.focused(file, args.depth)
        }
        None => graph.view(),
    };

    if project.json {
        report::write_json(&view)?;
    } else {
        report::write_graph(&view);
    }
    Ok(EXIT_SUCCESS)
}

fn run_impact(project: &Project, args: &ImpactArgs) -> anyhow::Result<i32> {
    let index = project.index()?;
    let options = ImpactOptions {
        max_depth: args.depth.unwrap_or(project.config.impact.max_depth),
        max_results: args.max.unwrap_or(project.config.impact.max_results),
    };
    let result = analysis::impact(&index, &project.registry, &args.target, &options)?;

    if project.json {
        report::write_json(&result)?;
    } else {
        report::write_impact(&result);
    }
    Ok(EXIT_SUCCESS)
}

fn run_dead(project: &Project, args: &DeadArgs) -> anyhow::Result<i32> {
    let index = project.index()?;
    let options = DeadCodeOptions {
        kind: args.kind,
        path_prefix: args.path.clone(),
        max_results: args.max.unwrap_or(project.config.dead_code.max_results),
        entry_points: project.config.dead_code.entry_points.clone(),
    };
    let result = analysis::find_dead_code(&index, &project.registry, &options)?;

    if project.json {
        report::write_json(&result)?;
    } else {
        report::write_dead_code(&result);
    }
    Ok(EXIT_SUCCESS)
}

fn run_outline(project: &Project, args: &OutlineArgs) -> anyhow::Result<i32> {
    let index = project.index()?;
    let file = args.file.to_string_lossy();
    let result = analysis::outline(&index, &project.registry, &file)?;

    if project.json {
        report::write_json(&result)?;
    } else {
        report::write_outline(&result);
    }
    Ok(EXIT_SUCCESS)
}
