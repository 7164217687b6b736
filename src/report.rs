//! Output formatting for codenav results.
//!
//! Two formats:
//! - Pretty: colored terminal output for people
//! - JSON: pretty-printed `serde_json` for tools and scripts

use colored::*;
use serde::Serialize;

use crate::analysis::{DeadCodeReport, ImpactMode, ImpactReport, Outline};
use crate::graph::{GraphView, Relation};
use crate::index::{Entry, Meta, Staleness};
use crate::refs::RefsResult;
use crate::search::Match;

// =============================================================================
// JSON Format
// =============================================================================

/// Summary printed after a scan.
#[derive(Debug, Serialize)]
pub struct ScanSummary<'a> {
    pub root: String,
    pub scanned_at: String,
    pub files: usize,
    pub packages: usize,
    pub symbols: usize,
    pub extensions: &'a std::collections::BTreeMap<String, usize>,
}

impl<'a> ScanSummary<'a> {
    pub fn new(meta: &'a Meta, symbols: usize) -> Self {
        Self {
            root: meta.root.display().to_string(),
            scanned_at: meta.scanned_at.to_rfc3339(),
            files: meta.file_count,
            packages: meta.package_count,
            symbols,
            extensions: &meta.extensions,
        }
    }
}

/// Status result with a precomputed verdict.
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub stale: bool,
    #[serde(flatten)]
    pub staleness: &'a Staleness,
}

#[derive(Debug, Serialize)]
struct ErrorReport<'a> {
    error: &'a str,
}

/// Write any result as pretty JSON on stdout.
pub fn write_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// The single-field error object used in JSON mode.
pub fn error_json(message: &str) -> String {
    serde_json::to_string_pretty(&ErrorReport { error: message })
        .unwrap_or_else(|_| format!("{{\"error\": {:?}}}", message))
}

// =============================================================================
// Pretty Format
// =============================================================================

pub fn write_scan(summary: &ScanSummary) {
    println!();
    print!("  {}", "codenav".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Root:     ".dimmed());
    println!("{}", summary.root);
    print!("  {}", "Scanned:  ".dimmed());
    println!("{}", summary.scanned_at);
    println!();
    println!(
        "  {} {} files, {} packages, {} symbols",
        "✓".green(),
        summary.files,
        summary.packages,
        summary.symbols
    );

    if !summary.extensions.is_empty() {
        println!();
        let mut exts: Vec<(&String, &usize)> = summary.extensions.iter().collect();
        exts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (ext, count) in exts {
            let label = if ext.is_empty() { "(none)".to_string() } else { format!(".{}", ext) };
            println!("    {:<12} {:>6}", label, count);
        }
    }
    println!();
}

pub fn write_status(staleness: &Staleness) {
    println!();
    print!("  {}", "Scanned: ".dimmed());
    println!("{}", staleness.scanned_at.to_rfc3339());
    println!();

    if !staleness.is_stale() {
        println!("  {}", "✓ index is up to date".green());
        println!();
        return;
    }

    write_file_group("New", &staleness.new, |p| p.green().to_string());
    write_file_group("Modified", &staleness.modified, |p| p.yellow().to_string());
    write_file_group("Deleted", &staleness.deleted, |p| p.red().to_string());
    println!("  {}", "Run `codenav scan` to refresh the index".dimmed());
    println!();
}

fn write_file_group(title: &str, files: &[String], paint: impl Fn(&str) -> String) {
    if files.is_empty() {
        return;
    }
    println!("  {} ({}):", title.bold(), files.len());
    for file in files {
        println!("    {}", paint(file));
    }
    println!();
}

pub fn write_matches(query: &str, matches: &[Match]) {
    if matches.is_empty() {
        println!("No matches for {:?}", query);
        return;
    }
    for m in matches {
        print!("{:>4}  ", m.score.to_string().dimmed());
        write_entry_line(m.entry);
        if let Some(d) = m.distance {
            print!("  {}", format!("(distance {})", d).dimmed());
        }
        println!();
    }
}

/// Unscored substring results.
pub fn write_entries(query: &str, entries: &[&Entry]) {
    if entries.is_empty() {
        println!("No matches for {:?}", query);
        return;
    }
    for entry in entries {
        write_entry_line(entry);
        println!();
    }
}

fn write_entry_line(entry: &Entry) {
    print!("{:<10}", entry.kind.as_str().dimmed());
    if entry.is_file() {
        print!("{}", entry.path.blue());
    } else {
        print!("{}  ", entry.name.bold());
        print!("{}", entry.path.blue());
        print!("{}", format!(":{}", entry.line).dimmed());
    }
}

pub fn write_refs(result: &RefsResult) {
    match &result.definition {
        Some(def) => {
            println!("{} {}", "Definition:".bold(), location(&def.path, def.line));
            if !def.content.is_empty() {
                println!("    {}", def.content);
            }
        }
        None => println!("{} {}", "Definition:".bold(), "not found".dimmed()),
    }
    println!();

    println!("{} ({}):", "References".bold(), result.total);
    for r in &result.references {
        let marker = if r.is_definition { "def".yellow().to_string() } else { "   ".to_string() };
        println!("  {} {}  {}", marker, location(&r.path, r.line), r.content);
    }
    if result.truncated {
        println!(
            "  {}",
            format!("... {} more (raise --max)", result.total - result.references.len()).dimmed()
        );
    }
}

pub fn write_graph(view: &GraphView) {
    if let Some(focus) = &view.focus {
        print!("{} {}", "Focus:".bold(), focus.blue());
        if let Some(depth) = view.max_depth {
            print!("  {}", format!("(depth {})", depth).dimmed());
        }
        println!();
        println!();
    }

    println!("  {:>6} {:>7}  {}", "fan-in".dimmed(), "fan-out".dimmed(), "file".dimmed());
    for node in &view.nodes {
        let tag = match node.relation {
            Some(Relation::Focus) => "*".cyan().bold().to_string(),
            Some(Relation::Dependency) => "→".green().to_string(),
            Some(Relation::Dependent) => "←".yellow().to_string(),
            None => " ".to_string(),
        };
        print!("{} {:>6} {:>7}  {}", tag, node.fan_in, node.fan_out, node.path);
        if let (Some(depth), Some(Relation::Dependency | Relation::Dependent)) = (node.depth, node.relation) {
            print!("  {}", format!("depth {}", depth).dimmed());
        }
        println!();
    }

    if !view.edges.is_empty() {
        println!();
        println!("{} ({}):", "Edges".bold(), view.edges.len());
        for edge in &view.edges {
            println!("  {} {} {}", edge.from, "→".dimmed(), edge.to);
        }
    }

    println!();
    println!(
        "{}",
        format!(
            "{} files, {} edges, {} isolated",
            view.stats.files, view.stats.edges, view.stats.isolated
        )
        .dimmed()
    );
}

pub fn write_impact(report: &ImpactReport) {
    let mode = match report.mode {
        ImpactMode::Symbol => "symbol",
        ImpactMode::File => "file",
    };
    println!("{} {} {}", "Impact of".bold(), report.target.cyan(), format!("({})", mode).dimmed());

    for layer in &report.layers {
        println!();
        if layer.depth == 0 {
            println!("  {}", "Target".bold());
        } else {
            println!("  {} ({}):", format!("Depth {}", layer.depth).bold(), layer.total);
        }
        for item in &layer.items {
            print!("    ");
            match &item.name {
                Some(name) => print!("{}  ", name.bold()),
                None if report.mode == ImpactMode::Symbol => print!("{}  ", "<top level>".dimmed()),
                None => {}
            }
            if item.line > 0 {
                print!("{}", location(&item.path, item.line));
            } else {
                print!("{}", item.path.blue());
            }
            if let Some(via) = &item.via {
                print!("  {}", format!("via {}", via).dimmed());
            }
            println!();
        }
        if layer.truncated {
            println!(
                "    {}",
                format!("... {} more (raise --max)", layer.total - layer.items.len()).dimmed()
            );
        }
    }

    println!();
    let files = report.affected_files;
    let plural = if files != 1 { "s" } else { "" };
    println!("{}", format!("{} affected file{}", files, plural).dimmed());
}

pub fn write_dead_code(report: &DeadCodeReport) {
    if report.candidates.is_empty() {
        println!(
            "  {} no unreferenced exports among {} checked",
            "✓".green(),
            report.checked
        );
        return;
    }

    println!(
        "{} ({} of {} checked):",
        "Unreferenced exports".bold(),
        report.total,
        report.checked
    );
    for c in &report.candidates {
        println!(
            "  {:<10}{}  {}",
            c.kind.as_str().dimmed(),
            c.name.bold(),
            location(&c.path, c.line)
        );
    }
    if report.truncated {
        println!(
            "  {}",
            format!("... {} more (raise --max)", report.total - report.candidates.len()).dimmed()
        );
    }
}

pub fn write_outline(outline: &Outline) {
    print!("{}", outline.path.blue().bold());
    if let Some(lang) = outline.language {
        print!("  {}", format!("({})", lang).dimmed());
    }
    println!();

    if outline.symbols.is_empty() {
        println!("  {}", "no symbols".dimmed());
        return;
    }
    for s in &outline.symbols {
        let indent = if s.parent.is_some() { "    " } else { "  " };
        let name = if s.exported { s.name.bold() } else { s.name.normal() };
        print!("{}{:<10}{}", indent, s.kind.as_str().dimmed(), name);
        print!("  {}", format!("{}-{}", s.line, s.end_line).dimmed());
        if !s.signature.is_empty() {
            print!("  {}", s.signature);
        }
        println!();
    }
}

fn location(path: &str, line: usize) -> String {
    format!("{}{}", path.blue(), format!(":{}", line).dimmed())
}
