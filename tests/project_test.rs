//! Integration tests against the `testdata/project` fixture: a small Go
//! module with a TypeScript front end and a Python tools package.

mod common;

use codenav::analysis::{outline, DeadCodeOptions, ImpactMode, ImpactOptions};
use codenav::graph::Relation;
use codenav::search::MatchOptions;
use codenav::{find_dead_code, find_refs, impact, rank, Config, DependencyGraph, Error, Index, Registry, SymbolKind};

use common::{copy_fixture, scan, write};

#[test]
fn test_scan_fixture() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let meta = index.meta();

    // .codenavignore excludes generated/
    assert!(
        !index.entries().iter().any(|e| e.path.starts_with("generated/")),
        "Expected generated/ to be ignored"
    );
    assert_eq!(meta.file_count, 11);
    assert_eq!(meta.package_count, 4);
    assert_eq!(meta.extensions.get("ts"), Some(&3));
    assert_eq!(meta.extensions.get("py"), Some(&3));
    assert_eq!(meta.extensions.get("go"), Some(&3));

    for symbol in index.symbols() {
        assert!(symbol.line >= 1, "Expected a line for {:?}", symbol);
        assert!(index.contains_file(&symbol.path), "Orphan symbol {:?}", symbol);
    }
}

#[test]
fn test_find_ranks_exact_names_first() {
    let temp = copy_fixture();
    let index = scan(temp.path());

    let matches = rank(index.entries(), "report", &MatchOptions::default()).unwrap();
    assert!(!matches.is_empty());
    assert_eq!(matches[0].score, 100);
    let top: Vec<&str> = matches.iter().take_while(|m| m.score == 100).map(|m| m.entry.name.as_str()).collect();
    assert!(top.contains(&"report.py"), "Expected report.py among exact matches, got {:?}", top);
    assert!(top.contains(&"Report"), "Expected Report among exact matches, got {:?}", top);

    for pair in matches.windows(2) {
        assert!(pair[0].score >= pair[1].score, "Expected non-increasing scores");
    }

    let classes = rank(
        index.entries(),
        "report",
        &MatchOptions {
            kind: Some(SymbolKind::Class.into()),
            limit: Some(5),
        },
    )
    .unwrap();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].entry.name, "Report");
}

#[cfg(feature = "tree-sitter")]
#[test]
fn test_refs_across_go_packages() {
    let temp = copy_fixture();
    let index = scan(temp.path());

    let refs = find_refs(&index, &Registry::new(), "NewStore", 0).unwrap();
    let def = refs.definition.unwrap();
    assert_eq!((def.path.as_str(), def.line), ("store/store.go", 12));

    let sites: Vec<(&str, usize)> = refs.references.iter().map(|r| (r.path.as_str(), r.line)).collect();
    // The doc comment mentions the name too.
    assert_eq!(
        sites,
        vec![("main.go", 10), ("store/store.go", 11), ("store/store_test.go", 6)]
    );
}

#[test]
fn test_refs_truncation() {
    let temp = copy_fixture();
    let index = scan(temp.path());

    let refs = find_refs(&index, &Registry::new(), "renderCart", 1).unwrap();
    assert_eq!(refs.definition.unwrap().path, "web/cart.ts");
    assert_eq!(refs.total, 2);
    assert_eq!(refs.references.len(), 1);
    assert!(refs.truncated);
}

#[test]
fn test_graph_edges() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let graph = DependencyGraph::build(&index, &Registry::new());

    assert!(graph.imports("web/app.ts").eq(["web/cart.ts"]));
    assert!(graph.imports("web/cart.ts").eq(["web/format.ts"]));
    assert!(graph.imports("tools/report.py").eq(["tools/util.py"]));
    #[cfg(feature = "tree-sitter")]
    assert!(graph.imports("main.go").eq(["store/store.go"]));
    assert_eq!(graph.fan_in("web/format.ts"), 1);
    assert_eq!(graph.fan_out("tools/util.py"), 0);
}

#[test]
fn test_focused_graph_relations() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let graph = DependencyGraph::build(&index, &Registry::new());

    let view = graph.focused("web/cart.ts", Some(1));
    let nodes: Vec<(&str, Option<Relation>)> = view.nodes.iter().map(|n| (n.path.as_str(), n.relation)).collect();
    assert_eq!(nodes.len(), 3);
    assert!(nodes.contains(&("web/cart.ts", Some(Relation::Focus))));
    assert!(nodes.contains(&("web/format.ts", Some(Relation::Dependency))));
    assert!(nodes.contains(&("web/app.ts", Some(Relation::Dependent))));
    assert_eq!(view.edges.len(), 2);
}

#[test]
fn test_symbol_impact_walks_callers() {
    let temp = copy_fixture();
    let index = scan(temp.path());

    let report = impact(&index, &Registry::new(), "formatPrice", &ImpactOptions::default()).unwrap();
    assert_eq!(report.mode, ImpactMode::Symbol);
    assert_eq!(report.layers[0].items[0].path, "web/format.ts");

    let named = |depth: usize| -> Vec<&str> {
        report
            .layers
            .iter()
            .find(|l| l.depth == depth)
            .map(|l| l.items.iter().filter_map(|i| i.name.as_deref()).collect())
            .unwrap_or_default()
    };
    assert_eq!(named(1), vec!["renderCart"]);
    assert_eq!(named(2), vec!["start"]);
    assert_eq!(report.affected_files, 2);
}

#[test]
fn test_file_impact_walks_importers() {
    let temp = copy_fixture();
    let index = scan(temp.path());

    let report = impact(&index, &Registry::new(), "web/format.ts", &ImpactOptions::default()).unwrap();
    assert_eq!(report.mode, ImpactMode::File);
    let layers: Vec<Vec<&str>> = report
        .layers
        .iter()
        .map(|l| l.items.iter().map(|i| i.path.as_str()).collect())
        .collect();
    assert_eq!(layers, vec![vec!["web/format.ts"], vec!["web/cart.ts"], vec!["web/app.ts"]]);
}

#[test]
fn test_dead_code_candidates() {
    let temp = copy_fixture();
    let index = scan(temp.path());

    let report = find_dead_code(&index, &Registry::new(), &DeadCodeOptions::default()).unwrap();
    let found: Vec<(&str, &str)> = report
        .candidates
        .iter()
        .map(|c| (c.path.as_str(), c.name.as_str()))
        .collect();

    let mut expected = vec![];
    #[cfg(feature = "tree-sitter")]
    expected.push(("store/store.go", "Snapshot"));
    expected.extend([
        ("tools/report.py", "slug"),
        ("tools/report.py", "build_report"),
        ("web/format.ts", "CURRENCY"),
    ]);
    assert_eq!(found, expected);

    let web_only = DeadCodeOptions {
        path_prefix: Some("web/".to_string()),
        ..Default::default()
    };
    let report = find_dead_code(&index, &Registry::new(), &web_only).unwrap();
    assert_eq!(report.candidates.len(), 1);
    assert_eq!(report.candidates[0].name, "CURRENCY");
}

#[test]
fn test_outline_python_class() {
    let temp = copy_fixture();
    let index = scan(temp.path());

    let out = outline(&index, &Registry::new(), "report.py").unwrap();
    assert_eq!(out.path, "tools/report.py");
    let symbols: Vec<(&str, Option<&str>)> = out
        .symbols
        .iter()
        .map(|s| (s.name.as_str(), s.parent.as_deref()))
        .collect();
    assert_eq!(
        symbols,
        vec![
            ("Report", None),
            ("__init__", Some("Report")),
            ("slug", Some("Report")),
            ("build_report", None),
        ]
    );
}

#[test]
fn test_status_after_changes() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    index.persist().unwrap();

    let loaded = Index::load(temp.path()).unwrap();
    assert!(!loaded.status::<&str>(&[]).unwrap().is_stale());

    write(temp.path(), "web/extra.ts", "export const extra = 1;\n");
    std::fs::remove_file(temp.path().join("tools/util.py")).unwrap();

    let status = loaded.status::<&str>(&[]).unwrap();
    assert!(status.is_stale());
    assert_eq!(status.new, vec!["web/extra.ts"]);
    assert_eq!(status.deleted, vec!["tools/util.py"]);
}

#[test]
fn test_load_without_scan() {
    let temp = copy_fixture();
    let err = Index::load(temp.path()).unwrap_err();
    assert!(matches!(err, Error::NoIndex(_)), "Expected NoIndex, got {:?}", err);
    assert!(err.is_rescan_required());
}

#[test]
fn test_config_ignore_patterns() {
    let temp = copy_fixture();
    write(temp.path(), ".codenav.yaml", "ignore: [\"tools/\"]\nsearch:\n  limit: 5\n");

    let config = Config::load(temp.path()).unwrap();
    assert_eq!(config.search.limit, 5);

    let index = Index::scan(temp.path(), &Registry::new(), &config.ignore).unwrap();
    assert!(!index.entries().iter().any(|e| e.path.starts_with("tools/")));
}
