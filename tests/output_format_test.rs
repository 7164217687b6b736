//! Tests for the JSON shapes printed with `--json`.
//!
//! Scripts consume these field names, so they are checked explicitly.

mod common;

use serde_json::Value;

use codenav::analysis::{outline, DeadCodeOptions, ImpactOptions};
use codenav::report::{self, ScanSummary};
use codenav::search::MatchOptions;
use codenav::{find_dead_code, find_refs, impact, rank, DependencyGraph, Index, Registry};

use common::{copy_fixture, scan};

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("should serialize")
}

#[test]
fn test_store_layout() {
    let temp = copy_fixture();
    scan(temp.path()).persist().unwrap();

    let store = temp.path().join(".codenav");
    let entries: Value = serde_json::from_str(&std::fs::read_to_string(store.join("entries.json")).unwrap()).unwrap();
    let first = &entries.as_array().unwrap()[0];
    for field in ["name", "kind", "path", "line", "package", "exported"] {
        assert!(first.get(field).is_some(), "Expected field {} in entry, got {}", field, first);
    }

    let meta: Value = serde_json::from_str(&std::fs::read_to_string(store.join("meta.json")).unwrap()).unwrap();
    for field in ["root", "scanned_at", "version", "file_count", "package_count", "extensions"] {
        assert!(meta.get(field).is_some(), "Expected field {} in meta, got {}", field, meta);
    }
}

#[test]
fn test_scan_summary_json() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let value = to_json(&ScanSummary::new(index.meta(), index.symbols().count()));

    assert_eq!(value["files"], 11);
    assert_eq!(value["packages"], 4);
    assert!(value["symbols"].as_u64().unwrap() > 0);
}

#[test]
fn test_match_json_is_flat() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let matches = rank(index.entries(), "slugfy", &MatchOptions::default()).unwrap();
    let value = to_json(&matches);

    let hit = &value.as_array().unwrap()[0];
    assert_eq!(hit["name"], "slugify");
    assert_eq!(hit["kind"], "func");
    assert_eq!(hit["path"], "tools/util.py");
    assert_eq!(hit["distance"], 1);
    assert!(hit["score"].as_u64().unwrap() >= 20);
}

#[test]
fn test_refs_json() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let value = to_json(&find_refs(&index, &Registry::new(), "slugify", 0).unwrap());

    assert_eq!(value["symbol"], "slugify");
    assert_eq!(value["definition"]["path"], "tools/util.py");
    assert_eq!(value["definition"]["is_definition"], true);
    assert_eq!(value["total"], 2);
    assert_eq!(value["truncated"], false);
    assert_eq!(value["references"][0]["content"], "from .util import slugify");
}

#[test]
fn test_graph_json() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let graph = DependencyGraph::build(&index, &Registry::new());

    let whole = to_json(&graph.view());
    assert!(whole.get("focus").is_none());
    assert!(whole["stats"]["files"].as_u64().unwrap() >= 6);

    let focused = to_json(&graph.focused("web/cart.ts", Some(1)));
    assert_eq!(focused["focus"], "web/cart.ts");
    assert_eq!(focused["max_depth"], 1);
    assert_eq!(focused["nodes"][0]["relation"], "focus");
    assert_eq!(focused["nodes"][0]["depth"], 0);
    assert_eq!(focused["edges"][0]["from"], "web/app.ts");
    assert_eq!(focused["edges"][0]["to"], "web/cart.ts");
}

#[test]
fn test_impact_json() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let value = to_json(&impact(&index, &Registry::new(), "formatPrice", &ImpactOptions::default()).unwrap());

    assert_eq!(value["mode"], "symbol");
    assert_eq!(value["target"], "formatPrice");
    assert_eq!(value["layers"][0]["depth"], 0);
    let layer1 = &value["layers"][1];
    assert_eq!(layer1["depth"], 1);
    let item = layer1["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i.get("name").is_some())
        .expect("layer 1 should name an enclosing symbol");
    assert_eq!(item["name"], "renderCart");
    assert_eq!(item["kind"], "func");
    assert_eq!(item["via"], "formatPrice");
}

#[test]
fn test_dead_code_json() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let value = to_json(&find_dead_code(&index, &Registry::new(), &DeadCodeOptions::default()).unwrap());

    assert!(value["checked"].as_u64().unwrap() > 0);
    assert_eq!(value["truncated"], false);
    let last = value["candidates"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["name"], "CURRENCY");
    assert_eq!(last["package"], "web");
}

#[test]
fn test_outline_json() {
    let temp = copy_fixture();
    let index = scan(temp.path());
    let value = to_json(&outline(&index, &Registry::new(), "web/cart.ts").unwrap());

    assert_eq!(value["language"], "typescript");
    let symbols = value["symbols"].as_array().unwrap();
    assert_eq!(symbols[0]["name"], "CartItem");
    assert_eq!(symbols[0]["kind"], "interface");
    assert_eq!(symbols[0]["line"], 3);
    assert_eq!(symbols[0]["end_line"], 6);
    assert!(symbols[0].get("parent").is_none());
}

#[test]
fn test_error_object() {
    let temp = copy_fixture();
    let err = Index::load(temp.path()).unwrap_err();
    let value: Value = serde_json::from_str(&report::error_json(&err.to_string())).unwrap();

    assert_eq!(value.as_object().unwrap().len(), 1);
    assert!(value["error"].as_str().unwrap().contains("codenav scan"));
}
