//! End-to-end builder scenarios against real fixture trees.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use philt_analysis::{
    build_component_graph, build_graph_from_entries, build_providers, discover_entries, Entry,
    EntrySpec, NameFrom, Resolver,
};

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn edges_of(graph: &philt_graph::ModuleGraph) -> Vec<(String, String)> {
    let mut edges = Vec::new();
    graph.for_each_edge(|from, to| edges.push((from.to_owned(), to.to_owned())));
    edges
}

#[tokio::test]
async fn manifest_entries_drive_the_closure_build() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "frontend/roots.ts",
        r#"
        export const roots = {
            Shop: {
                moduleFactory: () =>
                    import(/* webpackChunkName: "shop-root" */ "./roots/shop"),
            },
            Cart: {
                moduleFactory: () => import("./roots/cart"),
            },
        };
        "#,
    );
    let shop = write(
        dir.path(),
        "frontend/roots/shop.ts",
        "import './shared'; export const shop = 1;",
    );
    let cart = write(dir.path(), "frontend/roots/cart.ts", "export const cart = 1;");
    let shared = write(
        dir.path(),
        "frontend/roots/shared.ts",
        "export const shared = 1;",
    );

    let specs = vec![EntrySpec::RootsTs {
        file: PathBuf::from("frontend/roots.ts"),
        name_from: NameFrom::WebpackChunkName,
    }];
    let providers = build_providers(&specs);
    let entries = discover_entries(&providers, dir.path()).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "shop-root");
    assert_eq!(entries[1].name, "Cart");

    let report =
        build_graph_from_entries(dir.path(), &entries, &CancellationToken::new()).await;
    let nodes = report.graph.nodes();
    for expected in [&shop, &cart, &shared] {
        assert!(nodes.contains(&id(expected)), "missing {expected:?}");
    }
    assert!(edges_of(&report.graph).contains(&(id(&shop), id(&shared))));
}

#[tokio::test]
async fn alias_resolution_flows_through_the_closure() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "tsconfig.base.json",
        r#"{
            "compilerOptions": {
                "baseUrl": ".",
                "paths": {
                    "@ui/*": ["libs/ui/*"],
                    "env": ["config/env"]
                }
            }
        }"#,
    );
    let app = write(
        dir.path(),
        "apps/web/main.ts",
        "import { Button } from '@ui/button';\nimport { env } from 'env';\nimport axios from 'axios';",
    );
    let button = write(dir.path(), "libs/ui/button.ts", "export const Button = 1;");
    let env = write(dir.path(), "config/env.ts", "export const env = {};");

    let entries = vec![Entry {
        name: "web".into(),
        path: app.clone(),
    }];
    let report =
        build_graph_from_entries(dir.path(), &entries, &CancellationToken::new()).await;

    let edges = edges_of(&report.graph);
    assert!(edges.contains(&(id(&app), id(&button))));
    assert!(edges.contains(&(id(&app), id(&env))));
    assert!(edges.contains(&(id(&app), "pkg:axios".to_owned())));
}

#[tokio::test]
async fn component_graph_follows_only_rendered_imports_transitively() {
    let dir = TempDir::new().unwrap();
    let app = write(
        dir.path(),
        "App.tsx",
        r#"
        import { Page } from './Page'
        import { helper } from './helper'
        export function App() {
            helper();
            return <Page/>
        }
        "#,
    );
    let page = write(
        dir.path(),
        "Page.tsx",
        r#"
        import { Widget } from './widgets'
        export function Page() { return <div><Widget/></div> }
        "#,
    );
    let widget = write(
        dir.path(),
        "widgets/index.tsx",
        "export function Widget() { return null }",
    );
    write(dir.path(), "helper.ts", "export function helper() {}");

    let report = build_component_graph(
        dir.path(),
        &[app.clone()],
        &CancellationToken::new(),
        None,
    )
    .await;

    let edges = edges_of(&report.graph);
    assert!(edges.contains(&(id(&app), id(&page))));
    assert!(edges.contains(&(id(&page), id(&widget))));
    // helper is imported and called, but never rendered as JSX.
    assert!(!report.graph.nodes().iter().any(|n| n.ends_with("helper.ts")));
}

#[tokio::test]
async fn impact_query_inverts_the_built_graph() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.ts", "import './b';");
    write(dir.path(), "b.ts", "import './c';");
    let c = write(dir.path(), "c.ts", "export const x = 1;");

    let entries = vec![Entry {
        name: "a".into(),
        path: a.clone(),
    }];
    let report =
        build_graph_from_entries(dir.path(), &entries, &CancellationToken::new()).await;

    let impacted = report.graph.impacted(&id(&c));
    assert_eq!(impacted.len(), 2);
    assert!(impacted.contains(&id(&a)));
}

#[tokio::test]
async fn resolver_first_hit_order_is_observable_end_to_end() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.ts", "import './util';");
    let util_ts = write(dir.path(), "util.ts", "export const t = 1;");
    write(dir.path(), "util.js", "module.exports = 1;");

    let resolver = Resolver::new(dir.path());
    assert_eq!(
        resolver.resolve(&a, "./util"),
        philt_analysis::Resolution::Local(util_ts.clone())
    );

    let entries = vec![Entry {
        name: "a".into(),
        path: a.clone(),
    }];
    let report =
        build_graph_from_entries(dir.path(), &entries, &CancellationToken::new()).await;
    assert!(edges_of(&report.graph).contains(&(id(&a), id(&util_ts))));
}
