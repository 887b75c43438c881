//! Workspace resolution scenarios against an in-memory repository.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use bundle_model::PluginName;
use bundle_resolver::{
    DependencyResolver, PluginCommand, PluginRepository, Problem, ResolverSettings,
};
use common::{FakeRepository, above, compatible, loaded, plugin, v};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn resolver(repository: &Arc<FakeRepository>) -> DependencyResolver {
    DependencyResolver::new(repository.clone() as Arc<dyn PluginRepository>)
}

#[tokio::test]
async fn test_resolves_transitive_dependency() {
    let repository = Arc::new(FakeRepository::new([
        plugin("A", "1.0").with_dep("B", above("1.0")),
        plugin("B", "1.0"),
    ]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("A")], &v("2.0"))
        .await;

    assert_eq!(loaded(&resolution), vec!["A@1.0", "B@1.0"]);
    assert!(resolution.is_clean());
    assert_eq!(resolution.config.ship_version, v("2.0"));
}

#[tokio::test]
async fn test_first_resolved_version_wins() {
    // A reaches C in round two, D only in round four.
    let repository = Arc::new(FakeRepository::new([
        plugin("A", "1.0").with_dep("C", compatible("1.0")),
        plugin("X", "1.0").with_dep("Y", above("1.0")),
        plugin("Y", "1.0").with_dep("D", above("1.0")),
        plugin("D", "1.0").with_dep("C", compatible("2.0")),
        plugin("C", "1.0"),
        plugin("C", "2.0"),
    ]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("A"), PluginCommand::add("X")], &v("2.0"))
        .await;

    assert_eq!(
        resolution.problems,
        vec![Problem::Conflict {
            plugin: "D".into(),
            dependency: "C".into(),
            taken: v("1.0"),
            required: compatible("2.0"),
        }]
    );
    assert_eq!(
        loaded(&resolution),
        vec!["A@1.0", "C@1.0", "D@1.0", "X@1.0", "Y@1.0"]
    );
    assert_eq!(repository.fetch_count("C"), 1);
}

#[tokio::test]
async fn test_highest_requirement_wins_within_a_round() {
    let repository = Arc::new(FakeRepository::new([
        plugin("A", "1.0").with_dep("C", above("1.0")),
        plugin("B", "1.0").with_dep("C", above("1.5")),
        plugin("C", "1.0"),
        plugin("C", "1.5"),
    ]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("A"), PluginCommand::add("B")], &v("2.0"))
        .await;

    assert!(resolution.is_clean());
    assert_eq!(loaded(&resolution), vec!["A@1.0", "B@1.0", "C@1.5"]);
}

#[tokio::test]
async fn test_removed_plugin_and_its_subtree_are_never_fetched() {
    let repository = Arc::new(FakeRepository::new([
        plugin("A", "1.0").with_dep("X", above("1.0")),
        plugin("B", "1.0"),
        plugin("X", "1.0").with_dep("Z", above("1.0")),
        plugin("Z", "1.0"),
    ]));

    let resolution = resolver(&repository)
        .resolve_workspace(
            &[
                PluginCommand::add("A"),
                PluginCommand::add("B"),
                PluginCommand::remove("X"),
            ],
            &v("2.0"),
        )
        .await;

    // A needs the removed X, so it is dropped without a problem.
    assert!(resolution.is_clean());
    assert_eq!(loaded(&resolution), vec!["B@1.0"]);
    assert_eq!(repository.fetch_count("X"), 0);
    assert_eq!(repository.fetch_count("Z"), 0);
}

#[tokio::test]
async fn test_same_round_dependency_is_fetched_again_at_required_version() {
    // Latest B for ship 2.0 is 2.0, but A needs ^3.0. Both are fetched in
    // round one, so B is not resolved yet and round two fetches B 3.0.
    let repository = Arc::new(FakeRepository::new([
        plugin("A", "1.0").with_dep("B", compatible("3.0")),
        plugin("B", "2.0"),
        plugin("B", "3.0").with_ship_range(bundle_model::ShipVersionRange::new(v("5.0"), v("5.9"))),
    ]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("A"), PluginCommand::add("B")], &v("2.0"))
        .await;

    assert!(resolution.is_clean(), "problems: {:?}", resolution.problems);
    assert_eq!(loaded(&resolution), vec!["A@1.0", "B@3.0"]);
    assert_eq!(
        repository.fetches(),
        vec![
            (PluginName::new("A"), v("1.0")),
            (PluginName::new("B"), v("2.0")),
            (PluginName::new("B"), v("3.0")),
        ]
    );
}

#[tokio::test]
async fn test_add_after_remove_is_still_forbidden() {
    let repository = Arc::new(FakeRepository::new([plugin("A", "1.0")]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::remove("A"), PluginCommand::add("A")], &v("2.0"))
        .await;

    assert!(resolution.is_clean());
    assert!(resolution.config.bundles_to_load.is_empty());
    assert!(repository.fetches().is_empty());
}

#[tokio::test]
async fn test_broken_chain_drops_only_its_top_level_plugin() {
    let repository = Arc::new(FakeRepository::new([
        plugin("P", "1.0").with_dep("Q", above("1.0")),
        plugin("Q", "1.0").with_dep("Missing", above("1.0")),
        plugin("R", "1.0"),
    ]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("P"), PluginCommand::add("R")], &v("2.0"))
        .await;

    assert_eq!(
        resolution.problems,
        vec![Problem::PluginNotFound {
            name: "Missing".into()
        }]
    );
    assert_eq!(loaded(&resolution), vec!["R@1.0"]);
}

#[tokio::test]
async fn test_fetch_failure_is_isolated() {
    let repository = Arc::new(
        FakeRepository::new([
            plugin("A", "1.0").with_dep("F", above("1.0")),
            plugin("B", "1.0").with_dep("G", above("1.0")),
            plugin("F", "1.0"),
            plugin("G", "1.0"),
        ])
        .failing("F"),
    );

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("A"), PluginCommand::add("B")], &v("2.0"))
        .await;

    assert_eq!(resolution.problems.len(), 1);
    match &resolution.problems[0] {
        Problem::FetchIssue { plugin, cause } => {
            assert_eq!(plugin.as_str(), "F");
            assert!(cause.contains("cannot download F"), "cause: {cause}");
        }
        other => panic!("unexpected problem: {other:?}"),
    }
    assert_eq!(loaded(&resolution), vec!["B@1.0", "G@1.0"]);
}

#[tokio::test(start_paused = true)]
async fn test_round_fetches_run_concurrently() {
    let second = Duration::from_secs(1);
    let repository = Arc::new(
        FakeRepository::new([
            plugin("A", "1.0"),
            plugin("B", "1.0"),
            plugin("C", "1.0"),
            plugin("D", "1.0"),
        ])
        .delayed("A", second)
        .delayed("B", second)
        .delayed("C", second)
        .delayed("D", second)
        .failing("D"),
    );

    let started = tokio::time::Instant::now();
    let resolution = resolver(&repository)
        .resolve_workspace(
            &[
                PluginCommand::add("A"),
                PluginCommand::add("B"),
                PluginCommand::add("C"),
                PluginCommand::add("D"),
            ],
            &v("2.0"),
        )
        .await;
    let elapsed = started.elapsed();

    assert!(elapsed >= second, "elapsed: {elapsed:?}");
    assert!(elapsed < second * 2, "fetches were serialized: {elapsed:?}");
    assert_eq!(loaded(&resolution), vec!["A@1.0", "B@1.0", "C@1.0"]);
    assert_eq!(resolution.problems.len(), 1);
}

#[tokio::test]
async fn test_diamond_fetches_shared_dependency_once() {
    let repository = Arc::new(FakeRepository::new([
        plugin("A", "1.0")
            .with_dep("B", above("1.0"))
            .with_dep("C", above("1.0")),
        plugin("B", "1.0").with_dep("D", above("1.0")),
        plugin("C", "1.0").with_dep("D", above("1.0")),
        plugin("D", "1.0"),
    ]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("A")], &v("2.0"))
        .await;

    assert!(resolution.is_clean());
    assert_eq!(loaded(&resolution).len(), 4);
    assert_eq!(repository.fetch_count("D"), 1);
}

#[tokio::test]
async fn test_pinned_version_is_fetched_exactly() {
    let repository = Arc::new(FakeRepository::new([plugin("A", "1.0"), plugin("A", "1.2")]));
    let resolver = resolver(&repository);

    let latest = resolver
        .resolve_workspace(&[PluginCommand::add("A")], &v("2.0"))
        .await;
    assert_eq!(loaded(&latest), vec!["A@1.2"]);

    let pinned = resolver
        .resolve_workspace(&[PluginCommand::add_pinned("A", v("1.0"))], &v("2.0"))
        .await;
    assert_eq!(loaded(&pinned), vec!["A@1.0"]);
}

#[tokio::test]
async fn test_unknown_and_incompatible_plugins_are_not_found() {
    let repository = Arc::new(FakeRepository::new([plugin("Old", "1.0").with_ship_range(
        bundle_model::ShipVersionRange::new(v("1.0"), v("1.9")),
    )]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("Ghost"), PluginCommand::add("Old")], &v("2.0"))
        .await;

    assert_eq!(
        resolution.problems,
        vec![
            Problem::PluginNotFound {
                name: "Ghost".into()
            },
            Problem::PluginNotFound { name: "Old".into() },
        ]
    );
    assert!(resolution.config.bundles_to_load.is_empty());
}

#[tokio::test]
async fn test_pinned_missing_version_is_not_found() {
    let repository = Arc::new(FakeRepository::new([plugin("A", "1.0")]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add_pinned("A", v("1.5"))], &v("2.0"))
        .await;

    assert_eq!(
        resolution.problems,
        vec![Problem::PluginNotFound { name: "A".into() }]
    );
}

#[tokio::test]
async fn test_latest_lookup_failure_keeps_pinned_plugins() {
    let repository = Arc::new(
        FakeRepository::new([plugin("A", "1.0"), plugin("B", "1.0")]).failing_latest(),
    );

    let resolution = resolver(&repository)
        .resolve_workspace(
            &[
                PluginCommand::add("A"),
                PluginCommand::add_pinned("B", v("1.0")),
            ],
            &v("2.0"),
        )
        .await;

    assert_eq!(loaded(&resolution), vec!["B@1.0"]);
    assert!(matches!(
        &resolution.problems[..],
        [Problem::FetchIssue { plugin, .. }] if plugin.as_str() == "A"
    ));
}

#[tokio::test]
async fn test_drop_frontend_only_setting() {
    let plugins = [
        plugin("A", "1.0"),
        plugin("F", "1.0").frontend_only(),
    ];
    let commands = [PluginCommand::add("A"), PluginCommand::add("F")];

    let repository = Arc::new(FakeRepository::new(plugins.clone()));
    let keep = resolver(&repository)
        .resolve_workspace(&commands, &v("2.0"))
        .await;
    assert_eq!(loaded(&keep), vec!["A@1.0", "F@1.0"]);

    let dropping = DependencyResolver::with_settings(
        Arc::new(FakeRepository::new(plugins)),
        ResolverSettings {
            drop_frontend_only: true,
        },
    );
    let dropped = dropping.resolve_workspace(&commands, &v("2.0")).await;
    assert_eq!(loaded(&dropped), vec!["A@1.0"]);
    assert!(dropped.is_clean());
}

#[tokio::test]
async fn test_dependency_cycle_terminates() {
    let repository = Arc::new(FakeRepository::new([
        plugin("A", "1.0").with_dep("B", above("1.0")),
        plugin("B", "1.0").with_dep("A", above("1.0")),
    ]));

    let resolution = resolver(&repository)
        .resolve_workspace(&[PluginCommand::add("A")], &v("2.0"))
        .await;

    assert!(resolution.is_clean());
    assert_eq!(loaded(&resolution), vec!["A@1.0", "B@1.0"]);
    assert_eq!(repository.fetches().len(), 2);
}

/// Build an acyclic graph where plugin `i` may only depend on plugins `j > i`.
fn dag(edges: &[Vec<bool>]) -> Vec<bundle_model::PluginDescriptor> {
    let n = edges.len();
    (0..n)
        .map(|i| {
            (i + 1..n)
                .filter(|&j| edges[i][j])
                .fold(plugin(&format!("p{i}"), "1.0"), |d, j| {
                    d.with_dep(format!("p{j}").as_str(), above("1.0"))
                })
        })
        .collect()
}

fn reachable(edges: &[Vec<bool>]) -> BTreeSet<PluginName> {
    let n = edges.len();
    let mut seen = BTreeSet::from([0usize]);
    let mut stack = vec![0usize];
    while let Some(i) = stack.pop() {
        for j in i + 1..n {
            if edges[i][j] && seen.insert(j) {
                stack.push(j);
            }
        }
    }
    seen.into_iter().map(|i| PluginName::new(format!("p{i}"))).collect()
}

proptest! {
    #[test]
    fn prop_acyclic_graphs_resolve_completely(
        edges in prop::collection::vec(prop::collection::vec(any::<bool>(), 10), 10)
    ) {
        let repository = Arc::new(FakeRepository::new(dag(&edges)));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let resolution = runtime.block_on(
            resolver(&repository).resolve_workspace(&[PluginCommand::add("p0")], &v("2.0")),
        );

        let names: BTreeSet<PluginName> = resolution.config.names().cloned().collect();
        prop_assert!(resolution.is_clean());
        prop_assert_eq!(names, reachable(&edges));
        // A plugin is fetched again at most once, when a sibling of the same
        // round depends on it.
        for (name, _) in repository.fetches() {
            prop_assert!(repository.fetch_count(name.as_str()) <= 2);
        }
    }
}
