//! One round of resolution: fetch the front, inspect dependencies, compute
//! the next front.

use std::collections::{BTreeMap, BTreeSet};

use bundle_model::{PluginDescriptor, PluginName, PluginVersion, VersionRequirement};
use futures::future::join_all;

use crate::repository::PluginRepository;
use crate::resolution::Problem;

/// Plugins awaiting resolution, with the version to fetch.
pub(crate) type Front = BTreeMap<PluginName, PluginVersion>;

/// Plugins resolved so far, by name.
pub(crate) type Resolved = BTreeMap<PluginName, PluginDescriptor>;

/// How a round treats the descriptors it fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrontPolicy {
    /// Resolve against the repository alone.
    Workspace { drop_frontend_only: bool },
    /// Resolve frontend-only plugins on top of a fixed base layer.
    Frontend,
}

/// State a round reads but does not modify.
pub(crate) struct RoundContext<'a> {
    pub resolved: &'a Resolved,
    pub concrete: &'a Resolved,
    pub requested: &'a BTreeSet<PluginName>,
}

#[derive(Debug, Default)]
pub(crate) struct FrontStep {
    pub resolved: Resolved,
    pub problems: Vec<Problem>,
    pub next_front: Front,
}

impl FrontStep {
    /// Record that `requester` needs `dependency` at `requirement`, given
    /// what earlier rounds resolved. Unresolved dependencies are collected
    /// for the next round, keeping the highest required version. A plugin
    /// fetched in this same round counts as unresolved.
    fn require(
        &mut self,
        requester: &PluginName,
        dependency: &PluginName,
        requirement: &VersionRequirement,
        taken: Option<&PluginDescriptor>,
    ) {
        match taken {
            None => {
                let wanted = requirement.version();
                match self.next_front.get(dependency) {
                    Some(current) if current >= wanted => {}
                    _ => {
                        self.next_front.insert(dependency.clone(), wanted.clone());
                    }
                }
            }
            Some(taken) if taken.version.satisfies(requirement) => {}
            Some(taken) => {
                tracing::debug!(
                    plugin = %requester,
                    %dependency,
                    taken = %taken.version,
                    %requirement,
                    "Version conflict"
                );
                self.problems.push(Problem::Conflict {
                    plugin: requester.clone(),
                    dependency: dependency.clone(),
                    taken: taken.version.clone(),
                    required: requirement.clone(),
                });
            }
        }
    }
}

impl FrontPolicy {
    pub(crate) async fn resolve_front(
        self,
        repository: &dyn PluginRepository,
        front: &Front,
        context: &RoundContext<'_>,
    ) -> FrontStep {
        let (fetched, mut problems) = fetch_front(repository, front).await;
        let mut step = match self {
            Self::Workspace { drop_frontend_only } => {
                workspace_step(fetched, context, drop_frontend_only)
            }
            Self::Frontend => frontend_step(fetched, context),
        };
        problems.append(&mut step.problems);
        step.problems = problems;
        step
    }
}

/// Fetch every plugin of the front concurrently.
///
/// A failed or missing fetch becomes a problem for that plugin only.
async fn fetch_front(
    repository: &dyn PluginRepository,
    front: &Front,
) -> (Vec<PluginDescriptor>, Vec<Problem>) {
    let fetches = front.iter().map(|(name, version)| async move {
        (name, repository.get_plugin(name, version).await)
    });

    let mut descriptors = Vec::with_capacity(front.len());
    let mut problems = Vec::new();
    for (name, outcome) in join_all(fetches).await {
        match outcome {
            Ok(Some(descriptor)) => descriptors.push(descriptor),
            Ok(None) => {
                tracing::debug!(plugin = %name, version = %front[name], "Plugin not found");
                problems.push(Problem::PluginNotFound { name: name.clone() });
            }
            Err(e) => {
                tracing::debug!(plugin = %name, error = %e, "Fetch failed");
                problems.push(Problem::FetchIssue {
                    plugin: name.clone(),
                    cause: e.to_string(),
                });
            }
        }
    }
    (descriptors, problems)
}

fn into_round(descriptors: impl IntoIterator<Item = PluginDescriptor>) -> Resolved {
    descriptors
        .into_iter()
        .map(|descriptor| (descriptor.name.clone(), descriptor))
        .collect()
}

fn workspace_step(
    fetched: Vec<PluginDescriptor>,
    context: &RoundContext<'_>,
    drop_frontend_only: bool,
) -> FrontStep {
    let this_round = into_round(
        fetched
            .into_iter()
            .filter(|descriptor| !(drop_frontend_only && descriptor.is_frontend_only())),
    );

    let mut step = FrontStep::default();
    for descriptor in this_round.values() {
        for (dependency, requirement) in &descriptor.deps {
            let taken = context.resolved.get(dependency);
            step.require(&descriptor.name, dependency, requirement, taken);
        }
    }
    step.resolved = this_round;
    step
}

fn frontend_step(fetched: Vec<PluginDescriptor>, context: &RoundContext<'_>) -> FrontStep {
    let mut step = FrontStep::default();

    let (frontend, rest): (Vec<_>, Vec<_>) = fetched
        .into_iter()
        .partition(PluginDescriptor::is_frontend_only);
    for descriptor in rest {
        // Requested workspace plugins are handled by the workspace pass. A
        // dependency landing here is missing from the base layer.
        if !context.requested.contains(&descriptor.name) {
            step.problems.push(Problem::PluginNotFound {
                name: descriptor.name,
            });
        }
    }

    let this_round = into_round(frontend);
    for descriptor in this_round.values() {
        for (dependency, requirement) in &descriptor.deps {
            if let Some(base) = context.concrete.get(dependency) {
                if !base.version.satisfies(requirement) {
                    step.problems.push(Problem::Conflict {
                        plugin: descriptor.name.clone(),
                        dependency: dependency.clone(),
                        taken: base.version.clone(),
                        required: requirement.clone(),
                    });
                }
                continue;
            }
            let taken = context.resolved.get(dependency);
            step.require(&descriptor.name, dependency, requirement, taken);
        }
    }
    step.resolved = this_round;
    step
}
