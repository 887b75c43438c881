//! Round-based dependency resolution.
//!
//! Resolution runs in three phases:
//! 1. The requested plugins are seeded with their pinned version or the
//!    latest one compatible with the ship version.
//! 2. Rounds fetch the current front concurrently and derive the next front
//!    from the fetched dependencies, until no plugin is left to fetch.
//! 3. Each requested plugin is walked through the resolved set; one whose
//!    dependency chain is broken is dropped entirely.
//!
//! Version clashes are never backtracked: a version resolved in an earlier
//! round is kept and every later incompatible requirement is reported as a
//! [`Problem::Conflict`]. A dependency fetched in the same round is not yet
//! resolved, so it is queued again at the required version and the later
//! fetch replaces it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bundle_model::{PluginName, PluginVersion};

use crate::command::{Intent, PluginCommand};
use crate::config::ResolverSettings;
use crate::front::{Front, FrontPolicy, Resolved, RoundContext};
use crate::repository::PluginRepository;
use crate::resolution::{Problem, Resolution, ResolvedPluginsConfig};

/// Resolves desired-plugin commands against a repository.
///
/// Holds no state between calls; independent resolutions may run
/// concurrently against the same resolver.
#[derive(Clone)]
pub struct DependencyResolver {
    repository: Arc<dyn PluginRepository>,
    settings: ResolverSettings,
}

impl DependencyResolver {
    pub fn new(repository: Arc<dyn PluginRepository>) -> Self {
        Self::with_settings(repository, ResolverSettings::default())
    }

    pub fn with_settings(repository: Arc<dyn PluginRepository>, settings: ResolverSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<dyn PluginRepository> {
        &self.repository
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolve the workspace plugin set.
    pub async fn resolve_workspace(
        &self,
        commands: &[PluginCommand],
        ship_version: &PluginVersion,
    ) -> Resolution {
        let policy = FrontPolicy::Workspace {
            drop_frontend_only: self.settings.drop_frontend_only,
        };
        self.resolve(commands, ship_version, policy, Resolved::new())
            .await
    }

    /// Resolve frontend-only plugins on top of a workspace resolution.
    ///
    /// Plugins of `workspace` are never fetched again; dependencies on them
    /// are only checked against the versions it already holds.
    pub async fn resolve_frontend(
        &self,
        commands: &[PluginCommand],
        ship_version: &PluginVersion,
        workspace: &ResolvedPluginsConfig,
    ) -> Resolution {
        let concrete: Resolved = workspace
            .by_name()
            .into_iter()
            .map(|(name, descriptor)| (name.clone(), descriptor.clone()))
            .collect();
        self.resolve(commands, ship_version, FrontPolicy::Frontend, concrete)
            .await
    }

    async fn resolve(
        &self,
        commands: &[PluginCommand],
        ship_version: &PluginVersion,
        policy: FrontPolicy,
        concrete: Resolved,
    ) -> Resolution {
        let intent = Intent::from_commands(commands);
        let requested: BTreeSet<PluginName> = intent.active().cloned().collect();
        tracing::debug!(
            repository = %self.repository.presentable_name(),
            requested = requested.len(),
            forbidden = intent.forbidden.len(),
            ?policy,
            "Starting resolution"
        );

        let (mut front, mut problems) = self.seed(&intent, ship_version).await;
        let mut resolved = Resolved::new();
        let mut round = 0usize;

        loop {
            front.retain(|name, _| !intent.is_forbidden(name));
            if front.is_empty() {
                break;
            }
            round += 1;
            tracing::debug!(round, front = front.len(), "Resolving front");

            let context = RoundContext {
                resolved: &resolved,
                concrete: &concrete,
                requested: &requested,
            };
            let step = policy
                .resolve_front(self.repository.as_ref(), &front, &context)
                .await;

            resolved.extend(step.resolved);
            problems.extend(step.problems);
            front = step.next_front;
        }

        let bundles_to_load = prune(&requested, &resolved, &concrete)
            .into_iter()
            .filter_map(|name| resolved.get(&name).cloned())
            .collect();

        tracing::debug!(
            rounds = round,
            resolved = resolved.len(),
            problems = problems.len(),
            "Resolution finished"
        );
        Resolution {
            config: ResolvedPluginsConfig {
                bundles_to_load,
                ship_version: ship_version.clone(),
            },
            problems,
        }
    }

    /// Build the first front from the requested plugins.
    async fn seed(&self, intent: &Intent, ship_version: &PluginVersion) -> (Front, Vec<Problem>) {
        let mut front = Front::new();
        let mut unpinned = BTreeSet::new();
        for (name, version) in &intent.requested {
            if intent.is_forbidden(name) {
                continue;
            }
            match version {
                Some(version) => {
                    front.insert(name.clone(), version.clone());
                }
                None => {
                    unpinned.insert(name.clone());
                }
            }
        }

        let mut problems = Vec::new();
        if unpinned.is_empty() {
            return (front, problems);
        }

        match self
            .repository
            .latest_versions(&unpinned, ship_version)
            .await
        {
            Ok(mut latest) => {
                for name in unpinned {
                    match latest.remove(&name) {
                        Some(version) => {
                            front.insert(name, version);
                        }
                        None => {
                            tracing::debug!(plugin = %name, %ship_version, "No compatible version");
                            problems.push(Problem::PluginNotFound { name });
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Latest version lookup failed");
                let cause = e.to_string();
                problems.extend(unpinned.into_iter().map(|plugin| Problem::FetchIssue {
                    plugin,
                    cause: cause.clone(),
                }));
            }
        }
        (front, problems)
    }
}

impl std::fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("repository", &self.repository.presentable_name())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Names to load: each requested plugin together with its dependency
/// closure, skipping requested plugins whose closure is incomplete.
fn prune(
    requested: &BTreeSet<PluginName>,
    resolved: &Resolved,
    concrete: &Resolved,
) -> BTreeSet<PluginName> {
    let mut keep = BTreeSet::new();
    for name in requested {
        match closure(name, resolved, concrete) {
            Ok(names) => keep.extend(names),
            Err(missing) => {
                tracing::warn!(plugin = %name, %missing, "Dropping plugin with unresolved dependency");
            }
        }
    }
    keep
}

/// Walk the dependencies of `root`, returning the first missing name on
/// failure. Plugins of the base layer are satisfied without contributing;
/// a removed plugin is never resolved and so breaks the walk.
fn closure(
    root: &PluginName,
    resolved: &Resolved,
    concrete: &Resolved,
) -> Result<BTreeSet<PluginName>, PluginName> {
    let mut names = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut stack = vec![root.clone()];

    while let Some(name) = stack.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if concrete.contains_key(&name) {
            continue;
        }
        let Some(descriptor) = resolved.get(&name) else {
            return Err(name);
        };
        stack.extend(
            descriptor
                .deps
                .keys()
                .filter(|dep| !visited.contains(*dep))
                .cloned(),
        );
        names.insert(name);
    }
    Ok(names)
}
