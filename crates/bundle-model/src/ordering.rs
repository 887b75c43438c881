//! Topological ordering of layers.
//!
//! Ordering walks the dependency relation depth-first with an explicit
//! stack. Each node is marked in-progress when entered and stamped with an
//! increasing timestamp when all of its dependencies are done, so sorting
//! by timestamp yields dependencies first.
//!
//! # Example
//!
//! ```
//! use bundle_model::layer::LayerSelector;
//! use bundle_model::ordering::sort_by_internal_dependencies;
//!
//! let order = sort_by_internal_dependencies(&[
//!     LayerSelector::FrontendImpl,
//!     LayerSelector::FrontendApi,
//!     LayerSelector::CommonApi,
//! ])
//! .unwrap();
//! assert_eq!(order[0], LayerSelector::CommonApi);
//! assert_eq!(order[2], LayerSelector::FrontendImpl);
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::layer::LayerSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done(u64),
}

/// Sort layer selectors so that every layer comes after the layers it
/// depends on within the same plugin.
///
/// # Errors
///
/// Returns [`Error::CyclicDependency`] if the layer table contains a cycle.
pub fn sort_by_internal_dependencies(selectors: &[LayerSelector]) -> Result<Vec<LayerSelector>> {
    sort_topologically(selectors, |selector| {
        selector.internal_dependencies().iter().copied()
    })
}

/// Sort `items` dependencies-first according to `dependencies`.
///
/// Only members of `items` are returned (duplicates collapse to one).
/// Dependencies outside `items` are still walked, so a cycle anywhere
/// reachable from the input is reported.
///
/// # Errors
///
/// Returns [`Error::CyclicDependency`] with the offending path rendered as
/// `A <- B <- C <- A`, followed by the nodes that led into the cycle.
pub fn sort_topologically<T, F, I>(items: &[T], dependencies: F) -> Result<Vec<T>>
where
    T: Clone + Eq + Hash + Display,
    F: Fn(&T) -> I,
    I: IntoIterator<Item = T>,
{
    let mut marks: HashMap<T, Mark> = HashMap::new();
    let mut clock: u64 = 0;

    for start in items {
        if marks.contains_key(start) {
            continue;
        }

        let mut stack: Vec<(T, std::vec::IntoIter<T>)> = Vec::new();
        marks.insert(start.clone(), Mark::InProgress);
        stack.push((start.clone(), pending(&dependencies, start)));

        loop {
            let Some((_, deps)) = stack.last_mut() else {
                break;
            };

            if let Some(dep) = deps.next() {
                match marks.get(&dep) {
                    None => {
                        marks.insert(dep.clone(), Mark::InProgress);
                        let next = pending(&dependencies, &dep);
                        stack.push((dep, next));
                    }
                    Some(Mark::InProgress) => {
                        let path: Vec<&T> = stack.iter().map(|(node, _)| node).collect();
                        return Err(Error::CyclicDependency {
                            path: render_cycle(&path, &dep),
                        });
                    }
                    Some(Mark::Done(_)) => {}
                }
                continue;
            }

            if let Some((node, _)) = stack.pop() {
                clock += 1;
                marks.insert(node, Mark::Done(clock));
            }
        }
    }

    let mut stamped: Vec<(u64, T)> = items
        .iter()
        .filter_map(|item| match marks.get(item) {
            Some(Mark::Done(stamp)) => Some((*stamp, item.clone())),
            _ => None,
        })
        .collect();
    stamped.sort_by_key(|(stamp, _)| *stamp);
    stamped.dedup_by_key(|(stamp, _)| *stamp);

    Ok(stamped.into_iter().map(|(_, item)| item).collect())
}

fn pending<T, F, I>(dependencies: &F, node: &T) -> std::vec::IntoIter<T>
where
    F: Fn(&T) -> I,
    I: IntoIterator<Item = T>,
{
    dependencies(node).into_iter().collect::<Vec<_>>().into_iter()
}

fn render_cycle<T: Display + PartialEq>(stack: &[&T], revisited: &T) -> String {
    let start = stack
        .iter()
        .position(|node| *node == revisited)
        .unwrap_or(0);

    let mut path: Vec<String> = stack[start..].iter().map(|node| node.to_string()).collect();
    path.push(revisited.to_string());
    path.extend(stack[..start].iter().rev().map(|node| node.to_string()));
    path.join(" <- ")
}
