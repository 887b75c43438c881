//! Desired-plugin commands and the intent folded from them.

use std::collections::{BTreeMap, BTreeSet};

use bundle_model::{PluginName, PluginVersion};
use serde::{Deserialize, Serialize};

/// One entry of a desired-plugin configuration.
///
/// In TOML: `{ add = "name", version = "1.2" }` or `{ remove = "name" }`.
/// Any other key, or both `add` and `remove` in one entry, is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, try_from = "RawCommand")]
pub enum PluginCommand {
    Add {
        #[serde(rename = "add")]
        name: PluginName,
        /// Exact version to pin; the latest compatible one when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<PluginVersion>,
    },
    Remove {
        #[serde(rename = "remove")]
        name: PluginName,
    },
}

/// Wire shape of a command before the `add`/`remove` choice is checked.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCommand {
    add: Option<PluginName>,
    #[serde(default)]
    version: Option<PluginVersion>,
    remove: Option<PluginName>,
}

impl TryFrom<RawCommand> for PluginCommand {
    type Error = String;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        match (raw.add, raw.remove, raw.version) {
            (Some(name), None, version) => Ok(Self::Add { name, version }),
            (None, Some(name), None) => Ok(Self::Remove { name }),
            (None, Some(name), Some(_)) => {
                Err(format!("'version' cannot be combined with 'remove' ({name})"))
            }
            (Some(add), Some(remove), _) => Err(format!(
                "command has both 'add' ({add}) and 'remove' ({remove})"
            )),
            (None, None, _) => Err("command needs an 'add' or 'remove' key".to_string()),
        }
    }
}

impl PluginCommand {
    pub fn add(name: impl Into<PluginName>) -> Self {
        Self::Add {
            name: name.into(),
            version: None,
        }
    }

    pub fn add_pinned(name: impl Into<PluginName>, version: PluginVersion) -> Self {
        Self::Add {
            name: name.into(),
            version: Some(version),
        }
    }

    pub fn remove(name: impl Into<PluginName>) -> Self {
        Self::Remove { name: name.into() }
    }
}

/// What the commands ask for once folded in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    /// Requested plugins with their pinned version, if any.
    pub requested: BTreeMap<PluginName, Option<PluginVersion>>,
    /// Plugins that must never be installed.
    ///
    /// A later `Add` does not lift a `Remove`; the name stays forbidden.
    pub forbidden: BTreeSet<PluginName>,
}

impl Intent {
    pub fn from_commands(commands: &[PluginCommand]) -> Self {
        commands
            .iter()
            .fold(Intent::default(), |mut intent, command| {
                match command {
                    PluginCommand::Add { name, version } => {
                        intent.requested.insert(name.clone(), version.clone());
                    }
                    PluginCommand::Remove { name } => {
                        intent.requested.remove(name);
                        intent.forbidden.insert(name.clone());
                    }
                }
                intent
            })
    }

    pub fn is_forbidden(&self, name: &PluginName) -> bool {
        self.forbidden.contains(name)
    }

    /// Requested names that are not forbidden.
    pub fn active(&self) -> impl Iterator<Item = &PluginName> {
        self.requested.keys().filter(|name| !self.is_forbidden(name))
    }
}
