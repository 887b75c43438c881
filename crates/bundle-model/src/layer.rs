//! Layer selectors: the named code partitions of a plugin.
//!
//! Each selector has two fixed dependency tables. The *internal* table says
//! which layers of the same plugin a layer depends on; layer ordering is
//! computed from it. The *external* table says which layers of a dependency
//! plugin a layer may read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of one code partition of a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerSelector {
    Dock,
    FrontendApi,
    FrontendImpl,
    WorkspaceApi,
    WorkspaceImpl,
    CommonApi,
    CommonImpl,
    Test,
    /// Legacy alias predating the api/impl split.
    Frontend,
    /// Legacy alias predating the api/impl split.
    Workspace,
    /// Legacy alias predating the api/impl split.
    Common,
}

use LayerSelector::*;

impl LayerSelector {
    /// Every selector, legacy aliases included.
    pub const ALL: [LayerSelector; 11] = [
        Dock,
        FrontendApi,
        FrontendImpl,
        WorkspaceApi,
        WorkspaceImpl,
        CommonApi,
        CommonImpl,
        Test,
        Frontend,
        Workspace,
        Common,
    ];

    /// Wire key of the selector.
    pub fn as_str(self) -> &'static str {
        match self {
            Dock => "dock",
            FrontendApi => "frontendApi",
            FrontendImpl => "frontendImpl",
            WorkspaceApi => "workspaceApi",
            WorkspaceImpl => "workspaceImpl",
            CommonApi => "commonApi",
            CommonImpl => "commonImpl",
            Test => "test",
            Frontend => "frontend",
            Workspace => "workspace",
            Common => "common",
        }
    }

    pub fn is_legacy(self) -> bool {
        matches!(self, Frontend | Workspace | Common)
    }

    /// Layers of the same plugin this layer depends on.
    pub fn internal_dependencies(self) -> &'static [LayerSelector] {
        match self {
            CommonApi | Common => &[],
            CommonImpl => &[CommonApi],
            WorkspaceApi | FrontendApi => &[CommonApi],
            WorkspaceImpl => &[WorkspaceApi, CommonImpl],
            FrontendImpl => &[FrontendApi, CommonImpl],
            Dock => &[FrontendApi],
            Test => &[FrontendImpl, WorkspaceImpl],
            Frontend | Workspace => &[Common],
        }
    }

    /// Layers of a dependency plugin this layer may read.
    pub fn external_dependencies(self) -> &'static [LayerSelector] {
        match self {
            CommonApi | CommonImpl => &[CommonApi],
            WorkspaceApi | WorkspaceImpl => &[WorkspaceApi, CommonApi],
            FrontendApi => &[FrontendApi, CommonApi],
            FrontendImpl => &[FrontendApi, CommonApi, Dock],
            Dock => &[Dock, FrontendApi],
            Test => &[FrontendApi, WorkspaceApi, CommonApi],
            Common => &[Common],
            Frontend => &[Frontend, Common],
            Workspace => &[Workspace, Common],
        }
    }
}

impl fmt::Display for LayerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|selector| selector.as_str() == s)
            .ok_or_else(|| Error::UnknownLayer(s.to_string()))
    }
}
