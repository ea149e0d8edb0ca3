use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PreconditionError;

pub const PLACEHOLDER_WORKSPACE_NAME: &str = "Your Workspace";

/// Tenant identifier supplied by the caller's navigation context. Never synthesized.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn parse(raw: Option<&str>) -> Result<Self, PreconditionError> {
        match raw.map(str::trim) {
            Some(value) if !value.is_empty() => Ok(Self(value.to_owned())),
            _ => Err(PreconditionError::MissingWorkspaceId),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_id: String,
    pub workspace_name: String,
}

impl Workspace {
    pub fn placeholder(workspace_id: &WorkspaceId) -> Self {
        Self {
            workspace_id: workspace_id.as_str().to_owned(),
            workspace_name: PLACEHOLDER_WORKSPACE_NAME.to_owned(),
        }
    }
}
