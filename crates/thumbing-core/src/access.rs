//! Least-privilege access policies.
//!
//! The resize worker only ever sees the store through a `ScopedStore`
//! carrying `AccessPolicy::read_write(bucket)`: `GetObject` and `PutObject`
//! on `<bucket>/*` and nothing else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Object-level actions a policy can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    GetObject,
    PutObject,
    DeleteObject,
    ListBucket,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::GetObject => "GetObject",
            Action::PutObject => "PutObject",
            Action::DeleteObject => "DeleteObject",
            Action::ListBucket => "ListBucket",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
}

/// One grant: a set of actions on a set of resource patterns.
///
/// A resource pattern is either an exact `bucket/key` or ends in `*`, which
/// matches any suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: Effect,
    pub action: BTreeSet<Action>,
    pub resource: Vec<String>,
}

/// An immutable set of grants for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    principal: String,
    statements: Vec<Statement>,
}

impl AccessPolicy {
    /// Read/write on every object in `bucket`, for the resize worker.
    pub fn read_write(principal: impl Into<String>, bucket: &str) -> Self {
        Self {
            principal: principal.into(),
            statements: vec![Statement {
                effect: Effect::Allow,
                action: [Action::GetObject, Action::PutObject].into_iter().collect(),
                resource: vec![format!("{bucket}/*")],
            }],
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Every action granted on any resource.
    pub fn granted_actions(&self) -> BTreeSet<Action> {
        self.statements
            .iter()
            .flat_map(|s| s.action.iter().copied())
            .collect()
    }

    /// Every resource pattern mentioned by a grant.
    pub fn resources(&self) -> BTreeSet<&str> {
        self.statements
            .iter()
            .flat_map(|s| s.resource.iter().map(String::as_str))
            .collect()
    }

    /// Whether `action` on `resource` (`bucket/key`) is allowed.
    pub fn allows(&self, action: Action, resource: &str) -> bool {
        self.statements.iter().any(|s| {
            s.effect == Effect::Allow
                && s.action.contains(&action)
                && s.resource.iter().any(|p| pattern_matches(p, resource))
        })
    }

    /// Pretty JSON document in the shape cloud IAM policies use.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn pattern_matches(pattern: &str, resource: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => resource.starts_with(prefix),
        None => pattern == resource,
    }
}
