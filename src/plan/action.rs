// ABOUTME: Immutable deployment actions and the catalog of constructors for each kind.
// ABOUTME: Constructors enforce per-kind invariants, so a built action is always well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::content::ContentHash;
use crate::types::{ActionId, UnitName};

/// The kind of change an action applies to a deployment unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Deploy,
    Redeploy,
    Undeploy,
    Replace,
    FullReplace,
    Remove,
}

impl ActionKind {
    /// Whether the action carries uploaded content.
    pub fn carries_content(&self) -> bool {
        matches!(self, ActionKind::Add | ActionKind::FullReplace)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Deploy => "deploy",
            ActionKind::Redeploy => "redeploy",
            ActionKind::Undeploy => "undeploy",
            ActionKind::Replace => "replace",
            ActionKind::FullReplace => "full_replace",
            ActionKind::Remove => "remove",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of change against a named deployable artifact.
///
/// Identity is the `id`; two actions with identical fields are still
/// different actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ActionRecord", into = "ActionRecord")]
pub struct DeploymentAction {
    id: ActionId,
    kind: ActionKind,
    unit_name: UnitName,
    replaced_unit_name: Option<UnitName>,
    content_file_name: Option<String>,
    content_hash: Option<ContentHash>,
    policy: Option<String>,
}

impl DeploymentAction {
    fn simple(kind: ActionKind, unit_name: UnitName) -> Self {
        Self {
            id: ActionId::random(),
            kind,
            unit_name,
            replaced_unit_name: None,
            content_file_name: None,
            content_hash: None,
            policy: None,
        }
    }

    fn with_content(
        kind: ActionKind,
        unit_name: UnitName,
        content_file_name: String,
        content_hash: ContentHash,
    ) -> Self {
        Self {
            content_file_name: Some(content_file_name),
            content_hash: Some(content_hash),
            ..Self::simple(kind, unit_name)
        }
    }

    /// Add uploaded content to the domain repository.
    pub fn add(unit_name: UnitName, content_file_name: String, content_hash: ContentHash) -> Self {
        Self::with_content(ActionKind::Add, unit_name, content_file_name, content_hash)
    }

    pub fn deploy(unit_name: UnitName) -> Self {
        Self::simple(ActionKind::Deploy, unit_name)
    }

    pub fn deploy_with_policy(unit_name: UnitName, policy: impl Into<String>) -> Self {
        Self {
            policy: Some(policy.into()),
            ..Self::simple(ActionKind::Deploy, unit_name)
        }
    }

    pub fn redeploy(unit_name: UnitName) -> Self {
        Self::simple(ActionKind::Redeploy, unit_name)
    }

    pub fn undeploy(unit_name: UnitName) -> Self {
        Self::simple(ActionKind::Undeploy, unit_name)
    }

    /// Deploy `unit_name` in place of the deployed `replaced`.
    pub fn replace(unit_name: UnitName, replaced: UnitName) -> Self {
        Self {
            replaced_unit_name: Some(replaced),
            ..Self::simple(ActionKind::Replace, unit_name)
        }
    }

    /// Replace the content of `unit_name` with new content of the same name.
    pub fn full_replace(
        unit_name: UnitName,
        content_file_name: String,
        content_hash: ContentHash,
    ) -> Self {
        Self::with_content(
            ActionKind::FullReplace,
            unit_name,
            content_file_name,
            content_hash,
        )
    }

    pub fn remove(unit_name: UnitName) -> Self {
        Self::simple(ActionKind::Remove, unit_name)
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn unit_name(&self) -> &UnitName {
        &self.unit_name
    }

    pub fn replaced_unit_name(&self) -> Option<&UnitName> {
        self.replaced_unit_name.as_ref()
    }

    pub fn content_file_name(&self) -> Option<&str> {
        self.content_file_name.as_deref()
    }

    pub fn content_hash(&self) -> Option<&ContentHash> {
        self.content_hash.as_ref()
    }

    pub fn policy(&self) -> Option<&str> {
        self.policy.as_deref()
    }
}

impl fmt::Display for DeploymentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.replaced_unit_name {
            Some(replaced) => write!(f, "{} {} (replacing {})", self.kind, self.unit_name, replaced),
            None => write!(f, "{} {}", self.kind, self.unit_name),
        }
    }
}

/// Serialized form; validated on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActionRecord {
    id: ActionId,
    kind: ActionKind,
    unit_name: UnitName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    replaced_unit_name: Option<UnitName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    policy: Option<String>,
}

impl TryFrom<ActionRecord> for DeploymentAction {
    type Error = String;

    fn try_from(record: ActionRecord) -> Result<Self, Self::Error> {
        if record.kind.carries_content()
            && (record.content_file_name.is_none() || record.content_hash.is_none())
        {
            return Err(format!(
                "{} action for {} requires content name and hash",
                record.kind, record.unit_name
            ));
        }
        if record.kind == ActionKind::Replace && record.replaced_unit_name.is_none() {
            return Err(format!(
                "replace action for {} requires the unit being replaced",
                record.unit_name
            ));
        }

        Ok(Self {
            id: record.id,
            kind: record.kind,
            unit_name: record.unit_name,
            replaced_unit_name: record.replaced_unit_name,
            content_file_name: record.content_file_name,
            content_hash: record.content_hash,
            policy: record.policy,
        })
    }
}

impl From<DeploymentAction> for ActionRecord {
    fn from(action: DeploymentAction) -> Self {
        Self {
            id: action.id,
            kind: action.kind,
            unit_name: action.unit_name,
            replaced_unit_name: action.replaced_unit_name,
            content_file_name: action.content_file_name,
            content_hash: action.content_hash,
            policy: action.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str) -> UnitName {
        UnitName::new(name).unwrap()
    }

    #[test]
    fn add_carries_content() {
        let hash = ContentHash::new(vec![1, 2, 3]);
        let action = DeploymentAction::add(unit("app"), "app.war".into(), hash.clone());
        assert_eq!(action.kind(), ActionKind::Add);
        assert_eq!(action.content_file_name(), Some("app.war"));
        assert_eq!(action.content_hash(), Some(&hash));
    }

    #[test]
    fn every_action_gets_a_fresh_id() {
        let a = DeploymentAction::deploy(unit("app.war"));
        let b = DeploymentAction::deploy(unit("app.war"));
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn replace_records_replaced_unit() {
        let action = DeploymentAction::replace(unit("new.war"), unit("old.war"));
        assert_eq!(action.replaced_unit_name().map(UnitName::as_str), Some("old.war"));
        assert_eq!(action.to_string(), "replace new.war (replacing old.war)");
    }

    #[test]
    fn deserialization_rejects_add_without_content() {
        let json = format!(
            r#"{{"id":"{}","kind":"add","unit_name":"app.war"}}"#,
            ActionId::random()
        );
        let err = serde_json::from_str::<DeploymentAction>(&json).unwrap_err();
        assert!(err.to_string().contains("requires content"));
    }

    #[test]
    fn deserialization_rejects_replace_without_target() {
        let json = format!(
            r#"{{"id":"{}","kind":"replace","unit_name":"new.war"}}"#,
            ActionId::random()
        );
        assert!(serde_json::from_str::<DeploymentAction>(&json).is_err());
    }

    #[test]
    fn serialized_action_preserves_id() {
        let action = DeploymentAction::deploy_with_policy(unit("app.war"), "eager");
        let json = serde_json::to_string(&action).unwrap();
        let back: DeploymentAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
        assert_eq!(back.policy(), Some("eager"));
    }
}
