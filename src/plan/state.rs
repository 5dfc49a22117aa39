// ABOUTME: Builder phase marker types for the type state pattern.
// ABOUTME: Each phase exposes only the directives legal at that point of plan composition.

use crate::types::UnitName;

use super::sealed::Sealed;

/// Start of a deployment set: plan- and set-level directives, then actions.
/// Available actions: `with_*` directives, all action directives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Initial;

/// Content was just added.
/// Available actions: `and_deploy()`, `and_replace()`, action directives, `to_server_group()`
#[derive(Debug, Clone)]
pub struct Added {
    pub(crate) unit: UnitName,
}

/// A unit was just undeployed.
/// Available actions: `and_remove_undeployed()`, action directives, `to_server_group()`
#[derive(Debug, Clone)]
pub struct Undeployed {
    pub(crate) unit: UnitName,
}

/// A unit was just replaced by another.
/// Available actions: `and_remove_undeployed()`, action directives, `to_server_group()`
#[derive(Debug, Clone)]
pub struct Replaced {
    pub(crate) replaced: UnitName,
}

/// At least one action exists in the current set.
/// Available actions: action directives, `to_server_group()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionsComplete;

/// A server group was just scoped.
/// Available actions: rollout policy directives, `to_server_group()`,
/// `rolling_to_next_group()`, `new_deployment_set()`, `build()`
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupScoped;

/// Phases that accept action directives.
///
/// `GroupScoped` accepts them syntactically so that the ordering rule is
/// reported as an `InvalidPlanState` error rather than a missing method.
pub trait ActionPhase: Sealed + Clone {}

/// Phases from which the current set can be scoped to a server group.
pub trait ScopePhase: Sealed + Clone {}

impl Sealed for Initial {}
impl Sealed for Added {}
impl Sealed for Undeployed {}
impl Sealed for Replaced {}
impl Sealed for ActionsComplete {}
impl Sealed for GroupScoped {}

impl ActionPhase for Initial {}
impl ActionPhase for Added {}
impl ActionPhase for Undeployed {}
impl ActionPhase for Replaced {}
impl ActionPhase for ActionsComplete {}
impl ActionPhase for GroupScoped {}

impl ScopePhase for Added {}
impl ScopePhase for Undeployed {}
impl ScopePhase for Replaced {}
impl ScopePhase for ActionsComplete {}
impl ScopePhase for GroupScoped {}
