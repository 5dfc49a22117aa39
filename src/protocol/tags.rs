// ABOUTME: One-byte tags of the deployment plan wire protocol.
// ABOUTME: Values are fixed for interoperability with existing controllers.

use std::fmt;

use super::error::ProtocolError;

/// A protocol tag. Each tag precedes one marshalled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    ExecuteDeploymentPlanRequest = 0x30,
    ParamDeploymentPlan = 0x31,
    PlanId = 0x40,
    PlanInvalid = 0x41,
    SetId = 0x42,
    ActionId = 0x43,
    ActionModelResult = 0x44,
    ServerDeployment = 0x45,
    HostName = 0x46,
    ServerGroupName = 0x47,
    ServerName = 0x48,
    ServerResult = 0x49,
    SetRollback = 0x4A,
    ServerRollback = 0x4B,
    PlanComplete = 0x4C,
}

impl Tag {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::ExecuteDeploymentPlanRequest => "EXECUTE_DEPLOYMENT_PLAN_REQUEST",
            Tag::ParamDeploymentPlan => "PARAM_DEPLOYMENT_PLAN",
            Tag::PlanId => "PLAN_ID",
            Tag::PlanInvalid => "PLAN_INVALID",
            Tag::SetId => "SET_ID",
            Tag::ActionId => "ACTION_ID",
            Tag::ActionModelResult => "ACTION_MODEL_RESULT",
            Tag::ServerDeployment => "SERVER_DEPLOYMENT",
            Tag::HostName => "HOST_NAME",
            Tag::ServerGroupName => "SERVER_GROUP_NAME",
            Tag::ServerName => "SERVER_NAME",
            Tag::ServerResult => "SERVER_RESULT",
            Tag::SetRollback => "SET_ROLLBACK",
            Tag::ServerRollback => "SERVER_ROLLBACK",
            Tag::PlanComplete => "PLAN_COMPLETE",
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let tag = match value {
            0x30 => Tag::ExecuteDeploymentPlanRequest,
            0x31 => Tag::ParamDeploymentPlan,
            0x40 => Tag::PlanId,
            0x41 => Tag::PlanInvalid,
            0x42 => Tag::SetId,
            0x43 => Tag::ActionId,
            0x44 => Tag::ActionModelResult,
            0x45 => Tag::ServerDeployment,
            0x46 => Tag::HostName,
            0x47 => Tag::ServerGroupName,
            0x48 => Tag::ServerName,
            0x49 => Tag::ServerResult,
            0x4A => Tag::SetRollback,
            0x4B => Tag::ServerRollback,
            0x4C => Tag::PlanComplete,
            other => return Err(ProtocolError::UnknownTag(other)),
        };
        Ok(tag)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_tags_are_contiguous_from_0x40() {
        assert_eq!(Tag::PlanId.as_u8(), 0x40);
        assert_eq!(Tag::PlanComplete.as_u8(), 0x4C);
        assert_eq!(Tag::try_from(0x4A).unwrap(), Tag::SetRollback);
    }

    #[test]
    fn unknown_byte_is_rejected() {
        assert_eq!(Tag::try_from(0x7F), Err(ProtocolError::UnknownTag(0x7F)));
    }
}
