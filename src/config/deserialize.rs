// ABOUTME: Custom serde deserializers for plan file types.
// ABOUTME: Turns plain lists into non-empty sets, actions and rollout steps.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::SetConfig;
use super::action::ActionEntry;
use super::rollout::{GroupConfig, GroupEntry};

pub fn deserialize_sets<'de, D>(deserializer: D) -> Result<NonEmpty<SetConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let sets: Vec<SetConfig> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(sets)
        .ok_or_else(|| serde::de::Error::custom("at least one deployment set is required"))
}

pub fn deserialize_actions<'de, D>(deserializer: D) -> Result<NonEmpty<ActionEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let actions: Vec<ActionEntry> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(actions)
        .ok_or_else(|| serde::de::Error::custom("a deployment set needs at least one action"))
}

pub fn deserialize_rollout<'de, D>(
    deserializer: D,
) -> Result<NonEmpty<NonEmpty<GroupConfig>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let steps: Vec<Vec<GroupEntry>> = Vec::deserialize(deserializer)?;
    let steps = steps
        .into_iter()
        .enumerate()
        .map(|(index, entries)| {
            let groups = entries
                .into_iter()
                .map(GroupEntry::into_group_config)
                .collect();
            NonEmpty::from_vec(groups)
                .ok_or_else(|| format!("concurrent set {} of the rollout is empty", index + 1))
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(steps)
        .ok_or_else(|| serde::de::Error::custom("rollout needs at least one server group"))
}
