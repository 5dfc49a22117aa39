// ABOUTME: Phantom-typed UUID identifiers for plans, sets, and actions.
// ABOUTME: Prevents a set id from being passed where an action id is expected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use uuid::Uuid;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum PlanMarker {}
pub enum SetMarker {}
pub enum ActionMarker {}

/// A type-safe identifier that prevents accidental mixing of different ID types.
///
/// Every identifier is a UUID on the wire; the phantom parameter only exists
/// at compile time, so a `SetId` can never be looked up in an action table.
///
/// ```compile_fail
/// use rollplan::types::{ActionId, SetId};
///
/// fn takes_action(_id: ActionId) {}
/// takes_action(SetId::random());
/// ```
#[must_use = "IDs correlate wire records and should not be ignored"]
pub struct Id<T> {
    value: Uuid,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: Uuid) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Generate a fresh random (v4) identifier.
    pub fn random() -> Self {
        Self::new(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.value
    }

    pub fn into_inner(self) -> Uuid {
        self.value
    }
}

// Manual trait implementations that don't require T to implement the trait.
// T is only used as a phantom type marker.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<Uuid> for Id<T> {
    fn from(value: Uuid) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Uuid::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type PlanId = Id<PlanMarker>;
pub type SetId = Id<SetMarker>;
pub type ActionId = Id<ActionMarker>;
