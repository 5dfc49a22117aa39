// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;
mod server_identity;
mod unit_name;

pub use id::{ActionId, Id, PlanId, SetId};
pub use server_identity::ServerIdentity;
pub use unit_name::{UnitName, UnitNameError};
