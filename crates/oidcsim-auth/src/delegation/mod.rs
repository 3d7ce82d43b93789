//! Delegations: persisted consent records and the consent decisions that
//! create them.

pub mod consent;
#[allow(clippy::module_inception)]
pub mod delegation;

pub use consent::{ConsentGrantee, ConsentRequest, ConsentType, SubjectSelector};
pub use delegation::{Delegation, DelegationId};
