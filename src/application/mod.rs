//! Application layer: the hierarchy resolver behind the screen forms, the
//! purchase workflow and the session that ties a ledger to one user.

pub mod entitlement;
pub mod hierarchy;
pub mod session;
