//! Domain layer: entities, value objects and the ports the application
//! layer drives.

pub mod catalog;
pub mod entitlement;
pub mod hierarchy;
pub mod ledger;
pub mod notification;
pub mod ports;
pub mod session;
pub mod validation;
