//! Screen implementations

pub mod home;
pub mod overlay;
