//! idlelock TUI library
//!
//! Terminal front end for the idle lock: the activity surface that feeds
//! interactions to the controller, the lock overlay, and a PIN-based
//! authentication gateway.

pub mod app;
pub mod auth;
pub mod surface;
pub mod ui;

pub use app::App;
