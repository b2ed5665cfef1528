//! Dash robot control bridge.
//!
//! This crate choreographs scripted behaviors (movement, light, sound) on a
//! Wonder Workshop "Dash" robot and exposes them over a small HTTP surface.
//! It defines:
//! - [`driver::DashDriver`]: the async contract the vendor hardware transport
//!   must implement, plus a call-recording mock.
//! - [`stack::MovementStack`]: the undo journal; tracked moves and turns are
//!   replayed in reverse with negated magnitudes to roll the robot back.
//! - [`actions`]: the choreography scripts (thinking, celebrating, sulking).
//! - [`robot::RobotSession`]: one driver plus one journal, the unit the HTTP
//!   facade locks per action.
//! - [`server`]: the axum control surface the web frontend talks to.

pub mod actions;
pub mod driver;
pub mod robot;
pub mod server;
pub mod stack;

pub use driver::{DashDriver, DriverError, MockDriver};
pub use robot::RobotSession;
pub use stack::{EmptyStack, Movement, MovementStack};

/// Bluetooth MAC of the classroom robot; override with `DASH_BT_ADDRESS`.
pub const DEFAULT_BT_ADDRESS: &str = "D7:A1:50:13:3B:F3";
