//! Application core: command routing and pin logic, zero I/O.
//!
//! All interaction with the broker, the link layer and the output lines
//! happens through the **port traits** in [`ports`], so everything here
//! runs on the host against mocks.

pub mod commands;
pub mod events;
pub mod interpreter;
pub mod ports;
pub mod router;
