//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                     |
//! |-------------|--------------|---------------------------------|
//! | `mqtt`      | BrokerPort   | rumqttc synchronous client      |
//! | `link`      | LinkPort     | host network stack              |
//! | `system`    | SystemPort   | ESP-IDF heap/reset, or host sim |
//! | `device_id` | -            | eFuse MAC, client id derivation |
//!
//! Output lines and the status LED live in `drivers`.

pub mod device_id;
pub mod link;
#[cfg(feature = "mqtt")]
pub mod mqtt;
pub mod system;
