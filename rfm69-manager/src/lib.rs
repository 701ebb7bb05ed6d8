//! # RFM69 Message Manager
//!
//! A `no_std` messaging layer for sensor nodes built on an RFM69 radio
//! driver with Auto Transmission Control.
//!
//! The manager exchanges short text messages of the form `name:value` or
//! `name:value:sequence` and leaves modulation, encryption, power control
//! and packet retries to the wrapped driver, which it reaches through the
//! [`Rfm69Driver`] trait.
//!
//! ## Features
//!
//! - Non-blocking polling for incoming messages with a registered handler
//! - Fire-and-forget or acknowledged sending with driver-side retries
//! - Optional per-message sequence numbers
//! - Geiger counter node helpers: pulse counting, CPM and dose rate reports
//! - Logging through `defmt` or `log`, selected by crate feature
//!
//! ## Example
//!
//! ```ignore
//! use rfm69_manager::{Message, RadioConfig, Rfm69Manager};
//!
//! let mut manager = Rfm69Manager::new(radio);
//! manager.initialize(&RadioConfig::default()).await?;
//!
//! let mut handler = |message: &Message<'_>| {
//!     info!("{} says {}={}", message.node_id, message.name, message.value);
//! };
//! manager.on_message(Some(&mut handler));
//!
//! // Send a message to the gateway, retrying up to 3 times
//! let delivered = manager.send(manager.gateway_id(), "cpm", "18", 3, false).await?;
//!
//! // Poll for incoming messages
//! loop {
//!     manager.poll().await?;
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

mod fmt;

pub mod driver;
pub mod geiger;
pub mod manager;
pub mod message;
pub mod settings;

#[cfg(test)]
mod fake;

// Re-export commonly used types for convenience
pub use driver::Rfm69Driver;
pub use manager::{ManagerError, MessageHandler, Rfm69Manager};
pub use message::{Message, OwnedMessage};
pub use settings::{FrequencyBand, RadioConfig, SensorConfig};
