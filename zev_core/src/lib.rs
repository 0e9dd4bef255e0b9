//! This crate fetches event cards from a Zebra CRM instance and turns them into a list of
//! active, upcoming events ready for display.
//!
//! The cards are read from the CRM's `get_multi_cards_details` XML interface.

pub mod config;
pub mod event;
pub mod render;
pub mod zebra_client;

pub use config::{ConfigError, Credentials, ZebraConfig};
pub use event::{EventListing, EventRecord, FilterMode};
pub use zebra_client::ZebraError;
