//! Data models for the application.
//!
//! Config and destination types come from the JSON config file; templates and
//! delivery records live in the local SQLite database and derive `FromRow`.

pub mod config;
pub mod delivery;
pub mod destination;
pub mod letter;
pub mod template;

// Re-exports for convenient access
pub use config::AppConfig;
pub use delivery::{DeliveryKind, DeliveryRecord, DeliveryStatus, NewDelivery};
pub use destination::{parse_destinations, Destination, RepoId};
pub use letter::LetterRequest;
pub use template::Template;
