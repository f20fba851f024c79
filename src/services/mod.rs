//! Business logic services.
//!
//! This module contains the core logic for talking to GitHub, composing
//! letters, persisting configuration, and running the daily scheduler.
//!
//! Services are independent of the command line layer and are tested on
//! their own.

pub mod composer;
pub mod config_store;
pub mod courier;
pub mod credentials;
pub mod github_client;
pub mod scheduler;

pub use composer::Composer;
pub use courier::{Courier, DeliveryReport};
pub use credentials::CredentialService;
pub use github_client::GitHubClient;
pub use scheduler::{Scheduler, SchedulerHandle};
