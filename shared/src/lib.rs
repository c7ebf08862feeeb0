//! Shared library for Open House Lambda functions.
//!
//! This crate provides configuration, error handling, HTTP helpers, data models and the
//! store clients used by the open house and attendee Lambdas.

pub mod config;
pub mod dynamo;
pub mod error;
pub mod http;
pub mod memory;
pub mod models;
pub mod store;

pub use config::Config;
pub use dynamo::{DynamoAttendeeStore, DynamoOpenHouseStore};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use models::{Attendance, OpenHouse, OpenHouseForm};
pub use store::{AttendeeStore, OpenHouseStore};
