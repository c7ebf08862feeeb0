//! Store seams the handlers are built against.
//!
//! Production wires in [`crate::dynamo::DynamoOpenHouseStore`] and
//! [`crate::dynamo::DynamoAttendeeStore`]; tests use [`crate::memory::MemoryStore`].

use async_trait::async_trait;

use crate::models::{Attendance, OpenHouse};
use crate::Result;

/// Access to the open houses table, plus the attendee counters created alongside each record.
#[async_trait]
pub trait OpenHouseStore: Send + Sync {
    async fn scan_open_houses(&self) -> Result<Vec<OpenHouse>>;
    async fn get_open_house(&self, uuid: &str) -> Result<Option<OpenHouse>>;
    /// Insert or fully replace the record at `open_house.uuid`.
    async fn put_open_house(&self, open_house: &OpenHouse) -> Result<()>;
    /// Deleting a missing uuid succeeds.
    async fn delete_open_house(&self, uuid: &str) -> Result<()>;

    async fn put_attendees(&self, attendance: &Attendance) -> Result<()>;
    async fn delete_attendees(&self, uuid: &str) -> Result<()>;
}

/// Access to the attendee counters table.
#[async_trait]
pub trait AttendeeStore: Send + Sync {
    /// True iff a counter item exists for `uuid`.
    async fn attendees_exist(&self, uuid: &str) -> Result<bool>;
    async fn get_attendees(&self, uuid: &str) -> Result<Option<Attendance>>;
    /// Add one to the counter as a single store-side update.
    async fn increment_attendees(&self, uuid: &str) -> Result<()>;
}
