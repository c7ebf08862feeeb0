//! In-process store for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::{Attendance, OpenHouse};
use crate::store::{AttendeeStore, OpenHouseStore};
use crate::{Error, Result};

/// Both tables held in memory behind async mutexes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    open_houses: Mutex<HashMap<String, OpenHouse>>,
    attendees: Mutex<HashMap<String, Attendance>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the backing service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every stored attendee counter, in no particular order.
    pub async fn counters(&self) -> Vec<Attendance> {
        self.attendees.lock().await.values().cloned().collect()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Aws("Store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OpenHouseStore for MemoryStore {
    async fn scan_open_houses(&self) -> Result<Vec<OpenHouse>> {
        self.check_available()?;
        Ok(self.open_houses.lock().await.values().cloned().collect())
    }

    async fn get_open_house(&self, uuid: &str) -> Result<Option<OpenHouse>> {
        self.check_available()?;
        Ok(self.open_houses.lock().await.get(uuid).cloned())
    }

    async fn put_open_house(&self, open_house: &OpenHouse) -> Result<()> {
        self.check_available()?;
        self.open_houses
            .lock()
            .await
            .insert(open_house.uuid.clone(), open_house.clone());
        Ok(())
    }

    async fn delete_open_house(&self, uuid: &str) -> Result<()> {
        self.check_available()?;
        self.open_houses.lock().await.remove(uuid);
        Ok(())
    }

    async fn put_attendees(&self, attendance: &Attendance) -> Result<()> {
        self.check_available()?;
        self.attendees
            .lock()
            .await
            .insert(attendance.uuid.clone(), attendance.clone());
        Ok(())
    }

    async fn delete_attendees(&self, uuid: &str) -> Result<()> {
        self.check_available()?;
        self.attendees.lock().await.remove(uuid);
        Ok(())
    }
}

#[async_trait]
impl AttendeeStore for MemoryStore {
    async fn attendees_exist(&self, uuid: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.attendees.lock().await.contains_key(uuid))
    }

    async fn get_attendees(&self, uuid: &str) -> Result<Option<Attendance>> {
        self.check_available()?;
        Ok(self.attendees.lock().await.get(uuid).cloned())
    }

    async fn increment_attendees(&self, uuid: &str) -> Result<()> {
        self.check_available()?;
        // Matches DynamoDB: `attendees + :incr` fails when the item has no counter.
        match self.attendees.lock().await.get_mut(uuid) {
            Some(attendance) => {
                attendance.attendees += 1;
                Ok(())
            }
            None => Err(Error::Aws(format!(
                "The provided expression refers to an attribute that does not exist: {}",
                uuid
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_concurrent_increments_are_additive() {
        let store = Arc::new(MemoryStore::new());
        store.put_attendees(&Attendance::new("abc")).await.unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.increment_attendees("abc").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let attendance = store.get_attendees("abc").await.unwrap().unwrap();
        assert_eq!(attendance.attendees, 50);
    }

    #[tokio::test]
    async fn test_increment_without_counter_fails() {
        let store = MemoryStore::new();
        assert!(store.increment_attendees("missing").await.is_err());
        assert!(!store.attendees_exist("missing").await.unwrap());
    }
}
