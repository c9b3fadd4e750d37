//! Fault injection for exercising failure paths against the in-memory store.

use std::sync::Mutex;

use leitos_storage::{DocRef, StorageError};

/// A failure the store should simulate until cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Every operation fails with a connection error.
    Offline,
    /// Reads (and subscription rebuilds) of this collection fail.
    FailReads(String),
    /// Writes to this collection fail, including writes inside batches.
    FailWrites(String),
    /// The batch write at this position fails after earlier writes were applied.
    FailBatchWrite(usize),
}

#[derive(Debug, Default)]
pub struct FaultInjector {
    faults: Mutex<Vec<Fault>>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, fault: Fault) {
        self.lock().push(fault);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn check_read(&self, collection: &str) -> Result<(), StorageError> {
        for fault in self.lock().iter() {
            match fault {
                Fault::Offline => return Err(offline()),
                Fault::FailReads(c) if c == collection => {
                    return Err(StorageError::connection_error(format!(
                        "simulated read failure on {collection}"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn check_write(&self, doc: &DocRef) -> Result<(), StorageError> {
        for fault in self.lock().iter() {
            match fault {
                Fault::Offline => return Err(offline()),
                Fault::FailWrites(c) if *c == doc.collection => {
                    return Err(StorageError::connection_error(format!(
                        "simulated write failure on {doc}"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn check_batch_write(&self, index: usize, doc: &DocRef) -> Result<(), StorageError> {
        self.check_write(doc)?;
        if self.lock().contains(&Fault::FailBatchWrite(index)) {
            return Err(StorageError::internal(format!(
                "simulated failure at batch write {index} ({doc})"
            )));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Fault>> {
        // A panic while holding this lock only poisons test bookkeeping.
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn offline() -> StorageError {
    StorageError::connection_error("store unreachable")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_faults_pass() {
        let faults = FaultInjector::new();
        assert!(faults.check_read("leitos").is_ok());
        assert!(faults.check_write(&DocRef::new("leitos", "b1")).is_ok());
    }

    #[test]
    fn test_collection_scoped_faults() {
        let faults = FaultInjector::new();
        faults.inject(Fault::FailWrites("logs".into()));
        assert!(faults.check_write(&DocRef::new("logs", "x")).is_err());
        assert!(faults.check_write(&DocRef::new("leitos", "b1")).is_ok());
        assert!(faults.check_read("logs").is_ok());
    }

    #[test]
    fn test_offline_and_clear() {
        let faults = FaultInjector::new();
        faults.inject(Fault::Offline);
        let err = faults.check_read("setores").unwrap_err();
        assert!(err.is_connection_error());

        faults.clear();
        assert!(faults.is_empty());
        assert!(faults.check_read("setores").is_ok());
    }

    #[test]
    fn test_batch_write_position() {
        let faults = FaultInjector::new();
        faults.inject(Fault::FailBatchWrite(1));
        let doc = DocRef::new("leitos", "b1");
        assert!(faults.check_batch_write(0, &doc).is_ok());
        assert!(faults.check_batch_write(1, &doc).is_err());
    }
}
