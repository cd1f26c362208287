use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::domain::{Bill, BillId, BillStatus};

/// Storage abstraction so the billing service can be exercised in isolation.
pub trait BillRepository: Send + Sync {
    fn insert(&self, bill: Bill) -> Result<Bill, RepositoryError>;
    fn update(&self, bill: Bill) -> Result<(), RepositoryError>;
    fn update_status(&self, id: &BillId, status: BillStatus) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &BillId) -> Result<Option<Bill>, RepositoryError>;
    fn all(&self) -> Result<Vec<Bill>, RepositoryError>;
    fn delete(&self, id: &BillId) -> Result<(), RepositoryError>;
    /// The bill created by converting `id`, if any.
    fn successor_of(&self, id: &BillId) -> Result<Option<Bill>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("bill already exists")]
    Conflict,
    #[error("bill not found")]
    NotFound,
    #[error("bill store unavailable: {0}")]
    Unavailable(String),
}

/// Bill store backed by a process-local map, used by tests and the demo CLI.
#[derive(Default, Clone)]
pub struct InMemoryBillRepository {
    bills: Arc<Mutex<BTreeMap<String, Bill>>>,
}

impl BillRepository for InMemoryBillRepository {
    fn insert(&self, bill: Bill) -> Result<Bill, RepositoryError> {
        let mut guard = self.bills.lock().expect("bill store mutex poisoned");
        if guard.contains_key(&bill.id.0) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(bill.id.0.clone(), bill.clone());
        Ok(bill)
    }

    fn update(&self, bill: Bill) -> Result<(), RepositoryError> {
        let mut guard = self.bills.lock().expect("bill store mutex poisoned");
        if !guard.contains_key(&bill.id.0) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(bill.id.0.clone(), bill);
        Ok(())
    }

    fn update_status(&self, id: &BillId, status: BillStatus) -> Result<(), RepositoryError> {
        let mut guard = self.bills.lock().expect("bill store mutex poisoned");
        let bill = guard.get_mut(&id.0).ok_or(RepositoryError::NotFound)?;
        bill.status = status;
        Ok(())
    }

    fn fetch(&self, id: &BillId) -> Result<Option<Bill>, RepositoryError> {
        let guard = self.bills.lock().expect("bill store mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn all(&self) -> Result<Vec<Bill>, RepositoryError> {
        let guard = self.bills.lock().expect("bill store mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn delete(&self, id: &BillId) -> Result<(), RepositoryError> {
        let mut guard = self.bills.lock().expect("bill store mutex poisoned");
        guard
            .remove(&id.0)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn successor_of(&self, id: &BillId) -> Result<Option<Bill>, RepositoryError> {
        let guard = self.bills.lock().expect("bill store mutex poisoned");
        Ok(guard
            .values()
            .find(|bill| bill.original_bill_id.as_ref() == Some(id))
            .cloned())
    }
}
