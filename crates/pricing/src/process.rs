use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricelab_core::{DomainError, DomainResult, ProcessId};

/// A procurement case being priced.
///
/// Deleting a process cascades to its items and their quotes; the storage
/// layer enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    /// Administrative case number (e.g. "23480.001234/2024-11").
    pub process_number: String,
    /// What is being procured.
    pub object: String,
    pub created_at: DateTime<Utc>,
}

impl Process {
    pub fn new(process_number: impl Into<String>, object: impl Into<String>) -> DomainResult<Self> {
        let process_number = process_number.into();
        let object = object.into();
        validate(&process_number, &object)?;

        Ok(Self {
            id: ProcessId::new(),
            process_number,
            object,
            created_at: Utc::now(),
        })
    }

    /// Apply an edit from the update endpoint, keeping id and creation time.
    pub fn with_fields(
        mut self,
        process_number: impl Into<String>,
        object: impl Into<String>,
    ) -> DomainResult<Self> {
        let process_number = process_number.into();
        let object = object.into();
        validate(&process_number, &object)?;

        self.process_number = process_number;
        self.object = object;
        Ok(self)
    }
}

fn validate(process_number: &str, object: &str) -> DomainResult<()> {
    if process_number.trim().is_empty() {
        return Err(DomainError::validation("process_number cannot be empty"));
    }
    if object.trim().is_empty() {
        return Err(DomainError::validation("object cannot be empty"));
    }
    Ok(())
}
