use std::collections::{hash_map::Entry, HashMap};

use crate::error::AlignError;
use crate::record::ResultRecord;

/// Records whose queries are in flight, keyed by read id.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    in_flight: HashMap<String, ResultRecord>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record whose query is about to be submitted. A read id that
    /// is still in flight is rejected and the new record is dropped.
    pub fn register(&mut self, record: ResultRecord) -> Result<(), AlignError> {
        match self.in_flight.entry(record.read_id.clone()) {
            Entry::Occupied(entry) => Err(AlignError::DuplicateReadId(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    /// Remove and return the record waiting on `read_id`.
    pub fn resolve(&mut self, read_id: &str) -> Result<ResultRecord, AlignError> {
        self.in_flight
            .remove(read_id)
            .ok_or_else(|| AlignError::UnknownReadId(read_id.to_string()))
    }

    pub fn contains(&self, read_id: &str) -> bool {
        self.in_flight.contains_key(read_id)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}
