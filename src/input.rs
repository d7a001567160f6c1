//! JSON input document: `{ "creditLimit": n, "events": [...] }`.

use crate::amount::Amount;
use crate::error::Result;
use crate::event::{Event, EventRecord};
use crate::reducer::{summarize_with, ReducerPolicy, Summary};
use serde::Deserialize;
use std::io::Read;

/// A credit limit plus the raw events to summarize.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryInput {
    pub credit_limit: Amount,
    pub events: Vec<EventRecord>,
}

impl SummaryInput {
    /// Reads the document from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parses the document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates every record. The first invalid record aborts the parse.
    pub fn parse_events(&self) -> Result<Vec<Event>> {
        self.events.iter().map(EventRecord::parse).collect()
    }

    /// Validates the events and folds them into a summary.
    pub fn summarize(&self, policy: ReducerPolicy) -> Result<Summary> {
        let events = self.parse_events()?;
        summarize_with(self.credit_limit, &events, policy)
    }
}
