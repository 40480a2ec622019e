use crate::calendar::{MassTimeConfig, SpecialEvent};
use crate::engine::TieBreak;
use crate::error::SchedulingError;
use crate::minister::Minister;
use crate::GenerationOutcome;
use serde_json::Value;
use std::collections::HashMap;

/// Persistence gateway the scheduling core reads from and writes through.
///
/// The engine itself never touches storage; a caller loads a snapshot via
/// this trait, runs generation, and persists the outcome afterwards. Callers
/// are responsible for serializing generate-then-persist per month.
pub trait ScheduleStore {
    fn load_ministers(&self) -> Result<Vec<Minister>, SchedulingError>;

    /// Raw questionnaire payloads for the month, keyed by minister id.
    fn load_raw_responses(
        &self,
        year: i32,
        month: u32,
    ) -> Result<HashMap<String, Value>, SchedulingError>;

    fn load_mass_config(&self) -> Result<Vec<MassTimeConfig>, SchedulingError>;

    fn load_special_events(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<SpecialEvent>, SchedulingError>;

    /// Persist assignments and the updated per-minister totals.
    fn persist_run(
        &mut self,
        year: i32,
        month: u32,
        outcome: &GenerationOutcome,
    ) -> Result<(), SchedulingError>;
}

/// Load a month's snapshot from `store`, generate, and persist the outcome.
pub fn generate_from_store<S: ScheduleStore>(
    store: &mut S,
    year: i32,
    month: u32,
    tie_break: TieBreak,
) -> Result<GenerationOutcome, SchedulingError> {
    let ministers = store.load_ministers()?;
    let raw_responses = store.load_raw_responses(year, month)?;
    let mass_config = store.load_mass_config()?;
    let special_events = store.load_special_events(year, month)?;

    let outcome = crate::generate(
        year,
        month,
        &ministers,
        &raw_responses,
        &mass_config,
        &special_events,
        tie_break,
    )?;

    store.persist_run(year, month, &outcome)?;
    Ok(outcome)
}

/// In-memory store for tests and callers that assemble inputs by hand.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub ministers: Vec<Minister>,
    pub responses: HashMap<(i32, u32), HashMap<String, Value>>,
    pub mass_config: Vec<MassTimeConfig>,
    pub special_events: Vec<SpecialEvent>,
    pub persisted_runs: Vec<(i32, u32, GenerationOutcome)>,
}

impl ScheduleStore for InMemoryStore {
    fn load_ministers(&self) -> Result<Vec<Minister>, SchedulingError> {
        Ok(self.ministers.clone())
    }

    fn load_raw_responses(
        &self,
        year: i32,
        month: u32,
    ) -> Result<HashMap<String, Value>, SchedulingError> {
        Ok(self.responses.get(&(year, month)).cloned().unwrap_or_default())
    }

    fn load_mass_config(&self) -> Result<Vec<MassTimeConfig>, SchedulingError> {
        Ok(self.mass_config.clone())
    }

    fn load_special_events(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<SpecialEvent>, SchedulingError> {
        Ok(self
            .special_events
            .iter()
            .filter(|e| {
                use chrono::Datelike;
                e.date.year() == year && e.date.month() == month
            })
            .cloned()
            .collect())
    }

    fn persist_run(
        &mut self,
        year: i32,
        month: u32,
        outcome: &GenerationOutcome,
    ) -> Result<(), SchedulingError> {
        // Write updated fairness counters back to the roster.
        for minister in &mut self.ministers {
            if let Some(total) = outcome.updated_totals.get(&minister.id) {
                minister.total_assignments = *total;
            }
        }
        self.persisted_runs.push((year, month, outcome.clone()));
        Ok(())
    }
}
