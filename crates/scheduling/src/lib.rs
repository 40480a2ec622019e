pub mod availability;
pub mod calendar;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod minister;
pub mod stats;
pub mod store;

pub use availability::{
    available_substitutes, substitute_pool, AvailabilityRecord, ResponseAdapter,
    SpecialEventAvailability, UnmappedResponse,
};
pub use calendar::{CalendarBuilder, MassCategory, MassSlot, MassTimeConfig, SpecialEvent};
pub use eligibility::is_eligible;
pub use engine::{Assignment, AssignmentEngine, GenerationRun, SlotCoverage, TieBreak};
pub use error::SchedulingError;
pub use minister::{Minister, MinisterRole, MinisterStatus};
pub use stats::{MinisterWorkload, RunStatistics};
pub use store::{generate_from_store, InMemoryStore, ScheduleStore};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

/// Everything one generation run produces.
///
/// `updated_totals` holds every minister's all-time assignment counter after
/// the run; persisting it is the caller's job. `unmapped` carries the
/// adapter's diagnostics per minister for troubleshooting odd questionnaire
/// payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub assignments: Vec<Assignment>,
    pub coverage: Vec<SlotCoverage>,
    pub updated_totals: HashMap<String, u32>,
    pub warnings: Vec<String>,
    pub unmapped: HashMap<String, Vec<UnmappedResponse>>,
}

/// Generate the month's schedule from a complete in-memory snapshot.
///
/// Adapts every raw questionnaire payload, materializes the month's mass
/// slots, and runs the assignment engine. Business-level shortfalls never
/// fail the call; only structural configuration errors do. With
/// [`TieBreak::Deterministic`] the result is a pure function of the inputs.
#[allow(clippy::too_many_arguments)]
pub fn generate(
    year: i32,
    month: u32,
    ministers: &[Minister],
    raw_responses: &HashMap<String, Value>,
    mass_config: &[MassTimeConfig],
    special_events: &[SpecialEvent],
    tie_break: TieBreak,
) -> Result<GenerationOutcome, SchedulingError> {
    let slots = CalendarBuilder::build_month(year, month, mass_config, special_events)?;

    let mut records: HashMap<String, AvailabilityRecord> = HashMap::new();
    let mut unmapped: HashMap<String, Vec<UnmappedResponse>> = HashMap::new();
    let mut warnings: Vec<String> = Vec::new();

    for minister in ministers {
        match raw_responses.get(&minister.id) {
            Some(raw) => {
                let (record, diagnostics) = ResponseAdapter::adapt(raw, year, month);
                if !diagnostics.is_empty() {
                    unmapped.insert(minister.id.clone(), diagnostics);
                }
                records.insert(minister.id.clone(), record);
            }
            None => {
                // Closed world: no response means unavailable all month.
                if minister.is_active() && minister.role.serves() {
                    warnings.push(format!(
                        "{}: no questionnaire response for {month:02}/{year}, treated as unavailable",
                        minister.name
                    ));
                }
                records.insert(minister.id.clone(), AvailabilityRecord::empty(year, month));
            }
        }
    }

    let run = AssignmentEngine::generate(&slots, ministers, &records, tie_break)?;
    warnings.extend(run.warnings);

    info!(
        year,
        month,
        assignments = run.assignments.len(),
        warnings = warnings.len(),
        "monthly schedule generated"
    );

    Ok(GenerationOutcome {
        assignments: run.assignments,
        coverage: run.coverage,
        updated_totals: run.updated_totals,
        warnings,
        unmapped,
    })
}
