use crate::availability::AvailabilityRecord;
use crate::calendar::{MassCategory, MassSlot};
use crate::eligibility::is_eligible;
use crate::error::SchedulingError;
use crate::minister::Minister;
use chrono::{NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// How ranking ties between equally ranked ministers are resolved.
///
/// `Deterministic` orders ties by minister id, making a run a pure function
/// of its inputs. `SeededShuffle` explores alternative schedules by shuffling
/// candidates before the stable ranking sort; the same seed always yields the
/// same schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    #[default]
    Deterministic,
    SeededShuffle(u64),
}

/// One minister bound to one liturgical position at one mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub position: u32,
    pub minister_id: String,
    pub confirmed: bool,
}

/// Per-slot outcome: how many ministers were assigned against the configured
/// range, suggested backups, and a confidence score for operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotCoverage {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub category: MassCategory,
    pub assigned: u32,
    pub minimum: u32,
    pub maximum: u32,
    pub backup_minister_ids: Vec<String>,
    pub confidence: f32,
}

impl SlotCoverage {
    pub fn shortfall(&self) -> u32 {
        self.minimum.saturating_sub(self.assigned)
    }

    pub fn is_understaffed(&self) -> bool {
        self.assigned < self.minimum
    }

    pub fn is_unstaffed(&self) -> bool {
        self.assigned == 0
    }
}

/// Result of one generation run. Coverage entries appear for every processed
/// slot in chronological order; `updated_totals` carries every minister's
/// all-time counter after this run, for the caller to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRun {
    pub assignments: Vec<Assignment>,
    pub coverage: Vec<SlotCoverage>,
    pub updated_totals: HashMap<String, u32>,
    pub warnings: Vec<String>,
}

/// The scheduling core: assigns ministers to mass slots across a month.
///
/// Stateless by design — all inputs arrive as arguments and the result is
/// returned whole; there is no instance state to warm up and no I/O.
pub struct AssignmentEngine;

impl AssignmentEngine {
    /// Assign ministers to `slots`, which must already be in chronological
    /// order (as produced by the calendar builder).
    ///
    /// Coverage shortfalls never fail the run; only structurally invalid
    /// slots do. With `TieBreak::Deterministic`, calling this twice over the
    /// same inputs yields identical output.
    pub fn generate(
        slots: &[MassSlot],
        ministers: &[Minister],
        availability: &HashMap<String, AvailabilityRecord>,
        tie_break: TieBreak,
    ) -> Result<GenerationRun, SchedulingError> {
        let mut running: HashMap<String, u32> = ministers
            .iter()
            .map(|m| (m.id.clone(), m.total_assignments))
            .collect();
        let mut booked: HashMap<(NaiveDate, NaiveTime), HashSet<String>> = HashMap::new();

        let mut rng = match tie_break {
            TieBreak::SeededShuffle(seed) => Some(StdRng::seed_from_u64(seed)),
            TieBreak::Deterministic => None,
        };

        let mut assignments = Vec::new();
        let mut coverage = Vec::new();
        let mut warnings = Vec::new();

        for slot in slots {
            if slot.max_ministers < slot.min_ministers {
                return Err(SchedulingError::InvalidSlotBounds {
                    date: slot.date.format("%Y-%m-%d").to_string(),
                    time: slot.time.format("%H:%M").to_string(),
                    minimum: slot.min_ministers,
                    maximum: slot.max_ministers,
                });
            }
            if slot.max_ministers == 0 {
                // Explicitly disabled, not understaffed; no coverage entry.
                continue;
            }

            let already_booked = booked.entry((slot.date, slot.time)).or_default();

            let mut candidates: Vec<&Minister> = ministers
                .iter()
                .filter(|m| !already_booked.contains(&m.id))
                .filter(|m| {
                    availability
                        .get(&m.id)
                        .map(|record| is_eligible(m, slot, record))
                        .unwrap_or(false)
                })
                .collect();

            if let Some(rng) = rng.as_mut() {
                candidates.shuffle(rng);
            }

            // Fewest-served first, then preference match; the sort is stable,
            // so shuffled order (or id order) decides remaining ties.
            if rng.is_none() {
                candidates.sort_by(|a, b| a.id.cmp(&b.id));
            }
            candidates.sort_by_key(|m| {
                (
                    running.get(&m.id).copied().unwrap_or(0),
                    !prefers_slot(m, slot),
                )
            });

            let take = (slot.max_ministers as usize).min(candidates.len());
            let selected = &candidates[..take];

            for (index, minister) in selected.iter().enumerate() {
                assignments.push(Assignment {
                    date: slot.date,
                    time: slot.time,
                    position: index as u32 + 1,
                    minister_id: minister.id.clone(),
                    confirmed: true,
                });
                already_booked.insert(minister.id.clone());
                *running.entry(minister.id.clone()).or_insert(0) += 1;
            }

            let backup_minister_ids: Vec<String> = candidates[take..]
                .iter()
                .filter(|m| {
                    availability
                        .get(&m.id)
                        .map(|record| record.can_substitute)
                        .unwrap_or(false)
                })
                .take(2)
                .map(|m| m.id.clone())
                .collect();

            let assigned = take as u32;
            let entry = SlotCoverage {
                date: slot.date,
                time: slot.time,
                category: slot.category.clone(),
                assigned,
                minimum: slot.min_ministers,
                maximum: slot.max_ministers,
                backup_minister_ids,
                confidence: confidence(selected, slot),
            };

            debug!(
                date = %slot.date,
                time = %slot.time,
                eligible = candidates.len(),
                assigned,
                required = slot.min_ministers,
                "slot processed"
            );

            if entry.is_unstaffed() {
                warn!(date = %slot.date, time = %slot.time, "no eligible ministers for slot");
                warnings.push(format!(
                    "{} {}: no eligible ministers",
                    slot.date.format("%Y-%m-%d"),
                    slot.time.format("%H:%M")
                ));
            } else if entry.is_understaffed() {
                warnings.push(format!(
                    "{} {}: understaffed, {}/{} ministers assigned",
                    slot.date.format("%Y-%m-%d"),
                    slot.time.format("%H:%M"),
                    assigned,
                    slot.min_ministers
                ));
            }

            coverage.push(entry);
        }

        info!(
            slots = coverage.len(),
            assignments = assignments.len(),
            understaffed = coverage.iter().filter(|c| c.is_understaffed()).count(),
            "generation run complete"
        );

        Ok(GenerationRun {
            assignments,
            coverage,
            updated_totals: running,
            warnings,
        })
    }
}

/// A minister prefers a slot when their preferred liturgical position exists
/// in it.
fn prefers_slot(minister: &Minister, slot: &MassSlot) -> bool {
    minister
        .preferred_position
        .map(|p| p >= 1 && p <= slot.positions)
        .unwrap_or(false)
}

/// Operator-facing confidence in one slot's schedule: coverage ratio (50%),
/// average experience of the selected ministers (30%), minimum met (20%).
fn confidence(selected: &[&Minister], slot: &MassSlot) -> f32 {
    if selected.is_empty() {
        return 0.0;
    }

    let assigned = selected.len() as f32;
    let coverage_ratio = if slot.min_ministers == 0 {
        1.0
    } else {
        (assigned / slot.min_ministers as f32).min(1.0)
    };

    let avg_experience =
        selected.iter().map(|m| m.total_assignments as f32).sum::<f32>() / assigned;
    let experience = (avg_experience / 50.0).min(1.0);

    let minimum_met = if selected.len() as u32 >= slot.min_ministers {
        1.0
    } else {
        0.5
    };

    (coverage_ratio * 0.5 + experience * 0.3 + minimum_met * 0.2).clamp(0.0, 1.0)
}
