use crate::engine::GenerationRun;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many assignments one minister received in a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinisterWorkload {
    pub minister_id: String,
    pub assignments: u32,
}

/// Summary of one generation run, for operator reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_slots: usize,
    pub fully_covered: usize,
    pub understaffed: usize,
    pub unstaffed: usize,
    pub total_assignments: usize,
    pub average_confidence: f32,
    /// Per-minister counts for this run only, busiest first.
    pub workload: Vec<MinisterWorkload>,
}

impl RunStatistics {
    pub fn from_run(run: &GenerationRun) -> Self {
        let total_slots = run.coverage.len();
        let understaffed = run.coverage.iter().filter(|c| c.is_understaffed()).count();
        let unstaffed = run.coverage.iter().filter(|c| c.is_unstaffed()).count();

        let average_confidence = if total_slots == 0 {
            0.0
        } else {
            run.coverage.iter().map(|c| c.confidence).sum::<f32>() / total_slots as f32
        };

        let mut counts: HashMap<&str, u32> = HashMap::new();
        for assignment in &run.assignments {
            *counts.entry(assignment.minister_id.as_str()).or_insert(0) += 1;
        }
        let mut workload: Vec<MinisterWorkload> = counts
            .into_iter()
            .map(|(minister_id, assignments)| MinisterWorkload {
                minister_id: minister_id.to_string(),
                assignments,
            })
            .collect();
        workload.sort_by(|a, b| {
            b.assignments
                .cmp(&a.assignments)
                .then_with(|| a.minister_id.cmp(&b.minister_id))
        });

        RunStatistics {
            total_slots,
            fully_covered: total_slots - understaffed,
            understaffed,
            unstaffed,
            total_assignments: run.assignments.len(),
            average_confidence,
            workload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::MassCategory;
    use crate::engine::{Assignment, SlotCoverage};
    use chrono::{NaiveDate, NaiveTime};

    fn assignment(day: u32, minister: &str, position: u32) -> Assignment {
        Assignment {
            date: NaiveDate::from_ymd_opt(2025, 10, day).unwrap(),
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            position,
            minister_id: minister.to_string(),
            confirmed: true,
        }
    }

    fn coverage(day: u32, assigned: u32, minimum: u32, confidence: f32) -> SlotCoverage {
        SlotCoverage {
            date: NaiveDate::from_ymd_opt(2025, 10, day).unwrap(),
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            category: MassCategory::Regular,
            assigned,
            minimum,
            maximum: 6,
            backup_minister_ids: Vec::new(),
            confidence,
        }
    }

    #[test]
    fn test_statistics_from_run() {
        let run = GenerationRun {
            assignments: vec![
                assignment(5, "m1", 1),
                assignment(5, "m2", 2),
                assignment(12, "m1", 1),
            ],
            coverage: vec![coverage(5, 2, 2, 0.9), coverage(12, 1, 2, 0.5), coverage(19, 0, 2, 0.0)],
            updated_totals: HashMap::new(),
            warnings: Vec::new(),
        };

        let stats = RunStatistics::from_run(&run);

        assert_eq!(stats.total_slots, 3);
        assert_eq!(stats.fully_covered, 1);
        assert_eq!(stats.understaffed, 2);
        assert_eq!(stats.unstaffed, 1);
        assert_eq!(stats.total_assignments, 3);
        assert!((stats.average_confidence - 0.466_666_7).abs() < 1e-4);
        assert_eq!(
            stats.workload,
            vec![
                MinisterWorkload {
                    minister_id: "m1".to_string(),
                    assignments: 2
                },
                MinisterWorkload {
                    minister_id: "m2".to_string(),
                    assignments: 1
                },
            ]
        );
    }

    #[test]
    fn test_empty_run() {
        let run = GenerationRun {
            assignments: Vec::new(),
            coverage: Vec::new(),
            updated_totals: HashMap::new(),
            warnings: Vec::new(),
        };

        let stats = RunStatistics::from_run(&run);
        assert_eq!(stats.total_slots, 0);
        assert_eq!(stats.average_confidence, 0.0);
        assert!(stats.workload.is_empty());
    }
}
