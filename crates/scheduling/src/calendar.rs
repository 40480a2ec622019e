use crate::availability::normalize_time;
use crate::error::SchedulingError;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One configured recurring mass time: "every `day_of_week` at `time`".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassTimeConfig {
    pub day_of_week: Weekday,
    pub time: String,
    pub min_ministers: u32,
    pub max_ministers: u32,
}

/// One special celebration (feast, novena, healing mass) on a concrete date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialEvent {
    pub date: NaiveDate,
    pub time: String,
    pub category: String,
    pub min_ministers: u32,
    pub max_ministers: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MassCategory {
    Regular,
    SpecialEvent(String),
}

impl MassCategory {
    pub fn is_special(&self) -> bool {
        matches!(self, MassCategory::SpecialEvent(_))
    }
}

/// One dated, timed celebration requiring ministers.
///
/// Materialized fresh for each generation run; `positions` is the number of
/// distinct liturgical positions to fill, one minister each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub category: MassCategory,
    pub min_ministers: u32,
    pub max_ministers: u32,
    pub positions: u32,
}

impl MassSlot {
    /// Canonical `YYYY-MM-DD_HH:MM` key, the same vocabulary availability
    /// records use.
    pub fn date_time_key(&self) -> String {
        format!(
            "{}_{}",
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M")
        )
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

/// Materializes the month's mass slots from the recurring configuration plus
/// the special-events calendar.
pub struct CalendarBuilder;

impl CalendarBuilder {
    /// Build every slot for `year`/`month`, chronologically ordered.
    ///
    /// Policy for conflicts on one date:
    /// - a special event at the same date and time suppresses the regular
    ///   slot; special events at other times coexist with the regular ones,
    /// - duplicate configuration rows for one date and time keep the first
    ///   occurrence and drop the rest.
    ///
    /// Rows with `max_ministers == 0` are explicitly disabled and skipped;
    /// `max < min` is a configuration bug and aborts the build.
    pub fn build_month(
        year: i32,
        month: u32,
        configs: &[MassTimeConfig],
        events: &[SpecialEvent],
    ) -> Result<Vec<MassSlot>, SchedulingError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(SchedulingError::InvalidMonth { year, month })?;

        let mut slots: BTreeMap<(NaiveDate, NaiveTime), MassSlot> = BTreeMap::new();

        let mut day = first;
        while day.month() == month {
            for config in configs.iter().filter(|c| c.day_of_week == day.weekday()) {
                let time = parse_config_time(&config.time)?;
                check_bounds(day, time, config.min_ministers, config.max_ministers)?;
                if config.max_ministers == 0 {
                    continue;
                }
                slots.entry((day, time)).or_insert(MassSlot {
                    date: day,
                    time,
                    category: MassCategory::Regular,
                    min_ministers: config.min_ministers,
                    max_ministers: config.max_ministers,
                    positions: config.max_ministers,
                });
            }
            day += Duration::days(1);
        }

        let mut seen_special: BTreeMap<(NaiveDate, NaiveTime), ()> = BTreeMap::new();
        for event in events
            .iter()
            .filter(|e| e.date.year() == year && e.date.month() == month)
        {
            let time = parse_config_time(&event.time)?;
            check_bounds(event.date, time, event.min_ministers, event.max_ministers)?;
            if event.max_ministers == 0 {
                continue;
            }
            if seen_special.insert((event.date, time), ()).is_some() {
                continue;
            }
            // Special wins over the regular slot at the same date+time.
            slots.insert(
                (event.date, time),
                MassSlot {
                    date: event.date,
                    time,
                    category: MassCategory::SpecialEvent(event.category.clone()),
                    min_ministers: event.min_ministers,
                    max_ministers: event.max_ministers,
                    positions: event.max_ministers,
                },
            );
        }

        let slots: Vec<MassSlot> = slots.into_values().collect();
        debug!(
            year,
            month,
            slot_count = slots.len(),
            "built monthly mass calendar"
        );
        Ok(slots)
    }
}

fn parse_config_time(raw: &str) -> Result<NaiveTime, SchedulingError> {
    let normalized =
        normalize_time(raw).ok_or_else(|| SchedulingError::InvalidTime(raw.to_string()))?;
    NaiveTime::parse_from_str(&normalized, "%H:%M")
        .map_err(|_| SchedulingError::InvalidTime(raw.to_string()))
}

fn check_bounds(
    date: NaiveDate,
    time: NaiveTime,
    minimum: u32,
    maximum: u32,
) -> Result<(), SchedulingError> {
    if maximum < minimum && maximum != 0 {
        return Err(SchedulingError::InvalidSlotBounds {
            date: date.format("%Y-%m-%d").to_string(),
            time: time.format("%H:%M").to_string(),
            minimum,
            maximum,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sunday_config(time: &str, min: u32, max: u32) -> MassTimeConfig {
        MassTimeConfig {
            day_of_week: Weekday::Sun,
            time: time.to_string(),
            min_ministers: min,
            max_ministers: max,
        }
    }

    #[test]
    fn test_build_month_regular_sundays() {
        // October 2025 has 4 Sundays: 5, 12, 19, 26.
        let configs = vec![sunday_config("08:00", 3, 6), sunday_config("10:00", 4, 8)];
        let slots = CalendarBuilder::build_month(2025, 10, &configs, &[]).unwrap();

        assert_eq!(slots.len(), 8);
        assert!(slots.iter().all(|s| s.weekday() == Weekday::Sun));
        assert!(slots.iter().all(|s| s.category == MassCategory::Regular));
    }

    #[test]
    fn test_build_month_chronological_order() {
        let configs = vec![
            sunday_config("19:00", 3, 6),
            sunday_config("08:00", 3, 6),
            MassTimeConfig {
                day_of_week: Weekday::Wed,
                time: "06:30".to_string(),
                min_ministers: 2,
                max_ministers: 5,
            },
        ];
        let slots = CalendarBuilder::build_month(2025, 10, &configs, &[]).unwrap();

        let keys: Vec<String> = slots.iter().map(|s| s.date_time_key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_special_event_suppresses_same_time_regular() {
        let configs = vec![MassTimeConfig {
            day_of_week: Weekday::Tue,
            time: "19:30".to_string(),
            min_ministers: 3,
            max_ministers: 6,
        }];
        let events = vec![SpecialEvent {
            date: NaiveDate::from_ymd_opt(2025, 10, 28).unwrap(),
            time: "19:30".to_string(),
            category: "feast".to_string(),
            min_ministers: 26,
            max_ministers: 30,
        }];

        let slots = CalendarBuilder::build_month(2025, 10, &configs, &events).unwrap();

        let oct_28: Vec<&MassSlot> = slots
            .iter()
            .filter(|s| s.date == NaiveDate::from_ymd_opt(2025, 10, 28).unwrap())
            .collect();
        assert_eq!(oct_28.len(), 1);
        assert_eq!(
            oct_28[0].category,
            MassCategory::SpecialEvent("feast".to_string())
        );
        assert_eq!(oct_28[0].max_ministers, 30);
    }

    #[test]
    fn test_special_event_at_other_time_coexists() {
        let configs = vec![MassTimeConfig {
            day_of_week: Weekday::Tue,
            time: "06:30".to_string(),
            min_ministers: 2,
            max_ministers: 5,
        }];
        let events = vec![SpecialEvent {
            date: NaiveDate::from_ymd_opt(2025, 10, 28).unwrap(),
            time: "19:30".to_string(),
            category: "feast".to_string(),
            min_ministers: 10,
            max_ministers: 15,
        }];

        let slots = CalendarBuilder::build_month(2025, 10, &configs, &events).unwrap();

        let oct_28: Vec<&MassSlot> = slots
            .iter()
            .filter(|s| s.date == NaiveDate::from_ymd_opt(2025, 10, 28).unwrap())
            .collect();
        assert_eq!(oct_28.len(), 2);
    }

    #[test]
    fn test_disabled_slot_excluded() {
        let configs = vec![sunday_config("08:00", 0, 0)];
        let slots = CalendarBuilder::build_month(2025, 10, &configs, &[]).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_inverted_bounds_abort() {
        let configs = vec![sunday_config("08:00", 6, 3)];
        let err = CalendarBuilder::build_month(2025, 10, &configs, &[]).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidSlotBounds { .. }));
    }

    #[test]
    fn test_invalid_month_rejected() {
        let err = CalendarBuilder::build_month(2025, 13, &[], &[]).unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::InvalidMonth {
                year: 2025,
                month: 13
            }
        ));
    }

    #[test]
    fn test_unparseable_time_rejected() {
        let configs = vec![sunday_config("early", 2, 4)];
        let err = CalendarBuilder::build_month(2025, 10, &configs, &[]).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidTime(_)));
    }

    #[test]
    fn test_duplicate_config_rows_keep_first() {
        let configs = vec![sunday_config("08:00", 3, 6), sunday_config("08:00", 5, 10)];
        let slots = CalendarBuilder::build_month(2025, 10, &configs, &[]).unwrap();

        assert_eq!(slots.len(), 4);
        assert!(slots.iter().all(|s| s.max_ministers == 6));
    }

    #[test]
    fn test_events_outside_month_ignored() {
        let events = vec![SpecialEvent {
            date: NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
            time: "19:30".to_string(),
            category: "healing".to_string(),
            min_ministers: 3,
            max_ministers: 6,
        }];
        let slots = CalendarBuilder::build_month(2025, 10, &[], &events).unwrap();
        assert!(slots.is_empty());
    }
}
