use crate::calendar::MassSlot;
use crate::eligibility::is_eligible;
use crate::minister::Minister;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Canonical per-minister, per-month availability.
///
/// Every historical questionnaire payload funnels into this one shape:
/// - `weekdays`: day-of-week tokens for recurring daily masses,
/// - `dates`: explicit `YYYY-MM-DD_HH:MM` keys (Sundays and any other
///   date-specific availability),
/// - `special_events`: per-event-category availability keyed the same way.
///
/// Closed-world: anything not explicitly affirmed here is unavailable.
/// Records are derived fresh for each generation run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub year: i32,
    pub month: u32,
    pub weekdays: HashSet<Weekday>,
    pub dates: BTreeMap<String, bool>,
    pub special_events: BTreeMap<String, SpecialEventAvailability>,
    pub can_substitute: bool,
    pub notes: Option<String>,
}

/// Availability for one special-event category.
///
/// `Whole` covers payloads that affirm an event without naming occurrences
/// (e.g. a plain `first_friday: true`); `Dates` carries explicit
/// `YYYY-MM-DD_HH:MM` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpecialEventAvailability {
    Whole(bool),
    Dates(BTreeMap<String, bool>),
}

impl AvailabilityRecord {
    pub fn empty(year: i32, month: u32) -> Self {
        AvailabilityRecord {
            year,
            month,
            weekdays: HashSet::new(),
            dates: BTreeMap::new(),
            special_events: BTreeMap::new(),
            can_substitute: false,
            notes: None,
        }
    }

    /// True if the record affirms at least one date, weekday or event.
    pub fn has_any_availability(&self) -> bool {
        !self.weekdays.is_empty()
            || self.dates.values().any(|v| *v)
            || self.special_events.values().any(|ev| match ev {
                SpecialEventAvailability::Whole(b) => *b,
                SpecialEventAvailability::Dates(m) => m.values().any(|v| *v),
            })
    }
}

/// A questionnaire field the adapter did not recognize. Collected as
/// diagnostics alongside the record; never a hard error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmappedResponse {
    pub field: String,
    pub value: Value,
}

/// Known historical payload shapes, detected by marker sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    /// `{ format_version: "2.0", masses: {...}, weekdays: {...}, ... }`
    Versioned,
    /// `[ { questionId, answer }, ... ]`
    QuestionArray,
    /// Flat object with `available_sundays` / `daily_mass_availability`.
    LegacyFields,
    Unknown,
}

/// Normalizes heterogeneous questionnaire payloads into [`AvailabilityRecord`].
///
/// Adaptation always succeeds: malformed or unrecognized fields are returned
/// as [`UnmappedResponse`] diagnostics and everything else is best-effort.
pub struct ResponseAdapter;

impl ResponseAdapter {
    /// Adapt one raw questionnaire payload for the given month.
    pub fn adapt(raw: &Value, year: i32, month: u32) -> (AvailabilityRecord, Vec<UnmappedResponse>) {
        let mut record = AvailabilityRecord::empty(year, month);
        let mut unmapped = Vec::new();

        let format = Self::detect_format(raw);
        debug!(?format, "adapting questionnaire response");

        match format {
            ResponseFormat::Versioned => {
                Self::adapt_versioned(raw, &mut record, &mut unmapped);
            }
            ResponseFormat::QuestionArray => {
                Self::adapt_question_array(raw, year, month, &mut record, &mut unmapped);
            }
            ResponseFormat::LegacyFields => {
                Self::adapt_legacy_fields(raw, year, month, &mut record, &mut unmapped);
            }
            ResponseFormat::Unknown => {
                unmapped.push(UnmappedResponse {
                    field: "$".to_string(),
                    value: raw.clone(),
                });
            }
        }

        (record, unmapped)
    }

    fn detect_format(raw: &Value) -> ResponseFormat {
        if raw.is_array() {
            return ResponseFormat::QuestionArray;
        }
        if let Some(obj) = raw.as_object() {
            if obj.get("format_version").and_then(Value::as_str) == Some("2.0") {
                return ResponseFormat::Versioned;
            }
            if obj.contains_key("available_sundays")
                || obj.contains_key("availableSundays")
                || obj.contains_key("daily_mass_availability")
                || obj.contains_key("dailyMassAvailability")
            {
                return ResponseFormat::LegacyFields;
            }
        }
        ResponseFormat::Unknown
    }

    fn adapt_versioned(
        raw: &Value,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        let Some(obj) = raw.as_object() else { return };

        for (key, value) in obj {
            match key.as_str() {
                "format_version" => {}
                "masses" => Self::collect_mass_dates(value, record, unmapped),
                "weekdays" => Self::collect_weekday_map(value, record, unmapped),
                "special_events" => Self::collect_special_events(value, record, unmapped),
                "can_substitute" => record.can_substitute = is_yes(value),
                "notes" => {
                    if let Some(text) = value.as_str().filter(|t| !t.trim().is_empty()) {
                        record.notes = Some(text.to_string());
                    }
                }
                _ => unmapped.push(UnmappedResponse {
                    field: key.clone(),
                    value: value.clone(),
                }),
            }
        }
    }

    /// `masses` is a map of date -> time -> bool.
    fn collect_mass_dates(
        value: &Value,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        let Some(dates) = value.as_object() else {
            unmapped.push(UnmappedResponse {
                field: "masses".to_string(),
                value: value.clone(),
            });
            return;
        };

        for (date, times) in dates {
            let valid_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
            let Some(times) = times.as_object().filter(|_| valid_date) else {
                unmapped.push(UnmappedResponse {
                    field: format!("masses.{date}"),
                    value: times.clone(),
                });
                continue;
            };
            for (time, available) in times {
                match normalize_time(time) {
                    Some(time) => {
                        record
                            .dates
                            .insert(format!("{date}_{time}"), is_yes(available));
                    }
                    None => unmapped.push(UnmappedResponse {
                        field: format!("masses.{date}.{time}"),
                        value: available.clone(),
                    }),
                }
            }
        }
    }

    fn collect_weekday_map(
        value: &Value,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        let Some(days) = value.as_object() else {
            unmapped.push(UnmappedResponse {
                field: "weekdays".to_string(),
                value: value.clone(),
            });
            return;
        };

        for (day, enabled) in days {
            match weekday_token(day) {
                Some(weekday) => {
                    if is_yes(enabled) {
                        record.weekdays.insert(weekday);
                    }
                }
                None => unmapped.push(UnmappedResponse {
                    field: format!("weekdays.{day}"),
                    value: enabled.clone(),
                }),
            }
        }
    }

    /// `special_events` entries come as a bare bool (whole event), a map of
    /// `date_time` keys, or an array of date-time strings.
    fn collect_special_events(
        value: &Value,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        let Some(events) = value.as_object() else {
            unmapped.push(UnmappedResponse {
                field: "special_events".to_string(),
                value: value.clone(),
            });
            return;
        };

        for (category, entry) in events {
            match entry {
                Value::Bool(b) => {
                    record
                        .special_events
                        .insert(category.clone(), SpecialEventAvailability::Whole(*b));
                }
                Value::Object(map) => {
                    let mut dates = BTreeMap::new();
                    for (key, available) in map {
                        match normalize_date_time_key(key) {
                            Some(key) => {
                                dates.insert(key, is_yes(available));
                            }
                            None => unmapped.push(UnmappedResponse {
                                field: format!("special_events.{category}.{key}"),
                                value: available.clone(),
                            }),
                        }
                    }
                    record
                        .special_events
                        .insert(category.clone(), SpecialEventAvailability::Dates(dates));
                }
                Value::Array(entries) => {
                    let mut dates = BTreeMap::new();
                    for item in entries {
                        let parsed = item
                            .as_str()
                            .and_then(|s| parse_event_entry(s, record.year));
                        match parsed {
                            Some((date, time)) => {
                                dates.insert(format!("{date}_{time}"), true);
                            }
                            None => unmapped.push(UnmappedResponse {
                                field: format!("special_events.{category}"),
                                value: item.clone(),
                            }),
                        }
                    }
                    record
                        .special_events
                        .insert(category.clone(), SpecialEventAvailability::Dates(dates));
                }
                other => unmapped.push(UnmappedResponse {
                    field: format!("special_events.{category}"),
                    value: other.clone(),
                }),
            }
        }
    }

    /// The question-array shape: `[{questionId, answer}]`.
    ///
    /// Two passes: the first picks up `monthly_availability` (gates regular
    /// availability) and `main_service_time` (the hour Sunday strings map to),
    /// since either may appear after the fields that depend on them.
    fn adapt_question_array(
        raw: &Value,
        year: i32,
        month: u32,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        let Some(items) = raw.as_array() else { return };

        let mut monthly_available = true;
        let mut main_time = "10:00".to_string();
        for item in items {
            let Some(obj) = item.as_object() else { continue };
            match obj.get("questionId").and_then(Value::as_str) {
                Some("monthly_availability") => {
                    if let Some(answer) = obj.get("answer") {
                        monthly_available = is_yes(answer);
                    }
                }
                Some("main_service_time") => {
                    if let Some(time) = obj
                        .get("answer")
                        .and_then(Value::as_str)
                        .and_then(normalize_time)
                    {
                        main_time = time;
                    }
                }
                _ => {}
            }
        }

        if !monthly_available {
            debug!("minister declared no regular availability this month");
        }

        for item in items {
            let Some(obj) = item.as_object() else {
                unmapped.push(UnmappedResponse {
                    field: "$".to_string(),
                    value: item.clone(),
                });
                continue;
            };
            let Some(question_id) = obj.get("questionId").and_then(Value::as_str) else {
                unmapped.push(UnmappedResponse {
                    field: "$".to_string(),
                    value: item.clone(),
                });
                continue;
            };
            let answer = obj.get("answer").unwrap_or(&Value::Null);

            match question_id {
                "monthly_availability" | "main_service_time" => {}
                "available_sundays" => {
                    if monthly_available {
                        Self::collect_sunday_entries(answer, year, month, &main_time, record, unmapped);
                    }
                }
                "daily_mass_availability" | "daily_mass" => {
                    if monthly_available {
                        Self::collect_weekday_entries(answer, record, unmapped);
                    }
                }
                "can_substitute" => record.can_substitute = is_yes(answer),
                "notes" => {
                    if let Some(text) = answer.as_str().filter(|t| !t.trim().is_empty()) {
                        record.notes = Some(text.to_string());
                    }
                }
                id if id.starts_with("event_") => {
                    let category = id.trim_start_matches("event_").to_string();
                    Self::collect_event_answer(&category, answer, year, record, unmapped);
                }
                _ => unmapped.push(UnmappedResponse {
                    field: question_id.to_string(),
                    value: answer.clone(),
                }),
            }
        }
    }

    /// Sunday strings carry a `DD/MM` day; the minister is taken to serve at
    /// their declared main service time on that date.
    fn collect_sunday_entries(
        answer: &Value,
        year: i32,
        month: u32,
        main_time: &str,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        let Some(entries) = answer.as_array() else {
            unmapped.push(UnmappedResponse {
                field: "available_sundays".to_string(),
                value: answer.clone(),
            });
            return;
        };

        for entry in entries {
            let Some(text) = entry.as_str() else {
                unmapped.push(UnmappedResponse {
                    field: "available_sundays".to_string(),
                    value: entry.clone(),
                });
                continue;
            };
            if is_none_marker(text) {
                continue;
            }
            match parse_day_of_month(text, year, month) {
                Some(date) => {
                    record.dates.insert(format!("{date}_{main_time}"), true);
                }
                None => unmapped.push(UnmappedResponse {
                    field: "available_sundays".to_string(),
                    value: entry.clone(),
                }),
            }
        }
    }

    fn collect_weekday_entries(
        answer: &Value,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        // A bare "yes" means every weekday (Monday through Friday).
        if is_yes(answer) {
            record.weekdays.extend([
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]);
            return;
        }

        let Some(entries) = answer.as_array() else {
            if !answer.is_null() && !answer.is_string() {
                unmapped.push(UnmappedResponse {
                    field: "daily_mass_availability".to_string(),
                    value: answer.clone(),
                });
            }
            return;
        };

        for entry in entries {
            let token = entry.as_str().and_then(weekday_token);
            match token {
                Some(weekday) => {
                    record.weekdays.insert(weekday);
                }
                None => unmapped.push(UnmappedResponse {
                    field: "daily_mass_availability".to_string(),
                    value: entry.clone(),
                }),
            }
        }
    }

    fn collect_event_answer(
        category: &str,
        answer: &Value,
        year: i32,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        if answer.is_boolean() || answer.is_string() {
            if !answer.as_str().map(is_none_marker).unwrap_or(false) {
                record.special_events.insert(
                    category.to_string(),
                    SpecialEventAvailability::Whole(is_yes(answer)),
                );
            }
            return;
        }

        let Some(entries) = answer.as_array() else {
            unmapped.push(UnmappedResponse {
                field: format!("event_{category}"),
                value: answer.clone(),
            });
            return;
        };

        let mut dates = BTreeMap::new();
        for entry in entries {
            let Some(text) = entry.as_str() else {
                unmapped.push(UnmappedResponse {
                    field: format!("event_{category}"),
                    value: entry.clone(),
                });
                continue;
            };
            if is_none_marker(text) {
                continue;
            }
            match parse_event_entry(text, year) {
                Some((date, time)) => {
                    dates.insert(format!("{date}_{time}"), true);
                }
                None => unmapped.push(UnmappedResponse {
                    field: format!("event_{category}"),
                    value: entry.clone(),
                }),
            }
        }
        record
            .special_events
            .insert(category.to_string(), SpecialEventAvailability::Dates(dates));
    }

    /// Flat legacy objects with direct `available_sundays` /
    /// `daily_mass_availability` fields (snake_case or camelCase).
    fn adapt_legacy_fields(
        raw: &Value,
        year: i32,
        month: u32,
        record: &mut AvailabilityRecord,
        unmapped: &mut Vec<UnmappedResponse>,
    ) {
        let Some(obj) = raw.as_object() else { return };

        for (key, value) in obj {
            match key.as_str() {
                "available_sundays" | "availableSundays" => {
                    Self::collect_sunday_entries(value, year, month, "10:00", record, unmapped);
                }
                "daily_mass_availability" | "dailyMassAvailability" => {
                    Self::collect_weekday_entries(value, record, unmapped);
                }
                "can_substitute" | "canSubstitute" => record.can_substitute = is_yes(value),
                "notes" => {
                    if let Some(text) = value.as_str().filter(|t| !t.trim().is_empty()) {
                        record.notes = Some(text.to_string());
                    }
                }
                _ => unmapped.push(UnmappedResponse {
                    field: key.clone(),
                    value: value.clone(),
                }),
            }
        }
    }
}

/// Ministers who declared willingness to substitute, in id order.
pub fn substitute_pool(records: &HashMap<String, AvailabilityRecord>) -> Vec<String> {
    let mut pool: Vec<String> = records
        .iter()
        .filter(|(_, record)| record.can_substitute)
        .map(|(id, _)| id.clone())
        .collect();
    pool.sort();
    pool
}

/// Substitute-willing ministers who are also eligible for a concrete slot.
pub fn available_substitutes(
    ministers: &[Minister],
    records: &HashMap<String, AvailabilityRecord>,
    slot: &MassSlot,
) -> Vec<String> {
    ministers
        .iter()
        .filter(|minister| {
            records
                .get(&minister.id)
                .map(|record| record.can_substitute && is_eligible(minister, slot, record))
                .unwrap_or(false)
        })
        .map(|minister| minister.id.clone())
        .collect()
}

// ===== parsing helpers =====

fn is_yes(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "sim" | "yes" | "true" | "s" | "y"
        ),
        _ => false,
    }
}

fn is_none_marker(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower.starts_with("nenhum") || lower == "none" || lower == "no"
}

/// Normalize a time token to `HH:MM`. Accepts `08:00`, `08:00:00`, `8h`,
/// `19h30`.
pub fn normalize_time(raw: &str) -> Option<String> {
    let token = raw.trim();
    if token.is_empty() {
        return None;
    }

    if let Some((hour, rest)) = token.split_once(':') {
        let hour: u32 = hour.trim().parse().ok()?;
        let minute: u32 = rest.split(':').next()?.trim().parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        return Some(format!("{hour:02}:{minute:02}"));
    }

    let lower = token.to_lowercase();
    if let Some((hour, minute)) = lower.split_once('h') {
        let hour: u32 = hour.trim().parse().ok()?;
        let minute: u32 = if minute.trim().is_empty() {
            0
        } else {
            minute.trim().parse().ok()?
        };
        if hour > 23 || minute > 59 {
            return None;
        }
        return Some(format!("{hour:02}:{minute:02}"));
    }

    None
}

/// Normalize a `<date>_<time>` key, stripping seconds from the time part.
fn normalize_date_time_key(key: &str) -> Option<String> {
    let (date, time) = key.split_once('_')?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = normalize_time(time)?;
    Some(format!("{date}_{time}"))
}

/// Extract a `DD/MM` day reference from free text; the date is anchored to
/// the questionnaire's month, matching how the source treated sunday strings.
fn parse_day_of_month(text: &str, year: i32, month: u32) -> Option<String> {
    for token in text.split_whitespace() {
        if let Some((day, _)) = split_day_month(token) {
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

fn split_day_month(token: &str) -> Option<(u32, u32)> {
    let (day, month) = token.split_once('/')?;
    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month
        .trim()
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .ok()?;
    if day == 0 || day > 31 || month == 0 || month > 12 {
        return None;
    }
    Some((day, month))
}

/// Parse one event entry into `(YYYY-MM-DD, HH:MM)`.
///
/// Accepts localized free text like "Segunda 20/10 às 19h30" as well as
/// ISO-ish forms like "2025-10-20 19:30" or "2025-10-20_19:30".
fn parse_event_entry(text: &str, year: i32) -> Option<(String, String)> {
    let mut date: Option<NaiveDate> = None;
    let mut time: Option<String> = None;

    for token in text.split(|c: char| c.is_whitespace() || c == '_') {
        if date.is_none() {
            if let Ok(parsed) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
                date = Some(parsed);
                continue;
            }
            if let Some((day, month)) = split_day_month(token) {
                if let Some(parsed) = NaiveDate::from_ymd_opt(year, month, day) {
                    date = Some(parsed);
                    continue;
                }
            }
        }
        if time.is_none()
            && token.starts_with(|c: char| c.is_ascii_digit())
            && (token.contains(':') || token.to_lowercase().contains('h'))
        {
            time = normalize_time(token);
        }
    }

    Some((date?.format("%Y-%m-%d").to_string(), time?))
}

/// Map a localized or English day name to the canonical weekday token.
pub fn weekday_token(raw: &str) -> Option<Weekday> {
    let day = raw.trim().to_lowercase();
    const TABLE: [(&str, Weekday); 16] = [
        ("monday", Weekday::Mon),
        ("segunda", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("terça", Weekday::Tue),
        ("terca", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("quarta", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("quinta", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("sexta", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sábado", Weekday::Sat),
        ("sabado", Weekday::Sat),
        ("sunday", Weekday::Sun),
        ("domingo", Weekday::Sun),
    ];
    TABLE
        .iter()
        .find(|(name, _)| day.contains(name))
        .map(|(_, weekday)| *weekday)
}

/// Day-of-week of a `YYYY-MM-DD` date string, if parseable.
pub fn date_weekday(date: &str) -> Option<Weekday> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.weekday())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detects_versioned_format() {
        let raw = json!({
            "format_version": "2.0",
            "masses": {
                "2025-10-05": { "08:00:00": true, "10:00": false }
            },
            "weekdays": { "monday": true, "wednesday": true },
            "can_substitute": true,
            "notes": "prefers mornings"
        });

        let (record, unmapped) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert!(unmapped.is_empty());
        assert_eq!(record.dates.get("2025-10-05_08:00"), Some(&true));
        assert_eq!(record.dates.get("2025-10-05_10:00"), Some(&false));
        assert!(record.weekdays.contains(&Weekday::Mon));
        assert!(record.weekdays.contains(&Weekday::Wed));
        assert!(record.can_substitute);
        assert_eq!(record.notes.as_deref(), Some("prefers mornings"));
    }

    #[test]
    fn test_versioned_special_events_date_map() {
        let raw = json!({
            "format_version": "2.0",
            "special_events": {
                "feast": { "2025-10-28_19:30:00": true, "2025-10-28_07:00": false },
                "first_friday": true
            }
        });

        let (record, unmapped) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert!(unmapped.is_empty());
        let feast = record.special_events.get("feast").unwrap();
        assert_eq!(
            feast,
            &SpecialEventAvailability::Dates(BTreeMap::from([
                ("2025-10-28_19:30".to_string(), true),
                ("2025-10-28_07:00".to_string(), false),
            ]))
        );
        assert_eq!(
            record.special_events.get("first_friday"),
            Some(&SpecialEventAvailability::Whole(true))
        );
    }

    #[test]
    fn test_question_array_daily_mass_day_names() {
        let raw = json!([
            { "questionId": "daily_mass", "answer": ["Monday", "Wednesday"] }
        ]);

        let (record, unmapped) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert!(unmapped.is_empty());
        assert_eq!(
            record.weekdays,
            HashSet::from([Weekday::Mon, Weekday::Wed])
        );
    }

    #[test]
    fn test_question_array_localized_day_names() {
        let raw = json!([
            { "questionId": "daily_mass_availability", "answer": ["Segunda-feira", "Sexta"] }
        ]);

        let (record, _) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert_eq!(
            record.weekdays,
            HashSet::from([Weekday::Mon, Weekday::Fri])
        );
    }

    #[test]
    fn test_question_array_sundays_use_main_service_time() {
        // main_service_time appears after available_sundays; both passes are
        // needed for the hour to apply.
        let raw = json!([
            { "questionId": "available_sundays", "answer": ["Domingo 05/10", "Domingo 19/10"] },
            { "questionId": "main_service_time", "answer": "8h" }
        ]);

        let (record, unmapped) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert!(unmapped.is_empty());
        assert_eq!(record.dates.get("2025-10-05_08:00"), Some(&true));
        assert_eq!(record.dates.get("2025-10-19_08:00"), Some(&true));
    }

    #[test]
    fn test_question_array_monthly_availability_gate() {
        let raw = json!([
            { "questionId": "monthly_availability", "answer": "Não" },
            { "questionId": "available_sundays", "answer": ["Domingo 05/10"] },
            { "questionId": "daily_mass", "answer": ["Monday"] },
            { "questionId": "event_novena", "answer": ["Segunda 20/10 às 19h30"] }
        ]);

        let (record, _) = ResponseAdapter::adapt(&raw, 2025, 10);

        // Regular availability suppressed, event-specific kept.
        assert!(record.dates.is_empty());
        assert!(record.weekdays.is_empty());
        assert_eq!(
            record.special_events.get("novena"),
            Some(&SpecialEventAvailability::Dates(BTreeMap::from([(
                "2025-10-20_19:30".to_string(),
                true
            )])))
        );
    }

    #[test]
    fn test_question_array_none_markers_skipped() {
        let raw = json!([
            { "questionId": "available_sundays", "answer": ["Nenhum domingo"] },
            { "questionId": "event_novena", "answer": ["Nenhum dia"] }
        ]);

        let (record, unmapped) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert!(unmapped.is_empty());
        assert!(record.dates.is_empty());
        assert_eq!(
            record.special_events.get("novena"),
            Some(&SpecialEventAvailability::Dates(BTreeMap::new()))
        );
    }

    #[test]
    fn test_question_array_unknown_question_collected() {
        let raw = json!([
            { "questionId": "shoe_size", "answer": 42 },
            { "questionId": "can_substitute", "answer": "Sim" }
        ]);

        let (record, unmapped) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert!(record.can_substitute);
        assert_eq!(unmapped.len(), 1);
        assert_eq!(unmapped[0].field, "shoe_size");
    }

    #[test]
    fn test_legacy_fields_format() {
        let raw = json!({
            "available_sundays": ["Domingo 12/10"],
            "daily_mass_availability": ["Terça", "Quinta"],
            "canSubstitute": true
        });

        let (record, unmapped) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert!(unmapped.is_empty());
        assert_eq!(record.dates.get("2025-10-12_10:00"), Some(&true));
        assert_eq!(
            record.weekdays,
            HashSet::from([Weekday::Tue, Weekday::Thu])
        );
        assert!(record.can_substitute);
    }

    #[test]
    fn test_unknown_format_fully_unmapped() {
        let raw = json!("free text answer");

        let (record, unmapped) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert!(!record.has_any_availability());
        assert_eq!(unmapped.len(), 1);
        assert_eq!(unmapped[0].field, "$");
    }

    #[test]
    fn test_adapt_is_idempotent() {
        let raw = json!([
            { "questionId": "available_sundays", "answer": ["Domingo 05/10"] },
            { "questionId": "daily_mass", "answer": ["Monday", "Friday"] },
            { "questionId": "can_substitute", "answer": "Sim" }
        ]);

        let (first, _) = ResponseAdapter::adapt(&raw, 2025, 10);
        let (second, _) = ResponseAdapter::adapt(&raw, 2025, 10);

        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_time_variants() {
        assert_eq!(normalize_time("08:00").as_deref(), Some("08:00"));
        assert_eq!(normalize_time("08:00:00").as_deref(), Some("08:00"));
        assert_eq!(normalize_time("8h").as_deref(), Some("08:00"));
        assert_eq!(normalize_time("19h30").as_deref(), Some("19:30"));
        assert_eq!(normalize_time("8:5").as_deref(), Some("08:05"));
        assert_eq!(normalize_time("25:00"), None);
        assert_eq!(normalize_time("soon"), None);
    }

    #[test]
    fn test_parse_event_entry_variants() {
        assert_eq!(
            parse_event_entry("Segunda 20/10 às 19h30", 2025),
            Some(("2025-10-20".to_string(), "19:30".to_string()))
        );
        assert_eq!(
            parse_event_entry("2025-10-28 07:00", 2025),
            Some(("2025-10-28".to_string(), "07:00".to_string()))
        );
        assert_eq!(parse_event_entry("sometime in october", 2025), None);
    }

    #[test]
    fn test_substitute_pool_sorted() {
        let mut records = HashMap::new();
        let mut yes = AvailabilityRecord::empty(2025, 10);
        yes.can_substitute = true;
        records.insert("m2".to_string(), yes.clone());
        records.insert("m1".to_string(), yes);
        records.insert("m3".to_string(), AvailabilityRecord::empty(2025, 10));

        assert_eq!(substitute_pool(&records), vec!["m1", "m2"]);
    }
}
