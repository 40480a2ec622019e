use crate::availability::{AvailabilityRecord, SpecialEventAvailability};
use crate::calendar::{MassCategory, MassSlot};
use crate::minister::Minister;

/// Decide whether `minister` may serve at `slot` given their adapted
/// availability.
///
/// Pure over its three inputs; the assignment engine relies on this for
/// deterministic iteration.
///
/// Rules:
/// - inactive ministers and administrators are never eligible,
/// - an explicit `date_time` entry grants any slot at that date and time,
/// - special-event slots additionally accept the event category's own
///   availability; absence of any entry means not eligible,
/// - regular slots additionally accept the slot's weekday token.
pub fn is_eligible(minister: &Minister, slot: &MassSlot, record: &AvailabilityRecord) -> bool {
    if !minister.is_active() || !minister.role.serves() {
        return false;
    }

    let key = slot.date_time_key();

    match &slot.category {
        MassCategory::SpecialEvent(category) => {
            let by_category = match record.special_events.get(category) {
                Some(SpecialEventAvailability::Whole(available)) => *available,
                Some(SpecialEventAvailability::Dates(dates)) => {
                    dates.get(&key).copied().unwrap_or(false)
                }
                None => false,
            };
            by_category || record.dates.get(&key).copied().unwrap_or(false)
        }
        MassCategory::Regular => {
            if record.dates.get(&key).copied().unwrap_or(false) {
                return true;
            }
            record.weekdays.contains(&slot.weekday())
        }
    }
}
