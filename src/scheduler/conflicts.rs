use super::{util, Conflict, ConflictKind, SchedError, Scheduler};
use crate::availability::{AvailabilityIndex, SlotOverrides};
use crate::model::{day_hours, Duty, PersonId, RosterId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

pub(super) fn detect_conflicts(
    scheduler: &Scheduler,
    roster_id: &RosterId,
) -> Result<Vec<Conflict>, SchedError> {
    let ledger = &scheduler.ledger;
    let roster = ledger
        .find_roster(roster_id)
        .ok_or_else(|| SchedError::unknown_roster(roster_id))?;
    let availability = AvailabilityIndex::from_ledger(ledger);
    let overrides = SlotOverrides::for_roster(ledger, roster_id);

    let mut by_slot: BTreeMap<(NaiveDate, u8), Vec<&Duty>> = BTreeMap::new();
    for duty in ledger.duties_of(roster_id) {
        by_slot.entry((duty.date, duty.hour)).or_default().push(duty);
    }

    let mut out = Vec::new();

    for ((date, hour), duties) in &by_slot {
        let (date, hour) = (*date, *hour);
        let weekday = util::weekday_index(date);
        let mut seen: HashSet<&PersonId> = HashSet::new();

        for duty in duties {
            let Some(person) = duty.person.as_ref() else {
                continue;
            };
            let mut push = |kind| {
                out.push(Conflict {
                    date,
                    hour,
                    person: Some(person.clone()),
                    duty: Some(duty.id.clone()),
                    kind,
                })
            };
            if !seen.insert(person) {
                push(ConflictKind::DoubleAssignment);
            }
            if !availability.is_available(person, weekday, hour) {
                push(ConflictKind::OutsideAvailability);
            }
            if ledger.find_person_by_id(person).is_some_and(|p| !p.active) {
                push(ConflictKind::InactivePerson);
            }
        }
    }

    for date in roster.days() {
        let weekday = util::weekday_index(date);
        for hour in day_hours() {
            let candidates = util::candidates(&ledger.people, &availability, weekday, hour);
            let required =
                util::target_headcount(roster, &overrides, date, hour, candidates.len());
            let filled = by_slot
                .get(&(date, hour))
                .map(|duties| duties.iter().filter(|d| !d.is_open()).count())
                .unwrap_or(0) as u32;
            if filled < required {
                out.push(Conflict {
                    date,
                    hour,
                    person: None,
                    duty: None,
                    kind: ConflictKind::Understaffed { required, filled },
                });
            }
        }
    }

    out.sort_by_key(|c| (c.date, c.hour));
    Ok(out)
}
