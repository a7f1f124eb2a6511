use super::{util, SchedError, Scheduler};
use crate::model::{is_schedulable_hour, Duty, DutyId, PersonId, RosterId, RosterSlot};
use chrono::NaiveDate;
use tracing::debug;

pub(super) fn assign(
    scheduler: &mut Scheduler,
    roster_id: &RosterId,
    date: NaiveDate,
    hour: u8,
    person: &PersonId,
) -> Result<DutyId, SchedError> {
    check_slot(scheduler, roster_id, date, hour)?;
    let handle = scheduler
        .ledger
        .find_person_by_id(person)
        .map(|p| p.handle.clone())
        .ok_or_else(|| SchedError::UnknownPerson(person.as_str().to_string()))?;

    let duties = &mut scheduler.ledger.duties;
    if util::find_duty_index(duties, roster_id, date, hour, Some(person)).is_some() {
        return Err(SchedError::AlreadyAssigned {
            person: handle,
            date,
            hour,
        });
    }

    if let Some(pos) = util::find_duty_index(duties, roster_id, date, hour, None) {
        duties[pos].person = Some(person.clone());
        debug!(%date, hour, person = %person, "filled open duty");
        return Ok(duties[pos].id.clone());
    }

    let duty = Duty::assigned(roster_id, date, hour, person.clone());
    let id = duty.id.clone();
    duties.push(duty);
    debug!(%date, hour, person = %person, "appended duty");
    Ok(id)
}

pub(super) fn unassign(
    scheduler: &mut Scheduler,
    roster_id: &RosterId,
    date: NaiveDate,
    hour: u8,
    person: &PersonId,
) -> Result<bool, SchedError> {
    check_slot(scheduler, roster_id, date, hour)?;

    let duties = &mut scheduler.ledger.duties;
    let Some(pos) = util::find_duty_index(duties, roster_id, date, hour, Some(person)) else {
        return Ok(false);
    };
    // la ligne reste, la place redevient libre
    duties[pos].person = None;
    debug!(%date, hour, person = %person, "duty released");
    Ok(true)
}

/// Tout ou rien : une seule surcharge invalide laisse les anciennes en place.
pub(super) fn replace_slots(
    scheduler: &mut Scheduler,
    roster_id: &RosterId,
    slots: Vec<RosterSlot>,
) -> Result<usize, SchedError> {
    if scheduler.ledger.find_roster(roster_id).is_none() {
        return Err(SchedError::unknown_roster(roster_id));
    }
    for slot in &slots {
        if &slot.roster != roster_id {
            return Err(SchedError::InvalidSlot {
                date: slot.date,
                hour: slot.hour,
                reason: "slot belongs to another roster",
            });
        }
        check_slot(scheduler, roster_id, slot.date, slot.hour)?;
    }
    let count = slots.len();
    scheduler.ledger.replace_slots(roster_id, slots);
    debug!(roster = %roster_id, count, "slot overrides replaced");
    Ok(count)
}

pub(super) fn rename_person(
    scheduler: &mut Scheduler,
    person: &PersonId,
    display_name: &str,
) -> Result<(), SchedError> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(SchedError::EmptyDisplayName);
    }
    let p = scheduler
        .ledger
        .find_person_mut_by_id(person)
        .ok_or_else(|| SchedError::UnknownPerson(person.as_str().to_string()))?;
    debug!(handle = %p.handle, from = %p.display_name, to = display_name, "person renamed");
    p.display_name = display_name.to_string();
    Ok(())
}

fn check_slot(
    scheduler: &Scheduler,
    roster_id: &RosterId,
    date: NaiveDate,
    hour: u8,
) -> Result<(), SchedError> {
    let roster = scheduler
        .ledger
        .find_roster(roster_id)
        .ok_or_else(|| SchedError::unknown_roster(roster_id))?;
    if !is_schedulable_hour(hour) {
        return Err(SchedError::InvalidSlot {
            date,
            hour,
            reason: "hour outside 6..=24",
        });
    }
    if !roster.contains(date) {
        return Err(SchedError::InvalidSlot {
            date,
            hour,
            reason: "date outside roster range",
        });
    }
    Ok(())
}
