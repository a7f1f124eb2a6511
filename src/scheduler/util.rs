use crate::availability::{AvailabilityIndex, SlotOverrides};
use crate::model::{Duty, Person, PersonId, Roster, RosterId};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

/// Jour de semaine 0 = lundi … 6 = dimanche.
pub(crate) fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Personnes actives disponibles à (jour, heure), dans l'ordre fourni,
/// sans doublon d'identifiant.
pub(crate) fn candidates<'a>(
    people: &'a [Person],
    availability: &AvailabilityIndex,
    weekday: u8,
    hour: u8,
) -> Vec<&'a Person> {
    let mut seen = HashSet::new();
    people
        .iter()
        .filter(|p| p.active)
        .filter(|p| availability.is_available(&p.id, weekday, hour))
        .filter(|p| seen.insert(&p.id))
        .collect()
}

/// Effectif cible : surcharge, sinon défaut du roster, sinon tous les candidats.
pub(crate) fn target_headcount(
    roster: &Roster,
    overrides: &SlotOverrides,
    date: NaiveDate,
    hour: u8,
    candidate_count: usize,
) -> u32 {
    overrides
        .get(date, hour)
        .or_else(|| roster.default_headcount())
        .unwrap_or(candidate_count as u32)
}

pub(crate) fn find_duty_index(
    duties: &[Duty],
    roster: &RosterId,
    date: NaiveDate,
    hour: u8,
    person: Option<&PersonId>,
) -> Option<usize> {
    duties
        .iter()
        .position(|d| d.is_at(roster, date, hour) && d.person.as_ref() == person)
}
