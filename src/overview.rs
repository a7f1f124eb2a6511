//! Vue de lecture d'un roster : qui est de permanence, places libres,
//! personnes sans créneau et grille des disponibilités.

use crate::availability::AvailabilityIndex;
use crate::model::{day_hours, Duty, Ledger, PersonId, Roster, RosterId};
use crate::scheduler::SchedError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct RosterOverview {
    pub roster: Roster,
    pub days: Vec<NaiveDate>,
    pub by_slot: BTreeMap<(NaiveDate, u8), Vec<Duty>>,
    /// Permanences par personne, triées par (date, heure).
    pub by_person: BTreeMap<PersonId, Vec<Duty>>,
    pub open_slots: Vec<(NaiveDate, u8)>,
    /// Actives mais sans aucune permanence dans ce roster.
    pub idle_people: Vec<PersonId>,
    /// Inactives, donc exclues de l'auto-planification.
    pub excluded_people: Vec<PersonId>,
    /// date -> heure -> personnes disponibles (actives ou non).
    pub availability: BTreeMap<NaiveDate, BTreeMap<u8, Vec<PersonId>>>,
}

impl RosterOverview {
    pub fn build(ledger: &Ledger, roster_id: &RosterId) -> Result<Self, SchedError> {
        let roster = ledger
            .find_roster(roster_id)
            .cloned()
            .ok_or_else(|| SchedError::unknown_roster(roster_id))?;
        let days: Vec<NaiveDate> = roster.days().collect();

        let mut by_slot: BTreeMap<(NaiveDate, u8), Vec<Duty>> = BTreeMap::new();
        let mut by_person: BTreeMap<PersonId, Vec<Duty>> = BTreeMap::new();
        let mut open_slots = Vec::new();
        for duty in ledger.duties_of(roster_id) {
            by_slot
                .entry((duty.date, duty.hour))
                .or_default()
                .push(duty.clone());
            match &duty.person {
                Some(person) => by_person.entry(person.clone()).or_default().push(duty.clone()),
                None => open_slots.push((duty.date, duty.hour)),
            }
        }
        for duties in by_person.values_mut() {
            duties.sort_by_key(|d| (d.date, d.hour));
        }
        open_slots.sort();

        let mut people: Vec<_> = ledger.people.iter().collect();
        people.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        let idle_people: Vec<PersonId> = people
            .iter()
            .filter(|p| p.active && !by_person.contains_key(&p.id))
            .map(|p| p.id.clone())
            .collect();
        let excluded_people: Vec<PersonId> = people
            .iter()
            .filter(|p| !p.active)
            .map(|p| p.id.clone())
            .collect();

        let index = AvailabilityIndex::from_ledger(ledger);
        let availability = days
            .iter()
            .map(|date| {
                let weekday = crate::scheduler::weekday_index(*date);
                let grid: BTreeMap<u8, Vec<PersonId>> = day_hours()
                    .map(|hour| {
                        let available: Vec<PersonId> = people
                            .iter()
                            .filter(|p| index.is_available(&p.id, weekday, hour))
                            .map(|p| p.id.clone())
                            .collect();
                        (hour, available)
                    })
                    .collect();
                (*date, grid)
            })
            .collect();

        Ok(Self {
            roster,
            days,
            by_slot,
            by_person,
            open_slots,
            idle_people,
            excluded_people,
            availability,
        })
    }

    pub fn duties_at(&self, date: NaiveDate, hour: u8) -> &[Duty] {
        self.by_slot
            .get(&(date, hour))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
