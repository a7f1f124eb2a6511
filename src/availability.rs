//! Disponibilités hebdomadaires, surcharges d'effectif et historique.
//!
//! Index en lecture seule construits depuis le [`Ledger`] au moment d'une
//! planification.

use crate::model::{is_schedulable_hour, Duty, Ledger, PersonId, RosterId};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Parse une liste d'heures `"8,9,10"`.
///
/// Les fragments non entiers ou hors de la plage 6..=24 sont ignorés
/// sans erreur.
pub fn parse_hours(raw: &str) -> BTreeSet<u8> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<u8>().ok())
        .filter(|hour| is_schedulable_hour(*hour))
        .collect()
}

/// Forme persistée d'un ensemble d'heures, ordre croissant.
pub fn format_hours(hours: &BTreeSet<u8>) -> String {
    let mut buf = itoa::Buffer::new();
    let mut out = String::with_capacity(hours.len() * 3);
    for (i, hour) in hours.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(buf.format(*hour));
    }
    out
}

/// Disponibilités : (personne, jour de semaine) -> heures.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    by_person_day: HashMap<(PersonId, u8), BTreeSet<u8>>,
}

impl AvailabilityIndex {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut index = Self::default();
        for avail in &ledger.availabilities {
            index.insert(avail.person.clone(), avail.weekday, avail.hours());
        }
        index
    }

    /// Un enregistrement par (personne, jour) : le dernier inséré l'emporte.
    pub fn insert(&mut self, person: PersonId, weekday: u8, hours: BTreeSet<u8>) {
        if hours.is_empty() {
            self.by_person_day.remove(&(person, weekday));
        } else {
            self.by_person_day.insert((person, weekday), hours);
        }
    }

    pub fn hours(&self, person: &PersonId, weekday: u8) -> Option<&BTreeSet<u8>> {
        self.by_person_day.get(&(person.clone(), weekday))
    }

    pub fn is_available(&self, person: &PersonId, weekday: u8, hour: u8) -> bool {
        self.hours(person, weekday)
            .is_some_and(|hours| hours.contains(&hour))
    }
}

/// Effectif requis par (date, heure) pour un roster.
#[derive(Debug, Clone, Default)]
pub struct SlotOverrides {
    counts: HashMap<(NaiveDate, u8), u32>,
}

impl SlotOverrides {
    pub fn for_roster(ledger: &Ledger, roster: &RosterId) -> Self {
        let mut overrides = Self::default();
        for slot in ledger.slots_of(roster) {
            overrides.insert(slot.date, slot.hour, slot.required_count);
        }
        overrides
    }

    pub fn insert(&mut self, date: NaiveDate, hour: u8, required: u32) {
        self.counts.insert((date, hour), required);
    }

    pub fn get(&self, date: NaiveDate, hour: u8) -> Option<u32> {
        self.counts.get(&(date, hour)).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Nombre total de permanences tenues par personne, tous rosters confondus.
#[derive(Debug, Clone, Default)]
pub struct DutyHistory {
    counts: HashMap<PersonId, u64>,
}

impl DutyHistory {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        Self::from_duties(&ledger.duties)
    }

    pub fn from_duties<'a, I>(duties: I) -> Self
    where
        I: IntoIterator<Item = &'a Duty>,
    {
        let mut history = Self::default();
        for person in duties.into_iter().filter_map(|d| d.person.as_ref()) {
            *history.counts.entry(person.clone()).or_default() += 1;
        }
        history
    }

    pub fn set(&mut self, person: PersonId, count: u64) {
        self.counts.insert(person, count);
    }

    pub fn count(&self, person: &PersonId) -> u64 {
        self.counts.get(person).copied().unwrap_or(0)
    }
}
