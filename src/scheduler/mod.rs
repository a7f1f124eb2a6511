mod assignment;
mod conflicts;
mod mutate;
mod types;
mod util;

pub use assignment::schedule;
pub use types::{Conflict, ConflictKind, SchedError, ScheduleOptions, ScheduleSummary};
pub(crate) use util::weekday_index;

use crate::model::{DutyId, Ledger, Person, PersonId, Roster, RosterId, RosterSlot};
use chrono::NaiveDate;
use rand::Rng;

/// Scheduler : encapsule le Ledger en cours de modification
#[derive(Debug, Default)]
pub struct Scheduler {
    ledger: Ledger,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            ledger: Ledger::default(),
        }
    }

    pub fn from_ledger(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }
    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    pub fn add_people(&mut self, people: Vec<Person>) {
        self.ledger.people.extend(people);
    }

    /// Crée un roster ; `end` doit être postérieur ou égal à `start`.
    pub fn create_roster(
        &mut self,
        title: &str,
        start: NaiveDate,
        end: NaiveDate,
        people_per_shift: Option<u32>,
    ) -> Result<RosterId, SchedError> {
        let roster = Roster::new(title, start, end, people_per_shift)
            .map_err(|_| SchedError::InvalidDateRange { start, end })?;
        let id = roster.id.clone();
        self.ledger.rosters.push(roster);
        Ok(id)
    }

    /// Remplace les surcharges d'effectif d'un roster après validation
    /// (heure 6..=24, date dans la période) ; renvoie le nombre stocké.
    pub fn replace_slots(
        &mut self,
        roster: &RosterId,
        slots: Vec<RosterSlot>,
    ) -> Result<usize, SchedError> {
        mutate::replace_slots(self, roster, slots)
    }

    /// Renomme une personne (affichage seulement, le handle ne change pas).
    pub fn rename_person(
        &mut self,
        person: &PersonId,
        display_name: &str,
    ) -> Result<(), SchedError> {
        mutate::rename_person(self, person, display_name)
    }

    /// Recalcule entièrement les permanences d'un roster.
    ///
    /// Le nouvel ensemble est calculé avant toute modification : en cas
    /// d'erreur, le ledger reste inchangé.
    pub fn auto_schedule<R: Rng + ?Sized>(
        &mut self,
        roster: &RosterId,
        opts: ScheduleOptions,
        rng: &mut R,
    ) -> Result<ScheduleSummary, SchedError> {
        assignment::auto_schedule(self, roster, opts, rng)
    }

    pub fn assign(
        &mut self,
        roster: &RosterId,
        date: NaiveDate,
        hour: u8,
        person: &PersonId,
    ) -> Result<DutyId, SchedError> {
        mutate::assign(self, roster, date, hour, person)
    }

    /// Libère la place d'une personne ; `false` si elle n'était pas de permanence.
    pub fn unassign(
        &mut self,
        roster: &RosterId,
        date: NaiveDate,
        hour: u8,
        person: &PersonId,
    ) -> Result<bool, SchedError> {
        mutate::unassign(self, roster, date, hour, person)
    }

    pub fn detect_conflicts(&self, roster: &RosterId) -> Result<Vec<Conflict>, SchedError> {
        conflicts::detect_conflicts(self, roster)
    }
}
