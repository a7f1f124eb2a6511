use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Première heure planifiable d'une journée.
pub const FIRST_HOUR: u8 = 6;
/// Dernière heure planifiable (24 = minuit, fin de journée).
pub const LAST_HOUR: u8 = 24;

/// Heures planifiables d'une journée, dans l'ordre (19 créneaux).
pub fn day_hours() -> impl Iterator<Item = u8> {
    FIRST_HOUR..=LAST_HOUR
}

pub fn is_schedulable_hour(hour: u8) -> bool {
    (FIRST_HOUR..=LAST_HOUR).contains(&hour)
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Person
    PersonId
);
string_id!(
    /// Identifiant fort pour Roster
    RosterId
);
string_id!(
    /// Identifiant fort pour Duty
    DutyId
);

fn default_true() -> bool {
    true
}

/// Personne pouvant être mise de permanence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub handle: String,
    pub display_name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Compteur affiché dans l'historique ; jamais lu par l'auto-planification.
    #[serde(default)]
    pub stats_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_reset_at: Option<DateTime<Utc>>,
}

impl Person {
    pub fn new<H: Into<String>, D: Into<String>>(handle: H, display_name: D) -> Self {
        Self {
            id: PersonId::random(),
            handle: handle.into(),
            display_name: display_name.into(),
            active: true,
            stats_hours: 0,
            stats_reset_at: None,
        }
    }
}

/// Disponibilité hebdomadaire récurrente d'une personne pour un jour donné.
///
/// `weekday` : 0 = lundi … 6 = dimanche. `available_time` garde la forme
/// persistée (`"8,9,10"`) ; voir [`crate::availability::parse_hours`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    pub person: PersonId,
    pub weekday: u8,
    pub available_time: String,
}

impl WeeklyAvailability {
    pub fn hours(&self) -> BTreeSet<u8> {
        crate::availability::parse_hours(&self.available_time)
    }
}

/// Période planifiée (dates incluses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub id: RosterId,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    /// Effectif par créneau ; `None` = toutes les personnes disponibles.
    #[serde(default)]
    pub people_per_shift: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Roster {
    /// Crée un roster en validant que `end_date >= start_date`.
    pub fn new<T: Into<String>>(
        title: T,
        start_date: NaiveDate,
        end_date: NaiveDate,
        people_per_shift: Option<u32>,
    ) -> Result<Self, String> {
        if end_date < start_date {
            return Err("end date must not be before start date".to_string());
        }
        Ok(Self {
            id: RosterId::random(),
            title: title.into(),
            start_date,
            end_date,
            event_time: None,
            people_per_shift,
            created_at: Utc::now(),
        })
    }

    pub fn is_valid_range(&self) -> bool {
        self.start_date <= self.end_date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Jours de la période, dans l'ordre chronologique.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }

    /// Effectif par défaut ; zéro est traité comme non renseigné.
    pub fn default_headcount(&self) -> Option<u32> {
        self.people_per_shift.filter(|n| *n > 0)
    }
}

/// Surcharge de l'effectif requis pour un (roster, date, heure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub roster: RosterId,
    pub date: NaiveDate,
    pub hour: u8,
    pub required_count: u32,
}

fn default_shift_type() -> String {
    "Day".to_string()
}

/// Une ligne de permanence ; `person == None` = place non pourvue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    pub id: DutyId,
    pub roster: RosterId,
    pub date: NaiveDate,
    pub hour: u8,
    pub person: Option<PersonId>,
    #[serde(default = "default_shift_type")]
    pub shift_type: String,
}

impl Duty {
    pub fn assigned(roster: &RosterId, date: NaiveDate, hour: u8, person: PersonId) -> Self {
        Self {
            person: Some(person),
            ..Self::open(roster, date, hour)
        }
    }

    pub fn open(roster: &RosterId, date: NaiveDate, hour: u8) -> Self {
        Self {
            id: DutyId::random(),
            roster: roster.clone(),
            date,
            hour,
            person: None,
            shift_type: default_shift_type(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.person.is_none()
    }

    pub fn is_at(&self, roster: &RosterId, date: NaiveDate, hour: u8) -> bool {
        &self.roster == roster && self.date == date && self.hour == hour
    }
}

/// Document persisté : personnes, disponibilités, rosters, surcharges, permanences.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Ledger {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub availabilities: Vec<WeeklyAvailability>,
    #[serde(default)]
    pub rosters: Vec<Roster>,
    #[serde(default)]
    pub slots: Vec<RosterSlot>,
    #[serde(default)]
    pub duties: Vec<Duty>,
}

impl Ledger {
    pub fn find_person_by_handle<'a>(&'a self, handle: &str) -> Option<&'a Person> {
        self.people.iter().find(|p| p.handle == handle)
    }
    pub fn find_person_by_id<'a>(&'a self, id: &PersonId) -> Option<&'a Person> {
        self.people.iter().find(|p| &p.id == id)
    }
    pub fn find_person_mut_by_id(&mut self, id: &PersonId) -> Option<&mut Person> {
        self.people.iter_mut().find(|p| &p.id == id)
    }
    pub fn find_roster<'a>(&'a self, id: &RosterId) -> Option<&'a Roster> {
        self.rosters.iter().find(|r| &r.id == id)
    }

    pub fn duties_of<'a>(&'a self, roster: &'a RosterId) -> impl Iterator<Item = &'a Duty> + 'a {
        self.duties.iter().filter(move |d| &d.roster == roster)
    }

    pub fn slots_of<'a>(&'a self, roster: &'a RosterId) -> impl Iterator<Item = &'a RosterSlot> + 'a {
        self.slots.iter().filter(move |s| &s.roster == roster)
    }

    /// Remplace la disponibilité d'un jour ; une chaîne vide la supprime.
    pub fn set_availability(&mut self, person: &PersonId, weekday: u8, available_time: &str) {
        self.availabilities
            .retain(|a| !(&a.person == person && a.weekday == weekday));
        if !available_time.trim().is_empty() {
            self.availabilities.push(WeeklyAvailability {
                person: person.clone(),
                weekday,
                available_time: available_time.trim().to_string(),
            });
        }
    }

    /// Remplace toutes les surcharges d'effectif d'un roster, sans validation ;
    /// voir `Scheduler::replace_slots`.
    pub(crate) fn replace_slots(&mut self, roster: &RosterId, slots: Vec<RosterSlot>) {
        self.slots.retain(|s| &s.roster != roster);
        self.slots
            .extend(slots.into_iter().filter(|s| &s.roster == roster));
    }

    /// Supprime un roster avec ses permanences et surcharges.
    pub fn remove_roster(&mut self, roster: &RosterId) -> Option<Roster> {
        let pos = self.rosters.iter().position(|r| &r.id == roster)?;
        self.duties.retain(|d| &d.roster != roster);
        self.slots.retain(|s| &s.roster != roster);
        Some(self.rosters.remove(pos))
    }

    /// Supprime une personne ; ses permanences redeviennent des places libres.
    pub fn remove_person(&mut self, person: &PersonId) -> Option<Person> {
        let pos = self.people.iter().position(|p| &p.id == person)?;
        self.availabilities.retain(|a| &a.person != person);
        for duty in self
            .duties
            .iter_mut()
            .filter(|d| d.person.as_ref() == Some(person))
        {
            duty.person = None;
        }
        Some(self.people.remove(pos))
    }
}
