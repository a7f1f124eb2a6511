use crate::model::{DutyId, PersonId, RosterId};
use chrono::NaiveDate;
use thiserror::Error;

/// Options de planification automatique
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
    /// Retranché au score d'une personne déjà présente l'heure précédente.
    pub continuity_bonus: i64,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            continuity_bonus: 1000,
        }
    }
}

/// Bilan d'une exécution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleSummary {
    pub slots: usize,
    pub duties: usize,
    pub filled: usize,
    pub open: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    DoubleAssignment,
    OutsideAvailability,
    InactivePerson,
    Understaffed { required: u32, filled: u32 },
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub date: NaiveDate,
    pub hour: u8,
    pub person: Option<PersonId>,
    pub duty: Option<DutyId>,
    pub kind: ConflictKind,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown roster: {0}")]
    UnknownRoster(String),
    #[error("unknown person: {0}")]
    UnknownPerson(String),
    #[error("invalid slot {date} {hour}h: {reason}")]
    InvalidSlot {
        date: NaiveDate,
        hour: u8,
        reason: &'static str,
    },
    #[error("{person} is already on duty at {date} {hour}h")]
    AlreadyAssigned {
        person: String,
        date: NaiveDate,
        hour: u8,
    },
    #[error("display name must not be empty")]
    EmptyDisplayName,
}

impl SchedError {
    pub(crate) fn unknown_roster(id: &RosterId) -> Self {
        Self::UnknownRoster(id.as_str().to_string())
    }
}
