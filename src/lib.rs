#![forbid(unsafe_code)]
//! Duty roster — planification de permanences horaires (sans BD).
//!
//! - Disponibilités hebdomadaires récurrentes, heures 6..=24.
//! - Auto-planification gloutonne : équité de charge, continuité, effectif par créneau.
//! - Ajustements manuels, contrôle de cohérence, statistiques.
//! - Stockage fichiers (JSON/CSV), écriture atomique.

pub mod availability;
pub mod io;
pub mod model;
pub mod overview;
pub mod scheduler;
pub mod stats;
pub mod storage;

pub use availability::{format_hours, parse_hours, AvailabilityIndex, DutyHistory, SlotOverrides};
pub use model::{
    Duty, DutyId, Ledger, Person, PersonId, Roster, RosterId, RosterSlot, WeeklyAvailability,
};
pub use overview::RosterOverview;
pub use scheduler::{
    schedule, Conflict, ConflictKind, SchedError, ScheduleOptions, ScheduleSummary, Scheduler,
};
pub use stats::{apply_stats, history_report, reset_stats, PersonStats};
pub use storage::{JsonStorage, Storage};
