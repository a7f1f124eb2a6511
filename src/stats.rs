use crate::availability::DutyHistory;
use crate::model::{Duty, Ledger, PersonId};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Ligne de l'historique d'une personne.
#[derive(Debug, Clone)]
pub struct PersonStats {
    pub person: PersonId,
    pub handle: String,
    pub display_name: String,
    pub hours: u32,
    pub recent: Vec<Duty>,
}

/// Aligne `stats_hours` de chaque personne sur son nombre réel de permanences.
pub fn apply_stats(ledger: &mut Ledger) {
    let history = DutyHistory::from_ledger(ledger);
    for person in ledger.people.iter_mut() {
        person.stats_hours = u32::try_from(history.count(&person.id)).unwrap_or(u32::MAX);
    }
}

/// Remet le compteur d'une personne à zéro et note la date.
pub fn reset_stats(ledger: &mut Ledger, person: &PersonId, now: DateTime<Utc>) -> Result<()> {
    let person = ledger
        .find_person_mut_by_id(person)
        .with_context(|| format!("unknown person: {person}"))?;
    person.stats_hours = 0;
    person.stats_reset_at = Some(now);
    Ok(())
}

/// Historique : compteur et `recent` dernières permanences par personne,
/// trié par compteur décroissant.
pub fn history_report(ledger: &Ledger, recent: usize) -> Vec<PersonStats> {
    let mut out: Vec<PersonStats> = ledger
        .people
        .iter()
        .map(|p| {
            let mut duties: Vec<Duty> = ledger
                .duties
                .iter()
                .filter(|d| d.person.as_ref() == Some(&p.id))
                .cloned()
                .collect();
            duties.sort_by(|a, b| (b.date, b.hour).cmp(&(a.date, a.hour)));
            duties.truncate(recent);
            PersonStats {
                person: p.id.clone(),
                handle: p.handle.clone(),
                display_name: p.display_name.clone(),
                hours: p.stats_hours,
                recent: duties,
            }
        })
        .collect();
    out.sort_by(|a, b| {
        b.hours
            .cmp(&a.hours)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    out
}
