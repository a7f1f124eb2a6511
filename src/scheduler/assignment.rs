use super::{types::SchedError, util, ScheduleOptions, ScheduleSummary, Scheduler};
use crate::availability::{AvailabilityIndex, DutyHistory, SlotOverrides};
use crate::model::{day_hours, Duty, Person, PersonId, Roster, RosterId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Calcule les permanences d'un roster, heure par heure, jour par jour.
///
/// Pour chaque créneau, les candidats disponibles sont triés par charge
/// croissante (historique + permanences déjà attribuées pendant ce calcul).
/// Une personne présente l'heure précédente du même jour voit son score
/// diminué de `opts.continuity_bonus`. Les égalités sont départagées par un
/// mélange préalable avec `rng`, suivi d'un tri stable.
///
/// Chaque créneau produit exactement autant de lignes que l'effectif cible ;
/// les places non pourvues sont des [`Duty`] sans personne.
pub fn schedule<R: Rng + ?Sized>(
    roster: &Roster,
    people: &[Person],
    availability: &AvailabilityIndex,
    overrides: &SlotOverrides,
    history: &DutyHistory,
    opts: ScheduleOptions,
    rng: &mut R,
) -> Result<Vec<Duty>, SchedError> {
    if !roster.is_valid_range() {
        return Err(SchedError::InvalidDateRange {
            start: roster.start_date,
            end: roster.end_date,
        });
    }

    let mut load: HashMap<&PersonId, i64> = people
        .iter()
        .filter(|p| p.active)
        .map(|p| (&p.id, i64::try_from(history.count(&p.id)).unwrap_or(i64::MAX)))
        .collect();
    let mut out = Vec::new();

    for date in roster.days() {
        let weekday = util::weekday_index(date);
        let mut previous: HashSet<&PersonId> = HashSet::new();

        for hour in day_hours() {
            let pool = util::candidates(people, availability, weekday, hour);
            let target = util::target_headcount(roster, overrides, date, hour, pool.len());
            if let Some(required) = overrides.get(date, hour) {
                debug!(%date, hour, required, "slot override applied");
            }

            if pool.is_empty() {
                out.extend((0..target).map(|_| Duty::open(&roster.id, date, hour)));
                previous.clear();
                continue;
            }

            let mut scored: Vec<(i64, &Person)> = pool
                .into_iter()
                .map(|person| {
                    let mut score = load.get(&person.id).copied().unwrap_or(0);
                    if previous.contains(&person.id) {
                        score = score.saturating_sub(opts.continuity_bonus);
                    }
                    (score, person)
                })
                .collect();
            scored.shuffle(rng);
            scored.sort_by_key(|(score, _)| *score);

            let mut current = HashSet::new();
            for (_, person) in scored.into_iter().take(target as usize) {
                out.push(Duty::assigned(&roster.id, date, hour, person.id.clone()));
                *load.entry(&person.id).or_default() += 1;
                current.insert(&person.id);
            }

            let shortfall = (target as usize).saturating_sub(current.len());
            if shortfall > 0 {
                warn!(%date, hour, target, shortfall, "slot left short-staffed");
                out.extend((0..shortfall).map(|_| Duty::open(&roster.id, date, hour)));
            }

            previous = current;
        }
    }

    Ok(out)
}

pub(super) fn auto_schedule<R: Rng + ?Sized>(
    scheduler: &mut Scheduler,
    roster_id: &RosterId,
    opts: ScheduleOptions,
    rng: &mut R,
) -> Result<ScheduleSummary, SchedError> {
    let ledger = &scheduler.ledger;
    let roster = ledger
        .find_roster(roster_id)
        .ok_or_else(|| SchedError::unknown_roster(roster_id))?;

    let availability = AvailabilityIndex::from_ledger(ledger);
    let overrides = SlotOverrides::for_roster(ledger, roster_id);
    // les permanences actuelles de ce roster vont être remplacées
    let history = DutyHistory::from_duties(ledger.duties.iter().filter(|d| &d.roster != roster_id));
    info!(
        roster = %roster_id,
        start = %roster.start_date,
        end = %roster.end_date,
        overrides = overrides.len(),
        "auto schedule"
    );

    let duties = schedule(
        roster,
        &ledger.people,
        &availability,
        &overrides,
        &history,
        opts,
        rng,
    )?;
    let summary = summarize(roster, &duties);

    scheduler.ledger.duties.retain(|d| &d.roster != roster_id);
    scheduler.ledger.duties.extend(duties);

    info!(
        roster = %roster_id,
        slots = summary.slots,
        filled = summary.filled,
        open = summary.open,
        "auto schedule done"
    );
    Ok(summary)
}

fn summarize(roster: &Roster, duties: &[Duty]) -> ScheduleSummary {
    let open = duties.iter().filter(|d| d.is_open()).count();
    ScheduleSummary {
        slots: roster.days().count() * day_hours().count(),
        duties: duties.len(),
        filled: duties.len() - open,
        open,
    }
}
