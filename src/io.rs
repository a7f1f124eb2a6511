use crate::model::{
    is_schedulable_hour, Ledger, Person, Roster, RosterId, RosterSlot, WeeklyAvailability,
};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Import de personnes depuis CSV: header `handle,display_name[,active]`
///
/// Un handle présent deux fois dans le fichier fait échouer tout l'import.
pub fn import_people_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Person>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for rec in rdr.records() {
        let rec = rec?;
        let handle = rec.get(0).context("missing handle")?.trim();
        let display = rec.get(1).context("missing display_name")?.trim();
        if handle.is_empty() || display.is_empty() {
            bail!("invalid people row (empty)");
        }
        if !seen.insert(handle.to_string()) {
            bail!("duplicate person handle in csv: {handle}");
        }
        let mut person = Person::new(handle, display);
        if let Some(flag) = rec.get(2) {
            let flag = flag.trim();
            if !flag.is_empty() {
                person.active = parse_bool(flag)
                    .with_context(|| format!("invalid active value for handle {handle}"))?;
            }
        }
        out.push(person);
    }
    Ok(out)
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

pub fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {raw}"))
}

/// Import des disponibilités: header `handle,weekday,hours`
/// (`weekday` 0 = lundi, `hours` = `"8,9,10"`).
///
/// Les heures sont gardées telles quelles ; les fragments invalides sont
/// ignorés à la lecture.
pub fn import_availability_csv<P: AsRef<Path>>(
    path: P,
    ledger: &Ledger,
) -> anyhow::Result<Vec<WeeklyAvailability>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let handle = rec.get(0).context("missing handle")?.trim();
        let weekday = rec.get(1).context("missing weekday")?.trim();
        let hours = rec.get(2).unwrap_or("").trim();

        let person = ledger
            .find_person_by_handle(handle)
            .with_context(|| format!("unknown person handle: {handle}"))?;
        let weekday: u8 = weekday
            .parse()
            .with_context(|| format!("invalid weekday for handle {handle}: {weekday}"))?;
        if weekday > 6 {
            bail!("weekday must be within 0..=6 (handle {handle})");
        }
        out.push(WeeklyAvailability {
            person: person.id.clone(),
            weekday,
            available_time: hours.to_string(),
        });
    }
    Ok(out)
}

/// Import des surcharges d'effectif: header `date,hour,count`
///
/// Chaque ligne doit viser une heure 6..=24 et une date de la période du roster.
pub fn import_slots_csv<P: AsRef<Path>>(
    path: P,
    roster: &Roster,
) -> anyhow::Result<Vec<RosterSlot>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    // ligne 1 = en-tête
    for (line, rec) in (2..).zip(rdr.records()) {
        let rec = rec?;
        let date = parse_date(rec.get(0).context("missing date")?)
            .with_context(|| format!("slots row {line}"))?;
        let hour = rec.get(1).context("missing hour")?.trim();
        let count = rec.get(2).context("missing count")?.trim();
        let hour: u8 = hour
            .parse()
            .with_context(|| format!("slots row {line}: invalid hour: {hour}"))?;
        if !is_schedulable_hour(hour) {
            bail!("slots row {line}: hour {hour} outside 6..=24");
        }
        if !roster.contains(date) {
            bail!(
                "slots row {line}: date {date} outside roster {} ({} → {})",
                roster.title,
                roster.start_date,
                roster.end_date
            );
        }
        out.push(RosterSlot {
            roster: roster.id.clone(),
            date,
            hour,
            required_count: count
                .parse()
                .with_context(|| format!("slots row {line}: invalid count: {count}"))?,
        });
    }
    Ok(out)
}

/// Export JSON du ledger (jolie mise en forme)
pub fn export_ledger_json<P: AsRef<Path>>(path: P, ledger: &Ledger) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(ledger)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des permanences d'un roster: header `date,hour,handle`
/// (`handle` vide pour une place libre), trié par (date, heure).
pub fn export_duties_csv<P: AsRef<Path>>(
    path: P,
    ledger: &Ledger,
    roster: &RosterId,
) -> anyhow::Result<()> {
    let file = fs::File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    write_duties_csv(file, ledger, roster)
}

pub fn write_duties_csv<W: Write>(
    writer: W,
    ledger: &Ledger,
    roster: &RosterId,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_writer(writer);
    w.write_record(["date", "hour", "handle"])?;

    let mut duties: Vec<_> = ledger.duties_of(roster).collect();
    duties.sort_by_key(|d| (d.date, d.hour, d.is_open()));

    let mut hour_buf = itoa::Buffer::new();
    for d in duties {
        let handle = d
            .person
            .as_ref()
            .and_then(|pid| ledger.find_person_by_id(pid))
            .map(|p| p.handle.as_str())
            .unwrap_or("");
        let date = d.date.format("%Y-%m-%d").to_string();
        w.write_record([date.as_str(), hour_buf.format(d.hour), handle])?;
    }
    w.flush()?;
    Ok(())
}
