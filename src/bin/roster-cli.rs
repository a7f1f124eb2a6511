#![forbid(unsafe_code)]
use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use duty_roster::{
    io,
    model::{Ledger, PersonId, RosterId},
    overview::RosterOverview,
    scheduler::{ConflictKind, ScheduleOptions, Scheduler},
    stats,
    storage::{JsonStorage, Storage},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification de permanences horaires (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du ledger
    #[arg(long, global = true, default_value = "ledger.json")]
    data: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer des personnes depuis un CSV (`handle,display_name[,active]`)
    ImportPeople {
        #[arg(long)]
        csv: String,
    },

    /// Importer des disponibilités depuis un CSV (`handle,weekday,hours`)
    ImportAvailability {
        #[arg(long)]
        csv: String,
    },

    /// Définir la disponibilité d'un jour (vide = indisponible)
    SetAvailability {
        #[arg(long)]
        handle: String,
        /// 0 = lundi … 6 = dimanche
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
        weekday: u8,
        /// "8,9,10"
        #[arg(long, default_value = "")]
        hours: String,
    },

    /// Lister les personnes (triées par nom)
    People,

    /// Changer le nom affiché d'une personne
    RenamePerson {
        #[arg(long)]
        handle: String,
        #[arg(long)]
        display_name: String,
    },

    /// Activer / désactiver une personne
    TogglePerson {
        #[arg(long)]
        handle: String,
    },

    /// Supprimer une personne (ses permanences deviennent des places libres)
    RemovePerson {
        #[arg(long)]
        handle: String,
    },

    /// Créer un roster
    CreateRoster {
        #[arg(long)]
        title: String,
        /// YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// YYYY-MM-DD (inclus)
        #[arg(long)]
        end: String,
        /// Effectif par créneau ; absent = toutes les personnes disponibles
        #[arg(long)]
        people_per_shift: Option<u32>,
        #[arg(long)]
        event_time: Option<String>,
    },

    /// Lister les rosters (les plus récents d'abord)
    Rosters,

    /// Supprimer un roster et ses permanences
    DeleteRoster {
        #[arg(long)]
        roster: String,
    },

    /// Remplacer les surcharges d'effectif d'un roster (`date,hour,count`)
    ImportSlots {
        #[arg(long)]
        roster: String,
        #[arg(long)]
        csv: String,
    },

    /// Recalculer toutes les permanences d'un roster
    AutoSchedule {
        #[arg(long)]
        roster: String,
        /// Graine pour départager les égalités (reproductible)
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1000)]
        continuity_bonus: i64,
    },

    /// Mettre une personne de permanence à (date, heure)
    Assign {
        #[arg(long)]
        roster: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        hour: u8,
        #[arg(long)]
        handle: String,
    },

    /// Libérer la place d'une personne à (date, heure)
    Unassign {
        #[arg(long)]
        roster: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        hour: u8,
        #[arg(long)]
        handle: String,
    },

    /// Lister et optionnellement exporter
    List {
        #[arg(long)]
        roster: String,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vue d'ensemble d'un roster
    Show {
        #[arg(long)]
        roster: String,
    },

    /// Vérifier la cohérence d'un roster
    Check {
        #[arg(long)]
        roster: String,
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Historique des heures par personne
    History {
        #[arg(long, default_value_t = 5)]
        recent: usize,
    },

    /// Remettre à zéro le compteur d'une personne
    ResetStats {
        #[arg(long)]
        handle: String,
    },

    /// Aligner les compteurs sur les permanences réelles
    ApplyStats,
}

fn person_id(ledger: &Ledger, handle: &str) -> Result<PersonId> {
    ledger
        .find_person_by_handle(handle)
        .map(|p| p.id.clone())
        .ok_or_else(|| anyhow!("unknown person: {handle}"))
}

/// Accepte l'identifiant ou le titre exact du roster.
fn roster_id(ledger: &Ledger, raw: &str) -> Result<RosterId> {
    let id = RosterId::new(raw);
    if ledger.find_roster(&id).is_some() {
        return Ok(id);
    }
    let mut by_title = ledger.rosters.iter().filter(|r| r.title == raw);
    match (by_title.next(), by_title.next()) {
        (Some(r), None) => Ok(r.id.clone()),
        (Some(_), Some(_)) => bail!("ambiguous roster title: {raw} (use the id)"),
        _ => bail!("unknown roster: {raw}"),
    }
}

fn handle_of<'a>(ledger: &'a Ledger, id: Option<&PersonId>) -> &'a str {
    id.and_then(|pid| ledger.find_person_by_id(pid))
        .map(|p| p.handle.as_str())
        .unwrap_or("-")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.data);
    let mut scheduler = Scheduler::from_ledger(storage.load_or_default()?);

    let code = match cli.cmd {
        Commands::ImportPeople { csv } => {
            let people = io::import_people_csv(csv)?;
            for p in &people {
                if scheduler.ledger().find_person_by_handle(&p.handle).is_some() {
                    bail!("duplicate person handle: {}", p.handle);
                }
            }
            scheduler.add_people(people);
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::ImportAvailability { csv } => {
            let avails = io::import_availability_csv(csv, scheduler.ledger())?;
            let ledger = scheduler.ledger_mut();
            for a in avails {
                ledger.set_availability(&a.person, a.weekday, &a.available_time);
            }
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::SetAvailability {
            handle,
            weekday,
            hours,
        } => {
            let pid = person_id(scheduler.ledger(), &handle)?;
            scheduler.ledger_mut().set_availability(&pid, weekday, &hours);
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::People => {
            let mut people: Vec<_> = scheduler.ledger().people.iter().collect();
            people.sort_by(|a, b| a.display_name.cmp(&b.display_name));
            for p in people {
                println!(
                    "{} | {} | {} | {}h",
                    p.handle,
                    p.display_name,
                    if p.active { "active" } else { "inactive" },
                    p.stats_hours
                );
            }
            0
        }
        Commands::RenamePerson {
            handle,
            display_name,
        } => {
            let pid = person_id(scheduler.ledger(), &handle)?;
            scheduler.rename_person(&pid, &display_name)?;
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::TogglePerson { handle } => {
            let pid = person_id(scheduler.ledger(), &handle)?;
            if let Some(p) = scheduler.ledger_mut().find_person_mut_by_id(&pid) {
                p.active = !p.active;
                println!("{} active={}", p.handle, p.active);
            }
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::RemovePerson { handle } => {
            let pid = person_id(scheduler.ledger(), &handle)?;
            scheduler.ledger_mut().remove_person(&pid);
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::CreateRoster {
            title,
            start,
            end,
            people_per_shift,
            event_time,
        } => {
            let start = io::parse_date(&start)?;
            let end = io::parse_date(&end)?;
            let id = scheduler.create_roster(&title, start, end, people_per_shift)?;
            if let Some(r) = scheduler
                .ledger_mut()
                .rosters
                .iter_mut()
                .find(|r| r.id == id)
            {
                r.event_time = event_time;
            }
            storage.save(scheduler.ledger())?;
            println!("{id}");
            0
        }
        Commands::Rosters => {
            let mut rosters: Vec<_> = scheduler.ledger().rosters.iter().collect();
            rosters.sort_by(|a, b| b.start_date.cmp(&a.start_date));
            for r in rosters {
                let per_shift = r
                    .default_headcount()
                    .map_or_else(|| "all".to_string(), |n| n.to_string());
                println!(
                    "{} | {} | {} → {} | {}",
                    r.id, r.title, r.start_date, r.end_date, per_shift
                );
            }
            0
        }
        Commands::DeleteRoster { roster } => {
            let rid = roster_id(scheduler.ledger(), &roster)?;
            scheduler.ledger_mut().remove_roster(&rid);
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::ImportSlots { roster, csv } => {
            let rid = roster_id(scheduler.ledger(), &roster)?;
            let target = scheduler
                .ledger()
                .find_roster(&rid)
                .ok_or_else(|| anyhow!("unknown roster: {roster}"))?;
            let slots = io::import_slots_csv(csv, target)?;
            let count = scheduler.replace_slots(&rid, slots)?;
            storage.save(scheduler.ledger())?;
            println!("{count} slot override(s)");
            0
        }
        Commands::AutoSchedule {
            roster,
            seed,
            continuity_bonus,
        } => {
            let rid = roster_id(scheduler.ledger(), &roster)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let opts = ScheduleOptions { continuity_bonus };
            let summary = scheduler.auto_schedule(&rid, opts, &mut rng)?;
            storage.save(scheduler.ledger())?;
            println!(
                "{} slot(s), {} duty(ies): {} filled, {} open",
                summary.slots, summary.duties, summary.filled, summary.open
            );
            0
        }
        Commands::Assign {
            roster,
            date,
            hour,
            handle,
        } => {
            let rid = roster_id(scheduler.ledger(), &roster)?;
            let pid = person_id(scheduler.ledger(), &handle)?;
            let date = io::parse_date(&date)?;
            scheduler.assign(&rid, date, hour, &pid)?;
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::Unassign {
            roster,
            date,
            hour,
            handle,
        } => {
            let rid = roster_id(scheduler.ledger(), &roster)?;
            let pid = person_id(scheduler.ledger(), &handle)?;
            let date = io::parse_date(&date)?;
            if scheduler.unassign(&rid, date, hour, &pid)? {
                storage.save(scheduler.ledger())?;
            } else {
                eprintln!("{handle} is not on duty at {date} {hour}h");
            }
            0
        }
        Commands::List {
            roster,
            out_json,
            out_csv,
        } => {
            let rid = roster_id(scheduler.ledger(), &roster)?;
            if let Some(path) = out_json {
                io::export_ledger_json(path, scheduler.ledger())?;
            }
            if let Some(path) = out_csv {
                io::export_duties_csv(path, scheduler.ledger(), &rid)?;
            }
            let ledger = scheduler.ledger();
            let mut duties: Vec<_> = ledger.duties_of(&rid).collect();
            duties.sort_by_key(|d| (d.date, d.hour, d.is_open()));
            for d in duties {
                println!(
                    "{} | {} | {:>2}h | {}",
                    d.id,
                    d.date,
                    d.hour,
                    handle_of(ledger, d.person.as_ref())
                );
            }
            0
        }
        Commands::Show { roster } => {
            let rid = roster_id(scheduler.ledger(), &roster)?;
            let ledger = scheduler.ledger();
            let view = RosterOverview::build(ledger, &rid)?;
            println!(
                "{} ({} → {})",
                view.roster.title, view.roster.start_date, view.roster.end_date
            );
            for day in &view.days {
                println!("{day}");
                for (&hour, available) in view.availability.get(day).into_iter().flatten() {
                    let on_duty: Vec<&str> = view
                        .duties_at(*day, hour)
                        .iter()
                        .map(|d| handle_of(ledger, d.person.as_ref()))
                        .collect();
                    println!(
                        "  {hour:>2}h  duty: [{}]  available: {}",
                        on_duty.join(", "),
                        available.len()
                    );
                }
            }
            let names = |ids: &[PersonId]| -> String {
                ids.iter()
                    .map(|id| handle_of(ledger, Some(id)))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            println!("open slots: {}", view.open_slots.len());
            println!("idle: {}", names(view.idle_people.as_slice()));
            println!("excluded: {}", names(view.excluded_people.as_slice()));
            0
        }
        Commands::Check { roster, report } => {
            let rid = roster_id(scheduler.ledger(), &roster)?;
            let conflicts = scheduler.detect_conflicts(&rid)?;
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                if let Some(path) = report {
                    let ledger = scheduler.ledger();
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["date", "hour", "handle", "kind", "detail"])?;
                    for c in &conflicts {
                        let (kind, detail) = match &c.kind {
                            ConflictKind::DoubleAssignment => ("double", String::new()),
                            ConflictKind::OutsideAvailability => ("availability", String::new()),
                            ConflictKind::InactivePerson => ("inactive", String::new()),
                            ConflictKind::Understaffed { required, filled } => {
                                ("understaffed", format!("{filled}/{required}"))
                            }
                        };
                        w.write_record([
                            c.date.to_string().as_str(),
                            c.hour.to_string().as_str(),
                            handle_of(ledger, c.person.as_ref()),
                            kind,
                            detail.as_str(),
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::History { recent } => {
            for row in stats::history_report(scheduler.ledger(), recent) {
                let recent: Vec<String> = row
                    .recent
                    .iter()
                    .map(|d| format!("{} {}h", d.date, d.hour))
                    .collect();
                println!(
                    "{:<16} {:>5}  {}",
                    row.handle,
                    row.hours,
                    recent.join(", ")
                );
            }
            0
        }
        Commands::ResetStats { handle } => {
            let pid = person_id(scheduler.ledger(), &handle)?;
            stats::reset_stats(scheduler.ledger_mut(), &pid, Utc::now())?;
            storage.save(scheduler.ledger())?;
            0
        }
        Commands::ApplyStats => {
            stats::apply_stats(scheduler.ledger_mut());
            storage.save(scheduler.ledger())?;
            0
        }
    };

    std::process::exit(code);
}
