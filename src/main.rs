mod config;
mod report;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};

use gridcal_core::sync::{from_calendar, to_calendar};
use gridcal_core::{CalendarStore, DateRange, SyncError, SyncReporter, SystemClock, Throttle};

use config::{Config, SheetBinding};
use report::TerminalReporter;
use store::{CalendarFile, GridFile, IdColumnWriter};

#[derive(Parser)]
#[command(name = "gridcal-cli")]
#[command(about = "Keep spreadsheet-style grid files and calendar stores in sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update each sheet's grid file to match its calendar
    Pull {
        /// Sync only this sheet binding from the config
        #[arg(long)]
        sheet: Option<String>,

        /// Window start, YYYY-MM-DD, or "start" for no lower bound
        #[arg(long)]
        from: Option<String>,

        /// Window end, YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
    },
    /// Update each sheet's calendar to match its grid file
    Push {
        /// Sync only this sheet binding from the config
        #[arg(long)]
        sheet: Option<String>,

        /// Window start, YYYY-MM-DD, or "start" for no lower bound
        #[arg(long)]
        from: Option<String>,

        /// Window end, YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,

        /// Answer yes to deletion confirmations
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pull { sheet, from, to } => {
            cmd_pull(sheet.as_deref(), from.as_deref(), to.as_deref())
        }
        Commands::Push {
            sheet,
            from,
            to,
            yes,
        } => cmd_push(sheet.as_deref(), from.as_deref(), to.as_deref(), yes),
    }
}

/// Resolve `--sheet` against the config, or take every binding.
fn select_sheets<'a>(
    cfg: &'a Config,
    name: Option<&str>,
) -> Result<Vec<(&'a str, &'a SheetBinding)>> {
    if cfg.sheets.is_empty() {
        anyhow::bail!(
            "No sheets configured.\n\
            Add a [sheets.<name>] binding to config.toml, then rerun."
        );
    }

    match name {
        Some(wanted) => {
            let (name, binding) = cfg.sheets.get_key_value(wanted).ok_or_else(|| {
                anyhow::anyhow!(
                    "Sheet '{}' not found in config. Available sheets: {}",
                    wanted,
                    cfg.sheets.keys().cloned().collect::<Vec<_>>().join(", ")
                )
            })?;
            Ok(vec![(name.as_str(), binding)])
        }
        None => Ok(cfg
            .sheets
            .iter()
            .map(|(name, binding)| (name.as_str(), binding))
            .collect()),
    }
}

/// One binding with its grid file already loaded.
struct LoadedSheet<'a> {
    name: &'a str,
    binding: &'a SheetBinding,
    file: GridFile,
}

impl LoadedSheet<'_> {
    /// The grid file's own binding row wins over the config.
    fn calendar_id(&self) -> &str {
        match self.file.calendar_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.binding.calendar_id,
        }
    }
}

/// Load every selected grid file, alerting on (and skipping) missing
/// files rather than aborting the whole run.
fn load_sheets<'a>(
    sheets: Vec<(&'a str, &'a SheetBinding)>,
    reporter: &dyn SyncReporter,
) -> Result<Vec<LoadedSheet<'a>>> {
    let mut loaded = Vec::new();
    for (name, binding) in sheets {
        let grid_path = config::expand_path(&binding.grid);
        if !grid_path.exists() {
            reporter.alert(&format!(
                "Could not find grid file for sheet '{}' at {}",
                name,
                grid_path.display()
            ));
            continue;
        }
        let file = GridFile::load(&grid_path)?;
        loaded.push(LoadedSheet {
            name,
            binding,
            file,
        });
    }
    Ok(loaded)
}

/// Two sheets bound to one calendar makes reconciliation results depend
/// on run order. Ask before touching any store; declining halts the
/// whole run.
fn check_calendar_collisions(
    loaded: &[LoadedSheet<'_>],
    reporter: &dyn SyncReporter,
) -> Result<()> {
    let mut seen: Vec<&str> = Vec::new();
    for sheet in loaded {
        let id = sheet.calendar_id();
        if id.is_empty() {
            continue;
        }
        if seen.contains(&id) {
            let message = format!(
                "Calendar '{id}' is bound to more than one sheet. \
                This can have unpredictable results. Continue anyway?"
            );
            if !reporter.confirm(&message) {
                anyhow::bail!("Halting sync.");
            }
        }
        seen.push(id);
    }
    Ok(())
}

fn open_calendar(
    sheet: &LoadedSheet<'_>,
    reporter: &dyn SyncReporter,
) -> Result<Option<(CalendarFile, gridcal_core::MemoryCalendar)>> {
    let path = config::expand_path(&sheet.binding.calendar);
    if !path.exists() {
        reporter.alert(&format!(
            "Could not find calendar for sheet '{}' at {}",
            sheet.name,
            path.display()
        ));
        return Ok(None);
    }
    let file = CalendarFile::new(&path);
    let calendar = file.load()?;
    Ok(Some((file, calendar)))
}

fn cmd_pull(sheet: Option<&str>, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let cfg = config::load_config()?;
    let options = cfg.sync.to_options()?;
    let window = DateRange::from_args(from, to)?;
    let reporter = TerminalReporter { assume_yes: false };

    let loaded = load_sheets(select_sheets(&cfg, sheet)?, &reporter)?;
    check_calendar_collisions(&loaded, &reporter)?;

    let mut total_added = 0;
    let mut total_updated = 0;
    let mut total_deleted = 0;
    let mut synced = 0;

    for mut sheet in loaded {
        let Some((_, calendar)) = open_calendar(&sheet, &reporter)? else {
            continue;
        };
        let events = calendar.list_events(&window)?;

        println!("\n📥 Pulling: {} ({} events)", sheet.name, events.len());

        match from_calendar::run(&mut sheet.file.grid, &events, &options) {
            Ok(outcome) => {
                sheet.file.save()?;
                if outcome.header_installed {
                    store::write_format_directives(&sheet.file.path)?;
                }
                println!(
                    "  {} added, {} updated, {} deleted",
                    outcome.added, outcome.updated, outcome.deleted
                );
                total_added += outcome.added;
                total_updated += outcome.updated;
                total_deleted += outcome.deleted;
                synced += 1;
            }
            Err(err @ SyncError::MissingColumns(_)) => {
                reporter.alert(&format!("Sheet '{}': {}", sheet.name, err));
            }
            Err(err) => return Err(err.into()),
        }
    }

    if synced == 0 {
        reporter.alert("No sheets were synced. See the config for setup instructions.");
    } else {
        println!(
            "\nTotal: {} added, {} updated, {} deleted",
            total_added, total_updated, total_deleted
        );
    }

    Ok(())
}

fn cmd_push(sheet: Option<&str>, from: Option<&str>, to: Option<&str>, yes: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let options = cfg.sync.to_options()?;
    let window = DateRange::from_args(from, to)?;
    let reporter = TerminalReporter { assume_yes: yes };
    let clock = SystemClock;

    let loaded = load_sheets(select_sheets(&cfg, sheet)?, &reporter)?;
    check_calendar_collisions(&loaded, &reporter)?;

    let mut total_created = 0;
    let mut total_updated = 0;
    let mut total_deleted = 0;
    let mut synced = 0;

    for sheet in loaded {
        let Some((calendar_file, calendar)) = open_calendar(&sheet, &reporter)? else {
            continue;
        };

        println!("\n📤 Pushing: {}", sheet.name);

        let name = sheet.name;
        let grid = sheet.file.grid.clone();
        let mut ids = match IdColumnWriter::new(sheet.file) {
            Ok(ids) => ids,
            Err(err) => {
                reporter.alert(&format!("Sheet '{name}': {err}"));
                continue;
            }
        };

        let throttle = Throttle::start(options.throttle.clone(), &clock);
        match to_calendar::run(
            &grid,
            &calendar,
            &window,
            &options,
            &throttle,
            &mut ids,
            &reporter,
        ) {
            Ok(outcome) => {
                calendar_file.save(&calendar)?;
                println!(
                    "  {} created, {} updated, {} deleted, {} rows skipped",
                    outcome.created, outcome.updated, outcome.deleted, outcome.skipped
                );
                total_created += outcome.created;
                total_updated += outcome.updated;
                total_deleted += outcome.deleted;
                synced += 1;
            }
            Err(err @ (SyncError::MissingColumns(_) | SyncError::EmptySheet)) => {
                reporter.alert(&format!("Sheet '{name}': {err}"));
            }
            Err(err) => {
                // The run may have created events before failing; persist
                // them so checkpointed ids in the grid keep pointing at
                // events that exist in the calendar file.
                calendar_file.save(&calendar)?;
                return Err(err.into());
            }
        }
    }

    if synced == 0 {
        reporter.alert("No sheets were synced. See the config for setup instructions.");
    } else {
        println!(
            "\nTotal: {} created, {} updated, {} deleted",
            total_created, total_updated, total_deleted
        );
    }

    Ok(())
}
