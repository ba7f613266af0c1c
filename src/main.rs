use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zeiterfassung::calculate::{
    compute_monthly_project_totals, compute_summary_statistics, compute_team_statistics,
    format_euro, monthly_totals_from_table, parse_amount_input, parse_hours_input,
    team_statistics_from_table, FibuReport,
};
use zeiterfassung::codec::{format_date_de, WorkDuration};
use zeiterfassung::config::AppConfig;
use zeiterfassung::ingest::{import_table, DedupPolicy};
use zeiterfassung::models::{TeamStats, TeamStatsColumn, TimeEntry};
use zeiterfassung::storage::{EntryStore, FileStore};
use zeiterfassung::table::{CsvTable, DisplayTable, TableFilter};
use zeiterfassung::tracker::{save_draft, EntryDraft, EntryFormOptions};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez",
];

#[derive(Parser)]
#[command(name = "zeiterfassung")]
#[command(about = "Time sheet import and billing statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import CSV exports into the entry store
    Import {
        /// Files or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,

        /// How to recognise entries that are already stored
        #[arg(long, value_enum, default_value = "id")]
        dedup: DedupArg,
    },

    /// Show a CSV export as a table
    Table {
        csv: PathBuf,

        /// Only rows of this team member
        #[arg(long)]
        team: Option<String>,

        /// Only rows of this project
        #[arg(long)]
        project: Option<String>,

        /// Case-insensitive text search across all cells
        #[arg(long)]
        search: Option<String>,

        /// Sort by the column with this header
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Billed and unbilled time per team member
    Stats {
        /// Read a CSV export instead of the entry store
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Only count this project
        #[arg(long)]
        project: Option<String>,

        /// Sort column
        #[arg(long, value_enum, default_value = "name")]
        sort: StatsSortArg,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Monthly Fibu times with fee and hourly wage calculation
    Fibu {
        /// Read a CSV export instead of the entry store
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Only count this team member
        #[arg(long)]
        team: Option<String>,

        /// Fee per month, e.g. "4=1250,00"
        #[arg(long)]
        fee: Vec<String>,

        /// Billed hours per month, e.g. "4=12:30" or "4=12,5"
        #[arg(long)]
        hours: Vec<String>,
    },

    /// Summary statistics over the entry store
    Summary,

    /// List stored entries
    List {
        /// Only entries not billed yet
        #[arg(long)]
        unbilled: bool,
    },

    /// Team members, customers and projects found in a CSV export
    Options { csv: PathBuf },

    /// Add a manual entry
    Add {
        #[arg(long)]
        team: String,

        #[arg(long)]
        customer: String,

        #[arg(long)]
        project: String,

        /// Auftrag code
        #[arg(long, default_value = "")]
        assignment: String,

        #[arg(long, default_value = "")]
        notes: String,

        /// Tracked time, e.g. "01:30:00" or "1h 30m"
        #[arg(long)]
        duration: Option<String>,
    },

    /// Edit a stored entry
    Edit {
        id: String,

        #[arg(long)]
        team: Option<String>,

        #[arg(long)]
        customer: Option<String>,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        assignment: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        duration: Option<String>,
    },

    /// Delete a stored entry
    Delete { id: String },

    /// Flip the billed flag of a stored entry
    ToggleBilled { id: String },

    /// Delete all stored entries
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DedupArg {
    Id,
    Content,
}

impl From<DedupArg> for DedupPolicy {
    fn from(arg: DedupArg) -> Self {
        match arg {
            DedupArg::Id => DedupPolicy::ById,
            DedupArg::Content => DedupPolicy::ByContent,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatsSortArg {
    Name,
    Unbilled,
    Billed,
    Total,
}

impl From<StatsSortArg> for TeamStatsColumn {
    fn from(arg: StatsSortArg) -> Self {
        match arg {
            StatsSortArg::Name => TeamStatsColumn::Name,
            StatsSortArg::Unbilled => TeamStatsColumn::Unbilled,
            StatsSortArg::Billed => TeamStatsColumn::Billed,
            StatsSortArg::Total => TeamStatsColumn::Total,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Starting zeiterfassung v{}", env!("CARGO_PKG_VERSION"));

    let today = Local::now().date_naive();

    match cli.command {
        Commands::Import { paths, dedup } => {
            let files = expand_paths(&paths)?;
            let mut imported = Vec::new();
            for file in &files {
                let table = read_table(file)?;
                let entries = import_table(&table, today);
                tracing::info!("Read {} entries from {:?}", entries.len(), file);
                imported.extend(entries);
            }

            let mut store = open_store(&config)?;
            let summary = store.import(imported, dedup.into())?;

            println!("\n=== Import Results ===");
            println!("Files:            {}", files.len());
            println!("Added:            {}", summary.added);
            println!("Skipped:          {}", summary.skipped);
            println!("Stored entries:   {}", summary.total);
        }

        Commands::Table {
            csv,
            team,
            project,
            search,
            sort,
            desc,
        } => {
            let table = read_table(&csv)?;
            let mut view = DisplayTable::build(&table).filtered(&TableFilter {
                team_member: team,
                project,
                search,
            });
            if let Some(column) = sort {
                let index = view
                    .column_index(&column)
                    .with_context(|| format!("No column matching '{}'", column))?;
                view.sort_by(index, !desc);
            }
            print_display_table(&view);
        }

        Commands::Stats {
            csv,
            project,
            sort,
            desc,
        } => {
            let stats = match csv {
                Some(path) => {
                    let table = read_table(&path)?;
                    match team_statistics_from_table(&table, project.as_deref()) {
                        Some(stats) => stats,
                        None => bail!("{:?} has no duration column", path),
                    }
                }
                None => {
                    let store = open_store(&config)?;
                    compute_team_statistics(store.entries(), project.as_deref())
                }
            };
            print_team_stats(&stats, sort.into(), !desc);
        }

        Commands::Fibu {
            csv,
            team,
            fee,
            hours,
        } => {
            let family = config.fibu.project_family();
            let totals = match csv {
                Some(path) => {
                    let table = read_table(&path)?;
                    match monthly_totals_from_table(&table, &family, team.as_deref()) {
                        Some(totals) => totals,
                        None => bail!("{:?} has no duration column", path),
                    }
                }
                None => {
                    let store = open_store(&config)?;
                    compute_monthly_project_totals(store.entries(), &family, team.as_deref())
                }
            };

            let fees = parse_month_values(&fee, parse_amount_input)?;
            let billed_hours = parse_month_values(&hours, parse_hours_input)?;
            print_fibu_report(&FibuReport::build(&totals, &fees, &billed_hours));
        }

        Commands::Summary => {
            let store = open_store(&config)?;
            let summary = compute_summary_statistics(store.entries());

            println!("\n=== Summary ===");
            println!("Entries:          {}", summary.total_entries);
            println!("Total hours:      {:.2}", summary.total_hours());
            println!(
                "Billed hours:     {:.2} ({:.1}%)",
                summary.billed_hours(),
                summary.billed_percentage
            );
            println!("Unbilled hours:   {:.2}", summary.unbilled_hours());
            println!("Average minutes:  {:.1}", summary.average_minutes);
            println!("Median minutes:   {:.1}", summary.median_minutes);
            println!(
                "Min/Max minutes:  {} / {}",
                summary.min_minutes, summary.max_minutes
            );
            if let Some(std_dev) = summary.std_dev_minutes {
                println!("Std dev minutes:  {:.1}", std_dev);
            }
            println!("Customers:        {}", summary.customer_count);
            println!("Auftrag codes:    {}", summary.project_count);
            println!("Team members:     {}", summary.team_member_count);
            if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
                println!(
                    "Date range:       {} - {} ({} days)",
                    format_date_de(first),
                    format_date_de(last),
                    summary.date_range_days
                );
            }
        }

        Commands::List { unbilled } => {
            let store = open_store(&config)?;
            let entries: Vec<&TimeEntry> = if unbilled {
                store.unbilled_entries()
            } else {
                store.entries().iter().collect()
            };
            if entries.is_empty() {
                println!("No entries stored.");
            }
            for entry in entries {
                print_entry(entry);
            }
        }

        Commands::Options { csv } => {
            let options = EntryFormOptions::from_table(&read_table(&csv)?);
            println!("Team members: {}", options.team_members.join(", "));
            println!("Customers:    {}", options.customers.join(", "));
            println!("Projects:     {}", options.projects.join(", "));
        }

        Commands::Add {
            team,
            customer,
            project,
            assignment,
            notes,
            duration,
        } => {
            let mut store = open_store(&config)?;
            let draft = EntryDraft {
                id: None,
                team_member: team,
                customer,
                project,
                assignment,
                notes,
                duration: duration.as_deref().map(parse_duration_arg).transpose()?,
            };
            let entry = save_draft(&mut store, draft, today)?;
            println!("Added entry {}", entry.id);
        }

        Commands::Edit {
            id,
            team,
            customer,
            project,
            assignment,
            notes,
            duration,
        } => {
            let mut store = open_store(&config)?;
            let existing = store
                .get(&id)
                .with_context(|| format!("Entry not found: {}", id))?;

            let mut draft = EntryDraft::from_entry(existing);
            draft.duration = None;
            if let Some(team) = team {
                draft.team_member = team;
            }
            if let Some(customer) = customer {
                draft.customer = customer;
            }
            if let Some(project) = project {
                draft.project = project;
            }
            if let Some(assignment) = assignment {
                draft.assignment = assignment;
            }
            if let Some(notes) = notes {
                draft.notes = notes;
            }
            if let Some(duration) = duration {
                draft.duration = Some(parse_duration_arg(&duration)?);
            }

            let entry = save_draft(&mut store, draft, today)?;
            println!("Updated entry {}", entry.id);
        }

        Commands::Delete { id } => {
            let mut store = open_store(&config)?;
            let removed = store.delete(&id)?;
            println!("Deleted entry {} ({})", removed.id, removed.team_member);
        }

        Commands::ToggleBilled { id } => {
            let mut store = open_store(&config)?;
            let billed = store.toggle_billed(&id)?;
            println!(
                "Entry {} is now {}",
                id,
                if billed { "billed" } else { "unbilled" }
            );
        }

        Commands::Clear { yes } => {
            if !yes {
                eprintln!("This deletes all stored entries. Re-run with --yes to confirm.");
                return Ok(());
            }
            let mut store = open_store(&config)?;
            let count = store.len();
            store.clear()?;
            println!("Deleted {} entries.", count);
        }
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> Result<EntryStore<FileStore>> {
    let backend = FileStore::new(config.storage_config());
    EntryStore::open(backend, config.storage.key.clone())
        .with_context(|| format!("Failed to open entry store in {:?}", config.data_dir))
}

fn read_table(path: &Path) -> Result<CsvTable> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let table = CsvTable::parse(&text);
    if table.headers.is_empty() {
        bail!("{:?} is empty", path);
    }
    Ok(table)
}

/// Expand glob patterns; a pattern matching nothing is an error.
fn expand_paths(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let before = files.len();
        for path in glob::glob(pattern).with_context(|| format!("Invalid pattern {}", pattern))? {
            let path = path?;
            if path.is_file() {
                files.push(path);
            }
        }
        if files.len() == before {
            bail!("No files match {}", pattern);
        }
    }
    Ok(files)
}

fn parse_duration_arg(text: &str) -> Result<WorkDuration> {
    WorkDuration::parse(text).with_context(|| format!("Unreadable duration: {}", text))
}

/// Parse repeated "M=value" arguments keyed by calendar month.
fn parse_month_values(args: &[String], parse: fn(&str) -> f64) -> Result<BTreeMap<u32, f64>> {
    let mut values = BTreeMap::new();
    for arg in args {
        let (month, value) = arg
            .split_once('=')
            .with_context(|| format!("Expected MONTH=VALUE, got {}", arg))?;
        let month: u32 = month
            .trim()
            .parse()
            .with_context(|| format!("Invalid month in {}", arg))?;
        if !(1..=12).contains(&month) {
            bail!("Month out of range in {}", arg);
        }
        values.insert(month, parse(value));
    }
    Ok(values)
}

fn print_display_table(view: &DisplayTable) {
    println!("{}", view.headers.join(" | "));
    for row in &view.rows {
        println!("{}", row.cells.join(" | "));
    }
    println!("\n{} rows", view.rows.len());
}

fn print_team_stats(stats: &TeamStats, column: TeamStatsColumn, ascending: bool) {
    println!(
        "{:<24} {:>18} {:>12} {:>10}",
        "Teammitglied", "Nicht abgerechnet", "Abgerechnet", "Gesamt"
    );
    for row in stats.sorted_rows(column, ascending) {
        println!(
            "{:<24} {:>18} {:>12} {:>10}",
            row.label,
            row.unbilled_hhmm(),
            row.billed_hhmm(),
            row.total_hhmm()
        );
    }
}

fn print_fibu_report(report: &FibuReport) {
    println!(
        "{:<6} {:>8} {:>12} {:>8} {:>14} {:>16} {:>12}",
        "Monat", "Zeit", "Honorar", "Stunden", "Stundenlohn", "Genaues Honorar", "Abweichung"
    );
    for (name, month) in MONTH_NAMES.iter().zip(&report.months) {
        let fee = if month.fee > 0.0 {
            format_euro(month.fee)
        } else {
            String::new()
        };
        let hours = if month.billed_hours > 0.0 {
            format!("{:.2}", month.billed_hours)
        } else {
            String::new()
        };
        println!(
            "{:<6} {:>8} {:>12} {:>8} {:>14} {:>16} {:>12}",
            name,
            month.time,
            fee,
            hours,
            month.wage_text(),
            month.exact_fee_text(),
            month.deviation_text()
        );
    }
}

fn print_entry(entry: &TimeEntry) {
    println!(
        "{}  {}  {:<16} {:<16} {:<20} {:<10} {:>10}  {}",
        entry.id,
        format_date_de(entry.start_date),
        entry.team_member,
        entry.customer,
        entry.project,
        entry.assignment,
        entry.duration,
        if entry.billed { "Ja" } else { "Nein" }
    );
}
