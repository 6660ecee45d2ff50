mod config;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use payment_tracker::export::ReportGenerator;
use payment_tracker::ledger::{self, COLUMNS};
use payment_tracker::models::{ProjectDetails, ProjectId, StatusFilter, Theme};
use payment_tracker::store::{FileStore, KeyValueStore};
use payment_tracker::{Tracker, TrackerError, dates};

use crate::config::Config;
use crate::ui::{
    Palette,
    dashboard::{DashboardAction, DashboardState, handle_input as handle_dashboard_input, render_dashboard},
    payments::{PaymentsAction, PaymentsState, handle_input as handle_payments_input, render_payments},
    project_wizard::{ProjectWizardAction, ProjectWizardState, handle_input as handle_project_wizard_input, render_project_wizard},
};

#[derive(Parser)]
#[command(name = "payment-tracker", version, about = "Track freelance projects and the payments made against them")]
struct Cli {
    /// Directory holding the stored projects (overrides TRACKER_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Compute statuses as of this date instead of today
    #[arg(long, global = true, value_parser = dates::parse_iso)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard (the default)
    Dashboard,
    /// Print the project table
    List {
        /// all, fullyPaid, partial, unpaid or overdue
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Print dashboard totals and status counts
    Summary,
    /// Add a project
    Add {
        #[arg(long)]
        client: String,
        #[arg(long)]
        project: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        #[arg(long, value_parser = dates::parse_iso)]
        due: NaiveDate,
    },
    /// Replace fields of the project at ROW
    Edit {
        row: usize,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f64>,
        #[arg(long, value_parser = dates::parse_iso)]
        due: Option<NaiveDate>,
    },
    /// Delete the project at ROW
    Delete { row: usize },
    /// Record a payment against the project at ROW
    Pay {
        row: usize,
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        /// Defaults to the as-of date
        #[arg(long, value_parser = dates::parse_iso)]
        date: Option<NaiveDate>,
    },
    /// Print the payment history of the project at ROW
    Payments { row: usize },
    /// Export every project
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
    },
    /// Set the theme, or toggle it when no value is given
    Theme { theme: Option<Theme> },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Pdf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let as_of = cli.as_of.unwrap_or_else(dates::today);
    let command = cli.command.unwrap_or(Command::Dashboard);

    let store = FileStore::new(&config.data_dir)
        .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;

    let interactive = matches!(command, Command::Dashboard);
    init_tracing(interactive.then(|| config.log_file()))?;
    info!(data_dir = %store.dir().display(), %as_of, "starting");

    let tracker = Tracker::open(store, as_of)?;
    let report = tracker.load_report();
    if !interactive {
        if report.corrupt {
            eprintln!("warning: stored projects were unreadable; started empty (original kept as projects.corrupt)");
        }
        if report.rejected > 0 {
            eprintln!("warning: {} invalid project record(s) set aside in projects.rejected", report.rejected);
        }
    }

    run_command(tracker, &config, as_of, command)
}

/// Logs go to `log_file` when given, so they don't draw over the dashboard
fn init_tracing(log_file: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_env("TRACKER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("payment_tracker=info,warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        None => {
            registry.with(fmt::layer().compact().with_writer(io::stderr)).init();
        }
    }

    Ok(())
}

fn project_at_row<S: KeyValueStore>(tracker: &Tracker<S>, row: usize) -> Result<ProjectId> {
    let id = match row.checked_sub(1) {
        Some(index) => tracker.id_at(index),
        None => Err(TrackerError::IndexOutOfRange {
            index: 0,
            len: tracker.projects().len(),
        }),
    };
    id.with_context(|| format!("no project at row {row}"))
}

fn run_command<S: KeyValueStore>(
    mut tracker: Tracker<S>,
    config: &Config,
    as_of: NaiveDate,
    command: Command,
) -> Result<()> {
    match command {
        Command::Dashboard => return run_dashboard(tracker, config, as_of),
        Command::List { status } => print_table(&tracker, status, as_of),
        Command::Summary => print_summary(&tracker, as_of),
        Command::Add { client, project, amount, due } => {
            tracker.add_project(ProjectDetails {
                client,
                project,
                amount,
                due_date: due,
            })?;
            println!("Added project at row {}", tracker.projects().len());
        }
        Command::Edit { row, client, project, amount, due } => {
            let id = project_at_row(&tracker, row)?;
            let mut details = tracker.project(id)?.details().clone();
            if let Some(client) = client {
                details.client = client;
            }
            if let Some(project) = project {
                details.project = project;
            }
            if let Some(amount) = amount {
                details.amount = amount;
            }
            if let Some(due) = due {
                details.due_date = due;
            }
            tracker.edit_project(id, details)?;
            println!("Updated row {row}");
        }
        Command::Delete { row } => {
            let id = project_at_row(&tracker, row)?;
            let removed = tracker.delete_project(id)?;
            println!("Deleted {} / {}", removed.client(), removed.name());
        }
        Command::Pay { row, amount, date } => {
            let id = project_at_row(&tracker, row)?;
            tracker.add_payment(id, date.unwrap_or(as_of), amount)?;
            let project = tracker.project(id)?;
            println!(
                "Recorded {} for {}; remaining {} ({})",
                ledger::money(amount),
                project.name(),
                ledger::money(ledger::remaining(project)),
                ledger::classify(project, as_of),
            );
        }
        Command::Payments { row } => {
            let project = tracker.project(project_at_row(&tracker, row)?)?;
            println!("Payments for Project: {}", project.name());
            for payment in project.payments() {
                println!("{}  {:>12}", dates::format_iso(payment.date()), ledger::money(payment.amount()));
            }
            println!(
                "Paid {} of {}",
                ledger::money(ledger::total_paid(project)),
                ledger::money(project.amount())
            );
        }
        Command::Export { format } => {
            let generator = ReportGenerator::new(&config.export_dir, &config.pdf_command)?;
            let path = match format {
                ExportFormat::Csv => generator.export_csv(tracker.projects(), as_of)?,
                ExportFormat::Pdf => generator.export_pdf(tracker.projects(), as_of)?,
            };
            println!("Wrote {}", path.display());
        }
        Command::Theme { theme } => {
            let theme = match theme {
                Some(theme) => {
                    tracker.set_theme(theme)?;
                    theme
                }
                None => tracker.toggle_theme()?,
            };
            println!("Theme: {}", theme.as_str());
        }
    }

    Ok(())
}

fn print_table<S: KeyValueStore>(tracker: &Tracker<S>, filter: StatusFilter, as_of: NaiveDate) {
    println!(
        "{:>4}  {:<18} {:<20} {:>12} {:>12} {:>12}  {:<10}  {}",
        "Row", COLUMNS[0], COLUMNS[1], COLUMNS[2], COLUMNS[3], COLUMNS[4], COLUMNS[5], COLUMNS[6]
    );
    for row in tracker.rows(filter, as_of) {
        let position = tracker.position(row.id).map_or(0, |i| i + 1);
        let [client, project, total, paid, remaining, due, status] = row.table_cells();
        println!(
            "{position:>4}  {client:<18} {project:<20} {total:>12} {paid:>12} {remaining:>12}  {due:<10}  {status}"
        );
    }
}

fn print_summary<S: KeyValueStore>(tracker: &Tracker<S>, as_of: NaiveDate) {
    let summary = tracker.summary(as_of);
    println!("As of {}", dates::format_iso(as_of));
    println!("Total Due:     {:>12}", ledger::money(summary.total_due));
    println!("Total Paid:    {:>12}", ledger::money(summary.total_paid));
    println!("Total Overdue: {:>12}", ledger::money(summary.total_overdue));
    for (label, count) in ledger::chart_data(&summary).status_counts {
        println!("{label:<12} {count}");
    }
}

// The screen the dashboard is showing
enum AppScreen {
    Dashboard,
    ProjectWizard,
    Payments,
}

struct AppState<'a, S> {
    tracker: Tracker<S>,
    config: &'a Config,
    as_of: NaiveDate,
    screen: AppScreen,
    dashboard_state: DashboardState,
    project_wizard_state: Option<ProjectWizardState>,
    payments_state: Option<PaymentsState>,
}

fn run_dashboard<S: KeyValueStore>(tracker: Tracker<S>, config: &Config, as_of: NaiveDate) -> Result<()> {
    let mut dashboard_state = DashboardState::new(&tracker, as_of);
    let report = tracker.load_report();
    if report.corrupt {
        dashboard_state.set_message("Stored projects were unreadable; started empty (kept as projects.corrupt)");
    } else if report.rejected > 0 {
        dashboard_state.set_message(format!(
            "{} invalid project record(s) set aside in projects.rejected",
            report.rejected
        ));
    }

    let mut app_state = AppState {
        tracker,
        config,
        as_of,
        screen: AppScreen::Dashboard,
        dashboard_state,
        project_wizard_state: None,
        payments_state: None,
    };

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app_state);

    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend, S: KeyValueStore>(terminal: &mut Terminal<B>, app_state: &mut AppState<'_, S>) -> Result<()> {
    loop {
        let palette = Palette::for_theme(app_state.dashboard_state.theme());
        terminal.draw(|f| match app_state.screen {
            AppScreen::Dashboard => render_dashboard(f, &mut app_state.dashboard_state),
            AppScreen::ProjectWizard => {
                if let Some(state) = &app_state.project_wizard_state {
                    render_project_wizard(f, state, palette);
                }
            }
            AppScreen::Payments => {
                render_dashboard(f, &mut app_state.dashboard_state);
                if let Some(state) = &app_state.payments_state {
                    render_payments(f, state, palette);
                }
            }
        })?;

        let should_quit = match app_state.screen {
            AppScreen::Dashboard => handle_dashboard_screen(app_state)?,
            AppScreen::ProjectWizard => handle_project_wizard_screen(app_state)?,
            AppScreen::Payments => handle_payments_screen(app_state)?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

fn refresh<S: KeyValueStore>(app_state: &mut AppState<'_, S>) {
    app_state
        .dashboard_state
        .refresh(&app_state.tracker, app_state.as_of);
}

fn handle_dashboard_screen<S: KeyValueStore>(app_state: &mut AppState<'_, S>) -> Result<bool> {
    let action = handle_dashboard_input(&mut app_state.dashboard_state, &app_state.tracker, app_state.as_of)?;

    match action {
        Some(DashboardAction::Quit) => return Ok(true),
        Some(DashboardAction::NewProject) => {
            app_state.project_wizard_state = Some(ProjectWizardState::new(app_state.as_of));
            app_state.screen = AppScreen::ProjectWizard;
        }
        Some(DashboardAction::EditProject(id)) => match app_state.tracker.project(id) {
            Ok(project) => {
                app_state.project_wizard_state = Some(ProjectWizardState::from_existing(project));
                app_state.screen = AppScreen::ProjectWizard;
            }
            Err(err) => app_state.dashboard_state.set_message(err.to_string()),
        },
        Some(DashboardAction::DeleteProject(id)) => {
            let message = match app_state.tracker.delete_project(id) {
                Ok(removed) => format!("Deleted {} / {}", removed.client(), removed.name()),
                Err(err) => err.to_string(),
            };
            refresh(app_state);
            app_state.dashboard_state.set_message(message);
        }
        Some(DashboardAction::ViewPayments(id)) => match app_state.tracker.project(id) {
            Ok(project) => {
                app_state.payments_state = Some(PaymentsState::new(project, app_state.as_of));
                app_state.screen = AppScreen::Payments;
            }
            Err(err) => app_state.dashboard_state.set_message(err.to_string()),
        },
        Some(DashboardAction::ExportCsv) => export(app_state, false),
        Some(DashboardAction::ExportPdf) => export(app_state, true),
        Some(DashboardAction::ToggleTheme) => {
            if let Err(err) = app_state.tracker.toggle_theme() {
                app_state.dashboard_state.set_message(err.to_string());
            }
            refresh(app_state);
        }
        None => {}
    }

    Ok(false)
}

/// Export problems only reach the message line
fn export<S: KeyValueStore>(app_state: &mut AppState<'_, S>, pdf: bool) {
    let result = ReportGenerator::new(&app_state.config.export_dir, &app_state.config.pdf_command).and_then(|generator| {
        let projects = app_state.tracker.projects();
        if pdf {
            generator.export_pdf(projects, app_state.as_of)
        } else {
            generator.export_csv(projects, app_state.as_of)
        }
    });
    let message = match result {
        Ok(path) => format!("Wrote {}", path.display()),
        Err(err) => format!("Export failed: {err}"),
    };
    app_state.dashboard_state.set_message(message);
}

fn handle_project_wizard_screen<S: KeyValueStore>(app_state: &mut AppState<'_, S>) -> Result<bool> {
    let Some(state) = &mut app_state.project_wizard_state else {
        app_state.screen = AppScreen::Dashboard;
        return Ok(false);
    };

    match handle_project_wizard_input(state)? {
        Some(ProjectWizardAction::Cancel) => {
            app_state.project_wizard_state = None;
            app_state.screen = AppScreen::Dashboard;
        }
        Some(ProjectWizardAction::Save(project_id, details)) => {
            let result = match project_id {
                Some(id) => app_state.tracker.edit_project(id, details),
                None => app_state.tracker.add_project(details).map(|_| ()),
            };

            match result {
                // Bad input keeps the form open with the problem shown
                Err(err @ TrackerError::Validation { .. }) => state.set_error(&err),
                other => {
                    if let Err(err) = other {
                        app_state.dashboard_state.set_message(err.to_string());
                    }
                    app_state.project_wizard_state = None;
                    app_state.screen = AppScreen::Dashboard;
                    refresh(app_state);
                }
            }
        }
        None => {}
    }

    Ok(false)
}

fn handle_payments_screen<S: KeyValueStore>(app_state: &mut AppState<'_, S>) -> Result<bool> {
    let Some(state) = &mut app_state.payments_state else {
        app_state.screen = AppScreen::Dashboard;
        return Ok(false);
    };

    match handle_payments_input(state)? {
        Some(PaymentsAction::Close) => {
            app_state.payments_state = None;
            app_state.screen = AppScreen::Dashboard;
        }
        Some(PaymentsAction::AddPayment { project_id, date, amount }) => {
            match app_state.tracker.add_payment(project_id, date, amount) {
                Err(err @ TrackerError::Validation { .. }) => state.set_error(&err),
                result => {
                    if let Err(err) = result {
                        app_state.dashboard_state.set_message(err.to_string());
                    }
                    // Reopen on the updated history
                    app_state.payments_state = app_state
                        .tracker
                        .project(project_id)
                        .ok()
                        .map(|project| PaymentsState::new(project, app_state.as_of));
                    if app_state.payments_state.is_none() {
                        app_state.screen = AppScreen::Dashboard;
                    }
                    refresh(app_state);
                }
            }
        }
        None => {}
    }

    Ok(false)
}
