//! CLI binary for browsing ledger trends, budgets and activity.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use ledger_trends::analytics::{AnalyticsBlocking, TrendSummary};
use ledger_trends::budget_progress::{self, AlertLevel, BudgetProgress};
use ledger_trends::compare::{self, Favorability, WindowComparison};
use ledger_trends::distribution::CategorySummary;
use ledger_trends::heatmap::{self, DAYS_PER_COLUMN, Heatmap, HeatmapCell};
use ledger_trends::ledger::{BlockingLedgerSource, FileLedger};
use ledger_trends::models::{Granularity, NaiveDate, TransactionKind};
use ledger_trends::regression::{TrendDirection, TrendFit};
use ledger_trends::trends::PeriodBucket;
use ledger_trends::ytd::YtdComparison;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Environment variable naming the ledger directory.
const DATA_DIR_ENV: &str = "LEDGER_TRENDS_DIR";

/// Ledger trends CLI: income/expense trends, budgets and activity.
#[derive(Debug, Parser)]
#[command(name = "ledger-trends", version, about)]
struct Cli {
    /// Ledger directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR", env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,
    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    /// Evaluate as of this date (YYYY-MM-DD) instead of today.
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Income and expenses per period, with trend lines.
    Trends(TrendArgs),
    /// Share of each category in a date range.
    Categories(CategoryArgs),
    /// Progress of the budgets active today.
    Budgets {
        /// Only show the N most urgent budgets.
        #[arg(long, value_name = "N")]
        top: Option<usize>,
    },
    /// Daily activity heatmap.
    Heatmap {
        /// Number of days ending today.
        #[arg(long, default_value_t = 91)]
        days: u32,
        /// Transaction type to count.
        #[arg(long, default_value = "expense", value_parser = parse_kind)]
        kind: TransactionKind,
    },
    /// This year to date against the same months of last year.
    Ytd,
}

/// Arguments for the `trends` subcommand.
#[derive(Debug, Args)]
struct TrendArgs {
    /// Bucket size: day, week, month or year.
    #[arg(long, short, default_value = "month", value_parser = parse_granularity)]
    granularity: Granularity,
    /// Number of periods (default depends on the granularity).
    #[arg(long, short = 'n')]
    count: Option<u32>,
}

/// Arguments for the `categories` subcommand.
#[derive(Debug, Args)]
struct CategoryArgs {
    /// Start date (inclusive, YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// End date (inclusive, YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,
    /// Transaction type to summarize.
    #[arg(long, default_value = "expense", value_parser = parse_kind)]
    kind: TransactionKind,
}

/// Trend buckets together with their summary, as printed by `trends`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrendReport {
    /// Bucket granularity.
    granularity: Granularity,
    /// Buckets, oldest first.
    buckets: Vec<PeriodBucket>,
    /// Fits and comparisons.
    summary: TrendSummary,
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Parses a granularity name for clap.
fn parse_granularity(s: &str) -> Result<Granularity, String> {
    s.parse().map_err(|err| format!("{err}"))
}

/// Parses a transaction type for clap.
fn parse_kind(s: &str) -> Result<TransactionKind, String> {
    s.parse().map_err(|err| format!("{err}"))
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let ledger = match open_ledger(cli.data_dir) {
        Ok(ledger) => ledger,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to open ledger: {err}",
                "error:".red().bold()
            )?;
            writeln!(
                io::stderr().lock(),
                "  {} pass --data-dir or set {}",
                "hint:".cyan(),
                DATA_DIR_ENV
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut builder = AnalyticsBlocking::builder().source(ledger);
    if let Some(today) = cli.today {
        builder = builder.today(today);
    }
    let analytics = match builder.build() {
        Ok(analytics) => analytics,
        Err(err) => return report_error("failed to build analytics", &err),
    };

    dispatch(&analytics, cli.command, cli.json)
}

/// Opens the file ledger, using `data_dir` if provided or the default XDG
/// data directory otherwise.
fn open_ledger(data_dir: Option<PathBuf>) -> ledger_trends::error::Result<FileLedger> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileLedger::default_dir()?,
    };
    FileLedger::new(dir)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<S: BlockingLedgerSource>(
    analytics: &AnalyticsBlocking<S>,
    command: Command,
    json: bool,
) -> io::Result<ExitCode> {
    match command {
        Command::Trends(args) => cmd_trends(analytics, &args, json),
        Command::Categories(args) => cmd_categories(analytics, &args, json),
        Command::Budgets { top } => cmd_budgets(analytics, top, json),
        Command::Heatmap { days, kind } => cmd_heatmap(analytics, days, kind, json),
        Command::Ytd => cmd_ytd(analytics, json),
    }
}

/// Prints an error to stderr and returns a failure exit code.
fn report_error(context: &str, err: &ledger_trends::error::AnalyticsError) -> io::Result<ExitCode> {
    writeln!(io::stderr().lock(), "{} {context}: {err}", "error:".red().bold())?;
    Ok(ExitCode::FAILURE)
}

/// Writes `value` to stdout as pretty-printed JSON.
fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(io::Error::from)?;
    writeln!(out)
}

/// Executes the `trends` subcommand.
fn cmd_trends<S: BlockingLedgerSource>(
    analytics: &AnalyticsBlocking<S>,
    args: &TrendArgs,
    json: bool,
) -> io::Result<ExitCode> {
    let count = args
        .count
        .unwrap_or_else(|| args.granularity.default_period_count());
    let buckets = match analytics.trends(args.granularity, count) {
        Ok(buckets) => buckets,
        Err(err) => return report_error("failed to compute trends", &err),
    };
    let report = TrendReport {
        granularity: args.granularity,
        summary: TrendSummary::from_buckets(&buckets),
        buckets,
    };
    if json {
        print_json(&report)?;
    } else {
        print_trend_report(&report)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `categories` subcommand.
fn cmd_categories<S: BlockingLedgerSource>(
    analytics: &AnalyticsBlocking<S>,
    args: &CategoryArgs,
    json: bool,
) -> io::Result<ExitCode> {
    match analytics.category_summary(args.from, args.to, args.kind) {
        Ok(rows) if json => {
            print_json(&rows)?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(rows) => {
            print_categories_table(&rows, args.kind)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("failed to summarize categories", &err),
    }
}

/// Executes the `budgets` subcommand.
fn cmd_budgets<S: BlockingLedgerSource>(
    analytics: &AnalyticsBlocking<S>,
    top: Option<usize>,
    json: bool,
) -> io::Result<ExitCode> {
    let progress = match analytics.budget_progress() {
        Ok(progress) => progress,
        Err(err) => return report_error("failed to evaluate budgets", &err),
    };
    let rows = match top {
        Some(n) => budget_progress::top_alerts(&progress, n),
        None => progress,
    };
    if json {
        print_json(&rows)?;
    } else {
        print_budgets_table(&rows)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `heatmap` subcommand.
fn cmd_heatmap<S: BlockingLedgerSource>(
    analytics: &AnalyticsBlocking<S>,
    days: u32,
    kind: TransactionKind,
    json: bool,
) -> io::Result<ExitCode> {
    let points = match analytics.daily_activity(days, kind) {
        Ok(points) => points,
        Err(err) => return report_error("failed to compute daily activity", &err),
    };
    let grid = heatmap::build_heatmap(&points);
    if json {
        print_json(&grid)?;
    } else {
        print_heatmap(&grid, kind)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `ytd` subcommand.
fn cmd_ytd<S: BlockingLedgerSource>(
    analytics: &AnalyticsBlocking<S>,
    json: bool,
) -> io::Result<ExitCode> {
    match analytics.year_to_date() {
        Ok(comparison) if json => {
            print_json(&comparison)?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(Some(comparison)) => {
            print_ytd_table(&comparison)?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            writeln!(
                io::stdout().lock(),
                "{}",
                "Not enough data to compare with last year.".dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("failed to compare year to date", &err),
    }
}

// ── Output formatting ────────────────────────────────────────────────

/// Formats a percentage change coloured by its favorability.
fn format_change(pct: Option<f64>, favorability: Favorability) -> String {
    match (pct, favorability) {
        (Some(value), Favorability::Favorable) => format!("{value:+.1}%").green().to_string(),
        (Some(value), Favorability::Unfavorable) => format!("{value:+.1}%").red().to_string(),
        (None, _) | (_, Favorability::Unavailable) => "n/a".dimmed().to_string(),
    }
}

/// Describes a fitted trend line.
fn describe_fit(fit: Option<&TrendFit>) -> String {
    let Some(line) = fit else {
        return "not enough data".dimmed().to_string();
    };
    let arrow = match line.direction {
        TrendDirection::Up => "\u{2191}",
        TrendDirection::Down => "\u{2193}",
        TrendDirection::Flat => "\u{2192}",
    };
    line.slope_pct_of_mean.map_or_else(
        || format!("{arrow} {:+.2} per period", line.slope),
        |pct| format!("{arrow} {:+.2} per period ({pct:+.1}% of mean)", line.slope),
    )
}

/// Describes a half-over-half comparison.
fn describe_change(change: Option<&WindowComparison>) -> String {
    change.map_or_else(
        || "not enough data".dimmed().to_string(),
        |cmp| {
            format!(
                "{:.2} vs {:.2} ({})",
                cmp.current,
                cmp.previous,
                format_change(cmp.pct, cmp.favorability)
            )
        },
    )
}

/// Prints trend buckets in a table followed by their summary.
fn print_trend_report(report: &TrendReport) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Period").fg(Color::Cyan),
        Cell::new("Income").fg(Color::Cyan),
        Cell::new("Expenses").fg(Color::Cyan),
        Cell::new("Balance").fg(Color::Cyan),
    ]);
    for bucket in &report.buckets {
        let balance_color = if bucket.balance < 0.0_f64 {
            Color::Red
        } else {
            Color::Green
        };
        _ = table.add_row(vec![
            Cell::new(&bucket.period_key),
            Cell::new(format!("{:.2}", bucket.income)),
            Cell::new(format!("{:.2}", bucket.expenses)),
            Cell::new(format!("{:.2}", bucket.balance)).fg(balance_color),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Trends".green().bold(),
        format_args!("({}, {} periods)", report.granularity, report.buckets.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(out)?;
    let summary = &report.summary;
    let lines = [
        ("Income trend:", describe_fit(summary.income_trend.as_ref())),
        ("Expense trend:", describe_fit(summary.expense_trend.as_ref())),
        ("Income change:", describe_change(summary.income_change.as_ref())),
        ("Expense change:", describe_change(summary.expense_change.as_ref())),
    ];
    for (label, text) in lines {
        writeln!(out, "  {} {text}", label.bold())?;
    }
    Ok(())
}

/// Prints category totals in a table.
fn print_categories_table(rows: &[CategorySummary], kind: TransactionKind) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if rows.is_empty() {
        writeln!(out, "{}", format_args!("No {kind} transactions found.").dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Total").fg(Color::Cyan),
        Cell::new("Share").fg(Color::Cyan),
        Cell::new("Count").fg(Color::Cyan),
    ]);
    for row in rows {
        let name = if row.is_uncategorized() {
            Cell::new(&row.display_name).fg(Color::DarkGrey)
        } else {
            Cell::new(&row.display_name)
        };
        _ = table.add_row(vec![
            name,
            Cell::new(format!("{:.2}", row.total)),
            Cell::new(format!("{:.1}%", row.share)),
            Cell::new(row.transaction_count),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Categories".green().bold(),
        format_args!("({kind}, {})", rows.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Returns the status label and colour of an alert level.
const fn alert_style(level: AlertLevel) -> (&'static str, Color) {
    match level {
        AlertLevel::Normal => ("ok", Color::Green),
        AlertLevel::Warning => ("warning", Color::Yellow),
        AlertLevel::Exceeded => ("exceeded", Color::Red),
        AlertLevel::Unavailable => ("no limit", Color::DarkGrey),
    }
}

/// Prints budget progress in a table.
fn print_budgets_table(rows: &[BudgetProgress]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if rows.is_empty() {
        writeln!(out, "{}", "No active budgets.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Budget").fg(Color::Cyan),
        Cell::new("Spent").fg(Color::Cyan),
        Cell::new("Limit").fg(Color::Cyan),
        Cell::new("Remaining").fg(Color::Cyan),
        Cell::new("Used").fg(Color::Cyan),
        Cell::new("Elapsed").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);
    for row in rows {
        let (label, color) = alert_style(row.alert_level);
        let used = row
            .percentage
            .map_or_else(|| "n/a".to_owned(), |pct| format!("{pct:.1}%"));
        let elapsed = row
            .elapsed_pct
            .map_or_else(|| "n/a".to_owned(), |pct| format!("{pct:.0}%"));
        _ = table.add_row(vec![
            Cell::new(&row.display_name),
            Cell::new(format!("{:.2}", row.spent)),
            Cell::new(format!("{:.2}", row.limit_amount)),
            Cell::new(format!("{:.2}", row.remaining)),
            Cell::new(used).fg(color),
            Cell::new(elapsed),
            Cell::new(label).fg(color),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Budgets".green().bold(),
        format_args!("({})", rows.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Shade used for a heatmap cell.
const fn heatmap_glyph(cell: &HeatmapCell) -> char {
    match *cell {
        HeatmapCell::Padding => ' ',
        HeatmapCell::Day { level: 0, .. } => '\u{b7}',
        HeatmapCell::Day { level: 1, .. } => '\u{2591}',
        HeatmapCell::Day { level: 2, .. } => '\u{2592}',
        HeatmapCell::Day { level: 3, .. } => '\u{2593}',
        HeatmapCell::Day { .. } => '\u{2588}',
    }
}

/// Renders the heatmap as text: one line per position within a column,
/// one character per column.
fn render_heatmap(grid: &Heatmap) -> Vec<String> {
    (0..DAYS_PER_COLUMN)
        .map(|row| {
            grid.columns
                .iter()
                .map(|column| column.get(row).map_or(' ', heatmap_glyph))
                .collect()
        })
        .collect()
}

/// Prints the heatmap grid with a legend.
fn print_heatmap(grid: &Heatmap, kind: TransactionKind) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let first = grid
        .columns
        .first()
        .and_then(|column| column.first())
        .map(HeatmapCell::date_label)
        .unwrap_or_default();
    let last = grid
        .columns
        .last()
        .and_then(|column| column.iter().rev().find(|cell| !cell.is_padding()))
        .map(HeatmapCell::date_label)
        .unwrap_or_default();

    writeln!(
        out,
        "{} {}",
        "Daily activity".green().bold(),
        format_args!("({kind}, {first} to {last})").dimmed()
    )?;
    writeln!(out)?;
    for line in render_heatmap(grid) {
        writeln!(out, "  {line}")?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "  {} \u{b7} none  \u{2591}\u{2592}\u{2593}\u{2588} up to {:.2}",
        "legend:".dimmed(),
        grid.max_value
    )?;
    Ok(())
}

/// Prints the year-to-date comparison in a table.
fn print_ytd_table(comparison: &YtdComparison) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let current = &comparison.current;
    let previous = &comparison.previous;

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("").fg(Color::Cyan),
        Cell::new(current.year).fg(Color::Cyan),
        Cell::new(previous.year).fg(Color::Cyan),
        Cell::new("Change").fg(Color::Cyan),
    ]);
    let rows = [
        ("Income", current.income, previous.income, comparison.income_pct, false),
        ("Expenses", current.expenses, previous.expenses, comparison.expenses_pct, true),
        ("Balance", current.balance, previous.balance, comparison.balance_pct, false),
    ];
    for (label, this_year, last_year, pct, invert) in rows {
        _ = table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{this_year:.2}")),
            Cell::new(format!("{last_year:.2}")),
            Cell::new(format_change(pct, compare::classify(pct, invert))),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Year to date".green().bold(),
        format_args!("(first {} months)", comparison.months_elapsed).dimmed()
    )?;
    if previous.months_present < comparison.months_elapsed {
        writeln!(
            out,
            "  {} only {} of {} months of {} are in the ledger",
            "note:".yellow(),
            previous.months_present,
            comparison.months_elapsed,
            previous.year
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // stderr may itself be gone; nothing more to do then.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
