//! CLI entry point for the survey rater.
//!
//! Provides subcommands for aggregating a single survey export, averaging a
//! long-format score export, summarizing every configured accreditation
//! criterion, and writing a default config.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use survey_rater::analyzers::aggregate::{AggregateOptions, aggregate};
use survey_rater::analyzers::analyzer::summarize;
use survey_rater::analyzers::average::GroupBy;
use survey_rater::analyzers::bucket::{BinaryScheme, BucketMode};
use survey_rater::analyzers::neutral::NeutralSet;
use survey_rater::analyzers::score::aggregate_scores;
use survey_rater::config::{Config, DEFAULT_CONFIG_FILE};
use survey_rater::filter::{FilterChain, FilterState, Selection};
use survey_rater::output::{
    print_json, print_pretty, save_pretty, write_averages_csv, write_distribution_csv,
    write_json, write_report_csv, write_score_groups_csv,
};
use survey_rater::parser::{LoadOptions, load_responses};
use survey_rater::scores::{ScoreLoadOptions, load_scores};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "survey_rater")]
#[command(about = "Aggregates Likert survey exports into rating distributions", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, value_name = "FILE", env = "SURVEY_RATER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a single survey CSV export
    Analyze {
        /// Path to the CSV export
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Number of stacked header rows (1 or 2)
        #[arg(long)]
        header_rows: Option<usize>,

        /// Column holding the respondent group
        #[arg(long, value_name = "NAME")]
        respondent_column: Option<String>,

        /// Joins category and question of two-row headers
        #[arg(long)]
        delimiter: Option<String>,

        /// Columns to drop before aggregation (comma-separated)
        #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Values treated as neutral (comma-separated)
        #[arg(long, value_name = "VALUES", value_delimiter = ',')]
        neutral: Option<Vec<u8>>,

        /// Count every answer, including neutral ones
        #[arg(long, conflicts_with = "neutral")]
        keep_neutral: bool,

        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        #[arg(long, value_enum)]
        scheme: Option<SchemeArg>,

        #[arg(long, value_enum)]
        group_by: Option<GroupByArg>,

        /// Only this respondent group ("All" for everyone)
        #[arg(long)]
        respondent: Option<String>,

        /// Only this category of two-row headers
        #[arg(long)]
        category: Option<String>,

        /// Only this question
        #[arg(long)]
        question: Option<String>,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Output file (json) or file stem (csv); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Average a long-format score export by one attribute
    Scores {
        /// Path to the CSV export
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Column holding the numeric score
        #[arg(long, value_name = "NAME", default_value = "Rata-rata per Kompetensi")]
        score_column: String,

        /// Attribute column the scores are averaged by
        #[arg(long, value_name = "NAME")]
        group_by: Option<String>,

        /// Keep rows where COLUMN equals VALUE; repeat to chain filters in order
        #[arg(long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize every configured criterion into JSON reports
    Summary {
        /// Directory for index.json and criteria/*.json
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },
    /// Write a default configuration file
    InitConfig {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    FourWay,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SchemeArg {
    Satisfaction,
    Understanding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupByArg {
    Respondent,
    Category,
    Question,
    CategoryQuestion,
    RespondentQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
    Pretty,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/survey_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("survey_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            header_rows,
            respondent_column,
            delimiter,
            exclude,
            neutral,
            keep_neutral,
            mode,
            scheme,
            group_by,
            respondent,
            category,
            question,
            format,
            output,
        } => {
            let config = Config::load_or_default(cli.config.as_deref())?;

            let mut load = config.input.load_options();
            override_load_options(&mut load, header_rows, respondent_column, delimiter, exclude);

            let mut options = config.aggregate.clone();
            override_aggregate_options(&mut options, neutral, keep_neutral, mode, scheme, group_by);

            let table = load_responses(&source, &load)
                .with_context(|| format!("Failed to load {}", source.display()))?;

            let filter = FilterState {
                respondent: Selection::parse(respondent.as_deref()),
                category: Selection::parse(category.as_deref()),
                question: Selection::parse(question.as_deref()),
            };
            let filtered = filter.apply(&table);
            let report = aggregate(&filtered, &options);

            info!(
                source = %source.display(),
                respondents = report.respondents,
                counted = report.distribution.total,
                satisfied_pct = report.satisfied_pct,
                "Survey aggregated"
            );

            match (format, output) {
                (FormatArg::Pretty, Some(path)) => save_pretty(&path, &report)?,
                (FormatArg::Pretty, None) => print_pretty(&report)?,
                (FormatArg::Json, Some(path)) => write_json(&path, &report)?,
                (FormatArg::Json, None) => print_json(&report)?,
                (FormatArg::Csv, Some(stem)) => {
                    write_report_csv(&stem, &report)?;
                }
                (FormatArg::Csv, None) => {
                    write_distribution_csv(std::io::stdout().lock(), &report.distribution)?;
                    write_averages_csv(std::io::stdout().lock(), &report.averages.rows)?;
                }
            }
        }
        Commands::Scores {
            source,
            score_column,
            group_by,
            filters,
            format,
            output,
        } => {
            let chain = filters
                .iter()
                .fold(FilterChain::default(), |chain, (column, value)| {
                    chain.select(column, Selection::parse(Some(value.as_str())))
                });
            let load = score_load_options(score_column, &chain, group_by.as_deref());

            let table = load_scores(&source, &load)
                .with_context(|| format!("Failed to load {}", source.display()))?;
            let report = aggregate_scores(&chain.apply(&table), group_by.as_deref());

            info!(
                source = %source.display(),
                records = report.records,
                groups = report.groups.len(),
                "Scores aggregated"
            );

            match (format, output) {
                (FormatArg::Pretty, Some(path)) => save_pretty(&path, &report)?,
                (FormatArg::Pretty, None) => print_pretty(&report)?,
                (FormatArg::Json, Some(path)) => write_json(&path, &report)?,
                (FormatArg::Json, None) => print_json(&report)?,
                (FormatArg::Csv, Some(path)) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_score_groups_csv(file, &report.groups)?;
                }
                (FormatArg::Csv, None) => {
                    write_score_groups_csv(std::io::stdout().lock(), &report.groups)?;
                }
            }
        }
        Commands::Summary { output_dir } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let output_dir = output_dir.unwrap_or_else(|| config.output.directory.clone());

            let index = summarize(&config, &output_dir)?;
            for entry in &index.criteria {
                info!(
                    criterion = %entry.id,
                    name = %entry.name,
                    total = entry.total,
                    satisfied_pct = entry.satisfied_pct,
                    "Criterion"
                );
            }
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists, use --force to overwrite", path.display());
            }
            std::fs::write(&path, Config::default_toml()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Default configuration written");
        }
    }

    Ok(())
}

/// CLI flags take precedence over the `[input]` section.
fn override_load_options(
    load: &mut LoadOptions,
    header_rows: Option<usize>,
    respondent_column: Option<String>,
    delimiter: Option<String>,
    exclude: Option<Vec<String>>,
) {
    if let Some(header_rows) = header_rows {
        load.header_rows = header_rows;
    }
    if respondent_column.is_some() {
        load.respondent_column = respondent_column;
    }
    if let Some(delimiter) = delimiter {
        load.delimiter = delimiter;
    }
    if let Some(exclude) = exclude {
        load.exclude_columns = exclude;
    }
}

/// CLI flags take precedence over the `[aggregate]` section.
fn override_aggregate_options(
    options: &mut AggregateOptions,
    neutral: Option<Vec<u8>>,
    keep_neutral: bool,
    mode: Option<ModeArg>,
    scheme: Option<SchemeArg>,
    group_by: Option<GroupByArg>,
) {
    if keep_neutral {
        options.neutral_values = NeutralSet::new();
    } else if let Some(values) = neutral {
        options.neutral_values = values.into_iter().collect();
    }
    if let Some(mode) = mode {
        options.bucket_mode = mode_to_bucket_mode(mode);
    }
    if let Some(scheme) = scheme {
        options.binary_scheme = scheme_to_binary_scheme(scheme);
    }
    if let Some(group_by) = group_by {
        options.group_by = Some(group_by_arg_to_group_by(group_by));
    }
}

/// Parses `COLUMN=VALUE`, splitting on the first `=`.
fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected COLUMN=VALUE, got {raw:?}")),
    }
}

/// Loads the filtered columns and the group column.
fn score_load_options(
    score_column: String,
    chain: &FilterChain,
    group_by: Option<&str>,
) -> ScoreLoadOptions {
    let mut attribute_columns: Vec<String> =
        chain.filters.iter().map(|f| f.column.clone()).collect();
    if let Some(group) = group_by.filter(|g| !attribute_columns.iter().any(|c| c == g)) {
        attribute_columns.push(group.to_string());
    }
    ScoreLoadOptions {
        score_column,
        attribute_columns,
    }
}

fn mode_to_bucket_mode(mode: ModeArg) -> BucketMode {
    match mode {
        ModeArg::FourWay => BucketMode::FourWay,
        ModeArg::Binary => BucketMode::Binary,
    }
}

fn scheme_to_binary_scheme(scheme: SchemeArg) -> BinaryScheme {
    match scheme {
        SchemeArg::Satisfaction => BinaryScheme::Satisfaction,
        SchemeArg::Understanding => BinaryScheme::Understanding,
    }
}

fn group_by_arg_to_group_by(group_by: GroupByArg) -> GroupBy {
    match group_by {
        GroupByArg::Respondent => GroupBy::Respondent,
        GroupByArg::Category => GroupBy::Category,
        GroupByArg::Question => GroupBy::Question,
        GroupByArg::CategoryQuestion => GroupBy::CategoryQuestion,
        GroupByArg::RespondentQuestion => GroupBy::RespondentQuestion,
    }
}
