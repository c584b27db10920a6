//! Gaze Flux CLI - Command-line interface for Gaze Flux
//!
//! Commands:
//! - report: Compute cohort metrics and report chapters from fixation files
//! - metrics: Print per-participant metrics for one fixation file
//! - validate: Validate fixation record schema
//! - doctor: Diagnose configuration and environment
//! - schema: Print input or output schema

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gaze_flux::chapters::assemble_chapters;
use gaze_flux::config::ReportConfig;
use gaze_flux::encoder::{ReportEncoder, REPORT_VERSION};
use gaze_flux::pipeline::{MetricsProcessor, SkippedParticipant};
use gaze_flux::render::{CollectingSink, JsonSpecSink, RenderSink};
use gaze_flux::schema::{FixationAdapter, FixationRecord, TaskEvent, TaskEventAdapter, SCHEMA_VERSION};
use gaze_flux::tables::{dwell_revisit_table, transition_count_table};
use gaze_flux::types::ParticipantMetrics;
use gaze_flux::{MetricsAggregator, MetricsError, GAZE_FLUX_VERSION, PRODUCER_NAME};

/// Gaze Flux - Eye-tracking metrics engine for usability reports
#[derive(Parser)]
#[command(name = "gaze-flux")]
#[command(author = "Synheart AI Inc")]
#[command(version = GAZE_FLUX_VERSION)]
#[command(about = "Compute AOI dwell, revisit and transition metrics from fixation logs", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute cohort metrics and report chapters
    Report {
        /// Input file paths, one or more participants each (use - for stdin)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Report configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Task event export for the time-on-task chapter (same format as the input)
        #[arg(long)]
        tasks: Option<PathBuf>,

        /// Write a JSON chart spec next to every figure destination
        #[arg(long)]
        charts: bool,
    },

    /// Print per-participant metrics for one input file
    Metrics {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate fixation record schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a report configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one fixation per line)
    Ndjson,
    /// JSON array of fixations
    Json,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (gaze.fixation.v1)
    Input,
    /// Output schema (gaze.report.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn run(cli: Cli) -> Result<(), CliFailure> {
    match cli.command {
        Commands::Report {
            input,
            output,
            input_format,
            config,
            tasks,
            charts,
        } => cmd_report(
            &input,
            &output,
            input_format,
            config.as_deref(),
            tasks.as_deref(),
            charts,
        ),

        Commands::Metrics {
            input,
            input_format,
            json,
        } => cmd_metrics(&input, input_format, json),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_report(
    inputs: &[PathBuf],
    output: &Path,
    input_format: InputFormat,
    config_path: Option<&Path>,
    tasks_path: Option<&Path>,
    charts: bool,
) -> Result<(), CliFailure> {
    let config = match config_path {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };

    let mut processor = MetricsProcessor::from_config(&config);
    let mut total_records = 0;

    // Records without a participant field are named after their file position.
    // An unreadable file is skipped under its path and the report goes on.
    for (i, input) in inputs.iter().enumerate() {
        match read_records(input, input_format) {
            Ok(records) => {
                total_records += records.len();
                processor.add_records(&records, &format!("Participant {}", i + 1));
            }
            Err(e) => processor.skip_input(&input.display().to_string(), &e),
        }
    }

    if total_records == 0 && processor.skipped().is_empty() {
        return Err(CliFailure::NoFixations);
    }

    if let Some(path) = tasks_path {
        match read_task_events(path, input_format) {
            Ok(events) => processor.add_task_events(&events),
            Err(e) => log::warn!("Time on task left out: {}", e),
        }
    }

    let run = processor.finish()?;

    let mut json_sink = JsonSpecSink::new();
    let mut collecting_sink = CollectingSink::new();
    let sink: &mut dyn RenderSink = if charts {
        &mut json_sink
    } else {
        &mut collecting_sink
    };
    let chapters = assemble_chapters(&run, &config, sink)?;

    log::info!(
        "Report: {} participants, {} skipped, {} chapters",
        run.participants.len(),
        run.skipped.len(),
        chapters.len()
    );

    let payload = ReportEncoder::new().encode(&run, &chapters);
    write_json(output, &payload)
}

fn cmd_metrics(input: &Path, input_format: InputFormat, json: bool) -> Result<(), CliFailure> {
    let config = ReportConfig::default();
    let records = read_records(input, input_format)?;
    if records.is_empty() {
        return Err(CliFailure::NoFixations);
    }

    // A malformed participant is reported and the others are still printed
    let mut processor = MetricsProcessor::from_config(&config);
    processor.add_records(&records, "Participant 1");
    let run = processor.finish()?;

    if json {
        let output = MetricsOutput {
            participants: &run.participants,
            skipped: &run.skipped,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for metrics in &run.participants {
            // A single participant folds into a cohort of one
            let own = MetricsAggregator::fold(std::slice::from_ref(metrics))?;
            let mut dwell = dwell_revisit_table(&own);
            dwell.title = metrics.participant.clone();

            println!("{}", dwell.to_text(config.decimals).to_plain_string());
            println!(
                "{}",
                transition_count_table("Transitions", &metrics.transitions)
                    .to_text(config.decimals)
                    .to_plain_string()
            );
        }

        for skipped in &run.skipped {
            println!("Skipped {}: {}", skipped.participant, skipped.reason);
        }
    }

    if run.participants.is_empty() {
        Err(CliFailure::AllSkipped(run.skipped.len()))
    } else {
        Ok(())
    }
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), CliFailure> {
    let records = read_records(input, input_format)?;

    // Validate each record
    let results = FixationAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                participant: r.participant.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Record {} ({}): {}",
                    err.index,
                    err.participant.as_deref().unwrap_or("no participant"),
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(CliFailure::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), CliFailure> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "gaze_flux_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Gaze Flux version {}", GAZE_FLUX_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    // Check the configuration, falling back to defaults when none is given
    let config = match config_path {
        Some(path) if !path.exists() => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Configuration file does not exist, using defaults".to_string(),
            });
            ReportConfig::default()
        }
        Some(path) => match ReportConfig::load(path) {
            Ok(config) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Configuration file valid ({})", path.display()),
                });
                config
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                });
                ReportConfig::default()
            }
        },
        None => ReportConfig::default(),
    };

    let output_dir_check = if config.output_dir.is_dir() {
        DoctorCheck {
            name: "output_dir".to_string(),
            status: CheckStatus::Ok,
            message: format!("Figures go to {}", config.output_dir.display()),
        }
    } else {
        DoctorCheck {
            name: "output_dir".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "{} does not exist yet, it is created when charts are written",
                config.output_dir.display()
            ),
        }
    };
    checks.push(output_dir_check);

    let enabled: Vec<&str> = [
        ("time_on_task", config.time_on_task.enabled),
        ("average_fixation", config.average_fixation.enabled),
        ("dwell_times", config.dwell_times.enabled),
        ("transitions", config.transitions.enabled),
    ]
    .iter()
    .filter(|(_, on)| *on)
    .map(|(name, _)| *name)
    .collect();
    checks.push(DoctorCheck {
        name: "chapters".to_string(),
        status: if enabled.is_empty() {
            CheckStatus::Warning
        } else {
            CheckStatus::Ok
        },
        message: format!("Enabled chapters: [{}]", enabled.join(", ")),
    });

    // Check stdin is available (for piped input)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for -i -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: GAZE_FLUX_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Gaze Flux Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(CliFailure::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), CliFailure> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per fixation, in temporal order per participant:");
                println!();
                println!("- aoi (alias AOI): Area-of-interest label");
                println!("- start_time (alias \"Start time\"): Fixation start in seconds");
                println!("- end_time (alias \"End time\"): Fixation end in seconds");
                println!("- fixation_time (alias \"Fixation time\"): Optional duration in seconds");
                println!("- participant: Optional participant id for pooled files");
                println!("- schema_version: Optional, must be {} when present", SCHEMA_VERSION);
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: gaze.report.v1");
                println!();
                println!("The report payload contains:");
                println!();
                println!("- report_version: Payload version ({})", REPORT_VERSION);
                println!("- producer: {{ name, version, instance_id }}");
                println!("- computed_at_utc: RFC 3339 timestamp");
                println!("- participants: Per-participant AOIs, dwell, revisits, transitions, fixations");
                println!("- skipped: {{ position, participant, reason }} for rejected logs and files");
                println!("- cohort: Cohort means, summed transitions, pooled fixations (or null)");
                println!("- task_times: Task completion times, present when task events were given");
                println!("- chapters: {{ title, blocks }} with heading, table and figure blocks");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, MetricsError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_records(input: &Path, format: InputFormat) -> Result<Vec<FixationRecord>, MetricsError> {
    let input_data = read_input(input)?;
    let parsed = match format {
        InputFormat::Ndjson => FixationAdapter::parse_ndjson(&input_data),
        InputFormat::Json => FixationAdapter::parse_array(&input_data),
    };
    parsed.map_err(|e| MetricsError::ParseError(format!("{}: {}", input.display(), e)))
}

fn read_task_events(input: &Path, format: InputFormat) -> Result<Vec<TaskEvent>, MetricsError> {
    let input_data = read_input(input)?;
    let parsed = match format {
        InputFormat::Ndjson => TaskEventAdapter::parse_ndjson(&input_data),
        InputFormat::Json => TaskEventAdapter::parse_array(&input_data),
    };
    parsed.map_err(|e| MetricsError::ParseError(format!("{}: {}", input.display(), e)))
}

fn write_json<T: serde::Serialize>(output: &Path, value: &T) -> Result<(), CliFailure> {
    if output.to_string_lossy() == "-" {
        // Compact JSON when piped, pretty when a person is reading
        let data = if atty::is(atty::Stream::Stdout) {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{}", data);
    } else {
        fs::write(output, serde_json::to_string_pretty(value)?)?;
    }
    Ok(())
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Gaze Flux fixation record schema",
        "type": "object",
        "required": ["aoi", "start_time", "end_time"],
        "properties": {
            "schema_version": {
                "type": "string",
                "const": SCHEMA_VERSION
            },
            "participant": { "type": "string" },
            "aoi": { "type": "string", "minLength": 1 },
            "start_time": { "type": "number" },
            "end_time": { "type": "number" },
            "fixation_time": { "type": "number", "minimum": 0 }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "gaze.report.v1",
        "description": "Gaze Flux report payload",
        "type": "object",
        "required": ["report_version", "producer", "computed_at_utc", "participants", "skipped", "chapters"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "participants": { "type": "array", "items": { "type": "object" } },
            "skipped": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "position": { "type": "integer", "minimum": 1 },
                        "participant": { "type": "string" },
                        "reason": { "type": "string" }
                    }
                }
            },
            "cohort": { "type": ["object", "null"] },
            "task_times": { "type": "object" },
            "chapters": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "blocks": { "type": "array", "items": { "type": "object" } }
                    }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum CliFailure {
    Io(io::Error),
    Metrics(MetricsError),
    Json(serde_json::Error),
    NoFixations,
    AllSkipped(usize),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for CliFailure {
    fn from(e: io::Error) -> Self {
        CliFailure::Io(e)
    }
}

impl From<MetricsError> for CliFailure {
    fn from(e: MetricsError) -> Self {
        CliFailure::Metrics(e)
    }
}

impl From<serde_json::Error> for CliFailure {
    fn from(e: serde_json::Error) -> Self {
        CliFailure::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliFailure> for CliError {
    fn from(e: CliFailure) -> Self {
        match e {
            CliFailure::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliFailure::Metrics(e) => {
                let (code, hint) = match &e {
                    MetricsError::InvalidInput(_) => (
                        "INVALID_INPUT",
                        "Run 'gaze-flux validate' to find the malformed records",
                    ),
                    MetricsError::NoData(_) | MetricsError::MissingAoi { .. } => {
                        ("NO_DATA", "Check that every participant has fixations")
                    }
                    MetricsError::ParseError(_) | MetricsError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Ensure input matches the gaze.fixation.v1 schema and --input-format",
                    ),
                    MetricsError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'gaze-flux doctor --config <file>'")
                    }
                    MetricsError::RenderError(_) | MetricsError::Io(_) => (
                        "RENDER_ERROR",
                        "Check that the output directory is writable",
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CliFailure::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliFailure::NoFixations => CliError {
                code: "NO_FIXATIONS".to_string(),
                message: "No fixations found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            CliFailure::AllSkipped(count) => CliError {
                code: "ALL_SKIPPED".to_string(),
                message: format!("All {} participants were skipped", count),
                hint: Some("Run 'gaze-flux validate' to find the malformed records".to_string()),
            },
            CliFailure::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            CliFailure::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct MetricsOutput<'a> {
    participants: &'a [ParticipantMetrics],
    skipped: &'a [SkippedParticipant],
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    participant: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
