// cellcheck CLI - validate spreadsheets against templates, generate
// data-entry workbooks, extract templates from existing workbooks

mod exit_codes;
mod logging;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use cellcheck_engine::{Template, TracingReporter, ValidationOptions, ValidationOutcome};
use cellcheck_io::{IoError, SheetSelector, SourceKind, SourceSpec};

use exit_codes::{
    io_exit_code, EXIT_CANT_CREATE, EXIT_DATA_INVALID, EXIT_INTERNAL, EXIT_NO_INPUT,
    EXIT_SUCCESS, EXIT_TEMPLATE, EXIT_USAGE,
};
use logging::{init_logging, LogConfig};

#[derive(Parser, Debug)]
#[command(name = "cellcheck")]
#[command(about = "Validate spreadsheet and CSV files against column templates")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a spreadsheet or delimited file against a template
    #[command(after_help = "\
Examples:
  cellcheck validate samples.toml samples.xlsx --sheet Data
  cellcheck validate samples.toml samples.csv --delimiter ';' --row 2
  cellcheck validate samples.toml export.txt --type tabular --json

Exit codes:
  0   all rows passed
  65  validation failed
  66  source missing or unreadable
  69  template unusable
  70  rule error while checking rows")]
    Validate {
        /// Template file (TOML)
        template: PathBuf,

        /// File to validate
        source: PathBuf,

        /// Source type (inferred from the extension if omitted)
        #[arg(long = "type", short = 't')]
        kind: Option<SourceType>,

        /// Worksheet name or 0-based index (spreadsheets only)
        #[arg(long, short = 's')]
        sheet: Option<String>,

        /// Field delimiter (tabular only; sniffed if omitted)
        #[arg(long, short = 'd')]
        delimiter: Option<char>,

        /// Rows to skip before the header row
        #[arg(long, short = 'r', default_value_t = 0)]
        row: usize,

        /// Skip source columns the template has no rule for
        #[arg(long)]
        ignore_missing_validators: bool,

        /// Print the full outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Write a blank data-entry workbook with dropdowns and input constraints
    #[command(after_help = "\
Examples:
  cellcheck generate samples.toml samples.xlsx")]
    Generate {
        /// Template file (TOML)
        template: PathBuf,

        /// Output workbook (.xlsx)
        output: PathBuf,
    },

    /// Rebuild a template from a workbook's data validations
    #[command(after_help = "\
Examples:
  cellcheck extract samples.xlsx samples.toml
  cellcheck extract intake.xlsx intake.toml --sheet Entries")]
    Extract {
        /// Workbook to read (.xlsx)
        source: PathBuf,

        /// Output template file (TOML)
        output: PathBuf,

        /// Worksheet holding the headers and validations
        #[arg(long, short = 's', default_value = "Data")]
        sheet: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceType {
    /// xlsx, xls, xlsb or ods workbook
    Spreadsheet,
    /// Delimited text (csv, tsv, ...)
    Tabular,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(message) = init_logging(&LogConfig::from_verbosity(cli.verbose, cli.quiet)) {
        eprintln!("warning: {}", message);
    }

    let result = match cli.command {
        Commands::Validate {
            template,
            source,
            kind,
            sheet,
            delimiter,
            row,
            ignore_missing_validators,
            json,
        } => cmd_validate(
            template,
            source,
            kind,
            sheet,
            delimiter,
            row,
            ignore_missing_validators,
            json,
        ),
        Commands::Generate { template, output } => cmd_generate(template, output),
        Commands::Extract {
            source,
            output,
            sheet,
        } => cmd_extract(source, output, sheet),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: msg.into(),
            hint: None,
        }
    }

    /// Validation ran to completion and the data did not pass.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_DATA_INVALID,
            message: msg.into(),
            hint: None,
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let code = io_exit_code(&err);
        let hint = match &err {
            IoError::SheetNotFound(_) => Some("pass --sheet with a name or 0-based index".to_string()),
            IoError::Csv(_) => Some("check the delimiter with --delimiter".to_string()),
            _ => None,
        };
        Self {
            code,
            message: err.to_string(),
            hint,
        }
    }
}

fn load_template(path: &Path) -> Result<Template, CliError> {
    Template::from_toml_file(path).map_err(|e| {
        let code = match &e {
            cellcheck_engine::TemplateError::Io { .. } => EXIT_NO_INPUT,
            _ => EXIT_TEMPLATE,
        };
        CliError {
            code,
            message: e.to_string(),
            hint: None,
        }
    })
}

// ============================================================================
// validate
// ============================================================================

/// Resolve the source description from the CLI flags.
fn source_spec(
    path: PathBuf,
    kind: Option<SourceType>,
    sheet: Option<String>,
    delimiter: Option<char>,
) -> Result<SourceSpec, CliError> {
    let delimiter = match delimiter {
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => {
            return Err(CliError::args(format!("delimiter '{c}' is not a single-byte character")))
        }
        None => None,
    };

    let mut spec = match kind {
        Some(SourceType::Spreadsheet) => SourceSpec::spreadsheet(path, SheetSelector::default()),
        Some(SourceType::Tabular) => SourceSpec::tabular(path, None),
        None => SourceSpec::infer(path),
    };

    match &mut spec.kind {
        SourceKind::Spreadsheet { sheet: selected } => {
            if delimiter.is_some() {
                return Err(CliError::args("--delimiter only applies to tabular sources")
                    .with_hint("use --type tabular for delimited text files"));
            }
            if let Some(sheet) = sheet {
                *selected = sheet.parse().unwrap_or_default();
            }
        }
        SourceKind::Tabular { delimiter: selected } => {
            if sheet.is_some() {
                return Err(CliError::args("--sheet only applies to spreadsheet sources")
                    .with_hint("use --type spreadsheet for workbooks"));
            }
            if delimiter.is_some() {
                *selected = delimiter;
            }
        }
    }
    Ok(spec)
}

#[allow(clippy::too_many_arguments)]
fn cmd_validate(
    template: PathBuf,
    source: PathBuf,
    kind: Option<SourceType>,
    sheet: Option<String>,
    delimiter: Option<char>,
    row: usize,
    ignore_missing_validators: bool,
    json: bool,
) -> Result<(), CliError> {
    let spec = source_spec(source, kind, sheet, delimiter)?;
    let template = load_template(&template)?;
    let options = ValidationOptions {
        header_row: row,
        ignore_missing_validators,
    };

    let outcome = cellcheck_io::validate(&template, &spec, &options, &TracingReporter)?;

    if json {
        let output = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError {
                code: EXIT_INTERNAL,
                message: format!("cannot serialize outcome: {e}"),
                hint: None,
            })?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", output).map_err(|e| CliError {
            code: EXIT_CANT_CREATE,
            message: e.to_string(),
            hint: None,
        })?;
    }

    if outcome.passed() {
        Ok(())
    } else {
        Err(CliError::invalid(verdict(&spec, &outcome)))
    }
}

/// One-line reason for a failed run.
fn verdict(spec: &SourceSpec, outcome: &ValidationOutcome) -> String {
    use cellcheck_engine::Abort;

    let label = spec.label();
    match outcome.abort {
        Some(Abort::NoData) => format!("{label}: no data rows"),
        Some(Abort::MissingFields) => format!(
            "{label}: missing expected fields: {}",
            outcome.missing_fields.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
        Some(Abort::MissingValidators) => format!(
            "{label}: no rule for columns: {} (use --ignore-missing-validators to skip them)",
            outcome.missing_validators.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
        None => format!(
            "{label}: {} invalid cell(s) in {} column(s) across {} row(s)",
            outcome.report.len(),
            outcome.summaries.len(),
            outcome.rows_processed
        ),
    }
}

// ============================================================================
// generate
// ============================================================================

fn cmd_generate(template: PathBuf, output: PathBuf) -> Result<(), CliError> {
    let template = load_template(&template)?;
    cellcheck_io::generate(&template, &output, &TracingReporter)?;
    Ok(())
}

// ============================================================================
// extract
// ============================================================================

fn cmd_extract(source: PathBuf, output: PathBuf, sheet: String) -> Result<(), CliError> {
    if !source.exists() {
        return Err(CliError {
            code: EXIT_NO_INPUT,
            message: format!("{}: no such file", source.display()),
            hint: None,
        });
    }
    cellcheck_io::extract(&source, Some(&sheet), &output, &TracingReporter)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate_flags() {
        let cli = Cli::try_parse_from([
            "cellcheck",
            "validate",
            "t.toml",
            "data.txt",
            "--type",
            "tabular",
            "--delimiter",
            ";",
            "--row",
            "2",
            "--ignore-missing-validators",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Validate {
                kind,
                delimiter,
                row,
                ignore_missing_validators,
                json,
                ..
            } => {
                assert_eq!(kind, Some(SourceType::Tabular));
                assert_eq!(delimiter, Some(';'));
                assert_eq!(row, 2);
                assert!(ignore_missing_validators);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_extract_sheet_default() {
        let cli = Cli::try_parse_from(["cellcheck", "extract", "in.xlsx", "out.toml"]).unwrap();
        match cli.command {
            Commands::Extract { sheet, .. } => assert_eq!(sheet, "Data"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["cellcheck", "-q", "-v", "generate", "t.toml", "o.xlsx"]).is_err());
    }

    #[test]
    fn test_source_spec_from_flags() {
        let spec = source_spec("a.xlsx".into(), None, Some("Data".into()), None).unwrap();
        assert_eq!(
            spec.kind,
            SourceKind::Spreadsheet {
                sheet: SheetSelector::Name("Data".into())
            }
        );

        let spec = source_spec("a.dat".into(), Some(SourceType::Tabular), None, Some('|')).unwrap();
        assert_eq!(spec.kind, SourceKind::Tabular { delimiter: Some(b'|') });

        let err = source_spec("a.csv".into(), None, Some("1".into()), None).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);

        let err = source_spec("a.xlsx".into(), None, None, Some(';')).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);

        let err = source_spec("a.csv".into(), None, None, Some('§')).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }
}
