//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! Non-zero codes follow the BSD `sysexits.h` numbering so that wrappers can
//! tell bad data apart from a bad template.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (validation passed, file written)            |
//! | 2    | CLI usage error (bad args, conflicting options)      |
//! | 65   | Source data failed validation                        |
//! | 66   | Input missing or unreadable                          |
//! | 69   | Template unusable (parse, consistency, layout)       |
//! | 70   | Internal rule error while checking rows              |
//! | 73   | Output file could not be written                     |

use cellcheck_io::IoError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// The source was read but did not pass validation.
pub const EXIT_DATA_INVALID: u8 = 65;

/// Source file, sheet or template file missing or unreadable.
pub const EXIT_NO_INPUT: u8 = 66;

/// Template cannot be parsed, is inconsistent, or cannot be laid out.
pub const EXIT_TEMPLATE: u8 = 69;

/// A rule hit a structural error (e.g. unregistered linked-set parent value).
pub const EXIT_INTERNAL: u8 = 70;

/// Output workbook or template could not be created.
pub const EXIT_CANT_CREATE: u8 = 73;

/// Map an io-layer error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::File { .. }
        | IoError::SheetNotFound(_)
        | IoError::Spreadsheet(_)
        | IoError::Csv(_)
        | IoError::Xml(_) => EXIT_NO_INPUT,
        IoError::Write(_) => EXIT_CANT_CREATE,
        IoError::Template(_) | IoError::Generate(_) => EXIT_TEMPLATE,
        IoError::Rule(_) => EXIT_INTERNAL,
    }
}
