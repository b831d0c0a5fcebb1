//! CLI Exit Code Registry
//!
//! Single source of truth for `climazone` exit codes. Scripts that rebuild
//! `cities.json` rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad arguments)                              |
//! | 3    | Run config failed to parse or validate                   |
//! | 4    | Input file could not be read or parsed                   |
//! | 5    | Output file could not be written                         |
//! | 6    | `--strict` run produced low-confidence assignments       |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// clap exits with this code on its own parse failures.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Config file unreadable as TOML, or a field failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Registry, side table or zone source could not be read or parsed.
pub const EXIT_INPUT: u8 = 4;

/// Cities JSON or report could not be written.
pub const EXIT_OUTPUT: u8 = 5;

/// `--strict`: at least one municipality landed in the low-confidence list.
pub const EXIT_LOW_CONFIDENCE: u8 = 6;
