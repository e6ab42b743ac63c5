//! Process-wide settings read from the environment.

use std::env;

/// Environment variable that switches verbose mode on.
///
/// In verbose mode every executed command line is logged and the stdout of
/// `run`/`output` style calls is echoed to the caller's stdout.
pub const VERBOSE_ENV: &str = "SHX_VERBOSE";

/// Reports whether verbose mode is enabled.
///
/// Read on every call, so changes to [`VERBOSE_ENV`] apply to the next command.
pub fn verbose() -> bool {
    env::var(VERBOSE_ENV)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(false)
}

/// Sets [`VERBOSE_ENV`] for this process and every child spawned afterwards.
///
/// Intended for drivers during startup, before any other threads read the
/// environment.
pub fn set_verbose(on: bool) {
    // SAFETY: drivers call this during single-threaded startup.
    unsafe { env::set_var(VERBOSE_ENV, if on { "true" } else { "false" }) }
}

/// Parses the boolean spellings accepted by [`VERBOSE_ENV`].
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for v in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    #[serial]
    fn verbose_follows_environment() {
        set_verbose(true);
        assert!(verbose());

        set_verbose(false);
        assert!(!verbose());

        unsafe { env::set_var(VERBOSE_ENV, "garbage") };
        assert!(!verbose());

        unsafe { env::remove_var(VERBOSE_ENV) };
        assert!(!verbose());
    }
}
