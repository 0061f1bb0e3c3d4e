//! Building gate options from environment variables.
//!
//! Every `TRUNKER_<UPPER_SNAKE_NAME>` variable becomes a static flag named
//! in camelCase: `TRUNKER_BETA_FEATURE_ONE=true` is the flag
//! `betaFeatureOne`, active. Values must be exactly `true` or `false`.

use dotenvy::dotenv;
use std::env;
use std::ffi::OsString;

use crate::error::TrunkerError;
use crate::flags::{Flag, Flags};
use crate::gate::{response::ErrorOptions, TrunkerOptions};

pub const ENV_PREFIX: &str = "TRUNKER_";

impl TrunkerOptions {
    /// Options whose flags come from `vars`, plus `error` as given.
    ///
    /// Variables without the `TRUNKER_` prefix are ignored. A prefixed one
    /// holding anything other than `true`/`false` fails the whole load.
    pub fn from_env<I, K, V>(vars: I, error: Option<ErrorOptions>) -> Result<Self, TrunkerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut flags = Flags::new();

        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let flag_name = to_flag_name(name);

            let active = match value.as_ref() {
                "true" => true,
                "false" => false,
                other => return Err(invalid_value(flag_name, other)),
            };

            tracing::debug!(flag = %flag_name, active, "flag loaded from environment");
            flags = flags.with(flag_name, Flag::new(active));
        }

        Ok(Self { flags, error })
    }

    /// [`TrunkerOptions::from_env`] over the process environment, after
    /// loading a `.env` file if there is one.
    ///
    /// Variables whose name is not UTF-8 are skipped. A `TRUNKER_` variable
    /// whose value is not UTF-8 is an invalid value.
    pub fn from_process_env(error: Option<ErrorOptions>) -> Result<Self, TrunkerError> {
        let _ = dotenv().is_ok();
        Self::from_env(utf8_vars(env::vars_os())?, error)
    }
}

/// UTF-8 entries of `vars`, dropping entries with a non-UTF-8 key.
fn utf8_vars<I>(vars: I) -> Result<Vec<(String, String)>, TrunkerError>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut out = Vec::new();

    for (key, value) in vars {
        let Ok(key) = key.into_string() else {
            continue;
        };
        match value.into_string() {
            Ok(value) => out.push((key, value)),
            Err(value) => {
                if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                    return Err(invalid_value(to_flag_name(name), &value.to_string_lossy()));
                }
            }
        }
    }
    Ok(out)
}

fn invalid_value(flag: String, value: &str) -> TrunkerError {
    tracing::error!(flag = %flag, value = %value, "invalid flag value in environment");
    TrunkerError::InvalidEnvValue {
        flag,
        value: value.to_string(),
    }
}

/// `BETA_FEATURE_ONE` -> `betaFeatureOne`.
///
/// Only an underscore followed by a letter is folded, so `FEATURE_2` stays
/// `feature_2`.
pub fn to_flag_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut chars = lower.chars().peekable();

    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(next) if c == '_' && next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}
