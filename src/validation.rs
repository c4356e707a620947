//! Input validators
//!
//! Pure predicates over operator input. Prompts loop on these until they
//! return true, so every rule here is also the rule shown to the operator.

use regex::Regex;
use std::sync::LazyLock;

/// Characters that satisfy the "special character" password rule.
pub const PASSWORD_SPECIALS: &str = "@_!#$%^&*()<>?/\\|}{~:";

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum total hostname length
pub const MAX_HOSTNAME_LEN: usize = 255;

static HOSTNAME_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").ok());

// Default NAME_REGEX from useradd(8), without the trailing `$` allowance.
static USERNAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").ok());

static PACKAGE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9@_+][a-z0-9@._+-]*$").ok());

static TIMEZONE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_+-]*(?:/[A-Za-z0-9][A-Za-z0-9_+-]*){0,2}$").ok());

fn matches(re: &LazyLock<Option<Regex>>, input: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(input))
}

/// A password is strong when it has at least eight characters and contains
/// an uppercase letter, a lowercase letter, a digit and one of
/// [`PASSWORD_SPECIALS`].
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Human-readable list of the rules `password` breaks. Empty when strong.
pub fn password_weaknesses(password: &str) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        missing.push("at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        missing.push("an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        missing.push("a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        missing.push("a digit");
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        missing.push("a special character (@_!#$%^&*()<>?/\\|}{~:)");
    }
    missing
}

/// Validate a hostname.
///
/// The whole name may be at most 255 characters. One trailing dot is
/// ignored. Every dot-separated label must be 1-63 characters of letters,
/// digits and hyphens, and may not begin or end with a hyphen. The empty
/// string is rejected.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    let trimmed = hostname.strip_suffix('.').unwrap_or(hostname);
    if trimmed.is_empty() {
        return false;
    }
    trimmed.split('.').all(|label| matches(&HOSTNAME_LABEL, label))
}

/// Validate a login name for `useradd`.
pub fn is_valid_username(username: &str) -> bool {
    matches(&USERNAME, username)
}

/// Validate a single pacman package name.
pub fn is_valid_package_name(name: &str) -> bool {
    matches(&PACKAGE_NAME, name)
}

/// Validate a zoneinfo name such as `Europe/Berlin` or `UTC`.
pub fn is_valid_timezone(tz: &str) -> bool {
    !tz.contains("..") && matches(&TIMEZONE, tz)
}

/// Split a space-separated package list, returning the names that fail
/// [`is_valid_package_name`] as the error.
pub fn parse_package_list(input: &str) -> Result<Vec<String>, Vec<String>> {
    let (valid, invalid): (Vec<&str>, Vec<&str>) = input
        .split_whitespace()
        .partition(|name| is_valid_package_name(name));
    if invalid.is_empty() {
        Ok(valid.into_iter().map(String::from).collect())
    } else {
        Err(invalid.into_iter().map(String::from).collect())
    }
}
