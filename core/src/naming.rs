//! Naming conventions and small text codecs shared by extraction and binding.
//!
//! Flag names are derived from field identifiers by kebab-casing them,
//! environment variable names from flag names by upper-snake-casing them.
//! Durations use the compact `1h2m3.5s` notation.
//!
//! # Examples
//!
//! ```
//! use decli_core::naming::{env_var_name, kebab_case};
//!
//! assert_eq!(kebab_case("SomeFloat64"), "some-float64");
//! assert_eq!(kebab_case("first_name"), "first-name");
//! assert_eq!(env_var_name("some-float64", None), "SOME_FLOAT64");
//! assert_eq!(env_var_name("port", Some("APP_")), "APP_PORT");
//! ```

use std::time::Duration;

use heck::ToKebabCase;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Converts a field identifier (`UpperCamelCase` or `snake_case`) into a
/// lowercase, hyphen-separated flag name.
pub fn kebab_case(ident: &str) -> String {
    ident.to_kebab_case()
}

/// Derives an environment variable name from a flag name.
pub fn env_var_name(flag: &str, prefix: Option<&str>) -> String {
    format!(
        "{}{}",
        prefix.unwrap_or_default(),
        flag.replace('-', "_").to_uppercase()
    )
}

/// Splits a delimited list, trimming elements and dropping empty ones.
///
/// # Examples
///
/// ```
/// use decli_core::naming::split_list;
///
/// assert_eq!(split_list(" A_VAR, B_VAR ,", ','), vec!["A_VAR", "B_VAR"]);
/// assert!(split_list("", ' ').is_empty());
/// ```
pub fn split_list(src: &str, delimiter: char) -> Vec<String> {
    src.split(delimiter)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Parses the boolean spellings `1 t T TRUE true True` and
/// `0 f F FALSE false False`.
pub fn parse_bool(src: &str) -> Option<bool> {
    match src {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Like [`parse_bool`], but anything unparsable (including an empty string)
/// is `false`.
pub fn parse_bool_lenient(src: &str) -> bool {
    parse_bool(src.trim()).unwrap_or(false)
}

/// Parses duration text such as `300ms`, `1.5h` or `2h45m`.
///
/// A duration is a sequence of decimal numbers, each with an optional
/// fraction and a unit suffix. Valid units are `ns`, `us` (or `µs`), `ms`,
/// `s`, `m` and `h`. A bare `0` is accepted. Negative durations are rejected.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use decli_core::naming::parse_duration;
///
/// assert_eq!(parse_duration("5ms"), Ok(Duration::from_millis(5)));
/// assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
/// assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    let text = src.trim();
    let body = text.strip_prefix('+').unwrap_or(text);
    if body.starts_with('-') {
        return Err(format!("negative duration {src:?} is not supported"));
    }
    if body == "0" {
        return Ok(Duration::ZERO);
    }
    if body.is_empty() {
        return Err(format!("invalid duration {src:?}"));
    }

    let overflow = || format!("duration {src:?} is out of range");
    let mut total: u128 = 0;
    let mut rest = body;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("invalid duration {src:?}"));
        }

        let unit_len = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let (unit, after_unit) = after_number.split_at(unit_len);
        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => NANOS_PER_MINUTE,
            "h" => NANOS_PER_HOUR,
            "" => return Err(format!("missing unit in duration {src:?}")),
            other => return Err(format!("unknown unit {other:?} in duration {src:?}")),
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        // Digits beyond nanosecond precision of the largest unit do not
        // change the result.
        let frac_digits = &frac_part[..frac_part.len().min(18)];
        if !frac_digits.is_empty() {
            let numerator: u128 = frac_digits.parse().map_err(|_| overflow())?;
            let denominator = 10u128.pow(frac_digits.len() as u32);
            nanos = nanos
                .checked_add(numerator * scale / denominator)
                .ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = after_unit;
    }

    let nanos = u64::try_from(total).map_err(|_| overflow())?;
    Ok(Duration::from_nanos(nanos))
}

/// Formats a duration in the notation accepted by [`parse_duration`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use decli_core::naming::format_duration;
///
/// assert_eq!(format_duration(Duration::ZERO), "0s");
/// assert_eq!(format_duration(Duration::from_millis(5)), "5ms");
/// assert_eq!(format_duration(Duration::from_millis(90_500)), "1m30.5s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SECOND {
        return format!("{}ms", decimal(nanos, NANOS_PER_MILLI));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = nanos % NANOS_PER_HOUR / NANOS_PER_MINUTE;
    let seconds = nanos % NANOS_PER_MINUTE;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&format!("{}s", decimal(seconds, NANOS_PER_SECOND)));
    out
}

fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
