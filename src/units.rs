//! Engineering-prefixed magnitudes ("4.7k" <-> 4700.0).

use lazy_static::lazy_static;
use nom::{
    character::complete::{one_of, space0},
    combinator::{all_consuming, opt},
    number::complete::double,
    sequence::{pair, preceded, terminated},
    IResult,
};
use regex::Regex;

use crate::error::UnitError;

/// Prefix symbols and their power of ten, smallest first.
const PREFIXES: [(&str, i32); 9] = [
    ("p", -12),
    ("n", -9),
    ("µ", -6),
    ("m", -3),
    ("", 0),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
];

const UNIT_PREFIX: usize = 4;

/// Letters accepted as a prefix when reading. 'u' and the greek mu are
/// accepted as micro, 'K' as kilo.
const PREFIX_LETTERS: &str = "pnuµμmkKMGT";

lazy_static! {
    // Everything that cannot be part of a magnitude.
    static ref NON_MAGNITUDE: Regex = Regex::new(r"[^pnuµμmkKMGT0-9.\-]").unwrap();
}

fn scale(value: f64, exponent: i32) -> f64 {
    if exponent >= 0 {
        value * 10f64.powi(exponent)
    } else {
        value / 10f64.powi(-exponent)
    }
}

fn prefix_exponent(letter: char) -> i32 {
    match letter {
        'p' => -12,
        'n' => -9,
        'u' | 'µ' | 'μ' => -6,
        'm' => -3,
        'k' | 'K' => 3,
        'M' => 6,
        'G' => 9,
        'T' => 12,
        _ => 0,
    }
}

fn pick_prefix(value: f64) -> usize {
    let abs = value.abs();
    if abs == 0.0 || !abs.is_finite() {
        return UNIT_PREFIX;
    }
    PREFIXES
        .iter()
        .rposition(|&(_, exp)| abs >= scale(1.0, exp))
        .unwrap_or(0)
}

/// Formats `value` with the closest magnitude prefix (p through T), a fixed
/// number of decimals, and an optional unit symbol.
///
/// ```
/// use livesim::units::to_engineering;
/// assert_eq!(to_engineering(4700.0, "Ω", 3), "4.700kΩ");
/// assert_eq!(to_engineering(0.02, "A", 1), "20.0mA");
/// ```
pub fn to_engineering(value: f64, unit: &str, precision: usize) -> String {
    let mut index = pick_prefix(value);
    let (_, exp) = PREFIXES[index];
    let mut text = format!("{:.*}", precision, scale(value, -exp));

    // 999.9996 rounds up to 1000.000, move to the next prefix.
    let rounded: f64 = text.trim_start_matches('-').parse().unwrap_or(0.0);
    if rounded >= 1000.0 && index + 1 < PREFIXES.len() {
        index += 1;
        let (_, exp) = PREFIXES[index];
        text = format!("{:.*}", precision, scale(value, -exp));
    }

    format!("{}{}{}", text, PREFIXES[index].0, unit)
}

fn magnitude(input: &str) -> IResult<&str, (f64, Option<char>)> {
    all_consuming(terminated(
        pair(double, opt(preceded(space0, one_of(PREFIX_LETTERS)))),
        space0,
    ))(input)
}

fn parse_magnitude(text: &str) -> Result<f64, UnitError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(UnitError::Empty);
    }
    let (_, (value, prefix)) =
        magnitude(text).map_err(|_| UnitError::Invalid(text.to_string()))?;
    Ok(match prefix {
        Some(letter) => scale(value, prefix_exponent(letter)),
        None => value,
    })
}

/// Keeps digits, the first decimal point, a sign and prefix letters.
fn strip_to_magnitude(text: &str) -> String {
    let filtered = NON_MAGNITUDE.replace_all(text, "");
    let mut seen_point = false;
    filtered
        .chars()
        .filter(|&c| {
            if c == '.' {
                let keep = !seen_point;
                seen_point = true;
                keep
            } else {
                true
            }
        })
        .collect()
}

/// Reads a magnitude such as "4.7kΩ" given the expected unit symbol.
///
/// When the symbol is present it is removed before parsing. If that does not
/// yield a number (unknown symbol, stray text) every character that cannot be
/// part of a magnitude is dropped and the remainder is parsed again. The
/// fallback is best effort only.
pub fn from_engineering(text: &str, symbol: &str) -> Result<f64, UnitError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(UnitError::Empty);
    }

    let without_symbol = if !symbol.is_empty() && text.contains(symbol) {
        text.replace(symbol, "")
    } else {
        text.to_string()
    };

    match parse_magnitude(&without_symbol) {
        Ok(value) => Ok(value),
        Err(_) => {
            let stripped = strip_to_magnitude(&without_symbol);
            parse_magnitude(&stripped).map_err(|_| UnitError::Invalid(text.to_string()))
        }
    }
}
