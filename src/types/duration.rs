use anyhow::{Result, anyhow, bail};
use num_rational::Ratio;

/// Exact rational duration measured in whole notes.
pub type Duration = Ratio<i64>;

/// Position in time measured from the start of the root component.
pub type Offset = Ratio<i64>;

/// Tuplet and leaf multipliers share the duration representation.
pub type Multiplier = Ratio<i64>;

pub fn zero() -> Duration {
    Duration::from_integer(0)
}

pub fn is_zero(duration: &Duration) -> bool {
    *duration.numer() == 0
}

fn is_power_of_two(n: i64) -> bool {
    n > 0 && n & (n - 1) == 0
}

/// True when the duration can be written as a single (possibly dotted)
/// note value between a 1/128 and a longa.
pub fn is_assignable(duration: &Duration) -> bool {
    let numer = *duration.numer();
    let denom = *duration.denom();
    if numer <= 0 || !is_power_of_two(denom) {
        return false;
    }
    // 1, 3, 7, 15 ... are the only numerators reachable by adding dots
    if !is_power_of_two(numer + 1) {
        return false;
    }
    *duration < Duration::from_integer(8)
}

/// Largest assignable duration not exceeding `limit`.
fn largest_assignable_within(limit: &Duration) -> Option<Duration> {
    let mut base = Duration::from_integer(4);
    while base > *limit {
        base /= 2;
        if *base.denom() > 1024 {
            return None;
        }
    }
    let mut candidate = base;
    let mut dot = base / 2;
    while candidate + dot <= *limit && *dot.denom() <= 1024 {
        candidate += dot;
        dot /= 2;
    }
    Some(candidate)
}

/// Splits a duration into assignable parts, longest first.
pub fn assignable_parts(duration: &Duration) -> crate::error::Result<Vec<Duration>> {
    if *duration.numer() <= 0 || !is_power_of_two(*duration.denom()) {
        return Err(crate::error::Error::Assignability(*duration));
    }
    let mut parts = Vec::new();
    let mut remaining = *duration;
    while *remaining.numer() > 0 {
        let part = largest_assignable_within(&remaining)
            .ok_or(crate::error::Error::Assignability(*duration))?;
        parts.push(part);
        remaining -= part;
    }
    Ok(parts)
}

/// Parses a LilyPond duration such as `8`, `4..`, `\breve`.
pub fn parse_lilypond_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let body = s.trim_end_matches('.');
    let dots = (s.len() - body.len()) as u32;

    let base = match body {
        "\\longa" => Duration::from_integer(4),
        "\\breve" => Duration::from_integer(2),
        _ => {
            let denom: i64 = body
                .parse()
                .map_err(|_| anyhow!("Invalid duration: {}", s))?;
            if !is_power_of_two(denom) || denom > 128 {
                bail!("Invalid duration: {}", s);
            }
            Duration::new(1, denom)
        }
    };

    let mut total = base;
    let mut dot = base;
    for _ in 0..dots {
        dot /= 2;
        total += dot;
    }
    Ok(total)
}

/// Formats an assignable duration as LilyPond text, or `None` when the
/// duration needs more than one note value.
pub fn lilypond_duration(duration: &Duration) -> Option<String> {
    if !is_assignable(duration) {
        return None;
    }
    let dots = (*duration.numer() + 1).trailing_zeros() - 1;
    let base = Duration::new(1 << dots, *duration.denom());
    let body = if base == Duration::from_integer(4) {
        "\\longa".to_string()
    } else if base == Duration::from_integer(2) {
        "\\breve".to_string()
    } else {
        base.recip().to_integer().to_string()
    };
    Some(format!("{}{}", body, ".".repeat(dots as usize)))
}
