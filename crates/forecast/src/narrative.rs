//! Narrative-text snow extraction.
//!
//! NWS forecast periods describe snowfall in free text ("New snow
//! accumulation of 3 to 5 inches possible"). Extraction runs an explicit
//! ordered rule table; the first matching rule wins, so the priority
//! contract lives in one place instead of being implied by code layout.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use time::{Duration, OffsetDateTime};

use crate::round1;
use crate::source::ForecastPeriod;

struct SnowRule {
    name: &'static str,
    pattern: Regex,
    extract: fn(&Captures) -> f64,
}

fn first_number(caps: &Captures) -> f64 {
    caps.get(1)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn range_mean(caps: &Captures) -> f64 {
    let low = first_number(caps);
    let high = caps
        .get(2)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);
    (low + high) / 2.0
}

fn word_number(caps: &Captures) -> f64 {
    match caps
        .get(1)
        .map(|m| m.as_str().to_ascii_lowercase())
        .as_deref()
    {
        Some("half") => 0.5,
        Some("one") => 1.0,
        Some("two") => 2.0,
        Some("three") => 3.0,
        Some("four") => 4.0,
        Some("five") => 5.0,
        Some("six") => 6.0,
        Some("seven") => 7.0,
        Some("eight") => 8.0,
        Some("nine") => 9.0,
        Some("ten") => 10.0,
        _ => 0.0,
    }
}

/// Priority-ordered extraction rules. Rules 4-8 are anchored to the
/// "new snow accumulation of" clause; the final range rule matches
/// anywhere in the text as a last resort.
static RULES: LazyLock<Vec<SnowRule>> = LazyLock::new(|| {
    fn rule(name: &'static str, pattern: &str, extract: fn(&Captures) -> f64) -> SnowRule {
        SnowRule {
            name,
            // Patterns are literals; a failure here is a programming error.
            pattern: Regex::new(pattern).expect("invalid snow rule pattern"),
            extract,
        }
    }

    vec![
        rule("around-an-inch", r"(?i)around (?:one|an) inch", |_| 1.0),
        rule("less-than-half-inch", r"(?i)less than half an inch", |_| {
            0.25
        }),
        rule("less-than-an-inch", r"(?i)less than (?:an|one) inch", |_| {
            0.5
        }),
        rule(
            "accumulation-word",
            r"(?i)new snow accumulation of (?:around )?(half|one|two|three|four|five|six|seven|eight|nine|ten)\b",
            word_number,
        ),
        rule(
            "accumulation-range",
            r"(?i)new snow accumulation of \D*?(\d+(?:\.\d+)?) to (\d+(?:\.\d+)?) inch",
            range_mean,
        ),
        rule(
            "accumulation-around",
            r"(?i)new snow accumulation of around (\d+(?:\.\d+)?) inch",
            first_number,
        ),
        rule(
            "accumulation-up-to",
            // "up to" reads as a ceiling, not a measurement; discount it.
            // The 0.7 factor is a documented approximation.
            r"(?i)new snow accumulation of up to (\d+(?:\.\d+)?) inch",
            |caps| first_number(caps) * 0.7,
        ),
        rule(
            "accumulation-amount",
            r"(?i)new snow accumulation of (\d+(?:\.\d+)?) inch",
            first_number,
        ),
        rule(
            "range-possible",
            r"(?i)(\d+(?:\.\d+)?) to (\d+(?:\.\d+)?) inches possible",
            range_mean,
        ),
    ]
});

/// Estimate inches of new snow described by one narrative text.
///
/// Deterministic and side-effect free; returns 0.0 when nothing matches.
pub fn snow_inches(text: &str) -> f64 {
    match matching_rule(text) {
        Some((_, inches)) => inches,
        None => 0.0,
    }
}

/// The first rule that matches, with its extracted amount.
pub(crate) fn matching_rule(text: &str) -> Option<(&'static str, f64)> {
    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(text) {
            return Some((rule.name, (rule.extract)(&caps)));
        }
    }
    None
}

/// Snow totals over the narrative pipeline's rolling windows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SnowTotals {
    pub snow_24h: f64,
    pub snow_72h: f64,
}

/// Bucket chronological forecast periods into the next-24h and next-72h
/// windows measured from `now`, summing each period's extracted amount.
///
/// Periods are expected sorted by start time; the early exit past now+72h
/// is an optimization only, since later periods would contribute nothing.
/// An empty slice yields zero totals, never an error.
pub fn sum_periods(periods: &[ForecastPeriod], now: OffsetDateTime) -> SnowTotals {
    let h24 = now + Duration::hours(24);
    let h72 = now + Duration::hours(72);

    let mut short = 0.0;
    let mut medium = 0.0;

    for period in periods {
        if period.start_time > h72 {
            break;
        }
        let inches = snow_inches(&period.detailed_forecast);
        if inches <= 0.0 {
            continue;
        }
        if period.start_time <= h24 {
            short += inches;
        }
        medium += inches;
    }

    SnowTotals {
        snow_24h: round1(short),
        snow_72h: round1(medium),
    }
}
