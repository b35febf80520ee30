//! Calendar dates mentioned in free text.
//!
//! Explicit `YYYY-MM-DD` dates are handled by [`extract_date`]. Relative
//! phrases ("tomorrow", "in 3 days") and month-name dates ("June 1") go
//! through a [`RelativeDateResolver`], so a rule-based parser and a
//! model-backed one are interchangeable. Every phrase [`strip_date`] removes
//! is one [`RuleDateResolver`] resolves.

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::{Captures, Regex};
use std::{fmt::Debug, sync::LazyLock};

const MONTH: &str = "(?:january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)";

const ORDINAL: &str = r"(?:st|nd|rd|th)?";

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid ISO date pattern"));

static DATE_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = [
        r"(?i)\b(?:(?:on|for)\s+)?(?:the\s+)?(?:\d{4}-\d{2}-\d{2}|day after tomorrow|today|tonight|tomorrow|yesterday|(?:next|last) (?:week|month|year)|(?:in|after) \w+ (?:days?|weeks?|months?|years?)|\w+ (?:days?|weeks?|months?|years?) ago|",
        MONTH,
        r"\s+\d{1,2}",
        ORDINAL,
        r"|\d{1,2}",
        ORDINAL,
        r"\s+(?:of\s+)?",
        MONTH,
        r")\b",
    ]
    .concat();
    Regex::new(&pattern).expect("valid date phrase pattern")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = [
        r"(?i)\b(?:(",
        MONTH,
        r")\s+(\d{1,2})",
        ORDINAL,
        r"|(\d{1,2})",
        ORDINAL,
        r"\s+(?:of\s+)?(",
        MONTH,
        r"))\b",
    ]
    .concat();
    Regex::new(&pattern).expect("valid month-day pattern")
});

static AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\w+)\s+(days?|weeks?|months?|years?)\s+ago\b").expect("valid ago pattern")
});

static AHEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:in|after)\s+(\w+)\s+(days?|weeks?|months?|years?)\b")
        .expect("valid ahead pattern")
});

/// First valid `YYYY-MM-DD` date anywhere in `text`.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    ISO_DATE
        .captures_iter(text)
        .find_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
}

/// `text` with explicit dates and relative date phrases removed.
pub fn strip_date(text: &str) -> String {
    let stripped = DATE_PHRASE.replace_all(text, " ");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == '.' || c == '?' || c.is_whitespace())
        .to_string()
}

pub trait RelativeDateResolver: Send + Sync + Debug {
    fn resolve_relative_date(&self, text: &str, anchor: NaiveDate) -> Option<NaiveDate>;
}

/// English relative-date phrases, resolved against the anchor date.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleDateResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    fn parse(s: &str) -> Option<Self> {
        match s.trim_end_matches('s') {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

fn parse_count(word: &str) -> Option<u32> {
    if let Ok(n) = word.parse() {
        return Some(n);
    }
    let n = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(n)
}

fn month_number(name: &str) -> Option<u32> {
    let n = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

/// "June 1" or "1st of June", in the anchor's year.
fn month_day(caps: &Captures<'_>, year: i32) -> Option<NaiveDate> {
    let (month, day) = match (caps.get(1), caps.get(2)) {
        (Some(m), Some(d)) => (m.as_str(), d.as_str()),
        _ => (caps.get(4)?.as_str(), caps.get(3)?.as_str()),
    };
    NaiveDate::from_ymd_opt(year, month_number(month)?, day.parse().ok()?)
}

/// Move `anchor` by `n` units; month arithmetic clamps to the month end.
fn shift(anchor: NaiveDate, n: u32, unit: Unit, forward: bool) -> Option<NaiveDate> {
    match unit {
        Unit::Day | Unit::Week => {
            let per = if unit == Unit::Week { 7 } else { 1 };
            let days = Days::new(u64::from(n) * per);
            if forward { anchor.checked_add_days(days) } else { anchor.checked_sub_days(days) }
        }
        Unit::Month | Unit::Year => {
            let per = if unit == Unit::Year { 12 } else { 1 };
            let months = Months::new(n.checked_mul(per)?);
            if forward {
                anchor.checked_add_months(months)
            } else {
                anchor.checked_sub_months(months)
            }
        }
    }
}

impl RelativeDateResolver for RuleDateResolver {
    fn resolve_relative_date(&self, text: &str, anchor: NaiveDate) -> Option<NaiveDate> {
        let text = text.to_lowercase();

        if let Some(c) = AGO.captures(&text) {
            if let (Some(n), Some(unit)) = (parse_count(&c[1]), Unit::parse(&c[2])) {
                return shift(anchor, n, unit, false);
            }
        }
        if let Some(c) = AHEAD.captures(&text) {
            if let (Some(n), Some(unit)) = (parse_count(&c[1]), Unit::parse(&c[2])) {
                return shift(anchor, n, unit, true);
            }
        }
        if let Some(date) = MONTH_DAY
            .captures(&text)
            .and_then(|c| month_day(&c, anchor.year()))
        {
            return Some(date);
        }

        let has = |phrase: &str| {
            text.match_indices(phrase).any(|(i, _)| {
                let before = text[..i].chars().next_back();
                let after = text[i + phrase.len()..].chars().next();
                !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
            })
        };

        if has("day after tomorrow") {
            shift(anchor, 2, Unit::Day, true)
        } else if has("tomorrow") {
            shift(anchor, 1, Unit::Day, true)
        } else if has("yesterday") {
            shift(anchor, 1, Unit::Day, false)
        } else if has("today") || has("tonight") {
            Some(anchor)
        } else if has("next week") {
            shift(anchor, 1, Unit::Week, true)
        } else if has("last week") {
            shift(anchor, 1, Unit::Week, false)
        } else if has("next month") {
            shift(anchor, 1, Unit::Month, true)
        } else if has("last month") {
            shift(anchor, 1, Unit::Month, false)
        } else if has("next year") {
            shift(anchor, 1, Unit::Year, true)
        } else if has("last year") {
            shift(anchor, 1, Unit::Year, false)
        } else {
            None
        }
    }
}
