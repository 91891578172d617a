//! Frequency counts behind the charts and the summary report.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::constants::{EMPTY_LABEL, KEYWORD_MIN_CHARS, KEYWORD_PUNCTUATION};
use crate::normalize::parse_date;
use crate::table::ColumnValues;

#[derive(Debug, Clone, PartialEq)]
pub struct Frequency {
    pub label: String,
    pub count: usize,
}

impl Frequency {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Count distinct values, most frequent first. Ties keep first-occurrence
/// order; blank values are counted under `(empty)`.
pub fn value_counts<'a, I>(values: I) -> Vec<Frequency>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<Frequency> = Vec::new();

    for value in values {
        let key = match value.trim() {
            "" => EMPTY_LABEL,
            trimmed => trimmed,
        };
        match index.get(key) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(key, counts.len());
                counts.push(Frequency::new(key, 1));
            }
        }
    }

    // stable sort keeps first-occurrence order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Word frequencies across free-text descriptions, most frequent first.
/// Words are lowercased with punctuation stripped; short words are ignored.
pub fn keyword_counts<'a, I>(descriptions: I) -> Vec<Frequency>
where
    I: IntoIterator<Item = &'a str>,
{
    let words: Vec<String> = descriptions
        .into_iter()
        .flat_map(|desc| {
            desc.to_lowercase()
                .replace(KEYWORD_PUNCTUATION, "")
                .split_whitespace()
                .filter(|w| w.chars().count() >= KEYWORD_MIN_CHARS)
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .collect();
    value_counts(words.iter().map(String::as_str))
}

pub fn top_n(mut freqs: Vec<Frequency>, n: usize) -> Vec<Frequency> {
    freqs.truncate(n);
    freqs
}

/// Calendar dates of a column: typed dates as-is, text parsed on the fly.
/// Unparseable cells are `None`.
pub fn column_dates(values: &ColumnValues) -> Vec<Option<NaiveDate>> {
    match values {
        ColumnValues::Date(dates) => dates.clone(),
        ColumnValues::Text(cells) => cells.iter().map(|c| parse_date(c)).collect(),
        ColumnValues::Money(amounts) => vec![None; amounts.len()],
    }
}

/// Records per calendar year, ascending. Null dates are skipped.
pub fn count_by_year(dates: &[Option<NaiveDate>]) -> Vec<(i32, usize)> {
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for date in dates.iter().flatten() {
        *years.entry(date.year()).or_default() += 1;
    }
    years.into_iter().collect()
}

/// Records per `YYYY-MM`, ascending.
pub fn count_by_month(dates: &[Option<NaiveDate>]) -> Vec<(String, usize)> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for date in dates.iter().flatten() {
        *months.entry((date.year(), date.month())).or_default() += 1;
    }
    months
        .into_iter()
        .map(|((y, m), count)| (format!("{:04}-{:02}", y, m), count))
        .collect()
}

/// Sum of amounts per year, ascending. Rows missing either side are skipped.
pub fn sum_by_year(dates: &[Option<NaiveDate>], amounts: &[Option<f64>]) -> Vec<(i32, f64)> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for (date, amount) in dates.iter().zip(amounts) {
        if let (Some(date), Some(amount)) = (date, amount) {
            *totals.entry(date.year()).or_default() += amount;
        }
    }
    totals.into_iter().collect()
}
