use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::constants;
use crate::table::{Column, ColumnValues, RecordTable};

/// Semantic type of a column, decided from its header name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Date,
    Money,
    Text,
}

/// Classifies columns by an explicit schema first, then by case-insensitive
/// substring tokens in the column name.
#[derive(Debug, Clone)]
pub struct ColumnClassifier {
    date_token: String,
    money_tokens: Vec<String>,
    schema: BTreeMap<String, ColumnKind>,
}

impl ColumnClassifier {
    pub fn new<S: AsRef<str>>(date_token: &str, money_tokens: &[S]) -> Self {
        Self {
            date_token: date_token.to_lowercase(),
            money_tokens: money_tokens
                .iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
            schema: BTreeMap::new(),
        }
    }

    pub fn with_schema(mut self, schema: BTreeMap<String, ColumnKind>) -> Self {
        self.schema = schema;
        self
    }

    pub fn classify(&self, column_name: &str) -> ColumnKind {
        if let Some(kind) = self.schema.get(column_name) {
            return *kind;
        }
        let name = column_name.to_lowercase();
        if name.contains(&self.date_token) {
            ColumnKind::Date
        } else if self.money_tokens.iter().any(|t| name.contains(t.as_str())) {
            ColumnKind::Money
        } else {
            ColumnKind::Text
        }
    }
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        Self::new(constants::DATE_TOKEN, constants::MONEY_TOKENS)
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const PORTUGUESE_MONTHS: &[(&str, u32)] = &[
    ("janeiro", 1),
    ("jan", 1),
    ("fevereiro", 2),
    ("fev", 2),
    ("março", 3),
    ("marco", 3),
    ("mar", 3),
    ("abril", 4),
    ("abr", 4),
    ("maio", 5),
    ("mai", 5),
    ("junho", 6),
    ("jun", 6),
    ("julho", 7),
    ("jul", 7),
    ("agosto", 8),
    ("ago", 8),
    ("setembro", 9),
    ("set", 9),
    ("outubro", 10),
    ("out", 10),
    ("novembro", 11),
    ("nov", 11),
    ("dezembro", 12),
    ("dez", 12),
];

/// `10 de maio de 2023`, `1º de março de 2024`, `5 set. 2022`, `10/mai/2023`
fn parse_portuguese_date(s: &str) -> Option<NaiveDate> {
    let lower = s.to_lowercase();
    let parts: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c == '/' || c == '-')
        .map(|p| p.trim_end_matches('.'))
        .filter(|p| !p.is_empty() && *p != "de")
        .collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    let day: u32 = day.trim_end_matches(|c: char| c == 'º' || c == 'o').parse().ok()?;
    let month = PORTUGUESE_MONTHS
        .iter()
        .find(|(name, _)| name == month)
        .map(|(_, number)| *number)?;
    if year.len() != 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a calendar date. Slash and dash dates are read day-first, as the
/// source page publishes them; Portuguese month names are understood.
/// Empty or unrecognized input yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| parse_portuguese_date(s))
}

/// Decimal and thousands separators of the monetary values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyFormat {
    /// `1.234,56`: periods group thousands, comma marks decimals
    #[default]
    DecimalComma,
    /// `1,234.56`
    DecimalPoint,
}

#[derive(Debug, Clone)]
pub struct MoneyParser {
    format: MoneyFormat,
    currency_symbol: String,
}

impl MoneyParser {
    pub fn new(format: MoneyFormat, currency_symbol: &str) -> Self {
        Self {
            format,
            currency_symbol: currency_symbol.to_string(),
        }
    }

    pub fn format(&self) -> MoneyFormat {
        self.format
    }

    /// Strip the currency symbol, drop thousands separators, normalize the
    /// decimal separator and parse. `DecimalComma` reads `"1234.56"` as
    /// `123456.0`; pick `DecimalPoint` for such sources.
    pub fn parse(&self, raw: &str) -> Option<f64> {
        let stripped = if self.currency_symbol.is_empty() {
            raw.to_string()
        } else {
            raw.replace(&self.currency_symbol, "")
        };
        let cleaned = match self.format {
            MoneyFormat::DecimalComma => stripped.replace('.', "").replace(',', "."),
            MoneyFormat::DecimalPoint => stripped.replace(',', ""),
        };
        cleaned
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

impl Default for MoneyParser {
    fn default() -> Self {
        Self::new(MoneyFormat::default(), constants::CURRENCY_SYMBOL)
    }
}

/// Parse a value in the source page's `R$ 1.234,56` style.
pub fn parse_money(raw: &str) -> Option<f64> {
    MoneyParser::default().parse(raw)
}

/// Outcome of converting one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReport {
    pub name: String,
    pub kind: ColumnKind,
    pub parsed: usize,
    /// Blank cells, stored as null
    pub empty: usize,
    /// Non-blank cells that failed to parse, stored as null
    pub degraded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub columns: Vec<ColumnReport>,
}

impl NormalizeReport {
    pub fn degraded_cells(&self) -> usize {
        self.columns.iter().map(|c| c.degraded).sum()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: RecordTable,
    pub report: NormalizeReport,
}

fn convert<T>(
    name: &str,
    kind: ColumnKind,
    cells: &[String],
    parse: impl Fn(&str) -> Option<T>,
) -> (Vec<Option<T>>, ColumnReport) {
    let mut report = ColumnReport {
        name: name.to_string(),
        kind,
        parsed: 0,
        empty: 0,
        degraded: 0,
    };
    let values = cells
        .iter()
        .map(|cell| {
            let value = parse(cell.as_str());
            match (&value, cell.trim().is_empty()) {
                (Some(_), _) => report.parsed += 1,
                (None, true) => report.empty += 1,
                (None, false) => report.degraded += 1,
            }
            value
        })
        .collect();
    (values, report)
}

/// Build a normalized copy of `table`. Date columns become calendar dates,
/// money columns become `f64`; unparseable cells become null and are counted
/// in the report. Columns that are already typed are copied unchanged.
#[instrument(skip_all, fields(rows = table.row_count(), columns = table.column_count()))]
pub fn normalize(
    table: &RecordTable,
    classifier: &ColumnClassifier,
    money: &MoneyParser,
) -> Normalized {
    let mut report = NormalizeReport::default();
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let ColumnValues::Text(cells) = &column.values else {
                return column.clone();
            };
            let kind = classifier.classify(&column.name);
            let values = match kind {
                ColumnKind::Date => {
                    let (values, col_report) = convert(&column.name, kind, cells, parse_date);
                    report.columns.push(col_report);
                    ColumnValues::Date(values)
                }
                ColumnKind::Money => {
                    let (values, col_report) =
                        convert(&column.name, kind, cells, |c| money.parse(c));
                    report.columns.push(col_report);
                    ColumnValues::Money(values)
                }
                ColumnKind::Text => return column.clone(),
            };
            debug!(column = %column.name, ?kind, "converted column");
            Column {
                name: column.name.clone(),
                values,
            }
        })
        .collect();

    for col in report.columns.iter().filter(|c| c.degraded > 0) {
        warn!(
            column = %col.name,
            degraded = col.degraded,
            "Cells could not be parsed and were stored as null"
        );
    }

    Normalized {
        table: RecordTable::from_columns(columns, table.row_count()),
        report,
    }
}
