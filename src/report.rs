use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::analysis::{self, Frequency};
use crate::chart::{render_bar_chart, BarChart};
use crate::constants;
use crate::error::Result;
use crate::normalize::{ColumnKind, NormalizeReport};
use crate::table::{ColumnValues, RecordTable};

/// Columns the charts, the summary and the aggregate tables are derived from.
#[derive(Debug, Clone)]
pub struct ReportColumns {
    pub date: String,
    pub organization: String,
    pub violation_type: String,
    pub state: String,
    pub article: String,
    pub segment: String,
    pub status: String,
    pub description: String,
    pub top_organizations: usize,
    pub top_articles: usize,
    pub top_segments: usize,
    pub top_keywords: usize,
}

impl Default for ReportColumns {
    fn default() -> Self {
        Self {
            date: constants::DATE_COLUMN.to_string(),
            organization: constants::ORGANIZATION_COLUMN.to_string(),
            violation_type: constants::VIOLATION_TYPE_COLUMN.to_string(),
            state: constants::STATE_COLUMN.to_string(),
            article: constants::ARTICLE_COLUMN.to_string(),
            segment: constants::SEGMENT_COLUMN.to_string(),
            status: constants::STATUS_COLUMN.to_string(),
            description: constants::DESCRIPTION_COLUMN.to_string(),
            top_organizations: constants::TOP_ORGANIZATIONS,
            top_articles: constants::TOP_ARTICLES,
            top_segments: constants::TOP_SEGMENTS,
            top_keywords: constants::TOP_KEYWORDS,
        }
    }
}

#[derive(Debug, Default)]
pub struct ChartOutcome {
    pub written: Vec<PathBuf>,
    /// Chart files skipped because their source column is missing
    pub skipped: Vec<String>,
}

/// Write `table` as CSV with a header line. Fields containing the delimiter,
/// quotes or newlines are quoted.
#[instrument(skip(table), fields(rows = table.row_count()))]
pub fn write_csv(table: &RecordTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in table.rendered_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", table.row_count(), path.display());
    Ok(())
}

fn text_values(values: &ColumnValues) -> Vec<String> {
    (0..values.len()).map(|row| values.render(row)).collect()
}

fn category_counts(table: &RecordTable, column: &str) -> Option<Vec<Frequency>> {
    let column = table.column(column)?;
    let cells = text_values(&column.values);
    Some(analysis::value_counts(cells.iter().map(String::as_str)))
}

fn year_counts(table: &RecordTable, column: &str) -> Option<Vec<(i32, usize)>> {
    let column = table.column(column)?;
    Some(analysis::count_by_year(&analysis::column_dates(&column.values)))
}

/// The three charts and their file names. A chart whose column is absent
/// is `None`.
pub fn plan_charts(
    table: &RecordTable,
    columns: &ReportColumns,
) -> Vec<(&'static str, Option<BarChart>)> {
    vec![
        (
            constants::YEAR_CHART_FILE,
            year_counts(table, &columns.date).map(|years| BarChart {
                title: "Number of Violations per Year".to_string(),
                x_desc: "Year".to_string(),
                y_desc: "Number of Violations".to_string(),
                bars: years
                    .into_iter()
                    .map(|(year, count)| Frequency::new(year.to_string(), count))
                    .collect(),
                size: constants::YEAR_CHART_SIZE,
            }),
        ),
        (
            constants::ORGANIZATION_CHART_FILE,
            category_counts(table, &columns.organization).map(|counts| BarChart {
                title: format!(
                    "Top {} Organizations with Most Violations",
                    columns.top_organizations
                ),
                x_desc: "Organization".to_string(),
                y_desc: "Number of Violations".to_string(),
                bars: analysis::top_n(counts, columns.top_organizations),
                size: constants::CATEGORY_CHART_SIZE,
            }),
        ),
        (
            constants::VIOLATION_TYPE_CHART_FILE,
            category_counts(table, &columns.violation_type).map(|counts| BarChart {
                title: "Distribution of Types of Violations".to_string(),
                x_desc: "Type of Violation".to_string(),
                y_desc: "Count".to_string(),
                bars: counts,
                size: constants::CATEGORY_CHART_SIZE,
            }),
        ),
    ]
}

/// Render the three charts into `plots_dir`, creating it on demand.
/// A chart whose column is absent is skipped, not an error.
#[instrument(skip(table, columns))]
pub fn render_charts(
    table: &RecordTable,
    columns: &ReportColumns,
    plots_dir: &Path,
) -> Result<ChartOutcome> {
    let mut outcome = ChartOutcome::default();
    for (file, chart) in plan_charts(table, columns) {
        let Some(chart) = chart else {
            warn!("Skipping {}: source column not found", file);
            outcome.skipped.push(file.to_string());
            continue;
        };
        fs::create_dir_all(plots_dir)?;
        let path = plots_dir.join(file);
        render_bar_chart(&chart, &path)?;
        info!("Saved chart {}", path.display());
        outcome.written.push(path);
    }

    Ok(outcome)
}

/// One summary table: the full rows go to CSV, the summary may show fewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub title: String,
    pub key_header: &'static str,
    pub value_header: &'static str,
    pub file: &'static str,
    pub rows: Vec<(String, String)>,
    /// Rows shown in the summary; `None` shows them all
    pub top: Option<usize>,
}

impl Aggregate {
    fn counts<K: ToString>(
        title: impl Into<String>,
        key_header: &'static str,
        file: &'static str,
        rows: impl IntoIterator<Item = (K, usize)>,
    ) -> Self {
        Self {
            title: title.into(),
            key_header,
            value_header: "Count",
            file,
            rows: rows
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            top: None,
        }
    }

    fn frequencies(
        title: impl Into<String>,
        key_header: &'static str,
        file: &'static str,
        freqs: Vec<Frequency>,
    ) -> Self {
        Self::counts(title, key_header, file, freqs.into_iter().map(|f| (f.label, f.count)))
    }

    fn top(mut self, n: usize) -> Self {
        self.top = Some(n);
        self
    }

    pub fn summary_rows(&self) -> &[(String, String)] {
        match self.top {
            Some(n) => &self.rows[..n.min(self.rows.len())],
            None => &self.rows,
        }
    }
}

/// Every aggregate whose source column is present. Dates run
/// chronologically; categories run most frequent first.
pub fn aggregates(table: &RecordTable, columns: &ReportColumns) -> Vec<Aggregate> {
    let mut out = Vec::new();

    let dates = table
        .column(&columns.date)
        .map(|c| analysis::column_dates(&c.values));
    if let Some(dates) = &dates {
        out.push(Aggregate::counts(
            "Violations per year",
            "Year",
            constants::YEAR_COUNTS_FILE,
            analysis::count_by_year(dates),
        ));
        out.push(Aggregate::counts(
            "Violations per month",
            "Month",
            constants::MONTH_COUNTS_FILE,
            analysis::count_by_month(dates),
        ));
    }

    let categories = [
        (
            "Top organizations",
            "Organization",
            &columns.organization,
            constants::ORGANIZATION_COUNTS_FILE,
            Some(columns.top_organizations),
        ),
        (
            "Types of violations",
            "Type",
            &columns.violation_type,
            constants::TYPE_COUNTS_FILE,
            None,
        ),
        (
            "Violations per state",
            "State",
            &columns.state,
            constants::STATE_COUNTS_FILE,
            None,
        ),
        (
            "Most violated articles",
            "Article",
            &columns.article,
            constants::ARTICLE_COUNTS_FILE,
            Some(columns.top_articles),
        ),
        (
            "Most affected segments",
            "Segment",
            &columns.segment,
            constants::SEGMENT_COUNTS_FILE,
            Some(columns.top_segments),
        ),
        (
            "Sanction status",
            "Status",
            &columns.status,
            constants::STATUS_COUNTS_FILE,
            None,
        ),
    ];
    for (title, key_header, column, file, top) in categories {
        let Some(counts) = category_counts(table, column) else {
            debug!("No '{}' column, skipping {}", column, file);
            continue;
        };
        let aggregate = Aggregate::frequencies(title, key_header, file, counts);
        out.push(match top {
            Some(n) => aggregate.top(n),
            None => aggregate,
        });
    }

    if let Some(column) = table.column(&columns.description) {
        let cells = text_values(&column.values);
        let keywords = analysis::keyword_counts(cells.iter().map(String::as_str));
        out.push(
            Aggregate::frequencies(
                "Most frequent words in descriptions",
                "Word",
                constants::KEYWORD_COUNTS_FILE,
                keywords,
            )
            .top(columns.top_keywords),
        );
    }

    let amounts = table.columns().iter().find_map(|c| match &c.values {
        ColumnValues::Money(v) => Some((c.name.as_str(), v)),
        _ => None,
    });
    if let (Some(dates), Some((name, amounts))) = (&dates, amounts) {
        out.push(Aggregate {
            title: format!("Total fines per year ({})", name),
            key_header: "Year",
            value_header: "Total",
            file: constants::FINES_PER_YEAR_FILE,
            rows: analysis::sum_by_year(dates, amounts)
                .into_iter()
                .map(|(year, total)| (year.to_string(), format!("{:.2}", total)))
                .collect(),
            top: None,
        });
    }

    out
}

/// Write each aggregate as an `Item,Quantidade` CSV under `dir`.
#[instrument(skip(aggregates), fields(count = aggregates.len()))]
pub fn write_aggregate_csvs(aggregates: &[Aggregate], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(aggregates.len());
    for aggregate in aggregates {
        let path = dir.join(aggregate.file);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(constants::AGGREGATE_HEADER)?;
        for (key, value) in &aggregate.rows {
            writer.write_record([key, value])?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = aggregate.rows.len(), "aggregate saved");
        written.push(path);
    }
    info!("Wrote {} aggregate tables to {}", written.len(), dir.display());
    Ok(written)
}

fn markdown_table(out: &mut String, aggregate: &Aggregate) -> std::fmt::Result {
    writeln!(out, "\n## {}\n", aggregate.title)?;
    writeln!(out, "| {} | {} |", aggregate.key_header, aggregate.value_header)?;
    writeln!(out, "|---|---|")?;
    let rows = aggregate.summary_rows();
    for (k, v) in rows {
        writeln!(out, "| {} | {} |", k.replace('|', "\\|"), v)?;
    }
    if rows.is_empty() {
        writeln!(out, "\n_No data._")?;
    }
    Ok(())
}

/// Build the Markdown summary: the aggregate tables plus the normalization
/// report.
pub fn summary_markdown(
    table: &RecordTable,
    aggregates: &[Aggregate],
    normalize_report: &NormalizeReport,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = build_summary(&mut out, table, aggregates, normalize_report);
    out
}

fn build_summary(
    out: &mut String,
    table: &RecordTable,
    aggregates: &[Aggregate],
    normalize_report: &NormalizeReport,
) -> std::fmt::Result {
    writeln!(out, "# Data Protection Violations Report\n")?;
    writeln!(
        out,
        "{} records, {} columns.",
        table.row_count(),
        table.column_count()
    )?;

    for aggregate in aggregates {
        markdown_table(out, aggregate)?;
    }

    if !normalize_report.columns.is_empty() {
        writeln!(out, "\n## Normalization\n")?;
        writeln!(out, "| Column | Kind | Parsed | Empty | Unparseable |")?;
        writeln!(out, "|---|---|---|---|---|")?;
        for col in &normalize_report.columns {
            let kind = match col.kind {
                ColumnKind::Date => "date",
                ColumnKind::Money => "money",
                ColumnKind::Text => "text",
            };
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                col.name, kind, col.parsed, col.empty, col.degraded
            )?;
        }
    }

    Ok(())
}

pub fn write_summary(
    table: &RecordTable,
    aggregates: &[Aggregate],
    normalize_report: &NormalizeReport,
    path: &Path,
) -> Result<()> {
    fs::write(path, summary_markdown(table, aggregates, normalize_report))?;
    info!("Wrote summary report to {}", path.display());
    Ok(())
}
