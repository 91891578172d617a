use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info, instrument};

use crate::config::Config;
use crate::error::Result;
use crate::extract::extract_table;
use crate::fetch::{FetchError, PageSource};
use crate::normalize::{normalize, NormalizeReport};
use crate::report::{aggregates, render_charts, write_aggregate_csvs, write_csv, write_summary};

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct RunSummary {
    pub source: String,
    pub records: usize,
    pub columns: Vec<String>,
    pub files_written: Vec<PathBuf>,
    pub charts_skipped: Vec<String>,
    pub normalize_report: NormalizeReport,
    pub elapsed_secs: f64,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// The page could not be fetched; nothing was written
    NoData(FetchError),
}

pub struct Pipeline;

impl Pipeline {
    /// Fetch, extract, normalize and report.
    ///
    /// A fetch failure is returned as `RunOutcome::NoData`. Extraction
    /// failures are errors and abort before any file or directory is created.
    #[instrument(skip(source, config), fields(location = %source.location()))]
    pub fn run(source: &dyn PageSource, config: &Config) -> Result<RunOutcome> {
        let started = Instant::now();
        info!("🚀 Starting scrape of {}", source.location());

        let html = match source.fetch_page() {
            Ok(html) => html,
            Err(e) => {
                error!("Fetch failed: {}", e);
                return Ok(RunOutcome::NoData(e));
            }
        };

        let raw = extract_table(&html, config.normalize.row_shape)?;
        info!("✅ Scraped {} records", raw.row_count());

        let normalized = normalize(&raw, &config.classifier(), &config.money_parser());

        let output = &config.output;
        fs::create_dir_all(&output.dir)?;
        let mut files_written = Vec::new();

        let raw_path = output.raw_csv_path();
        write_csv(&raw, &raw_path)?;
        files_written.push(raw_path);

        let cleaned_path = output.cleaned_csv_path();
        write_csv(&normalized.table, &cleaned_path)?;
        files_written.push(cleaned_path);

        let columns = config.report_columns();
        let charts = render_charts(&normalized.table, &columns, &output.plots_path())?;
        files_written.extend(charts.written);

        let aggregates = aggregates(&normalized.table, &columns);
        if output.aggregates {
            files_written.extend(write_aggregate_csvs(&aggregates, &output.dir)?);
        }

        if let Some(report_path) = output.report_path() {
            write_summary(
                &normalized.table,
                &aggregates,
                &normalized.report,
                &report_path,
            )?;
            files_written.push(report_path);
        }

        let elapsed_secs = started.elapsed().as_secs_f64();
        info!(
            files = files_written.len(),
            elapsed_secs, "Pipeline finished"
        );

        Ok(RunOutcome::Completed(RunSummary {
            source: source.location().to_string(),
            records: raw.row_count(),
            columns: raw.column_names().into_iter().map(String::from).collect(),
            files_written,
            charts_skipped: charts.skipped,
            normalize_report: normalized.report,
            elapsed_secs,
        }))
    }
}
