use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

use violations_scraper::config::Config;
use violations_scraper::fetch::{HttpFetcher, PageSource, StaticPage};
use violations_scraper::logging;
use violations_scraper::normalize::MoneyFormat;
use violations_scraper::extract::RowShape;
use violations_scraper::{Pipeline, RunOutcome};

#[derive(Parser)]
#[command(name = "violations_scraper")]
#[command(about = "Scrape the APDados violations table into CSV snapshots and charts")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML config file (defaults to ./violations_scraper.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page to scrape instead of the configured URL
    #[arg(long)]
    url: Option<String>,

    /// Parse a saved copy of the page instead of fetching it
    #[arg(long, conflicts_with = "url")]
    from_file: Option<PathBuf>,

    /// Directory for the CSV files, plots and report
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Fail when a row's cell count differs from the header
    #[arg(long)]
    strict_rows: bool,

    /// Thousands/decimal separators of monetary values
    #[arg(long, value_enum)]
    money_format: Option<MoneyFormatArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum MoneyFormatArg {
    DecimalComma,
    DecimalPoint,
}

impl From<MoneyFormatArg> for MoneyFormat {
    fn from(arg: MoneyFormatArg) -> Self {
        match arg {
            MoneyFormatArg::DecimalComma => MoneyFormat::DecimalComma,
            MoneyFormatArg::DecimalPoint => MoneyFormat::DecimalPoint,
        }
    }
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.source.url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if self.strict_rows {
            config.normalize.row_shape = RowShape::Strict;
        }
        if let Some(format) = self.money_format {
            config.normalize.money_format = format.into();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let config_path = Config::locate(cli.config.as_deref());
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);

    let _log_guard = logging::init_logging(config.logging.log_dir.as_deref());
    info!("startup");
    match &config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let source: Box<dyn PageSource> = match &cli.from_file {
        Some(path) => {
            let html = fs::read_to_string(path)
                .with_context(|| format!("reading saved page {}", path.display()))?;
            Box::new(StaticPage::new(path.display().to_string(), html))
        }
        None => Box::new(HttpFetcher::new(&config.source)),
    };

    println!("🔄 Starting web scraping...");
    match Pipeline::run(source.as_ref(), &config)? {
        RunOutcome::Completed(summary) => {
            println!("✅ Data successfully scraped!");
            println!("📊 Number of records: {}", summary.records);
            println!("   Columns: {}", summary.columns.join(", "));

            for col in &summary.normalize_report.columns {
                if col.degraded > 0 {
                    warn!(column = %col.name, degraded = col.degraded, "unparseable cells");
                    println!(
                        "⚠️  {}: {} value(s) could not be parsed and were left empty",
                        col.name, col.degraded
                    );
                }
            }
            for skipped in &summary.charts_skipped {
                println!("   Skipped {} (column not present)", skipped);
            }
            for file in &summary.files_written {
                println!("   Wrote {}", file.display());
            }
            println!(
                "✅ Analysis complete! Check the '{}' directory for visualizations.",
                config.output.plots_path().display()
            );
        }
        RunOutcome::NoData(err) => {
            error!("No data: {}", err);
            println!("❌ Failed to scrape data from the website: {}", err);
        }
    }

    Ok(())
}
