use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::constants;
use crate::error::{Result, ScraperError};
use crate::extract::RowShape;
use crate::normalize::{ColumnClassifier, ColumnKind, MoneyFormat, MoneyParser};
use crate::report::ReportColumns;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub columns: ColumnsConfig,
    pub normalize: NormalizeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub user_agent: String,
    /// Unset keeps the HTTP client's own default
    pub timeout_secs: Option<u64>,
    /// Honour HTTP(S)_PROXY from the environment
    pub use_system_proxy: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: constants::SOURCE_URL.to_string(),
            user_agent: constants::BROWSER_USER_AGENT.to_string(),
            timeout_secs: None,
            use_system_proxy: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub raw_csv: String,
    pub cleaned_csv: String,
    pub plots_dir: String,
    /// Markdown summary; `None` disables it
    pub report: Option<String>,
    /// Write one `Item,Quantidade` CSV per aggregate next to the snapshots
    pub aggregates: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            raw_csv: constants::RAW_CSV_FILE.to_string(),
            cleaned_csv: constants::CLEANED_CSV_FILE.to_string(),
            plots_dir: constants::PLOTS_DIR.to_string(),
            report: Some(constants::REPORT_FILE.to_string()),
            aggregates: true,
        }
    }
}

impl OutputConfig {
    pub fn raw_csv_path(&self) -> PathBuf {
        self.dir.join(&self.raw_csv)
    }

    pub fn cleaned_csv_path(&self) -> PathBuf {
        self.dir.join(&self.cleaned_csv)
    }

    pub fn plots_path(&self) -> PathBuf {
        self.dir.join(&self.plots_dir)
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        self.report.as_ref().map(|name| self.dir.join(name))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub date_token: String,
    pub money_tokens: Vec<String>,
    /// Explicit column kinds; these win over token matching
    pub schema: BTreeMap<String, ColumnKind>,
    pub date_column: String,
    pub organization_column: String,
    pub violation_type_column: String,
    pub state_column: String,
    pub article_column: String,
    pub segment_column: String,
    pub status_column: String,
    pub description_column: String,
    pub top_organizations: usize,
    pub top_articles: usize,
    pub top_segments: usize,
    pub top_keywords: usize,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            date_token: constants::DATE_TOKEN.to_string(),
            money_tokens: constants::MONEY_TOKENS.iter().map(|t| t.to_string()).collect(),
            schema: BTreeMap::new(),
            date_column: constants::DATE_COLUMN.to_string(),
            organization_column: constants::ORGANIZATION_COLUMN.to_string(),
            violation_type_column: constants::VIOLATION_TYPE_COLUMN.to_string(),
            state_column: constants::STATE_COLUMN.to_string(),
            article_column: constants::ARTICLE_COLUMN.to_string(),
            segment_column: constants::SEGMENT_COLUMN.to_string(),
            status_column: constants::STATUS_COLUMN.to_string(),
            description_column: constants::DESCRIPTION_COLUMN.to_string(),
            top_organizations: constants::TOP_ORGANIZATIONS,
            top_articles: constants::TOP_ARTICLES,
            top_segments: constants::TOP_SEGMENTS,
            top_keywords: constants::TOP_KEYWORDS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub money_format: MoneyFormat,
    pub currency_symbol: String,
    pub row_shape: RowShape,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            money_format: MoneyFormat::default(),
            currency_symbol: constants::CURRENCY_SYMBOL.to_string(),
            row_shape: RowShape::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the rolling JSON log; `None` logs to the console only
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: Some(PathBuf::from(constants::LOG_DIR)),
        }
    }
}

impl Config {
    /// The file `load` reads: `path` when given, else `violations_scraper.toml`
    /// in the working directory when it exists.
    pub fn locate(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(PathBuf::from(constants::CONFIG_FILE)).filter(|p| p.exists()),
        }
    }

    /// Load from the file `locate` finds, else fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::locate(path) else {
            debug!("No config file found, using defaults");
            return Ok(Self::default());
        };

        let content = fs::read_to_string(&path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(ScraperError::Config("source.url must not be empty".into()));
        }
        if self.columns.date_token.trim().is_empty() {
            return Err(ScraperError::Config(
                "columns.date_token must not be empty".into(),
            ));
        }
        if self.columns.money_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(ScraperError::Config(
                "columns.money_tokens must not contain empty tokens".into(),
            ));
        }
        Ok(())
    }

    pub fn classifier(&self) -> ColumnClassifier {
        ColumnClassifier::new(&self.columns.date_token, &self.columns.money_tokens)
            .with_schema(self.columns.schema.clone())
    }

    pub fn money_parser(&self) -> MoneyParser {
        MoneyParser::new(self.normalize.money_format, &self.normalize.currency_symbol)
    }

    pub fn report_columns(&self) -> ReportColumns {
        let columns = &self.columns;
        ReportColumns {
            date: columns.date_column.clone(),
            organization: columns.organization_column.clone(),
            violation_type: columns.violation_type_column.clone(),
            state: columns.state_column.clone(),
            article: columns.article_column.clone(),
            segment: columns.segment_column.clone(),
            status: columns.status_column.clone(),
            description: columns.description_column.clone(),
            top_organizations: columns.top_organizations,
            top_articles: columns.top_articles,
            top_segments: columns.top_segments,
            top_keywords: columns.top_keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_source_page() {
        let config = Config::default();
        assert_eq!(config.source.url, "https://apdados.org/violacoes");
        assert!(config.source.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.source.timeout_secs, None);
        assert_eq!(
            config.output.raw_csv_path(),
            PathBuf::from("./raw_violations_data.csv")
        );
        assert_eq!(
            config.output.plots_path(),
            PathBuf::from("./plots")
        );
        assert_eq!(config.columns.money_tokens, vec!["valor", "multa"]);
        assert_eq!(config.normalize.money_format, MoneyFormat::DecimalComma);
        assert_eq!(config.normalize.row_shape, RowShape::Lenient);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [source]
            url = "http://localhost:8080/violacoes"

            [output]
            dir = "out"
            report = "summary.md"

            [columns.schema]
            "Publicado em" = "date"
            "Notas" = "text"

            [normalize]
            money_format = "decimal_point"
            row_shape = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.url, "http://localhost:8080/violacoes");
        assert!(config.source.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.output.cleaned_csv_path(), PathBuf::from("out/cleaned_violations_data.csv"));
        assert_eq!(config.output.report_path(), Some(PathBuf::from("out/summary.md")));
        assert_eq!(config.columns.schema.get("Publicado em"), Some(&ColumnKind::Date));
        assert_eq!(config.normalize.money_format, MoneyFormat::DecimalPoint);
        assert_eq!(config.normalize.row_shape, RowShape::Strict);
        assert_eq!(config.columns.date_column, "Data");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_toml_str("[source]\nurl = \"  \"\n").unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));

        let err = Config::from_toml_str("[normalize]\nmoney_format = \"roman\"\n").unwrap_err();
        assert!(matches!(err, ScraperError::Toml(_)));
    }

    #[test]
    fn test_load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[logging]\nlog_dir = \"var/log\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("var/log")));
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let explicit = Path::new("elsewhere/custom.toml");
        assert_eq!(Config::locate(Some(explicit)), Some(explicit.to_path_buf()));
    }

    #[test]
    fn test_summary_columns_are_configurable() {
        let config = Config::from_toml_str(
            r#"
            [output]
            aggregates = false

            [columns]
            state_column = "UF"
            top_keywords = 5
            "#,
        )
        .unwrap();

        let columns = config.report_columns();
        assert_eq!(columns.state, "UF");
        assert_eq!(columns.article, "Artigo");
        assert_eq!(columns.top_keywords, 5);
        assert_eq!(columns.top_segments, 10);
        assert!(!config.output.aggregates);
        assert!(Config::default().output.aggregates);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
