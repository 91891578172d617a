/// Defaults for the APDados sanctions page and the files derived from it.
/// Everything here can be overridden through `Config`.

// Source page
pub const SOURCE_URL: &str = "https://apdados.org/violacoes";
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// Output files, relative to the output directory
pub const RAW_CSV_FILE: &str = "raw_violations_data.csv";
pub const CLEANED_CSV_FILE: &str = "cleaned_violations_data.csv";
pub const PLOTS_DIR: &str = "plots";
pub const REPORT_FILE: &str = "violations_report.md";
pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "violations_scraper.log";

// Chart files, relative to the plots directory
pub const YEAR_CHART_FILE: &str = "violations_per_year.png";
pub const ORGANIZATION_CHART_FILE: &str = "top_organizations.png";
pub const VIOLATION_TYPE_CHART_FILE: &str = "violation_types.png";

// Column classification tokens (matched case-insensitively against header names)
pub const DATE_TOKEN: &str = "data";
pub const MONEY_TOKENS: &[&str] = &["valor", "multa"];
pub const CURRENCY_SYMBOL: &str = "R$";

// Columns the charts and the summary are derived from
pub const DATE_COLUMN: &str = "Data";
pub const ORGANIZATION_COLUMN: &str = "Organização";
pub const VIOLATION_TYPE_COLUMN: &str = "Tipo de Violação";
pub const STATE_COLUMN: &str = "Estado";
pub const ARTICLE_COLUMN: &str = "Artigo";
pub const SEGMENT_COLUMN: &str = "Segmento";
pub const STATUS_COLUMN: &str = "Status";
pub const DESCRIPTION_COLUMN: &str = "Descrição";

pub const TOP_ORGANIZATIONS: usize = 10;
pub const TOP_ARTICLES: usize = 10;
pub const TOP_SEGMENTS: usize = 10;
pub const TOP_KEYWORDS: usize = 15;

/// Description words shorter than this are not counted as keywords
pub const KEYWORD_MIN_CHARS: usize = 4;
/// Stripped from descriptions before splitting into words
pub const KEYWORD_PUNCTUATION: &[char] = &['.', ',', ';', ':', '"', '“', '”'];

// Aggregate tables, relative to the output directory
pub const MONTH_COUNTS_FILE: &str = "violations_per_month.csv";
pub const YEAR_COUNTS_FILE: &str = "violations_per_year.csv";
pub const ORGANIZATION_COUNTS_FILE: &str = "violations_per_organization.csv";
pub const TYPE_COUNTS_FILE: &str = "violations_per_type.csv";
pub const STATE_COUNTS_FILE: &str = "violations_per_state.csv";
pub const ARTICLE_COUNTS_FILE: &str = "violations_per_article.csv";
pub const SEGMENT_COUNTS_FILE: &str = "violations_per_segment.csv";
pub const STATUS_COUNTS_FILE: &str = "violations_status.csv";
pub const KEYWORD_COUNTS_FILE: &str = "violations_keywords.csv";
pub const FINES_PER_YEAR_FILE: &str = "violations_value_per_year.csv";
pub const AGGREGATE_HEADER: [&str; 2] = ["Item", "Quantidade"];

// Canvas sizes in pixels
pub const YEAR_CHART_SIZE: (u32, u32) = (1000, 600);
pub const CATEGORY_CHART_SIZE: (u32, u32) = (1200, 600);

/// Label used when counting blank cells
pub const EMPTY_LABEL: &str = "(empty)";

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "violations_scraper.toml";
