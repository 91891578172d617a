use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ScraperError};
use crate::table::RecordTable;

/// What to do with a body row whose cell count differs from the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowShape {
    /// Pad short rows with "" and drop cells past the last header
    #[default]
    Lenient,
    /// Reject the table on the first mismatched row
    Strict,
}

fn selector(css: &str) -> Selector {
    // Only called with the literal selectors below.
    Selector::parse(css).expect("static CSS selector should parse")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parse the first `<table>` in `html` into a text-only record table.
///
/// Header names come from every `th` in the table. The first `tr` is skipped
/// positionally as the header row; each following row contributes its `td`
/// texts, and rows without any `td` are dropped.
#[instrument(skip(html), fields(html_len = html.len()))]
pub fn extract_table(html: &str, shape: RowShape) -> Result<RecordTable> {
    let document = Html::parse_document(html);
    let table = document
        .select(&selector("table"))
        .next()
        .ok_or(ScraperError::TableNotFound)?;

    let headers: Vec<String> = table.select(&selector("th")).map(cell_text).collect();
    debug!("Found {} header cells: {:?}", headers.len(), headers);

    let td = selector("td");
    let mut rows = Vec::new();
    let mut reshaped = 0usize;

    for tr in table.select(&selector("tr")).skip(1) {
        let mut cells: Vec<String> = tr.select(&td).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }

        if cells.len() != headers.len() {
            let row = rows.len() + 1;
            match shape {
                RowShape::Strict => {
                    return Err(ScraperError::ColumnMismatch {
                        row,
                        expected: headers.len(),
                        found: cells.len(),
                    });
                }
                RowShape::Lenient => {
                    warn!(
                        row,
                        expected = headers.len(),
                        found = cells.len(),
                        "Reshaping row to header width"
                    );
                    cells.resize(headers.len(), String::new());
                    reshaped += 1;
                }
            }
        }
        rows.push(cells);
    }

    info!(
        "Extracted {} rows x {} columns ({} reshaped)",
        rows.len(),
        headers.len(),
        reshaped
    );
    Ok(RecordTable::from_rows(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnValues;

    const PAGE: &str = r#"
        <html><body>
          <h1>Violações</h1>
          <table class="table">
            <thead>
              <tr><th> Data </th><th>Organização</th><th>Valor da Multa</th></tr>
            </thead>
            <tbody>
              <tr><td>2023-05-10</td><td> Acme S.A. </td><td>R$ 1.234,56</td></tr>
              <tr></tr>
              <tr><td>2024-01-02</td><td>Globex, Ltda</td><td>R$ 0,50</td></tr>
            </tbody>
          </table>
          <table><tr><th>Other</th></tr><tr><td>ignored</td></tr></table>
        </body></html>
    "#;

    fn text(table: &RecordTable, name: &str) -> Vec<String> {
        match &table.column(name).unwrap().values {
            ColumnValues::Text(v) => v.clone(),
            other => panic!("expected text column, got {:?}", other),
        }
    }

    #[test]
    fn test_extracts_first_table_only() {
        let table = extract_table(PAGE, RowShape::Lenient).unwrap();
        assert_eq!(table.column_names(), vec!["Data", "Organização", "Valor da Multa"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(text(&table, "Organização"), vec!["Acme S.A.", "Globex, Ltda"]);
        assert_eq!(text(&table, "Valor da Multa"), vec!["R$ 1.234,56", "R$ 0,50"]);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let err = extract_table("<html><body><p>maintenance</p></body></html>", RowShape::Lenient)
            .unwrap_err();
        assert!(matches!(err, ScraperError::TableNotFound));
    }

    #[test]
    fn test_first_row_is_skipped_positionally() {
        // No header row of th: the first data row is still skipped.
        let html = "<table><tr><td>a</td></tr><tr><td>b</td></tr><tr><td>c</td></tr></table>";
        let table = extract_table(html, RowShape::Lenient).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_lenient_pads_and_truncates() {
        let html = r#"<table>
            <tr><th>A</th><th>B</th></tr>
            <tr><td>1</td></tr>
            <tr><td>2</td><td>3</td><td>extra</td></tr>
        </table>"#;
        let table = extract_table(html, RowShape::Lenient).unwrap();
        assert_eq!(text(&table, "A"), vec!["1", "2"]);
        assert_eq!(text(&table, "B"), vec!["", "3"]);
    }

    #[test]
    fn test_strict_rejects_mismatched_rows() {
        let html = r#"<table>
            <tr><th>A</th><th>B</th></tr>
            <tr><td>1</td><td>2</td></tr>
            <tr><td>3</td></tr>
        </table>"#;
        let err = extract_table(html, RowShape::Strict).unwrap_err();
        match err {
            ScraperError::ColumnMismatch { row, expected, found } => {
                assert_eq!((row, expected, found), (2, 2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_markup_text_is_flattened() {
        let html = r#"<table>
            <tr><th><b>Tipo</b> de Violação</th></tr>
            <tr><td><a href="/x">Vazamento</a> de dados</td></tr>
        </table>"#;
        let table = extract_table(html, RowShape::Strict).unwrap();
        assert_eq!(text(&table, "Tipo de Violação"), vec!["Vazamento de dados"]);
    }
}
