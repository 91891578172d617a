use chrono::NaiveDate;

/// Cell storage for one column. Raw tables only hold `Text`; the normalizer
/// produces `Date` and `Money` columns, where `None` marks a cell that could
/// not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Text(Vec<String>),
    Date(Vec<Option<NaiveDate>>),
    Money(Vec<Option<f64>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Date(v) => v.len(),
            ColumnValues::Money(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render a single cell the way it is written to CSV. Nulls render as "".
    pub fn render(&self, row: usize) -> String {
        match self {
            ColumnValues::Text(v) => v[row].clone(),
            ColumnValues::Date(v) => v[row]
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            ColumnValues::Money(v) => v[row].map(format_amount).unwrap_or_default(),
        }
    }
}

/// Shortest float form with at least one decimal: `1234.56`, `1234.0`, `0.5`.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// Column-oriented table scraped from the page. All columns hold exactly
/// `row_count` values; names keep header order and may repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl RecordTable {
    /// Build a text table from already-shaped rows. Every row must have one
    /// cell per header; reshaping happens in the extractor.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_count = rows.len();
        let mut cells: Vec<Vec<String>> = headers
            .iter()
            .map(|_| Vec::with_capacity(row_count))
            .collect();

        for row in rows {
            debug_assert_eq!(row.len(), headers.len());
            for (column, cell) in cells.iter_mut().zip(row) {
                column.push(cell);
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column {
                name,
                values: ColumnValues::Text(values),
            })
            .collect();

        Self { columns, row_count }
    }

    pub(crate) fn from_columns(columns: Vec<Column>, row_count: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == row_count));
        Self { columns, row_count }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// First column with exactly this name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Rows rendered as CSV fields, in column order.
    pub fn rendered_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        (0..self.row_count).map(move |row| {
            self.columns
                .iter()
                .map(|c| c.values.render(row))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordTable {
        RecordTable::from_rows(
            vec!["Data".to_string(), "Organização".to_string()],
            vec![
                vec!["2023-01-05".to_string(), "Acme".to_string()],
                vec!["2024-02-10".to_string(), "Globex".to_string()],
            ],
        )
    }

    #[test]
    fn test_from_rows_is_column_oriented() {
        let table = sample();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column_names(), vec!["Data", "Organização"]);

        let org = table.column("Organização").unwrap();
        assert_eq!(
            org.values,
            ColumnValues::Text(vec!["Acme".to_string(), "Globex".to_string()])
        );
        assert!(!table.has_column("Valor"));
    }

    #[test]
    fn test_rendered_rows_follow_column_order() {
        let rows: Vec<Vec<String>> = sample().rendered_rows().collect();
        assert_eq!(rows[1], vec!["2024-02-10", "Globex"]);
    }

    #[test]
    fn test_typed_cells_render_nulls_as_empty() {
        let dates = ColumnValues::Date(vec![NaiveDate::from_ymd_opt(2023, 3, 1), None]);
        assert_eq!(dates.render(0), "2023-03-01");
        assert_eq!(dates.render(1), "");

        let money = ColumnValues::Money(vec![Some(1234.56), Some(50.0), None]);
        assert_eq!(money.render(0), "1234.56");
        assert_eq!(money.render(1), "50.0");
        assert_eq!(money.render(2), "");
    }

    #[test]
    fn test_headers_without_rows() {
        let table = RecordTable::from_rows(vec!["Data".to_string()], Vec::new());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 1);
        assert!(table.columns()[0].values.is_empty());
    }
}
