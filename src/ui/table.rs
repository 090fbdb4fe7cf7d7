//! Column-aligned tables for list output.

use console::measure_text_width;

/// A plain, left-aligned table with a header rule.
///
/// Widths are measured on display width, so styled cells and
/// multi-byte icons line up.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row. Missing trailing cells render empty; extra cells are dropped.
    pub fn add_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        row.truncate(self.headers.len());
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| measure_text_width(cell))
                    .chain(std::iter::once(measure_text_width(header)))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Render the table. Lines carry no trailing whitespace.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);

        lines.push(render_line(&self.headers, &widths));
        lines.push(
            widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            lines.push(render_line(row, &widths));
        }

        lines.join("\n")
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let pad = width.saturating_sub(measure_text_width(cell));
        line.push_str(&" ".repeat(pad));
    }
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_renders_header_and_rule() {
        let table = Table::new(["ID", "Title"]);
        assert!(table.is_empty());
        let output = table.render();
        assert_eq!(output.lines().count(), 2);
        assert!(output.starts_with("ID  Title"));
    }

    #[test]
    fn columns_align_to_widest_cell() {
        let mut table = Table::new(["ID", "Title"]);
        table.add_row(["a1", "Short"]);
        table.add_row(["abcdef", "Longer title"]);

        let output = table.render();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "ID      Title");
        assert_eq!(lines[2], "a1      Short");
        assert_eq!(lines[3], "abcdef  Longer title");
    }

    #[test]
    fn icons_count_by_display_width() {
        let mut table = Table::new(["Status", "ID"]);
        table.add_row(["✓ synced", "x"]);
        let output = table.render();
        assert!(output.lines().nth(2).unwrap().starts_with("✓ synced  x"));
    }

    #[test]
    fn short_and_long_rows() {
        let mut table = Table::new(["A", "B"]);
        table.add_row(["only"]);
        table.add_row(["1", "2", "3"]);
        assert_eq!(table.row_count(), 2);
        let output = table.render();
        assert!(!output.contains('3'));
        assert!(output.contains("only"));
    }
}
