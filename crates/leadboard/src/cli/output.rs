//! Rendering command results as plain text, aligned tables or JSON.

use serde::Serialize;

use super::OutputFormat;

/// Rows of display cells under a fixed set of headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rows {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Rows {
    /// Empty rows under `headers`.
    #[must_use]
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Whether no rows were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One line per row, cells separated by two spaces.
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("  "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Columns padded to their widest cell, under a header and divider.
    #[must_use]
    pub fn to_table(&self) -> String {
        if self.rows.is_empty() {
            return String::from("(no rows)");
        }

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(header.chars().count())
            })
            .collect();

        let header = pad_line(self.headers.iter().copied(), &widths);
        let divider = "-".repeat(header.chars().count());
        let mut lines = vec![header, divider];
        for row in &self.rows {
            let cells = (0..widths.len()).map(|i| row.get(i).map_or("-", String::as_str));
            lines.push(pad_line(cells, &widths));
        }
        lines.join("\n")
    }
}

fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Render `value` as pretty JSON, or `rows` as plain text or a table.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render<T: Serialize + ?Sized>(
    value: &T,
    rows: &Rows,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value),
        OutputFormat::Table => Ok(rows.to_table()),
        OutputFormat::Plain => Ok(rows.to_plain()),
    }
}

/// Print the rendering of `value`/`rows`; nothing is printed for an empty
/// plain listing.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn emit<T: Serialize + ?Sized>(
    value: &T,
    rows: &Rows,
    format: OutputFormat,
) -> serde_json::Result<()> {
    let rendered = render(value, rows, format)?;
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    Ok(())
}

/// Pretty JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut with `…`.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// A tick box for a completion flag.
#[must_use]
pub fn check_box(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Rows {
        let mut rows = Rows::new(&["id", "name", "stage"]);
        rows.push(["led-1", "Ana", "New"]);
        rows.push(["led-200", "Bruno Lima", "Proposal"]);
        rows
    }

    #[test]
    fn test_table_aligns_columns() {
        let table = sample().to_table();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id       name"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2], "led-1    Ana         New");
        assert_eq!(lines[3], "led-200  Bruno Lima  Proposal");
    }

    #[test]
    fn test_table_pads_short_rows() {
        let mut rows = Rows::new(&["a", "b"]);
        rows.push(["x"]);
        assert!(rows.to_table().lines().last().unwrap().ends_with('-'));
    }

    #[test]
    fn test_empty_table() {
        let rows = Rows::new(&["id"]);
        assert!(rows.is_empty());
        assert_eq!(rows.to_table(), "(no rows)");
        assert_eq!(rows.to_plain(), "");
    }

    #[test]
    fn test_plain_joins_cells() {
        assert_eq!(
            sample().to_plain(),
            "led-1  Ana  New\nled-200  Bruno Lima  Proposal"
        );
    }

    #[test]
    fn test_render_json_uses_value() {
        #[derive(Serialize)]
        struct Item {
            id: &'static str,
        }

        let out = render(&[Item { id: "led-1" }], &sample(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["id"], "led-1");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long note body", 6), "a lon…");
        assert_eq!(check_box(true), "[x]");
    }
}
