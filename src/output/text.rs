//! Plain text rendering.
//!
//! Columns are left-aligned and separated by two spaces. Every value is cut
//! to the report width before padding, so ANSI styling never affects
//! alignment.

use std::io::Write;

use yansi::{Paint, Style};

use super::{truncate, OutputError, Report, DEFAULT_DISPLAY_WIDTH};
use crate::source::{Dataset, Row};

const HEADER: Style = Style::new().bold();
const GROUP: Style = Style::new().cyan().bold();
const FOUND: Style = Style::new().yellow().bold();
const CLEAN: Style = Style::new().green();

/// Text rendering of a duplicate check.
pub struct TextReport<'r, 'a> {
    report: &'r Report<'a>,
    color: bool,
}

impl<'r, 'a> TextReport<'r, 'a> {
    #[must_use]
    pub fn new(report: &'r Report<'a>) -> Self {
        Self {
            report,
            color: false,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), OutputError> {
        let report = self.report;
        writeln!(out, "Key fields: {}", report.keys)?;

        if report.groups.is_empty() && report.elided == 0 {
            let line = paint("No duplicate rows found", CLEAN, self.color);
            writeln!(out, "{line}")?;
        } else {
            writeln!(out, "{} duplicate group(s)", report.summary.group_count)?;
            writeln!(out)?;
            if report.detailed {
                self.write_detailed(out)?;
            } else {
                self.write_summary(out)?;
            }
            if report.elided > 0 {
                writeln!(out, "... {} more group(s) not shown", report.elided)?;
            }
        }

        writeln!(out)?;
        let line = format!(
            "Found {} duplicate group(s), {} duplicate record(s) across {} row(s)",
            report.summary.group_count,
            report.summary.total_duplicate_records,
            report.stats.total_rows
        );
        let style = if report.has_duplicates() {
            FOUND
        } else {
            CLEAN
        };
        writeln!(out, "{}", paint(&line, style, self.color))?;
        Ok(())
    }

    /// One line per group: key values of the first member, then the count.
    fn write_summary<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), OutputError> {
        let report = self.report;
        let mut headers: Vec<String> = report.keys.names().to_vec();
        headers.push("count".to_string());

        let rows: Vec<Vec<String>> = report
            .groups
            .iter()
            .filter_map(|group| {
                let first = group.first()?;
                let mut cells = cells(first, report.keys.positions().iter().copied(), report.width);
                cells.push(group.count().to_string());
                Some(cells)
            })
            .collect();

        write_table(out, "", &headers, &rows, self.color)
    }

    /// Every schema column of every member, grouped.
    fn write_detailed<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), OutputError> {
        let report = self.report;
        let mut headers = vec!["row".to_string()];
        headers.extend(report.schema.names().map(str::to_string));

        for (n, group) in report.groups.iter().enumerate() {
            let digest = group.digest_hex();
            let title = format!(
                "Group {}: {} rows, digest {}",
                n + 1,
                group.count(),
                &digest[..16]
            );
            writeln!(out, "{}", paint(&title, GROUP, self.color))?;

            let rows: Vec<Vec<String>> = group
                .members()
                .iter()
                .map(|row| {
                    let mut line = vec![row.index().to_string()];
                    line.extend(cells(row, 0..report.schema.len(), report.width));
                    line
                })
                .collect();
            write_table(out, "  ", &headers, &rows, self.color)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Text listing of a dataset without any duplicate check.
pub struct RowListing<'d> {
    dataset: &'d Dataset,
    limit: i64,
    width: usize,
    color: bool,
}

impl<'d> RowListing<'d> {
    #[must_use]
    pub fn new(dataset: &'d Dataset) -> Self {
        Self {
            dataset,
            limit: 0,
            width: DEFAULT_DISPLAY_WIDTH,
            color: false,
        }
    }

    /// Show at most `rows` rows; ≤ 0 shows all.
    #[must_use]
    pub fn with_limit(mut self, rows: i64) -> Self {
        self.limit = rows;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write the listing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), OutputError> {
        let schema = self.dataset.schema();
        let all = self.dataset.rows();
        let shown = match usize::try_from(self.limit) {
            Ok(n) if n > 0 => &all[..n.min(all.len())],
            _ => all,
        };

        let headers: Vec<String> = schema.names().map(str::to_string).collect();
        let rows: Vec<Vec<String>> = shown
            .iter()
            .map(|row| cells(row, 0..schema.len(), self.width))
            .collect();
        write_table(out, "", &headers, &rows, self.color)?;

        writeln!(out)?;
        writeln!(out, "Showing {} of {} row(s)", shown.len(), all.len())?;
        Ok(())
    }
}

fn paint(text: &str, style: Style, color: bool) -> String {
    if color {
        text.paint(style).to_string()
    } else {
        text.to_string()
    }
}

fn cells(row: &Row, positions: impl Iterator<Item = usize>, width: usize) -> Vec<String> {
    positions
        .map(|pos| truncate(row.value(pos).display_or_null(), width).to_string())
        .collect()
}

fn write_table<W: Write + ?Sized>(
    out: &mut W,
    indent: &str,
    headers: &[String],
    rows: &[Vec<String>],
    color: bool,
) -> Result<(), OutputError> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let header_line = layout(headers, &widths);
    writeln!(out, "{}{}", indent, paint(&header_line, HEADER, color))?;
    for row in rows {
        writeln!(out, "{}{}", indent, layout(row, &widths))?;
    }
    Ok(())
}

fn layout(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}
