// esu - ElasticSearch Utility for managing an Elasticsearch cluster
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Column-aligned report tables.
//!
//! A [`Table`] is built per report section: create it with the header labels,
//! [`Table::add`] rows of anything that implements `Display`, then
//! [`Table::print`] it once. Columns only ever grow to fit their widest cell,
//! nothing is truncated.

use colored::{Color, Colorize};
use std::fmt::Display;
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

pub const DEFAULT_PADDING: usize = 2;
pub const DEFAULT_HEADER_STYLE: Style = Style::new(Color::Green).underlined();
pub const DEFAULT_FIRST_COLUMN_STYLE: Style = Style::new(Color::Yellow);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: Color,
    pub underline: bool,
}

impl Style {
    pub const fn new(color: Color) -> Self {
        Self {
            color,
            underline: false,
        }
    }

    pub const fn underlined(mut self) -> Self {
        self.underline = true;
        self
    }

    fn paint(&self, text: &str) -> String {
        let painted = text.color(self.color);
        if self.underline {
            painted.underline().to_string()
        } else {
            painted.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub header_style: Option<Style>,
    pub first_column_style: Option<Style>,
    padding: usize,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    // Content widths, padding is added on top when rendering.
    widths: Vec<usize>,
}

impl Table {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header: Vec<String> = labels.into_iter().map(Into::into).collect();
        let widths = header.iter().map(|label| label.width()).collect();
        Self {
            header_style: Some(DEFAULT_HEADER_STYLE),
            first_column_style: Some(DEFAULT_FIRST_COLUMN_STYLE),
            padding: DEFAULT_PADDING,
            header,
            rows: Vec::new(),
            widths,
        }
    }

    pub fn with_header_style(mut self, style: Option<Style>) -> Self {
        self.header_style = style;
        self
    }

    /// Appends a row. Values past the last header column are dropped and an
    /// empty slice produces a blank spacer row.
    pub fn add(&mut self, values: &[&dyn Display]) {
        let mut row = vec![String::new(); self.header.len()];
        for (idx, value) in values.iter().take(self.header.len()).enumerate() {
            let cell = value.to_string();
            self.widths[idx] = self.widths[idx].max(cell.width());
            row[idx] = cell;
        }
        self.rows.push(row);
    }

    pub fn spacer(&mut self) {
        self.add(&[]);
    }

    pub fn column_widths(&self) -> Vec<usize> {
        self.widths.iter().map(|w| w + self.padding).collect()
    }

    pub fn print<W: Write + ?Sized>(&self, out: &mut W, styled: bool) -> io::Result<()> {
        let widths = self.column_widths();
        writeln!(out)?;

        let header = self
            .header
            .iter()
            .zip(&widths)
            .map(|(label, width)| pad(label, *width))
            .collect::<String>();
        match self.header_style.filter(|_| styled) {
            Some(style) => writeln!(out, "{}", style.paint(&header))?,
            None => writeln!(out, "{header}")?,
        }

        for row in &self.rows {
            let mut line = String::new();
            for (idx, (cell, width)) in row.iter().zip(&widths).enumerate() {
                let padded = pad(cell, *width);
                match self.first_column_style.filter(|_| styled && idx == 0) {
                    Some(style) => line.push_str(&style.paint(&padded)),
                    None => line.push_str(&padded),
                }
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.width());
    format!("{cell}{}", " ".repeat(fill))
}
