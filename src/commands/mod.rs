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

//! Report handlers for every cluster-facing command.
//!
//! Handlers never exit the process. They write tables to the session's
//! output and hand failures back to `main`, which decides between printing
//! help (for a [`UsageError`]) and printing an `ERROR:` line.

pub mod cluster;
pub mod indices;
pub mod ping;

use crate::client::EsClient;
use crate::table::Table;
use anyhow::{Context, Result};
use std::io::Write;
use thiserror::Error;

/// Everything a handler needs for one invocation.
pub struct Session<'a> {
    pub client: EsClient,
    pub out: &'a mut dyn Write,
    pub styled: bool,
}

impl<'a> Session<'a> {
    pub fn new(client: EsClient, out: &'a mut dyn Write, styled: bool) -> Self {
        Self {
            client,
            out,
            styled,
        }
    }

    pub fn print(&mut self, table: &Table) -> Result<()> {
        table
            .print(&mut *self.out, self.styled)
            .context("writing report")
    }

    pub fn message(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "\n{text}").context("writing report")
    }
}

/// The arguments did not fit the command; `main` shows that command's help.
#[derive(Debug, Error)]
#[error("invalid arguments for `esu {}`", .command.join(" "))]
pub struct UsageError {
    pub command: Vec<&'static str>,
}

impl UsageError {
    pub fn new(command: &[&'static str]) -> Self {
        Self {
            command: command.to_vec(),
        }
    }
}
