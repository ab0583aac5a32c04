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

use super::Session;
use crate::table::Table;
use anyhow::Result;

pub fn run(session: &mut Session) -> Result<()> {
    let info = session.client.ping()?;
    let node = format!(
        "{} [{}]",
        info.name,
        session.client.base_url().as_str().trim_end_matches('/')
    );

    let mut table = Table::new(["Cluster", info.cluster_name.as_str()]);
    table.add(&[&"Node", &node]);
    table.add(&[&"Tag Line", &info.tagline]);
    table.add(&[&"ES Version", &info.version.number]);
    session.print(&table)
}
