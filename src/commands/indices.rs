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
use crate::input::Payload;
use crate::table::Table;
use anyhow::{Result, anyhow};

pub const ALL_INDICES: &str = "_all";

/// Lists shard/replica settings and document counts, ordered by index name.
pub fn list(session: &mut Session, names: &[String]) -> Result<()> {
    let names = if names.is_empty() {
        vec![ALL_INDICES.to_string()]
    } else {
        names.to_vec()
    };

    let settings = session.client.index_settings(&names)?;
    let stats = session.client.index_doc_stats(&names)?;

    let mut table = Table::new(["Name", "Shards", "Replicas", "Documents"]);
    for (name, info) in &stats.indices {
        let setting = |key: &str| {
            settings
                .get(name)
                .map(|s| s.display(key))
                .unwrap_or_default()
        };
        let docs = info.primaries.docs.clone().unwrap_or_default();
        table.add(&[
            name,
            &setting("index.number_of_shards"),
            &setting("index.number_of_replicas"),
            &format!("{} ({} Deleted)", docs.count, docs.deleted),
        ]);
    }
    session.print(&table)
}

pub fn create(session: &mut Session, name: &str, body: Option<&Payload>) -> Result<()> {
    let ack = session.client.create_index(name, body)?;

    let mut table = Table::new(["Index Creation", name]);
    table.add(&[&"Acknowledged", &ack.acknowledged]);
    session.print(&table)
}

pub fn stats(session: &mut Session, name: &str) -> Result<()> {
    let response = session.client.index_stats(name)?;
    let stats = response
        .indices
        .get(name)
        .ok_or_else(|| anyhow!("unable to find index: {name}"))?;

    if let Some(docs) = &stats.primaries.docs {
        let mut table = Table::new(["Documents", ""]);
        table.add(&[&"Total", &docs.count]);
        table.add(&[&"Deleted", &docs.deleted]);
        session.print(&table)?;
    }

    if let Some(store) = &stats.primaries.store {
        let mut table = Table::new(["Storage", ""]);
        table.add(&[&"Size", &store.size]);
        table.add(&[&"Throttle Time", &store.throttle_time]);
        session.print(&table)?;
    }

    Ok(())
}

pub fn delete(session: &mut Session, names: &[String]) -> Result<()> {
    let ack = session.client.delete_indices(names)?;

    let mut table = Table::new(["Index Deletion".to_string(), names.join(",")]);
    table.add(&[&"Acknowledged", &ack.acknowledged]);
    session.print(&table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run_report;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn list_defaults_to_all_indices() {
        let server = MockServer::start();
        let settings = server.mock(|when, then| {
            when.method(GET)
                .path("/_all/_settings")
                .query_param("flat_settings", "true");
            then.status(200).json_body(json!({
                "logs": {"settings": {"index.number_of_shards": "5", "index.number_of_replicas": "1"}},
                "audit": {"settings": {"index.number_of_shards": "1", "index.number_of_replicas": "0"}}
            }));
        });
        let stats = server.mock(|when, then| {
            when.method(GET).path("/_all/_stats/docs");
            then.status(200).json_body(json!({
                "indices": {
                    "logs": {"primaries": {"docs": {"count": 1200, "deleted": 4}}},
                    "audit": {"primaries": {"docs": {"count": 7, "deleted": 0}}}
                }
            }));
        });

        let (result, out) = run_report(&server, |s| list(s, &[]));
        result.unwrap();

        settings.assert();
        stats.assert();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("Name"));
        assert!(lines[2].starts_with("audit"));
        assert!(lines[2].contains("7 (0 Deleted)"));
        assert!(lines[3].starts_with("logs"));
        assert!(lines[3].contains("1200 (4 Deleted)"));
    }

    #[test]
    fn list_joins_requested_names() {
        let server = MockServer::start();
        let settings = server.mock(|when, then| {
            when.method(GET).path("/a,b/_settings");
            then.status(200).json_body(json!({}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/a,b/_stats/docs");
            then.status(200).json_body(json!({"indices": {}}));
        });

        let (result, out) = run_report(&server, |s| list(s, &["a".into(), "b".into()]));
        result.unwrap();
        settings.assert();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn create_sends_optional_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/events")
                .json_body(json!({"settings": {"number_of_shards": 3}}));
            then.status(200).json_body(json!({"acknowledged": true}));
        });

        let body = json!({"settings": {"number_of_shards": 3}})
            .as_object()
            .unwrap()
            .clone();
        let (result, out) = run_report(&server, |s| create(s, "events", Some(&body)));
        result.unwrap();

        mock.assert();
        assert!(out.contains("Index Creation  events"));
        assert!(out.contains("Acknowledged    true"));
    }

    #[test]
    fn stats_reports_missing_index() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ghost/_stats");
            then.status(200).json_body(json!({"indices": {}}));
        });

        let (result, _) = run_report(&server, |s| stats(s, "ghost"));
        assert_eq!(
            result.unwrap_err().to_string(),
            "unable to find index: ghost"
        );
    }

    #[test]
    fn stats_prints_documents_and_storage() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/logs/_stats")
                .query_param("human", "true");
            then.status(200).json_body(json!({
                "indices": {"logs": {"primaries": {
                    "docs": {"count": 42, "deleted": 1},
                    "store": {"size": "3.1mb", "size_in_bytes": 3250585, "throttle_time": "0s"}
                }}}
            }));
        });

        let (result, out) = run_report(&server, |s| stats(s, "logs"));
        result.unwrap();

        assert!(out.contains("Documents"));
        assert!(out.contains("Total      42"));
        assert!(out.contains("Size           3.1mb"));
        assert!(out.contains("Throttle Time  0s"));
    }

    #[test]
    fn delete_reports_acknowledgement() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/old-1,old-2");
            then.status(200).json_body(json!({"acknowledged": true}));
        });

        let (result, out) =
            run_report(&server, |s| delete(s, &["old-1".into(), "old-2".into()]));
        result.unwrap();

        mock.assert();
        assert!(out.contains("Index Deletion  old-1,old-2"));
    }
}
