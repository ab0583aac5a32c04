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
use crate::models::{IndicesSummary, NodesSummary};
use crate::table::{Style, Table};
use anyhow::Result;
use colored::Color;

pub fn health(session: &mut Session) -> Result<()> {
    let health = session.client.cluster_health()?;

    let mut table = Table::new([
        health.cluster_name.clone(),
        format!("status: {}", health.status),
    ])
    .with_header_style(Some(status_style(&health.status)));

    table.add(&[&"Total Nodes", &health.number_of_nodes]);
    table.add(&[&"Data Nodes", &health.number_of_data_nodes]);
    table.spacer();

    table.add(&[
        &"Active Shards",
        &format!(
            "{} ({:.2}%)",
            health.active_shards, health.active_shards_percent_as_number
        ),
    ]);
    if health.active_primary_shards > 0 {
        table.add(&[&"Primary Shards", &health.active_primary_shards]);
    }
    if health.relocating_shards > 0 {
        table.add(&[&"Relocating Shards", &health.relocating_shards]);
    }
    if health.initializing_shards > 0 {
        table.add(&[&"Initializing Shards", &health.initializing_shards]);
    }
    if health.unassigned_shards > 0 || health.delayed_unassigned_shards > 0 {
        table.add(&[
            &"Unassigned Shards",
            &format!(
                "{} ({} Delayed)",
                health.unassigned_shards, health.delayed_unassigned_shards
            ),
        ]);
    }
    table.spacer();

    table.add(&[&"Pending Tasks", &health.number_of_pending_tasks]);
    table.add(&[
        &"Max Time in Task Queue",
        &format!("{} ms", health.task_max_waiting_in_queue_millis),
    ]);
    table.add(&[&"In-Flight Fetches", &health.number_of_in_flight_fetch]);

    session.print(&table)
}

fn status_style(status: &str) -> Style {
    let color = match status {
        "red" => Color::Red,
        "green" => Color::Green,
        _ => Color::Yellow,
    };
    Style::new(color).underlined()
}

/// Prints up to six sections, each only when the cluster reported it.
pub fn stats(session: &mut Session) -> Result<()> {
    let stats = session.client.cluster_stats()?;

    if let Some(indices) = &stats.indices {
        for table in indices_tables(indices) {
            session.print(&table)?;
        }
    }

    if let Some(nodes) = &stats.nodes {
        session.print(&nodes_table(nodes))?;
        if !nodes.plugins.is_empty() {
            let mut table = Table::new(["Plugins", "Version", "JVM", "Site", "URL", "Description"]);
            for plugin in &nodes.plugins {
                table.add(&[
                    &plugin.name,
                    &plugin.version,
                    &plugin.jvm,
                    &plugin.site,
                    &plugin.url,
                    &plugin.description,
                ]);
            }
            session.print(&table)?;
        }
    }

    Ok(())
}

fn indices_tables(indices: &IndicesSummary) -> Vec<Table> {
    let mut tables = Vec::new();

    if let Some(shards) = &indices.shards {
        let mut table = Table::new(["Indices", ""]);
        table.add(&[&"Count", &indices.count]);
        table.add(&[
            &"Shards",
            &format!("{} ({} Primaries)", shards.total, shards.primaries),
        ]);
        table.add(&[&"Replication Ratio", &shards.replication]);
        tables.push(table);
    }

    let mut storage = Table::new(["Storage", ""]);
    if let Some(docs) = &indices.docs {
        storage.add(&[
            &"Total Documents",
            &format!("{} ({} Deleted)", docs.count, docs.deleted),
        ]);
        storage.spacer();
    }
    if let Some(store) = &indices.store {
        storage.add(&[&"Store Size", &store.size]);
        storage.add(&[&"Store Throttle", &store.throttle_time]);
        storage.spacer();
    }
    if let Some(fielddata) = &indices.fielddata {
        storage.add(&[&"Field Data Size", &fielddata.memory_size]);
        storage.add(&[&"Field Data Evictions", &fielddata.evictions]);
        storage.spacer();
    }
    if let Some(cache) = &indices.filter_cache {
        storage.add(&[&"Filter Cache Size", &cache.memory_size]);
        storage.add(&[&"Filter Cache Evictions", &cache.evictions]);
        storage.spacer();
    }
    if let Some(id_cache) = &indices.id_cache {
        storage.add(&[&"ID Cache Size", &id_cache.memory_size]);
    }
    if let Some(completion) = &indices.completion {
        storage.add(&[&"Completion Size", &completion.size]);
    }
    tables.push(storage);

    if let Some(percolate) = &indices.percolate {
        let mut table = Table::new(["Percolation", ""]);
        table.add(&[&"Total", &percolate.total]);
        table.add(&[&"Current", &percolate.current]);
        table.add(&[&"Queries", &percolate.queries]);
        if !percolate.time.is_empty() {
            table.add(&[&"Get Time", &percolate.time]);
        }
        if percolate.memory_size_in_bytes > 0 {
            table.add(&[&"Size", &percolate.memory_size]);
        }
        tables.push(table);
    }

    if let Some(segments) = &indices.segments {
        let mut table = Table::new(["Segments", ""]);
        table.add(&[&"Count", &segments.count]);
        table.add(&[&"Size", &segments.memory]);
        table.spacer();
        table.add(&[
            &"Index Writer Size",
            &format!(
                "{} ({} Max)",
                segments.index_writer_memory, segments.index_writer_max_memory
            ),
        ]);
        table.add(&[&"Version Map Size", &segments.version_map_memory]);
        table.add(&[&"Fixed Bit Set Size", &segments.fixed_bit_set]);
        tables.push(table);
    }

    tables
}

fn nodes_table(nodes: &NodesSummary) -> Table {
    let mut table = Table::new(["Nodes", ""]);
    if let Some(count) = &nodes.count {
        table.add(&[&"Count", &count.total]);
        table.add(&[&"Client", &count.client]);
        table.add(&[&"Master", &count.master_only]);
        table.add(&[&"Data", &count.data_only]);
        table.add(&[&"Master + Data", &count.master_data]);
        table.spacer();
    }

    let fds = &nodes.process.open_file_descriptors;
    table.add(&[&"Processors", &nodes.os.available_processors]);
    table.add(&[&"CPU Usage", &format!("{:.2}%", nodes.process.cpu.percent)]);
    table.add(&[
        &"File Descriptors",
        &format!("{}-{} ({} Avg)", fds.min, fds.max, fds.avg),
    ]);
    table.spacer();

    let jvm = &nodes.jvm;
    table.add(&[&"Total Memory", &nodes.os.mem.total]);
    table.add(&[
        &"JVM Heap",
        &format!("{} ({} Max)", jvm.mem.heap_used, jvm.mem.heap_max),
    ]);
    table.add(&[&"JVM Uptime", &jvm.max_uptime]);
    table.add(&[&"JVM Threads", &jvm.threads]);
    table.spacer();

    let fs = &nodes.fs;
    table.add(&[&"Disk Total", &fs.total]);
    table.add(&[&"Disk Free/Available", &format!("{}/{}", fs.free, fs.available)]);
    table.add(&[
        &"Disk IO",
        &format!(
            "{} ({} Read | {} Write)",
            fs.disk_io_op, fs.disk_reads, fs.disk_writes
        ),
    ]);
    if !fs.disk_io_size.is_empty() {
        table.add(&[
            &"Disk IO Size",
            &format!(
                "{} ({} Read | {} Write)",
                fs.disk_io_size, fs.disk_read_size, fs.disk_write_size
            ),
        ]);
    }
    table
}

/// One row per node, ordered by node ID.
pub fn nodes(session: &mut Session) -> Result<()> {
    let info = session.client.nodes_info()?;

    let mut table = Table::new([
        "ID",
        "Process ID",
        "Name",
        "ES Version",
        "HTTP Address",
        "Transport Address",
    ]);
    for (id, node) in &info.nodes {
        table.add(&[
            id,
            &node.process.id,
            &node.name,
            &node.version,
            &node.http_address,
            &node.transport_address,
        ]);
    }
    session.print(&table)
}

pub fn update(session: &mut Session, settings: &Payload) -> Result<()> {
    let ack = session.client.put_cluster_settings(settings)?;
    if !ack.acknowledged {
        tracing::warn!("cluster did not acknowledge the settings update");
    }
    session.message("Settings updated successfully.")
}
