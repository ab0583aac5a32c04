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

//! Response bodies of the cluster endpoints esu talks to.
//!
//! Only the fields that end up in a report are modelled. Everything is
//! defaulted so that older or newer clusters that omit a field still decode;
//! sections whose presence decides whether a table is printed are `Option`s.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// `GET /`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PingInfo {
    pub name: String,
    pub cluster_name: String,
    pub tagline: String,
    pub version: VersionInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VersionInfo {
    pub number: String,
}

/// `GET /_cluster/health`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterHealth {
    pub cluster_name: String,
    pub status: String,
    pub number_of_nodes: u64,
    pub number_of_data_nodes: u64,
    pub active_primary_shards: u64,
    pub active_shards: u64,
    pub relocating_shards: u64,
    pub initializing_shards: u64,
    pub unassigned_shards: u64,
    pub delayed_unassigned_shards: u64,
    pub number_of_pending_tasks: u64,
    pub number_of_in_flight_fetch: u64,
    pub task_max_waiting_in_queue_millis: u64,
    pub active_shards_percent_as_number: f64,
}

/// `GET /_cluster/stats?human=true`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterStats {
    pub indices: Option<IndicesSummary>,
    pub nodes: Option<NodesSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndicesSummary {
    pub count: u64,
    pub shards: Option<ShardsSummary>,
    pub docs: Option<DocsStats>,
    pub store: Option<StoreStats>,
    pub fielddata: Option<CacheStats>,
    #[serde(alias = "query_cache")]
    pub filter_cache: Option<CacheStats>,
    pub id_cache: Option<CacheStats>,
    pub completion: Option<CompletionStats>,
    pub percolate: Option<PercolateStats>,
    pub segments: Option<SegmentsStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShardsSummary {
    pub total: u64,
    pub primaries: u64,
    pub replication: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocsStats {
    pub count: u64,
    pub deleted: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreStats {
    pub size: String,
    pub throttle_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    pub memory_size: String,
    pub evictions: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompletionStats {
    pub size: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PercolateStats {
    pub total: u64,
    pub time: String,
    pub current: u64,
    pub memory_size: String,
    pub memory_size_in_bytes: i64,
    pub queries: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SegmentsStats {
    pub count: u64,
    pub memory: String,
    pub index_writer_memory: String,
    pub index_writer_max_memory: String,
    pub version_map_memory: String,
    pub fixed_bit_set: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodesSummary {
    pub count: Option<NodeCounts>,
    pub os: NodesOs,
    pub process: NodesProcess,
    pub jvm: NodesJvm,
    pub fs: NodesFs,
    pub plugins: Vec<PluginInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeCounts {
    pub total: u64,
    pub client: u64,
    pub master_only: u64,
    pub data_only: u64,
    pub master_data: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodesOs {
    pub available_processors: u64,
    pub mem: MemTotal,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemTotal {
    pub total: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodesProcess {
    pub cpu: CpuPercent,
    pub open_file_descriptors: MinMaxAvg,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CpuPercent {
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MinMaxAvg {
    pub min: i64,
    pub max: i64,
    pub avg: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodesJvm {
    pub max_uptime: String,
    pub threads: u64,
    pub mem: JvmMem,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmMem {
    pub heap_used: String,
    pub heap_max: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodesFs {
    pub total: String,
    pub free: String,
    pub available: String,
    pub disk_io_op: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
    pub disk_io_size: String,
    pub disk_read_size: String,
    pub disk_write_size: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub url: String,
    pub jvm: bool,
    pub site: bool,
}

/// `GET /_nodes?human=true`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodesInfo {
    pub nodes: BTreeMap<String, NodeInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    pub name: String,
    pub version: String,
    pub http_address: String,
    pub transport_address: String,
    pub process: NodeProcess,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeProcess {
    pub id: u64,
}

/// `GET /{index}/_settings?flat_settings=true`
pub type IndexSettingsResponse = BTreeMap<String, IndexSettings>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub settings: BTreeMap<String, Value>,
}

impl IndexSettings {
    /// Setting value as shown in reports: strings unquoted, missing keys empty.
    pub fn display(&self, key: &str) -> String {
        match self.settings.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// `GET /{index}/_stats`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndicesStats {
    pub indices: BTreeMap<String, IndexStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexStats {
    pub primaries: IndexStatsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexStatsSection {
    pub docs: Option<DocsStats>,
    pub store: Option<StoreStats>,
}

/// Body of index create/delete and settings update responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Acknowledged {
    pub acknowledged: bool,
}
