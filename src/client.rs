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

use crate::models::{
    Acknowledged, ClusterHealth, ClusterStats, IndexSettingsResponse, IndicesStats, NodesInfo,
    PingInfo,
};
use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

const USER_AGENT_VALUE: &str = concat!("esu/", env!("CARGO_PKG_VERSION"));

/// A non-2xx answer from the cluster.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Error {status}: {reason} [type={kind}]")]
    Api {
        status: StatusCode,
        kind: String,
        reason: String,
    },
    #[error("Error {status}: {body}")]
    Http { status: StatusCode, body: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(default)]
        reason: String,
    },
    Message(String),
}

impl ClientError {
    fn from_response(status: StatusCode, body: String) -> Self {
        match serde_json::from_str::<ErrorBody>(&body).map(|b| b.error) {
            Ok(ErrorDetail::Structured { kind, reason }) => ClientError::Api {
                status,
                kind,
                reason,
            },
            Ok(ErrorDetail::Message(message)) => ClientError::Http {
                status,
                body: message,
            },
            Err(_) => ClientError::Http {
                status,
                body: body.trim().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct EsClient {
    base_url: Url,
    http: Client,
}

impl EsClient {
    pub fn new(base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(HeaderValue::from_static(USER_AGENT_VALUE))
            .build()
            .context("building HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn ping(&self) -> Result<PingInfo> {
        self.get(&[], &[])
    }

    pub fn cluster_health(&self) -> Result<ClusterHealth> {
        self.get(&["_cluster", "health"], &[])
    }

    pub fn cluster_stats(&self) -> Result<ClusterStats> {
        self.get(&["_cluster", "stats"], &[("human", "true".into())])
    }

    pub fn nodes_info(&self) -> Result<NodesInfo> {
        self.get(&["_nodes"], &[("human", "true".into())])
    }

    pub fn put_cluster_settings(&self, settings: &Map<String, Value>) -> Result<Acknowledged> {
        self.send_json(Method::PUT, &["_cluster", "settings"], &[], Some(settings))
    }

    pub fn index_settings(&self, indices: &[String]) -> Result<IndexSettingsResponse> {
        self.get(
            &[indices.join(",").as_str(), "_settings"],
            &[("flat_settings", "true".into())],
        )
    }

    pub fn index_doc_stats(&self, indices: &[String]) -> Result<IndicesStats> {
        self.get(&[indices.join(",").as_str(), "_stats", "docs"], &[])
    }

    pub fn index_stats(&self, index: &str) -> Result<IndicesStats> {
        self.get(&[index, "_stats"], &[("human", "true".into())])
    }

    pub fn create_index(
        &self,
        name: &str,
        body: Option<&Map<String, Value>>,
    ) -> Result<Acknowledged> {
        self.send_json(Method::PUT, &[name], &[], body)
    }

    pub fn delete_indices(&self, names: &[String]) -> Result<Acknowledged> {
        self.send_json(
            Method::DELETE,
            &[names.join(",").as_str()],
            &[],
            Option::<&Value>::None,
        )
    }

    pub fn get<T: DeserializeOwned>(&self, path: &[&str], query: &[(&str, String)]) -> Result<T> {
        self.send_json(Method::GET, path, query, Option::<&Value>::None)
    }

    fn send_json<B, T>(
        &self,
        method: Method,
        path: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path, query, body)?;
        trace!(status = response.status, bytes = response.body.len(), "decoding response");
        serde_json::from_str(&response.body)
            .with_context(|| format!("decoding response from `/{}`", path.join("/")))
    }

    /// Appends `path` to the base URL one segment at a time, so characters
    /// like `?`, `#` or `/` inside an index name are percent-encoded.
    fn url_for(&self, path: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        if !path.is_empty() {
            url.path_segments_mut()
                .map_err(|_| anyhow!("base URL `{}` cannot carry a path", self.base_url))?
                .pop_if_empty()
                .extend(path);
        }
        Ok(url)
    }

    fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<ResponseData> {
        let url = self.url_for(path)?;

        debug!(%method, %url, "sending request");
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .with_context(|| format!("{method} {url}"))?;

        let status = response.status();
        let text = response.text().context("reading response body")?;
        debug!(status = status.as_u16(), "received response");

        if !status.is_success() {
            return Err(ClientError::from_response(status, text).into());
        }

        Ok(ResponseData {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> EsClient {
        EsClient::new(Url::parse(&server.base_url()).unwrap()).unwrap()
    }

    #[test]
    fn ping_decodes_node_info() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).json_body(json!({
                "name": "node-1",
                "cluster_name": "esu-test",
                "version": {"number": "2.1.0", "lucene_version": "5.3.1"},
                "tagline": "You Know, for Search"
            }));
        });

        let info = client_for(&server).ping().unwrap();

        mock.assert();
        assert_eq!(info.cluster_name, "esu-test");
        assert_eq!(info.version.number, "2.1.0");
    }

    #[test]
    fn stats_requests_human_output() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/_cluster/stats")
                .query_param("human", "true");
            then.status(200).json_body(json!({"cluster_name": "c"}));
        });

        let stats = client_for(&server).cluster_stats().unwrap();

        mock.assert();
        assert!(stats.indices.is_none());
        assert!(stats.nodes.is_none());
    }

    #[test]
    fn puts_settings_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/_cluster/settings")
                .json_body(json!({"transient": {"logger.discovery": "DEBUG"}}));
            then.status(200).json_body(json!({"acknowledged": true}));
        });

        let settings = json!({"transient": {"logger.discovery": "DEBUG"}});
        let ack = client_for(&server)
            .put_cluster_settings(settings.as_object().unwrap())
            .unwrap();

        mock.assert();
        assert!(ack.acknowledged);
    }

    #[test]
    fn deletes_joined_index_names() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/logs-1,logs-2");
            then.status(200).json_body(json!({"acknowledged": true}));
        });

        let ack = client_for(&server)
            .delete_indices(&["logs-1".into(), "logs-2".into()])
            .unwrap();

        mock.assert();
        assert!(ack.acknowledged);
    }

    #[test]
    fn index_names_are_single_path_segments() {
        let client = EsClient::new(Url::parse("http://es1:9200/").unwrap()).unwrap();
        let url = client.url_for(&["a?b#c/d", "_stats"]).unwrap();
        assert_eq!(url.as_str(), "http://es1:9200/a%3Fb%23c%2Fd/_stats");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn url_keeps_base_and_comma_lists() {
        let client = EsClient::new(Url::parse("http://es1:9200").unwrap()).unwrap();
        assert_eq!(client.url_for(&[]).unwrap().as_str(), "http://es1:9200/");
        assert_eq!(
            client
                .url_for(&["logs-1,logs-2", "_stats", "docs"])
                .unwrap()
                .as_str(),
            "http://es1:9200/logs-1,logs-2/_stats/docs"
        );
        assert_eq!(
            client.url_for(&["a:b", "_settings"]).unwrap().as_str(),
            "http://es1:9200/a:b/_settings"
        );
    }

    #[test]
    fn structured_error_surfaces_server_reason() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing/_stats");
            then.status(404).json_body(json!({
                "error": {
                    "root_cause": [],
                    "type": "index_not_found_exception",
                    "reason": "no such index"
                },
                "status": 404
            }));
        });

        let err = client_for(&server).index_stats("missing").unwrap_err();
        let api = err.downcast_ref::<ClientError>().unwrap();
        assert!(matches!(api, ClientError::Api { status, .. } if status.as_u16() == 404));
        assert_eq!(
            err.to_string(),
            "Error 404 Not Found: no such index [type=index_not_found_exception]"
        );
    }

    #[test]
    fn legacy_string_error_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/bad");
            then.status(400)
                .json_body(json!({"error": "IndexAlreadyExistsException[[bad] already exists]", "status": 400}));
        });

        let err = client_for(&server).create_index("bad", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error 400 Bad Request: IndexAlreadyExistsException[[bad] already exists]"
        );
    }

    #[test]
    fn unstructured_error_keeps_body_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/_cluster/health");
            then.status(502).body("upstream unavailable\n");
        });

        let err = client_for(&server).cluster_health().unwrap_err();
        assert_eq!(err.to_string(), "Error 502 Bad Gateway: upstream unavailable");
    }
}
