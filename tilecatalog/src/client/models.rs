//! Wire models for the backend APIs.

use serde::{Deserialize, Serialize};

/// One entry of the API lookup response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    /// Logical service name (`metadata`, `query`, `blob`, ...).
    pub api: String,
    /// Service interface version.
    pub version: String,
    /// Base URL requests for this service are issued against.
    pub base_url: String,
}

/// Latest catalog version response.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VersionResponse {
    /// Monotonic catalog version.
    pub version: u64,
}

/// Partition metadata as served by the query API.
///
/// Also the cache record for resolved partitions, serialized as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    /// Partition identifier.
    pub partition: String,
    /// Catalog version the partition last changed at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Blob storage handle for the partition payload.
    pub data_handle: String,
}

/// Partition list response of the query API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartitionsResponse {
    /// Resolved partitions; requested IDs unknown to the catalog are
    /// simply absent.
    #[serde(default)]
    pub partitions: Vec<Partition>,
}
