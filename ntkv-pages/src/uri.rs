//! Dataset URIs of the form `scheme://pool_label/container_label`.

use ntkv_result::{Error, Result};

/// Parsed pool and container labels. The labels are opaque to this layer
/// and forwarded to the store verbatim; any scheme token is accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetUri {
    pub pool: String,
    pub container: String,
}

impl DatasetUri {
    pub fn parse(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| Error::BadUri(uri.to_string()))?;
        if scheme.is_empty() || scheme.contains('/') {
            return Err(Error::BadUri(uri.to_string()));
        }
        let (pool, container) = rest
            .split_once('/')
            .ok_or_else(|| Error::BadUri(uri.to_string()))?;
        if pool.is_empty() || container.is_empty() {
            return Err(Error::BadUri(uri.to_string()));
        }
        Ok(Self {
            pool: pool.to_string(),
            container: container.to_string(),
        })
    }
}
