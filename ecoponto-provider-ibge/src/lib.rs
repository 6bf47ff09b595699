//! Region directory backed by the IBGE localities API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use ecoponto_core::{
    model::StateCode,
    ports::{PortError, RegionDirectoryPort},
};

/// Public IBGE localities endpoint.
pub const DEFAULT_BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";

/// Single entry from /estados
#[derive(Debug, Deserialize)]
struct StateEntry {
    sigla: String,
}

/// Single entry from /estados/{uf}/municipios
#[derive(Debug, Deserialize)]
struct CityEntry {
    nome: String,
}

/// State and city listing from IBGE.
pub struct IbgeDirectory {
    client: Client,
    base_url: String,
}

impl IbgeDirectory {
    /// Create a directory bound to the given HTTP client and endpoint.
    #[must_use]
    pub fn new<S: Into<String>>(client: Client, base_url: S) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    fn states_request(&self) -> RequestBuilder {
        self.client
            .get(format!("{}/estados", self.base_url))
            .query(&[("orderBy", "nome")])
    }

    fn cities_request(&self, state: &StateCode) -> RequestBuilder {
        self.client
            .get(format!("{}/estados/{}/municipios", self.base_url, state.0))
    }
}

#[async_trait]
impl RegionDirectoryPort for IbgeDirectory {
    async fn states(&self) -> Result<Vec<StateCode>, PortError> {
        let entries = fetch_json::<Vec<StateEntry>>(self.states_request()).await?;
        debug!(count = entries.len(), "received states");
        Ok(entries
            .into_iter()
            .map(|entry| StateCode(entry.sigla))
            .collect())
    }

    async fn cities(&self, state: &StateCode) -> Result<Vec<String>, PortError> {
        if state.0.trim().is_empty() {
            return Ok(Vec::new());
        }
        let entries = fetch_json::<Vec<CityEntry>>(self.cities_request(state)).await?;
        debug!(%state, count = entries.len(), "received cities");
        Ok(entries.into_iter().map(|entry| entry.nome).collect())
    }
}

/// Build the directory port for the public IBGE endpoint or a mirror of it.
#[must_use]
pub fn directory(client: Client, base_url: &str) -> Arc<dyn RegionDirectoryPort> {
    Arc::new(IbgeDirectory::new(client, base_url))
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}
