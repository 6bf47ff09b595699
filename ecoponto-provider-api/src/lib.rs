//! Provider implementation for the collection point backend REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use ecoponto_core::{
    model::{Category, CategoryId, CollectionPoint, FilterSet, PointId, Region},
    ports::{CatalogPort, PointsPort, PortError},
};

/// Base URL of a locally running backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";

/// Single entry from /items
#[derive(Debug, Deserialize)]
struct ItemEntry {
    id: u32,
    title: String,
    image_url: String,
}

/// Single entry from /points
#[derive(Debug, Deserialize)]
struct PointEntry {
    id: u32,
    name: String,
    latitude: f64,
    longitude: f64,

    // file name on the backend, image_url is the served location
    #[serde(default)]
    image: String,
    #[serde(default)]
    image_url: String,
}

impl From<ItemEntry> for Category {
    fn from(entry: ItemEntry) -> Self {
        Self {
            id: CategoryId(entry.id),
            title: entry.title,
            icon_url: entry.image_url,
        }
    }
}

impl PointEntry {
    fn into_point(self, base_url: &str) -> CollectionPoint {
        let image_url = if self.image_url.is_empty() && !self.image.is_empty() {
            format!("{base_url}/uploads/{}", self.image)
        } else {
            self.image_url
        };

        CollectionPoint {
            id: PointId(self.id),
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            image_url,
        }
    }
}

/// HTTP client for the backend endpoints.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`.
    #[must_use]
    pub fn new<S: Into<String>>(client: Client, base_url: S) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    fn items_request(&self) -> RequestBuilder {
        self.client.get(format!("{}/items", self.base_url))
    }

    fn points_request(&self, region: &Region, filter: &FilterSet) -> RequestBuilder {
        let items = filter.to_query_value();
        self.client
            .get(format!("{}/points", self.base_url))
            .query(&[
                ("city", region.city.as_str()),
                ("uf", region.uf.as_str()),
                ("items", items.as_str()),
            ])
    }
}

#[async_trait]
impl CatalogPort for ApiClient {
    async fn categories(&self) -> Result<Vec<Category>, PortError> {
        let items = fetch_json::<Vec<ItemEntry>>(self.items_request()).await?;
        debug!(count = items.len(), "received items");
        Ok(items.into_iter().map(Category::from).collect())
    }
}

#[async_trait]
impl PointsPort for ApiClient {
    async fn points(
        &self,
        region: &Region,
        filter: &FilterSet,
    ) -> Result<Vec<CollectionPoint>, PortError> {
        let entries = fetch_json::<Vec<PointEntry>>(self.points_request(region, filter)).await?;
        debug!(count = entries.len(), "received points");
        Ok(entries
            .into_iter()
            .map(|entry| entry.into_point(&self.base_url))
            .collect())
    }
}

/// Build the catalog and points ports sharing one HTTP client.
#[must_use]
pub fn ports(client: Client, base_url: &str) -> (Arc<dyn CatalogPort>, Arc<dyn PointsPort>) {
    let api = ApiClient::new(client, base_url);
    (Arc::new(api.clone()), Arc::new(api))
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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn api() -> ApiClient {
        ApiClient::new(Client::new(), "http://localhost:3333/")
    }

    #[test]
    fn points_query_carries_region_and_items() {
        let filter: FilterSet = [CategoryId(2), CategoryId(1)].into_iter().collect();
        let request = api()
            .points_request(&Region::new("SP", "Sao Paulo"), &filter)
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/points");
        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("city".to_owned(), "Sao Paulo".to_owned()),
                ("uf".to_owned(), "SP".to_owned()),
                ("items".to_owned(), "1,2".to_owned()),
            ]
        );
    }

    #[test]
    fn empty_filter_sends_empty_items() {
        let request = api()
            .points_request(&Region::new("MG", "Belo Horizonte"), &FilterSet::new())
            .build()
            .unwrap();
        assert!(request.url().query().unwrap().ends_with("items="));
    }

    #[test]
    fn items_endpoint_ignores_trailing_slash() {
        let request = api().items_request().build().unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:3333/items");
    }

    #[test]
    fn decodes_items() {
        let body = r#"[
            {"id": 1, "title": "Lâmpadas", "image_url": "http://localhost:3333/uploads/lampadas.svg"},
            {"id": 2, "title": "Pilhas e Baterias", "image_url": "http://localhost:3333/uploads/baterias.svg"}
        ]"#;
        let items: Vec<ItemEntry> = serde_json::from_str(body).unwrap();
        let categories: Vec<Category> = items.into_iter().map(Category::from).collect();

        assert_eq!(
            categories[1],
            Category {
                id: CategoryId(2),
                title: "Pilhas e Baterias".to_owned(),
                icon_url: "http://localhost:3333/uploads/baterias.svg".to_owned(),
            }
        );
    }

    #[test]
    fn decodes_points_and_falls_back_to_uploaded_image() {
        let body = r#"[
            {"id": 5, "name": "Mercado Central", "latitude": -23.55, "longitude": -46.63,
             "image": "mercado.jpg", "image_url": "http://cdn.example/mercado.jpg", "uf": "SP"},
            {"id": 9, "name": "Ecoponto Sul", "latitude": 0.0, "longitude": 0.0, "image": "sul.jpg"}
        ]"#;
        let entries: Vec<PointEntry> = serde_json::from_str(body).unwrap();
        let points: Vec<CollectionPoint> = entries
            .into_iter()
            .map(|entry| entry.into_point("http://localhost:3333"))
            .collect();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, PointId(5));
        assert_eq!(points[0].image_url, "http://cdn.example/mercado.jpg");
        assert_eq!(points[1].image_url, "http://localhost:3333/uploads/sul.jpg");
    }
}
