//! Geolocation providers for terminals, which have no positioning hardware.
//!
//! * [`FixedLocator`] answers with a position supplied by the user.
//! * [`IpLocator`] asks an IP geolocation service.
//! * [`DeniedLocator`] refuses access, as a user declining the prompt would.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use ecoponto_core::{
    model::GeoPosition,
    ports::{Accuracy, GeolocationPort, Permission, PortError},
};

/// IP geolocation endpoint returning `status`, `lat` and `lon`.
pub const DEFAULT_GEOIP_URL: &str = "http://ip-api.com/json";

/// Location source answering with a preconfigured position.
pub struct FixedLocator {
    position: GeoPosition,
}

impl FixedLocator {
    /// Locator always reporting `position`.
    #[must_use]
    pub fn new(position: GeoPosition) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationPort for FixedLocator {
    async fn request_permission(&self) -> Result<Permission, PortError> {
        Ok(Permission::Granted)
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<GeoPosition, PortError> {
        Ok(self.position)
    }
}

/// Location source for users who opted out of sharing their position.
pub struct DeniedLocator;

#[async_trait]
impl GeolocationPort for DeniedLocator {
    async fn request_permission(&self) -> Result<Permission, PortError> {
        Ok(Permission::Denied)
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<GeoPosition, PortError> {
        Err(PortError::NoFix("location access denied".to_owned()))
    }
}

/// Response from the IP geolocation service
#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl LookupResponse {
    fn into_position(self) -> Result<GeoPosition, PortError> {
        if self.status != "success" {
            let reason = self.message.unwrap_or(self.status);
            return Err(PortError::NoFix(reason));
        }
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Ok(GeoPosition::new(latitude, longitude)),
            _ => Err(PortError::Decode("lookup without coordinates".to_owned())),
        }
    }
}

/// Location source resolving the public IP address to coordinates.
pub struct IpLocator {
    client: Client,
    url: String,
    timeout: Duration,
}

impl IpLocator {
    /// Create a locator giving up on the lookup after `timeout`.
    #[must_use]
    pub fn new<S: Into<String>>(client: Client, url: S, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    fn lookup_request(&self) -> RequestBuilder {
        self.client
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
    }
}

#[async_trait]
impl GeolocationPort for IpLocator {
    async fn request_permission(&self) -> Result<Permission, PortError> {
        Ok(Permission::Granted)
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<GeoPosition, PortError> {
        debug!(url = %self.url, "looking up city level position");

        let lookup = async {
            self.lookup_request()
                .send()
                .await?
                .error_for_status()?
                .json::<LookupResponse>()
                .await
        };
        let response = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_elapsed| PortError::Timeout)??;
        response.into_position()
    }
}

/// Pick the locator matching the user's choices.
///
/// A fixed position wins over the IP lookup; `deny` wins over both.
#[must_use]
pub fn locator(
    client: Client,
    geoip_url: &str,
    fixed: Option<GeoPosition>,
    deny: bool,
    timeout: Duration,
) -> Arc<dyn GeolocationPort> {
    if deny {
        return Arc::new(DeniedLocator);
    }
    match fixed {
        Some(position) => Arc::new(FixedLocator::new(position)),
        None => Arc::new(IpLocator::new(client, geoip_url, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_lookup_yields_position() {
        let response: LookupResponse =
            serde_json::from_str(r#"{"status":"success","lat":-23.5475,"lon":-46.6361}"#).unwrap();
        let position = response.into_position().unwrap();
        assert!((position.latitude + 23.5475).abs() < 1e-9);
        assert!((position.longitude + 46.6361).abs() < 1e-9);
    }

    #[test]
    fn failed_lookup_is_no_fix() {
        let response: LookupResponse =
            serde_json::from_str(r#"{"status":"fail","message":"private range"}"#).unwrap();
        assert!(matches!(
            response.into_position(),
            Err(PortError::NoFix(reason)) if reason == "private range"
        ));
    }

    #[test]
    fn lookup_asks_only_for_needed_fields() {
        let locator = IpLocator::new(Client::new(), DEFAULT_GEOIP_URL, Duration::from_secs(1));
        let request = locator.lookup_request().build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://ip-api.com/json?fields=status%2Cmessage%2Clat%2Clon"
        );
    }

    #[tokio::test]
    async fn denial_wins_over_fixed_position() {
        let port = locator(
            Client::new(),
            DEFAULT_GEOIP_URL,
            Some(GeoPosition::new(1.0, 2.0)),
            true,
            Duration::from_secs(1),
        );
        assert_eq!(port.request_permission().await.unwrap(), Permission::Denied);
    }

    #[tokio::test]
    async fn fixed_position_is_granted() {
        let port = locator(
            Client::new(),
            DEFAULT_GEOIP_URL,
            Some(GeoPosition::new(0.0, 0.0)),
            false,
            Duration::from_secs(1),
        );
        assert_eq!(port.request_permission().await.unwrap(), Permission::Granted);
        assert_eq!(
            port.current_position(Accuracy::High).await.unwrap(),
            GeoPosition::new(0.0, 0.0)
        );
    }

    #[tokio::test]
    async fn ip_lookup_is_used_without_fixed_position() {
        let port = locator(
            Client::new(),
            DEFAULT_GEOIP_URL,
            None,
            false,
            Duration::from_secs(1),
        );
        assert_eq!(port.request_permission().await.unwrap(), Permission::Granted);
    }
}
