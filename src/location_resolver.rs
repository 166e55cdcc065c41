//! Location Resolution Module
//!
//! Derives coordinates from the caller's IP address when no GPS fix was
//! supplied. Private and loopback addresses never leave the process; public
//! ones are looked up once against an ip-api compatible endpoint.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{Coordinates, GeoLocation};

/// Address prefixes that cannot be geolocated
pub const UNROUTABLE_PREFIXES: [&str; 5] = ["127.", "192.168.", "10.", "172.", "::1"];

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Network context of the caller, used to find its public address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    /// Raw `X-Forwarded-For` header value
    pub forwarded_for: Option<String>,
    /// Transport-level peer address
    pub peer_addr: Option<IpAddr>,
}

impl CallerContext {
    #[must_use]
    pub fn from_peer(peer_addr: IpAddr) -> Self {
        Self {
            forwarded_for: None,
            peer_addr: Some(peer_addr),
        }
    }

    #[must_use]
    pub fn with_forwarded_for<S: Into<String>>(mut self, header: S) -> Self {
        self.forwarded_for = Some(header.into());
        self
    }

    /// Build the context from request headers and the connection's peer address
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, peer_addr: Option<IpAddr>) -> Self {
        let forwarded_for = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self {
            forwarded_for,
            peer_addr,
        }
    }

    /// The originating client address: first forwarded entry, else the peer
    #[must_use]
    pub fn client_ip(&self) -> Option<String> {
        self.forwarded_for
            .as_deref()
            .and_then(|header| header.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .or_else(|| self.peer_addr.map(|addr| addr.to_string()))
    }
}

/// Whether an address is private or loopback and must not be looked up
#[must_use]
pub fn is_unroutable(ip: &str) -> bool {
    UNROUTABLE_PREFIXES
        .iter()
        .any(|prefix| ip.starts_with(prefix))
}

/// IP to location lookup
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Locate a public IP address; any failure yields `None`
    async fn locate(&self, ip: &str) -> Option<GeoLocation>;
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    message: Option<String>,
}

/// Client for the ip-api.com JSON endpoint
#[derive(Debug, Clone)]
pub struct IpApiGeolocator {
    client: Client,
    base_url: String,
}

impl IpApiGeolocator {
    /// Create a geolocator with its own HTTP client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = crate::http_client(timeout)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a geolocator sharing an existing HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn lookup(&self, ip: &str) -> Result<GeoLocation> {
        let url = format!(
            "{}/json/{}?fields=status,lat,lon,city,message",
            self.base_url,
            urlencoding::encode(ip)
        );
        debug!("ip-api request URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("IP geolocation request for {ip} failed"))?
            .error_for_status()
            .with_context(|| format!("IP geolocation returned an error status for {ip}"))?;

        let body: IpApiResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse ip-api response")?;

        if body.status != "success" {
            return Err(anyhow!(
                "lookup status '{}': {}",
                body.status,
                body.message.unwrap_or_default()
            ));
        }

        let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
            return Err(anyhow!("ip-api response is missing coordinates"));
        };

        Ok(GeoLocation {
            coordinates: Coordinates::new(lat, lon)?,
            city: body.city.filter(|c| !c.is_empty()),
        })
    }
}

#[async_trait]
impl Geolocator for IpApiGeolocator {
    async fn locate(&self, ip: &str) -> Option<GeoLocation> {
        match self.lookup(ip).await {
            Ok(location) => Some(location),
            Err(e) => {
                let error = format!("{e:#}");
                warn!(ip, error = %error, "IP geolocation failed");
                None
            }
        }
    }
}

/// Service for resolving a caller's location from its network context
#[derive(Debug, Clone)]
pub struct LocationResolver<G> {
    geolocator: G,
}

impl<G: Geolocator> LocationResolver<G> {
    pub fn new(geolocator: G) -> Self {
        Self { geolocator }
    }

    /// Resolve the caller's location from its forwarded or peer address
    pub async fn resolve(&self, caller: &CallerContext) -> Option<GeoLocation> {
        let Some(ip) = caller.client_ip() else {
            debug!("No client address available, skipping IP geolocation");
            return None;
        };
        self.resolve_ip(&ip).await
    }

    /// Resolve a single address, skipping private and loopback ranges
    pub async fn resolve_ip(&self, ip: &str) -> Option<GeoLocation> {
        if is_unroutable(ip) {
            debug!(ip, "Local IP detected, skipping IP geolocation");
            return None;
        }

        let location = self.geolocator.locate(ip).await?;
        debug!(
            "Resolved {} to {} ({})",
            ip,
            location.city.as_deref().unwrap_or("unknown city"),
            location.coordinates.format_coordinates()
        );
        Some(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use rstest::rstest;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGeolocator {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Geolocator for RecordingGeolocator {
        async fn locate(&self, ip: &str) -> Option<GeoLocation> {
            self.calls.lock().unwrap().push(ip.to_string());
            Some(GeoLocation {
                coordinates: Coordinates::new(52.52, 13.405).unwrap(),
                city: Some("Berlin".to_string()),
            })
        }
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_entry() {
        let caller = CallerContext::from_peer("10.0.0.5".parse().unwrap())
            .with_forwarded_for(" 203.0.113.7 , 10.0.0.1");
        assert_eq!(caller.client_ip().as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let caller = CallerContext::from_peer("198.51.100.20".parse().unwrap());
        assert_eq!(caller.client_ip().as_deref(), Some("198.51.100.20"));

        let empty_header = caller.clone().with_forwarded_for("");
        assert_eq!(empty_header.client_ip().as_deref(), Some("198.51.100.20"));

        assert_eq!(CallerContext::default().client_ip(), None);
    }

    #[test]
    fn test_from_headers_reads_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("8.8.8.8, 172.16.0.1"));
        let caller = CallerContext::from_headers(&headers, None);
        assert_eq!(caller.client_ip().as_deref(), Some("8.8.8.8"));
    }

    #[rstest]
    #[case("127.0.0.1", true)]
    #[case("192.168.1.20", true)]
    #[case("10.1.2.3", true)]
    #[case("172.20.0.4", true)]
    #[case("::1", true)]
    #[case("8.8.8.8", false)]
    #[case("2001:db8::1", false)]
    fn test_unroutable_prefixes(#[case] ip: &str, #[case] expected: bool) {
        assert_eq!(is_unroutable(ip), expected);
    }

    #[tokio::test]
    async fn test_private_addresses_never_reach_geolocator() {
        let resolver = LocationResolver::new(RecordingGeolocator::default());
        for ip in ["127.0.0.1", "192.168.0.10", "10.0.0.2", "172.17.0.1", "::1"] {
            assert!(resolver.resolve_ip(ip).await.is_none());
        }
        assert!(resolver.geolocator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_address_is_looked_up_once() {
        let resolver = LocationResolver::new(RecordingGeolocator::default());
        let caller = CallerContext::from_peer("10.0.0.5".parse().unwrap())
            .with_forwarded_for("203.0.113.7");
        let location = resolver.resolve(&caller).await.unwrap();
        assert_eq!(location.city.as_deref(), Some("Berlin"));
        assert_eq!(
            *resolver.geolocator.calls.lock().unwrap(),
            vec!["203.0.113.7".to_string()]
        );
    }
}
