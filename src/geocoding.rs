//! Place suggestions from the Mapbox geocoding service

use crate::config::SearchConfig;
use crate::error::LookupError;
use crate::models::{Coordinate, PlaceCandidate};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Service label used in errors and logs
const SERVICE: &str = "geocoding";

/// Source of ranked autocomplete suggestions for a partial place name
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Resolve place candidates for a non-empty query
    ///
    /// Implementations observe `cancel` and return
    /// [`LookupError::Canceled`] without side effects once it fires.
    async fn suggest(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlaceCandidate>, LookupError>;
}

/// Client for the Mapbox Places autocomplete API
pub struct MapboxGeocoding {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    limit: u8,
}

impl MapboxGeocoding {
    /// Create a client from the search configuration
    pub fn new(config: &SearchConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("howfar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.geocoding_base_url.trim_end_matches('/').to_string(),
            access_token: config.mapbox_access_token.clone(),
            limit: config.suggestion_limit,
        })
    }

    /// Request URL for a query, without the query parameters
    fn request_url(&self, query: &str) -> String {
        format!("{}/{}.json", self.base_url, urlencoding::encode(query))
    }

    async fn fetch(&self, query: &str) -> Result<Vec<PlaceCandidate>, LookupError> {
        let url = self.request_url(query);
        debug!("geocoding request: {url}");

        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("types", "place,address,poi"),
                ("autocomplete", "true"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("geocoding request failed with status {status}");
            return Err(LookupError::fetch(SERVICE, status.as_u16()));
        }

        let body: mapbox::GeocodingResponse = response.json().await.map_err(|e| {
            error!("failed to parse geocoding response: {e}");
            LookupError::schema(SERVICE, e.to_string())
        })?;

        let candidates: Vec<PlaceCandidate> = body
            .features
            .into_iter()
            .take(self.limit as usize)
            .map(PlaceCandidate::from)
            .collect();

        info!("geocoding returned {} candidates for '{query}'", candidates.len());
        Ok(candidates)
    }
}

#[async_trait]
impl SuggestionProvider for MapboxGeocoding {
    #[instrument(skip(self, cancel))]
    async fn suggest(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlaceCandidate>, LookupError> {
        // Biased so an already-superseded query never reaches the network.
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(LookupError::Canceled),
            result = self.fetch(query) => {
                if cancel.is_cancelled() {
                    return Err(LookupError::Canceled);
                }
                result
            }
        }
    }
}

/// Mapbox Places API response structures
mod mapbox {
    use super::{Coordinate, PlaceCandidate};
    use serde::Deserialize;

    /// Top-level geocoding response
    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        #[serde(default)]
        pub features: Vec<Feature>,
    }

    /// One matched place
    #[derive(Debug, Deserialize)]
    pub struct Feature {
        pub id: String,
        pub place_name: String,
        pub geometry: Geometry,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        /// Position as `[longitude, latitude]`
        pub coordinates: [f64; 2],
    }

    impl From<Feature> for PlaceCandidate {
        fn from(feature: Feature) -> Self {
            let [longitude, latitude] = feature.geometry.coordinates;
            PlaceCandidate {
                id: feature.id,
                place_name: feature.place_name,
                coordinate: Coordinate {
                    latitude,
                    longitude,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MapboxGeocoding {
        let config = SearchConfig::new("pk.test", "owm.test");
        MapboxGeocoding::new(&config).unwrap()
    }

    #[test]
    fn test_request_url_escapes_the_query() {
        let provider = client();
        assert_eq!(
            provider.request_url("San Francisco"),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/San%20Francisco.json"
        );
    }

    #[test]
    fn test_request_url_strips_trailing_slash() {
        let config = SearchConfig::new("pk.test", "owm.test")
            .with_geocoding_base_url("http://localhost:9000/places/");
        let provider = MapboxGeocoding::new(&config).unwrap();
        assert_eq!(
            provider.request_url("Par"),
            "http://localhost:9000/places/Par.json"
        );
    }

    #[test]
    fn test_response_coordinates_are_longitude_first() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "id": "place.123",
                "place_name": "Paris, France",
                "geometry": { "type": "Point", "coordinates": [2.3522, 48.8566] }
            }]
        }"#;
        let response: mapbox::GeocodingResponse = serde_json::from_str(json).unwrap();
        let candidate = PlaceCandidate::from(response.features.into_iter().next().unwrap());

        assert_eq!(candidate.id, "place.123");
        assert_eq!(candidate.place_name, "Paris, France");
        assert_eq!(candidate.coordinate.latitude, 48.8566);
        assert_eq!(candidate.coordinate.longitude, 2.3522);
    }

    #[test]
    fn test_response_without_features_is_empty() {
        let response: mapbox::GeocodingResponse = serde_json::from_str("{}").unwrap();
        assert!(response.features.is_empty());
    }

    #[tokio::test]
    async fn test_canceled_before_dispatch_never_fetches() {
        let provider = client();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // No server is listening at the real endpoint in tests; the biased
        // cancellation branch must win before any request is attempted.
        let result = provider.suggest("Par", &cancel).await;
        assert!(matches!(result, Err(LookupError::Canceled)));
    }
}
