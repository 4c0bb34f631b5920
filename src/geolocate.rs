//! Current position of the user

use crate::error::GeolocationError;
use crate::models::Coordinate;
use async_trait::async_trait;
use std::env;
use tokio::sync::OnceCell;
use tracing::{info, warn};

const ENV_ORIGIN_LAT: &str = "HOWFAR_ORIGIN_LAT";
const ENV_ORIGIN_LON: &str = "HOWFAR_ORIGIN_LON";

/// Host capability reporting where the user currently is
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Resolve the current position
    async fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// Position source backed by a known fixed coordinate
#[derive(Debug, Clone)]
pub struct FixedPosition(pub Coordinate);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        Ok(self.0)
    }
}

/// Position source reading `HOWFAR_ORIGIN_LAT` / `HOWFAR_ORIGIN_LON`
///
/// Stands in for hosts without a native position capability.
#[derive(Debug, Clone, Default)]
pub struct EnvPosition;

#[async_trait]
impl PositionSource for EnvPosition {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        let lat = env::var(ENV_ORIGIN_LAT).map_err(|_| GeolocationError::NotSupported)?;
        let lon = env::var(ENV_ORIGIN_LON).map_err(|_| GeolocationError::NotSupported)?;

        let latitude: f64 = lat
            .parse()
            .map_err(|_| GeolocationError::PositionUnavailable)?;
        let longitude: f64 = lon
            .parse()
            .map_err(|_| GeolocationError::PositionUnavailable)?;

        let position = Coordinate::new(latitude, longitude);
        if !position.is_valid() {
            return Err(GeolocationError::PositionUnavailable);
        }
        Ok(position)
    }
}

/// Resolves the position exactly once and caches the outcome
///
/// Every later call returns the first resolution, success or failure,
/// so the underlying capability is never queried twice.
pub struct Geolocator {
    source: Box<dyn PositionSource>,
    resolved: OnceCell<Result<Coordinate, GeolocationError>>,
}

impl Geolocator {
    /// Wrap a position source
    #[must_use]
    pub fn new(source: Box<dyn PositionSource>) -> Self {
        Self {
            source,
            resolved: OnceCell::new(),
        }
    }

    /// Current position, resolved on first call and cached afterwards
    pub async fn position(&self) -> Result<Coordinate, GeolocationError> {
        self.resolved
            .get_or_init(|| async {
                let outcome = self.source.current_position().await;
                match &outcome {
                    Ok(position) => {
                        info!("position resolved: {}", position.format_coordinates());
                    }
                    Err(e) => warn!("position unavailable: {e}"),
                }
                outcome
            })
            .await
            .clone()
    }
}
