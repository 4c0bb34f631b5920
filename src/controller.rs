//! The search controller: debounced typeahead with distance and weather
//!
//! [`SearchController`] owns all widget state and mutates it only through
//! its transition operations. Keystrokes schedule a debounced suggestion
//! fetch; scheduling a new fetch cancels the previous one, so results can
//! only ever arrive for the newest text. Accepting a suggestion starts a
//! weather fetch for the place and recomputes the distance from the
//! user's position. Background completions come back through an internal
//! queue which the host drains with [`SearchController::process_next`] or
//! [`SearchController::process_ready`].

use crate::config::SearchConfig;
use crate::error::{GeolocationError, LookupError};
use crate::geo;
use crate::geocoding::{MapboxGeocoding, SuggestionProvider};
use crate::geolocate::Geolocator;
use crate::models::{Coordinate, PlaceCandidate, WeatherSnapshot};
use crate::weather::{OpenWeatherClient, WeatherProvider};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Everything the host needs to render the widget
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    /// Text currently in the input box
    pub query: String,
    /// Suggestions for the current query
    pub suggestions: Vec<PlaceCandidate>,
    /// The accepted place, if any
    pub selection: Option<PlaceCandidate>,
    /// Where the user is, once the geolocator has resolved
    pub current_position: Option<Coordinate>,
    /// Great-circle distance from the current position to the selection
    pub distance_km: Option<f64>,
    /// Current conditions at the selection
    pub weather: Option<WeatherSnapshot>,
    /// True while a suggestion fetch is scheduled or in flight
    pub is_searching: bool,
}

impl SearchState {
    /// Distance to the selection in miles, when known
    #[must_use]
    pub fn distance_miles(&self) -> Option<f64> {
        match (self.current_position, &self.selection) {
            (Some(origin), Some(selection)) => {
                Some(geo::distance_miles(origin, selection.coordinate))
            }
            _ => None,
        }
    }
}

/// Completion message from a background task
#[derive(Debug)]
pub(crate) enum SearchEvent {
    /// A suggestion fetch finished
    SuggestionsResolved {
        generation: u64,
        result: Result<Vec<PlaceCandidate>, LookupError>,
    },
    /// A weather fetch finished
    WeatherResolved {
        epoch: u64,
        result: Result<WeatherSnapshot, LookupError>,
    },
    /// The geolocator finished
    PositionResolved {
        result: Result<Coordinate, GeolocationError>,
    },
}

/// Which part of the state changed after applying one completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchUpdate {
    /// The suggestion list changed
    Suggestions,
    /// The weather for the selection changed
    Weather,
    /// The current position changed, along with any derived distance
    Position,
    /// A stale or canceled completion was dropped without touching state
    Discarded,
}

/// State container and scheduler for the location search widget
pub struct SearchController {
    state: SearchState,
    config: SearchConfig,
    suggestions: Arc<dyn SuggestionProvider>,
    weather: Arc<dyn WeatherProvider>,
    events_tx: mpsc::UnboundedSender<SearchEvent>,
    events_rx: mpsc::UnboundedReceiver<SearchEvent>,
    /// Parent token; cancelling it tears down every scheduled task
    shutdown: CancellationToken,
    /// Token of the currently scheduled suggestion fetch
    pending_fetch: Option<CancellationToken>,
    /// Monotonic id stamped onto suggestion fetches; completions carrying
    /// an older id are dropped
    generation: u64,
    /// Monotonic id of selections; weather from older epochs is stale
    epoch: u64,
}

impl SearchController {
    /// Create a controller over the given providers
    #[must_use]
    pub fn new(
        config: SearchConfig,
        suggestions: Arc<dyn SuggestionProvider>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: SearchState::default(),
            config,
            suggestions,
            weather,
            events_tx,
            events_rx,
            shutdown: CancellationToken::new(),
            pending_fetch: None,
            generation: 0,
            epoch: 0,
        }
    }

    /// Create a controller with the production Mapbox and OpenWeatherMap
    /// clients
    pub fn from_config(config: SearchConfig) -> crate::Result<Self> {
        let suggestions: Arc<dyn SuggestionProvider> = Arc::new(MapboxGeocoding::new(&config)?);
        let weather: Arc<dyn WeatherProvider> = Arc::new(OpenWeatherClient::new(&config)?);
        Ok(Self::new(config, suggestions, weather))
    }

    /// Read-only view of the current widget state
    #[must_use]
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Start the one-shot position lookup, reporting through the queue
    pub fn mount(&self, geolocator: Arc<Geolocator>) {
        let events = self.events_tx.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                () = shutdown.cancelled() => return,
                result = geolocator.position() => result,
            };
            let _ = events.send(SearchEvent::PositionResolved { result });
        });
    }

    /// Record the current position directly, recomputing the distance
    ///
    /// For hosts that already know where the user is.
    pub fn set_current_position(&mut self, position: Coordinate) {
        self.state.current_position = Some(position);
        self.recompute_distance();
    }

    /// Apply one edit of the input text
    ///
    /// Cancels whatever fetch was pending, then either clears the list
    /// (short input, or input that matches the accepted selection) or
    /// schedules a debounced fetch for the new text.
    pub fn set_query<S: Into<String>>(&mut self, text: S) {
        let text = text.into();
        if text == self.state.query {
            return;
        }

        self.invalidate_pending_fetch();
        self.state.query = text;

        // Editing away from the accepted place drops it together with
        // everything derived from it.
        if self
            .state
            .selection
            .as_ref()
            .is_some_and(|s| s.place_name != self.state.query)
        {
            self.clear_selection();
        }

        if self.state.query.chars().count() < self.config.min_query_len {
            self.state.suggestions.clear();
            self.state.is_searching = false;
            return;
        }

        if self
            .state
            .selection
            .as_ref()
            .is_some_and(|s| s.place_name == self.state.query)
        {
            // The text is the accepted place itself, nothing to look up.
            self.state.suggestions.clear();
            self.state.is_searching = false;
            return;
        }

        self.schedule_fetch();
    }

    /// Accept a suggestion
    ///
    /// Snaps the input text to the place name, clears the list, kicks off
    /// the weather fetch for the place and recomputes the distance.
    pub fn select_candidate(&mut self, candidate: PlaceCandidate) {
        debug!("selected '{}'", candidate.place_name);
        self.invalidate_pending_fetch();
        self.epoch += 1;
        self.state.query = candidate.place_name.clone();
        self.state.suggestions.clear();
        self.state.is_searching = false;
        self.state.weather = None;
        self.state.selection = Some(candidate.clone());
        self.recompute_distance();
        self.spawn_weather_fetch(candidate.coordinate);
    }

    /// Reset the widget to its initial state, keeping the current position
    pub fn clear(&mut self) {
        self.invalidate_pending_fetch();
        self.state.query.clear();
        self.state.suggestions.clear();
        self.state.is_searching = false;
        self.clear_selection();
    }

    /// Tear down every timer and in-flight fetch
    ///
    /// The state stays readable afterwards, but no background completion
    /// will be applied again.
    pub fn shutdown(&mut self) {
        debug!("search controller shutting down");
        self.invalidate_pending_fetch();
        self.shutdown.cancel();
        self.state.is_searching = false;
    }

    /// Wait for one background completion and fold it into the state
    ///
    /// Returns `None` once the controller has been shut down.
    pub async fn process_next(&mut self) -> Option<SearchUpdate> {
        let shutdown = self.shutdown.clone();
        let event = tokio::select! {
            biased;
            () = shutdown.cancelled() => return None,
            event = self.events_rx.recv() => event?,
        };
        Some(self.apply(event))
    }

    /// Fold in every completion that is already queued
    pub fn process_ready(&mut self) -> Vec<SearchUpdate> {
        let mut updates = Vec::new();
        if self.shutdown.is_cancelled() {
            return updates;
        }
        while let Ok(event) = self.events_rx.try_recv() {
            updates.push(self.apply(event));
        }
        updates
    }

    fn schedule_fetch(&mut self) {
        let generation = self.generation;
        let token = self.shutdown.child_token();
        self.pending_fetch = Some(token.clone());
        self.state.is_searching = true;

        let query = self.state.query.clone();
        let debounce = self.config.debounce();
        let provider = Arc::clone(&self.suggestions);
        let events = self.events_tx.clone();

        debug!("scheduling suggestion fetch #{generation} for '{query}'");

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => return,
                () = tokio::time::sleep(debounce) => {}
            }

            let result = provider.suggest(&query, &token).await;

            // A fetch superseded mid-flight commits nothing.
            if token.is_cancelled() {
                return;
            }
            let _ = events.send(SearchEvent::SuggestionsResolved { generation, result });
        });
    }

    fn spawn_weather_fetch(&self, at: Coordinate) {
        let epoch = self.epoch;
        let provider = Arc::clone(&self.weather);
        let events = self.events_tx.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                () = shutdown.cancelled() => return,
                result = provider.current_weather(at) => result,
            };
            let _ = events.send(SearchEvent::WeatherResolved { epoch, result });
        });
    }

    /// Cancel the scheduled fetch and advance the generation, so that a
    /// completion already sitting in the queue can no longer apply
    fn invalidate_pending_fetch(&mut self) {
        if let Some(token) = self.pending_fetch.take() {
            token.cancel();
        }
        self.generation += 1;
    }

    fn clear_selection(&mut self) {
        self.epoch += 1;
        self.state.selection = None;
        self.state.distance_km = None;
        self.state.weather = None;
    }

    /// Derive the distance from scratch; stale values are never patched
    fn recompute_distance(&mut self) {
        self.state.distance_km = match (self.state.current_position, &self.state.selection) {
            (Some(origin), Some(selection)) => {
                Some(geo::distance_km(origin, selection.coordinate))
            }
            _ => None,
        };
    }

    fn apply(&mut self, event: SearchEvent) -> SearchUpdate {
        match event {
            SearchEvent::SuggestionsResolved { generation, result } => {
                if generation != self.generation {
                    debug!("dropping suggestion fetch #{generation}, superseded");
                    return SearchUpdate::Discarded;
                }
                self.pending_fetch = None;
                self.state.is_searching = false;
                match result {
                    Ok(candidates) => {
                        self.state.suggestions = candidates;
                        SearchUpdate::Suggestions
                    }
                    Err(e) if e.is_canceled() => {
                        debug!("suggestion fetch #{generation} canceled");
                        SearchUpdate::Discarded
                    }
                    Err(e) => {
                        warn!("suggestion fetch failed: {e}");
                        self.state.suggestions.clear();
                        SearchUpdate::Suggestions
                    }
                }
            }
            SearchEvent::WeatherResolved { epoch, result } => {
                if epoch != self.epoch {
                    debug!("dropping weather for a stale selection");
                    return SearchUpdate::Discarded;
                }
                match result {
                    Ok(snapshot) => {
                        self.state.weather = Some(snapshot);
                        SearchUpdate::Weather
                    }
                    Err(e) if e.is_canceled() => SearchUpdate::Discarded,
                    Err(e) => {
                        warn!("weather fetch failed: {e}");
                        self.state.weather = None;
                        SearchUpdate::Weather
                    }
                }
            }
            SearchEvent::PositionResolved { result } => match result {
                Ok(position) => {
                    self.state.current_position = Some(position);
                    self.recompute_distance();
                    SearchUpdate::Position
                }
                Err(e) => {
                    warn!("geolocation failed: {e}");
                    SearchUpdate::Discarded
                }
            },
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StaticSuggestions(Vec<PlaceCandidate>);

    #[async_trait]
    impl SuggestionProvider for StaticSuggestions {
        async fn suggest(
            &self,
            _query: &str,
            cancel: &CancellationToken,
        ) -> Result<Vec<PlaceCandidate>, LookupError> {
            if cancel.is_cancelled() {
                return Err(LookupError::Canceled);
            }
            Ok(self.0.clone())
        }
    }

    struct NoWeather;

    #[async_trait]
    impl WeatherProvider for NoWeather {
        async fn current_weather(&self, _at: Coordinate) -> Result<WeatherSnapshot, LookupError> {
            Err(LookupError::fetch("weather", 503))
        }
    }

    fn paris() -> PlaceCandidate {
        PlaceCandidate::new("place.1", "Paris, France", Coordinate::new(48.8566, 2.3522))
    }

    fn controller() -> SearchController {
        SearchController::new(
            SearchConfig::new("pk.test", "owm.test"),
            Arc::new(StaticSuggestions(vec![paris()])),
            Arc::new(NoWeather),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_clears_without_fetching() {
        let mut c = controller();
        c.set_query("P");
        assert!(!c.state().is_searching);
        assert!(c.state().suggestions.is_empty());
        assert_eq!(c.process_ready(), vec![]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requerying_the_selected_name_issues_no_fetch() {
        let mut c = controller();
        c.select_candidate(paris());
        assert_eq!(c.state().query, "Paris, France");
        assert!(!c.state().is_searching);

        // Picking snapped the text to the place name; re-applying that
        // same text must neither fetch nor disturb the selection.
        c.set_query("Paris, France");
        assert!(!c.state().is_searching);
        assert!(c.state().suggestions.is_empty());
        assert!(c.state().selection.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggestions_landing_after_a_pick_are_discarded() {
        let mut c = controller();
        c.set_query("Par");
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(300)).await;
        tokio::task::yield_now().await;

        // The fetch has completed and its result is queued, but the user
        // picks before the host drains the queue.
        c.select_candidate(paris());

        let updates = c.process_ready();
        assert_eq!(updates.first(), Some(&SearchUpdate::Discarded));
        assert!(c.state().suggestions.is_empty());
        assert_eq!(c.state().selection, Some(paris()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_editing_away_from_selection_clears_it() {
        let mut c = controller();
        c.set_current_position(Coordinate::new(51.5074, -0.1278));
        c.select_candidate(paris());
        assert!(c.state().selection.is_some());
        assert!(c.state().distance_km.is_some());

        c.set_query("Paris, Franc");
        assert!(c.state().selection.is_none());
        assert!(c.state().distance_km.is_none());
        assert!(c.state().weather.is_none());
        assert!(c.state().is_searching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_distance_uses_current_position() {
        let mut c = controller();
        c.set_current_position(Coordinate::new(51.5074, -0.1278));
        c.select_candidate(paris());

        let km = c.state().distance_km.expect("distance should be derived");
        assert!((km - 343.5).abs() < 1.0, "got {km}");

        let miles = c.state().distance_miles().expect("miles should be derived");
        assert!((miles - km * 0.621_371).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distance_requires_a_position() {
        let mut c = controller();
        c.select_candidate(paris());
        assert!(c.state().distance_km.is_none());
        assert!(c.state().distance_miles().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_resets_everything_but_the_position() {
        let mut c = controller();
        c.set_current_position(Coordinate::new(51.5074, -0.1278));
        c.select_candidate(paris());
        c.clear();

        assert_eq!(c.state().query, "");
        assert!(c.state().suggestions.is_empty());
        assert!(c.state().selection.is_none());
        assert!(c.state().distance_km.is_none());
        assert!(c.state().weather.is_none());
        assert!(!c.state().is_searching);
        assert!(c.state().current_position.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_next_ends_after_shutdown() {
        let mut c = controller();
        c.shutdown();
        assert_eq!(c.process_next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_weather_failure_degrades_to_empty() {
        let mut c = controller();
        c.select_candidate(paris());

        // NoWeather answers 503; the state degrades instead of erroring.
        let update = c.process_next().await;
        assert_eq!(update, Some(SearchUpdate::Weather));
        assert!(c.state().weather.is_none());
    }
}
