//! Application state - single source of truth
//!
//! Each screen owns an explicit state machine. `SearchState` pages through
//! the city directory; `DetailState` tracks one weather lookup. The reducer
//! only wires actions to the transitions defined here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;

use crate::api::PageRequest;
use crate::icons;

/// Records requested per directory page.
pub const PAGE_SIZE: u32 = 20;

/// Spinner frame interval while any fetch is pending.
pub const SPINNER_TICK_MS: u64 = 120;

/// A city record from the directory
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct City {
    pub name: String,
    pub country: String,
}

impl City {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }
}

/// Gate for the city list: at most one page request in flight
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
}

/// What sits under the result rows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListFooter {
    Hidden,
    /// First page of a query is still pending
    Loading,
    /// More pages may exist; `busy` while the next one is loading
    LoadMore { busy: bool },
    /// Last page reached
    Exhausted,
}

/// Search text, accumulated results and pagination cursor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<City>,
    /// Pages successfully loaded for the current query
    pub cursor: u32,
    pub load: LoadState,
    pub has_more: bool,
    /// Query epoch. Page results tagged with an older epoch are dropped.
    pub generation: u64,
    pub selected: usize,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            cursor: 0,
            load: LoadState::Idle,
            has_more: true,
            generation: 0,
            selected: 0,
        }
    }
}

impl SearchState {
    /// Replace the query and start over from the first page.
    ///
    /// Clears results, rewinds the cursor, re-arms `has_more` and opens a new
    /// generation, so whatever request was in flight can no longer land. The
    /// returned request is the one fresh fetch for the new query.
    pub fn reset(&mut self, query: String) -> PageRequest {
        self.query = query;
        self.results.clear();
        self.cursor = 0;
        self.has_more = true;
        self.selected = 0;
        self.generation = self.generation.wrapping_add(1);
        self.load = LoadState::Loading;
        self.page_request()
    }

    /// Claim the load gate for the next page.
    ///
    /// Returns `None` without touching state while a page is already loading
    /// or once the directory is exhausted.
    pub fn begin_next_page(&mut self) -> Option<PageRequest> {
        if self.load == LoadState::Loading || !self.has_more {
            return None;
        }
        self.load = LoadState::Loading;
        Some(self.page_request())
    }

    /// Append a loaded page. Returns false if the page belongs to a stale
    /// generation and was ignored.
    pub fn apply_page(&mut self, generation: u64, cities: Vec<City>) -> bool {
        if !self.accepts(generation) {
            return false;
        }
        self.has_more = cities.len() == PAGE_SIZE as usize;
        self.results.extend(cities);
        self.cursor += 1;
        self.load = LoadState::Idle;
        true
    }

    /// Release the gate after a failed page. Results, cursor and `has_more`
    /// are left alone so the same page can be requested again.
    pub fn fail_page(&mut self, generation: u64) -> bool {
        if !self.accepts(generation) {
            return false;
        }
        self.load = LoadState::Idle;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }

    pub fn footer(&self) -> ListFooter {
        if self.results.is_empty() && self.is_loading() {
            ListFooter::Loading
        } else if self.has_more {
            ListFooter::LoadMore {
                busy: self.is_loading(),
            }
        } else if !self.results.is_empty() {
            ListFooter::Exhausted
        } else {
            ListFooter::Hidden
        }
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.results.get(self.selected)
    }

    fn accepts(&self, generation: u64) -> bool {
        generation == self.generation && self.load == LoadState::Loading
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.query.clone(), self.cursor)
    }
}

/// Unit system requested from the weather API
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum UnitPreference {
    #[default]
    Metric,
    Imperial,
}

impl UnitPreference {
    pub fn toggle(&self) -> Self {
        match self {
            UnitPreference::Metric => UnitPreference::Imperial,
            UnitPreference::Imperial => UnitPreference::Metric,
        }
    }

    /// Value of the `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            UnitPreference::Metric => "metric",
            UnitPreference::Imperial => "imperial",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnitPreference::Metric => "°C",
            UnitPreference::Imperial => "°F",
        }
    }

    /// Rounds to the nearest whole degree. The value is already in this unit.
    pub fn format(&self, temperature: f64) -> String {
        format!("{}{}", temperature.round() as i64, self.symbol())
    }

    /// Temperature in Celsius, for colour choices only
    pub fn to_celsius(&self, temperature: f64) -> f64 {
        match self {
            UnitPreference::Metric => temperature,
            UnitPreference::Imperial => (temperature - 32.0) * 5.0 / 9.0,
        }
    }
}

/// Current weather for one city, replaced wholesale on every fetch
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeatherSnapshot {
    pub city_name: String,
    pub temperature: f64,
    pub description: String,
    pub icon_code: String,
    pub lat: f64,
    pub lon: f64,
}

impl WeatherSnapshot {
    pub fn icon_url(&self) -> String {
        icons::icon_url(&self.icon_code)
    }
}

/// State of one detail view. Built fresh on every navigation.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct DetailState {
    /// City name carried over from the list
    pub city: String,
    pub unit: UnitPreference,
    /// Lifecycle: Loading → Loaded/Failed, back to Loading on parameter change
    pub weather: DataResource<WeatherSnapshot>,
    /// Id of the latest request; other responses are dropped
    pub request_id: u64,
}

impl DetailState {
    pub fn new(city: String, request_id: u64) -> Self {
        Self {
            city,
            unit: UnitPreference::default(),
            weather: DataResource::Loading,
            request_id,
        }
    }

    pub fn begin_fetch(&mut self, request_id: u64) {
        self.request_id = request_id;
        self.weather = DataResource::Loading;
    }

    pub fn apply_weather(&mut self, request_id: u64, snapshot: WeatherSnapshot) -> bool {
        if request_id != self.request_id {
            return false;
        }
        self.weather = DataResource::Loaded(snapshot);
        true
    }

    pub fn fail_weather(&mut self, request_id: u64, error: String) -> bool {
        if request_id != self.request_id {
            return false;
        }
        self.weather = DataResource::Failed(error);
        true
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.weather.data()
    }
}

/// Which screen is showing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Search,
    Detail,
}

/// Application state - everything the UI needs to render
#[derive(Clone, Debug, tui_dispatch::DebugState, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    #[debug(section = "Search", label = "State", debug_fmt)]
    pub search: SearchState,

    /// Present while the detail view is open
    #[debug(section = "Detail", label = "View", debug_fmt)]
    pub detail: Option<DetailState>,

    /// Last weather request id handed out
    #[debug(skip)]
    pub next_request_id: u64,

    /// Spinner frame counter
    #[debug(skip)]
    pub tick_count: u32,
}

impl AppState {
    /// Create state with the given initial search text
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            search: SearchState {
                query: query.into(),
                ..SearchState::default()
            },
            detail: None,
            next_request_id: 0,
            tick_count: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        if self.detail.is_some() {
            Screen::Detail
        } else {
            Screen::Search
        }
    }

    pub fn allocate_request_id(&mut self) -> u64 {
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.next_request_id
    }

    pub fn is_busy(&self) -> bool {
        self.search.is_loading()
            || self
                .detail
                .as_ref()
                .is_some_and(|detail| detail.weather.is_loading())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cities(prefix: &str, count: usize) -> Vec<City> {
        (0..count)
            .map(|i| City::new(format!("{prefix}{i}"), "France"))
            .collect()
    }

    #[test]
    fn test_reset_clears_everything_and_opens_generation() {
        let mut search = SearchState::default();
        search.reset("Par".into());
        assert!(search.apply_page(1, cities("a", 20)));
        search.selected = 7;

        let request = search.reset("Paris".into());

        assert!(search.results.is_empty());
        assert_eq!(search.cursor, 0);
        assert!(search.has_more);
        assert_eq!(search.selected, 0);
        assert_eq!(search.generation, 2);
        assert!(search.is_loading());
        assert_eq!(request.offset, 0);
        assert_eq!(request.query, "Paris");
    }

    #[test]
    fn test_pages_append_in_request_order() {
        let mut search = SearchState::default();
        search.reset(String::new());
        let first = cities("a", 20);
        let second = cities("b", 20);
        let third = cities("c", 3);

        assert!(search.apply_page(1, first.clone()));
        let request = search.begin_next_page().unwrap();
        assert_eq!(request.offset, 20);
        assert!(search.apply_page(1, second.clone()));
        let request = search.begin_next_page().unwrap();
        assert_eq!(request.offset, 40);
        assert!(search.apply_page(1, third.clone()));

        let expected: Vec<City> = first.into_iter().chain(second).chain(third).collect();
        assert_eq!(search.results, expected);
        assert_eq!(search.cursor, 3);
        assert!(!search.has_more);
    }

    #[test]
    fn test_begin_next_page_is_gated_while_loading() {
        let mut search = SearchState::default();
        search.reset("Oslo".into());
        let before = search.clone();

        assert!(search.begin_next_page().is_none());
        assert_eq!(search, before);
    }

    #[test]
    fn test_begin_next_page_stops_when_exhausted() {
        let mut search = SearchState::default();
        search.reset("Oslo".into());
        search.apply_page(1, cities("o", 2));

        assert!(search.begin_next_page().is_none());
        assert!(!search.is_loading());
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut search = SearchState::default();
        search.reset("L".into());
        search.reset("Lo".into());

        assert!(!search.apply_page(1, cities("l", 20)));
        assert!(search.results.is_empty());
        assert!(search.is_loading());

        assert!(!search.fail_page(1));
        assert!(search.is_loading());
    }

    #[test]
    fn test_fail_page_keeps_results_and_has_more() {
        let mut search = SearchState::default();
        search.reset(String::new());
        search.apply_page(1, cities("a", 20));
        search.begin_next_page();

        assert!(search.fail_page(1));
        assert_eq!(search.results.len(), 20);
        assert_eq!(search.cursor, 1);
        assert!(search.has_more);
        assert!(!search.is_loading());
        // The same page can be requested again
        assert_eq!(search.begin_next_page().unwrap().offset, 20);
    }

    #[test]
    fn test_has_more_tracks_last_page_only() {
        let mut search = SearchState::default();
        search.reset(String::new());
        search.apply_page(1, cities("a", 20));
        assert!(search.has_more);
        search.begin_next_page();
        search.apply_page(1, cities("b", 19));
        assert!(!search.has_more);
    }

    #[test]
    fn test_footer_states() {
        let mut search = SearchState::default();
        search.reset("x".into());
        assert_eq!(search.footer(), ListFooter::Loading);

        search.apply_page(1, cities("x", 20));
        assert_eq!(search.footer(), ListFooter::LoadMore { busy: false });

        search.begin_next_page();
        assert_eq!(search.footer(), ListFooter::LoadMore { busy: true });

        search.apply_page(1, cities("y", 1));
        assert_eq!(search.footer(), ListFooter::Exhausted);

        search.reset("nothing".into());
        search.apply_page(2, Vec::new());
        assert_eq!(search.footer(), ListFooter::Hidden);
    }

    #[test]
    fn test_unit_format_rounds() {
        assert_eq!(UnitPreference::Metric.format(15.4), "15°C");
        assert_eq!(UnitPreference::Metric.format(15.5), "16°C");
        assert_eq!(UnitPreference::Imperial.format(59.7), "60°F");
        assert_eq!(UnitPreference::Metric.format(-0.4), "0°C");
        assert_eq!(UnitPreference::Metric.format(-3.6), "-4°C");
    }

    #[test]
    fn test_unit_query_values() {
        assert_eq!(UnitPreference::Metric.as_query(), "metric");
        assert_eq!(UnitPreference::Imperial.as_query(), "imperial");
        assert_eq!(UnitPreference::Metric.toggle(), UnitPreference::Imperial);
    }

    #[test]
    fn test_detail_drops_mismatched_responses() {
        let mut detail = DetailState::new("London".into(), 1);
        detail.begin_fetch(2);

        assert!(!detail.apply_weather(1, WeatherSnapshot::default()));
        assert!(detail.weather.is_loading());
        assert!(!detail.fail_weather(1, "late".into()));
        assert!(detail.weather.is_loading());

        assert!(detail.fail_weather(2, "boom".into()));
        assert!(detail.weather.is_failed());
        assert!(detail.snapshot().is_none());
    }

    #[test]
    fn test_screen_follows_detail() {
        let mut state = AppState::default();
        assert_eq!(state.screen(), Screen::Search);
        let id = state.allocate_request_id();
        state.detail = Some(DetailState::new("Rome".into(), id));
        assert_eq!(state.screen(), Screen::Detail);
    }
}
