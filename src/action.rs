//! Actions: user intents and async results, grouped by inferred category

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::{City, UnitPreference, WeatherSnapshot};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    // ===== Search category =====
    /// Search text changed: reset the list and fetch the first page
    SearchQueryChange(String),

    /// "Load More": fetch the next page unless one is already loading
    SearchLoadMore,

    /// Result: a page arrived for the given query generation
    SearchPageDidLoad { generation: u64, cities: Vec<City> },

    /// Result: a page request failed (logged, not shown)
    SearchPageDidError { generation: u64, error: String },

    /// Highlight a result row
    SearchSelect(usize),

    /// Open the highlighted city
    SearchOpenSelected,

    // ===== Detail category =====
    /// Navigate to the detail view for a city name
    DetailOpen(String),

    /// Navigate back to the list
    DetailClose,

    // ===== Weather category =====
    /// Re-issue the current weather request
    WeatherFetch,

    /// Result: weather loaded for the given request
    WeatherDidLoad {
        request_id: u64,
        snapshot: WeatherSnapshot,
    },

    /// Result: weather request failed
    WeatherDidError { request_id: u64, error: String },

    // ===== UI category =====
    /// Pick a unit system; re-fetches when it differs from the current one
    UiUnitSet(UnitPreference),

    /// Switch between metric and imperial
    UiToggleUnits,

    /// Force a re-render (cursor movement in the search input)
    Render,

    // ===== Uncategorized (global) =====
    /// Startup: load the first page for the initial query
    Init,

    /// Spinner frame
    Tick,

    Quit,
}
