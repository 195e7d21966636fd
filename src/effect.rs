//! Effects - side effects declared by the reducer

use crate::api::PageRequest;
use crate::state::UnitPreference;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// First page for a new query. Replaces any pending page task and may be
    /// debounced.
    SearchCities {
        generation: u64,
        request: PageRequest,
    },
    /// Next page of the current query
    LoadCityPage {
        generation: u64,
        request: PageRequest,
    },
    /// Fetch current weather for a city
    FetchWeather {
        request_id: u64,
        city: String,
        unit: UnitPreference,
    },
    /// Abort the in-flight weather task; the detail view is gone
    CancelWeather,
}
