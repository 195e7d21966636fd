//! Reducer - pure function: (state, action) -> DispatchResult

use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::state::{AppState, DetailState, UnitPreference};

/// The reducer handles all state transitions
pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        // ===== Search actions =====
        Action::Init => {
            let query = state.search.query.clone();
            search_from_scratch(state, query)
        }

        Action::SearchQueryChange(query) => search_from_scratch(state, query),

        Action::SearchLoadMore => match state.search.begin_next_page() {
            Some(request) => DispatchResult::changed_with(Effect::LoadCityPage {
                generation: state.search.generation,
                request,
            }),
            None => DispatchResult::unchanged(),
        },

        Action::SearchPageDidLoad { generation, cities } => {
            if state.search.apply_page(generation, cities) {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::SearchPageDidError { generation, .. } => {
            if state.search.fail_page(generation) {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::SearchSelect(index) => {
            if index < state.search.results.len() && index != state.search.selected {
                state.search.selected = index;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::SearchOpenSelected => {
            let Some(city) = state.search.selected_city() else {
                return DispatchResult::unchanged();
            };
            let name = city.name.clone();
            open_detail(state, name)
        }

        // ===== Detail actions =====
        Action::DetailOpen(city) => open_detail(state, city),

        Action::DetailClose => {
            if state.detail.take().is_none() {
                return DispatchResult::unchanged();
            }
            let mut effects = vec![Effect::CancelWeather];
            // Opened straight into a city: the list was never loaded
            if state.search.generation == 0 {
                let request = state.search.reset(state.search.query.clone());
                effects.push(Effect::SearchCities {
                    generation: state.search.generation,
                    request,
                });
            }
            DispatchResult::changed_with_many(effects)
        }

        // ===== Weather actions =====
        Action::WeatherFetch => {
            if state.detail.is_none() {
                return DispatchResult::unchanged();
            }
            let request_id = state.allocate_request_id();
            let Some(detail) = state.detail.as_mut() else {
                return DispatchResult::unchanged();
            };
            detail.begin_fetch(request_id);
            DispatchResult::changed_with(fetch_effect(detail))
        }

        Action::WeatherDidLoad {
            request_id,
            snapshot,
        } => match state
            .detail
            .as_mut()
            .map(|detail| detail.apply_weather(request_id, snapshot))
        {
            Some(true) => DispatchResult::changed(),
            _ => DispatchResult::unchanged(),
        },

        Action::WeatherDidError { request_id, error } => match state
            .detail
            .as_mut()
            .map(|detail| detail.fail_weather(request_id, error))
        {
            Some(true) => DispatchResult::changed(),
            _ => DispatchResult::unchanged(),
        },

        // ===== UI actions =====
        Action::UiUnitSet(unit) => set_unit(state, unit),

        Action::UiToggleUnits => {
            let Some(unit) = state.detail.as_ref().map(|detail| detail.unit.toggle()) else {
                return DispatchResult::unchanged();
            };
            set_unit(state, unit)
        }

        Action::Render => DispatchResult::changed(),

        // ===== Global actions =====
        Action::Tick => {
            if state.is_busy() {
                state.tick_count = state.tick_count.wrapping_add(1);
                DispatchResult::changed()
            } else if state.tick_count != 0 {
                state.tick_count = 0;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn search_from_scratch(state: &mut AppState, query: String) -> DispatchResult<Effect> {
    let request = state.search.reset(query);
    DispatchResult::changed_with(Effect::SearchCities {
        generation: state.search.generation,
        request,
    })
}

fn open_detail(state: &mut AppState, city: String) -> DispatchResult<Effect> {
    let request_id = state.allocate_request_id();
    let detail = DetailState::new(city, request_id);
    let effect = fetch_effect(&detail);
    state.detail = Some(detail);
    DispatchResult::changed_with(effect)
}

fn set_unit(state: &mut AppState, unit: UnitPreference) -> DispatchResult<Effect> {
    match state.detail.as_ref() {
        Some(detail) if detail.unit != unit => {}
        _ => return DispatchResult::unchanged(),
    }
    let request_id = state.allocate_request_id();
    let Some(detail) = state.detail.as_mut() else {
        return DispatchResult::unchanged();
    };
    detail.unit = unit;
    detail.begin_fetch(request_id);
    DispatchResult::changed_with(fetch_effect(detail))
}

fn fetch_effect(detail: &DetailState) -> Effect {
    Effect::FetchWeather {
        request_id: detail.request_id,
        city: detail.city.clone(),
        unit: detail.unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{City, LoadState, WeatherSnapshot, PAGE_SIZE};

    fn page(count: usize) -> Vec<City> {
        (0..count)
            .map(|i| City::new(format!("City {i}"), "Testland"))
            .collect()
    }

    #[test]
    fn test_init_fetches_first_page_for_initial_query() {
        let mut state = AppState::new("Paris");

        let result = reducer(&mut state, Action::Init);

        assert!(result.changed);
        assert_eq!(result.effects.len(), 1);
        assert!(matches!(
            &result.effects[0],
            Effect::SearchCities { generation: 1, request } if request.query == "Paris" && request.offset == 0
        ));
        assert_eq!(state.search.load, LoadState::Loading);
    }

    #[test]
    fn test_load_more_while_loading_is_noop() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        let before = state.search.clone();

        let result = reducer(&mut state, Action::SearchLoadMore);

        assert!(!result.changed);
        assert!(result.effects.is_empty());
        assert_eq!(state.search, before);
    }

    #[test]
    fn test_load_more_requests_next_offset() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        reducer(
            &mut state,
            Action::SearchPageDidLoad {
                generation: 1,
                cities: page(PAGE_SIZE as usize),
            },
        );

        let result = reducer(&mut state, Action::SearchLoadMore);

        assert!(result.changed);
        assert!(matches!(
            &result.effects[0],
            Effect::LoadCityPage { generation: 1, request } if request.offset == 20
        ));
    }

    #[test]
    fn test_query_change_discards_inflight_page() {
        let mut state = AppState::default();
        reducer(&mut state, Action::SearchQueryChange("Lon".into()));
        reducer(&mut state, Action::SearchQueryChange("Lond".into()));

        let result = reducer(
            &mut state,
            Action::SearchPageDidLoad {
                generation: 1,
                cities: page(20),
            },
        );

        assert!(!result.changed);
        assert!(state.search.results.is_empty());
        assert!(state.search.is_loading());
    }

    #[test]
    fn test_page_error_releases_gate() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);

        let result = reducer(
            &mut state,
            Action::SearchPageDidError {
                generation: 1,
                error: "timeout".into(),
            },
        );

        assert!(result.changed);
        assert!(!state.search.is_loading());
        assert!(state.search.has_more);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_open_selected_navigates_by_name() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        reducer(
            &mut state,
            Action::SearchPageDidLoad {
                generation: 1,
                cities: vec![City::new("Lyon", "France"), City::new("Paris", "France")],
            },
        );
        reducer(&mut state, Action::SearchSelect(1));

        let result = reducer(&mut state, Action::SearchOpenSelected);

        let detail = state.detail.as_ref().unwrap();
        assert_eq!(detail.city, "Paris");
        assert_eq!(detail.unit, UnitPreference::Metric);
        assert!(detail.weather.is_loading());
        assert!(matches!(
            &result.effects[0],
            Effect::FetchWeather { city, unit: UnitPreference::Metric, .. } if city == "Paris"
        ));
    }

    #[test]
    fn test_open_selected_without_results_is_noop() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::SearchOpenSelected);
        assert!(!result.changed);
        assert!(state.detail.is_none());
    }

    #[test]
    fn test_unit_change_refetches() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("London".into()));
        reducer(
            &mut state,
            Action::WeatherDidLoad {
                request_id: 1,
                snapshot: WeatherSnapshot {
                    city_name: "London".into(),
                    temperature: 15.4,
                    ..Default::default()
                },
            },
        );

        let result = reducer(&mut state, Action::UiUnitSet(UnitPreference::Imperial));

        assert!(result.changed);
        assert!(matches!(
            &result.effects[0],
            Effect::FetchWeather { request_id: 2, unit: UnitPreference::Imperial, city } if city == "London"
        ));
        let detail = state.detail.as_ref().unwrap();
        assert!(detail.weather.is_loading());
        assert!(detail.snapshot().is_none());
    }

    #[test]
    fn test_same_unit_is_noop() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("London".into()));

        let result = reducer(&mut state, Action::UiUnitSet(UnitPreference::Metric));

        assert!(!result.changed);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_unit_actions_ignored_on_search_screen() {
        let mut state = AppState::default();
        assert!(!reducer(&mut state, Action::UiToggleUnits).changed);
        assert!(!reducer(&mut state, Action::WeatherFetch).changed);
    }

    #[test]
    fn test_close_drops_detail_and_late_results() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("Oslo".into()));

        let result = reducer(&mut state, Action::DetailClose);
        assert!(result.changed);
        assert!(matches!(result.effects[0], Effect::CancelWeather));
        assert!(state.detail.is_none());

        let result = reducer(
            &mut state,
            Action::WeatherDidLoad {
                request_id: 1,
                snapshot: WeatherSnapshot::default(),
            },
        );
        assert!(!result.changed);
        assert!(state.detail.is_none());
    }

    #[test]
    fn test_close_after_deep_link_loads_list() {
        let mut state = AppState::new("Ber");
        reducer(&mut state, Action::DetailOpen("Berlin".into()));

        let result = reducer(&mut state, Action::DetailClose);

        assert_eq!(result.effects.len(), 2);
        assert!(matches!(
            &result.effects[1],
            Effect::SearchCities { generation: 1, request } if request.query == "Ber"
        ));
        assert!(state.search.is_loading());

        reducer(&mut state, Action::DetailOpen("Berlin".into()));
        let result = reducer(&mut state, Action::DetailClose);
        assert_eq!(result.effects, vec![Effect::CancelWeather]);
    }

    #[test]
    fn test_reopen_resets_unit_and_ignores_old_request() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("Oslo".into()));
        reducer(&mut state, Action::UiToggleUnits);
        reducer(&mut state, Action::DetailClose);
        reducer(&mut state, Action::DetailOpen("Oslo".into()));

        let detail = state.detail.as_ref().unwrap();
        assert_eq!(detail.unit, UnitPreference::Metric);
        assert_eq!(detail.request_id, 3);

        let result = reducer(
            &mut state,
            Action::WeatherDidError {
                request_id: 2,
                error: "late".into(),
            },
        );
        assert!(!result.changed);
    }

    #[test]
    fn test_tick_only_while_busy() {
        let mut state = AppState::default();
        assert!(!reducer(&mut state, Action::Tick).changed);

        reducer(&mut state, Action::Init);
        assert!(reducer(&mut state, Action::Tick).changed);
        assert_eq!(state.tick_count, 1);

        reducer(
            &mut state,
            Action::SearchPageDidLoad {
                generation: 1,
                cities: Vec::new(),
            },
        );
        assert!(reducer(&mut state, Action::Tick).changed);
        assert_eq!(state.tick_count, 0);
        assert!(!reducer(&mut state, Action::Tick).changed);
    }
}
