pub mod city_map;
pub mod city_search;
pub mod weather_card;
pub mod weather_header;

// Re-export core Component trait
pub use tui_dispatch::Component;

pub use city_map::{CityMap, CityMapProps, MapViewport};
pub use city_search::{CitySearch, CitySearchProps};
pub use weather_card::{ERROR_ICON, WeatherCard, WeatherCardProps};
pub use weather_header::{WeatherHeader, WeatherHeaderProps, format_coords};

pub fn spinner_frame(tick: u32) -> char {
    match tick % 4 {
        0 => '|',
        1 => '/',
        2 => '-',
        _ => '\\',
    }
}
