//! Weather glyphs keyed by OpenWeather icon codes
//!
//! Icon codes look like `01d` / `10n`: two digits for the condition and a
//! day/night suffix. The same code builds the upstream image URL.

use ratatui::style::Color;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Weather condition categories
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherCondition {
    ClearSky,
    PartlyCloudy,
    Cloudy,
    Showers,
    Rain,
    Thunderstorm,
    Snow,
    Mist,
    Unknown,
}

impl WeatherCondition {
    /// Map an OpenWeather icon code to a condition
    pub fn from_icon(code: &str) -> Self {
        match code.get(..2) {
            Some("01") => WeatherCondition::ClearSky,
            Some("02") => WeatherCondition::PartlyCloudy,
            Some("03") | Some("04") => WeatherCondition::Cloudy,
            Some("09") => WeatherCondition::Showers,
            Some("10") => WeatherCondition::Rain,
            Some("11") => WeatherCondition::Thunderstorm,
            Some("13") => WeatherCondition::Snow,
            Some("50") => WeatherCondition::Mist,
            _ => WeatherCondition::Unknown,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            WeatherCondition::ClearSky => "\u{2600}\u{fe0f}",
            WeatherCondition::PartlyCloudy => "\u{26c5}",
            WeatherCondition::Cloudy | WeatherCondition::Unknown => "\u{2601}\u{fe0f}",
            WeatherCondition::Showers => "\u{1f326}\u{fe0f}",
            WeatherCondition::Rain => "\u{1f327}\u{fe0f}",
            WeatherCondition::Thunderstorm => "\u{26c8}\u{fe0f}",
            WeatherCondition::Snow => "\u{2744}\u{fe0f}",
            WeatherCondition::Mist => "\u{1f32b}\u{fe0f}",
        }
    }

    pub fn color(self) -> Color {
        match self {
            WeatherCondition::ClearSky => Color::Yellow,
            WeatherCondition::PartlyCloudy => Color::Rgb(220, 210, 150),
            WeatherCondition::Cloudy | WeatherCondition::Unknown => Color::Rgb(170, 170, 185),
            WeatherCondition::Showers | WeatherCondition::Rain => Color::Rgb(100, 160, 255),
            WeatherCondition::Thunderstorm => Color::Rgb(200, 160, 255),
            WeatherCondition::Snow => Color::White,
            WeatherCondition::Mist => Color::Rgb(150, 150, 160),
        }
    }
}

pub fn is_night(code: &str) -> bool {
    code.ends_with('n')
}

/// Glyph for the given icon code. Clear nights get a moon.
pub fn weather_glyph(code: &str) -> &'static str {
    match WeatherCondition::from_icon(code) {
        WeatherCondition::ClearSky if is_night(code) => "\u{1f319}",
        condition => condition.emoji(),
    }
}

/// Upstream image URL for the icon
pub fn icon_url(code: &str) -> String {
    format!("{ICON_BASE_URL}/{code}@2x.png")
}
