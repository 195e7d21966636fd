use artbox::{
    Alignment as ArtAlignment, Color as ArtColor, Fill, LinearGradient, Renderer, fonts,
    integrations::ratatui::ArtBox,
};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::Component;
use crate::action::Action;

/// Rows the header needs besides the FIGlet name: spacer and coordinates
pub const HEADER_OVERHEAD: u16 = 2;

pub struct WeatherHeader;

pub struct WeatherHeaderProps<'a> {
    pub city: &'a str,
    /// Celsius, whatever unit is displayed
    pub celsius: Option<f64>,
    pub coords: Option<(f64, f64)>,
}

/// Gradient endpoints keyed on temperature
fn gradient_colors(celsius: Option<f64>) -> (ArtColor, ArtColor) {
    match celsius {
        Some(t) if t < 0.0 => (ArtColor::rgb(150, 200, 255), ArtColor::rgb(200, 230, 255)),
        Some(t) if t < 15.0 => (ArtColor::rgb(100, 180, 255), ArtColor::rgb(150, 220, 200)),
        Some(t) if t < 25.0 => (ArtColor::rgb(100, 200, 150), ArtColor::rgb(255, 220, 100)),
        Some(t) if t < 35.0 => (ArtColor::rgb(255, 180, 80), ArtColor::rgb(255, 120, 80)),
        Some(_) => (ArtColor::rgb(255, 100, 80), ArtColor::rgb(255, 60, 60)),
        None => (ArtColor::rgb(180, 180, 180), ArtColor::rgb(220, 220, 220)),
    }
}

/// `48.85°N, 2.35°E` style coordinates
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    let ew = if lon < 0.0 { 'W' } else { 'E' };
    format!("{:.2}°{ns}, {:.2}°{ew}", lat.abs(), lon.abs())
}

impl Component<Action> for WeatherHeader {
    type Props<'a> = WeatherHeaderProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Fill(1),   // FIGlet city name
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Coordinates
        ])
        .split(area);

        let (from, to) = gradient_colors(props.celsius);
        let renderer = Renderer::new(fonts::stack(&["terminus", "miniwi"]))
            .with_plain_fallback()
            .with_alignment(ArtAlignment::Center)
            .with_fill(Fill::Linear(LinearGradient::horizontal(from, to)));

        frame.render_widget(ArtBox::new(&renderer, props.city), chunks[0]);

        if let Some((lat, lon)) = props.coords {
            let coords_line = Line::from(Span::styled(
                format_coords(lat, lon),
                Style::default().fg(Color::DarkGray),
            ))
            .centered();
            frame.render_widget(Paragraph::new(coords_line), chunks[2]);
        }
    }
}
