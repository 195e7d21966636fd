use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use tui_dispatch::{DataResource, EventKind};
use tui_dispatch_components::{
    StatusBar, StatusBarHint, StatusBarProps, StatusBarSection, StatusBarStyle,
};

use super::{
    CityMap, CityMapProps, Component, WeatherHeader, WeatherHeaderProps, spinner_frame,
    weather_header::HEADER_OVERHEAD,
};
use crate::action::Action;
use crate::icons::{self, WeatherCondition};
use crate::state::{DetailState, UnitPreference, WeatherSnapshot};

pub const ERROR_ICON: &str = "\u{26a0}\u{fe0f}";

pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch weather data. Please try again later.";

/// Below this width the map is dropped
const MAP_MIN_WIDTH: u16 = 80;

/// FIGlet rows for the terminus font
const HEADER_FONT_ROWS: u16 = 6;

pub struct WeatherCard;

pub struct WeatherCardProps<'a> {
    pub detail: &'a DetailState,
    pub tick_count: u32,
    pub is_focused: bool,
}

impl Component<Action> for WeatherCard {
    type Props<'a> = WeatherCardProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }

        match event {
            EventKind::Key(key) => match key.code {
                KeyCode::Char('r') | KeyCode::F(5) => Some(Action::WeatherFetch),
                KeyCode::Char('u') => Some(Action::UiToggleUnits),
                KeyCode::Char('c') => Some(Action::UiUnitSet(UnitPreference::Metric)),
                KeyCode::Char('f') => Some(Action::UiUnitSet(UnitPreference::Imperial)),
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                    Some(Action::DetailClose)
                }
                KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let detail = props.detail;
        let header_height = (HEADER_FONT_ROWS + HEADER_OVERHEAD).min(area.height / 3);
        let chunks = Layout::vertical([
            Constraint::Length(header_height), // City name
            Constraint::Length(1),             // Unit toggle
            Constraint::Min(1),                // Body
            Constraint::Length(1),             // Help bar
        ])
        .split(area);

        let snapshot = detail.snapshot();
        let mut header = WeatherHeader;
        header.render(
            frame,
            chunks[0],
            WeatherHeaderProps {
                city: snapshot.map_or(detail.city.as_str(), |s| s.city_name.as_str()),
                celsius: snapshot.map(|s| detail.unit.to_celsius(s.temperature)),
                coords: snapshot.map(|s| (s.lat, s.lon)),
            },
        );

        frame.render_widget(
            Paragraph::new(unit_toggle_line(detail.unit)).centered(),
            chunks[1],
        );

        match &detail.weather {
            DataResource::Loaded(weather) => render_ready(frame, chunks[2], weather, detail.unit),
            DataResource::Failed(error) => render_error(frame, chunks[2], error),
            DataResource::Loading | DataResource::Empty => {
                render_loading(frame, chunks[2], &detail.city, props.tick_count)
            }
        }

        let mut status_bar = StatusBar::new();
        <StatusBar as Component<Action>>::render(
            &mut status_bar,
            frame,
            chunks[3],
            StatusBarProps {
                left: StatusBarSection::empty(),
                center: StatusBarSection::hints(&[
                    StatusBarHint::new("u", "units"),
                    StatusBarHint::new("c/f", "°C/°F"),
                    StatusBarHint::new("r", "refresh"),
                    StatusBarHint::new("Esc", "back"),
                    StatusBarHint::new("q", "quit"),
                ]),
                right: StatusBarSection::empty(),
                style: StatusBarStyle::default(),
                is_focused: false,
            },
        );
    }
}

/// `[°C]  °F` with the active unit highlighted
pub fn unit_toggle_line(unit: UnitPreference) -> Line<'static> {
    let option = |candidate: UnitPreference| {
        if candidate == unit {
            Span::styled(
                format!("[{}]", candidate.symbol()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                format!(" {} ", candidate.symbol()),
                Style::default().fg(Color::DarkGray),
            )
        }
    };
    Line::from(vec![
        option(UnitPreference::Metric),
        Span::raw(" "),
        option(UnitPreference::Imperial),
    ])
}

fn render_loading(frame: &mut Frame, area: Rect, city: &str, tick_count: u32) {
    let [row] = Layout::vertical([Constraint::Length(1)])
        .flex(Flex::Center)
        .areas(area);
    let line = Line::from(Span::styled(
        format!("{} Loading weather for {city}...", spinner_frame(tick_count)),
        Style::default().fg(Color::Yellow),
    ))
    .centered();
    frame.render_widget(Paragraph::new(line), row);
}

fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let [rows] = Layout::vertical([Constraint::Length(4)])
        .flex(Flex::Center)
        .areas(area);
    let lines = vec![
        Line::from(Span::styled(
            format!("{ERROR_ICON} {FETCH_ERROR_MESSAGE}"),
            Style::default().fg(Color::Red).bold(),
        )),
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::DarkGray))),
        Line::default(),
        Line::from(Span::styled("Press r to retry", Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(
        Paragraph::new(lines).centered().wrap(Wrap { trim: true }),
        rows,
    );
}

fn render_ready(frame: &mut Frame, area: Rect, weather: &WeatherSnapshot, unit: UnitPreference) {
    let (info_area, map_area) = if area.width >= MAP_MIN_WIDTH {
        let [info, map] =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
                .areas(area);
        (info, Some(map))
    } else {
        (area, None)
    };

    let condition = WeatherCondition::from_icon(&weather.icon_code);
    let lines = vec![
        Line::from(Span::styled(
            icons::weather_glyph(&weather.icon_code),
            Style::default().fg(condition.color()),
        )),
        Line::default(),
        Line::from(Span::styled(
            unit.format(weather.temperature),
            Style::default().fg(Color::White).bold(),
        )),
        Line::from(Span::styled(
            weather.description.clone(),
            Style::default().fg(condition.color()),
        )),
        Line::default(),
        Line::from(Span::styled(
            weather.icon_url(),
            Style::default().fg(Color::DarkGray).italic(),
        )),
    ];
    let [info_rows] = Layout::vertical([Constraint::Length(lines.len() as u16)])
        .flex(Flex::Center)
        .areas(info_area);
    frame.render_widget(
        Paragraph::new(lines).centered().wrap(Wrap { trim: true }),
        info_rows,
    );

    if let Some(map_area) = map_area {
        let mut map = CityMap;
        map.render(
            frame,
            map_area,
            CityMapProps {
                label: &weather.city_name,
                lat: weather.lat,
                lon: weather.lon,
            },
        );
    }
}
