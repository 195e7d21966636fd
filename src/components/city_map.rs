use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Stylize},
    symbols::Marker,
    text::Span,
    widgets::{
        Block,
        canvas::{Canvas, Map, MapResolution, Points},
    },
};

use super::Component;
use crate::action::Action;

/// Degrees of longitude either side of the marker
pub const DEFAULT_HALF_SPAN: f64 = 30.0;

/// Visible window of the world map, in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapViewport {
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl MapViewport {
    /// Window centred on the coordinate, shifted to stay on the map.
    /// Latitude spans half as many degrees as longitude.
    pub fn centered(lat: f64, lon: f64, half_span: f64) -> Self {
        Self {
            x_bounds: clamp_window(lon, half_span, -180.0, 180.0),
            y_bounds: clamp_window(lat, half_span / 2.0, -90.0, 90.0),
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.x_bounds[0]..=self.x_bounds[1]).contains(&lon)
            && (self.y_bounds[0]..=self.y_bounds[1]).contains(&lat)
    }
}

fn clamp_window(center: f64, half: f64, min: f64, max: f64) -> [f64; 2] {
    let half = half.min((max - min) / 2.0);
    let center = center.clamp(min + half, max - half);
    [center - half, center + half]
}

pub struct CityMap;

pub struct CityMapProps<'a> {
    pub label: &'a str,
    pub lat: f64,
    pub lon: f64,
}

impl Component<Action> for CityMap {
    type Props<'a> = CityMapProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let viewport = MapViewport::centered(props.lat, props.lon, DEFAULT_HALF_SPAN);
        let (lat, lon) = (props.lat, props.lon);
        let label = format!(" {}", props.label);

        let canvas = Canvas::default()
            .block(Block::bordered().title(" Map ").fg(Color::DarkGray))
            .marker(Marker::Braille)
            .x_bounds(viewport.x_bounds)
            .y_bounds(viewport.y_bounds)
            .paint(move |ctx| {
                ctx.draw(&Map {
                    color: Color::Rgb(90, 140, 110),
                    resolution: MapResolution::High,
                });
                ctx.layer();
                ctx.draw(&Points {
                    coords: &[(lon, lat)],
                    color: Color::Red,
                });
                ctx.print(lon, lat, Span::from(label.clone()).red().bold());
            });
        frame.render_widget(canvas, area);
    }
}
