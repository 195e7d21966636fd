use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{
    BaseStyle, Padding, ScrollbarStyle, SelectList, SelectListBehavior, SelectListProps,
    SelectListStyle, SelectionStyle, StatusBar, StatusBarHint, StatusBarProps, StatusBarSection,
    StatusBarStyle, TextInput, TextInputProps, TextInputStyle, highlight_substring,
};

use super::{Component, spinner_frame};
use crate::action::Action;
use crate::state::{ListFooter, SearchState};

/// Width of the city name column
const NAME_COLUMN: usize = 32;

pub struct CitySearch {
    input: TextInput,
    list: SelectList,
}

pub struct CitySearchProps<'a> {
    pub search: &'a SearchState,
    pub tick_count: u32,
    pub is_focused: bool,
}

impl Default for CitySearch {
    fn default() -> Self {
        Self {
            input: TextInput::new(),
            list: SelectList::new(),
        }
    }
}

impl CitySearch {
    pub fn new() -> Self {
        Self::default()
    }

    fn result_items(search: &SearchState) -> Vec<Line<'static>> {
        let base = Style::default().fg(Color::Reset);
        let highlight = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        search
            .results
            .iter()
            .map(|city| {
                let mut line = highlight_substring(&city.name, search.query.trim(), base, highlight);
                let pad = NAME_COLUMN.saturating_sub(city.name.chars().count()).max(1);
                line.spans.push(Span::raw(" ".repeat(pad)));
                line.spans
                    .push(Span::styled(city.country.clone(), Style::default().fg(Color::DarkGray)));
                line
            })
            .collect()
    }

    fn input_style() -> TextInputStyle {
        TextInputStyle {
            base: BaseStyle {
                border: None,
                padding: Padding::all(1),
                bg: Some(Color::Rgb(50, 50, 60)),
                fg: None,
            },
            placeholder_style: None,
            cursor_style: None,
        }
    }

    fn list_style() -> SelectListStyle {
        SelectListStyle {
            base: BaseStyle {
                border: None,
                padding: Padding::xy(1, 0),
                bg: None,
                fg: None,
            },
            selection: SelectionStyle::default(),
            scrollbar: ScrollbarStyle::default(),
        }
    }
}

/// Text shown under the result rows
pub fn footer_line(footer: ListFooter, tick_count: u32) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    match footer {
        ListFooter::Hidden => Line::from(Span::styled("No cities found", dim)),
        ListFooter::Loading | ListFooter::LoadMore { busy: true } => Line::from(Span::styled(
            format!("{} Loading...", spinner_frame(tick_count)),
            Style::default().fg(Color::Yellow),
        )),
        ListFooter::LoadMore { busy: false } => Line::from(vec![
            Span::styled("Load More", Style::default().fg(Color::Cyan).bold()),
            Span::styled(" (PgDn)", dim),
        ]),
        ListFooter::Exhausted => Line::from(Span::styled("No more cities to load", dim)),
    }
}

impl Component<Action> for CitySearch {
    type Props<'a> = CitySearchProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }

        let EventKind::Key(key) = event else {
            return Vec::new();
        };

        let search = props.search;
        match key.code {
            KeyCode::Esc => return vec![Action::Quit],
            KeyCode::Enter => {
                if search.selected_city().is_some() {
                    return vec![Action::SearchOpenSelected];
                }
                return Vec::new();
            }
            KeyCode::PageDown => return vec![Action::SearchLoadMore],
            KeyCode::Down if search.selected + 1 >= search.results.len() => {
                // Scrolling past the last row pulls the next page
                if search.has_more && !search.is_loading() {
                    return vec![Action::SearchLoadMore];
                }
                return Vec::new();
            }
            KeyCode::Down | KeyCode::Up => {
                let items = Self::result_items(search);
                let list_props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: search.selected,
                    is_focused: true,
                    style: Self::list_style(),
                    behavior: SelectListBehavior::default(),
                    on_select: Action::SearchSelect,
                    render_item: &|item| item.clone(),
                };
                return self
                    .list
                    .handle_event(event, list_props)
                    .into_iter()
                    .collect();
            }
            _ => {}
        }

        // All other keys go to the input
        let input_props = TextInputProps {
            value: &search.query,
            placeholder: "Search for a city...",
            is_focused: true,
            style: Self::input_style(),
            on_change: Action::SearchQueryChange,
            on_submit: |_| Action::SearchOpenSelected,
            on_cursor_move: Some(|_| Action::Render),
        };
        self.input
            .handle_event(event, input_props)
            .into_iter()
            .collect()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Input
            Constraint::Length(1), // Column header
            Constraint::Min(1),    // Results
            Constraint::Length(1), // Footer
            Constraint::Length(1), // Help bar
        ])
        .split(area);

        let title = Line::from(Span::styled(
            "City Weather",
            Style::default().fg(Color::Cyan).bold(),
        ))
        .centered();
        frame.render_widget(Paragraph::new(title), chunks[0]);

        let search = props.search;
        let input_props = TextInputProps {
            value: &search.query,
            placeholder: "Search for a city...",
            is_focused: props.is_focused,
            style: Self::input_style(),
            on_change: Action::SearchQueryChange,
            on_submit: |_| Action::SearchOpenSelected,
            on_cursor_move: Some(|_| Action::Render),
        };
        self.input.render(frame, chunks[1], input_props);

        let header = Line::from(vec![
            Span::raw(" "),
            Span::styled(format!("{:<width$}", "City Name", width = NAME_COLUMN), Style::default().bold()),
            Span::raw(" "),
            Span::styled("Country", Style::default().bold()),
        ]);
        frame.render_widget(Paragraph::new(header), chunks[2]);

        let items = Self::result_items(search);
        let list_props = SelectListProps {
            items: &items,
            count: items.len(),
            selected: search.selected,
            is_focused: props.is_focused,
            style: Self::list_style(),
            behavior: SelectListBehavior::default(),
            on_select: Action::SearchSelect,
            render_item: &|item| item.clone(),
        };
        self.list.render(frame, chunks[3], list_props);

        let footer = footer_line(search.footer(), props.tick_count).centered();
        frame.render_widget(Paragraph::new(footer), chunks[4]);

        let mut status_bar = StatusBar::new();
        <StatusBar as Component<Action>>::render(
            &mut status_bar,
            frame,
            chunks[5],
            StatusBarProps {
                left: StatusBarSection::empty(),
                center: StatusBarSection::hints(&[
                    StatusBarHint::new("Up/Down", "select"),
                    StatusBarHint::new("PgDn", "more"),
                    StatusBarHint::new("Enter", "weather"),
                    StatusBarHint::new("Esc", "quit"),
                ]),
                right: StatusBarSection::empty(),
                style: StatusBarStyle::default(),
                is_focused: false,
            },
        );
    }
}
