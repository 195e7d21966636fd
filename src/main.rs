//! City weather TUI: browse the city directory, open a city, read its weather

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use cityweather::action::Action;
use cityweather::api::{API_KEY_ENV, DEFAULT_DIRECTORY_URL, DEFAULT_WEATHER_URL};
use cityweather::components::{
    CitySearch, CitySearchProps, Component, WeatherCard, WeatherCardProps,
};
use cityweather::config::{RuntimeConfig, Services};
use cityweather::effect::Effect;
use cityweather::logging;
use cityweather::reducer::reducer;
use cityweather::state::{AppState, SPINNER_TICK_MS, Screen};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend, layout::Rect};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventContext, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

/// Search a world city directory and show current weather
#[derive(Parser, Debug)]
#[command(name = "cityweather")]
#[command(about = "Browse cities and check their current weather")]
struct Args {
    /// Initial search text
    #[arg(long, short, default_value = "")]
    query: String,

    /// Open the weather view for this city straight away
    #[arg(long, short)]
    city: Option<String>,

    /// Wait this long after the last keystroke before searching (0 = off)
    #[arg(long, default_value = "0")]
    debounce_ms: u64,

    /// Retry failed requests this many times (0 = off)
    #[arg(long, default_value = "0")]
    retries: u32,

    /// City directory records endpoint
    #[arg(long, default_value = DEFAULT_DIRECTORY_URL)]
    directory_url: String,

    /// Current weather endpoint
    #[arg(long, default_value = DEFAULT_WEATHER_URL)]
    weather_url: String,

    /// Environment variable holding the weather API key
    #[arg(long, default_value = API_KEY_ENV)]
    api_key_env: String,

    /// Write logs here (filter with CITYWEATHER_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

impl Args {
    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            directory_url: self.directory_url.clone(),
            weather_url: self.weather_url.clone(),
            api_key_env: self.api_key_env.clone(),
            log_file: self.log_file.clone(),
            ..RuntimeConfig::default()
        }
        .with_debounce_ms(self.debounce_ms)
        .with_retries(self.retries)
    }
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum CityComponentId {
    Search,
    Detail,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum CityContext {
    Main,
    Detail,
}

impl EventRoutingState<CityComponentId, CityContext> for AppState {
    fn focused(&self) -> Option<CityComponentId> {
        match self.screen() {
            Screen::Search => Some(CityComponentId::Search),
            Screen::Detail => Some(CityComponentId::Detail),
        }
    }

    fn modal(&self) -> Option<CityComponentId> {
        None
    }

    fn binding_context(&self, id: CityComponentId) -> CityContext {
        match id {
            CityComponentId::Search => CityContext::Main,
            CityComponentId::Detail => CityContext::Detail,
        }
    }

    fn default_context(&self) -> CityContext {
        CityContext::Main
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    let config = args.runtime_config();
    logging::init(config.log_file.as_deref())?;

    let Args {
        query,
        city,
        debug: debug_args,
        ..
    } = args;

    let debug = DebugSession::new(debug_args);

    // Export JSON schemas if requested
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(query))
        })
        .await
        .map_err(debug_error)?;

    let replay_actions = debug.load_replay_items().map_err(debug_error)?;

    let (middleware, action_recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let init_action = match city {
        Some(city) => Action::DetailOpen(city),
        None => Action::Init,
    };
    tracing::info!(
        directory = %config.directory_url,
        debounce_ms = config.search_debounce.as_millis() as u64,
        retries = config.retry.as_ref().map_or(0, |r| r.max_retries),
        "starting"
    );

    // ===== Terminal setup =====
    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(
        &mut terminal,
        &debug,
        store,
        &config,
        init_action,
        replay_actions,
    )
    .await;

    // ===== Cleanup =====
    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug
        .save_actions(action_recorder.as_ref())
        .map_err(debug_error)?;

    Ok(())
}

struct CityUi {
    search: CitySearch,
    detail: WeatherCard,
}

impl CityUi {
    fn new() -> Self {
        Self {
            search: CitySearch::new(),
            detail: WeatherCard,
        }
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<CityComponentId>,
    ) {
        match &state.detail {
            Some(detail) => {
                event_ctx.component_areas.remove(&CityComponentId::Search);
                event_ctx.set_component_area(CityComponentId::Detail, area);
                let props = WeatherCardProps {
                    detail,
                    tick_count: state.tick_count,
                    is_focused: render_ctx.is_focused(),
                };
                self.detail.render(frame, area, props);
            }
            None => {
                event_ctx.component_areas.remove(&CityComponentId::Detail);
                event_ctx.set_component_area(CityComponentId::Search, area);
                let props = CitySearchProps {
                    search: &state.search,
                    tick_count: state.tick_count,
                    is_focused: render_ctx.is_focused(),
                };
                self.search.render(frame, area, props);
            }
        }
    }

    fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        if state.detail.is_some() {
            return HandlerResponse::ignored();
        }
        let props = CitySearchProps {
            search: &state.search,
            tick_count: state.tick_count,
            is_focused: true,
        };
        let actions: Vec<_> = self.search.handle_event(event, props).into_iter().collect();
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }

    fn handle_detail_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let Some(detail) = state.detail.as_ref() else {
            return HandlerResponse::ignored();
        };
        let props = WeatherCardProps {
            detail,
            tick_count: state.tick_count,
            is_focused: true,
        };
        let actions: Vec<_> = self.detail.handle_event(event, props).into_iter().collect();
        if actions.is_empty() {
            HandlerResponse::ignored()
        } else {
            HandlerResponse {
                actions,
                consumed: true,
                needs_render: false,
            }
        }
    }
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    config: &RuntimeConfig,
    init_action: Action,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(CityUi::new()));
    let mut bus: EventBus<AppState, Action, CityComponentId, CityContext> = EventBus::new();
    let keybindings: Keybindings<CityContext> = Keybindings::new();

    let ui_search = Rc::clone(&ui);
    bus.register(CityComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    let ui_detail = Rc::clone(&ui);
    bus.register(CityComponentId::Detail, move |event, state| {
        ui_detail
            .borrow_mut()
            .handle_detail_event(&event.kind, state)
    });

    // Re-render on terminal resize (no action needed, just redraw)
    bus.register_global(|event, _state| match event.kind {
        EventKind::Resize(_, _) => HandlerResponse::ignored().with_render(),
        _ => HandlerResponse::ignored(),
    });

    let services = config.services();
    let search_debounce = config.search_debounce;

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(init_action),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }

                runtime.subscriptions().interval(
                    "tick",
                    Duration::from_millis(SPINNER_TICK_MS),
                    || Action::Tick,
                );
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, &services, search_debounce),
        )
        .await
}

/// Page tasks share one key so a new query replaces the pending page
const PAGE_TASK: &str = "city_page";
const WEATHER_TASK: &str = "weather";

/// Handle effects by spawning tasks
fn handle_effect(
    effect: Effect,
    ctx: &mut EffectContext<Action>,
    services: &Services,
    search_debounce: Duration,
) {
    match effect {
        Effect::SearchCities {
            generation,
            request,
        } => {
            let directory = services.directory.clone();
            let task = async move {
                match directory.fetch_page(&request).await {
                    Ok(cities) => Action::SearchPageDidLoad { generation, cities },
                    Err(e) => {
                        tracing::warn!(generation, error = %e, "city search failed");
                        Action::SearchPageDidError {
                            generation,
                            error: e.to_string(),
                        }
                    }
                }
            };
            if search_debounce.is_zero() {
                ctx.tasks().spawn(PAGE_TASK, task);
            } else {
                ctx.tasks().debounce(PAGE_TASK, search_debounce, task);
            }
        }
        Effect::LoadCityPage {
            generation,
            request,
        } => {
            let directory = services.directory.clone();
            ctx.tasks().spawn(PAGE_TASK, async move {
                match directory.fetch_page(&request).await {
                    Ok(cities) => Action::SearchPageDidLoad { generation, cities },
                    Err(e) => {
                        tracing::warn!(
                            generation,
                            offset = request.offset,
                            error = %e,
                            "loading more cities failed"
                        );
                        Action::SearchPageDidError {
                            generation,
                            error: e.to_string(),
                        }
                    }
                }
            });
        }
        Effect::FetchWeather {
            request_id,
            city,
            unit,
        } => {
            let weather = services.weather.clone();
            ctx.tasks().spawn(WEATHER_TASK, async move {
                match weather.current_weather(&city, unit).await {
                    Ok(snapshot) => Action::WeatherDidLoad {
                        request_id,
                        snapshot,
                    },
                    Err(e) => {
                        tracing::warn!(request_id, city = %city, error = %e, "weather fetch failed");
                        Action::WeatherDidError {
                            request_id,
                            error: e.to_string(),
                        }
                    }
                }
            });
        }
        Effect::CancelWeather => {
            ctx.tasks().cancel(&TaskKey::new(WEATHER_TASK));
        }
    }
}
