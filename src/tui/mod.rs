pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::{resolve_theme, Theme, ThemeColors};

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};
use tokio::task::JoinHandle;

use crate::dashboard::{DashboardData, DashboardError, SubmissionFilter};
use crate::store::AnyStore;

/// How long a single dashboard load may take
const LOAD_TIMEOUT: Duration = Duration::from_secs(20);

type LoadResult = Result<Result<DashboardData, DashboardError>, tokio::time::error::Elapsed>;

fn spawn_load(store: &Arc<AnyStore>, filter: &SubmissionFilter) -> JoinHandle<LoadResult> {
    let store = Arc::clone(store);
    let filter = filter.clone();
    tokio::spawn(async move { tokio::time::timeout(LOAD_TIMEOUT, DashboardData::load(store.as_ref(), &filter)).await })
}

pub async fn run_tui(mut app: App, store: Arc<AnyStore>, filter: SubmissionFilter) -> anyhow::Result<()> {
    // The band is filtered in the view so `b` can still reach the other bands
    app.band_filter = filter.band;
    let filter = filter.without_band();

    // Buffer stderr while TUI is active to prevent output corrupting the display
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();

    let refresh_secs = app.config.auto_refresh_interval;
    let mut events = EventHandler::new(250, refresh_secs); // 250ms tick, N-second refresh

    // Initial load runs in the background so the first frame shows immediately
    let mut pending_load: Option<JoinHandle<LoadResult>> = Some(spawn_load(&store, &filter));
    app.is_loading = true;

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &mut app)) {
            break Err(e.into());
        }

        match events.next().await {
            Event::Key(key) => {
                app.last_interaction = std::time::Instant::now();
                handle_key_event(&mut app, key);
            }
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Refresh => {
                app.needs_refresh = true;
            }
        }

        if let Some(handle) = pending_load.take_if(|h| h.is_finished()) {
            match handle.await {
                Ok(Ok(Ok(data))) => app.update_data(data),
                Ok(Ok(Err(e))) => {
                    tracing::warn!(error = %e, "dashboard load failed");
                    app.show_flash(e.to_string());
                }
                Ok(Err(_elapsed)) => {
                    app.show_flash(format!(
                        "Failed to load: timed out after {}s. Will retry on next refresh.",
                        LOAD_TIMEOUT.as_secs()
                    ));
                }
                Err(e) => {
                    app.show_flash(format!("Error: load task panicked: {}", e));
                }
            }
            app.is_loading = false;
        }

        // Auto-refresh waits while a popup is open or the user is active.
        // needs_refresh stays set so it retries on the next tick.
        if app.needs_refresh && pending_load.is_none() {
            let modal_open = app.input_mode != app::InputMode::Normal;
            let recent_interaction = app.last_interaction.elapsed() < Duration::from_secs(10);

            if app.force_refresh || (!modal_open && !recent_interaction) {
                app.needs_refresh = false;
                app.force_refresh = false;
                pending_load = Some(spawn_load(&store, &filter));
                app.is_loading = true;
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    if let Some(handle) = pending_load {
        handle.abort();
    }

    // Restore terminal
    ratatui::restore();

    // Flush buffered stderr messages now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    result
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        app::InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.should_quit = true,

            // Navigation
            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),
            KeyCode::Char('g') | KeyCode::Home => app.first_row(),
            KeyCode::Char('G') | KeyCode::End => app.last_row(),

            KeyCode::Enter => app.show_detail(),
            KeyCode::Tab => app.toggle_view(),
            KeyCode::Char('b') => app.cycle_band_filter(),

            // Manual refresh skips the idle check
            KeyCode::Char('r') => app.request_refresh(),

            KeyCode::Char('?') => app.show_help(),
            _ => {}
        },
        app::InputMode::Detail => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.dismiss_detail(),
            KeyCode::Char('j') | KeyCode::Down => app.scroll_detail_down(),
            KeyCode::Char('k') | KeyCode::Up => app.scroll_detail_up(),
            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::scoring::ScoreBand;

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn app() -> App {
        App::new_loading(Config::default(), ThemeColors::dark(), "test".to_string())
    }

    #[test]
    fn test_quit_keys() {
        let mut a = app();
        press(&mut a, KeyCode::Char('q'));
        assert!(a.should_quit);

        let mut b = app();
        b.show_help();
        handle_key_event(&mut b, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(b.should_quit);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut a = app();
        press(&mut a, KeyCode::Char('?'));
        assert_eq!(a.input_mode, app::InputMode::Help);
        press(&mut a, KeyCode::Char('q'));
        assert_eq!(a.input_mode, app::InputMode::Normal);
        assert!(!a.should_quit);
    }

    #[test]
    fn test_refresh_and_filter_keys() {
        let mut a = app();
        press(&mut a, KeyCode::Char('r'));
        assert!(a.needs_refresh);
        assert!(a.force_refresh);

        // Users tab ignores the band key
        press(&mut a, KeyCode::Char('b'));
        assert_eq!(a.band_filter, None);

        press(&mut a, KeyCode::Tab);
        assert_eq!(a.current_view, app::View::Submissions);
        press(&mut a, KeyCode::Char('b'));
        assert_eq!(a.band_filter, Some(ScoreBand::EarlyStage));

        press(&mut a, KeyCode::Tab);
        assert_eq!(a.current_view, app::View::Content);
    }
}
