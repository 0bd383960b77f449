use crate::config::Config;
use crate::content::ContentItem;
use crate::dashboard::{BandSummary, DashboardData};
use crate::scoring::ScoreBand;
use crate::submission::StoredSubmission;
use crate::tui::theme::ThemeColors;
use crate::users::{UserActivity, UserStats};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Users,
    Submissions,
    Content,
}

impl View {
    /// Tab order
    pub const ALL: [View; 3] = [View::Users, View::Submissions, View::Content];

    pub fn index(self) -> usize {
        match self {
            View::Users => 0,
            View::Submissions => 1,
            View::Content => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
    Detail,
}

pub struct App {
    pub users: Vec<UserActivity>,
    pub user_stats: UserStats,
    pub submissions: Vec<StoredSubmission>,
    pub content: Vec<ContentItem>,
    pub summary: BandSummary,
    pub table_state: ratatui::widgets::TableState,
    pub current_view: View,
    pub input_mode: InputMode,
    /// Only show submissions in this band
    pub band_filter: Option<ScoreBand>,
    pub detail_scroll: u16,
    pub flash_message: Option<(String, Instant)>,
    pub last_refresh: Instant,
    pub last_interaction: Instant,
    pub needs_refresh: bool,
    /// Set by a manual refresh, which skips the idle check
    pub force_refresh: bool,
    pub should_quit: bool,
    pub is_loading: bool,
    pub has_loaded: bool,
    pub spinner_frame: usize,
    pub config: Config,
    pub theme: ThemeColors,
    /// Where the data comes from, shown in the title bar
    pub source: String,
}

impl App {
    /// Create an App with no data in loading state.
    /// Used for launching the TUI before data arrives.
    pub fn new_loading(config: Config, theme: ThemeColors, source: String) -> Self {
        Self {
            users: Vec::new(),
            user_stats: UserStats::default(),
            submissions: Vec::new(),
            content: Vec::new(),
            summary: BandSummary::default(),
            table_state: ratatui::widgets::TableState::default(),
            current_view: View::Users,
            input_mode: InputMode::Normal,
            band_filter: None,
            detail_scroll: 0,
            flash_message: None,
            last_refresh: Instant::now(),
            last_interaction: Instant::now(),
            needs_refresh: false,
            force_refresh: false,
            should_quit: false,
            is_loading: true,
            has_loaded: false,
            spinner_frame: 0,
            config,
            theme,
            source,
        }
    }

    /// Submissions passing the band filter
    pub fn visible_submissions(&self) -> Vec<&StoredSubmission> {
        self.submissions
            .iter()
            .filter(|s| self.band_filter.is_none_or(|b| s.score_band == b))
            .collect()
    }

    /// Number of rows in the current view
    pub fn row_count(&self) -> usize {
        match self.current_view {
            View::Users => self.users.len(),
            View::Submissions => self.visible_submissions().len(),
            View::Content => self.content.len(),
        }
    }

    pub fn next_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn first_row(&mut self) {
        if self.row_count() > 0 {
            self.table_state.select(Some(0));
        }
    }

    pub fn last_row(&mut self) {
        let len = self.row_count();
        if len > 0 {
            self.table_state.select(Some(len - 1));
        }
    }

    pub fn selected_user(&self) -> Option<&UserActivity> {
        if self.current_view != View::Users {
            return None;
        }
        self.table_state.selected().and_then(|i| self.users.get(i))
    }

    pub fn selected_submission(&self) -> Option<&StoredSubmission> {
        if self.current_view != View::Submissions {
            return None;
        }
        let visible = self.visible_submissions();
        self.table_state.selected().and_then(|i| visible.get(i).copied())
    }

    pub fn selected_content(&self) -> Option<&ContentItem> {
        if self.current_view != View::Content {
            return None;
        }
        self.table_state.selected().and_then(|i| self.content.get(i))
    }

    /// Keep the selection inside the current row count
    fn clamp_selection(&mut self) {
        let len = self.row_count();
        if len == 0 {
            self.table_state.select(None);
        } else {
            match self.table_state.selected() {
                Some(selected) if selected >= len => self.table_state.select(Some(len - 1)),
                Some(_) => {}
                None => self.table_state.select(Some(0)),
            }
        }
    }

    /// Switch to the next tab: Users, Submissions, Content
    pub fn toggle_view(&mut self) {
        let next = (self.current_view.index() + 1) % View::ALL.len();
        self.set_view(View::ALL[next]);
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.table_state.select(None);
        self.clamp_selection();
    }

    /// Step the band filter: all, then each band from early-stage to ready
    pub fn cycle_band_filter(&mut self) {
        if self.current_view != View::Submissions {
            return;
        }
        self.band_filter = match self.band_filter {
            None => Some(ScoreBand::ALL[0]),
            Some(band) => ScoreBand::ALL
                .iter()
                .position(|b| *b == band)
                .and_then(|i| ScoreBand::ALL.get(i + 1))
                .copied(),
        };
        self.table_state.select(None);
        self.clamp_selection();

        let label = self.band_filter.map(|b| b.label()).unwrap_or("all bands");
        self.show_flash(format!("Showing {}", label));
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Open the detail popup for the selected row
    pub fn show_detail(&mut self) {
        let has_selection = match self.current_view {
            View::Users => self.selected_user().is_some(),
            View::Submissions => self.selected_submission().is_some(),
            View::Content => self.selected_content().is_some(),
        };
        if has_selection {
            self.detail_scroll = 0;
            self.input_mode = InputMode::Detail;
        }
    }

    pub fn dismiss_detail(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn scroll_detail_down(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_add(1);
    }

    pub fn scroll_detail_up(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_sub(1);
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    pub fn request_refresh(&mut self) {
        self.needs_refresh = true;
        self.force_refresh = true;
        self.show_flash("Refreshing...".to_string());
    }

    /// Replace data with a fresh load
    pub fn update_data(&mut self, data: DashboardData) {
        self.users = data.users;
        self.user_stats = data.user_stats;
        self.submissions = data.submissions;
        self.content = data.content;
        self.summary = data.summary;
        self.has_loaded = true;
        self.clamp_selection();
        self.last_refresh = Instant::now();

        self.show_flash(format!(
            "Refreshed ({} users, {} submissions, {} content items)",
            self.users.len(),
            self.submissions.len(),
            self.content.len()
        ));
    }

    /// Advance the loading spinner animation frame
    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}
