//! Centralized theme module for TUI color constants and styles

use ratatui::prelude::*;

use crate::scoring::ScoreBand;

/// Which palette to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Theme {
    /// Detect from the terminal background
    #[default]
    Auto,
    Dark,
    Light,
}

/// Complete color palette for the TUI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Band colors
    pub band_ready: Color,
    pub band_strong: Color,
    pub band_developing: Color,
    pub band_early_stage: Color,

    // Score bar colors
    pub bar_empty: Color,

    // Table colors
    pub row_alt_bg: Color,
    pub index_color: Color,
    pub header_style: Style,
    pub row_selected: Style,

    // General colors
    pub muted: Color,
    pub title_color: Color,

    // Tab colors
    pub tab_active_style: Style,
    pub tab_inactive_style: Style,

    // Status bar colors
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Popup overlay colors
    pub popup_border: Color,
    pub popup_title: Style,
    pub popup_bg: Color,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            band_ready: Color::Green,
            band_strong: Color::Blue,
            band_developing: Color::Yellow,
            band_early_stage: Color::Rgb(234, 88, 12),
            bar_empty: Color::DarkGray,
            row_alt_bg: Color::Indexed(235),
            index_color: Color::DarkGray,
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            tab_active_style: Style::new().fg(Color::Cyan).bold(),
            tab_inactive_style: Style::new().fg(Color::DarkGray),
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
            popup_bg: Color::Indexed(234),
        }
    }

    pub fn light() -> Self {
        Self {
            band_ready: Color::Rgb(21, 128, 61),
            band_strong: Color::Rgb(29, 78, 216),
            band_developing: Color::Rgb(161, 98, 7),
            band_early_stage: Color::Rgb(194, 65, 12),
            bar_empty: Color::Indexed(250),
            row_alt_bg: Color::Indexed(254),
            index_color: Color::Indexed(244),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Indexed(242),
            title_color: Color::Blue,
            tab_active_style: Style::new().fg(Color::Blue).bold(),
            tab_inactive_style: Style::new().fg(Color::Indexed(246)),
            status_bar_bg: Color::Indexed(253),
            status_key_color: Color::Blue,
            flash_success: Color::Rgb(21, 128, 61),
            flash_error: Color::Red,
            popup_border: Color::Blue,
            popup_title: Style::new().fg(Color::Blue).bold(),
            popup_bg: Color::Indexed(255),
        }
    }

    /// Color used for a band everywhere in the dashboard
    pub fn band_color(&self, band: ScoreBand) -> Color {
        match band {
            ScoreBand::Ready => self.band_ready,
            ScoreBand::Strong => self.band_strong,
            ScoreBand::Developing => self.band_developing,
            ScoreBand::EarlyStage => self.band_early_stage,
        }
    }
}

/// Luma above which the terminal background counts as light
const LIGHT_LUMA_THRESHOLD: f32 = 0.6;

/// Pick the palette. `Auto` asks the terminal for its background color and
/// falls back to dark when the terminal does not answer.
pub fn resolve_theme(theme: Theme) -> ThemeColors {
    match theme {
        Theme::Dark => ThemeColors::dark(),
        Theme::Light => ThemeColors::light(),
        Theme::Auto => match terminal_light::luma() {
            Ok(luma) if luma > LIGHT_LUMA_THRESHOLD => ThemeColors::light(),
            Ok(_) => ThemeColors::dark(),
            Err(e) => {
                tracing::debug!(error = %e, "could not detect terminal background");
                ThemeColors::dark()
            }
        },
    }
}
