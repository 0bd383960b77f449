use chrono::Utc;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};

use crate::output::{format_age, truncate};
use crate::scoring::ScoreBand;
use crate::tui::app::{App, InputMode, View};
use crate::users::UserActivity;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 7 || area.width < 40 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Stats(1) + Tabs(1) + Table(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1), // Title bar
        Constraint::Length(1), // User stats or band summary
        Constraint::Length(1), // Tab bar
        Constraint::Fill(1),   // Table
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    match app.current_view {
        View::Users => render_user_stats(frame, chunks[1], app),
        View::Submissions | View::Content => render_band_summary(frame, chunks[1], app),
    }
    render_tabs(frame, chunks[2], app);
    match app.current_view {
        View::Users => render_users(frame, chunks[3], app),
        View::Submissions => render_submissions(frame, chunks[3], app),
        View::Content => render_content(frame, chunks[3], app),
    }
    render_status_bar(frame, chunks[4], app);

    match app.input_mode {
        InputMode::Detail => render_detail_popup(frame, app),
        InputMode::Help => render_help_popup(frame, app),
        InputMode::Normal => {}
    }

    // Loading overlay sits on top of everything
    if app.is_loading {
        render_loading_overlay(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let title = "Founder Check";
    let mut spans = vec![Span::styled(title, Style::default().fg(app.theme.title_color).bold())];

    let source = truncate(&app.source, (area.width as usize).saturating_sub(title.len() + 2));
    let padding_len = (area.width as usize).saturating_sub(title.len() + source.chars().count());
    spans.push(Span::raw(" ".repeat(padding_len)));
    spans.push(Span::styled(source, Style::default().fg(app.theme.muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_band_summary(frame: &mut Frame, area: Rect, app: &App) {
    let summary = &app.summary;
    let mut spans = Vec::new();

    for band in ScoreBand::ALL.iter().rev() {
        let style = if app.band_filter == Some(*band) {
            Style::default().fg(app.theme.band_color(*band)).bold().underlined()
        } else {
            Style::default().fg(app.theme.band_color(*band))
        };
        spans.push(Span::styled(format!("{} {}", band.label(), summary.count(*band)), style));
        spans.push(Span::raw("  "));
    }

    let average = match summary.average_score {
        Some(avg) => format!("avg {}", avg),
        None => "avg -".to_string(),
    };
    spans.push(Span::styled(average, Style::default().fg(app.theme.muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_user_stats(frame: &mut Frame, area: Rect, app: &App) {
    let stats = &app.user_stats;
    let key = Style::default().fg(app.theme.muted);
    let value = Style::default().fg(app.theme.title_color).bold();

    let mut spans = Vec::new();
    for (name, count) in [
        ("Users", stats.users),
        ("Tests", stats.tests),
        ("Avg", usize::from(stats.average_score)),
        ("Retakes", stats.retakes),
        ("Lessons", stats.lessons),
    ] {
        spans.push(Span::styled(format!("{} ", name), key));
        spans.push(Span::styled(count.to_string(), value));
        spans.push(Span::raw("  "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles = vec![
        format!("Users ({})", app.users.len()),
        format!("Submissions ({})", app.summary.total),
        format!("Content ({})", app.content.len()),
    ];

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive_style)
        .highlight_style(app.theme.tab_active_style.reversed())
        .divider(" | ");

    frame.render_widget(tabs, area);
}

fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let empty_msg = Paragraph::new(message).alignment(Alignment::Center).block(Block::default());
    frame.render_widget(empty_msg, area);
}

fn render_submissions(frame: &mut Frame, area: Rect, app: &mut App) {
    let now = Utc::now();
    let theme = app.theme.clone();

    let rows: Vec<Row> = app
        .visible_submissions()
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let index = format!("{}.", idx + 1);
            let band_color = theme.band_color(s.score_band);

            let mut score_spans = vec![Span::styled(
                format!("{:>3} ", s.base_score),
                Style::default().fg(band_color),
            )];
            score_spans.extend(score_bar(s.base_score, 10, band_color, theme.bar_empty).spans);

            let age = s
                .created_at
                .map(|t| format_age(now - t))
                .unwrap_or_else(|| "-".to_string());

            let row_style = if idx % 2 == 1 {
                Style::default().bg(theme.row_alt_bg)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(index).style(Style::default().fg(theme.index_color)),
                Cell::from(Line::from(score_spans)),
                Cell::from(s.score_band.label()).style(Style::default().fg(band_color)),
                Cell::from(truncate(&s.full_name(), 28)),
                Cell::from(truncate(&s.email, 36)),
                Cell::from(age),
            ])
            .style(row_style)
        })
        .collect();

    if rows.is_empty() {
        let message = if app.has_loaded && app.band_filter.is_some() {
            "No submissions in this band"
        } else {
            "No submissions yet"
        };
        render_empty(frame, area, message);
        return;
    }

    let widths = [
        Constraint::Length(4),  // Index
        Constraint::Length(16), // Score + bar
        Constraint::Length(12), // Band
        Constraint::Fill(1),    // Name
        Constraint::Fill(1),    // Email
        Constraint::Length(5),  // Age
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["#", "Score", "Band", "Name", "Email", "Age"])
                .style(theme.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(theme.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

/// "+5", "-3" or "" for no change
fn format_change(change: i32) -> String {
    match change {
        0 => String::new(),
        c if c > 0 => format!("+{}", c),
        c => c.to_string(),
    }
}

fn render_users(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.users.is_empty() {
        render_empty(frame, area, "No app users found");
        return;
    }

    let theme = app.theme.clone();
    let rows: Vec<Row> = app
        .users
        .iter()
        .enumerate()
        .map(|(idx, u)| {
            let band = u.band();
            let band_style = band
                .map(|b| Style::default().fg(theme.band_color(b)))
                .unwrap_or_else(|| Style::default().fg(theme.muted));
            let change_style = if u.improvement() > 0 {
                Style::default().fg(theme.flash_success)
            } else {
                Style::default().fg(theme.flash_error)
            };

            let row_style = if idx % 2 == 1 {
                Style::default().bg(theme.row_alt_bg)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(format!("{}.", idx + 1)).style(Style::default().fg(theme.index_color)),
                Cell::from(truncate(&u.full_name(), 28)),
                Cell::from(truncate(&u.user.email, 36)),
                Cell::from(Line::from(vec![
                    Span::styled(format!("{:>3} > ", u.base_score()), Style::default().fg(theme.muted)),
                    Span::styled(format!("{:>3}", u.latest_score()), band_style.bold()),
                ])),
                Cell::from(format_change(u.improvement())).style(change_style),
                Cell::from(band.map(|b| b.label()).unwrap_or("-")).style(band_style),
                Cell::from(u.attempts.len().to_string()),
                Cell::from(u.completed_lessons().to_string()),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),  // Index
        Constraint::Fill(1),    // Name
        Constraint::Fill(1),    // Email
        Constraint::Length(9),  // Base > latest
        Constraint::Length(5),  // Gain
        Constraint::Length(12), // Band
        Constraint::Length(5),  // Tests
        Constraint::Length(7),  // Lessons
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["#", "Name", "Email", "Score", "Gain", "Band", "Tests", "Lessons"])
                .style(theme.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(theme.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_content(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.content.is_empty() {
        render_empty(frame, area, "No content items");
        return;
    }

    let theme = &app.theme;
    let rows: Vec<Row> = app
        .content
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let status = if item.is_published {
                Span::styled("published", Style::default().fg(theme.flash_success))
            } else {
                Span::styled("draft", Style::default().fg(theme.muted))
            };
            let premium = if item.is_premium { "*" } else { "" };

            let row_style = if idx % 2 == 1 {
                Style::default().bg(theme.row_alt_bg)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(item.display_order.to_string()).style(Style::default().fg(theme.index_color)),
                Cell::from(item.format.as_str()),
                Cell::from(Line::from(vec![status, Span::raw(premium)])),
                Cell::from(truncate(&item.slug, 30)),
                Cell::from(truncate(&item.title, 60)),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),  // Order
        Constraint::Length(13), // Format
        Constraint::Length(11), // Status
        Constraint::Length(30), // Slug
        Constraint::Fill(1),    // Title
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Ord", "Format", "Status", "Slug", "Title"])
                .style(theme.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(theme.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Failed") || msg.starts_with("Error") {
            theme.flash_error
        } else if msg.starts_with("Refreshed") || msg.starts_with("Showing") {
            theme.flash_success
        } else {
            theme.muted
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let count = match app.current_view {
            View::Users => format!("{} users", app.users.len()),
            View::Submissions => format!("{} submissions", app.visible_submissions().len()),
            View::Content => format!("{} items", app.content.len()),
        };

        let elapsed = app.last_refresh.elapsed();
        let refresh_time = if elapsed.as_secs() < 60 {
            format!("refreshed {}s ago", elapsed.as_secs())
        } else {
            format!("refreshed {}m ago", elapsed.as_secs() / 60)
        };

        let mut hints = vec![("j/k", ":nav "), ("Enter", ":details ")];
        match app.current_view {
            View::Users => hints.push(("Tab", ":submissions ")),
            View::Submissions => {
                hints.push(("b", ":band "));
                hints.push(("Tab", ":content "));
            }
            View::Content => hints.push(("Tab", ":users ")),
        }
        hints.extend([("r", ":refresh "), ("?", ":help "), ("q", ":quit")]);

        let mut spans = vec![
            Span::styled(count, Style::default().fg(theme.muted)),
            Span::raw(" "),
            Span::styled(refresh_time, Style::default().fg(theme.muted)),
            Span::raw("  "),
        ];
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area,
    );
}

fn score_bar(score: u8, width: usize, filled_color: Color, empty_color: Color) -> Line<'static> {
    let filled = (usize::from(score.min(100)) * width + 50) / 100;
    let empty = width.saturating_sub(filled);

    let mut spans = Vec::new();
    if filled > 0 {
        spans.push(Span::styled("█".repeat(filled), Style::default().fg(filled_color)));
    }
    if empty > 0 {
        spans.push(Span::styled("░".repeat(empty), Style::default().fg(empty_color)));
    }
    Line::from(spans)
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect { x, y, width, height }
}

fn field_line(name: &str, value: String, key_style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", name), key_style),
        Span::raw(value),
    ])
}

fn user_detail_lines(app: &App, u: &UserActivity, key_style: Style) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let muted = Style::default().fg(theme.muted);
    let date = |t: Option<chrono::DateTime<Utc>>| {
        t.map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    let mut lines = vec![
        field_line("Email", u.user.email.clone(), key_style),
        field_line("Joined", date(u.user.created_at), key_style),
        field_line(
            "Score",
            format!("{} > {}  {}", u.base_score(), u.latest_score(), format_change(u.improvement())),
            key_style,
        ),
        field_line(
            "Streak",
            format!(
                "{} days (best {})",
                u.user.current_streak_days.unwrap_or(0),
                u.user.longest_streak_days.unwrap_or(0)
            ),
            key_style,
        ),
        field_line("Learning", format!("{} min", u.learning_minutes()), key_style),
        field_line("Done", u.lessons_done().to_string(), key_style),
        Line::from(""),
        Line::from(Span::styled(
            format!("Assessments ({})", u.attempts.len()),
            Style::default().bold(),
        )),
    ];

    for (i, a) in u.attempts.iter().enumerate() {
        let number = a.attempt_number.map(|n| n as usize).unwrap_or(i + 1);
        let mut spans = vec![
            Span::raw(format!("  #{:<3}{:<12}", number, date(a.created_at))),
            Span::styled(
                format!("{:>3}  {:<12}", a.base_score, a.score_band.label()),
                Style::default().fg(theme.band_color(a.score_band)),
            ),
        ];
        if a.is_retake() {
            spans.push(Span::styled("retake ", muted));
            if let Some(change) = a.score_change {
                spans.push(Span::raw(format!("{} ", format_change(change))));
            }
        }
        if let Some(lessons) = a.lessons_completed_at_assessment {
            spans.push(Span::styled(format!("{} lessons", lessons), muted));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Lessons ({})", u.lessons.len()),
        Style::default().bold(),
    )));
    for l in &u.lessons {
        let minutes = ((l.time_spent_seconds.unwrap_or(0) as f64) / 60.0).round() as u64;
        lines.push(Line::from(format!(
            "  {:<30}{:<13}{} min",
            truncate(&l.content_slug, 28),
            l.status,
            minutes
        )));
    }
    lines
}

fn detail_lines(app: &App) -> (String, Vec<Line<'static>>) {
    let theme = &app.theme;
    let key_style = Style::default().fg(theme.status_key_color).bold();
    let muted = Style::default().fg(theme.muted);

    if let Some(u) = app.selected_user() {
        return (format!(" {} ", u.full_name()), user_detail_lines(app, u, key_style));
    }

    if let Some(s) = app.selected_submission() {
        let band_style = Style::default().fg(theme.band_color(s.score_band)).bold();
        let mut lines = vec![
            field_line("Email", s.email.clone(), key_style),
            field_line("Location", s.location.clone().unwrap_or_else(|| "-".to_string()), key_style),
            field_line(
                "Submitted",
                s.created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                key_style,
            ),
            Line::from(vec![
                Span::styled(format!("{:<12}", "Score"), key_style),
                Span::styled(format!("{} / 100  {}", s.base_score, s.score_band.label()), band_style),
            ]),
            Line::from(Span::styled(s.score_band.description().to_string(), muted)),
            Line::from(""),
        ];
        for (prompt, label) in &s.responses {
            lines.push(Line::from(Span::styled(prompt.clone(), Style::default().bold())));
            lines.push(Line::from(format!("  {}", label)));
        }
        return (format!(" {} ", s.full_name()), lines);
    }

    if let Some(item) = app.selected_content() {
        let lines = vec![
            field_line("Slug", item.slug.clone(), key_style),
            field_line("Format", item.format.to_string(), key_style),
            field_line("Category", item.category_slug.clone().unwrap_or_else(|| "-".to_string()), key_style),
            field_line("Tags", item.tags.join(", "), key_style),
            field_line("Author", item.author.clone(), key_style),
            field_line("Duration", format!("{} min", item.estimated_duration_minutes), key_style),
            field_line("Order", item.display_order.to_string(), key_style),
            field_line(
                "Status",
                format!(
                    "{}{}",
                    if item.is_published { "published" } else { "draft" },
                    if item.is_premium { ", premium" } else { "" }
                ),
                key_style,
            ),
            Line::from(""),
            Line::from(Span::styled(item.description.clone().unwrap_or_default(), muted)),
        ];
        return (format!(" {} ", item.title), lines);
    }

    (String::new(), Vec::new())
}

/// Render the details of the selected row
fn render_detail_popup(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let popup_area = centered_rect_fixed(area.width.saturating_sub(8).min(90), area.height.saturating_sub(4), area);

    let (title, mut lines) = detail_lines(app);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "j/k: scroll | Esc: close",
        Style::default().fg(app.theme.muted),
    )));

    frame.render_widget(Clear, popup_area);
    let block = Block::bordered()
        .title(Span::styled(title, app.theme.popup_title))
        .border_style(Style::default().fg(app.theme.popup_border))
        .style(Style::default().bg(app.theme.popup_bg));

    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    frame.render_widget(body, popup_area);
}

/// Render the help overlay popup
fn render_help_popup(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(50, 14, frame.area());

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(Span::styled(" Keyboard Shortcuts ", app.theme.popup_title))
        .border_style(Style::default().fg(app.theme.popup_border))
        .style(Style::default().bg(app.theme.popup_bg));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let key_style = Style::default().fg(app.theme.status_key_color).bold();
    let shortcuts = [
        ("j / Down", "Move down"),
        ("k / Up", "Move up"),
        ("g / G", "First / last row"),
        ("Enter", "Show details"),
        ("Tab", "Next tab"),
        ("b", "Cycle band filter"),
        ("r", "Refresh"),
        ("?", "Show/hide this help"),
        ("q / Ctrl-c", "Quit"),
    ];

    let mut help_lines: Vec<Line> = shortcuts
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{:<14}", key), key_style),
                Span::raw(*action),
            ])
        })
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(app.theme.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}

/// Render the loading spinner overlay
fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(30, 3, frame.area());

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered().border_style(Style::default().fg(app.theme.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    // Braille spinner animation
    let spinner_chars = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let text = if app.has_loaded {
        format!("{} Refreshing...", spinner)
    } else {
        format!("{} Loading dashboard...", spinner)
    };

    let loading_text = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.title_color));

    frame.render_widget(loading_text, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dashboard::{BandSummary, DashboardData};
    use crate::submission::StoredSubmission;
    use crate::tui::theme::ThemeColors;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn app_with_one_submission() -> App {
        let mut app = App::new_loading(Config::default(), ThemeColors::dark(), "local".to_string());
        app.current_view = View::Submissions;
        let submissions = vec![StoredSubmission {
            id: "1".to_string(),
            created_at: None,
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            location: Some("Arlington".to_string()),
            base_score: 82,
            score_band: ScoreBand::Strong,
            responses: vec![("How do you fund it?".to_string(), "Savings".to_string())],
        }];
        let summary = BandSummary::from_submissions(&submissions);
        app.update_data(DashboardData {
            submissions,
            summary,
            ..Default::default()
        });
        app.is_loading = false;
        app
    }

    #[test]
    fn test_score_bar_widths() {
        let full = score_bar(100, 10, Color::Green, Color::Gray);
        assert_eq!(full.spans.len(), 1);
        let empty = score_bar(0, 10, Color::Green, Color::Gray);
        assert_eq!(empty.spans.len(), 1);
        let half = score_bar(50, 10, Color::Green, Color::Gray);
        assert_eq!(half.spans[0].content.chars().count(), 5);
    }

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect_fixed(50, 4, area);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.y, 3);
    }

    #[test]
    fn test_draw_submissions_table() {
        let mut app = app_with_one_submission();
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Founder Check"));
        assert!(text.contains("Grace Hopper"));
        assert!(text.contains("Strong"));
    }

    #[test]
    fn test_draw_detail_popup() {
        let mut app = app_with_one_submission();
        app.show_detail();
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("How do you fund it?"));
        assert!(text.contains("Arlington"));
    }

    #[test]
    fn test_draw_tiny_terminal() {
        let mut app = app_with_one_submission();
        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        assert!(buffer_text(&terminal).contains("Terminal too small"));
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(0), "");
        assert_eq!(format_change(7), "+7");
        assert_eq!(format_change(-3), "-3");
    }

    #[test]
    fn test_draw_users_view() {
        use crate::users::{AppUser, Attempt, UserActivity, UserStats};

        let mut app = App::new_loading(Config::default(), ThemeColors::dark(), "local".to_string());
        let users = vec![UserActivity {
            user: AppUser {
                id: "u1".to_string(),
                email: "kai@example.com".to_string(),
                first_name: Some("Kai".to_string()),
                base_score: Some(44),
                latest_score: Some(71),
                ..Default::default()
            },
            attempts: vec![Attempt {
                id: "t1".to_string(),
                user_id: Some("u1".to_string()),
                created_at: None,
                base_score: 71,
                score_band: ScoreBand::Strong,
                is_retake: Some(true),
                attempt_number: Some(2),
                score_change: Some(27),
                lessons_completed_at_assessment: Some(4),
            }],
            lessons: vec![],
        }];
        let user_stats = UserStats::from_activity(&users, 3);
        app.update_data(DashboardData {
            users,
            user_stats,
            ..Default::default()
        });
        app.is_loading = false;

        let mut terminal = Terminal::new(TestBackend::new(110, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Users (1)"));
        assert!(text.contains("Retakes 1"));
        assert!(text.contains("Kai"));
        assert!(text.contains("+27"));

        app.show_detail();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Assessments (1)"));
        assert!(text.contains("#2"));
        assert!(text.contains("4 lessons"));
    }
}
