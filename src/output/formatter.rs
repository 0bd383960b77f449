use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::content::ContentItem;
use crate::dashboard::BandSummary;
use crate::quiz::Question;
use crate::scoring::{ScoreBand, ScoreResult};
use crate::submission::StoredSubmission;
use crate::users::{UserActivity, UserStats};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Paint `text` in the band's color
pub fn paint_band(band: ScoreBand, text: &str, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match band {
        ScoreBand::Ready => text.green().bold().to_string(),
        ScoreBand::Strong => text.blue().bold().to_string(),
        ScoreBand::Developing => text.yellow().bold().to_string(),
        ScoreBand::EarlyStage => text.truecolor(234, 88, 12).bold().to_string(),
    }
}

/// Horizontal gauge for a 0..=100 score, e.g. "[######----]"
pub fn format_score_bar(base_score: u8, width: usize) -> String {
    let filled = (usize::from(base_score.min(100)) * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Results view shown after the quiz
pub fn format_result(result: &ScoreResult, first_name: Option<&str>, use_colors: bool) -> String {
    let band = result.score_band;
    let heading = "Your Founder Readiness Score";
    let mut lines = Vec::new();

    if use_colors {
        lines.push(heading.bold().to_string());
    } else {
        lines.push(heading.to_string());
    }
    if let Some(name) = first_name.filter(|n| !n.is_empty()) {
        lines.push(format!("Hi {}, here are your results", name));
    }
    lines.push(String::new());

    let score = format!("{:>3} / 100", result.base_score);
    lines.push(format!(
        "  {}  {}",
        paint_band(band, &score, use_colors),
        format_score_bar(result.base_score, 30)
    ));
    lines.push(format!(
        "  {}  ({} of {} points)",
        paint_band(band, band.label(), use_colors),
        result.total_points,
        result.max_points
    ));
    lines.push(String::new());
    lines.push(format!("  {}", band.description()));

    lines.join("\n")
}

/// The questionnaire with numbered options
pub fn format_questions(questions: &[Question], use_colors: bool) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let heading = format!("{:>2}. {}", i + 1, q.prompt);
            let heading = if use_colors {
                heading.bold().to_string()
            } else {
                heading
            };
            let suffix = if q.is_scored() { "" } else { "  (not scored)" };
            let options = q
                .option_labels()
                .iter()
                .enumerate()
                .map(|(j, label)| match q.option_value(j) {
                    Some(value) => format!("      {}) {}  [{}]", j + 1, label, value),
                    None => format!("      {}) {}", j + 1, label),
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}{}\n{}", heading, suffix, options)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Truncate text to fit available width, accounting for Unicode
pub fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Age of a timestamp relative to `now`, "-" when unknown
fn format_created(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    created_at
        .map(|t| format_age(now - t))
        .unwrap_or_else(|| "-".to_string())
}

/// Submissions as a table: index, score, band, age, name, email.
/// No headers, matching the other listings.
pub fn format_submissions_table(
    submissions: &[StoredSubmission],
    now: DateTime<Utc>,
    use_colors: bool,
) -> String {
    if submissions.is_empty() {
        return "No submissions found.".to_string();
    }

    let term_width = get_terminal_width();
    let band_width = ScoreBand::ALL
        .iter()
        .map(|b| b.label().len())
        .max()
        .unwrap_or(11);
    let separator = "  ";

    submissions
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let index_str = format!("{:>3}.", idx + 1);
            let score_str = format!("{:>3}", s.base_score);
            let band_str = format!("{:<width$}", s.score_band.label(), width = band_width);
            let age_str = format!("{:>4}", format_created(s.created_at, now));

            // index + score + band + age and separators
            let fixed_width = 4 + 1 + 3 + band_width + 4 + separator.len() * 4;
            let contact = format!("{} <{}>", s.full_name(), s.email);
            let contact = match term_width {
                Some(width) if width > fixed_width + 10 => truncate(&contact, width - fixed_width),
                Some(_) => truncate(&contact, 20),
                None => contact,
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    score_str.bold(),
                    separator,
                    paint_band(s.score_band, &band_str, true),
                    separator,
                    age_str.dimmed(),
                    separator,
                    contact
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str, score_str, separator, band_str, separator, age_str, separator, contact
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Submissions as tab-separated values for scripting
/// Columns: created_at, base_score, score_band, first_name, last_name, email, location
pub fn format_submissions_tsv(submissions: &[StoredSubmission]) -> String {
    submissions
        .iter()
        .map(|s| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                s.created_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
                s.base_score,
                s.score_band,
                s.first_name,
                s.last_name,
                s.email,
                s.location.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-band counts with the average score
pub fn format_summary(summary: &BandSummary, use_colors: bool) -> String {
    let average = summary
        .average_score
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut lines = vec![format!(
        "{} submissions, average score {}",
        summary.total, average
    )];

    for band in ScoreBand::ALL.iter().rev() {
        let count = summary.count(*band);
        let pct = (summary.share(*band) * 100.0).round() as u32;
        let label = format!("{:<11}", band.label());
        lines.push(format!(
            "  {} {:>4}  {:>3}%",
            paint_band(*band, &label, use_colors),
            count,
            pct
        ));
    }
    lines.join("\n")
}

/// Content items in display order: order, slug, format, status, title
pub fn format_content_table(items: &[ContentItem], use_colors: bool) -> String {
    if items.is_empty() {
        return "No content items found.".to_string();
    }

    let slug_width = items.iter().map(|i| i.slug.chars().count()).max().unwrap_or(0).min(32);
    let term_width = get_terminal_width();

    items
        .iter()
        .map(|item| {
            let order = format!("{:>3}", item.display_order);
            let slug = format!("{:<width$}", truncate(&item.slug, slug_width), width = slug_width);
            let format = format!("{:<12}", item.format.as_str());
            let status = if item.is_published { "published" } else { "draft    " };
            let premium = if item.is_premium { " $" } else { "  " };

            let fixed_width = 3 + 2 + slug_width + 2 + 12 + 9 + 2 + 2;
            let title = match term_width {
                Some(width) if width > fixed_width + 10 => truncate(&item.title, width - fixed_width),
                Some(_) => truncate(&item.title, 20),
                None => item.title.clone(),
            };

            if use_colors {
                let status = if item.is_published {
                    status.green().to_string()
                } else {
                    status.dimmed().to_string()
                };
                format!(
                    "{}  {}  {}{}{}  {}",
                    order.dimmed(),
                    slug.cyan(),
                    format,
                    status,
                    premium.yellow(),
                    title
                )
            } else {
                format!("{}  {}  {}{}{}  {}", order, slug, format, status, premium, title)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line of headline numbers for app users
pub fn format_user_stats(stats: &UserStats) -> String {
    format!(
        "{} users, {} tests, average score {}, {} retakes, {} lessons",
        stats.users, stats.tests, stats.average_score, stats.retakes, stats.lessons
    )
}

/// App users: index, base > latest score, gain, band, tests, lessons, contact
pub fn format_users_table(users: &[UserActivity], use_colors: bool) -> String {
    if users.is_empty() {
        return "No app users found.".to_string();
    }

    let term_width = get_terminal_width();

    users
        .iter()
        .enumerate()
        .map(|(idx, u)| {
            let index_str = format!("{:>3}.", idx + 1);
            let scores = format!("{:>3} > {:>3}", u.base_score(), u.latest_score());
            let gain = match u.improvement() {
                0 => "    ".to_string(),
                g => format!("{:>+4}", g),
            };
            let band_label = u.band().map(|b| b.label()).unwrap_or("-");
            let band_str = format!("{:<11}", band_label);
            let counts = format!("{:>2}t {:>2}l", u.attempts.len(), u.completed_lessons());

            let fixed_width = 4 + 1 + 9 + 2 + 4 + 2 + 11 + 2 + 7 + 2;
            let contact = format!("{} <{}>", u.full_name(), u.user.email);
            let contact = match term_width {
                Some(width) if width > fixed_width + 10 => truncate(&contact, width - fixed_width),
                Some(_) => truncate(&contact, 20),
                None => contact,
            };

            if use_colors {
                let band_str = match u.band() {
                    Some(band) => paint_band(band, &band_str, true),
                    None => band_str.dimmed().to_string(),
                };
                let gain = if u.improvement() > 0 {
                    gain.green().to_string()
                } else {
                    gain.red().to_string()
                };
                format!(
                    "{} {}  {}  {}  {}  {}",
                    index_str.dimmed(),
                    scores.bold(),
                    gain,
                    band_str,
                    counts.dimmed(),
                    contact
                )
            } else {
                format!(
                    "{} {}  {}  {}  {}  {}",
                    index_str, scores, gain, band_str, counts, contact
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentFormat;
    use crate::quiz::questions;
    use crate::scoring::ScoreResult;

    fn sample_submission(score: u8, band: ScoreBand) -> StoredSubmission {
        StoredSubmission {
            id: "abc".to_string(),
            created_at: Some(Utc::now() - Duration::hours(5)),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            location: Some("London".to_string()),
            base_score: score,
            score_band: band,
            responses: vec![],
        }
    }

    fn sample_item(slug: &str, order: i64) -> ContentItem {
        ContentItem {
            id: format!("id-{}", slug),
            slug: slug.to_string(),
            title: format!("About {}", slug),
            description: None,
            format: ContentFormat::Lesson,
            content: serde_json::Value::Null,
            category_slug: None,
            tags: vec![],
            is_premium: false,
            is_published: true,
            estimated_duration_minutes: 5,
            author: "Founder Groundworks Team".to_string(),
            display_order: order,
            created_at: None,
            updated_at: None,
            published_at: None,
        }
    }

    #[test]
    fn test_format_result_plain() {
        let result = ScoreResult::from_total(21);
        let text = format_result(&result, Some("Ada"), false);
        assert!(text.contains("Hi Ada, here are your results"));
        assert!(text.contains(" 78 / 100"));
        assert!(text.contains("Strong"));
        assert!(text.contains("(21 of 27 points)"));
        assert!(text.contains(ScoreBand::Strong.description()));
    }

    #[test]
    fn test_format_result_without_name() {
        let text = format_result(&ScoreResult::from_total(27), None, false);
        assert!(!text.contains("Hi "));
        assert!(text.contains("Ready"));
    }

    #[test]
    fn test_score_bar() {
        assert_eq!(format_score_bar(0, 10), "[----------]");
        assert_eq!(format_score_bar(100, 10), "[##########]");
        assert_eq!(format_score_bar(44, 10), "[####------]");
        assert_eq!(format_score_bar(78, 10), "[########--]");
    }

    #[test]
    fn test_paint_band_plain_is_identity() {
        assert_eq!(paint_band(ScoreBand::Ready, "Ready", false), "Ready");
        assert_ne!(paint_band(ScoreBand::Ready, "Ready", true), "Ready");
    }

    #[test]
    fn test_format_questions_lists_all() {
        let text = format_questions(questions(), false);
        assert!(text.starts_with(" 1. "));
        assert!(text.contains("10. "));
        assert_eq!(text.matches("(not scored)").count(), 1);
    }

    // truncate tests
    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("Short title", 20), "Short title");
    }

    #[test]
    fn test_truncate_exact() {
        assert_eq!(truncate("Exact", 5), "Exact");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate("This is a very long title", 15), "This is a ve...");
    }

    #[test]
    fn test_truncate_unicode() {
        // By char, not by byte
        assert_eq!(truncate("Olá São Paulo", 20), "Olá São Paulo");
        assert_eq!(truncate("Olá São Paulo", 8), "Olá S...");
    }

    #[test]
    fn test_truncate_very_narrow() {
        assert_eq!(truncate("Hello world", 3), "Hel");
    }

    #[test]
    fn test_submissions_table_empty() {
        assert_eq!(
            format_submissions_table(&[], Utc::now(), false),
            "No submissions found."
        );
    }

    #[test]
    fn test_submissions_table_rows() {
        let rows = vec![
            sample_submission(100, ScoreBand::Ready),
            sample_submission(44, ScoreBand::Developing),
        ];
        let result = format_submissions_table(&rows, Utc::now(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1. 100"));
        assert!(lines[0].contains("Ready"));
        assert!(lines[0].contains("5h"));
        assert!(lines[1].starts_with("  2.  44"));
        assert!(lines[1].contains("Developing"));
    }

    #[test]
    fn test_submissions_tsv() {
        let result = format_submissions_tsv(&[sample_submission(78, ScoreBand::Strong)]);
        let cols: Vec<&str> = result.split('\t').collect();
        assert_eq!(cols.len(), 7);
        assert_eq!(cols[1], "78");
        assert_eq!(cols[2], "strong");
        assert_eq!(cols[5], "ada@example.com");
        assert_eq!(cols[6], "London");
        assert_eq!(format_submissions_tsv(&[]), "");
    }

    #[test]
    fn test_summary() {
        let summary = BandSummary::from_submissions(&[
            sample_submission(100, ScoreBand::Ready),
            sample_submission(33, ScoreBand::EarlyStage),
        ]);
        let text = format_summary(&summary, false);
        assert!(text.starts_with("2 submissions, average score 67"));
        assert!(text.contains("Ready"));
        assert!(text.contains("50%"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_content_table() {
        let mut draft = sample_item("pricing", 2);
        draft.is_published = false;
        let items = vec![sample_item("intro", 1), draft];
        let result = format_content_table(&items, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1  intro"));
        assert!(lines[0].contains("published"));
        assert!(lines[1].contains("draft"));
        assert_eq!(format_content_table(&[], false), "No content items found.");
    }

    #[test]
    fn test_users_table() {
        use crate::users::{AppUser, Attempt};

        let user = UserActivity {
            user: AppUser {
                id: "u1".to_string(),
                email: "kai@example.com".to_string(),
                first_name: Some("Kai".to_string()),
                last_name: Some("Moana".to_string()),
                base_score: Some(44),
                latest_score: Some(71),
                ..Default::default()
            },
            attempts: vec![Attempt {
                id: "t1".to_string(),
                user_id: Some("u1".to_string()),
                created_at: None,
                base_score: 44,
                score_band: ScoreBand::Developing,
                is_retake: None,
                attempt_number: None,
                score_change: None,
                lessons_completed_at_assessment: None,
            }],
            lessons: vec![],
        };
        let result = format_users_table(&[user], false);
        assert!(result.starts_with("  1.  44 >  71   +27  Developing"));
        assert!(result.contains(" 1t  0l"));
        assert!(result.contains("Kai Moana <kai@example.com>"));
        assert_eq!(format_users_table(&[], false), "No app users found.");
    }

    #[test]
    fn test_user_stats_line() {
        let stats = UserStats {
            users: 2,
            tests: 3,
            average_score: 63,
            retakes: 1,
            lessons: 7,
        };
        assert_eq!(
            format_user_stats(&stats),
            "2 users, 3 tests, average score 63, 1 retakes, 7 lessons"
        );
    }

    #[test]
    fn test_format_age_hours() {
        assert_eq!(format_age(Duration::hours(3)), "3h");
    }

    #[test]
    fn test_format_age_days() {
        assert_eq!(format_age(Duration::days(2)), "2d");
    }

    #[test]
    fn test_format_age_weeks() {
        assert_eq!(format_age(Duration::weeks(2)), "2w");
    }

    #[test]
    fn test_format_age_minutes() {
        assert_eq!(format_age(Duration::minutes(30)), "30m");
    }

    #[test]
    fn test_format_age_now() {
        assert_eq!(format_age(Duration::seconds(30)), "now");
    }
}
