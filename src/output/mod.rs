pub mod formatter;

pub use formatter::{
    format_age, format_content_table, format_questions, format_result, format_score_bar,
    format_submissions_table, format_submissions_tsv, format_summary, format_user_stats,
    format_users_table, paint_band, should_use_colors, truncate,
};
