pub mod config;
pub mod content;
pub mod credentials;
pub mod dashboard;
pub mod flow;
pub mod logging;
pub mod mailing;
pub mod output;
pub mod prompt;
pub mod quiz;
pub mod scoring;
pub mod stderr_buffer;
pub mod store;
pub mod submission;
pub mod tui;
pub mod users;
