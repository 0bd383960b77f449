use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use founder_check::config::{Config, StoreBackend};
use founder_check::content::{self, ContentDraft, ContentError};
use founder_check::credentials::{resolve_secret, Secret};
use founder_check::dashboard::{self, SubmissionFilter};
use founder_check::mailing::{MailchimpClient, MailingList, SubscribeError, Subscriber};
use founder_check::output;
use founder_check::prompt::Prompter;
use founder_check::quiz::{self, Answers};
use founder_check::scoring::{calculate_score, ScoreBand};
use founder_check::store::{AnyStore, StoreError};
use founder_check::submission::{self, SubmitError};
use founder_check::tui::{self, Theme};
use founder_check::users;

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Only show submissions in this band (early-stage, developing, strong, ready)
    #[arg(long)]
    band: Option<ScoreBand>,

    /// Only show submissions newer than this age, e.g. 7d or 12h
    #[arg(long, value_parser = SubmissionFilter::parse_since)]
    since: Option<Duration>,
}

impl From<FilterArgs> for SubmissionFilter {
    fn from(args: FilterArgs) -> Self {
        SubmissionFilter {
            band: args.band,
            since: args.since,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ContentCommand {
    /// List content items in display order
    List,
    /// Create a content item from a YAML or JSON file ("-" for stdin)
    Add { file: String },
    /// Update a content item; the file must carry its id
    Edit { file: String },
    /// Delete a content item by id
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Take the readiness quiz (default if no subcommand)
    Take {
        /// Score locally without storing the result or offering the mailing list
        #[arg(long)]
        offline: bool,
    },
    /// Score an answers document ("-" for stdin)
    Score {
        file: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the questionnaire
    Questions,
    /// Add someone to the mailing list
    Subscribe {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// List stored submissions
    Submissions {
        #[command(flatten)]
        filter: FilterArgs,
        /// Tab-separated output without the summary
        #[arg(long)]
        tsv: bool,
    },
    /// List mobile app users with their scores and retakes
    Users,
    /// Interactive dashboard of app users, submissions and content
    Dashboard {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Manage learning content
    Content {
        #[command(subcommand)]
        command: ContentCommand,
    },
    /// Create a config file interactively
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "founder-check")]
#[command(about = "Founder readiness quiz, lead capture and submissions dashboard", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/founder-check/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Dashboard color theme
    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto)]
    theme: Theme,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Print to stderr and exit with `code`
fn fail(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

fn store_exit_code(e: &StoreError) -> i32 {
    match e {
        StoreError::CheckViolation { .. } | StoreError::UniqueViolation { .. } => EXIT_CONFIG,
        StoreError::Unavailable { .. } | StoreError::Other { .. } => EXIT_NETWORK,
    }
}

fn content_exit_code(e: &ContentError) -> i32 {
    match e {
        ContentError::Store(store_error) => store_exit_code(store_error),
        _ => EXIT_CONFIG,
    }
}

fn subscribe_exit_code(e: &SubscribeError) -> i32 {
    match e {
        SubscribeError::AlreadySubscribed => EXIT_SUCCESS,
        SubscribeError::AuthenticationFailed { .. } => EXIT_AUTH,
        SubscribeError::MissingFields(_) | SubscribeError::InvalidAddress { .. } => EXIT_CONFIG,
        SubscribeError::Other { .. } => EXIT_NETWORK,
    }
}

/// Build the configured store, resolving the API key for the hosted backend.
/// Errors carry the exit code to use.
fn open_store(config: &Config, interactive: bool) -> Result<AnyStore, (i32, String)> {
    let api_key = match config.store.backend {
        StoreBackend::Local => None,
        StoreBackend::Supabase => Some(
            resolve_secret(Secret::StoreKey, interactive)
                .map_err(|e| (EXIT_AUTH, format!("Credential error: {:#}", e)))?,
        ),
    };

    AnyStore::from_config(&config.store, api_key.as_deref())
        .map_err(|e| (EXIT_CONFIG, format!("Store error: {:#}", e)))
}

fn open_store_or_exit(config: &Config, interactive: bool) -> AnyStore {
    open_store(config, interactive).unwrap_or_else(|(code, message)| fail(code, message))
}

/// Mailing-list client and tag, or an exit when the list is not configured
fn open_mailing_list(config: &Config, interactive: bool) -> anyhow::Result<(MailchimpClient, Option<String>)> {
    let Some(list) = &config.mailing_list else {
        anyhow::bail!("No mailing list configured. Run `founder-check init` to add one");
    };
    let api_key = resolve_secret(Secret::MailingListKey, interactive)?;
    let client = MailchimpClient::new(&api_key, &list.server_prefix, &list.list_id)?;
    Ok((client, list.tag.clone()))
}

fn read_input(file: &str) -> anyhow::Result<String> {
    use anyhow::Context;

    if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))
    }
}

/// JSON documents go through serde_json, anything else is read as YAML
fn parse_document<T: serde::de::DeserializeOwned>(text: &str) -> anyhow::Result<T> {
    if text.trim_start().starts_with('{') {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(serde_saphyr::from_str(text)?)
    }
}

async fn run_take(config: &Config, offline: bool) -> i32 {
    let mut prompter = Prompter::stdio();
    let submission = match founder_check::flow::run_quiz(&mut prompter) {
        Ok(s) => s,
        Err(e) => fail(EXIT_CONFIG, format!("Quiz aborted: {:#}", e)),
    };

    let mut exit_code = EXIT_SUCCESS;

    if !offline {
        let stored = match open_store(config, true) {
            Ok(store) => submission::submit(&store, &submission).await.map(|id| {
                tracing::debug!(id = %id, store = %store.describe(), "submission stored");
            }),
            Err((code, message)) => {
                eprintln!("{}", message);
                exit_code = code;
                Ok(())
            }
        };
        if let Err(e) = stored {
            tracing::warn!(error = %e, "submission not stored");
            eprintln!("{}", e.user_message());
            exit_code = match e {
                SubmitError::MissingFields(_) | SubmitError::InvalidData(_) => EXIT_CONFIG,
                SubmitError::Duplicate(_) | SubmitError::Unavailable(_) => EXIT_NETWORK,
            };
        }
    }

    // The result is shown whether or not it was stored
    let use_colors = output::should_use_colors();
    println!();
    println!(
        "{}",
        output::format_result(&submission.score, Some(&submission.user.first_name), use_colors)
    );

    if offline || config.mailing_list.is_none() {
        return exit_code;
    }

    println!();
    let join = prompter
        .prompt_yes_no("Join our mailing list for founder resources?", true)
        .unwrap_or(false);
    if !join {
        return exit_code;
    }

    let (client, tag) = match open_mailing_list(config, true) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Mailing list unavailable: {:#}", e);
            return exit_code;
        }
    };
    let user = &submission.user;
    let subscriber = Subscriber::new(&user.email, &user.first_name, &user.last_name)
        .with_tag(tag.as_deref());
    match client.add_subscriber(&subscriber).await {
        Ok(_) => println!("You're subscribed. Watch your inbox!"),
        Err(e) => {
            tracing::warn!(error = %e, "subscription failed");
            println!("{}", e.user_message());
        }
    }

    exit_code
}

async fn run_submissions(config: &Config, filter: SubmissionFilter, tsv: bool) -> i32 {
    let store = open_store_or_exit(config, false);
    let submissions = match dashboard::load_submissions(&store, &filter).await {
        Ok(s) => s,
        Err(e) => fail(store_exit_code(&e), format!("Failed to load submissions: {}", e)),
    };

    if tsv {
        print!("{}", output::format_submissions_tsv(&submissions));
        return EXIT_SUCCESS;
    }

    let use_colors = output::should_use_colors();
    let summary = dashboard::BandSummary::from_submissions(&submissions);
    println!("{}", output::format_summary(&summary, use_colors));
    println!();
    println!(
        "{}",
        output::format_submissions_table(&submissions, chrono::Utc::now(), use_colors)
    );
    EXIT_SUCCESS
}

async fn run_users(config: &Config) -> i32 {
    let store = open_store_or_exit(config, false);
    let activity = match users::load_activity(&store).await {
        Ok(a) => a,
        Err(e) => fail(store_exit_code(&e), format!("Failed to load app users: {}", e)),
    };
    let content_items = match content::list(&store).await {
        Ok(items) => items.len(),
        Err(e) => fail(content_exit_code(&e), format!("Failed to load content: {}", e)),
    };

    let stats = users::UserStats::from_activity(&activity, content_items);
    println!("{}", output::format_user_stats(&stats));
    println!();
    println!("{}", output::format_users_table(&activity, output::should_use_colors()));
    EXIT_SUCCESS
}

async fn run_content(config: &Config, command: ContentCommand) -> i32 {
    let store = open_store_or_exit(config, false);

    let draft_from = |file: &str| -> ContentDraft {
        match read_input(file).and_then(|text| parse_document::<ContentDraft>(&text)) {
            Ok(draft) => draft,
            Err(e) => fail(EXIT_CONFIG, format!("Invalid content file: {:#}", e)),
        }
    };

    let result = match command {
        ContentCommand::List => content::list(&store).await.map(|items| {
            println!("{}", output::format_content_table(&items, output::should_use_colors()));
        }),
        ContentCommand::Add { file } => content::create(&store, &draft_from(&file))
            .await
            .map(|item| println!("Created {} ({})", item.slug, item.id)),
        ContentCommand::Edit { file } => content::update(&store, &draft_from(&file))
            .await
            .map(|item| println!("Updated {} ({})", item.slug, item.id)),
        ContentCommand::Remove { id } => content::delete(&store, &id)
            .await
            .map(|()| println!("Deleted {}", id)),
    };

    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => fail(content_exit_code(&e), format!("Error: {}", e)),
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        fail(EXIT_NETWORK, "Failed to install rustls crypto provider");
    }

    let cli = Cli::parse();
    founder_check::logging::init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Take { offline: false });
    let config_path = cli.config.map(PathBuf::from);

    // Init runs before config loading so it works without an existing config
    if matches!(command, Commands::Init) {
        let mut prompter = Prompter::stdio();
        match founder_check::config::init::run_init_wizard(&mut prompter, config_path) {
            Ok(Some(path)) => tracing::debug!(path = %path.display(), "config written"),
            Ok(None) => {}
            Err(e) => fail(EXIT_CONFIG, format!("Init failed: {:#}", e)),
        }
        std::process::exit(EXIT_SUCCESS);
    }

    // Load and validate config
    let config = match founder_check::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => fail(EXIT_CONFIG, format!("Config error: {:#}", e)),
    };
    if let Err(errors) = founder_check::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let code = match command {
        Commands::Take { offline } => run_take(&config, offline).await,
        Commands::Score { file, json } => {
            let answers: Answers = match read_input(&file).and_then(|text| parse_document(&text)) {
                Ok(a) => a,
                Err(e) => fail(EXIT_CONFIG, format!("Invalid answers: {:#}", e)),
            };
            let result = calculate_score(&answers);
            if json {
                match serde_json::to_string_pretty(&result) {
                    Ok(text) => println!("{}", text),
                    Err(e) => fail(EXIT_CONFIG, format!("Failed to encode result: {}", e)),
                }
            } else {
                println!("{}", output::format_result(&result, None, output::should_use_colors()));
            }
            EXIT_SUCCESS
        }
        Commands::Questions => {
            println!("{}", output::format_questions(quiz::questions(), output::should_use_colors()));
            EXIT_SUCCESS
        }
        Commands::Subscribe {
            email,
            first_name,
            last_name,
        } => {
            let (client, tag) = match open_mailing_list(&config, true) {
                Ok(pair) => pair,
                Err(e) => fail(EXIT_CONFIG, format!("Mailing list error: {:#}", e)),
            };
            let subscriber = Subscriber::new(&email, &first_name, &last_name).with_tag(tag.as_deref());
            match client.add_subscriber(&subscriber).await {
                Ok(id) => {
                    println!("Subscribed {} ({})", subscriber.email, id);
                    EXIT_SUCCESS
                }
                Err(e) => {
                    tracing::debug!(error = %e, "subscribe failed");
                    eprintln!("{}", e.user_message());
                    subscribe_exit_code(&e)
                }
            }
        }
        Commands::Submissions { filter, tsv } => run_submissions(&config, filter.into(), tsv).await,
        Commands::Users => run_users(&config).await,
        Commands::Dashboard { filter } => {
            let store = Arc::new(open_store_or_exit(&config, true));
            let theme = tui::resolve_theme(cli.theme);
            let app = tui::App::new_loading(config.clone(), theme, store.describe());
            match tui::run_tui(app, store, filter.into()).await {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => fail(EXIT_NETWORK, format!("Dashboard error: {:#}", e)),
            }
        }
        Commands::Content { command } => run_content(&config, command).await,
        Commands::Init => EXIT_SUCCESS,
    };

    std::process::exit(code);
}
