//! The interactive quiz: questions, respondent details, scoring.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::prompt::Prompter;
use crate::quiz::{Advance, QuizSession};
use crate::submission::{Submission, UserInfo};

const INTRO: &str = "Founder Readiness Check\n\
    Ten quick questions about where your idea stands. Pick an answer by number.";

/// Walk the respondent through every question, then collect their details.
///
/// "b" at a question goes back one step. The session is owned here and
/// consumed on completion, so a finished quiz cannot be changed.
pub fn run_quiz<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<Submission> {
    p.typewriter(INTRO)?;

    let mut session = QuizSession::new();
    loop {
        let question = session.current();
        p.println("")?;
        p.println(&format!(
            "Question {} of {}: {}",
            session.step() + 1,
            session.total(),
            question.prompt
        ))?;

        let labels = question.option_labels();
        let current = session
            .selected()
            .and_then(|value| question.label_for(&value))
            .and_then(|label| labels.iter().position(|l| *l == label));

        match p.choose_or_back(&labels, current)? {
            None => {
                if !session.back() {
                    p.println("  Already at the first question.")?;
                }
            }
            Some(index) => {
                let value = question
                    .option_value(index)
                    .context("Selected option does not exist")?;
                session.select(value)?;
                if session.next() == Advance::Details {
                    break;
                }
            }
        }
    }

    p.println("")?;
    p.println("Almost done. Tell us where to send your results.")?;
    let user = collect_user_info(p)?;

    let submission = session.finish(user)?;
    tracing::info!(
        base_score = submission.score.base_score,
        band = %submission.score.score_band,
        "quiz completed"
    );
    Ok(submission)
}

/// Ask for name, email and location until every field validates
pub fn collect_user_info<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<UserInfo> {
    let mut user = UserInfo::default();
    loop {
        let first_name = ask(p, "First name", &user.first_name)?;
        let last_name = ask(p, "Last name", &user.last_name)?;
        let email = ask(p, "Email", &user.email)?;
        let location = p.prompt_optional("Location")?;

        user = UserInfo::new(&first_name, &last_name, &email).with_location(location.as_deref());
        match user.validate() {
            Ok(()) => return Ok(user),
            Err(errors) => {
                for error in errors {
                    p.println(&format!("  {}", error))?;
                }
            }
        }
    }
}

/// Re-asks keep what was typed last time as the default
fn ask<R: BufRead, W: Write>(p: &mut Prompter<R, W>, label: &str, previous: &str) -> Result<String> {
    if previous.is_empty() {
        p.prompt(&format!("{}: ", label))
    } else {
        p.prompt_with_default(label, previous)
    }
}
