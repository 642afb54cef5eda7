//! # xpost
//!
//! Command-line entry point: composes the message, optionally uploads an image,
//! and posts the tweet with OAuth 1.0a User Context credentials.
//!
//! ## Environment Variables
//!
//! - `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`
//! - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`
//! - `TWITTER_DEBUG`: `1` enables masked OAuth diagnostics
//! - `RUST_LOG`: Log filter (defaults to `info`)

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use log::info;

use xpost::message::{check_tweet_length, Reminder};
use xpost::{AppConfig, PublishError, Publisher, TwitterClient};

/// Publish a tweet, optionally with an image, using OAuth 1.0a credentials.
#[derive(Debug, Parser)]
#[command(name = "xpost", version, about)]
struct Cli {
    /// Literal tweet text. When absent, a reminder is composed from the options below.
    #[arg(
        long,
        conflicts_with_all = ["mention", "since", "event", "amount", "reference", "hashtag"]
    )]
    text: Option<String>,

    /// Account to address in the reminder
    #[arg(long, required_unless_present = "text")]
    mention: Option<String>,

    /// Start date of the days-since counter (YYYY-MM-DD)
    #[arg(long, required_unless_present = "text")]
    since: Option<NaiveDate>,

    /// What happened on the start date
    #[arg(long, default_value = "this was first raised")]
    event: String,

    /// Disputed amount appended to the event, e.g. "INR 352000"
    #[arg(long)]
    amount: Option<String>,

    /// Extra reference line, such as a ticket number
    #[arg(long)]
    reference: Option<String>,

    /// Hashtag to append; repeat for more
    #[arg(long = "hashtag")]
    hashtag: Vec<String>,

    /// Image to attach
    #[arg(long)]
    image: Option<PathBuf>,

    /// Print the composed message and exit without posting
    #[arg(long)]
    dry_run: bool,

    /// Log masked OAuth signing diagnostics (same as TWITTER_DEBUG=1)
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn compose(&self) -> String {
        match (&self.text, &self.mention, self.since) {
            (Some(text), _, _) => text.clone(),
            (None, Some(mention), Some(since)) => Reminder {
                mention: mention.clone(),
                since,
                event: self.event.clone(),
                amount: self.amount.clone(),
                reference: self.reference.clone(),
                hashtags: self.hashtag.clone(),
            }
            .render_today(),
            // clap enforces mention and since when text is absent
            _ => String::new(),
        }
    }
}

/// Runs one invocation.
///
/// Publish failures are reported here and come back as `ExitCode::FAILURE`;
/// anything returned as `Err` has not been reported yet.
async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    let text = cli.compose();
    println!("Tweet text:");
    println!("{}", text);
    check_tweet_length(&text)?;

    if cli.dry_run {
        info!("Dry run requested, not posting");
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = AppConfig::from_env();
    config.debug |= cli.debug;

    let client = TwitterClient::from_config(&config);
    let mut publisher = Publisher::new(&client);

    match publisher.publish(&text, cli.image.as_deref()).await {
        Ok(response) => {
            println!("Tweet posted successfully:");
            println!("{}", response);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report_failure(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_failure(e: &PublishError) {
    eprintln!("Failed to post tweet [{}]", e.kind());
    if let Some(status) = e.status() {
        eprintln!("HTTP status: {}", status);
    }
    eprintln!("{}", e);
    if let PublishError::MissingCredentials { .. } = e {
        eprintln!("Provide these environment variables for OAuth 1.0a user context:");
        eprintln!("  TWITTER_CONSUMER_KEY, TWITTER_CONSUMER_SECRET,");
        eprintln!("  TWITTER_ACCESS_TOKEN, TWITTER_ACCESS_TOKEN_SECRET");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logging system
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("xpost failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
