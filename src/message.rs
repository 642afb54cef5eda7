//! Message composition.
//!
//! Builds the reminder text posted by the CLI: an addressed mention, a
//! days-since counter, an optional reference line and hashtags, one per line.

use chrono::{NaiveDate, Utc};

use crate::error::MessageError;

/// Twitter's character limit for a single tweet.
pub const MAX_TWEET_CHARS: usize = 280;

/// Whole days elapsed from `start` to `today`. Negative when `start` is in the future.
pub fn days_since(start: NaiveDate, today: NaiveDate) -> i64 {
    (today - start).num_days()
}

/// A recurring "it has been N days" reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Account to address, with or without the leading `@`.
    pub mention: String,
    /// Date the counter starts from.
    pub since: NaiveDate,
    /// What happened on `since`, completing "It has been N days since ...".
    pub event: String,
    /// Disputed amount appended to the event, e.g. `INR 352000`.
    pub amount: Option<String>,
    /// Extra line such as a complaint or ticket number.
    pub reference: Option<String>,
    /// Hashtags, with or without the leading `#`.
    pub hashtags: Vec<String>,
}

impl Reminder {
    /// Renders the reminder as of `today`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use xpost::message::Reminder;
    ///
    /// let reminder = Reminder {
    ///     mention: "support".to_string(),
    ///     since: NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
    ///     event: "my ticket was opened".to_string(),
    ///     amount: None,
    ///     reference: None,
    ///     hashtags: vec!["StillWaiting".to_string()],
    /// };
    /// let text = reminder.render(NaiveDate::from_ymd_opt(2024, 7, 7).unwrap());
    /// assert!(text.contains("It has been 10 days since my ticket was opened."));
    /// ```
    pub fn render(&self, today: NaiveDate) -> String {
        let mut event = self.event.trim().trim_end_matches('.').to_string();
        if let Some(amount) = self.amount.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            event.push(' ');
            event.push_str(amount.trim_end_matches('.'));
        }

        let mut lines = vec![
            format!("Gentle reminder @{}", self.mention.trim_start_matches('@')),
            String::new(),
            format!(
                "It has been {} days since {}.",
                days_since(self.since, today),
                event
            ),
        ];

        if let Some(reference) = self.reference.as_deref().filter(|r| !r.trim().is_empty()) {
            lines.push(String::new());
            lines.push(reference.to_string());
        }

        let tags: Vec<String> = self
            .hashtags
            .iter()
            .map(|t| t.trim().trim_start_matches('#'))
            .filter(|t| !t.is_empty())
            .map(|t| format!("#{}", t))
            .collect();
        if !tags.is_empty() {
            lines.push(String::new());
            lines.extend(tags);
        }

        lines.join("\n")
    }

    /// Renders the reminder as of the current UTC date.
    pub fn render_today(&self) -> String {
        self.render(Utc::now().date_naive())
    }
}

/// Validates that `text` is non-empty and within [`MAX_TWEET_CHARS`].
pub fn check_tweet_length(text: &str) -> Result<(), MessageError> {
    if text.trim().is_empty() {
        return Err(MessageError::Empty);
    }
    let length = text.chars().count();
    if length > MAX_TWEET_CHARS {
        return Err(MessageError::TooLong {
            length,
            max: MAX_TWEET_CHARS,
        });
    }
    Ok(())
}
