//! Contact and support desk.
//!
//! Form validation, the FAQ accordion, the message length meter and the
//! simulated (always successful) submissions.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::ValidationErrors;

/// `local@domain.tld` with no whitespace and exactly one `@`.
#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Simulated round trip for the support form.
pub const SUBMIT_DELAY: Duration = Duration::from_millis(2000);

/// Simulated round trip for the newsletter form.
pub const SUBSCRIBE_DELAY: Duration = Duration::from_millis(1500);

/// How long a banner stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

pub const SUBMIT_SUCCESS: &str = "Thank you! Your message has been sent successfully. \
     We'll get back to you within 2 hours.";

pub const SUBSCRIBE_SUCCESS: &str = "Thank you for subscribing! \
     You'll receive updates about new features and safety tips.";

pub const INVALID_EMAIL: &str = "Please enter a valid email address";

/// Names of every support form field, as cached by the field store.
pub const FORM_FIELDS: [&str; 5] = ["name", "email", "subject", "category", "message"];

#[must_use]
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Support form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    /// Free choice, never validated
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Check every required field, collecting all failures in field order.
    ///
    /// # Errors
    ///
    /// Returns every failed rule; displays as one comma-joined message.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().chars().count() < 2 {
            errors.push("Name must be at least 2 characters long");
        }
        if !validate_email(&self.email) {
            errors.push(INVALID_EMAIL);
        }
        if self.subject.trim().chars().count() < 5 {
            errors.push("Subject must be at least 5 characters long");
        }
        if self.message.trim().chars().count() < 10 {
            errors.push("Message must be at least 10 characters long");
        }

        errors.into_result()
    }
}

/// Newsletter sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

impl SubscribeForm {
    /// # Errors
    ///
    /// Returns the invalid-email message.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !validate_email(&self.email) {
            errors.push(INVALID_EMAIL);
        }
        errors.into_result()
    }
}

/// Validate and "send" the support form.
///
/// Nothing leaves the process; success arrives after `delay`.
///
/// # Errors
///
/// Returns the validation failures without waiting.
pub async fn submit(form: &ContactForm, delay: Duration) -> Result<&'static str, ValidationErrors> {
    if let Err(errors) = form.validate() {
        debug!(problems = errors.messages().len(), "support form rejected: {errors}");
        return Err(errors);
    }
    tokio::time::sleep(delay).await;
    info!(category = %form.category, "support request received from {}", form.email);
    Ok(SUBMIT_SUCCESS)
}

/// Validate and "send" a newsletter sign-up.
///
/// # Errors
///
/// Returns the validation failure without waiting.
pub async fn subscribe(form: &SubscribeForm, delay: Duration) -> Result<&'static str, ValidationErrors> {
    form.validate()?;
    tokio::time::sleep(delay).await;
    info!("newsletter subscription for {}", form.email);
    Ok(SUBSCRIBE_SUCCESS)
}

/// Banner tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A transient banner shown above the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// FAQ list where at most one answer is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqAccordion {
    open: Option<usize>,
}

impl FaqAccordion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accordion with `open` already expanded.
    #[must_use]
    pub fn with_open(open: Option<usize>) -> Self {
        Self { open }
    }

    /// Click on question `index`: opens it and closes the rest, or closes
    /// it if it was already open.
    pub fn toggle(&mut self, index: usize) {
        self.open = if self.open == Some(index) { None } else { Some(index) };
    }

    #[must_use]
    pub fn is_open(&self, index: usize) -> bool {
        self.open == Some(index)
    }

    #[must_use]
    pub fn open_index(&self) -> Option<usize> {
        self.open
    }
}

/// Questions and answers shown on the support page.
pub const FAQ_ITEMS: [(&str, &str); 5] = [
    (
        "How do I send an SOS alert?",
        "Press and hold the SOS button in the Rakshita app for three seconds. \
         Your location and a short alert are shared with your emergency contacts.",
    ),
    (
        "Who can see my location?",
        "Only the contacts you have approved, and only while an alert is active.",
    ),
    (
        "What happens when an alert is resolved?",
        "Location sharing stops and the alert moves to your history as resolved.",
    ),
    (
        "Does the app work without mobile data?",
        "Alerts fall back to SMS when there is no data connection.",
    ),
    (
        "How quickly will support reply?",
        "We answer every support message within 2 hours.",
    ),
];

/// A helpline listed on the support page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmergencyService {
    pub name: &'static str,
    pub number: &'static str,
}

impl EmergencyService {
    /// Question asked before dialing.
    #[must_use]
    pub fn confirm_prompt(&self) -> String {
        format!("Do you want to call {} at {}?", self.name, self.number)
    }

    /// Banner shown once the call is confirmed.
    #[must_use]
    pub fn call_notice(&self) -> Notice {
        Notice::success(format!("Initiating call to {}...", self.name))
    }
}

pub const EMERGENCY_SERVICES: [EmergencyService; 5] = [
    EmergencyService { name: "National Emergency", number: "112" },
    EmergencyService { name: "Police", number: "100" },
    EmergencyService { name: "Fire", number: "101" },
    EmergencyService { name: "Ambulance", number: "102" },
    EmergencyService { name: "Women Helpline", number: "1091" },
];

pub const SUPPORT_EMAIL: &str = "support@rakshita.in";
pub const SUPPORT_PHONE: &str = "+91 1800 123 4567";

/// Ways to reach the support team besides the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportChannel {
    Email,
    Phone,
    LiveChat,
}

/// What clicking a channel card does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    /// Hand the URL to the browser (mail client).
    Open(String),
    /// Show a banner.
    Notify(Notice),
}

impl SupportChannel {
    pub const ALL: [Self; 3] = [Self::Email, Self::Phone, Self::LiveChat];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::LiveChat => "chat",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Email => "Email Support",
            Self::Phone => "Phone Support",
            Self::LiveChat => "Live Chat",
        }
    }

    #[must_use]
    pub const fn detail(self) -> &'static str {
        match self {
            Self::Email => SUPPORT_EMAIL,
            Self::Phone => SUPPORT_PHONE,
            Self::LiveChat => "Available 24/7",
        }
    }

    /// Confirmation asked before acting, if any.
    #[must_use]
    pub fn confirm_prompt(self) -> Option<String> {
        match self {
            Self::Phone => Some(format!("Do you want to call {SUPPORT_PHONE}?")),
            Self::Email | Self::LiveChat => None,
        }
    }

    #[must_use]
    pub fn action(self) -> ChannelAction {
        match self {
            Self::Email => ChannelAction::Open(format!("mailto:{SUPPORT_EMAIL}")),
            Self::Phone => ChannelAction::Notify(Notice::success("Initiating call...")),
            Self::LiveChat => {
                ChannelAction::Notify(Notice::success("Live chat feature coming soon!"))
            }
        }
    }
}

impl std::str::FromStr for SupportChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown support channel: {s}"))
    }
}

/// Soft limit for the message textarea.
pub const MESSAGE_LIMIT: usize = 1000;

/// How close a message is to the length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthLevel {
    Normal,
    /// Past 80% of the limit
    Warning,
    /// Past the limit
    Over,
}

impl LengthLevel {
    #[must_use]
    pub fn of(message: &str) -> Self {
        let len = message.chars().count();
        if len > MESSAGE_LIMIT {
            Self::Over
        } else if len * 10 > MESSAGE_LIMIT * 8 {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    /// Border color for the textarea.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Normal => "#eee",
            Self::Warning => "#f39c12",
            Self::Over => "#e74c3c",
        }
    }
}
