//! Generation request rules: styles, prompt bounds, upload limits, and
//! history paging.
//!
//! Everything here is pure validation; the simulated processing lives in
//! [`crate::simulator`] and artifact persistence in [`crate::artifact`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum prompt length in characters.
pub const PROMPT_MIN_CHARS: u64 = 3;
/// Maximum prompt length in characters.
pub const PROMPT_MAX_CHARS: u64 = 280;

/// Maximum accepted upload size (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted for the source image.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Status stored on every persisted generation. Failures are never persisted.
pub const STATUS_COMPLETED: &str = "completed";

/// History page size when `limit` is omitted.
pub const DEFAULT_HISTORY_LIMIT: i64 = 5;
/// Smallest accepted history page size.
pub const MIN_HISTORY_LIMIT: i64 = 1;
/// Largest accepted history page size.
pub const MAX_HISTORY_LIMIT: i64 = 20;

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Fixed set of styles a generation can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Style {
    #[serde(rename = "Avant-garde")]
    AvantGarde,
    Streetwear,
    #[default]
    Minimalist,
    Formal,
    Retro,
}

impl Style {
    /// Every style, in display order.
    pub const ALL: [Style; 5] = [
        Style::AvantGarde,
        Style::Streetwear,
        Style::Minimalist,
        Style::Formal,
        Style::Retro,
    ];

    /// The wire / storage name of this style.
    pub fn as_str(self) -> &'static str {
        match self {
            Style::AvantGarde => "Avant-garde",
            Style::Streetwear => "Streetwear",
            Style::Minimalist => "Minimalist",
            Style::Formal => "Formal",
            Style::Retro => "Retro",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Style::ALL.iter().map(|s| s.as_str()).collect();
                format!("Invalid style '{s}'. Must be one of: {}", names.join(", "))
            })
    }
}

fn validate_style(style: &str) -> Result<(), ValidationError> {
    style.parse::<Style>().map(|_| ()).map_err(|msg| {
        let mut err = ValidationError::new("invalid_style");
        err.message = Some(msg.into());
        err
    })
}

// ---------------------------------------------------------------------------
// Generation input
// ---------------------------------------------------------------------------

/// Text fields of a generation request, as submitted by the client.
///
/// `style` is optional on the wire; an absent style means
/// [`Style::Minimalist`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GenerationInput {
    #[validate(length(
        min = "PROMPT_MIN_CHARS",
        max = "PROMPT_MAX_CHARS",
        message = "Prompt must be between 3 and 280 characters"
    ))]
    pub prompt: String,
    #[validate(custom(function = "validate_style"))]
    pub style: Option<String>,
}

impl GenerationInput {
    /// Validate the input and resolve the effective style.
    pub fn validated(&self) -> Result<(String, Style), ValidationErrors> {
        self.validate()?;
        let style = match self.style.as_deref() {
            Some(raw) => raw.parse::<Style>().unwrap_or_default(),
            None => Style::default(),
        };
        Ok((self.prompt.clone(), style))
    }
}

// ---------------------------------------------------------------------------
// History paging
// ---------------------------------------------------------------------------

#[derive(Debug, Validate)]
struct HistoryLimit {
    #[validate(range(
        min = "MIN_HISTORY_LIMIT",
        max = "MAX_HISTORY_LIMIT",
        message = "Limit must be between 1 and 20"
    ))]
    limit: i64,
}

/// Resolve the raw `?limit=` query value into a page size.
///
/// Absent means [`DEFAULT_HISTORY_LIMIT`]. Non-numeric or out-of-range
/// values are rejected, never clamped.
pub fn resolve_history_limit(raw: Option<&str>) -> Result<i64, ValidationErrors> {
    let limit = match raw {
        None => DEFAULT_HISTORY_LIMIT,
        Some(value) => value.trim().parse::<i64>().map_err(|_| {
            let mut errors = ValidationErrors::new();
            let mut err = ValidationError::new("invalid_number");
            err.message = Some("Limit must be a number".into());
            errors.add("limit", err);
            errors
        })?,
    };
    HistoryLimit { limit }.validate()?;
    Ok(limit)
}

// ---------------------------------------------------------------------------
// Upload checks
// ---------------------------------------------------------------------------

/// Whether `content_type` is one of [`ALLOWED_IMAGE_TYPES`].
pub fn is_allowed_image_type(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
