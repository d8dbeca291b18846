//! Enumerated states stored as text columns.
//!
//! Each enum round-trips through its lowercase name (`as_str` / `FromStr`),
//! which is also its JSON form and its database representation.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error for a text value that matches no variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: '{value}'")]
pub struct InvalidVariant {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The lowercase name used in JSON and in the database.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = InvalidVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(InvalidVariant { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

/// Lifecycle of a scheduled social post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Waiting for its scheduled time.
    #[default]
    Scheduled,
    /// Published successfully.
    Posted,
    /// Publishing failed; see the post's error message.
    Failed,
}

text_enum!(PostStatus, "post status", {
    Scheduled => "scheduled",
    Posted => "posted",
    Failed => "failed",
});

impl PostStatus {
    /// Whether a post in this state may still be edited.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Scheduled)
    }
}

/// Social platforms an account can be connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Facebook,
    Instagram,
    Twitter,
    Linkedin,
}

text_enum!(SocialPlatform, "social platform", {
    Facebook => "facebook",
    Instagram => "instagram",
    Twitter => "twitter",
    Linkedin => "linkedin",
});

/// Subscription tier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    Business,
}

text_enum!(SubscriptionTier, "subscription tier", {
    Free => "free",
    Pro => "pro",
    Business => "business",
});

impl SubscriptionTier {
    /// Maximum number of variations a single `/api/adburst` call may request.
    #[must_use]
    pub const fn max_variations(self) -> usize {
        match self {
            Self::Free => 2,
            Self::Pro | Self::Business => 4,
        }
    }
}

/// What a creation was generated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreationKind {
    /// Printable or shareable flyer.
    #[default]
    Flyer,
    /// Social ad variation produced by `/api/adburst`.
    Ad,
}

text_enum!(CreationKind, "creation kind", {
    Flyer => "flyer",
    Ad => "ad",
});
