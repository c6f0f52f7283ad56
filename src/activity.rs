//! Rich-presence activity payload.
//!
//! An [`Activity`] is carried by [`SetActivityPacket`](crate::packet::SetActivityPacket)
//! and serialized into its `args.activity` field. Unset optional fields are
//! omitted from the JSON.
//!
//! # Example
//!
//! ```
//! use presence_ipc::activity::Activity;
//! use presence_ipc::validation::Validate;
//!
//! let activity = Activity::new("Editing main.rs", "Workspace: presence-ipc")
//!     .with_timestamps(1_700_000_000, None)
//!     .with_large_image("rust", Some("Rust"))
//!     .with_button("Repository", "https://example.com/repo");
//!
//! assert!(activity.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::validation::{
    validate_each, validate_non_negative, validate_optional, validate_optional_text,
    validate_text, Validate, ValidationError, Violation,
};

/// The presence shown on the user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub details: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Timestamps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Assets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Secrets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Button>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<bool>,
}

/// Unix timestamps (seconds) for elapsed / remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub start: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

/// Image keys and hover texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_text: Option<String>,
}

/// Party the user is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub size: PartySize,
}

/// `[current, max]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySize(pub u32, pub u32);

/// Join / spectate secrets. Mutually exclusive with buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<String>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectate: Option<String>,
}

/// A link button under the presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub url: String,
}

impl Activity {
    /// Create an activity with the two required lines.
    pub fn new(details: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            details: details.into(),
            state: state.into(),
            timestamps: None,
            assets: None,
            party: None,
            secrets: None,
            buttons: None,
            instance: None,
        }
    }

    /// Set start and optional end timestamps.
    pub fn with_timestamps(mut self, start: i64, end: Option<i64>) -> Self {
        self.timestamps = Some(Timestamps { start, end });
        self
    }

    /// Set the large image key and hover text.
    pub fn with_large_image(mut self, key: impl Into<String>, text: Option<&str>) -> Self {
        let assets = self.assets.get_or_insert_with(Assets::default);
        assets.large_image = Some(key.into());
        assets.large_text = text.map(str::to_string);
        self
    }

    /// Set the small image key and hover text.
    pub fn with_small_image(mut self, key: impl Into<String>, text: Option<&str>) -> Self {
        let assets = self.assets.get_or_insert_with(Assets::default);
        assets.small_image = Some(key.into());
        assets.small_text = text.map(str::to_string);
        self
    }

    /// Set the party id and size.
    pub fn with_party(mut self, id: impl Into<String>, current: u32, max: u32) -> Self {
        self.party = Some(Party {
            id: id.into(),
            size: PartySize(current, max),
        });
        self
    }

    /// Set the join / spectate secrets.
    pub fn with_secrets(mut self, secrets: Secrets) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Append a link button.
    pub fn with_button(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.buttons.get_or_insert_with(Vec::new).push(Button {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    /// Mark the activity as an instanced game session.
    pub fn with_instance(mut self, instance: bool) -> Self {
        self.instance = Some(instance);
        self
    }

    fn has_buttons(&self) -> bool {
        self.buttons.as_ref().is_some_and(|b| !b.is_empty())
    }
}

impl Validate for Activity {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("details", &self.details)?;
        validate_text("state", &self.state)?;
        validate_optional("timestamps", self.timestamps.as_ref())?;
        validate_optional("assets", self.assets.as_ref())?;
        validate_optional("party", self.party.as_ref())?;
        validate_optional("secrets", self.secrets.as_ref())?;
        if let Some(buttons) = &self.buttons {
            validate_each("buttons", buttons)?;
        }

        // The client rejects presences that carry both.
        if self.secrets.is_some() && self.has_buttons() {
            return Err(ValidationError::new(
                "buttons",
                Violation::Exclusive { other: "secrets" },
            ));
        }

        Ok(())
    }
}

impl Validate for Timestamps {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_non_negative("start", self.start)?;
        if let Some(end) = self.end {
            validate_non_negative("end", end)?;
        }
        Ok(())
    }
}

impl Validate for Assets {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_optional_text("large_image", self.large_image.as_deref())?;
        validate_optional_text("large_text", self.large_text.as_deref())?;
        validate_optional_text("small_image", self.small_image.as_deref())?;
        validate_optional_text("small_text", self.small_text.as_deref())
    }
}

impl Validate for Party {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("id", &self.id)
    }
}

impl Validate for Secrets {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_optional_text("join", self.join.as_deref())?;
        validate_optional_text("match", self.match_secret.as_deref())?;
        validate_optional_text("spectate", self.spectate.as_deref())
    }
}

impl Validate for Button {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("label", &self.label)?;
        validate_text("url", &self.url)
    }
}
