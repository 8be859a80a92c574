//! Twitter v1.1 response types.
//!
//! Timeline posts are deliberately NOT modelled here: they are passed through
//! as raw `serde_json::Value`s so that downstream consumers keep every field,
//! including ones this crate does not know about.

use serde::Deserialize;

/// Response from `POST oauth2/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
}

/// One page of `GET lists/members.json`.
#[derive(Debug, Deserialize)]
pub struct ListMembersPage {
    #[serde(default)]
    pub users: Vec<ListMember>,
    /// `"0"` on the last page.
    #[serde(default = "last_cursor")]
    pub next_cursor_str: String,
}

fn last_cursor() -> String {
    "0".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ListMember {
    pub screen_name: String,
}

/// Error envelope used by most v1.1 endpoints:
/// `{"errors": [{"code": 34, "message": "Sorry, that page does not exist."}]}`.
///
/// Protected timelines answer with `{"request": "...", "error": "Not authorized."}`
/// instead, so both shapes are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

impl ErrorBody {
    /// First human-readable message in the envelope, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.errors
            .first()
            .map(|e| match e.code {
                Some(code) => format!("{} (code {code})", e.message),
                None => e.message.clone(),
            })
            .or_else(|| self.error.clone())
    }
}
