//! Flattening of native post JSON into analytical rows.
//!
//! The mapper is pure: the same post always produces byte-identical output.
//! Structures the platform guarantees (`id_str`, `created_at`, `user`,
//! `entities`) are required; everything else may be absent and serializes as
//! an explicit `null` (or an empty array for entity lists).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MapError;

/// Format of `created_at` in REST v1.1 payloads: `Wed Oct 10 20:19:24 +0000 2018`.
const LEGACY_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

const REQUIRED_FIELDS: [&str; 4] = ["id_str", "created_at", "user", "entities"];

/// A post exactly as the platform returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPost(pub Value);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentionEntity {
    pub screen_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextEntity {
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlEntity {
    pub expanded_url: Option<String>,
}

/// One flat row of the destination table. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticalRow {
    /// UTC calendar date of `created_at`, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// `created_at` exactly as received.
    pub date_string: String,
    pub id_str: String,
    pub text: Option<String>,
    pub full_text: Option<String>,
    pub truncated: Option<bool>,
    pub source: Option<String>,
    pub entities_user_mentions: Vec<MentionEntity>,
    pub entities_hashtags: Vec<TextEntity>,
    pub entities_symbols: Vec<TextEntity>,
    pub entities_urls: Vec<UrlEntity>,
    pub in_reply_to_status_id_str: Option<String>,
    pub in_reply_to_user_id_str: Option<String>,
    pub in_reply_to_screen_name: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_screen_name: Option<String>,
    pub user_location: Option<String>,
    pub user_description: Option<String>,
    pub user_url: Option<String>,
    pub user_followers: Option<i64>,
    pub user_friends: Option<i64>,
    pub user_created_at: Option<String>,
    pub user_listed_count: Option<i64>,
    pub user_favourites: Option<i64>,
    pub user_statuses: Option<i64>,
    pub user_image: Option<String>,
    pub is_quote_status: Option<bool>,
    pub retweet_count: Option<i64>,
    pub favorite_count: Option<i64>,
    pub favorited: Option<bool>,
    pub retweeted: Option<bool>,
    pub possibly_sensitive: Option<bool>,
    pub lang: Option<String>,
    pub is_retweet: bool,
    /// The whole source post, serialized once.
    pub full_json_string: String,
}

#[derive(Deserialize)]
struct PostView {
    id_str: String,
    created_at: String,
    text: Option<String>,
    full_text: Option<String>,
    truncated: Option<bool>,
    source: Option<String>,
    entities: EntitiesView,
    in_reply_to_status_id_str: Option<String>,
    in_reply_to_user_id_str: Option<String>,
    in_reply_to_screen_name: Option<String>,
    user: UserView,
    is_quote_status: Option<bool>,
    retweet_count: Option<i64>,
    favorite_count: Option<i64>,
    favorited: Option<bool>,
    retweeted: Option<bool>,
    possibly_sensitive: Option<bool>,
    lang: Option<String>,
}

#[derive(Deserialize)]
struct EntitiesView {
    #[serde(default)]
    user_mentions: Option<Vec<MentionView>>,
    #[serde(default)]
    hashtags: Option<Vec<TextView>>,
    #[serde(default)]
    symbols: Option<Vec<TextView>>,
    #[serde(default)]
    urls: Option<Vec<UrlView>>,
}

#[derive(Deserialize)]
struct MentionView {
    screen_name: Option<String>,
}

#[derive(Deserialize)]
struct TextView {
    text: Option<String>,
}

#[derive(Deserialize)]
struct UrlView {
    expanded_url: Option<String>,
}

#[derive(Deserialize)]
struct UserView {
    id_str: Option<String>,
    name: Option<String>,
    screen_name: Option<String>,
    location: Option<String>,
    description: Option<String>,
    url: Option<String>,
    followers_count: Option<i64>,
    friends_count: Option<i64>,
    created_at: Option<String>,
    listed_count: Option<i64>,
    favourites_count: Option<i64>,
    statuses_count: Option<i64>,
    profile_image_url_https: Option<String>,
}

/// True iff `content` starts with the literal, case-sensitive `"RT @"`.
#[must_use]
pub fn is_retweet(content: &str) -> bool {
    content.starts_with("RT @")
}

/// Parses a v1.1 `created_at` (or an RFC 3339 timestamp) into its UTC date.
#[must_use]
pub fn utc_date(created_at: &str) -> Option<NaiveDate> {
    DateTime::parse_from_str(created_at, LEGACY_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(created_at))
        .ok()
        .map(|ts| ts.with_timezone(&Utc).date_naive())
}

/// Maps one post to one row.
///
/// # Errors
///
/// Returns [`MapError`] when a contract-guaranteed field is absent or
/// malformed, or `created_at` does not parse.
pub fn map_post(post: &RawPost) -> Result<AnalyticalRow, MapError> {
    let object = post.0.as_object().ok_or(MapError::NotAnObject)?;
    let id = object
        .get("id_str")
        .and_then(Value::as_str)
        .map(str::to_owned);
    for field in REQUIRED_FIELDS {
        if object.get(field).is_none_or(Value::is_null) {
            return Err(MapError::MissingField { id, field });
        }
    }

    let view = PostView::deserialize(&post.0).map_err(|source| MapError::Malformed {
        id: id.clone().unwrap_or_default(),
        source,
    })?;
    let date = utc_date(&view.created_at).ok_or_else(|| MapError::InvalidTimestamp {
        id: view.id_str.clone(),
        raw: view.created_at.clone(),
    })?;
    let full_json_string =
        serde_json::to_string(&post.0).map_err(|source| MapError::Malformed {
            id: view.id_str.clone(),
            source,
        })?;

    let text = view.text.filter(|t| !t.is_empty());
    let full_text = view.full_text.filter(|t| !t.is_empty());
    let retweet = full_text
        .as_deref()
        .or(text.as_deref())
        .is_some_and(is_retweet);

    let entities = view.entities;
    let user = view.user;

    Ok(AnalyticalRow {
        date,
        date_string: view.created_at,
        id_str: view.id_str,
        text,
        full_text,
        truncated: view.truncated,
        source: view.source,
        entities_user_mentions: entities
            .user_mentions
            .unwrap_or_default()
            .into_iter()
            .map(|m| MentionEntity {
                screen_name: m.screen_name,
            })
            .collect(),
        entities_hashtags: project_text(entities.hashtags),
        entities_symbols: project_text(entities.symbols),
        entities_urls: entities
            .urls
            .unwrap_or_default()
            .into_iter()
            .map(|u| UrlEntity {
                expanded_url: u.expanded_url,
            })
            .collect(),
        in_reply_to_status_id_str: view.in_reply_to_status_id_str,
        in_reply_to_user_id_str: view.in_reply_to_user_id_str,
        in_reply_to_screen_name: view.in_reply_to_screen_name,
        user_id: user.id_str,
        user_name: user.name,
        user_screen_name: user.screen_name,
        user_location: user.location,
        user_description: user.description,
        user_url: user.url,
        user_followers: user.followers_count,
        user_friends: user.friends_count,
        user_created_at: user.created_at,
        user_listed_count: user.listed_count,
        user_favourites: user.favourites_count,
        user_statuses: user.statuses_count,
        user_image: user.profile_image_url_https,
        is_quote_status: view.is_quote_status,
        retweet_count: view.retweet_count,
        favorite_count: view.favorite_count,
        favorited: view.favorited,
        retweeted: view.retweeted,
        possibly_sensitive: view.possibly_sensitive,
        lang: view.lang,
        is_retweet: retweet,
        full_json_string,
    })
}

fn project_text(items: Option<Vec<TextView>>) -> Vec<TextEntity> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|t| TextEntity { text: t.text })
        .collect()
}

#[cfg(test)]
#[path = "row_test.rs"]
mod tests;
