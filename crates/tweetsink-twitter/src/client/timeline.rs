//! Multi-page `statuses/user_timeline` fetches for `TwitterClient`.

use serde_json::Value;

use crate::error::TwitterError;

use super::TwitterClient;

/// Largest page the timeline endpoint serves.
pub(super) const TIMELINE_PAGE_SIZE: usize = 200;

impl TwitterClient {
    /// Fetches one page of an account's timeline containing posts strictly
    /// newer than `since_id` and, when given, no newer than `max_id`.
    ///
    /// Posts are returned as raw JSON so no field is lost.
    ///
    /// # Errors
    ///
    /// - [`TwitterError::Api`] for suspended, deleted, or protected accounts.
    /// - [`TwitterError::RateLimited`] / [`TwitterError::Server`] after retries.
    /// - [`TwitterError::Deserialize`] if the body is not a JSON array.
    pub async fn user_timeline_page(
        &self,
        screen_name: &str,
        since_id: &str,
        max_id: Option<&str>,
    ) -> Result<Vec<Value>, TwitterError> {
        let count = TIMELINE_PAGE_SIZE.to_string();
        let mut params = vec![
            ("screen_name", screen_name),
            ("since_id", since_id),
            ("count", count.as_str()),
            ("tweet_mode", "extended"),
            ("include_rts", "true"),
        ];
        if let Some(max_id) = max_id {
            params.push(("max_id", max_id));
        }

        let context = format!("user_timeline({screen_name})");
        let url = self.endpoint("1.1/statuses/user_timeline.json", &params);
        let body = self.get_json(&url, &context).await?;
        serde_json::from_value(body).map_err(|e| TwitterError::Deserialize { context, source: e })
    }

    /// Fetches up to `max_pages` timeline pages newer than `since_id`, walking
    /// backward from the newest post with `max_id`.
    ///
    /// Stops early on a short page. Pages are returned in fetch order
    /// (newest first); an account with no new posts yields a single empty page.
    ///
    /// **All-or-nothing**: a failure on any page discards earlier pages for
    /// this account and returns the error.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::user_timeline_page`].
    pub async fn timeline_since(
        &self,
        screen_name: &str,
        since_id: &str,
        max_pages: u32,
    ) -> Result<Vec<Vec<Value>>, TwitterError> {
        let mut pages = Vec::new();
        let mut max_id: Option<String> = None;
        let budget = max_pages.max(1);

        for fetched in 1..=budget {
            let page = self
                .user_timeline_page(screen_name, since_id, max_id.as_deref())
                .await?;
            let next = next_page_max_id(&page);
            pages.push(page);

            let Some(next) = next else { break };
            if fetched == budget {
                // The watermark will move past whatever this window still holds.
                tracing::warn!(
                    screen_name,
                    max_pages = budget,
                    "timeline page budget exhausted on a full page; remaining posts in this window were skipped"
                );
                break;
            }
            max_id = Some(next);
        }

        Ok(pages)
    }
}

/// `max_id` for the next request when `page` was full, `None` when the
/// timeline is exhausted.
pub(super) fn next_page_max_id(page: &[Value]) -> Option<String> {
    if page.len() < TIMELINE_PAGE_SIZE {
        return None;
    }
    next_max_id(page)
}

/// `max_id` for the page after `page`: one below its smallest post id.
///
/// Returns `None` when the page is empty, ids are unparsable, or the
/// smallest id is already the minimum.
pub(super) fn next_max_id(page: &[Value]) -> Option<String> {
    page.iter()
        .filter_map(|post| post.get("id_str").and_then(Value::as_str))
        .filter_map(|id| id.parse::<u64>().ok())
        .min()
        .and_then(|min| min.checked_sub(1))
        .filter(|&next| next > 0)
        .map(|next| next.to_string())
}
