//! Bounded, failure-isolated fan-out of timeline fetches.

use futures::stream::{self, StreamExt};

use crate::row::RawPost;
use crate::services::PostSource;
use crate::watermark::Cursor;

/// Fetches every cursor's new posts with at most `max_concurrent` requests in
/// flight and returns them as one flat list.
///
/// Each account's result is captured on its own: a failing account is logged
/// and contributes nothing, while every other account's posts are kept.
pub async fn fetch_posts<S: PostSource>(
    source: &S,
    cursors: Vec<Cursor>,
    max_concurrent: usize,
) -> Vec<RawPost> {
    let accounts = cursors.len();
    let results: Vec<_> = stream::iter(cursors)
        .map(move |cursor| async move {
            let result = source
                .timeline_since(&cursor.screen_name, cursor.since_id())
                .await;
            (cursor, result)
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let mut posts = Vec::new();
    let mut failed = 0usize;
    for (cursor, result) in results {
        match result {
            Ok(nested) => {
                let fetched = nested.flatten();
                tracing::debug!(
                    screen_name = %cursor.screen_name,
                    since_id = cursor.since_id(),
                    count = fetched.len(),
                    "fetched timeline"
                );
                posts.extend(fetched);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    screen_name = %cursor.screen_name,
                    error = %e,
                    "timeline fetch failed; skipping account"
                );
            }
        }
    }

    tracing::info!(
        accounts,
        failed,
        posts = posts.len(),
        "timeline fan-out complete"
    );
    posts
}
