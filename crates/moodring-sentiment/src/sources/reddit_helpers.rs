//! Reddit post conversion helpers.

use super::reddit::Post;
use crate::types::DiscussionPost;

/// Trim a self-text body, dropping empty, deleted and removed bodies.
pub(super) fn clean_body(body: Option<&str>) -> Option<String> {
    body.map(str::trim)
        .filter(|body| !body.is_empty() && *body != "[deleted]" && *body != "[removed]")
        .map(ToString::to_string)
}

/// Convert a listing child into a [`DiscussionPost`]. Posts without a title
/// are skipped.
pub(super) fn to_post(post: &Post) -> Option<DiscussionPost> {
    let title = post
        .data
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())?;

    Some(DiscussionPost {
        title: title.to_string(),
        body: clean_body(post.data.selftext.as_deref()),
        score: post.data.score.unwrap_or(0),
        num_comments: post.data.num_comments.unwrap_or(0),
    })
}
