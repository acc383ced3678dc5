//! Video-identifier extraction for known video-sharing URL shapes.

use crate::classify::ResourceURL;

/// Extracts a video identifier from a known video-sharing URL shape.
///
/// Recognized shapes:
/// - `youtu.be/{id}`
/// - `youtube.com/watch?v={id}` (and `www.` variant)
/// - `youtube.com/embed/{id}`
/// - `youtube.com/v/{id}`
///
/// Any other host or path returns `None`; that is the common case, not an
/// error. A `/watch` URL without a `v` parameter also returns `None`.
pub fn video_id(resource: &ResourceURL) -> Option<String> {
    let host = resource.host();

    if host == "youtu.be" {
        let id = resource.path_tail();
        if id.is_empty() {
            return None;
        }
        return Some(id.to_string());
    }

    if host != "youtube.com" && host != "www.youtube.com" {
        return None;
    }

    let segments = resource.segments();
    match segments.first().map(String::as_str) {
        Some("watch") => resource.query_first("v").filter(|v| !v.is_empty()),
        Some("embed") | Some("v") => segments.get(1).filter(|s| !s.is_empty()).cloned(),
        _ => None,
    }
}
