//! User-facing strings. `:name` placeholders are filled by [`fill`].

pub const SELECT_VIDEO: &str = "You must select a video before adding interactions.";
pub const NOT_VIDEO_FIELD: &str = "\":path\" is not a video.";
pub const INSERT_ELEMENT: &str = "Click and drag to place :type";
pub const POPUP_TITLE: &str = "Edit :type";
pub const REMOVE_INTERACTION: &str = "Are you sure you wish to remove this interaction?";
pub const NEW_BOOKMARK: &str = "New bookmark";
pub const BOOKMARK_ALREADY_EXISTS: &str =
    "Bookmark already exists here. Move playhead and add a bookmark at another time.";
pub const CATALOG_UNAVAILABLE: &str = "Could not load the list of interactions. Try reloading the editor.";

pub const FULL_SCORE_REQUIRED_PAUSE: &str =
    "\"Pause video\" is always enabled when \"Require full score\" is set.";
pub const FULL_SCORE_REQUIRED_RETRY: &str =
    "\"Retry\" is always enabled when \"Require full score\" is set.";
pub const FULL_SCORE_REQUIRED_TIME_FRAME: &str =
    "There is already an interaction requiring full score at the same start time.";

/// Replace `key` (e.g. ":type") in `template` with `value`.
pub fn fill(template: &str, key: &str, value: &str) -> String {
    template.replace(key, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_placeholder() {
        assert_eq!(fill(INSERT_ELEMENT, ":type", "image"), "Click and drag to place image");
        assert_eq!(fill(NOT_VIDEO_FIELD, ":path", "media/file"), "\"media/file\" is not a video.");
    }
}
