//! Content library and form field name constants.
//!
//! Avoid string typos in library checks and hidden-field lists.

// === Libraries ===
/// Plain text label element (no scored content)
pub const LIB_NIL: &str = "H5P.Nil";
/// Image element (sized from the picked file)
pub const LIB_IMAGE: &str = "H5P.Image";

/// Content types that report a score and can therefore require completion.
pub const SCORED_LIBRARIES: &[&str] = &[
    "H5P.MultiChoice",
    "H5P.SingleChoiceSet",
    "H5P.Blanks",
    "H5P.DragQuestion",
    "H5P.Summary",
    "H5P.MarkTheWords",
    "H5P.DragText",
];

// === Interaction form fields ===
/// Adaptivity group (require completion, wrong/correct behaviour)
pub const F_ADAPTIVITY: &str = "adaptivity";
/// Show the element as a button instead of inline
pub const F_DISPLAY_AS_BUTTON: &str = "displayAsButton";
/// Time window inputs
pub const F_DURATION: &str = "duration";

// === Content behaviour ===
/// Content params group holding behaviour flags
pub const P_BEHAVIOUR: &str = "behaviour";
/// Retry button flag inside the behaviour group
pub const P_ENABLE_RETRY: &str = "enableRetry";

/// Label given to new text elements
pub const DEFAULT_NIL_LABEL: &str = "Lorem ipsum dolor sit amet...";

/// Strip the version suffix from an uber name ("H5P.Image 1.0" -> "H5P.Image").
pub fn machine_name(uber_name: &str) -> &str {
    uber_name.split(' ').next().unwrap_or(uber_name)
}
