//! Every selector, label, and visible-text target the workflow drives.
//!
//! The Deriv pages expose almost no stable data attributes, so the workflow
//! matches on input attributes, accessible names, and rendered text. Keeping
//! all of those strings in one place means a page redesign is a one-file fix.

/// Candidate selectors for the OAuth email field, tried in order.
pub const EMAIL_INPUTS: &[&str] = &["input[name=\"email\"]", "input[type=\"email\"]"];

/// Candidate selectors for the OAuth password field.
pub const PASSWORD_INPUTS: &[&str] = &["input[name=\"password\"]", "input[type=\"password\"]"];

/// Candidate selectors for the login submit button.
pub const SUBMIT_BUTTONS: &[&str] = &["button[type=\"submit\"]"];

/// Visible-text fallback for the submit button.
pub const SUBMIT_TEXT: &str = "Log in";

/// The five permission scopes, in the order they render on the page.
///
/// The second element is the rendered text of the clickable scope card
/// (label text runs straight into the description, hence the odd strings).
pub const SCOPES: &[(&str, &str)] = &[
    ("Read", "ReadThis scope will allow"),
    ("Trade", "TradeThis scope will allow"),
    ("Payments", "PaymentsThis scope will allow"),
    ("Trading information", "Trading informationThis scope"),
    ("Admin", "AdminThis scope will allow"),
];

/// Accessible name of the token-name textbox.
pub const TOKEN_NAME_LABEL: &str = "Token name";

/// Accessible name of the create button.
pub const CREATE_LABEL: &str = "Create";

/// The reveal-token eye icons next to each token row.
pub const VISIBILITY_TOGGLE: &str = "[data-testid=\"dt_toggle_visibility_icon\"]";

/// Heading text that anchors the primary token scan.
pub const TOKEN_HEADING_TEXT: &str = "Token";
