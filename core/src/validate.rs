//! Local checks applied by option setters before anything is sent.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ApiError;

static RE_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#?[0-9a-fA-F]{6}$").unwrap());

const LOCAL_URL_MESSAGE: &str =
    "Cannot convert local urls. SelectPdf online API can only convert publicly available urls.";

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Accept only `http://` and `https://` urls that do not start with
/// `http://localhost`. `https://localhost` is accepted.
///
/// `what` names the url in the error message ("url", "base url", ...).
pub fn public_url(url: &str, what: &str) -> Result<(), ApiError> {
    if !starts_with_ignore_case(url, "http://") && !starts_with_ignore_case(url, "https://") {
        return Err(ApiError::Validation(format!(
            "The supported protocols for the {what} are http:// and https://."
        )));
    }
    if starts_with_ignore_case(url, "http://localhost") {
        return Err(ApiError::Validation(LOCAL_URL_MESSAGE.to_string()));
    }
    Ok(())
}

/// Accept `#RRGGBB` (the leading `#` is optional).
pub fn color(value: &str) -> Result<(), ApiError> {
    if RE_COLOR.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Color value must be in #RRGGBB format.".to_string(),
        ))
    }
}
