use serde::Serialize;

/// Longest error-body excerpt that may end up in a log line.
pub(crate) const BODY_PREVIEW_CHARS: usize = 300;

/// Truncates a raw upstream body for logging.
pub(crate) fn body_preview(raw_body: &str) -> String {
    format!("{:.len$}", raw_body, len = BODY_PREVIEW_CHARS)
}

/// Hands `log_action` a pretty-printed JSON rendering of `value`, only when
/// DEBUG logging is enabled.
pub(crate) fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty_json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    log_action(pretty_json.as_str());
}
