//! User-Agent string sent with every API request.

/// Default User-Agent: `protopred-rs/<crate version>`.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    format!("protopred-rs/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_is_crate_name_and_version() {
        let ua = default_user_agent();
        assert_eq!(ua.strip_prefix("protopred-rs/"), Some(env!("CARGO_PKG_VERSION")));
        assert!(!ua.contains("http"), "UA must not advertise a URL: {ua}");
    }
}
