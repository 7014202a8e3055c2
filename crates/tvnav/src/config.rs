#![forbid(unsafe_code)]

//! Engine-wide configuration.

/// Tunables of a [`Navigator`](crate::Navigator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// Retry a failed Tab move once along the friend direction.
    /// Default: true.
    pub tab_fallback: bool,

    /// Report every key event as consumed (suppress platform default
    /// handling and propagation), not only the keys the navigator acts on.
    /// Default: true.
    pub consume_all_keys: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            tab_fallback: true,
            consume_all_keys: true,
        }
    }
}

impl NavigatorConfig {
    #[must_use]
    pub fn with_tab_fallback(mut self, on: bool) -> Self {
        self.tab_fallback = on;
        self
    }

    #[must_use]
    pub fn with_consume_all_keys(mut self, on: bool) -> Self {
        self.consume_all_keys = on;
        self
    }

    /// Load config from environment variables.
    ///
    /// Reads:
    /// - `TVNAV_TAB_FALLBACK`: `"1"`/`"true"` enables, `"0"`/`"false"` disables
    /// - `TVNAV_CONSUME_ALL_KEYS`: same values
    ///
    /// Unset or unrecognized values keep the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(on) = get_env("TVNAV_TAB_FALLBACK").as_deref().and_then(parse_flag) {
            config.tab_fallback = on;
        }
        if let Some(on) = get_env("TVNAV_CONSUME_ALL_KEYS")
            .as_deref()
            .and_then(parse_flag)
        {
            config.consume_all_keys = on;
        }
        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value == "1" || value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value == "0" || value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
