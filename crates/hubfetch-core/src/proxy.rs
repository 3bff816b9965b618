//! Proxy settings for hub traffic.
//!
//! The resolved proxy is handed to the hub client as an explicit value; the
//! process environment is read once and never written.

/// Default proxy address when `--proxy_addr` is not given.
pub const DEFAULT_PROXY_ADDR: &str = "http://127.0.0.1:7890";

/// Environment variable that overrides the proxy address when proxying is enabled.
pub const HTTP_PROXY_ENV: &str = "http_proxy";

/// Parses the `--proxy` flag value: true iff it contains `y` (case-insensitive).
///
/// "True", "yes", "Y" are true; "no", "false", "0" are false. Note that "nay"
/// is also true; the rule is kept as is for compatibility with existing scripts.
pub fn parse_proxy_flag(value: &str) -> bool {
    value.to_lowercase().contains('y')
}

/// Proxy routing applied to every request the hub client makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy used for `http://` URLs.
    pub http: String,
    /// Proxy used for `https://` URLs.
    pub https: String,
}

impl ProxyConfig {
    /// Route both schemes through the same proxy.
    pub fn single(addr: impl Into<String>) -> Self {
        let addr = addr.into();
        Self {
            http: addr.clone(),
            https: addr,
        }
    }

    /// Explicitly no proxy. An empty address also stops curl from picking up
    /// `http_proxy`/`https_proxy` from the environment.
    pub fn direct() -> Self {
        Self::single("")
    }

    /// Proxy for a request URL, chosen by scheme.
    pub fn for_url(&self, url: &str) -> &str {
        let is_https = url
            .get(..8)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));
        if is_https {
            &self.https
        } else {
            &self.http
        }
    }
}

/// Resolves the effective proxy.
///
/// Returns `None` when proxying is disabled. When enabled, `env_http_proxy`
/// (the value of `http_proxy`, if set and non-empty) wins over `addr`.
pub fn resolve_proxy(
    enabled: bool,
    addr: &str,
    env_http_proxy: Option<String>,
) -> Option<ProxyConfig> {
    if !enabled {
        return None;
    }
    let resolved = env_http_proxy
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| addr.to_string());
    Some(ProxyConfig::single(resolved))
}

/// [`resolve_proxy`] reading `http_proxy` from the process environment.
pub fn resolve_proxy_from_env(enabled: bool, addr: &str) -> Option<ProxyConfig> {
    resolve_proxy(enabled, addr, std::env::var(HTTP_PROXY_ENV).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_flag_substring_rule() {
        for v in ["True", "yes", "Y", "nay"] {
            assert!(parse_proxy_flag(v), "{} should enable proxy", v);
        }
        for v in ["no", "false", "0", ""] {
            assert!(!parse_proxy_flag(v), "{} should not enable proxy", v);
        }
    }

    #[test]
    fn disabled_ignores_env() {
        let p = resolve_proxy(false, DEFAULT_PROXY_ADDR, Some("http://example:8080".into()));
        assert!(p.is_none());
    }

    #[test]
    fn env_overrides_addr_for_both_schemes() {
        let p = resolve_proxy(true, DEFAULT_PROXY_ADDR, Some("http://example:8080".into()))
            .unwrap();
        assert_eq!(p.http, "http://example:8080");
        assert_eq!(p.https, "http://example:8080");
    }

    #[test]
    fn addr_used_without_env() {
        let p = resolve_proxy(true, "http://10.0.0.1:3128", None).unwrap();
        assert_eq!(p, ProxyConfig::single("http://10.0.0.1:3128"));
    }

    #[test]
    fn empty_env_falls_back_to_addr() {
        let p = resolve_proxy(true, DEFAULT_PROXY_ADDR, Some("  ".into())).unwrap();
        assert_eq!(p.http, DEFAULT_PROXY_ADDR);
    }

    #[test]
    fn for_url_picks_scheme() {
        let p = ProxyConfig {
            http: "http://a:1".into(),
            https: "http://b:2".into(),
        };
        assert_eq!(p.for_url("https://huggingface.co/api"), "http://b:2");
        assert_eq!(p.for_url("http://127.0.0.1:9/x"), "http://a:1");
    }
}
