//! Process-environment credential handling.
//!
//! Keys and base URLs are read from the environment once, when a client is
//! built. Writing them after construction has no effect on existing clients.

use crate::model_info::Provider;
use tracing::debug;

pub const PROXY_VARS: [&str; 4] = ["http_proxy", "https_proxy", "HTTP_PROXY", "HTTPS_PROXY"];

/// Looks up a variable by name. The process environment in production, a
/// map in tests.
pub trait EnvLookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Removes the proxy variables so requests go straight to the endpoint.
/// Returns the variables that were set.
pub fn clear_proxy_env() -> Vec<&'static str> {
    let mut removed = Vec::new();
    for key in PROXY_VARS {
        if std::env::var_os(key).is_some() {
            std::env::remove_var(key);
            removed.push(key);
        }
    }
    if !removed.is_empty() {
        debug!(vars = ?removed, "Cleared proxy environment");
    }
    removed
}

pub fn set_api_key(provider: Provider, key: &str) {
    std::env::set_var(provider.api_key_env(), key);
}

pub fn set_base_url(provider: Provider, url: &str) {
    std::env::set_var(provider.base_url_env(), url);
}

/// Explicit value first, then the variable. Empty strings count as unset.
pub(crate) fn resolve_value(
    explicit: Option<&str>,
    env_var: &str,
    env: &dyn EnvLookup,
) -> Option<(String, Option<String>)> {
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return Some((value.to_string(), None));
    }
    env.get(env_var)
        .filter(|v| !v.trim().is_empty())
        .map(|v| (v, Some(env_var.to_string())))
}

/// `https://api.deepseek.com/v1/` and `https://api.deepseek.com/v1` name the
/// same endpoint.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        let env = |_: &str| Some("from-env".to_string());
        let (value, var) = resolve_value(Some("explicit"), "DEEPSEEK_API_KEY", &env).unwrap();
        assert_eq!(value, "explicit");
        assert!(var.is_none());
    }

    #[test]
    fn test_env_fallback_and_empty() {
        let env = |k: &str| (k == "DEEPSEEK_API_KEY").then(|| "sk-env".to_string());
        let (value, var) = resolve_value(Some("  "), "DEEPSEEK_API_KEY", &env).unwrap();
        assert_eq!(value, "sk-env");
        assert_eq!(var.as_deref(), Some("DEEPSEEK_API_KEY"));

        let empty = |_: &str| Some(String::new());
        assert!(resolve_value(None, "DEEPSEEK_API_KEY", &empty).is_none());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.deepseek.com/v1/"),
            "https://api.deepseek.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.deepseek.com/v1"),
            "https://api.deepseek.com/v1"
        );
    }

    #[test]
    fn test_clear_proxy_env() {
        let _guard = crate::env_lock();
        std::env::set_var("https_proxy", "http://127.0.0.1:7890");
        std::env::remove_var("http_proxy");

        let removed = clear_proxy_env();
        assert!(removed.contains(&"https_proxy"));
        assert!(!removed.contains(&"http_proxy"));
        assert!(std::env::var_os("https_proxy").is_none());
        assert!(clear_proxy_env().is_empty());
    }

    #[test]
    fn test_set_and_read_back() {
        let _guard = crate::env_lock();
        set_base_url(Provider::DeepSeek, "https://proxy.internal/v1");
        assert_eq!(
            ProcessEnv.get("DEEPSEEK_BASE_URL").as_deref(),
            Some("https://proxy.internal/v1")
        );
        std::env::remove_var("DEEPSEEK_BASE_URL");

        let previous = std::env::var("DEEPSEEK_API_KEY").ok();
        set_api_key(Provider::DeepSeek, "sk-written");
        let (key, var) = resolve_value(None, Provider::DeepSeek.api_key_env(), &ProcessEnv).unwrap();
        assert_eq!(key, "sk-written");
        assert_eq!(var.as_deref(), Some("DEEPSEEK_API_KEY"));
        match previous {
            Some(value) => std::env::set_var("DEEPSEEK_API_KEY", value),
            None => std::env::remove_var("DEEPSEEK_API_KEY"),
        }
    }
}
