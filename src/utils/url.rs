// src/utils/url.rs

//! URL manipulation utilities.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::Result;

/// Scheme of virtual-world addresses.
pub const DOMAIN_SCHEME: &str = "hifi";

/// Build the address of a place from its name and in-world path.
///
/// # Examples
/// ```
/// use directory::utils::url::domain_url;
///
/// assert_eq!(domain_url("dev-welcome", "/1,2,3/0,0,0,1"), "hifi://dev-welcome/1,2,3/0,0,0,1");
/// assert_eq!(domain_url("dev-welcome", ""), "hifi://dev-welcome");
/// ```
pub fn domain_url(place_name: &str, path: &str) -> String {
    let path = path.trim();
    if path.is_empty() || path == "/" {
        return format!("{DOMAIN_SCHEME}://{place_name}");
    }
    if path.starts_with('/') {
        format!("{DOMAIN_SCHEME}://{place_name}{path}")
    } else {
        format!("{DOMAIN_SCHEME}://{place_name}/{path}")
    }
}

/// Scheme and host of a URL, lowercased, e.g. `hifi://dev-welcome`.
pub fn origin_prefix(url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) {
            return Some(format!("{}://{}", parsed.scheme(), host.to_lowercase()));
        }
    }

    // Place names are not always valid hosts; fall back to splitting
    let scheme_end = url.find("://")?;
    let host = url[scheme_end + 3..].split(['/', '?', '#']).next()?;
    if host.is_empty() {
        return None;
    }
    Some(format!(
        "{}://{}",
        url[..scheme_end].to_lowercase(),
        host.to_lowercase()
    ))
}

/// Whether two URLs share scheme and host.
pub fn same_origin(a: &str, b: &str) -> bool {
    match (origin_prefix(a), origin_prefix(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Short form of an address: the host plus its first path segment.
pub fn display_address(url: &str) -> String {
    static FIRST_SEGMENT: OnceLock<Option<Regex>> = OnceLock::new();

    let Some(prefix) = origin_prefix(url) else {
        return url.to_string();
    };
    let host = prefix
        .split_once("://")
        .map(|(_, h)| h.to_string())
        .unwrap_or(prefix.clone());

    let rest = &url[url.find("://").map(|i| i + 3).unwrap_or(0)..];
    let path = rest.find('/').map(|i| &rest[i..]).unwrap_or("");

    let segment = FIRST_SEGMENT
        .get_or_init(|| Regex::new(r"(/[^/]+)").ok())
        .as_ref()
        .and_then(|re| re.captures(path))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or("");

    format!("{host}{segment}")
}

/// Join an API path onto the service base URL.
///
/// The path is resolved below any prefix of the base URL, with or without
/// a trailing slash on the base.
pub fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let prefix = format!("{}/", base.path());
        base.set_path(&prefix);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}
