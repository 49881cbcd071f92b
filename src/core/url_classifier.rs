//! Recognizes URL-shaped strings in inventory values and derives fallback names from them.
//!
//! Inventory authors write URLs with and without a scheme (`https://vercel.com/team`,
//! `inem.at/jobs`), so a value counts as a URL when it either carries a scheme and
//! parses with a host, or looks like a dotted hostname with an alphabetic TLD.

use regex::Regex;
use std::sync::LazyLock;
use url::{Host, Url};

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap());

static BARE_HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:[a-z0-9](?:[a-z0-9\-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}(?::\d{1,5})?(?:[/?#]\S*)?$",
    )
    .unwrap()
});

/// Suffixes of dotted slugs (`next.js`, `docker-compose.yml`) that are not top-level domains.
const NON_TLD_SUFFIXES: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "vue", "rb", "css", "scss", "html", "htm", "json",
    "yml", "yaml", "toml", "txt", "lock", "log", "conf", "cfg", "ini", "exe", "dll", "tar", "gz",
    "tgz",
];

/// Second-level labels that sit between a brand and a country TLD (`example.co.uk`).
const SECOND_LEVEL_LABELS: &[&str] = &["co", "com", "org", "net", "gov", "ac", "edu"];

/// True when `value` is a URL or a bare hostname, optionally followed by a path.
pub fn is_url_like(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }

    if SCHEME_RE.is_match(value) {
        return Url::parse(value)
            .map(|url| url.host_str().is_some_and(|host| !host.is_empty()))
            .unwrap_or(false);
    }

    BARE_HOST_RE.is_match(value) && !has_file_suffix(value)
}

/// True when the host part of a scheme-less value ends in a file-type suffix.
fn has_file_suffix(value: &str) -> bool {
    let host = value
        .split(|c| matches!(c, '/' | '?' | '#' | ':'))
        .next()
        .unwrap_or(value);
    host.rsplit('.')
        .next()
        .is_some_and(|tld| NON_TLD_SUFFIXES.contains(&tld.to_ascii_lowercase().as_str()))
}

/// Canonical form used for dictionary matching and output.
///
/// Adds `https://` when no scheme is given, lower-cases scheme and host and
/// drops the trailing slash. Returns `None` for anything that is not URL-like.
pub fn normalize(value: &str) -> Option<String> {
    let value = value.trim();
    if !is_url_like(value) {
        return None;
    }

    let candidate = if SCHEME_RE.is_match(value) {
        value.to_string()
    } else {
        format!("https://{}", value)
    };

    let url = Url::parse(&candidate).ok()?;
    let host = url.host_str().filter(|host| !host.is_empty())?;

    let mut normalized = String::with_capacity(candidate.len());
    normalized.push_str(url.scheme());
    normalized.push_str("://");

    let username = url.username();
    if !username.is_empty() {
        normalized.push_str(username);
        if let Some(password) = url.password() {
            normalized.push(':');
            normalized.push_str(password);
        }
        normalized.push('@');
    }

    normalized.push_str(&host.to_lowercase());

    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }

    normalized.push_str(url.path().trim_end_matches('/'));

    if let Some(query) = url.query() {
        normalized.push('?');
        normalized.push_str(query);
    }

    if let Some(fragment) = url.fragment() {
        normalized.push('#');
        normalized.push_str(fragment);
    }

    Some(normalized)
}

/// Display name for a URL no provider claims: `https://www.github.com/x` -> `Github`.
///
/// IP hosts have no brand and are returned whole.
pub fn extract_name(normalized_url: &str) -> String {
    let parsed = Url::parse(normalized_url)
        .ok()
        .or_else(|| normalize(normalized_url).and_then(|url| Url::parse(&url).ok()));

    let host = match parsed.as_ref().and_then(Url::host) {
        Some(Host::Ipv4(ip)) => return ip.to_string(),
        Some(Host::Ipv6(ip)) => return ip.to_string(),
        Some(Host::Domain(domain)) => domain.to_lowercase(),
        None => normalized_url.trim().to_lowercase(),
    };

    let host = host.strip_prefix("www.").unwrap_or(&host);
    let labels: Vec<&str> = host.split('.').filter(|label| !label.is_empty()).collect();

    let brand = match labels.len() {
        0 => "",
        1 => labels[0],
        n if n >= 3
            && labels[n - 1].len() == 2
            && SECOND_LEVEL_LABELS.contains(&labels[n - 2]) =>
        {
            labels[n - 3]
        }
        n => labels[n - 2],
    };

    capitalize(brand)
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
