//! Placing tokens in URLs and finding them again.
//!
//! Tokens go in the fragment, which browsers never send to a server. Older links carried the
//! code in the query string instead, so extraction falls back to looking there.

/// Build a share link by putting `token` under `marker` in the fragment of `base_url`.
///
/// Any query string or fragment already on `base_url` is dropped.
pub fn share_url(base_url: &str, marker: &str, token: &str) -> String {
    let base = base_url.split(['#', '?']).next().unwrap_or_default();
    format!("{}#{}={}", base, marker, token)
}

/// Find the token stored under `marker` in a URL.
///
/// The fragment is searched first, then the query string. Parameters are `&`-separated
/// `key=value` pairs; an empty value counts as no token.
pub fn extract_token<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let (rest, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    };
    let query = rest.split_once('?').map(|(_, q)| q);
    fragment
        .and_then(|f| find_param(f, marker))
        .or_else(|| query.and_then(|q| find_param(q, marker)))
}

fn find_param<'a>(params: &'a str, key: &str) -> Option<&'a str> {
    params.split('&').find_map(|pair| match pair.split_once('=') {
        Some((k, v)) if k == key && !v.is_empty() => Some(v),
        _ => None,
    })
}
