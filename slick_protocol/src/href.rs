use url::Url;

/// Path, query and fragment of `url`, the form the client navigates with.
pub fn path_of(url: &Url) -> String {
    let mut path = url.path().to_owned();

    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    if let Some(fragment) = url.fragment() {
        path.push('#');
        path.push_str(fragment);
    }

    path
}

/// `true` when both URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Append `param=stamp` to `src`, keeping any existing query and fragment intact.
///
/// `src` may be relative; it is treated as an opaque string.
pub fn cache_bust(src: &str, param: &str, stamp: u64) -> String {
    let (base, fragment) = match src.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (src, None),
    };

    let separator = if base.contains('?') { '&' } else { '?' };
    let mut busted = format!("{base}{separator}{param}={stamp}");

    if let Some(fragment) = fragment {
        busted.push('#');
        busted.push_str(fragment);
    }

    busted
}
