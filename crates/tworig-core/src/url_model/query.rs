//! Query-string helpers that work pair by pair on the serialized query.
//!
//! Pairs other than the target key are copied through byte-for-byte so their
//! encoding and order are untouched.

use url::form_urlencoded;
use url::Url;

/// First value for `key` in `url`'s query, form-decoded.
pub fn first_param_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Sets `key=value` in a serialized query.
///
/// The first pair whose decoded key equals `key` is replaced in place, later
/// pairs with that key are dropped, and the pair is appended when absent.
/// Empty segments (`a=1&&b=2`) are dropped.
pub fn upsert_param(query: Option<&str>, key: &str, value: &str) -> String {
    let pair = form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();

    let mut out: Vec<&str> = Vec::new();
    let mut replaced = false;
    for segment in query.unwrap_or("").split('&') {
        if segment.is_empty() {
            continue;
        }
        if segment_key(segment).as_deref() == Some(key) {
            if !replaced {
                out.push(&pair);
                replaced = true;
            }
            continue;
        }
        out.push(segment);
    }
    if !replaced {
        out.push(&pair);
    }
    out.join("&")
}

fn segment_key(segment: &str) -> Option<String> {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_into_empty() {
        assert_eq!(upsert_param(None, "name", "orig"), "name=orig");
        assert_eq!(upsert_param(Some(""), "name", "orig"), "name=orig");
    }

    #[test]
    fn upsert_keeps_other_segments_verbatim() {
        assert_eq!(
            upsert_param(Some("a=b%20c&name=small&d=e+f"), "name", "orig"),
            "a=b%20c&name=orig&d=e+f"
        );
    }

    #[test]
    fn upsert_handles_bare_key() {
        assert_eq!(upsert_param(Some("name&x"), "name", "orig"), "name=orig&x");
    }

    #[test]
    fn first_value_decodes() {
        let url = Url::parse("https://h/p?name=a+b&name=c").unwrap();
        assert_eq!(first_param_value(&url, "name").as_deref(), Some("a b"));
        assert_eq!(first_param_value(&url, "missing"), None);
    }
}
