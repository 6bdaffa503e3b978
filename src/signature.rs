//! Parameter sets and Last.fm request signatures.
//!
//! Last.fm authenticates write calls with an `api_sig` parameter: the MD5 of
//! every `key` + `value` pair in ascending key order, followed by the
//! application's shared secret.

use std::collections::BTreeMap;

/// Parameters of a single API call.
///
/// Keys are unique and always iterate in ascending byte order, which is the
/// order the signature is computed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiParams {
    params: BTreeMap<String, String>,
}

impl ApiParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a parameter set for the given Last.fm method, e.g. `auth.getToken`.
    pub fn for_method(method: &str) -> Self {
        let mut params = Self::new();
        params.insert("method", method);
        params
    }

    /// Insert a parameter, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Insert a parameter only when a value is present.
    pub fn insert_opt<V: ToString>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// The Last.fm method this call targets, if set.
    pub fn method(&self) -> Option<&str> {
        self.get("method")
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every entry of `other` into this set.
    pub fn extend(&mut self, other: ApiParams) {
        self.params.extend(other.params);
    }

    /// Render as `application/x-www-form-urlencoded`, usable both as a query
    /// string and as a POST body.
    pub fn to_form_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ApiParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Compute the `api_sig` for a parameter set.
pub fn sign(params: &ApiParams, shared_secret: &str) -> String {
    let mut signature_base = String::new();
    for (key, value) in params.iter() {
        signature_base.push_str(key);
        signature_base.push_str(value);
    }
    signature_base.push_str(shared_secret);

    format!("{:x}", md5::compute(signature_base.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_known_digest() {
        let params: ApiParams = [
            ("method", "auth.getSession"),
            ("api_key", "xxxxxxxxxx"),
            ("token", "yyyyyy"),
        ]
        .into_iter()
        .collect();

        let expected = format!(
            "{:x}",
            md5::compute("api_keyxxxxxxxxxxmethodauth.getSessiontokenyyyyyyilovecher")
        );
        assert_eq!(sign(&params, "ilovecher"), expected);
    }

    #[test]
    fn test_signature_ignores_insertion_order() {
        let forward: ApiParams = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let backward: ApiParams = [("c", "3"), ("b", "2"), ("a", "1")].into_iter().collect();

        assert_eq!(sign(&forward, "secret"), sign(&backward, "secret"));
    }

    #[test]
    fn test_signature_is_deterministic_lowercase_hex() {
        let params: ApiParams = [("method", "auth.getToken"), ("api_key", "KEY")]
            .into_iter()
            .collect();

        let first = sign(&params, "secret");
        let second = sign(&params, "secret");
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_keys_sort_by_byte_order() {
        // Uppercase sorts before lowercase in byte order.
        let params: ApiParams = [("trackNumber", "3"), ("track", "x"), ("Z", "z")]
            .into_iter()
            .collect();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Z", "track", "trackNumber"]);

        let expected = format!("{:x}", md5::compute("ZztrackxtrackNumber3s"));
        assert_eq!(sign(&params, "s"), expected);
    }

    #[test]
    fn test_secret_changes_signature() {
        let params = ApiParams::for_method("auth.getToken");
        assert_ne!(sign(&params, "one"), sign(&params, "two"));
    }

    #[test]
    fn test_insert_opt_skips_absent_values() {
        let mut params = ApiParams::for_method("track.scrobble");
        params.insert_opt::<u32>("duration", None);
        params.insert_opt("trackNumber", Some(4u32));

        assert!(!params.contains_key("duration"));
        assert_eq!(params.get("trackNumber"), Some("4"));
        assert_eq!(params.method(), Some("track.scrobble"));
    }

    #[test]
    fn test_form_string_encodes_values() {
        let params: ApiParams = [("artist", "Simon & Garfunkel"), ("track", "The Boxer")]
            .into_iter()
            .collect();
        assert_eq!(
            params.to_form_string(),
            "artist=Simon%20%26%20Garfunkel&track=The%20Boxer"
        );
    }
}
