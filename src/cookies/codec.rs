//! Cookie record codec.
//!
//! A bucket is persisted as a JSON array of objects with the fields
//! `name, value, domain, path, httpOnly, secure, toDiscard, maxAge,
//! whenCreated, version`. These names are the on-disk contract and must not
//! change; `whenCreated` is restored verbatim rather than reset to "now".

use crate::base::storeerror::StoreError;
use crate::cookies::httpcookie::HttpCookie;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct CookieRecord {
    name: String,
    #[serde(deserialize_with = "nullable_string")]
    value: Option<String>,
    #[serde(deserialize_with = "nullable_string")]
    domain: Option<String>,
    #[serde(deserialize_with = "nullable_string")]
    path: Option<String>,
    http_only: bool,
    secure: bool,
    to_discard: bool,
    max_age: i64,
    when_created: i64,
    version: i32,
}

/// Required field that older writers may have emitted as `null`.
fn nullable_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

impl From<&HttpCookie> for CookieRecord {
    fn from(cookie: &HttpCookie) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: Some(cookie.value().to_string()),
            domain: Some(cookie.domain().to_string()),
            path: Some(cookie.path().to_string()),
            http_only: cookie.http_only(),
            secure: cookie.secure(),
            to_discard: cookie.discard(),
            max_age: cookie.max_age(),
            when_created: cookie.creation_time(),
            version: cookie.version(),
        }
    }
}

impl CookieRecord {
    fn into_cookie(self) -> Result<HttpCookie, StoreError> {
        let CookieRecord {
            name,
            value,
            domain,
            path,
            http_only,
            secure,
            to_discard,
            max_age,
            when_created,
            version,
        } = self;

        let mut cookie = HttpCookie::new(name, value.unwrap_or_default())
            .map_err(|e| StoreError::decode(e.to_string()))?;

        cookie.set_domain(domain.unwrap_or_default());
        cookie.set_path(path.unwrap_or_default());
        cookie.set_http_only(http_only);
        cookie.set_secure(secure);
        cookie.set_discard(to_discard);
        cookie.set_max_age(max_age);
        cookie
            .set_version(version)
            .map_err(|e| StoreError::decode(e.to_string()))?;
        cookie.restore_creation_time(when_created);

        Ok(cookie)
    }
}

/// Serialize a bucket, preserving cookie order.
pub fn encode(cookies: &[HttpCookie]) -> Result<String, StoreError> {
    let records: Vec<CookieRecord> = cookies.iter().map(CookieRecord::from).collect();
    serde_json::to_string(&records).map_err(|e| StoreError::Encode {
        reason: e.to_string(),
    })
}

/// Deserialize a bucket.
///
/// An empty (or `null`) blob is an empty bucket. Any record with a missing
/// or mistyped field fails the whole blob with [`StoreError::Decode`].
pub fn decode(blob: &str) -> Result<Vec<HttpCookie>, StoreError> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Option<Vec<CookieRecord>> = serde_json::from_str(blob)?;
    records
        .unwrap_or_default()
        .into_iter()
        .map(CookieRecord::into_cookie)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample() -> Vec<HttpCookie> {
        let mut a = HttpCookie::new("session", "abc123")
            .unwrap()
            .with_domain(".example.com")
            .with_path("/")
            .with_secure(true)
            .with_http_only(true)
            .with_max_age(3600);
        a.restore_creation_time(1_700_000_000_123);

        let mut b = HttpCookie::new("theme", "dark").unwrap();
        b.set_discard(true);
        b.set_version(0).unwrap();
        b.restore_creation_time(-5);

        vec![a, b]
    }

    #[test]
    fn test_roundtrip_keeps_creation_time_and_order() {
        let cookies = sample();
        let decoded = decode(&encode(&cookies).unwrap()).unwrap();
        assert_eq!(decoded, cookies);
        assert_eq!(decoded[0].creation_time(), 1_700_000_000_123);
        assert_eq!(decoded[1].name(), "theme");
    }

    #[test]
    fn test_field_names_are_stable() {
        let blob = encode(&sample()[..1]).unwrap();
        let value: Value = serde_json::from_str(&blob).unwrap();
        let obj = value[0].as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "domain",
                "httpOnly",
                "maxAge",
                "name",
                "path",
                "secure",
                "toDiscard",
                "value",
                "version",
                "whenCreated",
            ]
        );
        assert_eq!(obj["whenCreated"], Value::from(1_700_000_000_123_i64));
        assert_eq!(obj["maxAge"], Value::from(3600));
    }

    #[test]
    fn test_empty_blob_is_empty_bucket() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("  ").unwrap().is_empty());
        assert!(decode("[]").unwrap().is_empty());
        assert!(decode("null").unwrap().is_empty());
    }

    #[test]
    fn test_missing_field_is_decode_error() {
        let blob = r#"[{"name":"a","value":"b","domain":"","path":"/","httpOnly":false,
            "secure":false,"toDiscard":false,"maxAge":-1,"version":1}]"#;
        assert!(matches!(decode(blob), Err(StoreError::Decode { .. })));
    }

    #[test]
    fn test_mistyped_field_is_decode_error() {
        let blob = r#"[{"name":"a","value":"b","domain":"","path":"/","httpOnly":"yes",
            "secure":false,"toDiscard":false,"maxAge":-1,"whenCreated":0,"version":1}]"#;
        assert!(matches!(decode(blob), Err(StoreError::Decode { .. })));
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        assert!(matches!(decode("{oops"), Err(StoreError::Decode { .. })));
    }

    #[test]
    fn test_null_strings_accepted() {
        let blob = r#"[{"name":"a","value":null,"domain":null,"path":null,"httpOnly":false,
            "secure":false,"toDiscard":false,"maxAge":-1,"whenCreated":42,"version":1}]"#;
        let cookies = decode(blob).unwrap();
        assert_eq!(cookies[0].domain(), "");
        assert_eq!(cookies[0].value(), "");
        assert_eq!(cookies[0].creation_time(), 42);
    }

    #[test]
    fn test_invalid_name_is_decode_error() {
        let blob = r#"[{"name":"","value":"b","domain":"","path":"/","httpOnly":false,
            "secure":false,"toDiscard":false,"maxAge":-1,"whenCreated":0,"version":1}]"#;
        assert!(matches!(decode(blob), Err(StoreError::Decode { .. })));
    }
}
