use cookiestore::base::storeerror::StoreError;
use cookiestore::cookies::{EffectiveUri, HttpCookie, MemoryCookieStore};
use url::Url;

#[test]
fn test_parse_and_save() {
    let store = MemoryCookieStore::new();
    let url = Url::parse("https://example.com/foo").unwrap();
    store.parse_and_save_cookie(&url, "foo=bar; Path=/").unwrap();

    let cookies = store.get(&url);
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name(), "foo");
    assert_eq!(cookies[0].value(), "bar");
    assert_eq!(cookies[0].path(), "/");
    assert_eq!(cookies[0].version(), 0);
}

#[test]
fn test_domain_matching() {
    let store = MemoryCookieStore::new();
    let url = Url::parse("https://a.example.com").unwrap();

    store.parse_and_save_cookie(&url, "host=val").unwrap();
    store
        .parse_and_save_cookie(&url, "domain=val; Domain=example.com")
        .unwrap();

    let cookies = store.get(&url);
    assert!(cookies.iter().any(|c| c.name() == "host"));
    assert!(cookies.iter().any(|c| c.name() == "domain"));

    // Host-only cookies stay with their host; domain cookies follow subdomains.
    let sibling = store.get(&Url::parse("https://b.example.com/").unwrap());
    assert_eq!(sibling.len(), 1);
    assert_eq!(sibling[0].name(), "domain");
}

#[test]
fn test_path_matching() {
    let store = MemoryCookieStore::new();
    let url = Url::parse("https://example.com/foo/bar").unwrap();

    store.parse_and_save_cookie(&url, "root=val; Path=/").unwrap();
    store.parse_and_save_cookie(&url, "foo=val; Path=/foo").unwrap();
    store.parse_and_save_cookie(&url, "baz=val; Path=/baz").unwrap();

    let cookies = store.get(&url);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.name() == "root"));
    assert!(cookies.iter().any(|c| c.name() == "foo"));
    assert!(!cookies.iter().any(|c| c.name() == "baz"));
}

#[test]
fn test_default_path_from_request() {
    let store = MemoryCookieStore::new();
    let url = Url::parse("https://example.com/docs/page.html").unwrap();
    store.parse_and_save_cookie(&url, "d=1").unwrap();

    assert_eq!(store.get_cookies()[0].path(), "/docs");
    assert!(store.get(&Url::parse("https://example.com/").unwrap()).is_empty());
}

#[test]
fn test_secure_flag() {
    let store = MemoryCookieStore::new();
    let https_url = Url::parse("https://example.com").unwrap();
    let http_url = Url::parse("http://example.com").unwrap();

    store.parse_and_save_cookie(&https_url, "sec=saved; Secure").unwrap();

    assert_eq!(store.cookie_header(&https_url).as_deref(), Some("sec=saved"));
    assert_eq!(store.cookie_header(&http_url), None);
}

#[test]
fn test_public_suffix_domain_rejected() {
    let store = MemoryCookieStore::new();
    let url = Url::parse("https://example.com/").unwrap();

    let err = store
        .parse_and_save_cookie(&url, "evil=1; Domain=com")
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument { .. }));
    assert_eq!(store.total_cookie_count(), 0);
}

#[test]
fn test_max_age_zero_deletes() {
    let store = MemoryCookieStore::new();
    let url = Url::parse("https://example.com/").unwrap();

    store.parse_and_save_cookie(&url, "a=1; Path=/").unwrap();
    store.parse_and_save_cookie(&url, "b=2; Path=/").unwrap();
    store.parse_and_save_cookie(&url, "a=1; Path=/; Max-Age=0").unwrap();

    let names: Vec<String> = store.get(&url).iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["b"]);
}

#[test]
fn test_buckets_keyed_by_effective_uri() {
    let store = MemoryCookieStore::new();
    store
        .parse_and_save_cookie(&Url::parse("https://example.com/a").unwrap(), "a=1")
        .unwrap();
    store
        .parse_and_save_cookie(&Url::parse("https://EXAMPLE.com:443/b?x=1").unwrap(), "b=1")
        .unwrap();
    store
        .parse_and_save_cookie(&Url::parse("https://example.com:8443/").unwrap(), "c=1")
        .unwrap();

    let uris: Vec<String> = store.get_uris().iter().map(|u| u.to_string()).collect();
    assert_eq!(uris, vec!["https://example.com", "https://example.com:8443"]);

    let key = EffectiveUri::parse("https://example.com").unwrap();
    assert_eq!(store.bucket(&key).unwrap().len(), 2);
}

#[test]
fn test_snapshot_is_detached() {
    let store = MemoryCookieStore::new();
    let url = Url::parse("https://example.com/").unwrap();
    store
        .add(Some(&url), HttpCookie::new("a", "1").unwrap().with_path("/"))
        .unwrap();

    let mut snapshot = store.get_cookies();
    snapshot[0].set_value("changed");
    snapshot.clear();

    assert_eq!(store.get(&url)[0].value(), "1");
}
