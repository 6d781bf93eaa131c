// tests/keys_params.rs
use serde_json::{json, Value};
use twitter_public_stream::{create_public_stream_source, resolve, Context, IoParams, KeyError, Params};

const KEYS: [&str; 4] = [
    "consumer_key",
    "consumer_secret",
    "access_token",
    "access_token_secret",
];

fn full_params() -> Params {
    json!({
        "consumer_key": "abc",
        "consumer_secret": "def",
        "access_token": "ghi",
        "access_token_secret": "jkl",
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[test]
fn inline_parameters_resolve_to_credentials() {
    let keys = resolve(&full_params()).unwrap();
    assert_eq!(keys.consumer_key, "abc");
    assert_eq!(keys.consumer_secret, "def");
    assert_eq!(keys.access_token, "ghi");
    assert_eq!(keys.access_token_secret, "jkl");
}

#[test]
fn each_missing_parameter_is_named() {
    for key in KEYS {
        let mut p = full_params();
        p.remove(key);
        match resolve(&p) {
            Err(KeyError::MissingParameter(name)) => assert_eq!(name, key),
            other => panic!("expected missing {key}, got {other:?}"),
        }
    }
}

#[test]
fn each_non_string_parameter_is_named() {
    for (key, bad) in KEYS.iter().zip([json!(1), json!(true), json!(null), json!({"a": 1})]) {
        let mut p = full_params();
        p.insert(key.to_string(), bad.clone());
        let err = resolve(&p).unwrap_err();
        match &err {
            KeyError::NotAString { key: name, value } => {
                assert_eq!(name, key);
                assert_eq!(value, &bad);
            }
            other => panic!("expected wrong type for {key}, got {other:?}"),
        }
        assert!(err.to_string().starts_with(&format!("{key} parameter must be a string")));
    }
}

#[test]
fn unknown_parameters_are_ignored() {
    let mut p = full_params();
    p.insert("track".into(), Value::from("rust"));
    assert!(resolve(&p).is_ok());
}

#[test]
fn creating_a_source_succeeds() {
    let io = IoParams::new("twitter_public_stream", "tweets");
    let src = create_public_stream_source(&Context::default(), &io, &full_params());
    assert!(src.is_ok());
}

#[test]
fn creating_a_source_surfaces_key_errors() {
    let mut p = full_params();
    p.remove("access_token");
    let io = IoParams::new("twitter_public_stream", "tweets");
    let err = create_public_stream_source(&Context::default(), &io, &p)
        .err()
        .expect("missing parameter must fail creation");
    assert!(matches!(
        err.downcast_ref::<KeyError>(),
        Some(KeyError::MissingParameter("access_token"))
    ));
}
