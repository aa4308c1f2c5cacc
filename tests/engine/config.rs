//! Realm configuration: link policy and instance sealing

use super::construct;
use classforge::{Definition, LinkPolicy, Realm, RealmConfig, Value, public};

#[test]
fn test_strict_links_fail_without_an_instance() {
    let mut realm = Realm::new();
    let ty = realm
        .define_class(Some("Strict"), Definition::new().member("x", public(1)))
        .unwrap();
    let Value::Object(proto) = realm.get(&ty, "prototype").unwrap() else {
        panic!("expected a prototype object");
    };

    let err = realm.get(&proto, "x").unwrap_err();
    assert_eq!(err.kind(), "ReferenceError");
    assert!(realm.set(&proto, "x", Value::from(2)).is_err());
}

#[test]
fn test_lenient_links_read_undefined() {
    let mut realm = Realm::with_config(RealmConfig {
        link_policy: LinkPolicy::Lenient,
        ..RealmConfig::default()
    });
    let ty = realm
        .define_class(Some("Lenient"), Definition::new().member("x", public(1)))
        .unwrap();
    let Value::Object(proto) = realm.get(&ty, "prototype").unwrap() else {
        panic!("expected a prototype object");
    };

    assert_eq!(realm.get(&proto, "x").unwrap(), Value::Undefined);
    realm.set(&proto, "x", Value::from(2)).unwrap();

    // Real instances are unaffected
    let obj = construct(&mut realm, &ty, &[]);
    assert_eq!(realm.get(&obj, "x").unwrap(), Value::from(1));
}

#[test]
fn test_unsealed_instances_accept_new_properties() {
    let config = RealmConfig::from_json(r#"{ "seal_instances": false }"#).unwrap();
    let mut realm = Realm::with_config(config);
    let ty = realm.define_class(Some("Open"), Definition::new()).unwrap();
    let obj = construct(&mut realm, &ty, &[]);

    realm.set(&obj, "extra", Value::from(1)).unwrap();
    assert_eq!(realm.get(&obj, "extra").unwrap(), Value::from(1));
}

#[test]
fn test_config_round_trips_through_json() {
    let config = RealmConfig {
        link_policy: LinkPolicy::Lenient,
        seal_instances: false,
        warn_implicit_super: false,
    };
    let json = config.to_json().unwrap();
    assert!(json.contains("\"lenient\""));
    assert_eq!(RealmConfig::from_json(&json).unwrap(), config);
    assert!(RealmConfig::from_json("{ \"link_policy\": \"loose\" }").is_err());
}
