//! Static members, the static domain and StaticConstructor

use super::{construct, number};
use classforge::{Definition, Realm, Value, final_, private, protected, public, static_};

fn tracked(realm: &mut Realm) -> classforge::ObjectRef {
    let init = realm.function("Tracked", 0, |realm, this, _| {
        let this = this.require_object("this")?;
        let created = realm.get(&this, "created")?.as_number().unwrap_or(0.0);
        realm.set(&this, "created", Value::from(created + 1.0))?;
        Ok(Value::Undefined)
    });
    let count = realm.function("count", 0, |realm, this, _| {
        let this = this.require_object("this")?;
        realm.get(&this, "created")
    });
    realm
        .define_class(
            Some("Tracked"),
            Definition::new()
                .member("created", private(static_(0)))
                .member("count", public(static_(count)))
                .constructor(init),
        )
        .unwrap()
}

#[test]
fn test_instances_share_static_state() {
    let mut realm = Realm::new();
    let ty = tracked(&mut realm);
    construct(&mut realm, &ty, &[]);
    construct(&mut realm, &ty, &[]);

    assert_eq!(realm.call_method(&ty, "count", &[]).unwrap(), Value::from(2));
    assert_eq!(realm.get(&ty, "created").unwrap(), Value::Undefined);
}

#[test]
fn test_statics_are_not_on_instances() {
    let mut realm = Realm::new();
    let ty = tracked(&mut realm);
    let t = construct(&mut realm, &ty, &[]);
    assert_eq!(realm.get(&t, "count").unwrap(), Value::Undefined);
}

#[test]
fn test_static_constructor_runs_once_at_definition() {
    let mut realm = Realm::new();
    let setup = realm.function("setup", 0, |realm, this, _| {
        let this = this.require_object("this")?;
        realm.set(&this, "ready", Value::from(true))?;
        realm.set(&this, "version", Value::from(3))?;
        Ok(Value::Undefined)
    });
    let ty = realm
        .define_class(
            Some("Service"),
            Definition::new()
                .member("ready", public(static_(false)))
                .member("version", protected(static_(0)))
                .static_constructor(setup),
        )
        .unwrap();

    assert_eq!(realm.get(&ty, "ready").unwrap(), Value::from(true));
    assert_eq!(realm.get(&ty, "version").unwrap(), Value::Undefined);
}

#[test]
fn test_static_constructor_failure_fails_definition() {
    let mut realm = Realm::new();
    let boom = realm.function("boom", 0, |_, _, _| {
        Err(classforge::Error::runtime_error("Error", "not today"))
    });
    let err = realm
        .define_class(Some("Fragile"), Definition::new().static_constructor(boom))
        .unwrap_err();
    assert_eq!(err.kind(), "Error");
}

#[test]
fn test_static_constructor_restrictions() {
    let mut realm = Realm::new();
    let setup = realm.function("setup", 0, |_, _, _| Ok(Value::Undefined));
    let err = realm
        .define_class(Some("Hidden"), Definition::new().static_constructor(private(&setup)))
        .unwrap_err();
    assert!(err.is_definition_error());

    let err = realm
        .define_class(Some("Valued"), Definition::new().static_constructor(5))
        .unwrap_err();
    assert!(err.to_string().contains("must be a function"));
}

#[test]
fn test_final_static_is_read_only() {
    let mut realm = Realm::new();
    let ty = realm
        .define_class(
            Some("Limits"),
            Definition::new().member("max", public(static_(final_(10)))),
        )
        .unwrap();
    assert_eq!(number(&mut realm, &ty, "max"), 10.0);
    assert!(realm.set(&ty, "max", Value::from(11)).is_err());
}

#[test]
fn test_reserved_static_names() {
    let mut realm = Realm::new();
    let err = realm
        .define_class(
            Some("Clash"),
            Definition::new().member("name", public(static_("x"))),
        )
        .unwrap_err();
    assert!(err.is_definition_error());

    // Private statics are not exposed on the type, so the name is free
    assert!(realm
        .define_class(
            Some("Fine"),
            Definition::new().member("name", private(static_("x"))),
        )
        .is_ok());
}

#[test]
fn test_protected_statics_reach_descendants() {
    let mut realm = Realm::new();
    let base = realm
        .define_class(
            Some("Base"),
            Definition::new().member("registry", protected(static_("base-registry"))),
        )
        .unwrap();
    let lookup = realm.function("lookup", 0, |realm, this, _| {
        let this = this.require_object("this")?;
        realm.get(&this, "registry")
    });
    let sub = realm
        .define_class(
            Some("Sub"),
            Definition::new()
                .extends(&base)
                .member("lookup", public(&lookup))
                .member("static_lookup", public(static_(&lookup))),
        )
        .unwrap();

    let s = construct(&mut realm, &sub, &[]);
    assert_eq!(
        realm.call_method(&s, "lookup", &[]).unwrap(),
        Value::from("base-registry")
    );
    assert_eq!(
        realm.call_method(&sub, "static_lookup", &[]).unwrap(),
        Value::from("base-registry")
    );
    assert_eq!(realm.get(&sub, "registry").unwrap(), Value::Undefined);
}
