//! Definition parsing: directives, member normalization and definition errors

use super::{constant, construct};
use classforge::{
    Accessor, Definition, Entry, Mode, Privilege, Realm, Value, abstract_, final_, private,
    property, public, static_,
};

#[test]
fn test_unboxed_members_default_to_public() {
    let mut realm = Realm::new();
    let ty = realm
        .define_class(Some("Loose"), Definition::new().member("x", 5))
        .unwrap();
    let info = realm.class_info(&ty).unwrap();
    assert_eq!(info.member("x").map(|m| m.privilege()), Some(Privilege::Public));

    let l = construct(&mut realm, &ty, &[]);
    assert_eq!(realm.get(&l, "x").unwrap(), Value::from(5));
}

#[test]
fn test_anonymous_classes_get_a_name() {
    let mut realm = Realm::new();
    let ty = realm.define_class(None, Definition::new()).unwrap();
    let info = realm.class_info(&ty).unwrap();
    assert_eq!(info.name(), "AnonymousClass");
    assert_eq!(info.mode(), Mode::Default);
    assert_eq!(realm.get(&ty, "name").unwrap(), Value::from("AnonymousClass"));
}

#[test]
fn test_unknown_directive_is_rejected() {
    let mut realm = Realm::new();
    let base = realm.define_class(Some("Base"), Definition::new()).unwrap();
    let err = realm
        .define_class(Some("Typo"), Definition::new().entry("Extend", &base))
        .unwrap_err();
    assert!(err.is_definition_error());
    assert!(err.to_string().contains("unrecognized definition key 'Extend'"));
}

#[test]
fn test_capitalized_member_names() {
    let mut realm = Realm::new();
    let ty = realm
        .define_class(
            Some("Endpoint"),
            Definition::new()
                .member("Name", public("api"))
                .member("URL", public("https://example.test"))
                .member("extends", public(1)),
        )
        .unwrap();
    let e = construct(&mut realm, &ty, &[]);
    assert_eq!(realm.get(&e, "Name").unwrap(), Value::from("api"));
    assert_eq!(realm.get(&e, "URL").unwrap(), Value::from("https://example.test"));
    assert_eq!(realm.get(&e, "extends").unwrap(), Value::from(1));

    for typo in ["MIXINS", "Implement", "Event"] {
        let err = realm
            .define_class(Some("Typo"), Definition::new().entry(typo, 1))
            .unwrap_err();
        assert!(err.is_definition_error(), "{}", typo);
    }
}

#[test]
fn test_mode_accepts_names() {
    let mut realm = Realm::new();
    let ty = realm
        .define_class(Some("Named"), Definition::new().entry("Mode", "Final"))
        .unwrap();
    assert_eq!(realm.class_info(&ty).unwrap().mode(), Mode::Final);

    let err = realm
        .define_class(Some("Odd"), Definition::new().entry("Mode", "Sealed"))
        .unwrap_err();
    assert!(err.to_string().contains("invalid Mode 'Sealed'"));
}

#[test]
fn test_extends_needs_a_constructor() {
    let mut realm = Realm::new();
    let plain = realm.object();
    let err = realm
        .define_class(Some("Orphan"), Definition::new().extends(&plain))
        .unwrap_err();
    assert!(err.is_definition_error());

    let f = constant(&mut realm, "f", Value::Undefined);
    assert!(realm
        .define_class(Some("Orphan"), Definition::new().extends(&f))
        .is_err());
}

#[test]
fn test_list_directives_need_lists() {
    let mut realm = Realm::new();
    let err = realm
        .define_class(Some("A"), Definition::new().entry("Implements", 5))
        .unwrap_err();
    assert!(err.to_string().contains("Implements must be an array"));

    let err = realm
        .define_class(
            Some("B"),
            Definition::new().entry("Events", vec![Entry::Value(Value::from(1))]),
        )
        .unwrap_err();
    assert!(err.to_string().contains("Events entry 0 is not a string"));
}

#[test]
fn test_conflicting_modifiers_surface_at_definition() {
    let mut realm = Realm::new();
    let get = constant(&mut realm, "get", Value::Undefined);
    let err = realm
        .define_class(
            Some("Conflicted"),
            Definition::new().member("p", final_(property(Accessor::getter(get.clone())))),
        )
        .unwrap_err();
    assert!(err.is_definition_error());

    let err = realm
        .define_class(
            Some("Contradictory"),
            Definition::new()
                .mode(Mode::Abstract)
                .member("q", final_(abstract_(&get))),
        )
        .unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"));

    // The outermost privilege wins
    let ty = realm
        .define_class(Some("Rewrapped"), Definition::new().member("x", private(public(1))))
        .unwrap();
    let info = realm.class_info(&ty).unwrap();
    assert_eq!(info.member("x").map(|m| m.privilege()), Some(Privilege::Private));
}

#[test]
fn test_abstract_member_rules() {
    let mut realm = Realm::new();
    let f = constant(&mut realm, "f", Value::Undefined);

    let err = realm
        .define_class(Some("NotAbstract"), Definition::new().member("f", abstract_(&f)))
        .unwrap_err();
    assert!(err.to_string().contains("must be Abstract"));

    let err = realm
        .define_class(
            Some("PrivateAbstract"),
            Definition::new()
                .mode(Mode::Abstract)
                .member("f", private(abstract_(&f))),
        )
        .unwrap_err();
    assert!(err.to_string().contains("cannot be private"));

    let err = realm
        .define_class(
            Some("StaticAbstract"),
            Definition::new()
                .mode(Mode::Abstract)
                .member("f", static_(abstract_(&f))),
        )
        .unwrap_err();
    assert!(err.to_string().contains("cannot be abstract"));
}

#[test]
fn test_constructor_must_be_a_plain_function() {
    let mut realm = Realm::new();
    let err = realm
        .define_class(Some("NoCtor"), Definition::new().constructor("not a function"))
        .unwrap_err();
    assert!(err.to_string().contains("Constructor must be a function"));

    let init = constant(&mut realm, "init", Value::Undefined);
    let err = realm
        .define_class(Some("StaticCtor"), Definition::new().constructor(static_(&init)))
        .unwrap_err();
    assert!(err.is_definition_error());

    let ty = realm
        .define_class(Some("Fine"), Definition::new().constructor(&init))
        .unwrap();
    let info = realm.class_info(&ty).unwrap();
    assert_eq!(info.constructor().map(|c| c.privilege()), Some(Privilege::Public));
}

#[test]
fn test_failed_definition_registers_nothing() {
    let mut realm = Realm::new();
    let before = realm.define_class(Some("First"), Definition::new()).unwrap();
    assert!(realm
        .define_class(Some("Broken"), Definition::new().entry("Mixin", 1))
        .is_err());
    let after = realm.define_class(Some("Second"), Definition::new()).unwrap();

    let first = realm.class_info(&before).unwrap();
    let second = realm.class_info(&after).unwrap();
    assert_eq!(first.name(), "First");
    assert_eq!(second.name(), "Second");
    assert!(!second.is_subclass_of(&before));
}
