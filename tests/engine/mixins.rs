//! Mixins: plain objects, classes and JSON documents merged into a class

use super::{constant, construct, reader};
use classforge::{Definition, Entry, Realm, Value, private, public};

#[test]
fn test_plain_object_mixin() {
    let mut realm = Realm::new();
    let greet = realm.function("greet", 0, |realm, this, _| {
        let this = this.require_object("this")?;
        let name = realm.get(&this, "name")?;
        Ok(Value::from(format!("hi {}", name.to_display())))
    });
    let mixin = realm.object();
    realm.set(&mixin, "greet", Value::from(greet)).unwrap();

    let ty = realm
        .define_class(
            Some("Person"),
            Definition::new()
                .mixins([&mixin])
                .member("name", private("ada")),
        )
        .unwrap();
    let p = construct(&mut realm, &ty, &[]);
    assert_eq!(realm.call_method(&p, "greet", &[]).unwrap(), Value::from("hi ada"));
}

#[test]
fn test_later_mixins_and_locals_win() {
    let mut realm = Realm::new();
    let first = realm.object();
    realm.set(&first, "who", Value::from("first")).unwrap();
    realm.set(&first, "only_first", Value::from(1)).unwrap();
    let second = realm.object();
    realm.set(&second, "who", Value::from("second")).unwrap();

    let ordered = realm
        .define_class(Some("Ordered"), Definition::new().mixins([&first, &second]))
        .unwrap();
    let o = construct(&mut realm, &ordered, &[]);
    assert_eq!(realm.get(&o, "who").unwrap(), Value::from("second"));
    assert_eq!(realm.get(&o, "only_first").unwrap(), Value::from(1));

    let local = realm
        .define_class(
            Some("Local"),
            Definition::new()
                .mixins([&first, &second])
                .member("who", public("local")),
        )
        .unwrap();
    let l = construct(&mut realm, &local, &[]);
    assert_eq!(realm.get(&l, "who").unwrap(), Value::from("local"));
}

#[test]
fn test_class_mixin_copies_visible_members() {
    let mut realm = Realm::new();
    let greet = realm.function("greet", 0, |realm, this, _| {
        let this = this.require_object("this")?;
        realm.get(&this, "title")
    });
    let source = realm
        .define_class(
            Some("Titled"),
            Definition::new()
                .member("title", public("untitled"))
                .member("greet", public(greet))
                .member("secret", private(1)),
        )
        .unwrap();

    let ty = realm
        .define_class(Some("Book"), Definition::new().mixins([&source]))
        .unwrap();
    let b = construct(&mut realm, &ty, &[]);

    assert_eq!(realm.call_method(&b, "greet", &[]).unwrap(), Value::from("untitled"));
    realm.set(&b, "title", Value::from("Dune")).unwrap();
    assert_eq!(realm.call_method(&b, "greet", &[]).unwrap(), Value::from("Dune"));
    assert_eq!(realm.get(&b, "secret").unwrap(), Value::Undefined);

    // Mixing in does not make the class a descendant
    assert!(!realm.instance_of(&Value::from(&b), &source).unwrap());
}

#[test]
fn test_mixin_methods_see_local_members() {
    let mut realm = Realm::new();
    let mixin = realm.object();
    let size = reader(&mut realm, "size");
    realm.set(&mixin, "size_of", Value::from(size)).unwrap();

    let ty = realm
        .define_class(
            Some("Box"),
            Definition::new().mixins([&mixin]).member("size", private(3)),
        )
        .unwrap();
    let b = construct(&mut realm, &ty, &[]);
    assert_eq!(realm.call_method(&b, "size_of", &[]).unwrap(), Value::from(3));
}

#[test]
fn test_native_constructor_mixin_brings_its_methods() {
    let mut realm = Realm::new();
    let array = realm.array_constructor();
    let ty = realm
        .define_class(Some("Listish"), Definition::new().mixins([&array]))
        .unwrap();
    let info = realm.class_info(&ty).unwrap();
    assert!(info.member("join").is_some());
    assert!(info.member("push").is_some());
}

#[test]
fn test_bare_function_mixin_is_rejected() {
    let mut realm = Realm::new();
    let f = constant(&mut realm, "helper", Value::Undefined);
    let err = realm
        .define_class(Some("Bad"), Definition::new().mixins([&f]))
        .unwrap_err();
    assert!(err.is_definition_error());
    assert!(err.to_string().contains("bare function"));
}

#[test]
fn test_mixins_must_be_a_list() {
    let mut realm = Realm::new();
    let err = realm
        .define_class(Some("Bad"), Definition::new().entry("Mixins", "nope"))
        .unwrap_err();
    assert!(err.to_string().contains("must be an array"));
}

#[test]
fn test_json_document_as_mixin() {
    let mut realm = Realm::new();
    let settings = realm
        .parse_json(r#"{ "color": "red", "sizes": [1, 2, 3] }"#)
        .unwrap();
    let ty = realm
        .define_class(
            Some("Themed"),
            Definition::new().entry("Mixins", vec![Entry::Value(settings)]),
        )
        .unwrap();
    let t = construct(&mut realm, &ty, &[]);

    assert_eq!(realm.get(&t, "color").unwrap(), Value::from("red"));
    let sizes = realm.get(&t, "sizes").unwrap();
    assert!(realm.is_array(&sizes));
}
