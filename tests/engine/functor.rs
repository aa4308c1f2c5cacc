//! Bound methods: functors read off instances, rebinding and Delegate members

use super::{construct, reader};
use classforge::{Definition, Realm, Value, delegate, private, public};

fn labelled(realm: &mut Realm) -> classforge::ObjectRef {
    let init = realm.function("Labelled", 1, |realm, this, args| {
        let this = this.require_object("this")?;
        realm.set(&this, "label", args.first().cloned().unwrap_or_default())?;
        realm.set(&this, "tag", args.first().cloned().unwrap_or_default())?;
        Ok(Value::Undefined)
    });
    let label = reader(realm, "label");
    let tag = reader(realm, "tag");
    realm
        .define_class(
            Some("Labelled"),
            Definition::new()
                .member("label", public(""))
                .member("tag", private(""))
                .member("read_label", public(label))
                .member("read_tag", public(delegate(tag)))
                .constructor(init),
        )
        .unwrap()
}

#[test]
fn test_detached_method_keeps_its_instance() {
    let mut realm = Realm::new();
    let ty = labelled(&mut realm);
    let a = construct(&mut realm, &ty, &[Value::from("a")]);

    let Value::Object(read) = realm.get(&a, "read_label").unwrap() else {
        panic!("expected a function");
    };
    assert_eq!(realm.call(&read, Value::Undefined, &[]).unwrap(), Value::from("a"));
}

#[test]
fn test_rebinding_moves_a_method_to_another_receiver() {
    let mut realm = Realm::new();
    let ty = labelled(&mut realm);
    let a = construct(&mut realm, &ty, &[Value::from("a")]);
    let b = construct(&mut realm, &ty, &[Value::from("b")]);

    let Value::Object(read) = realm.get(&a, "read_label").unwrap() else {
        panic!("expected a function");
    };
    let moved = realm.rebind(&read, Value::from(&b)).unwrap();
    assert_eq!(realm.call(&moved, Value::Undefined, &[]).unwrap(), Value::from("b"));
}

#[test]
fn test_delegate_ignores_rebinding() {
    let mut realm = Realm::new();
    let ty = labelled(&mut realm);
    let a = construct(&mut realm, &ty, &[Value::from("a")]);
    let b = construct(&mut realm, &ty, &[Value::from("b")]);

    let Value::Object(read) = realm.get(&a, "read_tag").unwrap() else {
        panic!("expected a function");
    };
    let moved = realm.rebind(&read, Value::from(&b)).unwrap();
    assert_eq!(realm.call(&moved, Value::from(&b), &[]).unwrap(), Value::from("a"));
}

#[test]
fn test_constructors_cannot_be_rebound() {
    let mut realm = Realm::new();
    let ty = labelled(&mut realm);
    let other = realm.object();
    assert!(realm.rebind(&ty, Value::from(&other)).is_err());
}
