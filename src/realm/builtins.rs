//! Native constructors and their methods: the `Object` and `Array` bases a
//! generated class may extend.

use crate::error::Error;
use crate::realm::Realm;
use crate::value::{
    CheapClone, Constructor, Function, NativeConstructor, NativeKind, Object, ObjectKind,
    ObjectRef, Property, Value, array_length,
};

/// Build the `Object` constructor and populate `Object.prototype`
pub fn init_object(realm: &mut Realm) -> ObjectRef {
    let proto = realm.object_prototype.cheap_clone();
    realm.register_method(&proto, "hasOwnProperty", object_has_own_property, 1);

    let ctor = native_constructor(realm, "Object", 1, NativeKind::Object, object_init, &proto);
    realm.register_method(&ctor, "keys", object_keys, 1);
    ctor
}

/// Build the `Array` constructor and populate `Array.prototype`
pub fn init_array(realm: &mut Realm) -> ObjectRef {
    let proto = realm.array_prototype.cheap_clone();
    realm.register_method(&proto, "push", array_push, 1);
    realm.register_method(&proto, "pop", array_pop, 0);
    realm.register_method(&proto, "join", array_join, 1);

    let ctor = native_constructor(realm, "Array", 1, NativeKind::Array, array_init, &proto);
    realm.register_method(&ctor, "isArray", array_is_array, 1);
    ctor
}

fn native_constructor(
    realm: &mut Realm,
    name: &str,
    arity: usize,
    kind: NativeKind,
    init: crate::value::NativeInit,
    proto: &ObjectRef,
) -> ObjectRef {
    let name = realm.intern(name);
    let ctor = ObjectRef::new(Object::with_kind(
        Some(realm.function_prototype.cheap_clone()),
        ObjectKind::Function(Function::Constructor(Constructor::Native(NativeConstructor {
            name,
            arity,
            kind,
            init,
        }))),
    ));
    ctor.borrow_mut().define_property(
        realm.intern("prototype"),
        Property::with_attributes(Value::Object(proto.cheap_clone()), false, false, false),
    );
    proto.borrow_mut().define_property(
        realm.intern("constructor"),
        Property::with_attributes(Value::Object(ctor.cheap_clone()), true, false, true),
    );
    ctor
}

pub fn object_init(_realm: &mut Realm, _this: &ObjectRef, _args: &[Value]) -> Result<(), Error> {
    Ok(())
}

/// Array(n) creates `n` holes; any other argument list becomes the elements
pub fn array_init(_realm: &mut Realm, this: &ObjectRef, args: &[Value]) -> Result<(), Error> {
    let elements = match args {
        [Value::Number(n)] => vec![Value::Undefined; array_length(*n)?],
        _ => args.to_vec(),
    };
    let mut obj = this.borrow_mut();
    match &mut obj.kind {
        ObjectKind::Array(storage) => {
            *storage = elements;
            Ok(())
        }
        _ => Err(Error::type_error("Array initializer applied to a non-array object")),
    }
}

pub fn object_keys(realm: &mut Realm, _this: Value, args: &[Value]) -> Result<Value, Error> {
    let target = args
        .first()
        .cloned()
        .unwrap_or_default()
        .require_object("Object.keys argument")?;
    let keys: Vec<Value> = {
        let obj = target.borrow();
        let indices: Vec<Value> = obj
            .array_elements()
            .map(|e| (0..e.len()).map(|i| Value::from(i.to_string())).collect())
            .unwrap_or_else(Vec::new);
        indices
            .into_iter()
            .chain(
                obj.properties
                    .iter()
                    .filter(|(_, p)| p.enumerable)
                    .map(|(k, _)| Value::String(k.cheap_clone())),
            )
            .collect()
    };
    Ok(Value::Object(realm.array(keys)))
}

pub fn object_has_own_property(
    _realm: &mut Realm,
    this: Value,
    args: &[Value],
) -> Result<Value, Error> {
    let target = this.require_object("hasOwnProperty receiver")?;
    let key = args.first().map(Value::to_display).unwrap_or_default();
    Ok(Value::Boolean(target.borrow().has_own_property(&key)))
}

pub fn array_is_array(realm: &mut Realm, _this: Value, args: &[Value]) -> Result<Value, Error> {
    let value = args.first().cloned().unwrap_or_default();
    Ok(Value::Boolean(realm.is_array(&value)))
}

pub fn array_push(_realm: &mut Realm, this: Value, args: &[Value]) -> Result<Value, Error> {
    let target = this.require_object("Array.prototype.push receiver")?;
    let mut obj = target.borrow_mut();
    if obj.frozen {
        return Err(Error::type_error("Cannot add property, object is frozen"));
    }
    let ObjectKind::Array(elements) = &mut obj.kind else {
        return Err(Error::type_error("Array.prototype.push called on non-array"));
    };
    elements.extend(args.iter().cloned());
    Ok(Value::Number(elements.len() as f64))
}

pub fn array_pop(_realm: &mut Realm, this: Value, _args: &[Value]) -> Result<Value, Error> {
    let target = this.require_object("Array.prototype.pop receiver")?;
    let mut obj = target.borrow_mut();
    if obj.frozen {
        return Err(Error::type_error("Cannot delete property, object is frozen"));
    }
    let ObjectKind::Array(elements) = &mut obj.kind else {
        return Err(Error::type_error("Array.prototype.pop called on non-array"));
    };
    Ok(elements.pop().unwrap_or_default())
}

pub fn array_join(_realm: &mut Realm, this: Value, args: &[Value]) -> Result<Value, Error> {
    let target = this.require_object("Array.prototype.join receiver")?;
    let separator = match args.first() {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(sep) => sep.to_display(),
    };
    let obj = target.borrow();
    let Some(elements) = obj.array_elements() else {
        return Err(Error::type_error("Array.prototype.join called on non-array"));
    };
    let joined = elements
        .iter()
        .map(|e| {
            if e.is_null_or_undefined() {
                String::new()
            } else {
                e.to_display()
            }
        })
        .collect::<Vec<_>>()
        .join(&separator);
    Ok(Value::from(joined))
}
