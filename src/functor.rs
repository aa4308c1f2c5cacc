//! Functors: callables carrying the receiver they run against

use crate::error::Error;
use crate::link;
use crate::realm::Realm;
use crate::value::{
    BoundScope, CheapClone, Constructor, Function, FunctorData, Object, ObjectKind, ObjectRef,
    Value,
};

/// Wrap `target` so it runs against `receiver`, entering `scope` of it on each call
pub(crate) fn bind(
    realm: &Realm,
    target: &ObjectRef,
    receiver: Value,
    fixed: bool,
    scope: Option<BoundScope>,
) -> ObjectRef {
    ObjectRef::new(Object::with_kind(
        Some(realm.function_prototype.cheap_clone()),
        ObjectKind::Function(Function::Functor(FunctorData {
            target: target.cheap_clone(),
            receiver,
            fixed,
            scope,
        })),
    ))
}

/// A functor calling `func` against `receiver`. Fixed functors come back unchanged.
pub(crate) fn rebind(realm: &Realm, func: &ObjectRef, receiver: Value) -> Result<ObjectRef, Error> {
    let (target, scope) = match &func.borrow().kind {
        ObjectKind::Function(Function::Functor(data)) if data.fixed => return Ok(func.cheap_clone()),
        ObjectKind::Function(Function::Functor(data)) => (data.target.cheap_clone(), data.scope),
        ObjectKind::Function(Function::Native(_)) => (func.cheap_clone(), None),
        ObjectKind::Function(Function::Constructor(_)) => {
            return Err(Error::type_error("Cannot rebind a constructor"));
        }
        _ => return Err(Error::type_error("Cannot rebind a non-function")),
    };
    Ok(bind(realm, &target, receiver, false, scope))
}

/// The `this` a scoped functor's target actually runs against. Receivers
/// outside the scope's class pass through unchanged.
pub(crate) fn resolve_receiver(
    realm: &mut Realm,
    receiver: Value,
    scope: Option<BoundScope>,
) -> Result<Value, Error> {
    match scope {
        None => Ok(receiver),
        Some(BoundScope::Instance(owner)) => match link::resolve(realm, &receiver, owner)? {
            Some(domain) => Ok(Value::Object(domain)),
            None => Ok(receiver),
        },
        Some(BoundScope::Static(owner)) => {
            let Value::Object(ty) = &receiver else {
                return Ok(receiver);
            };
            let class = match &ty.borrow().kind {
                ObjectKind::Function(Function::Constructor(Constructor::Class(class))) => {
                    Some(class.clone())
                }
                _ => None,
            };
            let Some(class) = class else {
                return Ok(receiver);
            };
            let mut level = Some(&class);
            while let Some(c) = level {
                if c.id() == owner {
                    return Ok(Value::Object(c.layout.static_domain.cheap_clone()));
                }
                level = c.parent();
            }
            Ok(receiver)
        }
    }
}

/// Whether reads should hand `value` out bound to an owner. Functors keep
/// their binding; constructors are not methods.
pub(crate) fn needs_binding(value: &Value) -> Option<ObjectRef> {
    let Value::Object(obj) = value else {
        return None;
    };
    let bindable = matches!(obj.borrow().kind, ObjectKind::Function(Function::Native(_)));
    bindable.then(|| obj.cheap_clone())
}
