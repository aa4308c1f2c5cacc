//! Private and static domains: the `this` a class's own code sees.
//!
//! A domain resolves a key in order: the class's own Private members, the
//! protected link chain of the instance's most-derived class (so overrides
//! dispatch virtually), the class's static view, then the domain's own
//! storage (declared defaults via its prototype, plus dynamic additions).

use std::rc::Rc;

use crate::class::{Ancestor, ClassData, DomainData, DomainRole};
use crate::error::Error;
use crate::functor;
use crate::realm::Realm;
use crate::value::{BoundScope, CheapClone, Object, ObjectKind, ObjectRef, Value};

/// Create the private domain of `class` for `instance` and attach it
pub(crate) fn create_private_domain(
    class: &Rc<ClassData>,
    instance: &ObjectRef,
) -> Result<ObjectRef, Error> {
    let Some(slots) = instance.borrow().slots.clone() else {
        return Err(Error::internal_error("instance has no capability slots"));
    };
    let head = slots.class().layout.protected.cheap_clone();
    let domain = ObjectRef::new(Object::with_kind(
        Some(class.layout.defaults.cheap_clone()),
        ObjectKind::Domain(DomainData::instance(class, instance.downgrade(), head)),
    ));
    slots.attach(class.id, domain.cheap_clone());
    Ok(domain)
}

fn domain_parts(domain: &ObjectRef) -> Result<(Rc<ClassData>, DomainRole), Error> {
    let obj = domain.borrow();
    let Some(data) = obj.as_domain() else {
        return Err(Error::internal_error("expected a domain object"));
    };
    match data.class() {
        Some(class) => Ok((class, data.role().clone())),
        None => Err(Error::internal_error("domain outlived its class")),
    }
}

/// The public instance behind a private domain
pub(crate) fn instance_of_domain(domain: &ObjectRef) -> Option<ObjectRef> {
    match domain.borrow().as_domain()?.role() {
        DomainRole::Instance { instance, .. } => instance.upgrade(),
        DomainRole::Static => None,
    }
}

/// Whether the static view of `class` (its statics and every inherited
/// protected/public static) has `key`
fn static_view_has(class: &ClassData, key: &str) -> bool {
    class.layout.static_domain.borrow().has_own_property(key)
        || class
            .layout
            .protected_static
            .borrow()
            .get_property_descriptor(key)
            .is_some()
}

pub(crate) fn domain_get(realm: &mut Realm, domain: &ObjectRef, key: &str) -> Result<Value, Error> {
    let (class, role) = domain_parts(domain)?;
    let is_static = matches!(role, DomainRole::Static);

    if class.is_private_member(key, is_static) {
        return storage_get(realm, domain, key);
    }

    let head = match &role {
        DomainRole::Instance { head, .. } => head.cheap_clone(),
        DomainRole::Static => class.layout.protected_static.cheap_clone(),
    };
    let found = head.borrow().get_property_descriptor(key);
    if let Some((prop, _)) = found {
        return realm.read_property(prop, &Value::Object(domain.cheap_clone()));
    }

    if !is_static && static_view_has(&class, key) {
        let statics = class.layout.static_domain.cheap_clone();
        return domain_get(realm, &statics, key);
    }

    storage_get(realm, domain, key)
}

pub(crate) fn domain_set(
    realm: &mut Realm,
    domain: &ObjectRef,
    key: &str,
    value: Value,
) -> Result<(), Error> {
    let (class, role) = domain_parts(domain)?;
    let is_static = matches!(role, DomainRole::Static);

    if class.is_private_member(key, is_static) {
        return storage_set(realm, domain, key, value);
    }

    let head = match &role {
        DomainRole::Instance { head, .. } => head.cheap_clone(),
        DomainRole::Static => class.layout.protected_static.cheap_clone(),
    };
    let found = head.borrow().get_property_descriptor(key);
    if let Some((prop, _)) = found {
        return match prop.setter {
            Some(setter) => {
                realm.call(&setter, Value::Object(domain.cheap_clone()), &[value])?;
                Ok(())
            }
            None => Err(Error::type_error(format!(
                "Cannot set property {} which has only a getter",
                key
            ))),
        };
    }

    if !is_static && static_view_has(&class, key) {
        let statics = class.layout.static_domain.cheap_clone();
        return domain_set(realm, &statics, key, value);
    }

    storage_set(realm, domain, key, value)
}

/// Read the authoritative slot. Methods come back as functors bound to the
/// public instance (or the type, for statics) and re-enter this class's
/// domain when called. Delegate members are fixed.
pub(crate) fn storage_get(realm: &mut Realm, domain: &ObjectRef, key: &str) -> Result<Value, Error> {
    let found = domain.borrow().get_property_descriptor(key);
    let Some((prop, _)) = found else {
        return Ok(Value::Undefined);
    };
    if prop.is_accessor() {
        return realm.read_property(prop, &Value::Object(domain.cheap_clone()));
    }

    let Some(target) = functor::needs_binding(&prop.value) else {
        return Ok(prop.value);
    };
    let (class, role) = domain_parts(domain)?;
    let (owner, scope) = match &role {
        DomainRole::Instance { instance, .. } => {
            (instance.upgrade(), BoundScope::Instance(class.id()))
        }
        DomainRole::Static => (class.type_object(), BoundScope::Static(class.id())),
    };
    let Some(owner) = owner else {
        return Err(Error::internal_error(format!(
            "{} outlived the owner of its domain",
            key
        )));
    };
    let is_static = matches!(scope, BoundScope::Static(_));
    let fixed = owning_member_is_delegate(&class, key, is_static);
    Ok(Value::Object(functor::bind(
        realm,
        &target,
        Value::Object(owner),
        fixed,
        Some(scope),
    )))
}

fn owning_member_is_delegate(class: &ClassData, key: &str, is_static: bool) -> bool {
    class
        .own_member(key, is_static)
        .is_some_and(|member| member.is_delegate())
}

pub(crate) fn storage_set(
    realm: &mut Realm,
    domain: &ObjectRef,
    key: &str,
    value: Value,
) -> Result<(), Error> {
    realm.ordinary_set(domain, key, value, domain)
}

/// The ancestor's version of `key` as seen from the private domain `domain`
pub(crate) fn super_get(realm: &mut Realm, domain: &ObjectRef, key: &str) -> Result<Value, Error> {
    let (class, role) = domain_parts(domain)?;
    if matches!(role, DomainRole::Static) {
        let Some(parent) = class.parent() else {
            return Err(Error::type_error(format!(
                "{} has no generated ancestor",
                class.name()
            )));
        };
        let head = parent.layout.protected_static.cheap_clone();
        return realm.ordinary_get(&head, key, &Value::Object(domain.cheap_clone()));
    }

    match &class.extends {
        Some(Ancestor::Class(parent)) => {
            let head = parent.layout.protected.cheap_clone();
            realm.ordinary_get(&head, key, &Value::Object(domain.cheap_clone()))
        }
        Some(Ancestor::Native(base)) => {
            let Some(instance) = instance_of_domain(domain) else {
                return Ok(Value::Undefined);
            };
            let receiver = Value::Object(instance);
            let value = realm.ordinary_get(&base.prototype.cheap_clone(), key, &receiver)?;
            match functor::needs_binding(&value) {
                Some(target) => Ok(Value::Object(functor::bind(
                    realm, &target, receiver, false, None,
                ))),
                None => Ok(value),
            }
        }
        None => Err(Error::type_error(format!("{} has no ancestor", class.name()))),
    }
}
