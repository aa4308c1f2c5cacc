//! Redirect accessors: how a protected or public name reaches the one
//! authoritative slot in a private or static domain.

use crate::class::domain;
use crate::error::Error;
use crate::member::LinkSpec;
use crate::realm::{ClassId, Realm};
use crate::value::{CheapClone, ObjectRef, Property, Value};

/// Where a redirect resolves to
#[derive(Debug, Clone)]
pub enum LinkTarget {
    /// The receiver's private domain for the given class
    Receiver(ClassId),
    /// A fixed storage object (the static domain)
    Fixed(ObjectRef),
    /// Nothing; reads and writes follow the realm's link policy
    Unresolved,
}

/// Build the getter/setter pair forwarding `spec.key` to its target
pub(crate) fn make_redirect(
    realm: &mut Realm,
    spec: &LinkSpec,
    target: &LinkTarget,
) -> Property {
    let get_key = spec.key.cheap_clone();
    let set_key = spec.key.cheap_clone();
    let getter_name = format!("get {}", spec.key);
    let setter_name = format!("set {}", spec.key);

    let (getter, setter) = match target {
        LinkTarget::Receiver(owner) => {
            let owner = *owner;
            let getter = realm.function(&getter_name, 0, move |realm, this, _| {
                match resolve(realm, &this, owner)? {
                    Some(domain) => domain::storage_get(realm, &domain, get_key.as_str()),
                    None => realm.unresolved_read(&get_key),
                }
            });
            let setter = realm.function(&setter_name, 1, move |realm, this, args| {
                let value = args.first().cloned().unwrap_or_default();
                match resolve(realm, &this, owner)? {
                    Some(domain) => domain::storage_set(realm, &domain, set_key.as_str(), value)?,
                    None => realm.unresolved_write(&set_key)?,
                }
                Ok(Value::Undefined)
            });
            (getter, setter)
        }
        LinkTarget::Fixed(storage) => {
            let read_from = storage.cheap_clone();
            let write_to = storage.cheap_clone();
            let getter = realm.function(&getter_name, 0, move |realm, _, _| {
                domain::storage_get(realm, &read_from, get_key.as_str())
            });
            let setter = realm.function(&setter_name, 1, move |realm, _, args| {
                let value = args.first().cloned().unwrap_or_default();
                domain::storage_set(realm, &write_to, set_key.as_str(), value)?;
                Ok(Value::Undefined)
            });
            (getter, setter)
        }
        LinkTarget::Unresolved => {
            let getter = realm.function(&getter_name, 0, move |realm, _, _| {
                realm.unresolved_read(&get_key)
            });
            let setter = realm.function(&setter_name, 1, move |realm, _, _| {
                realm.unresolved_write(&set_key)?;
                Ok(Value::Undefined)
            });
            (getter, setter)
        }
    };

    Property::accessor(Some(getter), Some(setter))
}

/// Find the private domain of class `owner` for whatever `receiver` is: the
/// public instance itself or any of its domains. An ancestor domain that is
/// still waiting on Super gets constructed here.
pub(crate) fn resolve(
    realm: &mut Realm,
    receiver: &Value,
    owner: ClassId,
) -> Result<Option<ObjectRef>, Error> {
    let Value::Object(obj) = receiver else {
        return Ok(None);
    };
    let instance = if obj.borrow().slots.is_some() {
        obj.cheap_clone()
    } else {
        match domain::instance_of_domain(obj) {
            Some(instance) => instance,
            None => return Ok(None),
        }
    };
    let Some(slots) = instance.borrow().slots.clone() else {
        return Ok(None);
    };

    if let Some(found) = slots.domain_for(owner) {
        return Ok(Some(found));
    }
    if crate::class::construct::complete_pending_super(realm, &instance, owner)? {
        return Ok(slots.domain_for(owner));
    }
    Ok(None)
}
