//! Instance construction.
//!
//! Constructing a class creates the public instance, then walks the chain
//! from the most-derived class upward: each level gets its private domain,
//! runs its constructor with that domain as `this`, and hands off to its
//! ancestor through `Super`. Unless the constructor is marked ExplicitSuper,
//! the ancestor runs first through an implicit zero-argument `Super`. An
//! ExplicitSuper constructor that touches an ancestor's member before calling
//! `Super`, or returns without it, gets the implicit call at that point.

use std::rc::Rc;

use log::{debug, warn};

use crate::class::{Ancestor, ClassData, InstanceSlots, domain};
use crate::enumeration::{Mode, Privilege};
use crate::error::Error;
use crate::member::Member;
use crate::realm::{ClassId, Realm};
use crate::value::{CheapClone, Object, ObjectKind, ObjectRef, Value};

/// Progress of the Super hand-off for one construction level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SuperState {
    /// The class has no ancestor
    NotApplicable,
    Pending,
    Done,
}

/// One class level of a construction in flight
#[derive(Debug)]
pub(crate) struct ConstructionFrame {
    pub(crate) class: Rc<ClassData>,
    pub(crate) instance: ObjectRef,
    pub(crate) domain: ObjectRef,
    pub(crate) super_state: SuperState,
}

/// `new T(...args)` for a generated class
pub(crate) fn construct_new(
    realm: &mut Realm,
    class: &Rc<ClassData>,
    args: &[Value],
) -> Result<Value, Error> {
    if class.mode == Mode::Abstract {
        return Err(Error::syntax_error(format!(
            "cannot instantiate abstract class {}",
            class.name()
        )));
    }
    check_constructor_access(realm, class, false)?;

    let instance = create_instance(class);
    run_level(realm, class, &instance, args)?;

    if realm.config().seal_instances {
        realm.seal(&instance);
    }
    debug!("constructed {}", class.name());
    Ok(Value::Object(instance))
}

fn create_instance(class: &Rc<ClassData>) -> ObjectRef {
    let kind = match class.native_base() {
        Some(base) => base.kind.fresh_kind(),
        None => ObjectKind::Ordinary,
    };
    let mut object = Object::with_kind(Some(class.layout.prototype.cheap_clone()), kind);
    object.slots = Some(Rc::new(InstanceSlots::new(class.cheap_clone())));
    ObjectRef::new(object)
}

/// Attach the level's domain, settle Super and run the constructor
fn run_level(
    realm: &mut Realm,
    class: &Rc<ClassData>,
    instance: &ObjectRef,
    args: &[Value],
) -> Result<(), Error> {
    let domain = domain::create_private_domain(class, instance)?;
    let super_state = if class.extends.is_some() {
        SuperState::Pending
    } else {
        SuperState::NotApplicable
    };
    realm.constructions.push(ConstructionFrame {
        class: class.cheap_clone(),
        instance: instance.cheap_clone(),
        domain: domain.cheap_clone(),
        super_state,
    });
    let depth = realm.constructions.len();
    let explicit = class.constructor.as_ref().is_some_and(Member::calls_super);

    let result = if explicit {
        run_body(realm, class, &domain, args).and_then(|()| {
            // The body returned without Super
            if pending_at(realm, depth - 1) {
                implicit_super(realm, depth - 1)
            } else {
                Ok(())
            }
        })
    } else {
        let before = if pending_at(realm, depth - 1) {
            implicit_super(realm, depth - 1)
        } else {
            Ok(())
        };
        before.and_then(|()| run_body(realm, class, &domain, args))
    };

    realm.constructions.truncate(depth - 1);
    result
}

fn run_body(
    realm: &mut Realm,
    class: &Rc<ClassData>,
    domain: &ObjectRef,
    args: &[Value],
) -> Result<(), Error> {
    let Some(ctor) = &class.constructor else {
        return Ok(());
    };
    match ctor.value() {
        Value::Object(f) => {
            realm.call(&f, Value::Object(domain.cheap_clone()), args)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

fn pending_at(realm: &Realm, index: usize) -> bool {
    realm
        .constructions
        .get(index)
        .is_some_and(|frame| frame.super_state == SuperState::Pending)
}

/// Explicit `Super(...args)` from the constructor running against `domain`
pub(crate) fn super_call(realm: &mut Realm, domain: &ObjectRef, args: &[Value]) -> Result<(), Error> {
    let Some(index) = realm
        .constructions
        .iter()
        .rposition(|frame| ObjectRef::ptr_eq(&frame.domain, domain))
    else {
        return Err(Error::type_error(
            "Super() can only be called while a constructor is running",
        ));
    };
    let (class, state) = match realm.constructions.get(index) {
        Some(frame) => (frame.class.cheap_clone(), frame.super_state),
        None => return Err(Error::internal_error("construction frame vanished")),
    };

    match state {
        SuperState::NotApplicable => Err(Error::type_error(format!(
            "{} has no ancestor to call Super() on",
            class.name()
        ))),
        SuperState::Done => {
            warn!(
                "Super() should be the first statement in the constructor of {}",
                class.name()
            );
            Ok(())
        }
        SuperState::Pending => {
            mark_done(realm, index);
            invoke_ancestor(realm, index, args)
        }
    }
}

/// Called when an ancestor-owned member of `instance` is reached before its
/// domain exists. Runs the implicit Super of the innermost pending level that
/// would create it; returns whether one ran.
pub(crate) fn complete_pending_super(
    realm: &mut Realm,
    instance: &ObjectRef,
    owner: ClassId,
) -> Result<bool, Error> {
    let found = realm.constructions.iter().rposition(|frame| {
        frame.super_state == SuperState::Pending
            && ObjectRef::ptr_eq(&frame.instance, instance)
            && frame.class.id != owner
            && frame.class.is_same_or_descendant_of(owner)
    });
    match found {
        Some(index) => {
            implicit_super(realm, index)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn implicit_super(realm: &mut Realm, index: usize) -> Result<(), Error> {
    let Some(frame) = realm.constructions.get(index) else {
        return Err(Error::internal_error("construction frame vanished"));
    };
    let class = frame.class.cheap_clone();

    if let Some(Ancestor::Class(parent)) = &class.extends {
        let arity = parent.constructor_arity();
        if arity > 0 {
            return Err(Error::runtime_error(
                "RuntimeError",
                format!(
                    "{} must call Super() explicitly: the constructor of {} expects {} argument(s)",
                    class.name(),
                    parent.name(),
                    arity
                ),
            ));
        }
    }
    if realm.config().warn_implicit_super && class.constructor.is_some() {
        warn!("calling Super() on behalf of {}", class.name());
    }
    mark_done(realm, index);
    invoke_ancestor(realm, index, &[])
}

fn mark_done(realm: &mut Realm, index: usize) {
    if let Some(frame) = realm.constructions.get_mut(index) {
        frame.super_state = SuperState::Done;
    }
}

fn invoke_ancestor(realm: &mut Realm, index: usize, args: &[Value]) -> Result<(), Error> {
    let (class, instance) = match realm.constructions.get(index) {
        Some(frame) => (frame.class.cheap_clone(), frame.instance.cheap_clone()),
        None => return Err(Error::internal_error("construction frame vanished")),
    };
    match &class.extends {
        Some(Ancestor::Class(parent)) => {
            check_constructor_access(realm, parent, true)?;
            run_level(realm, parent, &instance, args)
        }
        Some(Ancestor::Native(base)) => (base.init)(realm, &instance, args),
        None => Ok(()),
    }
}

/// Constructor privilege. `through_super` is set when a descendant's
/// construction is driving this level.
fn check_constructor_access(
    realm: &Realm,
    class: &Rc<ClassData>,
    through_super: bool,
) -> Result<(), Error> {
    let Some(ctor) = &class.constructor else {
        return Ok(());
    };
    let caller = realm.current_class();
    let allowed = match ctor.privilege().effective() {
        Privilege::Protected => {
            through_super || caller.is_some_and(|c| c.is_same_or_descendant_of(class.id))
        }
        Privilege::Private => !through_super && caller.is_some_and(|c| c.id == class.id),
        _ => true,
    };
    if allowed {
        Ok(())
    } else {
        Err(Error::type_error(format!(
            "constructor of {} is {} and not accessible here",
            class.name(),
            ctor.privilege().effective().name().to_lowercase()
        )))
    }
}
