//! Class definition processing: validate a definition, sort its members into
//! scopes, splice them onto the ancestor's chains and expose the type.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::class::definition::{Entry, is_misspelled_directive};
use crate::class::{
    Ancestor, ClassData, ClassLayout, Definition, DomainData, NativeBase, effective_members,
};
use crate::enumeration::{Mode, Privilege};
use crate::error::Error;
use crate::interface::Interface;
use crate::link::LinkTarget;
use crate::member::{Accessor, Member, Modifiers};
use crate::realm::{ClassId, Realm};
use crate::scope::{ScopeContainer, ScopeTable, expand_scope, populate_scopes};
use crate::value::{
    CheapClone, Constructor, Function, FxIndexMap, Object, ObjectKind, ObjectRef, Property, Str,
    Value, WeakObjectRef, index_map_new,
};

/// Own properties of a generated type that statics may not shadow
const RESERVED_STATICS: [&str; 2] = ["prototype", "name"];

/// A definition after directive validation
struct Parsed {
    mode: Mode,
    extends: Option<(ObjectRef, Ancestor)>,
    implements: Vec<Rc<Interface>>,
    mixins: Vec<ObjectRef>,
    events: Vec<Str>,
    constructor: Option<Member>,
    static_constructor: Option<Member>,
    members: ScopeTable,
}

impl Parsed {
    fn parent(&self) -> Option<&Rc<ClassData>> {
        match &self.extends {
            Some((_, Ancestor::Class(parent))) => Some(parent),
            _ => None,
        }
    }
}

pub(crate) fn define_class(
    realm: &mut Realm,
    name: Option<&str>,
    definition: Definition,
) -> Result<ObjectRef, Error> {
    let name = realm.intern(name.unwrap_or("AnonymousClass"));
    let parsed = parse(realm, &name, definition.into_entries()?)?;

    let mixin_members = flatten_mixins(realm, &parsed.mixins, &parsed.members)?;
    check_overrides(&name, parsed.parent(), &mixin_members)?;
    check_overrides(&name, parsed.parent(), &parsed.members)?;

    let visible = effective_members(parsed.parent(), &mixin_members, &parsed.members);
    if parsed.mode != Mode::Abstract {
        if let Some((key, _)) = visible.iter().find(|(_, m)| m.is_abstract()) {
            return Err(Error::definition_error(format!(
                "{} must be Abstract: member '{}' is abstract and not implemented",
                name, key
            )));
        }
    }

    let interface = Rc::new(Interface::derive(name.cheap_clone(), &visible));
    for required in &parsed.implements {
        required.check_members(&visible).map_err(|reason| {
            Error::definition_error(format!(
                "{} does not implement {}: {}",
                name,
                required.name(),
                reason
            ))
        })?;
    }

    let mut scopes = ScopeContainer::default();
    populate_scopes(&mut scopes, &parsed.members);
    let mut mixin_scopes = ScopeContainer::default();
    populate_scopes(&mut mixin_scopes, &mixin_members);
    if let Some((_, Ancestor::Native(base))) = &parsed.extends {
        scopes.super_prototype = Some(base.prototype.cheap_clone());
    }

    let id = realm.next_class_id();
    let layout = build_layout(
        realm,
        id,
        &scopes,
        &mixin_scopes,
        parsed.extends.as_ref().map(|(_, ancestor)| ancestor),
    )?;

    let Parsed {
        mode,
        extends,
        constructor,
        static_constructor,
        events,
        ..
    } = parsed;
    let (host_prototype, extends) = match extends {
        Some((ctor, ancestor)) => (ctor, Some(ancestor)),
        None => (realm.function_prototype.cheap_clone(), None),
    };

    let class = Rc::new(ClassData {
        id,
        name: name.cheap_clone(),
        mode,
        extends,
        scopes,
        mixin_scopes,
        constructor,
        static_constructor,
        interface,
        events,
        layout,
        type_object: RefCell::new(WeakObjectRef::default()),
    });
    let static_domain = class.layout.static_domain.cheap_clone();
    static_domain.borrow_mut().kind = ObjectKind::Domain(DomainData::statics(&class));

    let ty = ObjectRef::new(Object::with_kind(
        Some(host_prototype),
        ObjectKind::Function(Function::Constructor(Constructor::Class(class.cheap_clone()))),
    ));
    {
        let prototype_key = realm.intern("prototype");
        let name_key = realm.intern("name");
        let mut t = ty.borrow_mut();
        t.define_property(
            prototype_key,
            Property::with_attributes(
                Value::Object(class.layout.prototype.cheap_clone()),
                false,
                false,
                false,
            ),
        );
        t.define_property(
            name_key,
            Property::with_attributes(Value::String(name.cheap_clone()), false, false, true),
        );
    }
    expand_scope(
        realm,
        &ty,
        &class.scopes.public_static,
        &LinkTarget::Fixed(static_domain.cheap_clone()),
    )?;
    realm.freeze(&ty);
    *class.type_object.borrow_mut() = ty.downgrade();
    debug!("defined class {} ({:?})", name, class.mode);

    if let Some(init) = &class.static_constructor {
        if let Value::Object(f) = init.value() {
            realm.call(&f, Value::Object(static_domain), &[])?;
        }
    }
    Ok(ty)
}

// ═══════════════════════════════════════════════════════════════════════════
// Directive validation
// ═══════════════════════════════════════════════════════════════════════════

fn parse(realm: &mut Realm, name: &Str, entries: FxIndexMap<Str, Entry>) -> Result<Parsed, Error> {
    let mut parsed = Parsed {
        mode: Mode::Default,
        extends: None,
        implements: Vec::new(),
        mixins: Vec::new(),
        events: Vec::new(),
        constructor: None,
        static_constructor: None,
        members: index_map_new(),
    };

    for (key, entry) in entries {
        match key.as_str() {
            "Mode" => parsed.mode = parse_mode(entry)?,
            "Extends" => parsed.extends = Some(parse_extends(realm, entry)?),
            "Implements" => {
                for (i, item) in list(key.as_str(), entry)?.into_iter().enumerate() {
                    parsed.implements.push(as_interface(i, item)?);
                }
            }
            "Mixins" => {
                for (i, item) in list(key.as_str(), entry)?.into_iter().enumerate() {
                    parsed.mixins.push(as_mixin(i, item)?);
                }
            }
            "Events" => {
                for (i, item) in list(key.as_str(), entry)?.into_iter().enumerate() {
                    match item {
                        Entry::Value(Value::String(event)) => parsed.events.push(event),
                        _ => {
                            return Err(Error::definition_error(format!(
                                "Events entry {} is not a string",
                                i
                            )));
                        }
                    }
                }
            }
            "Constructor" => parsed.constructor = Some(parse_constructor(key.as_str(), entry)?),
            "StaticConstructor" => {
                parsed.static_constructor = Some(parse_static_constructor(key.as_str(), entry)?)
            }
            other if is_misspelled_directive(other) => {
                return Err(Error::definition_error(format!(
                    "unrecognized definition key '{}' in {}",
                    other, name
                )));
            }
            _ => {
                let member = member_from_entry(key.as_str(), entry)?;
                let member = finish_member(realm, key.as_str(), member)?;
                parsed.members.insert(key, member);
            }
        }
    }
    Ok(parsed)
}

fn parse_mode(entry: Entry) -> Result<Mode, Error> {
    match entry {
        Entry::Mode(mode) => Ok(mode),
        Entry::Value(Value::String(s)) => Mode::from_name(s.as_str())
            .ok_or_else(|| Error::definition_error(format!("invalid Mode '{}'", s))),
        _ => Err(Error::definition_error("Mode must be one of Default, Abstract, Final")),
    }
}

fn parse_extends(realm: &mut Realm, entry: Entry) -> Result<(ObjectRef, Ancestor), Error> {
    let Entry::Value(Value::Object(ctor)) = entry else {
        return Err(Error::definition_error("Extends target is not a constructor"));
    };
    let constructor = match &ctor.borrow().kind {
        ObjectKind::Function(Function::Constructor(c)) => c.clone(),
        _ => return Err(Error::definition_error("Extends target is not a constructor")),
    };

    let ancestor = match constructor {
        Constructor::Class(class) => {
            if class.mode == Mode::Final {
                return Err(Error::definition_error(format!(
                    "cannot extend final class {}",
                    class.name()
                )));
            }
            Ancestor::Class(class)
        }
        Constructor::Native(native) => {
            let Value::Object(prototype) = realm.get(&ctor, "prototype")? else {
                return Err(Error::definition_error(format!(
                    "{} has no prototype to extend",
                    native.name
                )));
            };
            Ancestor::Native(NativeBase {
                name: native.name,
                kind: native.kind,
                init: native.init,
                prototype,
                arity: native.arity,
            })
        }
    };
    Ok((ctor, ancestor))
}

/// A list-valued directive; host arrays are accepted as lists
fn list(key: &str, entry: Entry) -> Result<Vec<Entry>, Error> {
    match entry {
        Entry::List(items) => Ok(items),
        Entry::Value(Value::Object(obj)) => match obj.borrow().array_elements() {
            Some(elements) => Ok(elements.iter().cloned().map(Entry::Value).collect()),
            None => Err(Error::definition_error(format!("{} must be an array", key))),
        },
        _ => Err(Error::definition_error(format!("{} must be an array", key))),
    }
}

fn as_interface(index: usize, entry: Entry) -> Result<Rc<Interface>, Error> {
    let found = match &entry {
        Entry::Interface(iface) => Some(iface.cheap_clone()),
        Entry::Value(Value::Object(obj)) => obj.borrow().as_interface().cloned(),
        _ => None,
    };
    found.ok_or_else(|| {
        Error::definition_error(format!("Implements entry {} is not an Interface", index))
    })
}

fn as_mixin(index: usize, entry: Entry) -> Result<ObjectRef, Error> {
    let Entry::Value(Value::Object(obj)) = entry else {
        return Err(Error::definition_error(format!(
            "Mixins entry {} is not a constructor or object",
            index
        )));
    };
    let bare_function = {
        let o = obj.borrow();
        o.is_callable() && !o.is_constructor()
    };
    if bare_function {
        return Err(Error::definition_error(format!(
            "Mixins entry {} is a bare function; mix in a constructor or a plain object",
            index
        )));
    }
    Ok(obj)
}

fn member_from_entry(key: &str, entry: Entry) -> Result<Member, Error> {
    match entry {
        Entry::Member(member) => Ok(member),
        Entry::Value(value) => Ok(Member::new(value)),
        _ => Err(Error::definition_error(format!(
            "member '{}' must be a value or a member descriptor",
            key
        ))),
    }
}

/// Default the privilege, check the declared type and lock the member
fn finish_member(realm: &mut Realm, key: &str, mut member: Member) -> Result<Member, Error> {
    if member.calls_super() {
        return Err(Error::definition_error(format!(
            "only a Constructor can be ExplicitSuper, not '{}'",
            key
        )));
    }
    if member.is_abstract() && member.privilege() == Privilege::Private {
        return Err(Error::definition_error(format!(
            "abstract member '{}' cannot be private",
            key
        )));
    }
    if member.is_abstract() && member.is_static() {
        return Err(Error::definition_error(format!(
            "static member '{}' cannot be abstract",
            key
        )));
    }
    if member.is_static() && member.privilege().is_public() && RESERVED_STATICS.contains(&key) {
        return Err(Error::definition_error(format!(
            "public static member '{}' would shadow the type's own '{}'",
            key, key
        )));
    }
    if member.privilege() == Privilege::None {
        member.set_privilege(Privilege::Public)?;
    }
    if let Some(spec) = member.constraint().cloned() {
        let value = member.value();
        if !member.is_property() && !realm.satisfies(&spec, &value) {
            return Err(Error::definition_error(format!(
                "default value of '{}' does not satisfy type {}",
                key,
                spec.name()
            )));
        }
    }
    member.lock();
    Ok(member)
}

fn callable_member(key: &str, entry: Entry) -> Result<Member, Error> {
    let member = member_from_entry(key, entry)?;
    if !member.is_method() {
        return Err(Error::definition_error(format!("{} must be a function", key)));
    }
    Ok(member)
}

fn parse_constructor(key: &str, entry: Entry) -> Result<Member, Error> {
    let mut member = callable_member(key, entry)?;
    if member.is_static() || member.is_abstract() || member.is_property() {
        return Err(Error::definition_error(
            "Constructor cannot be Static, Abstract or a Property",
        ));
    }
    if member.privilege() == Privilege::None {
        member.set_privilege(Privilege::Public)?;
    }
    member.lock();
    Ok(member)
}

fn parse_static_constructor(key: &str, entry: Entry) -> Result<Member, Error> {
    let mut member = callable_member(key, entry)?;
    let forbidden = [
        (member.privilege() == Privilege::Private, "Private"),
        (member.privilege() == Privilege::Protected, "Protected"),
        (member.is_property(), "a Property"),
        (member.is_abstract(), "Abstract"),
        (member.is_final(), "Final"),
        (member.calls_super(), "ExplicitSuper"),
    ];
    if let Some((_, what)) = forbidden.iter().find(|(hit, _)| *hit) {
        return Err(Error::definition_error(format!(
            "StaticConstructor cannot be {}",
            what
        )));
    }
    member.lock();
    Ok(member)
}

// ═══════════════════════════════════════════════════════════════════════════
// Mixins and overrides
// ═══════════════════════════════════════════════════════════════════════════

/// Collect mixin members in order; later mixins replace earlier ones and
/// local members drop any mixin member of the same name
fn flatten_mixins(
    realm: &mut Realm,
    mixins: &[ObjectRef],
    locals: &ScopeTable,
) -> Result<ScopeTable, Error> {
    let mut table: ScopeTable = index_map_new();
    for mixin in mixins {
        for (key, member) in mixin_members(realm, mixin)? {
            if locals.contains_key(&key) {
                continue;
            }
            let member = finish_member(realm, key.as_str(), member)?;
            table.shift_remove(&key);
            table.insert(key, member);
        }
    }
    Ok(table)
}

fn mixin_members(realm: &mut Realm, mixin: &ObjectRef) -> Result<Vec<(Str, Member)>, Error> {
    let constructor = match &mixin.borrow().kind {
        ObjectKind::Function(Function::Constructor(c)) => Some(c.clone()),
        _ => None,
    };

    match constructor {
        // Non-private instance members, re-declared in the new class
        Some(Constructor::Class(class)) => Ok(class
            .effective_members()
            .into_iter()
            .map(|(key, member)| (key, member.unlocked_copy()))
            .collect()),
        // Own methods of the native prototype
        Some(Constructor::Native(_)) => {
            let Value::Object(proto) = realm.get(mixin, "prototype")? else {
                return Ok(Vec::new());
            };
            let proto = proto.borrow();
            Ok(proto
                .properties
                .iter()
                .filter(|(key, p)| {
                    key.as_str() != "constructor" && !p.is_accessor() && p.value.is_callable()
                })
                .map(|(key, p)| (key.cheap_clone(), Member::new(p.value.clone())))
                .collect())
        }
        None => {
            let props: Vec<(Str, Property)> = mixin
                .borrow()
                .properties
                .iter()
                .map(|(k, p)| (k.cheap_clone(), p.clone()))
                .collect();
            let mut members = Vec::with_capacity(props.len());
            for (key, prop) in props {
                let member = if prop.is_accessor() {
                    Member::modify(Value::Undefined, Modifiers {
                        accessor: Some(Accessor::new(prop.getter, prop.setter)),
                        ..Modifiers::default()
                    })?
                } else {
                    Member::new(prop.value)
                };
                members.push((key, member));
            }
            Ok(members)
        }
    }
}

/// Reject overriding a Final member and narrowing an inherited member's visibility
fn check_overrides(
    name: &Str,
    parent: Option<&Rc<ClassData>>,
    layer: &ScopeTable,
) -> Result<(), Error> {
    let Some(parent) = parent else {
        return Ok(());
    };
    let instance = parent.effective_members();
    let statics = parent.effective_statics();

    for (key, member) in layer {
        let inherited = if member.is_static() {
            statics.get(key)
        } else {
            instance.get(key)
        };
        let Some(base) = inherited else {
            continue;
        };
        if base.is_final() {
            return Err(Error::definition_error(format!(
                "{} cannot override final member '{}' of {}",
                name,
                key,
                parent.name()
            )));
        }
        if member.privilege().rank() < base.privilege().rank() {
            return Err(Error::definition_error(format!(
                "{} cannot narrow '{}' from {} to {}",
                name,
                key,
                base.privilege().effective(),
                member.privilege().effective()
            )));
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Host layout
// ═══════════════════════════════════════════════════════════════════════════

fn build_layout(
    realm: &mut Realm,
    id: ClassId,
    scopes: &ScopeContainer,
    mixin_scopes: &ScopeContainer,
    extends: Option<&Ancestor>,
) -> Result<ClassLayout, Error> {
    // Storage shared by every private domain; locals override mixins
    let defaults = ObjectRef::new(Object::new());
    expand_scope(realm, &defaults, &mixin_scopes.private, &LinkTarget::Unresolved)?;
    expand_scope(realm, &defaults, &scopes.private, &LinkTarget::Unresolved)?;
    lock_storage(&defaults);

    let (parent_protected, parent_prototype, parent_protected_static) = match extends {
        Some(Ancestor::Class(parent)) => (
            Some(parent.layout.protected.cheap_clone()),
            parent.layout.prototype.cheap_clone(),
            Some(parent.layout.protected_static.cheap_clone()),
        ),
        Some(Ancestor::Native(_)) => (
            None,
            scopes
                .super_prototype
                .clone()
                .unwrap_or_else(|| realm.object_prototype.cheap_clone()),
            None,
        ),
        None => (None, realm.object_prototype.cheap_clone(), None),
    };

    let target = LinkTarget::Receiver(id);
    let protected = link_layers(
        realm,
        parent_protected,
        &mixin_scopes.protected,
        &scopes.protected,
        &target,
    )?;
    let prototype = link_layers(
        realm,
        Some(parent_prototype),
        &mixin_scopes.public,
        &scopes.public,
        &target,
    )?;

    let static_domain = ObjectRef::new(Object::new());
    expand_scope(realm, &static_domain, &scopes.static_, &LinkTarget::Unresolved)?;
    let protected_static = ObjectRef::new(Object::with_prototype(parent_protected_static));
    expand_scope(
        realm,
        &protected_static,
        &scopes.protected_static,
        &LinkTarget::Fixed(static_domain.cheap_clone()),
    )?;
    realm.freeze(&protected_static);

    Ok(ClassLayout {
        defaults,
        protected,
        prototype,
        static_domain,
        protected_static,
    })
}

/// Stack the mixin layer (if any) and the local layer on top of `parent`
fn link_layers(
    realm: &mut Realm,
    parent: Option<ObjectRef>,
    mixin: &ScopeTable,
    local: &ScopeTable,
    target: &LinkTarget,
) -> Result<ObjectRef, Error> {
    let mut below = parent;
    if !mixin.is_empty() {
        let layer = ObjectRef::new(Object::with_prototype(below));
        expand_scope(realm, &layer, mixin, target)?;
        realm.freeze(&layer);
        below = Some(layer);
    }
    let head = ObjectRef::new(Object::with_prototype(below));
    expand_scope(realm, &head, local, target)?;
    realm.freeze(&head);
    Ok(head)
}

/// No direct writes or additions; domains still shadow its slots
fn lock_storage(obj: &ObjectRef) {
    let mut o = obj.borrow_mut();
    o.frozen = true;
    o.sealed = true;
    o.extensible = false;
}
