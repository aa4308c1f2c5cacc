//! Generated classes: per-class data, per-instance capability slots and the
//! private/static domains instances and types hide behind.

pub mod compose;
pub mod construct;
pub mod definition;
pub mod domain;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::enumeration::{Mode, Privilege};
use crate::interface::Interface;
use crate::member::Member;
use crate::realm::ClassId;
use crate::scope::{ScopeContainer, ScopeTable};
use crate::value::{
    CheapClone, Function, NativeInit, NativeKind, ObjectRef, Str, WeakObjectRef, index_map_new,
};

pub use definition::{Definition, Entry, IntoEntry};

/// Immediate ancestor of a class
#[derive(Debug, Clone)]
pub enum Ancestor {
    Class(Rc<ClassData>),
    Native(NativeBase),
}

/// A native constructor at the root of a class chain
#[derive(Debug, Clone)]
pub struct NativeBase {
    pub name: Str,
    pub kind: NativeKind,
    pub init: NativeInit,
    pub prototype: ObjectRef,
    pub arity: usize,
}

/// Host objects a class is expanded onto
#[derive(Debug)]
pub(crate) struct ClassLayout {
    /// Shared, frozen storage prototype of every private domain of the class
    pub(crate) defaults: ObjectRef,
    /// Head of the protected link chain
    pub(crate) protected: ObjectRef,
    /// Public link chain head; the type's `prototype`
    pub(crate) prototype: ObjectRef,
    pub(crate) static_domain: ObjectRef,
    /// Head of the protected static link chain
    pub(crate) protected_static: ObjectRef,
}

/// Everything known about one generated class
pub struct ClassData {
    pub(crate) id: ClassId,
    pub(crate) name: Str,
    pub(crate) mode: Mode,
    pub(crate) extends: Option<Ancestor>,
    /// Local members
    pub(crate) scopes: ScopeContainer,
    /// Members contributed by mixins, already flattened
    pub(crate) mixin_scopes: ScopeContainer,
    pub(crate) constructor: Option<Member>,
    pub(crate) static_constructor: Option<Member>,
    pub(crate) interface: Rc<Interface>,
    pub(crate) events: Vec<Str>,
    pub(crate) layout: ClassLayout,
    pub(crate) type_object: RefCell<WeakObjectRef>,
}

impl ClassData {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn parent(&self) -> Option<&Rc<ClassData>> {
        match &self.extends {
            Some(Ancestor::Class(parent)) => Some(parent),
            _ => None,
        }
    }

    /// Native constructor at the root of the chain, if any
    pub fn native_base(&self) -> Option<&NativeBase> {
        match &self.extends {
            Some(Ancestor::Class(parent)) => parent.native_base(),
            Some(Ancestor::Native(base)) => Some(base),
            None => None,
        }
    }

    /// Declared parameter count of the user constructor
    pub fn constructor_arity(&self) -> usize {
        self.constructor
            .as_ref()
            .and_then(|ctor| match ctor.value() {
                crate::value::Value::Object(f) => f.borrow().as_function().map(Function::arity),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Whether `self` is `other` or one of its descendants
    pub fn is_same_or_descendant_of(&self, other: ClassId) -> bool {
        if self.id == other {
            return true;
        }
        self.parent()
            .is_some_and(|parent| parent.is_same_or_descendant_of(other))
    }

    /// The generated type, while it is alive
    pub fn type_object(&self) -> Option<ObjectRef> {
        self.type_object.borrow().upgrade()
    }

    /// Whether `key` names a Private member of this class's own layer
    pub(crate) fn is_private_member(&self, key: &str, is_static: bool) -> bool {
        self.scopes
            .member(key, is_static)
            .is_some_and(|m| m.privilege().effective() == Privilege::Private)
    }

    /// The authoritative member for `key` in this class's own layers
    pub(crate) fn own_member(&self, key: &str, is_static: bool) -> Option<&Member> {
        self.scopes
            .member(key, is_static)
            .or_else(|| self.mixin_scopes.member(key, is_static))
    }

    /// Visible (non-private) instance members, most-derived wins
    pub fn effective_members(&self) -> ScopeTable {
        effective_members(self.parent(), &self.mixin_scopes.private, &self.scopes.private)
    }

    /// Same, for statics
    pub(crate) fn effective_statics(&self) -> ScopeTable {
        let mut table = match self.parent() {
            Some(parent) => parent.effective_statics(),
            None => index_map_new(),
        };
        overlay(&mut table, &self.scopes.static_);
        table
    }

    /// Event names declared here or inherited
    pub fn events(&self) -> Vec<Str> {
        let mut events = self
            .parent()
            .map(|parent| parent.events())
            .unwrap_or_default();
        for event in &self.events {
            if !events.contains(event) {
                events.push(event.cheap_clone());
            }
        }
        events
    }
}

/// Layer `mixins` then `locals` over the parent's visible members
pub(crate) fn effective_members(
    parent: Option<&Rc<ClassData>>,
    mixins: &ScopeTable,
    locals: &ScopeTable,
) -> ScopeTable {
    let mut table = match parent {
        Some(parent) => parent.effective_members(),
        None => index_map_new(),
    };
    overlay(&mut table, mixins);
    overlay(&mut table, locals);
    table
}

fn overlay(table: &mut ScopeTable, layer: &ScopeTable) {
    for (name, member) in layer {
        if member.privilege().effective() != Privilege::Private {
            table.insert(name.cheap_clone(), member.clone());
        }
    }
}

impl fmt::Debug for ClassData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassData")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("parent", &self.parent().map(|p| p.name.cheap_clone()))
            .finish()
    }
}

/// Read-only metadata view of a generated type
#[derive(Debug, Clone)]
pub struct ClassInfo(Rc<ClassData>);

impl ClassInfo {
    pub(crate) fn new(class: Rc<ClassData>) -> Self {
        Self(class)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn mode(&self) -> Mode {
        self.0.mode
    }

    /// Public surface of instances
    pub fn interface(&self) -> Rc<Interface> {
        self.0.interface.cheap_clone()
    }

    pub fn events(&self) -> Vec<Str> {
        self.0.events()
    }

    pub fn parent(&self) -> Option<ClassInfo> {
        self.0.parent().map(|p| ClassInfo(p.cheap_clone()))
    }

    pub fn constructor(&self) -> Option<&Member> {
        self.0.constructor.as_ref()
    }

    pub fn static_constructor(&self) -> Option<&Member> {
        self.0.static_constructor.as_ref()
    }

    /// The local member `name` (instance or static), as declared
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.0
            .own_member(name, false)
            .or_else(|| self.0.own_member(name, true))
    }

    /// Whether `ty` is a generated ancestor of this class (or the class itself)
    pub fn is_subclass_of(&self, ty: &ObjectRef) -> bool {
        let other = match &ty.borrow().kind {
            crate::value::ObjectKind::Function(Function::Constructor(
                crate::value::Constructor::Class(class),
            )) => class.id,
            _ => return false,
        };
        self.0.is_same_or_descendant_of(other)
    }

    pub fn extends_native(&self) -> Option<&str> {
        self.0.native_base().map(|base| base.name.as_str())
    }
}

/// Which storage a domain is
#[derive(Debug, Clone)]
pub enum DomainRole {
    /// Per-instance private domain
    Instance {
        instance: WeakObjectRef,
        /// Protected chain head of the instance's most-derived class
        head: ObjectRef,
    },
    /// The class-wide static domain
    Static,
}

/// Payload of a domain object
#[derive(Debug, Clone)]
pub struct DomainData {
    class: Weak<ClassData>,
    role: DomainRole,
}

impl DomainData {
    pub(crate) fn instance(class: &Rc<ClassData>, instance: WeakObjectRef, head: ObjectRef) -> Self {
        Self {
            class: Rc::downgrade(class),
            role: DomainRole::Instance { instance, head },
        }
    }

    pub(crate) fn statics(class: &Rc<ClassData>) -> Self {
        Self {
            class: Rc::downgrade(class),
            role: DomainRole::Static,
        }
    }

    /// The class whose view this domain is
    pub fn class(&self) -> Option<Rc<ClassData>> {
        self.class.upgrade()
    }

    pub fn role(&self) -> &DomainRole {
        &self.role
    }

    pub fn is_static(&self) -> bool {
        matches!(self.role, DomainRole::Static)
    }
}

/// Capability carried by a public instance: its class and one private
/// domain per class level, attached as construction reaches each level
#[derive(Debug)]
pub struct InstanceSlots {
    class: Rc<ClassData>,
    domains: RefCell<Vec<(ClassId, ObjectRef)>>,
}

impl InstanceSlots {
    pub(crate) fn new(class: Rc<ClassData>) -> Self {
        Self {
            class,
            domains: RefCell::new(Vec::new()),
        }
    }

    /// Most-derived class of the instance
    pub fn class(&self) -> &Rc<ClassData> {
        &self.class
    }

    pub(crate) fn attach(&self, class: ClassId, domain: ObjectRef) {
        self.domains.borrow_mut().push((class, domain));
    }

    pub(crate) fn domain_for(&self, class: ClassId) -> Option<ObjectRef> {
        self.domains
            .borrow()
            .iter()
            .find(|(id, _)| *id == class)
            .map(|(_, domain)| domain.cheap_clone())
    }
}
