//! Scope tables: a class's members split by visibility and storage, and the
//! expansion of those tables onto host objects.

use log::trace;

use crate::enumeration::Privilege;
use crate::error::Error;
use crate::link::{self, LinkTarget};
use crate::member::{Member, Payload};
use crate::realm::Realm;
use crate::value::{CheapClone, FxIndexMap, ObjectRef, Property, Str, index_map_new};

/// Members of one scope, by name, in definition order
pub type ScopeTable = FxIndexMap<Str, Member>;

/// The six tables of one class layer (locals or flattened mixins).
///
/// `private` and `static_` hold the authoritative members. The other tables
/// hold locked redirects to them.
#[derive(Debug, Clone)]
pub struct ScopeContainer {
    /// Every instance member: the storage layout of private domains
    pub private: ScopeTable,
    pub protected: ScopeTable,
    pub public: ScopeTable,
    /// Every static member: the storage layout of the static domain
    pub static_: ScopeTable,
    pub protected_static: ScopeTable,
    pub public_static: ScopeTable,
    /// Native prototype this layer bridges to, if the class extends one
    pub super_prototype: Option<ObjectRef>,
}

impl Default for ScopeContainer {
    fn default() -> Self {
        Self {
            private: index_map_new(),
            protected: index_map_new(),
            public: index_map_new(),
            static_: index_map_new(),
            protected_static: index_map_new(),
            public_static: index_map_new(),
            super_prototype: None,
        }
    }
}

impl ScopeContainer {
    pub fn is_empty(&self) -> bool {
        self.private.is_empty() && self.static_.is_empty()
    }

    /// The authoritative member behind `name`
    pub fn member(&self, name: &str, is_static: bool) -> Option<&Member> {
        if is_static {
            self.static_.get(name)
        } else {
            self.private.get(name)
        }
    }
}

/// Sort `members` into `scopes`. Protected members are reachable from the
/// protected tables; public ones from both the protected and public tables.
pub fn populate_scopes(scopes: &mut ScopeContainer, members: &ScopeTable) {
    for (name, member) in members {
        let privilege = member.privilege().effective();
        let (storage, protected, public) = if member.is_static() {
            (
                &mut scopes.static_,
                &mut scopes.protected_static,
                &mut scopes.public_static,
            )
        } else {
            (&mut scopes.private, &mut scopes.protected, &mut scopes.public)
        };

        storage.insert(name.cheap_clone(), member.clone());
        if member.is_abstract() {
            // Declared only; there is no slot to redirect to
            continue;
        }
        if privilege.is_inheritable() {
            protected.insert(name.cheap_clone(), Member::link(name, member));
        }
        if privilege == Privilege::Public {
            public.insert(name.cheap_clone(), Member::link(name, member));
        }
    }
}

/// Define one host property per member of `scope` on `dest`.
///
/// Value members become data slots (read-only when Final); property members
/// become their accessor pair; links become redirect accessors resolving
/// through `target`. Abstract members get nothing.
pub fn expand_scope(
    realm: &mut Realm,
    dest: &ObjectRef,
    scope: &ScopeTable,
    target: &LinkTarget,
) -> Result<(), Error> {
    for (name, member) in scope {
        if member.is_abstract() {
            continue;
        }
        let prop = match member.payload() {
            Payload::Value(value) => {
                Property::with_attributes(value.clone(), !member.is_final(), true, false)
                    .constrained(member.constraint().cloned())
            }
            Payload::Accessor(accessor) => {
                Property::accessor(accessor.get.clone(), accessor.set.clone())
            }
            Payload::Link(spec) => link::make_redirect(realm, spec, target),
        };
        trace!("expand {} onto {:?}", name, dest);
        dest.borrow_mut().define_property(name.cheap_clone(), prop);
    }
    Ok(())
}
