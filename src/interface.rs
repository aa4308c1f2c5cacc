//! Structural interfaces: named sets of property and method signatures

use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::member::{Member, Payload};
use crate::scope::ScopeTable;
use crate::value::{
    CheapClone, Constructor, Function, FxIndexMap, ObjectKind, ObjectRef, Str, Value,
    index_map_new,
};

/// A required property; `settable` additionally requires a setter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySig {
    pub settable: bool,
}

/// A required method of the given arity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSig {
    pub arity: usize,
}

/// Declaration of an interface, before parents are merged
#[derive(Debug, Clone, Default)]
pub struct InterfaceDef {
    extends: Vec<Rc<Interface>>,
    properties: Vec<(Str, PropertySig)>,
    methods: Vec<(Str, MethodSig)>,
}

impl InterfaceDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extends(mut self, parent: &Rc<Interface>) -> Self {
        self.extends.push(parent.cheap_clone());
        self
    }

    pub fn property(mut self, name: &str, settable: bool) -> Self {
        self.properties.push((Str::from(name), PropertySig { settable }));
        self
    }

    pub fn method(mut self, name: &str, arity: usize) -> Self {
        self.methods.push((Str::from(name), MethodSig { arity }));
        self
    }
}

/// A structural contract
pub struct Interface {
    name: Str,
    properties: FxIndexMap<Str, PropertySig>,
    methods: FxIndexMap<Str, MethodSig>,
}

impl Interface {
    /// Build an interface, merging its parents. Two parents (or a parent and
    /// a local declaration) disagreeing on a name is a definition error.
    pub fn new(name: &str, def: InterfaceDef) -> Result<Rc<Interface>, Error> {
        let mut iface = Interface {
            name: Str::from(name),
            properties: index_map_new(),
            methods: index_map_new(),
        };
        for parent in &def.extends {
            for (key, sig) in &parent.properties {
                iface.add_property(key, *sig, parent.name())?;
            }
            for (key, sig) in &parent.methods {
                iface.add_method(key, *sig, parent.name())?;
            }
        }
        for (key, sig) in &def.properties {
            iface.add_property(key, *sig, name)?;
        }
        for (key, sig) in &def.methods {
            iface.add_method(key, *sig, name)?;
        }
        Ok(Rc::new(iface))
    }

    fn add_property(&mut self, key: &Str, sig: PropertySig, source: &str) -> Result<(), Error> {
        if self.methods.contains_key(key) {
            return Err(self.conflict(key, source));
        }
        match self.properties.get(key) {
            Some(existing) if *existing != sig => Err(self.conflict(key, source)),
            _ => {
                self.properties.insert(key.cheap_clone(), sig);
                Ok(())
            }
        }
    }

    fn add_method(&mut self, key: &Str, sig: MethodSig, source: &str) -> Result<(), Error> {
        if self.properties.contains_key(key) {
            return Err(self.conflict(key, source));
        }
        match self.methods.get(key) {
            Some(existing) if *existing != sig => Err(self.conflict(key, source)),
            _ => {
                self.methods.insert(key.cheap_clone(), sig);
                Ok(())
            }
        }
    }

    fn conflict(&self, key: &Str, source: &str) -> Error {
        Error::definition_error(format!(
            "interface {}: conflicting signatures for '{}' (from {})",
            self.name, key, source
        ))
    }

    /// Public surface of a class: data and accessor members become
    /// properties, functions (abstract ones included) become methods
    pub(crate) fn derive(name: Str, members: &ScopeTable) -> Interface {
        let mut properties = index_map_new();
        let mut methods = index_map_new();
        for (key, member) in members {
            if !member.privilege().is_public() || member.is_static() {
                continue;
            }
            match member_arity(member) {
                Some(arity) => {
                    methods.insert(key.cheap_clone(), MethodSig { arity });
                }
                None => {
                    let settable = match member.accessor() {
                        Some(accessor) => accessor.set.is_some(),
                        None => !member.is_final(),
                    };
                    properties.insert(key.cheap_clone(), PropertySig { settable });
                }
            }
        }
        Interface {
            name,
            properties,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&Str, &PropertySig)> {
        self.properties.iter()
    }

    pub fn methods(&self) -> impl Iterator<Item = (&Str, &MethodSig)> {
        self.methods.iter()
    }

    pub fn property(&self, name: &str) -> Option<PropertySig> {
        self.properties.get(name).copied()
    }

    pub fn method(&self, name: &str) -> Option<MethodSig> {
        self.methods.get(name).copied()
    }

    /// Check a class's visible members against this interface; the error
    /// names the first requirement not met
    pub(crate) fn check_members(&self, members: &ScopeTable) -> Result<(), String> {
        for (key, sig) in &self.properties {
            let Some(member) = members.get(key).filter(|m| m.privilege().is_public()) else {
                return Err(format!("missing public property '{}'", key));
            };
            if member_arity(member).is_some() {
                return Err(format!("'{}' is a method, expected a property", key));
            }
            let (readable, writable) = match member.accessor() {
                Some(accessor) => (accessor.get.is_some(), accessor.set.is_some()),
                None => (true, !member.is_final()),
            };
            if !readable || (sig.settable && !writable) {
                return Err(format!("property '{}' lacks a matching accessor pair", key));
            }
        }
        for (key, sig) in &self.methods {
            let Some(member) = members.get(key).filter(|m| m.privilege().is_public()) else {
                return Err(format!("missing public method '{}'", key));
            };
            match member_arity(member) {
                Some(arity) if arity == sig.arity => {}
                Some(arity) => {
                    return Err(format!(
                        "method '{}' takes {} argument(s), expected {}",
                        key, arity, sig.arity
                    ));
                }
                None => return Err(format!("'{}' is not a method", key)),
            }
        }
        Ok(())
    }

    /// Structural conformance of any value. Instances and generated types are
    /// checked against their class's public members; other objects against
    /// their own and inherited properties.
    pub fn is_implemented_by(&self, value: &Value) -> bool {
        let Value::Object(obj) = value else {
            return false;
        };
        let class = {
            let o = obj.borrow();
            match (&o.slots, &o.kind) {
                (Some(slots), _) => Some(slots.class().cheap_clone()),
                (None, ObjectKind::Function(Function::Constructor(Constructor::Class(class)))) => {
                    Some(class.cheap_clone())
                }
                _ => None,
            }
        };
        match class {
            Some(class) => self.check_members(&class.effective_members()).is_ok(),
            None => self.check_plain(obj),
        }
    }

    fn check_plain(&self, obj: &ObjectRef) -> bool {
        let o = obj.borrow();
        let properties_ok = self.properties.iter().all(|(key, sig)| {
            match o.get_property_descriptor(key.as_str()) {
                Some((prop, _)) if prop.is_accessor() => {
                    prop.getter.is_some() && (!sig.settable || prop.setter.is_some())
                }
                Some((prop, _)) => {
                    !prop.value.is_callable() && (!sig.settable || prop.writable)
                }
                None => false,
            }
        });
        properties_ok
            && self.methods.iter().all(|(key, sig)| {
                match o.get_property_descriptor(key.as_str()) {
                    Some((prop, _)) if !prop.is_accessor() => {
                        value_arity(&prop.value) == Some(sig.arity)
                    }
                    _ => false,
                }
            })
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("name", &self.name)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Arity of a function-valued member; `None` for data and accessors
fn member_arity(member: &Member) -> Option<usize> {
    match member.payload() {
        Payload::Value(value) => value_arity(value),
        _ => None,
    }
}

fn value_arity(value: &Value) -> Option<usize> {
    match value {
        Value::Object(obj) => obj.borrow().as_function().map(Function::arity),
        _ => None,
    }
}
