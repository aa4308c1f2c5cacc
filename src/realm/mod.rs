//! The realm: intrinsics plus the property and call semantics every class,
//! domain and instance runs on.

pub mod builtins;
pub mod json;

use std::rc::Rc;

use log::debug;

use crate::class::construct::{self, ConstructionFrame};
use crate::class::domain;
use crate::class::{ClassData, ClassInfo, Definition};
use crate::config::{LinkPolicy, RealmConfig};
use crate::error::Error;
use crate::functor;
use crate::interface::Interface;
use crate::string_dict::StringDict;
use crate::value::{
    CheapClone, Constructor, Function, NativeFunction, Object, ObjectKind, ObjectRef, Property,
    Str, TypeSpec, Value, array_index, array_length,
};

/// Native function pointer used by builtin registration
pub type BuiltinFn = fn(&mut Realm, Value, &[Value]) -> Result<Value, Error>;

/// Identifier handed to each generated class, unique within a realm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) u64);

/// An isolated set of intrinsics and generated classes
pub struct Realm {
    config: RealmConfig,
    string_dict: StringDict,
    pub(crate) object_prototype: ObjectRef,
    pub(crate) function_prototype: ObjectRef,
    pub(crate) array_prototype: ObjectRef,
    object_constructor: ObjectRef,
    array_constructor: ObjectRef,
    next_class_id: u64,
    /// Classes whose code is executing, innermost last
    pub(crate) context: Vec<Rc<ClassData>>,
    /// Constructions in flight, innermost last
    pub(crate) constructions: Vec<ConstructionFrame>,
}

impl Realm {
    /// Create a realm with the default configuration
    pub fn new() -> Self {
        Self::with_config(RealmConfig::default())
    }

    pub fn with_config(config: RealmConfig) -> Self {
        let object_prototype = ObjectRef::new(Object::new());
        let function_prototype =
            ObjectRef::new(Object::with_prototype(Some(object_prototype.cheap_clone())));
        let array_prototype = ObjectRef::new(Object::with_kind(
            Some(object_prototype.cheap_clone()),
            ObjectKind::Array(Vec::new()),
        ));

        let mut realm = Self {
            config,
            string_dict: StringDict::with_common_strings(),
            object_constructor: ObjectRef::new(Object::new()),
            array_constructor: ObjectRef::new(Object::new()),
            object_prototype,
            function_prototype,
            array_prototype,
            next_class_id: 0,
            context: Vec::new(),
            constructions: Vec::new(),
        };

        realm.object_constructor = builtins::init_object(&mut realm);
        realm.array_constructor = builtins::init_array(&mut realm);
        debug!("realm initialized ({:?})", realm.config);
        realm
    }

    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    /// Intern a string
    pub fn intern(&mut self, s: &str) -> Str {
        self.string_dict.get_or_insert(s)
    }

    pub fn object_constructor(&self) -> ObjectRef {
        self.object_constructor.cheap_clone()
    }

    pub fn array_constructor(&self) -> ObjectRef {
        self.array_constructor.cheap_clone()
    }

    pub(crate) fn next_class_id(&mut self) -> ClassId {
        self.next_class_id += 1;
        ClassId(self.next_class_id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Object creation
    // ═══════════════════════════════════════════════════════════════════════

    /// Create an empty plain object inheriting from `Object.prototype`
    pub fn object(&mut self) -> ObjectRef {
        ObjectRef::new(Object::with_prototype(Some(self.object_prototype.cheap_clone())))
    }

    /// Create an array from elements
    pub fn array(&mut self, elements: Vec<Value>) -> ObjectRef {
        ObjectRef::new(Object::with_kind(
            Some(self.array_prototype.cheap_clone()),
            ObjectKind::Array(elements),
        ))
    }

    /// Create a native function object from a closure
    pub fn function<F>(&mut self, name: &str, arity: usize, func: F) -> ObjectRef
    where
        F: Fn(&mut Realm, Value, &[Value]) -> Result<Value, Error> + 'static,
    {
        let name = self.intern(name);
        ObjectRef::new(Object::with_kind(
            Some(self.function_prototype.cheap_clone()),
            ObjectKind::Function(Function::Native(NativeFunction {
                name,
                func: Rc::new(func),
                arity,
            })),
        ))
    }

    /// Wrap an interface so it can travel as a value (e.g. in an `Implements` array)
    pub fn interface_value(&mut self, interface: Rc<Interface>) -> ObjectRef {
        ObjectRef::new(Object::with_kind(
            Some(self.object_prototype.cheap_clone()),
            ObjectKind::Interface(interface),
        ))
    }

    /// Register a native method on an object
    pub(crate) fn register_method(
        &mut self,
        obj: &ObjectRef,
        name: &str,
        func: BuiltinFn,
        arity: usize,
    ) {
        let f = self.function(name, arity, func);
        let key = self.intern(name);
        obj.borrow_mut()
            .define_property(key, Property::with_attributes(Value::Object(f), true, false, true));
    }

    /// Prevent any change to the object's own properties
    pub fn freeze(&mut self, obj: &ObjectRef) {
        let mut o = obj.borrow_mut();
        o.frozen = true;
        o.sealed = true;
        o.extensible = false;
        for prop in o.properties.values_mut() {
            prop.configurable = false;
            if !prop.is_accessor() {
                prop.writable = false;
            }
        }
    }

    /// Prevent adding or removing properties; existing ones stay writable
    pub fn seal(&mut self, obj: &ObjectRef) {
        let mut o = obj.borrow_mut();
        o.sealed = true;
        o.extensible = false;
        for prop in o.properties.values_mut() {
            prop.configurable = false;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Property access
    // ═══════════════════════════════════════════════════════════════════════

    /// Read a property. Domains resolve through their scope view.
    pub fn get(&mut self, target: &ObjectRef, key: &str) -> Result<Value, Error> {
        if target.borrow().as_domain().is_some() {
            return domain::domain_get(self, target, key);
        }
        self.ordinary_get(target, key, &Value::Object(target.cheap_clone()))
    }

    /// Write a property. Domains resolve through their scope view.
    pub fn set(&mut self, target: &ObjectRef, key: &str, value: Value) -> Result<(), Error> {
        if target.borrow().as_domain().is_some() {
            return domain::domain_set(self, target, key, value);
        }
        self.ordinary_set(target, key, value, target)
    }

    /// Prototype-chain read starting at `holder`; getters run against `receiver`
    pub(crate) fn ordinary_get(
        &mut self,
        holder: &ObjectRef,
        key: &str,
        receiver: &Value,
    ) -> Result<Value, Error> {
        if let Some(value) = array_get(holder, key) {
            return Ok(value);
        }
        let found = holder.borrow().get_property_descriptor(key);
        match found {
            Some((prop, _)) => self.read_property(prop, receiver),
            None => Ok(Value::Undefined),
        }
    }

    /// Produce the value of a resolved descriptor
    pub(crate) fn read_property(&mut self, prop: Property, receiver: &Value) -> Result<Value, Error> {
        if prop.is_accessor() {
            return match prop.getter {
                Some(getter) => self.call(&getter, receiver.clone(), &[]),
                None => Ok(Value::Undefined),
            };
        }
        Ok(prop.value)
    }

    /// Prototype-chain write. A writable inherited data property is shadowed
    /// by a new own property on `receiver`; setters run against `receiver`.
    pub(crate) fn ordinary_set(
        &mut self,
        holder: &ObjectRef,
        key: &str,
        value: Value,
        receiver: &ObjectRef,
    ) -> Result<(), Error> {
        if let Some(result) = array_set(receiver, key, &value) {
            return result;
        }

        let found = holder.borrow().get_property_descriptor(key);
        let Some((prop, inherited)) = found else {
            return self.add_property(receiver, key, Property::data(value));
        };

        if prop.is_accessor() {
            return match prop.setter {
                Some(setter) => {
                    self.call(&setter, Value::Object(receiver.cheap_clone()), &[value])?;
                    Ok(())
                }
                None => Err(Error::type_error(format!(
                    "Cannot set property {} which has only a getter",
                    key
                ))),
            };
        }

        if !prop.writable {
            return Err(Error::type_error(format!(
                "Cannot assign to read only property '{}'",
                key
            )));
        }
        if let Some(spec) = &prop.constraint {
            self.check_constraint(key, spec, &value)?;
        }

        let own = !inherited && ObjectRef::ptr_eq(holder, receiver);
        if own {
            let mut obj = receiver.borrow_mut();
            if obj.frozen {
                return Err(Error::type_error(format!(
                    "Cannot assign to read only property '{}'",
                    key
                )));
            }
            if let Some(slot) = obj.properties.get_mut(key) {
                slot.value = value;
            }
            return Ok(());
        }

        let shadow = Property {
            value,
            getter: None,
            setter: None,
            ..prop
        };
        self.add_property(receiver, key, shadow)
    }

    fn add_property(&mut self, target: &ObjectRef, key: &str, prop: Property) -> Result<(), Error> {
        let key = self.intern(key);
        let mut obj = target.borrow_mut();
        if !obj.accepts_new_properties() {
            return Err(Error::type_error(format!(
                "Cannot add property {}, object is not extensible",
                key
            )));
        }
        obj.define_property(key, prop);
        Ok(())
    }

    /// Whether `value` satisfies a member's declared type.
    /// `undefined` and `null` mean "unset" and always pass.
    pub fn satisfies(&mut self, spec: &TypeSpec, value: &Value) -> bool {
        if value.is_null_or_undefined() {
            return true;
        }
        match spec {
            TypeSpec::Boolean => matches!(value, Value::Boolean(_)),
            TypeSpec::Number => matches!(value, Value::Number(_)),
            TypeSpec::String => matches!(value, Value::String(_)),
            TypeSpec::Object => matches!(value, Value::Object(_)),
            TypeSpec::Function => value.is_callable(),
            TypeSpec::Array => self.is_array(value),
            TypeSpec::Instance(ctor) => self.instance_of(value, ctor).unwrap_or(false),
        }
    }

    pub(crate) fn check_constraint(
        &mut self,
        key: &str,
        spec: &TypeSpec,
        value: &Value,
    ) -> Result<(), Error> {
        if self.satisfies(spec, value) {
            Ok(())
        } else {
            Err(Error::type_error(format!(
                "'{}' expects a value of type {}, got {}",
                key,
                spec.name(),
                value.type_of()
            )))
        }
    }

    /// Resolve what reading an unresolved link yields under the realm's policy
    pub(crate) fn unresolved_read(&self, key: &Str) -> Result<Value, Error> {
        match self.config.link_policy {
            LinkPolicy::Strict => Err(Error::unresolved_link(key)),
            LinkPolicy::Lenient => Ok(Value::Undefined),
        }
    }

    pub(crate) fn unresolved_write(&self, key: &Str) -> Result<(), Error> {
        match self.config.link_policy {
            LinkPolicy::Strict => Err(Error::unresolved_link(key)),
            LinkPolicy::Lenient => Ok(()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Calls
    // ═══════════════════════════════════════════════════════════════════════

    /// Call a function with an explicit receiver
    pub fn call(&mut self, func: &ObjectRef, this: Value, args: &[Value]) -> Result<Value, Error> {
        let function = match &func.borrow().kind {
            ObjectKind::Function(f) => f.clone(),
            _ => {
                return Err(Error::type_error(format!(
                    "{} is not a function",
                    Value::Object(func.cheap_clone()).to_display()
                )));
            }
        };

        match function {
            Function::Native(native) => {
                let entered = self.enter_context(&this);
                let result = (native.func)(self, this, args);
                if entered {
                    self.context.pop();
                }
                result
            }
            Function::Functor(data) => {
                let receiver = if data.receiver.is_null_or_undefined() {
                    this
                } else {
                    data.receiver
                };
                let receiver = functor::resolve_receiver(self, receiver, data.scope)?;
                self.call(&data.target, receiver, args)
            }
            Function::Constructor(Constructor::Class(class)) => Err(Error::type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                class.name()
            ))),
            Function::Constructor(Constructor::Native(_)) => self.construct(func, args),
        }
    }

    /// Read `name` from `target` and call it with `target` as receiver
    pub fn call_method(
        &mut self,
        target: &ObjectRef,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        let method = self.get(target, name)?;
        match method {
            Value::Object(f) if f.borrow().is_callable() => {
                self.call(&f, Value::Object(target.cheap_clone()), args)
            }
            _ => Err(Error::type_error(format!("{} is not a function", name))),
        }
    }

    /// `new ctor(...args)`
    pub fn construct(&mut self, ctor: &ObjectRef, args: &[Value]) -> Result<Value, Error> {
        let constructor = match &ctor.borrow().kind {
            ObjectKind::Function(Function::Constructor(c)) => c.clone(),
            _ => {
                return Err(Error::type_error(format!(
                    "{} is not a constructor",
                    Value::Object(ctor.cheap_clone()).to_display()
                )));
            }
        };

        match constructor {
            Constructor::Class(class) => construct::construct_new(self, &class, args),
            Constructor::Native(native) => {
                let prototype = self.get(ctor, "prototype")?.as_object().cloned();
                let obj = ObjectRef::new(Object::with_kind(prototype, native.kind.fresh_kind()));
                (native.init)(self, &obj, args)?;
                Ok(Value::Object(obj))
            }
        }
    }

    /// Code running with a domain as `this` runs in that domain's class
    fn enter_context(&mut self, this: &Value) -> bool {
        let class = match this {
            Value::Object(obj) => obj.borrow().as_domain().and_then(|d| d.class()),
            _ => None,
        };
        match class {
            Some(class) => {
                self.context.push(class);
                true
            }
            None => false,
        }
    }

    /// The class whose code is currently executing, if any
    pub(crate) fn current_class(&self) -> Option<&Rc<ClassData>> {
        self.context.last()
    }

    /// Return a functor that calls `func` against `receiver`
    pub fn rebind(&mut self, func: &ObjectRef, receiver: Value) -> Result<ObjectRef, Error> {
        functor::rebind(self, func, receiver)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Type queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether `ctor.prototype` is on the prototype chain of `value`
    pub fn instance_of(&mut self, value: &Value, ctor: &ObjectRef) -> Result<bool, Error> {
        if !ctor.borrow().is_callable() {
            return Err(Error::type_error(
                "Right-hand side of 'instanceof' is not callable",
            ));
        }
        let Value::Object(obj) = value else {
            return Ok(false);
        };
        let Value::Object(prototype) = self.ordinary_get(ctor, "prototype", &Value::Undefined)?
        else {
            return Ok(false);
        };

        let mut current = obj.borrow().prototype.clone();
        while let Some(proto) = current {
            if ObjectRef::ptr_eq(&proto, &prototype) {
                return Ok(true);
            }
            current = proto.borrow().prototype.clone();
        }
        Ok(false)
    }

    /// Whether the value is backed by array storage (including array-derived instances)
    pub fn is_array(&self, value: &Value) -> bool {
        match value {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Array(_)),
            _ => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Classes
    // ═══════════════════════════════════════════════════════════════════════

    /// Build a class from a definition and return its type
    pub fn define_class(
        &mut self,
        name: Option<&str>,
        definition: Definition,
    ) -> Result<ObjectRef, Error> {
        crate::class::compose::define_class(self, name, definition)
    }

    /// Metadata of a generated type; `None` for anything else
    pub fn class_info(&self, ty: &ObjectRef) -> Option<ClassInfo> {
        match &ty.borrow().kind {
            ObjectKind::Function(Function::Constructor(Constructor::Class(class))) => {
                Some(ClassInfo::new(class.cheap_clone()))
            }
            _ => None,
        }
    }

    /// The generated type behind a domain or a public instance
    pub fn type_object(&self, this: &ObjectRef) -> Option<ObjectRef> {
        let class = {
            let obj = this.borrow();
            match (&obj.slots, obj.as_domain()) {
                (Some(slots), _) => Some(slots.class().cheap_clone()),
                (None, Some(domain)) => domain.class(),
                (None, None) => None,
            }
        };
        class.and_then(|c| c.type_object())
    }

    /// `Super(...args)` from inside a constructor whose `this` is `this`
    pub fn super_call(&mut self, this: &Value, args: &[Value]) -> Result<Value, Error> {
        let domain = this.require_object("Super() receiver")?;
        construct::super_call(self, &domain, args)?;
        Ok(Value::Undefined)
    }

    /// Read the ancestor's version of `key`, bypassing the caller's overrides
    pub fn super_get(&mut self, this: &Value, key: &str) -> Result<Value, Error> {
        let domain = this.require_object("super receiver")?;
        domain::super_get(self, &domain, key)
    }

    /// Call the ancestor's version of method `key`
    pub fn super_method(&mut self, this: &Value, key: &str, args: &[Value]) -> Result<Value, Error> {
        let method = self.super_get(this, key)?;
        match method {
            Value::Object(f) if f.borrow().is_callable() => self.call(&f, this.clone(), args),
            _ => Err(Error::type_error(format!("super.{} is not a function", key))),
        }
    }

    /// The public instance a private domain belongs to
    pub fn public_instance(&self, this: &Value) -> Option<ObjectRef> {
        let Value::Object(obj) = this else {
            return None;
        };
        if obj.borrow().slots.is_some() {
            return Some(obj.cheap_clone());
        }
        domain::instance_of_domain(obj)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

fn array_get(obj: &ObjectRef, key: &str) -> Option<Value> {
    let o = obj.borrow();
    let elements = o.array_elements()?;
    if key == "length" {
        return Some(Value::Number(elements.len() as f64));
    }
    array_index(key).map(|idx| elements.get(idx).cloned().unwrap_or_default())
}

/// Element and length writes; `None` when the key is not array storage
fn array_set(obj: &ObjectRef, key: &str, value: &Value) -> Option<Result<(), Error>> {
    let mut o = obj.borrow_mut();
    let frozen = o.frozen;
    let ObjectKind::Array(elements) = &mut o.kind else {
        return None;
    };

    if key == "length" {
        if frozen {
            return Some(Err(Error::type_error("Cannot assign to read only property 'length'")));
        }
        let length = value
            .as_number()
            .ok_or_else(|| Error::runtime_error("RangeError", "Invalid array length"))
            .and_then(array_length);
        return Some(length.map(|n| elements.resize(n, Value::Undefined)));
    }

    let idx = array_index(key)?;
    if frozen {
        return Some(Err(Error::type_error(format!(
            "Cannot assign to read only property '{}'",
            key
        ))));
    }
    if idx >= elements.len() {
        elements.resize(idx + 1, Value::Undefined);
    }
    if let Some(slot) = elements.get_mut(idx) {
        *slot = value.clone();
    }
    Some(Ok(()))
}
