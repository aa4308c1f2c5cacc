//! Dynamic value representation
//!
//! The host object model the class engine runs on: values, reference-counted
//! objects with prototype links, property descriptors and callables.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::BuildHasherDefault;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::class::{ClassData, DomainData, InstanceSlots};
use crate::error::Error;
use crate::interface::Interface;
use crate::realm::{ClassId, Realm};

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// Regular `.clone()` still works; `cheap_clone()` makes it explicit at the
/// call site that only a reference count is bumped.
pub trait CheapClone: Clone {
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// Ordered map keyed by interned strings, hashed with FxHasher
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Own properties of an object, in definition order
pub type PropertyMap = FxIndexMap<Str, Property>;

/// Create an empty FxIndexMap
#[inline]
pub fn index_map_new<K, V>() -> FxIndexMap<K, V> {
    IndexMap::with_hasher(BuildHasherDefault::default())
}

/// A dynamic value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Str),
    Object(ObjectRef),
}

impl Value {
    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Check if this value is callable (a function)
    pub fn is_callable(&self) -> bool {
        match self {
            Value::Object(obj) => obj.borrow().is_callable(),
            _ => false,
        }
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(obj) => {
                if obj.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The object handle, or a TypeError naming `what`
    pub fn require_object(&self, what: &str) -> Result<ObjectRef, Error> {
        match self {
            Value::Object(obj) => Ok(obj.cheap_clone()),
            other => Err(Error::type_error(format!(
                "{} must be an object, got {}",
                what,
                other.type_of()
            ))),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Human-readable rendering used in messages and `join`
    pub fn to_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Object(obj) => match obj.try_borrow() {
                Some(o) => match &o.kind {
                    ObjectKind::Function(func) => format!("[Function: {}]", func.name()),
                    ObjectKind::Array(elements) => elements
                        .iter()
                        .map(|e| e.to_display())
                        .collect::<Vec<_>>()
                        .join(","),
                    ObjectKind::Interface(iface) => format!("[Interface: {}]", iface.name()),
                    _ => "[object Object]".to_string(),
                },
                None => "[object Object]".to_string(),
            },
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN !== NaN falls out of f64 comparison
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => ObjectRef::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s.as_str()),
            Value::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Str::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Str::from(s))
    }
}

impl From<Str> for Value {
    fn from(s: Str) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<&ObjectRef> for Value {
    fn from(obj: &ObjectRef) -> Self {
        Value::Object(obj.cheap_clone())
    }
}

/// Reference-counted string used for values and property keys
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Str(Rc<str>);

impl CheapClone for Str {}

impl Str {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<str> for Str {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Str {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Str {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for Str {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Self {
        Str(s.into())
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Str(s.into())
    }
}

impl From<&Str> for Str {
    fn from(s: &Str) -> Self {
        s.cheap_clone()
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared handle to a heap object
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl CheapClone for ObjectRef {}

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        ObjectRef(Rc::new(RefCell::new(object)))
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    pub fn try_borrow(&self) -> Option<Ref<'_, Object>> {
        self.0.try_borrow().ok()
    }

    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Rc::downgrade(&self.0))
    }
}

impl fmt::Debug for ObjectRef {
    // Shallow on purpose: prototype chains and domains point at each other
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_borrow() {
            Some(obj) => match &obj.kind {
                ObjectKind::Ordinary => write!(f, "{{...}}"),
                ObjectKind::Array(elements) => write!(f, "Array({})", elements.len()),
                ObjectKind::Function(func) => write!(f, "[Function: {}]", func.name()),
                ObjectKind::Domain(domain) => match domain.class() {
                    Some(class) => write!(f, "[Domain {}]", class.name()),
                    None => write!(f, "[Domain]"),
                },
                ObjectKind::Interface(iface) => write!(f, "[Interface: {}]", iface.name()),
            },
            None => write!(f, "{{<borrowed>}}"),
        }
    }
}

/// Non-owning handle, used for back-references that must not keep their target alive
#[derive(Clone, Default)]
pub struct WeakObjectRef(Weak<RefCell<Object>>);

impl WeakObjectRef {
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(obj) => write!(f, "Weak({:?})", obj),
            None => write!(f, "Weak(<dropped>)"),
        }
    }
}

/// A heap object
#[derive(Debug)]
pub struct Object {
    /// Prototype link
    pub prototype: Option<ObjectRef>,
    /// Whether the object can have properties added
    pub extensible: bool,
    /// Whether the object is frozen (no modifications allowed)
    pub frozen: bool,
    /// Whether the object is sealed (no new properties, but existing can be modified)
    pub sealed: bool,
    /// Object properties
    pub properties: PropertyMap,
    /// Exotic object behavior
    pub kind: ObjectKind,
    /// Capability slot of engine-built instances; never handed out publicly
    pub(crate) slots: Option<Rc<InstanceSlots>>,
}

impl Object {
    /// Create a new ordinary object
    pub fn new() -> Self {
        Self {
            prototype: None,
            extensible: true,
            frozen: false,
            sealed: false,
            properties: index_map_new(),
            kind: ObjectKind::Ordinary,
            slots: None,
        }
    }

    /// Create a new ordinary object with a prototype
    pub fn with_prototype(prototype: Option<ObjectRef>) -> Self {
        Self {
            prototype,
            ..Self::new()
        }
    }

    pub fn with_kind(prototype: Option<ObjectRef>, kind: ObjectKind) -> Self {
        Self {
            prototype,
            kind,
            ..Self::new()
        }
    }

    /// Check if this object is callable
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(Function::Constructor(_)))
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            ObjectKind::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_domain(&self) -> Option<&DomainData> {
        match &self.kind {
            ObjectKind::Domain(domain) => Some(domain),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&Rc<Interface>> {
        match &self.kind {
            ObjectKind::Interface(iface) => Some(iface),
            _ => None,
        }
    }

    pub fn array_elements(&self) -> Option<&Vec<Value>> {
        match &self.kind {
            ObjectKind::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Get an own property
    pub fn get_own_property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Get a property descriptor, searching the prototype chain
    /// Returns (property, found_in_prototype)
    pub fn get_property_descriptor(&self, key: &str) -> Option<(Property, bool)> {
        if let Some(prop) = self.properties.get(key) {
            return Some((prop.clone(), false));
        }

        if let Some(ref proto) = self.prototype {
            if let Some((prop, _)) = proto.borrow().get_property_descriptor(key) {
                return Some((prop, true));
            }
        }

        None
    }

    /// Define a property with attributes, bypassing extensibility checks
    pub fn define_property(&mut self, key: impl Into<Str>, prop: Property) {
        self.properties.insert(key.into(), prop);
    }

    /// Check if object has own property
    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Get own property keys in definition order
    pub fn own_keys(&self) -> Vec<Str> {
        self.properties.keys().cloned().collect()
    }

    /// Whether a new property may be added
    pub fn accepts_new_properties(&self) -> bool {
        self.extensible && !self.sealed && !self.frozen
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

/// Object property descriptor
#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
    /// Getter function (for accessor properties)
    pub getter: Option<ObjectRef>,
    /// Setter function (for accessor properties)
    pub setter: Option<ObjectRef>,
    /// Declared value-type constraint, checked on every write
    pub constraint: Option<TypeSpec>,
}

impl Property {
    pub fn data(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
            getter: None,
            setter: None,
            constraint: None,
        }
    }

    pub fn data_readonly(value: Value) -> Self {
        Self {
            writable: false,
            ..Self::data(value)
        }
    }

    /// Create an accessor property with getter and/or setter
    pub fn accessor(getter: Option<ObjectRef>, setter: Option<ObjectRef>) -> Self {
        Self {
            value: Value::Undefined,
            writable: false,
            enumerable: true,
            configurable: true,
            getter,
            setter,
            constraint: None,
        }
    }

    /// Check if this is an accessor property (has getter or setter)
    pub fn is_accessor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }

    /// Create a property with custom attributes
    pub fn with_attributes(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value,
            writable,
            enumerable,
            configurable,
            getter: None,
            setter: None,
            constraint: None,
        }
    }

    pub fn constrained(mut self, constraint: Option<TypeSpec>) -> Self {
        self.constraint = constraint;
        self
    }
}

/// Declared value-type constraint of a member
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Boolean,
    Number,
    String,
    Object,
    Function,
    Array,
    /// Instances of the given constructor (checked with `instance_of`)
    Instance(ObjectRef),
}

impl TypeSpec {
    pub fn name(&self) -> String {
        match self {
            TypeSpec::Boolean => "boolean".to_string(),
            TypeSpec::Number => "number".to_string(),
            TypeSpec::String => "string".to_string(),
            TypeSpec::Object => "object".to_string(),
            TypeSpec::Function => "function".to_string(),
            TypeSpec::Array => "array".to_string(),
            TypeSpec::Instance(ctor) => match ctor.borrow().as_function() {
                Some(func) => func.name().to_string(),
                None => "instance".to_string(),
            },
        }
    }
}

impl PartialEq for TypeSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeSpec::Instance(a), TypeSpec::Instance(b)) => ObjectRef::ptr_eq(a, b),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

/// Exotic object behavior
#[derive(Debug)]
pub enum ObjectKind {
    /// Ordinary object
    Ordinary,
    /// Array exotic object; elements live outside the property map
    Array(Vec<Value>),
    /// Function exotic object
    Function(Function),
    /// Private (per-instance) or static (per-class) storage domain
    Domain(DomainData),
    /// Structural interface, usable as an `Implements` entry
    Interface(Rc<Interface>),
}

/// Native function signature
pub type NativeFn = Rc<dyn Fn(&mut Realm, Value, &[Value]) -> Result<Value, Error>>;

/// Native constructor initializer, run against the freshly created object
pub type NativeInit = fn(&mut Realm, &ObjectRef, &[Value]) -> Result<(), Error>;

/// Function representation
#[derive(Debug, Clone)]
pub enum Function {
    /// Native Rust closure
    Native(NativeFunction),
    /// Rebindable callable: a target plus the receiver it runs against
    Functor(FunctorData),
    /// Something `construct` accepts
    Constructor(Constructor),
}

impl Function {
    pub fn name(&self) -> String {
        match self {
            Function::Native(f) => f.name.to_string(),
            Function::Functor(f) => match f.target.try_borrow() {
                Some(target) => match target.as_function() {
                    Some(func) => func.name(),
                    None => "functor".to_string(),
                },
                None => "functor".to_string(),
            },
            Function::Constructor(Constructor::Class(class)) => class.name().to_string(),
            Function::Constructor(Constructor::Native(ctor)) => ctor.name.to_string(),
        }
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        match self {
            Function::Native(f) => f.arity,
            Function::Functor(f) => f
                .target
                .borrow()
                .as_function()
                .map(Function::arity)
                .unwrap_or(0),
            Function::Constructor(Constructor::Class(class)) => class.constructor_arity(),
            Function::Constructor(Constructor::Native(ctor)) => ctor.arity,
        }
    }
}

/// Native function wrapper
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Str,
    pub func: NativeFn,
    pub arity: usize,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Data for a rebindable callable
#[derive(Debug, Clone)]
pub struct FunctorData {
    /// The function to call
    pub(crate) target: ObjectRef,
    /// The `this` the target runs against; `Undefined` defers to the call site
    pub(crate) receiver: Value,
    /// Fixed functors ignore rebinding (Delegate members)
    pub(crate) fixed: bool,
    /// Which domain of the receiver the target actually runs in
    pub(crate) scope: Option<BoundScope>,
}

impl FunctorData {
    /// The wrapped function
    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Whether calls ignore the call-site receiver
    pub fn is_bound(&self) -> bool {
        !self.receiver.is_null_or_undefined()
    }
}

/// A class-level scope a functor re-enters on every call. The receiver is
/// kept public; the domain is looked up from it at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundScope {
    /// The private domain of this class on the receiving instance
    Instance(ClassId),
    /// The static domain of this class, when the receiver is its type or a descendant's
    Static(ClassId),
}

/// Constructor flavours accepted by `Realm::construct`
#[derive(Debug, Clone)]
pub enum Constructor {
    /// Type generated by `define_class`
    Class(Rc<ClassData>),
    /// Built-in constructor such as `Array`
    Native(NativeConstructor),
}

/// Built-in constructor
#[derive(Debug, Clone)]
pub struct NativeConstructor {
    pub name: Str,
    pub arity: usize,
    pub kind: NativeKind,
    pub init: NativeInit,
}

/// Exotic kind of objects a native constructor produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    Object,
    Array,
}

impl NativeKind {
    pub(crate) fn fresh_kind(self) -> ObjectKind {
        match self {
            NativeKind::Object => ObjectKind::Ordinary,
            NativeKind::Array => ObjectKind::Array(Vec::new()),
        }
    }
}

/// Largest array length (2^32 - 1)
pub(crate) const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

/// Validate a numeric array length
pub(crate) fn array_length(n: f64) -> Result<usize, Error> {
    if n >= 0.0 && n.fract() == 0.0 && n <= MAX_ARRAY_LENGTH as f64 {
        Ok(n as usize)
    } else {
        Err(Error::runtime_error("RangeError", "Invalid array length"))
    }
}

/// Parse a canonical array index ("0", "17"; not "01"). Keys at or past
/// the largest length are ordinary property names.
pub(crate) fn array_index(key: &str) -> Option<usize> {
    let first = key.bytes().next()?;
    if !first.is_ascii_digit() {
        return None;
    }
    let idx = key.parse::<usize>().ok()?;
    if idx >= MAX_ARRAY_LENGTH || idx.to_string() != key {
        return None;
    }
    Some(idx)
}
