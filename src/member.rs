//! Member descriptors ("Boxes") and the modifier vocabulary
//!
//! A `Member` records how one class member is exposed: its privilege,
//! mutability, storage kind, ownership and payload. Modifiers wrap raw values
//! or existing members and merge attributes, so they nest freely:
//!
//! ```
//! use classforge::modifiers::{final_, public, static_};
//! use classforge::Value;
//!
//! let member = public(static_(final_(Value::from(3)))).unwrap();
//! assert!(member.is_static() && member.is_final());
//! ```
//!
//! Three attribute pairs are mutually exclusive: property/final,
//! abstract/property and abstract/final. Violations are definition errors.
//! Once a member is locked (when its class is built), every setter is a
//! silent no-op.

use crate::enumeration::Privilege;
use crate::error::Error;
use crate::value::{CheapClone, ObjectRef, Str, TypeSpec, Value};

/// Getter/setter pair backing a Property member
#[derive(Debug, Clone, Default)]
pub struct Accessor {
    pub get: Option<ObjectRef>,
    pub set: Option<ObjectRef>,
}

impl Accessor {
    pub fn new(get: Option<ObjectRef>, set: Option<ObjectRef>) -> Self {
        Self { get, set }
    }

    pub fn getter(get: ObjectRef) -> Self {
        Self {
            get: Some(get),
            set: None,
        }
    }
}

impl PartialEq for Accessor {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: &Option<ObjectRef>, b: &Option<ObjectRef>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => ObjectRef::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        same(&self.get, &other.get) && same(&self.set, &other.set)
    }
}

/// Where a redirect member forwards to
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSpec {
    /// Key of the authoritative slot
    pub key: Str,
    /// Privilege of the member being redirected to
    pub origin: Privilege,
    pub delegate: bool,
}

/// Member payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Value(Value),
    Accessor(Accessor),
    Link(LinkSpec),
}

/// Member descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    privilege: Privilege,
    is_final: bool,
    is_abstract: bool,
    is_static: bool,
    is_property: bool,
    is_delegate: bool,
    calls_super: bool,
    constraint: Option<TypeSpec>,
    payload: Payload,
    locked: bool,
}

/// Attribute changes applied by `Member::modify`; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct Modifiers {
    pub privilege: Option<Privilege>,
    pub is_final: Option<bool>,
    pub is_abstract: Option<bool>,
    pub is_static: Option<bool>,
    pub is_delegate: Option<bool>,
    pub calls_super: Option<bool>,
    pub accessor: Option<Accessor>,
    pub constraint: Option<TypeSpec>,
}

impl Member {
    /// Plain value member with no attributes set
    pub fn new(value: Value) -> Self {
        Self {
            privilege: Privilege::None,
            is_final: false,
            is_abstract: false,
            is_static: false,
            is_property: false,
            is_delegate: false,
            calls_super: false,
            constraint: None,
            payload: Payload::Value(value),
            locked: false,
        }
    }

    /// Redirect member pointing at the authoritative slot of `origin`
    pub(crate) fn link(key: &Str, origin: &Member) -> Self {
        Self {
            privilege: Privilege::Link,
            is_final: origin.is_final,
            is_abstract: false,
            is_static: origin.is_static,
            is_property: origin.is_property,
            is_delegate: origin.is_delegate,
            calls_super: false,
            constraint: None,
            payload: Payload::Link(LinkSpec {
                key: key.cheap_clone(),
                origin: origin.privilege.effective(),
                delegate: origin.is_delegate,
            }),
            locked: true,
        }
    }

    /// Wrap `source` and merge `params` into it
    pub fn modify(source: impl IntoMember, params: Modifiers) -> Result<Member, Error> {
        let mut member = source.into_member()?;
        if let Some(accessor) = params.accessor {
            member.set_accessor(accessor)?;
        }
        if let Some(privilege) = params.privilege {
            member.set_privilege(privilege)?;
        }
        if let Some(is_final) = params.is_final {
            member.set_final(is_final)?;
        }
        if let Some(is_abstract) = params.is_abstract {
            member.set_abstract(is_abstract)?;
        }
        if let Some(is_static) = params.is_static {
            member.set_static(is_static);
        }
        if let Some(is_delegate) = params.is_delegate {
            member.set_delegate(is_delegate);
        }
        if let Some(calls_super) = params.calls_super {
            member.set_calls_super(calls_super);
        }
        if let Some(constraint) = params.constraint {
            member.set_constraint(constraint);
        }
        Ok(member)
    }

    pub fn privilege(&self) -> Privilege {
        self.privilege
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_property(&self) -> bool {
        self.is_property
    }

    pub fn is_delegate(&self) -> bool {
        self.is_delegate
    }

    /// Constructor that runs `Super` itself instead of getting it implicitly
    pub fn calls_super(&self) -> bool {
        self.calls_super
    }

    pub fn is_link(&self) -> bool {
        matches!(self.payload, Payload::Link(_))
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn constraint(&self) -> Option<&TypeSpec> {
        self.constraint.as_ref()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The plain value payload; `Undefined` for accessors and links
    pub fn value(&self) -> Value {
        match &self.payload {
            Payload::Value(value) => value.clone(),
            _ => Value::Undefined,
        }
    }

    pub fn accessor(&self) -> Option<&Accessor> {
        match &self.payload {
            Payload::Accessor(accessor) => Some(accessor),
            _ => None,
        }
    }

    pub fn link_spec(&self) -> Option<&LinkSpec> {
        match &self.payload {
            Payload::Link(spec) => Some(spec),
            _ => None,
        }
    }

    /// Whether the payload is a callable
    pub fn is_method(&self) -> bool {
        matches!(&self.payload, Payload::Value(value) if value.is_callable())
    }

    pub fn set_privilege(&mut self, privilege: Privilege) -> Result<(), Error> {
        if self.locked {
            return Ok(());
        }
        if privilege == Privilege::Link {
            return Err(Error::definition_error(
                "the Link privilege is reserved for redirect members",
            ));
        }
        self.privilege = privilege;
        Ok(())
    }

    pub fn set_final(&mut self, is_final: bool) -> Result<(), Error> {
        if self.locked {
            return Ok(());
        }
        if is_final && self.is_property {
            return Err(Error::conflicting_attributes("isProperty", "isFinal"));
        }
        if is_final && self.is_abstract {
            return Err(Error::conflicting_attributes("isAbstract", "isFinal"));
        }
        self.is_final = is_final;
        Ok(())
    }

    pub fn set_abstract(&mut self, is_abstract: bool) -> Result<(), Error> {
        if self.locked {
            return Ok(());
        }
        if is_abstract && self.is_property {
            return Err(Error::conflicting_attributes("isAbstract", "isProperty"));
        }
        if is_abstract && self.is_final {
            return Err(Error::conflicting_attributes("isAbstract", "isFinal"));
        }
        self.is_abstract = is_abstract;
        Ok(())
    }

    /// Turn the member into an accessor-backed property
    pub fn set_accessor(&mut self, accessor: Accessor) -> Result<(), Error> {
        if self.locked {
            return Ok(());
        }
        if self.is_final {
            return Err(Error::conflicting_attributes("isProperty", "isFinal"));
        }
        if self.is_abstract {
            return Err(Error::conflicting_attributes("isAbstract", "isProperty"));
        }
        if accessor.get.is_none() && accessor.set.is_none() {
            return Err(Error::definition_error(
                "a property member needs a getter or a setter",
            ));
        }
        self.is_property = true;
        self.payload = Payload::Accessor(accessor);
        Ok(())
    }

    pub fn set_static(&mut self, is_static: bool) {
        if !self.locked {
            self.is_static = is_static;
        }
    }

    pub fn set_delegate(&mut self, is_delegate: bool) {
        if !self.locked {
            self.is_delegate = is_delegate;
        }
    }

    pub fn set_calls_super(&mut self, calls_super: bool) {
        if !self.locked {
            self.calls_super = calls_super;
        }
    }

    pub fn set_constraint(&mut self, constraint: TypeSpec) {
        if !self.locked {
            self.constraint = Some(constraint);
        }
    }

    pub fn set_value(&mut self, value: Value) {
        if !self.locked && !self.is_property {
            self.payload = Payload::Value(value);
        }
    }

    /// Freeze all attributes; later setters become no-ops
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Copy with the same attributes but not locked (used when re-declaring
    /// a member taken from another class, e.g. a mixin)
    pub(crate) fn unlocked_copy(&self) -> Member {
        Member {
            locked: false,
            ..self.clone()
        }
    }
}

/// Conversion into a member; raw values become attribute-free members
pub trait IntoMember {
    fn into_member(self) -> Result<Member, Error>;
}

impl IntoMember for Member {
    fn into_member(self) -> Result<Member, Error> {
        Ok(self)
    }
}

impl IntoMember for Result<Member, Error> {
    fn into_member(self) -> Result<Member, Error> {
        self
    }
}

impl IntoMember for Value {
    fn into_member(self) -> Result<Member, Error> {
        Ok(Member::new(self))
    }
}

impl IntoMember for ObjectRef {
    fn into_member(self) -> Result<Member, Error> {
        Ok(Member::new(Value::Object(self)))
    }
}

impl IntoMember for &ObjectRef {
    fn into_member(self) -> Result<Member, Error> {
        Ok(Member::new(Value::Object(self.cheap_clone())))
    }
}

impl IntoMember for &str {
    fn into_member(self) -> Result<Member, Error> {
        Ok(Member::new(Value::from(self)))
    }
}

impl IntoMember for String {
    fn into_member(self) -> Result<Member, Error> {
        Ok(Member::new(Value::from(self)))
    }
}

impl IntoMember for f64 {
    fn into_member(self) -> Result<Member, Error> {
        Ok(Member::new(Value::Number(self)))
    }
}

impl IntoMember for i32 {
    fn into_member(self) -> Result<Member, Error> {
        Ok(Member::new(Value::from(self)))
    }
}

impl IntoMember for bool {
    fn into_member(self) -> Result<Member, Error> {
        Ok(Member::new(Value::Boolean(self)))
    }
}

/// Modifier functions. Each takes a raw value or a member and returns the
/// merged member; they compose by nesting.
pub mod modifiers {
    use super::*;

    pub fn private(x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            privilege: Some(Privilege::Private),
            ..Modifiers::default()
        })
    }

    pub fn protected(x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            privilege: Some(Privilege::Protected),
            ..Modifiers::default()
        })
    }

    pub fn public(x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            privilege: Some(Privilege::Public),
            ..Modifiers::default()
        })
    }

    pub fn static_(x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            is_static: Some(true),
            ..Modifiers::default()
        })
    }

    pub fn final_(x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            is_final: Some(true),
            ..Modifiers::default()
        })
    }

    pub fn abstract_(x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            is_abstract: Some(true),
            ..Modifiers::default()
        })
    }

    pub fn delegate(x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            is_delegate: Some(true),
            ..Modifiers::default()
        })
    }

    /// Constructor that calls `Super` itself. Constructors without it get
    /// the implicit zero-argument `Super` before their body runs.
    pub fn explicit_super(x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            calls_super: Some(true),
            ..Modifiers::default()
        })
    }

    /// Accessor-backed member
    pub fn property(accessor: Accessor) -> Result<Member, Error> {
        Member::modify(Value::Undefined, Modifiers {
            accessor: Some(accessor),
            ..Modifiers::default()
        })
    }

    /// Member whose value must satisfy `spec`
    pub fn typed(spec: TypeSpec, x: impl IntoMember) -> Result<Member, Error> {
        Member::modify(x, Modifiers {
            constraint: Some(spec),
            ..Modifiers::default()
        })
    }
}
