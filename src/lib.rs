//! Runtime class construction with private, protected and public members
//!
//! A class is described by a [`Definition`]: members wrapped in modifiers plus
//! a few directives (`Extends`, `Mixins`, `Implements`, ...). The realm turns
//! it into a constructible type whose instances only expose their public
//! members, while the class's own code runs against a private domain that
//! sees everything it is allowed to.
//!
//! # Example
//!
//! ```
//! use classforge::{Definition, Realm, Value, private, public};
//!
//! let mut realm = Realm::new();
//! let increment = realm.function("increment", 0, |realm, this, _| {
//!     let this = this.require_object("this")?;
//!     let count = realm.get(&this, "count")?.as_number().unwrap_or(0.0);
//!     realm.set(&this, "count", Value::from(count + 1.0))?;
//!     Ok(Value::from(count + 1.0))
//! });
//! let counter = realm
//!     .define_class(
//!         Some("Counter"),
//!         Definition::new()
//!             .member("count", private(0))
//!             .member("increment", public(increment)),
//!     )
//!     .unwrap();
//!
//! let c = realm.construct(&counter, &[]).unwrap();
//! let c = c.as_object().unwrap();
//! assert_eq!(realm.call_method(c, "increment", &[]).unwrap(), Value::from(1));
//! assert_eq!(realm.get(c, "count").unwrap(), Value::Undefined);
//! ```

pub mod class;
pub mod config;
pub mod enumeration;
pub mod error;
pub mod functor;
pub mod interface;
pub mod link;
pub mod member;
pub mod realm;
pub mod scope;
pub mod string_dict;
pub mod value;

pub use class::{ClassInfo, Definition, Entry, IntoEntry};
pub use config::{LinkPolicy, RealmConfig};
pub use enumeration::{Mode, Privilege};
pub use error::Error;
pub use interface::{Interface, InterfaceDef, MethodSig, PropertySig};
pub use member::modifiers;
pub use member::modifiers::{
    abstract_, delegate, explicit_super, final_, private, property, protected, public, static_,
    typed,
};
pub use member::{Accessor, IntoMember, Member};
pub use realm::Realm;
pub use value::{CheapClone, ObjectRef, Str, TypeSpec, Value};
