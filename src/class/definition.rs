//! Class definitions: an ordered map of directive and member keys

use std::rc::Rc;

use crate::enumeration::Mode;
use crate::error::Error;
use crate::interface::Interface;
use crate::member::{IntoMember, Member, modifiers};
use crate::value::{CheapClone, FxIndexMap, ObjectRef, Str, Value, index_map_new};

/// One value in a definition
#[derive(Debug, Clone)]
pub enum Entry {
    Value(Value),
    Member(Member),
    Mode(Mode),
    Interface(Rc<Interface>),
    List(Vec<Entry>),
}

/// Conversion into a definition entry
pub trait IntoEntry {
    fn into_entry(self) -> Result<Entry, Error>;
}

impl IntoEntry for Entry {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(self)
    }
}

impl IntoEntry for Value {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Value(self))
    }
}

impl IntoEntry for Member {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Member(self))
    }
}

impl IntoEntry for Result<Member, Error> {
    fn into_entry(self) -> Result<Entry, Error> {
        self.map(Entry::Member)
    }
}

impl IntoEntry for Mode {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Mode(self))
    }
}

impl IntoEntry for Rc<Interface> {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Interface(self))
    }
}

impl IntoEntry for Vec<Entry> {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::List(self))
    }
}

impl IntoEntry for ObjectRef {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Value(Value::Object(self)))
    }
}

impl IntoEntry for &ObjectRef {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Value(Value::Object(self.cheap_clone())))
    }
}

impl IntoEntry for &str {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Value(Value::from(self)))
    }
}

impl IntoEntry for String {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Value(Value::from(self)))
    }
}

impl IntoEntry for f64 {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Value(Value::Number(self)))
    }
}

impl IntoEntry for i32 {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Value(Value::from(self)))
    }
}

impl IntoEntry for bool {
    fn into_entry(self) -> Result<Entry, Error> {
        Ok(Entry::Value(Value::Boolean(self)))
    }
}

/// Builder for the definition passed to `Realm::define_class`.
///
/// The keys `Mode`, `Extends`, `Implements`, `Mixins`, `Events`,
/// `Constructor` and `StaticConstructor` are directives; every other key is
/// a member, except capitalized near-misses of a directive, which are
/// rejected. The first conversion error is kept and reported when the class
/// is defined.
#[derive(Debug, Clone)]
pub struct Definition {
    entries: FxIndexMap<Str, Entry>,
    error: Option<Error>,
}

impl Definition {
    pub fn new() -> Self {
        Self {
            entries: index_map_new(),
            error: None,
        }
    }

    /// Add any key. A repeated key replaces the earlier entry.
    pub fn entry(mut self, key: &str, value: impl IntoEntry) -> Self {
        match value.into_entry() {
            Ok(entry) => {
                self.entries.insert(Str::from(key), entry);
            }
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }

    /// Add a member key
    pub fn member(self, name: &str, member: impl IntoMember) -> Self {
        self.entry(name, member.into_member())
    }

    pub fn mode(self, mode: Mode) -> Self {
        self.entry("Mode", mode)
    }

    pub fn extends(self, ty: &ObjectRef) -> Self {
        self.entry("Extends", ty)
    }

    pub fn implements(self, interfaces: impl IntoIterator<Item = Rc<Interface>>) -> Self {
        let list = interfaces.into_iter().map(Entry::Interface).collect::<Vec<_>>();
        self.entry("Implements", list)
    }

    pub fn mixins<'a>(self, mixins: impl IntoIterator<Item = &'a ObjectRef>) -> Self {
        let list = mixins
            .into_iter()
            .map(|m| Entry::Value(Value::Object(m.cheap_clone())))
            .collect::<Vec<_>>();
        self.entry("Mixins", list)
    }

    pub fn events<'a>(self, events: impl IntoIterator<Item = &'a str>) -> Self {
        let list = events
            .into_iter()
            .map(|e| Entry::Value(Value::from(e)))
            .collect::<Vec<_>>();
        self.entry("Events", list)
    }

    pub fn constructor(self, ctor: impl IntoMember) -> Self {
        self.entry("Constructor", ctor.into_member())
    }

    /// Constructor that drives `Super` itself via `Realm::super_call`
    pub fn constructor_with_super(self, ctor: impl IntoMember) -> Self {
        self.entry("Constructor", modifiers::explicit_super(ctor))
    }

    pub fn static_constructor(self, ctor: impl IntoMember) -> Self {
        self.entry("StaticConstructor", ctor.into_member())
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the builder, surfacing the first recorded error
    pub(crate) fn into_entries(self) -> Result<FxIndexMap<Str, Entry>, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.entries),
        }
    }
}

impl Default for Definition {
    fn default() -> Self {
        Self::new()
    }
}

/// Keys read as class directives; everything else is a member
pub(crate) const DIRECTIVES: [&str; 7] = [
    "Mode",
    "Extends",
    "Implements",
    "Mixins",
    "Events",
    "Constructor",
    "StaticConstructor",
];

/// Whether a capitalized `key` is a misspelled directive ("Extend",
/// "MIXINS"). Short directives only match up to case.
pub(crate) fn is_misspelled_directive(key: &str) -> bool {
    if !key.bytes().next().is_some_and(|b| b.is_ascii_uppercase()) || DIRECTIVES.contains(&key) {
        return false;
    }
    let lowered = key.to_ascii_lowercase();
    DIRECTIVES.iter().any(|directive| {
        let directive = directive.to_ascii_lowercase();
        if directive.len() < 6 {
            directive == lowered
        } else {
            within_one_edit(directive.as_bytes(), lowered.as_bytes())
        }
    })
}

/// One insertion, deletion or substitution at most
fn within_one_edit(a: &[u8], b: &[u8]) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if long.len() - short.len() > 1 {
        return false;
    }
    let prefix = short.iter().zip(long).take_while(|(x, y)| x == y).count();
    if short.len() == long.len() {
        short.get(prefix + 1..) == long.get(prefix + 1..)
    } else {
        short.get(prefix..) == long.get(prefix + 1..)
    }
}
