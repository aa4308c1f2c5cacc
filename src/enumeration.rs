//! Closed vocabularies used by class definitions
//!
//! `Privilege` and `Mode` are fixed sets of named values. Definitions may
//! refer to a value by name, so both support lookup and membership tests.

use std::fmt;

/// Visibility tier of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Privilege {
    /// Not yet decided; treated as Public when a class is built
    #[default]
    None,
    Public,
    Protected,
    Private,
    /// Internal marker for redirect members; never user-assignable
    Link,
}

impl Privilege {
    pub const ALL: [Privilege; 5] = [
        Privilege::None,
        Privilege::Public,
        Privilege::Protected,
        Privilege::Private,
        Privilege::Link,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Privilege::None => "None",
            Privilege::Public => "Public",
            Privilege::Protected => "Protected",
            Privilege::Private => "Private",
            Privilege::Link => "Link",
        }
    }

    pub fn from_name(name: &str) -> Option<Privilege> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    pub fn contains(name: &str) -> bool {
        Self::from_name(name).is_some()
    }

    /// Resolve `None` to the default tier
    pub fn effective(self) -> Privilege {
        match self {
            Privilege::None => Privilege::Public,
            other => other,
        }
    }

    /// Rank used to compare visibility; wider is larger
    pub(crate) fn rank(self) -> u8 {
        match self.effective() {
            Privilege::Private => 0,
            Privilege::Protected => 1,
            _ => 2,
        }
    }

    /// Visible to descendants (Protected or wider)
    pub fn is_inheritable(self) -> bool {
        self.rank() >= 1
    }

    pub fn is_public(self) -> bool {
        self.rank() == 2
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class-level inheritability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Default,
    /// Only constructible as part of a descendant's construction
    Abstract,
    /// Cannot be extended
    Final,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Default, Mode::Abstract, Mode::Final];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Default => "Default",
            Mode::Abstract => "Abstract",
            Mode::Final => "Final",
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }

    pub fn contains(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
