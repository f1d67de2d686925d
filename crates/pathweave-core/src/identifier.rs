//! Element identifiers backed by string interning.
//!
//! Pathway files name every element by its `graphId`, and the sync engine
//! uses the same ids for the graph nodes and edges it emits. Items the
//! engine synthesizes get ids derived from their element: segments of a
//! split line are `line::seg0`, `line::seg1` and so on, and the membership
//! edge of a group member is `group::member`. [`Id`] is an interned symbol,
//! so ids are `Copy` and compare in constant time.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Interned id text shared by all documents and sessions of the process.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// Id of a diagram element, or of a graph node or edge emitted for one.
///
/// # Examples
///
/// ```
/// use pathweave_core::identifier::Id;
///
/// let line = Id::new("a1f3c");
/// assert_eq!(line, "a1f3c");
/// assert_eq!(line, Id::new("a1f3c"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` as an element id.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Derives the id of a graph item synthesized from this element.
    ///
    /// The result is `self::child_id`. Split lines name their segments this
    /// way, and groups name the membership edges to their members.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathweave_core::identifier::Id;
    ///
    /// let line = Id::new("a1f3c");
    /// assert_eq!(line.create_nested(Id::new("seg1")), "a1f3c::seg1");
    ///
    /// let group = Id::new("g1");
    /// assert_eq!(group.create_nested(Id::new("n7")), "g1::n7");
    /// ```
    pub fn create_nested(&self, child_id: Id) -> Self {
        let mut interner = interner();
        let parent_str = interner
            .resolve(self.0)
            .expect("Parent ID should exist in interner");
        let child_str = interner
            .resolve(child_id.0)
            .expect("Child ID should exist in interner");
        let nested_name = format!("{parent_str}::{child_str}");
        Self(interner.get_or_intern(&nested_name))
    }

    /// Returns `true` for the empty id.
    ///
    /// Pathway files leave `graphId` empty on elements nothing refers to.
    /// Such elements get a generated id on conversion.
    pub fn is_empty(&self) -> bool {
        *self == ""
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        write!(f, "{str_value}")
    }
}

impl std::str::FromStr for Id {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Compares with id text read from a pathway file or a host, `id == "n1"`.
    fn eq(&self, other: &str) -> bool {
        let interner = interner();
        let self_str = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        self_str == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}
