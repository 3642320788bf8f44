//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Sievedit.
//
// Sievedit is free  software: you can redistribute it and/or  modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Sievedit is distributed in the hope  that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Sievedit. If not, see <http://www.gnu.org/licenses/>.

//! Declarative descriptions of grammar rules.
//!
//! Most of the Sieve grammar is expressed as data rather than code. A `Rule`
//! describes a command (action), test, or tag as a keyword followed by
//! property blocks; a `GroupRule` describes a choice between several rules
//! of the same class. The engine in `atoms` turns these into parsers and
//! writers.
//!
//! For example, `fileinto [:copy] <mailbox: string>` is
//!
//! ```ignore
//! Rule::action("action/fileinto", "fileinto")
//!     .requires("fileinto")
//!     .tags(vec![slot("copy", "tag/copy")])
//!     .parameters(vec![slot("mailbox", "string").value("\"INBOX\"")])
//! ```
//!
//! Each slot names the node type which is parsed in that position. Slots in
//! a tag block may appear in any order, or not at all. Slots in a parameter
//! block must all appear, in order. A dependent block is like a parameter
//! block that may be missing.

use super::capabilities::Requirement;

/// One position in a property block.
#[derive(Clone, Debug)]
pub struct Slot {
    pub id: String,
    /// The name of the rule parsed in this slot.
    pub ty: String,
    /// Text parsed to create the value of the slot when it was not present
    /// in the input. If `None`, the rule's own defaults are used.
    pub value: Option<String>,
    pub requires: Requirement,
}

pub fn slot(id: &str, ty: &str) -> Slot {
    Slot {
        id: id.to_owned(),
        ty: ty.to_owned(),
        value: None,
        requires: Requirement::None,
    }
}

impl Slot {
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_owned());
        self
    }

    pub fn requires(mut self, requires: impl Into<Requirement>) -> Self {
        self.requires = requires.into();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    /// Optional, unordered tags.
    Tags,
    /// Mandatory, ordered parameters.
    Parameters,
    /// Ordered parameters which may be absent as a whole.
    Dependent,
}

#[derive(Clone, Debug)]
pub struct Property {
    pub id: String,
    pub kind: PropertyKind,
    pub elements: Vec<Slot>,
    /// For dependent blocks, the block is only attempted if this is met.
    pub requires: Requirement,
}

impl Property {
    pub fn tags(id: &str, elements: Vec<Slot>) -> Self {
        Property {
            id: id.to_owned(),
            kind: PropertyKind::Tags,
            elements,
            requires: Requirement::None,
        }
    }

    pub fn parameters(id: &str, elements: Vec<Slot>) -> Self {
        Property {
            id: id.to_owned(),
            kind: PropertyKind::Parameters,
            elements,
            requires: Requirement::None,
        }
    }

    pub fn dependent(id: &str, elements: Vec<Slot>) -> Self {
        Property {
            id: id.to_owned(),
            kind: PropertyKind::Dependent,
            elements,
            requires: Requirement::None,
        }
    }

    pub fn requires(mut self, requires: impl Into<Requirement>) -> Self {
        self.requires = requires.into();
        self
    }
}

/// How trailing whitespace after a literal is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trailing {
    /// Trailing whitespace is not part of the literal.
    None,
    /// Optional whitespace up to and including one line break. New literals
    /// get a line break.
    Line,
    /// At least one whitespace character is required. New literals get a
    /// single space.
    Required,
}

/// A keyword followed by property blocks.
#[derive(Clone, Debug)]
pub struct Rule {
    pub node: String,
    pub class: String,
    pub token: String,
    pub requires: Requirement,
    pub properties: Vec<Property>,
    /// Whether the rule is a command terminated by `;`.
    pub terminated: bool,
    pub priority: i32,
}

impl Rule {
    fn new(node: &str, class: &str, token: &str, terminated: bool) -> Self {
        Rule {
            node: node.to_owned(),
            class: class.to_owned(),
            token: token.to_owned(),
            requires: Requirement::None,
            properties: Vec::new(),
            terminated,
            priority: 0,
        }
    }

    /// A command in class `action`, terminated by `;`.
    pub fn action(node: &str, token: &str) -> Self {
        Self::new(node, "action", token, true)
    }

    /// A test in class `test`.
    pub fn test(node: &str, token: &str) -> Self {
        Self::new(node, "test", token, false)
    }

    /// A tag or other bare keyword in the given class.
    pub fn tag(node: &str, class: &str, token: &str) -> Self {
        Self::new(node, class, token, false)
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = class.to_owned();
        self
    }

    pub fn requires(mut self, requires: impl Into<Requirement>) -> Self {
        self.requires = requires.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn tags(self, elements: Vec<Slot>) -> Self {
        self.property(Property::tags("tags", elements))
    }

    pub fn parameters(self, elements: Vec<Slot>) -> Self {
        self.property(Property::parameters("parameters", elements))
    }

    /// Add a single dependent slot, only attempted if `requires` is met.
    pub fn dependent(self, slot: Slot, requires: impl Into<Requirement>) -> Self {
        let id = slot.id.clone();
        self.property(Property::dependent(&id, vec![slot]).requires(requires))
    }

    /// Merge `property` into this rule.
    ///
    /// If a property with the same id exists, the new elements are appended
    /// to it. Otherwise, the property is inserted before all others, since
    /// extensions add tags, which precede the positional parameters.
    pub fn extend(&mut self, property: Property) {
        match self.properties.iter_mut().find(|p| p.id == property.id) {
            Some(existing) => existing.elements.extend(property.elements),
            None => self.properties.insert(0, property),
        }
    }

    /// All slots of all properties.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.properties.iter().flat_map(|p| p.elements.iter())
    }
}

/// How a group resolves when none of its alternatives is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Policy {
    /// An alternative must always be present. New groups are created by
    /// parsing the seed text.
    Mandatory(String),
    /// Absence means the server decides; the group has no value.
    Implicit,
    /// Absence means the given alternative, which is therefore never
    /// written out.
    Explicit(String),
}

/// A choice of exactly one rule among the rules of `items`.
#[derive(Clone, Debug)]
pub struct GroupRule {
    pub node: String,
    pub class: String,
    /// A keyword preceding the chosen alternative, like `:comparator`.
    pub token: Option<String>,
    /// The classes of the alternatives, in the order they are tried.
    pub items: Vec<String>,
    pub policy: Policy,
    pub requires: Requirement,
    pub priority: i32,
}

impl GroupRule {
    pub fn new(node: &str, items: &[&str], policy: Policy) -> Self {
        GroupRule {
            node: node.to_owned(),
            class: node.to_owned(),
            token: None,
            items: items.iter().map(|&s| s.to_owned()).collect(),
            policy,
            requires: Requirement::None,
            priority: 0,
        }
    }

    pub fn mandatory(node: &str, items: &[&str], seed: &str) -> Self {
        Self::new(node, items, Policy::Mandatory(seed.to_owned()))
    }

    pub fn implicit(node: &str, items: &[&str]) -> Self {
        Self::new(node, items, Policy::Implicit)
    }

    pub fn explicit(node: &str, items: &[&str], default: &str) -> Self {
        Self::new(node, items, Policy::Explicit(default.to_owned()))
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = class.to_owned();
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    pub fn requires(mut self, requires: impl Into<Requirement>) -> Self {
        self.requires = requires.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The text the group stands for when it has no current alternative.
    pub fn default_value(&self) -> Option<&str> {
        match self.policy {
            Policy::Explicit(ref default) => Some(default),
            Policy::Mandatory(_) | Policy::Implicit => None,
        }
    }
}

/// Register several bare-keyword rules of one class.
///
/// ```ignore
/// keywords! {
///     builder, "match-type/", Requirement::None;
///     "match-type/is" => ":is",
///     "match-type/contains" => ":contains",
/// }
/// ```
macro_rules! keywords {
    ($builder:expr, $class:expr, $requires:expr;
     $($node:expr => $token:expr),* $(,)*) => {
        $(
            $builder.add(
                $crate::grammar::rule::Rule::tag($node, $class, $token)
                    .requires($requires.clone()),
            );
        )*
    };
}
