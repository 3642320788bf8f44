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

//! Capability sets and requirement expressions.

use std::collections::BTreeSet;
use std::fmt;
use std::iter::FromIterator;

use crate::support::error::Error;

/// The set of extensions a server supports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<String>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn insert(&mut self, name: &str) {
        self.0.insert(name.to_owned());
    }

    pub fn remove(&mut self, name: &str) {
        self.0.remove(name);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for Capabilities {
    fn from_iter<I: IntoIterator<Item = &'a str>>(it: I) -> Self {
        Capabilities(it.into_iter().map(str::to_owned).collect())
    }
}

impl FromIterator<String> for Capabilities {
    fn from_iter<I: IntoIterator<Item = String>>(it: I) -> Self {
        Capabilities(it.into_iter().collect())
    }
}

/// The capabilities a grammar rule depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Always available.
    None,
    /// Available if the named capability is.
    Name(String),
    /// Available if every named capability is.
    All(Vec<String>),
    /// Available if at least one named capability is.
    Any(Vec<String>),
}

impl Default for Requirement {
    fn default() -> Self {
        Requirement::None
    }
}

impl From<&str> for Requirement {
    fn from(name: &str) -> Self {
        Requirement::Name(name.to_owned())
    }
}

impl Requirement {
    pub fn all(names: &[&str]) -> Self {
        Requirement::All(names.iter().map(|&s| s.to_owned()).collect())
    }

    pub fn any(names: &[&str]) -> Self {
        Requirement::Any(names.iter().map(|&s| s.to_owned()).collect())
    }

    pub fn is_satisfied(&self, capabilities: &Capabilities) -> bool {
        match *self {
            Requirement::None => true,
            Requirement::Name(ref name) => capabilities.contains(name),
            Requirement::All(ref names) => {
                names.iter().all(|n| capabilities.contains(n))
            }
            Requirement::Any(ref names) => {
                names.iter().any(|n| capabilities.contains(n))
            }
        }
    }

    /// Every capability name mentioned by this expression.
    pub fn names(&self) -> &[String] {
        match *self {
            Requirement::None => &[],
            Requirement::Name(ref name) => std::slice::from_ref(name),
            Requirement::All(ref names) | Requirement::Any(ref names) => {
                names
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Requirement::None => write!(f, "nothing"),
            Requirement::Name(ref name) => write!(f, "{}", name),
            Requirement::All(ref names) => {
                write!(f, "all of [{}]", names.join(", "))
            }
            Requirement::Any(ref names) => {
                write!(f, "any of [{}]", names.join(", "))
            }
        }
    }
}

/// Accumulates the capabilities a script actually uses.
///
/// Names are kept in the order they are first required, so that the
/// `require` statements generated from them follow the script.
#[derive(Debug)]
pub struct Requirements<'a> {
    capabilities: &'a Capabilities,
    names: Vec<String>,
}

impl<'a> Requirements<'a> {
    pub fn new(capabilities: &'a Capabilities) -> Self {
        Requirements {
            capabilities,
            names: Vec::new(),
        }
    }

    /// Record that `requirement` is needed.
    ///
    /// For `Any`, the first alternative the capability set supports is
    /// recorded. Fails if the capability set cannot satisfy `requirement`.
    pub fn require(&mut self, requirement: &Requirement) -> Result<(), Error> {
        match *requirement {
            Requirement::None => (),
            Requirement::Name(ref name) => self.add(name)?,
            Requirement::All(ref names) => {
                for name in names {
                    self.add(name)?;
                }
            }
            Requirement::Any(ref names) => {
                match names.iter().find(|n| self.capabilities.contains(n)) {
                    Some(name) => {
                        let name = name.clone();
                        self.add(&name)?;
                    }
                    None => {
                        return Err(Error::Unsupported(
                            requirement.to_string(),
                        ))
                    }
                }
            }
        }

        Ok(())
    }

    fn add(&mut self, name: &str) -> Result<(), Error> {
        if !self.capabilities.contains(name) {
            return Err(Error::Unsupported(name.to_owned()));
        }

        if !self.contains(name) {
            self.names.push(name.to_owned());
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn caps(names: &[&str]) -> Capabilities {
        names.iter().copied().collect()
    }

    #[test]
    fn requirement_evaluation() {
        let c = caps(&["fileinto", "vacation"]);
        assert!(Requirement::None.is_satisfied(&c));
        assert!(Requirement::from("fileinto").is_satisfied(&c));
        assert!(!Requirement::from("body").is_satisfied(&c));
        assert!(Requirement::all(&["fileinto", "vacation"]).is_satisfied(&c));
        assert!(!Requirement::all(&["fileinto", "body"]).is_satisfied(&c));
        assert!(Requirement::any(&["body", "vacation"]).is_satisfied(&c));
        assert!(!Requirement::any(&["body", "copy"]).is_satisfied(&c));
        assert!(Requirement::all(&[]).is_satisfied(&Capabilities::new()));
        assert!(!Requirement::any(&[]).is_satisfied(&c));
    }

    #[test]
    fn accumulation_keeps_first_use_order() {
        let c = caps(&["fileinto", "vacation", "vacation-seconds", "copy"]);
        let mut acc = Requirements::new(&c);
        acc.require(&Requirement::from("fileinto")).unwrap();
        acc.require(&Requirement::any(&["body", "vacation", "vacation-seconds"]))
            .unwrap();
        acc.require(&Requirement::all(&["copy", "fileinto"])).unwrap();
        acc.require(&Requirement::None).unwrap();
        assert_eq!(&["fileinto", "vacation", "copy"], acc.names());

        assert_matches!(
            Err(Error::Unsupported(..)),
            acc.require(&Requirement::from("body"))
        );
        assert_matches!(
            Err(Error::Unsupported(..)),
            acc.require(&Requirement::any(&["body", "regex"]))
        );
        assert_eq!(3, acc.into_names().len());
    }
}
