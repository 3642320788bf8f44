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

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::Error;
use crate::grammar::capabilities::Capabilities;

lazy_static! {
    static ref RX_CAPABILITY: Regex =
        Regex::new("^[A-Za-z0-9][A-Za-z0-9._;:-]*$").unwrap();
}

/// The configuration for the `sievedit` command.
///
/// This is stored in a TOML file, by default `sievedit.toml` in the current
/// directory.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct SystemConfig {
    /// Which Sieve extensions the target server supports.
    #[serde(default)]
    pub capabilities: CapabilityConfig,

    /// Options controlling how rewritten scripts are written out.
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CapabilityConfig {
    /// If true, every extension the grammar knows about is enabled, and
    /// `enabled` is ignored.
    ///
    /// This is useful for checking scripts without knowing anything about
    /// the server they will be uploaded to.
    #[serde(default)]
    pub all: bool,
    /// The extensions advertised by the server, exactly as they appear in
    /// its `SIEVE` capability string (e.g. `"fileinto"`, `"vacation"`).
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Extensions to remove from the set produced by `all` or `enabled`.
    ///
    /// A script requiring one of these is rejected even if the grammar
    /// otherwise understands it.
    #[serde(default)]
    pub disabled: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// If true, a rewritten script always ends with a line break.
    #[serde(default)]
    pub trailing_newline: bool,
}

impl SystemConfig {
    pub fn parse(toml: &[u8]) -> Result<Self, Error> {
        let config: SystemConfig = toml::from_slice(toml)?;
        for name in config
            .capabilities
            .enabled
            .iter()
            .chain(config.capabilities.disabled.iter())
        {
            validate_capability(name)?;
        }
        Ok(config)
    }
}

impl CapabilityConfig {
    /// Compute the effective capability set.
    ///
    /// `known` is the set of all extensions the grammar understands and
    /// `extra` are additional names given on the command line.
    pub fn resolve<'a>(
        &self,
        known: impl IntoIterator<Item = &'a str>,
        extra: &[String],
    ) -> Result<Capabilities, Error> {
        let mut capabilities = if self.all {
            known.into_iter().collect::<Capabilities>()
        } else {
            self.enabled.iter().map(String::as_str).collect()
        };

        for name in extra {
            validate_capability(name)?;
            capabilities.insert(name);
        }

        for name in &self.disabled {
            capabilities.remove(name);
        }

        Ok(capabilities)
    }
}

pub fn validate_capability(name: &str) -> Result<(), Error> {
    if RX_CAPABILITY.is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidCapabilityName(name.to_owned()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = SystemConfig::parse(
            br#"
[capabilities]
enabled = ["fileinto", "vacation", "comparator-i;ascii-numeric"]
disabled = ["vacation"]

[output]
trailing_newline = true
"#,
        )
        .unwrap();

        assert!(!config.capabilities.all);
        assert!(config.output.trailing_newline);

        let caps = config
            .capabilities
            .resolve(vec!["body", "fileinto"], &["regex".to_owned()])
            .unwrap();
        assert!(caps.contains("fileinto"));
        assert!(caps.contains("comparator-i;ascii-numeric"));
        assert!(caps.contains("regex"));
        assert!(!caps.contains("vacation"));
        assert!(!caps.contains("body"));
    }

    #[test]
    fn empty_config_is_default() {
        let config = SystemConfig::parse(b"").unwrap();
        assert!(!config.capabilities.all);
        assert!(config.capabilities.enabled.is_empty());
        assert!(!config.output.trailing_newline);
    }

    #[test]
    fn all_capabilities_minus_disabled() {
        let config = SystemConfig::parse(
            b"[capabilities]\nall = true\ndisabled = [\"body\"]\n",
        )
        .unwrap();
        let caps = config
            .capabilities
            .resolve(vec!["body", "fileinto", "copy"], &[])
            .unwrap();
        assert_eq!(2, caps.len());
        assert!(caps.contains("copy"));
        assert!(!caps.contains("body"));
    }

    #[test]
    fn invalid_capability_names_rejected() {
        assert_matches!(
            Err(Error::InvalidCapabilityName(..)),
            SystemConfig::parse(b"[capabilities]\nenabled = [\"a b\"]\n")
        );
        assert_matches!(
            Err(Error::Config(..)),
            SystemConfig::parse(b"[capabilities]\nenabled = 5\n")
        );
        assert_matches!(
            Err(Error::InvalidCapabilityName(..)),
            CapabilityConfig::default().resolve(vec![], &["\"x".to_owned()])
        );
    }
}
