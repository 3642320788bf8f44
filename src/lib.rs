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

//! Lossless parsing and rewriting of Sieve (RFC 5228) mail filtering scripts.
//!
//! A `Grammar` is built once for a set of server capabilities. A `Document`
//! parses script text into a tree of nodes against that grammar, supports
//! structural edits on the tree, and serialises it back into text which is
//! byte-for-byte identical to the input for any part that was not edited.

#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat, $actual:expr) => {
        match $actual {
            $expected => (),
            unexpected => panic!(
                "Expected {} matches {}, got {:?}",
                stringify!($expected),
                stringify!($actual),
                unexpected
            ),
        }
    };
}

#[macro_use]
pub mod grammar;
pub mod cli;
pub mod dom;
pub mod sieve;
pub mod support;

pub use crate::dom::{Document, NodeId};
pub use crate::grammar::capabilities::{Capabilities, Requirement};
pub use crate::grammar::Grammar;
pub use crate::support::error::Error;

/// Set up logging to standard error for interactive use.
///
/// `level` is the most verbose level which is written.
pub fn init_simple_log(level: log::LevelFilter) {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l} {t}: {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level));

    match config {
        // Fails only if a logger is already installed, which is fine
        Ok(config) => drop(log4rs::init_config(config)),
        Err(e) => eprintln!("Failed to configure logging: {}", e),
    }
}

#[cfg(test)]
static INIT_TEST_LOG: std::sync::Once = std::sync::Once::new();

#[cfg(test)]
fn init_test_log() {
    INIT_TEST_LOG.call_once(|| {
        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} [{}][{}] {}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message,
                ))
            })
            .level(log::LevelFilter::Debug)
            .chain(std::io::stderr())
            .apply()
            .unwrap();
    })
}
