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

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{warn, LevelFilter};
use structopt::StructOpt;

use crate::grammar::capabilities::Capabilities;
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

/// Check and rewrite Sieve mail filtering scripts.
///
/// Scripts are parsed against the set of extensions supported by the target
/// server, which is read from `sievedit.toml` in the current directory
/// unless `--config` is given, and may be extended on the command line.
#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
pub(super) struct Options {
    /// The configuration file [default: sievedit.toml, if it exists]
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Enable this extension in addition to those configured. Can be passed
    /// multiple times.
    #[structopt(short = "C", long, number_of_values(1))]
    capability: Vec<String>,

    /// Enable every extension the grammar knows about.
    #[structopt(long)]
    all_capabilities: bool,

    /// Log debugging details to standard error.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub(super) enum Command {
    /// Parse scripts and report the first error in each.
    ///
    /// Exits with EX_DATAERR if any script is invalid.
    Check(CheckSubcommand),
    /// Parse a script and write it back out.
    ///
    /// The output is identical to the input except that line endings are
    /// normalised to CRLF, and a `require` is added for each extension the
    /// script uses without requiring it.
    Format(FormatSubcommand),
    /// List the extensions a script uses.
    Requires(InputOptions),
    /// List the extensions the grammar knows about.
    ///
    /// Enabled extensions are marked with `*`.
    Capabilities,
}

#[derive(StructOpt)]
pub(super) struct CheckSubcommand {
    /// The scripts to check. "-" reads from stdin.
    #[structopt(parse(from_os_str), default_value = "-")]
    pub(super) inputs: Vec<PathBuf>,
}

#[derive(StructOpt)]
pub(super) struct FormatSubcommand {
    /// Replace the input file instead of writing to standard output.
    #[structopt(short, long)]
    pub(super) in_place: bool,

    #[structopt(flatten)]
    pub(super) input: InputOptions,
}

#[derive(StructOpt)]
pub(super) struct InputOptions {
    /// The script to read. "-" reads from stdin.
    #[structopt(parse(from_os_str), default_value = "-")]
    pub(super) input: PathBuf,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let options = Options::from_clap(&match Options::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    let config_path = options
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("sievedit.toml"));
    let system_config = load_config(&config_path, options.config.is_some());
    init_logging(&config_path, options.verbose);

    let known = crate::sieve::grammar(Capabilities::new())
        .known_capabilities()
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let mut capability_config = system_config.capabilities.clone();
    capability_config.all |= options.all_capabilities;
    let capabilities = match capability_config
        .resolve(known.iter().map(String::as_str), &options.capability)
    {
        Ok(capabilities) => capabilities,
        Err(e) => {
            eprintln!("{}", e);
            EX_USAGE.exit()
        }
    };
    let unknown = capabilities
        .iter()
        .filter(|&name| !known.iter().any(|k| k == name))
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        warn!(
            "Extensions not understood by this program: {}",
            unknown.join(", ")
        );
    }

    let grammar = crate::sieve::grammar(capabilities);
    match options.command {
        Command::Check(cmd) => super::script::check(grammar, cmd),
        Command::Format(cmd) => {
            super::script::format(grammar, &system_config, cmd)
        }
        Command::Requires(cmd) => super::script::requires(grammar, cmd),
        Command::Capabilities => super::script::capabilities(&grammar),
    }
}

fn load_config(path: &Path, explicit: bool) -> SystemConfig {
    if !explicit && !path.is_file() {
        return SystemConfig::default();
    }

    let mut toml = Vec::new();
    if let Err(e) =
        fs::File::open(path).and_then(|mut f| f.read_to_end(&mut toml))
    {
        eprintln!("Error reading '{}': {}", path.display(), e);
        EX_CONFIG.exit();
    }

    match SystemConfig::parse(&toml) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error in config file at '{}': {}", path.display(), e);
            EX_CONFIG.exit()
        }
    }
}

fn init_logging(config_path: &Path, verbose: u8) {
    let log_config_file = config_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("logging.toml");
    if log_config_file.is_file() {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::file::Deserializers::new(),
        ) {
            eprintln!(
                "Failed to initialise logging from '{}': {}",
                log_config_file.display(),
                e
            );
            EX_CONFIG.exit();
        }
        return;
    }

    let level = if verbose > 0 {
        LevelFilter::Debug
    } else if Ok(true) == nix::unistd::isatty(2) {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    crate::init_simple_log(level);
}
