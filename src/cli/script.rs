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

//! The subcommands which operate on scripts.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use log::info;
use tempfile::NamedTempFile;

use super::main::{CheckSubcommand, FormatSubcommand, InputOptions};
use crate::dom::Document;
use crate::grammar::Grammar;
use crate::support::error::Error;
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

fn is_stdio(path: &Path) -> bool {
    path == Path::new("-")
}

fn read_input(path: &Path) -> Result<String, io::Error> {
    let mut text = String::new();
    if is_stdio(path) {
        io::stdin().read_to_string(&mut text)?;
    } else {
        fs::File::open(path)?.read_to_string(&mut text)?;
    }
    Ok(text)
}

fn name(path: &Path) -> String {
    if is_stdio(path) {
        "<stdin>".to_owned()
    } else {
        path.display().to_string()
    }
}

/// Read and parse the script at `path`, exiting on failure.
fn load(grammar: Arc<Grammar>, path: &Path) -> Document {
    let text = match read_input(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading '{}': {}", name(path), e);
            EX_NOINPUT.exit()
        }
    };

    let mut doc = match Document::new(grammar) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Internal error: {}", e);
            EX_SOFTWARE.exit()
        }
    };

    if let Err(e) = doc.parse_script(&text) {
        eprintln!("{}: {}", name(path), e);
        EX_DATAERR.exit()
    }
    doc
}

pub(super) fn check(grammar: Grammar, cmd: CheckSubcommand) {
    let grammar = Arc::new(grammar);
    let mut failed = 0;

    for path in &cmd.inputs {
        let result = read_input(path).map_err(Error::from).and_then(|text| {
            let mut doc = Document::new(Arc::clone(&grammar))?;
            doc.parse_script(&text)?;
            Ok(doc)
        });

        match result {
            Ok(doc) => info!("{}: OK, {} nodes", name(path), doc.len()),
            Err(e) => {
                eprintln!("{}: {}", name(path), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} scripts invalid", failed, cmd.inputs.len());
        EX_DATAERR.exit();
    }
}

pub(super) fn format(
    grammar: Grammar,
    config: &SystemConfig,
    cmd: FormatSubcommand,
) {
    let path = &cmd.input.input;
    let mut doc = load(Arc::new(grammar), path);
    let mut text = match doc.serialize_script() {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}: {}", name(path), e);
            EX_DATAERR.exit()
        }
    };

    if config.output.trailing_newline
        && !text.is_empty()
        && !text.ends_with("\r\n")
    {
        text.push_str("\r\n");
    }

    if !cmd.in_place || is_stdio(path) {
        if let Err(e) = io::stdout().write_all(text.as_bytes()) {
            eprintln!("Error writing output: {}", e);
            EX_IOERR.exit();
        }
        return;
    }

    if let Err(e) = replace_file(path, &text) {
        eprintln!("Error writing '{}': {}", path.display(), e);
        EX_CANTCREAT.exit();
    }
    info!("Rewrote '{}'", path.display());
}

/// Atomically replace the content of `path` with `text`.
fn replace_file(path: &Path, text: &str) -> Result<(), io::Error> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Ok(md) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), md.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub(super) fn requires(grammar: Grammar, cmd: InputOptions) {
    let doc = load(Arc::new(grammar), &cmd.input);
    match doc.required_capabilities() {
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", name(&cmd.input), e);
            EX_DATAERR.exit()
        }
    }
}

pub(super) fn capabilities(grammar: &Grammar) {
    for name in grammar.known_capabilities() {
        let mark = if grammar.capabilities().contains(name) {
            '*'
        } else {
            ' '
        };
        println!("{} {}", mark, name);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn replace_file_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("filter.sieve");
        fs::write(&path, "keep;\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        replace_file(&path, "keep;\r\n").unwrap();
        assert_eq!("keep;\r\n", fs::read_to_string(&path).unwrap());
        assert_eq!(
            0o640,
            fs::metadata(&path).unwrap().permissions().mode() & 0o777
        );
        // No temporary files left behind
        assert_eq!(1, fs::read_dir(dir.path()).unwrap().count());
    }

    #[test]
    fn stdio_path() {
        assert!(is_stdio(Path::new("-")));
        assert!(!is_stdio(Path::new("./-")));
        assert_eq!("<stdin>", name(Path::new("-")));
    }
}
