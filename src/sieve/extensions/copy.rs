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

//! RFC 3894 `copy`.

use crate::grammar::rule::{slot, Property, Rule};
use crate::grammar::GrammarBuilder;

pub const COPY: &str = "tag/copy";

pub fn register(builder: &mut GrammarBuilder) {
    builder.add(Rule::tag(COPY, "copy/", ":copy").requires("copy"));
    for &node in &["action/redirect", "action/fileinto"] {
        builder.extend(node, Property::tags("tags", vec![slot("copy", COPY)]));
    }
}
