// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive wire types shared by the property-string crates.
//!
//! The management API represents a handful of scalar values in ways that do
//! not line up with their natural JSON encodings: booleans are digits, sizes
//! carry unit suffixes, lists are joined into a single string, and some
//! integers arrive quoted. The types in this crate give each of those shapes a
//! single `FromStr`/`Display` pair plus matching serde impls, so that both the
//! property-string codec and plain JSON consumers can share them.

mod list;
mod numeric;
mod privileges;
mod size;
mod timestamp;

pub use list::{CommaSeparatedList, LineBreakSeparatedList};
pub use numeric::{FlexibleInt, FlexibleIntError, NumericBool};
pub use privileges::Privileges;
pub use size::{DiskSize, ParseSizeError};
pub use timestamp::Timestamp;
