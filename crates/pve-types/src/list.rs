// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::convert::Infallible;
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! separated_list {
    ($(#[$attr:meta])* $name:ident, $sep:literal) => {
        $(#[$attr])*
        #[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
        pub struct $name(pub Vec<String>);

        impl $name {
            pub const SEPARATOR: char = $sep;

            pub fn into_inner(self) -> Vec<String> {
                self.0
            }

            fn split(s: &str) -> Self {
                if s.is_empty() {
                    return Self(Vec::new());
                }
                Self(s.split($sep).map(str::to_string).collect())
            }
        }

        impl Deref for $name {
            type Target = [String];
            fn deref(&self) -> &[String] {
                &self.0
            }
        }

        impl From<Vec<String>> for $name {
            fn from(items: Vec<String>) -> Self {
                Self(items)
            }
        }

        impl FromStr for $name {
            type Err = Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::split(s))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut sep = [0u8; 4];
                f.write_str(&self.0.join(&*$sep.encode_utf8(&mut sep)))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'d> Deserialize<'d> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'d>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::split(&s))
            }
        }
    };
}

separated_list!(
    /// A list of strings joined by commas into one value.
    CommaSeparatedList,
    ','
);

separated_list!(
    /// A list of strings joined by newlines into one value.
    LineBreakSeparatedList,
    '\n'
);
