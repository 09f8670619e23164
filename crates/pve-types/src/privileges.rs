// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A set of privilege names.
///
/// The API returns privileges either as a comma-joined string or as an object
/// whose keys are privilege names and whose values mark membership. Both forms
/// are accepted; the object form (with every member mapped to `1`) is always
/// produced.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Privileges(pub BTreeSet<String>);

impl Privileges {
    pub fn contains(&self, privilege: &str) -> bool {
        self.0.contains(privilege)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Privileges {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Privileges {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for privilege in &self.0 {
            map.serialize_entry(privilege, &1u8)?;
        }
        map.end()
    }
}

/// Membership marker in the object form.
struct Member(bool);

struct MemberVisitor;

impl<'de> de::Visitor<'de> for MemberVisitor {
    type Value = Member;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a privilege membership flag")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Member(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Member(v >= 1))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Member(v >= 1))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Member(v >= 1.0))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Member(v == "1" || v == "true"))
    }
}

impl<'d> Deserialize<'d> for Member {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        deserializer.deserialize_any(MemberVisitor)
    }
}

struct PrivilegesVisitor;

impl<'de> de::Visitor<'de> for PrivilegesVisitor {
    type Value = Privileges;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a comma-separated string or an object of privileges")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.split(',').map(str::trim).filter(|p| !p.is_empty()).collect())
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut privileges = BTreeSet::new();
        while let Some((name, member)) = map.next_entry::<String, Member>()? {
            if member.0 {
                privileges.insert(name);
            }
        }
        Ok(Privileges(privileges))
    }
}

impl<'d> Deserialize<'d> for Privileges {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        deserializer.deserialize_any(PrivilegesVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_test::{assert_de_tokens, assert_tokens, Token};

    #[test]
    fn privileges_encode_as_object() {
        let privileges: Privileges =
            ["VM.Audit", "Datastore.Allocate"].into_iter().collect();
        assert_tokens(
            &privileges,
            &[
                Token::Map { len: Some(2) },
                Token::Str("Datastore.Allocate"),
                Token::U8(1),
                Token::Str("VM.Audit"),
                Token::U8(1),
                Token::MapEnd,
            ],
        );
    }

    #[test]
    fn privileges_decode_from_string() {
        let expected: Privileges =
            ["VM.Audit", "VM.Console"].into_iter().collect();
        assert_de_tokens(&expected, &[Token::Str("VM.Audit,VM.Console")]);
        assert_de_tokens(&Privileges::default(), &[Token::Str("")]);
    }

    #[test]
    fn privileges_decode_truthy_members() {
        let expected: Privileges =
            ["Sys.Audit", "VM.Monitor"].into_iter().collect();
        assert_de_tokens(
            &expected,
            &[
                Token::Map { len: Some(4) },
                Token::Str("Sys.Audit"),
                Token::U64(1),
                Token::Str("Sys.Modify"),
                Token::U64(0),
                Token::Str("VM.Monitor"),
                Token::Bool(true),
                Token::Str("VM.PowerMgmt"),
                Token::Str("0"),
                Token::MapEnd,
            ],
        );
    }

    #[test]
    fn privileges_from_json() {
        let parsed: Privileges =
            serde_json::from_str(r#"{"VM.Audit": 1, "VM.Backup": 0}"#).unwrap();
        assert!(parsed.contains("VM.Audit"));
        assert!(!parsed.contains("VM.Backup"));
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#"{"VM.Audit":1}"#
        );
    }
}
