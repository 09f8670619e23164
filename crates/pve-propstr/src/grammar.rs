// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tokenizing and assembling attribute lists.
//!
//! An attribute list is a sequence of tokens joined by [`PRIMARY_SEPARATOR`].
//! Each token is either `key=value` (split on the first
//! [`KEY_VALUE_SEPARATOR`] only, so values may contain it) or a bare
//! positional value. A positional value may only appear as the first token.
//! Whether a given record accepts one at all is decided by the record layer.

use crate::error::PropertyError;

pub const PRIMARY_SEPARATOR: char = ',';
pub const SECONDARY_SEPARATOR: char = ';';
pub const KEY_VALUE_SEPARATOR: char = '=';

/// One token of an attribute list. `key` is `None` for a positional value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub key: Option<&'a str>,
    pub value: &'a str,
}

impl<'a> Token<'a> {
    pub const fn positional(value: &'a str) -> Self {
        Self { key: None, value }
    }

    pub const fn pair(key: &'a str, value: &'a str) -> Self {
        Self { key: Some(key), value }
    }
}

/// How an attribute list was written, as observed at decode time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A lone positional value, e.g. `x86-64-v4`.
    Bare,
    /// Only `key=value` tokens, or nothing at all.
    Keyed,
    /// A leading positional value followed by `key=value` tokens.
    PositionalWithKeys,
}

impl Shape {
    pub fn of(tokens: &[Token<'_>]) -> Self {
        match tokens {
            [Token { key: None, .. }] => Shape::Bare,
            [Token { key: None, .. }, ..] => Shape::PositionalWithKeys,
            _ => Shape::Keyed,
        }
    }

    pub fn has_positional(&self) -> bool {
        !matches!(self, Shape::Keyed)
    }
}

/// Splits `input` into tokens.
///
/// Whitespace around each token, key and value is trimmed. An input that is
/// empty (or only whitespace) yields no tokens.
pub fn tokenize<'a>(
    record: &'static str,
    input: &'a str,
) -> Result<Vec<Token<'a>>, PropertyError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let malformed = |token: &str, reason| PropertyError::MalformedToken {
        record,
        token: token.to_string(),
        reason,
    };

    let mut tokens = Vec::new();
    for (idx, raw) in input.split(PRIMARY_SEPARATOR).enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(malformed(raw, "empty token"));
        }
        match raw.split_once(KEY_VALUE_SEPARATOR) {
            Some((key, value)) => {
                let key = key.trim_end();
                if key.is_empty() {
                    return Err(malformed(raw, "empty key"));
                }
                tokens.push(Token::pair(key, value.trim_start()));
            }
            None if idx == 0 => tokens.push(Token::positional(raw)),
            None => {
                return Err(malformed(
                    raw,
                    "positional value must be the first token",
                ))
            }
        }
    }
    Ok(tokens)
}

/// Joins emitted tokens back into an attribute list.
pub fn assemble<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = Token<'a>>,
{
    let mut out = String::new();
    for (idx, token) in tokens.into_iter().enumerate() {
        if idx > 0 {
            out.push(PRIMARY_SEPARATOR);
        }
        if let Some(key) = token.key {
            out.push_str(key);
            out.push(KEY_VALUE_SEPARATOR);
        }
        out.push_str(token.value);
    }
    out
}

/// Splits a secondary list value. An empty value is an empty list.
pub fn split_list(value: &str) -> Vec<&str> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(SECONDARY_SEPARATOR).map(str::trim).collect()
}

/// Joins items into a secondary list value.
pub fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (idx, item) in items.into_iter().enumerate() {
        if idx > 0 {
            out.push(SECONDARY_SEPARATOR);
        }
        out.push_str(item.as_ref());
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn tokenize_keyed_and_positional() {
        let tokens = tokenize(
            "test",
            "local-lvm:vm-2041-disk-0, discard=on,ssd=1 ,size=8G",
        )
        .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::positional("local-lvm:vm-2041-disk-0"),
                Token::pair("discard", "on"),
                Token::pair("ssd", "1"),
                Token::pair("size", "8G"),
            ]
        );
        assert_eq!(Shape::of(&tokens), Shape::PositionalWithKeys);
    }

    #[test]
    fn tokenize_splits_on_first_equals() {
        let tokens = tokenize("test", "base64=1,uuid=abc=,x==").unwrap();
        assert_eq!(tokens[1], Token::pair("uuid", "abc="));
        assert_eq!(tokens[2], Token::pair("x", "="));
    }

    #[test]
    fn tokenize_shapes() {
        let bare = tokenize("test", "x86-64-v4").unwrap();
        assert_eq!(Shape::of(&bare), Shape::Bare);
        let keyed = tokenize("test", "cputype=x86-64-v4").unwrap();
        assert_eq!(Shape::of(&keyed), Shape::Keyed);
        let empty = tokenize("test", "  ").unwrap();
        assert!(empty.is_empty());
        assert_eq!(Shape::of(&empty), Shape::Keyed);
    }

    #[test]
    fn tokenize_rejects_malformed_input() {
        let cases = [
            "a=1,,b=2",
            "a=1,",
            ",a=1",
            "=1",
            "a=1,bare",
            "first,second",
        ];
        for input in cases {
            let err = tokenize("test", input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedToken, "{:?}", input);
        }
    }

    #[test]
    fn assemble_tokens() {
        let s = assemble([
            Token::positional("x86-64-v4"),
            Token::pair("flags", "+avx;+sse"),
        ]);
        assert_eq!(s, "x86-64-v4,flags=+avx;+sse");
        assert_eq!(assemble(Vec::<Token>::new()), "");
    }

    #[test]
    fn secondary_lists() {
        assert_eq!(split_list("+avx;+sse"), ["+avx", "+sse"]);
        assert!(split_list("").is_empty());
        assert_eq!(join_list(["1", "2", "3"]), "1;2;3");
        assert_eq!(join_list(Vec::<String>::new()), "");
    }
}
