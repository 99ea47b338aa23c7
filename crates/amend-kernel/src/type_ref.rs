//! Type references.
//!
//! A `TypeRef` names a subject type or a bound template. It is a plain
//! value: a name plus zero or more type arguments, rendered and parsed in
//! the familiar `Name<Arg, Other<Inner>>` form.

use crate::error::AmendError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deepest type-argument nesting `TypeRef::parse` accepts.
pub const MAX_TYPE_DEPTH: usize = 128;

/// Identifies a type declaration, possibly applied to type arguments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    name: String,
    args: Vec<TypeRef>,
}

impl TypeRef {
    /// A non-generic type reference. The name is taken as given; use
    /// [`TypeRef::try_named`] for names from outside the program.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A type reference applied to `args`.
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Like [`TypeRef::named`], rejecting names that would not survive the
    /// display form.
    pub fn try_named(name: impl Into<String>) -> Result<Self, AmendError> {
        Self::try_generic(name, Vec::new())
    }

    /// Like [`TypeRef::generic`], rejecting names that would not survive the
    /// display form.
    pub fn try_generic(name: impl Into<String>, args: Vec<TypeRef>) -> Result<Self, AmendError> {
        let ty = Self::generic(name, args);
        ty.validate()?;
        Ok(ty)
    }

    /// Check that every name in this reference is non-empty and free of
    /// whitespace and `<`, `>`, `,`, and that nesting stays within
    /// [`MAX_TYPE_DEPTH`], so that parsing the display form gives back an
    /// equal value.
    pub fn validate(&self) -> Result<(), AmendError> {
        let mut pending = vec![(self, 0)];
        while let Some((ty, depth)) = pending.pop() {
            if ty.name.is_empty() || ty.name.contains(is_delimiter) {
                return Err(self.invalid(format!("`{}` is not a valid type name", ty.name)));
            }
            if ty.is_generic() && depth == MAX_TYPE_DEPTH {
                return Err(self.invalid("type nesting too deep".to_string()));
            }
            pending.extend(ty.args.iter().map(|arg| (arg, depth + 1)));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> AmendError {
        AmendError::InvalidTypeRef {
            input: self.to_string(),
            reason,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[TypeRef] {
        &self.args
    }

    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Parse the display form, e.g. `Map<String, List<Person>>`.
    pub fn parse(input: &str) -> Result<Self, AmendError> {
        let mut cursor = Cursor {
            input,
            pos: 0,
            depth: 0,
        };
        let parsed = cursor.type_ref()?;
        cursor.skip_ws();
        if cursor.pos != input.len() {
            return Err(cursor.error("unexpected trailing input"));
        }
        Ok(parsed)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = AmendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = AmendError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '<' | '>' | ',')
}

struct Cursor<'s> {
    input: &'s str,
    pos: usize,
    depth: usize,
}

impl<'s> Cursor<'s> {
    fn rest(&self) -> &'s str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn name(&mut self) -> Result<&'s str, AmendError> {
        self.skip_ws();
        let rest = self.rest();
        let end = rest
            .find(is_delimiter)
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn type_ref(&mut self) -> Result<TypeRef, AmendError> {
        let name = self.name()?;
        let mut args = Vec::new();
        if self.eat('<') {
            if self.depth == MAX_TYPE_DEPTH {
                return Err(self.error("type nesting too deep"));
            }
            self.depth += 1;
            loop {
                args.push(self.type_ref()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected `,` or `>`"));
            }
            self.depth -= 1;
        }
        Ok(TypeRef::generic(name, args))
    }

    fn error(&self, reason: &str) -> AmendError {
        AmendError::InvalidTypeRef {
            input: self.input.to_string(),
            reason: format!("{reason} at byte {}", self.pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested_generics() {
        let parsed = TypeRef::parse(" Map< String ,List<Person>> ").unwrap();
        assert_eq!(
            parsed,
            TypeRef::generic(
                "Map",
                vec![
                    TypeRef::named("String"),
                    TypeRef::generic("List", vec![TypeRef::named("Person")]),
                ],
            )
        );
        assert_eq!(parsed.to_string(), "Map<String, List<Person>>");
        assert!(parsed.is_generic());
    }

    #[test]
    fn qualified_names_are_single_segments() {
        let parsed: TypeRef = "app::model::Person".parse().unwrap();
        assert_eq!(parsed.name(), "app::model::Person");
        assert!(!parsed.is_generic());
    }

    #[test]
    fn malformed_references_are_rejected() {
        for input in ["", "Foo<>", "Foo<Bar", "Foo<Bar>>", "Foo Bar", "<Bar>"] {
            let err = TypeRef::parse(input).unwrap_err();
            assert!(
                matches!(err, AmendError::InvalidTypeRef { .. }),
                "expected InvalidTypeRef for {input:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let deep = format!("{}X{}", "A<".repeat(10_000), ">".repeat(10_000));
        let err = TypeRef::parse(&deep).unwrap_err();
        assert!(
            matches!(
                &err,
                AmendError::InvalidTypeRef { reason, .. } if reason.contains("too deep")
            ),
            "unexpected error: {err:?}"
        );

        let at_limit = format!(
            "{}X{}",
            "A<".repeat(MAX_TYPE_DEPTH),
            ">".repeat(MAX_TYPE_DEPTH)
        );
        assert!(TypeRef::parse(&at_limit).is_ok());
    }

    #[test]
    fn delimiter_names_are_rejected_by_checked_constructors() {
        for name in ["", "Foo<Bar>", "A B", "Foo,Bar", "Foo>", "\tTab"] {
            assert!(
                matches!(
                    TypeRef::try_named(name),
                    Err(AmendError::InvalidTypeRef { .. })
                ),
                "expected {name:?} to be rejected"
            );
            // The unchecked form would not survive its own display string.
            let unchecked = TypeRef::named(name);
            assert!(unchecked.validate().is_err());
            assert_ne!(TypeRef::parse(&unchecked.to_string()).ok(), Some(unchecked));
        }

        let too_deep = (0..=MAX_TYPE_DEPTH).fold(TypeRef::named("X"), |inner, _| {
            TypeRef::generic("A", vec![inner])
        });
        assert!(too_deep.validate().is_err());

        let nested = TypeRef::generic("List", vec![TypeRef::named("Foo<Bar>")]);
        assert!(nested.validate().is_err());
        assert!(TypeRef::try_generic("List", vec![TypeRef::named("Person")]).is_ok());
    }

    #[test]
    fn checked_references_round_trip_through_serde() {
        for ty in [
            TypeRef::try_named("Person").unwrap(),
            TypeRef::try_named("app::model::Person").unwrap(),
            TypeRef::try_generic(
                "Map",
                vec![
                    TypeRef::try_named("String").unwrap(),
                    TypeRef::try_generic("List", vec![TypeRef::try_named("Person").unwrap()])
                        .unwrap(),
                ],
            )
            .unwrap(),
        ] {
            let json = serde_json::to_string(&ty).unwrap();
            let back: TypeRef = serde_json::from_str(&json).unwrap();
            assert_eq!(back, ty);
        }
    }

    #[test]
    fn serializes_as_display_string() {
        let ty = TypeRef::generic("Notify", vec![TypeRef::named("Person")]);
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json, serde_json::json!("Notify<Person>"));
        let back: TypeRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, ty);
    }
}
