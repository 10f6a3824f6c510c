//! Internal type names and type descriptors.
//!
//! Names use the slash separated internal form (`org/demo/CalcParser`).
//! Descriptors follow the JVM grammar: `I`, `Z`, `J`, `Lpkg/Type;`,
//! `[elem`, and `(args)ret` for methods. Every value occupies one operand
//! stack slot except `J` and `D`, which occupy two.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Internal, slash separated name of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name from its internal form.
    pub fn new(internal: impl Into<String>) -> Self {
        Self(internal.into())
    }

    /// The internal (slash separated) form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last `/`, or `None` for a type in the
    /// unnamed namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rfind('/').map(|ix| &self.0[..ix])
    }

    /// The part after the last `/`.
    pub fn short_name(&self) -> &str {
        self.0.rfind('/').map_or(self.0.as_str(), |ix| &self.0[ix + 1..])
    }

    /// A type named `short` in the same namespace as `self`.
    ///
    /// Returns `None` when `self` has no namespace.
    pub fn sibling(&self, short: &str) -> Option<TypeName> {
        self.namespace().map(|ns| TypeName(format!("{ns}/{short}")))
    }

    /// The dotted form (`org.demo.CalcParser`).
    pub fn class_name(&self) -> String {
        self.0.replace('/', ".")
    }

    /// The object type descriptor (`Lorg/demo/CalcParser;`).
    pub fn descriptor(&self) -> String {
        format!("L{};", self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Stack size of a single field descriptor.
///
/// `V` is rejected here, void is only valid as a method return type.
pub fn value_size(desc: &str) -> Result<u16> {
    match parse_value(desc, desc)? {
        (size, "") => Ok(size),
        _ => Err(malformed(desc, "trailing characters after type")),
    }
}

/// A parsed method descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDesc {
    /// Stack size of each parameter, in declaration order.
    pub params: Vec<u16>,
    /// Stack size of the return value (0 for `V`).
    pub ret: u16,
}

impl MethodDesc {
    /// Parse a method descriptor such as `(ILjava/lang/String;)Z`.
    pub fn parse(desc: &str) -> Result<Self> {
        let mut rest = desc
            .strip_prefix('(')
            .ok_or_else(|| malformed(desc, "method descriptor must start with `(`"))?;

        let mut params = Vec::new();
        let mut slots = 0u16;
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            if rest.is_empty() {
                return Err(malformed(desc, "unterminated parameter list"));
            }
            let (size, after) = parse_value(rest, desc)?;
            slots = slots
                .checked_add(size)
                .ok_or_else(|| malformed(desc, "parameters exceed the slot range"))?;
            params.push(size);
            rest = after;
        }

        let ret = match rest {
            "V" => 0,
            _ => match parse_value(rest, desc)? {
                (size, "") => size,
                _ => return Err(malformed(desc, "trailing characters after return type")),
            },
        };

        Ok(Self { params, ret })
    }

    /// Total stack slots taken by the parameters.
    ///
    /// Saturates for hand-built descriptors; [`MethodDesc::parse`] rejects
    /// parameter lists that do not fit.
    pub fn param_slots(&self) -> u16 {
        self.params
            .iter()
            .fold(0u16, |total, &size| total.saturating_add(size))
    }
}

fn parse_value<'a>(input: &'a str, full: &str) -> Result<(u16, &'a str)> {
    let mut chars = input.chars();
    match chars.next() {
        Some('Z' | 'B' | 'C' | 'S' | 'I' | 'F') => Ok((1, chars.as_str())),
        Some('J' | 'D') => Ok((2, chars.as_str())),
        Some('L') => {
            let body = chars.as_str();
            match body.find(';') {
                Some(0) => Err(malformed(full, "empty object type name")),
                Some(end) => Ok((1, &body[end + 1..])),
                None => Err(malformed(full, "object type is missing its `;`")),
            }
        }
        Some('[') => {
            let (_, rest) = parse_value(chars.as_str(), full)?;
            Ok((1, rest))
        }
        Some(_) => Err(malformed(full, "unknown type character")),
        None => Err(malformed(full, "missing type")),
    }
}

pub(crate) fn malformed(desc: &str, reason: &'static str) -> Error {
    Error::MalformedDescriptor {
        desc: desc.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_and_sibling() {
        let owner = TypeName::new("org/demo/CalcParser");
        assert_eq!(owner.namespace(), Some("org/demo"));
        assert_eq!(owner.short_name(), "CalcParser");
        assert_eq!(
            owner.sibling("Action$3f2a").unwrap().as_str(),
            "org/demo/Action$3f2a"
        );
        assert_eq!(owner.class_name(), "org.demo.CalcParser");
        assert_eq!(owner.descriptor(), "Lorg/demo/CalcParser;");
    }

    #[test]
    fn test_no_namespace() {
        let owner = TypeName::new("CalcParser");
        assert!(owner.namespace().is_none());
        assert!(owner.sibling("Action$1").is_none());
    }

    #[test]
    fn test_parse_method_desc() {
        let desc = MethodDesc::parse("(ILjava/lang/String;[J)V").unwrap();
        assert_eq!(desc.params, vec![1, 1, 1]);
        assert_eq!(desc.ret, 0);

        let wide = MethodDesc::parse("(JD)J").unwrap();
        assert_eq!(wide.param_slots(), 4);
        assert_eq!(wide.ret, 2);

        let empty = MethodDesc::parse("()Lrulegen/runtime/Context;").unwrap();
        assert!(empty.params.is_empty());
        assert_eq!(empty.ret, 1);
    }

    #[test]
    fn test_parameter_slots_must_fit() {
        let narrow = format!("({})V", "I".repeat(usize::from(u16::MAX)));
        assert_eq!(MethodDesc::parse(&narrow).unwrap().param_slots(), u16::MAX);

        let wide = format!("({}J)V", "I".repeat(usize::from(u16::MAX)));
        assert!(matches!(
            MethodDesc::parse(&wide),
            Err(Error::MalformedDescriptor { reason: "parameters exceed the slot range", .. })
        ));
    }

    #[test]
    fn test_malformed_descriptors() {
        assert!(MethodDesc::parse("I)V").is_err());
        assert!(MethodDesc::parse("(I").is_err());
        assert!(MethodDesc::parse("(Ljava/lang/String)V").is_err());
        assert!(MethodDesc::parse("()ZZ").is_err());
        assert!(value_size("V").is_err());
        assert!(value_size("L;").is_err());
        assert!(value_size("II").is_err());
    }

    #[test]
    fn test_value_size() {
        assert_eq!(value_size("I").unwrap(), 1);
        assert_eq!(value_size("D").unwrap(), 2);
        assert_eq!(value_size("[[D").unwrap(), 1);
        assert_eq!(value_size("Ljava/lang/Object;").unwrap(), 1);
    }

    #[test]
    fn test_type_name_serde_is_transparent() {
        let name = TypeName::new("org/demo/CalcParser");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"org/demo/CalcParser\"");
    }
}
