//! Declared member types of the host surface.
//!
//! A [`DeclaredType`] is the statically registered stand-in for a reflected
//! property, parameter or return type. Type expressions are written the way
//! host catalogs spell them:
//!
//! ```text
//! Person                  -> Reference("Person")
//! Queryable<Person>       -> Queryable(Reference("Person"))
//! Collection<Int32>       -> Collection(Primitive(Int32))
//! Map<String, Person>     -> Generic { name: "Map", args: [...] }
//! void                    -> Void
//! ```

use std::collections::HashMap;
use std::fmt;

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, opt, recognize},
    error::ParseError,
    multi::separated_list1,
    sequence::{delimited, pair},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};

use super::errors::{ModelCatalogError, ModelCatalogResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    String,
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    Guid,
    Binary,
    Date,
    DateTimeOffset,
    TimeOfDay,
    Duration,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "String",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::SByte => "SByte",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::Single => "Single",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::Guid => "Guid",
            PrimitiveKind::Binary => "Binary",
            PrimitiveKind::Date => "Date",
            PrimitiveKind::DateTimeOffset => "DateTimeOffset",
            PrimitiveKind::TimeOfDay => "TimeOfDay",
            PrimitiveKind::Duration => "Duration",
        }
    }

    /// Look up a primitive by canonical name or common alias
    pub fn lookup(name: &str) -> Option<PrimitiveKind> {
        PRIMITIVE_TYPES.get(name).copied()
    }
}

// Static primitive name table (canonical names plus host-language aliases)
lazy_static::lazy_static! {
    static ref PRIMITIVE_TYPES: HashMap<&'static str, PrimitiveKind> = {
        let mut m = HashMap::new();
        for kind in [
            PrimitiveKind::String,
            PrimitiveKind::Boolean,
            PrimitiveKind::Byte,
            PrimitiveKind::SByte,
            PrimitiveKind::Int16,
            PrimitiveKind::Int32,
            PrimitiveKind::Int64,
            PrimitiveKind::Single,
            PrimitiveKind::Double,
            PrimitiveKind::Decimal,
            PrimitiveKind::Guid,
            PrimitiveKind::Binary,
            PrimitiveKind::Date,
            PrimitiveKind::DateTimeOffset,
            PrimitiveKind::TimeOfDay,
            PrimitiveKind::Duration,
        ] {
            m.insert(kind.name(), kind);
        }

        m.insert("string", PrimitiveKind::String);
        m.insert("bool", PrimitiveKind::Boolean);
        m.insert("byte", PrimitiveKind::Byte);
        m.insert("sbyte", PrimitiveKind::SByte);
        m.insert("short", PrimitiveKind::Int16);
        m.insert("int", PrimitiveKind::Int32);
        m.insert("long", PrimitiveKind::Int64);
        m.insert("float", PrimitiveKind::Single);
        m.insert("double", PrimitiveKind::Double);
        m.insert("decimal", PrimitiveKind::Decimal);
        m.insert("TimeSpan", PrimitiveKind::Duration);
        m.insert("Bytes", PrimitiveKind::Binary);
        m
    };
}

const QUERYABLE_NAMES: &[&str] = &["Queryable", "IQueryable"];
const COLLECTION_NAMES: &[&str] = &[
    "Collection",
    "ICollection",
    "IEnumerable",
    "IList",
    "List",
    "Sequence",
    "Vec",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeclaredType {
    Void,
    Primitive(PrimitiveKind),
    /// A non-generic reference (class) type
    Reference(String),
    /// A queryable sequence; the only shape that makes a property an entity-set candidate
    Queryable(Box<DeclaredType>),
    /// An in-memory sequence
    Collection(Box<DeclaredType>),
    Generic {
        name: String,
        args: Vec<DeclaredType>,
    },
}

impl DeclaredType {
    pub fn parse(expression: &str) -> ModelCatalogResult<DeclaredType> {
        all_consuming(ws(type_expr))
            .parse(expression)
            .map(|(_, declared)| declared)
            .map_err(|e| ModelCatalogError::InvalidTypeExpression {
                expression: expression.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn reference(name: impl Into<String>) -> Self {
        DeclaredType::Reference(name.into())
    }

    pub fn queryable_of(name: impl Into<String>) -> Self {
        DeclaredType::Queryable(Box::new(DeclaredType::Reference(name.into())))
    }

    pub fn collection_of(element: DeclaredType) -> Self {
        DeclaredType::Collection(Box::new(element))
    }

    fn from_parts(name: &str, args: Option<Vec<DeclaredType>>) -> Self {
        match args {
            None => {
                if name.eq_ignore_ascii_case("void") {
                    DeclaredType::Void
                } else if let Some(kind) = PrimitiveKind::lookup(name) {
                    DeclaredType::Primitive(kind)
                } else {
                    DeclaredType::Reference(name.to_string())
                }
            }
            Some(mut args) => {
                if args.len() == 1 && QUERYABLE_NAMES.contains(&name) {
                    DeclaredType::Queryable(Box::new(args.remove(0)))
                } else if args.len() == 1 && COLLECTION_NAMES.contains(&name) {
                    DeclaredType::Collection(Box::new(args.remove(0)))
                } else {
                    DeclaredType::Generic {
                        name: name.to_string(),
                        args,
                    }
                }
            }
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, DeclaredType::Void)
    }

    /// Element type when this is a sequence (queryable or in-memory)
    pub fn sequence_element(&self) -> Option<&DeclaredType> {
        match self {
            DeclaredType::Queryable(element) | DeclaredType::Collection(element) => Some(element),
            _ => None,
        }
    }

    pub fn queryable_element(&self) -> Option<&DeclaredType> {
        match self {
            DeclaredType::Queryable(element) => Some(element),
            _ => None,
        }
    }

    /// Name of a non-generic reference type
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            DeclaredType::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// The element type for sequences, the type itself otherwise
    pub fn element_or_self(&self) -> &DeclaredType {
        self.sequence_element().unwrap_or(self)
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Void => f.write_str("void"),
            DeclaredType::Primitive(kind) => f.write_str(kind.name()),
            DeclaredType::Reference(name) => f.write_str(name),
            DeclaredType::Queryable(element) => write!(f, "Queryable<{}>", element),
            DeclaredType::Collection(element) => write!(f, "Collection<{}>", element),
            DeclaredType::Generic { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}<{}>", name, args.join(", "))
            }
        }
    }
}

impl TryFrom<String> for DeclaredType {
    type Error = ModelCatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DeclaredType::parse(&value)
    }
}

impl From<DeclaredType> for String {
    fn from(value: DeclaredType) -> Self {
        value.to_string()
    }
}

fn ws<'a, O, E: ParseError<&'a str>, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
{
    delimited(multispace0, inner, multispace0)
}

// Dotted identifiers are allowed so catalogs can spell qualified names.
fn type_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    ))
    .parse(input)
}

fn type_expr(input: &str) -> IResult<&str, DeclaredType> {
    let (input, name) = ws(type_name).parse(input)?;
    let (input, args) = opt(delimited(
        ws(char('<')),
        separated_list1(ws(char(',')), type_expr),
        ws(char('>')),
    ))
    .parse(input)?;
    Ok((input, DeclaredType::from_parts(name, args)))
}
