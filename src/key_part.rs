//! Heterogeneous key components.

use core::hash::{Hash, Hasher};
use std::collections::BTreeMap;

/// One component of a composite key.
///
/// Components compare and hash structurally: two lists are equal when
/// their elements are equal in order, two maps when they hold the same
/// fields regardless of the order they were built in. Numbers keep their
/// kind, so `Int(1)` and `Float(1.0)` are different components.
///
/// Floats are canonicalized before comparison: `-0.0` equals `0.0` and
/// every NaN equals every other NaN, which keeps `Eq` and `Hash` lawful.
#[derive(Clone, Debug)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<KeyPart>),
    Map(BTreeMap<String, KeyPart>),
}

impl KeyPart {
    /// Build a list component from anything convertible into parts.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<KeyPart>,
    {
        KeyPart::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map component from `(field, value)` pairs. A repeated field
    /// keeps its last value.
    pub fn map<I, S, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<KeyPart>,
    {
        KeyPart::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, KeyPart::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyPart::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            KeyPart::Int(n) => Some(*n),
            _ => None,
        }
    }
}

#[inline]
fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyPart::Null, KeyPart::Null) => true,
            (KeyPart::Bool(a), KeyPart::Bool(b)) => a == b,
            (KeyPart::Int(a), KeyPart::Int(b)) => a == b,
            (KeyPart::Float(a), KeyPart::Float(b)) => float_bits(*a) == float_bits(*b),
            (KeyPart::Str(a), KeyPart::Str(b)) => a == b,
            (KeyPart::List(a), KeyPart::List(b)) => a == b,
            (KeyPart::Map(a), KeyPart::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyPart {}

impl Hash for KeyPart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            KeyPart::Null => {}
            KeyPart::Bool(b) => b.hash(state),
            KeyPart::Int(n) => n.hash(state),
            KeyPart::Float(f) => float_bits(*f).hash(state),
            KeyPart::Str(s) => s.hash(state),
            KeyPart::List(items) => items.hash(state),
            // BTreeMap iterates in field order, so build order is irrelevant.
            KeyPart::Map(fields) => fields.hash(state),
        }
    }
}

impl From<()> for KeyPart {
    fn from(_: ()) -> Self {
        KeyPart::Null
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        KeyPart::Bool(b)
    }
}

macro_rules! int_parts {
    ($($t:ty),*) => {
        $(impl From<$t> for KeyPart {
            fn from(n: $t) -> Self {
                KeyPart::Int(i64::from(n))
            }
        })*
    };
}

int_parts!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for KeyPart {
    fn from(f: f32) -> Self {
        KeyPart::Float(f64::from(f))
    }
}

impl From<f64> for KeyPart {
    fn from(f: f64) -> Self {
        KeyPart::Float(f)
    }
}

impl From<char> for KeyPart {
    fn from(c: char) -> Self {
        KeyPart::Str(c.to_string())
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.to_owned())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s)
    }
}

impl From<&String> for KeyPart {
    fn from(s: &String) -> Self {
        KeyPart::Str(s.clone())
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(o: Option<T>) -> Self {
        o.map_or(KeyPart::Null, Into::into)
    }
}

impl<T: Into<KeyPart>> From<Vec<T>> for KeyPart {
    fn from(items: Vec<T>) -> Self {
        KeyPart::list(items)
    }
}

impl<S: Into<String>, T: Into<KeyPart>> From<BTreeMap<S, T>> for KeyPart {
    fn from(fields: BTreeMap<S, T>) -> Self {
        KeyPart::map(fields)
    }
}

/// Build a `Vec<KeyPart>` key tuple from heterogeneous expressions.
///
/// ```
/// use multikey_map::{keys, KeyPart};
///
/// let k = keys![1, "two", 3.0, KeyPart::map([("foo", "bar")])];
/// assert_eq!(k.len(), 4);
/// assert_eq!(k[1], KeyPart::from("two"));
/// ```
#[macro_export]
macro_rules! keys {
    () => {
        ::std::vec::Vec::<$crate::KeyPart>::new()
    };
    ($($part:expr),+ $(,)?) => {
        ::std::vec![$($crate::KeyPart::from($part)),+]
    };
}
