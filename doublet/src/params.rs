// vim: tw=80
//! Argument patterns and their diagnostic rendering.
//!
//! A [`Method`](crate::Method) is generic over its input type, which must
//! implement [`Params`].  The input type is used twice: once as the actual
//! arguments of each call, and once as the pattern of a
//! [`Method::on`](crate::Method::on) setup.  Tuples of up to five
//! `PartialEq + Debug` fields implement it out of the box.
use std::fmt::{self, Debug, Display};

/// The pattern capability consumed by [`Setup`](crate::Setup).
///
/// # Examples
///
/// A hand-rolled implementation that ignores letter case:
/// ```
/// # use doublet::*;
/// #[derive(Clone)]
/// struct Name(String);
///
/// impl Params for Name {
///     fn matches(&self, actual: &Self) -> bool {
///         self.0.eq_ignore_ascii_case(&actual.0)
///     }
///
///     fn values(&self) -> Vec<Arg> {
///         vec![Arg::new(&self.0)]
///     }
/// }
///
/// let greet = Method::<Name, u32>::new();
/// greet.on(Name("ALICE".to_owned())).return_const(1);
/// assert_eq!(1, greet.receive(Name("alice".to_owned())));
/// ```
pub trait Params {
    /// Does this pattern match `actual`, a value of the same shape?
    fn matches(&self, actual: &Self) -> bool;

    /// Render each component, in order, for error messages.
    fn values(&self) -> Vec<Arg>;
}

/// One rendered component of a [`Params`] value.
///
/// Displays as `<value> (<type>)`, where the value is the `Debug` rendering
/// and the type has its module path removed.  String values (`str`, `String`
/// and references to them) drop the surrounding quotes, so `"apples"` reads
/// `apples (&str)`.  Escapes are kept, which keeps every value on one line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Arg {
    value: String,
    type_name: String,
}

impl Arg {
    pub fn new<T: Debug + ?Sized>(value: &T) -> Self {
        let type_name = short_type_name(std::any::type_name::<T>());
        let mut value = format!("{value:?}");
        if is_string(&type_name) && value.len() >= 2 &&
            value.starts_with('"') && value.ends_with('"')
        {
            value = value[1..value.len() - 1].to_owned();
        }
        Arg { value, type_name }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.type_name)
    }
}

/// Join rendered values the way strict-mode messages print them.
///
/// ```
/// # use doublet::*;
/// let args = ("apples", 4u32).values();
/// assert_eq!("apples (&str); 4 (u32)", format_values(&args));
/// ```
pub fn format_values(args: &[Arg]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn is_string(type_name: &str) -> bool {
    let bare = type_name.trim_start_matches(|c| c == '&' || c == ' ')
        .trim_start_matches("mut ")
        .trim_start_matches(|c| c == '&' || c == ' ');
    matches!(bare, "str" | "String")
}

/// Strip module paths from every path segment of a type name, so that
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            let keep = out.char_indices()
                .rev()
                .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
                .map_or(0, |(i, c)| i + c.len_utf8());
            out.truncate(keep);
        } else {
            out.push(c);
        }
    }
    out
}

impl Params for () {
    fn matches(&self, _actual: &Self) -> bool {
        true
    }

    fn values(&self) -> Vec<Arg> {
        Vec::new()
    }
}

macro_rules! params_tuple {
    ($( $t:ident $idx:tt ),+) => {
        impl<$( $t, )+> Params for ($( $t, )+)
            where $( $t: PartialEq + Debug, )+
        {
            fn matches(&self, actual: &Self) -> bool {
                $( self.$idx == actual.$idx )&&+
            }

            fn values(&self) -> Vec<Arg> {
                vec![$( Arg::new(&self.$idx), )+]
            }
        }
    }
}

params_tuple!{A 0}
params_tuple!{A 0, B 1}
params_tuple!{A 0, B 1, C 2}
params_tuple!{A 0, B 1, C 2, D 3}
params_tuple!{A 0, B 1, C 2, D 3, E 4}
