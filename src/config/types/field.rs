//! Type-safe config field path.

use owo_colors::OwoColorize;
use std::fmt;

/// A config field path such as `links.fallback`.
///
/// Section structs expose their paths through a `FIELDS` constant generated
/// by [`config_fields!`](crate::config::config_fields), so diagnostics never
/// spell a path by hand.
///
/// # Example
///
/// ```ignore
/// config_fields!(LinksConfig => LinksFields, "links" { fallback, patterns });
///
/// diag.error(LinksConfig::FIELDS.fallback, "must start with `/`");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}

/// Generate a `FIELDS` constant of [`FieldPath`]s for a section struct.
macro_rules! config_fields {
    ($config:ty => $fields:ident, $section:literal { $($field:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $fields {
            $(pub $field: $crate::config::FieldPath,)*
        }

        impl $config {
            pub const FIELDS: $fields = $fields {
                $($field: $crate::config::FieldPath::new(concat!($section, ".", stringify!($field))),)*
            };
        }
    };
}

pub(crate) use config_fields;
