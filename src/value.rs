use crate::error::GetError;

/// Strings accepted as booleans, compared case-insensitively.
const BOOL_STRINGS: &[(&str, bool)] = &[
    ("t", true),
    ("true", true),
    ("y", true),
    ("yes", true),
    ("on", true),
    ("1", true),
    ("f", false),
    ("false", false),
    ("n", false),
    ("no", false),
    ("off", false),
    ("0", false),
];

/// Conversion from a resolved option value.
pub trait FromValue: Sized {
    fn from_value(value: &str) -> Result<Self, GetError>;
}

impl FromValue for String {
    fn from_value(value: &str) -> Result<Self, GetError> {
        Ok(value.to_owned())
    }
}

impl FromValue for bool {
    fn from_value(value: &str) -> Result<Self, GetError> {
        BOOL_STRINGS
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(value))
            .map(|&(_, b)| b)
            .ok_or_else(|| invalid(value, "bool"))
    }
}

macro_rules! from_str_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &str) -> Result<Self, GetError> {
                    value.parse().map_err(|_| invalid(value, stringify!($ty)))
                }
            }
        )*
    };
}

from_str_value!(i32, i64, u32, u64, usize, f32, f64);

fn invalid(value: &str, expected: &'static str) -> GetError {
    GetError::InvalidValue {
        value: value.to_owned(),
        expected,
    }
}
