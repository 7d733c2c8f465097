#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]

//! Read INI-style configuration files into ordered sections of raw values, and resolve
//! `%(option)s` and `${ENV}` references when values are read back.

mod error;
mod expand;
mod parser;
mod section;
mod value;

use std::collections::HashMap;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use std::{char, env, fs};

pub use crate::error::{GetError, ParseError};
pub use crate::expand::MAX_SUBSTITUTION_DEPTH;
pub use crate::parser::Parser;
pub use crate::section::Section;
pub use crate::value::FromValue;

/// Name of the section that always exists and backs `%(option)s` lookups.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Byte Order Mark (BOM) is used to signal the endianness of an encoding. The order `0xFF 0xFE`
/// strongly suggests that the encoding is using little-endian byte order.
///
/// <https://en.wikipedia.org/wiki/Byte_order_mark>
const BOM_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Sections in creation order, indexed by name.
#[derive(Debug, Clone)]
pub struct Config {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// An empty configuration holding only the `DEFAULT` section.
    #[must_use]
    pub fn new() -> Self {
        let mut config = Self {
            sections: Vec::with_capacity(8),
            index: HashMap::with_capacity(8),
        };
        config.create_section(DEFAULT_SECTION);
        config
    }

    /// Parse a configuration from raw bytes, decoding UTF-16 LE when the data starts with its
    /// byte order mark and UTF-8 otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Read`] with [`io::ErrorKind::InvalidData`] if the data is not valid
    /// in its encoding, and [`ParseError::Syntax`] for the first line that is neither a comment,
    /// a section header, an option nor a continuation.
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        decode_data(buffer)?.parse()
    }

    /// # Errors
    ///
    /// Fails with [`ParseError::Read`] if `reader` fails, otherwise as [`Config::parse`].
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ParseError> {
        let mut buffer = Vec::with_capacity(4096);
        reader.read_to_end(&mut buffer)?;
        Self::parse(&buffer)
    }

    /// # Errors
    ///
    /// Fails with [`ParseError::Read`] if the file cannot be opened or read, otherwise as
    /// [`Config::parse`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let path = path.as_ref();
        log::debug!("reading configuration from {}", path.display());
        Self::from_reader(fs::File::open(path)?)
    }

    /// Create `name` unless it is empty or already exists. Returns whether it was created.
    pub fn create_section(&mut self, name: &str) -> bool {
        if name.is_empty() || self.index.contains_key(name) {
            return false;
        }

        log::debug!("creating section [{name}]");
        self.index.insert(name.to_owned(), self.sections.len());
        self.sections.push(Section::new(name.to_owned()));
        true
    }

    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Section names in creation order, `DEFAULT` first.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(Section::name)
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.index.get(section_key(name)).map(|&i| &self.sections[i])
    }

    /// Option names defined directly in `section`, in definition order.
    pub fn options(&self, section: &str) -> impl Iterator<Item = &str> {
        self.section(section).into_iter().flat_map(Section::options)
    }

    /// Set `option` in `section`, creating the section if needed. An empty section name means
    /// `DEFAULT`. Returns `true` if the option did not exist in that section before.
    pub fn set_option(&mut self, section: &str, option: &str, value: String) -> bool {
        self.create_section(section);

        let i = self.index[section_key(section)];
        self.sections[i].insert(option, value)
    }

    /// Whether `option` exists in `section` or in `DEFAULT`. Always `false` for an unknown
    /// section.
    #[must_use]
    pub fn has_option(&self, section: &str, option: &str) -> bool {
        let Some(section) = self.section(section) else {
            return false;
        };

        section.contains(option) || self.default_section().contains(option)
    }

    /// The stored value of `option` in `section`, with no fallback to `DEFAULT` and no
    /// substitution.
    ///
    /// # Errors
    ///
    /// [`GetError::NotFound`] if the section or the option does not exist.
    pub fn raw_value(&self, section: &str, option: &str) -> Result<&str, GetError> {
        self.section(section)
            .and_then(|s| s.get(option))
            .ok_or_else(|| GetError::NotFound {
                section: section.to_owned(),
                option: option.to_owned(),
            })
    }

    /// The value of `option` in `section` with `%(name)s` and `${NAME}` references resolved
    /// against this configuration and the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::get_string_with`].
    pub fn get_string(&self, section: &str, option: &str) -> Result<String, GetError> {
        self.get_string_with(section, option, |name| env::var(name).ok())
    }

    /// Like [`Config::get_string`], resolving `${NAME}` through `environ` instead of the process
    /// environment.
    ///
    /// `%(name)s` is looked up in `section` first and then in `DEFAULT`. Any reference that
    /// resolves to an empty string is an error, including unset environment variables.
    ///
    /// # Errors
    ///
    /// [`GetError::NotFound`] if the option does not exist in `section`,
    /// [`GetError::VariableNotFound`] for an unresolvable reference, and
    /// [`GetError::DepthExceeded`] if either pass does not settle within
    /// [`MAX_SUBSTITUTION_DEPTH`] rounds.
    pub fn get_string_with<E>(
        &self,
        section: &str,
        option: &str,
        environ: E,
    ) -> Result<String, GetError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let raw = self.raw_value(section, option)?;
        let current = self.section(section);
        let default = self.default_section();

        let value = expand::expand_vars(raw, expand::option_reference(), |name| {
            current
                .and_then(|s| s.get(name))
                .or_else(|| default.get(name))
                .unwrap_or_default()
                .to_owned()
        })?;

        expand::expand_vars(&value, expand::env_reference(), |name| {
            environ(name).unwrap_or_default()
        })
    }

    /// Resolve and convert a value, failing on any lookup, substitution or conversion error.
    ///
    /// # Errors
    ///
    /// Everything [`Config::get_string`] returns, plus [`GetError::InvalidValue`].
    pub fn get<T: FromValue>(&self, section: &str, option: &str) -> Result<T, GetError> {
        T::from_value(&self.get_string(section, option)?)
    }

    /// Resolve and convert a value, returning `default` if anything goes wrong.
    #[must_use]
    pub fn get_value<T: FromValue>(&self, section: &str, option: &str, default: T) -> T {
        match self.get(section, option) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("using default for [{section}] {option}: {e}");
                default
            }
        }
    }

    fn default_section(&self) -> &Section {
        &self.sections[0]
    }
}

impl FromStr for Config {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut config = Self::new();
        Parser::new(text).parse_into(&mut config)?;
        Ok(config)
    }
}

/// Lookups treat the empty section name as `DEFAULT`.
fn section_key(name: &str) -> &str {
    if name.is_empty() { DEFAULT_SECTION } else { name }
}

fn decode_data(data: &[u8]) -> Result<String, ParseError> {
    if let Some(data) = data.strip_prefix(BOM_LE) {
        let chunks = data.chunks_exact(2);
        if !chunks.remainder().is_empty() {
            return Err(invalid_data("odd number of bytes in UTF-16 data"));
        }

        let utf16 = chunks
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .collect::<Vec<u16>>();

        char::decode_utf16(utf16)
            .collect::<Result<String, _>>()
            .map_err(invalid_data)
    } else {
        let data = data.strip_prefix(BOM_UTF8).unwrap_or(data);
        String::from_utf8(data.to_vec()).map_err(invalid_data)
    }
}

fn invalid_data<E>(error: E) -> ParseError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, error).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_always_exists() {
        let config = Config::new();

        assert!(config.has_section(DEFAULT_SECTION));
        assert_eq!(config.sections().collect::<Vec<_>>(), [DEFAULT_SECTION]);

        // Lookups read "" as DEFAULT, but it is not a section name of its own.
        assert!(!config.has_section(""));
        assert_eq!(config.section("").map(Section::name), Some(DEFAULT_SECTION));

        let config = Config::parse(b"").expect("failed to parse empty config");
        assert_eq!(config.sections().collect::<Vec<_>>(), [DEFAULT_SECTION]);
    }

    #[test]
    fn create_section() {
        let mut config = Config::new();

        assert!(config.create_section("a"));
        assert!(!config.create_section("a"));
        assert!(!config.create_section(""));
        assert!(!config.create_section(DEFAULT_SECTION));
        assert!(config.create_section("b"));

        assert_eq!(config.sections().collect::<Vec<_>>(), ["DEFAULT", "a", "b"]);
    }

    #[test]
    fn set_option() {
        let mut config = Config::new();

        assert!(config.set_option("s", "k", "1".to_owned()));
        assert!(!config.set_option("s", "k", "2".to_owned()));
        assert!(config.set_option("", "k", "d".to_owned()));

        assert!(config.has_section("s"));
        assert_eq!(config.raw_value("s", "k"), Ok("2"));
        assert_eq!(config.raw_value(DEFAULT_SECTION, "k"), Ok("d"));
        assert_eq!(config.raw_value("", "k"), Ok("d"));
    }

    #[test]
    fn has_option_checks_default_too() {
        let mut config = Config::new();
        config.set_option("", "shared", "x".to_owned());
        config.set_option("s", "own", "y".to_owned());

        assert!(config.has_option("s", "own"));
        assert!(config.has_option("s", "shared"));
        assert!(!config.has_option("s", "other"));
        assert!(!config.has_option("missing", "shared"));
    }

    #[test]
    fn raw_value_does_not_fall_back() {
        let mut config = Config::new();
        config.set_option("", "shared", "x".to_owned());
        config.create_section("s");

        assert_eq!(
            config.raw_value("s", "shared"),
            Err(GetError::NotFound {
                section: "s".to_owned(),
                option: "shared".to_owned()
            })
        );
        assert!(config.raw_value("missing", "shared").is_err());
    }

    #[test]
    fn section_value_wins_over_default() {
        let config = "[DEFAULT]\nhost = d\n[s]\nhost = s2\naddr = %(host)s\n"
            .parse::<Config>()
            .expect("failed to parse hardcoded config");

        assert_eq!(config.get_string_with("s", "addr", no_env), Ok("s2".to_owned()));
    }

    #[test]
    fn default_value_fills_in() {
        let config = "[DEFAULT]\nport = 80\n[s]\nurl = http://host:%(port)s/\n"
            .parse::<Config>()
            .expect("failed to parse hardcoded config");

        assert_eq!(
            config.get_string_with("s", "url", no_env),
            Ok("http://host:80/".to_owned())
        );
    }

    #[test]
    fn cyclic_reference() {
        let config = "[a]\nx = %(y)s\ny = %(x)s\n"
            .parse::<Config>()
            .expect("failed to parse hardcoded config");

        assert_eq!(
            config.get_string_with("a", "x", no_env),
            Err(GetError::DepthExceeded {
                depth: MAX_SUBSTITUTION_DEPTH
            })
        );
    }

    #[test]
    fn missing_reference() {
        let config = "[a]\nx = %(nope)s\n"
            .parse::<Config>()
            .expect("failed to parse hardcoded config");

        assert_eq!(
            config.get_string_with("a", "x", no_env),
            Err(GetError::VariableNotFound {
                name: "nope".to_owned()
            })
        );
    }

    #[test]
    fn environment_reference() {
        let config = "[a]\nhome = ${HOME_DIR}/%(name)s\nname = me\nbad = ${UNSET}\n"
            .parse::<Config>()
            .expect("failed to parse hardcoded config");
        let env = |name: &str| (name == "HOME_DIR").then(|| "/home".to_owned());

        assert_eq!(config.get_string_with("a", "home", env), Ok("/home/me".to_owned()));
        assert_eq!(
            config.get_string_with("a", "bad", env),
            Err(GetError::VariableNotFound {
                name: "UNSET".to_owned()
            })
        );
    }

    #[test]
    fn get_value_falls_back() {
        let config = "[s]\nsize = 12\nflag = no\nratio = 0.5\nname = x\nbroken = %(nope)s\n"
            .parse::<Config>()
            .expect("failed to parse hardcoded config");

        assert_eq!(config.get_value("s", "size", 0), 12);
        assert!(!config.get_value("s", "flag", true));
        assert!((config.get_value("s", "ratio", 1.0_f64) - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.get_value("s", "name", String::new()), "x");

        assert_eq!(config.get_value("s", "missing", 42), 42);
        assert_eq!(config.get_value("s", "name", 42), 42);
        assert!(config.get_value("s", "size", true));
        assert_eq!(config.get_value("s", "broken", "fallback".to_owned()), "fallback");
        assert_eq!(config.get_value("nowhere", "size", 7_i64), 7);
    }

    #[test]
    fn strict_get() {
        let config = "[s]\nsize = big\n"
            .parse::<Config>()
            .expect("failed to parse hardcoded config");

        assert!(matches!(
            config.get::<u64>("s", "size"),
            Err(GetError::InvalidValue { expected: "u64", .. })
        ));
        assert!(matches!(
            config.get::<String>("s", "nope"),
            Err(GetError::NotFound { .. })
        ));
    }

    #[test]
    fn utf16_input() {
        let mut buffer = BOM_LE.to_vec();
        for unit in "[s]\nk = é\n".encode_utf16() {
            buffer.extend_from_slice(&unit.to_le_bytes());
        }

        let config = Config::parse(&buffer).expect("failed to parse UTF-16 config");
        assert_eq!(config.raw_value("s", "k"), Ok("é"));
    }

    #[test]
    fn utf8_bom_is_skipped() {
        let config = Config::parse(b"\xEF\xBB\xBF[s]\nk = v\n").expect("failed to parse config");

        assert_eq!(config.sections().collect::<Vec<_>>(), ["DEFAULT", "s"]);
    }

    fn assert_invalid_data(result: Result<Config, ParseError>) {
        match result {
            Err(ParseError::Read { source }) => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("expected invalid data error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert_invalid_data(Config::parse(b"[s]\nk = a\xffb\n"));
    }

    #[test]
    fn truncated_utf16_is_rejected() {
        let mut buffer = BOM_LE.to_vec();
        for unit in "[s]\nk = v\n".encode_utf16() {
            buffer.extend_from_slice(&unit.to_le_bytes());
        }
        buffer.push(b'x');

        assert_invalid_data(Config::parse(&buffer));
    }

    #[test]
    fn unpaired_surrogate_is_rejected() {
        let mut buffer = BOM_LE.to_vec();
        buffer.extend_from_slice(&0xD800_u16.to_le_bytes());

        assert_invalid_data(Config::parse(&buffer));
    }
}
