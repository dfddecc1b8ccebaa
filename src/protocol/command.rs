use super::error::AgiError;
use std::fmt::{self, Display};

/// Severity levels accepted by `VERBOSE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum VerboseLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Critical = 4,
}

impl Display for VerboseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Quote one literal argument, escaping `\` and `"`.
#[must_use]
pub fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Something that can be sent as a DTMF digit list.
///
/// Strings are taken as-is; sequences are joined with no separator, so
/// `[1, 2, 3]`, `vec!['1', '#']` and `"12#"` are all valid.
pub trait DigitList {
    fn to_digit_string(&self) -> String;
}

impl DigitList for str {
    fn to_digit_string(&self) -> String {
        self.to_string()
    }
}

impl DigitList for String {
    fn to_digit_string(&self) -> String {
        self.clone()
    }
}

impl<T: Display> DigitList for [T] {
    fn to_digit_string(&self) -> String {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: Display> DigitList for Vec<T> {
    fn to_digit_string(&self) -> String {
        self.as_slice().to_digit_string()
    }
}

impl<T: Display, const N: usize> DigitList for [T; N] {
    fn to_digit_string(&self) -> String {
        self.as_slice().to_digit_string()
    }
}

/// Quoted digit-list argument.
#[must_use]
pub fn digit_list<D: DigitList + ?Sized>(digits: &D) -> String {
    quote(&digits.to_digit_string())
}

/// Decode a DTMF result value.
///
/// `"0"` or empty means no key was pressed. Any other value is a character
/// code.
///
/// # Errors
///
/// [`AgiError::Value`] when the value is not a valid character code.
pub fn decode_dtmf(value: &str) -> Result<Option<char>, AgiError> {
    let value = if value.is_empty() { "0" } else { value };
    if value == "0" {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .ok()
        .and_then(char::from_u32)
        .map(Some)
        .ok_or_else(|| AgiError::Value {
            expected: "DTMF character",
            payload: value.to_string(),
        })
}

/// One outbound command line under construction.
///
/// ```
/// use agirouter::protocol::Command;
///
/// let cmd = Command::new("SAY DIGITS").digits("123").digits(&['#']);
/// assert_eq!(cmd.as_str(), r##"SAY DIGITS "123" "#""##);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    line: String,
}

impl Command {
    #[must_use]
    pub fn new(verb: &str) -> Self {
        Self {
            line: verb.to_string(),
        }
    }

    /// Append a quoted literal argument.
    #[must_use]
    pub fn quoted(mut self, arg: impl Display) -> Self {
        self.line.push(' ');
        self.line.push_str(&quote(&arg.to_string()));
        self
    }

    /// Append a quoted digit list.
    #[must_use]
    pub fn digits<D: DigitList + ?Sized>(mut self, digits: &D) -> Self {
        self.line.push(' ');
        self.line.push_str(&digit_list(digits));
        self
    }

    /// Append an unquoted token.
    #[must_use]
    pub fn raw(mut self, arg: impl Display) -> Self {
        self.line.push(' ');
        self.line.push_str(&arg.to_string());
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.line
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

impl From<Command> for String {
    fn from(cmd: Command) -> Self {
        cmd.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_dtmf() {
        assert_eq!(decode_dtmf("0").unwrap(), None);
        assert_eq!(decode_dtmf("").unwrap(), None);
        assert_eq!(decode_dtmf("49").unwrap(), Some('1'));
        assert_eq!(decode_dtmf("35").unwrap(), Some('#'));
    }

    #[test]
    fn test_decode_dtmf_rejects_garbage() {
        let err = decode_dtmf("abc").unwrap_err();
        assert!(matches!(err, AgiError::Value { ref payload, .. } if payload == "abc"));
        assert!(decode_dtmf("-1").is_err());
        assert!(decode_dtmf("55296").is_err());
    }

    #[test]
    fn test_digit_lists() {
        assert_eq!(digit_list("1234"), "\"1234\"");
        assert_eq!(digit_list(&[1, 2, 3]), "\"123\"");
        assert_eq!(digit_list(&vec!['*', '#']), "\"*#\"");
        assert_eq!(digit_list(""), "\"\"");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote(r"a\b"), r#""a\\b""#);
    }

    #[test]
    fn test_command_builder() {
        let cmd = Command::new("VERBOSE")
            .quoted("hello world")
            .quoted(VerboseLevel::Warn);
        assert_eq!(cmd.as_str(), "VERBOSE \"hello world\" \"2\"");
        assert_eq!(Command::new("EXEC").raw("Dial").as_str(), "EXEC Dial");
    }
}
