//! Wire protocol definitions.
//!
//! The gateway speaks an ASCII line protocol: a command is a sequence of
//! newline-terminated parts ending with the terminator part `e\n`, and every
//! response is exactly one line. This module is the single home for the
//! command bytes, subcommand bytes, value type tags, response codes, and the
//! string escaping rules; [`codec`] builds on it for value encoding.

pub mod codec;
pub mod value;

pub use value::{CallbackRef, Value};

use crate::error::{GatewayError, Result};

// Top-level command bytes (first line of a command).
pub const CALL_COMMAND: &str = "c";
pub const CONSTRUCTOR_COMMAND: &str = "i";
pub const FIELD_COMMAND: &str = "f";
pub const MEMORY_COMMAND: &str = "m";
pub const DIR_COMMAND: &str = "d";
pub const REFLECTION_COMMAND: &str = "r";
pub const HELP_COMMAND: &str = "h";
pub const JVM_VIEW_COMMAND: &str = "j";
pub const ARRAY_COMMAND: &str = "a";
pub const LIST_COMMAND: &str = "l";
pub const AUTH_COMMAND: &str = "A";
pub const SHUTDOWN_COMMAND: &str = "s";
// Reserved by the protocol; this client never emits them.
pub const BYTES_COMMAND: &str = "b";
pub const STREAM_COMMAND: &str = "S";
pub const TABLE_COMMAND: &str = "t";

/// Garbage-collect command on the callback channel.
pub const CALLBACK_COLLECT_COMMAND: &str = "g";

// Subcommand bytes (second line, where the command takes one).
pub const FIELD_GET_SUBCOMMAND: &str = "g";
pub const FIELD_SET_SUBCOMMAND: &str = "s";
pub const MEMORY_DELETE_SUBCOMMAND: &str = "d";
pub const MEMORY_ATTACH_SUBCOMMAND: &str = "a";
pub const DIR_FIELDS_SUBCOMMAND: &str = "f";
pub const DIR_METHODS_SUBCOMMAND: &str = "m";
pub const DIR_STATIC_SUBCOMMAND: &str = "s";
pub const DIR_VIEW_SUBCOMMAND: &str = "v";
pub const REFLECTION_MEMBER_SUBCOMMAND: &str = "m";
pub const REFLECTION_UNKNOWN_SUBCOMMAND: &str = "u";
pub const REFLECTION_STRING_SUBCOMMAND: &str = "s";
pub const HELP_OBJECT_SUBCOMMAND: &str = "o";
pub const HELP_CLASS_SUBCOMMAND: &str = "c";
pub const VIEW_CREATE_SUBCOMMAND: &str = "c";
pub const VIEW_IMPORT_SUBCOMMAND: &str = "i";
pub const VIEW_SEARCH_SUBCOMMAND: &str = "s";
pub const VIEW_REMOVE_IMPORT_SUBCOMMAND: &str = "r";
pub const ARRAY_GET_SUBCOMMAND: &str = "g";
pub const ARRAY_SET_SUBCOMMAND: &str = "s";
pub const ARRAY_SLICE_SUBCOMMAND: &str = "l";
pub const ARRAY_LEN_SUBCOMMAND: &str = "e";
pub const ARRAY_CREATE_SUBCOMMAND: &str = "c";
pub const LIST_SORT_SUBCOMMAND: &str = "s";
pub const LIST_REVERSE_SUBCOMMAND: &str = "r";
pub const LIST_SLICE_SUBCOMMAND: &str = "l";
pub const LIST_CONCAT_SUBCOMMAND: &str = "a";
pub const LIST_MULT_SUBCOMMAND: &str = "m";
pub const LIST_IMULT_SUBCOMMAND: &str = "i";
pub const LIST_COUNT_SUBCOMMAND: &str = "f";

/// Command terminator line.
pub const END: &str = "e";
/// Command terminator as a full part.
pub const END_PART: &str = "e\n";

// Response codes (first byte of a response, after an optional `!`).
pub const SUCCESS: char = 'y';
pub const ERROR: char = 'x';
pub const FATAL: char = 'z';

// Value type tags.
pub const NULL_TYPE: char = 'n';
pub const VOID_TYPE: char = 'v';
pub const BOOLEAN_TYPE: char = 'b';
pub const INT_TYPE: char = 'i';
pub const LONG_TYPE: char = 'L';
pub const DOUBLE_TYPE: char = 'd';
pub const DECIMAL_TYPE: char = 'D';
pub const STRING_TYPE: char = 's';
pub const BYTES_TYPE: char = 'j';
pub const REFERENCE_TYPE: char = 'r';
pub const LIST_TYPE: char = 'l';
pub const SET_TYPE: char = 'h';
pub const MAP_TYPE: char = 'a';
pub const ARRAY_TYPE: char = 't';
pub const ITERATOR_TYPE: char = 'g';
pub const CALLBACK_PROXY_TYPE: char = 'f';

/// Target ID of the gateway entry-point object.
pub const ENTRY_POINT_TARGET: &str = "t";
/// Target ID of the default JVM view.
pub const DEFAULT_JVM_VIEW: &str = "rj";
/// Prefix that routes a call to a class by fully-qualified name instead of
/// an instance reference.
pub const STATIC_PREFIX: &str = "z:";

/// Escape a string payload for the wire.
///
/// Literal backslash becomes `\\` and literal newline becomes the two
/// characters `\n`; nothing else is touched.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`] in a single left-to-right pass.
///
/// Any escape sequence other than `\\` and `\n` is a decode error, as is a
/// dangling backslash at the end of the payload.
pub fn unescape(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some(other) => {
                return Err(GatewayError::Decode(format!(
                    "unknown escape sequence \\{other} in string payload"
                )))
            }
            None => {
                return Err(GatewayError::Decode(
                    "dangling escape at end of string payload".to_string(),
                ))
            }
        }
    }
    Ok(out)
}

/// Reject identifiers the protocol cannot represent.
///
/// Target IDs, method and field names, fully-qualified class names, and
/// auth tokens are emitted verbatim as single command parts, so an embedded
/// newline would corrupt the framing.
pub fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.contains('\n') {
        return Err(GatewayError::Usage(format!(
            "{kind} must not contain a newline: {value:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_string_untouched() {
        assert_eq!(escape("hello world"), "hello world");
    }

    #[test]
    fn test_escape_backslash_and_newline() {
        assert_eq!(escape("a\\b"), "a\\\\b");
        assert_eq!(escape("a\nb"), "a\\nb");
        assert_eq!(escape("\\n"), "\\\\n");
    }

    #[test]
    fn test_unescape_roundtrip() {
        for s in [
            "",
            "plain",
            "line1\nline2",
            "back\\slash",
            "\\\n\\\n",
            "trailing\n",
            "n\\n mixed \n\\",
        ] {
            assert_eq!(unescape(&escape(s)).unwrap(), s);
        }
    }

    #[test]
    fn test_escape_is_injective_on_tricky_pairs() {
        // "\n" (newline) and "\\n" (backslash + n) must not collide.
        assert_ne!(escape("\n"), escape("\\n"));
        assert_ne!(escape("a\\nb"), escape("a\nb"));
    }

    #[test]
    fn test_unescape_rejects_unknown_escape() {
        assert!(unescape("bad\\tescape").is_err());
    }

    #[test]
    fn test_unescape_rejects_dangling_backslash() {
        assert!(unescape("oops\\").is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("method name", "toString").is_ok());
        assert!(validate_identifier("method name", "to\nString").is_err());
    }
}
