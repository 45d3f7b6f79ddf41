use crate::model::DocText;

/// Macro to define a thread-local parser with a given language.
/// Usage: `define_parser!(PARSER_NAME, language_fn)`
#[macro_export]
macro_rules! define_parser {
    ($name:ident, $language:expr) => {
        thread_local! {
            static $name: std::cell::RefCell<tree_sitter::Parser> = std::cell::RefCell::new({
                let mut parser = tree_sitter::Parser::new();
                parser.set_language(&$language.into()).expect(concat!("Failed to set ", stringify!($name), " language"));
                parser
            });
        }
    };
}

/// Decode the value of a Python string literal from its source bytes.
///
/// Returns `None` for bytes and f-string literals, which never act as
/// docstrings or export names. Escapes that produce lone surrogates are
/// kept as their (invalid) three-byte encoding so the result comes back as
/// [`DocText::Raw`].
pub fn string_literal(source: &[u8]) -> Option<DocText> {
    decode_string_literal(source).map(DocText::from_bytes)
}

/// Byte-level form of [`string_literal`], for joining implicitly
/// concatenated literals before deciding whether the result is valid text.
pub fn decode_string_literal(source: &[u8]) -> Option<Vec<u8>> {
    let quote_at = source.iter().position(|b| *b == b'"' || *b == b'\'')?;
    let prefix = source[..quote_at].to_ascii_lowercase();
    if prefix.contains(&b'b') || prefix.contains(&b'f') {
        return None;
    }
    let raw = prefix.contains(&b'r');

    let quote = source[quote_at];
    let rest = &source[quote_at..];
    let delimiter = if rest.len() >= 6 && rest[1] == quote && rest[2] == quote {
        3
    } else {
        1
    };
    if rest.len() < delimiter * 2 {
        return None;
    }
    let body = &rest[delimiter..rest.len() - delimiter];

    if raw {
        return Some(body.to_vec());
    }
    Some(unescape(body))
}

fn unescape(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;

    while i < body.len() {
        if body[i] != b'\\' || i + 1 == body.len() {
            out.push(body[i]);
            i += 1;
            continue;
        }

        let escape = body[i + 1];
        i += 2;
        match escape {
            b'\n' => {}
            b'\r' => {
                if body.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\\' => out.push(b'\\'),
            b'\'' => out.push(b'\''),
            b'"' => out.push(b'"'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                let mut value = u32::from(escape - b'0');
                let mut digits = 1;
                while digits < 3 && i < body.len() && (b'0'..=b'7').contains(&body[i]) {
                    value = value * 8 + u32::from(body[i] - b'0');
                    i += 1;
                    digits += 1;
                }
                push_code_point(&mut out, value);
            }
            b'x' | b'u' | b'U' => {
                let width = match escape {
                    b'x' => 2,
                    b'u' => 4,
                    _ => 8,
                };
                match parse_hex(body.get(i..i + width)) {
                    Some(value) => {
                        push_code_point(&mut out, value);
                        i += width;
                    }
                    None => {
                        out.push(b'\\');
                        out.push(escape);
                    }
                }
            }
            other => {
                // Unknown escapes (including `\N{...}`) stay as written.
                out.push(b'\\');
                out.push(other);
            }
        }
    }

    out
}

fn parse_hex(digits: Option<&[u8]>) -> Option<u32> {
    let text = std::str::from_utf8(digits?).ok()?;
    u32::from_str_radix(text, 16).ok()
}

fn push_code_point(out: &mut Vec<u8>, value: u32) {
    if let Some(c) = char::from_u32(value) {
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    } else if (0xD800..=0xDFFF).contains(&value) {
        // Generalized UTF-8 for a surrogate; never valid UTF-8.
        out.push(0xE0 | (value >> 12) as u8);
        out.push(0x80 | ((value >> 6) & 0x3F) as u8);
        out.push(0x80 | (value & 0x3F) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(source: &str) -> Option<String> {
        match string_literal(source.as_bytes())? {
            DocText::Text(t) => Some(t),
            DocText::Raw(_) => None,
        }
    }

    #[test]
    fn test_plain_and_triple_quoted() {
        assert_eq!(text("'abc'").as_deref(), Some("abc"));
        assert_eq!(text("\"\"\"Computes X\"\"\"").as_deref(), Some("Computes X"));
        assert_eq!(text("''''''").as_deref(), Some(""));
        assert_eq!(text("\"\"").as_deref(), Some(""));
    }

    #[test]
    fn test_escapes_are_decoded() {
        assert_eq!(text(r"'a\nb\tc'").as_deref(), Some("a\nb\tc"));
        assert_eq!(text(r"'\x41é\101'").as_deref(), Some("AéA"));
        assert_eq!(text("'line\\\ncontinued'").as_deref(), Some("linecontinued"));
        assert_eq!(text(r"'\N{BULLET}'").as_deref(), Some(r"\N{BULLET}"));
    }

    #[test]
    fn test_raw_prefix_keeps_backslashes() {
        assert_eq!(text(r"r'a\nb'").as_deref(), Some(r"a\nb"));
        assert_eq!(text(r#"R"""x\y""""#).as_deref(), Some(r"x\y"));
    }

    #[test]
    fn test_bytes_and_fstrings_are_not_text() {
        assert!(string_literal(b"b'abc'").is_none());
        assert!(string_literal(b"f'{x}'").is_none());
        assert!(string_literal(b"u'abc'").is_some());
    }

    #[test]
    fn test_lone_surrogate_is_raw() {
        let doc = string_literal(br"'bad \udcff doc'").unwrap();
        assert!(matches!(doc, DocText::Raw(_)));
    }
}
