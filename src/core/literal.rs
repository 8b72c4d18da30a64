//! Reads a Python literal out of a source file without running it.
//!
//! Only the constructs `ast.literal_eval` would accept for JSON-like data are
//! understood: strings, numbers, `True`/`False`/`None`, lists, tuples and
//! dicts with string keys. Everything else is an error.

use crate::error::store::{Result, StoreError};
use serde_json::{Map, Number, Value};

/// Nesting limit for lists, tuples and dicts.
const MAX_DEPTH: usize = 64;

/// Finds the first top-level `<variable> = <literal>` statement and returns
/// the literal. `Ok(None)` when the file never assigns `variable`.
pub fn find_assignment(source: &str, variable: &str) -> Result<Option<Value>> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut cursor = Cursor::new(source);
    let mut depth = 0usize;
    let mut statement_start = true;

    while let Some(c) = cursor.peek() {
        if statement_start && depth == 0 && is_ident_start(c) {
            let ident = cursor.ident();
            statement_start = false;
            if cursor.assignment_operator() {
                // `a = b = [...]` binds every target
                let mut assigns_variable = ident == variable;
                while let Some(target) = cursor.target() {
                    assigns_variable |= target == variable;
                }
                if assigns_variable {
                    let value = cursor.value(0)?;
                    cursor.end_of_statement()?;
                    return Ok(Some(value));
                }
            }
            continue;
        }

        match c {
            b'#' => cursor.skip_comment(),
            b'\'' | b'"' => {
                // 只跳过，不解释转义
                cursor.string(true)?;
                statement_start = false;
            }
            b'(' | b'[' | b'{' => {
                depth += 1;
                cursor.bump();
                statement_start = false;
            }
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                cursor.bump();
            }
            b'\n' => {
                cursor.bump();
                // 缩进的行属于代码块，不是顶层语句
                statement_start = depth == 0;
            }
            b'\r' => cursor.bump(),
            b';' if depth == 0 => {
                cursor.bump();
                cursor.skip_inline_space();
                statement_start = true;
            }
            b'\\' => {
                cursor.bump();
                if cursor.peek() == Some(b'\n') {
                    cursor.bump();
                }
                statement_start = false;
            }
            _ => {
                if is_ident_start(c) {
                    cursor.ident();
                } else {
                    cursor.bump();
                }
                statement_start = false;
            }
        }
    }

    Ok(None)
}

/// Parses a source fragment that is a single literal expression.
pub fn parse_literal(source: &str) -> Result<Value> {
    let mut cursor = Cursor::new(source);
    let value = cursor.value(0)?;
    cursor.skip_trivia(true);
    if cursor.peek().is_some() {
        return Err(cursor.error("unexpected input after literal"));
    }
    Ok(value)
}

fn is_ident_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic() || c >= 0x80
}

fn is_ident_continue(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if let Some(c) = self.src[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> StoreError {
        let line = self.src[..self.pos].matches('\n').count() + 1;
        StoreError::Codec(format!("line {}: {}", line, message))
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_inline_space(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\x0c')) {
            self.pos += 1;
        }
    }

    /// Whitespace, comments and line continuations. Newlines only count as
    /// trivia inside brackets.
    fn skip_trivia(&mut self, newlines: bool) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\x0c' | b'\r') => self.pos += 1,
                Some(b'\n') if newlines => self.pos += 1,
                Some(b'#') => self.skip_comment(),
                Some(b'\\') if self.peek_at(1) == Some(b'\n') => self.pos += 2,
                Some(b'\\') if self.peek_at(1) == Some(b'\r') && self.peek_at(2) == Some(b'\n') => {
                    self.pos += 3
                }
                _ => break,
            }
        }
    }

    /// Consumes `=` (but not `==`) after an assignment target.
    fn assignment_operator(&mut self) -> bool {
        let save = self.pos;
        self.skip_trivia(false);
        if self.peek() == Some(b'=') && self.peek_at(1) != Some(b'=') {
            self.pos += 1;
            true
        } else {
            self.pos = save;
            false
        }
    }

    /// Consumes `name =` when it comes next, leaving the cursor alone otherwise.
    fn target(&mut self) -> Option<&'a str> {
        let save = self.pos;
        self.skip_trivia(false);
        if self.peek().is_some_and(is_ident_start) {
            let ident = self.ident();
            if self.assignment_operator() {
                return Some(ident);
            }
        }
        self.pos = save;
        None
    }

    /// After the literal only a comment, `;` or the end of the line may follow.
    fn end_of_statement(&mut self) -> Result<()> {
        self.skip_trivia(false);
        match self.peek() {
            None | Some(b'\n' | b';') => Ok(()),
            Some(_) => Err(self.error("assignment value is not a plain literal")),
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(self.error("literal nested too deeply"));
        }
        let inside = depth > 0;
        self.skip_trivia(inside);

        let Some(c) = self.peek() else {
            return Err(self.error("expected a literal, found end of input"));
        };

        match c {
            b'[' => {
                self.pos += 1;
                let items = self.sequence(b']', depth)?;
                Ok(Value::Array(items.0))
            }
            b'(' => {
                self.pos += 1;
                let (mut items, trailing_comma) = self.sequence(b')', depth)?;
                // (x) is just x, (x,) is a one-element tuple
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::Array(items))
                }
            }
            b'{' => {
                self.pos += 1;
                self.mapping(depth)
            }
            b'\'' | b'"' => self.strings(String::new(), false, inside),
            b'-' | b'+' => {
                self.pos += 1;
                self.skip_trivia(inside);
                match self.peek() {
                    Some(d) if d.is_ascii_digit() || d == b'.' => {
                        let number = self.number()?;
                        if c == b'-' { self.negate(number) } else { Ok(number) }
                    }
                    _ => Err(self.error("unary operator applied to a non-number")),
                }
            }
            b'0'..=b'9' => self.number(),
            b'.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.number(),
            _ if is_ident_start(c) => {
                let start = self.pos;
                let ident = self.ident();
                if matches!(self.peek(), Some(b'\'' | b'"')) {
                    return match ident.to_ascii_lowercase().as_str() {
                        "r" => self.strings(String::new(), true, inside),
                        "u" => self.strings(String::new(), false, inside),
                        "b" | "br" | "rb" => Err(self.error("bytes literals are not supported")),
                        _ => Err(self.error("formatted strings are not literals")),
                    };
                }
                match ident {
                    "True" => Ok(Value::Bool(true)),
                    "False" => Ok(Value::Bool(false)),
                    "None" => Ok(Value::Null),
                    _ => {
                        self.pos = start;
                        Err(self.error(&format!("`{}` is not a literal", ident)))
                    }
                }
            }
            _ => Err(self.error(&format!("unexpected character `{}`", c as char))),
        }
    }

    fn negate(&self, number: Value) -> Result<Value> {
        match number {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Number(Number::from(-i)))
                } else if let Some(f) = n.as_f64() {
                    Number::from_f64(-f)
                        .map(Value::Number)
                        .ok_or_else(|| self.error("number out of range"))
                } else {
                    Err(self.error("number out of range"))
                }
            }
            _ => Err(self.error("unary operator applied to a non-number")),
        }
    }

    /// Comma-separated values up to `close`. Returns whether a trailing comma
    /// was present.
    fn sequence(&mut self, close: u8, depth: usize) -> Result<(Vec<Value>, bool)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_trivia(true);
            if self.eat(close) {
                return Ok((items, trailing_comma));
            }
            items.push(self.value(depth + 1)?);
            self.skip_trivia(true);
            if self.eat(b',') {
                trailing_comma = true;
                continue;
            }
            trailing_comma = false;
            if self.eat(close) {
                return Ok((items, trailing_comma));
            }
            return Err(self.error(&format!("expected `,` or `{}`", close as char)));
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Value> {
        let mut map = Map::new();
        loop {
            self.skip_trivia(true);
            if self.eat(b'}') {
                return Ok(Value::Object(map));
            }
            let key = match self.value(depth + 1)? {
                Value::String(key) => key,
                _ => return Err(self.error("mapping keys must be strings")),
            };
            self.skip_trivia(true);
            if !self.eat(b':') {
                return Err(self.error("set literals are not supported"));
            }
            let value = self.value(depth + 1)?;
            map.insert(key, value);
            self.skip_trivia(true);
            if self.eat(b',') {
                continue;
            }
            if self.eat(b'}') {
                return Ok(Value::Object(map));
            }
            return Err(self.error("expected `,` or `}`"));
        }
    }

    /// A string followed by any adjacent strings, which Python concatenates.
    fn strings(&mut self, mut acc: String, raw: bool, inside: bool) -> Result<Value> {
        acc.push_str(&self.string(raw)?);
        loop {
            let save = self.pos;
            self.skip_trivia(inside);
            match self.peek() {
                Some(b'\'' | b'"') => acc.push_str(&self.string(false)?),
                Some(c) if is_ident_start(c) => {
                    let ident = self.ident();
                    let quoted = matches!(self.peek(), Some(b'\'' | b'"'));
                    match ident.to_ascii_lowercase().as_str() {
                        "r" if quoted => acc.push_str(&self.string(true)?),
                        "u" if quoted => acc.push_str(&self.string(false)?),
                        _ => {
                            self.pos = save;
                            return Ok(Value::String(acc));
                        }
                    }
                }
                _ => {
                    self.pos = save;
                    return Ok(Value::String(acc));
                }
            }
        }
    }

    /// One quoted string, cursor on the opening quote.
    fn string(&mut self, raw: bool) -> Result<String> {
        let Some(quote) = self.peek() else {
            return Err(self.error("expected a string"));
        };
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut out = String::new();
        loop {
            let Some(c) = self.src[self.pos..].chars().next() else {
                return Err(self.error("unterminated string"));
            };
            if c as u32 == quote as u32 {
                if !triple {
                    self.pos += 1;
                    return Ok(out);
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    return Ok(out);
                }
                out.push(c);
                self.pos += 1;
                continue;
            }
            match c {
                '\n' if !triple => return Err(self.error("unterminated string")),
                '\\' => {
                    self.pos += 1;
                    if raw {
                        out.push('\\');
                        // 原始字符串里 \" 不结束字符串
                        if let Some(next) = self.src[self.pos..].chars().next() {
                            out.push(next);
                            self.pos += next.len_utf8();
                        }
                    } else {
                        self.escape(&mut out)?;
                    }
                }
                _ => {
                    out.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    /// Escape sequence after a backslash.
    fn escape(&mut self, out: &mut String) -> Result<()> {
        let Some(c) = self.src[self.pos..].chars().next() else {
            return Err(self.error("unterminated string"));
        };
        self.pos += c.len_utf8();
        match c {
            '\n' => {}
            '\r' => {
                self.eat(b'\n');
            }
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            code = code * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push(self.code_point(code)?);
            }
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(self.code_point(code)?);
            }
            'u' => {
                let code = self.hex_digits(4)?;
                out.push(self.code_point(code)?);
            }
            'U' => {
                let code = self.hex_digits(8)?;
                out.push(self.code_point(code)?);
            }
            'N' => return Err(self.error("named unicode escapes are not supported")),
            other => {
                // Python keeps unknown escapes verbatim
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32> {
        let end = self.pos + count;
        let digits = self
            .src
            .get(self.pos..end)
            .filter(|digits| digits.bytes().all(|d| d.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("truncated escape sequence"))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| self.error("bad escape sequence"))?;
        self.pos = end;
        Ok(code)
    }

    fn code_point(&self, code: u32) -> Result<char> {
        char::from_u32(code).ok_or_else(|| self.error("escape is not a valid code point"))
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        let radix = match (self.peek(), self.peek_at(1).map(|c| c.to_ascii_lowercase())) {
            (Some(b'0'), Some(b'x')) => Some(16),
            (Some(b'0'), Some(b'o')) => Some(8),
            (Some(b'0'), Some(b'b')) => Some(2),
            _ => None,
        };

        if let Some(radix) = radix {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_') {
                self.pos += 1;
            }
            let digits = self.src[digits_start..self.pos].replace('_', "");
            return i64::from_str_radix(&digits, radix)
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|_| self.error("invalid integer literal"));
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' | b'_' => self.pos += 1,
                b'.' => {
                    is_float = true;
                    self.pos += 1;
                }
                b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some(b'+' | b'-')) {
                        self.pos += 1;
                    }
                }
                b'j' | b'J' => return Err(self.error("complex numbers are not supported")),
                _ => break,
            }
        }
        if self.peek().is_some_and(is_ident_start) {
            return Err(self.error("invalid numeric literal"));
        }

        let text = self.src[start..self.pos].replace('_', "");
        if is_float {
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| self.error("invalid float literal"))
        } else {
            // Python rejects leading zeros on non-zero decimals
            if text.len() > 1 && text.starts_with('0') && text.bytes().any(|d| d != b'0') {
                return Err(self.error("leading zeros in decimal integer"));
            }
            text.parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|_| self.error("integer out of range"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_top_level_assignment() {
        let source = r#"
# generated
import os

pdfs = [
    {"name": 'ENG701', "semesters": ["Fall", "Winter"],},  # trailing comma
]
"#;
        let value = find_assignment(source, "pdfs").unwrap().unwrap();
        assert_eq!(value, json!([{"name": "ENG701", "semesters": ["Fall", "Winter"]}]));
    }

    #[test]
    fn missing_variable_is_none() {
        let source = "other = [1, 2]\npdfs_old = []\n";
        assert_eq!(find_assignment(source, "pdfs").unwrap(), None);
        assert_eq!(find_assignment("", "pdfs").unwrap(), None);
    }

    #[test]
    fn ignores_nested_strings_and_blocks() {
        let source = r#"
"""
pdfs = ["inside a docstring"]
"""
text = "pdfs = ['in a string']"
if True:
    pdfs = ["indented, not top level"]
call(
pdfs = ["keyword argument"])
pdfs = ["real"]
"#;
        let value = find_assignment(source, "pdfs").unwrap().unwrap();
        assert_eq!(value, json!(["real"]));
    }

    #[test]
    fn skips_byte_order_mark() {
        let source = "\u{feff}pdfs = []\r\n";
        assert_eq!(find_assignment(source, "pdfs").unwrap().unwrap(), json!([]));
    }

    #[test]
    fn first_assignment_wins() {
        let source = "pdfs = [1]\npdfs = [2]\n";
        assert_eq!(find_assignment(source, "pdfs").unwrap().unwrap(), json!([1]));
    }

    #[test]
    fn chained_assignment_targets() {
        assert_eq!(find_assignment("old = pdfs = [1]\n", "pdfs").unwrap().unwrap(), json!([1]));
        assert_eq!(find_assignment("pdfs = backup = [2]\n", "pdfs").unwrap().unwrap(), json!([2]));
        assert_eq!(find_assignment("a = b = [3]\npdfs = [4]\n", "pdfs").unwrap().unwrap(), json!([4]));
        assert_eq!(find_assignment("a = pdfs = True\n", "pdfs").unwrap().unwrap(), json!(true));
    }

    #[test]
    fn comparison_is_not_assignment() {
        let source = "pdfs == [1]\npdfs = [2]\n";
        assert_eq!(find_assignment(source, "pdfs").unwrap().unwrap(), json!([2]));
    }

    #[test]
    fn statement_after_semicolon() {
        let source = "x = 1;  pdfs = ['a']\n";
        assert_eq!(find_assignment(source, "pdfs").unwrap().unwrap(), json!(["a"]));
    }

    #[test]
    fn rejects_code() {
        for source in [
            "pdfs = __import__('os').system('rm -rf /')",
            "pdfs = [x for x in range(3)]",
            "pdfs = [1] + [2]",
            "pdfs = load()",
            "pdfs = [open('/etc/passwd').read()]",
            "pdfs = {'a': 1, **other}",
            "pdfs = [f'{secret}']",
            "pdfs = {1, 2}",
            "pdfs = lambda: 1",
        ] {
            let result = find_assignment(source, "pdfs");
            assert!(
                matches!(result, Err(StoreError::Codec(_))),
                "accepted {:?}",
                source
            );
        }
    }

    #[test]
    fn scalar_literals() {
        assert_eq!(parse_literal("True").unwrap(), json!(true));
        assert_eq!(parse_literal("None").unwrap(), json!(null));
        assert_eq!(parse_literal("-42").unwrap(), json!(-42));
        assert_eq!(parse_literal("1_000").unwrap(), json!(1000));
        assert_eq!(parse_literal("0x1F").unwrap(), json!(31));
        assert_eq!(parse_literal("2.5e1").unwrap(), json!(25.0));
        assert_eq!(parse_literal("(1, 'a')").unwrap(), json!([1, "a"]));
        assert_eq!(parse_literal("(1,)").unwrap(), json!([1]));
        assert_eq!(parse_literal("(1)").unwrap(), json!(1));
        assert!(parse_literal("true").is_err());
        assert!(parse_literal("012").is_err());
        assert!(parse_literal("1j").is_err());
    }

    #[test]
    fn string_forms() {
        assert_eq!(parse_literal(r#"'it\'s'"#).unwrap(), json!("it's"));
        assert_eq!(parse_literal(r#""a\tb\u00e9\x41""#).unwrap(), json!("a\tb\u{e9}A"));
        assert_eq!(parse_literal(r#"r"C:\new""#).unwrap(), json!(r"C:\new"));
        assert_eq!(parse_literal(r#""\d""#).unwrap(), json!(r"\d"));
        assert_eq!(parse_literal("'''one\ntwo'''").unwrap(), json!("one\ntwo"));
        assert_eq!(parse_literal("('Intro ' 'to' r' Rust')").unwrap(), json!("Intro to Rust"));
        assert_eq!(parse_literal("'Génie'").unwrap(), json!("Génie"));
        assert!(parse_literal("'open").is_err());
        assert!(parse_literal("b'bytes'").is_err());
    }

    #[test]
    fn dict_keys_must_be_strings() {
        assert!(parse_literal("{1: 'a'}").is_err());
        assert_eq!(parse_literal("{}").unwrap(), json!({}));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let source = format!("{}{}", "[".repeat(500), "]".repeat(500));
        assert!(parse_literal(&source).is_err());
    }

    #[test]
    fn error_reports_line() {
        let err = find_assignment("\n\npdfs = [\n  name,\n]", "pdfs").unwrap_err();
        assert_eq!(err.to_string(), "codec error: line 4: `name` is not a literal");
    }
}
