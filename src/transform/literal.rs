//! A reader for JavaScript data literals.
//!
//! Quiz questions are written inline as a JSX attribute expression, e.g.
//! `questions={[{ question: "...", options: [{ label: "A", correct: true }] }]}`.
//! That is not JSON: keys are usually bare identifiers, strings may use single
//! quotes and trailing commas are common. This module reads that subset of
//! JavaScript into a [`serde_json::Value`] without evaluating anything.
//! Anything outside the subset (identifiers, calls, template interpolation,
//! spreads) is an error.

use serde_json::{Map, Number, Value};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character `{found}` at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("invalid number `{text}` at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },
    #[error("template interpolation is not supported (offset {offset})")]
    Interpolation { offset: usize },
    #[error("unsupported identifier `{name}` at offset {offset}")]
    Identifier { name: String, offset: usize },
    #[error("nesting deeper than {} levels at offset {offset}", MAX_DEPTH)]
    TooDeep { offset: usize },
}

/// Deepest array/object nesting accepted.
pub const MAX_DEPTH: usize = 256;

/// Parse a complete JavaScript literal expression.
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut reader = Reader {
        chars: input.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let value = reader.value()?;
    reader.skip_trivia()?;
    match reader.peek() {
        None => Ok(value),
        Some(found) => Err(LiteralError::UnexpectedChar {
            found,
            offset: reader.pos,
        }),
    }
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl Reader {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<char, LiteralError> {
        let c = self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(c)
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(found) => LiteralError::UnexpectedChar {
                found,
                offset: self.pos,
            },
            None => LiteralError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), LiteralError> {
        self.skip_trivia()?;
        if self.peek() == Some(wanted) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Skip whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) -> Result<(), LiteralError> {
        loop {
            match (self.peek(), self.chars.get(self.pos + 1).copied()) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    loop {
                        match self.bump()? {
                            '*' if self.peek() == Some('/') => {
                                self.pos += 1;
                                break;
                            }
                            _ => {}
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_trivia()?;
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('[') => self.nested(Reader::array),
            Some('{') => self.nested(Reader::object),
            Some(q @ ('"' | '\'' | '`')) => self.string(q).map(Value::String),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            Some(c) if is_ident_start(c) => {
                let offset = self.pos;
                let name = self.identifier();
                match name.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" => Ok(Value::Null),
                    _ => Err(LiteralError::Identifier { name, offset }),
                }
            }
            Some(_) => Err(self.unexpected()),
        }
    }

    fn nested(
        &mut self,
        read: fn(&mut Reader) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep { offset: self.pos });
        }
        self.depth += 1;
        let value = read(self);
        self.depth -= 1;
        value
    }

    fn array(&mut self) -> Result<Value, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.bump()? {
                ',' => {}
                ']' => return Ok(Value::Array(items)),
                found => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        offset: self.pos - 1,
                    })
                }
            }
        }
    }

    fn object(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            let key = match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some(q @ ('"' | '\'')) => self.string(q)?,
                Some(c) if is_ident_start(c) => self.identifier(),
                Some(c) if c.is_ascii_digit() => self.number()?.to_string(),
                _ => return Err(self.unexpected()),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_trivia()?;
            match self.bump()? {
                ',' => {}
                '}' => return Ok(Value::Object(map)),
                found => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        offset: self.pos - 1,
                    })
                }
            }
        }
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let offset = self.pos;
            match self.bump()? {
                c if c == quote => return Ok(out),
                '\n' if quote != '`' => return Err(LiteralError::UnexpectedChar { found: '\n', offset }),
                '$' if quote == '`' && self.peek() == Some('{') => {
                    return Err(LiteralError::Interpolation { offset })
                }
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    'v' => out.push('\u{b}'),
                    '0' => out.push('\0'),
                    // line continuation
                    '\n' => {}
                    'u' => out.push(self.unicode_escape(offset)?),
                    'x' => {
                        let code = self.hex_digits(2, offset)?;
                        out.push(char::from_u32(code).ok_or(LiteralError::InvalidEscape { offset })?);
                    }
                    other => out.push(other),
                },
                c => out.push(c),
            }
        }
    }

    fn hex_digits(&mut self, count: usize, offset: usize) -> Result<u32, LiteralError> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .bump()?
                .to_digit(16)
                .ok_or(LiteralError::InvalidEscape { offset })?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn unicode_escape(&mut self, offset: usize) -> Result<char, LiteralError> {
        let code = if self.peek() == Some('{') {
            self.pos += 1;
            let mut code = 0u32;
            loop {
                match self.bump()? {
                    '}' => break,
                    c => {
                        let digit = c.to_digit(16).ok_or(LiteralError::InvalidEscape { offset })?;
                        code = code
                            .checked_mul(16)
                            .and_then(|v| v.checked_add(digit))
                            .ok_or(LiteralError::InvalidEscape { offset })?;
                    }
                }
            }
            code
        } else {
            let high = self.hex_digits(4, offset)?;
            if (0xD800..0xDC00).contains(&high)
                && self.chars.get(self.pos) == Some(&'\\')
                && self.chars.get(self.pos + 1) == Some(&'u')
            {
                self.pos += 2;
                let low = self.hex_digits(4, offset)?;
                0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF)
            } else {
                high
            }
        };
        char::from_u32(code).ok_or(LiteralError::InvalidEscape { offset })
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        {
            // exponent signs
            if matches!(self.peek(), Some('e' | 'E'))
                && matches!(self.chars.get(self.pos + 1), Some('-' | '+'))
            {
                self.pos += 1;
            }
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let cleaned = text.replace('_', "");
        let invalid = || LiteralError::InvalidNumber {
            text: text.clone(),
            offset: start,
        };

        if let Ok(int) = cleaned.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        let float: f64 = cleaned.parse().map_err(|_| invalid())?;
        Number::from_f64(float).map(Value::Number).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn nesting_is_bounded() {
        let at_limit = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse(&at_limit).is_ok());

        let too_deep = format!("{}1{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert_eq!(
            parse(&too_deep),
            Err(LiteralError::TooDeep { offset: MAX_DEPTH })
        );
        let objects = "{a:".repeat(50_000);
        assert!(matches!(parse(&objects), Err(LiteralError::TooDeep { .. })));
    }

    #[test]
    fn reads_object_literals() {
        let value = parse(
            r#"[
                {
                    question: "Q1",
                    options: [{ label: 'A' }, { label: "B", correct: true },],
                    explanation: `multi
line`,
                },
            ]"#,
        )
        .expect("can parse literal");
        assert_eq!(
            value,
            json!([{
                "question": "Q1",
                "options": [{"label": "A"}, {"label": "B", "correct": true}],
                "explanation": "multi\nline"
            }])
        );
    }

    #[test]
    fn reads_scalars_and_escapes() {
        assert_eq!(parse("42").expect("int"), json!(42));
        assert_eq!(parse("-1.5e3").expect("float"), json!(-1500.0));
        assert_eq!(parse("null").expect("null"), Value::Null);
        assert_eq!(parse("undefined").expect("undefined"), Value::Null);
        assert_eq!(
            parse(r#"'it\'s 中\u{6587} \x41'"#).expect("escapes"),
            json!("it's 中文 A")
        );
        assert_eq!(
            parse(r#"{ "quoted key": 1, 2: 'two' /* note */ } // trailing"#).expect("keys"),
            json!({"quoted key": 1, "2": "two"})
        );
    }

    #[test]
    fn rejects_code() {
        assert!(matches!(
            parse("[questions]"),
            Err(LiteralError::Identifier { .. })
        ));
        assert!(matches!(
            parse("`${x}`"),
            Err(LiteralError::Interpolation { .. })
        ));
        assert!(matches!(parse("[1, 2"), Err(LiteralError::UnexpectedEnd)));
        assert!(matches!(
            parse("[1] + [2]"),
            Err(LiteralError::UnexpectedChar { found: '+', .. })
        ));
        assert!(matches!(
            parse("fetch('x')"),
            Err(LiteralError::Identifier { .. })
        ));
    }
}
