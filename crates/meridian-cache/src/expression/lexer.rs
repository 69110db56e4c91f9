//! Tokenizer for key and predicate templates.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `#name`
    Variable(String),
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Plus,
    EqEq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    AndAnd,
    OrOr,
    Bang,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => write!(f, "#{}", name),
            Self::Ident(name) => f.write_str(name),
            Self::Str(s) => write!(f, "'{}'", s),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Dot => f.write_str("."),
            Self::LBracket => f.write_str("["),
            Self::RBracket => f.write_str("]"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::Plus => f.write_str("+"),
            Self::EqEq => f.write_str("=="),
            Self::NotEq => f.write_str("!="),
            Self::Gt => f.write_str(">"),
            Self::Ge => f.write_str(">="),
            Self::Lt => f.write_str("<"),
            Self::Le => f.write_str("<="),
            Self::AndAnd => f.write_str("&&"),
            Self::OrOr => f.write_str("||"),
            Self::Bang => f.write_str("!"),
        }
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn number(&mut self, negative: bool) -> Result<Token, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let mut text: String = self.chars[start..self.pos].iter().collect();
        if negative {
            text.insert(0, '-');
        }
        if is_float {
            text.parse()
                .map(Token::Float)
                .map_err(|_| format!("invalid number '{}' at {}", text, start))
        } else {
            text.parse()
                .map(Token::Int)
                .map_err(|_| format!("integer '{}' out of range at {}", text, start))
        }
    }

    fn string(&mut self, quote: char) -> Result<Token, String> {
        let start = self.pos;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => {
                    // doubled quote is an escaped quote
                    if self.eat(quote) {
                        value.push(quote);
                    } else {
                        return Ok(Token::Str(value));
                    }
                }
                Some(c) => value.push(c),
                None => return Err(format!("unterminated string starting at {}", start - 1)),
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, String> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let token = match c {
            '#' => {
                if !self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
                    return Err(format!("expected a name after '#' at {}", start));
                }
                Token::Variable(self.identifier())
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.pos -= 1;
                Token::Ident(self.identifier())
            }
            c if c.is_ascii_digit() => {
                self.pos -= 1;
                self.number(false)?
            }
            '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.number(true)?,
            '\'' | '"' => self.string(c)?,
            '.' => Token::Dot,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '+' => Token::Plus,
            '=' if self.eat('=') => Token::EqEq,
            '!' if self.eat('=') => Token::NotEq,
            '!' => Token::Bang,
            '>' if self.eat('=') => Token::Ge,
            '>' => Token::Gt,
            '<' if self.eat('=') => Token::Le,
            '<' => Token::Lt,
            '&' if self.eat('&') => Token::AndAnd,
            '|' if self.eat('|') => Token::OrOr,
            other => return Err(format!("unexpected character '{}' at {}", other, start)),
        };
        Ok(Some(token))
    }
}

/// Splits a template into tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}
