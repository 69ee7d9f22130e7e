use crate::{
    ast::{Keyword, Token, TokenKind},
    diagnostic::{Diagnostic, DiagnosticKind, Position},
};

/// Turns source text into tokens, one at a time.
///
/// The lexer is also an [`Iterator`] over `Result<Token, Diagnostic>`: it
/// yields every token up to and including [`TokenKind::Eof`] and then stops.
/// A lexical error is yielded in place of the offending token and lexing
/// resumes after it, so a caller can collect several errors in one pass.
/// Cloning a lexer, or calling [`Lexer::reset`], restarts from the beginning.
#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Rewinds to the start of the source.
    pub fn reset(&mut self) {
        self.position = 0;
        self.line = 1;
        self.column = 1;
        self.finished = false;
    }

    fn here(&self) -> Position {
        Position::new(self.position, self.line, self.column)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    /// Skips whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some('/') if self.peek_char(1) == Some('/') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, Diagnostic> {
        let opening = self.here();
        let mut result = String::new();
        let mut invalid_escape: Option<Diagnostic> = None;
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return match invalid_escape {
                        Some(err) => Err(err),
                        None => Ok(result),
                    };
                }
                '\\' => {
                    let escape_at = self.here();
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(other) => {
                            invalid_escape.get_or_insert(Diagnostic::new(
                                DiagnosticKind::InvalidEscape { escape: other },
                                escape_at,
                            ));
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(invalid_escape
            .unwrap_or_else(|| Diagnostic::new(DiagnosticKind::UnterminatedString, opening)))
    }

    fn read_number(&mut self) -> Result<TokenKind, Diagnostic> {
        let start = self.here();
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Digits with at most one inner dot always parse; only overflow can fail
        match number.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(TokenKind::Number(n)),
            _ => Err(Diagnostic::new(
                DiagnosticKind::NumberOutOfRange {
                    digits: number.chars().filter(char::is_ascii_digit).count(),
                },
                start,
            )),
        }
    }

    /// Reads the next token. Once the input is exhausted this keeps returning
    /// [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        self.skip_trivia();

        let start = self.position;
        let position = self.here();

        let single = |lexer: &mut Lexer, kind: TokenKind| {
            lexer.advance();
            kind
        };
        let pair = |lexer: &mut Lexer, second: char, double: TokenKind, alone: TokenKind| {
            if lexer.peek_char(1) == Some(second) {
                lexer.advance();
                lexer.advance();
                double
            } else {
                lexer.advance();
                alone
            }
        };

        let kind = match self.current_char() {
            None => TokenKind::Eof,
            Some('+') => single(self, TokenKind::Plus),
            Some('-') => single(self, TokenKind::Minus),
            Some('*') => single(self, TokenKind::Star),
            Some('/') => single(self, TokenKind::Slash),
            Some('%') => single(self, TokenKind::Percent),
            Some('(') => single(self, TokenKind::LParen),
            Some(')') => single(self, TokenKind::RParen),
            Some('[') => single(self, TokenKind::LBracket),
            Some(']') => single(self, TokenKind::RBracket),
            Some(',') => single(self, TokenKind::Comma),
            Some('.') => single(self, TokenKind::Dot),
            Some('<') => pair(self, '=', TokenKind::LtEq, TokenKind::Lt),
            Some('>') => pair(self, '=', TokenKind::GtEq, TokenKind::Gt),
            Some('=') if self.peek_char(1) == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::EqEq
            }
            Some('!') if self.peek_char(1) == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::NotEq
            }
            Some(quote @ ('"' | '\'')) => TokenKind::String(self.read_string(quote)?),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let word = self.read_identifier();
                match Keyword::from_word(&word) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Identifier(word),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) => {
                self.advance();
                return Err(Diagnostic::new(
                    DiagnosticKind::UnrecognizedCharacter { character: ch },
                    position,
                ));
            }
        };

        Ok(Token::new(kind, self.text_from(start), position))
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, Diagnostic>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_token();
        if matches!(&item, Ok(token) if token.is_eof()) {
            self.finished = true;
        }
        Some(item)
    }
}

/// Collects every lexical error in `source`, in source order.
pub fn lexical_errors(source: &str) -> Vec<Diagnostic> {
    Lexer::new(source).filter_map(Result::err).collect()
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and or not true false null if then else");
    for keyword in [
        Keyword::And,
        Keyword::Or,
        Keyword::Not,
        Keyword::True,
        Keyword::False,
        Keyword::Null,
        Keyword::If,
        Keyword::Then,
        Keyword::Else,
    ] {
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Keyword(keyword));
    }
    assert!(lexer.next_token().unwrap().is_eof());
}

#[test]
fn test_rule() {
    let kinds: Vec<TokenKind> = Lexer::new("amount >= 1000")
        .map(|t| t.unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier("amount".to_string()),
            TokenKind::GtEq,
            TokenKind::Number(1000.0),
            TokenKind::Eof,
        ]
    );
}
