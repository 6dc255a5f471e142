use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};
use substring::Substring;

use crate::error::{Reporter, ScanError};
use crate::literal::Literal;
use crate::token::{Token, TokenKind};

/// Turns source text into a token stream in a single forward pass.
///
/// The scanner walks a [`PeekMoreIterator`] over the source characters: one
/// character of lookahead decides two-character operators, two characters
/// decide whether a `.` starts the fractional part of a number. `start` and
/// `current` are char offsets into the source, and lexemes are sliced back
/// out of it verbatim.
///
/// Lexical errors are reported and the offending character skipped, so a
/// single scan surfaces every error in the source. The returned token list
/// always ends with an end-of-file token.
pub struct Scanner<'s, 'r> {
    source: &'s str,
    chars: PeekMoreIterator<Chars<'s>>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    reporter: &'r mut Reporter,
}

impl<'s, 'r> Scanner<'s, 'r> {
    pub fn new(source: &'s str, reporter: &'r mut Reporter) -> Scanner<'s, 'r> {
        Scanner {
            source,
            chars: source.chars().peekmore(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            reporter,
        }
    }

    /// Scans the whole source and returns the tokens.
    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::new(TokenKind::Eof, String::new(), None, self.line));
        self.tokens
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    /// Consumes and returns the next character.
    fn advance(&mut self) -> char {
        let c = self.chars.next().expect("advance is only called before the end of the source");
        self.current += 1;
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_next(&mut self) -> Option<char> {
        self.chars.peek_nth(1).copied()
    }

    /// Consumes the next character only if it matches `expected`.
    fn match_next(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The verbatim source text of the token being scanned.
    fn lexeme(&self) -> &str {
        self.source.substring(self.start, self.current)
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_literal_token(kind, None);
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let lexeme = self.lexeme().to_string();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    fn error(&mut self, message: &str) {
        self.reporter.scan_error(&ScanError {
            line: self.line,
            message: message.to_string(),
        });
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),

            '!' => {
                let kind = if self.match_next('=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_next('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_next('=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_next('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.add_token(kind);
            }

            '/' => {
                if self.match_next('/') {
                    // A comment runs to the end of the line.
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }

            ' ' | '\r' | '\t' => {}

            '\n' => self.line += 1,

            '"' => self.string(),

            c if c.is_ascii_digit() => self.number(),

            c if c.is_alphabetic() || c == '_' => self.identifier(),

            _ => self.error("Unexpected character."),
        }
    }

    /// Scans a string literal. The opening quote has already been consumed.
    fn string(&mut self) {
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.error("Unterminated string.");
            return;
        }

        self.advance(); // The closing quote.

        // The literal drops the quotes, the lexeme keeps them.
        let value = self.source.substring(self.start + 1, self.current - 1).to_string();
        self.add_literal_token(TokenKind::String, Some(Literal::String(value)));
    }

    /// Scans a number literal. The first digit has already been consumed.
    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // A '.' only belongs to the number when a digit follows; otherwise it
        // is left for the next token.
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();

            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let value: f64 = self.lexeme().parse().expect("scanned number lexemes parse as f64");
        self.add_literal_token(TokenKind::Number, Some(Literal::Number(value)));
    }

    /// Scans an identifier or a keyword.
    fn identifier(&mut self) {
        // is_alphanumeric does not include underscores.
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let kind = match self.lexeme() {
            "and"    => TokenKind::And,
            "class"  => TokenKind::Class,
            "else"   => TokenKind::Else,
            "false"  => TokenKind::False,
            "for"    => TokenKind::For,
            "fun"    => TokenKind::Fun,
            "if"     => TokenKind::If,
            "nil"    => TokenKind::Nil,
            "or"     => TokenKind::Or,
            "print"  => TokenKind::Print,
            "return" => TokenKind::Return,
            "super"  => TokenKind::Super,
            "this"   => TokenKind::This,
            "true"   => TokenKind::True,
            "var"    => TokenKind::Var,
            "while"  => TokenKind::While,
            _        => TokenKind::Identifier,
        };

        self.add_token(kind);
    }
}
