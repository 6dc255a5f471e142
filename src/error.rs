use thiserror::Error;

use crate::object::Object;
use crate::token::{Token, TokenKind};

/// An error raised while scanning source text into tokens.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

/// An error raised while parsing tokens into an AST.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl ParseError {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        ParseError { token: token.clone(), message: message.into() }
    }
}

/// An error raised by the static resolution pass. These programs are
/// syntactically valid but break a scoping rule.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl ResolveError {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        ResolveError { token: token.clone(), message: message.into() }
    }
}

/// An error raised while evaluating the AST.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        RuntimeError { token: token.clone(), message: message.into() }
    }
}

/// A non-local exit propagating up the evaluator.
///
/// `Return` carries the value of a `return` statement and is caught by the
/// function call machinery. `Error` unwinds all the way to
/// [`Interpreter::interpret`](crate::interpreter::Interpreter::interpret).
#[derive(Debug)]
pub enum Unwind {
    Return(Object),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

/// Collects the error state of one run and writes diagnostics to stderr.
///
/// The flags decide which pipeline stages still run and which exit code the
/// driver uses. A REPL resets the reporter between lines.
#[derive(Debug, Default)]
pub struct Reporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    /// Whether a scan, parse, or resolution error was reported.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Whether a runtime error was reported.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn scan_error(&mut self, error: &ScanError) {
        eprintln!("[line {}] Error: {}", error.line, error);
        self.had_error = true;
    }

    pub fn parse_error(&mut self, error: &ParseError) {
        self.report_at(&error.token, &error.message);
    }

    pub fn resolve_error(&mut self, error: &ResolveError) {
        self.report_at(&error.token, &error.message);
    }

    pub fn runtime_error(&mut self, error: &RuntimeError) {
        eprintln!("{}\n[line {}]", error, error.token.line);
        self.had_runtime_error = true;
    }

    fn report_at(&mut self, token: &Token, message: &str) {
        if token.kind == TokenKind::Eof {
            eprintln!("[line {}] Error at end: {}", token.line, message);
        } else {
            eprintln!("[line {}] Error at '{}': {}", token.line, token.lexeme, message);
        }

        self.had_error = true;
    }
}
