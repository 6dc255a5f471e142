//! Slate is a small dynamically typed scripting language with first-class
//! functions, lexical closures, single-inheritance classes, and C-like
//! control flow. This crate is its tree-walking interpreter: source text goes
//! through a hand-written scanner and recursive descent parser, a static
//! resolution pass, and an AST evaluator backed by a chain of environments.
//!
//! ## Scanning
//! The [`scanner`] walks the source characters once and produces a list of
//! [`Token`](token::Token)s, each carrying its kind, verbatim lexeme, literal
//! payload, and line. Lexical problems (an unterminated string, a stray
//! character) are reported through the [`Reporter`](error::Reporter) and the
//! scan carries on, so one pass surfaces every lexical error in the file.
//!
//! ## Parsing
//! The [`parser`] is a recursive descent over the token list, one function
//! per precedence level. It builds the [`Expr`](expr::Expr) and
//! [`Stmt`](stmt::Stmt) trees, rewrites `for` loops into `while` loops as it
//! goes, and stamps every variable reference with an
//! [`ExprId`](expr::ExprId) so later passes can tell two mentions of the same
//! name apart. On a syntax error it reports, skips ahead to the next likely
//! statement boundary, and keeps parsing to collect further errors.
//!
//! ## Resolving
//! The [`resolver`] runs between parsing and execution. It replays the
//! scoping rules statically, telling each variable use how many environments
//! up its binding lives, and rejects the handful of programs that are
//! syntactically fine but semantically nonsense, like `return` at the top
//! level or a local variable that reads itself in its own initializer.
//!
//! ## Interpreting
//! The [`interpreter`] evaluates the tree directly. Values are
//! [`Object`](object::Object)s; scopes are [`Environment`](environment::Environment)s
//! chained up to a global root that holds the native `clock` function.
//! Functions capture their defining environment, classes bind methods to
//! instances on access, and `return` unwinds through the evaluator as an
//! [`Unwind`](error::Unwind) that only the call machinery catches. Runtime
//! errors surface after the static passes have had their say, and leave the
//! globals intact so a REPL can keep going.

use std::io::Write;

pub mod ast;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;

use error::Reporter;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// One interpreter session: the pipeline plus the error state of the current
/// run.
///
/// The session owns the interpreter, so globals and resolution data persist
/// across [`run`](Self::run) calls; a REPL feeds it one line at a time and
/// calls [`reset_errors`](Self::reset_errors) between lines. `print` output
/// goes to the sink; diagnostics go to stderr.
pub struct Session<W: Write> {
    interpreter: Interpreter<W>,
    reporter: Reporter,
    next_id: u32,
}

impl<W: Write> Session<W> {
    pub fn new(sink: W) -> Session<W> {
        Session {
            interpreter: Interpreter::new(sink),
            reporter: Reporter::new(),
            next_id: 0,
        }
    }

    /// Runs a complete source text through the pipeline.
    ///
    /// Each stage only runs when the previous ones were clean; the error
    /// flags record how far the run got.
    pub fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source, &mut self.reporter).scan_tokens();
        if self.reporter.had_error() {
            return;
        }

        let mut parser = Parser::new(tokens, self.next_id, &mut self.reporter);
        let statements = parser.parse();
        self.next_id = parser.next_id();
        if self.reporter.had_error() {
            return;
        }

        Resolver::new(&mut self.interpreter, &mut self.reporter).resolve(&statements);
        if self.reporter.had_error() {
            return;
        }

        self.interpreter.interpret(&statements, &mut self.reporter);
    }

    /// Whether a scan, parse, or resolution error occurred.
    pub fn had_error(&self) -> bool {
        self.reporter.had_error()
    }

    /// Whether a runtime error occurred.
    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error()
    }

    /// Clears both error flags. Interpreter state is kept.
    pub fn reset_errors(&mut self) {
        self.reporter.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(source: &str) -> (String, bool, bool) {
        let mut output = Vec::new();
        let mut session = Session::new(&mut output);
        session.run(source);
        let had_error = session.had_error();
        let had_runtime_error = session.had_runtime_error();
        drop(session);

        (String::from_utf8(output).unwrap(), had_error, had_runtime_error)
    }

    #[test]
    fn a_clean_program_runs_to_completion() {
        let (output, had_error, had_runtime_error) = run("print 1 + 2 * 3;");
        assert_eq!(output, "7\n");
        assert!(!had_error);
        assert!(!had_runtime_error);
    }

    #[test]
    fn a_parse_error_stops_the_pipeline_before_execution() {
        let (output, had_error, had_runtime_error) = run("print 1; print ;");
        assert_eq!(output, "");
        assert!(had_error);
        assert!(!had_runtime_error);
    }

    #[test]
    fn a_runtime_error_sets_only_the_runtime_flag() {
        let (output, had_error, had_runtime_error) = run("print 1; print 2 + nil;");
        assert_eq!(output, "1\n");
        assert!(!had_error);
        assert!(had_runtime_error);
    }

    #[test]
    fn globals_survive_across_runs_like_a_repl() {
        let mut output = Vec::new();
        let mut session = Session::new(&mut output);

        session.run("var a = 1;");
        session.run("print a;");
        session.run("a + nil;");
        assert!(session.had_runtime_error());
        session.reset_errors();

        session.run("fun twice(n) { return n * 2; }");
        session.run("print twice(a + 20);");

        assert!(!session.had_error());
        assert!(!session.had_runtime_error());
        drop(session);
        assert_eq!(String::from_utf8(output).unwrap(), "1\n42\n");
    }
}
