use std::collections::HashMap;
use std::io::Write;
use std::mem;

use crate::error::{Reporter, ResolveError};
use crate::expr::{Expr, ExprId, VariableData};
use crate::interpreter::Interpreter;
use crate::stmt::{ClassData, FunctionData, Stmt};
use crate::token::Token;

/// What kind of function body the resolver is currently inside. Decides
/// whether `return` is legal and whether it may carry a value.
#[derive(Clone, Copy)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body the resolver is currently inside. Decides whether
/// `this` and `super` are legal.
#[derive(Clone, Copy)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// The static resolution pass.
///
/// Walks the AST once between parsing and interpretation, mirroring the
/// interpreter's scope structure with a stack of maps. Every use of a local
/// variable is annotated (through [`Interpreter::resolve`]) with the number
/// of scopes between the use and its binding; names that never match a local
/// scope are left for the globals. The same walk diagnoses scope misuse:
/// reading a variable in its own initializer, duplicate declarations,
/// top-level `return`, and `this`/`super` outside their classes.
///
/// The boolean in each scope map is the "defined" flag: declaring sets it to
/// false, defining flips it to true once the initializer has resolved.
pub struct Resolver<'a, W: Write> {
    interpreter: &'a mut Interpreter<W>,
    reporter: &'a mut Reporter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, W: Write> Resolver<'a, W> {
    pub fn new(interpreter: &'a mut Interpreter<W>, reporter: &'a mut Reporter) -> Resolver<'a, W> {
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(data) => self.resolve_expr(&data.expr),
            Stmt::Print(data) => self.resolve_expr(&data.expr),
            Stmt::Var(data) => {
                self.declare(&data.name);
                if let Some(initializer) = &data.initializer {
                    self.resolve_expr(initializer);
                }
                self.define(&data.name);
            }
            Stmt::Block(data) => {
                self.begin_scope();
                self.resolve(&data.statements);
                self.end_scope();
            }
            Stmt::If(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.then_branch);
                if let Some(else_branch) = &data.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.body);
            }
            Stmt::Function(data) => {
                // Defined before the body resolves, so the function can
                // recurse into itself.
                self.declare(&data.name);
                self.define(&data.name);

                self.resolve_function(data, FunctionType::Function);
            }
            Stmt::Return(data) => {
                if let FunctionType::None = self.current_function {
                    self.error(&data.keyword, "Can't return from top-level code.");
                }

                if let Some(value) = &data.value {
                    if let FunctionType::Initializer = self.current_function {
                        self.error(&data.keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(value);
                }
            }
            Stmt::Class(data) => self.resolve_class(data),
        }
    }

    fn resolve_class(&mut self, data: &ClassData) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&data.name);
        self.define(&data.name);

        if let Some(superclass) = &data.superclass {
            if superclass.name.lexeme == data.name.lexeme {
                self.error(&superclass.name, "A class can't inherit from itself.");
            }

            self.current_class = ClassType::Subclass;
            self.resolve_variable(superclass);

            // Methods of a subclass see `super` in a scope wrapped around
            // the one holding `this`.
            self.begin_scope();
            self.scopes
                .last_mut()
                .expect("a scope was just opened")
                .insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes
            .last_mut()
            .expect("a scope was just opened")
            .insert("this".to_string(), true);

        for method in &data.methods {
            let declaration = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, declaration);
        }

        self.end_scope();

        if data.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, function: &FunctionData, kind: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(data) => self.resolve_expr(&data.expr),
            Expr::Unary(data) => self.resolve_expr(&data.expr),
            Expr::Binary(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Logical(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Variable(data) => self.resolve_variable(data),
            Expr::Assign(data) => {
                self.resolve_expr(&data.value);
                self.resolve_local(data.id, &data.name);
            }
            Expr::Call(data) => {
                self.resolve_expr(&data.callee);
                for argument in &data.arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get(data) => self.resolve_expr(&data.object),
            Expr::Set(data) => {
                self.resolve_expr(&data.value);
                self.resolve_expr(&data.object);
            }
            Expr::This(data) => {
                if let ClassType::None = self.current_class {
                    self.error(&data.keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(data.id, &data.keyword);
            }
            Expr::Super(data) => {
                match self.current_class {
                    ClassType::Subclass => {}
                    ClassType::None => {
                        self.error(&data.keyword, "Can't use 'super' outside of a class.");
                    }
                    ClassType::Class => {
                        self.error(&data.keyword, "Can't use 'super' in a class with no superclass.");
                    }
                }

                self.resolve_local(data.id, &data.keyword);
            }
        }
    }

    fn resolve_variable(&mut self, data: &VariableData) {
        if let Some(scope) = self.scopes.last() {
            if scope.get(&data.name.lexeme) == Some(&false) {
                self.error(&data.name, "Can't read local variable in its own initializer.");
            }
        }

        self.resolve_local(data.id, &data.name);
    }

    /// Searches the scope stack innermost-outward; a hit records its distance
    /// on the expression, a miss leaves the name for the globals.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Marks a name as existing-but-unusable while its initializer resolves.
    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            let error = ResolveError::new(name, "Already a variable with this name in this scope.");
            self.reporter.resolve_error(&error);
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        let error = ResolveError::new(token, message);
        self.reporter.resolve_error(&error);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> (Vec<Stmt>, Interpreter<Vec<u8>>, Reporter) {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens, 0, &mut reporter).parse();
        assert!(!reporter.had_error(), "unexpected syntax error in {source:?}");

        let mut interpreter = Interpreter::new(Vec::new());
        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);
        (statements, interpreter, reporter)
    }

    /// Collects the ids of every variable expression with the given name.
    fn variable_ids(statements: &[Stmt], name: &str) -> Vec<ExprId> {
        fn walk_expr(expr: &Expr, name: &str, ids: &mut Vec<ExprId>) {
            match expr {
                Expr::Literal(_) => {}
                Expr::Grouping(data) => walk_expr(&data.expr, name, ids),
                Expr::Unary(data) => walk_expr(&data.expr, name, ids),
                Expr::Binary(data) => {
                    walk_expr(&data.left, name, ids);
                    walk_expr(&data.right, name, ids);
                }
                Expr::Logical(data) => {
                    walk_expr(&data.left, name, ids);
                    walk_expr(&data.right, name, ids);
                }
                Expr::Variable(data) => {
                    if data.name.lexeme == name {
                        ids.push(data.id);
                    }
                }
                Expr::Assign(data) => {
                    if data.name.lexeme == name {
                        ids.push(data.id);
                    }
                    walk_expr(&data.value, name, ids);
                }
                Expr::Call(data) => {
                    walk_expr(&data.callee, name, ids);
                    for argument in &data.arguments {
                        walk_expr(argument, name, ids);
                    }
                }
                Expr::Get(data) => walk_expr(&data.object, name, ids),
                Expr::Set(data) => {
                    walk_expr(&data.value, name, ids);
                    walk_expr(&data.object, name, ids);
                }
                Expr::This(_) | Expr::Super(_) => {}
            }
        }

        fn walk_stmt(stmt: &Stmt, name: &str, ids: &mut Vec<ExprId>) {
            match stmt {
                Stmt::Expression(data) => walk_expr(&data.expr, name, ids),
                Stmt::Print(data) => walk_expr(&data.expr, name, ids),
                Stmt::Var(data) => {
                    if let Some(initializer) = &data.initializer {
                        walk_expr(initializer, name, ids);
                    }
                }
                Stmt::Block(data) => {
                    for statement in &data.statements {
                        walk_stmt(statement, name, ids);
                    }
                }
                Stmt::If(data) => {
                    walk_expr(&data.condition, name, ids);
                    walk_stmt(&data.then_branch, name, ids);
                    if let Some(else_branch) = &data.else_branch {
                        walk_stmt(else_branch, name, ids);
                    }
                }
                Stmt::While(data) => {
                    walk_expr(&data.condition, name, ids);
                    walk_stmt(&data.body, name, ids);
                }
                Stmt::Function(data) => {
                    for statement in &data.body {
                        walk_stmt(statement, name, ids);
                    }
                }
                Stmt::Return(data) => {
                    if let Some(value) = &data.value {
                        walk_expr(value, name, ids);
                    }
                }
                Stmt::Class(data) => {
                    for method in &data.methods {
                        for statement in &method.body {
                            walk_stmt(statement, name, ids);
                        }
                    }
                }
            }
        }

        let mut ids = Vec::new();
        for statement in statements {
            walk_stmt(statement, name, &mut ids);
        }
        ids
    }

    #[test]
    fn local_references_record_their_scope_distance() {
        let (statements, interpreter, reporter) =
            resolve("{ var a = 1; print a; { print a; { print a; } } }");
        assert!(!reporter.had_error());

        let ids = variable_ids(&statements, "a");
        assert_eq!(ids.len(), 3);
        assert_eq!(interpreter.resolved_depth(ids[0]), Some(0));
        assert_eq!(interpreter.resolved_depth(ids[1]), Some(1));
        assert_eq!(interpreter.resolved_depth(ids[2]), Some(2));
    }

    #[test]
    fn global_references_are_left_unannotated() {
        let (statements, interpreter, reporter) = resolve("var a = 1; print a; { print a; }");
        assert!(!reporter.had_error());

        for id in variable_ids(&statements, "a") {
            assert_eq!(interpreter.resolved_depth(id), None);
        }
    }

    #[test]
    fn closures_count_the_function_scope() {
        let (statements, interpreter, reporter) =
            resolve("{ var a = 1; fun f() { print a; } }");
        assert!(!reporter.had_error());

        let ids = variable_ids(&statements, "a");
        assert_eq!(ids.len(), 1);
        // One scope for the function body between the use and the block.
        assert_eq!(interpreter.resolved_depth(ids[0]), Some(1));
    }

    #[test]
    fn shadowing_resolves_to_the_nearest_binding() {
        let (statements, interpreter, reporter) =
            resolve("{ var a = 1; { var a = 2; print a; } }");
        assert!(!reporter.had_error());

        let ids = variable_ids(&statements, "a");
        assert_eq!(interpreter.resolved_depth(ids[0]), Some(0));
    }

    #[test]
    fn reading_a_local_in_its_own_initializer_is_an_error() {
        let (_, _, reporter) = resolve("{ var a = 1; { var a = a; } }");
        assert!(reporter.had_error());
    }

    #[test]
    fn redeclaring_a_local_is_an_error() {
        let (_, _, reporter) = resolve("{ var a = 1; var a = 2; }");
        assert!(reporter.had_error());

        // The globals allow redefinition.
        let (_, _, reporter) = resolve("var a = 1; var a = 2;");
        assert!(!reporter.had_error());
    }

    #[test]
    fn top_level_return_is_an_error() {
        let (_, _, reporter) = resolve("return 1;");
        assert!(reporter.had_error());

        let (_, _, reporter) = resolve("fun f() { return 1; }");
        assert!(!reporter.had_error());
    }

    #[test]
    fn returning_a_value_from_an_initializer_is_an_error() {
        let (_, _, reporter) = resolve("class A { init() { return 1; } }");
        assert!(reporter.had_error());

        // A bare return is how an initializer exits early.
        let (_, _, reporter) = resolve("class A { init() { return; } }");
        assert!(!reporter.had_error());
    }

    #[test]
    fn this_outside_of_a_class_is_an_error() {
        let (_, _, reporter) = resolve("print this;");
        assert!(reporter.had_error());

        let (_, _, reporter) = resolve("fun f() { print this; }");
        assert!(reporter.had_error());

        let (_, _, reporter) = resolve("class A { m() { print this; } }");
        assert!(!reporter.had_error());
    }

    #[test]
    fn super_requires_a_superclass() {
        let (_, _, reporter) = resolve("print super.m;");
        assert!(reporter.had_error());

        let (_, _, reporter) = resolve("class A { m() { return super.m; } }");
        assert!(reporter.had_error());

        let (_, _, reporter) = resolve("class A {} class B < A { m() { return super.m; } }");
        assert!(!reporter.had_error());
    }

    #[test]
    fn a_class_cannot_inherit_from_itself() {
        let (_, _, reporter) = resolve("class A < A {}");
        assert!(reporter.had_error());
    }
}
