use crate::expr::Expr;
use crate::stmt::Stmt;

/// Builds a parenthesized string from an operator name and sub-expressions.
macro_rules! parenthesize {
    ( $self:ident, $name:expr $( , $expr:expr )* ) => {{
        let mut string = String::new();
        string += "(";
        string += $name;
        $(
            string += " ";
            string += &$self.print($expr);
        )*
        string += ")";

        string
    }};
}

/// Renders the AST in a fully parenthesized prefix form, mostly for tests
/// that pin down precedence and associativity, and for debugging the parser.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => literal.to_string(),
            Expr::Grouping(data) => parenthesize!(self, "group", &data.expr),
            Expr::Unary(data) => parenthesize!(self, &data.operator.lexeme, &data.expr),
            Expr::Binary(data) => parenthesize!(self, &data.operator.lexeme, &data.left, &data.right),
            Expr::Logical(data) => parenthesize!(self, &data.operator.lexeme, &data.left, &data.right),
            Expr::Variable(data) => data.name.lexeme.clone(),
            Expr::Assign(data) => parenthesize!(self, &format!("= {}", data.name.lexeme), &data.value),
            Expr::Call(data) => {
                let mut string = String::new();
                string += "(call ";
                string += &self.print(&data.callee);
                for argument in &data.arguments {
                    string += " ";
                    string += &self.print(argument);
                }
                string += ")";

                string
            }
            Expr::Get(data) => {
                format!("(. {} {})", self.print(&data.object), data.name.lexeme)
            }
            Expr::Set(data) => {
                format!(
                    "(.= {} {} {})",
                    self.print(&data.object),
                    data.name.lexeme,
                    self.print(&data.value)
                )
            }
            Expr::This(_) => "this".to_string(),
            Expr::Super(data) => format!("(super {})", data.method.lexeme),
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(data) => parenthesize!(self, "expr", &data.expr),
            Stmt::Print(data) => parenthesize!(self, "print", &data.expr),
            Stmt::Var(data) => match &data.initializer {
                Some(initializer) => {
                    format!("(var {} = {})", data.name.lexeme, self.print(initializer))
                }
                None => format!("(var {})", data.name.lexeme),
            },
            Stmt::Block(data) => {
                let mut string = String::from("{");
                for statement in &data.statements {
                    string += " ";
                    string += &self.print_stmt(statement);
                }
                string += " }";

                string
            }
            Stmt::If(data) => {
                let mut string = format!(
                    "(if {} {}",
                    self.print(&data.condition),
                    self.print_stmt(&data.then_branch)
                );
                if let Some(else_branch) = &data.else_branch {
                    string += &format!(" else {}", self.print_stmt(else_branch));
                }
                string += ")";

                string
            }
            Stmt::While(data) => {
                format!(
                    "(while {} {})",
                    self.print(&data.condition),
                    self.print_stmt(&data.body)
                )
            }
            Stmt::Function(data) => {
                let params = data.params
                    .iter()
                    .map(|param| param.lexeme.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let body = data.body
                    .iter()
                    .map(|statement| self.print_stmt(statement))
                    .collect::<Vec<_>>()
                    .join(" ");

                format!("(fun {} ({params}) {body})", data.name.lexeme)
            }
            Stmt::Return(data) => match &data.value {
                Some(value) => parenthesize!(self, "return", value),
                None => "(return)".to_string(),
            },
            Stmt::Class(data) => {
                let mut string = format!("(class {}", data.name.lexeme);
                if let Some(superclass) = &data.superclass {
                    string += &format!(" < {}", superclass.name.lexeme);
                }
                for method in &data.methods {
                    string += " ";
                    string += &self.print_stmt(&Stmt::Function(method.clone()));
                }
                string += ")";

                string
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Reporter;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn print_program(source: &str) -> String {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens, 0, &mut reporter).parse();
        assert!(!reporter.had_error());

        statements
            .iter()
            .map(|statement| AstPrinter.print_stmt(statement))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn statements_print_in_prefix_form() {
        assert_eq!(print_program("var a = 1 + 2;"), "(var a = (+ 1 2))");
        assert_eq!(print_program("{ print nil; }"), "{ (print nil) }");
        assert_eq!(
            print_program("if (a) print 1; else print 2;"),
            "(if a (print 1) else (print 2))"
        );
        assert_eq!(
            print_program("fun add(a, b) { return a + b; }"),
            "(fun add (a b) (return (+ a b)))"
        );
        assert_eq!(
            print_program("class A < B { go() { return this; } }"),
            "(class A < B (fun go () (return this)))"
        );
    }
}
