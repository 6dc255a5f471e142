use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{Reporter, RuntimeError, Unwind};
use crate::expr::{AssignData, BinaryData, CallData, Expr, ExprId, SuperData};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::{ClassData, Stmt};
use crate::token::{Token, TokenKind};

/// Walks the AST and evaluates it.
///
/// The interpreter owns the global environment (pre-populated with the native
/// functions), the current-environment pointer, and the resolution side-table
/// filled in by the resolver. `print` output goes to the sink supplied at
/// construction; diagnostics go through the [`Reporter`] passed to
/// [`interpret`](Self::interpret).
pub struct Interpreter<W: Write> {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    sink: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(sink: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new(None)));

        for native in NativeFunction::globals() {
            globals.borrow_mut().define(native.name, Object::Native(native));
        }

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            sink,
        }
    }

    /// Executes a program. A runtime error stops execution and is reported;
    /// the global environment keeps whatever state was built up before it.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        for statement in statements {
            if let Err(unwind) = self.execute(statement) {
                match unwind {
                    Unwind::Error(error) => reporter.runtime_error(&error),
                    // The resolver rejects top-level returns.
                    Unwind::Return(_) => unreachable!("return unwound past every call frame"),
                }
                return;
            }
        }
    }

    /// Records the scope distance for a resolved expression.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    #[cfg(test)]
    pub(crate) fn resolved_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(data) => {
                self.evaluate(&data.expr)?;
                Ok(())
            }
            Stmt::Print(data) => {
                let value = self.evaluate(&data.expr)?;
                writeln!(self.sink, "{value}").expect("the print sink accepts writes");
                Ok(())
            }
            Stmt::Var(data) => {
                let value = match &data.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Object::nil(),
                };

                self.environment.borrow_mut().define(&data.name.lexeme, value);
                Ok(())
            }
            Stmt::Block(data) => {
                let environment = Environment::new(Some(Rc::clone(&self.environment)));
                self.execute_block(&data.statements, environment)
            }
            Stmt::If(data) => {
                if self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.then_branch)
                } else if let Some(else_branch) = &data.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(data) => {
                while self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.body)?;
                }
                Ok(())
            }
            Stmt::Function(data) => {
                let function = Function::new(
                    Rc::new(data.clone()),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment.borrow_mut().define(&data.name.lexeme, Object::Function(function));
                Ok(())
            }
            Stmt::Return(data) => {
                let value = match &data.value {
                    Some(value) => self.evaluate(value)?,
                    None => Object::nil(),
                };

                Err(Unwind::Return(value))
            }
            Stmt::Class(data) => self.execute_class(data),
        }
    }

    /// Runs statements in the given environment, restoring the previous
    /// current-environment pointer on every exit path, errors and returns
    /// included.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Environment,
    ) -> Result<(), Unwind> {
        let previous = mem::replace(&mut self.environment, Rc::new(RefCell::new(environment)));

        let mut result = Ok(());
        for statement in statements {
            result = self.execute(statement);
            if result.is_err() {
                break;
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(&mut self, data: &ClassData) -> Result<(), Unwind> {
        let superclass = match &data.superclass {
            Some(variable) => {
                match self.look_up_variable(&variable.name, variable.id)? {
                    Object::Class(class) => Some(class),
                    _ => {
                        return Err(RuntimeError::new(
                            &variable.name,
                            "Superclass must be a class.",
                        ).into());
                    }
                }
            }
            None => None,
        };

        // Declare the name first so methods can refer to the class itself.
        self.environment.borrow_mut().define(&data.name.lexeme, Object::nil());

        // Methods of a subclass close over one extra scope holding `super`.
        let enclosing = superclass.as_ref().map(|class| {
            let mut environment = Environment::new(Some(Rc::clone(&self.environment)));
            environment.define("super", Object::Class(Rc::clone(class)));
            mem::replace(&mut self.environment, Rc::new(RefCell::new(environment)))
        });

        let methods = data.methods
            .iter()
            .map(|method| {
                let function = Function::new(
                    Rc::new(method.clone()),
                    Rc::clone(&self.environment),
                    method.name.lexeme == "init",
                );
                (method.name.lexeme.clone(), function)
            })
            .collect();

        let class = Rc::new(Class::new(data.name.lexeme.clone(), superclass, methods));

        if let Some(enclosing) = enclosing {
            self.environment = enclosing;
        }

        self.environment.borrow_mut().assign(&data.name, Object::Class(class))?;
        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Object, Unwind> {
        match expr {
            Expr::Literal(literal) => Ok(Object::Literal(literal.clone())),
            Expr::Grouping(data) => self.evaluate(&data.expr),
            Expr::Unary(data) => {
                let right = self.evaluate(&data.expr)?;

                match data.operator.kind {
                    TokenKind::Minus => {
                        let number = right.as_number().ok_or_else(|| {
                            RuntimeError::new(&data.operator, "Operand must be a number.")
                        })?;
                        Ok(Object::from(-number))
                    }
                    TokenKind::Bang => Ok(Object::from(!right.is_truthy())),
                    _ => unreachable!("the parser only builds '!' and '-' unary operators"),
                }
            }
            Expr::Binary(data) => self.evaluate_binary(data),
            Expr::Logical(data) => {
                let left = self.evaluate(&data.left)?;

                // The raw operand comes back, not a coerced boolean.
                match data.operator.kind {
                    TokenKind::Or if left.is_truthy() => Ok(left),
                    TokenKind::And if !left.is_truthy() => Ok(left),
                    _ => self.evaluate(&data.right),
                }
            }
            Expr::Variable(data) => Ok(self.look_up_variable(&data.name, data.id)?),
            Expr::Assign(data) => self.evaluate_assign(data),
            Expr::Call(data) => self.evaluate_call(data),
            Expr::Get(data) => {
                let object = self.evaluate(&data.object)?;

                match object {
                    Object::Instance(instance) => Ok(Instance::get(&instance, &data.name)?),
                    _ => Err(RuntimeError::new(&data.name, "Only instances have properties.").into()),
                }
            }
            Expr::Set(data) => {
                let object = self.evaluate(&data.object)?;

                let Object::Instance(instance) = object else {
                    return Err(RuntimeError::new(&data.name, "Only instances have fields.").into());
                };

                let value = self.evaluate(&data.value)?;
                instance.borrow_mut().set(&data.name, value.clone());
                Ok(value)
            }
            Expr::This(data) => Ok(self.look_up_variable(&data.keyword, data.id)?),
            Expr::Super(data) => self.evaluate_super(data),
        }
    }

    fn evaluate_binary(&mut self, data: &BinaryData) -> Result<Object, Unwind> {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;

        match data.operator.kind {
            TokenKind::EqualEqual => Ok(Object::from(left == right)),
            TokenKind::BangEqual => Ok(Object::from(left != right)),
            TokenKind::Plus => match (&left, &right) {
                (Object::Literal(Literal::Number(l)), Object::Literal(Literal::Number(r))) => {
                    Ok(Object::from(l + r))
                }
                (Object::Literal(Literal::String(l)), Object::Literal(Literal::String(r))) => {
                    Ok(Object::from(format!("{l}{r}")))
                }
                _ => Err(RuntimeError::new(
                    &data.operator,
                    "Operands must be two numbers or two strings.",
                ).into()),
            },
            _ => {
                let (l, r) = number_operands(&data.operator, &left, &right)?;

                match data.operator.kind {
                    TokenKind::Greater => Ok(Object::from(l > r)),
                    TokenKind::GreaterEqual => Ok(Object::from(l >= r)),
                    TokenKind::Less => Ok(Object::from(l < r)),
                    TokenKind::LessEqual => Ok(Object::from(l <= r)),
                    TokenKind::Minus => Ok(Object::from(l - r)),
                    // Division follows IEEE-754; dividing by zero is not an error.
                    TokenKind::Slash => Ok(Object::from(l / r)),
                    TokenKind::Star => Ok(Object::from(l * r)),
                    _ => unreachable!("the parser only builds known binary operators"),
                }
            }
        }
    }

    fn evaluate_assign(&mut self, data: &AssignData) -> Result<Object, Unwind> {
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&data.id) {
            Some(&distance) => {
                self.environment
                    .borrow_mut()
                    .assign_at(distance, &data.name.lexeme, value.clone());
            }
            None => self.globals.borrow_mut().assign(&data.name, value.clone())?,
        }

        Ok(value)
    }

    fn evaluate_call(&mut self, data: &CallData) -> Result<Object, Unwind> {
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let callable: &dyn Callable<W> = match &callee {
            Object::Function(function) => function,
            Object::Native(native) => native,
            Object::Class(class) => class,
            _ => {
                return Err(RuntimeError::new(
                    &data.paren,
                    "Can only call functions and classes.",
                ).into());
            }
        };

        if arguments.len() != callable.arity() {
            return Err(RuntimeError::new(
                &data.paren,
                format!("Expected {} arguments but got {}.", callable.arity(), arguments.len()),
            ).into());
        }

        callable.call(self, arguments)
    }

    fn evaluate_super(&mut self, data: &SuperData) -> Result<Object, Unwind> {
        let distance = *self.locals.get(&data.id)
            .expect("'super' resolves to the scope the class declaration opened");
        let superclass = self.environment.borrow().get_at(distance, "super")
            .expect("'super' is bound in its resolved scope");
        let this = self.environment.borrow().get_at(distance - 1, "this")
            .expect("'this' is bound one scope inside 'super'");

        let Object::Class(superclass) = superclass else {
            unreachable!("'super' always holds a class");
        };
        let Object::Instance(instance) = this else {
            unreachable!("'this' always holds an instance");
        };

        match superclass.find_method(&data.method.lexeme) {
            Some(method) => Ok(Object::Function(method.bind(instance))),
            None => Err(RuntimeError::new(
                &data.method,
                format!("Undefined property '{}'.", data.method.lexeme),
            ).into()),
        }
    }

    /// Reads a variable through the resolved depth when one was recorded, and
    /// straight from the globals otherwise.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Object, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => {
                self.environment.borrow().get_at(distance, &name.lexeme).ok_or_else(|| {
                    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
                })
            }
            None => self.globals.borrow().get(name),
        }
    }
}

fn number_operands(
    operator: &Token,
    left: &Object,
    right: &Object,
) -> Result<(f64, f64), RuntimeError> {
    match (left.as_number(), right.as_number()) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}
