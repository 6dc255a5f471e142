use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::class::Instance;
use crate::environment::Environment;
use crate::error::Unwind;
use crate::interpreter::Interpreter;
use crate::object::{Callable, Object};
use crate::stmt::FunctionData;

/// A user-defined function value: the declaration it was built from plus the
/// environment it closed over.
///
/// The closure is captured at declaration time, so the function keeps access
/// to its defining scope after that scope has exited. Binding a method chains
/// one more environment holding `this` in front of the closure.
#[derive(Clone)]
pub struct Function {
    declaration: Rc<FunctionData>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl Function {
    pub fn new(
        declaration: Rc<FunctionData>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Function {
        Function { declaration, closure, is_initializer }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this function with `this` bound to the given instance.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));
        environment.define("this", Object::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

/// Two function values are equal only when they are the same declaration
/// closed over the same environment.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.declaration, &other.declaration)
            && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl<W: Write> Callable<W> for Function {
    fn arity(&self) -> usize {
        Function::arity(self)
    }

    fn call(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Object>,
    ) -> Result<Object, Unwind> {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {}
            Err(Unwind::Return(value)) => {
                if !self.is_initializer {
                    return Ok(value);
                }
            }
            Err(error) => return Err(error),
        }

        if self.is_initializer {
            // An initializer always hands back the instance it was bound to,
            // even through a bare `return;`.
            let this = self.closure.borrow().get_at(0, "this")
                .expect("initializers are bound to an instance before being called");
            return Ok(this);
        }

        Ok(Object::nil())
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

// Not derived: a function's closure can hold the function itself, and a
// derived Debug would chase that cycle.
impl Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// A function implemented by the host.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub function: fn(&[Object]) -> Object,
}

impl NativeFunction {
    /// The native functions every global environment starts with.
    pub fn globals() -> Vec<NativeFunction> {
        vec![
            NativeFunction {
                name: "clock",
                arity: 0,
                function: |_| {
                    let now = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .expect("system clock is set past the epoch");
                    Object::from(now.as_secs_f64())
                },
            },
        ]
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function
    }
}

impl<W: Write> Callable<W> for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter<W>,
        arguments: Vec<Object>,
    ) -> Result<Object, Unwind> {
        Ok((self.function)(&arguments))
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
