use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::io::Write;
use std::rc::Rc;

use crate::error::{RuntimeError, Unwind};
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::object::{Callable, Object};
use crate::token::Token;

/// A class value: a name, an optional superclass, and the methods declared in
/// its body. Classes are immutable once constructed and shared by `Rc`, so
/// instance equality and method lookup both work off the same allocation.
pub struct Class {
    pub name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Function>,
    ) -> Class {
        Class { name, superclass, methods }
    }

    /// Finds a method by name, walking up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass.as_ref().and_then(|superclass| superclass.find_method(name))
    }
}

/// Calling a class constructs an instance, running `init` when declared.
impl<W: Write> Callable<W> for Rc<Class> {
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Object>,
    ) -> Result<Object, Unwind> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(init) = self.find_method("init") {
            init.bind(Rc::clone(&instance)).call(interpreter, arguments)?;
        }

        Ok(Object::Instance(instance))
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// An instance: a reference to its class plus its own field map.
pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Object>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Instance {
        Instance { class, fields: HashMap::new() }
    }

    /// A property read. Fields shadow methods; methods come back bound to
    /// this instance.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(field) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(field.clone());
        }

        if let Some(method) = instance.borrow().class.find_method(&name.lexeme) {
            return Ok(Object::Function(method.bind(Rc::clone(instance))));
        }

        Err(RuntimeError::new(name, format!("Undefined property '{}'.", name.lexeme)))
    }

    /// A property write. Always lands in the field map, never on the class.
    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<instance {}>", self.class.name)
    }
}
