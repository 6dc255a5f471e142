use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Object;
use crate::token::Token;

/// A lexical scope: a name→value map plus an optional link to the enclosing
/// scope, forming a chain rooted at the globals.
///
/// Scopes are shared through `Rc<RefCell<...>>` because closures keep their
/// defining environment alive after the block that created it has exited.
#[derive(Debug)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Object>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment {
            enclosing,
            values: HashMap::new(),
        }
    }

    /// Binds a name in this scope, overwriting any previous binding.
    pub fn define(&mut self, name: &str, value: Object) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks a name up through the chain, innermost scope first.
    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme)))
    }

    /// Reassigns an existing binding, searching the chain like [`get`](Self::get).
    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme)))
    }

    /// Reads a name from the scope exactly `distance` links up the chain.
    /// No searching: the resolver already decided where the binding lives.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Object> {
        if distance == 0 {
            self.values.get(name).cloned()
        } else {
            self.ancestor(distance).borrow().values.get(name).cloned()
        }
    }

    /// Writes a name into the scope exactly `distance` links up the chain.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Object) {
        if distance == 0 {
            self.values.insert(name.to_string(), value);
        } else {
            self.ancestor(distance).borrow_mut().values.insert(name.to_string(), value);
        }
    }

    /// The environment `distance` links up the chain, for `distance >= 1`.
    fn ancestor(&self, distance: usize) -> Rc<RefCell<Environment>> {
        let mut environment = self.enclosing.clone()
            .expect("resolved depth stays within the environment chain");

        for _ in 1..distance {
            let enclosing = environment.borrow().enclosing.clone()
                .expect("resolved depth stays within the environment chain");
            environment = enclosing;
        }

        environment
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::TokenKind;

    fn name(lexeme: &str) -> Token {
        Token::new(TokenKind::Identifier, lexeme.to_string(), None, 1)
    }

    #[test]
    fn define_and_get() {
        let mut environment = Environment::new(None);
        environment.define("a", Object::from(1.0));

        assert_eq!(environment.get(&name("a")).unwrap(), Object::from(1.0));
        assert!(environment.get(&name("b")).is_err());
    }

    #[test]
    fn redefining_overwrites() {
        let mut environment = Environment::new(None);
        environment.define("a", Object::from(1.0));
        environment.define("a", Object::from("again"));

        assert_eq!(environment.get(&name("a")).unwrap(), Object::from("again"));
    }

    #[test]
    fn get_searches_enclosing_scopes() {
        let globals = Rc::new(RefCell::new(Environment::new(None)));
        globals.borrow_mut().define("a", Object::from(1.0));

        let inner = Environment::new(Some(Rc::clone(&globals)));
        assert_eq!(inner.get(&name("a")).unwrap(), Object::from(1.0));
    }

    #[test]
    fn shadowing_leaves_the_outer_binding_alone() {
        let outer = Rc::new(RefCell::new(Environment::new(None)));
        outer.borrow_mut().define("a", Object::from("outer"));

        let mut inner = Environment::new(Some(Rc::clone(&outer)));
        inner.define("a", Object::from("inner"));

        assert_eq!(inner.get(&name("a")).unwrap(), Object::from("inner"));
        assert_eq!(outer.borrow().get(&name("a")).unwrap(), Object::from("outer"));
    }

    #[test]
    fn assign_walks_to_the_defining_scope() {
        let outer = Rc::new(RefCell::new(Environment::new(None)));
        outer.borrow_mut().define("a", Object::from("before"));

        let mut inner = Environment::new(Some(Rc::clone(&outer)));
        inner.assign(&name("a"), Object::from("after")).unwrap();

        assert_eq!(outer.borrow().get(&name("a")).unwrap(), Object::from("after"));
        assert!(inner.assign(&name("missing"), Object::from(0.0)).is_err());
    }

    #[test]
    fn distance_addressed_access_skips_searching() {
        let root = Rc::new(RefCell::new(Environment::new(None)));
        root.borrow_mut().define("a", Object::from("root"));

        let middle = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&root)))));
        middle.borrow_mut().define("a", Object::from("middle"));

        let mut leaf = Environment::new(Some(Rc::clone(&middle)));
        leaf.define("a", Object::from("leaf"));

        assert_eq!(leaf.get_at(0, "a"), Some(Object::from("leaf")));
        assert_eq!(leaf.get_at(1, "a"), Some(Object::from("middle")));
        assert_eq!(leaf.get_at(2, "a"), Some(Object::from("root")));

        leaf.assign_at(2, "a", Object::from("rewritten"));
        assert_eq!(root.borrow().get_at(0, "a"), Some(Object::from("rewritten")));
        assert_eq!(middle.borrow().get_at(0, "a"), Some(Object::from("middle")));
    }
}
