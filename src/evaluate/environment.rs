//! Lexical scoping, per spec.md §4.2: "An `Environment` — stacked lexical
//! scopes for variables, functions, mixins, plus a reference to the current
//! module."

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::{Callable, Value};

#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Rc<Callable>>,
    mixins: HashMap<String, Rc<Callable>>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }
}

/// A stack of lexical scopes. Index 0 is the module-global scope; later
/// entries are nested block scopes (style rules, `@if`, mixin/function
/// bodies, `@each`/`@for`/`@while` bodies).
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Rc<std::cell::RefCell<Vec<Scope>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            scopes: Rc::new(std::cell::RefCell::new(vec![Scope::new()])),
        }
    }

    /// A fresh environment sharing no scopes with `self` — used when
    /// capturing the environment for a user-defined function/mixin closure,
    /// which should observe the module scope at declaration time but get
    /// its own stack for parameter binding.
    pub fn snapshot(&self) -> Environment {
        Environment {
            scopes: Rc::new(std::cell::RefCell::new(self.scopes.borrow().clone())),
        }
    }

    pub fn push_scope(&self) {
        self.scopes.borrow_mut().push(Scope::new());
    }

    pub fn pop_scope(&self) {
        self.scopes.borrow_mut().pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.borrow().len()
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.borrow().iter().rev() {
            if let Some(v) = scope.variables.get(name) {
                return Some(v.clone());
            }
        }
        None
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.get_variable(name).is_some()
    }

    /// Assign in the innermost scope that already declares `name`, or in the
    /// current innermost scope if undeclared anywhere (local declaration).
    pub fn set_variable_local(&self, name: &str, value: Value) {
        let mut scopes = self.scopes.borrow_mut();
        for scope in scopes.iter_mut().rev() {
            if scope.variables.contains_key(name) {
                scope.variables.insert(name.to_string(), value);
                return;
            }
        }
        scopes
            .last_mut()
            .expect("at least one scope")
            .variables
            .insert(name.to_string(), value);
    }

    /// `!global`: assign in the module's outermost scope regardless of
    /// nesting depth (spec.md §4.2 `visitVariableDeclaration`).
    pub fn set_variable_global(&self, name: &str, value: Value) {
        self.scopes.borrow_mut()[0]
            .variables
            .insert(name.to_string(), value);
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<Callable>> {
        for scope in self.scopes.borrow().iter().rev() {
            if let Some(f) = scope.functions.get(name) {
                return Some(f.clone());
            }
        }
        None
    }

    pub fn set_function_local(&self, name: &str, callable: Rc<Callable>) {
        self.scopes
            .borrow_mut()
            .last_mut()
            .expect("at least one scope")
            .functions
            .insert(name.to_string(), callable);
    }

    pub fn get_mixin(&self, name: &str) -> Option<Rc<Callable>> {
        for scope in self.scopes.borrow().iter().rev() {
            if let Some(m) = scope.mixins.get(name) {
                return Some(m.clone());
            }
        }
        None
    }

    pub fn set_mixin_local(&self, name: &str, callable: Rc<Callable>) {
        self.scopes
            .borrow_mut()
            .last_mut()
            .expect("at least one scope")
            .mixins
            .insert(name.to_string(), callable);
    }

    /// Snapshot of the module-global scope's bindings, used to build a
    /// `Module`'s exposed `variables`/`functions`/`mixins` maps when
    /// evaluation of that module's stylesheet completes.
    pub fn global_bindings(
        &self,
    ) -> (
        HashMap<String, Value>,
        HashMap<String, Rc<Callable>>,
        HashMap<String, Rc<Callable>>,
    ) {
        let scopes = self.scopes.borrow();
        let global = &scopes[0];
        (
            global.variables.clone(),
            global.functions.clone(),
            global.mixins.clone(),
        )
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
