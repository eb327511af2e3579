//! Named constants and imported libraries

use crate::ast::Ident;
use crate::errors::{Error, Result};
use crate::eval;
use crate::narrow::{FromConstant, IntoConstant};
use crate::value::{ConstValue, Kind};
use num_complex::Complex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
enum Binding {
    Value(ConstValue),
    Import(FrozenScope),
}

/// A set of constants that expressions can reference by name.
///
/// Names are bound once; later bindings of the same name are ignored.
/// The default value is an empty scope.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
}

/// An immutable, shareable scope. Only frozen scopes can be imported,
/// so a library never changes while another scope reads through it.
#[derive(Debug, Clone)]
pub struct FrozenScope(Arc<Scope>);

impl Deref for FrozenScope {
    type Target = Scope;

    fn deref(&self) -> &Scope {
        &self.0
    }
}

impl From<Scope> for FrozenScope {
    fn from(scope: Scope) -> Self {
        scope.freeze()
    }
}

/// Exported names start with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `expr` in this scope and bind the result to `name`,
    /// unless `name` is already bound.
    pub fn assign(&mut self, name: &str, expr: &str) -> Result<()> {
        let value = self.evaluate(expr)?;
        self.bind(name, Binding::Value(value));
        Ok(())
    }

    /// Bind a native value to `name`, unless `name` is already bound.
    ///
    /// Non-finite floats bind a value that fails when referenced.
    pub fn assign_value(&mut self, name: &str, value: impl IntoConstant) {
        self.bind(name, Binding::Value(value.into_constant()));
    }

    /// Make the exported names of `lib` available as `name.Name`.
    ///
    /// `name` itself must not be exported. The imports of `lib` are not
    /// visible through `name`. `lib` is frozen, so a library cannot gain
    /// names after it has been imported; build it completely first.
    pub fn import(&mut self, name: &str, lib: &FrozenScope) -> Result<()> {
        if is_exported(name) {
            return Err(Error::namespace(
                name,
                "imported scope names cannot be exported",
            ));
        }
        self.bind(name, Binding::Import(lib.clone()));
        Ok(())
    }

    pub fn freeze(self) -> FrozenScope {
        debug!("freezing scope with {} bindings", self.bindings.len());
        FrozenScope(Arc::new(self))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Value bound directly to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&ConstValue> {
        match self.bindings.get(name) {
            Some(Binding::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Exact value of `expr`, without narrowing.
    pub fn evaluate(&self, expr: &str) -> Result<ConstValue> {
        eval::evaluate(expr, self)
    }

    /// Evaluate `expr` and narrow it to `T`.
    pub fn eval_as<T: FromConstant>(&self, expr: &str) -> Result<T> {
        T::from_constant(&self.evaluate(expr)?)
    }

    pub fn int(&self, expr: &str) -> Result<i64> {
        self.eval_as(expr)
    }

    pub fn uint(&self, expr: &str) -> Result<u64> {
        self.eval_as(expr)
    }

    pub fn float64(&self, expr: &str) -> Result<f64> {
        self.eval_as(expr)
    }

    pub fn float32(&self, expr: &str) -> Result<f32> {
        self.eval_as(expr)
    }

    pub fn complex128(&self, expr: &str) -> Result<Complex<f64>> {
        self.eval_as(expr)
    }

    pub fn complex64(&self, expr: &str) -> Result<Complex<f32>> {
        self.eval_as(expr)
    }

    pub fn bool(&self, expr: &str) -> Result<bool> {
        self.eval_as(expr)
    }

    pub fn string(&self, expr: &str) -> Result<String> {
        self.eval_as(expr)
    }

    pub(crate) fn resolve(&self, ident: &Ident) -> Result<ConstValue> {
        let unknown = || Error::UnknownIdentifier(ident.to_string());
        match &ident.qualifier {
            None => match self.bindings.get(&ident.name) {
                Some(Binding::Value(v)) => value_of(v),
                Some(Binding::Import(_)) => Err(Error::namespace(
                    &ident.name,
                    "use of imported scope without selector",
                )),
                None => Err(unknown()),
            },
            Some(ns) => match self.bindings.get(ns) {
                Some(Binding::Import(lib)) => match lib.bindings.get(&ident.name) {
                    Some(Binding::Value(v)) if is_exported(&ident.name) => value_of(v),
                    _ => Err(unknown()),
                },
                Some(Binding::Value(_)) => Err(Error::namespace(ns, "not an imported scope")),
                None => Err(unknown()),
            },
        }
    }

    fn bind(&mut self, name: &str, binding: Binding) {
        match self.bindings.entry(name.to_string()) {
            Entry::Occupied(_) => {
                debug!("{} is already bound, keeping the existing binding", name);
            }
            Entry::Vacant(slot) => {
                match &binding {
                    Binding::Value(v) => debug!("bound {} = {} ({})", name, v, v.kind()),
                    Binding::Import(lib) => {
                        debug!("imported {} ({} bindings)", name, lib.bindings.len())
                    }
                }
                slot.insert(binding);
            }
        }
    }
}

fn value_of(v: &ConstValue) -> Result<ConstValue> {
    match v {
        ConstValue::Unknown => Err(Error::not_representable(Kind::Unknown, "constant")),
        v => Ok(v.clone()),
    }
}
