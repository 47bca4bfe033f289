use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result, RuntimeErrorKind};
use crate::runtime::Value;

/// Shared handle to an environment frame
pub type Env = Arc<Environment>;

/// One frame of the lexical environment chain
///
/// A frame maps names to values and points at its enclosing frame. Children,
/// closures and evaluation frames all hold shared handles, so a frame lives as
/// long as the longest-lived holder.
pub struct Environment {
    /// Variables defined in this frame
    variables: RwLock<HashMap<String, Value>>,
    /// Enclosing frame (None for the global frame)
    parent: Option<Env>,
}

impl Environment {
    /// Creates a new root (global) frame
    pub fn new_global() -> Env {
        Arc::new(Environment {
            variables: RwLock::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new frame enclosed by `parent`
    pub fn child(parent: &Env) -> Env {
        Arc::new(Environment {
            variables: RwLock::new(HashMap::new()),
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Enclosing frame, if any
    pub fn parent(&self) -> Option<&Env> {
        self.parent.as_ref()
    }

    /// Defines (or redefines) a name in this frame
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.variables.write().insert(name.into(), value);
    }

    /// Looks a name up, walking from this frame out to the global frame
    pub fn get(&self, name: &str) -> Result<Value> {
        let mut frame = self;
        loop {
            if let Some(val) = frame.variables.read().get(name) {
                return Ok(val.clone());
            }
            match &frame.parent {
                Some(parent) => frame = parent.as_ref(),
                None => {
                    return Err(Error::runtime(RuntimeErrorKind::UnboundIdentifier {
                        name: name.to_string(),
                    }))
                }
            }
        }
    }

    /// Overwrites the nearest existing binding of `name`
    pub fn assign(&self, name: &str, value: Value) -> Result<()> {
        let mut frame = self;
        loop {
            {
                let mut variables = frame.variables.write();
                if let Some(slot) = variables.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
            }
            match &frame.parent {
                Some(parent) => frame = parent.as_ref(),
                None => {
                    return Err(Error::runtime(RuntimeErrorKind::UnboundIdentifier {
                        name: name.to_string(),
                    }))
                }
            }
        }
    }

    /// Checks if a name is bound in this frame or any enclosing one
    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Checks if a name is bound directly in this frame
    pub fn has_local(&self, name: &str) -> bool {
        self.variables.read().contains_key(name)
    }

    /// Names bound directly in this frame, sorted
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of frames from this one up to the global frame (1 for the global frame)
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = self;
        while let Some(parent) = &frame.parent {
            depth += 1;
            frame = parent.as_ref();
        }
        depth
    }
}

impl Drop for Environment {
    // Unlinks the parent chain one frame at a time; a long `let` chain would
    // otherwise drop recursively, one native frame per environment frame
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(env) = parent {
            parent = match Arc::try_unwrap(env) {
                Ok(mut frame) => frame.parent.take(),
                Err(_) => None,
            };
        }
    }
}

impl fmt::Debug for Environment {
    // Values may hold closures that point back at this frame, so only names are shown
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.local_names())
            .field("depth", &self.depth())
            .finish()
    }
}
