use std::sync::Mutex;

/// Holds handler state that outlives a single invocation.
///
/// `update` applies the closure atomically with respect to other callers of
/// the same store and returns the state as it was left.
pub trait StateStore<T> {
    fn read(&self) -> Result<T, String>;
    fn update(&self, apply: &mut dyn FnMut(&mut T)) -> Result<T, String>;
}

/// Process-local store. State resets whenever the execution environment is
/// recycled and is never shared between environments.
#[derive(Debug, Default)]
pub struct InMemoryStateStore<T> {
    state: Mutex<T>,
}

impl<T> InMemoryStateStore<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(initial),
        }
    }
}

impl<T: Clone> StateStore<T> for InMemoryStateStore<T> {
    fn read(&self) -> Result<T, String> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| "in-memory state lock poisoned".to_string())
    }

    fn update(&self, apply: &mut dyn FnMut(&mut T)) -> Result<T, String> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| "in-memory state lock poisoned".to_string())?;
        apply(&mut *state);
        Ok(state.clone())
    }
}
