use std::ops::{Deref, DerefMut};

use super::{Mode, Model};

/// A scoped change of a model's mode and gradient tracking.
///
/// The previous state is restored when the scope is dropped, that includes unwinding and early
/// returns through `?`.
pub struct Scope<'m, M: Model> {
    model: &'m mut M,
    prev_mode: Mode,
    prev_grad: bool,
}

impl<'m, M: Model> Scope<'m, M> {
    /// Puts `model` in `mode` with gradient tracking set to `grad`.
    ///
    /// # Returns
    /// A guard that derefs to the model.
    pub fn enter(model: &'m mut M, mode: Mode, grad: bool) -> Self {
        let prev_mode = model.mode();
        let prev_grad = model.grad_enabled();

        model.set_mode(mode);
        model.set_grad_enabled(grad);

        Self {
            model,
            prev_mode,
            prev_grad,
        }
    }
}

impl<M: Model> Deref for Scope<'_, M> {
    type Target = M;

    fn deref(&self) -> &Self::Target {
        self.model
    }
}

impl<M: Model> DerefMut for Scope<'_, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.model
    }
}

impl<M: Model> Drop for Scope<'_, M> {
    fn drop(&mut self) {
        self.model.set_mode(self.prev_mode);
        self.model.set_grad_enabled(self.prev_grad);
    }
}
