use super::ParamGen;

/// Initializes every parameter to the same value, biases usually start at zero.
#[derive(Debug, Clone, Copy)]
pub struct ConstParamGen {
    value: f32,
}

impl ConstParamGen {
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    pub fn zeros() -> Self {
        Self::new(0.)
    }
}

impl ParamGen for ConstParamGen {
    fn fill(&mut self, params: &mut [f32]) {
        params.fill(self.value);
    }
}
