/// Writes the initial values of a model's parameters.
pub trait ParamGen {
    /// Overwrites every value in `params` with a freshly generated one.
    fn fill(&mut self, params: &mut [f32]);

    /// Generates `n` fresh values.
    fn sample(&mut self, n: usize) -> Vec<f32> {
        let mut params = vec![0.; n];
        self.fill(&mut params);
        params
    }
}
