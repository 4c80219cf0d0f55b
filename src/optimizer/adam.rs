use super::{check_gradients, Optimizer};
use crate::backend::{Backend, Scalar, Tensor1D};
use crate::error::ModelError;
use crate::model::ParamStore;
use std::collections::BTreeMap;

/// Adam with optional decoupled weight decay.
///
/// Moment estimates are kept per parameter name and reset when a
/// parameter's length changes.
///
/// ```text
/// m ← β₁·m + (1-β₁)·g
/// v ← β₂·v + (1-β₂)·g²
/// θ ← θ - η·( m̂ / (√v̂ + ε) + λ·θ )
/// ```
#[derive(Clone, Debug)]
pub struct Adam<B: Backend> {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    weight_decay: f64,
    moments: BTreeMap<String, (Tensor1D<B>, Tensor1D<B>)>,
    t: u64,
}

impl<B: Backend> Adam<B> {
    /// Adam with `β₁ = 0.9`, `β₂ = 0.999`, `ε = 1e-8` and no weight decay.
    pub fn new(lr: f64) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
            moments: BTreeMap::new(),
            t: 0,
        }
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> u64 {
        self.t
    }
}

impl<B: Backend> Optimizer<B> for Adam<B> {
    fn step(&mut self, params: &mut ParamStore<B>, grads: &ParamStore<B>) -> Result<(), ModelError> {
        check_gradients(params, grads)?;

        self.t += 1;
        let t = self.t as f64;
        let bias_correction1 = 1.0 - self.beta1.powf(t);
        let bias_correction2 = 1.0 - self.beta2.powf(t);

        let beta1 = Scalar::<B>::new(self.beta1);
        let one_minus_beta1 = Scalar::<B>::new(1.0 - self.beta1);
        let beta2 = Scalar::<B>::new(self.beta2);
        let one_minus_beta2 = Scalar::<B>::new(1.0 - self.beta2);
        let inv_bc1 = Scalar::<B>::new(1.0 / bias_correction1);
        let inv_bc2 = Scalar::<B>::new(1.0 / bias_correction2);
        let eps = Scalar::<B>::new(self.eps);
        let lr = Scalar::<B>::new(self.lr);
        let decay = Scalar::<B>::new(self.weight_decay);

        for (name, grad) in grads.iter() {
            let Some(param) = params.get_mut(name) else {
                continue;
            };
            if !param.is_trainable() {
                continue;
            }
            let g = grad.value();
            let len = g.len();

            let (m_prev, v_prev) = match self.moments.get(name) {
                Some((m, v)) if m.len() == len => (m.clone(), v.clone()),
                _ => (Tensor1D::zeros(len), Tensor1D::zeros(len)),
            };

            let m = m_prev.scale(&beta1).add(&g.scale(&one_minus_beta1));
            let v = v_prev.scale(&beta2).add(&g.mul(g).scale(&one_minus_beta2));

            let m_hat = m.scale(&inv_bc1);
            let v_hat = v.scale(&inv_bc2);
            let mut update = m_hat.div(&v_hat.sqrt().add_scalar(&eps));
            if self.weight_decay != 0.0 {
                update = update.add(&param.value().scale(&decay));
            }

            let updated = param.value().sub(&update.scale(&lr));
            param.set_value(updated)?;
            self.moments.insert(name.to_string(), (m, v));
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn name(&self) -> &'static str {
        "Adam"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::model::Param;

    type Store = ParamStore<CpuBackend>;

    fn single(name: &str, values: Vec<f32>) -> Store {
        let mut s = Store::new();
        s.insert(name, Param::new(Tensor1D::new(values)));
        s
    }

    fn grads(name: &str, values: Vec<f32>) -> Store {
        let mut s = Store::new();
        s.insert_tensor(name, Tensor1D::new(values));
        s
    }

    #[test]
    fn test_adam_first_step_moves_by_lr() {
        let mut params = single("w", vec![1.0, 1.0]);
        let mut adam = Adam::<CpuBackend>::new(0.1);
        adam.step(&mut params, &grads("w", vec![4.0, -0.5])).unwrap();

        // m̂ = g and v̂ = g² on the first step, so each coordinate moves by lr·sign(g).
        let w = params.tensor("w").unwrap().to_vec();
        assert!((w[0] - 0.9).abs() < 1e-6);
        assert!((w[1] - 1.1).abs() < 1e-6);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn test_adam_weight_decay_pulls_towards_zero() {
        let mut params = single("w", vec![2.0]);
        let mut adam = Adam::<CpuBackend>::new(0.1).with_weight_decay(0.5);
        adam.step(&mut params, &grads("w", vec![0.0])).unwrap();

        // Zero gradient: only the decay term 0.1 * 0.5 * 2.0 applies.
        let w = params.tensor("w").unwrap().to_vec()[0];
        assert!((w - 1.9).abs() < 1e-6);
    }

    #[test]
    fn test_adam_converges_on_quadratic() {
        // minimize (w - 3)^2
        let mut params = single("w", vec![0.0]);
        let mut adam = Adam::<CpuBackend>::new(0.1);
        for _ in 0..500 {
            let w = params.tensor("w").unwrap().to_vec()[0];
            let g = 2.0 * (w - 3.0);
            adam.step(&mut params, &grads("w", vec![g as f32])).unwrap();
        }
        let w = params.tensor("w").unwrap().to_vec()[0];
        assert!((w - 3.0).abs() < 1e-2);
    }

    #[test]
    fn test_adam_skips_frozen() {
        let mut params = Store::new();
        params.insert("w", Param::new(Tensor1D::new(vec![1.0])).frozen());
        let mut adam = Adam::<CpuBackend>::new(0.1);
        adam.step(&mut params, &grads("w", vec![1.0])).unwrap();
        assert_eq!(params.tensor("w").unwrap().to_vec(), vec![1.0]);
    }

    #[test]
    fn test_adam_step_counter_past_i32_range() {
        let mut params = single("w", vec![1.0]);
        let mut adam = Adam::<CpuBackend>::new(0.1);
        adam.t = u64::from(u32::MAX);
        adam.step(&mut params, &grads("w", vec![1.0])).unwrap();

        let w = params.tensor("w").unwrap().to_vec()[0];
        assert!(w.is_finite());
        assert!(w < 1.0);
        assert_eq!(adam.steps(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_adam_builder() {
        let adam = Adam::<CpuBackend>::new(0.01)
            .with_betas(0.8, 0.99)
            .with_eps(1e-6);
        assert_eq!(adam.learning_rate(), 0.01);
        assert_eq!(adam.name(), "Adam");
    }
}
