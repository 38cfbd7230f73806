//! Limited-memory BFGS with a backtracking Armijo line search.
//!
//! Fully sequential: the same objective and starting point always produce the
//! same iterates, bit for bit.

use std::collections::VecDeque;

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO: f64 = 1e-4;
const MAX_LINE_SEARCH_STEPS: usize = 50;
/// Relative objective change below which the run counts as converged.
const FTOL: f64 = 64.0 * f64::EPSILON;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Lbfgs {
    /// Number of correction pairs kept for the inverse Hessian estimate.
    pub history_size: usize,
    pub max_iter: usize,
    /// Convergence threshold on the largest absolute gradient component.
    pub gtol: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    /// Largest absolute gradient component at `x`.
    pub gradient_norm: f64,
    pub iterations: usize,
    pub converged: bool,
}

struct Correction {
    s: Vec<f64>,
    y: Vec<f64>,
    rho: f64,
}

impl Lbfgs {
    /// Minimize `objective`, which writes the gradient at `x` into its second
    /// argument and returns the value at `x`.
    ///
    /// Every accepted step strictly decreases the objective, so the returned
    /// point is the best one visited even when the run stops early.
    pub fn minimize<F>(&self, x0: Vec<f64>, mut objective: F) -> Minimum
    where
        F: FnMut(&[f64], &mut [f64]) -> f64,
    {
        let n = x0.len();
        let mut x = x0;
        let mut grad = vec![0.0; n];
        let mut value = objective(&x, &mut grad);

        let mut x_next = vec![0.0; n];
        let mut grad_next = vec![0.0; n];
        let mut corrections: VecDeque<Correction> = VecDeque::with_capacity(self.history_size);

        let mut iterations = 0;
        let mut converged = max_abs(&grad) <= self.gtol;

        while !converged && iterations < self.max_iter {
            iterations += 1;

            let mut direction = search_direction(&grad, &corrections);
            let mut slope = dot(&grad, &direction);
            if slope >= 0.0 || !slope.is_finite() {
                // Lost the descent property, restart from steepest descent
                corrections.clear();
                direction = grad.iter().map(|g| -g).collect();
                slope = dot(&grad, &direction);
            }

            let mut step = if corrections.is_empty() {
                (1.0 / dot(&grad, &grad).sqrt()).min(1.0)
            } else {
                1.0
            };
            let mut accepted = None;
            for _ in 0..MAX_LINE_SEARCH_STEPS {
                for ((next, &current), &d) in x_next.iter_mut().zip(&x).zip(&direction) {
                    *next = current + step * d;
                }
                let candidate = objective(&x_next, &mut grad_next);
                if candidate.is_finite() && candidate <= value + ARMIJO * step * slope {
                    accepted = Some(candidate);
                    break;
                }
                step *= 0.5;
            }
            let Some(next_value) = accepted else {
                break;
            };

            let s = x_next.iter().zip(&x).map(|(a, b)| a - b).collect::<Vec<_>>();
            let y = grad_next
                .iter()
                .zip(&grad)
                .map(|(a, b)| a - b)
                .collect::<Vec<_>>();
            let sy = dot(&s, &y);
            if sy > f64::EPSILON * dot(&y, &y) {
                if corrections.len() == self.history_size {
                    corrections.pop_front();
                }
                corrections.push_back(Correction { s, y, rho: 1.0 / sy });
            }

            let previous = value;
            std::mem::swap(&mut x, &mut x_next);
            std::mem::swap(&mut grad, &mut grad_next);
            value = next_value;

            let scale = previous.abs().max(value.abs()).max(1.0);
            converged = max_abs(&grad) <= self.gtol || previous - value <= FTOL * scale;
        }

        Minimum {
            gradient_norm: max_abs(&grad),
            x,
            value,
            iterations,
            converged,
        }
    }
}

/// Two-loop recursion: `-H * grad` for the current inverse Hessian estimate.
fn search_direction(grad: &[f64], corrections: &VecDeque<Correction>) -> Vec<f64> {
    let mut q = grad.to_vec();
    let mut alphas = vec![0.0; corrections.len()];

    for (alpha, c) in alphas.iter_mut().zip(corrections).rev() {
        *alpha = c.rho * dot(&c.s, &q);
        axpy(-*alpha, &c.y, &mut q);
    }

    let gamma = corrections
        .back()
        .map_or(1.0, |c| dot(&c.s, &c.y) / dot(&c.y, &c.y));
    q.iter_mut().for_each(|v| *v *= gamma);

    for (alpha, c) in alphas.iter().zip(corrections) {
        let beta = c.rho * dot(&c.y, &q);
        axpy(alpha - beta, &c.s, &mut q);
    }

    q.iter_mut().for_each(|v| *v = -*v);
    q
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

#[inline]
fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver(max_iter: usize) -> Lbfgs {
        Lbfgs {
            history_size: 10,
            max_iter,
            gtol: 1e-8,
        }
    }

    #[test]
    fn test_quadratic_minimum() {
        // f(x, y) = (x - 3)^2 + 10 (y + 1)^2
        let result = solver(100).minimize(vec![0.0, 0.0], |x, g| {
            g[0] = 2.0 * (x[0] - 3.0);
            g[1] = 20.0 * (x[1] + 1.0);
            (x[0] - 3.0).powi(2) + 10.0 * (x[1] + 1.0).powi(2)
        });
        assert!(result.converged);
        assert!((result.x[0] - 3.0).abs() < 1e-6);
        assert!((result.x[1] + 1.0).abs() < 1e-6);
        assert!(result.value < 1e-10);
    }

    #[test]
    fn test_rosenbrock() {
        let result = solver(2000).minimize(vec![-1.2, 1.0], |x, g| {
            let (a, b) = (x[0], x[1]);
            g[0] = -2.0 * (1.0 - a) - 400.0 * a * (b - a * a);
            g[1] = 200.0 * (b - a * a);
            (1.0 - a).powi(2) + 100.0 * (b - a * a).powi(2)
        });
        assert!((result.x[0] - 1.0).abs() < 1e-4);
        assert!((result.x[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_iteration_cap_returns_progress() {
        let start = vec![-1.2, 1.0];
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let initial = f(&start);
        let result = solver(3).minimize(start, |x, g| {
            let (a, b) = (x[0], x[1]);
            g[0] = -2.0 * (1.0 - a) - 400.0 * a * (b - a * a);
            g[1] = 200.0 * (b - a * a);
            f(x)
        });
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
        assert!(result.value < initial);
    }

    #[test]
    fn test_already_optimal_start() {
        let result = solver(10).minimize(vec![0.0], |x, g| {
            g[0] = 2.0 * x[0];
            x[0] * x[0]
        });
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }
}
