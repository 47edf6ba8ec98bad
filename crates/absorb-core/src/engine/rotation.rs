use super::cancel::CancellationToken;
use super::config::{RotationConfig, RotationMethod};
use super::error::EngineError;
use crate::core::models::slab::PlacedSystem;
use crate::core::oracle::{EnergyOracle, OracleError};
use crate::core::utils::geometry::{fibonacci_sphere, rotation_from_axis_angle};
use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::brent::BrentOpt;
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

const FULL_TURN: f64 = 360.0;

/// Parameters of the optimal rotation.
#[derive(Debug, Clone, PartialEq)]
pub enum RotationParameters {
    /// Angle in degrees about the site normal.
    Normal { angle: f64 },
    /// Angle in degrees about a sampled unit axis.
    Sphere { axis: Vector3<f64>, angle: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationInfo {
    pub method: RotationMethod,
    pub parameters: RotationParameters,
    /// Surrogate-oracle energy of the optimal orientation.
    pub surrogate_energy: f64,
    /// Number of surrogate-oracle evaluations spent.
    pub evaluations: usize,
}

impl OptimizationInfo {
    pub fn angle(&self) -> f64 {
        match self.parameters {
            RotationParameters::Normal { angle } | RotationParameters::Sphere { angle, .. } => {
                angle
            }
        }
    }

    pub fn axis(&self) -> Option<Vector3<f64>> {
        match self.parameters {
            RotationParameters::Normal { .. } => None,
            RotationParameters::Sphere { axis, .. } => Some(axis),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizedOrientation {
    pub system: PlacedSystem,
    pub info: OptimizationInfo,
}

pub trait OrientationOptimizer: Send + Sync {
    fn method(&self) -> RotationMethod;

    /// Finds the adsorbate orientation minimizing the surrogate energy. Only adsorbate atoms
    /// move; they rotate rigidly about their own center of mass.
    fn optimize(
        &self,
        placed: &PlacedSystem,
        normal: &Vector3<f64>,
        cancel: &CancellationToken,
    ) -> Result<OptimizedOrientation, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationStrategy {
    Normal { max_iterations: u64 },
    Sphere { count: usize, step_degrees: f64 },
}

/// Orientation search against a fast surrogate oracle, with the strategy fixed at construction.
#[derive(Clone)]
pub struct RotationOptimizer {
    surrogate: Arc<dyn EnergyOracle>,
    strategy: RotationStrategy,
}

impl RotationOptimizer {
    pub fn new(surrogate: Arc<dyn EnergyOracle>, strategy: RotationStrategy) -> Self {
        Self {
            surrogate,
            strategy,
        }
    }

    pub fn from_config(surrogate: Arc<dyn EnergyOracle>, config: &RotationConfig) -> Self {
        let strategy = match config.method {
            RotationMethod::Normal => RotationStrategy::Normal {
                max_iterations: config.max_iterations,
            },
            RotationMethod::Sphere => RotationStrategy::Sphere {
                count: config.count,
                step_degrees: config.step_degrees,
            },
        };
        Self::new(surrogate, strategy)
    }

    pub fn strategy(&self) -> RotationStrategy {
        self.strategy
    }

    fn rotation_center(placed: &PlacedSystem) -> Result<Point3<f64>, EngineError> {
        placed
            .adsorbate_center_of_mass()
            .ok_or_else(|| EngineError::Geometry("placed system has no adsorbate atoms".into()))
    }

    fn optimize_about_normal(
        &self,
        placed: &PlacedSystem,
        normal: &Vector3<f64>,
        max_iterations: u64,
        cancel: &CancellationToken,
    ) -> Result<OptimizedOrientation, EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let center = Self::rotation_center(placed)?;
        let evaluations = AtomicUsize::new(0);
        let cost = NormalRotationCost {
            placed,
            oracle: self.surrogate.as_ref(),
            normal: *normal,
            center,
            evaluations: &evaluations,
        };

        let result = Executor::new(cost, BrentOpt::new(0.0, FULL_TURN))
            .configure(|state| state.max_iters(max_iterations))
            .run()
            .map_err(|err| match err.downcast::<OracleError>() {
                Ok(source) => EngineError::Oracle { source },
                Err(other) => EngineError::ConvergenceFailure(other.to_string()),
            })?;

        let state = result.state();
        let angle = state.get_best_param().copied().ok_or_else(|| {
            EngineError::ConvergenceFailure("scalar minimizer returned no optimum".into())
        })?;
        let energy = state.get_best_cost();
        if !energy.is_finite() {
            return Err(EngineError::ConvergenceFailure(format!(
                "scalar minimizer ended at non-finite energy {energy}"
            )));
        }

        let evaluations = evaluations.load(Ordering::Relaxed);
        debug!(angle, energy, evaluations, "Optimal rotation about site normal.");
        Ok(OptimizedOrientation {
            system: placed
                .with_adsorbate_rotated(&rotation_from_axis_angle(normal, angle), &center),
            info: OptimizationInfo {
                method: RotationMethod::Normal,
                parameters: RotationParameters::Normal { angle },
                surrogate_energy: energy,
                evaluations,
            },
        })
    }

    fn optimize_on_sphere(
        &self,
        placed: &PlacedSystem,
        count: usize,
        step_degrees: f64,
        cancel: &CancellationToken,
    ) -> Result<OptimizedOrientation, EngineError> {
        let center = Self::rotation_center(placed)?;
        let axes = fibonacci_sphere(count);
        let angles: Vec<f64> = if step_degrees > 0.0 {
            let steps = (FULL_TURN / step_degrees).ceil() as usize;
            (0..steps)
                .map(|k| k as f64 * step_degrees)
                .filter(|&angle| angle < FULL_TURN)
                .collect()
        } else {
            Vec::new()
        };

        let mut best: Option<(Vector3<f64>, f64, f64, PlacedSystem)> = None;
        let mut evaluations = 0usize;
        for axis in &axes {
            for &angle in &angles {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                let trial =
                    placed.with_adsorbate_rotated(&rotation_from_axis_angle(axis, angle), &center);
                let energy = self.surrogate.evaluate(trial.system())?;
                evaluations += 1;
                trace!(?axis, angle, energy, "Sphere rotation trial.");

                let improves = best
                    .as_ref()
                    .is_none_or(|(_, _, best_energy, _)| energy < *best_energy);
                if improves {
                    best = Some((*axis, angle, energy, trial));
                }
            }
        }

        let (axis, angle, energy, system) = best.ok_or_else(|| {
            EngineError::ConvergenceFailure(format!(
                "sphere sampling produced no trials ({count} axes, step {step_degrees}°)"
            ))
        })?;
        debug!(?axis, angle, energy, evaluations, "Optimal rotation from sphere sampling.");
        Ok(OptimizedOrientation {
            system,
            info: OptimizationInfo {
                method: RotationMethod::Sphere,
                parameters: RotationParameters::Sphere { axis, angle },
                surrogate_energy: energy,
                evaluations,
            },
        })
    }
}

impl OrientationOptimizer for RotationOptimizer {
    fn method(&self) -> RotationMethod {
        match self.strategy {
            RotationStrategy::Normal { .. } => RotationMethod::Normal,
            RotationStrategy::Sphere { .. } => RotationMethod::Sphere,
        }
    }

    fn optimize(
        &self,
        placed: &PlacedSystem,
        normal: &Vector3<f64>,
        cancel: &CancellationToken,
    ) -> Result<OptimizedOrientation, EngineError> {
        match self.strategy {
            RotationStrategy::Normal { max_iterations } => {
                self.optimize_about_normal(placed, normal, max_iterations, cancel)
            }
            RotationStrategy::Sphere {
                count,
                step_degrees,
            } => self.optimize_on_sphere(placed, count, step_degrees, cancel),
        }
    }
}

struct NormalRotationCost<'a> {
    placed: &'a PlacedSystem,
    oracle: &'a dyn EnergyOracle,
    normal: Vector3<f64>,
    center: Point3<f64>,
    evaluations: &'a AtomicUsize,
}

impl CostFunction for NormalRotationCost<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, angle: &Self::Param) -> Result<Self::Output, ArgminError> {
        let trial = self
            .placed
            .with_adsorbate_rotated(&rotation_from_axis_angle(&self.normal, *angle), &self.center);
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        Ok(self.oracle.evaluate(trial.system())?)
    }
}
