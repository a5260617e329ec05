//! Flow state carried through one batch

use gradualflow_core::ConfigurationError;
use gradualflow_settings::GradualFlowSettings;

/// Flow at the boundary between consecutive paths, plus the ramp limits
///
/// One instance lives for one batch. Only the discretization engine moves
/// `current_flow`, and only to a path's target once its ramp is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    current_flow: f64,
    flow_acceleration: f64,
    discretized_duration: f64,
}

impl FlowState {
    /// Cold-start state: no flow memory, so the first ramp starts at zero.
    pub fn new(flow_acceleration: f64, discretized_duration: f64) -> Result<Self, ConfigurationError> {
        if !flow_acceleration.is_finite() || flow_acceleration <= 0.0 {
            return Err(ConfigurationError::InvalidValue {
                key: "flow_acceleration".to_string(),
                reason: format!("must be a finite value > 0, got {}", flow_acceleration),
            });
        }
        if !discretized_duration.is_finite() || discretized_duration <= 0.0 {
            return Err(ConfigurationError::InvalidValue {
                key: "discretized_duration".to_string(),
                reason: format!("must be a finite value > 0, got {}", discretized_duration),
            });
        }
        Ok(Self {
            current_flow: 0.0,
            flow_acceleration,
            discretized_duration,
        })
    }

    /// State for a batch on `layer_nr`, using the first-layer limit on layer 0
    pub fn for_layer(settings: &GradualFlowSettings, layer_nr: i64) -> Result<Self, ConfigurationError> {
        Self::new(
            settings.flow_acceleration_for_layer(layer_nr),
            settings.gradual_flow_discretisation_step_size,
        )
    }

    /// Seed the starting flow, e.g. to continue the previous layer's ramp
    pub fn with_current_flow(mut self, flow: f64) -> Self {
        if flow.is_finite() {
            self.current_flow = flow;
        }
        self
    }

    pub fn current_flow(&self) -> f64 {
        self.current_flow
    }

    pub fn flow_acceleration(&self) -> f64 {
        self.flow_acceleration
    }

    pub fn discretized_duration(&self) -> f64 {
        self.discretized_duration
    }

    /// Largest flow change one discretization step may make
    pub fn max_step_delta(&self) -> f64 {
        self.flow_acceleration * self.discretized_duration
    }

    pub(crate) fn set_current_flow(&mut self, flow: f64) {
        self.current_flow = flow;
    }
}
