//! Batch service
//!
//! One call to [`ModifyService::handle`] processes one batch end to end.
//! The service may be shared between threads: the settings store supports
//! concurrent lookups and every batch works on its own `FlowState`.

use crate::error::Status;
use crate::message::{GcodePathMessage, ModifyRequest, ModifyResponse};
use crate::observer::{BatchReport, ObserverHandle};
use gradualflow_core::{Error, RampedSubPath, Result};
use gradualflow_engine::{stitch_segments, DiscretizationEngine, FlowState, RawSegment};
use gradualflow_settings::{GradualFlowSettings, SettingsStore};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

pub struct ModifyService {
    settings: Arc<SettingsStore>,
    engine: DiscretizationEngine,
    observers: Vec<ObserverHandle>,
    /// Flow each client's last batch ended on, for clients that do not
    /// reset flow between layers
    carried_flow: Mutex<HashMap<Uuid, f64>>,
}

impl ModifyService {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self {
            settings,
            engine: DiscretizationEngine::new(),
            observers: Vec::new(),
            carried_flow: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_engine(mut self, engine: DiscretizationEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Register an observer; observers run in registration order
    pub fn register_observer(&mut self, observer: ObserverHandle) -> &mut Self {
        self.observers.push(observer);
        self
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Flow the client's next batch will start from, when it carries flow
    pub fn carried_flow(&self, client: Uuid) -> Option<f64> {
        self.carried_flow.lock().get(&client).copied()
    }

    /// Process one batch for `client`
    ///
    /// Returns the rewritten records, or the status of a failed batch. A
    /// failed batch produces no output at all.
    pub fn handle(
        &self,
        client: Uuid,
        request: &ModifyRequest,
    ) -> std::result::Result<ModifyResponse, Status> {
        let settings = self.settings.get(client).map_err(|e| {
            tracing::error!("Rejecting batch: {}", e);
            Status::from(e)
        })?;

        if !settings.gradual_flow_enabled {
            tracing::debug!(
                "Gradual flow disabled for client {}; passing {} path(s) through",
                client,
                request.gcode_paths.len()
            );
            return Ok(ModifyResponse {
                gcode_paths: request.gcode_paths.clone(),
            });
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.run_batch(client, &settings, request))) {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                tracing::error!("Batch for client {} on layer {} failed: {}", client, request.layer_nr, e);
                Err(Status::from(e))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    "Batch for client {} on layer {} panicked: {}",
                    client,
                    request.layer_nr,
                    message
                );
                Err(Status::internal(format!("batch processing panicked: {}", message)))
            }
        }
    }

    fn run_batch(
        &self,
        client: Uuid,
        settings: &GradualFlowSettings,
        request: &ModifyRequest,
    ) -> Result<ModifyResponse> {
        for (index, record) in request.gcode_paths.iter().enumerate() {
            record.validate(index)?;
        }

        let segments: Vec<RawSegment<'_>> = request
            .gcode_paths
            .iter()
            .map(|r| RawSegment::new(&r.path, r.flow, r.speed))
            .collect();
        let paths = stitch_segments(&segments);

        let mut state = FlowState::for_layer(settings, request.layer_nr)?;
        if !settings.reset_flow_each_layer {
            if let Some(flow) = self.carried_flow(client) {
                state = state.with_current_flow(flow);
            }
        }

        let ramped = self.engine.process(&mut state, &paths)?;
        let gcode_paths = self.commit(client, settings, &state, &request.gcode_paths, &ramped)?;
        tracing::info!(
            "Layer {}: {} path(s) in, {} path(s) out, final flow {:.4} (acceleration {})",
            request.layer_nr,
            request.gcode_paths.len(),
            gcode_paths.len(),
            state.current_flow(),
            state.flow_acceleration()
        );

        self.notify_observers(&BatchReport {
            client,
            layer_nr: request.layer_nr,
            input: &paths,
            output: &ramped,
        });

        Ok(ModifyResponse { gcode_paths })
    }

    /// Re-emit the batch, then remember where its flow ended
    fn commit(
        &self,
        client: Uuid,
        settings: &GradualFlowSettings,
        state: &FlowState,
        records: &[GcodePathMessage],
        ramped: &[RampedSubPath],
    ) -> Result<Vec<GcodePathMessage>> {
        let gcode_paths = reemit(records, ramped)?;
        if !settings.reset_flow_each_layer {
            self.carried_flow.lock().insert(client, state.current_flow());
        }
        Ok(gcode_paths)
    }

    fn notify_observers(&self, report: &BatchReport<'_>) {
        for observer in &self.observers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.on_batch_complete(report)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!("Observer '{}' failed on layer {}: {}", observer.name(), report.layer_nr, e);
                }
                Err(payload) => {
                    tracing::warn!(
                        "Observer '{}' panicked on layer {}: {}",
                        observer.name(),
                        report.layer_nr,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }
}

/// Express sub-paths in the record shape they came in
fn reemit(records: &[GcodePathMessage], ramped: &[RampedSubPath]) -> Result<Vec<GcodePathMessage>> {
    ramped
        .iter()
        .map(|sub| -> Result<GcodePathMessage> {
            let record = records
                .get(sub.source)
                .ok_or_else(|| Error::other(format!("sub-path refers to missing record {}", sub.source)))?;
            Ok(record.with_geometry(sub.wire_points().to_vec(), sub.flow))
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
