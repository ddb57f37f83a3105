//! Fault Interceptor
//!
//! The `FaultHook` attached to every route at `init()`. Runs on the engine
//! worker that caught the fault and reports it before the engine moves on.

use super::controller::StateController;
use crate::domain::{DomainFault, Exchange, FaultRecord};
use crate::metrics;
use crate::ports::outbound::FaultHook;
use device_telemetry::{CorrelationContext, EXCHANGE_KEY, ROUTE_KEY};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

pub struct FaultInterceptor {
    controller: Arc<StateController>,
    base_context: CorrelationContext,
}

impl FaultInterceptor {
    pub fn new(controller: Arc<StateController>, base_context: CorrelationContext) -> Self {
        Self {
            controller,
            base_context,
        }
    }

    fn intercept(&self, route_id: &str, exchange: &Exchange, fault: &DomainFault) {
        let context = self
            .base_context
            .capture_current()
            .with(ROUTE_KEY, route_id)
            .with(EXCHANGE_KEY, exchange.id.to_string());

        {
            let _entered = context.span("fault_caught").entered();
            error!(
                route_id,
                exchange_id = %exchange.id,
                severity = %fault.severity(),
                fault = %fault,
                "Domain fault caught"
            );
        }

        let record = FaultRecord::capture(route_id, context, fault);
        self.controller.report_fault(record);
    }
}

impl FaultHook for FaultInterceptor {
    fn on_fault(&self, route_id: &str, exchange: &Exchange, fault: &DomainFault) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.intercept(route_id, exchange, fault)
        }));

        if let Err(payload) = outcome {
            metrics::record_fault_hook_failure();
            error!(
                route_id,
                exchange_id = %exchange.id,
                panic = %panic_message(payload.as_ref()),
                "Fault hook failed, fault dropped"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
