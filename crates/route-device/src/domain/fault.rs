//! Domain faults raised by route processing logic.

use device_telemetry::CorrelationContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a fault detail is.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultSeverity {
    Warning,
    #[default]
    Error,
    Panic,
}

impl FaultSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Panic => "PANIC",
        }
    }
}

impl fmt::Display for FaultSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a fault stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultDetail {
    /// Short machine-readable cause, e.g. `API_UpstreamTimeout`
    pub reason: String,
    /// Human-readable explanation
    pub description: String,
    /// Where the fault was raised
    pub origin: String,
    pub severity: FaultSeverity,
}

impl FaultDetail {
    pub fn new(
        reason: impl Into<String>,
        description: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            reason: reason.into(),
            description: description.into(),
            origin: origin.into(),
            severity: FaultSeverity::Error,
        }
    }

    pub fn with_severity(mut self, severity: FaultSeverity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for FaultDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} (origin: {})",
            self.severity, self.reason, self.description, self.origin
        )
    }
}

/// Structured failure raised by a processor.
///
/// Details are ordered outermost first: the first entry is what the failing
/// step reported, later entries are the causes it wrapped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFault {
    details: Vec<FaultDetail>,
}

impl DomainFault {
    pub fn new(
        reason: impl Into<String>,
        description: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::from_detail(FaultDetail::new(reason, description, origin))
    }

    pub fn from_detail(detail: FaultDetail) -> Self {
        Self {
            details: vec![detail],
        }
    }

    /// Append a cause below the existing details.
    pub fn caused_by(mut self, cause: FaultDetail) -> Self {
        self.details.push(cause);
        self
    }

    pub fn details(&self) -> &[FaultDetail] {
        &self.details
    }

    /// The outermost detail.
    pub fn primary(&self) -> Option<&FaultDetail> {
        self.details.first()
    }

    /// Highest severity anywhere in the stack.
    pub fn severity(&self) -> FaultSeverity {
        self.details
            .iter()
            .map(|d| d.severity)
            .max()
            .unwrap_or_default()
    }

    /// Render every detail, one per line.
    pub fn render(&self) -> String {
        self.details
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for DomainFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(primary) = self.primary() else {
            return f.write_str("unspecified domain fault");
        };
        write!(f, "{}: {}", primary.reason, primary.description)?;
        if self.details.len() > 1 {
            write!(f, " (+{} causes)", self.details.len() - 1)?;
        }
        Ok(())
    }
}

/// What the fault hook hands to the state controller.
///
/// Built on the worker thread that caught the fault and moved into
/// `report_fault`; it is not kept after the transition is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultRecord {
    pub route_id: String,
    pub context: CorrelationContext,
    /// Full rendering of the fault, becomes the status message
    pub description: String,
    pub severity: FaultSeverity,
}

impl FaultRecord {
    pub fn capture(route_id: &str, context: CorrelationContext, fault: &DomainFault) -> Self {
        Self {
            route_id: route_id.to_string(),
            context,
            description: fault.render(),
            severity: fault.severity(),
        }
    }
}
