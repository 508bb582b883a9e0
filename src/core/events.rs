//! "Report created" notifications for the notification collaborator.
//!
//! Delivery is fire-and-forget: publishing never blocks and never fails the caller. A sink
//! that cannot deliver logs the problem and drops the event.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Emitted once when a new calculation report is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportCreated {
    /// Owner of the report
    pub user_id: String,
    /// Id of the new report
    pub report_id: i64,
    /// Total debt the report was calculated from
    pub total_debt: f64,
}

/// Receiver side of report notifications.
pub trait EventSink: Send + Sync {
    /// Publishes a "report created" event without waiting for delivery.
    fn report_created(&self, event: ReportCreated);
}

/// Sink that only writes the event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn report_created(&self, event: ReportCreated) {
        info!(
            user_id = %event.user_id,
            report_id = event.report_id,
            total_debt = event.total_debt,
            "Calculation report created"
        );
    }
}

/// Sink that forwards events over an unbounded channel to a background consumer.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<ReportCreated>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReportCreated>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn report_created(&self, event: ReportCreated) {
        if let Err(e) = self.sender.send(event) {
            warn!(report_id = e.0.report_id, "Dropping report event, consumer is gone");
        }
    }
}
