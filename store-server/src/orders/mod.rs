//! Order pipeline
//!
//! Intake (validate, price, reserve stock, enqueue), fulfillment (queue
//! message to authoritative Order row), and status transitions. The
//! queue-mediated path is the only way an order comes into existence.

mod intake;
mod status;
mod worker;

pub use intake::OrderIntakeService;
pub use status::StatusService;
pub use worker::FulfillmentWorker;
