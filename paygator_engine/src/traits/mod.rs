//! # Database and collaborator contracts
//!
//! This module defines the behaviour that storage backends and external collaborators need to expose in order to be
//! driven by the Paygator engine.
//!
//! * [`PaymentManagement`] stores customer (C2B) payments, their status transitions, and the audit log.
//! * [`PayoutManagement`] stores vendor payout attempts. Its write methods are the only way `vendorB2CPayment`
//!   metadata is ever changed, and each one is atomic with the matching payout row and audit entry.
//! * [`PaygatorDatabase`] is the umbrella trait that a complete backend implements.
//! * [`B2cDisbursement`] is the narrow contract the payout flow uses to send money to a vendor's mobile wallet.
mod disbursement;
mod paygator_database;
mod payment_management;
mod payout_management;

pub use disbursement::{B2cDisbursement, DisbursementError, DisbursementRequest, DisbursementResponse};
pub use paygator_database::{PaygatorDatabase, StoreError};
pub use payment_management::PaymentManagement;
pub use payout_management::PayoutManagement;
