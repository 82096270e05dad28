use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::*;

use crate::traits::{B2cDisbursement, DisbursementError, DisbursementRequest, DisbursementResponse};

/// What the fake rail does with the next request.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    /// Accept the transfer with the given transaction id
    Accept(Option<String>),
    /// Answer with `success: false` and the message
    Decline(String),
    /// Fail without an answer, like a dropped connection
    Error(String),
    /// Wait this long, then accept
    Stall(Duration),
}

/// A scriptable stand-in for the B2C rail. Outcomes are consumed in order; once the script runs out, every request
/// is accepted with a generated transaction id. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct FakeDisburser {
    script: Arc<Mutex<VecDeque<FakeOutcome>>>,
    requests: Arc<Mutex<Vec<DisbursementRequest>>>,
}

impl FakeDisburser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(&self, outcome: FakeOutcome) -> &Self {
        self.script.lock().expect("poisoned").push_back(outcome);
        self
    }

    pub fn requests(&self) -> Vec<DisbursementRequest> {
        self.requests.lock().expect("poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("poisoned").len()
    }
}

impl B2cDisbursement for FakeDisburser {
    async fn disburse(&self, request: DisbursementRequest) -> Result<DisbursementResponse, DisbursementError> {
        let n = {
            let mut requests = self.requests.lock().expect("poisoned");
            requests.push(request.clone());
            requests.len()
        };
        let outcome = self.script.lock().expect("poisoned").pop_front();
        debug!("🧪️ Fake disbursement #{n} of {} to {}: {outcome:?}", request.amount, request.phone);
        match outcome {
            None => Ok(DisbursementResponse::success(Some(format!("FAKE-TX-{n}")))),
            Some(FakeOutcome::Accept(txid)) => Ok(DisbursementResponse::success(txid)),
            Some(FakeOutcome::Decline(msg)) => Ok(DisbursementResponse::failure(msg)),
            Some(FakeOutcome::Error(msg)) => Err(DisbursementError(msg)),
            Some(FakeOutcome::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(DisbursementResponse::success(Some(format!("FAKE-TX-{n}"))))
            },
        }
    }
}
