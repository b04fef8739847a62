use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
};

use settlement_engine::traits::{PayoutProvider, PayoutProviderError, PayoutReceipt, PayoutRequest};

/// A scripted payout provider: records every dispatch and fails for the shops it has been told to fail for.
#[derive(Clone, Default)]
pub struct TestPayouts {
    calls: Arc<Mutex<Vec<PayoutRequest>>>,
    failures: Arc<Mutex<HashSet<String>>>,
    counter: Arc<AtomicU64>,
}

impl TestPayouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, shop_id: &str) {
        self.failures.lock().unwrap().insert(shop_id.to_string());
    }

    pub fn calls(&self) -> Vec<PayoutRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl PayoutProvider for TestPayouts {
    async fn dispatch(&self, request: &PayoutRequest) -> Result<PayoutReceipt, PayoutProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.failures.lock().unwrap().contains(&request.shop_id) {
            return Err(PayoutProviderError::Rejected("Recipient has no verified payout destination".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PayoutReceipt { transfer_id: format!("trsf_test_{n:04}"), status: "sent".to_string() })
    }
}
