use log::*;
use settlement_engine::traits::{PayoutProvider, PayoutProviderError, PayoutReceipt, PayoutRequest};
use transfer_tools::{NewTransfer, TransferApi, TransferApiError};

/// Adapts the provider's transfer client to the engine's payout capability.
///
/// Rejections and transport failures are kept distinct so the transfer error log records which side refused, but
/// the pipeline treats both the same way: record, continue with the next seller.
#[derive(Clone)]
pub struct PayoutDispatcher {
    api: TransferApi,
}

impl PayoutDispatcher {
    pub fn new(api: TransferApi) -> Self {
        Self { api }
    }
}

impl PayoutProvider for PayoutDispatcher {
    async fn dispatch(&self, request: &PayoutRequest) -> Result<PayoutReceipt, PayoutProviderError> {
        let transfer =
            NewTransfer::new(request.shop_id.clone(), request.amount, request.order_id.as_str(), request.memo.clone());
        match self.api.create_transfer(transfer).await {
            Ok(transfer) => Ok(PayoutReceipt { transfer_id: transfer.id, status: transfer.status }),
            Err(TransferApiError::TransferRejected { status, message }) => {
                debug!("💸️ Transfer for {request} rejected with HTTP {status}");
                Err(PayoutProviderError::Rejected(message))
            },
            Err(e) => Err(PayoutProviderError::Unreachable(e.to_string())),
        }
    }
}
