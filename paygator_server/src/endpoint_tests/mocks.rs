use mockall::mock;
use paygator_engine::{
    db_types::{
        AuditLogEntry,
        C2bTransaction,
        CompletedPayout,
        FailedPayout,
        NewPayment,
        NewVendorPayout,
        Payment,
        PaymentId,
        PaymentStatus,
        VendorPayout,
    },
    payment_objects::{PaymentQueryFilter, PayoutQueryFilter},
    traits::{
        B2cDisbursement,
        DisbursementError,
        DisbursementRequest,
        DisbursementResponse,
        PaymentManagement,
        PayoutManagement,
        StoreError,
    },
};

mock! {
    pub Store {}
    impl PaymentManagement for Store {
        async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StoreError>;
        async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<Option<Payment>, StoreError>;
        async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, StoreError>;
        async fn update_payment_status(
            &self,
            payment_id: &PaymentId,
            from: PaymentStatus,
            to: PaymentStatus,
            c2b_transaction: Option<C2bTransaction>,
        ) -> Result<Payment, StoreError>;
        async fn fetch_audit_log(&self, limit: i64) -> Result<Vec<AuditLogEntry>, StoreError>;
    }
    impl PayoutManagement for Store {
        async fn claim_payout(&self, payout: NewVendorPayout) -> Result<VendorPayout, StoreError>;
        async fn complete_payout(&self, payout_id: i64, state: CompletedPayout) -> Result<VendorPayout, StoreError>;
        async fn fail_payout(&self, payout_id: i64, state: FailedPayout) -> Result<VendorPayout, StoreError>;
        async fn fetch_payouts_for_payment(&self, payment_id: &PaymentId) -> Result<Vec<VendorPayout>, StoreError>;
        async fn search_payouts(&self, query: PayoutQueryFilter) -> Result<Vec<VendorPayout>, StoreError>;
        async fn fetch_payable_payments(&self) -> Result<Vec<Payment>, StoreError>;
    }
}

mock! {
    pub Disburser {}
    impl B2cDisbursement for Disburser {
        async fn disburse(&self, request: DisbursementRequest) -> Result<DisbursementResponse, DisbursementError>;
    }
}
