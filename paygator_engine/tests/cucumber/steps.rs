use std::str::FromStr;

use cucumber::{gherkin::Step, given, then, when};
use paygator_common::Amount;
use paygator_engine::{
    db_types::{NewPayment, PaymentId, PaymentMetadata, PaymentStatus, PayoutStatus},
    payment_objects::PayoutQueryFilter,
    test_utils::fake_disburser::FakeOutcome,
    PayoutOptions,
};
use serde_json::json;

use crate::cucumber::PayoutWorld;

#[given(expr = "a(n) {word} payment {word} of {int} MZN for vendor phone {string} with a vendor share of {word}%")]
async fn payment_with_share(
    world: &mut PayoutWorld,
    status: String,
    payment_id: String,
    amount: i64,
    phone: String,
    share: String,
) {
    let metadata = json!({
        "orderDetails": { "internal": { "vendorMerchant": { "phone": phone }, "vendorShare": share } }
    });
    create_payment(world, &payment_id, amount, metadata, &status).await;
}

#[given(expr = "a(n) {word} payment {word} of {int} MZN with metadata")]
async fn payment_with_metadata(world: &mut PayoutWorld, status: String, payment_id: String, amount: i64, step: &Step) {
    let doc = step.docstring.as_deref().expect("Metadata docstring is missing");
    let metadata = serde_json::from_str(doc).expect("Invalid metadata JSON");
    create_payment(world, &payment_id, amount, metadata, &status).await;
}

async fn create_payment(world: &mut PayoutWorld, payment_id: &str, amount: i64, metadata: serde_json::Value, status: &str) {
    let status = PaymentStatus::from_str(status).expect("Not a payment status");
    let metadata: PaymentMetadata = serde_json::from_value(metadata).expect("Invalid metadata");
    let id = PaymentId::from(payment_id);
    let payment = NewPayment::new(id.clone(), Amount::from_major(amount)).with_metadata(metadata);
    let sys = world.system();
    sys.payments.create_payment(payment).await.expect("Error creating payment");
    if status != PaymentStatus::Pending {
        sys.payments.update_status(&id, status, "cucumber", None).await.expect("Error updating status");
    }
}

#[given(expr = "the rail declines the next disbursement with {string}")]
async fn rail_declines(world: &mut PayoutWorld, message: String) {
    world.system().rail.then(FakeOutcome::Decline(message));
}

#[when(expr = "I pay out payment {word}")]
async fn pay_out(world: &mut PayoutWorld, payment_id: String) {
    let result = world.system().payouts.process_payout(&payment_id.into(), PayoutOptions::default()).await;
    world.last_payout = Some(result);
}

#[when(expr = "I pay out payment {word} with a commission of {string}")]
async fn pay_out_with_commission(world: &mut PayoutWorld, payment_id: String, commission: String) {
    let options = PayoutOptions::default().with_commission(commission);
    let result = world.system().payouts.process_payout(&payment_id.into(), options).await;
    world.last_payout = Some(result);
}

#[then(expr = "the payout succeeds with a vendor amount of {float} and a commission of {float}")]
async fn payout_succeeds(world: &mut PayoutWorld, vendor_amount: f64, commission_amount: f64) {
    let receipt = match world.last_payout.as_ref().expect("No payout was attempted") {
        Ok(r) => r,
        Err(e) => panic!("Payout failed: {e}"),
    };
    assert_eq!(receipt.status, PayoutStatus::Completed);
    assert_eq!(receipt.split.vendor_amount.to_string(), format!("{vendor_amount:.2}"));
    assert_eq!(receipt.split.system_commission_amount.to_string(), format!("{commission_amount:.2}"));
}

#[then(expr = "the payout is refused with {word}")]
async fn payout_refused(world: &mut PayoutWorld, code: String) {
    match world.last_payout.as_ref().expect("No payout was attempted") {
        Ok(r) => panic!("Payout was expected to fail, but succeeded: {r:?}"),
        Err(e) => assert_eq!(e.code(), code, "{e}"),
    }
}

#[then(expr = "payment {word} has {int} payout record(s)")]
async fn payout_count(world: &mut PayoutWorld, payment_id: String, count: usize) {
    let payouts = world.system().payouts.payouts_for_payment(&payment_id.into()).await.expect("Error fetching payouts");
    assert_eq!(payouts.len(), count);
}

#[then(expr = "payment {word} has {int} {word} payout(s)")]
async fn payout_count_by_status(world: &mut PayoutWorld, payment_id: String, count: usize, status: String) {
    let status = PayoutStatus::from_str(&status).expect("Not a payout status");
    let query = PayoutQueryFilter::default().with_payment_id(payment_id.into()).with_status(status);
    let payouts = world.system().payouts.search_payouts(query).await.expect("Error fetching payouts");
    assert_eq!(payouts.len(), count);
}

#[then(expr = "the vendor payout state of payment {word} is {word}")]
async fn vendor_payout_state(world: &mut PayoutWorld, payment_id: String, status: String) {
    let payment = world.system().payments.payment(&payment_id.into()).await.expect("Error fetching payment");
    let actual = payment.metadata.vendor_b2c_payment.status().map(|s| s.to_string()).unwrap_or_else(|| "none".into());
    assert_eq!(actual, status);
}

#[then(expr = "the rail received {int} disbursement request(s)")]
async fn rail_calls(world: &mut PayoutWorld, count: usize) {
    assert_eq!(world.system().rail.call_count(), count);
}

#[then(expr = "the last disbursement went to {string}")]
async fn last_disbursement_phone(world: &mut PayoutWorld, phone: String) {
    let requests = world.system().rail.requests();
    let last = requests.last().expect("No disbursement was requested");
    assert_eq!(last.phone, phone);
}
