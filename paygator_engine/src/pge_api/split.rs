//! Commission split between the platform and the vendor.
use log::*;
use paygator_common::{Amount, Percentage};

use crate::{
    db_types::{PaymentMetadata, PayoutSplit},
    pge_api::errors::PayoutError,
};

/// Derives the vendor and platform amounts for a payment of `total`.
///
/// The vendor share comes from `orderDetails.internal.vendorShare` in `metadata` and defaults to 100%.
///
/// Without a commission override the commission is `100 - vendorShare`, and the commission amount is whatever is left
/// of the total once the vendor amount has been rounded, so the two amounts always add up to the total.
///
/// A non-empty `commission_override` replaces the commission percentage, but the vendor amount is still computed from
/// the stored vendor share. The two percentages need not add up to 100 in that case.
pub fn compute_split(
    total: Amount,
    metadata: &PaymentMetadata,
    commission_override: Option<&str>,
) -> Result<PayoutSplit, PayoutError> {
    let vendor_share =
        metadata.vendor_share().map_err(|e| PayoutError::InvalidInput(e.to_string()))?.unwrap_or_else(Percentage::hundred);
    if !vendor_share.is_within_bounds() {
        return Err(PayoutError::InvalidInput(format!("Vendor share {vendor_share}% is outside of 0-100%")));
    }
    let commission_override = commission_override.map(str::trim).filter(|s| !s.is_empty());
    let system_commission = match commission_override {
        Some(s) => s
            .parse::<Percentage>()
            .map_err(|e| PayoutError::InvalidInput(format!("Commission percentage must be a number. {e}")))?,
        None => vendor_share.complement(),
    };
    if !system_commission.is_within_bounds() {
        return Err(PayoutError::InvalidInput(format!("Commission {system_commission}% is outside of 0-100%")));
    }
    let vendor_amount = total.portion(vendor_share).map_err(|e| PayoutError::InvalidInput(e.to_string()))?;
    let system_commission_amount = match commission_override {
        Some(_) => total.portion(system_commission).map_err(|e| PayoutError::InvalidInput(e.to_string()))?,
        None => total - vendor_amount,
    };
    trace!(
        "💸️ Split of {total}: vendor {vendor_share}% = {vendor_amount}, platform {system_commission}% = \
         {system_commission_amount}"
    );
    Ok(PayoutSplit { total_amount: total, vendor_amount, system_commission, system_commission_amount, vendor_share })
}
