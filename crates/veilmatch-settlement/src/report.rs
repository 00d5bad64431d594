//! ABI layout of on-chain reports.
//!
//! Settlement report:
//!
//! ```text
//! (uint8 reportType, bytes32 orderId, address stealthBuyer, address stealthSeller,
//!  address tokenA, address tokenB, uint256 amountA, uint256 amountB)
//! ```
//!
//! `orderId` is the match id. `tokenA`/`amountA` is the base leg,
//! `tokenB`/`amountB` the quote leg, both scaled to token base units.
//!
//! Verification report: `(uint8 reportType, uint256 nullifierHash)`.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, SolType, sol};
use rust_decimal::Decimal;
use veilmatch_types::constants::{REPORT_TYPE_SETTLEMENT, REPORT_TYPE_VERIFICATION};
use veilmatch_types::{MatchResult, PairTokens, Result, VeilmatchError};

sol! {
    struct SettlementReport {
        uint8 reportType;
        bytes32 orderId;
        address stealthBuyer;
        address stealthSeller;
        address tokenA;
        address tokenB;
        uint256 amountA;
        uint256 amountB;
    }

    struct VerificationReport {
        uint8 reportType;
        uint256 nullifierHash;
    }

    interface IReportReceiver {
        function submitReport(bytes report, bytes signature) external;
    }
}

/// Convert a decimal token amount to base units.
///
/// Fails if the amount is negative or has more fractional digits than the
/// token supports; nothing is rounded.
pub fn scale_amount(amount: Decimal, decimals: u8) -> Result<U256> {
    let amount = amount.normalize();
    if amount.is_sign_negative() {
        return Err(VeilmatchError::ReportEncoding {
            reason: "negative amount".into(),
        });
    }
    let scale = amount.scale();
    let decimals = u32::from(decimals);
    if scale > decimals {
        return Err(VeilmatchError::ReportEncoding {
            reason: format!("amount has {scale} fractional digits, token supports {decimals}"),
        });
    }
    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| {
        VeilmatchError::ReportEncoding {
            reason: "amount mantissa out of range".into(),
        }
    })?;
    U256::from(10u8)
        .checked_pow(U256::from(decimals - scale))
        .and_then(|factor| U256::from(mantissa).checked_mul(factor))
        .ok_or_else(|| VeilmatchError::ReportEncoding {
            reason: "amount overflows uint256".into(),
        })
}

/// Assemble the settlement report for `trade`.
pub fn build_settlement_report(
    trade: &MatchResult,
    tokens: &PairTokens,
    stealth_buyer: Address,
    stealth_seller: Address,
) -> Result<SettlementReport> {
    Ok(SettlementReport {
        reportType: REPORT_TYPE_SETTLEMENT,
        orderId: B256::from(*trade.match_id.as_bytes()),
        stealthBuyer: stealth_buyer,
        stealthSeller: stealth_seller,
        tokenA: tokens.base_token,
        tokenB: tokens.quote_token,
        amountA: scale_amount(trade.trade_amount, tokens.base_decimals)?,
        amountB: scale_amount(trade.quote_amount()?, tokens.quote_decimals)?,
    })
}

#[must_use]
pub fn encode_settlement_report(report: &SettlementReport) -> Vec<u8> {
    <SettlementReport as SolType>::abi_encode(report)
}

#[must_use]
pub fn encode_verification_report(nullifier_hash: U256) -> Vec<u8> {
    <VerificationReport as SolType>::abi_encode(&VerificationReport {
        reportType: REPORT_TYPE_VERIFICATION,
        nullifierHash: nullifier_hash,
    })
}

/// Calldata for `submitReport(report, signature)` on the receiver.
#[must_use]
pub fn submit_report_calldata(report: &[u8], signature: &[u8]) -> Vec<u8> {
    IReportReceiver::submitReportCall {
        report: Bytes::copy_from_slice(report),
        signature: Bytes::copy_from_slice(signature),
    }
    .abi_encode()
}
