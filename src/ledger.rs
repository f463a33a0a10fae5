use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::error::{ResitError, Result};
use crate::models::{OrgSettings, ReceiptData, SavedReceipt, StorageState};
use crate::numbering::{parse_sequence, Clock};
use crate::store::Store;

/// Amounts are persisted as JSON numbers; beyond this many significant digits
/// they would not read back exactly.
pub const MAX_AMOUNT_DIGITS: u32 = 15;

fn significant_digits(value: Decimal) -> u32 {
    let mut mantissa = value.normalize().mantissa().unsigned_abs();
    let mut digits = 0;
    while mantissa > 0 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

/// Reject drafts that cannot be issued: no payer, nothing paid, or an amount
/// too precise to store.
pub fn validate(draft: &ReceiptData) -> Result<()> {
    if draft.received_from.trim().is_empty() {
        return Err(ResitError::Validation(
            "Payer name is required (--from).".to_string(),
        ));
    }
    if draft.amount <= Decimal::ZERO {
        return Err(ResitError::Validation(format!(
            "Amount must be greater than zero (got {}).",
            draft.amount
        )));
    }
    if significant_digits(draft.amount) > MAX_AMOUNT_DIGITS {
        return Err(ResitError::Validation(format!(
            "Amount {} has more than {MAX_AMOUNT_DIGITS} significant digits.",
            draft.amount
        )));
    }
    Ok(())
}

/// Turn a draft into a history entry and advance the counter.
///
/// The counter never moves backwards: a hand-edited or out-of-order receipt
/// number only raises it. Unparsable numbers count as the next in sequence.
pub fn finalize(
    draft: &ReceiptData,
    state: &StorageState,
    clock: &dyn Clock,
) -> Result<(SavedReceipt, StorageState)> {
    validate(draft)?;

    let issued = parse_sequence(&draft.receipt_no)
        .unwrap_or_else(|| state.last_receipt_number.saturating_add(1));
    let saved = SavedReceipt {
        receipt: draft.clone(),
        id: Uuid::new_v4().to_string(),
        timestamp: clock.now_millis(),
    };

    let mut next = state.clone();
    next.last_receipt_number = issued.max(state.last_receipt_number);
    next.history.insert(0, saved.clone());
    Ok((saved, next))
}

/// Remove one history entry by id.
pub fn delete(id: &str, state: &StorageState) -> Result<StorageState> {
    let pos = state
        .history
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| ResitError::NotFound(id.to_string()))?;
    let mut next = state.clone();
    next.history.remove(pos);
    Ok(next)
}

pub fn total_collected(history: &[SavedReceipt]) -> Decimal {
    history.iter().map(|r| r.receipt.amount).sum()
}

fn single<'a>(
    key: &str,
    matches: Vec<&'a SavedReceipt>,
) -> Result<Option<&'a SavedReceipt>> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches[0])),
        count => Err(ResitError::Ambiguous {
            key: key.to_string(),
            count,
        }),
    }
}

/// Look up an entry by full id, exact receipt number, or id prefix, in that
/// order. More than one match at the deciding step is an error.
pub fn find<'a>(history: &'a [SavedReceipt], key: &str) -> Result<Option<&'a SavedReceipt>> {
    let key = key.trim();
    if key.is_empty() {
        return Ok(None);
    }
    if let Some(r) = history.iter().find(|r| r.id == key) {
        return Ok(Some(r));
    }
    let by_number: Vec<_> = history.iter().filter(|r| r.receipt.receipt_no == key).collect();
    if !by_number.is_empty() {
        return single(key, by_number);
    }
    single(key, history.iter().filter(|r| r.id.starts_with(key)).collect())
}

/// Load the record and bring its counter into the current year.
pub fn open(store: &dyn Store, clock: &dyn Clock) -> StorageState {
    let mut state = store.load();
    state.roll_year(clock);
    state
}

/// Finalize `draft` and persist the result. Nothing is kept if the write fails.
pub fn record(store: &dyn Store, clock: &dyn Clock, draft: &ReceiptData) -> Result<SavedReceipt> {
    let state = open(store, clock);
    let (saved, next) = finalize(draft, &state, clock)?;
    store.save(&next)?;
    info!(
        receipt_no = %saved.receipt.receipt_no,
        id = %saved.id,
        amount = %saved.receipt.amount,
        "receipt recorded"
    );
    Ok(saved)
}

/// Delete the entry with `id` and persist. Callers must have confirmed first.
pub fn remove(store: &dyn Store, clock: &dyn Clock, id: &str) -> Result<SavedReceipt> {
    let state = open(store, clock);
    let removed = state
        .history
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .ok_or_else(|| ResitError::NotFound(id.to_string()))?;
    let next = delete(id, &state)?;
    store.save(&next)?;
    info!(receipt_no = %removed.receipt.receipt_no, id, "receipt deleted");
    Ok(removed)
}

/// Replace the organization settings and persist.
pub fn update_settings(store: &dyn Store, clock: &dyn Clock, settings: OrgSettings) -> Result<()> {
    let mut state = open(store, clock);
    state.settings = settings;
    store.save(&state)?;
    info!("organization settings saved");
    Ok(())
}
