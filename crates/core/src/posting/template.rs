//! Expands a business event into a voucher draft.

use rust_decimal::Decimal;

use crate::ledger::{AccountRef, ConfigurationError, LedgerError, PostingLeg, VoucherDraft};

use super::event::BusinessEvent;
use super::rules::{LegTarget, PostingTemplate};

/// Expands `event` through its template.
///
/// Zero amounts produce no line, so an intrastate invoice never carries an
/// IGST line and a sale without COGS never touches inventory. The result
/// still goes through [`LedgerService`](crate::ledger::LedgerService) for the
/// balance check.
///
/// # Errors
///
/// `NegativeAmount` for negative inputs, `MissingParty` when a party rule has
/// no party, `Configuration` when the party type has no advance role.
pub fn expand(event: &BusinessEvent) -> Result<VoucherDraft, LedgerError> {
    let template = PostingTemplate::for_kind(event.kind);

    let legs = if template.rules.is_empty() {
        event.journal_legs.clone()
    } else {
        let mut legs = Vec::with_capacity(template.rules.len() + event.instruments.len());
        for rule in template.rules {
            if rule.target == LegTarget::Instruments {
                for instrument in &event.instruments {
                    if !positive(instrument.amount)? {
                        continue;
                    }
                    let description = instrument
                        .description
                        .clone()
                        .unwrap_or_else(|| instrument.mode.as_str().to_string());
                    legs.push(PostingLeg {
                        account: AccountRef::Role(instrument.mode.instrument_role()),
                        entry_type: rule.side,
                        amount: instrument.amount,
                        description: Some(description),
                        tax_amount: None,
                    });
                }
                continue;
            }

            let amount = rule.amount.pick(&event.amounts);
            if !positive(amount)? {
                continue;
            }
            let account = match rule.target {
                LegTarget::Role(role) => AccountRef::Role(role),
                LegTarget::Party => AccountRef::Party(event.party.ok_or(LedgerError::MissingParty)?),
                LegTarget::PartyAdvance => {
                    let party = event.party.ok_or(LedgerError::MissingParty)?;
                    let role = party
                        .party_type
                        .advance_role()
                        .ok_or(ConfigurationError::PartyTypeNotProvisioned(party.party_type))?;
                    AccountRef::Role(role)
                }
                LegTarget::Instruments => continue,
            };
            legs.push(PostingLeg {
                account,
                entry_type: rule.side,
                amount,
                description: None,
                tax_amount: rule.amount.is_tax().then_some(amount),
            });
        }
        legs
    };

    let voucher_type_code = event
        .voucher_type_code
        .clone()
        .unwrap_or_else(|| template.voucher_type_code.to_string());

    Ok(VoucherDraft {
        voucher_type_code,
        voucher_date: event.voucher_date,
        reference: event.reference.clone(),
        narration: event.narration.clone(),
        currency: event.currency.clone(),
        exchange_rate: event.exchange_rate,
        legs,
    })
}

fn positive(amount: Decimal) -> Result<bool, LedgerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::NegativeAmount);
    }
    Ok(!amount.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gst::GstService;
    use crate::ledger::{AccountRole, DocumentReference, EntryType, LedgerService};
    use crate::party::{PartyRef, PartyType};
    use crate::payment::PaymentMode;
    use crate::posting::event::{EventAmounts, EventKind, InstrumentLeg};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
    }

    fn event(kind: EventKind, amounts: EventAmounts) -> BusinessEvent {
        BusinessEvent::new(
            kind,
            date(),
            DocumentReference::new(kind.as_str(), Uuid::new_v4(), "DOC-1"),
            "INR",
            amounts,
        )
    }

    fn customer() -> PartyRef {
        PartyRef::new(PartyType::Customer, Uuid::new_v4())
    }

    fn roles(draft: &VoucherDraft) -> Vec<(AccountRef, EntryType, Decimal)> {
        draft
            .legs
            .iter()
            .map(|leg| (leg.account, leg.entry_type, leg.amount))
            .collect()
    }

    #[test]
    fn test_sales_invoice_has_sparse_gst_lines() {
        let gst = GstService::calculate_gst(dec!(1000), dec!(18), false).unwrap();
        let party = customer();
        let amounts = EventAmounts {
            total: gst.total_amount,
            subtotal: gst.subtotal,
            cgst: gst.cgst_amount,
            sgst: gst.sgst_amount,
            igst: gst.igst_amount,
            ..EventAmounts::default()
        };
        let draft = expand(&event(EventKind::SalesInvoice, amounts).with_party(party)).unwrap();

        assert_eq!(draft.voucher_type_code, "SV");
        assert_eq!(
            roles(&draft),
            vec![
                (AccountRef::Party(party), EntryType::Debit, dec!(1180)),
                (AccountRef::Role(AccountRole::Sales), EntryType::Credit, dec!(1000)),
                (AccountRef::Role(AccountRole::GstOutputCgst), EntryType::Credit, dec!(90)),
                (AccountRef::Role(AccountRole::GstOutputSgst), EntryType::Credit, dec!(90)),
            ]
        );
        assert_eq!(draft.legs[2].tax_amount, Some(dec!(90)));
        assert_eq!(draft.legs[1].tax_amount, None);
        assert!(LedgerService::validate_legs(&draft).is_ok());
    }

    #[test]
    fn test_purchase_invoice_interstate() {
        let party = PartyRef::new(PartyType::Supplier, Uuid::new_v4());
        let amounts = EventAmounts {
            total: dec!(1120),
            subtotal: dec!(1000),
            igst: dec!(120),
            ..EventAmounts::default()
        };
        let draft = expand(&event(EventKind::PurchaseInvoice, amounts).with_party(party)).unwrap();
        assert_eq!(
            roles(&draft),
            vec![
                (AccountRef::Role(AccountRole::Purchase), EntryType::Debit, dec!(1000)),
                (AccountRef::Role(AccountRole::GstInputIgst), EntryType::Debit, dec!(120)),
                (AccountRef::Party(party), EntryType::Credit, dec!(1120)),
            ]
        );
    }

    #[test]
    fn test_sale_with_and_without_cogs() {
        let amounts = EventAmounts {
            total: dec!(500),
            subtotal: dec!(500),
            ..EventAmounts::default()
        };
        let draft = expand(&event(EventKind::Sale, amounts)).unwrap();
        assert_eq!(draft.legs.len(), 2);
        assert_eq!(
            draft.legs[0].account,
            AccountRef::Role(AccountRole::AccountsReceivable)
        );

        let with_cogs = EventAmounts {
            cogs: dec!(300),
            ..amounts
        };
        let draft = expand(&event(EventKind::Sale, with_cogs)).unwrap();
        assert_eq!(draft.legs.len(), 4);
        assert_eq!(draft.legs[2].account, AccountRef::Role(AccountRole::Cogs));
        assert_eq!(draft.legs[3].account, AccountRef::Role(AccountRole::Inventory));
        assert!(LedgerService::validate_legs(&draft).is_ok());
    }

    #[test]
    fn test_receipt_expands_instruments_and_tds() {
        let party = customer();
        let amounts = EventAmounts {
            total: dec!(1000),
            tds: dec!(20),
            ..EventAmounts::default()
        };
        let draft = expand(
            &event(EventKind::Receipt, amounts)
                .with_party(party)
                .with_instruments(vec![
                    InstrumentLeg {
                        mode: PaymentMode::Cash,
                        amount: dec!(300),
                        description: None,
                    },
                    InstrumentLeg {
                        mode: PaymentMode::Upi,
                        amount: dec!(680),
                        description: Some("UPI ref 991".to_string()),
                    },
                    InstrumentLeg {
                        mode: PaymentMode::Card,
                        amount: dec!(0),
                        description: None,
                    },
                ]),
        )
        .unwrap();

        assert_eq!(draft.voucher_type_code, "RV");
        assert_eq!(
            roles(&draft),
            vec![
                (AccountRef::Role(AccountRole::Cash), EntryType::Debit, dec!(300)),
                (AccountRef::Role(AccountRole::Bank), EntryType::Debit, dec!(680)),
                (AccountRef::Role(AccountRole::TdsReceivable), EntryType::Debit, dec!(20)),
                (AccountRef::Party(party), EntryType::Credit, dec!(1000)),
            ]
        );
        assert_eq!(draft.legs[0].description.as_deref(), Some("CASH"));
        assert_eq!(draft.legs[1].description.as_deref(), Some("UPI ref 991"));
        assert!(LedgerService::validate_legs(&draft).is_ok());
    }

    #[test]
    fn test_advance_receipt_uses_party_advance_role() {
        let patient = PartyRef::new(PartyType::Patient, Uuid::new_v4());
        let amounts = EventAmounts {
            total: dec!(250),
            ..EventAmounts::default()
        };
        let draft = expand(
            &event(EventKind::AdvanceReceipt, amounts)
                .with_party(patient)
                .with_instruments(vec![InstrumentLeg {
                    mode: PaymentMode::Bank,
                    amount: dec!(250),
                    description: None,
                }]),
        )
        .unwrap();
        assert_eq!(
            roles(&draft),
            vec![
                (AccountRef::Role(AccountRole::Bank), EntryType::Debit, dec!(250)),
                (AccountRef::Role(AccountRole::PatientAdvance), EntryType::Credit, dec!(250)),
            ]
        );
    }

    #[test]
    fn test_advance_applied_receivable() {
        let party = customer();
        let amounts = EventAmounts {
            total: dec!(75),
            ..EventAmounts::default()
        };
        let draft =
            expand(&event(EventKind::AdvanceAppliedReceivable, amounts).with_party(party)).unwrap();
        assert_eq!(draft.voucher_type_code, "JV");
        assert_eq!(
            roles(&draft),
            vec![
                (AccountRef::Role(AccountRole::CustomerAdvance), EntryType::Debit, dec!(75)),
                (AccountRef::Party(party), EntryType::Credit, dec!(75)),
            ]
        );
    }

    #[test]
    fn test_credit_note_reverses_sales_and_gst() {
        let party = customer();
        let amounts = EventAmounts {
            total: dec!(118),
            subtotal: dec!(100),
            cgst: dec!(9),
            sgst: dec!(9),
            ..EventAmounts::default()
        };
        let draft = expand(&event(EventKind::CreditNote, amounts).with_party(party)).unwrap();
        assert_eq!(draft.voucher_type_code, "CN");
        assert_eq!(draft.legs[0].entry_type, EntryType::Debit);
        assert_eq!(draft.legs[0].account, AccountRef::Role(AccountRole::Sales));
        assert_eq!(draft.legs.last().unwrap().account, AccountRef::Party(party));
        assert!(LedgerService::validate_legs(&draft).is_ok());
    }

    #[test]
    fn test_missing_party() {
        let amounts = EventAmounts {
            total: dec!(10),
            subtotal: dec!(10),
            ..EventAmounts::default()
        };
        assert!(matches!(
            expand(&event(EventKind::SalesInvoice, amounts)),
            Err(LedgerError::MissingParty)
        ));
    }

    #[test]
    fn test_employee_advance_is_configuration_error() {
        let employee = PartyRef::new(PartyType::Employee, Uuid::new_v4());
        let amounts = EventAmounts {
            total: dec!(10),
            ..EventAmounts::default()
        };
        assert!(matches!(
            expand(&event(EventKind::AdvancePayment, amounts).with_party(employee)),
            Err(LedgerError::Configuration(
                ConfigurationError::PartyTypeNotProvisioned(PartyType::Employee)
            ))
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let amounts = EventAmounts {
            total: dec!(-10),
            ..EventAmounts::default()
        };
        assert!(matches!(
            expand(&event(EventKind::WasteWriteOff, amounts)),
            Err(LedgerError::NegativeAmount)
        ));
    }

    #[test]
    fn test_journal_and_type_override() {
        let mut journal = event(EventKind::Journal, EventAmounts::default());
        journal.voucher_type_code = Some("CV".to_string());
        journal.journal_legs = vec![
            PostingLeg::debit(AccountRef::Role(AccountRole::Bank), dec!(5000)),
            PostingLeg::credit(AccountRef::Role(AccountRole::Cash), dec!(5000)),
        ];
        let draft = expand(&journal).unwrap();
        assert_eq!(draft.voucher_type_code, "CV");
        assert_eq!(draft.legs, journal.journal_legs);
    }
}
