//! Common charges: documents against transactions.

use async_trait::async_trait;
use futures::future::join_all;
use ledgergen_shared::types::TaxCategoryId;
use rust_decimal::Decimal;

use super::context::GenerationContext;
use super::fees::fee_entries;
use super::financial::{build_transaction_entries, split_fees};
use super::result::{GeneratedLedger, LedgerAccumulator};
use super::ChargeLedgerGenerator;
use crate::charge::{Charge, Document, DocumentType};
use crate::currency::CurrencyService;
use crate::ledger::{EntityRef, GenerationError, LedgerEntryDraft, PartialEntry, apply_spread};

/// Generator for ordinary income and expense charges.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonGenerator;

#[async_trait]
impl ChargeLedgerGenerator for CommonGenerator {
    async fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        charge: &Charge,
    ) -> Result<GeneratedLedger, GenerationError> {
        let providers = ctx.providers;
        let (transactions, documents, spread_records) = futures::try_join!(
            providers.transactions.load_transactions_by_charge_id(charge.id),
            providers.documents.load_documents_by_charge_id(charge.id),
            providers.spread_records.get_spread_records_by_charge_id(charge.id),
        )?;

        let mut acc = LedgerAccumulator::new(charge.id);
        let documents = accounting_documents(documents);
        let has_documents = !documents.is_empty();

        if has_documents {
            let category = charge.tax_category_id.ok_or_else(|| GenerationError::MissingRequiredField {
                entity: format!("Charge {}", charge.id),
                field: "tax_category_id",
            })?;

            let results = join_all(
                documents
                    .iter()
                    .map(|document| build_document_entry(ctx, charge, category, document)),
            )
            .await;

            let mut accounting_entries = Vec::with_capacity(results.len());
            for result in results {
                match result {
                    Ok(entry) => accounting_entries.push(entry),
                    Err(err) => acc.soft_error(err.to_string()),
                }
            }
            acc.extend(apply_spread(accounting_entries, &spread_records, ctx.tax_categories())?)?;
        }

        let (main, fees) = split_fees(transactions);
        // Without documents the transactions carry the expense, so they take the spread.
        let spread_transactions = !has_documents && !spread_records.is_empty();
        if spread_transactions && charge.tax_category_id.is_none() {
            acc.soft_error(format!(
                "Charge {} has spread records but no tax category to spread",
                charge.id
            ));
        }
        let mut category_entries = Vec::new();

        for result in build_transaction_entries(ctx, charge.owner_id, &main).await {
            let financial = match result {
                Ok(financial) => financial,
                Err(err) => {
                    acc.soft_error(err.to_string());
                    continue;
                }
            };

            let business = financial.transaction.business_id.map(EntityRef::Business);
            let counterparty = match (has_documents, charge.tax_category_id, business) {
                (true, _, Some(business)) => business,
                (false, Some(category), _) => EntityRef::TaxCategory(category),
                (false, None, Some(business)) => {
                    acc.soft_error(format!("Charge {} has no tax category", charge.id));
                    business
                }
                (_, _, None) => {
                    acc.soft_error(format!(
                        "Transaction {} has no counterparty business",
                        financial.transaction.id
                    ));
                    continue;
                }
            };

            let account = EntityRef::TaxCategory(financial.account_category);
            match counterparty {
                EntityRef::TaxCategory(_) if spread_transactions => {
                    // Spreading moves the own side, so the charge category goes there.
                    let mut partial = financial.partial;
                    partial.is_creditor_counterparty = !partial.is_creditor_counterparty;
                    category_entries.push(partial.assign(account, counterparty));
                }
                _ => acc.push(financial.partial.assign(counterparty, account))?,
            }
        }
        acc.extend(apply_spread(category_entries, &spread_records, ctx.tax_categories())?)?;

        for result in build_transaction_entries(ctx, charge.owner_id, &fees).await {
            match result {
                Ok(fee) => acc.extend(fee_entries(&fee, ctx.tax_categories().fee))?,
                Err(err) => acc.soft_error(err.to_string()),
            }
        }

        acc.finish(&[], false)
    }
}

/// Invoice-type documents, or receipts when the charge has no invoice.
fn accounting_documents(documents: Vec<Document>) -> Vec<Document> {
    let (invoices, others): (Vec<_>, Vec<_>) = documents
        .into_iter()
        .partition(|d| d.document_type.is_invoice());

    if invoices.is_empty() {
        others
            .into_iter()
            .filter(|d| d.document_type == DocumentType::Receipt)
            .collect()
    } else {
        invoices
    }
}

/// Books a document: counterparty against the charge category, VAT in slot 2.
async fn build_document_entry(
    ctx: &GenerationContext<'_>,
    charge: &Charge,
    category: TaxCategoryId,
    document: &Document,
) -> Result<LedgerEntryDraft, GenerationError> {
    let missing = |field| GenerationError::MissingRequiredField {
        entity: format!("Document {}", document.id),
        field,
    };

    let date = document.date.ok_or_else(|| missing("date"))?;
    let currency = document.currency.ok_or_else(|| missing("currency"))?;
    let total = document.total_amount.ok_or_else(|| missing("total_amount"))?;

    let (counterparty, is_income) = if document.creditor_id == Some(charge.owner_id) {
        (document.debtor_id.ok_or_else(|| missing("debtor_id"))?, true)
    } else if document.debtor_id == Some(charge.owner_id) {
        (document.creditor_id.ok_or_else(|| missing("creditor_id"))?, false)
    } else {
        return Err(GenerationError::StructuralViolation(format!(
            "Document {} does not involve the charge owner",
            document.id
        )));
    };

    // Credit invoices reverse the direction of the original invoice.
    let is_creditor_counterparty = (document.document_type == DocumentType::CreditInvoice) == is_income;

    let gross = total.abs();
    let vat = document.vat_amount.unwrap_or_default().abs();
    let net = gross - vat;

    let rate = ctx.converter().get_rate(currency, date).await?;
    let is_foreign = currency != ctx.local_currency();
    let overflow = || GenerationError::overflow(format!("Document {}", document.id));
    let local_net = CurrencyService::convert(net, rate).ok_or_else(overflow)?;

    let entry = PartialEntry {
        id: document.id.to_string(),
        invoice_date: date,
        value_date: date,
        currency,
        foreign_amount: is_foreign.then_some(net),
        local_amount: local_net,
        description: None,
        reference1: document.serial_number.clone(),
        is_creditor_counterparty,
        owner_id: charge.owner_id,
        charge_id: charge.id,
        currency_rate: is_foreign.then_some(rate),
    }
    .assign(EntityRef::Business(counterparty), EntityRef::TaxCategory(category));

    if vat == Decimal::ZERO {
        return Ok(entry);
    }

    let vat_category = if is_income {
        ctx.tax_categories().output_vat
    } else {
        ctx.tax_categories().input_vat
    };
    Ok(entry.with_auxiliary_split(
        EntityRef::TaxCategory(vat_category),
        CurrencyService::convert(vat, rate).ok_or_else(overflow)?,
        is_foreign.then_some(vat),
    ))
}
