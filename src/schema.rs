//! Request bodies and the three fixed result schemas.
//!
//! Every result record is a flat set of optional scalars plus nested
//! sub-records and sequences. Decoding is strict in one direction only:
//! fields *absent* from the model's JSON take their schema default (`None`,
//! empty vec, `0.0` confidence), while fields *present with the wrong shape*
//! fail the whole decode atomically. Unknown extra fields are ignored.
//!
//! Deliberately absent: cross-field checks. Line-item amounts are never
//! re-summed against a stated total, and `confidence` is not clamped to
//! [0, 1] — mismatches and calibration are the model's problem and only
//! ever appear as `warnings` strings in its own reply.

use crate::error::ApiError;
use crate::prompts;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minimum accepted `text` length for text-body requests.
pub const MIN_TEXT_LEN: usize = 20;
/// Maximum accepted `text` length for text-body requests.
pub const MAX_TEXT_LEN: usize = 50_000;

/// The three document kinds this service parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    BillOfLading,
    FreightInvoice,
    PackingList,
}

impl DocumentKind {
    /// System prompt mandating JSON-only output for this kind.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            DocumentKind::BillOfLading => prompts::BOL_SYSTEM_PROMPT,
            DocumentKind::FreightInvoice => prompts::INVOICE_SYSTEM_PROMPT,
            DocumentKind::PackingList => prompts::PACKING_LIST_SYSTEM_PROMPT,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentKind::BillOfLading => "bill of lading",
            DocumentKind::FreightInvoice => "freight invoice",
            DocumentKind::PackingList => "packing list",
        };
        f.write_str(label)
    }
}

/// Strictly decode a recovered model reply into the target record.
///
/// Shape mismatches fail the whole request; there is no partial acceptance.
pub fn decode<T: DeserializeOwned>(kind: DocumentKind, value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| {
        ApiError::Validation(format!("Model reply did not match the {kind} schema: {e}"))
    })
}

/// Validate the `text` field of a text-body request.
pub fn validate_text(text: &str) -> Result<(), ApiError> {
    let len = text.chars().count();
    if len < MIN_TEXT_LEN || len > MAX_TEXT_LEN {
        return Err(ApiError::Validation(format!(
            "text must be between {MIN_TEXT_LEN} and {MAX_TEXT_LEN} characters, got {len}"
        )));
    }
    Ok(())
}

// ── Request bodies ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BolRequest {
    /// Raw BOL text or OCR output.
    pub text: String,
    /// Carrier name hint for better parsing (e.g. "Maersk", "MSC").
    pub carrier_hint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct PackingRequest {
    pub text: String,
}

// ── Bill of Lading ───────────────────────────────────────────────────────

/// A named party on a Bill of Lading (shipper, consignee, notify party).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BolParty {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BolContainer {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default, rename = "type")]
    pub container_type: Option<String>,
    #[serde(default)]
    pub seal_number: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

/// Structured Bill of Lading extraction result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BolRecord {
    #[serde(default)]
    pub bol_number: Option<String>,
    #[serde(default)]
    pub booking_number: Option<String>,
    #[serde(default)]
    pub shipper: Option<BolParty>,
    #[serde(default)]
    pub consignee: Option<BolParty>,
    #[serde(default)]
    pub notify_party: Option<BolParty>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub vessel_name: Option<String>,
    #[serde(default)]
    pub voyage_number: Option<String>,
    #[serde(default)]
    pub port_of_loading: Option<String>,
    #[serde(default)]
    pub port_of_discharge: Option<String>,
    #[serde(default)]
    pub place_of_delivery: Option<String>,
    #[serde(default)]
    pub date_of_issue: Option<String>,
    #[serde(default)]
    pub shipped_on_board_date: Option<String>,
    #[serde(default)]
    pub containers: Vec<BolContainer>,
    #[serde(default)]
    pub commodity_description: Option<String>,
    #[serde(default)]
    pub gross_weight_kg: Option<f64>,
    #[serde(default)]
    pub number_of_packages: Option<i64>,
    #[serde(default)]
    pub package_type: Option<String>,
    #[serde(default)]
    pub freight_terms: Option<String>,
    #[serde(default)]
    pub hs_codes: Vec<String>,
    /// Model-self-reported completeness estimate. Passed through unclamped.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

// ── Freight invoice ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineItem {
    /// The only required field inside any record: a line item without a
    /// description is a shape mismatch, not a defaultable absence.
    pub description: String,
    #[serde(default)]
    pub charge_type: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Structured freight invoice extraction result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub vendor_address: Option<String>,
    #[serde(default)]
    pub bill_to_name: Option<String>,
    #[serde(default)]
    pub bill_to_address: Option<String>,
    #[serde(default)]
    pub bol_references: Vec<String>,
    #[serde(default)]
    pub container_references: Vec<String>,
    #[serde(default)]
    pub po_references: Vec<String>,
    #[serde(default)]
    pub line_items: Vec<InvoiceLineItem>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub tax: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    /// Charges summed by category (ocean_freight, fuel_surcharge, …).
    /// Only categories that appear on the invoice are present.
    #[serde(default)]
    pub charge_breakdown: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

// ── Packing list ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackingItem {
    #[serde(default)]
    pub item_number: Option<String>,
    pub description: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub net_weight_kg: Option<f64>,
    #[serde(default)]
    pub gross_weight_kg: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub hs_code: Option<String>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub carton_numbers: Option<String>,
}

/// Structured packing list extraction result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackingRecord {
    #[serde(default)]
    pub packing_list_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub shipper: Option<String>,
    #[serde(default)]
    pub consignee: Option<String>,
    #[serde(default)]
    pub po_references: Vec<String>,
    #[serde(default)]
    pub invoice_references: Vec<String>,
    #[serde(default)]
    pub items: Vec<PackingItem>,
    #[serde(default)]
    pub total_packages: Option<i64>,
    #[serde(default)]
    pub total_gross_weight_kg: Option<f64>,
    #[serde(default)]
    pub total_net_weight_kg: Option<f64>,
    #[serde(default)]
    pub total_volume_cbm: Option<f64>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}
