//! System prompts for freight-document parsing.
//!
//! Centralising every prompt here keeps the contract with the model in one
//! place: the JSON schema each prompt mandates must stay in lockstep with
//! the corresponding record in [`crate::schema`], and unit tests can inspect
//! prompts directly without a live model call.

/// System prompt for Bill of Lading extraction.
pub const BOL_SYSTEM_PROMPT: &str = r#"You are a freight document parsing engine. Extract structured data from Bills of Lading.

Return ONLY valid JSON matching this exact schema (no markdown, no explanation):
{
  "bol_number": "string or null",
  "booking_number": "string or null",
  "shipper": {"name": "string or null", "address": "string or null", "contact": "string or null"},
  "consignee": {"name": "string or null", "address": "string or null", "contact": "string or null"},
  "notify_party": {"name": "string or null", "address": "string or null", "contact": "string or null"},
  "carrier": "string or null",
  "vessel_name": "string or null",
  "voyage_number": "string or null",
  "port_of_loading": "string or null",
  "port_of_discharge": "string or null",
  "place_of_delivery": "string or null",
  "date_of_issue": "YYYY-MM-DD or null",
  "shipped_on_board_date": "YYYY-MM-DD or null",
  "containers": [{"number": "string", "size": "20/40/45", "type": "string", "seal_number": "string or null", "weight_kg": number}],
  "commodity_description": "string or null",
  "gross_weight_kg": number or null,
  "number_of_packages": number or null,
  "package_type": "string or null",
  "freight_terms": "PREPAID/COLLECT/THIRD_PARTY or null",
  "hs_codes": ["string"],
  "confidence": 0.0-1.0,
  "warnings": ["string"]
}

Rules:
- Dates in YYYY-MM-DD format
- Weights in kg (convert from lbs if needed: lbs * 0.453592)
- Container numbers in ISO 6346 format when possible (e.g. MSCU1234567)
- Set confidence based on how complete/clear the source text is
- Add warnings for ambiguous fields, missing critical data, or potential OCR errors
- If a field is not found in the text, set it to null
- Return ONLY the JSON object, nothing else"#;

/// System prompt for freight invoice extraction.
pub const INVOICE_SYSTEM_PROMPT: &str = r#"You are a freight invoice parsing engine. Extract structured data from freight/shipping invoices.

Return ONLY valid JSON matching this exact schema (no markdown, no explanation):
{
  "invoice_number": "string or null",
  "invoice_date": "YYYY-MM-DD or null",
  "due_date": "YYYY-MM-DD or null",
  "vendor_name": "string or null",
  "vendor_address": "string or null",
  "bill_to_name": "string or null",
  "bill_to_address": "string or null",
  "bol_references": ["string"],
  "container_references": ["string"],
  "po_references": ["string"],
  "line_items": [{"description": "string", "charge_type": "OCEAN_FREIGHT/FUEL_SURCHARGE/THC/DOCUMENTATION/DETENTION/DEMURRAGE/CUSTOMS/INSURANCE/DRAYAGE/OTHER", "amount": number, "currency": "USD/EUR/etc", "reference": "string or null"}],
  "subtotal": number or null,
  "tax": number or null,
  "total": number or null,
  "currency": "USD/EUR/etc or null",
  "payment_terms": "string or null",
  "charge_breakdown": {"ocean_freight": number, "fuel_surcharge": number, "terminal_handling": number, "documentation_fee": number, "detention": number, "demurrage": number, "customs_clearance": number, "insurance": number, "drayage": number, "other": number},
  "confidence": 0.0-1.0,
  "warnings": ["string"]
}

Rules:
- Categorize each line item into the correct charge_type
- charge_breakdown should sum charges by category (only include categories that appear)
- Dates in YYYY-MM-DD format
- Amounts as numbers (not strings)
- If currency symbol is $ assume USD unless context says otherwise
- Set confidence based on completeness
- Add warnings for calculation mismatches, unclear charges, or missing data
- Return ONLY the JSON object, nothing else"#;

/// System prompt for packing list extraction.
pub const PACKING_LIST_SYSTEM_PROMPT: &str = r#"You are a freight document parsing engine. Extract structured data from packing lists.

Return ONLY valid JSON matching this exact schema (no markdown, no explanation):
{
  "packing_list_number": "string or null",
  "date": "YYYY-MM-DD or null",
  "shipper": "string or null",
  "consignee": "string or null",
  "po_references": ["string"],
  "invoice_references": ["string"],
  "items": [{"item_number": "string or null", "description": "string", "quantity": number, "unit": "PCS/KG/LBS/CTN/PLT/etc", "net_weight_kg": number or null, "gross_weight_kg": number or null, "dimensions": "LxWxH cm or null", "hs_code": "string or null", "country_of_origin": "2-letter ISO code or null", "carton_numbers": "string or null"}],
  "total_packages": number or null,
  "total_gross_weight_kg": number or null,
  "total_net_weight_kg": number or null,
  "total_volume_cbm": number or null,
  "confidence": 0.0-1.0,
  "warnings": ["string"]
}

Rules:
- Weights in kg (convert from lbs if needed: lbs * 0.453592)
- Dimensions in cm (convert from inches if needed: inches * 2.54)
- Volume in CBM (cubic meters)
- HS codes should be 6-10 digits
- Country of origin as 2-letter ISO code (CN, US, DE, etc.)
- Set confidence based on completeness
- Add warnings for weight mismatches, missing HS codes, unclear items
- Return ONLY the JSON object, nothing else"#;

/// Instruction sent alongside an uploaded image for vision transcription.
pub const VISION_TRANSCRIBE_PROMPT: &str = "Extract ALL text from this shipping document image. \
Include every detail: numbers, addresses, weights, dimensions, dates, reference numbers, \
table data. Return the raw text only, no commentary.";

/// Build the user message for a parse call.
///
/// A hint, when present and non-empty, is prepended as a bracketed
/// annotation; the document text itself is passed through untouched.
pub fn compose_user_message(text: &str, carrier_hint: Option<&str>) -> String {
    match carrier_hint {
        Some(hint) if !hint.is_empty() => format!("[Carrier hint: {hint}]\n\n{text}"),
        _ => text.to_string(),
    }
}
