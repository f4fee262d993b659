use chrono::{NaiveDate, TimeZone, Utc};
use invoice_studio::model::{
    apply_extracted_fields, ExtractedInvoice, ExtractedItem, ExtractedParty, InvoiceData,
    InvoiceRecord, InvoiceStatus, LineItem, PartyInfo,
};
use invoice_studio::{compute_totals, InvoiceError};
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
}

fn sample() -> InvoiceData {
    let mut data = InvoiceData::new_default(today());
    data.sender = PartyInfo {
        name: "Acme".to_string(),
        email: "billing@acme.test".to_string(),
        address: "1 Road".to_string(),
        phone: None,
    };
    data.items = vec![
        LineItem::new("Design", Some(2.0), Some(50.0)),
        LineItem::new("Hosting", Some(1.0), Some(10.0)),
    ];
    data
}

#[test]
fn new_default_shape() {
    let data = InvoiceData::new_default(today());
    assert!(data.invoice_number.starts_with("INV-2603-"));
    assert_eq!(data.invoice_number.len(), "INV-2603-0000".len());
    assert_eq!(data.issue_date, Some(today()));
    assert_eq!(data.due_date, NaiveDate::from_ymd_opt(2026, 4, 4));
    assert_eq!(data.items.len(), 1);
    assert_eq!(data.items[0].quantity(), Some(1.0));
    assert_eq!(data.items[0].rate(), None);
    assert_eq!(data.items[0].amount(), 0.0);
    assert!(data.tax.is_none());
}

#[test]
fn empty_extracted_items_leave_items_alone() {
    let current = sample();
    let extracted = ExtractedInvoice {
        items: Some(Vec::new()),
        ..ExtractedInvoice::default()
    };
    let merged = apply_extracted_fields(&current, &extracted);
    assert_eq!(merged.items, current.items);
}

#[test]
fn extracted_items_replace_the_list() {
    let current = sample();
    let extracted = ExtractedInvoice {
        items: Some(vec![
            ExtractedItem {
                description: "Audit".to_string(),
                quantity: Some(3.0),
                rate: Some(100.0),
            },
            ExtractedItem {
                description: "Report".to_string(),
                quantity: None,
                rate: Some(250.0),
            },
        ]),
        ..ExtractedInvoice::default()
    };
    let merged = apply_extracted_fields(&current, &extracted);

    assert_eq!(merged.items.len(), 2);
    assert_eq!(merged.items[0].description, "Audit");
    assert_eq!(merged.items[0].amount(), 300.0);
    assert_eq!(merged.items[1].amount(), 0.0);
    assert_ne!(merged.items[0].id, merged.items[1].id);
    assert!(current.items.iter().all(|old| old.id != merged.items[0].id));
}

#[test]
fn party_fields_merge_individually() {
    let current = sample();
    let extracted = ExtractedInvoice {
        sender: Some(ExtractedParty {
            email: Some("ap@acme.test".to_string()),
            ..ExtractedParty::default()
        }),
        recipient: Some(ExtractedParty {
            name: Some("Globex".to_string()),
            phone: Some("555-0100".to_string()),
            ..ExtractedParty::default()
        }),
        due_date: NaiveDate::from_ymd_opt(2026, 6, 1),
        notes: Some("Net 60".to_string()),
        ..ExtractedInvoice::default()
    };
    let merged = apply_extracted_fields(&current, &extracted);

    assert_eq!(merged.sender.name, "Acme");
    assert_eq!(merged.sender.email, "ap@acme.test");
    assert_eq!(merged.sender.address, "1 Road");
    assert_eq!(merged.recipient.name, "Globex");
    assert_eq!(merged.recipient.phone.as_deref(), Some("555-0100"));
    assert_eq!(merged.issue_date, current.issue_date);
    assert_eq!(merged.due_date, NaiveDate::from_ymd_opt(2026, 6, 1));
    assert_eq!(merged.notes.as_deref(), Some("Net 60"));
    assert_eq!(merged.invoice_number, current.invoice_number);
}

#[test]
fn merge_from_raw_reply() {
    let reply = json!({
        "recipient": { "name": "Initech", "address": "4120 Freidrich Ln" },
        "items": [{ "description": "TPS reports", "quantity": 10, "rate": "12.50" }],
        "issueDate": "2026-03-01T00:00:00Z"
    });
    let extracted = ExtractedInvoice::from_json(&reply).unwrap();
    let merged = apply_extracted_fields(&sample(), &extracted);

    assert_eq!(merged.recipient.name, "Initech");
    assert_eq!(merged.items.len(), 1);
    assert_eq!(merged.items[0].amount(), 125.0);
    assert_eq!(merged.issue_date, NaiveDate::from_ymd_opt(2026, 3, 1));
}

#[test]
fn record_json_round_trip_keeps_unset_tax() {
    let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 30, 0).unwrap();
    let record = InvoiceRecord::new("user-1", InvoiceStatus::Draft, sample(), now);

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["userId"], "user-1");
    assert_eq!(value["status"], "draft");
    assert_eq!(value["createdAt"], now.timestamp_millis());
    assert_eq!(value["data"]["issueDate"], "2026-03-05");
    assert!(value["data"].get("tax").is_none());

    let back: InvoiceRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
    assert_eq!(back.data.tax, None);
}

#[test]
fn empty_date_strings_mean_unset() {
    let data: InvoiceData = serde_json::from_value(json!({
        "invoiceNumber": "INV-1",
        "issueDate": "",
        "dueDate": "2026-04-01",
        "items": []
    }))
    .unwrap();
    assert_eq!(data.issue_date, None);
    assert_eq!(data.due_date, NaiveDate::from_ymd_opt(2026, 4, 1));

    let value = serde_json::to_value(&data).unwrap();
    assert_eq!(value["issueDate"], "");
}

#[test]
fn duplicate_gets_fresh_identity() {
    let original = sample();
    let copy = original.duplicate(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());

    assert_eq!(copy.sender, original.sender);
    assert_eq!(copy.items.len(), original.items.len());
    assert_eq!(copy.items[0].amount(), original.items[0].amount());
    assert_ne!(copy.items[0].id, original.items[0].id);
    assert!(copy.invoice_number.starts_with("INV-2607-"));
    assert_eq!(copy.issue_date, NaiveDate::from_ymd_opt(2026, 7, 1));
}

#[test]
fn last_item_cannot_be_removed() {
    let mut data = sample();
    assert!(matches!(
        data.remove_item(5),
        Err(InvoiceError::InvalidItemIndex { index: 6, count: 2 })
    ));
    let removed = data.remove_item(0).unwrap();
    assert_eq!(removed.description, "Design");
    assert!(matches!(data.remove_item(0), Err(InvoiceError::LastItem)));
    assert_eq!(data.items.len(), 1);
}

#[test]
fn tax_rate_is_validated() {
    let mut data = sample();
    assert!(data.set_tax(Some(8.25)).is_ok());
    assert!(matches!(
        data.set_tax(Some(-1.0)),
        Err(InvoiceError::InvalidTaxRate(_))
    ));
    assert!(data.set_tax(Some(f64::NAN)).is_err());
    assert_eq!(data.tax, Some(8.25));
}

#[test]
fn stale_stored_amounts_are_recomputed() {
    let data: InvoiceData = serde_json::from_value(json!({
        "invoiceNumber": "INV-1",
        "items": [
            { "id": "a", "description": "Edited", "quantity": 2, "rate": 3, "amount": 999 },
            { "id": "b", "description": "Missing", "quantity": 2, "rate": 3 }
        ]
    }))
    .unwrap();

    assert_eq!(data.items[0].amount(), 6.0);
    assert_eq!(data.items[1].amount(), 6.0);
    assert_eq!(compute_totals(&data).subtotal, 12.0);

    let value = serde_json::to_value(&data).unwrap();
    assert_eq!(value["items"][0]["amount"], 6.0);
}
