// concord-core/src/domain/reconcile/payload.rs
//
// Guarded reads over the device payload. The shape is versioned upstream
// (camelCase today, snake_case in older firmware), so every access tolerates
// a missing or mistyped key; only a structurally broken payload is rejected.

use serde_json::Value;

use crate::domain::error::DomainError;
use crate::domain::model::BusinessFields;

pub fn extract_business_fields(payload: &str) -> Result<BusinessFields, DomainError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| DomainError::MalformedPayload {
            reason: format!("invalid JSON: {}", e),
        })?;

    let root = value.as_object().ok_or_else(|| DomainError::MalformedPayload {
        reason: "payload is not a JSON object".into(),
    })?;

    let items: &[Value] = match first_key(&value, &["items", "lineItems", "line_items"]) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => &[],
        Some(_) => {
            return Err(DomainError::MalformedPayload {
                reason: "'items' is not an array".into(),
            });
        }
    };

    let item_field = |keys: &[&str]| {
        items
            .iter()
            .find_map(|item| first_key(item, keys).and_then(non_empty_str))
    };

    let brand = item_field(&["brandName", "brand_name", "brand"]);
    let category = item_field(&["category", "categoryName", "category_name"]);
    let product_name = item_field(&["productName", "product_name", "name"]);

    let item_count = if items.is_empty() {
        None
    } else {
        let count: f64 = items
            .iter()
            .map(|item| first_key(item, &["quantity", "qty"]).and_then(number).unwrap_or(1.0))
            .sum();
        Some(count.max(0.0).round() as u32)
    };

    let totals = first_key(&value, &["totals", "transaction"]);
    let declared_total = totals
        .and_then(|t| first_key(t, &["totalAmount", "total_amount", "amount"]))
        .and_then(number)
        .or_else(|| first_key(&value, &["totalAmount", "total_amount", "amount"]).and_then(number));

    let total_amount = declared_total.or_else(|| {
        let prices: Vec<f64> = items
            .iter()
            .filter_map(|item| first_key(item, &["totalPrice", "total_price"]).and_then(number))
            .collect();
        (!prices.is_empty()).then(|| prices.iter().sum::<f64>())
    });

    let payment_method = first_key(&value, &["paymentMethod", "payment_method"])
        .and_then(non_empty_str)
        .or_else(|| {
            totals
                .and_then(|t| first_key(t, &["paymentMethod", "payment_method"]))
                .and_then(non_empty_str)
        });

    let transcript = ["audioTranscript", "transcript", "transcription"]
        .iter()
        .find_map(|k| root.get(*k))
        .and_then(non_empty_str);

    Ok(BusinessFields {
        brand,
        category,
        product_name,
        item_count,
        total_amount,
        payment_method,
        transcript,
    })
}

fn first_key<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let obj = value.as_object()?;
    keys.iter().find_map(|k| obj.get(*k))
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// Devices send amounts both as numbers and as strings ("65.00").
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_current_payload_shape() {
        let payload = r#"{
            "transactionId": "ABC-123",
            "storeId": "102",
            "timestamp": "2025-03-09T23:59:00",
            "items": [
                {"productName": "Piattos", "brandName": "Jack n Jill", "category": "Snacks", "quantity": 2, "unitPrice": 20, "totalPrice": 40},
                {"productName": "C2", "brandName": "C2", "category": "Beverages", "quantity": 1, "totalPrice": 25}
            ],
            "totals": {"totalAmount": 65.0, "totalItems": 3},
            "paymentMethod": "cash",
            "audioTranscript": "pabili po ng chips para sa school"
        }"#;

        let fields = extract_business_fields(payload).unwrap();
        assert_eq!(fields.brand.as_deref(), Some("Jack n Jill"));
        assert_eq!(fields.category.as_deref(), Some("Snacks"));
        assert_eq!(fields.product_name.as_deref(), Some("Piattos"));
        assert_eq!(fields.item_count, Some(3));
        assert_eq!(fields.total_amount, Some(65.0));
        assert_eq!(fields.payment_method.as_deref(), Some("cash"));
        assert_eq!(
            fields.transcript.as_deref(),
            Some("pabili po ng chips para sa school")
        );
    }

    #[test]
    fn test_total_falls_back_to_item_prices() {
        let payload = r#"{"items": [{"totalPrice": "12.50"}, {"total_price": 7.5, "qty": 3}]}"#;
        let fields = extract_business_fields(payload).unwrap();
        assert_eq!(fields.total_amount, Some(20.0));
        assert_eq!(fields.item_count, Some(4));
        assert_eq!(fields.brand, None);
    }

    #[test]
    fn test_mistyped_leaf_values_degrade_to_unset() {
        let payload = r#"{"items": [{"brandName": 42, "category": ""}], "totals": {"totalAmount": "n/a"}}"#;
        let fields = extract_business_fields(payload).unwrap();
        assert_eq!(fields.brand, None);
        assert_eq!(fields.category, None);
        assert_eq!(fields.total_amount, None);
        assert_eq!(fields.item_count, Some(1));
    }

    #[test]
    fn test_structurally_broken_payloads_are_rejected() {
        for payload in [
            "not json",
            "[1, 2, 3]",
            r#""just a string""#,
            r#"{"items": "Piattos x2"}"#,
        ] {
            let res = extract_business_fields(payload);
            assert!(
                matches!(res, Err(DomainError::MalformedPayload { .. })),
                "{payload} should be malformed"
            );
        }
    }

    #[test]
    fn test_empty_object_is_valid_but_empty() {
        let fields = extract_business_fields("{}").unwrap();
        assert_eq!(fields, BusinessFields::default());
    }
}
