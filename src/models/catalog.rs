use serde::{Deserialize, Deserializer};

/// Remote ids arrive either as JSON strings or integers; normalize to String
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// Search hit from `GET /companies/list?name=`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
}

/// `GET /companies/get/{id}`: the searched entity plus the pricing groups
/// its members belong to
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupDetail {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub groups: Vec<MemberGroup>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberGroup {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
}

/// `GET /phones/list` envelope
///
/// `page`/`totalPages` are only present when the catalog paginates.
#[derive(Debug, Clone, Deserialize)]
pub struct PhoneListResponse {
    #[serde(default)]
    pub phones: Vec<PhoneRecord>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default, rename = "totalPages")]
    pub total_pages: Option<u32>,
}

/// A phone as returned by both the list and the detail endpoints.
/// The detail response fills in `plans` for each model.
#[derive(Debug, Clone, Deserialize)]
pub struct PhoneRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub brand: String,
    pub name: String,
    #[serde(default)]
    pub models: Vec<PhoneModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhoneModel {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Capacity in GB
    #[serde(default)]
    pub storage: Option<u32>,
    #[serde(default)]
    pub plans: Vec<PlanRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    /// Data allowance; the catalog sends numbers or strings like "Unlimited"
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Plan-only monthly price
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub term: Option<u32>,
    #[serde(default)]
    pub upfront: Option<UpfrontPricing>,
    #[serde(default)]
    pub financing: Option<FinancingPricing>,
}

/// Bring-it-back pricing block
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpfrontPricing {
    #[serde(default)]
    pub price_after_discount: Option<f64>,
    #[serde(default)]
    pub buyout_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingPricing {
    #[serde(default)]
    pub price_after_discount: Option<f64>,
}

/// `GET /addons/list` row
#[derive(Debug, Clone, Deserialize)]
pub struct AddOnRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, rename = "isFree")]
    pub is_free: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_and_string_ids() {
        let hits: Vec<GroupSummary> =
            serde_json::from_value(json!([{"id": 17, "name": "Acme"}, {"id": "x9", "name": "Beta"}]))
                .unwrap();
        assert_eq!(hits[0].id, "17");
        assert_eq!(hits[1].id, "x9");
    }

    #[test]
    fn test_phone_detail_parses_nested_plans() {
        let phone: PhoneRecord = serde_json::from_value(json!({
            "id": 5,
            "slug": "apple-iphone-15",
            "brand": "Apple",
            "name": "iPhone 15",
            "models": [{
                "id": 51,
                "storage": 128,
                "plans": [{
                    "id": "p1",
                    "title": "Ultimate 100",
                    "data": 100,
                    "price": 45.0,
                    "upfront": {"priceAfterDiscount": 52.0, "buyoutPrice": 300.0},
                    "financing": {"priceAfterDiscount": 65.0}
                }]
            }]
        }))
        .unwrap();

        let plan = &phone.models[0].plans[0];
        assert_eq!(phone.models[0].storage, Some(128));
        assert_eq!(plan.upfront.as_ref().unwrap().buyout_price, Some(300.0));
        assert_eq!(plan.financing.as_ref().unwrap().price_after_discount, Some(65.0));
        assert!(plan.term.is_none());
    }

    #[test]
    fn test_phone_list_without_pagination() {
        let list: PhoneListResponse =
            serde_json::from_value(json!({"phones": [{"id": 1, "slug": "a", "name": "A"}]})).unwrap();
        assert_eq!(list.phones.len(), 1);
        assert!(list.page.is_none() && list.total_pages.is_none());
        assert!(list.phones[0].models.is_empty());
    }
}
