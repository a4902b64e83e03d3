use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatePriceId(pub i64);

/// A bookable item with its base price and any date-window price overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub show_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub show_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub date_prices: Vec<ItemDatePrice>,
}

/// Price override for an inclusive `[date_from, date_to]` window.
///
/// `id` is `None` for entries that have not been persisted yet. A client sending
/// `"id": 0` means the same thing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDatePrice {
    #[serde(default, deserialize_with = "non_zero_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<DatePriceId>,
    #[serde(default)]
    pub item_id: ItemId,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub price: i64,
}

fn non_zero_id<'de, D>(deserializer: D) -> Result<Option<DatePriceId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.filter(|id| *id != 0).map(DatePriceId))
}

/// Title and effective price of an item frozen at a point in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub title: String,
    pub price: i64,
}

/// Writes needed to turn an item's persisted date prices into a desired set.
///
/// Persisted rows whose id is not in `keep` are removed; an empty `keep` removes
/// every row of the item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatePricePlan {
    pub keep: Vec<DatePriceId>,
    pub updates: Vec<ItemDatePrice>,
    pub inserts: Vec<ItemDatePrice>,
}

impl DatePricePlan {
    pub fn from_desired(item_id: ItemId, desired: &[ItemDatePrice]) -> Self {
        let mut keep = BTreeSet::new();
        let mut updates = Vec::new();
        let mut inserts = Vec::new();

        for entry in desired {
            let entry = ItemDatePrice { item_id, ..entry.clone() };
            match entry.id {
                Some(id) => {
                    keep.insert(id);
                    updates.push(entry);
                }
                None => inserts.push(entry),
            }
        }

        Self { keep: keep.into_iter().collect(), updates, inserts }
    }

    pub fn removes_all(&self) -> bool {
        self.keep.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{DatePriceId, DatePricePlan, ItemDatePrice, ItemId};

    fn window(id: Option<i64>, days_from: i64, days_to: i64, price: i64) -> ItemDatePrice {
        let origin = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).single().expect("valid date");
        ItemDatePrice {
            id: id.map(DatePriceId),
            item_id: ItemId(0),
            date_from: origin + Duration::days(days_from),
            date_to: origin + Duration::days(days_to),
            price,
        }
    }

    #[test]
    fn plan_splits_existing_and_new_entries() {
        let plan = DatePricePlan::from_desired(
            ItemId(5),
            &[window(Some(10), 0, 3, 120), window(None, 4, 6, 90)],
        );

        assert_eq!(plan.keep, vec![DatePriceId(10)]);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.inserts.len(), 1);
        assert!(plan.updates.iter().chain(&plan.inserts).all(|entry| entry.item_id == ItemId(5)));
    }

    #[test]
    fn empty_desired_set_removes_everything() {
        let plan = DatePricePlan::from_desired(ItemId(5), &[]);

        assert!(plan.removes_all());
        assert!(plan.updates.is_empty() && plan.inserts.is_empty());
    }

    #[test]
    fn zero_id_from_json_is_treated_as_new() {
        let entry: ItemDatePrice = serde_json::from_str(
            r#"{"id":0,"dateFrom":"2026-06-01T00:00:00Z","dateTo":"2026-06-02T00:00:00Z","price":5}"#,
        )
        .expect("valid payload");

        assert_eq!(entry.id, None);
    }
}
