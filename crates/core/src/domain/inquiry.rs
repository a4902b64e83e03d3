use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::ItemId;
use crate::errors::FieldError;
use crate::validation::{non_blank, validate_inquiry_create};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InquiryId(pub i64);

/// Public booking request as submitted by a prospective customer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryCreate {
    #[serde(default)]
    pub inquirer: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub item_id: ItemId,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comment: String,
}

/// A validated inquiry ready to be priced and stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInquiry {
    pub inquirer: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub item_id: ItemId,
    pub date_reservation: DateTime<Utc>,
    pub comment: Option<String>,
}

impl TryFrom<InquiryCreate> for NewInquiry {
    type Error = Vec<FieldError>;

    fn try_from(value: InquiryCreate) -> Result<Self, Self::Error> {
        let errors = validate_inquiry_create(&value);
        let Some(date_reservation) = value.date.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };

        Ok(Self {
            inquirer: value.inquirer.trim().to_string(),
            email: non_blank(&value.email),
            phone: non_blank(&value.phone),
            item_id: value.item_id,
            date_reservation,
            comment: non_blank(&value.comment),
        })
    }
}

/// Current state of the referenced item, joined at read time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveItem {
    pub id: ItemId,
    pub title: String,
    pub price: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: InquiryId,
    pub inquirer: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `None` once the item has been deleted.
    pub item: Option<LiveItem>,
    pub item_title: String,
    pub item_price: i64,
    pub date_reservation: DateTime<Utc>,
    pub date_created: DateTime<Utc>,
    pub comment: Option<String>,
}
