use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::ItemId;
use crate::errors::FieldError;
use crate::validation::{non_blank, validate_accepted};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcceptedId(pub i64);

/// Body of `POST /accepted/process`: an inquiry the operator has confirmed,
/// with the item snapshot already resolved by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedCreate {
    #[serde(default)]
    pub inquirer: String,
    #[serde(default)]
    pub inquirer_email: String,
    #[serde(default)]
    pub inquirer_phone: String,
    #[serde(default)]
    pub inquirer_comment: String,
    #[serde(default)]
    pub item_id: ItemId,
    #[serde(default)]
    pub item_title: String,
    #[serde(default)]
    pub item_price: Option<i64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub date_reservation: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_inquiry_created: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccepted {
    pub inquirer: String,
    pub inquirer_email: Option<String>,
    pub inquirer_phone: Option<String>,
    pub inquirer_comment: Option<String>,
    pub item_id: Option<ItemId>,
    pub item_title: Option<String>,
    pub item_price: Option<i64>,
    pub notes: Option<String>,
    pub date_reservation: DateTime<Utc>,
    pub date_inquiry_created: Option<DateTime<Utc>>,
}

impl TryFrom<AcceptedCreate> for NewAccepted {
    type Error = Vec<FieldError>;

    fn try_from(value: AcceptedCreate) -> Result<Self, Self::Error> {
        let errors = validate_accepted(&value);
        let Some(date_reservation) = value.date_reservation.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };

        Ok(Self {
            inquirer: value.inquirer.trim().to_string(),
            inquirer_email: non_blank(&value.inquirer_email),
            inquirer_phone: non_blank(&value.inquirer_phone),
            inquirer_comment: non_blank(&value.inquirer_comment),
            item_id: (value.item_id.0 != 0).then_some(value.item_id),
            item_title: non_blank(&value.item_title),
            item_price: value.item_price,
            notes: non_blank(&value.notes),
            date_reservation,
            date_inquiry_created: value.date_inquiry_created,
        })
    }
}

/// A confirmed booking. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accepted {
    pub id: AcceptedId,
    pub inquirer: String,
    pub inquirer_email: Option<String>,
    pub inquirer_phone: Option<String>,
    pub inquirer_comment: Option<String>,
    pub item_id: Option<ItemId>,
    pub item_title: Option<String>,
    pub item_price: Option<i64>,
    pub notes: Option<String>,
    pub date_reservation: DateTime<Utc>,
    pub date_inquiry_created: Option<DateTime<Utc>>,
    pub date_accepted: DateTime<Utc>,
}
