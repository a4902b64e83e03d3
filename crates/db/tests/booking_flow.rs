use chrono::{DateTime, Duration, Utc};

use reservations_core::domain::accepted::NewAccepted;
use reservations_core::domain::inquiry::NewInquiry;
use reservations_core::domain::item::{DatePriceId, Item, ItemDatePrice, ItemId};
use reservations_db::repositories::{
    AcceptedRepository, InquiryRepository, ItemRepository, RepositoryError,
    SqlAcceptedRepository, SqlInquiryRepository, SqlItemRepository,
};
use reservations_db::{connect_with_settings, migrations, DbPool};

type FlowTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

async fn setup() -> FlowTestResult<DbPool> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    Ok(pool)
}

fn window(
    id: Option<i64>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    price: i64,
) -> ItemDatePrice {
    ItemDatePrice { id: id.map(DatePriceId), item_id: ItemId(0), date_from: from, date_to: to, price }
}

fn apartment(price: i64, date_prices: Vec<ItemDatePrice>) -> Item {
    Item {
        id: ItemId(0),
        title: "Seaside apartment".to_string(),
        show_from: None,
        show_to: None,
        price,
        date_prices,
    }
}

fn stored_ids(item: &Item) -> Vec<i64> {
    item.date_prices.iter().filter_map(|entry| entry.id).map(|id| id.0).collect()
}

#[tokio::test]
async fn inquiry_keeps_price_quoted_before_a_seasonal_override() -> FlowTestResult {
    let pool = setup().await?;
    let items = SqlItemRepository::new(pool.clone());
    let inquiries = SqlInquiryRepository::new(pool.clone());
    let now = Utc::now();

    let item_id =
        items.create(apartment(100, Vec::new())).await.map_err(|error| error.to_string())?;
    inquiries
        .create(NewInquiry {
            inquirer: "Tomaž Vidmar".to_string(),
            email: Some("tomaz@example.com".to_string()),
            phone: None,
            item_id,
            date_reservation: now + Duration::days(30),
            comment: None,
        })
        .await
        .map_err(|error| error.to_string())?;

    let mut item = items
        .find_by_id(item_id)
        .await
        .map_err(|error| error.to_string())?
        .ok_or_else(|| "item should exist".to_string())?;
    item.date_prices = vec![window(None, now - Duration::days(1), now + Duration::days(10), 150)];
    items.update(item).await.map_err(|error| error.to_string())?;

    let quoted = items.resolve_price(item_id, now).await.map_err(|error| error.to_string())?;
    require_eq!(quoted.price, 150);

    let listed = inquiries.list().await.map_err(|error| error.to_string())?;
    require_eq!(listed.len(), 1);
    require_eq!(listed[0].item_price, 100);
    require_eq!(listed[0].item.as_ref().map(|live| live.price), Some(100));
    Ok(())
}

#[tokio::test]
async fn update_reconciles_date_prices_to_the_submitted_set() -> FlowTestResult {
    let pool = setup().await?;
    let items = SqlItemRepository::new(pool);
    let start = Utc::now();

    let item_id = items
        .create(apartment(
            80,
            vec![
                window(None, start, start + Duration::days(5), 90),
                window(None, start + Duration::days(6), start + Duration::days(9), 95),
                window(None, start + Duration::days(10), start + Duration::days(12), 99),
            ],
        ))
        .await
        .map_err(|error| error.to_string())?;
    let mut item = items
        .find_by_id(item_id)
        .await
        .map_err(|error| error.to_string())?
        .ok_or_else(|| "item should exist".to_string())?;
    let original = stored_ids(&item);
    require_eq!(original.len(), 3);

    let kept = item.date_prices[0].clone();
    item.date_prices = vec![
        ItemDatePrice { price: 120, ..kept },
        window(None, start + Duration::days(20), start + Duration::days(25), 130),
    ];
    items.update(item).await.map_err(|error| error.to_string())?;

    let reloaded = items
        .find_by_id(item_id)
        .await
        .map_err(|error| error.to_string())?
        .ok_or_else(|| "item should exist".to_string())?;
    let ids = stored_ids(&reloaded);
    require_eq!(ids.len(), 2);
    require!(ids.contains(&original[0]), "kept window {} should survive", original[0]);
    require!(!ids.contains(&original[1]) && !ids.contains(&original[2]));
    let prices: Vec<i64> = reloaded.date_prices.iter().map(|entry| entry.price).collect();
    require!(prices.contains(&120) && prices.contains(&130), "unexpected prices {prices:?}");
    Ok(())
}

#[tokio::test]
async fn update_with_foreign_date_price_id_rolls_back() -> FlowTestResult {
    let pool = setup().await?;
    let items = SqlItemRepository::new(pool);
    let start = Utc::now();

    let first = items
        .create(apartment(80, vec![window(None, start, start + Duration::days(3), 90)]))
        .await
        .map_err(|error| error.to_string())?;
    let second = items
        .create(apartment(60, vec![window(None, start, start + Duration::days(3), 70)]))
        .await
        .map_err(|error| error.to_string())?;
    let foreign = items
        .find_by_id(second)
        .await
        .map_err(|error| error.to_string())?
        .ok_or_else(|| "second item should exist".to_string())?
        .date_prices[0]
        .clone();

    let mut item = items
        .find_by_id(first)
        .await
        .map_err(|error| error.to_string())?
        .ok_or_else(|| "first item should exist".to_string())?;
    item.title = "Renamed apartment".to_string();
    item.date_prices = vec![ItemDatePrice { price: 1, ..foreign }];

    let result = items.update(item).await;
    require!(matches!(result, Err(RepositoryError::NotFound(_))), "got {result:?}");

    let untouched = items
        .find_by_id(first)
        .await
        .map_err(|error| error.to_string())?
        .ok_or_else(|| "first item should exist".to_string())?;
    require_eq!(untouched.title, "Seaside apartment".to_string());
    require_eq!(untouched.date_prices.len(), 1);
    require_eq!(untouched.date_prices[0].price, 90);
    Ok(())
}

#[tokio::test]
async fn accepting_then_retiring_an_inquiry_leaves_one_accepted_record() -> FlowTestResult {
    let pool = setup().await?;
    let items = SqlItemRepository::new(pool.clone());
    let inquiries = SqlInquiryRepository::new(pool.clone());
    let accepted = SqlAcceptedRepository::new(pool);
    let now = Utc::now();

    let item_id =
        items.create(apartment(100, Vec::new())).await.map_err(|error| error.to_string())?;
    let inquiry_id = inquiries
        .create(NewInquiry {
            inquirer: "Ana Golob".to_string(),
            email: None,
            phone: Some("+38641222333".to_string()),
            item_id,
            date_reservation: now + Duration::days(7),
            comment: Some("Late arrival".to_string()),
        })
        .await
        .map_err(|error| error.to_string())?;
    let inquiry = inquiries
        .list()
        .await
        .map_err(|error| error.to_string())?
        .into_iter()
        .find(|entry| entry.id == inquiry_id)
        .ok_or_else(|| "inquiry should be listed".to_string())?;

    accepted
        .process(NewAccepted {
            inquirer: inquiry.inquirer.clone(),
            inquirer_email: inquiry.email.clone(),
            inquirer_phone: inquiry.phone.clone(),
            inquirer_comment: inquiry.comment.clone(),
            item_id: Some(item_id),
            item_title: Some(inquiry.item_title.clone()),
            item_price: Some(inquiry.item_price),
            notes: None,
            date_reservation: inquiry.date_reservation,
            date_inquiry_created: Some(inquiry.date_created),
        })
        .await
        .map_err(|error| error.to_string())?;
    inquiries.delete(inquiry_id).await.map_err(|error| error.to_string())?;

    require!(inquiries.list().await.map_err(|error| error.to_string())?.is_empty());
    let records = accepted.list().await.map_err(|error| error.to_string())?;
    require_eq!(records.len(), 1);
    require_eq!(records[0].item_price, Some(100));
    require_eq!(records[0].date_inquiry_created, Some(inquiry.date_created));
    Ok(())
}
