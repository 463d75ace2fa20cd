//! Sales repository - Appends sale lines and produces aggregate read views.
//!
//! Sale lines are immutable once written. The time-bucketed views select the
//! rows inside their window and bucket them in UTC; the per-product and
//! per-user views aggregate in SQL.

use crate::{
    entities::{Sale, product, sale, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Days, DurationRound, NaiveDate, NaiveTime, TimeDelta, Utc};
use sea_orm::{
    FromQueryResult, JoinType, QueryOrder, QuerySelect, Set,
    prelude::*,
    sea_query::{Func, SimpleExpr},
};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Units sold per product, as returned by [`top_selling`].
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ProductSales {
    /// Product name
    pub product_name: String,
    /// Units sold across all sale lines
    pub total_quantity: i64,
}

/// Revenue per user, as returned by [`sales_by_user`].
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct UserSales {
    /// Login name of the seller
    pub username: String,
    /// Sum of `quantity * unit_price` over their sale lines
    pub total_revenue: f64,
}

/// Appends one sale line stamped with the current time.
///
/// Stock is not checked here; the checkout workflow does that before calling.
///
/// # Errors
/// Returns a validation error for a quantity below 1 or an invalid price, and
/// a database error if the product or user does not exist.
#[instrument(skip(db))]
pub async fn record_sale<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
    user_id: i64,
    quantity: i32,
    unit_price: f64,
) -> Result<sale::Model> {
    if quantity < 1 {
        return Err(Error::validation(format!(
            "Sale quantity must be at least 1, got {quantity}"
        )));
    }
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(Error::validation(format!(
            "Sale unit price must be a non-negative number, got {unit_price}"
        )));
    }

    let sale = sale::ActiveModel {
        product_id: Set(product_id),
        user_id: Set(user_id),
        quantity: Set(quantity),
        unit_price: Set(unit_price),
        sale_date: Set(Utc::now()),
        ..Default::default()
    };
    let recorded = sale.insert(db).await?;
    debug!(sale_id = recorded.id, "Recorded sale");
    Ok(recorded)
}

/// Retrieves the sale lines of one product, oldest first.
pub async fn sales_for_product<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
) -> Result<Vec<sale::Model>> {
    Sale::find()
        .filter(sale::Column::ProductId.eq(product_id))
        .order_by_asc(sale::Column::SaleDate)
        .order_by_asc(sale::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Revenue per calendar day (UTC) from `today - days_back` through today.
pub async fn sales_by_day(
    db: &DatabaseConnection,
    days_back: u32,
) -> Result<BTreeMap<NaiveDate, f64>> {
    sales_by_day_as_of(db, days_back, Utc::now()).await
}

/// [`sales_by_day`] with an explicit clock.
pub async fn sales_by_day_as_of(
    db: &DatabaseConnection,
    days_back: u32,
    now: DateTime<Utc>,
) -> Result<BTreeMap<NaiveDate, f64>> {
    let first_day = now
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days_back)))
        .ok_or_else(|| Error::validation(format!("{days_back} days back is out of range")))?;
    let cutoff = first_day.and_time(NaiveTime::MIN).and_utc();

    let mut totals = BTreeMap::new();
    for sale in sales_between(db, cutoff, now).await? {
        *totals.entry(sale.sale_date.date_naive()).or_insert(0.0) += sale.revenue();
    }
    Ok(totals)
}

/// Revenue per hour since `now - cutoff`, keyed by the hour-truncated time.
pub async fn sales_by_hour_bucket(
    db: &DatabaseConnection,
    cutoff: TimeDelta,
) -> Result<BTreeMap<DateTime<Utc>, f64>> {
    sales_by_hour_bucket_as_of(db, cutoff, Utc::now()).await
}

/// [`sales_by_hour_bucket`] with an explicit clock.
pub async fn sales_by_hour_bucket_as_of(
    db: &DatabaseConnection,
    cutoff: TimeDelta,
    now: DateTime<Utc>,
) -> Result<BTreeMap<DateTime<Utc>, f64>> {
    bucketed_since(db, cutoff, now, TimeDelta::hours(1)).await
}

/// Revenue per minute over the last `minutes_back` minutes.
pub async fn sales_by_minute_bucket(
    db: &DatabaseConnection,
    minutes_back: u32,
) -> Result<BTreeMap<DateTime<Utc>, f64>> {
    sales_by_minute_bucket_as_of(db, minutes_back, Utc::now()).await
}

/// [`sales_by_minute_bucket`] with an explicit clock.
pub async fn sales_by_minute_bucket_as_of(
    db: &DatabaseConnection,
    minutes_back: u32,
    now: DateTime<Utc>,
) -> Result<BTreeMap<DateTime<Utc>, f64>> {
    let window = TimeDelta::minutes(i64::from(minutes_back));
    bucketed_since(db, window, now, TimeDelta::minutes(1)).await
}

/// Best sellers by units sold, highest first.
///
/// Products with equal totals are ordered by product id ascending.
#[instrument(skip(db))]
pub async fn top_selling(db: &DatabaseConnection, limit: u64) -> Result<Vec<ProductSales>> {
    let total_quantity = SimpleExpr::from(Func::sum(Expr::col((
        sale::Entity,
        sale::Column::Quantity,
    ))));

    Sale::find()
        .select_only()
        .column_as(product::Column::Name, "product_name")
        .column_as(total_quantity, "total_quantity")
        .join(JoinType::InnerJoin, sale::Relation::Product.def())
        .group_by(product::Column::Id)
        .group_by(product::Column::Name)
        .order_by_desc(Expr::cust("total_quantity"))
        .order_by_asc(product::Column::Id)
        .limit(limit)
        .into_model::<ProductSales>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Revenue per seller, ordered by username.
#[instrument(skip(db))]
pub async fn sales_by_user(db: &DatabaseConnection) -> Result<Vec<UserSales>> {
    let line_revenue = Expr::col((sale::Entity, sale::Column::Quantity))
        .mul(Expr::col((sale::Entity, sale::Column::UnitPrice)));
    let total_revenue = SimpleExpr::from(Func::sum(line_revenue));

    Sale::find()
        .select_only()
        .column_as(user::Column::Username, "username")
        .column_as(total_revenue, "total_revenue")
        .join(JoinType::InnerJoin, sale::Relation::User.def())
        .group_by(user::Column::Id)
        .group_by(user::Column::Username)
        .order_by_asc(user::Column::Username)
        .into_model::<UserSales>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Revenue over every sale line ever recorded.
pub async fn total_revenue(db: &DatabaseConnection) -> Result<f64> {
    let line_revenue = Expr::col((sale::Entity, sale::Column::Quantity))
        .mul(Expr::col((sale::Entity, sale::Column::UnitPrice)));

    let total = Sale::find()
        .select_only()
        .column_as(SimpleExpr::from(Func::sum(line_revenue)), "total_revenue")
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?;
    Ok(total.flatten().unwrap_or(0.0))
}

async fn sales_between(
    db: &DatabaseConnection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<sale::Model>> {
    Sale::find()
        .filter(sale::Column::SaleDate.between(from, to))
        .order_by_asc(sale::Column::SaleDate)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn bucketed_since(
    db: &DatabaseConnection,
    window: TimeDelta,
    now: DateTime<Utc>,
    bucket: TimeDelta,
) -> Result<BTreeMap<DateTime<Utc>, f64>> {
    if window < TimeDelta::zero() {
        return Err(Error::validation("Reporting window cannot be negative"));
    }
    let since = now
        .checked_sub_signed(window)
        .ok_or_else(|| Error::validation("Reporting window is out of range"))?;

    let mut totals = BTreeMap::new();
    for sale in sales_between(db, since, now).await? {
        let key = sale
            .sale_date
            .duration_trunc(bucket)
            .map_err(|e| Error::validation(format!("Cannot bucket {}: {e}", sale.sale_date)))?;
        *totals.entry(key).or_insert(0.0) += sale.revenue();
    }
    Ok(totals)
}
