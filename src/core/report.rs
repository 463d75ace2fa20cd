//! Dashboard figures built from the catalog and sales views.
//!
//! Everything here is read-only. The dashboard is a peripheral view, so
//! [`DashboardSummary::load_or_default`] shows zeros instead of failing when
//! the store is unavailable.

use crate::{
    config::settings::DashboardConfig,
    core::{
        product,
        sale::{self, ProductSales},
    },
    entities::ProductModel,
    errors::{Error, Result},
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    /// Products in the catalog
    pub product_count: usize,
    /// `price * quantity` summed over the catalog
    pub stock_value: f64,
    /// Revenue over all recorded sales
    pub total_revenue: f64,
    /// Revenue of the current UTC day
    pub sales_today: f64,
    /// Mean revenue of the days in the window that had sales
    pub daily_average: f64,
    /// Best sellers by units, at most `top_selling_limit`
    pub top_sellers: Vec<ProductSales>,
}

impl DashboardSummary {
    /// Computes the summary at the current time.
    pub async fn load(db: &DatabaseConnection, config: &DashboardConfig) -> Result<Self> {
        Self::load_as_of(db, config, Utc::now()).await
    }

    /// Computes the summary with an explicit clock.
    #[instrument(skip(db))]
    pub async fn load_as_of(
        db: &DatabaseConnection,
        config: &DashboardConfig,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let products = product::list_products(db).await?;
        let stock_value = products.iter().map(ProductModel::stock_value).sum();

        let daily = sale::sales_by_day_as_of(db, config.days_back, now).await?;
        let sales_today = daily.get(&now.date_naive()).copied().unwrap_or(0.0);

        Ok(Self {
            product_count: products.len(),
            stock_value,
            total_revenue: sale::total_revenue(db).await?,
            sales_today,
            daily_average: average_of_active_days(&daily)?,
            top_sellers: sale::top_selling(db, config.top_selling_limit).await?,
        })
    }

    /// Like [`DashboardSummary::load`], but logs a store failure and returns
    /// an all-zero summary.
    pub async fn load_or_default(db: &DatabaseConnection, config: &DashboardConfig) -> Self {
        match Self::load(db, config).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Dashboard refresh failed, showing zeros: {}", e);
                Self::default()
            }
        }
    }
}

fn average_of_active_days(daily: &BTreeMap<NaiveDate, f64>) -> Result<f64> {
    if daily.is_empty() {
        return Ok(0.0);
    }
    let days = f64::from(u32::try_from(daily.len())?);
    Ok(daily.values().sum::<f64>() / days)
}

/// One point per day from `today - days_back` through `today`, zero where
/// `daily` has no entry.
///
/// # Errors
/// Returns a validation error if the window reaches before the calendar
/// range chrono supports.
pub fn fill_daily_series(
    daily: &BTreeMap<NaiveDate, f64>,
    days_back: u32,
    today: NaiveDate,
) -> Result<Vec<(NaiveDate, f64)>> {
    let first = today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .ok_or_else(|| Error::validation(format!("{days_back} days back is out of range")))?;

    Ok(first
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| (day, daily.get(&day).copied().unwrap_or(0.0)))
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::Role;
    use crate::test_utils::*;
    use chrono::TimeZone;
    use sea_orm::ConnectionTrait;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_summary_of_empty_store() -> Result<()> {
        let db = setup_test_db().await?;
        let summary = DashboardSummary::load(&db, &DashboardConfig::default()).await?;
        assert_eq!(summary, DashboardSummary::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_figures() -> Result<()> {
        let db = setup_test_db().await?;
        let seller = create_test_user(&db, "seller", Role::Employee).await?;
        let pen = create_test_product(&db, "Pen", 2.0, 10).await?;
        let ink = create_test_product(&db, "Ink", 5.0, 4).await?;
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap();

        insert_sale_at(&db, pen.id, seller.id, 3, 2.0, now).await?;
        insert_sale_at(&db, ink.id, seller.id, 1, 5.0, now - Days::new(2)).await?;
        insert_sale_at(&db, ink.id, seller.id, 1, 7.0, now - Days::new(2)).await?;
        // Outside the 7-day window, still part of total revenue
        insert_sale_at(&db, pen.id, seller.id, 10, 1.0, now - Days::new(30)).await?;

        let config = DashboardConfig {
            days_back: 7,
            top_selling_limit: 1,
        };
        let summary = DashboardSummary::load_as_of(&db, &config, now).await?;

        assert_eq!(summary.product_count, 2);
        assert_eq!(summary.stock_value, 40.0);
        assert_eq!(summary.total_revenue, 28.0);
        assert_eq!(summary.sales_today, 6.0);
        // Two active days: 6.0 and 12.0
        assert_eq!(summary.daily_average, 9.0);
        assert_eq!(summary.top_sellers.len(), 1);
        assert_eq!(summary.top_sellers[0].product_name, "Pen");
        assert_eq!(summary.top_sellers[0].total_quantity, 13);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_or_default_degrades_to_zeros() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "Pen", 2.0, 10).await?;
        db.execute_unprepared("DROP TABLE sales").await?;

        let summary = DashboardSummary::load_or_default(&db, &DashboardConfig::default()).await;
        assert_eq!(summary, DashboardSummary::default());
        Ok(())
    }

    #[test]
    fn test_fill_daily_series() {
        let daily = BTreeMap::from([(date(2024, 6, 8), 12.5), (date(2024, 6, 10), 3.0)]);

        let series = fill_daily_series(&daily, 3, date(2024, 6, 10)).unwrap();

        assert_eq!(
            series,
            vec![
                (date(2024, 6, 7), 0.0),
                (date(2024, 6, 8), 12.5),
                (date(2024, 6, 9), 0.0),
                (date(2024, 6, 10), 3.0),
            ]
        );
    }

    #[test]
    fn test_fill_daily_series_single_day() {
        let series = fill_daily_series(&BTreeMap::new(), 0, date(2024, 1, 1)).unwrap();
        assert_eq!(series, vec![(date(2024, 1, 1), 0.0)]);
    }
}
