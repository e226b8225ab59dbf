//! Reporting service: read-only aggregation over items and the movement ledger

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use shared::reports::{self, day_bounds, days_before, local_date, range_bounds, WEEKLY_SERIES_DAYS};
use shared::{
    DailyReport, DailySales, DashboardMetrics, DateRange, Item, MovementFilter, MovementKind,
    SalesPeriod, SalesSummary, TopSeller,
};
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::ReportsConfig;
use crate::error::{AppError, AppResult};
use crate::store::InventoryStore;

/// Largest top-sellers list a client may ask for
pub const MAX_TOP_SELLERS: usize = 100;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    top_sellers_limit: usize,
}

impl ReportingService {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        clock: Arc<dyn Clock>,
        config: &ReportsConfig,
    ) -> Self {
        Self {
            store,
            clock,
            offset: config.offset(),
            top_sellers_limit: config.top_sellers_limit,
        }
    }

    /// Current local calendar day
    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.now(), self.offset)
    }

    /// Active items at or below their alert threshold, by name
    pub async fn low_stock_report(&self) -> AppResult<Vec<Item>> {
        let items = self.store.all_items().await?;
        Ok(reports::low_stock(&items))
    }

    /// Movements of one day grouped by item; defaults to today
    pub async fn daily_report(&self, date: Option<NaiveDate>) -> AppResult<DailyReport> {
        let date = date.unwrap_or_else(|| self.today());
        let (start, end) = day_bounds(date, self.offset)?;

        let movements = self
            .store
            .list_movements(&MovementFilter::between(start, end))
            .await?;
        let items = self.store.all_items().await?;

        tracing::debug!(%date, movements = movements.len(), "Building daily report");
        Ok(reports::daily_report(date, self.offset, &movements, &items)?)
    }

    /// Sales value for the 7 days ending at `end_date` (default today)
    pub async fn weekly_series(&self, end_date: Option<NaiveDate>) -> AppResult<Vec<DailySales>> {
        let end_date = end_date.unwrap_or_else(|| self.today());
        let out_of_range = |err| AppError::from_report("end_date", err);
        let range = DateRange {
            start: days_before(end_date, WEEKLY_SERIES_DAYS - 1).map_err(out_of_range)?,
            end: end_date,
        };
        let (start, end) = range_bounds(range, self.offset).map_err(out_of_range)?;

        let filter = MovementFilter {
            kind: Some(MovementKind::Exit),
            ..MovementFilter::between(start, end)
        };
        let movements = self.store.list_movements(&filter).await?;
        reports::weekly_series(end_date, self.offset, &movements).map_err(out_of_range)
    }

    /// Best-selling items across all time
    pub async fn top_sellers(&self, limit: Option<usize>) -> AppResult<Vec<TopSeller>> {
        let limit = limit.unwrap_or(self.top_sellers_limit);
        if limit > MAX_TOP_SELLERS {
            return Err(AppError::invalid(
                "limit",
                "Limit must be at most 100",
                "La limite doit être au plus 100",
            ));
        }

        let filter = MovementFilter {
            kind: Some(MovementKind::Exit),
            ..MovementFilter::default()
        };
        let movements = self.store.list_movements(&filter).await?;
        Ok(reports::top_sellers(&movements, limit)?)
    }

    /// Sales over a day, week (from Sunday), month or custom range
    pub async fn sales_summary(
        &self,
        period: SalesPeriod,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<SalesSummary> {
        if period == SalesPeriod::Custom && (start.is_none() || end.is_none()) {
            return Err(AppError::invalid(
                "start",
                "A custom period needs both start and end dates",
                "Une période personnalisée exige une date de début et de fin",
            ));
        }

        let range = reports::period_range(period, self.today(), start, end)
            .map_err(|err| AppError::from_report("start", err))?;
        if range.start > range.end {
            return Err(AppError::invalid(
                "end",
                "End date must not be before start date",
                "La date de fin ne peut pas précéder la date de début",
            ));
        }

        let (from, to) =
            range_bounds(range, self.offset).map_err(|err| AppError::from_report("start", err))?;
        let filter = MovementFilter {
            kind: Some(MovementKind::Exit),
            ..MovementFilter::between(from, to)
        };
        let movements = self.store.list_movements(&filter).await?;
        Ok(reports::sales_summary(range, self.offset, &movements)?)
    }

    /// Dashboard headline numbers for today
    pub async fn dashboard(&self) -> AppResult<DashboardMetrics> {
        let today = self.today();
        let (start, end) = day_bounds(today, self.offset)?;

        let items = self.store.all_items().await?;
        let filter = MovementFilter {
            kind: Some(MovementKind::Exit),
            ..MovementFilter::between(start, end)
        };
        let movements = self.store.list_movements(&filter).await?;
        Ok(reports::dashboard(&items, &movements, today, self.offset)?)
    }

    /// Export data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        for record in data {
            writer
                .serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
