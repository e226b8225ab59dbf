//! Report models
//!
//! The daily report keeps the key names the dashboard has always consumed
//! (`entrees`, `sorties`, `nombre`, `articles`, `stockFinal`).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reports::{add_amount, add_quantity, ReportError};

/// Quantity and value totals for one movement direction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementTotals {
    #[serde(rename = "nombre")]
    pub quantity: i64,
    pub total: Decimal,
}

impl MovementTotals {
    /// Add one movement, refusing totals that would overflow
    pub fn add(&mut self, quantity: i64, value: Decimal) -> Result<(), ReportError> {
        let quantity = add_quantity(self.quantity, quantity)?;
        let total = add_amount(self.total, value)?;
        self.quantity = quantity;
        self.total = total;
        Ok(())
    }
}

/// Per-item breakdown of a daily report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDailyStats {
    pub item_id: Uuid,
    pub reference: String,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "entrees")]
    pub entries: MovementTotals,
    #[serde(rename = "sorties")]
    pub exits: MovementTotals,
    /// Live quantity of the item when the report is produced
    pub stock_final: Option<i64>,
    /// Balance after the item's last movement of the day
    pub closing_balance: i64,
}

/// Movements of one calendar day, grouped by item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    #[serde(rename = "isoDate")]
    pub date: NaiveDate,
    /// DD/MM/YYYY
    #[serde(rename = "date")]
    pub label: String,
    #[serde(rename = "entrees")]
    pub entries: MovementTotals,
    #[serde(rename = "sorties")]
    pub exits: MovementTotals,
    #[serde(rename = "articles")]
    pub items: Vec<ItemDailyStats>,
}

/// Flat row used for CSV export of a daily report
#[derive(Debug, Clone, Serialize)]
pub struct DailyReportRow {
    pub reference: String,
    pub name: String,
    pub entries_quantity: i64,
    pub entries_value: Decimal,
    pub exits_quantity: i64,
    pub exits_value: Decimal,
    pub stock_final: Option<i64>,
    pub closing_balance: i64,
}

impl From<&ItemDailyStats> for DailyReportRow {
    fn from(stats: &ItemDailyStats) -> Self {
        Self {
            reference: stats.reference.clone(),
            name: stats.name.clone(),
            entries_quantity: stats.entries.quantity,
            entries_value: stats.entries.total,
            exits_quantity: stats.exits.quantity,
            exits_value: stats.exits.total,
            stock_final: stats.stock_final,
            closing_balance: stats.closing_balance,
        }
    }
}

/// Sales value of one day in the weekly series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Cumulative sold quantity of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSeller {
    pub item_id: Uuid,
    pub reference: String,
    pub name: String,
    pub quantity: i64,
}

/// Low-stock row used for alerts and CSV export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockEntry {
    pub item_id: Uuid,
    pub reference: String,
    pub name: String,
    pub current_quantity: i64,
    pub alert_threshold: i64,
}

/// Period selector of the sales page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesPeriod {
    #[default]
    Day,
    /// From the last Sunday
    Week,
    /// From the first of the month
    Month,
    /// Explicit start and end dates
    Custom,
}

/// One sale (EXIT movement) in a sales summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub movement_id: Uuid,
    pub item_id: Uuid,
    pub reference: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub sold_at: DateTime<Utc>,
}

/// Sales over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_amount: Decimal,
    pub items_sold: i64,
    /// Newest first
    pub sales: Vec<SaleLine>,
}

/// Headline numbers of the dashboard page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub item_count: u64,
    pub total_quantity: i64,
    pub low_stock_count: u64,
    pub daily_sales_total: Decimal,
    pub daily_items_sold: i64,
}
