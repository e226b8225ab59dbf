//! Report aggregation over items and movements
//!
//! Pure functions: callers load the data, these functions only read it. Calendar
//! days are evaluated in a fixed UTC offset supplied by the caller. Sums are
//! checked, so an out-of-range total is reported as an error rather than a panic.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    DailyReport, DailySales, DashboardMetrics, Item, ItemDailyStats, LowStockEntry, Movement,
    MovementKind, MovementTotals, SaleLine, SalesPeriod, SalesSummary, TopSeller,
};
use crate::types::DateRange;

/// Default number of entries returned by the top-sellers report
pub const DEFAULT_TOP_SELLERS: usize = 5;

/// Length of the sales trend series
pub const WEEKLY_SERIES_DAYS: i64 = 7;

/// Aggregation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Date {0} is outside the supported calendar range")]
    DateOutOfRange(NaiveDate),

    #[error("Report total exceeds the supported range")]
    Overflow,
}

/// Checked `a + b` for report totals
pub fn add_amount(a: Decimal, b: Decimal) -> Result<Decimal, ReportError> {
    a.checked_add(b).ok_or(ReportError::Overflow)
}

/// Checked `a + b` for report quantities
pub fn add_quantity(a: i64, b: i64) -> Result<i64, ReportError> {
    a.checked_add(b).ok_or(ReportError::Overflow)
}

fn movement_value(movement: &Movement) -> Result<Decimal, ReportError> {
    movement.value().ok_or(ReportError::Overflow)
}

/// `date - days`, or an error at the edge of the calendar
pub fn days_before(date: NaiveDate, days: i64) -> Result<NaiveDate, ReportError> {
    date.checked_sub_signed(Duration::days(days))
        .ok_or(ReportError::DateOutOfRange(date))
}

/// First and last instant (millisecond precision) of a local calendar day
pub fn day_bounds(
    date: NaiveDate,
    offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ReportError> {
    let out_of_range = || ReportError::DateOutOfRange(date);
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc_midnight = local_midnight
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
        .ok_or_else(out_of_range)?;
    let start = Utc.from_utc_datetime(&utc_midnight);
    let end = start
        .checked_add_signed(Duration::days(1) - Duration::milliseconds(1))
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}

/// Inclusive instant bounds covering every day of a range
pub fn range_bounds(
    range: DateRange,
    offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ReportError> {
    let (start, _) = day_bounds(range.start, offset)?;
    let (_, end) = day_bounds(range.end, offset)?;
    Ok((start, end))
}

/// Calendar day of an instant in the given offset
pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// DD/MM/YYYY
pub fn format_day(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn in_ledger_order(movements: &[Movement]) -> Vec<&Movement> {
    let mut ordered: Vec<&Movement> = movements.iter().collect();
    ordered.sort_by_key(|m| m.sequence);
    ordered
}

/// Active items at or below their alert threshold, sorted by name then reference
pub fn low_stock(items: &[Item]) -> Vec<Item> {
    let mut low: Vec<Item> = items
        .iter()
        .filter(|item| !item.is_archived() && item.is_low_stock())
        .cloned()
        .collect();
    low.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.reference.cmp(&b.reference))
    });
    low
}

impl From<&Item> for LowStockEntry {
    fn from(item: &Item) -> Self {
        Self {
            item_id: item.id,
            reference: item.reference.clone(),
            name: item.name.clone(),
            current_quantity: item.current_quantity,
            alert_threshold: item.alert_threshold,
        }
    }
}

/// Movements of `date` grouped by item, with grand totals.
///
/// `stock_final` is the item's live quantity, not its quantity at the end of
/// `date`; `closing_balance` carries the latter.
pub fn daily_report(
    date: NaiveDate,
    offset: FixedOffset,
    movements: &[Movement],
    items: &[Item],
) -> Result<DailyReport, ReportError> {
    let (start, end) = day_bounds(date, offset)?;
    let live: HashMap<Uuid, i64> = items
        .iter()
        .map(|item| (item.id, item.current_quantity))
        .collect();

    let mut entries = MovementTotals::default();
    let mut exits = MovementTotals::default();
    let mut groups: Vec<ItemDailyStats> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for movement in in_ledger_order(movements)
        .into_iter()
        .filter(|m| m.created_at >= start && m.created_at <= end)
    {
        let value = movement_value(movement)?;
        match movement.kind {
            MovementKind::Entry => entries.add(movement.quantity, value)?,
            MovementKind::Exit => exits.add(movement.quantity, value)?,
        }

        let slot = *index.entry(movement.item_id).or_insert_with(|| {
            groups.push(ItemDailyStats {
                item_id: movement.item_id,
                reference: movement.item_reference.clone(),
                name: movement.item_name.clone(),
                entries: MovementTotals::default(),
                exits: MovementTotals::default(),
                stock_final: live.get(&movement.item_id).copied(),
                closing_balance: movement.resulting_balance,
            });
            groups.len() - 1
        });

        let stats = &mut groups[slot];
        match movement.kind {
            MovementKind::Entry => stats.entries.add(movement.quantity, value)?,
            MovementKind::Exit => stats.exits.add(movement.quantity, value)?,
        }
        stats.closing_balance = movement.resulting_balance;
    }

    Ok(DailyReport {
        date,
        label: format_day(date),
        entries,
        exits,
        items: groups,
    })
}

/// Sales value (EXIT unit_price × quantity) for each of the 7 days ending at
/// `end_date`, oldest first
pub fn weekly_series(
    end_date: NaiveDate,
    offset: FixedOffset,
    movements: &[Movement],
) -> Result<Vec<DailySales>, ReportError> {
    let mut totals: HashMap<NaiveDate, Decimal> = HashMap::new();
    for movement in movements.iter().filter(|m| m.kind == MovementKind::Exit) {
        let total = totals
            .entry(local_date(movement.created_at, offset))
            .or_insert(Decimal::ZERO);
        *total = add_amount(*total, movement_value(movement)?)?;
    }

    (0..WEEKLY_SERIES_DAYS)
        .rev()
        .map(|days_back| {
            let date = days_before(end_date, days_back)?;
            Ok(DailySales {
                date,
                total: totals.get(&date).copied().unwrap_or(Decimal::ZERO),
            })
        })
        .collect()
}

/// Items ranked by total EXIT quantity; ties keep first-encountered ledger order
pub fn top_sellers(movements: &[Movement], limit: usize) -> Result<Vec<TopSeller>, ReportError> {
    let mut ranking: Vec<TopSeller> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for movement in in_ledger_order(movements)
        .into_iter()
        .filter(|m| m.kind == MovementKind::Exit)
    {
        let slot = *index.entry(movement.item_id).or_insert_with(|| {
            ranking.push(TopSeller {
                item_id: movement.item_id,
                reference: movement.item_reference.clone(),
                name: movement.item_name.clone(),
                quantity: 0,
            });
            ranking.len() - 1
        });
        ranking[slot].quantity = add_quantity(ranking[slot].quantity, movement.quantity)?;
    }

    // sort_by is stable, so equal quantities stay in encounter order
    ranking.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    ranking.truncate(limit);
    Ok(ranking)
}

/// Resolve a sales period into an inclusive date range.
///
/// Custom periods take the given bounds; a missing bound falls back to `today`.
pub fn period_range(
    period: SalesPeriod,
    today: NaiveDate,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
) -> Result<DateRange, ReportError> {
    let range = match period {
        SalesPeriod::Day => DateRange {
            start: today,
            end: today,
        },
        SalesPeriod::Week => DateRange {
            start: days_before(today, i64::from(today.weekday().num_days_from_sunday()))?,
            end: today,
        },
        SalesPeriod::Month => DateRange {
            start: today.with_day(1).unwrap_or(today),
            end: today,
        },
        SalesPeriod::Custom => DateRange {
            start: custom_start.unwrap_or(today),
            end: custom_end.unwrap_or(today),
        },
    };
    Ok(range)
}

/// EXIT movements within `range`, newest first, with their totals
pub fn sales_summary(
    range: DateRange,
    offset: FixedOffset,
    movements: &[Movement],
) -> Result<SalesSummary, ReportError> {
    let (start, end) = range_bounds(range, offset)?;

    let mut sales: Vec<&Movement> = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Exit && m.created_at >= start && m.created_at <= end)
        .collect();
    sales.sort_by(|a, b| b.sequence.cmp(&a.sequence));

    let mut total_amount = Decimal::ZERO;
    let mut items_sold = 0i64;
    let mut lines: Vec<SaleLine> = Vec::with_capacity(sales.len());
    for m in sales {
        let total_price = movement_value(m)?;
        total_amount = add_amount(total_amount, total_price)?;
        items_sold = add_quantity(items_sold, m.quantity)?;
        lines.push(SaleLine {
            movement_id: m.id,
            item_id: m.item_id,
            reference: m.item_reference.clone(),
            name: m.item_name.clone(),
            quantity: m.quantity,
            unit_price: m.unit_price,
            total_price,
            sold_at: m.created_at,
        });
    }

    Ok(SalesSummary {
        start: range.start,
        end: range.end,
        total_amount,
        items_sold,
        sales: lines,
    })
}

/// Dashboard headline numbers for `today`
pub fn dashboard(
    items: &[Item],
    movements: &[Movement],
    today: NaiveDate,
    offset: FixedOffset,
) -> Result<DashboardMetrics, ReportError> {
    let active: Vec<&Item> = items.iter().filter(|item| !item.is_archived()).collect();
    let today_sales = sales_summary(
        DateRange {
            start: today,
            end: today,
        },
        offset,
        movements,
    )?;

    let total_quantity = active
        .iter()
        .try_fold(0i64, |sum, item| add_quantity(sum, item.current_quantity))?;

    Ok(DashboardMetrics {
        item_count: active.len() as u64,
        total_quantity,
        low_stock_count: active.iter().filter(|item| item.is_low_stock()).count() as u64,
        daily_sales_total: today_sales.total_amount,
        daily_items_sold: today_sales.items_sold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use proptest::prelude::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn item(id: Uuid, reference: &str, name: &str, quantity: i64, threshold: i64) -> Item {
        let now = at(2024, 5, 1, 8);
        Item {
            id,
            reference: reference.to_string(),
            name: name.to_string(),
            description: None,
            category_id: None,
            size: None,
            color: None,
            purchase_price: Decimal::from(1000),
            sale_price: Decimal::from(1500),
            current_quantity: quantity,
            alert_threshold: threshold,
            created_at: now,
            updated_at: now,
            archived_at: None,
        }
    }

    fn movement(
        sequence: i64,
        item_id: Uuid,
        reference: &str,
        kind: MovementKind,
        quantity: i64,
        price: i64,
        balance: i64,
        created_at: DateTime<Utc>,
    ) -> Movement {
        Movement {
            id: Uuid::new_v4(),
            sequence,
            item_id,
            item_reference: reference.to_string(),
            item_name: format!("Item {reference}"),
            kind,
            quantity,
            unit_price: Decimal::from(price),
            resulting_balance: balance,
            note: None,
            created_at,
        }
    }

    #[test]
    fn test_day_bounds_utc() {
        let (start, end) = day_bounds(date(2024, 5, 10), utc()).unwrap();
        assert_eq!(start, at(2024, 5, 10, 0));
        assert_eq!(end.hour(), 23);
        assert_eq!(end.minute(), 59);
        assert_eq!(end.timestamp_subsec_millis(), 999);
    }

    #[test]
    fn test_day_bounds_with_offset() {
        // UTC+1: local midnight is 23:00 UTC on the previous day
        let offset = FixedOffset::east_opt(3600).unwrap();
        let (start, _) = day_bounds(date(2024, 5, 10), offset).unwrap();
        assert_eq!(start, at(2024, 5, 9, 23));
    }

    #[test]
    fn test_low_stock_sorted_by_name() {
        let items = vec![
            item(Uuid::new_v4(), "B-1", "Tee", 2, 5),
            item(Uuid::new_v4(), "A-1", "Cap", 5, 5),
            item(Uuid::new_v4(), "C-1", "Hoodie", 9, 5),
        ];
        let low = low_stock(&items);
        let names: Vec<&str> = low.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Cap", "Tee"]);
    }

    #[test]
    fn test_low_stock_skips_archived() {
        let mut archived = item(Uuid::new_v4(), "A-1", "Cap", 0, 5);
        archived.archived_at = Some(at(2024, 5, 2, 8));
        assert!(low_stock(&[archived]).is_empty());
    }

    #[test]
    fn test_daily_report_totals() {
        let id = Uuid::new_v4();
        let movements = vec![
            movement(1, id, "SH-001", MovementKind::Entry, 10, 1000, 10, at(2024, 5, 10, 9)),
            movement(2, id, "SH-001", MovementKind::Exit, 4, 1500, 6, at(2024, 5, 10, 15)),
            movement(3, id, "SH-001", MovementKind::Exit, 1, 1500, 5, at(2024, 5, 11, 9)),
        ];
        let items = vec![item(id, "SH-001", "Sneakers", 5, 5)];

        let report = daily_report(date(2024, 5, 10), utc(), &movements, &items).unwrap();
        assert_eq!(report.label, "10/05/2024");
        assert_eq!(report.entries, MovementTotals { quantity: 10, total: Decimal::from(10000) });
        assert_eq!(report.exits, MovementTotals { quantity: 4, total: Decimal::from(6000) });
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].stock_final, Some(5));
        assert_eq!(report.items[0].closing_balance, 6);
    }

    #[test]
    fn test_daily_report_end_of_day_inclusive() {
        let id = Uuid::new_v4();
        let last_ms = at(2024, 5, 10, 23) + Duration::minutes(59) + Duration::milliseconds(59_999);
        let movements = vec![movement(1, id, "A", MovementKind::Entry, 1, 10, 1, last_ms)];
        let report = daily_report(date(2024, 5, 10), utc(), &movements, &[]).unwrap();
        assert_eq!(report.entries.quantity, 1);
        assert_eq!(report.items[0].stock_final, None);
    }

    #[test]
    fn test_daily_report_serializes_dashboard_keys() {
        let report = daily_report(date(2024, 5, 10), utc(), &[], &[]).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["date"], "10/05/2024");
        assert_eq!(json["entrees"]["nombre"], 0);
        assert!(json["articles"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_weekly_series_oldest_first() {
        let id = Uuid::new_v4();
        let movements = vec![
            movement(1, id, "A", MovementKind::Entry, 50, 100, 50, at(2024, 5, 4, 9)),
            movement(2, id, "A", MovementKind::Exit, 2, 150, 48, at(2024, 5, 4, 10)),
            movement(3, id, "A", MovementKind::Exit, 1, 150, 47, at(2024, 5, 10, 10)),
            movement(4, id, "A", MovementKind::Exit, 1, 150, 46, at(2024, 5, 3, 10)),
        ];
        let series = weekly_series(date(2024, 5, 10), utc(), &movements).unwrap();
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, date(2024, 5, 4));
        assert_eq!(series[0].total, Decimal::from(300));
        assert_eq!(series[6].date, date(2024, 5, 10));
        assert_eq!(series[6].total, Decimal::from(150));
        assert!(series[1..6].iter().all(|d| d.total == Decimal::ZERO));
    }

    #[test]
    fn test_top_sellers_ranking() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let day = at(2024, 5, 10, 9);
        let movements = vec![
            movement(1, a, "A", MovementKind::Exit, 5, 10, 0, day),
            movement(2, b, "B", MovementKind::Exit, 9, 10, 0, day),
            movement(3, a, "A", MovementKind::Exit, 3, 10, 0, day),
            movement(4, b, "B", MovementKind::Entry, 100, 10, 0, day),
        ];
        let top = top_sellers(&movements, DEFAULT_TOP_SELLERS).unwrap();
        let ranked: Vec<(&str, i64)> = top.iter().map(|t| (t.reference.as_str(), t.quantity)).collect();
        assert_eq!(ranked, vec![("B", 9), ("A", 8)]);
    }

    #[test]
    fn test_top_sellers_ties_keep_encounter_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let day = at(2024, 5, 10, 9);
        let movements = vec![
            movement(3, c, "C", MovementKind::Exit, 4, 10, 0, day),
            movement(1, b, "B", MovementKind::Exit, 4, 10, 0, day),
            movement(2, a, "A", MovementKind::Exit, 4, 10, 0, day),
        ];
        let top = top_sellers(&movements, 2).unwrap();
        let refs: Vec<&str> = top.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(refs, vec!["B", "A"]);
    }

    #[test]
    fn test_period_range_week_starts_sunday() {
        // 2024-05-15 is a Wednesday
        let range = period_range(SalesPeriod::Week, date(2024, 5, 15), None, None).unwrap();
        assert_eq!(range.start, date(2024, 5, 12));
        assert_eq!(range.end, date(2024, 5, 15));
    }

    #[test]
    fn test_period_range_month() {
        let range = period_range(SalesPeriod::Month, date(2024, 5, 15), None, None).unwrap();
        assert_eq!(range.start, date(2024, 5, 1));
    }

    #[test]
    fn test_sales_summary_newest_first() {
        let id = Uuid::new_v4();
        let movements = vec![
            movement(1, id, "A", MovementKind::Exit, 2, 150, 8, at(2024, 5, 10, 9)),
            movement(2, id, "A", MovementKind::Exit, 1, 150, 7, at(2024, 5, 10, 11)),
            movement(3, id, "A", MovementKind::Entry, 5, 100, 12, at(2024, 5, 10, 12)),
        ];
        let range = DateRange { start: date(2024, 5, 10), end: date(2024, 5, 10) };
        let summary = sales_summary(range, utc(), &movements).unwrap();
        assert_eq!(summary.sales.len(), 2);
        assert_eq!(summary.sales[0].quantity, 1);
        assert_eq!(summary.total_amount, Decimal::from(450));
        assert_eq!(summary.items_sold, 3);
    }

    #[test]
    fn test_dashboard_counts() {
        let a = Uuid::new_v4();
        let items = vec![item(a, "A", "Cap", 3, 5), item(Uuid::new_v4(), "B", "Tee", 10, 5)];
        let movements = vec![movement(1, a, "A", MovementKind::Exit, 2, 150, 3, at(2024, 5, 10, 9))];
        let metrics = dashboard(&items, &movements, date(2024, 5, 10), utc()).unwrap();
        assert_eq!(metrics.item_count, 2);
        assert_eq!(metrics.total_quantity, 13);
        assert_eq!(metrics.low_stock_count, 1);
        assert_eq!(metrics.daily_sales_total, Decimal::from(300));
        assert_eq!(metrics.daily_items_sold, 2);
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let id = Uuid::new_v4();
        let mut huge = movement(1, id, "A", MovementKind::Exit, i64::MAX, 0, 0, at(2024, 5, 10, 9));
        huge.unit_price = Decimal::MAX;
        let movements = vec![huge];

        assert_eq!(
            daily_report(date(2024, 5, 10), utc(), &movements, &[]),
            Err(ReportError::Overflow)
        );
        assert_eq!(
            weekly_series(date(2024, 5, 10), utc(), &movements),
            Err(ReportError::Overflow)
        );
        let range = DateRange { start: date(2024, 5, 10), end: date(2024, 5, 10) };
        assert_eq!(sales_summary(range, utc(), &movements), Err(ReportError::Overflow));
    }

    #[test]
    fn test_quantity_overflow_is_an_error() {
        let id = Uuid::new_v4();
        let day = at(2024, 5, 10, 9);
        let half = i64::MAX / 2 + 1;
        let movements = vec![
            movement(1, id, "A", MovementKind::Exit, half, 0, 0, day),
            movement(2, id, "A", MovementKind::Exit, half, 0, 0, day),
        ];
        assert_eq!(top_sellers(&movements, 5), Err(ReportError::Overflow));

        let mut totals = MovementTotals { quantity: half, total: Decimal::ONE };
        assert_eq!(totals.add(half, Decimal::ONE), Err(ReportError::Overflow));
        assert_eq!(totals, MovementTotals { quantity: half, total: Decimal::ONE });
    }

    #[test]
    fn test_dates_at_calendar_edges_are_errors() {
        assert_eq!(
            weekly_series(NaiveDate::MIN, utc(), &[]),
            Err(ReportError::DateOutOfRange(NaiveDate::MIN))
        );
        let west = FixedOffset::west_opt(3600).unwrap();
        assert_eq!(
            day_bounds(NaiveDate::MAX, west),
            Err(ReportError::DateOutOfRange(NaiveDate::MAX))
        );
        let east = FixedOffset::east_opt(3600).unwrap();
        assert!(day_bounds(NaiveDate::MIN, east).is_err());
        assert_eq!(
            days_before(NaiveDate::MIN, 1),
            Err(ReportError::DateOutOfRange(NaiveDate::MIN))
        );
    }

    const DAY_MS: i64 = 86_400_000;

    /// Milliseconds after the start of the day before the report day
    fn instant_strategy() -> impl Strategy<Value = i64> {
        prop_oneof![
            Just(DAY_MS - 1),
            Just(DAY_MS),
            Just(2 * DAY_MS - 1),
            Just(2 * DAY_MS),
            0i64..3 * DAY_MS,
        ]
    }

    fn report_movement_strategy() -> impl Strategy<Value = (usize, bool, i64, i64, i64)> {
        (0usize..3, any::<bool>(), 1i64..1_000, 0i64..1_000_000, instant_strategy())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Per-item and grand totals add up to exactly that day's movements
        #[test]
        fn prop_daily_report_is_additive(
            offset_minutes in prop::sample::select(vec![0i32, 120, -300, 330]),
            drafts in prop::collection::vec(report_movement_strategy(), 0..40),
        ) {
            let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap();
            let day = date(2024, 5, 10);
            let (previous_start, _) = day_bounds(date(2024, 5, 9), offset).unwrap();
            let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

            let movements: Vec<Movement> = drafts
                .iter()
                .enumerate()
                .map(|(n, &(slot, is_entry, quantity, cents, ms))| {
                    let kind = if is_entry { MovementKind::Entry } else { MovementKind::Exit };
                    let created_at = previous_start + Duration::milliseconds(ms);
                    let mut m = movement(n as i64 + 1, ids[slot], &format!("R-{slot}"), kind, quantity, 0, 0, created_at);
                    m.unit_price = Decimal::new(cents, 2);
                    m
                })
                .collect();

            let report = daily_report(day, offset, &movements, &[]).unwrap();
            let in_day: Vec<&Movement> = movements
                .iter()
                .filter(|m| local_date(m.created_at, offset) == day)
                .collect();

            let value_of = |kind: MovementKind| -> Decimal {
                in_day.iter().filter(|m| m.kind == kind).map(|m| m.value().unwrap()).sum()
            };
            let quantity_of = |kind: MovementKind| -> i64 {
                in_day.iter().filter(|m| m.kind == kind).map(|m| m.quantity).sum()
            };
            prop_assert_eq!(report.entries.total, value_of(MovementKind::Entry));
            prop_assert_eq!(report.exits.total, value_of(MovementKind::Exit));
            prop_assert_eq!(report.entries.quantity, quantity_of(MovementKind::Entry));
            prop_assert_eq!(report.exits.quantity, quantity_of(MovementKind::Exit));

            let mut seen: Vec<Uuid> = in_day.iter().map(|m| m.item_id).collect();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(report.items.len(), seen.len());

            for stats in &report.items {
                let own: Vec<&&Movement> = in_day.iter().filter(|m| m.item_id == stats.item_id).collect();
                let expected: Decimal = own.iter().map(|m| m.value().unwrap()).sum();
                let quantity: i64 = own.iter().map(|m| m.quantity).sum();
                prop_assert_eq!(stats.entries.total + stats.exits.total, expected);
                prop_assert_eq!(stats.entries.quantity + stats.exits.quantity, quantity);
            }

            let per_item: Decimal = report
                .items
                .iter()
                .map(|s| s.entries.total + s.exits.total)
                .sum();
            prop_assert_eq!(per_item, report.entries.total + report.exits.total);
        }
    }
}
