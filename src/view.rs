//! Sorting, filtering and pagination of the derived dataset.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::models::DerivedRecord;

/// Rows revealed initially and added by each "show more".
pub const PAGE_SIZE: usize = 20;

/// Field a table can be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Symbol,
    BuyChangePercent,
    Buy,
    Sell,
    High,
    Low,
    VolValue,
    Vol,
    Last,
    ChangeRate,
}

/// Columns shown in the table, in display order.
pub const COLUMNS: [SortKey; 8] = [
    SortKey::Symbol,
    SortKey::BuyChangePercent,
    SortKey::Buy,
    SortKey::Sell,
    SortKey::High,
    SortKey::Low,
    SortKey::VolValue,
    SortKey::Vol,
];

impl SortKey {
    /// Column header.
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Symbol => "SYMBOL",
            SortKey::BuyChangePercent => "LAST UPDATE CHANGE",
            SortKey::Buy => "BUY",
            SortKey::Sell => "SELL",
            SortKey::High => "HIGH",
            SortKey::Low => "LOW",
            SortKey::VolValue => "VOLUME 24h",
            SortKey::Vol => "VOLUME",
            SortKey::Last => "LAST",
            SortKey::ChangeRate => "CHANGE 24h",
        }
    }

    /// Numeric value of this field, `None` for the symbol or a null field.
    pub fn number(&self, record: &DerivedRecord) -> Option<Decimal> {
        let t = &record.ticker;
        match self {
            SortKey::Symbol => None,
            SortKey::BuyChangePercent => record.buy_change_percent,
            SortKey::Buy => t.buy,
            SortKey::Sell => t.sell,
            SortKey::High => t.high,
            SortKey::Low => t.low,
            SortKey::VolValue => t.vol_value,
            SortKey::Vol => t.vol,
            SortKey::Last => t.last,
            SortKey::ChangeRate => t.change_rate,
        }
    }

    /// Ascending comparison of two records on this field.
    ///
    /// A null on either side compares equal.
    pub fn compare(&self, a: &DerivedRecord, b: &DerivedRecord) -> Ordering {
        match self {
            SortKey::Symbol => compare_text(a.symbol(), b.symbol()),
            _ => match (self.number(a), self.number(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            },
        }
    }
}

/// ASCII case-insensitive ordering: lowercased bytes first, then the exact
/// bytes as a tiebreak. No locale collation, so uppercase wins a case tie
/// and punctuation sorts by its byte value.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_ascii_lowercase()
        .cmp(&b.to_ascii_lowercase())
        .then_with(|| a.cmp(b))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(&mut self) {
        *self = match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        };
    }

    /// Arrow shown next to the active column header.
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// What happens to revealed rows when a fetch replaces the dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowResetPolicy {
    /// Go back to one page.
    #[default]
    OnFetch,
    /// Keep the revealed rows, trimmed to the new dataset.
    Keep,
}

/// Returns the first `visible` records of `dataset` sorted by `key`.
///
/// The sort is stable, so records that compare equal keep their feed order.
pub fn present(
    dataset: &[DerivedRecord],
    key: SortKey,
    direction: SortDirection,
    visible: usize,
) -> Vec<&DerivedRecord> {
    let refs: Vec<&DerivedRecord> = dataset.iter().collect();
    let mut sorted = merge_sort(&refs, &|a: &DerivedRecord, b: &DerivedRecord| {
        let ord = key.compare(a, b);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted.truncate(visible);
    sorted
}

// Nulls compare equal to everything, which is not a total order, so this
// avoids `slice::sort_by` and its total-order requirement.
fn merge_sort<'a, T, F>(items: &[&'a T], cmp: &F) -> Vec<&'a T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items.to_vec();
    }

    let (left, right) = items.split_at(items.len() / 2);
    let left = merge_sort(left, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(items.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if cmp(right[j], left[i]) == Ordering::Less {
            merged.push(right[j]);
            j += 1;
        } else {
            merged.push(left[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}

/// Table presentation state: sort, volume floor and revealed rows.
#[derive(Clone, Debug)]
pub struct ViewState {
    pub sort_key: SortKey,
    pub direction: SortDirection,
    /// Minimum 24h quote volume; `None` shows every pair.
    pub min_volume: Option<Decimal>,
    pub reset_policy: RowResetPolicy,
    visible_rows: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(RowResetPolicy::default())
    }
}

impl ViewState {
    /// Sorted by bid change ascending so the sharpest drops come first.
    pub fn new(reset_policy: RowResetPolicy) -> Self {
        Self {
            sort_key: SortKey::BuyChangePercent,
            direction: SortDirection::Ascending,
            min_volume: None,
            reset_policy,
            visible_rows: PAGE_SIZE,
        }
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Sorts by `key`; choosing the active key again flips the direction.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction.toggle();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Ascending;
        }
    }

    /// Whether rows beyond the revealed ones exist.
    pub fn has_more(&self, total: usize) -> bool {
        self.visible_rows < total
    }

    /// Reveals another page if there is anything left to reveal.
    pub fn show_more(&mut self, total: usize) {
        if self.has_more(total) {
            self.visible_rows += PAGE_SIZE;
        }
    }

    /// Applies the reset policy after a fetch replaced the dataset.
    pub fn on_dataset_replaced(&mut self, total: usize) {
        self.visible_rows = match self.reset_policy {
            RowResetPolicy::OnFetch => PAGE_SIZE,
            RowResetPolicy::Keep => self
                .visible_rows
                .min(total.div_ceil(PAGE_SIZE) * PAGE_SIZE)
                .max(PAGE_SIZE),
        };
    }

    /// The rows to display for `dataset`.
    pub fn present<'a>(&self, dataset: &'a [DerivedRecord]) -> Vec<&'a DerivedRecord> {
        present(dataset, self.sort_key, self.direction, self.visible_rows)
    }

    /// The record ranked first under the current sort.
    pub fn top<'a>(&self, dataset: &'a [DerivedRecord]) -> Option<&'a DerivedRecord> {
        present(dataset, self.sort_key, self.direction, 1).into_iter().next()
    }
}
