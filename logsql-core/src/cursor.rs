//! Scrollable, read-only cursor over a materialized result.
//!
//! The cursor owns one immutable `TableData` snapshot plus the column types
//! inferred for it. Its position ranges over [-1, N]: -1 is before-first, N
//! is after-last, and 0..N-1 is on a row. Navigation never fails for moving
//! off the valid range: it parks the cursor on the boundary and reports
//! "not positioned". Cell reads coerce per cell; a failed coercion is scoped
//! to that read and leaves the cursor fully usable.

use crate::error::CursorError;
use crate::infer::infer_column_types;
use crate::value::{Cell, ColumnType, TableData};
use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type CloseNotifier = Box<dyn FnOnce() + Send>;

// ============================================================================
// COLUMN LOOKUP
// ============================================================================

/// Column selector for cell accessors: a 1-based index (`usize`) or an
/// exact, case-sensitive column name (`&str`).
pub trait ColumnIndex {
    fn resolve(&self, cursor: &Cursor) -> Result<usize, CursorError>;
}

impl ColumnIndex for usize {
    fn resolve(&self, cursor: &Cursor) -> Result<usize, CursorError> {
        let count = cursor.column_count();
        if *self == 0 || *self > count {
            return Err(CursorError::ColumnIndexOutOfRange {
                index: *self,
                count,
            });
        }
        Ok(*self - 1)
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, cursor: &Cursor) -> Result<usize, CursorError> {
        cursor
            .table
            .column_position(self)
            .ok_or_else(|| CursorError::ColumnNotFound {
                name: (*self).to_string(),
            })
    }
}

// ============================================================================
// CURSOR
// ============================================================================

/// Read-only scrollable view over one buffered result.
///
/// Not shareable across threads of control: repositioning and reads take
/// `&mut self`, and the owning statement retires it when a new query runs.
pub struct Cursor {
    table: TableData,
    types: Vec<ColumnType>,
    position: isize,
    was_null: bool,
    closed: bool,
    retired: Option<Arc<AtomicBool>>,
    on_close: Option<CloseNotifier>,
}

impl Cursor {
    /// Wrap a materialized result, inferring column types from it.
    pub fn new(table: TableData) -> Self {
        let types = infer_column_types(&table);
        Self {
            table,
            types,
            position: -1,
            was_null: false,
            closed: false,
            retired: None,
            on_close: None,
        }
    }

    /// Attach a shared retire flag. When the owning statement sets the flag,
    /// every subsequent operation on this cursor fails with `Closed`.
    pub fn with_retire_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.retired = Some(flag);
        self
    }

    /// Attach a notifier invoked exactly once, on the first explicit close.
    pub fn with_close_notifier(mut self, notify: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(notify));
        self
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn columns(&self) -> &[String] {
        self.table.columns()
    }

    pub fn column_count(&self) -> usize {
        self.table.column_count()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Inferred type per column, aligned to `columns()`.
    pub fn column_types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Whether the last cell read through any accessor was SQL NULL.
    pub fn was_null(&self) -> bool {
        self.was_null
    }

    pub fn is_closed(&self) -> bool {
        self.closed
            || self
                .retired
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Close the cursor. Idempotent; the first close fires the owner
    /// notifier exactly once. A cursor retired by its statement is already
    /// considered closed and closing it again notifies nobody.
    pub fn close(&mut self) {
        let notifier = self.on_close.take();
        if !self.is_closed() {
            if let Some(notify) = notifier {
                notify();
            }
        }
        self.closed = true;
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// 1-based number of the current row, or 0 when not on a row.
    pub fn row_number(&self) -> usize {
        if self.on_row() {
            (self.position + 1) as usize
        } else {
            0
        }
    }

    pub fn is_before_first(&self) -> bool {
        self.position < 0 && self.row_count() > 0
    }

    pub fn is_after_last(&self) -> bool {
        self.row_count() > 0 && self.position >= self.row_count() as isize
    }

    pub fn is_first(&self) -> bool {
        self.position == 0 && self.row_count() > 0
    }

    pub fn is_last(&self) -> bool {
        self.row_count() > 0 && self.position == self.row_count() as isize - 1
    }

    /// Advance one row. `Ok(false)` means the cursor moved past the last row
    /// and now sits after-last.
    pub fn next(&mut self) -> Result<bool, CursorError> {
        self.ensure_open()?;
        let n = self.row_count() as isize;
        if self.position + 1 < n {
            self.position += 1;
            self.was_null = false;
            Ok(true)
        } else {
            self.position = n;
            self.was_null = false;
            Ok(false)
        }
    }

    /// Move back one row; `Ok(false)` leaves the cursor before-first.
    pub fn previous(&mut self) -> Result<bool, CursorError> {
        self.ensure_open()?;
        if self.position <= 0 {
            self.position = -1;
            Ok(false)
        } else {
            self.position -= 1;
            self.was_null = false;
            Ok(true)
        }
    }

    pub fn first(&mut self) -> Result<bool, CursorError> {
        self.ensure_open()?;
        if self.row_count() == 0 {
            self.position = 0;
            return Ok(false);
        }
        self.position = 0;
        self.was_null = false;
        Ok(true)
    }

    pub fn last(&mut self) -> Result<bool, CursorError> {
        self.ensure_open()?;
        let n = self.row_count() as isize;
        if n == 0 {
            self.position = 0;
            return Ok(false);
        }
        self.position = n - 1;
        self.was_null = false;
        Ok(true)
    }

    pub fn before_first(&mut self) -> Result<(), CursorError> {
        self.ensure_open()?;
        self.position = -1;
        Ok(())
    }

    pub fn after_last(&mut self) -> Result<(), CursorError> {
        self.ensure_open()?;
        self.position = self.row_count() as isize;
        Ok(())
    }

    /// Move to an absolute row: 1-based from the start for positive values,
    /// from the end for negative ones (-1 is the last row). `absolute(0)`
    /// parks before-first and reports not-positioned.
    pub fn absolute(&mut self, row: i64) -> Result<bool, CursorError> {
        self.ensure_open()?;
        let n = self.row_count() as i64;
        let target = match row.cmp(&0) {
            std::cmp::Ordering::Greater => row - 1,
            std::cmp::Ordering::Less => n + row,
            std::cmp::Ordering::Equal => {
                self.position = -1;
                return Ok(false);
            }
        };
        self.move_to(target)
    }

    /// Move relative to the current position; from before-first a positive
    /// offset counts from the first row.
    pub fn relative(&mut self, offset: i64) -> Result<bool, CursorError> {
        self.ensure_open()?;
        let target = if self.position < 0 {
            offset - 1
        } else {
            self.position as i64 + offset
        };
        self.move_to(target)
    }

    fn move_to(&mut self, target: i64) -> Result<bool, CursorError> {
        let n = self.row_count() as i64;
        if target < 0 {
            self.position = -1;
            return Ok(false);
        }
        if target >= n {
            self.position = n as isize;
            return Ok(false);
        }
        self.position = target as isize;
        self.was_null = false;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Cell access
    // ------------------------------------------------------------------

    /// Text form of the cell; lossless for every cell shape.
    pub fn get_string<I: ColumnIndex>(&mut self, column: I) -> Result<Option<String>, CursorError> {
        Ok(self.cell_at(column)?.display())
    }

    pub fn get_bool<I: ColumnIndex>(&mut self, column: I) -> Result<Option<bool>, CursorError> {
        match self.cell_at(column)? {
            Cell::Null => Ok(None),
            Cell::Bool(b) => Ok(Some(*b)),
            Cell::Int(i) => Ok(Some(*i != 0)),
            Cell::Long(l) => Ok(Some(*l != 0)),
            Cell::Float(f) => Ok(Some(*f != 0.0)),
            Cell::Double(d) => Ok(Some(*d != 0.0)),
            Cell::Decimal(d) => Ok(Some(!d.is_zero())),
            Cell::Text(s) => {
                let normalized = s.trim().to_lowercase();
                match normalized.as_str() {
                    "" => Ok(None),
                    "true" | "1" | "yes" => Ok(Some(true)),
                    "false" | "0" | "no" => Ok(Some(false)),
                    _ => Err(coercion("BOOLEAN", s)),
                }
            }
            other => Err(coercion_cell("BOOLEAN", other)),
        }
    }

    pub fn get_i32<I: ColumnIndex>(&mut self, column: I) -> Result<Option<i32>, CursorError> {
        match self.get_decimal(column)? {
            None => Ok(None),
            Some(d) => d
                .trunc()
                .to_i32()
                .map(Some)
                .ok_or_else(|| coercion("INTEGER", &d.to_string())),
        }
    }

    pub fn get_i64<I: ColumnIndex>(&mut self, column: I) -> Result<Option<i64>, CursorError> {
        match self.get_decimal(column)? {
            None => Ok(None),
            Some(d) => d
                .trunc()
                .to_i64()
                .map(Some)
                .ok_or_else(|| coercion("BIGINT", &d.to_string())),
        }
    }

    pub fn get_f32<I: ColumnIndex>(&mut self, column: I) -> Result<Option<f32>, CursorError> {
        Ok(self.get_f64(column)?.map(|d| d as f32))
    }

    pub fn get_f64<I: ColumnIndex>(&mut self, column: I) -> Result<Option<f64>, CursorError> {
        match self.cell_at(column)? {
            Cell::Null => Ok(None),
            Cell::Int(i) => Ok(Some(f64::from(*i))),
            Cell::Long(l) => Ok(Some(*l as f64)),
            Cell::Float(f) => Ok(Some(f64::from(*f))),
            Cell::Double(d) => Ok(Some(*d)),
            Cell::Decimal(d) => d
                .to_f64()
                .map(Some)
                .ok_or_else(|| coercion("DOUBLE", &d.to_string())),
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| coercion("DOUBLE", s)),
            other => Err(coercion_cell("DOUBLE", other)),
        }
    }

    pub fn get_decimal<I: ColumnIndex>(
        &mut self,
        column: I,
    ) -> Result<Option<Decimal>, CursorError> {
        match self.cell_at(column)? {
            Cell::Null => Ok(None),
            Cell::Int(i) => Ok(Some(Decimal::from(*i))),
            Cell::Long(l) => Ok(Some(Decimal::from(*l))),
            Cell::Float(f) => Decimal::from_f32(*f)
                .map(Some)
                .ok_or_else(|| coercion("NUMERIC", &f.to_string())),
            Cell::Double(d) => Decimal::from_f64(*d)
                .map(Some)
                .ok_or_else(|| coercion("NUMERIC", &d.to_string())),
            Cell::Decimal(d) => Ok(Some(*d)),
            Cell::Text(s) => parse_decimal_text(s).map(Some).ok_or_else(|| coercion("NUMERIC", s)),
            other => Err(coercion_cell("NUMERIC", other)),
        }
    }

    /// Temporal accessor. Native timestamps pass through, numbers are epoch
    /// milliseconds, and text is tried as an instant, then an offset
    /// datetime, then a local datetime in the system zone.
    pub fn get_timestamp<I: ColumnIndex>(
        &mut self,
        column: I,
    ) -> Result<Option<DateTime<Utc>>, CursorError> {
        let cell = self.cell_at(column)?.clone();
        cell_to_timestamp(&cell)
    }

    /// Calendar-date convenience over `get_timestamp`; `YYYY-MM-DD` text is
    /// taken as-is without a time-of-day.
    pub fn get_date<I: ColumnIndex>(
        &mut self,
        column: I,
    ) -> Result<Option<NaiveDate>, CursorError> {
        let cell = self.cell_at(column)?.clone();
        if let Cell::Text(s) = &cell {
            if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                return Ok(Some(date));
            }
        }
        Ok(cell_to_timestamp(&cell)?.map(|ts| ts.date_naive()))
    }

    pub fn get_bytes<I: ColumnIndex>(&mut self, column: I) -> Result<Option<Vec<u8>>, CursorError> {
        match self.cell_at(column)? {
            Cell::Null => Ok(None),
            Cell::Bytes(b) => Ok(Some(b.clone())),
            Cell::Text(s) => Ok(Some(s.as_bytes().to_vec())),
            other => Err(coercion_cell("VARBINARY", other)),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn on_row(&self) -> bool {
        self.position >= 0 && (self.position as usize) < self.row_count()
    }

    fn ensure_open(&self) -> Result<(), CursorError> {
        if self.is_closed() {
            return Err(CursorError::Closed);
        }
        Ok(())
    }

    fn cell_at<I: ColumnIndex>(&mut self, column: I) -> Result<&Cell, CursorError> {
        self.ensure_open()?;
        let index = column.resolve(self)?;
        if !self.on_row() {
            return Err(CursorError::NotOnRow);
        }
        let row = self.position as usize;
        self.was_null = self.table.rows()[row][index].is_null();
        Ok(&self.table.rows()[row][index])
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("columns", &self.table.columns())
            .field("rows", &self.table.row_count())
            .field("position", &self.position)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// COERCION HELPERS
// ============================================================================

fn coercion(target: &'static str, value: &str) -> CursorError {
    CursorError::TypeCoercion {
        target,
        value: value.to_string(),
    }
}

fn coercion_cell(target: &'static str, cell: &Cell) -> CursorError {
    coercion(target, &cell.display().unwrap_or_default())
}

fn parse_decimal_text(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

fn cell_to_timestamp(cell: &Cell) -> Result<Option<DateTime<Utc>>, CursorError> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Timestamp(ts) => Ok(Some(*ts)),
        Cell::Int(_) | Cell::Long(_) | Cell::Float(_) | Cell::Double(_) | Cell::Decimal(_) => {
            let millis = match cell {
                Cell::Int(i) => Some(i64::from(*i)),
                Cell::Long(l) => Some(*l),
                Cell::Float(f) => Decimal::from_f32(*f).and_then(|d| d.trunc().to_i64()),
                Cell::Double(d) => Decimal::from_f64(*d).and_then(|d| d.trunc().to_i64()),
                Cell::Decimal(d) => d.trunc().to_i64(),
                _ => unreachable!(),
            };
            let millis = millis
                .ok_or_else(|| coercion("TIMESTAMP", &cell.display().unwrap_or_default()))?;
            match Utc.timestamp_millis_opt(millis) {
                LocalResult::Single(ts) => Ok(Some(ts)),
                _ => Err(coercion("TIMESTAMP", &millis.to_string())),
            }
        }
        Cell::Text(s) => parse_temporal_text(s.trim())
            .map(Some)
            .ok_or_else(|| coercion("TIMESTAMP", s)),
        other => Err(coercion_cell("TIMESTAMP", other)),
    }
}

/// Instant / offset-datetime first (both are RFC 3339 shapes), then a local
/// datetime interpreted in the system zone.
fn parse_temporal_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = text.parse::<NaiveDateTime>().ok()?;
    let local = match Local.from_local_datetime(&naive) {
        LocalResult::Single(ts) => ts,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => return None,
    };
    Some(local.with_timezone(&Utc))
}

// ============================================================================
// TESTS
// ============================================================================
