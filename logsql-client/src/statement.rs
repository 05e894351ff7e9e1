//! Statements: plain and prepared.
//!
//! A statement is the logical-query handle above the client. Executing a new
//! query retires the cursor the statement produced before (the old cursor
//! becomes effectively closed) and records the translated LogsQL text the
//! service reported for the new one.

use crate::client::Client;
use crate::error::{Error, Result};
use logsql_core::{Cursor, ParamSlot, ParamValue, StatementTemplate, TemplateError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// STATEMENT
// ============================================================================

/// Executes literal query text and tracks the cursor it produced last.
#[derive(Debug)]
pub struct Statement {
    client: Client,
    max_rows: usize,
    last_translated: Option<String>,
    retire_flag: Option<Arc<AtomicBool>>,
    open_flag: Option<Arc<AtomicBool>>,
    closed: bool,
}

impl Statement {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            max_rows: 0,
            last_translated: None,
            retire_flag: None,
            open_flag: None,
            closed: false,
        }
    }

    /// Row cap applied to every result of this statement; 0 means unlimited.
    pub fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = max_rows;
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Translated LogsQL text of the most recent execution, when the
    /// service reported one.
    pub fn last_translated(&self) -> Option<&str> {
        self.last_translated.as_deref()
    }

    /// Whether the cursor from the last execution is still open.
    pub fn has_open_cursor(&self) -> bool {
        self.open_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Execute literal query text and return a fresh cursor over the
    /// buffered result. The previous cursor of this statement, if any, is
    /// retired first.
    pub async fn execute(&mut self, query: &str) -> Result<Cursor> {
        self.ensure_open()?;
        let outcome = self.client.run_query(query, self.max_rows).await?;
        self.last_translated = outcome.translated;
        self.retire_current();

        let retire = Arc::new(AtomicBool::new(false));
        let open = Arc::new(AtomicBool::new(true));
        self.retire_flag = Some(Arc::clone(&retire));
        self.open_flag = Some(Arc::clone(&open));

        Ok(Cursor::new(outcome.table)
            .with_retire_flag(retire)
            .with_close_notifier(move || open.store(false, Ordering::Release)))
    }

    /// Updates are not part of the service contract.
    pub async fn execute_update(&mut self, _query: &str) -> Result<u64> {
        Err(Error::Unsupported {
            operation: "execute_update",
        })
    }

    /// There is no cancellation primitive: a dispatched query runs to
    /// completion or failure.
    pub fn cancel(&self) -> Result<()> {
        Err(Error::Unsupported { operation: "cancel" })
    }

    /// Close the statement, retiring its current cursor. Idempotent.
    pub fn close(&mut self) {
        self.retire_current();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::StatementClosed);
        }
        Ok(())
    }

    fn retire_current(&mut self) {
        if let Some(flag) = self.retire_flag.take() {
            flag.store(true, Ordering::Release);
        }
        self.open_flag = None;
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        self.retire_current();
    }
}

// ============================================================================
// PREPARED STATEMENT
// ============================================================================

/// A statement template with positional parameter slots.
///
/// Slots are addressed 1-based through the binding API, matching the
/// placeholder numbering a query author counts. All slots start `Unset`;
/// executing with an unset slot fails before anything is dispatched.
#[derive(Debug)]
pub struct PreparedStatement {
    template: StatementTemplate,
    slots: Vec<ParamSlot>,
    statement: Statement,
}

impl PreparedStatement {
    pub(crate) fn new(client: Client, sql: &str) -> Self {
        let template = StatementTemplate::new(sql);
        let slots = vec![ParamSlot::Unset; template.placeholder_count()];
        Self {
            template,
            slots,
            statement: Statement::new(client),
        }
    }

    pub fn placeholder_count(&self) -> usize {
        self.template.placeholder_count()
    }

    /// Bind a value to the 1-based placeholder `index`.
    pub fn bind(&mut self, index: usize, value: impl Into<ParamValue>) -> Result<()> {
        *self.slot_mut(index)? = ParamSlot::Value(value.into());
        Ok(())
    }

    /// Bind an explicit SQL NULL to the 1-based placeholder `index`.
    pub fn bind_null(&mut self, index: usize) -> Result<()> {
        *self.slot_mut(index)? = ParamSlot::Null;
        Ok(())
    }

    /// Reset every slot to unset.
    pub fn clear_bindings(&mut self) {
        self.slots.fill(ParamSlot::Unset);
    }

    /// Render the template with the current bindings and execute it.
    pub async fn execute(&mut self) -> Result<Cursor> {
        let query = self.template.render(&self.slots)?;
        self.statement.execute(&query).await
    }

    /// The underlying statement, for row caps and execution metadata.
    pub fn statement(&mut self) -> &mut Statement {
        &mut self.statement
    }

    pub fn last_translated(&self) -> Option<&str> {
        self.statement.last_translated()
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut ParamSlot> {
        let count = self.slots.len();
        if index == 0 || index > count {
            return Err(TemplateError::IndexOutOfRange { index, count }.into());
        }
        Ok(&mut self.slots[index - 1])
    }
}
