//! Scripted row source.
//!
//! Answers each `execute` call with the next queued result set, regardless
//! of the statement. Useful for injecting malformed data (orphaned child
//! rows, null identities) that the in-memory source cannot produce.

use std::collections::VecDeque;

use parking_lot::Mutex;

use eagerfetch_core::row::{RowCursor, RowSource};
use eagerfetch_core::sql::SelectStatement;
use eagerfetch_core::value::Value;
use eagerfetch_core::Error;

/// A row source that replays canned result sets in FIFO order.
#[derive(Default)]
pub struct ScriptedRowSource {
    results: Mutex<VecDeque<Vec<Vec<Value>>>>,
}

impl ScriptedRowSource {
    /// Create an empty scripted source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result set for the next unanswered execution.
    pub fn push_result(&self, rows: Vec<Vec<Value>>) {
        self.results.lock().push_back(rows);
    }

    /// Number of queued result sets not yet consumed.
    pub fn remaining(&self) -> usize {
        self.results.lock().len()
    }
}

impl RowSource for ScriptedRowSource {
    fn execute(&self, _statement: &SelectStatement) -> Result<RowCursor, Error> {
        let rows = self
            .results
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Execution("no scripted result queued".into()))?;
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_statement() -> SelectStatement {
        SelectStatement {
            base_table: "orders".into(),
            base_alias: "t0".into(),
            columns: vec![],
            joins: vec![],
            filter: None,
            order_by: vec![],
            offset: None,
            limit: None,
        }
    }

    #[test]
    fn test_replays_in_order() {
        let source = ScriptedRowSource::new();
        source.push_result(vec![vec![Value::Int32(1)]]);
        source.push_result(vec![vec![Value::Int32(2)]]);

        let stmt = empty_statement();
        let first: Vec<_> = source.execute(&stmt).unwrap().collect();
        let second: Vec<_> = source.execute(&stmt).unwrap().collect();
        assert_eq!(first[0].as_ref().unwrap()[0], Value::Int32(1));
        assert_eq!(second[0].as_ref().unwrap()[0], Value::Int32(2));
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_exhausted_queue_is_an_error() {
        let source = ScriptedRowSource::new();
        assert!(source.execute(&empty_statement()).is_err());
    }
}
