//! Scripted connection for adapter and loader tests.

use std::cell::RefCell;

use crate::driver::{Connection, ProbedColumn, Row, Value};
use crate::error::{Error, Result};

struct Response {
    fragment: String,
    params: Vec<String>,
    outcome: std::result::Result<Vec<Row>, String>,
}

/// A [`Connection`] answering queries from canned responses.
///
/// A response matches when the SQL contains its fragment and the parameters
/// are equal. Unmatched queries fail.
pub struct ScriptedConnection {
    driver: String,
    quote: Option<String>,
    responses: Vec<Response>,
    probes: Vec<(String, Vec<ProbedColumn>)>,
    log: RefCell<Vec<String>>,
}

impl ScriptedConnection {
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            quote: None,
            responses: Vec::new(),
            probes: Vec::new(),
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn with_quote(mut self, quote: &str) -> Self {
        self.quote = Some(quote.to_string());
        self
    }

    pub fn on(mut self, fragment: &str, params: &[&str], rows: Vec<Row>) -> Self {
        self.responses.push(Response {
            fragment: fragment.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            outcome: Ok(rows),
        });
        self
    }

    pub fn fail_on(mut self, fragment: &str, params: &[&str], message: &str) -> Self {
        self.responses.push(Response {
            fragment: fragment.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            outcome: Err(message.to_string()),
        });
        self
    }

    pub fn with_probe(mut self, quoted_table: &str, columns: &[(&str, Option<&str>)]) -> Self {
        let columns = columns
            .iter()
            .map(|(name, declared)| ProbedColumn {
                name: name.to_string(),
                declared_type: declared.map(String::from),
            })
            .collect();
        self.probes.push((quoted_table.to_string(), columns));
        self
    }

    /// Every SQL statement issued, in order.
    pub fn queries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl Connection for ScriptedConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        self.log.borrow_mut().push(sql.to_string());
        let response = self
            .responses
            .iter()
            .find(|r| sql.contains(&r.fragment) && r.params == params)
            .ok_or_else(|| Error::Query(format!("unscripted query {sql:?} {params:?}")))?;

        response.outcome.clone().map_err(Error::Query)
    }

    fn probe_columns(&self, quoted_table: &str) -> Result<Vec<ProbedColumn>> {
        self.probes
            .iter()
            .find(|(table, _)| table == quoted_table)
            .map(|(_, columns)| columns.clone())
            .ok_or_else(|| Error::Query(format!("no such table {quoted_table}")))
    }

    fn identifier_quote(&self) -> Option<&str> {
        self.quote.as_deref()
    }
}

/// Build a row from (column, value) pairs.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::new(
        pairs.iter().map(|(c, _)| c.to_string()).collect(),
        pairs.iter().map(|(_, v)| v.clone()).collect(),
    )
}

/// Shorthand for a text value.
pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}
