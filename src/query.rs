use chrono::NaiveDate;

/// FieldValue
///
/// The closed set of SQL parameter types the catalog binds dynamically. Values
/// are always carried out-of-band from the rendered clause text and bound as
/// numbered placeholders, never interpolated.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i32),
    Date(NaiveDate),
}

/// FieldSet
///
/// An ordered (column, value) accumulator used to build partial-update SET
/// clauses and search WHERE clauses from an open set of optional fields.
/// Callers express "no filter" / "no change" by simply not adding the pair.
///
/// Rendering is insertion-order stable: the same adds in the same order always
/// produce identical clause text, so prepared statements stay cacheable and
/// tests stay deterministic.
#[derive(Debug, Default, Clone)]
pub struct FieldSet {
    columns: Vec<&'static str>,
    values: Vec<FieldValue>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair. Column names are code constants, never caller input;
    /// only the values travel as bound parameters.
    pub fn add(&mut self, column: &'static str, value: FieldValue) {
        self.columns.push(column);
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Renders `col = $n, col = $n+1, ...` with placeholders numbered from
    /// `start`, for UPDATE statements.
    pub fn set_clause(&self, start: usize) -> String {
        self.render(start, ", ")
    }

    /// Renders `col = $n AND col = $n+1 AND ...`, for filter predicates.
    pub fn where_clause(&self, start: usize) -> String {
        self.render(start, " AND ")
    }

    /// The values matching the rendered placeholders, in insertion order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    fn render(&self, start: usize, sep: &str) -> String {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ${}", col, start + i))
            .collect::<Vec<_>>()
            .join(sep)
    }
}
