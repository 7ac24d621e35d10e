//! In-process database backend.
//!
//! # Responsibilities
//! - Store tables as ordered rows of named columns
//! - Execute the statement shapes `Sql` produces (select, insert, update,
//!   delete with `column = $n` filters)
//! - Count opened and released connections
//!
//! # Design Decisions
//! - Values only arrive through placeholders; a literal value in a statement
//!   is rejected as unsupported
//! - Missing `id` on insert gets a fresh UUID, like a `DEFAULT gen_random_uuid()`
//! - `id` is a primary key: inserting an id that already exists fails
//! - Table lock is held only while a statement executes (never across awaits)

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::db::connection::{Connection, Database};
use crate::db::error::DbError;
use crate::db::query::RawRows;
use crate::db::value::SqlValue;

#[derive(Debug, Clone)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Mutex<HashMap<String, Table>>,
    opened: AtomicUsize,
    open: AtomicUsize,
}

/// A shareable in-memory database. Clones see the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<Inner>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a table with the given columns.
    pub fn create_table(&self, name: &str, columns: &[&str]) {
        let mut tables = self.inner.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.insert(
            name.to_string(),
            Table {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
            },
        );
    }

    pub fn with_table(self, name: &str, columns: &[&str]) -> Self {
        self.create_table(name, columns);
        self
    }

    /// Connections opened over this database's lifetime.
    pub fn connections_opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    pub fn connections_open(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<RawRows, DbError> {
        let statement = parse(sql).ok_or_else(|| DbError::Unsupported { sql: sql.to_string() })?;
        let mut tables = self.inner.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let fail = |message: String| DbError::Query {
            sql: sql.to_string(),
            message,
        };

        let table = tables
            .get_mut(statement.table())
            .ok_or_else(|| fail(format!("relation \"{}\" does not exist", statement.table())))?;
        let bind = |n: usize| {
            params
                .get(n.wrapping_sub(1))
                .cloned()
                .ok_or_else(|| fail(format!("no value bound for ${n}")))
        };
        let column_index = |table: &Table, name: &str| {
            table
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| fail(format!("column \"{name}\" does not exist")))
        };
        let resolve = |table: &Table, filters: &[(String, usize)]| -> Result<Vec<(usize, SqlValue)>, DbError> {
            filters
                .iter()
                .map(|(column, n)| Ok((column_index(table, column)?, bind(*n)?)))
                .collect()
        };
        let matches = |row: &[SqlValue], filters: &[(usize, SqlValue)]| filters.iter().all(|(i, v)| &row[*i] == v);

        match statement {
            Statement::Select { filters, limit, .. } => {
                let filters = resolve(table, &filters)?;
                let rows: Vec<Vec<SqlValue>> = table
                    .rows
                    .iter()
                    .filter(|row| matches(row, &filters))
                    .take(limit.unwrap_or(usize::MAX))
                    .cloned()
                    .collect();
                Ok(RawRows {
                    columns: table.columns.clone(),
                    affected: rows.len() as u64,
                    rows,
                })
            }
            Statement::Insert {
                columns,
                values,
                returning,
                ..
            } => {
                if columns.len() != values.len() {
                    return Err(fail("INSERT has more target columns than expressions".into()));
                }
                let mut row = vec![SqlValue::Null; table.columns.len()];
                for (column, n) in columns.iter().zip(values) {
                    let i = column_index(table, column)?;
                    row[i] = bind(n)?;
                }
                if let Some(id) = table.columns.iter().position(|c| c == "id") {
                    if !columns.iter().any(|c| c == "id") {
                        row[id] = SqlValue::Uuid(Uuid::new_v4());
                    }
                    if table.rows.iter().any(|existing| existing[id] == row[id]) {
                        return Err(fail(format!("duplicate key value {:?} for \"id\"", row[id])));
                    }
                }
                table.rows.push(row.clone());
                Ok(RawRows {
                    columns: table.columns.clone(),
                    rows: if returning { vec![row] } else { Vec::new() },
                    affected: 1,
                })
            }
            Statement::Update {
                assignments,
                filters,
                returning,
                ..
            } => {
                let filters = resolve(table, &filters)?;
                let assignments = resolve(table, &assignments)?;
                let mut touched = Vec::new();
                for row in table.rows.iter_mut().filter(|row| matches(row, &filters)) {
                    for (i, value) in &assignments {
                        row[*i] = value.clone();
                    }
                    touched.push(row.clone());
                }
                Ok(RawRows {
                    columns: table.columns.clone(),
                    affected: touched.len() as u64,
                    rows: if returning { touched } else { Vec::new() },
                })
            }
            Statement::Delete { filters, .. } => {
                let filters = resolve(table, &filters)?;
                let before = table.rows.len();
                table.rows.retain(|row| !matches(row, &filters));
                Ok(RawRows {
                    columns: table.columns.clone(),
                    rows: Vec::new(),
                    affected: (before - table.rows.len()) as u64,
                })
            }
        }
    }
}

impl Database for MemoryDatabase {
    type Connection = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection, DbError> {
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection {
            database: self.clone(),
        })
    }
}

/// A connection to a `MemoryDatabase`.
#[derive(Debug)]
pub struct MemoryConnection {
    database: MemoryDatabase,
}

impl Connection for MemoryConnection {
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<RawRows, DbError> {
        self.database.execute(sql, params)
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.database.inner.open.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Statement parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Param(usize),
    Number(usize),
    Star,
    Comma,
    Open,
    Close,
    Equals,
}

#[derive(Debug, PartialEq)]
enum Statement {
    Select {
        table: String,
        filters: Vec<(String, usize)>,
        limit: Option<usize>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<usize>,
        returning: bool,
    },
    Update {
        table: String,
        assignments: Vec<(String, usize)>,
        filters: Vec<(String, usize)>,
        returning: bool,
    },
    Delete {
        table: String,
        filters: Vec<(String, usize)>,
    },
}

impl Statement {
    fn table(&self) -> &str {
        match self {
            Statement::Select { table, .. }
            | Statement::Insert { table, .. }
            | Statement::Update { table, .. }
            | Statement::Delete { table, .. } => table,
        }
    }
}

fn tokenize(sql: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' | ',' | '(' | ')' | '=' | ';' => {
                chars.next();
                match c {
                    '*' => tokens.push(Token::Star),
                    ',' => tokens.push(Token::Comma),
                    '(' => tokens.push(Token::Open),
                    ')' => tokens.push(Token::Close),
                    '=' => tokens.push(Token::Equals),
                    _ => {}
                }
            }
            '"' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next()? {
                        '"' => break,
                        ch => name.push(ch),
                    }
                }
                tokens.push(Token::Quoted(name));
            }
            '$' => {
                chars.next();
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                tokens.push(Token::Param(digits.parse().ok()?));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                tokens.push(Token::Number(digits.parse().ok()?));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(w) = chars.peek().copied().filter(|w| w.is_ascii_alphanumeric() || *w == '_') {
                    word.push(w);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            // String literals and anything else: values must be bound.
            _ => return None,
        }
    }
    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn keyword(&mut self, expected: &str) -> Option<()> {
        match self.next()? {
            Token::Word(w) if w.eq_ignore_ascii_case(expected) => Some(()),
            _ => None,
        }
    }

    fn at_keyword(&self, expected: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(expected))
    }

    fn expect(&mut self, expected: Token) -> Option<()> {
        (self.next()? == expected).then_some(())
    }

    fn name(&mut self) -> Option<String> {
        match self.next()? {
            Token::Quoted(n) | Token::Word(n) => Some(n),
            _ => None,
        }
    }

    fn param(&mut self) -> Option<usize> {
        match self.next()? {
            Token::Param(n) => Some(n),
            _ => None,
        }
    }

    /// `column = $n`
    fn binding(&mut self) -> Option<(String, usize)> {
        let column = self.name()?;
        self.expect(Token::Equals)?;
        Some((column, self.param()?))
    }

    /// `[WHERE column = $n (AND column = $n)*]`
    fn filters(&mut self) -> Option<Vec<(String, usize)>> {
        let mut filters = Vec::new();
        if self.at_keyword("where") {
            self.next();
            filters.push(self.binding()?);
            while self.at_keyword("and") {
                self.next();
                filters.push(self.binding()?);
            }
        }
        Some(filters)
    }

    fn returning(&mut self) -> Option<bool> {
        if self.at_keyword("returning") {
            self.next();
            self.expect(Token::Star)?;
            return Some(true);
        }
        Some(false)
    }

    fn done(&self) -> Option<()> {
        (self.pos >= self.tokens.len()).then_some(())
    }
}

fn parse(sql: &str) -> Option<Statement> {
    let mut p = Parser {
        tokens: tokenize(sql)?,
        pos: 0,
    };
    let statement = match p.next()? {
        Token::Word(w) if w.eq_ignore_ascii_case("select") => {
            p.expect(Token::Star)?;
            p.keyword("from")?;
            let table = p.name()?;
            let filters = p.filters()?;
            let limit = if p.at_keyword("limit") {
                p.next();
                match p.next()? {
                    Token::Number(n) => Some(n),
                    _ => return None,
                }
            } else {
                None
            };
            Statement::Select { table, filters, limit }
        }
        Token::Word(w) if w.eq_ignore_ascii_case("insert") => {
            p.keyword("into")?;
            let table = p.name()?;
            p.expect(Token::Open)?;
            let mut columns = vec![p.name()?];
            while p.peek() == Some(&Token::Comma) {
                p.next();
                columns.push(p.name()?);
            }
            p.expect(Token::Close)?;
            p.keyword("values")?;
            p.expect(Token::Open)?;
            let mut values = vec![p.param()?];
            while p.peek() == Some(&Token::Comma) {
                p.next();
                values.push(p.param()?);
            }
            p.expect(Token::Close)?;
            let returning = p.returning()?;
            Statement::Insert {
                table,
                columns,
                values,
                returning,
            }
        }
        Token::Word(w) if w.eq_ignore_ascii_case("update") => {
            let table = p.name()?;
            p.keyword("set")?;
            let mut assignments = vec![p.binding()?];
            while p.peek() == Some(&Token::Comma) {
                p.next();
                assignments.push(p.binding()?);
            }
            let filters = p.filters()?;
            let returning = p.returning()?;
            Statement::Update {
                table,
                assignments,
                filters,
                returning,
            }
        }
        Token::Word(w) if w.eq_ignore_ascii_case("delete") => {
            p.keyword("from")?;
            let table = p.name()?;
            let filters = p.filters()?;
            Statement::Delete { table, filters }
        }
        _ => return None,
    };
    p.done()?;
    Some(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::DbHandle;
    use crate::db::query::{Query, Sql};
    use crate::db::record::{self, Record, Row};
    use crate::db::DbError;

    #[derive(Debug, Clone, PartialEq)]
    struct UserData {
        name: String,
        email: String,
    }

    crate::impl_record_fields!(UserData { name, email });

    impl Record for UserData {
        const TABLE: &'static str = "users";
        type Id = Uuid;
    }

    fn database() -> MemoryDatabase {
        MemoryDatabase::new().with_table("users", &["id", "name", "email"])
    }

    #[test]
    fn test_parse_shapes() {
        assert_eq!(
            parse("SELECT * FROM \"users\" WHERE \"id\" = $1 LIMIT 1"),
            Some(Statement::Select {
                table: "users".into(),
                filters: vec![("id".into(), 1)],
                limit: Some(1),
            })
        );
        assert!(parse("UPDATE users SET name = $1, email = $2 WHERE id = $3 RETURNING *").is_some());
        assert!(parse("DELETE FROM users WHERE id = $1 AND name = $2").is_some());
    }

    #[test]
    fn test_literal_values_rejected() {
        assert_eq!(parse("SELECT * FROM users WHERE name = 'x'"), None);
        assert_eq!(parse("SELECT * FROM users; DROP TABLE users"), None);
    }

    #[tokio::test]
    async fn test_update_then_select_sees_new_name() {
        let db = database();
        let handle = DbHandle::new(db.clone());
        let created = handle
            .run(&record::insert(&UserData {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            }))
            .await
            .unwrap();

        let update = Query::build(
            "UPDATE users SET name = $1 WHERE id = $2",
            vec![SqlValue::Text("Grace".into()), SqlValue::Uuid(*created.id())],
        );
        assert_eq!(handle.run(&update).await.unwrap(), 1);

        let reread: Row<UserData> = handle
            .run(&record::select_by_id::<UserData>(created.id()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reread.data().name, "Grace");
        assert_eq!(reread.data().email, "ada@example.com");
        assert_eq!(reread.id(), created.id());
    }

    #[tokio::test]
    async fn test_hostile_parameter_is_just_data() {
        let db = database();
        let handle = DbHandle::new(db.clone());
        let hostile = "x'; DELETE FROM users; --";
        handle
            .run(&record::insert(&UserData {
                name: hostile.into(),
                email: "e".into(),
            }))
            .await
            .unwrap();
        let found = handle.run(&record::select_where::<UserData>("name", hostile)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].data().name, hostile);
    }

    #[tokio::test]
    async fn test_handle_connects_lazily_and_releases_once() {
        let db = database();
        let handle = DbHandle::new(db.clone());
        assert_eq!(db.connections_opened(), 0);

        handle.run(&record::select_all::<UserData>()).await.unwrap();
        handle.run(&record::select_all::<UserData>()).await.unwrap();
        assert_eq!(db.connections_opened(), 1);
        assert_eq!(db.connections_open(), 1);

        assert!(handle.release().await);
        assert!(!handle.release().await);
        assert_eq!(db.connections_open(), 0);

        let err = handle.run(&record::select_all::<UserData>()).await.unwrap_err();
        assert!(matches!(err, DbError::Released));
        drop(handle);
        assert_eq!(db.connections_open(), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_unreleased_handle() {
        let db = database();
        let handle = DbHandle::new(db.clone());
        handle.run(&record::select_all::<UserData>()).await.unwrap();
        drop(handle);
        assert_eq!(db.connections_open(), 0);
        assert_eq!(db.connections_opened(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let db = database();
        let handle = DbHandle::new(db.clone());
        let id = Uuid::new_v4();
        let ada = UserData {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        };
        let row = handle.run(&record::insert_with_id(&id, &ada)).await.unwrap();
        assert_eq!(row.id(), &id);

        let err = handle.run(&record::insert_with_id(&id, &ada)).await.unwrap_err();
        match err {
            DbError::Query { sql, message } => {
                assert!(sql.starts_with("INSERT INTO \"users\""));
                assert!(message.contains("duplicate"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let all = handle.run(&record::select_all::<UserData>()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_integer_keys_are_kept() {
        #[derive(Debug, Clone, PartialEq)]
        struct Chapter {
            title: String,
        }

        crate::impl_record_fields!(Chapter { title });

        impl Record for Chapter {
            const TABLE: &'static str = "chapters";
            type Id = i64;
        }

        let db = MemoryDatabase::new().with_table("chapters", &["id", "title"]);
        let handle = DbHandle::new(db);
        let chapter = Chapter { title: "Routing".into() };
        handle.run(&record::insert_with_id(&7, &chapter)).await.unwrap();
        let found = handle.run(&record::select_by_id::<Chapter>(&7)).await.unwrap().unwrap();
        assert_eq!(found.into_data(), chapter);
    }

    #[tokio::test]
    async fn test_unknown_table_error_carries_sql() {
        let handle = DbHandle::new(MemoryDatabase::new());
        let err = handle.run(&Sql::new().raw("SELECT * FROM ").identifier("nope").finish()).await.unwrap_err();
        match err {
            DbError::Query { sql, message } => {
                assert_eq!(sql, "SELECT * FROM \"nope\"");
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_schema_drift_surfaces_as_decode_error() {
        let db = MemoryDatabase::new().with_table("users", &["id", "name"]);
        let handle = DbHandle::new(db);
        handle
            .run(&Query::build(
                "INSERT INTO users (name) VALUES ($1)",
                vec![SqlValue::Text("Ada".into())],
            ))
            .await
            .unwrap();
        let err = handle.run(&record::select_all::<UserData>()).await.unwrap_err();
        assert!(matches!(err, DbError::Decode { .. }));
        assert!(err.to_string().contains("email"));
    }
}
