//! Database access layer for admin operations
//!
//! `Database` wraps the [`Connection`](crate::connection::Connection)
//! boundary and renders sea-query statements for the connection's dialect.
//! The admin core operates on dynamic data (`serde_json` objects), not
//! statically-typed models, so every helper speaks table/column names and
//! JSON values.

use crate::connection::{Backend, Connection};
use grappelli_types::{AdminError, AdminResult, Record};
use sea_query::{
	Alias, Asterisk, DeleteStatement, Expr, ExprTrait, InsertStatement, PostgresQueryBuilder,
	Query as SeaQuery, SelectStatement, SqliteQueryBuilder, UpdateStatement,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Convert a JSON value into a sea-query value for binding into statements
pub fn json_to_sea_value(value: &Value) -> sea_query::Value {
	match value {
		Value::String(s) => sea_query::Value::String(Some(s.clone())),
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				sea_query::Value::BigInt(Some(i))
			} else if let Some(f) = n.as_f64() {
				sea_query::Value::Double(Some(f))
			} else {
				sea_query::Value::String(Some(n.to_string()))
			}
		}
		Value::Bool(b) => sea_query::Value::Bool(Some(*b)),
		Value::Null => sea_query::Value::Int(None),
		other => sea_query::Value::String(Some(other.to_string())),
	}
}

/// Shared database facade
///
/// # Examples
///
/// ```no_run
/// use grappelli_core::{Database, SqliteConnection};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let conn = SqliteConnection::connect("sqlite::memory:").await?;
/// let db = Database::new(Arc::new(conn));
///
/// let row = db.get("users", "id", &serde_json::json!(1)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Database {
	connection: Arc<dyn Connection>,
}

impl Database {
	/// Create a new database facade over a connection
	pub fn new(connection: Arc<dyn Connection>) -> Self {
		Self { connection }
	}

	/// The underlying connection
	pub fn connection(&self) -> &dyn Connection {
		self.connection.as_ref()
	}

	/// SQL dialect of the underlying connection
	pub fn backend(&self) -> Backend {
		self.connection.backend()
	}

	/// Render a select statement for this connection's dialect
	pub fn render_select(&self, statement: &SelectStatement) -> String {
		match self.backend() {
			Backend::Postgres => statement.to_string(PostgresQueryBuilder),
			Backend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	fn render_insert(&self, statement: &InsertStatement) -> String {
		match self.backend() {
			Backend::Postgres => statement.to_string(PostgresQueryBuilder),
			Backend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	fn render_update(&self, statement: &UpdateStatement) -> String {
		match self.backend() {
			Backend::Postgres => statement.to_string(PostgresQueryBuilder),
			Backend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	fn render_delete(&self, statement: &DeleteStatement) -> String {
		match self.backend() {
			Backend::Postgres => statement.to_string(PostgresQueryBuilder),
			Backend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	/// Execute a built select and collect its rows
	pub async fn fetch_all(&self, statement: &SelectStatement) -> AdminResult<Vec<Record>> {
		let sql = self.render_select(statement);
		tracing::debug!(%sql, "fetch_all");
		self.connection.query(&sql).await
	}

	/// Execute a built select expected to yield at most one row
	pub async fn fetch_optional(&self, statement: &SelectStatement) -> AdminResult<Option<Record>> {
		let sql = self.render_select(statement);
		tracing::debug!(%sql, "fetch_optional");
		self.connection.query_optional(&sql).await
	}

	/// Run a COUNT(*) over the given filtered statement.
	///
	/// The statement must carry FROM and WHERE only; select columns and
	/// ordering are the caller's concern and would be invalid here.
	pub async fn count(&self, statement: &SelectStatement) -> AdminResult<u64> {
		let mut counting = statement.clone();
		counting.expr(Expr::cust("COUNT(*)"));
		let sql = self.render_select(&counting);
		tracing::debug!(%sql, "count");
		let row = self.connection.query_one(&sql).await?;
		// COUNT(*) lands in the first column whatever its alias
		let count = row
			.get("count")
			.and_then(Value::as_i64)
			.or_else(|| row.values().next().and_then(Value::as_i64))
			.unwrap_or(0);
		Ok(count as u64)
	}

	/// Fetch a single row by primary key
	pub async fn get(&self, table: &str, pk_field: &str, id: &Value) -> AdminResult<Option<Record>> {
		let statement = SeaQuery::select()
			.from(Alias::new(table))
			.column(Asterisk)
			.and_where(Expr::col(Alias::new(pk_field)).eq(json_to_sea_value(id)))
			.to_owned();
		self.fetch_optional(&statement).await
	}

	/// Insert a row from a JSON object
	pub async fn create(&self, table: &str, data: HashMap<String, Value>) -> AdminResult<u64> {
		let mut statement = SeaQuery::insert().into_table(Alias::new(table)).to_owned();

		let mut columns = Vec::new();
		let mut values: Vec<sea_query::SimpleExpr> = Vec::new();
		for (key, value) in data {
			columns.push(Alias::new(&key));
			values.push(json_to_sea_value(&value).into());
		}
		statement
			.columns(columns)
			.values(values)
			.map_err(|e| AdminError::Database(e.to_string()))?;

		let sql = self.render_insert(&statement);
		tracing::debug!(%sql, "create");
		self.connection.execute(&sql).await
	}

	/// Update a row by primary key from a JSON object
	pub async fn update(
		&self,
		table: &str,
		pk_field: &str,
		id: &Value,
		data: HashMap<String, Value>,
	) -> AdminResult<u64> {
		let mut statement = SeaQuery::update().table(Alias::new(table)).to_owned();
		for (key, value) in data {
			statement.value(Alias::new(&key), json_to_sea_value(&value));
		}
		statement.and_where(Expr::col(Alias::new(pk_field)).eq(json_to_sea_value(id)));

		let sql = self.render_update(&statement);
		tracing::debug!(%sql, "update");
		self.connection.execute(&sql).await
	}

	/// Hard-delete a row by primary key
	pub async fn delete(&self, table: &str, pk_field: &str, id: &Value) -> AdminResult<u64> {
		let statement = SeaQuery::delete()
			.from_table(Alias::new(table))
			.and_where(Expr::col(Alias::new(pk_field)).eq(json_to_sea_value(id)))
			.to_owned();

		let sql = self.render_delete(&statement);
		tracing::debug!(%sql, "delete");
		self.connection.execute(&sql).await
	}

	/// Hard-delete several rows by primary key
	pub async fn bulk_delete(
		&self,
		table: &str,
		pk_field: &str,
		ids: &[Value],
	) -> AdminResult<u64> {
		if ids.is_empty() {
			return Ok(0);
		}
		let sea_ids: Vec<sea_query::Value> = ids.iter().map(json_to_sea_value).collect();
		let statement = SeaQuery::delete()
			.from_table(Alias::new(table))
			.and_where(Expr::col(Alias::new(pk_field)).is_in(sea_ids))
			.to_owned();

		let sql = self.render_delete(&statement);
		tracing::debug!(%sql, "bulk_delete");
		self.connection.execute(&sql).await
	}

	/// Execute a built delete with arbitrary conditions (pivot maintenance)
	pub async fn delete_where(&self, statement: &DeleteStatement) -> AdminResult<u64> {
		let sql = self.render_delete(statement);
		tracing::debug!(%sql, "delete_where");
		self.connection.execute(&sql).await
	}

	/// Execute raw SQL (schema setup in tests)
	pub async fn execute_raw(&self, sql: &str) -> AdminResult<u64> {
		self.connection.execute(sql).await
	}
}
