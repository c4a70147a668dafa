//! The database connection boundary
//!
//! The underlying ORM/driver is an external collaborator; this module pins
//! down the interface the admin core needs from it: execute rendered SQL,
//! get rows back as JSON objects. A `sqlx`-backed SQLite implementation is
//! provided behind the `sqlite` feature for integration testing and small
//! deployments.

use async_trait::async_trait;
use grappelli_types::{AdminError, AdminResult, Record};

/// SQL dialect of a connection, used to pick the sea-query renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
	Postgres,
	Sqlite,
}

/// Minimal async database interface the admin core runs against
///
/// Implementations are expected to be cheap to share behind an `Arc`;
/// query execution is request-scoped and blocking from the caller's point
/// of view (no internal retry or pooling logic lives at this layer).
#[async_trait]
pub trait Connection: Send + Sync {
	/// SQL dialect spoken by this connection
	fn backend(&self) -> Backend;

	/// Run a query and collect every row as a JSON object
	async fn query(&self, sql: &str) -> AdminResult<Vec<Record>>;

	/// Run a query expected to yield exactly one row
	async fn query_one(&self, sql: &str) -> AdminResult<Record> {
		self.query_optional(sql)
			.await?
			.ok_or_else(|| AdminError::Database("expected one row, got none".into()))
	}

	/// Run a query yielding at most one row
	async fn query_optional(&self, sql: &str) -> AdminResult<Option<Record>> {
		Ok(self.query(sql).await?.into_iter().next())
	}

	/// Run a statement and return the number of affected rows
	async fn execute(&self, sql: &str) -> AdminResult<u64>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
	//! sqlx-backed SQLite connection

	use super::*;
	use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
	use sqlx::{Column, Row};

	/// SQLite connection over a sqlx pool
	///
	/// # Examples
	///
	/// ```no_run
	/// use grappelli_core::SqliteConnection;
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let conn = SqliteConnection::connect("sqlite::memory:").await?;
	/// # Ok(())
	/// # }
	/// ```
	#[derive(Clone)]
	pub struct SqliteConnection {
		pool: SqlitePool,
	}

	impl SqliteConnection {
		/// Connect to a SQLite database
		///
		/// In-memory databases are pinned to a single pooled connection so
		/// the schema survives across statements.
		pub async fn connect(url: &str) -> AdminResult<Self> {
			let max = if url.contains(":memory:") { 1 } else { 5 };
			let pool = SqlitePoolOptions::new()
				.max_connections(max)
				.connect(url)
				.await
				.map_err(|e| AdminError::Database(e.to_string()))?;
			Ok(Self { pool })
		}

		/// Wrap an existing pool
		pub fn from_pool(pool: SqlitePool) -> Self {
			Self { pool }
		}

		fn row_to_record(row: &SqliteRow) -> Record {
			let mut record = Record::new();
			for (index, column) in row.columns().iter().enumerate() {
				record.insert(column.name().to_string(), Self::decode_column(row, index));
			}
			record
		}

		/// Decode one dynamically-typed SQLite column into JSON.
		///
		/// SQLite values carry their own storage class, so decoding is a
		/// cascade of typed attempts; `Option<_>` handles NULL uniformly.
		fn decode_column(row: &SqliteRow, index: usize) -> serde_json::Value {
			if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
				return match value {
					Some(int) => serde_json::json!(int),
					None => serde_json::Value::Null,
				};
			}
			if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
				return match value {
					Some(float) => serde_json::json!(float),
					None => serde_json::Value::Null,
				};
			}
			if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
				return match value {
					Some(flag) => serde_json::json!(flag),
					None => serde_json::Value::Null,
				};
			}
			if let Ok(value) = row.try_get::<Option<String>, _>(index) {
				return match value {
					Some(text) => serde_json::json!(text),
					None => serde_json::Value::Null,
				};
			}
			serde_json::Value::Null
		}
	}

	#[async_trait]
	impl Connection for SqliteConnection {
		fn backend(&self) -> Backend {
			Backend::Sqlite
		}

		async fn query(&self, sql: &str) -> AdminResult<Vec<Record>> {
			let rows = sqlx::query(sql)
				.fetch_all(&self.pool)
				.await
				.map_err(|e| AdminError::Database(e.to_string()))?;
			Ok(rows.iter().map(Self::row_to_record).collect())
		}

		async fn execute(&self, sql: &str) -> AdminResult<u64> {
			let result = sqlx::query(sql)
				.execute(&self.pool)
				.await
				.map_err(|e| AdminError::Database(e.to_string()))?;
			Ok(result.rows_affected())
		}
	}
}
