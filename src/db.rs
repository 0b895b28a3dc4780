mod db_impl {
    use crate::models::review::Review;
    use rusqlite::{params, Connection, Error};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tracing::{debug, error, info};


    /// Append-only store for submitted reviews.
    #[derive(Debug, Clone)]
    pub struct Database {
        conn: Arc<Mutex<Connection>>,
    }

    impl Database {
        // Create a new database connection
        pub fn new(db_path: &str) -> Result<Self, Error> {
            let conn = Connection::open(db_path)?;
            info!("Database connection established at: {}", db_path);
            Ok(Database {
                conn: Arc::new(Mutex::new(conn)),
            })
        }

        // Create the database schema
        pub async fn create_schema(&self) -> Result<(), Error> {
            let conn = self.conn.lock().await;

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS reviews (
                    id INTEGER PRIMARY KEY,
                    text TEXT NOT NULL,
                    pred_sentiment TEXT NOT NULL
                        CHECK (pred_sentiment IN ('positive', 'negative')),
                    pred_rating INTEGER NOT NULL,
                    model TEXT NOT NULL,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );",
            )
            .map_err(|e| {
                error!("Failed creating reviews table: {}", e);
                e
            })?;
            Ok(())
        }

        // Insert one review in its own transaction and return its row id
        pub async fn insert_review(&self, review: &Review) -> Result<i64, Error> {
            let mut conn = self.conn.lock().await;
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO reviews (text, pred_sentiment, pred_rating, model)
                VALUES (?, ?, ?, ?)",
                params![
                    &review.text,
                    review.pred_sentiment.as_str(),
                    review.pred_rating,
                    &review.model
                ],
            )?;
            let id = tx.last_insert_rowid();

            tx.commit()?;
            debug!("[DB] Review {} stored: {}", id, review.preview());
            Ok(id)
        }

        pub async fn count_reviews(&self) -> Result<i64, Error> {
            let conn = self.conn.lock().await;
            conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
        }
    }
}

pub use db_impl::Database;
