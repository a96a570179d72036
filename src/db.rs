use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{postgres::PgPoolOptions, types::Json, Executor, Pool, Postgres, Row};
use uuid::Uuid;

use crate::entities::{Booking, Driver, Station};
use crate::error::{invalid_input_error, not_found_error, Error};
use crate::store::{BookingStore, DriverRegistry, StationDirectory};

type Database = Postgres;

/// Document-style PostgreSQL store: every record lives in a JSONB `data`
/// column, with the fields we filter on mirrored into real columns.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::connect", skip(db_uri))]
    pub async fn connect(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        Self::new(pool).await
    }

    #[tracing::instrument(name = "PgStore::new", skip_all)]
    pub async fn new(pool: Pool<Database>) -> Result<Self, Error> {
        // TODO: move this to sqlx migrations once the schema settles
        pool.execute("CREATE TABLE IF NOT EXISTS stations (seq BIGSERIAL, id VARCHAR PRIMARY KEY, data JSONB NOT NULL)")
            .await?;

        pool.execute("CREATE TABLE IF NOT EXISTS drivers (seq BIGSERIAL, id VARCHAR PRIMARY KEY, available BOOLEAN NOT NULL, data JSONB NOT NULL)")
            .await?;

        pool.execute("CREATE TABLE IF NOT EXISTS bookings (id UUID PRIMARY KEY, passenger_id VARCHAR NOT NULL, driver_id VARCHAR, status VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS bookings_passenger_id_idx ON bookings (passenger_id)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS bookings_driver_id_idx ON bookings (driver_id)")
            .await?;

        Ok(Self { pool })
    }

    async fn fetch_bookings(&self, column: &str, id: &str) -> Result<Vec<Booking>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT data FROM bookings WHERE {} = $1 ORDER BY created_at ASC",
            column
        );

        let mut results = conn.fetch(sqlx::query(&query).bind(id));
        let mut bookings = vec![];

        while let Some(row) = results.try_next().await? {
            let Json(booking): Json<Booking> = row.try_get("data")?;
            bookings.push(booking);
        }

        Ok(bookings)
    }
}

#[async_trait]
impl DriverRegistry for PgStore {
    #[tracing::instrument(skip(self))]
    async fn find_available_drivers(&self) -> Result<Vec<Driver>, Error> {
        let mut conn = self.pool.acquire().await?;

        let mut results =
            conn.fetch(sqlx::query("SELECT data FROM drivers WHERE available ORDER BY seq ASC"));
        let mut drivers = vec![];

        while let Some(row) = results.try_next().await? {
            let Json(driver): Json<Driver> = row.try_get("data")?;
            drivers.push(driver);
        }

        Ok(drivers)
    }

    #[tracing::instrument(skip(self))]
    async fn find_driver(&self, id: &str) -> Result<Option<Driver>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM drivers WHERE id = $1").bind(id))
            .await?;

        match maybe_result {
            Some(result) => {
                let Json(driver): Json<Driver> = result.try_get("data")?;
                Ok(Some(driver))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn save_driver(&self, driver: &Driver) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO drivers (id, available, data) VALUES ($1, $2, $3)
                 ON CONFLICT (id) DO UPDATE SET available = EXCLUDED.available, data = EXCLUDED.data",
            )
            .bind(&driver.id)
            .bind(driver.available)
            .bind(Json(driver)),
        )
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StationDirectory for PgStore {
    #[tracing::instrument(skip(self))]
    async fn find_station(&self, id: &str) -> Result<Option<Station>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM stations WHERE id = $1").bind(id))
            .await?;

        match maybe_result {
            Some(result) => {
                let Json(station): Json<Station> = result.try_get("data")?;
                Ok(Some(station))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_stations(&self) -> Result<Vec<Station>, Error> {
        let mut conn = self.pool.acquire().await?;

        let mut results = conn.fetch(sqlx::query("SELECT data FROM stations ORDER BY seq ASC"));
        let mut stations = vec![];

        while let Some(row) = results.try_next().await? {
            let Json(station): Json<Station> = row.try_get("data")?;
            stations.push(station);
        }

        Ok(stations)
    }

    #[tracing::instrument(skip(self))]
    async fn insert_station(&self, station: &Station) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "INSERT INTO stations (id, data) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
                )
                .bind(&station.id)
                .bind(Json(station)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(invalid_input_error());
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_station(&self, id: &str) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(sqlx::query("DELETE FROM stations WHERE id = $1").bind(id))
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO bookings (id, passenger_id, driver_id, status, created_at, data) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&booking.id)
            .bind(&booking.passenger_id)
            .bind(&booking.driver_id)
            .bind(booking.status.name())
            .bind(&booking.created_at)
            .bind(Json(booking)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        // driver and passenger are fixed at creation, only the document and status move
        let result = conn
            .execute(
                sqlx::query("UPDATE bookings SET status = $2, data = $3 WHERE id = $1")
                    .bind(&booking.id)
                    .bind(booking.status.name())
                    .bind(Json(booking)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error());
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM bookings WHERE id = $1").bind(&id))
            .await?;

        match maybe_result {
            Some(result) => {
                let Json(booking): Json<Booking> = result.try_get("data")?;
                Ok(Some(booking))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_bookings_by_passenger(&self, passenger_id: &str) -> Result<Vec<Booking>, Error> {
        self.fetch_bookings("passenger_id", passenger_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_bookings_by_driver(&self, driver_id: &str) -> Result<Vec<Booking>, Error> {
        self.fetch_bookings("driver_id", driver_id).await
    }
}
