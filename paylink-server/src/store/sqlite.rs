//! SQLite-based storage implementation

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use paylink_core::validation::{NewClient, NewContact, NewPayment};
use paylink_core::search::SEARCH_LIMIT;
use paylink_core::{PageRequest, PaymentStatus, ReferenceId, SearchQuery};
use rusqlite::types::Type;
use rusqlite::functions::FunctionFlags;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

use super::{
    Client, ClientId, ClientLink, ClientStore, ClientWithLink, ContactStore, ContactSubmission,
    LegacyLink, LinkStore, NewClientLink, Payment, PaymentStore, StoreResult,
};
use crate::error::ApiError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const CONTACT_COLUMNS: &str = "id, name, email, phone, subject, message, created_at";
const PAYMENT_COLUMNS: &str = "id, client_name, project_name, client_id, amount, due_date, \
     receipt_url, reference_id, status, created_at, updated_at";
const CLIENT_COLUMNS: &str = "id, name, email, phone, company, created_at";
const LINK_COLUMNS: &str = "id, client_id, token, active, created_at, expires_at";
const LEGACY_COLUMNS: &str = "id, token, active, created_at, updated_at";

/// SQLite-backed store implementing every storage trait.
///
/// One connection is shared behind a mutex; each method holds the lock for a
/// single statement (or a count plus a page), so multi-step reads made by the
/// caller are not atomic with respect to each other.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    ///
    /// The schema is not touched; call [`SqliteStore::migrate`] before serving.
    pub fn open(path: &str) -> Result<Self, ApiError> {
        let conn = Connection::open(path).map_err(internal)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, ApiError> {
        let conn = Connection::open_in_memory().map_err(internal)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, ApiError> {
        // Enable foreign keys so deleting a client removes its links
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(internal)?;

        // SQLite's LIKE and lower() only fold ASCII
        conn.create_scalar_function(
            "unicode_lower",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
        )
        .map_err(internal)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ApiError::Internal("store connection lock poisoned".to_string()))
    }

    /// Bring the schema up to date and seed the legacy payment link.
    ///
    /// Safe to run on every start: tables are only created when missing and
    /// the legacy row is inserted only if its token is not present yet.
    pub fn migrate(&self, legacy_token: &str) -> Result<(), ApiError> {
        let conn = self.conn()?;
        let current_version = Self::get_schema_version(&conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(&conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(internal)?;

            tracing::info!("Database migrations complete");
        }

        let now = to_ts(Utc::now());
        let seeded = conn
            .execute(
                "INSERT OR IGNORE INTO payment_links (token, active, created_at, updated_at)
                 VALUES (?1, 1, ?2, ?2)",
                params![legacy_token, now],
            )
            .map_err(internal)?;
        if seeded > 0 {
            tracing::info!("Seeded legacy payment link");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(internal)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(internal)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ApiError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS contact_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                subject TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS payment_registrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client_name TEXT NOT NULL,
                project_name TEXT NOT NULL,
                client_id TEXT NOT NULL,
                amount REAL NOT NULL,
                due_date TEXT NOT NULL,
                receipt_url TEXT,
                reference_id TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'verified', 'rejected')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_payments_status ON payment_registrations(status);
            CREATE INDEX IF NOT EXISTS idx_payments_client_id ON payment_registrations(client_id);

            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                company TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS client_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
                token TEXT NOT NULL UNIQUE,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_client_links_client_id ON client_links(client_id);

            -- Legacy fixed payment link
            CREATE TABLE IF NOT EXISTS payment_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(internal)?;

        Ok(())
    }
}

fn internal(e: rusqlite::Error) -> ApiError {
    ApiError::Internal(e.to_string())
}

/// Extended result code of a failed statement, if SQLite reported one
fn extended_code(e: &rusqlite::Error) -> Option<i32> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
        _ => None,
    }
}

/// Timestamps are stored with fixed precision so string order is time order
fn to_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn ts_col(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn contact_from_row(row: &Row) -> rusqlite::Result<ContactSubmission> {
    Ok(ContactSubmission {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        subject: row.get(4)?,
        message: row.get(5)?,
        created_at: ts_col(row, 6)?,
    })
}

fn payment_from_row(row: &Row) -> rusqlite::Result<Payment> {
    let due_date: String = row.get(5)?;
    let status: String = row.get(8)?;
    Ok(Payment {
        id: row.get(0)?,
        client_name: row.get(1)?,
        project_name: row.get(2)?,
        client_id: row.get(3)?,
        amount: row.get(4)?,
        due_date: NaiveDate::parse_from_str(&due_date, "%Y-%m-%d")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        receipt_url: row.get(6)?,
        reference_id: row.get(7)?,
        status: status
            .parse::<PaymentStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
        created_at: ts_col(row, 9)?,
        updated_at: ts_col(row, 10)?,
    })
}

fn client_from_row(row: &Row) -> rusqlite::Result<Client> {
    Ok(Client {
        id: ClientId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        company: row.get(4)?,
        created_at: ts_col(row, 5)?,
    })
}

/// Read a link whose columns start at `offset`
fn link_from_row_at(row: &Row, offset: usize) -> rusqlite::Result<ClientLink> {
    Ok(ClientLink {
        id: row.get(offset)?,
        client_id: ClientId(row.get(offset + 1)?),
        token: row.get(offset + 2)?,
        active: row.get(offset + 3)?,
        created_at: ts_col(row, offset + 4)?,
        expires_at: ts_col(row, offset + 5)?,
    })
}

fn link_from_row(row: &Row) -> rusqlite::Result<ClientLink> {
    link_from_row_at(row, 0)
}

fn legacy_from_row(row: &Row) -> rusqlite::Result<LegacyLink> {
    Ok(LegacyLink {
        id: row.get(0)?,
        token: row.get(1)?,
        active: row.get(2)?,
        created_at: ts_col(row, 3)?,
        updated_at: ts_col(row, 4)?,
    })
}

impl ContactStore for SqliteStore {
    fn create_contact(&self, contact: &NewContact) -> StoreResult<ContactSubmission> {
        let conn = self.conn()?;

        conn.query_row(
            &format!(
                "INSERT INTO contact_submissions (name, email, phone, subject, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {CONTACT_COLUMNS}"
            ),
            params![
                contact.name,
                contact.email,
                contact.phone,
                contact.subject,
                contact.message,
                to_ts(Utc::now()),
            ],
            contact_from_row,
        )
        .map_err(internal)
    }

    fn list_contacts(&self) -> StoreResult<Vec<ContactSubmission>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contact_submissions ORDER BY created_at DESC, id DESC"
            ))
            .map_err(internal)?;

        let contacts = stmt
            .query_map([], contact_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(contacts)
    }
}

impl PaymentStore for SqliteStore {
    fn create_payment(
        &self,
        payment: &NewPayment,
        reference_id: &ReferenceId,
    ) -> StoreResult<Payment> {
        let conn = self.conn()?;
        let now = to_ts(Utc::now());

        conn.query_row(
            &format!(
                "INSERT INTO payment_registrations
                    (client_name, project_name, client_id, amount, due_date, receipt_url,
                     reference_id, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                 RETURNING {PAYMENT_COLUMNS}"
            ),
            params![
                payment.client_name,
                payment.project_name,
                payment.client_id,
                payment.amount,
                payment.due_date.format("%Y-%m-%d").to_string(),
                payment.receipt_url,
                reference_id.as_str(),
                PaymentStatus::default().as_str(),
                now,
            ],
            payment_from_row,
        )
        .map_err(|e| {
            if extended_code(&e) == Some(ffi::SQLITE_CONSTRAINT_UNIQUE) {
                return ApiError::ReferenceCollision;
            }
            internal(e)
        })
    }

    fn get_payment(&self, id: i64) -> StoreResult<Option<Payment>> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {PAYMENT_COLUMNS} FROM payment_registrations WHERE id = ?1"),
            params![id],
            payment_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn list_payments(
        &self,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> StoreResult<(Vec<Payment>, u64)> {
        let conn = self.conn()?;
        let status = status.map(|s| s.as_str());

        let total: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM payment_registrations WHERE (?1 IS NULL OR status = ?1)",
                params![status],
                |row| row.get(0),
            )
            .map_err(internal)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM payment_registrations
                 WHERE (?1 IS NULL OR status = ?1)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3"
            ))
            .map_err(internal)?;

        let payments = stmt
            .query_map(
                params![status, page.limit as i64, page.offset()],
                payment_from_row,
            )
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok((payments, total as u64))
    }

    fn set_payment_status(&self, id: i64, status: PaymentStatus) -> StoreResult<Payment> {
        let conn = self.conn()?;

        conn.query_row(
            &format!(
                "UPDATE payment_registrations SET status = ?1, updated_at = ?2 WHERE id = ?3
                 RETURNING {PAYMENT_COLUMNS}"
            ),
            params![status.as_str(), to_ts(Utc::now()), id],
            payment_from_row,
        )
        .optional()
        .map_err(internal)?
        .ok_or(ApiError::PaymentNotFound)
    }

    fn search_payments(&self, query: &SearchQuery) -> StoreResult<Vec<Payment>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(&format!(
                r"SELECT {PAYMENT_COLUMNS} FROM payment_registrations
                 WHERE unicode_lower(client_name) LIKE unicode_lower(?1) ESCAPE '\'
                    OR unicode_lower(project_name) LIKE unicode_lower(?1) ESCAPE '\'
                    OR unicode_lower(client_id) LIKE unicode_lower(?1) ESCAPE '\'
                    OR unicode_lower(reference_id) LIKE unicode_lower(?1) ESCAPE '\'
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2"
            ))
            .map_err(internal)?;

        let payments = stmt
            .query_map(
                params![query.like_pattern(), SEARCH_LIMIT as i64],
                payment_from_row,
            )
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(payments)
    }

    fn latest_payment_for_client(&self, client_id: ClientId) -> StoreResult<Option<Payment>> {
        let conn = self.conn()?;

        conn.query_row(
            &format!(
                "SELECT {PAYMENT_COLUMNS} FROM payment_registrations
                 WHERE client_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1"
            ),
            params![client_id.0.to_string()],
            payment_from_row,
        )
        .optional()
        .map_err(internal)
    }
}

impl ClientStore for SqliteStore {
    fn create_client(&self, client: &NewClient) -> StoreResult<Client> {
        let conn = self.conn()?;

        conn.query_row(
            &format!(
                "INSERT INTO clients (name, email, phone, company, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {CLIENT_COLUMNS}"
            ),
            params![
                client.name,
                client.email,
                client.phone,
                client.company,
                to_ts(Utc::now()),
            ],
            client_from_row,
        )
        .map_err(internal)
    }

    fn get_client(&self, client_id: ClientId) -> StoreResult<Option<Client>> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
            params![client_id.0],
            client_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn list_clients_with_current_link(
        &self,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<ClientWithLink>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.name, c.email, c.phone, c.company, c.created_at,
                        l.id, l.client_id, l.token, l.active, l.created_at, l.expires_at
                 FROM clients c
                 LEFT JOIN client_links l ON l.id = (
                     SELECT id FROM client_links
                     WHERE client_id = c.id AND active = 1 AND expires_at > ?1
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1
                 )
                 ORDER BY c.created_at DESC, c.id DESC",
            )
            .map_err(internal)?;

        let clients = stmt
            .query_map(params![to_ts(now)], |row| {
                let client = client_from_row(row)?;
                let link_id: Option<i64> = row.get(6)?;
                let current_link = match link_id {
                    Some(_) => Some(link_from_row_at(row, 6)?),
                    None => None,
                };
                Ok(ClientWithLink {
                    client,
                    current_link,
                })
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(clients)
    }

    fn delete_client(&self, client_id: ClientId) -> StoreResult<()> {
        let conn = self.conn()?;

        // Foreign keys with ON DELETE CASCADE remove the client's links
        let rows_affected = conn
            .execute("DELETE FROM clients WHERE id = ?1", params![client_id.0])
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(ApiError::ClientNotFound);
        }

        Ok(())
    }
}

impl LinkStore for SqliteStore {
    fn create_link(&self, link: &NewClientLink) -> StoreResult<ClientLink> {
        let conn = self.conn()?;

        conn.query_row(
            &format!(
                "INSERT INTO client_links (client_id, token, active, created_at, expires_at)
                 VALUES (?1, ?2, 1, ?3, ?4) RETURNING {LINK_COLUMNS}"
            ),
            params![
                link.client_id.0,
                link.token.as_str(),
                to_ts(link.window.created_at),
                to_ts(link.window.expires_at),
            ],
            link_from_row,
        )
        .map_err(|e| match extended_code(&e) {
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => ApiError::TokenCollision,
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => ApiError::ClientNotFound,
            _ => internal(e),
        })
    }

    fn get_link(&self, token: &str) -> StoreResult<Option<ClientLink>> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {LINK_COLUMNS} FROM client_links WHERE token = ?1"),
            params![token],
            link_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn set_link_active(&self, token: &str, active: bool) -> StoreResult<ClientLink> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("UPDATE client_links SET active = ?1 WHERE token = ?2 RETURNING {LINK_COLUMNS}"),
            params![active, token],
            link_from_row,
        )
        .optional()
        .map_err(internal)?
        .ok_or(ApiError::LinkNotFound)
    }

    fn list_links_for_client(&self, client_id: ClientId) -> StoreResult<Vec<ClientLink>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {LINK_COLUMNS} FROM client_links WHERE client_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ))
            .map_err(internal)?;

        let links = stmt
            .query_map(params![client_id.0], link_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(links)
    }

    fn get_legacy_link(&self, token: &str) -> StoreResult<Option<LegacyLink>> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {LEGACY_COLUMNS} FROM payment_links WHERE token = ?1"),
            params![token],
            legacy_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn set_legacy_link_active(&self, token: &str, active: bool) -> StoreResult<LegacyLink> {
        let conn = self.conn()?;

        conn.query_row(
            &format!(
                "UPDATE payment_links SET active = ?1, updated_at = ?2 WHERE token = ?3
                 RETURNING {LEGACY_COLUMNS}"
            ),
            params![active, to_ts(Utc::now()), token],
            legacy_from_row,
        )
        .optional()
        .map_err(internal)?
        .ok_or(ApiError::LinkNotFound)
    }
}
