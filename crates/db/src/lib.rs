use sqlx_migrator::{Info, Migrator};

mod lock;
mod m0001;
mod store;
pub mod table;

pub use lock::{KeyGuard, KeyedLocks};
pub use store::{Document, Filter, Page, Store, Stored, optimistic};

pub fn migrator() -> Result<Migrator<sqlx::Sqlite>, sqlx_migrator::Error> {
    let mut migrator = Migrator::default();
    migrator.add_migrations(vec![Box::new(m0001::Migration)])?;

    Ok(migrator)
}
