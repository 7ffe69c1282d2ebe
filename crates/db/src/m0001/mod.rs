mod documents;

use sqlx_migrator::vec_box;

pub struct Migration;

sqlx_migrator::sqlite_migration!(
    Migration,
    "recipebox",
    "m0001",
    vec_box![],
    vec_box![
        documents::CreateTable,
        documents::CreateUk1,
        documents::CreateIdx1
    ]
);
