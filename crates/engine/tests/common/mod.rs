#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineBuilder, Group, InviteCodeGenerator};
use migration::MigratorTrait;
use uuid::Uuid;

pub async fn database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_from(Engine::builder()).await
}

pub async fn engine_from(builder: EngineBuilder) -> (Engine, DatabaseConnection) {
    let db = database().await;
    let engine = builder.database(db.clone()).build().await.unwrap();
    (engine, db)
}

/// Engine over a fresh SQLite file under `target/test_dbs`, so several
/// pooled connections share the same data.
pub async fn engine_with_file_db() -> (Engine, DatabaseConnection, PathBuf) {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db, path)
}

pub async fn execute(db: &DatabaseConnection, sql: &str) {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        sql.to_string(),
    ))
    .await
    .unwrap();
}

pub async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

/// Creates a group owned by `owner` and enrolls `others` through its invite
/// code.
pub async fn group_with_members(engine: &Engine, owner: &str, others: &[&str]) -> Group {
    let group = engine.create_group("Flat 3B", None, owner).await.unwrap();
    for user in others {
        engine.join_group(&group.invite_code, user).await.unwrap();
    }
    group
}

/// Hands out a fixed sequence of codes, repeating the last one forever.
#[derive(Debug)]
pub struct FixedCodes {
    codes: Vec<&'static str>,
    next: Mutex<usize>,
}

impl FixedCodes {
    pub fn new(codes: &[&'static str]) -> Self {
        Self {
            codes: codes.to_vec(),
            next: Mutex::new(0),
        }
    }
}

impl InviteCodeGenerator for FixedCodes {
    fn generate(&self) -> String {
        let mut next = self.next.lock().unwrap();
        let code = self.codes[(*next).min(self.codes.len() - 1)];
        *next += 1;
        code.to_string()
    }
}
