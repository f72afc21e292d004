use chrono::Utc;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Result, TransactionBehavior};

use crate::core::config::validation::MAX_NAME_LENGTH;
use crate::core::error::{AppError, AppResult};
use crate::voting::category::Category;
use crate::voting::error::VoteError;

/// Структура, представляющая участницу конкурса в базе данных.
#[derive(Debug, Clone)]
pub struct Contestant {
    /// Идентификатор записи (никогда не переиспользуется)
    pub id: i64,
    /// ФИО участницы
    pub name: String,
    /// Номинация (категория голосования)
    pub category: Category,
    /// Ключ фотографии в blob-хранилище
    pub photo_ref: String,
    /// Текущее количество голосов; меняется только механикой голосования
    pub votes: i64,
    /// Момент добавления (RFC 3339)
    pub created_at: String,
}

/// Aggregate contest numbers for the admin statistics panel.
#[derive(Debug, Clone)]
pub struct ContestStats {
    pub total_contestants: i64,
    pub total_votes: i64,
    /// Contestant count per category
    pub per_category: Vec<(Category, i64)>,
    /// Global top entries: (name, votes, category)
    pub top: Vec<(String, i64, Category)>,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and runs schema migrations.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    // busy_timeout bounds how long a writer waits for a BEGIN IMMEDIATE
    // lock before surfacing a storage error instead of hanging.
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(std::time::Duration::from_secs(30)));
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let mut conn = pool.get()?;
    super::migrations::run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

fn contestant_from_row(row: &rusqlite::Row<'_>) -> Result<Contestant> {
    let category_id: i64 = row.get(2)?;
    let category = category_from_column(category_id, 2)?;
    Ok(Contestant {
        id: row.get(0)?,
        name: row.get(1)?,
        category,
        photo_ref: row.get(3)?,
        votes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn category_from_column(id: i64, column: usize) -> Result<Category> {
    Category::from_id(id).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Integer,
            format!("unknown category id {id}").into(),
        )
    })
}

const CONTESTANT_COLUMNS: &str = "id, name, category, photo_ref, votes, created_at";

/// Добавляет участницу в указанную категорию.
///
/// Счётчик голосов новой записи всегда 0. Пустое (после обрезки пробелов)
/// или слишком длинное имя отклоняется до какой-либо записи в БД.
///
/// # Returns
///
/// Идентификатор созданной записи.
pub fn create_contestant(conn: &DbConnection, name: &str, category: Category, photo_ref: &str) -> AppResult<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("contestant name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "contestant name longer than {MAX_NAME_LENGTH} characters"
        )));
    }

    conn.execute(
        "INSERT INTO contestants (name, category, photo_ref, votes, created_at) VALUES (?1, ?2, ?3, 0, ?4)",
        params![name, category.id(), photo_ref, Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Получает участницу по идентификатору.
pub fn get_contestant(conn: &DbConnection, id: i64) -> Result<Option<Contestant>> {
    conn.query_row(
        &format!("SELECT {CONTESTANT_COLUMNS} FROM contestants WHERE id = ?1"),
        params![id],
        contestant_from_row,
    )
    .optional()
}

/// Участницы категории, отсортированные по голосам (убывание);
/// при равенстве голосов — в порядке добавления.
///
/// `limit`/`offset` задают страницу; `limit = None` возвращает всю категорию.
pub fn list_by_category(
    conn: &DbConnection,
    category: Category,
    limit: Option<usize>,
    offset: usize,
) -> Result<Vec<Contestant>> {
    let mut out = Vec::new();
    match limit {
        Some(limit) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONTESTANT_COLUMNS} FROM contestants WHERE category = ?1 \
                 ORDER BY votes DESC, id ASC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![category.id(), limit as i64, offset as i64], contestant_from_row)?;
            for row in rows {
                out.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONTESTANT_COLUMNS} FROM contestants WHERE category = ?1 \
                 ORDER BY votes DESC, id ASC"
            ))?;
            let rows = stmt.query_map(params![category.id()], contestant_from_row)?;
            for row in rows {
                out.push(row?);
            }
        }
    }
    Ok(out)
}

/// Количество участниц в категории.
pub fn count_by_category(conn: &DbConnection, category: Category) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM contestants WHERE category = ?1",
        params![category.id()],
        |row| row.get(0),
    )
}

/// Возвращает идентификатор участницы, за которую голосовал пользователь,
/// либо `None`, если активного голоса нет.
pub fn get_vote_for_user(conn: &DbConnection, user_id: i64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT contestant_id FROM votes WHERE user_id = ?1 LIMIT 1",
        params![user_id],
        |row| row.get(0),
    )
    .optional()
}

/// Records a vote: at most one live vote per user, counter bumped in the
/// same transaction.
///
/// The existing-vote check, the counter increment and the vote-row insert
/// run under one `BEGIN IMMEDIATE` transaction, so the database serializes
/// two concurrent casts from the same user: exactly one commits, the other
/// observes `AlreadyVoted`. A cast racing a contestant delete sees zero
/// updated rows and fails with `ContestantNotFound` instead of bumping a
/// counter for a row that is about to vanish.
pub fn cast_vote(conn: &mut DbConnection, user_id: i64, contestant_id: i64) -> Result<(), VoteError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT contestant_id FROM votes WHERE user_id = ?1 LIMIT 1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        // Dropping the transaction rolls it back; nothing was written yet.
        return Err(VoteError::AlreadyVoted);
    }

    let updated = tx.execute(
        "UPDATE contestants SET votes = votes + 1 WHERE id = ?1",
        params![contestant_id],
    )?;
    if updated == 0 {
        return Err(VoteError::ContestantNotFound(contestant_id));
    }

    tx.execute(
        "INSERT INTO votes (user_id, contestant_id) VALUES (?1, ?2)",
        params![user_id, contestant_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Retracts the user's vote and decrements the matching counter, both in
/// one transaction. `NotVoted` when the user has no live vote, so a double
/// retract yields Ok then NotVoted and the counter never goes negative.
pub fn retract_vote(conn: &mut DbConnection, user_id: i64) -> Result<(), VoteError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let contestant_id: Option<i64> = tx
        .query_row(
            "SELECT contestant_id FROM votes WHERE user_id = ?1 LIMIT 1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(contestant_id) = contestant_id else {
        return Err(VoteError::NotVoted);
    };

    tx.execute("DELETE FROM votes WHERE user_id = ?1", params![user_id])?;
    tx.execute(
        "UPDATE contestants SET votes = votes - 1 WHERE id = ?1",
        params![contestant_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Удаляет участницу вместе со всеми голосами за неё.
///
/// Строка участницы и строки голосов исчезают в одной транзакции; счётчики
/// других участниц не трогаются. Возвращает `photo_ref` удалённой записи,
/// чтобы вызывающая сторона убрала blob после коммита, либо `None`, если
/// записи с таким id нет.
pub fn delete_contestant(conn: &mut DbConnection, id: i64) -> Result<Option<String>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let photo_ref: Option<String> = tx
        .query_row("SELECT photo_ref FROM contestants WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    let Some(photo_ref) = photo_ref else {
        return Ok(None);
    };

    tx.execute("DELETE FROM votes WHERE contestant_id = ?1", params![id])?;
    tx.execute("DELETE FROM contestants WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(Some(photo_ref))
}

/// Читает значение настройки по ключу.
pub fn get_setting(conn: &DbConnection, key: &str) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| {
        row.get(0)
    })
    .optional()
}

/// Сохраняет значение настройки (перезаписывая существующее).
pub fn set_setting(conn: &DbConnection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Собирает агрегированную статистику конкурса для панели администратора.
pub fn contest_stats(conn: &DbConnection) -> Result<ContestStats> {
    let total_contestants: i64 = conn.query_row("SELECT COUNT(*) FROM contestants", [], |row| row.get(0))?;
    let total_votes: i64 = conn.query_row("SELECT COUNT(*) FROM votes", [], |row| row.get(0))?;

    let mut per_category = Vec::new();
    let mut stmt = conn.prepare("SELECT category, COUNT(*) FROM contestants GROUP BY category ORDER BY category")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (category_id, count) = row?;
        per_category.push((category_from_column(category_id, 0)?, count));
    }

    let mut top = Vec::new();
    let mut stmt = conn.prepare("SELECT name, votes, category FROM contestants ORDER BY votes DESC, id ASC LIMIT 5")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
    })?;
    for row in rows {
        let (name, votes, category_id) = row?;
        top.push((name, votes, category_from_column(category_id, 2)?));
    }

    Ok(ContestStats {
        total_contestants,
        total_votes,
        per_category,
        top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_pool() -> (TempDir, DbPool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    #[test]
    fn create_contestant_rejects_empty_name() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        let err = create_contestant(&conn, "   ", Category::Weekly, "a.jpg").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(count_by_category(&conn, Category::Weekly).unwrap(), 0);
    }

    #[test]
    fn create_contestant_trims_name() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        let id = create_contestant(&conn, "  Анна Иванова  ", Category::Weekly, "a.jpg").unwrap();
        let contestant = get_contestant(&conn, id).unwrap().unwrap();
        assert_eq!(contestant.name, "Анна Иванова");
        assert_eq!(contestant.votes, 0);
    }

    #[test]
    fn ordering_breaks_ties_by_insertion() {
        let (_dir, pool) = test_pool();
        let mut conn = get_connection(&pool).unwrap();

        let first = create_contestant(&conn, "First", Category::Weekly, "1.jpg").unwrap();
        let second = create_contestant(&conn, "Second", Category::Weekly, "2.jpg").unwrap();
        let third = create_contestant(&conn, "Third", Category::Weekly, "3.jpg").unwrap();
        cast_vote(&mut conn, 100, third).unwrap();

        let listed = list_by_category(&conn, Category::Weekly, None, 0).unwrap();
        let ids: Vec<i64> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![third, first, second]);
    }

    #[test]
    fn settings_roundtrip_overwrites() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        assert_eq!(get_setting(&conn, "channel_id").unwrap(), None);
        set_setting(&conn, "channel_id", "-1001").unwrap();
        set_setting(&conn, "channel_id", "-1002").unwrap();
        assert_eq!(get_setting(&conn, "channel_id").unwrap().as_deref(), Some("-1002"));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (_dir, pool) = test_pool();
        let mut conn = get_connection(&pool).unwrap();

        let first = create_contestant(&conn, "Gone", Category::Weekly, "g.jpg").unwrap();
        delete_contestant(&mut conn, first).unwrap();
        let second = create_contestant(&conn, "Next", Category::Weekly, "n.jpg").unwrap();
        assert!(second > first);
    }
}
