use log::{debug, error, info};
use rusqlite::{params, Connection, Result, Row};
use std::path::Path;
use std::time::Instant;

/// One answered question, as written by the round controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub money: u32,
}

/// A stored row of the `game_progress` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub question_num: i64,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub money: u32,
    pub answered_at: String,
}

impl ProgressRecord {
    pub fn is_correct(&self) -> bool {
        self.user_answer == self.correct_answer
    }

    fn from_row(row: &Row) -> Result<ProgressRecord> {
        Ok(ProgressRecord {
            question_num: row.get(0)?,
            question: row.get(1)?,
            user_answer: row.get(2)?,
            correct_answer: row.get(3)?,
            money: row.get(4)?,
            answered_at: row.get(5)?,
        })
    }
}

/// Write side of the progress log. The round controller only appends.
pub trait ProgressLog {
    fn log_answer(&mut self, entry: &LogEntry) -> Result<()>;
}

pub struct ProgressDb {
    conn: Connection,
}

impl ProgressDb {
    /// Opens the database and drops any progress left from a previous game.
    pub fn open_fresh(src: &Path) -> Result<Self> {
        let conn = open_db(src)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    /// Opens the database without touching the recorded progress.
    pub fn open_existing(src: &Path) -> Result<Self> {
        Ok(Self {
            conn: open_db(src)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn fetch_progress(&self) -> Result<Vec<ProgressRecord>> {
        let mut statement = self.conn.prepare(
            "SELECT question_num, question, user_answer, correct_answer, money, answered_at \
             FROM game_progress ORDER BY question_num",
        )?;
        let rows = statement.query_map([], |row| ProgressRecord::from_row(row))?;

        rows.collect()
    }

    pub fn close(self) -> Result<()> {
        close_db(self.conn)
    }
}

impl ProgressLog for ProgressDb {
    fn log_answer(&mut self, entry: &LogEntry) -> Result<()> {
        match self.conn.execute(
            "INSERT INTO game_progress(question, user_answer, correct_answer, money) \
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.question, entry.user_answer, entry.correct_answer, entry.money],
        ) {
            Ok(_) => {
                debug!("[DB] Logged answer {:?} for ${}", entry.user_answer, entry.money);
                Ok(())
            }
            Err(err) => {
                error!("[DB] Error while logging answer: {:?}", err);
                Err(err)
            }
        }
    }
}

pub(crate) fn open_db(src: &Path) -> Result<Connection> {
    let now = Instant::now();
    let db = Connection::open(src)?;
    debug!("[DB] Opening took {} ms.", now.elapsed().as_millis());
    Ok(db)
}

pub(crate) fn close_db(connection: Connection) -> Result<()> {
    info!("[DB] Closing Database");
    match connection.close() {
        Ok(_) => Ok(()),
        Err((conn, _)) => {
            error!("[DB] Cannot close connection. Retrying...");
            conn.close().map_err(|(_, err)| err)
        }
    }
}

fn init_db(conn: &Connection) -> Result<()> {
    info!("[DB INIT] Resetting table game_progress");
    conn.execute("DROP TABLE IF EXISTS game_progress", ())?;
    conn.execute(
        "CREATE TABLE game_progress (
              question_num INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              question TEXT NOT NULL,
              user_answer TEXT NOT NULL,
              correct_answer TEXT NOT NULL,
              money INTEGER NOT NULL,
              answered_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        (),
    )?;
    info!("[DB INIT] Created table game_progress");

    Ok(())
}
