//! Connections: one exclusive writer and a pool of readers
//!
//! File-backed stores run in WAL mode so readers work from a snapshot while
//! a write transaction is in flight. In-memory stores have no shared file,
//! so their reads go through the writer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};

use rusqlite::{Connection, OpenFlags};

use super::schema;
use crate::error::{Error, Result};

/// Upper bound on reader connections
pub const MAX_READERS: usize = 16;

fn poisoned<E: std::fmt::Display>(what: &str, err: E) -> Error {
    Error::LockPoisoned(format!("{}: {}", what, err))
}

/// Read-only connections, idle ones preferred in round-robin order
pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    pub fn open(path: &Path, size: usize) -> Result<Self> {
        let size = size.clamp(1, MAX_READERS);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.execute_batch(schema::PRAGMAS)?;
            connections.push(Mutex::new(conn));
        }
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    /// Run `f` on the first idle reader, starting at the round-robin cursor.
    /// Blocks on the cursor's reader only when every reader is busy.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let len = self.connections.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % len;
        for offset in 0..len {
            match self.connections[(start + offset) % len].try_lock() {
                Ok(guard) => return f(&guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(e)) => return Err(poisoned("reader", e)),
            }
        }

        let guard = self.connections[start]
            .lock()
            .map_err(|e| poisoned("reader", e))?;
        f(&guard)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }
}

/// The writer connection plus optional readers
pub struct ConnectionPool {
    writer: Mutex<Connection>,
    readers: Option<ReadPool>,
    path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open the writer, create the schema, then open `read_pool_size` readers
    pub fn open(path: &Path, read_pool_size: usize) -> Result<Self> {
        let writer = Connection::open(path)?;
        writer.execute_batch(schema::WRITER_PRAGMAS)?;
        writer.execute_batch(schema::PRAGMAS)?;
        writer.execute_batch(schema::SCHEMA)?;

        let readers = ReadPool::open(path, read_pool_size)?;
        Ok(Self {
            writer: Mutex::new(writer),
            readers: Some(readers),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let writer = Connection::open_in_memory()?;
        writer.execute_batch(schema::PRAGMAS)?;
        writer.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            writer: Mutex::new(writer),
            readers: None,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn reader_count(&self) -> usize {
        self.readers.as_ref().map(ReadPool::size).unwrap_or(0)
    }

    pub fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match &self.readers {
            Some(readers) => readers.with_conn(f),
            None => {
                let guard = self.writer.lock().map_err(|e| poisoned("writer", e))?;
                f(&guard)
            }
        }
    }

    pub fn with_writer<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.writer.lock().map_err(|e| poisoned("writer", e))?;
        f(&mut guard)
    }
}
