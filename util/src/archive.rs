//! Struct archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::Path;
use std::fs::{File, OpenOptions};
use csv::WriterBuilder;
pub use csv::Writer;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("The archiver has not been initialised")]
    NotInitialised,

    #[error("Cannot open the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot write the record: {0}")]
    CsvError(csv::Error)
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a csv.
///
/// Records written to an archive must be flat structs, since CSV cannot
/// represent nesting. Archivers shall be setup in `arch_init`, structs which
/// have not been initialised for archiving shall write nothing.
pub trait Archived {
    /// Open the archive files for this struct within the session.
    fn arch_init(&mut self, session: &Session) -> Result<(), ArchiveError>;

    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        // Create any parent directories
        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(ArchiveError::FileError)?;
        }
        
        // Open the file in append mode, creating it if it does not exist
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(session_path)
            .map_err(ArchiveError::FileError)?;

        let w = WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer: Some(w)
        })
    }

    /// Return `true` if the archiver has an open file.
    pub fn is_init(&self) -> bool {
        self.writer.is_some()
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: serde::Serialize>(
        &mut self, record: T
    ) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::CsvError)?;
                w.flush().map_err(ArchiveError::FileError)?
            },
            None => return Err(ArchiveError::NotInitialised)
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Record {
        time_s: f64,
        speed_mmps: f64
    }

    #[test]
    fn test_serialise() {
        let root = std::env::temp_dir().join("teleop_archive_test");
        let session = Session {
            session_root: root.clone(),
            arch_root: root.join("arch"),
            log_file_path: root.join("test.log")
        };

        let mut uninit = Archiver::default();
        assert!(!uninit.is_init());
        assert!(matches!(
            uninit.serialise(Record { time_s: 0.0, speed_mmps: 0.0 }),
            Err(ArchiveError::NotInitialised)
        ));

        let mut arch = Archiver::from_path(&session, "module/records.csv").unwrap();
        assert!(arch.is_init());
        arch.serialise(Record { time_s: 0.1, speed_mmps: 150.0 }).unwrap();

        let contents = std::fs::read_to_string(
            session.arch_root.join("module/records.csv")).unwrap();
        assert!(contents.contains("time_s,speed_mmps"));
        assert!(contents.contains("0.1,150.0"));

        std::fs::remove_dir_all(&root).ok();
    }
}
