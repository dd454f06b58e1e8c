use crate::core::forcefield::params::ParamTable;
use crate::core::models::system::MeshSystem;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Interface for reading and writing a mesh system together with its per-type
/// area-conservation parameters.
pub trait MeshFormat {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a mesh system and its parameter table from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the described mesh is inconsistent.
    fn read_from(reader: &mut impl BufRead) -> Result<(MeshSystem, ParamTable), Self::Error>;

    /// Writes a mesh system and its parameter table.
    ///
    /// Only particles with a local copy are written; the system is expected to hold the
    /// whole mesh.
    fn write_to(
        system: &MeshSystem,
        params: &ParamTable,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(MeshSystem, ParamTable), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(
        system: &MeshSystem,
        params: &ParamTable,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(system, params, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
