use crate::error::CError;
use crate::h5md::{self, Author};
use crate::trajectory::Trajectory;
use crate::units::UnitSystem;
use log::info;
use std::path::Path;

/// Options for a single conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub author: Author,
    pub units: UnitSystem,
}

/// Converts a CASTEP `.md` trajectory into an h5md file.
///
/// The whole trajectory is read before anything is written, so a source
/// file that fails validation (for example one whose atom count varies
/// between frames) produces no output file.
///
/// # Errors
///
/// Returns an error if the source cannot be parsed, the ion list is not
/// constant along the trajectory, the trajectory is empty, or writing
/// the HDF5 file fails.
pub fn md_to_h5md(source: &Path, output: &Path, options: &ConvertOptions) -> Result<(), CError> {
    let mut trajectory = Trajectory::open(source)?;
    let frames = trajectory.read_all()?;
    let first = frames.first().ok_or(CError::EmptyTrajectory)?;
    info!(
        "read {} frames of {} ions from {}",
        frames.len(),
        first.size(),
        source.display()
    );

    h5md::write_h5md(output, &frames, options.units, &options.author)?;
    info!("wrote {}", output.display());
    Ok(())
}
