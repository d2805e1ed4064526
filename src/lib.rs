//! Convert CASTEP `.md` trajectories to the h5md interchange format.
//!
//! The `.md` file is read in one linear pass, validated (the ion list
//! must be identical in every frame), converted into the requested unit
//! scheme and written out as an HDF5 file following the h5md layout.
//!
//! See <https://www.nongnu.org/h5md/> for the h5md specification.

pub mod convert;
pub mod error;
pub mod formats;
pub mod frame;
pub mod h5md;
pub mod trajectory;
pub mod units;

pub use convert::{md_to_h5md, ConvertOptions};
pub use error::CError;
