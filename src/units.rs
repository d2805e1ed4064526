use crate::error::CError;
use std::fmt;
use std::str::FromStr;

// CODATA 2018 conversion factors out of Hartree atomic units.
const BOHR_TO_ANGSTROM: f64 = 0.529177210903;
const HARTREE_TO_EV: f64 = 27.211386245988;
const AUT_TO_PS: f64 = 2.4188843265857e-5;
const AU_VELOCITY_TO_ANGSTROM_PS: f64 = BOHR_TO_ANGSTROM / AUT_TO_PS;
const AU_FORCE_TO_NEWTON: f64 = 8.2387234983e-8;
const AU_FORCE_TO_EV_ANGSTROM: f64 = HARTREE_TO_EV / BOHR_TO_ANGSTROM;
const AU_PRESSURE_TO_EV_ANGSTROM3: f64 =
    HARTREE_TO_EV / (BOHR_TO_ANGSTROM * BOHR_TO_ANGSTROM * BOHR_TO_ANGSTROM);
const AU_TEMPERATURE_TO_K: f64 = 3.1577502480407e5;

/// Physical dimension of a trajectory quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Velocity,
    Force,
    Energy,
    Pressure,
    Temperature,
    Time,
}

/// Named unit schemes for the output file.
///
/// `Castep` is the identity scheme (Hartree atomic units, as stored in
/// the `.md` file). `MdAnalysis` uses newtons for forces because
/// MDAnalysis wants kJ/(mol*angstrom) and treats `mol` as dimensioned;
/// `Electronic` differs from it only in using eV/angstrom instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnitSystem {
    #[default]
    MdAnalysis,
    Castep,
    Electronic,
}

impl UnitSystem {
    /// Unit label written verbatim to the dataset `unit` attribute.
    pub fn label(&self, dimension: Dimension) -> &'static str {
        use Dimension::*;
        match self {
            UnitSystem::MdAnalysis => match dimension {
                Length => "angstrom",
                Velocity => "angstrom/ps",
                Force => "N",
                Energy => "eV",
                Pressure => "eV / angstrom^3",
                Temperature => "K",
                Time => "ps",
            },
            UnitSystem::Castep => match dimension {
                Length => "bohr",
                Velocity => "bohr / atomic_unit_of_time",
                Force => "hartree / bohr",
                Energy => "hartree",
                Pressure => "hartree / bohr^3",
                Temperature => "atomic_unit_of_temperature",
                Time => "atomic_unit_of_time",
            },
            UnitSystem::Electronic => match dimension {
                Length => "angstrom",
                Velocity => "angstrom / ps",
                Force => "eV / angstrom",
                Energy => "eV",
                Pressure => "eV / angstrom^3",
                Temperature => "K",
                Time => "ps",
            },
        }
    }

    /// Units of this scheme per one atomic unit of `dimension`.
    fn factor(&self, dimension: Dimension) -> f64 {
        use Dimension::*;
        match self {
            UnitSystem::Castep => 1.0,
            UnitSystem::MdAnalysis => match dimension {
                Length => BOHR_TO_ANGSTROM,
                Velocity => AU_VELOCITY_TO_ANGSTROM_PS,
                Force => AU_FORCE_TO_NEWTON,
                Energy => HARTREE_TO_EV,
                Pressure => AU_PRESSURE_TO_EV_ANGSTROM3,
                Temperature => AU_TEMPERATURE_TO_K,
                Time => AUT_TO_PS,
            },
            UnitSystem::Electronic => match dimension {
                Length => BOHR_TO_ANGSTROM,
                Velocity => AU_VELOCITY_TO_ANGSTROM_PS,
                Force => AU_FORCE_TO_EV_ANGSTROM,
                Energy => HARTREE_TO_EV,
                Pressure => AU_PRESSURE_TO_EV_ANGSTROM3,
                Temperature => AU_TEMPERATURE_TO_K,
                Time => AUT_TO_PS,
            },
        }
    }

    /// Converts a value read from the `.md` file (atomic units) into
    /// this scheme.
    pub fn from_atomic(&self, value: f64, dimension: Dimension) -> f64 {
        value * self.factor(dimension)
    }
}

/// Converts `value` of `dimension` between two unit schemes.
pub fn convert(value: f64, dimension: Dimension, from: UnitSystem, to: UnitSystem) -> f64 {
    value / from.factor(dimension) * to.factor(dimension)
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitSystem::MdAnalysis => "MDANALYSIS",
            UnitSystem::Castep => "CASTEP",
            UnitSystem::Electronic => "ELECTRONIC",
        };
        write!(f, "{name}")
    }
}

impl FromStr for UnitSystem {
    type Err = CError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MDANALYSIS" => Ok(UnitSystem::MdAnalysis),
            "CASTEP" => Ok(UnitSystem::Castep),
            "ELECTRONIC" => Ok(UnitSystem::Electronic),
            _ => Err(CError::UnknownUnitSystem(s.to_string())),
        }
    }
}
