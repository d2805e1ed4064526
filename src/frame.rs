use std::ops::{Index, IndexMut};

use nalgebra::Matrix3;

/// A single ion record as CASTEP reports it.
///
/// `index` is the per-species ordinal from the `.md` file (`O 1`, `H 1`,
/// `H 2`, ...), not a global atom index. All quantities are in atomic
/// units as read.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ion {
    pub symbol: String,
    pub index: usize,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub force: [f64; 3],
}

/// The three values of an `<-- E` line, in file order.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EnergyTriple {
    pub hamiltonian: f64,
    pub potential: f64,
    pub kinetic: f64,
}

/// One timestep of a CASTEP molecular-dynamics run.
///
/// Pressure, cell velocity and stress are only written by CASTEP for
/// some run types; they stay zero when the block does not carry them.
#[derive(Debug, Default, Clone)]
pub struct MdFrame {
    pub time: f64,
    pub energy: EnergyTriple,
    pub temperature: f64,
    pub pressure: f64,
    /// Lattice vectors as rows, in bohr.
    pub cell: Matrix3<f64>,
    pub cell_velocity: Matrix3<f64>,
    pub stress: Matrix3<f64>,
    pub ions: Vec<Ion>,
}

impl MdFrame {
    pub fn size(&self) -> usize {
        self.ions.len()
    }

    /// Species symbols in file order, one per ion.
    pub fn symbols(&self) -> Vec<&str> {
        self.ions.iter().map(|ion| ion.symbol.as_str()).collect()
    }

    /// `true` when `other` describes the same ions in the same order.
    pub fn same_ions(&self, other: &MdFrame) -> bool {
        self.ions.len() == other.ions.len()
            && self
                .ions
                .iter()
                .zip(other.ions.iter())
                .all(|(a, b)| a.symbol == b.symbol && a.index == b.index)
    }
}

impl Index<usize> for MdFrame {
    type Output = Ion;

    fn index(&self, index: usize) -> &Self::Output {
        &self.ions[index]
    }
}

impl IndexMut<usize> for MdFrame {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.ions[index]
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn ion(symbol: &str, index: usize, x: f64) -> Ion {
        Ion {
            symbol: symbol.to_string(),
            index,
            position: [x, 0.0, 0.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_frame_indexing() {
        let mut frame = MdFrame::default();
        frame.ions.push(ion("O", 1, 1.0));
        frame.ions.push(ion("H", 1, 4.0));

        assert_eq!(frame[0].symbol, "O");
        assert_eq!(frame[1].symbol, "H");
        assert_approx_eq!(frame[0].position[0], 1.0);
        assert_approx_eq!(frame[1].position[0], 4.0);

        frame[0].position[0] = 10.0;
        assert_approx_eq!(frame[0].position[0], 10.0);
    }

    #[test]
    #[should_panic]
    fn test_frame_indexing_out_of_bounds() {
        let frame = MdFrame::default();
        let _ = frame[0];
    }

    #[test]
    fn test_same_ions() {
        let mut a = MdFrame::default();
        a.ions.push(ion("O", 1, 0.0));
        a.ions.push(ion("H", 1, 0.0));
        let mut b = a.clone();
        assert!(a.same_ions(&b));

        b.ions[1].index = 2;
        assert!(!a.same_ions(&b));

        b.ions.pop();
        assert!(!a.same_ions(&b));
    }

    #[test]
    fn test_symbols() {
        let mut frame = MdFrame::default();
        frame.ions.push(ion("O", 1, 0.0));
        frame.ions.push(ion("H", 1, 0.0));
        frame.ions.push(ion("H", 2, 0.0));
        assert_eq!(frame.symbols(), vec!["O", "H", "H"]);
        assert_eq!(frame.size(), 3);
    }
}
