use crate::error::CError;
use crate::frame::{Ion, MdFrame};
use crate::units::{Dimension, UnitSystem};
use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File};
use nalgebra::Matrix3;
use ndarray::{arr1, Array1, Array3};
use std::path::Path;

/// Author metadata recorded under `/h5md/author`.
#[derive(Debug, Clone)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Default for Author {
    fn default() -> Self {
        Author {
            name: "Unknown".to_string(),
            email: "Unknown".to_string(),
        }
    }
}

fn varlen(s: &str) -> Result<VarLenUnicode, CError> {
    Ok(s.parse::<VarLenUnicode>()?)
}

fn set_unit(dataset: &Dataset, units: UnitSystem, dimension: Dimension) -> Result<(), CError> {
    dataset
        .new_attr::<VarLenUnicode>()
        .create("unit")?
        .write_scalar(&varlen(units.label(dimension))?)?;
    Ok(())
}

/// Hard-links `box/edges/{step,time}` into a sibling element group, as
/// the h5md layout prescribes.
fn link_steps(file: &File, group_path: &str) -> Result<(), CError> {
    file.link_hard("particles/box/edges/step", &format!("{group_path}/step"))?;
    file.link_hard("particles/box/edges/time", &format!("{group_path}/time"))?;
    Ok(())
}

/// Species ids (one per ion, by first appearance) and the id-to-symbol table.
fn species_table(frame: &MdFrame) -> (Vec<i32>, Vec<&str>) {
    let mut labels: Vec<&str> = Vec::new();
    let mut ids = Vec::with_capacity(frame.size());
    for ion in &frame.ions {
        let id = match labels.iter().position(|known| *known == ion.symbol) {
            Some(id) => id,
            None => {
                labels.push(ion.symbol.as_str());
                labels.len() - 1
            }
        };
        ids.push(id as i32);
    }
    (ids, labels)
}

fn write_header(file: &File, author: &Author) -> Result<(), CError> {
    let h5md = file.create_group("h5md")?;
    h5md.new_attr_builder()
        .with_data(&arr1(&[1i32, 1]))
        .create("version")?;

    let auth = h5md.create_group("author")?;
    auth.new_attr::<VarLenUnicode>()
        .create("name")?
        .write_scalar(&varlen(&author.name)?)?;
    auth.new_attr::<VarLenUnicode>()
        .create("email")?
        .write_scalar(&varlen(&author.email)?)?;

    let creator = h5md.create_group("creator")?;
    creator
        .new_attr::<VarLenUnicode>()
        .create("name")?
        .write_scalar(&varlen(env!("CARGO_PKG_NAME"))?)?;
    creator
        .new_attr::<VarLenUnicode>()
        .create("version")?
        .write_scalar(&varlen(env!("CARGO_PKG_VERSION"))?)?;
    Ok(())
}

/// Writes `frames` to `path` as an h5md file.
///
/// All frames must share the first frame's ion list; callers go through
/// [`crate::trajectory::Trajectory::read_all`], which enforces that.
/// Values are converted from atomic units into `units` before writing.
///
/// # Errors
///
/// Returns an error if `frames` is empty or any HDF5 operation fails.
pub fn write_h5md(
    path: &Path,
    frames: &[MdFrame],
    units: UnitSystem,
    author: &Author,
) -> Result<(), CError> {
    let first = frames.first().ok_or(CError::EmptyTrajectory)?;
    let n_steps = frames.len();
    let n_atoms = first.size();

    let file = File::create(path)?;
    write_header(&file, author)?;

    let particles = file.create_group("particles")?;

    let (ids, labels) = species_table(first);
    let species = particles
        .new_dataset_builder()
        .with_data(&Array1::from_vec(ids))
        .create("species")?;
    let label_values = labels
        .iter()
        .map(|label| varlen(label))
        .collect::<Result<Vec<_>, _>>()?;
    species
        .new_attr_builder()
        .with_data(&Array1::from_vec(label_values))
        .create("labels")?;

    let simulation_box = particles.create_group("box")?;
    simulation_box
        .new_attr::<i32>()
        .create("dimension")?
        .write_scalar(&3i32)?;
    simulation_box
        .new_attr::<VarLenUnicode>()
        .create("boundary")?
        .write_scalar(&varlen("periodic")?)?;

    let edges = simulation_box.create_group("edges")?;
    let steps = Array1::from_iter(1..=n_steps as i32);
    edges
        .new_dataset_builder()
        .with_data(&steps)
        .create("step")?;
    let times = Array1::from_iter(
        frames
            .iter()
            .map(|frame| units.from_atomic(frame.time, Dimension::Time)),
    );
    let time_dataset = edges
        .new_dataset_builder()
        .with_data(&times)
        .create("time")?;
    set_unit(&time_dataset, units, Dimension::Time)?;

    let mut cells = Array3::<f64>::zeros((n_steps, 3, 3));
    for (i, frame) in frames.iter().enumerate() {
        for row in 0..3 {
            for col in 0..3 {
                cells[[i, row, col]] = units.from_atomic(frame.cell[(row, col)], Dimension::Length);
            }
        }
    }
    let cell_dataset = edges
        .new_dataset_builder()
        .with_data(&cells)
        .create("value")?;
    set_unit(&cell_dataset, units, Dimension::Length)?;

    let ion_blocks: [(&str, Dimension, fn(&Ion) -> [f64; 3]); 3] = [
        ("position", Dimension::Length, |ion| ion.position),
        ("velocity", Dimension::Velocity, |ion| ion.velocity),
        ("force", Dimension::Force, |ion| ion.force),
    ];
    for (name, dimension, accessor) in ion_blocks {
        let group = particles.create_group(name)?;
        link_steps(&file, &format!("particles/{name}"))?;

        let mut values = Array3::<f64>::zeros((n_steps, n_atoms, 3));
        for (i, frame) in frames.iter().enumerate() {
            for (j, ion) in frame.ions.iter().enumerate() {
                let entry = accessor(ion);
                for (col, component) in entry.iter().enumerate() {
                    values[[i, j, col]] = units.from_atomic(*component, dimension);
                }
            }
        }
        let dataset = group.new_dataset_builder().with_data(&values).create("value")?;
        set_unit(&dataset, units, dimension)?;
    }

    let observables = file.create_group("observables")?;

    let scalar_blocks: [(&str, Dimension, fn(&MdFrame) -> f64); 5] = [
        ("hamiltonian_energy", Dimension::Energy, |frame| {
            frame.energy.hamiltonian
        }),
        ("potential_energy", Dimension::Energy, |frame| {
            frame.energy.potential
        }),
        ("kinetic_energy", Dimension::Energy, |frame| {
            frame.energy.kinetic
        }),
        ("pressure", Dimension::Pressure, |frame| frame.pressure),
        ("temperature", Dimension::Temperature, |frame| {
            frame.temperature
        }),
    ];
    for (name, dimension, accessor) in scalar_blocks {
        let group = observables.create_group(name)?;
        link_steps(&file, &format!("observables/{name}"))?;

        let values = Array1::from_iter(
            frames
                .iter()
                .map(|frame| units.from_atomic(accessor(frame), dimension)),
        );
        let dataset = group.new_dataset_builder().with_data(&values).create("value")?;
        set_unit(&dataset, units, dimension)?;
    }

    let matrix_blocks: [(&str, Dimension, fn(&MdFrame) -> Matrix3<f64>); 2] = [
        ("lattice_velocity", Dimension::Velocity, |frame| {
            frame.cell_velocity
        }),
        ("stress", Dimension::Pressure, |frame| frame.stress),
    ];
    for (name, dimension, accessor) in matrix_blocks {
        let group = observables.create_group(name)?;
        link_steps(&file, &format!("observables/{name}"))?;

        let mut values = Array3::<f64>::zeros((n_steps, 3, 3));
        for (i, frame) in frames.iter().enumerate() {
            let matrix = accessor(frame);
            for row in 0..3 {
                for col in 0..3 {
                    values[[i, row, col]] = units.from_atomic(matrix[(row, col)], dimension);
                }
            }
        }
        let dataset = group.new_dataset_builder().with_data(&values).create("value")?;
        set_unit(&dataset, units, dimension)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::EnergyTriple;
    use assert_approx_eq::assert_approx_eq;
    use tempfile::tempdir;

    fn ion(symbol: &str, index: usize, x: f64) -> Ion {
        Ion {
            symbol: symbol.to_string(),
            index,
            position: [x, 0.0, 0.0],
            velocity: [0.5, 0.0, 0.0],
            force: [0.25, 0.0, 0.0],
        }
    }

    fn frame(time: f64) -> MdFrame {
        MdFrame {
            time,
            energy: EnergyTriple {
                hamiltonian: -1.0,
                potential: -1.5,
                kinetic: 0.5,
            },
            temperature: 1e-3,
            pressure: 2e-5,
            cell: Matrix3::identity() * 10.0,
            cell_velocity: Matrix3::zeros(),
            stress: Matrix3::zeros(),
            ions: vec![ion("Na", 1, 1.0), ion("Cl", 1, 2.0)],
        }
    }

    #[test]
    fn layout_and_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.h5md");
        let frames = vec![frame(0.0), frame(40.0)];
        let author = Author {
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
        };
        write_h5md(&path, &frames, UnitSystem::Castep, &author).unwrap();

        let file = File::open(&path).unwrap();

        let version = file
            .group("h5md")
            .unwrap()
            .attr("version")
            .unwrap()
            .read_1d::<i32>()
            .unwrap();
        assert_eq!(version.as_slice().unwrap(), &[1, 1]);

        let auth = file.group("h5md/author").unwrap();
        let name = auth
            .attr("name")
            .unwrap()
            .read_scalar::<VarLenUnicode>()
            .unwrap();
        assert_eq!(name.as_str(), "Ada");
        let email = auth
            .attr("email")
            .unwrap()
            .read_scalar::<VarLenUnicode>()
            .unwrap();
        assert_eq!(email.as_str(), "ada@example.org");

        let creator = file.group("h5md/creator").unwrap();
        let creator_name = creator
            .attr("name")
            .unwrap()
            .read_scalar::<VarLenUnicode>()
            .unwrap();
        assert_eq!(creator_name.as_str(), env!("CARGO_PKG_NAME"));

        let species = file.dataset("particles/species").unwrap();
        assert_eq!(
            species.read_1d::<i32>().unwrap().as_slice().unwrap(),
            &[0, 1]
        );
        let labels = species
            .attr("labels")
            .unwrap()
            .read_1d::<VarLenUnicode>()
            .unwrap();
        let labels: Vec<&str> = labels.iter().map(|label| label.as_str()).collect();
        assert_eq!(labels, vec!["Na", "Cl"]);

        let simulation_box = file.group("particles/box").unwrap();
        let dimension = simulation_box
            .attr("dimension")
            .unwrap()
            .read_scalar::<i32>()
            .unwrap();
        assert_eq!(dimension, 3);

        let positions = file.dataset("particles/position/value").unwrap();
        assert_eq!(positions.shape(), vec![2, 2, 3]);
        let positions = positions.read_dyn::<f64>().unwrap();
        assert_approx_eq!(positions[[0, 0, 0]], 1.0);
        assert_approx_eq!(positions[[1, 1, 0]], 2.0);

        // step/time are hard links into box/edges
        let steps = file.dataset("particles/position/step").unwrap();
        assert_eq!(steps.read_1d::<i32>().unwrap().as_slice().unwrap(), &[1, 2]);
        let times = file.dataset("observables/temperature/time").unwrap();
        let times = times.read_1d::<f64>().unwrap();
        assert_approx_eq!(times[1], 40.0);

        let temperature = file.dataset("observables/temperature/value").unwrap();
        let unit = temperature
            .attr("unit")
            .unwrap()
            .read_scalar::<VarLenUnicode>()
            .unwrap();
        assert_eq!(unit.as_str(), "atomic_unit_of_temperature");

        let stress = file.dataset("observables/stress/value").unwrap();
        assert_eq!(stress.shape(), vec![2, 3, 3]);
    }

    #[test]
    fn values_are_converted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("converted.h5md");
        let frames = vec![frame(0.0)];
        write_h5md(
            &path,
            &frames,
            UnitSystem::MdAnalysis,
            &Author::default(),
        )
        .unwrap();

        let file = File::open(&path).unwrap();
        let positions = file
            .dataset("particles/position/value")
            .unwrap()
            .read_dyn::<f64>()
            .unwrap();
        assert_approx_eq!(positions[[0, 0, 0]], 0.529177210903, 1e-9);

        let cell = file
            .dataset("particles/box/edges/value")
            .unwrap()
            .read_dyn::<f64>()
            .unwrap();
        assert_approx_eq!(cell[[0, 0, 0]], 5.29177210903, 1e-9);

        let unit = file
            .dataset("particles/position/value")
            .unwrap()
            .attr("unit")
            .unwrap()
            .read_scalar::<VarLenUnicode>()
            .unwrap();
        assert_eq!(unit.as_str(), "angstrom");
    }

    #[test]
    fn default_author_is_unknown() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anon.h5md");
        write_h5md(&path, &[frame(0.0)], UnitSystem::Castep, &Author::default()).unwrap();

        let file = File::open(&path).unwrap();
        let auth = file.group("h5md/author").unwrap();
        let name = auth
            .attr("name")
            .unwrap()
            .read_scalar::<VarLenUnicode>()
            .unwrap();
        assert_eq!(name.as_str(), "Unknown");
    }

    #[test]
    fn empty_trajectory_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.h5md");
        let result = write_h5md(&path, &[], UnitSystem::Castep, &Author::default());
        assert!(matches!(result, Err(CError::EmptyTrajectory)));
    }
}
