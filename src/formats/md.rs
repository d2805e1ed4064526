use crate::error::CError;
use crate::frame::{EnergyTriple, Ion, MdFrame};
use log::warn;
use nalgebra::Matrix3;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::str::SplitWhitespace;

/// Reader for the CASTEP `.md` trajectory format.
///
/// The file is a sequence of blocks separated by blank lines, optionally
/// preceded by a `BEGIN header` / `END header` preamble. The first line
/// of a block is the bare timestep time; every other line ends in a
/// `<-- TAG` marker identifying the quantity it carries.
#[derive(Default)]
pub struct MDFormat {
    /// Index of the next block to be read, for error reporting.
    pub step: usize,
}

const TAG_MARKER: &str = "<--";

fn next_float(tokens: &mut SplitWhitespace) -> Result<f64, CError> {
    Ok(tokens.next().ok_or(CError::MissingToken)?.parse()?)
}

fn row3(body: &str) -> Result<[f64; 3], CError> {
    let mut tokens = body.split_whitespace();
    Ok([
        next_float(&mut tokens)?,
        next_float(&mut tokens)?,
        next_float(&mut tokens)?,
    ])
}

fn matrix_from_rows(rows: &[[f64; 3]]) -> Matrix3<f64> {
    Matrix3::new(
        rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
        rows[2][1], rows[2][2],
    )
}

/// An `R`/`V`/`F` line: species symbol, per-species ion index, 3 floats.
fn ion_entry(body: &str) -> Result<(String, usize, [f64; 3]), CError> {
    let mut tokens = body.split_whitespace();
    let symbol = tokens.next().ok_or(CError::MissingToken)?.to_string();
    let index: usize = tokens.next().ok_or(CError::MissingToken)?.parse()?;
    let values = [
        next_float(&mut tokens)?,
        next_float(&mut tokens)?,
        next_float(&mut tokens)?,
    ];
    Ok((symbol, index, values))
}

impl MDFormat {
    /// Reads a single frame, returning `None` at end-of-file.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O or parsing error occurs, or if the
    /// block is structurally incomplete (missing or mismatched tags).
    pub fn read(&mut self, reader: &mut BufReader<File>) -> Result<Option<MdFrame>, CError> {
        let mut line = String::new();

        // Find the time line, skipping blank lines and the header.
        let time = loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == "BEGIN header" {
                Self::skip_header(reader)?;
                continue;
            }
            if trimmed.contains(TAG_MARKER) {
                return Err(CError::GenericError(format!(
                    "tagged line where a time line was expected at step {}",
                    self.step
                )));
            }
            break trimmed.parse::<f64>()?;
        };

        let mut frame = MdFrame {
            time,
            ..Default::default()
        };
        let mut h_rows: Vec<[f64; 3]> = Vec::new();
        let mut hv_rows: Vec<[f64; 3]> = Vec::new();
        let mut s_rows: Vec<[f64; 3]> = Vec::new();
        let mut n_velocities = 0;
        let mut n_forces = 0;
        let mut saw_energy = false;
        let mut saw_temperature = false;

        loop {
            line.clear();
            // EOF terminates the last block just like a blank line does.
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            let Some((body, tag)) = trimmed.split_once(TAG_MARKER) else {
                warn!("step {}: skipping untagged line: {trimmed}", self.step);
                continue;
            };
            let body = body.trim();

            match tag.trim() {
                "E" => {
                    let mut tokens = body.split_whitespace();
                    frame.energy = EnergyTriple {
                        hamiltonian: next_float(&mut tokens)?,
                        potential: next_float(&mut tokens)?,
                        kinetic: next_float(&mut tokens)?,
                    };
                    saw_energy = true;
                }
                "T" => {
                    frame.temperature = next_float(&mut body.split_whitespace())?;
                    saw_temperature = true;
                }
                "P" => frame.pressure = next_float(&mut body.split_whitespace())?,
                "h" => h_rows.push(row3(body)?),
                "hv" => hv_rows.push(row3(body)?),
                "S" => s_rows.push(row3(body)?),
                "R" => {
                    let (symbol, index, position) = ion_entry(body)?;
                    frame.ions.push(Ion {
                        symbol,
                        index,
                        position,
                        ..Default::default()
                    });
                }
                "V" => {
                    self.fill_ion_entry(&mut frame, body, "V", n_velocities)?;
                    n_velocities += 1;
                }
                "F" => {
                    self.fill_ion_entry(&mut frame, body, "F", n_forces)?;
                    n_forces += 1;
                }
                unknown => warn!("step {}: skipping unknown tag `{unknown}`", self.step),
            }
        }

        if !saw_energy {
            return Err(CError::BlockMismatch {
                tag: "E",
                step: self.step,
                expected: 1,
                got: 0,
            });
        }
        if !saw_temperature {
            return Err(CError::BlockMismatch {
                tag: "T",
                step: self.step,
                expected: 1,
                got: 0,
            });
        }
        self.check_block(&frame, &h_rows, &hv_rows, &s_rows, n_velocities, n_forces)?;
        frame.cell = matrix_from_rows(&h_rows);
        if !hv_rows.is_empty() {
            frame.cell_velocity = matrix_from_rows(&hv_rows);
        }
        if !s_rows.is_empty() {
            frame.stress = matrix_from_rows(&s_rows);
        }

        self.step += 1;
        Ok(Some(frame))
    }

    /// Reads the next frame, treating end-of-file as an error.
    pub fn read_next(&mut self, reader: &mut BufReader<File>) -> Result<MdFrame, CError> {
        let step = self.step;
        self.read(reader)?.ok_or(CError::UnexpectedEof { step })
    }

    /// Advances past one block, returning the byte offset after it.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs or the header is unterminated.
    pub fn forward(&self, reader: &mut BufReader<File>) -> Result<Option<u64>, CError> {
        let mut line = String::new();
        let mut in_block = false;
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return if in_block {
                    Ok(Some(reader.stream_position()?))
                } else {
                    Ok(None)
                };
            }
            let trimmed = line.trim();
            if trimmed == "BEGIN header" {
                Self::skip_header(reader)?;
                continue;
            }
            if trimmed.is_empty() {
                if in_block {
                    return Ok(Some(reader.stream_position()?));
                }
                continue;
            }
            in_block = true;
        }
    }

    fn skip_header(reader: &mut BufReader<File>) -> Result<(), CError> {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(CError::GenericError(
                    "header without a matching `END header`".to_string(),
                ));
            }
            if line.trim() == "END header" {
                return Ok(());
            }
        }
    }

    /// Applies a `V` or `F` entry to the ion it belongs to, checking that
    /// the ion list built from the `R` entries agrees with it.
    fn fill_ion_entry(
        &self,
        frame: &mut MdFrame,
        body: &str,
        tag: &'static str,
        entry: usize,
    ) -> Result<(), CError> {
        let (symbol, index, values) = ion_entry(body)?;
        if entry >= frame.ions.len() {
            return Err(CError::BlockMismatch {
                tag,
                step: self.step,
                expected: frame.ions.len(),
                got: entry + 1,
            });
        }
        let ion = &mut frame.ions[entry];
        if ion.symbol != symbol || ion.index != index {
            return Err(CError::IonMismatch {
                tag,
                step: self.step,
                entry,
            });
        }
        match tag {
            "V" => ion.velocity = values,
            _ => ion.force = values,
        }
        Ok(())
    }

    fn check_block(
        &self,
        frame: &MdFrame,
        h_rows: &[[f64; 3]],
        hv_rows: &[[f64; 3]],
        s_rows: &[[f64; 3]],
        n_velocities: usize,
        n_forces: usize,
    ) -> Result<(), CError> {
        let step = self.step;
        let expect = |tag, expected, got| {
            if expected == got {
                Ok(())
            } else {
                Err(CError::BlockMismatch {
                    tag,
                    step,
                    expected,
                    got,
                })
            }
        };

        expect("h", 3, h_rows.len())?;
        if !hv_rows.is_empty() {
            expect("hv", 3, hv_rows.len())?;
        }
        if !s_rows.is_empty() {
            expect("S", 3, s_rows.len())?;
        }
        if frame.ions.is_empty() {
            return Err(CError::BlockMismatch {
                tag: "R",
                step,
                expected: 1,
                got: 0,
            });
        }
        expect("V", frame.ions.len(), n_velocities)?;
        expect("F", frame.ions.len(), n_forces)?;
        Ok(())
    }
}
