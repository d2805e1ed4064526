use crate::error::CError;
use crate::formats::md::MDFormat;
use crate::frame::MdFrame;
use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::Path;

/// A CASTEP `.md` trajectory file opened for reading.
pub struct Trajectory {
    /// Number of frames in the file.
    pub size: usize,

    strategy: MDFormat,
    reader: BufReader<File>,
    frame_positions: Vec<u64>,
}

impl Trajectory {
    /// Opens a `.md` file and scans the frame offsets.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not carry the `.md` extension
    /// or the file cannot be read.
    pub fn open(path: &Path) -> Result<Self, CError> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if !ext.eq_ignore_ascii_case("md") {
            return Err(CError::UnsupportedFileFormat(ext.to_string()));
        }

        let file = File::open(path).map_err(CError::IoError)?;
        let mut reader = BufReader::new(file);
        let strategy = MDFormat::default();
        let frame_positions = Self::scan_all(&mut reader, &strategy)?;
        let size = frame_positions.len() - 1;

        Ok(Trajectory {
            size,
            strategy,
            reader,
            frame_positions,
        })
    }

    /// Reads the next frame, returning `None` once the file is exhausted.
    pub fn read(&mut self) -> Result<Option<MdFrame>, CError> {
        self.strategy.read(&mut self.reader)
    }

    /// Reads the frame at `index`, seeking as needed.
    pub fn read_at(&mut self, index: usize) -> Result<MdFrame, CError> {
        if index >= self.size {
            return Err(CError::GenericError(format!(
                "frame index {index} out of bounds ({} frames)",
                self.size
            )));
        }
        self.reader
            .seek(std::io::SeekFrom::Start(self.frame_positions[index]))?;
        self.strategy.step = index;
        self.strategy.read_next(&mut self.reader)
    }

    /// Reads every frame from the start of the file and checks that the
    /// ion list does not change along the trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`CError::VariableAtomCount`] if any frame's ion count
    /// differs from the first frame's, and [`CError::InconsistentIons`]
    /// if the counts agree but species or ordering do not. A trajectory
    /// that fails either check cannot be laid out as fixed-shape
    /// datasets, so no partial output is produced.
    pub fn read_all(&mut self) -> Result<Vec<MdFrame>, CError> {
        self.reader.rewind()?;
        self.strategy.step = 0;

        let mut frames: Vec<MdFrame> = Vec::with_capacity(self.size);
        while let Some(frame) = self.read()? {
            if let Some(first) = frames.first() {
                if frame.size() != first.size() {
                    return Err(CError::VariableAtomCount {
                        step: frames.len(),
                        expected: first.size(),
                        got: frame.size(),
                    });
                }
                if !first.same_ions(&frame) {
                    return Err(CError::InconsistentIons { step: frames.len() });
                }
            }
            frames.push(frame);
        }
        Ok(frames)
    }

    fn scan_all(reader: &mut BufReader<File>, strategy: &MDFormat) -> Result<Vec<u64>, CError> {
        let mut frame_positions = vec![0];
        while let Some(pos) = strategy.forward(reader)? {
            frame_positions.push(pos);
        }
        reader.rewind()?;
        Ok(frame_positions)
    }
}
