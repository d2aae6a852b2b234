use std::fs::File;
use std::io::BufRead;
use std::path::Path;
use crate::error::TraceError;
use crate::trace::{read_trace, TraceEntry};

pub fn get_reader(file: File) -> Result<impl BufRead, TraceError> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        // 4096 is the standard block size (or a multiple of it) on most systems
        const BUFFER_SIZE: usize = 16 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file on unix systems, traces are read once, front to back
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // Safety: the map is only read, and only lives as long as the reader
        unsafe {
            let m = Mmap::map(&file)?;
            m.advise(Advice::Sequential)?;
            Ok(Cursor::new(m))
        }
    }
}

/// Opens and parses a trace file
pub fn open_trace(path: impl AsRef<Path>) -> Result<Vec<TraceEntry>, TraceError> {
    let file = File::open(path)?;
    read_trace(get_reader(file)?)
}
