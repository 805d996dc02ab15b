//! NumPy `.npy` (format 1.0) serialization of feature matrices.
//!
//! Matrices are written as `<f4`, C order, shape `(n_mels, n_frames)`, so
//! `numpy.load` returns the same array the training scripts expect.

use crate::error::{Error, Result};
use crate::features::FeatureMatrix;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;

/// Write a matrix to `path`.
pub fn write_npy(path: &Path, matrix: &FeatureMatrix) -> Result<()> {
    let io_err = |e: std::io::Error| Error::NpyWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&encode_header(matrix.n_mels(), matrix.n_frames()))
        .map_err(io_err)?;
    for v in matrix.as_slice() {
        writer.write_all(&v.to_le_bytes()).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

/// Read a 2-D `<f4` C-order array written by [`write_npy`] (or numpy).
pub fn read_npy(path: &Path) -> Result<FeatureMatrix> {
    let invalid = |reason: String| Error::NpyRead {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| invalid(e.to_string()))?;
    let mut reader = BufReader::new(file);

    let mut preamble = [0u8; 10];
    reader
        .read_exact(&mut preamble)
        .map_err(|e| invalid(e.to_string()))?;
    if &preamble[..6] != MAGIC {
        return Err(invalid("bad magic".to_string()));
    }
    if preamble[6] != 1 {
        return Err(invalid(format!("unsupported format version {}", preamble[6])));
    }

    let header_len = usize::from(u16::from_le_bytes([preamble[8], preamble[9]]));
    let mut header = vec![0u8; header_len];
    reader
        .read_exact(&mut header)
        .map_err(|e| invalid(e.to_string()))?;
    let header = String::from_utf8_lossy(&header);

    if !header.contains("'descr': '<f4'") {
        return Err(invalid(format!("expected <f4 data, header: {header}")));
    }
    if header.contains("'fortran_order': True") {
        return Err(invalid("fortran order is not supported".to_string()));
    }
    let (rows, cols) =
        parse_shape(&header).ok_or_else(|| invalid(format!("bad shape: {header}")))?;

    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| invalid(e.to_string()))?;
    if bytes.len() != rows * cols * 4 {
        return Err(invalid(format!(
            "expected {} data bytes, found {}",
            rows * cols * 4,
            bytes.len()
        )));
    }

    let data = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    FeatureMatrix::new(rows, cols, data)
}

/// Magic, version, length, and the space-padded header dict.
fn encode_header(rows: usize, cols: usize) -> Vec<u8> {
    let dict = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    // Preamble (10 bytes) + dict + padding + '\n' is a multiple of HEADER_ALIGN.
    let unpadded = MAGIC.len() + 4 + dict.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header_len);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.resize(out.len() + padding, b' ');
    out.push(b'\n');
    out
}

fn parse_shape(header: &str) -> Option<(usize, usize)> {
    let start = header.find("'shape': (")? + "'shape': (".len();
    let end = start + header[start..].find(')')?;
    let dims: Vec<usize> = header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match dims.as_slice() {
        [rows, cols] => Some((*rows, *cols)),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_header_is_aligned() {
        let header = encode_header(128, 130);
        assert_eq!(header.len() % HEADER_ALIGN, 0);
        assert_eq!(&header[..6], MAGIC);
        assert_eq!(header.last(), Some(&b'\n'));
        let text = String::from_utf8_lossy(&header[10..]);
        assert!(text.contains("'shape': (128, 130)"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.npy");
        let matrix = FeatureMatrix::new(2, 3, vec![0.0, -80.0, -3.25, 1.5, 2.0, -0.5]).unwrap();

        write_npy(&path, &matrix).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), encode_header(2, 3).len() + 6 * 4);

        let read = read_npy(&path).unwrap();
        assert_eq!(read, matrix);
    }

    #[test]
    fn test_read_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.npy");
        std::fs::write(&path, b"not a numpy file at all").unwrap();
        assert!(matches!(read_npy(&path), Err(Error::NpyRead { .. })));
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("{'shape': (4, 5), }"), Some((4, 5)));
        assert_eq!(parse_shape("{'shape': (4,), }"), None);
    }
}
