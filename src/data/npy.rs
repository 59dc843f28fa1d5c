use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use ndarray::{ArrayD, Dimension, IxDyn, ShapeBuilder};
use ndarray_npy::{ReadNpyError, ReadNpyExt, WritableElement, WriteNpyExt};
use py_literal::Value as PyValue;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::{LoadError, LoadResult};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
/// numpy pads headers so the data section starts on this boundary.
const HEADER_ALIGN: usize = 64;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A `.npz` archive (zip of `.npy` files) opened for reading.
///
/// Arrays are addressed by key: the entry `x.npy` is key `x`, the way
/// `numpy.savez` names them.
pub struct NpzArchive<R: Read + Seek> {
    zip: ZipArchive<R>,
}

impl NpzArchive<File> {
    /// Open an archive on disk.
    pub fn open(path: &Path) -> LoadResult<Self> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::new(file)
    }
}

impl<R: Read + Seek> NpzArchive<R> {
    /// Wrap any seekable reader holding npz bytes.
    pub fn new(reader: R) -> LoadResult<Self> {
        let zip = ZipArchive::new(reader)
            .map_err(|e| LoadError::format(format!("not an npz archive: {e}")))?;
        Ok(NpzArchive { zip })
    }

    /// Array keys in archive order.
    pub fn keys(&self) -> Vec<String> {
        self.zip
            .file_names()
            .map(|name| name.strip_suffix(".npy").unwrap_or(name).to_string())
            .collect()
    }

    /// Fail with a format error naming the first key that is absent.
    pub fn require_keys(&self, keys: &[&str]) -> LoadResult<()> {
        for key in keys {
            self.entry_name(key)?;
        }
        Ok(())
    }

    /// Read a numeric array, widening any float or integer dtype to `f64`.
    pub fn float_array(&mut self, key: &str) -> LoadResult<ArrayD<f64>> {
        let bytes = self.entry_bytes(key)?;
        match read_widened(&bytes) {
            Ok(Some(array)) => Ok(array),
            Ok(None) => {
                let header = NpyHeader::parse(&bytes)?;
                Err(LoadError::format(format!(
                    "array '{key}' has dtype '{}', expected a numeric dtype",
                    header.descr
                )))
            }
            Err(err) => Err(LoadError::format(format!("cannot decode array '{key}': {err}"))),
        }
    }

    /// Read a string array (`U` or `S` dtype).
    pub fn text_array(&mut self, key: &str) -> LoadResult<ArrayD<String>> {
        let bytes = self.entry_bytes(key)?;
        let (header, data) = NpyHeader::split(&bytes)?;
        let dtype = TextDtype::parse(&header.descr).ok_or_else(|| {
            if header.descr.ends_with('O') {
                LoadError::format(format!(
                    "array '{key}' holds pickled Python objects; save it with a string dtype"
                ))
            } else {
                LoadError::format(format!(
                    "array '{key}' has dtype '{}', expected a string dtype",
                    header.descr
                ))
            }
        })?;
        log::debug!("array '{key}': dtype {} shape {:?}", header.descr, header.shape);

        let too_large =
            || LoadError::format(format!("array '{key}': shape {:?} is too large", header.shape));
        let count = header
            .shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(too_large)?;
        let item_size = dtype.item_size().ok_or_else(too_large)?;
        let expected = count.checked_mul(item_size).ok_or_else(too_large)?;
        if data.len() != expected {
            return Err(LoadError::format(format!(
                "array '{key}': expected {expected} data bytes, found {}",
                data.len()
            )));
        }
        let values = if item_size == 0 {
            vec![String::new(); count]
        } else {
            data.chunks_exact(item_size)
                .map(|item| dtype.decode(item))
                .collect::<Option<Vec<String>>>()
                .ok_or_else(|| LoadError::format(format!("array '{key}' contains invalid text")))?
        };

        let shape = IxDyn(&header.shape).set_f(header.fortran_order);
        ArrayD::from_shape_vec(shape, values)
            .map_err(|e| LoadError::format(format!("array '{key}': {e}")))
    }

    fn entry_name(&self, key: &str) -> LoadResult<String> {
        let with_ext = format!("{key}.npy");
        self.zip
            .file_names()
            .find(|name| *name == with_ext || *name == key)
            .map(str::to_string)
            .ok_or_else(|| LoadError::format(format!("archive is missing required key '{key}'")))
    }

    fn entry_bytes(&mut self, key: &str) -> LoadResult<Vec<u8>> {
        let name = self.entry_name(key)?;
        let mut entry = self
            .zip
            .by_name(&name)
            .map_err(|e| LoadError::format(format!("cannot open array '{key}': {e}")))?;
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| LoadError::format(format!("cannot read array '{key}': {e}")))?;
        Ok(bytes)
    }
}

/// Try each supported element type in turn; `None` when the dtype is not numeric.
fn read_widened(bytes: &[u8]) -> Result<Option<ArrayD<f64>>, ReadNpyError> {
    macro_rules! try_as {
        ($($ty:ty),+) => {
            $(
                match ArrayD::<$ty>::read_npy(bytes) {
                    Ok(array) => return Ok(Some(array.mapv(|v| v as f64))),
                    Err(ReadNpyError::WrongDescriptor(_)) => {}
                    Err(err) => return Err(err),
                }
            )+
        };
    }
    try_as!(f64, f32, i64, i32, i16, i8, u64, u32, u16, u8);
    Ok(None)
}

// ---------------------------------------------------------------------------
// .npy header
// ---------------------------------------------------------------------------

/// The python-literal dict at the start of every `.npy` file.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyHeader {
    pub descr: String,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl NpyHeader {
    /// Parse only the header.
    pub fn parse(bytes: &[u8]) -> LoadResult<Self> {
        Self::split(bytes).map(|(header, _)| header)
    }

    /// Parse the header and return it with the remaining data bytes.
    pub fn split(bytes: &[u8]) -> LoadResult<(Self, &[u8])> {
        if !bytes.starts_with(NPY_MAGIC) || bytes.len() < 10 {
            return Err(LoadError::format("entry is not a .npy array"));
        }
        let major = bytes[6];
        let (len, start) = match major {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 if bytes.len() >= 12 => (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            ),
            _ => return Err(LoadError::format(format!("unsupported .npy version {major}"))),
        };
        let end = start + len;
        if bytes.len() < end {
            return Err(LoadError::format("truncated .npy header"));
        }
        let text = std::str::from_utf8(&bytes[start..end])
            .map_err(|_| LoadError::format(".npy header is not valid text"))?;
        let literal: PyValue = text
            .trim()
            .parse()
            .map_err(|e| LoadError::format(format!("cannot parse .npy header: {e}")))?;
        Ok((Self::from_literal(&literal)?, &bytes[end..]))
    }

    fn from_literal(literal: &PyValue) -> LoadResult<Self> {
        let PyValue::Dict(entries) = literal else {
            return Err(LoadError::format(".npy header is not a dict"));
        };
        let mut descr = None;
        let mut fortran_order = None;
        let mut shape = None;
        for (key, value) in entries {
            match (key, value) {
                (PyValue::String(k), PyValue::String(v)) if k == "descr" => {
                    descr = Some(v.clone());
                }
                (PyValue::String(k), PyValue::Boolean(v)) if k == "fortran_order" => {
                    fortran_order = Some(*v);
                }
                (PyValue::String(k), PyValue::Tuple(dims)) if k == "shape" => {
                    let dims = dims
                        .iter()
                        .map(|d| match d {
                            PyValue::Integer(n) => usize::try_from(n).ok(),
                            _ => None,
                        })
                        .collect::<Option<Vec<usize>>>()
                        .ok_or_else(|| LoadError::format(".npy header has an invalid shape"))?;
                    shape = Some(dims);
                }
                _ => {}
            }
        }
        match (descr, fortran_order, shape) {
            (Some(descr), Some(fortran_order), Some(shape)) => Ok(NpyHeader {
                descr,
                fortran_order,
                shape,
            }),
            _ => Err(LoadError::format(
                ".npy header needs 'descr', 'fortran_order' and 'shape'",
            )),
        }
    }

    pub(crate) fn to_bytes(&self) -> LoadResult<Vec<u8>> {
        let mut dict = format!(
            "{{'descr': '{}', 'fortran_order': {}, 'shape': {}, }}",
            self.descr,
            if self.fortran_order { "True" } else { "False" },
            shape_literal(&self.shape)
        );
        let unpadded = NPY_MAGIC.len() + 4 + dict.len() + 1;
        let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
        dict.extend(std::iter::repeat(' ').take(padding));
        dict.push('\n');
        let len = u16::try_from(dict.len())
            .map_err(|_| LoadError::format(".npy header too long for format version 1.0"))?;

        let mut out = Vec::with_capacity(NPY_MAGIC.len() + 4 + dict.len());
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(dict.as_bytes());
        Ok(out)
    }
}

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [n] => format!("({n},)"),
        dims => {
            let inner: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("({})", inner.join(", "))
        }
    }
}

// ---------------------------------------------------------------------------
// String dtypes
// ---------------------------------------------------------------------------

/// `U<n>`: n UCS-4 code units per item. `S<n>`: n bytes per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextDtype {
    Ucs4 { width: usize, big_endian: bool },
    Bytes { width: usize },
}

impl TextDtype {
    fn parse(descr: &str) -> Option<Self> {
        let (big_endian, rest) = match descr.strip_prefix(['<', '>', '|', '=']) {
            Some(rest) => (descr.starts_with('>'), rest),
            None => (false, descr),
        };
        let mut chars = rest.chars();
        let kind = chars.next()?;
        let width: usize = chars.as_str().parse().ok()?;
        match kind {
            'U' => Some(TextDtype::Ucs4 {
                width,
                big_endian,
            }),
            'S' => Some(TextDtype::Bytes { width }),
            _ => None,
        }
    }

    /// Bytes per item; `None` when the width overflows.
    fn item_size(&self) -> Option<usize> {
        match self {
            TextDtype::Ucs4 { width, .. } => width.checked_mul(4),
            TextDtype::Bytes { width } => Some(*width),
        }
    }

    /// Decode one fixed-width item; numpy pads short strings with NULs.
    fn decode(&self, item: &[u8]) -> Option<String> {
        let text = match self {
            TextDtype::Ucs4 { big_endian, .. } => item
                .chunks_exact(4)
                .map(|unit| {
                    let unit = [unit[0], unit[1], unit[2], unit[3]];
                    let code = if *big_endian {
                        u32::from_be_bytes(unit)
                    } else {
                        u32::from_le_bytes(unit)
                    };
                    char::from_u32(code)
                })
                .collect::<Option<String>>()?,
            TextDtype::Bytes { .. } => String::from_utf8_lossy(item).into_owned(),
        };
        Some(text.trim_end_matches('\0').to_string())
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Builds a `.npz` archive the way `numpy.savez` lays it out.
///
/// Used by the sample generator and by tests to produce fixtures.
pub struct NpzWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> NpzWriter<W> {
    pub fn new(writer: W) -> Self {
        NpzWriter {
            zip: ZipWriter::new(writer),
        }
    }

    fn start(&mut self, key: &str) -> LoadResult<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip
            .start_file(format!("{key}.npy"), options)
            .map_err(|e| LoadError::format(format!("cannot add '{key}': {e}")))
    }

    /// Add a numeric array.
    pub fn add_array<A, D>(&mut self, key: &str, array: &ndarray::Array<A, D>) -> LoadResult<()>
    where
        A: WritableElement,
        D: Dimension,
    {
        self.start(key)?;
        array
            .write_npy(&mut self.zip)
            .map_err(|e| LoadError::format(format!("cannot write '{key}': {e}")))
    }

    /// Add a string array as little-endian `U<n>`, n being the longest item.
    pub fn add_text(&mut self, key: &str, array: &ArrayD<String>) -> LoadResult<()> {
        let width = array.iter().map(|s| s.chars().count()).max().unwrap_or(0).max(1);
        let header = NpyHeader {
            descr: format!("<U{width}"),
            fortran_order: false,
            shape: array.shape().to_vec(),
        };
        let mut bytes = header.to_bytes()?;
        for item in array.iter() {
            let mut units = item.chars().map(u32::from).collect::<Vec<u32>>();
            units.resize(width, 0);
            for unit in units {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
        }
        self.add_npy_bytes(key, &bytes)
    }

    /// Add an already encoded `.npy` file.
    pub(crate) fn add_npy_bytes(&mut self, key: &str, bytes: &[u8]) -> LoadResult<()> {
        self.start(key)?;
        self.zip
            .write_all(bytes)
            .map_err(|e| LoadError::format(format!("cannot write '{key}': {e}")))
    }

    /// Finish the archive and hand back the underlying writer.
    pub fn finish(self) -> LoadResult<W> {
        self.zip
            .finish()
            .map_err(|e| LoadError::format(format!("cannot finish archive: {e}")))
    }
}
