//! Box file reading and writing.
//!
//! A box file stores a box set as a table of records, one row per box:
//! `(top, left, height, width, is_positive, instance_id)`. An image without
//! boxes is stored as an empty table.
//!
//! Two formats are supported. The NumPy format is a `.npy` file of
//! little-endian `i64` values with shape `(n, 6)`. The JSON format is an array
//! of record objects, or `null` for no boxes.

use crate::{common::*, generate::Outcome, sampler::BoxClass, sampler::SampledBox};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGNMENT: usize = 64;
const NUM_FIELDS: usize = 6;

static DESCR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'descr'\s*:\s*'([^']*)'").unwrap());
static FORTRAN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'fortran_order'\s*:\s*(True|False)").unwrap());
static SHAPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'shape'\s*:\s*\(\s*(\d+)\s*,\s*(\d+)\s*\)").unwrap());

/// The box file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[derivative(Default)]
    Npy,
    Json,
}

impl OutputFormat {
    pub fn default_suffix(&self) -> &'static str {
        match self {
            Self::Npy => "box.npy",
            Self::Json => "box.json",
        }
    }

    /// Guesses the format from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("npy") => Self::Npy,
            Some("json") => Self::Json,
            _ => bail!("unknown box file format '{}'", path.display()),
        };
        Ok(format)
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let format = match text {
            "npy" => Self::Npy,
            "json" => Self::Json,
            _ => bail!("invalid format '{}', expect 'npy' or 'json'", text),
        };
        Ok(format)
    }
}

/// One row of a box file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoxRecord {
    pub t: i64,
    pub l: i64,
    pub h: i64,
    pub w: i64,
    pub is_positive: i64,
    pub instance_id: i64,
}

impl BoxRecord {
    pub fn to_array(&self) -> [i64; NUM_FIELDS] {
        let Self {
            t,
            l,
            h,
            w,
            is_positive,
            instance_id,
        } = *self;
        [t, l, h, w, is_positive, instance_id]
    }

    pub fn from_array(array: [i64; NUM_FIELDS]) -> Self {
        let [t, l, h, w, is_positive, instance_id] = array;
        Self {
            t,
            l,
            h,
            w,
            is_positive,
            instance_id,
        }
    }

    pub fn class(&self) -> Result<BoxClass> {
        BoxClass::from_record([self.is_positive, self.instance_id])
    }

    pub fn to_sampled_box(&self) -> Result<SampledBox> {
        let rect = TLHW::try_from_tlhw([self.t, self.l, self.h, self.w])?;
        Ok(Label::new(rect, self.class()?))
    }
}

impl From<&SampledBox> for BoxRecord {
    fn from(sampled: &SampledBox) -> Self {
        let [t, l, h, w] = sampled.rect.tlhw();
        let [is_positive, instance_id] = sampled.class.to_record();
        Self {
            t,
            l,
            h,
            w,
            is_positive,
            instance_id,
        }
    }
}

/// Converts a generation outcome to the records stored on disk.
pub fn outcome_records(outcome: &Outcome) -> Vec<BoxRecord> {
    match outcome.box_set() {
        Some(box_set) => box_set.boxes().iter().map(BoxRecord::from).collect(),
        None => vec![],
    }
}

/// Writes records to a file in the given format.
pub fn save<P>(path: P, records: &[BoxRecord], format: OutputFormat) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut writer = BufWriter::new(
        File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?,
    );

    match format {
        OutputFormat::Npy => write_npy(&mut writer, records)?,
        OutputFormat::Json => {
            let value = (!records.is_empty()).then(|| records);
            serde_json::to_writer(&mut writer, &value)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Reads records from a file. The format is guessed from the extension.
pub fn load<P>(path: P) -> Result<Vec<BoxRecord>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let format = OutputFormat::from_path(path)?;
    let mut reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?,
    );

    let records = match format {
        OutputFormat::Npy => read_npy(&mut reader),
        OutputFormat::Json => {
            let records: Option<Vec<BoxRecord>> = serde_json::from_reader(reader)?;
            Ok(records.unwrap_or_default())
        }
    }
    .with_context(|| format!("invalid box file '{}'", path.display()))?;

    Ok(records)
}

/// Writes records as a version 1.0 `.npy` array.
pub fn write_npy<W>(writer: &mut W, records: &[BoxRecord]) -> Result<()>
where
    W: Write,
{
    let dict = format!(
        "{{'descr': '<i8', 'fortran_order': False, 'shape': ({}, {}), }}",
        records.len(),
        NUM_FIELDS
    );

    // magic, version and header length take 10 bytes, the header ends with a newline
    let unpadded_len = NPY_MAGIC.len() + 4 + dict.len() + 1;
    let padding = (NPY_ALIGNMENT - unpadded_len % NPY_ALIGNMENT) % NPY_ALIGNMENT;
    let header_len = dict.len() + padding + 1;
    let header_len = u16::try_from(header_len)
        .map_err(|_| format_err!("npy header is too long"))?;

    writer.write_all(NPY_MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_u16::<LittleEndian>(header_len)?;
    writer.write_all(dict.as_bytes())?;
    writer.write_all(&vec![b' '; padding])?;
    writer.write_all(b"\n")?;

    for record in records {
        for value in record.to_array() {
            writer.write_i64::<LittleEndian>(value)?;
        }
    }

    Ok(())
}

/// Reads records from a version 1.0 `.npy` array of shape `(n, 6)`.
pub fn read_npy<R>(reader: &mut R) -> Result<Vec<BoxRecord>>
where
    R: Read,
{
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    ensure!(magic == NPY_MAGIC, "not a npy file");

    let major = reader.read_u8()?;
    let minor = reader.read_u8()?;
    ensure!(
        major == 1,
        "unsupported npy version {}.{}",
        major,
        minor
    );

    let header_len = reader.read_u16::<LittleEndian>()? as usize;
    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8(header)?;

    let descr = DESCR_REGEX
        .captures(&header)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| format_err!("npy header has no 'descr'"))?
        .as_str();
    ensure!(
        descr == "<i8",
        "expect little-endian int64 data, but get '{}'",
        descr
    );

    let fortran_order = FORTRAN_REGEX
        .captures(&header)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| format_err!("npy header has no 'fortran_order'"))?
        .as_str();
    ensure!(fortran_order == "False", "fortran order is not supported");

    let caps = SHAPE_REGEX
        .captures(&header)
        .ok_or_else(|| format_err!("expect a 2-dimensional shape in npy header"))?;
    let num_rows: usize = caps[1].parse()?;
    let num_cols: usize = caps[2].parse()?;
    ensure!(
        num_cols == NUM_FIELDS,
        "expect {} columns, but get {}",
        NUM_FIELDS,
        num_cols
    );

    let records: Vec<_> = (0..num_rows)
        .map(|_| -> Result<_> {
            let mut array = [0i64; NUM_FIELDS];
            reader.read_i64_into::<LittleEndian>(&mut array)?;
            Ok(BoxRecord::from_array(array))
        })
        .collect::<Result<_>>()?;

    let mut trailing = vec![];
    reader.read_to_end(&mut trailing)?;
    ensure!(
        trailing.is_empty(),
        "npy payload has {} trailing bytes",
        trailing.len()
    );

    Ok(records)
}
