//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use bbox::{prelude::*, HW, HW_, TLBR, TLHW};
pub use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
pub use derivative::Derivative;
pub use image::{DynamicImage, GenericImageView};
pub use label::Label;
pub use log::{debug, info, warn};
pub use ndarray::{Array2, Array3, ArrayView2, Axis};
pub use noisy_float::prelude::*;
pub use once_cell::sync::Lazy;
pub use rand::{prelude::*, rngs::StdRng};
pub use regex::Regex;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::BTreeMap,
    env, fmt,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
};
