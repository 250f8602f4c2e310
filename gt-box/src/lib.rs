//! Ground-truth box generation for instance segmentation training.
//!
//! The crate reads instance mask images, finds the extent of each instance,
//! and samples grid-aligned positive boxes around instances and negative
//! boxes away from them. The [driver] runs the generation over a dataset
//! directory and writes one box file per mask.

pub mod box_file;
pub mod common;
pub mod config;
pub mod driver;
pub mod generate;
pub mod mask;
pub mod overlap;
pub mod precise;
pub mod sampler;
pub mod stat;

pub use box_file::{BoxRecord, OutputFormat};
pub use config::{Config, DatasetConfig, RunConfig, SamplerConfig};
pub use generate::{generate_boxes, generate_for_mask, BoxSet, NoBoxesReason, Outcome};
pub use mask::{InstanceMask, TightBox};
pub use overlap::OverlapAxes;
pub use precise::PreciseBox;
pub use sampler::{BoxClass, SampledBox};
