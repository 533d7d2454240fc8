pub mod cache;
pub mod decode;
pub mod export;
pub mod format;
pub mod resample;
pub mod track;

pub use decode::{decode_file, Pcm};
pub use export::{export, ExportFormat};
pub use track::Track;
