pub mod error;
pub mod formats;
pub mod fs;
pub mod paths;

pub use error::{ConverterError, ConverterResult, ErrorKind};
pub use formats::{
    classify,
    detect_declared_type,
    Classification,
    DecodeHint,
    SourceFormat,
    UNKNOWN_MIME,
    WEBP_MIME,
};
pub use fs::{extract_filename, file_exists, get_file_size};
pub use paths::{derive_webp_path, has_convertible_extension, is_webp_path, rebase_attached_file};
