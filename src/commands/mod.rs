//! Host-facing entry points.
//!
//! - [`handle_upload`]: convert a file while it is being uploaded
//! - [`convert_single`]: convert one existing media item on request
//! - [`convert_bulk`]: convert a selection of media items
//! - [`column_status`]: state of the WebP column in the media list
//!
//! [`MediaLibrary`] is an in-memory host usable with all of them.

mod image;
mod library;
mod media;
mod upload;

pub use image::{convert_bulk, convert_single, failure_text, BulkResponse, SingleAck, SUCCESS_MARKER};
pub use library::{MediaLibrary, MediaRecord};
pub use media::{column_status, MediaColumnStatus};
pub use upload::handle_upload;
