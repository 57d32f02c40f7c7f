//! Publishers for a finished pipeline run: the spreadsheet upload and the
//! email notification.

pub mod email;
pub mod error;
mod retry;
pub mod sheets;

pub use email::{failure_message, success_message, EmailClient, EmailMessage};
pub use error::PublishError;
pub use sheets::{SheetsClient, UploadedSheet};
