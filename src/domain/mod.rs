pub mod attachment;
pub mod clock;
pub mod content;
pub mod document;
pub mod expiration;
pub mod file;
pub mod policy;

pub use attachment::{Attachment, AttachmentId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use content::Content;
pub use document::{Document, DocumentId};
pub use expiration::ExpirationTime;
pub use file::{FileName, FileSize, MimeType};
pub use policy::{ExpirationPolicy, Lifecycle};
