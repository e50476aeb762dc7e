mod content_record;
mod environment;
mod subscriber_email;

pub use content_record::*;
pub use environment::*;
pub use subscriber_email::*;
