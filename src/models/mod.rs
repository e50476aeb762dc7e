mod post;
mod send_record;
mod subscriber;

pub use post::*;
pub use send_record::*;
pub use subscriber::*;
