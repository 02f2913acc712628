mod evidence;
mod identity;
mod quote_body;
mod quote_status;
mod report;

pub use evidence::*;
pub use identity::*;
pub use quote_body::*;
pub use quote_status::*;
pub use report::*;
