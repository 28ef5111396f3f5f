mod base;
mod body;
mod nav;
mod toc;

pub use base::*;
pub use body::*;
pub use nav::*;
pub use toc::*;
