//! Setting handlers for different configuration patterns.

pub mod boolean;
pub mod numeric;
pub mod simple;
pub mod string;

pub use boolean::*;
pub use numeric::*;
pub use simple::*;
pub use string::*;
