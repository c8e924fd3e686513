mod fs;
mod geog;
mod io;

pub use fs::*;
pub use geog::*;
pub use io::*;
