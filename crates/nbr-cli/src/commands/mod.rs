pub mod conduits;
pub mod new;
pub mod size;
pub mod tables;
pub mod util;
pub mod validate;
