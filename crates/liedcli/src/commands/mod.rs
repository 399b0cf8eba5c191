pub mod analyze;
pub mod concat;
pub mod stems;
