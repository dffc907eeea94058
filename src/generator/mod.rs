pub mod compose;
pub mod context;
pub mod outlet;
pub mod persona;
pub mod research;
pub mod triage;
pub mod workflow;
