pub mod envelope;
pub mod schema;
pub mod task;
