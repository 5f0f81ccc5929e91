pub mod alternatives;
pub mod assignments;
pub mod classes;
pub mod core;
pub mod session;
pub mod setup;
pub mod students;
pub mod subjects;
