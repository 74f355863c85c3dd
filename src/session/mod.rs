pub mod answers;
pub mod attempt;
pub mod controller;
pub mod probe;
pub mod timer;
