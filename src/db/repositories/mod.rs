pub mod audit;
pub mod user;
pub mod visit;
pub mod visitor;
