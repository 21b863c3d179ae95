pub mod audit;
pub mod health;
pub mod members;
pub mod projects;
pub mod propagation;
pub mod search;
pub mod secrets;
