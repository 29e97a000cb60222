pub mod catalog;
pub mod connection;
pub mod descriptor;
pub mod markup;
pub mod plan;
pub mod planner;
pub mod predicate;
pub mod query;
pub mod records;
pub mod request;
pub mod schema;
pub mod store;
pub mod types;
