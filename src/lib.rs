pub mod datatypes;
pub mod expression;
pub mod response;
