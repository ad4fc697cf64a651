pub mod context;
pub mod error;
pub mod expr;
pub mod fragment;
pub mod handler;
pub mod mode;
pub mod model;
pub mod structure;
