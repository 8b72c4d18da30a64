pub mod form;
pub mod input;
