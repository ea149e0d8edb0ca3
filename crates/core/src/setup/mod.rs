pub mod form;
pub mod status;
pub mod validation;
pub mod view;
