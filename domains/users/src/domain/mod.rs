pub mod entities;
pub mod password;
pub mod validation;
