pub mod commands;
pub mod expiry;
pub mod model;
pub mod policy;
pub mod validator;
