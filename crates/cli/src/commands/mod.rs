pub mod albums;
pub mod upload;
