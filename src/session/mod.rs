pub mod crop;
pub mod editor;
