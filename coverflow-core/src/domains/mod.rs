pub mod carousel;
pub mod images;
pub mod render;
