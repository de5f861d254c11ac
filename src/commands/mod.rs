pub mod contents;
pub mod info;
pub mod labels;
pub mod locate;
pub mod outline;
pub mod page_map;
pub mod read;
pub mod render;
