pub mod render;
pub mod store;

pub use render::{SectionRenderer, CARD_HEIGHT, CARD_WIDTH};
pub use store::{section_dir, url_basename, DownloadStats, ImageStore};
