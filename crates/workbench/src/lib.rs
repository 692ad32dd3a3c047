//! Presentation-agnostic controllers and table models for the desktop
//! shell. Controllers expose intents (attach media, delete media, edit
//! properties) and talk to the render layer only through the capability
//! traits in [`view`]; no toolkit type appears anywhere in this crate.

pub mod editors;
pub mod session;
pub mod view;
pub mod views;

pub use session::{EditorKey, Session};
pub use view::{
    GalleryItem, GalleryView, MediaFetcher, MediaPickerView, PickerPreview, ThumbSource, UiError,
};
