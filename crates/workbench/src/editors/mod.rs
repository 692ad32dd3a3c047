pub mod delete_media;
pub mod gallery;
pub mod media_picker;
pub mod object_editor;
pub mod ref_editor;

pub use delete_media::DeleteMediaQuery;
pub use gallery::{CloseAction, Gallery, GalleryIntent};
pub use media_picker::MediaPicker;
pub use object_editor::ObjectEditor;
pub use ref_editor::RefEditor;
