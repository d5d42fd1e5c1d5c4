//! Full-size image overlay. While it is open the list underneath doesn't scroll.

use crate::core::fragment::Image;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Lightbox {
    image: Option<Image>,
}

impl Lightbox {
    pub fn open(&mut self, image: Image) {
        self.image = Some(image);
    }

    /// Returns `true` if something was actually dismissed.
    pub fn dismiss(&mut self) -> bool {
        self.image.take().is_some()
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    /// Page scrolling is locked exactly while the overlay is shown.
    pub fn scroll_locked(&self) -> bool {
        self.is_open()
    }
}
