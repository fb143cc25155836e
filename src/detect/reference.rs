use image::GrayImage;

/// Baseline for differencing: the most recent preprocessed frame, nothing older.
#[derive(Clone, Debug, Default)]
pub struct ReferenceModel {
    frame: Option<GrayImage>,
}

impl ReferenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held frame unconditionally.
    pub fn update(&mut self, frame: GrayImage) {
        self.frame = Some(frame);
    }

    /// `None` until the first frame is stored.
    pub fn get(&self) -> Option<&GrayImage> {
        self.frame.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.frame.is_some()
    }

    pub fn clear(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn update_overwrites_previous_frame() {
        let mut model = ReferenceModel::new();
        assert!(model.get().is_none());

        model.update(GrayImage::from_pixel(2, 2, Luma([1])));
        model.update(GrayImage::from_pixel(3, 3, Luma([7])));

        let held = model.get().expect("reference set");
        assert_eq!(held.dimensions(), (3, 3));
        assert_eq!(held.get_pixel(0, 0).0[0], 7);

        model.clear();
        assert!(!model.is_initialized());
    }
}
