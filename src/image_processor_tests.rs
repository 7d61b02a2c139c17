#[cfg(test)]
mod tests {
    use super::super::*;
    use rgb::RGBA8;

    fn create_solid_color_image(width: u32, height: u32, color: RGBA8) -> ImageData {
        let pixels = vec![color; (width * height) as usize];
        ImageData {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_from_rgba_bytes_roundtrip() {
        let bytes = vec![10, 20, 30, 255, 40, 50, 60, 128];
        let img = ImageData::from_rgba_bytes(2, 1, &bytes).unwrap();
        assert_eq!(img.pixels[0], RGBA8::new(10, 20, 30, 255));
        assert_eq!(img.pixels[1], RGBA8::new(40, 50, 60, 128));
        assert_eq!(img.to_rgba_bytes(), bytes);
    }

    #[test]
    fn test_from_rgba_bytes_rejects_wrong_length() {
        let bytes = vec![0u8; 4 * 3];
        let result = ImageData::from_rgba_bytes(2, 2, &bytes);
        assert!(matches!(
            result,
            Err(EngraveError::BufferSizeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let img = ImageData {
            width: 0,
            height: 5,
            pixels: Vec::new(),
        };
        assert!(matches!(img.validate(), Err(EngraveError::EmptyImage { .. })));
    }

    #[test]
    fn test_validate_accepts_solid() {
        let img = create_solid_color_image(3, 3, RGBA8::new(1, 2, 3, 255));
        assert!(img.validate().is_ok());
        assert_eq!(img.pixel_count(), 9);
    }

    #[test]
    fn test_truncate_rounds_half_up() {
        assert_eq!(truncate(0.5), 1);
        assert_eq!(truncate(1.5), 2);
        assert_eq!(truncate(2.5), 3);
        assert_eq!(truncate(-3.0), 0);
        assert_eq!(truncate(300.0), 255);
    }

    #[test]
    fn test_store_clamped_rounds_half_even() {
        assert_eq!(store_clamped(0.5), 0);
        assert_eq!(store_clamped(1.5), 2);
        assert_eq!(store_clamped(2.5), 2);
        assert_eq!(store_clamped(2.6), 3);
        assert_eq!(store_clamped(-1.0), 0);
        assert_eq!(store_clamped(f64::NAN), 0);
    }

    #[test]
    fn test_brightness_weights() {
        assert_eq!(brightness(&RGBA8::new(255, 255, 255, 255)), 255);
        assert_eq!(brightness(&RGBA8::new(0, 0, 0, 255)), 0);
        // 0.299 * 255 = 76.245
        assert_eq!(brightness(&RGBA8::new(255, 0, 0, 255)), 76);
    }

    #[test]
    fn test_luma_709_weights() {
        let l = luma_709(&RGBA8::new(0, 255, 0, 255));
        assert!((l - 182.376).abs() < 1e-9);
    }
}
