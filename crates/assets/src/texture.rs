use crate::AssetError;
use std::path::Path;
use vitrine_scene::TextureImage;

/// Decode PNG or JPEG bytes to RGBA8.
pub fn decode_texture(bytes: &[u8]) -> Result<TextureImage, AssetError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(TextureImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

pub fn read_texture(path: &Path) -> Result<TextureImage, AssetError> {
    let bytes = std::fs::read(path)?;
    decode_texture(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let mut img = image::RgbaImage::new(2, 3);
        img.put_pixel(1, 2, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let tex = read_texture(&path).unwrap();
        assert_eq!((tex.width, tex.height), (2, 3));
        assert_eq!(tex.rgba.len(), 2 * 3 * 4);
        let last = &tex.rgba[(2 * 2 + 1) * 4..];
        assert_eq!(last, &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            decode_texture(b"not an image"),
            Err(AssetError::Image(_))
        ));
    }
}
