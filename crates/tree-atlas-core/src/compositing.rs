use image::RgbaImage;

/// Copy all of `src` into `canvas` with its top-left corner at (dx, dy).
///
/// Pixels are written as-is (no blending, no resampling); anything that
/// would land outside the canvas is clipped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();

    for yy in 0..sh {
        let ty = match dy.checked_add(yy) {
            Some(ty) if ty < ch => ty,
            _ => break,
        };
        for xx in 0..sw {
            let tx = match dx.checked_add(xx) {
                Some(tx) if tx < cw => tx,
                _ => break,
            };
            canvas.put_pixel(tx, ty, *src.get_pixel(xx, yy));
        }
    }
}
