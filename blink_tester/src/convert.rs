use image::RgbaImage;
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
};

/// Converts a BGR capture into the RGBA buffer the pipeline works with.
pub fn bgr_to_rgba(frame: &Mat) -> opencv::Result<Option<RgbaImage>> {
    let mut rgba = Mat::default();
    imgproc::cvt_color(frame, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;
    let bytes = rgba.data_bytes()?.to_vec();
    Ok(RgbaImage::from_raw(rgba.cols() as u32, rgba.rows() as u32, bytes))
}

/// Copies an RGBA buffer into a freshly allocated 4-channel `Mat`.
pub fn rgba_to_mat(image: &RgbaImage) -> opencv::Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        core::CV_8UC4,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(image.as_raw());
    Ok(mat)
}
