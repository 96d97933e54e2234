use super::Tensor;
use crate::errors::TensorError;
use image::{GrayImage, Luma};

impl Tensor {
    /// 确定是2D灰度图像（[高, 宽]）的情况下，返回该图像的高度和宽度
    pub fn get_image_size(&self) -> Result<(usize, usize), TensorError> {
        match self.shape() {
            [height, width] => Ok((*height, *width)),
            shape => Err(TensorError::NotAnImage(format!(
                "灰度图像张量应该仅有2个维度，得到形状{shape:?}"
            ))),
        }
    }

    /// 将[高, 宽]张量转为8位灰度图：先裁剪到[min, max]，再线性映射到[0, 255]
    pub fn to_gray_image_clipped(&self, min: f32, max: f32) -> Result<GrayImage, TensorError> {
        let (height, width) = self.get_image_size()?;
        if !(max > min) {
            return Err(TensorError::NotAnImage(format!(
                "裁剪区间无效：[{min}, {max}]"
            )));
        }
        let scale = 255.0 / (max - min);
        let data = self.array();
        let mut imgbuf = GrayImage::new(width as u32, height as u32);
        for y in 0..height {
            for x in 0..width {
                let value = data[[y, x]];
                // NaN 视为下界
                let clipped = if value.is_nan() { min } else { value.clamp(min, max) };
                let pixel = ((clipped - min) * scale).round() as u8;
                imgbuf.put_pixel(x as u32, y as u32, Luma([pixel]));
            }
        }
        Ok(imgbuf)
    }
}
